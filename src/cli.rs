use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::reader::DisplayMode;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Progress store file (JSON object of progress records).
    #[arg(long, global = true, default_value = "zenreader-progress.json")]
    pub progress: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Compile(CompileArgs),
    Library(LibraryArgs),
    Read(ReadArgs),
    Progress {
        #[command(subcommand)]
        command: ProgressCommand,
    },
}

#[derive(Debug, Clone, Args)]
pub struct CompileArgs {
    /// Content root: loose `.txt` files are lessons, subdirectories are series.
    #[arg(long, default_value = "raw_subtitles")]
    pub raw: String,

    /// Output directory for lesson JSON files and `manifest.json`.
    #[arg(long, default_value = "public/assets/subtitles")]
    pub out: String,
}

#[derive(Debug, Clone, Args)]
pub struct SourceArgs {
    /// Compiled library: a directory or an http(s) base URL.
    #[arg(long, default_value = "public/assets/subtitles")]
    pub library: String,

    /// Fail instead of falling back to the built-in demo library.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Args)]
pub struct LibraryArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// List the lessons of one series instead of the root catalog.
    #[arg(long)]
    pub series: Option<String>,

    /// Omit completed lessons and fully completed series.
    #[arg(long)]
    pub hide_completed: bool,
}

#[derive(Debug, Args)]
pub struct ReadArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Lesson id.
    #[arg(long)]
    pub lesson: String,

    #[arg(long, value_enum, default_value_t = ModeArg::Bi)]
    pub mode: ModeArg,

    /// Start at the first segment instead of the saved position.
    #[arg(long)]
    pub from_start: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Bi,
    En,
    Cn,
}

impl From<ModeArg> for DisplayMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Bi => DisplayMode::Bilingual,
            ModeArg::En => DisplayMode::Primary,
            ModeArg::Cn => DisplayMode::Secondary,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum ProgressCommand {
    Set(ProgressSetArgs),
    Complete(ProgressCompleteArgs),
}

#[derive(Debug, Args)]
pub struct ProgressSetArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[arg(long)]
    pub lesson: String,

    /// 0-based segment index.
    #[arg(long)]
    pub index: usize,
}

#[derive(Debug, Args)]
pub struct ProgressCompleteArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[arg(long)]
    pub lesson: String,

    /// Mark as not completed.
    #[arg(long)]
    pub undo: bool,
}
