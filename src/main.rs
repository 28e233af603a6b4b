use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser as _;
use zenreader::cli::{Cli, Command, ProgressCommand};
use zenreader::progress::{JsonFileStore, ProgressStore};
use zenreader::session::{Clock, SystemClock};

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    zenreader::logging::init(zenreader::logging::CLI_DEFAULT_FILTER).context("init logging")?;

    let cli = Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    let progress = ProgressStore::new(Arc::new(JsonFileStore::new(&cli.progress)));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let mut stdout = std::io::stdout().lock();

    match cli.command {
        Command::Compile(args) => {
            let summary = zenreader::compile::run(args).context("compile")?;
            tracing::debug!(?summary, "compile finished");
        }
        Command::Library(args) => {
            zenreader::browse::list(args, &progress, &mut stdout)
                .await
                .context("library")?;
        }
        Command::Read(args) => {
            zenreader::browse::read(args, &progress, clock, &mut stdout)
                .await
                .context("read")?;
        }
        Command::Progress {
            command: ProgressCommand::Set(args),
        } => {
            zenreader::browse::set_position(args, &progress, clock, &mut stdout)
                .await
                .context("progress set")?;
        }
        Command::Progress {
            command: ProgressCommand::Complete(args),
        } => {
            zenreader::browse::complete(args, &progress, clock, &mut stdout)
                .await
                .context("progress complete")?;
        }
    }

    Ok(())
}
