use std::io::Write;
use std::sync::Arc;

use anyhow::Context as _;

use crate::cli::{LibraryArgs, ProgressCompleteArgs, ProgressSetArgs, ReadArgs, SourceArgs};
use crate::formats::{LessonDocument, LibraryItem};
use crate::library::{LibrarySource, find_series, open_source};
use crate::progress::ProgressStore;
use crate::reader::DisplayMode;
use crate::session::{Clock, ReadingSession};

pub async fn list(
    args: LibraryArgs,
    progress: &ProgressStore,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let source = open_source(&args.source.library, args.source.strict)?;
    let manifest = source.manifest().await.context("load manifest")?;

    let items = match &args.series {
        Some(series_id) => {
            let series = find_series(&manifest, series_id)
                .ok_or_else(|| anyhow::anyhow!("series not found: {series_id}"))?;
            series.books.iter().cloned().map(LibraryItem::Book).collect()
        }
        None => manifest,
    };

    for item in progress.library_view(&items, args.hide_completed) {
        let marker = if progress.is_item_completed(&item) { "x" } else { " " };
        let detail = match &item {
            LibraryItem::Book(lesson) => format!("{} segments", lesson.total_segments),
            LibraryItem::Series(series) => format!("series, {} lessons", series.books.len()),
        };
        writeln!(
            out,
            "[{marker}] {:>3}%  {}  {} ({detail})",
            progress.item_percent(&item),
            item.id(),
            item.title(),
        )?;
    }
    Ok(())
}

pub async fn read(
    args: ReadArgs,
    progress: &ProgressStore,
    clock: Arc<dyn Clock>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let doc = load_lesson(&args.source, &args.lesson).await?;
    let session = ReadingSession::open(&doc, progress.clone(), clock);
    let start = if args.from_start { 0 } else { session.active_index() };
    let mode = DisplayMode::from(args.mode);

    writeln!(out, "# {}", doc.lesson.title)?;
    writeln!(
        out,
        "{}% read, segment {}/{}{}",
        session.progress_percent(),
        start + 1,
        doc.segment_count(),
        if session.is_completed() { ", completed" } else { "" },
    )?;
    for segment in doc.segments.iter().skip(start) {
        writeln!(out)?;
        writeln!(out, "{}", segment.id)?;
        for line in mode.visible_lines(segment) {
            writeln!(out, "{line}")?;
        }
    }
    Ok(())
}

pub async fn set_position(
    args: ProgressSetArgs,
    progress: &ProgressStore,
    clock: Arc<dyn Clock>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let doc = load_lesson(&args.source, &args.lesson).await?;
    if args.index >= doc.segment_count() {
        anyhow::bail!(
            "segment index {} out of range for {} ({} segments)",
            args.index,
            doc.id(),
            doc.segment_count()
        );
    }

    let mut session = ReadingSession::open(&doc, progress.clone(), clock);
    session.begin_seek();
    let index = session.end_seek(args.index);
    writeln!(
        out,
        "{}: segment {} ({}%)",
        doc.id(),
        index + 1,
        session.progress_percent()
    )?;
    Ok(())
}

pub async fn complete(
    args: ProgressCompleteArgs,
    progress: &ProgressStore,
    clock: Arc<dyn Clock>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let doc = load_lesson(&args.source, &args.lesson).await?;
    let mut session = ReadingSession::open(&doc, progress.clone(), clock);
    session.toggle_completion(!args.undo);
    writeln!(
        out,
        "{}: {} ({}%)",
        doc.id(),
        if session.is_completed() { "completed" } else { "not completed" },
        session.progress_percent()
    )?;
    Ok(())
}

async fn load_lesson(source: &SourceArgs, lesson_id: &str) -> anyhow::Result<LessonDocument> {
    let library = open_source(&source.library, source.strict)?;
    library
        .lesson(lesson_id)
        .await
        .with_context(|| format!("load lesson: {lesson_id}"))?
        .ok_or_else(|| anyhow::anyhow!("lesson not found: {lesson_id}"))
}
