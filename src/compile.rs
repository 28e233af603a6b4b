use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::cli::CompileArgs;
use crate::formats::{LessonDocument, LibraryItem, Manifest, Series, SeriesTag};
use crate::json_file::write_json_atomic;
use crate::naming::{compare_names, slug, title};
use crate::transcript::parse_transcript;

pub const MANIFEST_FILE_NAME: &str = "manifest.json";
pub const STANDALONE_DESCRIPTION: &str = "Standalone reading.";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileSummary {
    pub lessons_written: usize,
    pub series: usize,
    pub standalone: usize,
    pub skipped_sources: usize,
    /// `false` when the content root was missing and has just been created.
    pub manifest_written: bool,
}

pub fn run(args: CompileArgs) -> anyhow::Result<CompileSummary> {
    let raw_dir = PathBuf::from(&args.raw);
    let out_dir = PathBuf::from(&args.out);

    if !raw_dir.exists() {
        std::fs::create_dir_all(&raw_dir)
            .with_context(|| format!("create content root: {}", raw_dir.display()))?;
        tracing::info!(
            raw = %raw_dir.display(),
            "created content root; add .txt files there and run again"
        );
        return Ok(CompileSummary::default());
    }

    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("create output dir: {}", out_dir.display()))?;

    tracing::info!(raw = %raw_dir.display(), out = %out_dir.display(), "scanning content root");

    let mut summary = CompileSummary::default();
    let mut manifest: Manifest = Vec::new();

    for (name, path) in sorted_entries(&raw_dir)? {
        if path.is_dir() {
            if let Some(series) = compile_series(&name, &path, &out_dir, &mut summary)? {
                summary.series += 1;
                manifest.push(LibraryItem::Series(series));
            }
        } else if is_text_file(&path) {
            let id = slug(&name);
            let Some(doc) = compile_lesson(&path, id, title(&name), None, &mut summary) else {
                continue;
            };
            write_lesson(&out_dir, &doc)?;
            summary.lessons_written += 1;
            summary.standalone += 1;
            tracing::info!(
                lesson = %doc.id(),
                segments = doc.segment_count(),
                "generated standalone lesson"
            );

            let mut lesson = doc.lesson;
            lesson.description = Some(STANDALONE_DESCRIPTION.to_owned());
            manifest.push(LibraryItem::Book(lesson));
        }
    }

    let manifest_path = out_dir.join(MANIFEST_FILE_NAME);
    write_json_atomic(&manifest_path, &manifest)
        .with_context(|| format!("write manifest: {}", manifest_path.display()))?;
    summary.manifest_written = true;

    tracing::info!(
        items = manifest.len(),
        lessons = summary.lessons_written,
        skipped = summary.skipped_sources,
        "manifest updated"
    );

    Ok(summary)
}

fn compile_series(
    dir_name: &str,
    dir: &Path,
    out_dir: &Path,
    summary: &mut CompileSummary,
) -> anyhow::Result<Option<Series>> {
    let series_id = slug(dir_name);
    let series_title = title(dir_name);

    let files = match sorted_entries(dir) {
        Ok(entries) => entries
            .into_iter()
            .filter(|(_, path)| is_text_file(path))
            .collect::<Vec<_>>(),
        Err(err) => {
            tracing::warn!(series = %series_id, error = ?err, "skipping unreadable series directory");
            return Ok(None);
        }
    };
    if files.is_empty() {
        return Ok(None);
    }

    tracing::info!(series = %series_title, files = files.len(), "processing series");

    let mut books = Vec::new();
    for (name, path) in files {
        let id = format!("{series_id}-{}", slug(&name));
        let Some(doc) = compile_lesson(&path, id, title(&name), Some(series_id.clone()), summary)
        else {
            continue;
        };
        write_lesson(out_dir, &doc)?;
        summary.lessons_written += 1;
        books.push(doc.lesson);
    }

    if books.is_empty() {
        tracing::info!(series = %series_id, "series has no readable lessons; omitted");
        return Ok(None);
    }

    Ok(Some(Series {
        kind: SeriesTag::Series,
        id: series_id,
        title: series_title,
        description: format!("{} lessons in this collection.", books.len()),
        books,
    }))
}

/// Parses one source file. Unreadable files and files without segments are
/// logged, counted and skipped.
fn compile_lesson(
    path: &Path,
    id: String,
    title: String,
    series_id: Option<String>,
    summary: &mut CompileSummary,
) -> Option<LessonDocument> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "skipping unreadable source");
            summary.skipped_sources += 1;
            return None;
        }
    };

    let segments = parse_transcript(&contents);
    if segments.is_empty() {
        tracing::info!(path = %path.display(), "no segments found; skipping");
        summary.skipped_sources += 1;
        return None;
    }

    Some(LessonDocument::new(id, title, series_id, segments))
}

fn write_lesson(out_dir: &Path, doc: &LessonDocument) -> anyhow::Result<()> {
    let path = out_dir.join(format!("{}.json", doc.id()));
    write_json_atomic(&path, doc).with_context(|| format!("write lesson: {}", path.display()))
}

fn is_text_file(path: &Path) -> bool {
    path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("txt")
}

/// Non-hidden entries of `dir` with UTF-8 names, in compile order.
fn sorted_entries(dir: &Path) -> anyhow::Result<Vec<(String, PathBuf)>> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("read dir: {}", dir.display()))? {
        let entry = entry.with_context(|| format!("read dir entry: {}", dir.display()))?;
        let Ok(name) = entry.file_name().into_string() else {
            tracing::warn!(path = %entry.path().display(), "skipping non UTF-8 file name");
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        entries.push((name, entry.path()));
    }
    entries.sort_by(|(a, _), (b, _)| compare_names(a, b));
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &Path, out: &Path) -> CompileArgs {
        CompileArgs {
            raw: raw.to_string_lossy().to_string(),
            out: out.to_string_lossy().to_string(),
        }
    }

    fn read_manifest(out: &Path) -> anyhow::Result<Manifest> {
        let json = std::fs::read_to_string(out.join(MANIFEST_FILE_NAME))?;
        Ok(serde_json::from_str(&json)?)
    }

    #[test]
    fn series_keeps_only_lessons_with_segments() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let raw = temp.path().join("raw");
        let out = temp.path().join("out");
        std::fs::create_dir_all(raw.join("unit-1"))?;
        std::fs::write(raw.join("unit-1").join("a.txt"), "1\nHi.\n嗨。\n\n2\nBye.\n再见。\n")?;
        std::fs::write(raw.join("unit-1").join("b.txt"), "not a subtitle\n")?;

        let summary = run(args(&raw, &out))?;
        assert_eq!(summary.series, 1);
        assert_eq!(summary.lessons_written, 1);
        assert_eq!(summary.skipped_sources, 1);

        let manifest = read_manifest(&out)?;
        let [LibraryItem::Series(series)] = manifest.as_slice() else {
            panic!("expected a single series, got {manifest:?}");
        };
        assert_eq!(series.id, "unit-1");
        assert_eq!(series.title, "unit 1");
        assert_eq!(series.description, "1 lessons in this collection.");
        assert_eq!(series.books.len(), 1);
        assert_eq!(series.books[0].id, "unit-1-a");
        assert_eq!(series.books[0].total_segments, 2);
        assert_eq!(series.books[0].series_id.as_deref(), Some("unit-1"));

        assert!(out.join("unit-1-a.json").exists());
        assert!(!out.join("unit-1-b.json").exists());
        Ok(())
    }

    #[test]
    fn empty_series_is_omitted() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let raw = temp.path().join("raw");
        let out = temp.path().join("out");
        std::fs::create_dir_all(raw.join("empty"))?;
        std::fs::write(raw.join("empty").join("x.txt"), "x\ny\nz\n")?;
        std::fs::write(raw.join("solo.txt"), "1\nOne.\n一。\n")?;

        run(args(&raw, &out))?;
        let manifest = read_manifest(&out)?;
        assert_eq!(manifest.len(), 1);
        let LibraryItem::Book(lesson) = &manifest[0] else {
            panic!("expected standalone lesson");
        };
        assert_eq!(lesson.id, "solo");
        assert_eq!(lesson.description.as_deref(), Some(STANDALONE_DESCRIPTION));
        assert_eq!(lesson.series_id, None);
        Ok(())
    }

    #[test]
    fn missing_content_root_is_created_without_output() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let raw = temp.path().join("raw");
        let out = temp.path().join("out");

        let summary = run(args(&raw, &out))?;
        assert!(!summary.manifest_written);
        assert!(raw.is_dir());
        assert!(!out.exists());
        Ok(())
    }

    #[test]
    fn entries_follow_numeric_then_lexical_order() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let raw = temp.path().join("raw");
        let out = temp.path().join("out");
        std::fs::create_dir_all(&raw)?;
        for name in ["lesson 10.txt", "lesson 2.txt", "zeta.txt", "alpha.txt", "notes.md"] {
            std::fs::write(raw.join(name), "1\nA.\n甲。\n")?;
        }

        run(args(&raw, &out))?;
        let ids: Vec<String> = read_manifest(&out)?
            .iter()
            .map(|item| item.id().to_owned())
            .collect();
        assert_eq!(ids, vec!["alpha", "zeta", "lesson-2", "lesson-10"]);
        Ok(())
    }
}
