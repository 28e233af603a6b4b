use serde::{Deserialize, Serialize};

/// Marker serialized as `"type": "book"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookTag {
    #[default]
    #[serde(rename = "book")]
    Book,
}

/// Marker serialized as `"type": "series"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeriesTag {
    #[default]
    #[serde(rename = "series")]
    Series,
}

/// One aligned sentence pair. `id` is the sequence number from the source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub id: u64,
    #[serde(rename = "en")]
    pub primary: String,
    #[serde(rename = "cn")]
    pub secondary: String,
}

/// Lightweight lesson form used in the manifest and inside series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonRef {
    #[serde(rename = "type", default)]
    pub kind: BookTag,
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub total_segments: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series_id: Option<String>,
}

/// Full lesson document, written one per file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonDocument {
    #[serde(flatten)]
    pub lesson: LessonRef,
    pub segments: Vec<Segment>,
}

impl LessonDocument {
    /// Builds a document whose `total_segments` is taken from `segments`.
    pub fn new(
        id: String,
        title: String,
        series_id: Option<String>,
        segments: Vec<Segment>,
    ) -> Self {
        Self {
            lesson: LessonRef {
                kind: BookTag::Book,
                id,
                title,
                description: None,
                total_segments: segments.len(),
                series_id,
            },
            segments,
        }
    }

    pub fn id(&self) -> &str {
        &self.lesson.id
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Series {
    #[serde(rename = "type", default)]
    pub kind: SeriesTag,
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub books: Vec<LessonRef>,
}

/// Manifest entry. The `type` markers keep the untagged match unambiguous.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LibraryItem {
    Book(LessonRef),
    Series(Series),
}

impl LibraryItem {
    pub fn id(&self) -> &str {
        match self {
            Self::Book(lesson) => &lesson.id,
            Self::Series(series) => &series.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Book(lesson) => &lesson.title,
            Self::Series(series) => &series.title,
        }
    }
}

pub type Manifest = Vec<LibraryItem>;

/// Persisted reading position for one lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingProgress {
    #[serde(rename = "bookId")]
    pub lesson_id: String,
    pub segment_index: usize,
    /// Epoch milliseconds.
    pub last_read: i64,
    #[serde(rename = "isCompleted")]
    pub completed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lesson_document_serializes_in_artifact_key_order() -> anyhow::Result<()> {
        let doc = LessonDocument::new(
            "unit-1-a".to_owned(),
            "a".to_owned(),
            Some("unit-1".to_owned()),
            vec![Segment {
                id: 1,
                primary: "Hello.".to_owned(),
                secondary: "你好。".to_owned(),
            }],
        );

        let json = serde_json::to_string(&doc)?;
        assert_eq!(
            json,
            r#"{"type":"book","id":"unit-1-a","title":"a","totalSegments":1,"seriesId":"unit-1","segments":[{"id":1,"en":"Hello.","cn":"你好。"}]}"#
        );

        let back: LessonDocument = serde_json::from_str(&json)?;
        assert_eq!(back, doc);
        Ok(())
    }

    #[test]
    fn manifest_items_are_told_apart_by_type() -> anyhow::Result<()> {
        let json = r#"[
            {"type":"series","id":"s","title":"s","description":"d","books":[
                {"type":"book","id":"s-a","title":"a","totalSegments":2,"seriesId":"s"}
            ]},
            {"type":"book","id":"solo","title":"solo","description":"Standalone reading.","totalSegments":3}
        ]"#;

        let manifest: Manifest = serde_json::from_str(json)?;
        assert!(matches!(&manifest[0], LibraryItem::Series(s) if s.books.len() == 1));
        assert!(matches!(&manifest[1], LibraryItem::Book(b) if b.total_segments == 3));
        Ok(())
    }

    #[test]
    fn progress_record_uses_stored_field_names() -> anyhow::Result<()> {
        let record = ReadingProgress {
            lesson_id: "demo".to_owned(),
            segment_index: 2,
            last_read: 1_700_000_000_000,
            completed: false,
        };
        let json = serde_json::to_string(&record)?;
        assert_eq!(
            json,
            r#"{"bookId":"demo","segmentIndex":2,"lastRead":1700000000000,"isCompleted":false}"#
        );
        Ok(())
    }
}
