//! Built-in sample library served when the compiled artifacts cannot be fetched.

use crate::formats::{
    BookTag, LessonDocument, LessonRef, LibraryItem, Manifest, Segment, Series, SeriesTag,
};

const SERIES_ID: &str = "series-english-pod";

pub fn manifest() -> Manifest {
    vec![
        LibraryItem::Series(Series {
            kind: SeriesTag::Series,
            id: SERIES_ID.to_owned(),
            title: "EnglishPod Collection".to_owned(),
            description: "A comprehensive series for English learners.".to_owned(),
            books: vec![
                lesson_ref(
                    "ep-001",
                    "Lesson 1: Introduction",
                    "Welcome to EnglishPod.",
                    5,
                    Some(SERIES_ID),
                ),
                lesson_ref(
                    "ep-002",
                    "Lesson 2: Difficult Customer",
                    "Handling complaints nicely.",
                    4,
                    Some(SERIES_ID),
                ),
            ],
        }),
        LibraryItem::Book(lesson_ref(
            "demo-steve-jobs",
            "Steve Jobs Commencement Speech",
            "Stay Hungry. Stay Foolish. Stanford 2005.",
            3,
            None,
        )),
    ]
}

pub fn lesson(id: &str) -> Option<LessonDocument> {
    let (title, series_id, pairs): (&str, Option<&str>, &[(&str, &str)]) = match id {
        "ep-001" => (
            "Lesson 1: Introduction",
            Some(SERIES_ID),
            &[
                (
                    "Hello, English learners, and welcome to EnglishPod.",
                    "你好，英语学习者，欢迎来到EnglishPod。",
                ),
                ("My name is Marco.", "我叫Marco。"),
                ("I'm Amira.", "我是Amira。"),
                (
                    "And Amira and I are here today with a great, great lesson for you.",
                    "今天Amira和我为你们准备了一堂非常棒的课。",
                ),
                ("Yes, we are.", "是的，我们准备好了。"),
            ],
        ),
        "ep-002" => (
            "Lesson 2: Difficult Customer",
            Some(SERIES_ID),
            &[
                ("This soup is cold!", "这汤是凉的！"),
                (
                    "I'm terribly sorry sir, let me change it for you.",
                    "非常抱歉先生，让我为您换一碗。",
                ),
                (
                    "Don't just change it, I want to speak to the manager.",
                    "别只是换，我要见经理。",
                ),
                ("Certainly sir.", "好的先生。"),
            ],
        ),
        "demo-steve-jobs" => (
            "Steve Jobs Commencement Speech",
            None,
            &[
                (
                    "I am honored to be with you today at your commencement from one of the finest universities in the world.",
                    "今天，我很荣幸能和你们一起参加毕业典礼，这所大学是世界上最好的大学之一。",
                ),
                (
                    "I never graduated from college. Truth be told, this is the closest I've ever gotten to a college graduation.",
                    "我从来没有从大学毕业。说实话，这是我离大学毕业最近的一次。",
                ),
                (
                    "Today I want to tell you three stories from my life. That's it. No big deal. Just three stories.",
                    "今天我想给你们讲三个我生活中的故事。就是这样。没什么大不了的。只是三个故事。",
                ),
            ],
        ),
        _ => return None,
    };

    let segments = pairs
        .iter()
        .zip(1_u64..)
        .map(|((primary, secondary), id)| Segment {
            id,
            primary: (*primary).to_owned(),
            secondary: (*secondary).to_owned(),
        })
        .collect();

    Some(LessonDocument::new(
        id.to_owned(),
        title.to_owned(),
        series_id.map(str::to_owned),
        segments,
    ))
}

fn lesson_ref(
    id: &str,
    title: &str,
    description: &str,
    total_segments: usize,
    series_id: Option<&str>,
) -> LessonRef {
    LessonRef {
        kind: BookTag::Book,
        id: id.to_owned(),
        title: title.to_owned(),
        description: Some(description.to_owned()),
        total_segments,
        series_id: series_id.map(str::to_owned),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_manifest_lesson_has_matching_content() {
        for item in manifest() {
            let lessons = match item {
                LibraryItem::Book(book) => vec![book],
                LibraryItem::Series(series) => series.books,
            };
            for entry in lessons {
                let doc = lesson(&entry.id).expect("demo lesson content");
                assert_eq!(doc.lesson.total_segments, entry.total_segments);
                assert_eq!(doc.lesson.series_id, entry.series_id);
            }
        }
        assert!(lesson("missing").is_none());
    }
}
