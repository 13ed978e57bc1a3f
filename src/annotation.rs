//! Annotation records and the fixed style tables the selection menu offers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationType {
    Highlight,
}

impl AnnotationType {
    /// CSS property the annotation colour is painted with.
    pub fn style_property(self) -> &'static str {
        match self {
            AnnotationType::Highlight => "background-color",
        }
    }

    pub fn class_name(self) -> &'static str {
        match self {
            AnnotationType::Highlight => "rounded",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationColor {
    Yellow,
    Red,
    Green,
    Blue,
}

impl AnnotationColor {
    // dark colour at low opacity reads better than a light colour at high opacity
    pub fn rgba(self) -> &'static str {
        match self {
            AnnotationColor::Yellow => "rgba(140, 140, 10, 0.6)",
            AnnotationColor::Red => "rgba(140, 20, 20, 0.6)",
            AnnotationColor::Green => "rgba(10, 140, 50, 0.6)",
            AnnotationColor::Blue => "rgba(10, 50, 140, 0.6)",
        }
    }
}

impl std::str::FromStr for AnnotationColor {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "yellow" => Ok(AnnotationColor::Yellow),
            "red" => Ok(AnnotationColor::Red),
            "green" => Ok(AnnotationColor::Green),
            "blue" => Ok(AnnotationColor::Blue),
            other => Err(format!("unknown annotation color `{other}`")),
        }
    }
}

pub const ANNOTATION_TYPES: [AnnotationType; 1] = [AnnotationType::Highlight];
pub const ANNOTATION_COLORS: [AnnotationColor; 4] = [
    AnnotationColor::Yellow,
    AnnotationColor::Red,
    AnnotationColor::Green,
    AnnotationColor::Blue,
];

/// Section of the book an annotation was made in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpineRef {
    pub index: usize,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub id: String,
    pub book_id: String,
    /// Range locator; unique per book.
    pub cfi: String,
    pub spine: SpineRef,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(rename = "type")]
    pub kind: AnnotationType,
    pub color: AnnotationColor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChapterAnnotations {
    pub spine_index: usize,
    pub title: String,
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookAnnotations {
    pub book_id: String,
    pub chapters: Vec<ChapterAnnotations>,
}

/// Group annotations by book, then by spine index, for the annotation list.
/// Records without a book id are skipped.
pub fn group_annotations(annotations: &[Annotation]) -> Vec<BookAnnotations> {
    let mut grouped: BTreeMap<&str, BTreeMap<usize, Vec<Annotation>>> = BTreeMap::new();
    for annotation in annotations {
        if annotation.book_id.is_empty() {
            continue;
        }
        grouped
            .entry(annotation.book_id.as_str())
            .or_default()
            .entry(annotation.spine.index)
            .or_default()
            .push(annotation.clone());
    }

    grouped
        .into_iter()
        .map(|(book_id, chapters)| BookAnnotations {
            book_id: book_id.to_string(),
            chapters: chapters
                .into_iter()
                .map(|(spine_index, annotations)| ChapterAnnotations {
                    spine_index,
                    title: annotations
                        .first()
                        .map(|first| first.spine.title.trim())
                        .filter(|title| !title.is_empty())
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("Chapter {spine_index}")),
                    annotations,
                })
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotation(book_id: &str, spine: usize, title: &str, cfi: &str) -> Annotation {
        Annotation {
            id: cfi.to_string(),
            book_id: book_id.to_string(),
            cfi: cfi.to_string(),
            spine: SpineRef {
                index: spine,
                title: title.to_string(),
            },
            created_at: 0,
            updated_at: 0,
            kind: AnnotationType::Highlight,
            color: AnnotationColor::Yellow,
            notes: None,
            text: "text".to_string(),
        }
    }

    #[test]
    fn groups_by_book_then_spine() {
        let grouped = group_annotations(&[
            annotation("b", 2, "Two", "c1"),
            annotation("a", 1, "", "c2"),
            annotation("b", 0, "Zero", "c3"),
            annotation("", 0, "Orphan", "c4"),
            annotation("b", 2, "Two", "c5"),
        ]);

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].book_id, "a");
        assert_eq!(grouped[0].chapters[0].title, "Chapter 1");
        assert_eq!(grouped[1].chapters.len(), 2);
        assert_eq!(grouped[1].chapters[0].spine_index, 0);
        assert_eq!(grouped[1].chapters[1].annotations.len(), 2);
    }

    #[test]
    fn serializes_with_wire_field_names() {
        let json = serde_json::to_value(annotation("b", 1, "One", "epubcfi(/6/4!/4/2)")).unwrap();
        assert_eq!(json["type"], "highlight");
        assert_eq!(json["bookId"], "b");
        assert_eq!(json["color"], "yellow");
        assert!(json.get("notes").is_none());
    }

    #[test]
    fn parses_colors_case_insensitively() {
        assert_eq!("Blue".parse::<AnnotationColor>(), Ok(AnnotationColor::Blue));
        assert!("purple".parse::<AnnotationColor>().is_err());
    }
}
