//! Persisted book records and the content loaded for rendering.

use crate::annotation::{Annotation, AnnotationColor, AnnotationType, SpineRef};
use crate::rendition::NavItem;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: String,
    pub name: String,
    /// Source file the content is re-read from.
    pub content_ref: String,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cfi: Option<String>,
    #[serde(default)]
    pub percentage: f64,
    #[serde(default)]
    pub definitions: Vec<String>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

/// Fields of an annotation supplied by the selection menu.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationDraft {
    pub kind: AnnotationType,
    pub cfi: String,
    pub color: AnnotationColor,
    pub text: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationChange {
    Created(String),
    Updated(String),
}

impl Book {
    pub fn new(id: impl Into<String>, name: impl Into<String>, content_ref: impl Into<String>) -> Self {
        let now = now_millis();
        Self {
            id: id.into(),
            name: name.into(),
            content_ref: content_ref.into(),
            created_at: now,
            updated_at: now,
            cfi: None,
            percentage: 0.0,
            definitions: Vec::new(),
            annotations: Vec::new(),
        }
    }

    pub fn annotation(&self, cfi: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|annotation| annotation.cfi == cfi)
    }

    /// Update the annotation at the draft's locator in place, or append a new one.
    pub fn put_annotation(&mut self, draft: AnnotationDraft, spine: SpineRef, now: i64) -> AnnotationChange {
        let notes = draft
            .notes
            .map(|notes| notes.trim().to_string())
            .filter(|notes| !notes.is_empty());
        self.updated_at = now;
        if let Some(existing) = self
            .annotations
            .iter_mut()
            .find(|annotation| annotation.cfi == draft.cfi)
        {
            existing.kind = draft.kind;
            existing.color = draft.color;
            existing.notes = notes;
            existing.text = draft.text;
            existing.spine = spine;
            existing.updated_at = now;
            return AnnotationChange::Updated(existing.id.clone());
        }

        let id = uuid::Uuid::new_v4().to_string();
        self.annotations.push(Annotation {
            id: id.clone(),
            book_id: self.id.clone(),
            cfi: draft.cfi,
            spine,
            created_at: now,
            updated_at: now,
            kind: draft.kind,
            color: draft.color,
            notes,
            text: draft.text,
        });
        AnnotationChange::Created(id)
    }

    pub fn remove_annotation(&mut self, cfi: &str) -> bool {
        let before = self.annotations.len();
        self.annotations.retain(|annotation| annotation.cfi != cfi);
        let removed = self.annotations.len() != before;
        if removed {
            self.updated_at = now_millis();
        }
        removed
    }

    /// Add words to the definition list; returns how many were new.
    pub fn define<S: AsRef<str>>(&mut self, words: &[S]) -> usize {
        let mut added = 0;
        for word in words {
            let word = normalize_definition(word.as_ref());
            if word.is_empty() || self.definitions.contains(&word) {
                continue;
            }
            self.definitions.push(word);
            added += 1;
        }
        if added > 0 {
            self.updated_at = now_millis();
        }
        added
    }

    pub fn undefine(&mut self, word: &str) -> bool {
        let word = normalize_definition(word);
        let before = self.definitions.len();
        self.definitions.retain(|existing| *existing != word);
        let removed = self.definitions.len() != before;
        if removed {
            self.updated_at = now_millis();
        }
        removed
    }

    pub fn is_defined(&self, word: &str) -> bool {
        let word = normalize_definition(word);
        self.definitions.iter().any(|existing| *existing == word)
    }
}

pub fn normalize_definition(word: &str) -> String {
    word.trim().nfc().collect()
}

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub href: String,
    pub html: String,
}

/// Renderable content of a book: body markup per spine item plus the TOC.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BookContent {
    pub sections: Vec<Section>,
    pub toc: Vec<NavItem>,
}
