//! Keeps rendered paragraphs consistent with an external page-translation
//! overlay that rewrites text in place.
//!
//! On attach every paragraph's markup is snapshotted and stamped with its
//! index. Afterwards two rules are applied to observed child-list changes:
//! a paragraph that lost children is exempted from further overlay rewrites,
//! and inserted `<font>` wrappers are unwrapped so the paragraph keeps its
//! own styling. Toggling a paragraph swaps its live markup with the snapshot.

use crate::dom::{Document, MutationObserver, MutationRecord, NodeId};
use tracing::{debug, trace, warn};

pub const PARAGRAPH_TAG: &str = "p";
pub const INDEX_ATTRIBUTE: &str = "data-index";
pub const NO_TRANSLATE_CLASS: &str = "notranslate";
pub const TRANSLATED_CLASS: &str = "is-translated";
pub const FONT_WRAPPER_TAG: &str = "font";

const MAX_BATCHES_PER_PASS: usize = 64;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileStats {
    pub batches: usize,
    pub records: usize,
    pub exempted: usize,
    pub unwrapped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub index: usize,
    /// Whether the paragraph now carries the translated marker.
    pub translated: bool,
    /// `false` when no snapshot existed and the content was left alone.
    pub restored: bool,
}

#[derive(Debug)]
pub struct ParagraphReconciler {
    snapshots: Vec<Option<String>>,
    observer: MutationObserver,
}

impl ParagraphReconciler {
    pub fn attach(doc: &mut Document) -> Self {
        let paragraphs = doc.elements_by_tag(doc.body(), PARAGRAPH_TAG);
        let mut snapshots = Vec::with_capacity(paragraphs.len());
        for (index, paragraph) in paragraphs.into_iter().enumerate() {
            snapshots.push(Some(doc.inner_html(paragraph)));
            doc.set_attribute(paragraph, INDEX_ATTRIBUTE, &index.to_string());
        }
        let observer = doc.observe(doc.body());
        debug!(paragraphs = snapshots.len(), "Captured paragraph snapshots");
        Self {
            snapshots,
            observer,
        }
    }

    pub fn snapshot(&self, index: usize) -> Option<&str> {
        self.snapshots.get(index).and_then(Option::as_deref)
    }

    pub fn is_connected(&self) -> bool {
        self.observer.is_connected()
    }

    /// Apply both rules to everything observed so far, including the changes
    /// the rules themselves cause.
    pub fn process_pending(&mut self, doc: &mut Document) -> ReconcileStats {
        let mut stats = ReconcileStats::default();
        while stats.batches < MAX_BATCHES_PER_PASS {
            let batch = self.observer.take_records();
            if batch.is_empty() {
                return stats;
            }
            stats.batches += 1;
            stats.records += batch.len();
            for record in &batch {
                apply_record(doc, record, &mut stats);
            }
        }
        warn!(batches = stats.batches, "Paragraph reconciliation did not settle");
        stats
    }

    /// Swap the paragraph containing `node` with its snapshot.
    pub fn toggle_paragraph(&mut self, doc: &mut Document, node: NodeId) -> Option<ToggleOutcome> {
        let paragraph = doc.closest(node, PARAGRAPH_TAG)?;
        let index = paragraph_index(doc, paragraph)?;
        let current = doc.inner_html(paragraph);
        let was_translated = doc.has_class(paragraph, TRANSLATED_CLASS);

        doc.add_class(paragraph, NO_TRANSLATE_CLASS);
        let restored = match self.snapshots.get(index).and_then(Option::as_ref) {
            Some(snapshot) => {
                doc.set_inner_html(paragraph, snapshot);
                true
            }
            None => {
                warn!(index, "No snapshot for paragraph, leaving its content");
                false
            }
        };
        if was_translated {
            doc.remove_class(paragraph, TRANSLATED_CLASS);
        } else {
            doc.add_class(paragraph, TRANSLATED_CLASS);
        }

        if index >= self.snapshots.len() {
            self.snapshots.resize(index + 1, None);
        }
        self.snapshots[index] = Some(current);
        trace!(index, translated = !was_translated, "Toggled paragraph");
        Some(ToggleOutcome {
            index,
            translated: !was_translated,
            restored,
        })
    }

    pub fn disconnect(&mut self) {
        self.observer.disconnect();
    }
}

fn apply_record(doc: &mut Document, record: &MutationRecord, stats: &mut ReconcileStats) {
    if !record.removed.is_empty()
        && doc.is_element(record.target, PARAGRAPH_TAG)
        && !doc.has_class(record.target, NO_TRANSLATE_CLASS)
    {
        doc.add_class(record.target, NO_TRANSLATE_CLASS);
        stats.exempted += 1;
    }
    for added in &record.added {
        if doc.is_element(*added, FONT_WRAPPER_TAG)
            && doc.is_connected(*added)
            && doc.unwrap_element(*added)
        {
            stats.unwrapped += 1;
        }
    }
}

/// Index stamp of `paragraph`, or its position among sibling paragraphs when
/// the stamp is missing or unreadable.
pub fn paragraph_index(doc: &Document, paragraph: NodeId) -> Option<usize> {
    if let Some(stamp) = doc.attribute(paragraph, INDEX_ATTRIBUTE) {
        match stamp.trim().parse() {
            Ok(index) => return Some(index),
            Err(_) => debug!(stamp, "Unreadable paragraph index, counting siblings"),
        }
    }
    if !doc.is_element(paragraph, PARAGRAPH_TAG) {
        return None;
    }
    let mut index = 0;
    let mut current = paragraph;
    while let Some(previous) = doc.previous_element_sibling(current) {
        if doc.is_element(previous, PARAGRAPH_TAG) {
            index += 1;
        }
        current = previous;
    }
    Some(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraph(doc: &Document, index: usize) -> NodeId {
        doc.elements_by_tag(doc.body(), PARAGRAPH_TAG)[index]
    }

    #[test]
    fn attach_stamps_indices_and_snapshots() {
        let mut doc = Document::from_body_html("<p>a</p><div><p>b</p></div><p><i>c</i></p>");
        let reconciler = ParagraphReconciler::attach(&mut doc);
        assert_eq!(doc.attribute(paragraph(&doc, 2), INDEX_ATTRIBUTE), Some("2"));
        assert_eq!(reconciler.snapshot(2), Some("<i>c</i>"));
        assert_eq!(reconciler.snapshot(3), None);
    }

    #[test]
    fn overlay_rewrite_exempts_paragraph_and_unwraps_font() {
        let mut doc = Document::from_body_html("<p>Hello</p><p>World</p>");
        let mut reconciler = ParagraphReconciler::attach(&mut doc);
        let first = paragraph(&doc, 0);

        doc.set_inner_html(first, "<font><font>Bonjour</font></font>");
        let stats = reconciler.process_pending(&mut doc);

        assert!(doc.has_class(first, NO_TRANSLATE_CLASS));
        assert!(!doc.has_class(paragraph(&doc, 1), NO_TRANSLATE_CLASS));
        assert_eq!(doc.inner_html(first), "Bonjour");
        assert_eq!(stats.unwrapped, 2);
        assert_eq!(stats.exempted, 1);
    }

    #[test]
    fn exemption_is_idempotent() {
        let mut doc = Document::from_body_html(r#"<p class="notranslate">a</p>"#);
        let mut reconciler = ParagraphReconciler::attach(&mut doc);
        let first = paragraph(&doc, 0);
        doc.set_inner_html(first, "b");
        let stats = reconciler.process_pending(&mut doc);
        assert_eq!(stats.exempted, 0);
        assert_eq!(doc.attribute(first, "class"), Some("notranslate"));
    }

    #[test]
    fn toggling_twice_restores_the_translated_markup() {
        let mut doc = Document::from_body_html("<p>Hello <b>there</b></p>");
        let mut reconciler = ParagraphReconciler::attach(&mut doc);
        let first = paragraph(&doc, 0);
        doc.set_inner_html(first, "Bonjour <b>toi</b>");
        reconciler.process_pending(&mut doc);
        let translated = doc.inner_html(first);

        let text = doc.children(first)[0];
        let outcome = reconciler.toggle_paragraph(&mut doc, text).unwrap();
        assert_eq!(doc.inner_html(first), "Hello <b>there</b>");
        assert!(outcome.translated && outcome.restored);
        assert!(doc.has_class(first, TRANSLATED_CLASS));

        let text = doc.children(first)[0];
        let outcome = reconciler.toggle_paragraph(&mut doc, text).unwrap();
        assert!(!outcome.translated);
        assert_eq!(doc.inner_html(first), translated);
        assert!(!doc.has_class(first, TRANSLATED_CLASS));
        assert!(doc.has_class(first, NO_TRANSLATE_CLASS));
    }

    #[test]
    fn missing_stamp_falls_back_to_sibling_count() {
        let mut doc = Document::from_body_html("<p>0</p><p>1</p><hr><p>2</p><p>3</p>");
        let mut reconciler = ParagraphReconciler::attach(&mut doc);
        let fourth = paragraph(&doc, 3);
        doc.remove_attribute(fourth, INDEX_ATTRIBUTE);
        assert_eq!(paragraph_index(&doc, fourth), Some(3));

        let outcome = reconciler.toggle_paragraph(&mut doc, fourth).unwrap();
        assert_eq!(outcome.index, 3);
        assert_eq!(doc.inner_html(fourth), "3");
    }

    #[test]
    fn missing_snapshot_leaves_content_but_flips_marker() {
        let mut doc = Document::from_body_html("<p>a</p>");
        let mut reconciler = ParagraphReconciler::attach(&mut doc);
        let first = paragraph(&doc, 0);
        doc.set_attribute(first, INDEX_ATTRIBUTE, "9");

        let outcome = reconciler.toggle_paragraph(&mut doc, first).unwrap();
        assert!(!outcome.restored);
        assert_eq!(doc.inner_html(first), "a");
        assert!(doc.has_class(first, TRANSLATED_CLASS));
        assert_eq!(reconciler.snapshot(9), Some("a"));
    }

    #[test]
    fn clicks_outside_paragraphs_are_ignored() {
        let mut doc = Document::from_body_html("<div>x</div>");
        let mut reconciler = ParagraphReconciler::attach(&mut doc);
        let div = doc.elements_by_tag(doc.body(), "div")[0];
        assert!(reconciler.toggle_paragraph(&mut doc, div).is_none());
    }

    #[test]
    fn disconnected_reconciler_ignores_changes() {
        let mut doc = Document::from_body_html("<p>a</p>");
        let mut reconciler = ParagraphReconciler::attach(&mut doc);
        reconciler.disconnect();
        let first = paragraph(&doc, 0);
        doc.set_inner_html(first, "<font>b</font>");
        assert_eq!(reconciler.process_pending(&mut doc), ReconcileStats::default());
        assert!(!doc.has_class(first, NO_TRANSLATE_CLASS));
    }
}
