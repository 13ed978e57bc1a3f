use super::search::{SearchResult, search_sections};
use crate::annotation::{AnnotationColor, AnnotationType, SpineRef};
use crate::book::{AnnotationChange, AnnotationDraft, Book, now_millis};
use crate::dom::{Document, NodeId};
use crate::reconcile::{PARAGRAPH_TAG, ParagraphReconciler, ReconcileStats, ToggleOutcome};
use crate::rendition::{
    ContainerId, Location, NavItem, Rendition, RenditionEvent, SectionInfo, Typography,
    same_document,
};
use crate::selection::TextRange;
use serde::Serialize;
use tracing::{debug, trace, warn};

/// Passes over the rendition's event queue per pump; events may enqueue more.
const MAX_EVENT_ROUNDS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderState {
    Uninitialized,
    Rendering,
    Rendered,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavCrumb {
    pub id: String,
    pub label: String,
    pub href: String,
}

/// An open book: its record, its rendition and per-tab reading state.
pub struct BookTab {
    book: Book,
    rendition: Box<dyn Rendition>,
    state: RenderState,
    container: Option<ContainerId>,
    nav: Vec<NavItem>,
    section: Option<SectionInfo>,
    location: Option<Location>,
    prev_location: Option<Location>,
    pub(in crate::app) annotation_range: Option<TextRange>,
    keyword: String,
    results: Vec<SearchResult>,
    reconciler: Option<ParagraphReconciler>,
    typography: Typography,
    dirty: bool,
}

impl BookTab {
    pub fn new(book: Book, rendition: Box<dyn Rendition>) -> Self {
        Self {
            book,
            rendition,
            state: RenderState::Uninitialized,
            container: None,
            nav: Vec::new(),
            section: None,
            location: None,
            prev_location: None,
            annotation_range: None,
            keyword: String::new(),
            results: Vec::new(),
            reconciler: None,
            typography: Typography::default(),
            dirty: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.book.id
    }

    pub fn title(&self) -> &str {
        &self.book.name
    }

    pub fn book(&self) -> &Book {
        &self.book
    }

    pub fn render_state(&self) -> RenderState {
        self.state
    }

    pub fn is_rendered(&self) -> bool {
        self.state == RenderState::Rendered
    }

    pub fn container(&self) -> Option<ContainerId> {
        self.container
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    pub fn location_to_return(&self) -> Option<&Location> {
        self.prev_location.as_ref()
    }

    pub fn section(&self) -> Option<&SectionInfo> {
        self.section.as_ref()
    }

    pub fn nav(&self) -> &[NavItem] {
        &self.nav
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn results(&self) -> &[SearchResult] {
        &self.results
    }

    pub fn annotation_range(&self) -> Option<&TextRange> {
        self.annotation_range.as_ref()
    }

    pub fn document(&self) -> Option<&Document> {
        self.rendition.document()
    }

    /// Mutable access to the rendered section, as the host's overlay sees it.
    pub fn document_mut(&mut self) -> Option<&mut Document> {
        self.rendition.document_mut()
    }

    pub fn rendition(&self) -> &dyn Rendition {
        self.rendition.as_ref()
    }

    /// Mount into `container`. Rendering the same container again is a no-op.
    /// The stored location, if any, is displayed once mounted.
    pub fn render(&mut self, container: ContainerId) {
        if self.container == Some(container) && self.state != RenderState::Uninitialized {
            trace!(id = %self.book.id, "Already rendered into container");
            return;
        }
        self.container = Some(container);
        self.state = RenderState::Rendering;
        if let Err(err) = self.rendition.render(container) {
            warn!(id = %self.book.id, "Failed to render book: {err:#}");
            self.state = RenderState::Uninitialized;
            return;
        }
        self.nav = self.rendition.toc();
        if let Some(cfi) = self.book.cfi.clone() {
            if let Err(err) = self.rendition.display(Some(cfi.as_str())) {
                warn!(id = %self.book.id, cfi = %cfi, "Stored location is not displayable: {err:#}");
            }
        }
    }

    /// Drain rendition events and reconcile pending content mutations.
    /// Returns whether any event arrived.
    pub fn pump_events(&mut self) -> bool {
        let mut changed = false;
        for _ in 0..MAX_EVENT_ROUNDS {
            let events = self.rendition.poll_events();
            if events.is_empty() {
                break;
            }
            changed = true;
            for event in events {
                match event {
                    RenditionEvent::Rendered(section) => self.on_rendered(section),
                    RenditionEvent::Relocated(location) => self.on_relocated(location),
                }
            }
        }
        self.reconcile();
        changed
    }

    fn on_rendered(&mut self, section: SectionInfo) {
        debug!(id = %self.book.id, index = section.index, href = %section.href, "Section rendered");
        self.state = RenderState::Rendered;
        self.section = Some(section);
        if let Some(mut previous) = self.reconciler.take() {
            previous.disconnect();
        }
        self.reconciler = self.rendition.document_mut().map(ParagraphReconciler::attach);
        self.typography.apply(self.rendition.as_mut());
        self.expand_nav_path();
    }

    fn on_relocated(&mut self, location: Location) {
        if self.book.cfi.as_deref() != Some(location.start.cfi.as_str()) {
            self.book.cfi = Some(location.start.cfi.clone());
            self.book.percentage = location.start.percentage;
            self.book.updated_at = now_millis();
            self.dirty = true;
        }
        self.location = Some(location);
    }

    pub fn reconcile(&mut self) -> ReconcileStats {
        match (self.reconciler.as_mut(), self.rendition.document_mut()) {
            (Some(reconciler), Some(doc)) => reconciler.process_pending(doc),
            _ => ReconcileStats::default(),
        }
    }

    pub fn prev(&mut self) {
        if !self.is_rendered() {
            debug!(id = %self.book.id, "Ignoring prev before render completed");
            return;
        }
        if let Err(err) = self.rendition.prev() {
            warn!(id = %self.book.id, "Failed to turn page back: {err:#}");
        }
    }

    pub fn next(&mut self) {
        if !self.is_rendered() {
            debug!(id = %self.book.id, "Ignoring next before render completed");
            return;
        }
        if let Err(err) = self.rendition.next() {
            warn!(id = %self.book.id, "Failed to turn page: {err:#}");
        }
    }

    /// Jump to `target`. A returnable jump remembers the current location so
    /// the reader can come back to it.
    pub fn display(&mut self, target: &str, returnable: bool) {
        if !self.is_rendered() {
            debug!(id = %self.book.id, target, "Ignoring display before render completed");
            return;
        }
        match self.rendition.display(Some(target)) {
            Ok(()) if returnable => self.show_prev_location(),
            Ok(()) => {}
            Err(err) => {
                warn!(id = %self.book.id, target, "Failed to display location: {err:#}");
            }
        }
    }

    pub fn show_prev_location(&mut self) {
        self.prev_location = self.location.clone();
    }

    pub fn hide_prev_location(&mut self) {
        self.prev_location = None;
    }

    /// Go back to the remembered location and forget it.
    pub fn return_to_prev_location(&mut self) {
        let Some(previous) = self.prev_location.take() else {
            return;
        };
        self.display(&previous.end.cfi, false);
    }

    pub fn resize(&mut self) {
        self.rendition.resize();
    }

    pub fn apply_typography(&mut self, typography: &Typography) {
        self.typography = typography.clone();
        if self.is_rendered() {
            self.typography.apply(self.rendition.as_mut());
        }
    }

    pub fn nav_path(&self) -> Vec<NavCrumb> {
        let Some(section) = &self.section else {
            return Vec::new();
        };
        let Some(path) = find_nav_path(&self.nav, &section.href) else {
            return Vec::new();
        };
        let mut crumbs = Vec::with_capacity(path.len());
        let mut items = self.nav.as_slice();
        for index in path {
            let Some(item) = items.get(index) else {
                break;
            };
            crumbs.push(NavCrumb {
                id: item.id.clone(),
                label: item.label.clone(),
                href: item.href.clone(),
            });
            items = &item.subitems;
        }
        crumbs
    }

    /// Mark every TOC entry on the path to the current section as expanded.
    pub fn expand_nav_path(&mut self) {
        let Some(section) = &self.section else {
            return;
        };
        let Some(path) = find_nav_path(&self.nav, &section.href) else {
            return;
        };
        let mut items = &mut self.nav;
        for index in path {
            let Some(item) = items.get_mut(index) else {
                break;
            };
            item.expanded = true;
            items = &mut item.subitems;
        }
    }

    /// Add or update the annotation at `cfi` in the current section.
    pub fn put_annotation(
        &mut self,
        kind: AnnotationType,
        cfi: &str,
        color: AnnotationColor,
        text: &str,
        notes: Option<String>,
    ) -> Option<AnnotationChange> {
        let Some(index) = self.section.as_ref().map(|section| section.index) else {
            warn!(id = %self.book.id, "Cannot annotate before a section is rendered");
            return None;
        };
        let title = self
            .nav_path()
            .pop()
            .map(|crumb| crumb.label)
            .unwrap_or_default();
        let change = self.book.put_annotation(
            AnnotationDraft {
                kind,
                cfi: cfi.to_string(),
                color,
                text: text.to_string(),
                notes,
            },
            SpineRef { index, title },
            now_millis(),
        );
        debug!(id = %self.book.id, ?change, "Stored annotation");
        self.dirty = true;
        Some(change)
    }

    pub fn remove_annotation(&mut self, cfi: &str) -> bool {
        let removed = self.book.remove_annotation(cfi);
        self.dirty |= removed;
        removed
    }

    pub fn define<S: AsRef<str>>(&mut self, words: &[S]) -> usize {
        let added = self.book.define(words);
        self.dirty |= added > 0;
        added
    }

    pub fn undefine(&mut self, word: &str) -> bool {
        let removed = self.book.undefine(word);
        self.dirty |= removed;
        removed
    }

    pub fn is_defined(&self, word: &str) -> bool {
        self.book.is_defined(word)
    }

    /// Set the in-book search keyword and refresh the results.
    pub fn set_keyword(&mut self, keyword: &str) {
        let keyword = keyword.trim();
        if keyword == self.keyword {
            return;
        }
        self.keyword = keyword.to_string();
        self.results = search_sections(&self.rendition.sections(), keyword);
    }

    /// Element node of the `index`-th paragraph in the rendered section.
    pub fn paragraph_node(&self, index: usize) -> Option<NodeId> {
        let doc = self.rendition.document()?;
        doc.elements_by_tag(doc.body(), PARAGRAPH_TAG).get(index).copied()
    }

    pub fn toggle_paragraph(&mut self, node: NodeId) -> Option<ToggleOutcome> {
        let (Some(reconciler), Some(doc)) = (self.reconciler.as_mut(), self.rendition.document_mut())
        else {
            return None;
        };
        reconciler.toggle_paragraph(doc, node)
    }

    /// Book record to persist, when it changed since the last call.
    pub(in crate::app) fn take_dirty(&mut self) -> Option<Book> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        Some(self.book.clone())
    }

    /// Forget the mount so the tab is rendered again wherever it lands next.
    pub(in crate::app) fn detach(&mut self) {
        self.close();
        self.container = None;
    }

    pub(in crate::app) fn close(&mut self) {
        if let Some(mut reconciler) = self.reconciler.take() {
            reconciler.disconnect();
        }
        self.state = RenderState::Uninitialized;
        debug!(id = %self.book.id, "Closed book tab");
    }
}

fn find_nav_path(items: &[NavItem], href: &str) -> Option<Vec<usize>> {
    for (index, item) in items.iter().enumerate() {
        if same_document(&item.href, href) {
            return Some(vec![index]);
        }
        if let Some(mut rest) = find_nav_path(&item.subitems, href) {
            rest.insert(0, index);
            return Some(rest);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::{BookContent, Section};
    use crate::reconcile::{NO_TRANSLATE_CLASS, TRANSLATED_CLASS};
    use crate::rendition::{PagedRendition, section_cfi};

    fn nav(id: &str, href: &str, label: &str, subitems: Vec<NavItem>) -> NavItem {
        NavItem {
            id: id.to_string(),
            href: href.to_string(),
            label: label.to_string(),
            subitems,
            expanded: false,
        }
    }

    fn sample_tab(id: &str) -> BookTab {
        let content = BookContent {
            sections: vec![
                Section {
                    href: "text/part1.xhtml".into(),
                    html: "<p>One</p><p>Two</p><p>Three</p>".into(),
                },
                Section {
                    href: "text/ch2.xhtml".into(),
                    html: "<p>Whale ahead</p><p>Another whale</p>".into(),
                },
            ],
            toc: vec![nav(
                "n1",
                "text/part1.xhtml",
                "Part One",
                vec![nav("n2", "text/ch2.xhtml#start", "Chapter Two", Vec::new())],
            )],
        };
        let book = Book::new(id, format!("Book {id}"), format!("{id}.epub"));
        BookTab::new(book, Box::new(PagedRendition::new(content, 2)))
    }

    fn rendered(id: &str) -> BookTab {
        let mut tab = sample_tab(id);
        tab.render(ContainerId(1));
        tab.pump_events();
        tab
    }

    #[test]
    fn navigation_before_render_completes_is_ignored() {
        let mut tab = sample_tab("a");
        tab.next();
        tab.render(ContainerId(1));
        tab.next();
        assert_eq!(tab.render_state(), RenderState::Rendering);
        assert!(tab.location().is_none());

        tab.pump_events();
        assert!(tab.is_rendered());
        assert_eq!(tab.location().unwrap().start.page, 0);
    }

    #[test]
    fn render_is_idempotent_per_container() {
        let mut tab = rendered("a");
        tab.next();
        tab.pump_events();
        tab.render(ContainerId(1));
        tab.pump_events();
        assert_eq!(tab.location().unwrap().start.page, 1);
    }

    #[test]
    fn render_restores_the_stored_location() {
        let mut tab = sample_tab("a");
        tab.book.cfi = Some(section_cfi(1, 0));
        tab.render(ContainerId(1));
        tab.pump_events();
        assert_eq!(tab.location().unwrap().start.section_index, 1);
    }

    #[test]
    fn relocation_marks_the_book_dirty() {
        let mut tab = rendered("a");
        assert!(tab.take_dirty().is_some());
        assert!(tab.take_dirty().is_none());
        tab.next();
        tab.pump_events();
        let book = tab.take_dirty().unwrap();
        assert_eq!(book.cfi.as_deref(), Some(section_cfi(0, 2).as_str()));
    }

    #[test]
    fn returnable_display_remembers_and_returns() {
        let mut tab = rendered("a");
        tab.display(&section_cfi(1, 0), true);
        tab.pump_events();
        assert_eq!(tab.location_to_return().unwrap().start.section_index, 0);

        tab.return_to_prev_location();
        tab.pump_events();
        assert!(tab.location_to_return().is_none());
        assert_eq!(tab.location().unwrap().start.section_index, 0);

        tab.display(&section_cfi(1, 0), false);
        tab.pump_events();
        assert!(tab.location_to_return().is_none());
    }

    #[test]
    fn failed_display_offers_no_return() {
        let mut tab = rendered("a");
        tab.display("text/missing.xhtml", true);
        tab.pump_events();
        assert!(tab.location_to_return().is_none());
        assert_eq!(tab.location().unwrap().start.section_index, 0);
    }

    #[test]
    fn nav_path_follows_the_current_section() {
        let mut tab = rendered("a");
        tab.display("text/ch2.xhtml", false);
        tab.pump_events();
        let labels: Vec<_> = tab.nav_path().into_iter().map(|crumb| crumb.label).collect();
        assert_eq!(labels, vec!["Part One", "Chapter Two"]);
        assert!(tab.nav()[0].expanded);
        assert!(tab.nav()[0].subitems[0].expanded);
    }

    #[test]
    fn annotations_require_a_rendered_section() {
        let mut tab = sample_tab("a");
        assert!(
            tab.put_annotation(AnnotationType::Highlight, "c", AnnotationColor::Red, "t", None)
                .is_none()
        );

        let mut tab = rendered("a");
        tab.take_dirty();
        let change = tab
            .put_annotation(AnnotationType::Highlight, "c", AnnotationColor::Red, "t", None)
            .unwrap();
        assert!(matches!(change, AnnotationChange::Created(_)));
        let annotation = &tab.book().annotations[0];
        assert_eq!(annotation.spine.title, "Part One");
        assert_eq!(annotation.book_id, "a");
        assert!(tab.take_dirty().is_some());
        assert!(tab.remove_annotation("c"));
    }

    #[test]
    fn keyword_search_covers_every_section() {
        let mut tab = rendered("a");
        tab.set_keyword(" whale ");
        assert_eq!(tab.keyword(), "whale");
        assert_eq!(tab.results().len(), 1);
        assert_eq!(tab.results()[0].excerpts.len(), 2);
    }

    #[test]
    fn overlay_rewrites_are_reconciled_and_toggleable() {
        let mut tab = rendered("a");
        let first = tab.paragraph_node(0).unwrap();
        tab.document_mut()
            .unwrap()
            .set_inner_html(first, "<font>Un</font>");
        tab.pump_events();
        let doc = tab.document().unwrap();
        assert_eq!(doc.inner_html(first), "Un");
        assert!(doc.has_class(first, NO_TRANSLATE_CLASS));

        let outcome = tab.toggle_paragraph(first).unwrap();
        assert!(outcome.restored);
        let doc = tab.document().unwrap();
        assert_eq!(doc.inner_html(first), "One");
        assert!(doc.has_class(first, TRANSLATED_CLASS));
    }

    #[test]
    fn typography_is_applied_after_render() {
        let mut tab = sample_tab("a");
        tab.apply_typography(&Typography {
            font_family: Some("Georgia".to_string()),
            dark: true,
            ..Typography::default()
        });
        assert!(tab.rendition().themes().overrides().is_empty());
        tab.render(ContainerId(1));
        tab.pump_events();
        let themes = tab.rendition().themes();
        assert_eq!(themes.font_family(), Some("Georgia"));
        assert_eq!(themes.overrides()[0].value, crate::rendition::DARK_TEXT_COLOR);
        assert!(themes.overrides()[0].important);
    }
}
