//! Rendering dependency: the paginated view of one book that a tab drives.
//!
//! A [`Rendition`] owns the rendered section [`Document`], turns location
//! targets into pages and reports progress through [`RenditionEvent`]s that
//! the owning tab drains with [`Rendition::poll_events`].

mod cfi;
mod paged;

pub use cfi::{CfiTarget, parse_cfi, range_cfi, section_cfi};
pub use paged::{PagedRendition, PagedRenditionFactory};

use crate::book::BookContent;
use crate::dom::Document;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Host element a rendition is mounted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ContainerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Spread {
    None,
    #[default]
    Auto,
    Always,
}

impl Spread {
    /// Number of columns shown at once.
    pub fn columns(self) -> usize {
        match self {
            Spread::Always => 2,
            Spread::None | Spread::Auto => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Position {
    pub cfi: String,
    pub href: String,
    pub section_index: usize,
    /// Zero-based page within the section.
    pub page: usize,
    pub total: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Location {
    pub start: Position,
    pub end: Position,
    pub at_start: bool,
    pub at_end: bool,
}

impl Location {
    /// Header label such as `3 / 10`.
    pub fn page_label(&self) -> String {
        format!("{} / {}", self.start.page + 1, self.start.total)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavItem {
    pub id: String,
    pub href: String,
    pub label: String,
    #[serde(default)]
    pub subitems: Vec<NavItem>,
    #[serde(default)]
    pub expanded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionInfo {
    pub index: usize,
    pub href: String,
}

/// Plain text of one section, used for in-book search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionText {
    pub index: usize,
    pub href: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenditionEvent {
    Rendered(SectionInfo),
    Relocated(Location),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeOverride {
    pub property: String,
    pub value: String,
    pub important: bool,
}

/// Styles injected into every rendered section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Themes {
    font: Option<String>,
    overrides: Vec<ThemeOverride>,
}

impl Themes {
    pub fn font(&mut self, family: &str) {
        let family = family.trim();
        self.font = (!family.is_empty()).then(|| family.to_string());
    }

    pub fn font_family(&self) -> Option<&str> {
        self.font.as_deref()
    }

    /// Set `property`, replacing any earlier override of it.
    pub fn override_property(&mut self, property: &str, value: &str, important: bool) {
        let entry = ThemeOverride {
            property: property.to_string(),
            value: value.to_string(),
            important,
        };
        match self
            .overrides
            .iter_mut()
            .find(|existing| existing.property == property)
        {
            Some(existing) => *existing = entry,
            None => self.overrides.push(entry),
        }
    }

    pub fn overrides(&self) -> &[ThemeOverride] {
        &self.overrides
    }
}

/// Layout and theme settings pushed into a rendition after each render.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Typography {
    pub spread: Spread,
    pub font_family: Option<String>,
    pub dark: bool,
}

pub const DARK_TEXT_COLOR: &str = "#bfc8ca";
pub const LIGHT_TEXT_COLOR: &str = "#3f484a";

impl Typography {
    pub fn apply(&self, rendition: &mut dyn Rendition) {
        rendition.spread(self.spread);
        let themes = rendition.themes_mut();
        if let Some(family) = &self.font_family {
            themes.font(family);
        }
        let color = if self.dark {
            DARK_TEXT_COLOR
        } else {
            LIGHT_TEXT_COLOR
        };
        themes.override_property("color", color, self.dark);
    }
}

pub trait Rendition {
    /// Mount into `container` and load the first section.
    fn render(&mut self, container: ContainerId) -> Result<()>;
    /// Jump to a locator or href; `None` re-displays the current page.
    fn display(&mut self, target: Option<&str>) -> Result<()>;
    fn prev(&mut self) -> Result<()>;
    fn next(&mut self) -> Result<()>;
    fn spread(&mut self, mode: Spread);
    fn themes(&self) -> &Themes;
    fn themes_mut(&mut self) -> &mut Themes;
    fn document(&self) -> Option<&Document>;
    fn document_mut(&mut self) -> Option<&mut Document>;
    fn toc(&self) -> Vec<NavItem>;
    fn current_location(&self) -> Option<Location>;
    fn sections(&self) -> Vec<SectionText>;
    fn resize(&mut self) {}
    fn poll_events(&mut self) -> Vec<RenditionEvent>;
}

pub trait RenditionFactory: Send + Sync {
    fn create(&self, content: BookContent) -> Box<dyn Rendition>;
}

/// `href` without its fragment.
pub fn strip_fragment(href: &str) -> &str {
    href.split_once('#').map_or(href, |(path, _)| path)
}

/// Loose href comparison tolerating relative prefixes on either side.
pub fn same_document(a: &str, b: &str) -> bool {
    let (a, b) = (strip_fragment(a), strip_fragment(b));
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a == b || a.ends_with(&format!("/{b}")) || b.ends_with(&format!("/{a}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_by_property() {
        let mut themes = Themes::default();
        themes.override_property("color", "#3f484a", false);
        themes.override_property("color", "#bfc8ca", true);
        assert_eq!(themes.overrides().len(), 1);
        assert!(themes.overrides()[0].important);
    }

    #[test]
    fn compares_hrefs_ignoring_fragments_and_prefixes() {
        assert!(same_document("OEBPS/ch1.xhtml#s2", "ch1.xhtml"));
        assert!(same_document("ch1.xhtml", "OEBPS/ch1.xhtml"));
        assert!(!same_document("ch10.xhtml", "ch1.xhtml"));
        assert!(!same_document("", "ch1.xhtml"));
    }
}
