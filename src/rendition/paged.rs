//! Paragraph-chunked pagination over imported book content.
//!
//! Each section is parsed into its own [`Document`] when it is entered. A page
//! holds a fixed number of block paragraphs per column, so the page count of a
//! section follows directly from its paragraph count and the spread mode.

use super::{
    ContainerId, Location, NavItem, Position, Rendition, RenditionEvent, RenditionFactory,
    SectionInfo, SectionText, Spread, Themes, parse_cfi, same_document, section_cfi,
};
use crate::book::BookContent;
use crate::dom::Document;
use anyhow::{Result, anyhow, bail};
use tracing::{debug, trace};

const PARAGRAPH_TAG: &str = "p";

struct LoadedSection {
    index: usize,
    document: Document,
    paragraphs: usize,
    page: usize,
}

pub struct PagedRendition {
    content: BookContent,
    paragraphs_per_page: usize,
    container: Option<ContainerId>,
    section: Option<LoadedSection>,
    spread: Spread,
    themes: Themes,
    events: Vec<RenditionEvent>,
}

impl PagedRendition {
    pub fn new(content: BookContent, paragraphs_per_page: usize) -> Self {
        Self {
            content,
            paragraphs_per_page: paragraphs_per_page.max(1),
            container: None,
            section: None,
            spread: Spread::default(),
            themes: Themes::default(),
            events: Vec::new(),
        }
    }

    fn page_size(&self) -> usize {
        self.paragraphs_per_page * self.spread.columns()
    }

    fn pages_for(&self, paragraphs: usize) -> usize {
        paragraphs.div_ceil(self.page_size()).max(1)
    }

    fn ensure_attached(&self) -> Result<()> {
        if self.container.is_none() {
            bail!("rendition is not mounted");
        }
        Ok(())
    }

    fn load_section(&mut self, index: usize) -> Result<()> {
        if self
            .section
            .as_ref()
            .is_some_and(|loaded| loaded.index == index)
        {
            return Ok(());
        }
        let section = self
            .content
            .sections
            .get(index)
            .ok_or_else(|| anyhow!("section {index} is out of range"))?;
        let document = Document::from_body_html(&section.html);
        let paragraphs = document
            .elements_by_tag(document.body(), PARAGRAPH_TAG)
            .len();
        debug!(index, paragraphs, href = %section.href, "Loaded section");
        self.events.push(RenditionEvent::Rendered(SectionInfo {
            index,
            href: section.href.clone(),
        }));
        self.section = Some(LoadedSection {
            index,
            document,
            paragraphs,
            page: 0,
        });
        Ok(())
    }

    fn go_to(&mut self, section: usize, page: Option<usize>) -> Result<()> {
        self.load_section(section)?;
        let pages = self.section_pages();
        if let Some(loaded) = self.section.as_mut() {
            // `None` means the last page of the section
            loaded.page = page.unwrap_or(usize::MAX).min(pages - 1);
        }
        self.relocated();
        Ok(())
    }

    fn section_pages(&self) -> usize {
        self.section
            .as_ref()
            .map(|loaded| self.pages_for(loaded.paragraphs))
            .unwrap_or(1)
    }

    fn relocated(&mut self) {
        if let Some(location) = self.current_location() {
            trace!(cfi = %location.start.cfi, "Relocated");
            self.events.push(RenditionEvent::Relocated(location));
        }
    }

    fn position(&self, section: usize, page: usize, paragraph: usize) -> Position {
        let pages = self.section_pages();
        let sections = self.content.sections.len().max(1);
        Position {
            cfi: section_cfi(section, paragraph),
            href: self
                .content
                .sections
                .get(section)
                .map(|section| section.href.clone())
                .unwrap_or_default(),
            section_index: section,
            page,
            total: pages,
            percentage: (section as f64 + page as f64 / pages as f64) / sections as f64,
        }
    }

    fn resolve_target(&self, target: &str) -> Result<(usize, usize)> {
        if let Some(cfi) = parse_cfi(target) {
            if cfi.section >= self.content.sections.len() {
                bail!("locator {target} points past the last section");
            }
            let page = cfi.paragraph.unwrap_or(0) / self.page_size();
            return Ok((cfi.section, page));
        }
        self.content
            .sections
            .iter()
            .position(|section| same_document(&section.href, target))
            .map(|index| (index, 0))
            .ok_or_else(|| anyhow!("unknown display target {target}"))
    }
}

impl Rendition for PagedRendition {
    fn render(&mut self, container: ContainerId) -> Result<()> {
        if self.content.sections.is_empty() {
            bail!("book has no sections to render");
        }
        let remount = self.container.is_some_and(|current| current != container);
        self.container = Some(container);
        match self.section.as_ref().map(|loaded| (loaded.index, loaded.page)) {
            Some((index, page)) if remount => {
                self.section = None;
                self.go_to(index, Some(page))
            }
            Some(_) => Ok(()),
            None => self.go_to(0, Some(0)),
        }
    }

    fn display(&mut self, target: Option<&str>) -> Result<()> {
        self.ensure_attached()?;
        match target.map(str::trim).filter(|target| !target.is_empty()) {
            Some(target) => {
                let (section, page) = self.resolve_target(target)?;
                self.go_to(section, Some(page))
            }
            None => {
                let (section, page) = self
                    .section
                    .as_ref()
                    .map(|loaded| (loaded.index, loaded.page))
                    .unwrap_or((0, 0));
                self.go_to(section, Some(page))
            }
        }
    }

    fn prev(&mut self) -> Result<()> {
        self.ensure_attached()?;
        let Some((index, page)) = self.section.as_ref().map(|loaded| (loaded.index, loaded.page))
        else {
            return Ok(());
        };
        if page > 0 {
            self.go_to(index, Some(page - 1))
        } else if index > 0 {
            self.go_to(index - 1, None)
        } else {
            Ok(())
        }
    }

    fn next(&mut self) -> Result<()> {
        self.ensure_attached()?;
        let Some((index, page)) = self.section.as_ref().map(|loaded| (loaded.index, loaded.page))
        else {
            return Ok(());
        };
        if page + 1 < self.section_pages() {
            self.go_to(index, Some(page + 1))
        } else if index + 1 < self.content.sections.len() {
            self.go_to(index + 1, Some(0))
        } else {
            Ok(())
        }
    }

    fn spread(&mut self, mode: Spread) {
        if self.spread == mode {
            return;
        }
        let first_paragraph = self
            .section
            .as_ref()
            .map(|loaded| loaded.page * self.page_size());
        self.spread = mode;
        if let Some(first) = first_paragraph {
            let page = first / self.page_size();
            if let Some(loaded) = self.section.as_mut() {
                loaded.page = page;
            }
            self.relocated();
        }
    }

    fn themes(&self) -> &Themes {
        &self.themes
    }

    fn themes_mut(&mut self) -> &mut Themes {
        &mut self.themes
    }

    fn document(&self) -> Option<&Document> {
        self.section.as_ref().map(|loaded| &loaded.document)
    }

    fn document_mut(&mut self) -> Option<&mut Document> {
        self.section.as_mut().map(|loaded| &mut loaded.document)
    }

    fn toc(&self) -> Vec<NavItem> {
        self.content.toc.clone()
    }

    fn current_location(&self) -> Option<Location> {
        let loaded = self.section.as_ref()?;
        let pages = self.pages_for(loaded.paragraphs);
        let first = loaded.page * self.page_size();
        let last = (first + self.page_size())
            .min(loaded.paragraphs)
            .saturating_sub(1)
            .max(first);
        let last_section = self.content.sections.len().saturating_sub(1);
        Some(Location {
            start: self.position(loaded.index, loaded.page, first),
            end: self.position(loaded.index, loaded.page, last),
            at_start: loaded.index == 0 && loaded.page == 0,
            at_end: loaded.index == last_section && loaded.page + 1 >= pages,
        })
    }

    fn sections(&self) -> Vec<SectionText> {
        self.content
            .sections
            .iter()
            .enumerate()
            .map(|(index, section)| {
                let document = Document::from_body_html(&section.html);
                SectionText {
                    index,
                    href: section.href.clone(),
                    text: document.text_content(document.body()),
                }
            })
            .collect()
    }

    fn resize(&mut self) {
        if self.section.is_some() {
            self.relocated();
        }
    }

    fn poll_events(&mut self) -> Vec<RenditionEvent> {
        std::mem::take(&mut self.events)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PagedRenditionFactory {
    pub paragraphs_per_page: usize,
}

impl RenditionFactory for PagedRenditionFactory {
    fn create(&self, content: BookContent) -> Box<dyn Rendition> {
        Box::new(PagedRendition::new(content, self.paragraphs_per_page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::Section;

    fn content() -> BookContent {
        BookContent {
            sections: vec![
                Section {
                    href: "ch1.xhtml".into(),
                    html: "<p>a</p><p>b</p><p>c</p>".into(),
                },
                Section {
                    href: "ch2.xhtml".into(),
                    html: "<p>d</p>".into(),
                },
            ],
            toc: Vec::new(),
        }
    }

    fn mounted() -> PagedRendition {
        let mut rendition = PagedRendition::new(content(), 2);
        rendition.render(ContainerId(1)).unwrap();
        rendition
    }

    #[test]
    fn navigation_requires_a_mount() {
        let mut rendition = PagedRendition::new(content(), 2);
        assert!(rendition.next().is_err());
        assert!(rendition.current_location().is_none());
    }

    #[test]
    fn render_emits_rendered_then_relocated() {
        let mut rendition = mounted();
        let events = rendition.poll_events();
        assert!(matches!(events[0], RenditionEvent::Rendered(ref info) if info.index == 0));
        assert!(matches!(events[1], RenditionEvent::Relocated(ref loc) if loc.at_start));
        assert!(rendition.poll_events().is_empty());
    }

    #[test]
    fn pages_across_sections_and_back() {
        let mut rendition = mounted();
        rendition.next().unwrap();
        assert_eq!(rendition.current_location().unwrap().start.page, 1);
        rendition.next().unwrap();
        let location = rendition.current_location().unwrap();
        assert_eq!(location.start.section_index, 1);
        assert!(location.at_end);
        rendition.next().unwrap();
        assert_eq!(rendition.current_location().unwrap().start.section_index, 1);

        rendition.prev().unwrap();
        let location = rendition.current_location().unwrap();
        assert_eq!((location.start.section_index, location.start.page), (0, 1));
        assert_eq!(location.page_label(), "2 / 2");
        assert!((location.start.percentage - 0.25).abs() < 1e-9);
    }

    #[test]
    fn displays_locators_and_hrefs() {
        let mut rendition = mounted();
        rendition.display(Some(section_cfi(0, 2).as_str())).unwrap();
        assert_eq!(rendition.current_location().unwrap().start.page, 1);
        rendition.display(Some("OEBPS/ch2.xhtml#top")).unwrap();
        assert_eq!(rendition.current_location().unwrap().start.section_index, 1);
        assert!(rendition.display(Some("missing.xhtml")).is_err());
        assert!(rendition.display(Some("epubcfi(/6/8!/4/2)")).is_err());
    }

    #[test]
    fn spread_keeps_the_first_visible_paragraph() {
        let mut rendition = mounted();
        rendition.next().unwrap();
        rendition.spread(Spread::Always);
        let location = rendition.current_location().unwrap();
        assert_eq!(location.start.page, 0);
        assert_eq!(location.start.total, 1);
    }
}
