mod book_tab;
mod group;
mod reader;
mod search;
mod snapshot;
mod tab;

use super::messages::TabSource;
use crate::config::AppConfig;
use crate::rendition::RenditionFactory;
use crate::selection::{LiveSelection, MenuGeometry, SelectionMenu};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

pub use book_tab::{BookTab, NavCrumb, RenderState};
pub use group::Group;
pub use reader::Reader;
pub use search::{SearchExcerpt, SearchResult};
pub use snapshot::{
    BookTabSnapshot, GroupSnapshot, MenuSnapshot, ReaderSnapshot, TabSummary,
};
pub use tab::{PageKind, PageTab, Tab};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SidebarView {
    Search,
    Annotations,
    Definitions,
    Toc,
}

/// Selection state of one book tab: the live range reported by the frame,
/// the host geometry and the menu opened for it.
#[derive(Debug, Default)]
pub(in crate::app) struct SelectionState {
    pub(in crate::app) live: Option<LiveSelection>,
    pub(in crate::app) geometry: Option<MenuGeometry>,
    pub(in crate::app) menu: Option<SelectionMenu>,
}

/// Core application state composed of sub-models.
pub struct App {
    pub(super) reader: Reader,
    pub(super) config: AppConfig,
    pub(super) renditions: Arc<dyn RenditionFactory>,
    pub(super) selections: HashMap<String, SelectionState>,
    pub(super) sidebar: Option<SidebarView>,
    pub(super) clipboard: Option<String>,
    pub(super) image_preview: Option<String>,
    pub(super) navbar_visible: bool,
    pub(super) next_container: u64,
    pub(super) next_menu_generation: u64,
}

impl App {
    pub fn new(config: AppConfig, renditions: Arc<dyn RenditionFactory>) -> Self {
        Self {
            reader: Reader::default(),
            config,
            renditions,
            selections: HashMap::new(),
            sidebar: None,
            clipboard: None,
            image_preview: None,
            navbar_visible: true,
            next_container: 1,
            next_menu_generation: 1,
        }
    }

    pub fn reader(&self) -> &Reader {
        &self.reader
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn sidebar(&self) -> Option<SidebarView> {
        self.sidebar
    }

    pub fn clipboard(&self) -> Option<&str> {
        self.clipboard.as_deref()
    }

    pub fn image_preview(&self) -> Option<&str> {
        self.image_preview.as_deref()
    }

    pub fn navbar_visible(&self) -> bool {
        self.navbar_visible
    }

    /// Open selection menu of a tab, if any.
    pub fn menu(&self, tab_id: &str) -> Option<&SelectionMenu> {
        self.selections.get(tab_id)?.menu.as_ref()
    }

    /// Build a tab from resolved content. Book tabs get a fresh rendition.
    pub(in crate::app) fn materialize(&self, source: TabSource) -> Tab {
        match source {
            TabSource::Page(kind) => Tab::from(kind),
            TabSource::Book { book, content } => {
                let rendition = self.renditions.create(content);
                Tab::from(BookTab::new(book, rendition))
            }
        }
    }

    pub(in crate::app) fn allocate_menu_generation(&mut self) -> u64 {
        let generation = self.next_menu_generation;
        self.next_menu_generation += 1;
        generation
    }

    /// Close every tab and forget all per-tab state.
    pub fn teardown(&mut self) {
        self.reader.clear();
        self.selections.clear();
        self.image_preview = None;
        debug!("Reader torn down");
    }
}
