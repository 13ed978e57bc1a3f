mod commands;
mod messages;
mod state;
mod update;

pub use commands::{Command, parse_command};
pub use messages::{
    ClickTarget, DropPayload, DropPosition, DropTarget, Key, Message, Modifiers, Swipe, TabSource,
};
pub use state::{
    App, BookTab, BookTabSnapshot, Group, GroupSnapshot, MenuSnapshot, NavCrumb, PageKind,
    PageTab, Reader, ReaderSnapshot, RenderState, SearchExcerpt, SearchResult, SidebarView, Tab,
    TabSummary,
};
pub use update::{Effect, EventLoop, Services};

use crate::config::AppConfig;
use crate::import::EpubImporter;
use crate::rendition::PagedRenditionFactory;
use crate::store::{BookStore, FileBookStore};
use crate::translation::{HttpTranslator, Translator};
use std::sync::Arc;
use tracing::{info, warn};

/// Wire the app to the file-backed store, the EPUB importer and, when
/// enabled, the HTTP translator.
pub fn build_event_loop(config: AppConfig) -> EventLoop {
    let store: Arc<dyn BookStore> = Arc::new(FileBookStore::new(&config.library_dir));
    let importer = Arc::new(EpubImporter::new(store.clone()));
    let translator = if config.translation_enabled {
        match HttpTranslator::from_config(&config) {
            Ok(translator) => Some(Arc::new(translator) as Arc<dyn Translator>),
            Err(err) => {
                warn!("Translation disabled: {err:#}");
                None
            }
        }
    } else {
        None
    };
    info!(
        library = %config.library_dir,
        translation = translator.is_some(),
        "Reader services ready"
    );
    let renditions = Arc::new(PagedRenditionFactory {
        paragraphs_per_page: config.paragraphs_per_page.max(1),
    });
    EventLoop::new(
        App::new(config, renditions),
        Services {
            store,
            importer,
            translator,
        },
    )
}
