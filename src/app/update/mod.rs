use super::messages::DropTarget;
use crate::book::Book;
use crate::translation::TranslationRequest;
use std::path::PathBuf;

mod core;
mod drop;
mod input;
mod navigation;
mod selection;

pub use self::core::{EventLoop, Services};

/// Describes work that must be performed outside the pure reducer.
#[derive(Debug, Clone)]
pub enum Effect {
    PersistBook(Book),
    ImportFiles {
        files: Vec<PathBuf>,
        target: DropTarget,
    },
    ResolveBook {
        id: String,
        target: DropTarget,
    },
    Translate {
        tab_id: String,
        generation: u64,
        request: TranslationRequest,
    },
}

#[cfg(test)]
mod test_support {
    use super::super::messages::{DropPosition, DropTarget, Message, TabSource};
    use super::super::state::App;
    use crate::book::{Book, BookContent, Section};
    use crate::config::AppConfig;
    use crate::rendition::PagedRenditionFactory;
    use std::sync::Arc;

    pub(super) fn app_with(config: AppConfig) -> App {
        App::new(
            config,
            Arc::new(PagedRenditionFactory {
                paragraphs_per_page: 2,
            }),
        )
    }

    pub(super) fn book_source(id: &str) -> TabSource {
        TabSource::Book {
            book: Book::new(id, format!("Book {id}"), format!("{id}.epub")),
            content: BookContent {
                sections: vec![
                    Section {
                        href: "text/one.xhtml".into(),
                        html: "<p>alpha</p><p>beta</p><p>gamma</p>".into(),
                    },
                    Section {
                        href: "text/two.xhtml".into(),
                        html: "<p>delta</p>".into(),
                    },
                ],
                toc: Vec::new(),
            },
        }
    }

    /// Open `sources` into group `group` through the reducer.
    pub(super) fn open(app: &mut App, group: usize, position: DropPosition, sources: Vec<TabSource>) {
        app.update(Message::TabsResolved {
            target: DropTarget { group, position },
            tabs: sources,
            error: None,
        });
    }
}
