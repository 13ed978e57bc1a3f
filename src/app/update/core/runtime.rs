use super::super::super::messages::{Message, TabSource};
use super::super::super::state::App;
use super::super::Effect;
use crate::import::Importer;
use crate::store::BookStore;
use crate::book::Book;
use crate::translation::Translator;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Collaborators effects run against.
#[derive(Clone)]
pub struct Services {
    pub store: Arc<dyn BookStore>,
    pub importer: Arc<dyn Importer>,
    pub translator: Option<Arc<dyn Translator>>,
}

/// Owns the app and its outstanding effects. Effects run on the blocking
/// pool and report back with a message that is reduced like any other.
///
/// Saves of one book never overlap: while a save is in flight, newer
/// records wait in a single slot and only the latest one is written.
pub struct EventLoop {
    app: App,
    services: Services,
    tasks: JoinSet<Message>,
    saves: HashMap<String, Option<Book>>,
}

impl EventLoop {
    pub fn new(app: App, services: Services) -> Self {
        Self {
            app,
            services,
            tasks: JoinSet::new(),
            saves: HashMap::new(),
        }
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    /// Reduce `message` and start every effect it produced.
    pub fn dispatch(&mut self, message: Message) {
        for effect in self.app.update(message) {
            self.spawn(effect);
        }
    }

    pub fn pending_tasks(&self) -> usize {
        self.tasks.len()
    }

    /// Feed finished effects back until nothing is outstanding.
    pub async fn run_until_idle(&mut self) {
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(message) => {
                    if let Message::BookPersisted { id, .. } = &message {
                        self.finish_save(id);
                    }
                    self.dispatch(message);
                }
                Err(err) if err.is_cancelled() => debug!("Background task cancelled"),
                Err(err) => warn!("Background task failed: {err}"),
            }
        }
    }

    /// Abort outstanding effects and close every tab.
    pub fn shutdown(&mut self) {
        let aborted = self.tasks.len();
        self.tasks.abort_all();
        self.tasks = JoinSet::new();
        self.saves.clear();
        self.app.teardown();
        info!(aborted, "Event loop shut down");
    }

    fn queue_save(&mut self, book: Book) {
        match self.saves.entry(book.id.clone()) {
            Entry::Occupied(mut slot) => {
                debug!(id = %book.id, "Save in flight, keeping the newest record");
                slot.insert(Some(book));
            }
            Entry::Vacant(slot) => {
                slot.insert(None);
                self.spawn_save(book);
            }
        }
    }

    fn finish_save(&mut self, id: &str) {
        let pending = match self.saves.get_mut(id) {
            Some(slot) => slot.take(),
            None => return,
        };
        match pending {
            Some(book) => self.spawn_save(book),
            None => {
                self.saves.remove(id);
            }
        }
    }

    fn spawn_save(&mut self, book: Book) {
        let store = self.services.store.clone();
        self.tasks.spawn_blocking(move || {
            let error = store.put(&book).err().map(|err| format!("{err:#}"));
            Message::BookPersisted { id: book.id, error }
        });
    }

    fn spawn(&mut self, effect: Effect) {
        let services = self.services.clone();
        match effect {
            Effect::PersistBook(book) => self.queue_save(book),
            Effect::ImportFiles { files, target } => {
                self.tasks.spawn_blocking(move || match services.importer.import(&files) {
                    Ok(imported) => Message::TabsResolved {
                        target,
                        tabs: imported
                            .into_iter()
                            .map(|imported| TabSource::Book {
                                book: imported.book,
                                content: imported.content,
                            })
                            .collect(),
                        error: None,
                    },
                    Err(err) => Message::TabsResolved {
                        target,
                        tabs: Vec::new(),
                        error: Some(format!("{err:#}")),
                    },
                });
            }
            Effect::ResolveBook { id, target } => {
                self.tasks.spawn_blocking(move || {
                    let resolved = services.store.get(&id).and_then(|book| match book {
                        Some(book) => {
                            let content = services.importer.load(&book)?;
                            Ok(Some(TabSource::Book { book, content }))
                        }
                        None => Ok(None),
                    });
                    match resolved {
                        Ok(Some(source)) => Message::TabsResolved {
                            target,
                            tabs: vec![source],
                            error: None,
                        },
                        Ok(None) => Message::TabsResolved {
                            target,
                            tabs: Vec::new(),
                            error: Some(format!("unknown book `{id}`")),
                        },
                        Err(err) => Message::TabsResolved {
                            target,
                            tabs: Vec::new(),
                            error: Some(format!("{err:#}")),
                        },
                    }
                });
            }
            Effect::Translate {
                tab_id,
                generation,
                request,
            } => {
                self.tasks.spawn_blocking(move || {
                    let result = match services.translator.as_deref() {
                        Some(translator) => translator
                            .translate(&request.text)
                            .map_err(|err| format!("{err:#}")),
                        None => Err("no translator configured".to_string()),
                    };
                    Message::TranslationSettled {
                        tab_id,
                        generation,
                        request_id: request.id,
                        result,
                    }
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::messages::{DropPayload, DropPosition, DropTarget};
    use crate::app::state::RenderState;
    use crate::book::{BookContent, Section};
    use crate::config::AppConfig;
    use crate::import::ImportedBook;
    use crate::rendition::PagedRenditionFactory;
    use crate::selection::{
        LiveSelection, MenuGeometry, Rect, SelectionDirection, TextRange,
    };
    use crate::store::MemoryBookStore;
    use anyhow::{Result, bail};
    use std::path::PathBuf;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    fn content() -> BookContent {
        BookContent {
            sections: vec![Section {
                href: "text/one.xhtml".into(),
                html: "<p>hello world</p><p>second</p><p>third</p>".into(),
            }],
            toc: Vec::new(),
        }
    }

    struct FakeImporter;

    impl Importer for FakeImporter {
        fn import(&self, files: &[PathBuf]) -> Result<Vec<ImportedBook>> {
            if files.is_empty() {
                bail!("nothing to import");
            }
            Ok(files
                .iter()
                .map(|path| {
                    let name = path.display().to_string();
                    ImportedBook {
                        book: Book::new(name.replace('.', "-"), name.clone(), name),
                        content: content(),
                    }
                })
                .collect())
        }

        fn load(&self, _book: &Book) -> Result<BookContent> {
            Ok(content())
        }
    }

    #[derive(Default)]
    struct RecordingTranslator {
        calls: Mutex<Vec<String>>,
    }

    impl Translator for RecordingTranslator {
        fn translate(&self, text: &str) -> Result<String> {
            self.calls.lock().unwrap().push(text.to_string());
            Ok(format!("&amp;{text}&amp;"))
        }
    }

    fn event_loop(
        store: Arc<MemoryBookStore>,
        translator: Option<Arc<RecordingTranslator>>,
    ) -> EventLoop {
        let config = AppConfig {
            translation_enabled: true,
            ..AppConfig::default()
        };
        let app = App::new(
            config,
            Arc::new(PagedRenditionFactory {
                paragraphs_per_page: 2,
            }),
        );
        EventLoop::new(
            app,
            Services {
                store,
                importer: Arc::new(FakeImporter),
                translator: translator.map(|translator| translator as Arc<dyn Translator>),
            },
        )
    }

    fn select(tab_id: &str, text: &str) -> Message {
        Message::SelectionChanged {
            tab_id: tab_id.to_string(),
            selection: Some(LiveSelection {
                range: TextRange {
                    cfi: "epubcfi(/6/2!/4/2,/1:0,/1:5)".into(),
                    text: text.to_string(),
                    rects: vec![Rect::new(10.0, 20.0, 60.0, 16.0)],
                    line_height: None,
                },
                direction: SelectionDirection::Forward,
            }),
            geometry: Some(MenuGeometry {
                container: Rect::new(0.0, 0.0, 800.0, 600.0),
                view: Rect::new(0.0, 0.0, 800.0, 600.0),
                zoom: 1.0,
            }),
        }
    }

    #[tokio::test]
    async fn opening_files_renders_and_persists_progress() {
        let store = Arc::new(MemoryBookStore::default());
        let mut event_loop = event_loop(store.clone(), None);
        event_loop.dispatch(Message::OpenFiles(vec![PathBuf::from("moby.epub")]));
        assert_eq!(event_loop.pending_tasks(), 1);
        event_loop.run_until_idle().await;

        let tab = event_loop.app().reader().focused_book_tab().unwrap();
        assert_eq!(tab.id(), "moby-epub");
        assert_eq!(tab.render_state(), RenderState::Rendered);
        let stored = store.get("moby-epub").unwrap().unwrap();
        assert!(stored.cfi.is_some());
    }

    #[tokio::test]
    async fn translation_shows_only_latest_request() {
        let store = Arc::new(MemoryBookStore::default());
        let translator = Arc::new(RecordingTranslator::default());
        let mut event_loop = event_loop(store, Some(translator.clone()));
        event_loop.dispatch(Message::OpenFiles(vec![PathBuf::from("moby.epub")]));
        event_loop.run_until_idle().await;

        event_loop.dispatch(select("moby-epub", "a"));
        event_loop.dispatch(select("moby-epub", "b"));
        event_loop.run_until_idle().await;

        assert_eq!(*translator.calls.lock().unwrap(), vec!["a", "b"]);
        let menu = event_loop.app().menu("moby-epub").unwrap();
        assert_eq!(menu.translation(), Some("&b&"));
        assert!(!menu.is_translating());
    }

    #[tokio::test]
    async fn translation_without_translator_keeps_loading() {
        let store = Arc::new(MemoryBookStore::default());
        let mut event_loop = event_loop(store, None);
        event_loop.dispatch(Message::OpenFiles(vec![PathBuf::from("moby.epub")]));
        event_loop.run_until_idle().await;

        event_loop.dispatch(select("moby-epub", "hello world"));
        event_loop.run_until_idle().await;
        let menu = event_loop.app().menu("moby-epub").unwrap();
        assert_eq!(menu.translation(), None);
    }

    /// Delays the first save after `arm` so a later save could overtake it.
    #[derive(Default)]
    struct SlowFirstSave {
        inner: MemoryBookStore,
        armed: AtomicBool,
        saved: Mutex<Vec<Option<String>>>,
    }

    impl SlowFirstSave {
        fn arm(&self) {
            self.armed.store(true, Ordering::SeqCst);
        }
    }

    impl BookStore for SlowFirstSave {
        fn get(&self, id: &str) -> Result<Option<Book>> {
            self.inner.get(id)
        }

        fn put(&self, book: &Book) -> Result<()> {
            if self.armed.swap(false, Ordering::SeqCst) {
                std::thread::sleep(Duration::from_millis(200));
            }
            self.saved.lock().unwrap().push(book.cfi.clone());
            self.inner.put(book)
        }

        fn list(&self) -> Result<Vec<Book>> {
            self.inner.list()
        }
    }

    #[tokio::test]
    async fn saves_of_one_book_land_in_order() {
        let store = Arc::new(SlowFirstSave::default());
        let app = App::new(
            AppConfig::default(),
            Arc::new(PagedRenditionFactory {
                paragraphs_per_page: 2,
            }),
        );
        let mut event_loop = EventLoop::new(
            app,
            Services {
                store: store.clone(),
                importer: Arc::new(FakeImporter),
                translator: None,
            },
        );
        event_loop.dispatch(Message::OpenFiles(vec![PathBuf::from("moby.epub")]));
        event_loop.run_until_idle().await;
        store.saved.lock().unwrap().clear();

        store.arm();
        event_loop.dispatch(Message::NextPage);
        event_loop.dispatch(Message::PrevPage);
        event_loop.dispatch(Message::NextPage);
        assert_eq!(event_loop.pending_tasks(), 1);
        event_loop.run_until_idle().await;

        let tab_cfi = event_loop
            .app()
            .reader()
            .focused_book_tab()
            .unwrap()
            .book()
            .cfi
            .clone();
        let saved = store.saved.lock().unwrap().clone();
        assert_eq!(saved.len(), 2);
        assert_eq!(saved.last(), Some(&tab_cfi));
        assert_eq!(store.get("moby-epub").unwrap().unwrap().cfi, tab_cfi);
    }

    #[tokio::test]
    async fn unknown_book_drop_opens_nothing() {
        let store = Arc::new(MemoryBookStore::default());
        let mut event_loop = event_loop(store, None);
        event_loop.dispatch(Message::Drop {
            target: DropTarget {
                group: 0,
                position: DropPosition::Universe,
            },
            payload: DropPayload::text("missing-book"),
        });
        event_loop.run_until_idle().await;
        assert!(event_loop.app().reader().is_empty());
    }

    #[tokio::test]
    async fn shutdown_closes_everything() {
        let store = Arc::new(MemoryBookStore::default());
        let mut event_loop = event_loop(store, None);
        event_loop.dispatch(Message::OpenFiles(vec![PathBuf::from("moby.epub")]));
        event_loop.run_until_idle().await;
        event_loop.dispatch(select("moby-epub", "hello"));
        event_loop.shutdown();
        assert!(event_loop.app().reader().is_empty());
        assert!(event_loop.app().menu("moby-epub").is_none());
        assert_eq!(event_loop.pending_tasks(), 0);
    }
}
