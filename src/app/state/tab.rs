use super::book_tab::BookTab;

/// Built-in non-book pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageKind {
    Home,
    Settings,
    About,
}

impl PageKind {
    pub const ALL: [PageKind; 3] = [PageKind::Home, PageKind::Settings, PageKind::About];

    /// Identity used for drag payloads and tab dedupe.
    pub fn id(self) -> &'static str {
        match self {
            PageKind::Home => "HomePage",
            PageKind::Settings => "SettingsPage",
            PageKind::About => "AboutPage",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            PageKind::Home => "Home",
            PageKind::Settings => "Settings",
            PageKind::About => "About",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.id() == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTab {
    kind: PageKind,
}

impl PageTab {
    pub fn new(kind: PageKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> PageKind {
        self.kind
    }
}

pub enum Tab {
    Book(Box<BookTab>),
    Page(PageTab),
}

impl Tab {
    pub fn id(&self) -> &str {
        match self {
            Tab::Book(tab) => tab.id(),
            Tab::Page(page) => page.kind.id(),
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Tab::Book(tab) => tab.title(),
            Tab::Page(page) => page.kind.title(),
        }
    }

    pub fn as_book(&self) -> Option<&BookTab> {
        match self {
            Tab::Book(tab) => Some(tab),
            Tab::Page(_) => None,
        }
    }

    pub fn as_book_mut(&mut self) -> Option<&mut BookTab> {
        match self {
            Tab::Book(tab) => Some(tab),
            Tab::Page(_) => None,
        }
    }

    /// Release resources held by the tab before it is dropped for good.
    pub(in crate::app) fn close(&mut self) {
        if let Tab::Book(tab) = self {
            tab.close();
        }
    }

    pub(in crate::app) fn detach(&mut self) {
        if let Tab::Book(tab) = self {
            tab.detach();
        }
    }
}

impl From<PageKind> for Tab {
    fn from(kind: PageKind) -> Self {
        Tab::Page(PageTab::new(kind))
    }
}

impl From<BookTab> for Tab {
    fn from(tab: BookTab) -> Self {
        Tab::Book(Box::new(tab))
    }
}
