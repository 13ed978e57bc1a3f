use super::state::{PageKind, SidebarView};
use crate::book::{Book, BookContent};
use crate::dom::NodeId;
use crate::rendition::Typography;
use crate::selection::{LiveSelection, MenuAction, MenuGeometry, TextRange};
use std::path::PathBuf;
use std::str::FromStr;

/// Where a drag ended relative to the target group's pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropPosition {
    Left,
    Right,
    Universe,
}

impl FromStr for DropPosition {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(DropPosition::Left),
            "right" => Ok(DropPosition::Right),
            "universe" | "center" => Ok(DropPosition::Universe),
            other => Err(format!("unknown drop position `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropTarget {
    pub group: usize,
    pub position: DropPosition,
}

/// Drag payload, copied out of the host event before any async step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DropPayload {
    pub files: Vec<PathBuf>,
    pub text: Option<String>,
}

impl DropPayload {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            files: Vec::new(),
            text: Some(text.into()),
        }
    }

    pub fn files(files: Vec<PathBuf>) -> Self {
        Self { files, text: None }
    }
}

/// Content for a tab that is about to be opened.
#[derive(Debug, Clone)]
pub enum TabSource {
    Page(PageKind),
    Book { book: Book, content: BookContent },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Space,
    Character(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub logo: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        logo: false,
    };
    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ctrl: false,
        alt: false,
        logo: false,
    };
}

/// What a click inside a rendered section landed on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClickTarget {
    pub node: Option<NodeId>,
    /// An anchor element is in the event's composed path.
    pub link: bool,
    pub image: Option<String>,
    pub client_x: f64,
    pub container_width: f64,
    /// The click hit an annotation mark; its own handler took it.
    pub on_annotation: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Swipe {
    pub dx: f64,
    pub dy: f64,
    pub elapsed_ms: u64,
    pub has_selection: bool,
}

/// Messages fed into the reducer by the host and by finished effects.
#[derive(Debug, Clone)]
pub enum Message {
    SelectGroup(usize),
    SelectTab {
        group: usize,
        tab: usize,
    },
    CloseTab {
        group: usize,
        tab: usize,
    },
    CloseGroup(usize),
    OpenFiles(Vec<PathBuf>),
    OpenBook(String),
    OpenPage(PageKind),
    Drop {
        target: DropTarget,
        payload: DropPayload,
    },
    TabsResolved {
        target: DropTarget,
        tabs: Vec<TabSource>,
        error: Option<String>,
    },
    KeyPressed {
        key: Key,
        modifiers: Modifiers,
    },
    Wheel {
        tab_id: String,
        delta_y: f64,
    },
    FrameClicked {
        tab_id: String,
        target: ClickTarget,
    },
    Swiped {
        tab_id: String,
        swipe: Swipe,
    },
    Resized,
    NextPage,
    PrevPage,
    Display {
        target: String,
        returnable: bool,
    },
    ReturnToPrevLocation,
    StayAtLocation,
    SetKeyword(String),
    Define(String),
    Undefine(String),
    RemoveAnnotation(String),
    ToggleSidebar(SidebarView),
    TypographyChanged(Typography),
    CloseImagePreview,
    SelectionChanged {
        tab_id: String,
        selection: Option<LiveSelection>,
        geometry: Option<MenuGeometry>,
    },
    AnnotationClicked {
        tab_id: String,
        range: TextRange,
        geometry: Option<MenuGeometry>,
    },
    MenuAction {
        tab_id: String,
        action: MenuAction,
    },
    NotesChanged {
        tab_id: String,
        notes: String,
    },
    DismissMenu {
        tab_id: String,
    },
    TranslationSettled {
        tab_id: String,
        generation: u64,
        request_id: u64,
        result: Result<String, String>,
    },
    BookPersisted {
        id: String,
        error: Option<String>,
    },
}
