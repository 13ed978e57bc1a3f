use super::{App, BookTab, NavCrumb, RenderState, SidebarView, Tab};
use crate::annotation::{Annotation, BookAnnotations, group_annotations};
use crate::selection::{MenuAction, SelectionMenu};
use serde::Serialize;

/// Nominal menu box used when reporting its placement.
const MENU_WIDTH: f64 = 320.0;
const MENU_HEIGHT: f64 = 48.0;

/// Serializable view of the reader, printed by the binary after each
/// command.
#[derive(Debug, Clone, Serialize)]
pub struct ReaderSnapshot {
    pub groups: Vec<GroupSnapshot>,
    pub focused_index: Option<usize>,
    pub focused_tab: Option<BookTabSnapshot>,
    pub sidebar: Option<SidebarView>,
    /// Annotations of every open book, filled while the annotation list is shown.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub annotation_list: Vec<BookAnnotations>,
    pub clipboard: Option<String>,
    pub navbar_visible: bool,
    pub image_preview: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupSnapshot {
    pub id: String,
    pub index: usize,
    pub selected_index: usize,
    pub tabs: Vec<TabSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TabSummary {
    pub id: String,
    pub title: String,
    pub kind: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookTabSnapshot {
    pub id: String,
    pub title: String,
    pub render_state: RenderState,
    pub cfi: Option<String>,
    pub page_label: Option<String>,
    pub location_to_return: Option<String>,
    pub percentage: f64,
    pub nav_path: Vec<NavCrumb>,
    pub keyword: String,
    pub result_count: usize,
    pub annotations: usize,
    pub definitions: Vec<String>,
    pub menu: Option<MenuSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MenuSnapshot {
    pub text: String,
    pub cfi: String,
    pub forward: bool,
    pub position: (f64, f64),
    pub annotate: bool,
    pub notes: String,
    pub show_translation: bool,
    pub translation: Option<String>,
    pub translating: bool,
    pub actions: Vec<MenuAction>,
}

impl App {
    pub fn snapshot(&self) -> ReaderSnapshot {
        let groups = self
            .reader
            .groups()
            .iter()
            .enumerate()
            .map(|(index, group)| GroupSnapshot {
                id: group.id().to_string(),
                index,
                selected_index: group.selected_index(),
                tabs: group.tabs().iter().map(summarize).collect(),
            })
            .collect();
        let focused_tab = self
            .reader
            .focused_book_tab()
            .map(|tab| self.book_tab_snapshot(tab));
        ReaderSnapshot {
            groups,
            focused_index: self.reader.focused_index(),
            focused_tab,
            sidebar: self.sidebar,
            annotation_list: self.annotation_list(),
            clipboard: self.clipboard.clone(),
            navbar_visible: self.navbar_visible,
            image_preview: self.image_preview.clone(),
        }
    }

    fn annotation_list(&self) -> Vec<BookAnnotations> {
        if self.sidebar != Some(SidebarView::Annotations) {
            return Vec::new();
        }
        let annotations: Vec<Annotation> = self
            .reader
            .groups()
            .iter()
            .flat_map(|group| group.tabs())
            .filter_map(Tab::as_book)
            .flat_map(|tab| tab.book().annotations.iter().cloned())
            .collect();
        group_annotations(&annotations)
    }

    fn book_tab_snapshot(&self, tab: &BookTab) -> BookTabSnapshot {
        let book = tab.book();
        BookTabSnapshot {
            id: tab.id().to_string(),
            title: tab.title().to_string(),
            render_state: tab.render_state(),
            cfi: book.cfi.clone(),
            page_label: tab.location().map(|location| location.page_label()),
            location_to_return: tab
                .location_to_return()
                .map(|location| location.end.cfi.clone()),
            percentage: book.percentage,
            nav_path: tab.nav_path(),
            keyword: tab.keyword().to_string(),
            result_count: tab.results().len(),
            annotations: book.annotations.len(),
            definitions: book.definitions.clone(),
            menu: self
                .menu(tab.id())
                .map(|menu| menu_snapshot(menu, tab)),
        }
    }
}

fn summarize(tab: &Tab) -> TabSummary {
    TabSummary {
        id: tab.id().to_string(),
        title: tab.title().to_string(),
        kind: match tab {
            Tab::Book(_) => "book",
            Tab::Page(_) => "page",
        },
    }
}

fn menu_snapshot(menu: &SelectionMenu, tab: &BookTab) -> MenuSnapshot {
    let anchor = menu.anchor();
    MenuSnapshot {
        text: anchor.text.clone(),
        cfi: anchor.cfi.clone(),
        forward: anchor.forward,
        position: menu.position(MENU_WIDTH, MENU_HEIGHT),
        annotate: menu.is_annotating(),
        notes: menu.notes().to_string(),
        show_translation: menu.showing_translation(),
        translation: menu.translation().map(str::to_string),
        translating: menu.is_translating(),
        actions: menu.actions(tab.book()),
    }
}
