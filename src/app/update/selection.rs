use super::super::state::{App, SidebarView};
use super::Effect;
use crate::annotation::{AnnotationColor, AnnotationType};
use crate::selection::{LiveSelection, MenuAction, MenuGeometry, SelectionMenu, TextRange, resolve_anchor};
use tracing::{debug, trace, warn};

impl App {
    pub(super) fn handle_selection_changed(
        &mut self,
        tab_id: String,
        selection: Option<LiveSelection>,
        geometry: Option<MenuGeometry>,
    ) {
        if self.reader.find_book_tab(&tab_id).is_none() {
            warn!(id = %tab_id, "Selection reported for an unknown tab");
            return;
        }
        let state = self.selections.entry(tab_id).or_default();
        state.live = selection;
        if geometry.is_some() {
            state.geometry = geometry;
        }
    }

    pub(super) fn handle_annotation_clicked(
        &mut self,
        tab_id: String,
        range: TextRange,
        geometry: Option<MenuGeometry>,
    ) {
        let Some(tab) = self.reader.find_book_tab_mut(&tab_id) else {
            return;
        };
        tab.annotation_range = Some(range);
        let state = self.selections.entry(tab_id).or_default();
        if geometry.is_some() {
            state.geometry = geometry;
        }
    }

    pub(super) fn handle_notes_changed(&mut self, tab_id: &str, notes: &str) {
        if let Some(menu) = self.menu_mut(tab_id) {
            menu.set_notes(notes);
        }
    }

    fn menu_mut(&mut self, tab_id: &str) -> Option<&mut SelectionMenu> {
        self.selections.get_mut(tab_id)?.menu.as_mut()
    }

    /// Clear the live selection, the stored annotation range and the menu.
    pub(super) fn dismiss_menu(&mut self, tab_id: &str) {
        if let Some(state) = self.selections.get_mut(tab_id) {
            state.live = None;
            state.menu = None;
        }
        if let Some(tab) = self.reader.find_book_tab_mut(tab_id) {
            tab.annotation_range = None;
        }
    }

    /// Open, retarget or close each tab's menu to follow its active range.
    pub(super) fn refresh_menus(&mut self, effects: &mut Vec<Effect>) {
        let device = self.config.device;
        let translate = self.config.translation_enabled;
        let tab_ids: Vec<String> = self.selections.keys().cloned().collect();
        for tab_id in tab_ids {
            let Some(tab) = self.reader.find_book_tab(&tab_id) else {
                self.selections.remove(&tab_id);
                continue;
            };
            let Some(state) = self.selections.get(&tab_id) else {
                continue;
            };
            let anchor = state.geometry.and_then(|geometry| {
                resolve_anchor(
                    state.live.as_ref(),
                    tab.annotation_range.as_ref(),
                    device,
                    geometry.zoom,
                )
            });
            let existing = anchor
                .as_ref()
                .and_then(|anchor| tab.book().annotation(&anchor.cfi))
                .cloned();
            // A menu follows its selection until the annotation under it changes.
            let reopen = match (&anchor, &state.menu) {
                (Some(_), Some(menu)) => {
                    let previous = tab.book().annotation(&menu.anchor().cfi);
                    previous.map(|annotation| &annotation.id)
                        != existing.as_ref().map(|annotation| &annotation.id)
                }
                _ => true,
            };
            let generation = if reopen && anchor.is_some() {
                self.allocate_menu_generation()
            } else {
                0
            };
            let Some(state) = self.selections.get_mut(&tab_id) else {
                continue;
            };
            let (Some(anchor), Some(geometry)) = (anchor, state.geometry) else {
                if state.menu.take().is_some() {
                    trace!(id = %tab_id, "Selection menu closed");
                }
                continue;
            };
            let request = match state.menu.as_mut() {
                Some(menu) if !reopen => menu.retarget(anchor, geometry),
                _ => {
                    let (menu, request) =
                        SelectionMenu::open(generation, anchor, geometry, existing.as_ref(), translate);
                    debug!(id = %tab_id, generation, "Selection menu opened");
                    state.menu = Some(menu);
                    request
                }
            };
            if let (Some(request), Some(menu)) = (request, state.menu.as_ref()) {
                effects.push(Effect::Translate {
                    tab_id: tab_id.clone(),
                    generation: menu.generation(),
                    request,
                });
            }
        }
    }

    pub(super) fn handle_translation_settled(
        &mut self,
        tab_id: &str,
        generation: u64,
        request_id: u64,
        result: Result<String, String>,
        effects: &mut Vec<Effect>,
    ) {
        let Some(menu) = self.menu_mut(tab_id) else {
            debug!(id = tab_id, request_id, "Translation settled after menu closed");
            return;
        };
        if menu.generation() != generation {
            debug!(id = tab_id, request_id, "Translation settled for a replaced menu");
            return;
        }
        if let Some(request) = menu.settle_translation(request_id, result) {
            effects.push(Effect::Translate {
                tab_id: tab_id.to_string(),
                generation,
                request,
            });
        }
    }

    pub(super) fn handle_menu_action(&mut self, tab_id: &str, action: MenuAction) {
        let Some(anchor) = self.menu(tab_id).map(|menu| menu.anchor().clone()) else {
            warn!(id = tab_id, ?action, "Menu action without an open menu");
            return;
        };
        match action {
            MenuAction::ShowActions => {
                if let Some(menu) = self.menu_mut(tab_id) {
                    menu.show_actions();
                }
            }
            MenuAction::Copy => {
                self.clipboard = Some(anchor.text);
                self.dismiss_menu(tab_id);
            }
            MenuAction::SearchInBook => {
                if let Some(tab) = self.reader.find_book_tab_mut(tab_id) {
                    tab.set_keyword(&anchor.text);
                }
                self.sidebar = Some(SidebarView::Search);
                self.dismiss_menu(tab_id);
            }
            MenuAction::Annotate => {
                if let Some(menu) = self.menu_mut(tab_id) {
                    menu.start_annotating();
                }
            }
            MenuAction::Define => {
                if let Some(tab) = self.reader.find_book_tab_mut(tab_id) {
                    tab.define(&[anchor.text.as_str()]);
                }
                self.dismiss_menu(tab_id);
            }
            MenuAction::Undefine => {
                if let Some(tab) = self.reader.find_book_tab_mut(tab_id) {
                    tab.undefine(&anchor.text);
                }
                self.dismiss_menu(tab_id);
            }
            MenuAction::Paint { kind, color } => {
                let notes = self.menu(tab_id).and_then(SelectionMenu::draft_notes);
                if let Some(tab) = self.reader.find_book_tab_mut(tab_id) {
                    tab.put_annotation(kind, &anchor.cfi, color, &anchor.text, notes);
                }
                self.dismiss_menu(tab_id);
            }
            MenuAction::SaveNote => {
                let notes = self.menu(tab_id).and_then(SelectionMenu::draft_notes);
                if let Some(tab) = self.reader.find_book_tab_mut(tab_id) {
                    let (kind, color) = tab
                        .book()
                        .annotation(&anchor.cfi)
                        .map(|existing| (existing.kind, existing.color))
                        .unwrap_or((AnnotationType::Highlight, AnnotationColor::Yellow));
                    tab.put_annotation(kind, &anchor.cfi, color, &anchor.text, notes);
                }
                self.dismiss_menu(tab_id);
            }
            MenuAction::Delete => {
                if let Some(tab) = self.reader.find_book_tab_mut(tab_id) {
                    tab.remove_annotation(&anchor.cfi);
                }
                self.dismiss_menu(tab_id);
            }
        }
    }
}
