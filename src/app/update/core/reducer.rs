use super::super::super::messages::{DropPayload, DropPosition, DropTarget, Message};
use super::super::super::state::{App, PageKind, SidebarView, Tab};
use super::super::Effect;
use crate::rendition::Typography;
use std::path::PathBuf;
use tracing::{debug, info, warn};

impl App {
    pub(super) fn reduce(&mut self, message: Message) -> Vec<Effect> {
        let mut effects = Vec::new();

        match message {
            Message::SelectGroup(index) => self.handle_select_group(index),
            Message::SelectTab { group, tab } => self.handle_select_tab(group, tab),
            Message::CloseTab { group, tab } => self.handle_close_tab(group, tab),
            Message::CloseGroup(index) => self.handle_close_group(index),
            Message::OpenFiles(files) => self.handle_open_files(files, &mut effects),
            Message::OpenBook(id) => self.handle_open_book(id, &mut effects),
            Message::OpenPage(kind) => self.handle_open_page(kind),
            Message::Drop { target, payload } => self.handle_drop(target, payload, &mut effects),
            Message::TabsResolved {
                target,
                tabs,
                error,
            } => self.handle_tabs_resolved(target, tabs, error),
            Message::KeyPressed { key, modifiers } => {
                if let Some(message) = self.shortcut_message_for_key(&key, modifiers) {
                    effects.extend(self.reduce(message));
                }
            }
            Message::Wheel { tab_id, delta_y } => self.handle_wheel(&tab_id, delta_y),
            Message::FrameClicked { tab_id, target } => self.handle_frame_clicked(&tab_id, target),
            Message::Swiped { tab_id, swipe } => self.handle_swiped(&tab_id, swipe),
            Message::Resized => self.handle_resized(),
            Message::NextPage => self.handle_next_page(),
            Message::PrevPage => self.handle_prev_page(),
            Message::Display { target, returnable } => self.handle_display(&target, returnable),
            Message::ReturnToPrevLocation => self.handle_return_to_prev_location(),
            Message::StayAtLocation => self.handle_stay_at_location(),
            Message::SetKeyword(keyword) => self.handle_set_keyword(&keyword),
            Message::Define(word) => self.handle_define(&word),
            Message::Undefine(word) => self.handle_undefine(&word),
            Message::RemoveAnnotation(cfi) => self.handle_remove_annotation(&cfi),
            Message::ToggleSidebar(view) => self.handle_toggle_sidebar(view),
            Message::TypographyChanged(typography) => self.handle_typography_changed(typography),
            Message::CloseImagePreview => self.image_preview = None,
            Message::SelectionChanged {
                tab_id,
                selection,
                geometry,
            } => self.handle_selection_changed(tab_id, selection, geometry),
            Message::AnnotationClicked {
                tab_id,
                range,
                geometry,
            } => self.handle_annotation_clicked(tab_id, range, geometry),
            Message::MenuAction { tab_id, action } => self.handle_menu_action(&tab_id, action),
            Message::NotesChanged { tab_id, notes } => self.handle_notes_changed(&tab_id, &notes),
            Message::DismissMenu { tab_id } => self.dismiss_menu(&tab_id),
            Message::TranslationSettled {
                tab_id,
                generation,
                request_id,
                result,
            } => self.handle_translation_settled(
                &tab_id,
                generation,
                request_id,
                result,
                &mut effects,
            ),
            Message::BookPersisted { id, error } => match error {
                Some(error) => warn!(id = %id, "Failed to persist book: {error}"),
                None => debug!(id = %id, "Book persisted"),
            },
        }

        effects
    }

    fn handle_select_group(&mut self, index: usize) {
        if !self.reader.select_group(index) {
            warn!(index, "No such group to focus");
        }
    }

    fn handle_select_tab(&mut self, group: usize, tab: usize) {
        if !self.reader.select_tab(group, tab) {
            warn!(group, tab, "No such tab to select");
        }
    }

    fn handle_close_tab(&mut self, group: usize, tab: usize) {
        if let Some(mut closed) = self.reader.remove_tab(tab, group) {
            info!(id = closed.id(), "Closing tab");
            self.selections.remove(closed.id());
            closed.close();
        }
    }

    fn handle_close_group(&mut self, index: usize) {
        let Some(group) = self.reader.remove_group(index) else {
            warn!(index, "No such group to close");
            return;
        };
        for mut tab in group.into_tabs() {
            self.selections.remove(tab.id());
            tab.close();
        }
    }

    /// Opening from the host lands in the focused group, or a new one.
    fn focused_target(&self) -> DropTarget {
        DropTarget {
            group: self.reader.focused_index().unwrap_or(self.reader.len()),
            position: DropPosition::Universe,
        }
    }

    fn handle_open_files(&mut self, files: Vec<PathBuf>, effects: &mut Vec<Effect>) {
        let target = self.focused_target();
        self.handle_drop(target, DropPayload::files(files), effects);
    }

    fn handle_open_book(&mut self, id: String, effects: &mut Vec<Effect>) {
        let target = self.focused_target();
        effects.push(Effect::ResolveBook { id, target });
    }

    fn handle_open_page(&mut self, kind: PageKind) {
        let group = self.focused_target().group;
        self.reader.add_tab(Tab::from(kind), group);
    }

    fn handle_toggle_sidebar(&mut self, view: SidebarView) {
        self.sidebar = if self.sidebar == Some(view) {
            None
        } else {
            Some(view)
        };
    }

    fn handle_typography_changed(&mut self, typography: Typography) {
        self.config.spread = typography.spread;
        self.config.font_family = typography.font_family.clone();
        self.config.dark_mode = typography.dark;
        for tab in self.reader.book_tabs_mut() {
            tab.apply_typography(&typography);
        }
    }
}
