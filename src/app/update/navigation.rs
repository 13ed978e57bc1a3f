use super::super::state::App;
use tracing::debug;

impl App {
    pub(super) fn handle_next_page(&mut self) {
        match self.reader.focused_book_tab_mut() {
            Some(tab) => tab.next(),
            None => debug!("Next page without a focused book"),
        }
    }

    pub(super) fn handle_prev_page(&mut self) {
        match self.reader.focused_book_tab_mut() {
            Some(tab) => tab.prev(),
            None => debug!("Previous page without a focused book"),
        }
    }

    pub(super) fn handle_display(&mut self, target: &str, returnable: bool) {
        if let Some(tab) = self.reader.focused_book_tab_mut() {
            tab.display(target, returnable);
        }
    }

    pub(super) fn handle_return_to_prev_location(&mut self) {
        if let Some(tab) = self.reader.focused_book_tab_mut() {
            tab.return_to_prev_location();
        }
    }

    pub(super) fn handle_stay_at_location(&mut self) {
        if let Some(tab) = self.reader.focused_book_tab_mut() {
            tab.hide_prev_location();
        }
    }

    pub(super) fn handle_resized(&mut self) {
        for tab in self.reader.book_tabs_mut() {
            tab.resize();
        }
    }

    pub(super) fn handle_wheel(&mut self, tab_id: &str, delta_y: f64) {
        let Some(tab) = self.reader.find_book_tab_mut(tab_id) else {
            return;
        };
        if delta_y < 0.0 {
            tab.prev();
        } else {
            tab.next();
        }
    }

    pub(super) fn handle_set_keyword(&mut self, keyword: &str) {
        if let Some(tab) = self.reader.focused_book_tab_mut() {
            tab.set_keyword(keyword);
            debug!(id = tab.id(), results = tab.results().len(), "Search updated");
        }
    }

    pub(super) fn handle_define(&mut self, word: &str) {
        if let Some(tab) = self.reader.focused_book_tab_mut() {
            tab.define(&[word]);
        }
    }

    pub(super) fn handle_undefine(&mut self, word: &str) {
        if let Some(tab) = self.reader.focused_book_tab_mut() {
            tab.undefine(word);
        }
    }

    pub(super) fn handle_remove_annotation(&mut self, cfi: &str) {
        if let Some(tab) = self.reader.focused_book_tab_mut() {
            tab.remove_annotation(cfi);
        }
    }
}
