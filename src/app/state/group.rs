use super::book_tab::BookTab;
use super::tab::Tab;
use tracing::debug;

/// An ordered set of tabs shown in one pane. Never empty.
pub struct Group {
    id: String,
    tabs: Vec<Tab>,
    selected_index: usize,
}

impl Group {
    /// `None` for an empty tab list; the last tab starts selected.
    pub(in crate::app) fn new(tabs: Vec<Tab>) -> Option<Self> {
        if tabs.is_empty() {
            return None;
        }
        let selected_index = tabs.len() - 1;
        Some(Self {
            id: uuid::Uuid::new_v4().to_string(),
            tabs,
            selected_index,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn selected_index(&self) -> usize {
        self.selected_index
    }

    pub fn selected_tab(&self) -> Option<&Tab> {
        self.tabs.get(self.selected_index)
    }

    pub fn selected_tab_mut(&mut self) -> Option<&mut Tab> {
        self.tabs.get_mut(self.selected_index)
    }

    pub fn position(&self, tab_id: &str) -> Option<usize> {
        self.tabs.iter().position(|tab| tab.id() == tab_id)
    }

    pub(in crate::app) fn book_tabs_mut(&mut self) -> impl Iterator<Item = &mut BookTab> {
        self.tabs.iter_mut().filter_map(Tab::as_book_mut)
    }

    pub(in crate::app) fn select_tab(&mut self, index: usize) -> bool {
        if index >= self.tabs.len() {
            return false;
        }
        self.selected_index = index;
        true
    }

    /// Insert after the selected tab and select it. A tab whose identity is
    /// already present selects the existing one instead; the incoming
    /// duplicate is closed.
    pub(in crate::app) fn add_tab(&mut self, mut tab: Tab) -> usize {
        if let Some(existing) = self.position(tab.id()) {
            debug!(id = tab.id(), "Tab already open in group, selecting it");
            tab.close();
            self.selected_index = existing;
            return existing;
        }
        let index = (self.selected_index + 1).min(self.tabs.len());
        self.tabs.insert(index, tab);
        self.selected_index = index;
        index
    }

    /// Remove the tab at `index`, keeping the selection on a valid tab.
    /// Callers remove the whole group instead of its last tab.
    pub(in crate::app) fn remove_tab(&mut self, index: usize) -> Option<Tab> {
        if index >= self.tabs.len() || self.tabs.len() == 1 {
            return None;
        }
        let tab = self.tabs.remove(index);
        if self.selected_index > index || self.selected_index >= self.tabs.len() {
            self.selected_index = self.selected_index.saturating_sub(1);
        }
        Some(tab)
    }

    pub(in crate::app) fn into_tabs(self) -> Vec<Tab> {
        self.tabs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::state::PageKind;

    fn group(kinds: &[PageKind]) -> Group {
        Group::new(kinds.iter().copied().map(Tab::from).collect()).unwrap()
    }

    #[test]
    fn empty_groups_are_not_constructible() {
        assert!(Group::new(Vec::new()).is_none());
    }

    #[test]
    fn adds_after_selection_and_dedupes() {
        let mut g = group(&[PageKind::Home, PageKind::About]);
        g.select_tab(0);
        assert_eq!(g.add_tab(PageKind::Settings.into()), 1);
        let ids: Vec<_> = g.tabs().iter().map(Tab::id).collect();
        assert_eq!(ids, vec!["HomePage", "SettingsPage", "AboutPage"]);

        assert_eq!(g.add_tab(PageKind::About.into()), 2);
        assert_eq!(g.len(), 3);
        assert_eq!(g.selected_index(), 2);
    }

    #[test]
    fn removal_keeps_selection_valid() {
        let mut g = group(&[PageKind::Home, PageKind::Settings, PageKind::About]);
        assert_eq!(g.selected_index(), 2);
        assert!(g.remove_tab(2).is_some());
        assert_eq!(g.selected_index(), 1);

        g.select_tab(1);
        assert!(g.remove_tab(0).is_some());
        assert_eq!(g.selected_index(), 0);
        assert_eq!(g.selected_tab().unwrap().id(), "SettingsPage");
        assert!(g.remove_tab(0).is_none());
    }
}
