use super::book_tab::BookTab;
use super::group::Group;
use super::tab::Tab;
use tracing::{debug, warn};

/// Pane layout: an ordered list of groups and the focused one.
#[derive(Default)]
pub struct Reader {
    groups: Vec<Group>,
    focused_index: Option<usize>,
}

impl Reader {
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn group(&self, index: usize) -> Option<&Group> {
        self.groups.get(index)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn focused_index(&self) -> Option<usize> {
        self.focused_index
    }

    pub fn focused_group(&self) -> Option<&Group> {
        self.groups.get(self.focused_index?)
    }

    pub fn focused_tab(&self) -> Option<&Tab> {
        self.focused_group()?.selected_tab()
    }

    pub fn focused_book_tab(&self) -> Option<&BookTab> {
        self.focused_tab()?.as_book()
    }

    pub(in crate::app) fn focused_book_tab_mut(&mut self) -> Option<&mut BookTab> {
        let index = self.focused_index?;
        self.groups.get_mut(index)?.selected_tab_mut()?.as_book_mut()
    }

    pub fn find_book_tab(&self, id: &str) -> Option<&BookTab> {
        self.groups
            .iter()
            .flat_map(|group| group.tabs())
            .filter_map(Tab::as_book)
            .find(|tab| tab.id() == id)
    }

    /// `(group, tab)` of the book tab with identity `id`, in any group.
    pub fn locate_book(&self, id: &str) -> Option<(usize, usize)> {
        self.groups.iter().enumerate().find_map(|(index, group)| {
            group
                .tabs()
                .iter()
                .position(|tab| tab.as_book().is_some_and(|book| book.id() == id))
                .map(|tab| (index, tab))
        })
    }

    pub(in crate::app) fn find_book_tab_mut(&mut self, id: &str) -> Option<&mut BookTab> {
        self.book_tabs_mut().find(|tab| tab.id() == id)
    }

    pub(in crate::app) fn book_tabs_mut(&mut self) -> impl Iterator<Item = &mut BookTab> {
        self.groups.iter_mut().flat_map(Group::book_tabs_mut)
    }

    pub(in crate::app) fn select_group(&mut self, index: usize) -> bool {
        if index >= self.groups.len() {
            return false;
        }
        self.focused_index = Some(index);
        true
    }

    pub(in crate::app) fn select_tab(&mut self, group: usize, tab: usize) -> bool {
        let selected = self
            .groups
            .get_mut(group)
            .is_some_and(|target| target.select_tab(tab));
        if selected {
            self.focused_index = Some(group);
        }
        selected
    }

    /// Insert a new group at `index` (clamped) and focus it. Empty tab lists
    /// create nothing.
    pub(in crate::app) fn add_group(&mut self, tabs: Vec<Tab>, index: usize) -> Option<usize> {
        let group = Group::new(tabs)?;
        let index = index.min(self.groups.len());
        debug!(index, id = group.id(), "Adding group");
        self.groups.insert(index, group);
        self.focused_index = Some(index);
        Some(index)
    }

    /// Remove the group at `index`, keeping the focus on a live group.
    pub(in crate::app) fn remove_group(&mut self, index: usize) -> Option<Group> {
        if index >= self.groups.len() {
            return None;
        }
        let group = self.groups.remove(index);
        self.focused_index = match self.focused_index {
            _ if self.groups.is_empty() => None,
            Some(focused) if focused > index => Some(focused - 1),
            Some(focused) if focused >= self.groups.len() => Some(self.groups.len() - 1),
            other => other,
        };
        Some(group)
    }

    /// Add `tab` to group `group`, or to a new trailing group when that group
    /// does not exist. Returns the index of the group that received it.
    pub(in crate::app) fn add_tab(&mut self, tab: Tab, group: usize) -> usize {
        match self.groups.get_mut(group) {
            Some(target) => {
                target.add_tab(tab);
                self.focused_index = Some(group);
                group
            }
            None => {
                let index = self.groups.len();
                self.add_group(vec![tab], index).unwrap_or(index)
            }
        }
    }

    /// Remove a tab; removing the last tab of a group removes the group.
    pub(in crate::app) fn remove_tab(&mut self, tab: usize, group: usize) -> Option<Tab> {
        let target = self.groups.get_mut(group)?;
        if tab >= target.len() {
            warn!(group, tab, "No such tab to remove");
            return None;
        }
        if target.len() == 1 {
            return self.remove_group(group)?.into_tabs().pop();
        }
        target.remove_tab(tab)
    }

    /// Close every tab and drop every group.
    pub(in crate::app) fn clear(&mut self) {
        for mut tab in self.groups.drain(..).flat_map(Group::into_tabs) {
            tab.close();
        }
        self.focused_index = None;
    }
}
