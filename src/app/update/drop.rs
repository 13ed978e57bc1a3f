use super::super::messages::{DropPayload, DropPosition, DropTarget, TabSource};
use super::super::state::{App, PageKind, Tab};
use super::Effect;
use tracing::{debug, info, warn};

/// A drag payload after it has been read out of the host event.
#[derive(Debug, Clone, PartialEq, Eq)]
enum DropSource {
    Files(Vec<std::path::PathBuf>),
    Tab { group: usize, tab: usize },
    Page(PageKind),
    Book(String),
}

impl DropSource {
    fn parse(payload: DropPayload) -> Option<Self> {
        if !payload.files.is_empty() {
            return Some(DropSource::Files(payload.files));
        }
        let text = payload.text?;
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        if let Some((group, tab)) = text.split_once(',') {
            if let (Ok(group), Ok(tab)) = (group.trim().parse(), tab.trim().parse()) {
                return Some(DropSource::Tab { group, tab });
            }
        }
        Some(match PageKind::from_id(text) {
            Some(kind) => DropSource::Page(kind),
            None => DropSource::Book(text.to_string()),
        })
    }
}

impl App {
    pub(super) fn handle_drop(
        &mut self,
        target: DropTarget,
        payload: DropPayload,
        effects: &mut Vec<Effect>,
    ) {
        let Some(source) = DropSource::parse(payload) else {
            debug!(?target, "Ignoring empty drop");
            return;
        };
        match source {
            DropSource::Files(files) => {
                info!(count = files.len(), ?target, "Importing dropped files");
                effects.push(Effect::ImportFiles { files, target });
            }
            DropSource::Tab { group, tab } => self.relocate_tab(group, tab, target),
            DropSource::Page(kind) => self.place_tabs(vec![Tab::from(kind)], target),
            DropSource::Book(id) => effects.push(Effect::ResolveBook { id, target }),
        }
    }

    /// Move a tab between groups. Dropping a group's sole tab on that group,
    /// or any tab on the middle of its own group, changes nothing.
    fn relocate_tab(&mut self, group: usize, tab: usize, target: DropTarget) {
        let Some(source) = self.reader.group(group) else {
            warn!(group, tab, "Dropped tab from an unknown group");
            return;
        };
        if group == target.group
            && (source.len() == 1 || target.position == DropPosition::Universe)
        {
            debug!(group, tab, "Dropped tab onto its own group");
            return;
        }
        let removes_group = source.len() == 1;
        let Some(mut moved) = self.reader.remove_tab(tab, group) else {
            return;
        };
        moved.detach();
        self.selections.remove(moved.id());
        let mut target = target;
        if removes_group && group < target.group {
            target.group -= 1;
        }
        self.place_tabs(vec![moved], target);
    }

    pub(super) fn handle_tabs_resolved(
        &mut self,
        target: DropTarget,
        sources: Vec<TabSource>,
        error: Option<String>,
    ) {
        if let Some(error) = error {
            warn!(?target, "Failed to resolve dropped content: {error}");
        }
        let tabs: Vec<Tab> = sources
            .into_iter()
            .map(|source| self.materialize(source))
            .collect();
        self.place_tabs(tabs, target);
    }

    /// Edges create a new group beside the target; the middle adds to it.
    /// A book already open in any group is selected where it is, so each
    /// book has exactly one tab holding its state.
    pub(super) fn place_tabs(&mut self, tabs: Vec<Tab>, target: DropTarget) {
        let mut fresh: Vec<Tab> = Vec::with_capacity(tabs.len());
        for mut tab in tabs {
            if tab.as_book().is_none() {
                fresh.push(tab);
                continue;
            }
            if let Some((group, index)) = self.reader.locate_book(tab.id()) {
                debug!(id = tab.id(), group, index, "Book already open, selecting it");
                tab.close();
                self.reader.select_tab(group, index);
            } else if fresh.iter().any(|other| other.id() == tab.id()) {
                tab.close();
            } else {
                fresh.push(tab);
            }
        }
        let tabs = fresh;
        if tabs.is_empty() {
            return;
        }
        match target.position {
            DropPosition::Left => {
                self.reader.add_group(tabs, target.group);
            }
            DropPosition::Right => {
                self.reader.add_group(tabs, target.group + 1);
            }
            DropPosition::Universe => {
                let mut group = target.group;
                for tab in tabs {
                    group = self.reader.add_tab(tab, group);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{app_with, book_source, open};
    use super::*;
    use crate::app::messages::Message;
    use crate::app::state::RenderState;
    use crate::config::AppConfig;

    fn tab_ids(app: &App) -> Vec<Vec<String>> {
        app.reader()
            .groups()
            .iter()
            .map(|group| group.tabs().iter().map(|tab| tab.id().to_string()).collect())
            .collect()
    }

    fn drop_text(app: &mut App, group: usize, position: DropPosition, text: &str) {
        app.update(Message::Drop {
            target: DropTarget { group, position },
            payload: DropPayload::text(text),
        });
    }

    fn three_groups() -> App {
        let mut app = app_with(AppConfig::default());
        for (group, kind) in PageKind::ALL.into_iter().enumerate() {
            open(&mut app, group, DropPosition::Universe, vec![TabSource::Page(kind)]);
        }
        app
    }

    #[test]
    fn own_group_drops_are_ignored() {
        let mut app = three_groups();
        open(&mut app, 0, DropPosition::Universe, vec![book_source("a")]);
        let before = tab_ids(&app);
        drop_text(&mut app, 0, DropPosition::Universe, "0,0");
        drop_text(&mut app, 1, DropPosition::Left, "1,0");
        assert_eq!(tab_ids(&app), before);
    }

    #[test]
    fn target_shifts_when_source_group_disappears() {
        let mut app = three_groups();
        drop_text(&mut app, 2, DropPosition::Left, "0,0");
        assert_eq!(
            tab_ids(&app),
            vec![
                vec!["SettingsPage".to_string()],
                vec!["HomePage".to_string()],
                vec!["AboutPage".to_string()],
            ]
        );
        assert_eq!(app.reader().focused_index(), Some(1));
    }

    #[test]
    fn right_edge_creates_group_after_target() {
        let mut app = three_groups();
        open(&mut app, 0, DropPosition::Universe, vec![book_source("a")]);
        drop_text(&mut app, 1, DropPosition::Right, "0,1");
        assert_eq!(
            tab_ids(&app),
            vec![
                vec!["HomePage".to_string()],
                vec!["SettingsPage".to_string()],
                vec!["a".to_string()],
                vec!["AboutPage".to_string()],
            ]
        );
    }

    #[test]
    fn relocated_book_is_rendered_again() {
        let mut app = app_with(AppConfig::default());
        open(&mut app, 0, DropPosition::Universe, vec![book_source("a")]);
        open(&mut app, 1, DropPosition::Universe, vec![TabSource::Page(PageKind::Home)]);
        let first_container = app.reader().find_book_tab("a").unwrap().container();

        drop_text(&mut app, 1, DropPosition::Universe, "0,0");

        assert_eq!(
            tab_ids(&app),
            vec![vec!["HomePage".to_string(), "a".to_string()]]
        );
        let tab = app.reader().find_book_tab("a").unwrap();
        assert_eq!(tab.render_state(), RenderState::Rendered);
        assert_ne!(tab.container(), first_container);
    }

    #[test]
    fn open_book_is_selected_instead_of_duplicated() {
        let mut app = three_groups();
        open(&mut app, 0, DropPosition::Universe, vec![book_source("a")]);
        open(&mut app, 2, DropPosition::Right, vec![book_source("a")]);
        open(&mut app, 1, DropPosition::Universe, vec![book_source("a"), book_source("b")]);
        open(&mut app, 1, DropPosition::Left, vec![book_source("c"), book_source("c")]);

        assert_eq!(
            tab_ids(&app),
            vec![
                vec!["HomePage".to_string(), "a".to_string()],
                vec!["c".to_string()],
                vec!["SettingsPage".to_string(), "b".to_string()],
                vec!["AboutPage".to_string()],
            ]
        );
        open(&mut app, 3, DropPosition::Right, vec![book_source("a")]);
        assert_eq!(app.reader().len(), 4);
        assert_eq!(app.reader().focused_index(), Some(0));
        assert_eq!(app.reader().focused_tab().unwrap().id(), "a");
    }

    #[test]
    fn page_ids_open_without_effects() {
        let mut app = app_with(AppConfig::default());
        let effects = app.update(Message::Drop {
            target: DropTarget {
                group: 0,
                position: DropPosition::Universe,
            },
            payload: DropPayload::text("AboutPage"),
        });
        assert!(effects.is_empty());
        assert_eq!(tab_ids(&app), vec![vec!["AboutPage".to_string()]]);

        let effects = app.update(Message::Drop {
            target: DropTarget {
                group: 0,
                position: DropPosition::Left,
            },
            payload: DropPayload::text("book-1"),
        });
        assert!(matches!(
            effects.as_slice(),
            [Effect::ResolveBook { id, .. }] if id == "book-1"
        ));
    }

    #[test]
    fn parses_tab_coordinates_before_ids() {
        assert_eq!(
            DropSource::parse(DropPayload::text("1, 0")),
            Some(DropSource::Tab { group: 1, tab: 0 })
        );
        assert_eq!(
            DropSource::parse(DropPayload::text("SettingsPage")),
            Some(DropSource::Page(PageKind::Settings))
        );
        assert_eq!(
            DropSource::parse(DropPayload::text("abc,def")),
            Some(DropSource::Book("abc,def".to_string()))
        );
        assert_eq!(DropSource::parse(DropPayload::text("  ")), None);
    }

    #[test]
    fn files_take_precedence_over_text() {
        let payload = DropPayload {
            files: vec!["a.epub".into()],
            text: Some("0,0".into()),
        };
        assert_eq!(
            DropSource::parse(payload),
            Some(DropSource::Files(vec!["a.epub".into()]))
        );
    }
}
