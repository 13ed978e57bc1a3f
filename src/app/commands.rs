use super::messages::{ClickTarget, DropPayload, DropPosition, DropTarget, Message};
use super::state::App;
use crate::annotation::{AnnotationColor, AnnotationType};
use crate::selection::{LiveSelection, MenuAction, MenuGeometry, Rect, SelectionDirection, TextRange};
use anyhow::{Context, Result, anyhow, bail};
use std::path::PathBuf;

/// Host box reported for selections made from the command line.
const COMMAND_VIEW: Rect = Rect {
    left: 0.0,
    top: 0.0,
    width: 800.0,
    height: 600.0,
};
const COMMAND_SELECTION: Rect = Rect {
    left: 120.0,
    top: 200.0,
    width: 160.0,
    height: 18.0,
};

/// One line typed on stdin.
#[derive(Debug, Clone)]
pub enum Command {
    Dispatch(Vec<Message>),
    Snapshot,
    Quit,
}

/// Parse a command line against the current app state. Commands acting on a
/// book use the focused tab.
pub fn parse_command(line: &str, app: &App) -> Result<Command> {
    let line = line.trim();
    let (name, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    let focused = || {
        app.reader()
            .focused_book_tab()
            .map(|tab| tab.id().to_string())
            .ok_or_else(|| anyhow!("no book is focused"))
    };
    let dispatch = |message: Message| -> Result<Command> { Ok(Command::Dispatch(vec![message])) };

    match name {
        "" | "snapshot" => Ok(Command::Snapshot),
        "quit" | "exit" => Ok(Command::Quit),
        "next" => dispatch(Message::NextPage),
        "prev" => dispatch(Message::PrevPage),
        "display" => dispatch(Message::Display {
            target: required(rest, "display <locator>")?.to_string(),
            returnable: true,
        }),
        "return" => dispatch(Message::ReturnToPrevLocation),
        "stay" => dispatch(Message::StayAtLocation),
        "search" => dispatch(Message::SetKeyword(rest.to_string())),
        "open" => {
            let files: Vec<PathBuf> = rest.split_whitespace().map(PathBuf::from).collect();
            if files.is_empty() {
                bail!("usage: open <file>..");
            }
            dispatch(Message::OpenFiles(files))
        }
        "select" => {
            let (cfi, text) = required(rest, "select <locator> <text>")?
                .split_once(char::is_whitespace)
                .ok_or_else(|| anyhow!("usage: select <locator> <text>"))?;
            dispatch(Message::SelectionChanged {
                tab_id: focused()?,
                selection: Some(LiveSelection {
                    range: TextRange {
                        cfi: cfi.to_string(),
                        text: text.trim().to_string(),
                        rects: vec![COMMAND_SELECTION],
                        line_height: None,
                    },
                    direction: SelectionDirection::Forward,
                }),
                geometry: Some(MenuGeometry {
                    container: COMMAND_VIEW,
                    view: COMMAND_VIEW,
                    zoom: 1.0,
                }),
            })
        }
        "dismiss" => dispatch(Message::DismissMenu {
            tab_id: focused()?,
        }),
        "highlight" => {
            let color: AnnotationColor = match rest {
                "" => AnnotationColor::Yellow,
                other => other.parse().map_err(|err: String| anyhow!(err))?,
            };
            menu_action(
                focused()?,
                MenuAction::Paint {
                    kind: AnnotationType::Highlight,
                    color,
                },
            )
        }
        "actions" => menu_action(focused()?, MenuAction::ShowActions),
        "copy" => menu_action(focused()?, MenuAction::Copy),
        "lookup" => menu_action(focused()?, MenuAction::SearchInBook),
        "annotate" => menu_action(focused()?, MenuAction::Annotate),
        "note" => {
            let tab_id = focused()?;
            Ok(Command::Dispatch(vec![
                Message::MenuAction {
                    tab_id: tab_id.clone(),
                    action: MenuAction::Annotate,
                },
                Message::NotesChanged {
                    tab_id: tab_id.clone(),
                    notes: rest.to_string(),
                },
                Message::MenuAction {
                    tab_id,
                    action: MenuAction::SaveNote,
                },
            ]))
        }
        "delete" => menu_action(focused()?, MenuAction::Delete),
        "define" if rest.is_empty() => menu_action(focused()?, MenuAction::Define),
        "define" => dispatch(Message::Define(rest.to_string())),
        "undefine" if rest.is_empty() => menu_action(focused()?, MenuAction::Undefine),
        "undefine" => dispatch(Message::Undefine(rest.to_string())),
        "unannotate" => dispatch(Message::RemoveAnnotation(
            required(rest, "unannotate <locator>")?.to_string(),
        )),
        "toggle" => {
            let index: usize = required(rest, "toggle <paragraph>")?
                .parse()
                .context("paragraph index must be a number")?;
            let tab = app
                .reader()
                .focused_book_tab()
                .ok_or_else(|| anyhow!("no book is focused"))?;
            let node = tab
                .paragraph_node(index)
                .ok_or_else(|| anyhow!("no paragraph {index} on this page"))?;
            dispatch(Message::FrameClicked {
                tab_id: tab.id().to_string(),
                target: ClickTarget {
                    node: Some(node),
                    ..ClickTarget::default()
                },
            })
        }
        "group" => dispatch(Message::SelectGroup(parse_index(rest, "group <index>")?)),
        "tab" => {
            let (group, tab) = two_indices(rest, "tab <group> <tab>")?;
            dispatch(Message::SelectTab { group, tab })
        }
        "close" => {
            let (group, tab) = two_indices(rest, "close <group> <tab>")?;
            dispatch(Message::CloseTab { group, tab })
        }
        "drop" => {
            let mut parts = rest.splitn(3, char::is_whitespace);
            let usage = "drop <group> <left|right|universe> <payload>";
            let group = parse_index(parts.next().unwrap_or_default(), usage)?;
            let position: DropPosition = parts
                .next()
                .unwrap_or_default()
                .parse()
                .map_err(|err: String| anyhow!(err))?;
            let payload = required(parts.next().unwrap_or_default().trim(), usage)?;
            dispatch(Message::Drop {
                target: DropTarget { group, position },
                payload: DropPayload::text(payload),
            })
        }
        other => bail!("unknown command `{other}`"),
    }
}

fn menu_action(tab_id: String, action: MenuAction) -> Result<Command> {
    Ok(Command::Dispatch(vec![Message::MenuAction { tab_id, action }]))
}

fn required<'a>(value: &'a str, usage: &str) -> Result<&'a str> {
    if value.is_empty() {
        bail!("usage: {usage}");
    }
    Ok(value)
}

fn parse_index(value: &str, usage: &str) -> Result<usize> {
    value
        .trim()
        .parse()
        .with_context(|| format!("usage: {usage}"))
}

fn two_indices(value: &str, usage: &str) -> Result<(usize, usize)> {
    let mut parts = value.split_whitespace();
    let first = parse_index(parts.next().unwrap_or_default(), usage)?;
    let second = parse_index(parts.next().unwrap_or_default(), usage)?;
    Ok((first, second))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::rendition::PagedRenditionFactory;
    use std::sync::Arc;

    fn app() -> App {
        App::new(
            AppConfig::default(),
            Arc::new(PagedRenditionFactory {
                paragraphs_per_page: 2,
            }),
        )
    }

    #[test]
    fn parses_navigation_commands() {
        let app = app();
        let Command::Dispatch(messages) = parse_command("next", &app).unwrap() else {
            panic!("expected a dispatch");
        };
        assert!(matches!(messages.as_slice(), [Message::NextPage]));
        assert!(matches!(parse_command("  ", &app).unwrap(), Command::Snapshot));
        assert!(matches!(parse_command("quit", &app).unwrap(), Command::Quit));
    }

    #[test]
    fn parses_drop_payload_with_comma() {
        let app = app();
        let Command::Dispatch(messages) = parse_command("drop 1 right 0,2", &app).unwrap() else {
            panic!("expected a dispatch");
        };
        match &messages[..] {
            [Message::Drop { target, payload }] => {
                assert_eq!(target.group, 1);
                assert_eq!(target.position, DropPosition::Right);
                assert_eq!(payload.text.as_deref(), Some("0,2"));
            }
            other => panic!("unexpected messages {other:?}"),
        }
    }

    #[test]
    fn book_commands_need_a_focused_book() {
        let app = app();
        assert!(parse_command("select epubcfi(/6/2!) hello", &app).is_err());
        assert!(parse_command("toggle 0", &app).is_err());
        assert!(parse_command("fly", &app).is_err());
    }
}
