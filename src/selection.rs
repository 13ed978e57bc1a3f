//! Selection geometry and the contextual selection menu.
//!
//! The menu is anchored to one rectangle of the selected range: the trailing
//! one for forward selections made with a pointer, the leading one otherwise.
//! Touch devices always anchor to the leading edge so the menu opens above
//! the platform's own selection handles.

use crate::annotation::{ANNOTATION_COLORS, ANNOTATION_TYPES, Annotation, AnnotationColor, AnnotationType};
use crate::book::Book;
use crate::config::DeviceKind;
use crate::translation::{TranslationBridge, TranslationRequest};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

/// A text range inside a rendered section, as reported by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRange {
    pub cfi: String,
    pub text: String,
    pub rects: Vec<Rect>,
    /// Computed line height of the end container, when it is numeric.
    #[serde(default)]
    pub line_height: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionDirection {
    Forward,
    Backward,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveSelection {
    pub range: TextRange,
    pub direction: SelectionDirection,
}

/// Host element bounds the menu is laid out against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MenuGeometry {
    pub container: Rect,
    pub view: Rect,
    pub zoom: f64,
}

impl Default for MenuGeometry {
    fn default() -> Self {
        Self {
            container: Rect::default(),
            view: Rect::default(),
            zoom: 1.0,
        }
    }
}

pub fn is_forward(device: DeviceKind, live: Option<&LiveSelection>) -> bool {
    match device {
        DeviceKind::Touch => false,
        DeviceKind::Pointer => live.is_none_or(|selection| {
            selection.direction == SelectionDirection::Forward
        }),
    }
}

/// Last visible rectangle when `forward`, else the first. Rectangles whose
/// width rounds to zero are ignored.
pub fn anchor_rect(rects: &[Rect], forward: bool) -> Option<Rect> {
    let mut visible = rects.iter().filter(|rect| rect.width.round() != 0.0);
    if forward {
        visible.last().copied()
    } else {
        visible.next().copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuAnchor {
    pub cfi: String,
    pub text: String,
    pub rect: Rect,
    pub forward: bool,
    pub line_height: f64,
}

/// Resolve what the menu should attach to. A live selection wins over the
/// stored annotation range when both are present.
pub fn resolve_anchor(
    live: Option<&LiveSelection>,
    stored: Option<&TextRange>,
    device: DeviceKind,
    zoom: f64,
) -> Option<MenuAnchor> {
    let range = live.map(|selection| &selection.range).or(stored)?;
    let forward = is_forward(device, live);
    let rect = anchor_rect(&range.rects, forward)?;
    let text = range.text.trim();
    if text.is_empty() {
        return None;
    }
    let line_height = range
        .line_height
        .filter(|height| height.is_finite() && *height > 0.0)
        .map(|height| height * zoom)
        .unwrap_or(rect.height);
    Some(MenuAnchor {
        cfi: range.cfi.clone(),
        text: text.to_string(),
        rect,
        forward,
        line_height,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnchorMode {
    #[default]
    Avoid,
    Align,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorPosition {
    Before,
    After,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutAnchor {
    pub offset: f64,
    pub size: f64,
    pub mode: AnchorMode,
    pub position: AnchorPosition,
}

/// Place a view of `view_size` inside `viewport_size` next to `anchor`,
/// preferring the requested side and flipping when it does not fit.
pub fn layout(viewport_size: f64, view_size: f64, anchor: LayoutAnchor) -> f64 {
    let (after_boundary, before_boundary) = match anchor.mode {
        AnchorMode::Align => (anchor.offset, anchor.offset + anchor.size),
        AnchorMode::Avoid => (anchor.offset + anchor.size, anchor.offset),
    };
    match anchor.position {
        AnchorPosition::Before => {
            if view_size <= viewport_size - after_boundary {
                after_boundary
            } else if view_size <= before_boundary {
                before_boundary - view_size
            } else {
                (viewport_size - view_size).max(0.0)
            }
        }
        AnchorPosition::After => {
            if view_size <= before_boundary {
                before_boundary - view_size
            } else if view_size <= viewport_size - after_boundary {
                after_boundary
            } else {
                0.0
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum MenuAction {
    /// Leave the translation panel for the action row.
    ShowActions,
    Copy,
    SearchInBook,
    Annotate,
    Define,
    Undefine,
    Paint {
        kind: AnnotationType,
        color: AnnotationColor,
    },
    SaveNote,
    Delete,
}

/// Contextual menu for one selection. Its translation state lives and dies
/// with it.
#[derive(Debug)]
pub struct SelectionMenu {
    generation: u64,
    anchor: MenuAnchor,
    geometry: MenuGeometry,
    annotate: bool,
    notes: String,
    translate: bool,
    show_translation: bool,
    bridge: TranslationBridge,
}

impl SelectionMenu {
    /// Open a menu; returns the first translation request when translation
    /// is enabled.
    pub fn open(
        generation: u64,
        anchor: MenuAnchor,
        geometry: MenuGeometry,
        existing: Option<&Annotation>,
        translate: bool,
    ) -> (Self, Option<TranslationRequest>) {
        let mut menu = Self {
            generation,
            anchor,
            geometry,
            annotate: existing.is_some(),
            notes: existing
                .and_then(|annotation| annotation.notes.clone())
                .unwrap_or_default(),
            translate,
            show_translation: translate,
            bridge: TranslationBridge::new(),
        };
        let request = if translate {
            menu.bridge.request(menu.anchor.text.clone())
        } else {
            None
        };
        (menu, request)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn anchor(&self) -> &MenuAnchor {
        &self.anchor
    }

    /// Follow a selection that changed while the menu stayed open.
    pub fn retarget(&mut self, anchor: MenuAnchor, geometry: MenuGeometry) -> Option<TranslationRequest> {
        let text_changed = anchor.text != self.anchor.text;
        self.anchor = anchor;
        self.geometry = geometry;
        if text_changed && self.translate {
            self.bridge.request(self.anchor.text.clone())
        } else {
            None
        }
    }

    pub fn settle_translation(
        &mut self,
        request_id: u64,
        result: Result<String, String>,
    ) -> Option<TranslationRequest> {
        self.bridge.settle(request_id, result)
    }

    pub fn translation(&self) -> Option<&str> {
        self.bridge.translation()
    }

    pub fn is_translating(&self) -> bool {
        self.bridge.is_loading()
    }

    pub fn showing_translation(&self) -> bool {
        self.show_translation
    }

    pub fn show_actions(&mut self) {
        self.show_translation = false;
    }

    pub fn is_annotating(&self) -> bool {
        self.annotate
    }

    pub fn start_annotating(&mut self) {
        self.show_translation = false;
        self.annotate = true;
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn set_notes(&mut self, notes: &str) {
        self.notes = notes.to_string();
    }

    /// Notes to store with an annotation: only when the editor is open.
    pub fn draft_notes(&self) -> Option<String> {
        self.annotate.then(|| self.notes.clone())
    }

    /// Affordances currently on offer.
    pub fn actions(&self, book: &Book) -> Vec<MenuAction> {
        if self.show_translation {
            return vec![MenuAction::ShowActions];
        }
        let mut actions = Vec::new();
        if !self.annotate {
            actions.extend([MenuAction::Copy, MenuAction::SearchInBook, MenuAction::Annotate]);
            actions.push(if book.is_defined(&self.anchor.text) {
                MenuAction::Undefine
            } else {
                MenuAction::Define
            });
        }
        for kind in ANNOTATION_TYPES {
            for color in ANNOTATION_COLORS {
                actions.push(MenuAction::Paint { kind, color });
            }
        }
        if self.annotate {
            if book.annotation(&self.anchor.cfi).is_some() {
                actions.push(MenuAction::Delete);
            }
            actions.push(MenuAction::SaveNote);
        }
        actions
    }

    /// Top-left corner for a menu of the given size.
    pub fn position(&self, width: f64, height: f64) -> (f64, f64) {
        let position = if self.anchor.forward {
            AnchorPosition::Before
        } else {
            AnchorPosition::After
        };
        let rect = self.anchor.rect;
        let container = self.geometry.container;
        let left = layout(
            container.width,
            width,
            LayoutAnchor {
                offset: rect.left + self.geometry.view.left - container.left,
                size: rect.width,
                mode: AnchorMode::Align,
                position,
            },
        );
        let line_height = self.anchor.line_height;
        let top = layout(
            container.height,
            height,
            LayoutAnchor {
                offset: rect.top - (line_height - rect.height) / 2.0,
                size: line_height,
                mode: AnchorMode::Avoid,
                position,
            },
        );
        (left, top)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(rects: Vec<Rect>) -> TextRange {
        TextRange {
            cfi: "epubcfi(/6/2!/4/2,/1:0,/1:5)".to_string(),
            text: " hello ".to_string(),
            rects,
            line_height: None,
        }
    }

    fn live(direction: SelectionDirection) -> LiveSelection {
        LiveSelection {
            range: range(vec![
                Rect::new(10.0, 10.0, 50.0, 20.0),
                Rect::new(0.0, 30.0, 0.2, 20.0),
                Rect::new(0.0, 50.0, 30.0, 20.0),
            ]),
            direction,
        }
    }

    #[test]
    fn anchors_follow_direction_and_device() {
        let forward = live(SelectionDirection::Forward);
        let anchor = resolve_anchor(Some(&forward), None, DeviceKind::Pointer, 1.0).unwrap();
        assert!(anchor.forward);
        assert_eq!(anchor.rect.top, 50.0);
        assert_eq!(anchor.text, "hello");

        let backward = live(SelectionDirection::Backward);
        let anchor = resolve_anchor(Some(&backward), None, DeviceKind::Pointer, 1.0).unwrap();
        assert_eq!(anchor.rect.top, 10.0);

        let anchor = resolve_anchor(Some(&forward), None, DeviceKind::Touch, 1.0).unwrap();
        assert!(!anchor.forward);
        assert_eq!(anchor.rect.top, 10.0);
    }

    #[test]
    fn stored_range_is_treated_as_forward() {
        let stored = range(vec![Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(0.0, 20.0, 10.0, 10.0)]);
        let anchor = resolve_anchor(None, Some(&stored), DeviceKind::Pointer, 1.0).unwrap();
        assert!(anchor.forward);
        assert_eq!(anchor.rect.top, 20.0);
    }

    #[test]
    fn zero_width_or_blank_selections_render_nothing() {
        let collapsed = range(vec![Rect::new(0.0, 0.0, 0.4, 10.0)]);
        assert!(resolve_anchor(None, Some(&collapsed), DeviceKind::Pointer, 1.0).is_none());

        let mut blank = range(vec![Rect::new(0.0, 0.0, 10.0, 10.0)]);
        blank.text = "  \n".to_string();
        assert!(resolve_anchor(None, Some(&blank), DeviceKind::Pointer, 1.0).is_none());
        assert!(resolve_anchor(None, None, DeviceKind::Pointer, 1.0).is_none());
    }

    #[test]
    fn numeric_line_height_is_scaled_by_zoom() {
        let mut stored = range(vec![Rect::new(0.0, 0.0, 10.0, 12.0)]);
        stored.line_height = Some(20.0);
        let anchor = resolve_anchor(None, Some(&stored), DeviceKind::Pointer, 1.5).unwrap();
        assert_eq!(anchor.line_height, 30.0);
        stored.line_height = Some(f64::NAN);
        let anchor = resolve_anchor(None, Some(&stored), DeviceKind::Pointer, 1.5).unwrap();
        assert_eq!(anchor.line_height, 12.0);
    }

    #[test]
    fn layout_prefers_requested_side_then_flips() {
        let before = LayoutAnchor {
            offset: 100.0,
            size: 20.0,
            mode: AnchorMode::Avoid,
            position: AnchorPosition::Before,
        };
        assert_eq!(layout(500.0, 50.0, before), 120.0);
        assert_eq!(layout(150.0, 50.0, before), 50.0);
        assert_eq!(layout(110.0, 120.0, before), 0.0);

        let after = LayoutAnchor {
            position: AnchorPosition::After,
            ..before
        };
        assert_eq!(layout(500.0, 50.0, after), 50.0);
        assert_eq!(layout(500.0, 150.0, after), 120.0);
        assert_eq!(layout(200.0, 150.0, after), 0.0);

        let aligned = LayoutAnchor {
            mode: AnchorMode::Align,
            ..before
        };
        assert_eq!(layout(500.0, 50.0, aligned), 100.0);
    }

    #[test]
    fn actions_depend_on_menu_state() {
        let stored = range(vec![Rect::new(0.0, 0.0, 10.0, 10.0)]);
        let anchor = resolve_anchor(None, Some(&stored), DeviceKind::Pointer, 1.0).unwrap();
        let mut book = Book::new("b", "Book", "b.epub");

        let (mut menu, request) =
            SelectionMenu::open(1, anchor.clone(), MenuGeometry::default(), None, true);
        assert_eq!(request.unwrap().text, "hello");
        assert_eq!(menu.actions(&book), vec![MenuAction::ShowActions]);

        menu.show_actions();
        let actions = menu.actions(&book);
        assert_eq!(actions[..4], [
            MenuAction::Copy,
            MenuAction::SearchInBook,
            MenuAction::Annotate,
            MenuAction::Define
        ]);
        assert_eq!(actions.len(), 4 + ANNOTATION_COLORS.len());

        book.define(&["hello"]);
        assert!(menu.actions(&book).contains(&MenuAction::Undefine));
        menu.start_annotating();
        let actions = menu.actions(&book);
        assert_eq!(actions.last(), Some(&MenuAction::SaveNote));
        assert!(!actions.contains(&MenuAction::Delete));
    }

    #[test]
    fn retarget_translates_only_changed_text() {
        let stored = range(vec![Rect::new(0.0, 0.0, 10.0, 10.0)]);
        let anchor = resolve_anchor(None, Some(&stored), DeviceKind::Pointer, 1.0).unwrap();
        let (mut menu, first) =
            SelectionMenu::open(1, anchor.clone(), MenuGeometry::default(), None, true);
        assert!(menu.retarget(anchor.clone(), MenuGeometry::default()).is_none());

        let mut changed = anchor;
        changed.text = "world".to_string();
        assert!(menu.retarget(changed, MenuGeometry::default()).is_none());
        let next = menu.settle_translation(first.unwrap().id, Ok("bonjour".to_string()));
        assert_eq!(next.unwrap().text, "world");
        assert!(menu.translation().is_none());
    }

    #[test]
    fn forward_menu_opens_after_the_anchor_when_it_fits() {
        let stored = range(vec![Rect::new(40.0, 100.0, 60.0, 20.0)]);
        let anchor = resolve_anchor(None, Some(&stored), DeviceKind::Pointer, 1.0).unwrap();
        let geometry = MenuGeometry {
            container: Rect::new(0.0, 0.0, 800.0, 600.0),
            view: Rect::new(0.0, 0.0, 800.0, 600.0),
            zoom: 1.0,
        };
        let (menu, _) = SelectionMenu::open(1, anchor, geometry, None, false);
        assert_eq!(menu.position(200.0, 80.0), (40.0, 120.0));
        assert!(!menu.showing_translation());
    }
}
