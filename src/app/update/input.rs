use super::super::messages::{ClickTarget, Swipe};
use super::super::state::App;
use crate::config::DeviceKind;
use tracing::{debug, trace};

/// Share of the container width on each side that turns pages on touch.
const TAP_ZONE: f64 = 0.15;
const SWIPE_MIN_DX: f64 = 20.0;
const STEEP_SWIPE_MIN_DX: f64 = 40.0;
const STEEP_SWIPE_MAX_MS: u64 = 100;
const STEEP_SWIPE_RATIO: f64 = 2.0;

impl App {
    pub(super) fn handle_frame_clicked(&mut self, tab_id: &str, target: ClickTarget) {
        let device = self.config.device;
        let Some(tab) = self.reader.find_book_tab_mut(tab_id) else {
            return;
        };
        if target.link {
            tab.show_prev_location();
            return;
        }
        if device == DeviceKind::Pointer {
            if let Some(src) = target.image {
                debug!(id = tab_id, src = %src, "Previewing image");
                self.image_preview = Some(src);
                return;
            }
        }
        if device == DeviceKind::Touch {
            if target.on_annotation {
                return;
            }
            let zone = target.container_width * TAP_ZONE;
            if target.container_width > 0.0 {
                // spread and scroll offsets fold back into one container width
                let x = target.client_x.rem_euclid(target.container_width);
                if x < zone {
                    tab.prev();
                    return;
                }
                if x > target.container_width - zone {
                    tab.next();
                    return;
                }
            }
        }
        if let Some(node) = target.node {
            if let Some(outcome) = tab.toggle_paragraph(node) {
                trace!(id = tab_id, index = outcome.index, "Toggled paragraph");
                return;
            }
        }
        if device == DeviceKind::Touch {
            self.navbar_visible = !self.navbar_visible;
        }
    }

    pub(super) fn handle_swiped(&mut self, tab_id: &str, swipe: Swipe) {
        if swipe.has_selection || swipe.dx.abs() < SWIPE_MIN_DX {
            return;
        }
        let steep = swipe.dy.abs() / swipe.dx.abs() > STEEP_SWIPE_RATIO;
        if steep && (swipe.elapsed_ms > STEEP_SWIPE_MAX_MS || swipe.dx.abs() < STEEP_SWIPE_MIN_DX) {
            return;
        }
        let Some(tab) = self.reader.find_book_tab_mut(tab_id) else {
            return;
        };
        if swipe.dx > 0.0 {
            tab.prev();
        } else {
            tab.next();
        }
    }
}
