mod reducer;
mod runtime;
mod shortcuts;

pub use runtime::{EventLoop, Services};

use super::super::messages::Message;
use super::super::state::App;
use super::Effect;
use tracing::trace;

impl App {
    /// Apply one message, then bring every open book tab up to date.
    /// Returns the effects the runtime has to perform.
    pub fn update(&mut self, message: Message) -> Vec<Effect> {
        let mut effects = self.reduce(message);
        self.sync_tabs(&mut effects);
        effects
    }

    /// Mount unmounted book tabs, drain rendition events and queue dirty
    /// records for persistence.
    fn sync_tabs(&mut self, effects: &mut Vec<Effect>) {
        let typography = self.config.typography();
        let mut next_container = self.next_container;
        for tab in self.reader.book_tabs_mut() {
            if tab.container().is_none() {
                tab.apply_typography(&typography);
                tab.render(crate::rendition::ContainerId(next_container));
                next_container += 1;
            }
            if tab.pump_events() {
                trace!(id = tab.id(), "Rendition events handled");
            }
            if let Some(book) = tab.take_dirty() {
                effects.push(Effect::PersistBook(book));
            }
        }
        self.next_container = next_container;
        self.refresh_menus(effects);
    }
}
