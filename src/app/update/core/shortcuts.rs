use super::super::super::messages::{Key, Message, Modifiers};
use super::super::super::state::App;

impl App {
    /// Map a key press to the page-turn it is bound to.
    pub(super) fn shortcut_message_for_key(&self, key: &Key, modifiers: Modifiers) -> Option<Message> {
        let pressed = match key {
            Key::ArrowLeft => "arrowleft".to_string(),
            Key::ArrowRight => "arrowright".to_string(),
            Key::ArrowUp => "arrowup".to_string(),
            Key::ArrowDown => "arrowdown".to_string(),
            Key::Space => "space".to_string(),
            Key::Character(ch) => ch.to_ascii_lowercase(),
        };

        if Self::binding_matches(
            &self.config.key_prev_page,
            "arrowleft",
            &pressed,
            modifiers,
        ) {
            Some(Message::PrevPage)
        } else if Self::binding_matches(
            &self.config.key_next_page,
            "arrowright",
            &pressed,
            modifiers,
        ) {
            Some(Message::NextPage)
        } else {
            None
        }
    }

    /// A binding lists comma-separated alternatives; any one may match.
    pub(super) fn binding_matches(
        raw: &str,
        fallback: &str,
        pressed: &str,
        modifiers: Modifiers,
    ) -> bool {
        let mut alternatives = raw.split(',').map(str::trim).filter(|s| !s.is_empty());
        let Some(first) = alternatives.next() else {
            return Self::shortcut_matches(fallback, fallback, pressed, modifiers);
        };
        std::iter::once(first)
            .chain(alternatives)
            .any(|alternative| Self::shortcut_matches(alternative, fallback, pressed, modifiers))
    }

    pub(super) fn shortcut_matches(
        raw: &str,
        fallback: &str,
        pressed: &str,
        modifiers: Modifiers,
    ) -> bool {
        let normalized = Self::normalize_shortcut_token(raw, fallback);

        let mut required_ctrl = false;
        let mut required_alt = false;
        let mut required_logo = false;
        let mut required_shift = false;
        let mut required_key: Option<&str> = None;

        for token in normalized
            .split('+')
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            match token {
                "ctrl" | "control" => required_ctrl = true,
                "alt" => required_alt = true,
                "logo" | "meta" | "super" | "cmd" | "command" => required_logo = true,
                "shift" => required_shift = true,
                key => required_key = Some(key),
            }
        }

        let required_key = required_key.unwrap_or(fallback);
        if pressed != required_key {
            return false;
        }

        // arrows turn pages whether or not shift is held
        let shift_ok = modifiers.shift == required_shift
            || (required_key.starts_with("arrow") && !required_shift);
        modifiers.ctrl == required_ctrl
            && modifiers.alt == required_alt
            && modifiers.logo == required_logo
            && shift_ok
    }

    pub(super) fn normalize_shortcut_token(raw: &str, fallback: &str) -> String {
        let normalized = raw.trim().to_ascii_lowercase();
        if normalized.is_empty() {
            fallback.to_string()
        } else {
            normalized
                .replace("spacebar", "space")
                .replace("arrow_", "arrow")
        }
    }
}
