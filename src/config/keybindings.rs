//! Keybinding configuration for the TUI.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::Deserialize;

use crate::tui::event::Action;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KeybindingConfig {
    pub quit: Vec<String>,
    pub move_up: Vec<String>,
    pub move_down: Vec<String>,
    pub next_page: Vec<String>,
    pub prev_page: Vec<String>,
    pub next_pane: Vec<String>,
    pub prev_pane: Vec<String>,
    pub select: Vec<String>,
    pub analyze: Vec<String>,
    pub open_in_browser: Vec<String>,
    pub refresh: Vec<String>,
    pub toggle_maximize: Vec<String>,
    pub remove_channel: Vec<String>,
    pub add_channel: Vec<String>,
    pub clear_channels: Vec<String>,
    pub toggle_pizza: Vec<String>,
}

fn keys(list: &[&str]) -> Vec<String> {
    list.iter().map(|k| k.to_string()).collect()
}

impl Default for KeybindingConfig {
    fn default() -> Self {
        Self {
            quit: keys(&["q", "Ctrl+c"]),
            move_up: keys(&["k", "Up"]),
            move_down: keys(&["j", "Down"]),
            next_page: keys(&["n", "PageDown"]),
            prev_page: keys(&["p", "PageUp"]),
            next_pane: keys(&["Tab"]),
            prev_pane: keys(&["BackTab", "Shift+Tab"]),
            select: keys(&["Enter"]),
            analyze: keys(&["a"]),
            open_in_browser: keys(&["o"]),
            refresh: keys(&["R", "r"]),
            toggle_maximize: keys(&["m"]),
            remove_channel: keys(&["d", "Delete"]),
            add_channel: keys(&["+", "Insert"]),
            clear_channels: keys(&["X"]),
            toggle_pizza: keys(&["P", "F2"]),
        }
    }
}

impl KeybindingConfig {
    /// Get the action for a key event. Earlier entries win on conflicts.
    pub fn get_action(&self, key: &KeyEvent) -> Action {
        let table: [(&[String], Action); 16] = [
            (&self.quit[..], Action::Quit),
            (&self.move_up[..], Action::MoveUp),
            (&self.move_down[..], Action::MoveDown),
            (&self.next_page[..], Action::NextPage),
            (&self.prev_page[..], Action::PrevPage),
            (&self.next_pane[..], Action::NextPane),
            (&self.prev_pane[..], Action::PrevPane),
            (&self.select[..], Action::Select),
            (&self.analyze[..], Action::Analyze),
            (&self.open_in_browser[..], Action::OpenInBrowser),
            (&self.refresh[..], Action::Refresh),
            (&self.toggle_maximize[..], Action::ToggleMaximize),
            (&self.remove_channel[..], Action::RemoveChannel),
            (&self.add_channel[..], Action::AddChannel),
            (&self.clear_channels[..], Action::ClearChannels),
            (&self.toggle_pizza[..], Action::TogglePizza),
        ];

        table
            .iter()
            .find(|(bindings, _)| matches_any(key, bindings))
            .map(|(_, action)| *action)
            .unwrap_or(Action::None)
    }
}

fn matches_any(key: &KeyEvent, bindings: &[String]) -> bool {
    bindings
        .iter()
        .filter_map(|binding| parse_key_string(binding).ok())
        .any(|parsed| parsed.matches(key))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    /// Shift is ignored when the binding doesn't ask for it, so "R" matches
    /// terminals that report Shift+R.
    pub fn matches(&self, key: &KeyEvent) -> bool {
        self.code == key.code
            && (self.modifiers == key.modifiers
                || self.modifiers == (key.modifiers & !KeyModifiers::SHIFT))
    }
}

/// Parse a key string such as `"j"`, `"PageDown"`, `"Ctrl+c"` or
/// `"Ctrl+Shift+a"` into a binding.
pub fn parse_key_string(s: &str) -> Result<KeyBinding, String> {
    let s = s.trim();
    let (modifier_parts, key_part) = match s.rsplit_once('+') {
        // A lone "+" is the plus key itself.
        Some((mods, key)) if !key.is_empty() => (Some(mods), key),
        _ => (None, s),
    };

    let mut modifiers = KeyModifiers::NONE;
    for part in modifier_parts.into_iter().flat_map(|m| m.split('+')) {
        modifiers |= match part.to_lowercase().as_str() {
            "ctrl" | "control" => KeyModifiers::CONTROL,
            "shift" => KeyModifiers::SHIFT,
            "alt" => KeyModifiers::ALT,
            _ => return Err(format!("Unknown modifier: {}", part)),
        };
    }

    Ok(KeyBinding {
        code: parse_key_code(key_part)?,
        modifiers,
    })
}

fn parse_key_code(s: &str) -> Result<KeyCode, String> {
    let mut chars = s.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Ok(KeyCode::Char(c));
    }

    let lower = s.to_lowercase();
    if let Some(n) = lower.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
        if (1..=12).contains(&n) {
            return Ok(KeyCode::F(n));
        }
    }

    match lower.as_str() {
        "enter" | "return" => Ok(KeyCode::Enter),
        "tab" => Ok(KeyCode::Tab),
        "backtab" => Ok(KeyCode::BackTab),
        "backspace" | "bs" => Ok(KeyCode::Backspace),
        "delete" | "del" => Ok(KeyCode::Delete),
        "home" => Ok(KeyCode::Home),
        "end" => Ok(KeyCode::End),
        "pageup" | "pgup" => Ok(KeyCode::PageUp),
        "pagedown" | "pgdn" => Ok(KeyCode::PageDown),
        "up" => Ok(KeyCode::Up),
        "down" => Ok(KeyCode::Down),
        "left" => Ok(KeyCode::Left),
        "right" => Ok(KeyCode::Right),
        "esc" | "escape" => Ok(KeyCode::Esc),
        "insert" | "ins" => Ok(KeyCode::Insert),
        "space" => Ok(KeyCode::Char(' ')),
        _ => Err(format!("Unknown key: {}", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_parse_plain_and_special_keys() {
        assert_eq!(parse_key_string("a").unwrap().code, KeyCode::Char('a'));
        assert_eq!(parse_key_string("PageDown").unwrap().code, KeyCode::PageDown);
        assert_eq!(parse_key_string("F11").unwrap().code, KeyCode::F(11));
        assert!(parse_key_string("F13").is_err());
        assert!(parse_key_string("Hyper").is_err());
    }

    #[test]
    fn test_parse_modifiers() {
        let binding = parse_key_string("Ctrl+Shift+a").unwrap();
        assert_eq!(binding.code, KeyCode::Char('a'));
        assert_eq!(
            binding.modifiers,
            KeyModifiers::CONTROL | KeyModifiers::SHIFT
        );

        assert!(parse_key_string("Meta+x").is_err());
        assert_eq!(parse_key_string("+").unwrap().code, KeyCode::Char('+'));
    }

    #[test]
    fn test_binding_requires_modifiers() {
        let binding = parse_key_string("Ctrl+c").unwrap();
        assert!(binding.matches(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(!binding.matches(&key(KeyCode::Char('c'))));
    }

    #[test]
    fn test_default_actions() {
        let config = KeybindingConfig::default();

        assert_eq!(config.get_action(&key(KeyCode::Char('q'))), Action::Quit);
        assert_eq!(config.get_action(&key(KeyCode::Char('a'))), Action::Analyze);
        assert_eq!(config.get_action(&key(KeyCode::Char('r'))), Action::Refresh);
        assert_eq!(
            config.get_action(&KeyEvent::new(KeyCode::Char('R'), KeyModifiers::SHIFT)),
            Action::Refresh
        );
        assert_eq!(config.get_action(&key(KeyCode::Delete)), Action::RemoveChannel);
        assert_eq!(config.get_action(&key(KeyCode::Char('x'))), Action::None);
        assert_eq!(config.get_action(&key(KeyCode::Char('+'))), Action::AddChannel);
        assert_eq!(config.get_action(&key(KeyCode::Insert)), Action::AddChannel);
        assert_eq!(
            config.get_action(&KeyEvent::new(KeyCode::Char('X'), KeyModifiers::SHIFT)),
            Action::ClearChannels
        );
        assert_eq!(
            config.get_action(&KeyEvent::new(KeyCode::Char('P'), KeyModifiers::SHIFT)),
            Action::TogglePizza
        );
        assert_eq!(config.get_action(&key(KeyCode::Char('p'))), Action::PrevPage);
    }
}
