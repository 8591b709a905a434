//! Customizable keyboard shortcuts.
//!
//! Keys are stored as `KeyboardEvent.key` strings and compared without
//! regard to case, so `Z` with shift held still toggles the overlay.

use serde::{Deserialize, Serialize};

/// Something a shortcut can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAction {
    /// Hide, unpin and close the popout.
    Cancel,
    ToggleEnabled,
    TogglePin,
    /// Open the primary candidate in a new tab.
    OpenInTab,
    CopyUrl,
    Download,
}

impl KeyAction {
    pub fn all() -> &'static [KeyAction] {
        &[
            KeyAction::Cancel,
            KeyAction::ToggleEnabled,
            KeyAction::TogglePin,
            KeyAction::OpenInTab,
            KeyAction::CopyUrl,
            KeyAction::Download,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            KeyAction::Cancel => "Cancel",
            KeyAction::ToggleEnabled => "Toggle preview",
            KeyAction::TogglePin => "Toggle pin",
            KeyAction::OpenInTab => "Open in new tab",
            KeyAction::CopyUrl => "Copy URL",
            KeyAction::Download => "Download",
        }
    }
}

/// Modifier keys held during a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub meta: bool,
    pub alt: bool,
    pub shift: bool,
}

impl Modifiers {
    /// Whether a browser or OS shortcut is probably being typed.
    pub fn is_command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Key assignments for every [`KeyAction`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub cancel: String,
    pub toggle_enabled: String,
    pub toggle_pin: String,
    pub open_in_tab: String,
    pub copy_url: String,
    pub download: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            cancel: "Escape".to_string(),
            toggle_enabled: "z".to_string(),
            toggle_pin: "p".to_string(),
            open_in_tab: "o".to_string(),
            copy_url: "c".to_string(),
            download: "d".to_string(),
        }
    }
}

impl KeyBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the action bound to `key`, ignoring modifiers and context.
    pub fn action_for_key(&self, key: &str) -> Option<KeyAction> {
        KeyAction::all()
            .iter()
            .copied()
            .find(|action| self.key_for(*action).eq_ignore_ascii_case(key))
    }

    /// Get the action for a key press.
    ///
    /// Nothing fires while ctrl or meta is held. While typing in an editable
    /// field only the cancel key is honoured.
    pub fn action_for_event(&self, key: &str, modifiers: Modifiers, typing: bool) -> Option<KeyAction> {
        if modifiers.is_command() {
            return None;
        }
        let action = self.action_for_key(key)?;
        if typing && action != KeyAction::Cancel {
            return None;
        }
        Some(action)
    }

    pub fn key_for(&self, action: KeyAction) -> &str {
        match action {
            KeyAction::Cancel => &self.cancel,
            KeyAction::ToggleEnabled => &self.toggle_enabled,
            KeyAction::TogglePin => &self.toggle_pin,
            KeyAction::OpenInTab => &self.open_in_tab,
            KeyAction::CopyUrl => &self.copy_url,
            KeyAction::Download => &self.download,
        }
    }

    pub fn set_key(&mut self, action: KeyAction, key: impl Into<String>) {
        let key = key.into();
        match action {
            KeyAction::Cancel => self.cancel = key,
            KeyAction::ToggleEnabled => self.toggle_enabled = key,
            KeyAction::TogglePin => self.toggle_pin = key,
            KeyAction::OpenInTab => self.open_in_tab = key,
            KeyAction::CopyUrl => self.copy_url = key,
            KeyAction::Download => self.download = key,
        }
    }

    /// Check if a key is already used by another action.
    pub fn key_conflict(&self, key: &str, exclude: Option<KeyAction>) -> Option<KeyAction> {
        KeyAction::all()
            .iter()
            .copied()
            .filter(|action| Some(*action) != exclude)
            .find(|action| self.key_for(*action).eq_ignore_ascii_case(key))
    }
}
