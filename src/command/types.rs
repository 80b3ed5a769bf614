//! Core command types
//!
//! A [`Command`] is a tagged variant over keyboard, mouse, delay and text
//! actions. Numeric and positional fields are payload only: canonical
//! equality and all sequence-matching logic look at type, action and key.

use serde::{Deserialize, Serialize};

/// Command categories recognized by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandType {
    /// Keyboard action (keydown, keyup, press)
    Keyboard,
    /// Mouse action (move, click, drag)
    Mouse,
    /// Pure wait between actions, in milliseconds
    Delay,
    /// Literal text entry
    Text,
}

impl CommandType {
    /// Stable string tag used in canonical keys
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandType::Keyboard => "keyboard",
            CommandType::Mouse => "mouse",
            CommandType::Delay => "delay",
            CommandType::Text => "text",
        }
    }
}

/// A single recorded macro command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Command {
    /// Command category
    #[serde(rename = "type")]
    pub command_type: CommandType,
    /// Action verb, e.g. "keydown", "move", "wait"
    pub action: String,
    /// Key identifier for keyboard commands
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Horizontal position for mouse commands
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    /// Vertical position for mouse commands
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    /// Wait duration in milliseconds for delay commands
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<u64>,
    /// Literal text for text commands
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Command {
    /// Create a keyboard command
    pub fn keyboard(action: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            command_type: CommandType::Keyboard,
            action: action.into(),
            key: Some(key.into()),
            x: None,
            y: None,
            delay: None,
            text: None,
        }
    }

    /// Create a mouse command at a position
    pub fn mouse(action: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            command_type: CommandType::Mouse,
            action: action.into(),
            key: None,
            x: Some(x),
            y: Some(y),
            delay: None,
            text: None,
        }
    }

    /// Create a delay command
    pub fn delay(millis: u64) -> Self {
        Self {
            command_type: CommandType::Delay,
            action: "wait".to_string(),
            key: None,
            x: None,
            y: None,
            delay: Some(millis),
            text: None,
        }
    }

    /// Create a text entry command
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            command_type: CommandType::Text,
            action: "type".to_string(),
            key: None,
            x: None,
            y: None,
            delay: None,
            text: Some(text.into()),
        }
    }

    /// Canonical projection used for mining and equality: `type:action:key`.
    ///
    /// Position, delay and text payloads are deliberately excluded so that
    /// two recordings of the same gesture compare equal despite differing
    /// timing or coordinates.
    pub fn canonical_key(&self) -> String {
        format!(
            "{}:{}:{}",
            self.command_type.as_str(),
            self.action,
            self.key.as_deref().unwrap_or("")
        )
    }

    /// State projection used by the transition model: `type:(key or action)`
    pub fn state_key(&self) -> String {
        format!(
            "{}:{}",
            self.command_type.as_str(),
            self.key.as_deref().unwrap_or(&self.action)
        )
    }

    /// Two commands are canonically equal iff type, action and key match
    pub fn canonically_equal(&self, other: &Command) -> bool {
        self.command_type == other.command_type
            && self.action == other.action
            && self.key == other.key
    }

    /// Check if this is a keyboard command carrying a key
    pub fn is_keystroke(&self) -> bool {
        self.command_type == CommandType::Keyboard && self.key.is_some()
    }
}
