use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// Element ids and classes of the practice page, as reported by the
// browser shim.
pub const START_SCREEN: &str = "p-typingscreen__start";
pub const CHECKBOX_SOUND: &str = "p-typingscreen__startscreen__sound";
pub const CHECKBOX_SPELL: &str = "p-typingscreen__startscreen__roman";
pub const RESULT_CARD: &str = "p-typingresult__card";
pub const RESULT_SCORE: &str = "p-typingresult--score";
pub const RESULT_TIME: &str = "p-typingresult--time";
pub const RESULT_TOTAL: &str = "p-typingresult--all";
pub const RESULT_MISS: &str = "p-typingresult--miss";
pub const RESULT_CLOSE: &str = "typing_store_close";
pub const TOGGLE_JAPANESE: &str = "toggle-japanese";
pub const TOGGLE_MAP: &str = "toggle-map";
pub const TARGET_JAPANESE: &str = "p-mana";
pub const TARGET_MAP: &str = "map";

/// The start screen invites typing with this word in its prompt text.
pub const START_MARKER: &str = "スペース";
pub const KEY_SPACE: &str = "Space";

/// Text and checkbox state of one page element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementState {
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
}

/// What the shim saw on the page when it sent an event. Only elements
/// relevant to the event need to be present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageSnapshot {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub elements: HashMap<String, ElementState>,
}

impl PageSnapshot {
    pub fn new(url: &str, title: &str) -> Self {
        Self {
            url: url.to_string(),
            title: title.to_string(),
            elements: HashMap::new(),
        }
    }

    pub fn with_text(mut self, id: &str, text: &str) -> Self {
        self.elements
            .entry(id.to_string())
            .or_default()
            .text = text.to_string();
        self
    }

    pub fn with_checkbox(mut self, id: &str, checked: bool) -> Self {
        self.elements
            .entry(id.to_string())
            .or_default()
            .checked = Some(checked);
        self
    }

    pub fn with_element(mut self, id: &str) -> Self {
        self.elements.entry(id.to_string()).or_default();
        self
    }

    pub fn has(&self, id: &str) -> bool {
        self.elements.contains_key(id)
    }

    pub fn text(&self, id: &str) -> Option<&str> {
        self.elements.get(id).map(|e| e.text.as_str())
    }

    pub fn checked(&self, id: &str) -> Option<bool> {
        self.elements.get(id).and_then(|e| e.checked)
    }
}

/// Page activity reported by the shim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageEventKind {
    /// The start screen's subtree changed.
    StartAreaChanged,
    /// Something elsewhere in the document changed.
    BodyChanged,
    KeyDown { key: String },
    Click { target: String },
    ToggleChanged { toggle: String, enabled: bool },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageEvent {
    #[serde(flatten)]
    pub kind: PageEventKind,
    #[serde(default)]
    pub snapshot: PageSnapshot,
}

impl PageEvent {
    pub fn new(kind: PageEventKind, snapshot: PageSnapshot) -> Self {
        Self { kind, snapshot }
    }
}

/// Instructions sent back to the shim for it to apply to the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageCommand {
    SetStatus { text: String },
    SetControlsEnabled { enabled: bool },
    SetVisible { target: String, visible: bool },
    SetCheckbox { target: String, checked: bool },
}
