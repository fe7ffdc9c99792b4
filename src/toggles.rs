use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::capture::page::{
    PageCommand, PageSnapshot, TARGET_JAPANESE, TARGET_MAP, TOGGLE_JAPANESE, TOGGLE_MAP,
};
use crate::capture::source::CommandSink;
use crate::store::{Area, Store, VISIBILITY_KEY};

/// Which page areas the user wants visible. Both default to shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilitySettings {
    pub show_japanese: bool,
    pub show_map: bool,
}

impl Default for VisibilitySettings {
    fn default() -> Self {
        Self {
            show_japanese: true,
            show_map: true,
        }
    }
}

/// Keeps the page's japanese-text and map areas in sync with persisted
/// visibility settings.
pub struct VisibilityToggles {
    settings: VisibilitySettings,
}

impl VisibilityToggles {
    pub fn load(store: &Store) -> Self {
        Self {
            settings: store.get_or(Area::Sync, VISIBILITY_KEY, VisibilitySettings::default()),
        }
    }

    pub fn settings(&self) -> VisibilitySettings {
        self.settings
    }

    /// Mirror stored state onto the page: checkbox positions first, then
    /// the targets themselves.
    pub fn announce(&self, snap: &PageSnapshot, sink: &mut dyn CommandSink) {
        sink.send(PageCommand::SetCheckbox {
            target: TOGGLE_JAPANESE.to_string(),
            checked: self.settings.show_japanese,
        });
        sink.send(PageCommand::SetCheckbox {
            target: TOGGLE_MAP.to_string(),
            checked: self.settings.show_map,
        });
        self.apply(snap, sink);
    }

    /// The settings write is fire-and-forget: a failed save is logged and
    /// the in-memory state still drives the page.
    pub fn on_toggle_changed(
        &mut self,
        toggle: &str,
        enabled: bool,
        snap: &PageSnapshot,
        store: &Store,
        sink: &mut dyn CommandSink,
    ) {
        match toggle {
            TOGGLE_JAPANESE => self.settings.show_japanese = enabled,
            TOGGLE_MAP => self.settings.show_map = enabled,
            other => {
                debug!(toggle = other, "unknown toggle");
                return;
            }
        }
        if let Err(err) = store.set(Area::Sync, VISIBILITY_KEY, &self.settings) {
            warn!(%err, "could not persist visibility settings");
        }
        self.apply(snap, sink);
    }

    fn apply(&self, snap: &PageSnapshot, sink: &mut dyn CommandSink) {
        self.apply_target(snap, sink, TARGET_JAPANESE, self.settings.show_japanese);
        self.apply_target(snap, sink, TARGET_MAP, self.settings.show_map);
    }

    fn apply_target(
        &self,
        snap: &PageSnapshot,
        sink: &mut dyn CommandSink,
        target: &str,
        visible: bool,
    ) {
        if !snap.has(target) {
            debug!(target, "target not on this page; skipping");
            return;
        }
        sink.send(PageCommand::SetVisible {
            target: target.to_string(),
            visible,
        });
    }
}
