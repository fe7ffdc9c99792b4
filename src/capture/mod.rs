pub mod machine;
pub mod page;
pub mod source;

pub use machine::{CaptureMachine, Phase};

use tracing::info;

use crate::capture::page::PageEventKind;
use crate::capture::source::{CommandSink, PageEventSource};
use crate::store::Store;
use crate::toggles::VisibilityToggles;

/// Drive the capture pipeline until the event stream ends. Toggle events
/// go to the visibility controller, everything else to the session
/// machine. Returns the number of sessions recorded.
pub fn run<S: PageEventSource>(
    machine: &mut CaptureMachine,
    toggles: &mut VisibilityToggles,
    store: &Store,
    source: S,
    sink: &mut dyn CommandSink,
) -> usize {
    let mut recorded = 0;
    let mut announced = false;

    while let Ok(event) = source.recv() {
        // Push the persisted toggle state out to the page as soon as the
        // shim shows signs of life.
        if !announced {
            toggles.announce(&event.snapshot, sink);
            announced = true;
        }
        match &event.kind {
            PageEventKind::ToggleChanged { toggle, enabled } => {
                toggles.on_toggle_changed(toggle, *enabled, &event.snapshot, store, sink);
            }
            _ => {
                if machine.on_event(&event, store, sink).is_some() {
                    recorded += 1;
                }
            }
        }
    }
    info!(recorded, "page event stream ended");
    recorded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::page::{PageCommand, PageEvent, PageSnapshot, TARGET_JAPANESE, TARGET_MAP};
    use crate::capture::source::{ChannelEventSource, RecordingSink};

    #[test]
    fn run_announces_toggle_state_on_first_event() {
        let mut machine = CaptureMachine::new();
        let store = Store::open_in_memory().unwrap();
        let mut toggles = VisibilityToggles::load(&store);
        let mut sink = RecordingSink::new();

        let (tx, source) = ChannelEventSource::pair();
        let snap = PageSnapshot::new("u", "t")
            .with_element(TARGET_JAPANESE)
            .with_element(TARGET_MAP);
        tx.send(PageEvent::new(PageEventKind::BodyChanged, snap.clone()))
            .unwrap();
        tx.send(PageEvent::new(PageEventKind::BodyChanged, snap))
            .unwrap();
        drop(tx);

        let recorded = run(&mut machine, &mut toggles, &store, source, &mut sink);

        assert_eq!(recorded, 0);
        // Both checkboxes and both targets exactly once, for the first event only
        let checkbox_count = sink
            .commands
            .iter()
            .filter(|c| matches!(c, PageCommand::SetCheckbox { .. }))
            .count();
        let visible_count = sink
            .commands
            .iter()
            .filter(|c| matches!(c, PageCommand::SetVisible { .. }))
            .count();
        assert_eq!(checkbox_count, 2);
        assert_eq!(visible_count, 2);
    }
}
