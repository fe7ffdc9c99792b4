use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent};

/// What the TUI loop reacts to. Ticks keep firing while the keyboard is
/// quiet so the drill timer and transient banners stay live.
#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Terminal input fanned into a channel and polled on a tick deadline.
/// Quiet intervals surface as `Tick`; a dead input thread does too, which
/// keeps the loop redrawing until the user quits.
pub struct EventPump {
    rx: Receiver<AppEvent>,
    tick: Duration,
}

impl EventPump {
    /// Spawn the crossterm reader thread and pump at `tick` cadence.
    pub fn spawn(tick: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || forward_terminal_events(tx));
        Self { rx, tick }
    }

    /// Pump fed from a plain channel, for driving the loop without a
    /// terminal.
    pub fn from_channel(rx: Receiver<AppEvent>, tick: Duration) -> Self {
        Self { rx, tick }
    }

    /// Next event, or `Tick` once the interval passes without one.
    pub fn next(&self) -> AppEvent {
        match self.rx.recv_timeout(self.tick) {
            Ok(event) => event,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => AppEvent::Tick,
        }
    }
}

fn forward_terminal_events(tx: Sender<AppEvent>) {
    loop {
        match event::read() {
            Ok(CtEvent::Key(key)) => {
                if tx.send(AppEvent::Key(key)).is_err() {
                    break;
                }
            }
            Ok(CtEvent::Resize(_, _)) => {
                if tx.send(AppEvent::Resize).is_err() {
                    break;
                }
            }
            Ok(_) => {}
            Err(_) => break,
        }
    }
}
