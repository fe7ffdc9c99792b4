use std::io::{BufRead, Write};
use std::sync::mpsc::{self, Receiver, RecvError, Sender};
use std::thread;

use tracing::{debug, warn};

use crate::capture::page::{PageCommand, PageEvent};

/// Source of page events. Blocks until the next event arrives; an error
/// means the stream is over.
pub trait PageEventSource {
    fn recv(&self) -> Result<PageEvent, RecvError>;
}

/// Event source fed through an mpsc channel, used by tests and by anything
/// that produces events in-process.
pub struct ChannelEventSource {
    rx: Receiver<PageEvent>,
}

impl ChannelEventSource {
    pub fn new(rx: Receiver<PageEvent>) -> Self {
        Self { rx }
    }

    pub fn pair() -> (Sender<PageEvent>, Self) {
        let (tx, rx) = mpsc::channel();
        (tx, Self::new(rx))
    }
}

impl PageEventSource for ChannelEventSource {
    fn recv(&self) -> Result<PageEvent, RecvError> {
        self.rx.recv()
    }
}

/// Reads newline-delimited JSON events from the browser shim. A reader
/// thread parses lines and forwards them; malformed lines are skipped so
/// one bad event cannot stall the stream.
pub struct NdjsonEventSource {
    rx: Receiver<PageEvent>,
}

impl NdjsonEventSource {
    pub fn spawn<R: BufRead + Send + 'static>(reader: R) -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            for line in reader.lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(err) => {
                        warn!(%err, "event stream read failed");
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<PageEvent>(&line) {
                    Ok(event) => {
                        if tx.send(event).is_err() {
                            break;
                        }
                    }
                    Err(err) => warn!(%err, "skipping malformed event line"),
                }
            }
        });
        Self { rx }
    }
}

impl PageEventSource for NdjsonEventSource {
    fn recv(&self) -> Result<PageEvent, RecvError> {
        self.rx.recv()
    }
}

/// Destination for page commands.
pub trait CommandSink {
    fn send(&mut self, command: PageCommand);
}

/// Writes commands as newline-delimited JSON, one object per line.
pub struct NdjsonCommandSink<W: Write> {
    writer: W,
}

impl<W: Write> NdjsonCommandSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> CommandSink for NdjsonCommandSink<W> {
    fn send(&mut self, command: PageCommand) {
        let line = match serde_json::to_string(&command) {
            Ok(line) => line,
            Err(err) => {
                warn!(%err, "could not serialize page command");
                return;
            }
        };
        if let Err(err) = writeln!(self.writer, "{line}") {
            warn!(%err, "could not write page command");
            return;
        }
        if let Err(err) = self.writer.flush() {
            debug!(%err, "command sink flush failed");
        }
    }
}

/// Collects commands in memory so tests can inspect what was emitted.
#[derive(Default)]
pub struct RecordingSink {
    pub commands: Vec<PageCommand>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CommandSink for RecordingSink {
    fn send(&mut self, command: PageCommand) {
        self.commands.push(command);
    }
}
