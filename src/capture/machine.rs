use tracing::{debug, info, warn};

use crate::capture::page::{
    PageCommand, PageEvent, PageEventKind, PageSnapshot, CHECKBOX_SOUND, CHECKBOX_SPELL,
    KEY_SPACE, RESULT_CARD, RESULT_CLOSE, RESULT_MISS, RESULT_SCORE, RESULT_TIME, RESULT_TOTAL,
    START_MARKER, START_SCREEN, TOGGLE_JAPANESE, TOGGLE_MAP,
};
use crate::capture::source::CommandSink;
use crate::session::{Session, SessionResult, SessionSettings};
use crate::store::Store;

pub const STATUS_IN_PROGRESS: &str = "Session: In progress";
pub const STATUS_COMPLETED: &str = "Session: Completed";

/// Where the capture flow currently is. Each phase reacts only to the
/// events that can move it forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing interesting on the page yet.
    Idle,
    /// Start screen shows the invite; the next space begins a session.
    AwaitingStart,
    /// A session is running; watching for the result card.
    InProgress,
    /// Result card is up; space or the close button records it.
    AwaitingResult,
}

/// Drives session capture from page events. One machine per page stream;
/// at most one session is in flight at a time.
pub struct CaptureMachine {
    phase: Phase,
    current: Option<Session>,
    // The space shortcut may record at most once per result card, even
    // when its attempt aborts.
    space_save_armed: bool,
}

impl CaptureMachine {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            current: None,
            space_save_armed: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    /// Feed one page event through the machine. Returns the session that
    /// was recorded, if this event completed one.
    pub fn on_event(
        &mut self,
        event: &PageEvent,
        store: &Store,
        sink: &mut dyn CommandSink,
    ) -> Option<Session> {
        match &event.kind {
            PageEventKind::StartAreaChanged => {
                self.on_start_area(&event.snapshot);
                None
            }
            PageEventKind::BodyChanged => {
                self.on_body_changed(&event.snapshot);
                None
            }
            PageEventKind::KeyDown { key } if key == KEY_SPACE => {
                self.on_space(&event.snapshot, store, sink)
            }
            PageEventKind::Click { target } if target == RESULT_CLOSE => {
                self.on_close_click(&event.snapshot, store, sink)
            }
            _ => None,
        }
    }

    fn on_start_area(&mut self, snap: &PageSnapshot) {
        if self.phase != Phase::Idle {
            return;
        }
        let invites_start = snap
            .text(START_SCREEN)
            .is_some_and(|text| text.contains(START_MARKER));
        if invites_start {
            debug!("start screen is showing; waiting for space");
            self.phase = Phase::AwaitingStart;
        }
    }

    fn on_body_changed(&mut self, snap: &PageSnapshot) {
        if self.phase != Phase::InProgress {
            return;
        }
        let has_result = snap.has(RESULT_CARD)
            && snap
                .text(RESULT_SCORE)
                .is_some_and(|text| !text.trim().is_empty())
            && snap.has(RESULT_CLOSE);
        if has_result {
            debug!("result card is showing; watching for save");
            self.phase = Phase::AwaitingResult;
            self.space_save_armed = true;
        }
    }

    fn on_space(
        &mut self,
        snap: &PageSnapshot,
        store: &Store,
        sink: &mut dyn CommandSink,
    ) -> Option<Session> {
        match self.phase {
            Phase::AwaitingStart => {
                self.begin_session(snap, sink);
                None
            }
            Phase::AwaitingResult if self.space_save_armed => {
                self.space_save_armed = false;
                self.try_finalize(snap, store, sink)
            }
            _ => None,
        }
    }

    fn on_close_click(
        &mut self,
        snap: &PageSnapshot,
        store: &Store,
        sink: &mut dyn CommandSink,
    ) -> Option<Session> {
        if self.phase != Phase::AwaitingResult {
            return None;
        }
        self.try_finalize(snap, store, sink)
    }

    fn begin_session(&mut self, snap: &PageSnapshot, sink: &mut dyn CommandSink) {
        let settings = SessionSettings {
            sound: snap.checked(CHECKBOX_SOUND).unwrap_or(false),
            spell: snap.checked(CHECKBOX_SPELL).unwrap_or(false),
            japanese: snap.checked(TOGGLE_JAPANESE).unwrap_or(true),
            map: snap.checked(TOGGLE_MAP).unwrap_or(true),
        };
        let session = Session::begin(settings, &snap.url, &snap.title);
        info!(session_id = %session.id, url = %session.url, "session started");

        self.current = Some(session);
        self.phase = Phase::InProgress;
        sink.send(PageCommand::SetStatus {
            text: STATUS_IN_PROGRESS.to_string(),
        });
        sink.send(PageCommand::SetControlsEnabled { enabled: false });
    }

    /// Scrape the result card and record the session. When a result field
    /// element is missing the machine keeps waiting so a later close click
    /// can retry; unparseable text inside a present element coerces to zero.
    fn try_finalize(
        &mut self,
        snap: &PageSnapshot,
        store: &Store,
        sink: &mut dyn CommandSink,
    ) -> Option<Session> {
        let fields = (
            snap.text(RESULT_SCORE),
            snap.text(RESULT_TIME),
            snap.text(RESULT_TOTAL),
            snap.text(RESULT_MISS),
        );
        let (score, time, total, miss) = match fields {
            (Some(score), Some(time), Some(total), Some(miss)) => (score, time, total, miss),
            _ => {
                warn!("result fields missing; session not recorded");
                return None;
            }
        };

        let mut session = match self.current.take() {
            Some(session) => session,
            None => {
                warn!("no session in flight; dropping result");
                self.phase = Phase::Idle;
                self.space_save_armed = false;
                return None;
            }
        };

        session.finish(SessionResult {
            score: parse_int(score),
            time: parse_float(time),
            total_keystrokes: parse_int(total),
            mistakes: parse_int(miss),
        });
        store.append_session_or_fallback(&session);
        info!(
            session_id = %session.id,
            score = session.result.map(|r| r.score).unwrap_or_default(),
            "session recorded"
        );

        self.phase = Phase::Idle;
        self.space_save_armed = false;
        sink.send(PageCommand::SetStatus {
            text: STATUS_COMPLETED.to_string(),
        });
        sink.send(PageCommand::SetControlsEnabled { enabled: true });
        Some(session)
    }
}

impl Default for CaptureMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// Leading integer prefix of the text, zero when there is none.
fn parse_int(text: &str) -> i64 {
    let trimmed = text.trim();
    let mut end = 0;
    for (i, c) in trimmed.char_indices() {
        let ok = c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'));
        if !ok {
            break;
        }
        end = i + c.len_utf8();
    }
    trimmed[..end].parse().unwrap_or(0)
}

/// Leading decimal prefix of the text, zero when there is none.
fn parse_float(text: &str) -> f64 {
    let trimmed = text.trim();
    let mut end = 0;
    let mut seen_dot = false;
    for (i, c) in trimmed.char_indices() {
        let ok = c.is_ascii_digit()
            || (i == 0 && (c == '-' || c == '+'))
            || (c == '.' && !seen_dot);
        if !ok {
            break;
        }
        if c == '.' {
            seen_dot = true;
        }
        end = i + c.len_utf8();
    }
    trimmed[..end].parse().unwrap_or(0.0)
}
