use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Settings captured from the practice page at the moment a session starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    pub sound: bool,
    pub spell: bool,
    pub japanese: bool,
    pub map: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            sound: false,
            spell: false,
            japanese: true,
            map: true,
        }
    }
}

/// Final numbers scraped from the page's result card.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResult {
    pub score: i64,
    pub time: f64,
    pub total_keystrokes: i64,
    pub mistakes: i64,
}

/// One captured typing session. `end_time` and `result` stay empty until
/// the session completes; an incomplete session is never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub start_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    pub settings: SessionSettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<SessionResult>,
    pub url: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

impl Session {
    pub fn begin(settings: SessionSettings, url: &str, title: &str) -> Self {
        Self {
            id: new_session_id(),
            start_time: Utc::now(),
            end_time: None,
            settings,
            result: None,
            url: url.to_string(),
            title: title.to_string(),
            section: section_from_title(title),
        }
    }

    pub fn finish(&mut self, result: SessionResult) {
        self.end_time = Some(Utc::now());
        self.result = Some(result);
    }

    pub fn is_complete(&self) -> bool {
        self.result.is_some()
    }
}

/// Millisecond timestamp plus a short random suffix, unique enough for
/// sessions started within the same millisecond.
pub fn new_session_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(char::from)
        .collect();
    format!("session_{}_{}", Utc::now().timestamp_millis(), suffix)
}

/// Practice pages title themselves "Section | Site"; everything before the
/// first pipe names the section.
pub fn section_from_title(title: &str) -> Option<String> {
    let head = match title.split_once('|') {
        Some((head, _)) => head.trim(),
        None => title.trim(),
    };
    if head.is_empty() {
        None
    } else {
        Some(head.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_have_expected_shape() {
        let id = new_session_id();
        assert!(id.starts_with("session_"));
        let parts: Vec<&str> = id.splitn(3, '_').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 9);
    }

    #[test]
    fn session_ids_are_unique() {
        let a = new_session_id();
        let b = new_session_id();
        assert_ne!(a, b);
    }

    #[test]
    fn section_comes_from_title_head() {
        assert_eq!(
            section_from_title("Basic Drills | Typing Practice"),
            Some("Basic Drills".to_string())
        );
        assert_eq!(
            section_from_title("No Pipe Here"),
            Some("No Pipe Here".to_string())
        );
        assert_eq!(section_from_title("   | Typing Practice"), None);
        assert_eq!(section_from_title(""), None);
    }

    #[test]
    fn begin_records_settings_and_section() {
        let settings = SessionSettings {
            sound: true,
            spell: false,
            japanese: true,
            map: false,
        };
        let session = Session::begin(settings, "https://example.com/play", "Drill A | Site");

        assert_eq!(session.settings, settings);
        assert_eq!(session.url, "https://example.com/play");
        assert_eq!(session.section.as_deref(), Some("Drill A"));
        assert!(session.end_time.is_none());
        assert!(!session.is_complete());
    }

    #[test]
    fn finish_marks_complete() {
        let mut session = Session::begin(SessionSettings::default(), "u", "t");
        session.finish(SessionResult {
            score: 100,
            time: 30.0,
            total_keystrokes: 200,
            mistakes: 5,
        });

        assert!(session.is_complete());
        assert!(session.end_time.is_some());
        assert_eq!(session.result.unwrap().score, 100);
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let mut session = Session::begin(SessionSettings::default(), "u", "t");
        session.finish(SessionResult {
            score: 1,
            time: 2.0,
            total_keystrokes: 3,
            mistakes: 4,
        });
        let json = serde_json::to_string(&session).unwrap();

        assert!(json.contains("\"startTime\""));
        assert!(json.contains("\"endTime\""));
        assert!(json.contains("\"totalKeystrokes\""));
        assert!(!json.contains("\"start_time\""));
    }

    #[test]
    fn incomplete_session_omits_empty_fields() {
        let session = Session::begin(SessionSettings::default(), "u", "Page");
        let json = serde_json::to_string(&session).unwrap();

        assert!(!json.contains("endTime"));
        assert!(!json.contains("result"));
    }
}
