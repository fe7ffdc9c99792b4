use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::{Session, SessionResult};

/// Summary over captured sessions. All fields are zero when no completed
/// session exists; presentation decides how to label that.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionAggregate {
    pub total_sessions: usize,
    pub avg_score: f64,
    pub avg_time: f64,
    pub avg_accuracy: f64,
}

/// One finished drill from the built-in practice mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeResult {
    pub date: DateTime<Utc>,
    pub wpm: i64,
    pub accuracy: i64,
    pub text: String,
}

/// Accumulated drill statistics, stored as one blob and recomputed from
/// the full result list on every save.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeStats {
    pub results: Vec<PracticeResult>,
    pub average_wpm: i64,
    pub average_accuracy: i64,
    pub best_wpm: i64,
    pub best_accuracy: i64,
    pub total_practices: usize,
}

/// Aggregate completed sessions. Average accuracy is the ratio of summed
/// keystrokes, not a mean of per-session percentages, so long sessions
/// weigh more than short ones.
pub fn session_aggregate(sessions: &[Session]) -> SessionAggregate {
    let results: Vec<SessionResult> = sessions.iter().filter_map(|s| s.result).collect();
    if results.is_empty() {
        return SessionAggregate::default();
    }

    let scores: Vec<f64> = results.iter().map(|r| r.score as f64).collect();
    let times: Vec<f64> = results.iter().map(|r| r.time).collect();
    let keystrokes: i64 = results.iter().map(|r| r.total_keystrokes).sum();
    let mistakes: i64 = results.iter().map(|r| r.mistakes).sum();

    let avg_accuracy = if keystrokes > 0 {
        ((keystrokes - mistakes) as f64 / keystrokes as f64 * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    };

    SessionAggregate {
        total_sessions: results.len(),
        avg_score: mean(&scores),
        avg_time: mean(&times),
        avg_accuracy,
    }
}

/// Accuracy of a single result as a percentage, zero when no keystrokes
/// were recorded.
pub fn session_accuracy(result: &SessionResult) -> f64 {
    if result.total_keystrokes <= 0 {
        return 0.0;
    }
    let ratio =
        (result.total_keystrokes - result.mistakes) as f64 / result.total_keystrokes as f64;
    (ratio * 100.0).clamp(0.0, 100.0)
}

/// Rebuild the practice stats blob from a full result list.
pub fn practice_aggregate(results: Vec<PracticeResult>) -> PracticeStats {
    if results.is_empty() {
        return PracticeStats::default();
    }

    let wpms: Vec<f64> = results.iter().map(|r| r.wpm as f64).collect();
    let accuracies: Vec<f64> = results.iter().map(|r| r.accuracy as f64).collect();

    PracticeStats {
        average_wpm: mean(&wpms).round() as i64,
        average_accuracy: mean(&accuracies).round() as i64,
        best_wpm: results.iter().map(|r| r.wpm).max().unwrap_or(0),
        best_accuracy: results.iter().map(|r| r.accuracy).max().unwrap_or(0),
        total_practices: results.len(),
        results,
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
