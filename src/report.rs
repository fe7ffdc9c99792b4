use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Local, Utc};
use itertools::Itertools;

use crate::app_dirs::AppDirs;
use crate::session::Session;
use crate::stats::session_accuracy;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not determine a state directory")]
    NoStateDir,
}

/// How far back the report looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum_macros::Display)]
pub enum RangeFilter {
    #[strum(serialize = "last 7 days")]
    Week,
    #[default]
    #[strum(serialize = "last 30 days")]
    Month,
    #[strum(serialize = "last 90 days")]
    Quarter,
    #[strum(serialize = "all time")]
    All,
}

impl RangeFilter {
    pub fn cycle(self) -> Self {
        match self {
            RangeFilter::Week => RangeFilter::Month,
            RangeFilter::Month => RangeFilter::Quarter,
            RangeFilter::Quarter => RangeFilter::All,
            RangeFilter::All => RangeFilter::Week,
        }
    }

    pub fn cutoff(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let days = match self {
            RangeFilter::Week => 7,
            RangeFilter::Month => 30,
            RangeFilter::Quarter => 90,
            RangeFilter::All => return None,
        };
        Some(now - Duration::days(days))
    }
}

/// Completed sessions that started inside the range, oldest ordering
/// preserved.
pub fn filter_sessions(
    sessions: &[Session],
    range: RangeFilter,
    now: DateTime<Utc>,
) -> Vec<Session> {
    let cutoff = range.cutoff(now);
    sessions
        .iter()
        .filter(|s| s.is_complete())
        .filter(|s| cutoff.map_or(true, |cutoff| s.start_time >= cutoff))
        .cloned()
        .collect()
}

/// Sessions per local calendar day, oldest day first, labelled month/day.
pub fn daily_counts(sessions: &[Session]) -> Vec<(String, u64)> {
    sessions
        .iter()
        .filter(|s| s.is_complete())
        .map(|s| s.start_time.with_timezone(&Local).date_naive())
        .counts()
        .into_iter()
        .sorted()
        .map(|(day, count)| (day.format("%m/%d").to_string(), count as u64))
        .collect()
}

/// Write completed sessions as CSV, one row per session.
pub fn export_csv(path: &Path, sessions: &[Session]) -> Result<(), ExportError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "date",
        "start",
        "end",
        "score",
        "time_secs",
        "keystrokes",
        "mistakes",
        "accuracy",
        "section",
        "japanese",
        "map",
        "sound",
        "spell",
    ])?;

    for session in sessions {
        let result = match session.result {
            Some(result) => result,
            None => continue,
        };
        writer.write_record([
            session
                .start_time
                .with_timezone(&Local)
                .format("%Y-%m-%d")
                .to_string(),
            session.start_time.to_rfc3339(),
            session.end_time.map(|t| t.to_rfc3339()).unwrap_or_default(),
            result.score.to_string(),
            format!("{:.1}", result.time),
            result.total_keystrokes.to_string(),
            result.mistakes.to_string(),
            format!("{:.1}", session_accuracy(&result)),
            session.section.clone().unwrap_or_default(),
            session.settings.japanese.to_string(),
            session.settings.map.to_string(),
            session.settings.sound.to_string(),
            session.settings.spell.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn default_export_path(now: DateTime<Local>) -> Result<PathBuf, ExportError> {
    let stamp = now.format("%Y%m%d-%H%M%S").to_string();
    AppDirs::export_path(&stamp).ok_or(ExportError::NoStateDir)
}
