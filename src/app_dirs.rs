use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// State directory holding the database, logs and exports.
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join("taipu"),
            )
        } else {
            ProjectDirs::from("", "", "taipu")
                .map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
        }
    }

    pub fn db_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("taipu.db"))
    }

    pub fn log_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("taipu.log"))
    }

    /// Sessions that could not be written to the database land here,
    /// one JSON object per line. The file is never read back.
    pub fn fallback_log_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("sessions-fallback.jsonl"))
    }

    pub fn export_path(stamp: &str) -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join(format!("report-{stamp}.csv")))
    }
}
