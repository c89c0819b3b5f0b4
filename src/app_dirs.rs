use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// `$HOME/.local/state/skewdle`, or the platform data dir without `$HOME`
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join("skewdle"),
            )
        } else {
            ProjectDirs::from("", "", "skewdle").map(|pd| pd.data_local_dir().to_path_buf())
        }
    }

    pub fn progress_db_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("progress.db"))
    }

    pub fn history_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("history.csv"))
    }

    pub fn log_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("skewdle.log"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_live_in_the_state_dir() {
        if let Some(dir) = AppDirs::state_dir() {
            assert_eq!(AppDirs::progress_db_path(), Some(dir.join("progress.db")));
            assert_eq!(AppDirs::history_path(), Some(dir.join("history.csv")));
            assert_eq!(AppDirs::log_path(), Some(dir.join("skewdle.log")));
        }
    }
}
