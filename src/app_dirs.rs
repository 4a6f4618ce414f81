use directories::ProjectDirs;
use std::path::{Path, PathBuf};

pub const DATA_DIR_ENV: &str = "DRILLBOOK_DATA_DIR";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// State directory: `$DRILLBOOK_DATA_DIR`, then `~/.local/state/drillbook`,
    /// then the platform data dir.
    pub fn data_dir() -> Option<PathBuf> {
        if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
            return Some(PathBuf::from(dir));
        }
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join("drillbook"),
            )
        } else {
            ProjectDirs::from("", "", "drillbook").map(|pd| pd.data_local_dir().to_path_buf())
        }
    }

    pub fn db_path_in(dir: &Path) -> PathBuf {
        dir.join("drillbook.db")
    }

    pub fn json_dir_in(dir: &Path) -> PathBuf {
        dir.join("json")
    }

    pub fn log_dir_in(dir: &Path) -> PathBuf {
        dir.join("logs")
    }

    pub fn db_path() -> Option<PathBuf> {
        Self::data_dir().map(|d| Self::db_path_in(&d))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_paths_live_under_data_dir() {
        let base = Path::new("/tmp/drill");
        assert_eq!(AppDirs::db_path_in(base), base.join("drillbook.db"));
        assert_eq!(AppDirs::json_dir_in(base), base.join("json"));
        assert_eq!(AppDirs::log_dir_in(base), base.join("logs"));
    }
}
