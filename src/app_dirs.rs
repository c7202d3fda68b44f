use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// Default location of the exported records file.
    pub fn records_path() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            let state_dir = PathBuf::from(home)
                .join(".local")
                .join("state")
                .join("nourish");
            Some(state_dir.join("records.json"))
        } else {
            ProjectDirs::from("", "", "nourish")
                .map(|proj_dirs| proj_dirs.data_local_dir().join("records.json"))
        }
    }

    pub fn config_path() -> PathBuf {
        if let Some(pd) = ProjectDirs::from("", "", "nourish") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("nourish_config.json")
        }
    }
}
