use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root folder holding one sub-folder per course
    pub courses_base: PathBuf,
    /// Where the sync step writes the catalog document
    pub catalog_path: PathBuf,
    /// Directory of the file-backed progress store
    pub progress_dir: PathBuf,
    pub sync: SyncConfig,
    pub player: PlayerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            courses_base: PathBuf::from("./public/courses"),
            catalog_path: PathBuf::from("./src/allCourses.json"),
            progress_dir: PathBuf::from("./progress"),
            sync: SyncConfig::default(),
            player: PlayerConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// URL prefix of media paths, followed by `/<course>/<chapter>/<file>`
    pub media_prefix: String,
    /// URL prefix of thumbnails, followed by `/<course>/thumbnail.jpg`
    pub thumbnail_prefix: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            media_prefix: "/public/courses".to_string(),
            thumbnail_prefix: "/courses".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Watched fraction at which an item counts as finished; values at or
    /// above 0.999 mean "at the end of the stream"
    pub completion_threshold: f64,
    pub hide_controls_after_ms: u64,
    pub seek_step_secs: f64,
    pub volume_step: f64,
    pub initial_volume: f64,
    pub initial_muted: bool,
    pub autoplay: bool,
    /// Select the next item as soon as the current one completes
    pub auto_advance: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            completion_threshold: 0.9,
            hide_controls_after_ms: 3000,
            seek_step_secs: 5.0,
            volume_step: 0.1,
            initial_volume: 0.8,
            initial_muted: false,
            autoplay: true,
            auto_advance: false,
        }
    }
}

impl PlayerConfig {
    pub fn hide_controls_after(&self) -> Duration {
        Duration::from_millis(self.hide_controls_after_ms)
    }
}

impl Config {
    /// Read an optional TOML file, then apply `COURSES_*` overrides from the
    /// environment (and `.env`).
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => {
                info!("Loading config from {}", path.display());
                toml::from_str::<Config>(&std::fs::read_to_string(path)?)?
            }
            None => Config::default(),
        };
        let _ = dotenvy::dotenv();
        if let Ok(base) = dotenvy::var("COURSES_BASE_PATH") {
            config.courses_base = base.into();
        }
        if let Ok(catalog) = dotenvy::var("COURSES_CATALOG_PATH") {
            config.catalog_path = catalog.into();
        }
        if let Ok(dir) = dotenvy::var("COURSES_PROGRESS_DIR") {
            config.progress_dir = dir.into();
        }
        Ok(config)
    }
}
