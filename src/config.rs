use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::AppError;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct PipelineConfig {
    #[serde(default)]
    pub(crate) required: Option<Vec<String>>,
    #[serde(default)]
    pub(crate) extensions: Option<Vec<String>>,
    #[serde(default)]
    pub(crate) resume: bool,
    #[serde(default)]
    pub(crate) scratch_parent: Option<PathBuf>,
    #[serde(default)]
    pub(crate) output_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct MediaConfig {
    /// ffmpeg executable; looked up on PATH when unset
    #[serde(default)]
    pub(crate) ffmpeg: Option<String>,
    /// Program and leading arguments of the split tool
    #[serde(default)]
    pub(crate) split_command: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct IntegrityConfig {
    #[serde(default)]
    pub(crate) hash_file: Option<PathBuf>,
    #[serde(default)]
    pub(crate) video_dirs: Vec<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct BackupConfig {
    #[serde(default)]
    pub(crate) left: Option<PathBuf>,
    #[serde(default)]
    pub(crate) right: Option<PathBuf>,
    #[serde(default)]
    pub(crate) extension: Option<String>,
    #[serde(default)]
    pub(crate) recursive: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Config {
    #[serde(default)]
    pub(crate) pipeline: PipelineConfig,
    #[serde(default)]
    pub(crate) media: MediaConfig,
    #[serde(default)]
    pub(crate) integrity: IntegrityConfig,
    #[serde(default)]
    pub(crate) backup: BackupConfig,
}

impl Config {
    /// First parseable config from the standard locations, or defaults.
    pub(crate) fn load() -> Self {
        // Try config locations in order of priority
        for path in Self::get_config_paths() {
            if path.exists()
                && let Ok(content) = fs::read_to_string(&path)
            {
                match toml::from_str::<Config>(&content) {
                    Ok(config) => {
                        debug!(path = %path.display(), "loaded config");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "failed to parse config, ignoring it");
                    }
                }
            }
        }

        Self::default()
    }

    /// Load a config the user named explicitly; any failure is fatal.
    pub(crate) fn load_from(path: &Path) -> Result<Self, AppError> {
        let content = fs::read_to_string(path).map_err(|e| AppError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| AppError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    fn get_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // 1. XDG config: ~/.config/r3curate/config.toml (Linux/cross-platform)
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".config").join("r3curate").join("config.toml"));
        }

        // 2. Platform config dir, e.g. ~/Library/Application Support/r3curate/config.toml
        if let Some(config_dir) = dirs::config_dir() {
            let platform_path = config_dir.join("r3curate").join("config.toml");
            if !paths.contains(&platform_path) {
                paths.push(platform_path);
            }
        }

        // 3. Home directory: ~/.r3curate.toml
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".r3curate.toml"));
        }

        paths
    }
}
