use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::clip::ClipList;
use crate::error::{PlaylistError, Result};
use crate::storage::{DEFAULT_STORAGE_SLOT, JsonFileStorage};

pub const DEFAULT_SOURCE_URI: &str =
    "https://download.blender.org/durian/trailer/sintel_trailer-480p.mp4";
pub const DEFAULT_FULL_VIDEO_NAME: &str = "Full video";
pub const DEFAULT_FULL_VIDEO_END: f64 = 52.0;
pub const DEFAULT_TRANSITION_DELAY_MS: u64 = 3_000;

/// Runtime settings for the playlist.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlaylistConfig {
    pub source_uri: String,
    pub storage_dir: PathBuf,
    pub storage_slot: String,
    pub transition_delay_ms: u64,
    pub full_video_name: String,
    pub full_video_end: f64,
}

impl Default for PlaylistConfig {
    fn default() -> Self {
        Self {
            source_uri: DEFAULT_SOURCE_URI.to_string(),
            storage_dir: PathBuf::from("."),
            storage_slot: DEFAULT_STORAGE_SLOT.to_string(),
            transition_delay_ms: DEFAULT_TRANSITION_DELAY_MS,
            full_video_name: DEFAULT_FULL_VIDEO_NAME.to_string(),
            full_video_end: DEFAULT_FULL_VIDEO_END,
        }
    }
}

impl PlaylistConfig {
    /// Loads settings from an optional TOML file, then applies `CLIPDECK_*`
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, |key| std::env::var(key).ok())
    }

    /// Same as [`PlaylistConfig::load`] with an injectable environment lookup.
    pub fn load_with_env<F>(path: Option<&Path>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };

        if let Some(value) = env("CLIPDECK_SOURCE_URI") {
            config.source_uri = value;
        }
        if let Some(value) = env("CLIPDECK_STORAGE_DIR") {
            config.storage_dir = PathBuf::from(value);
        }
        if let Some(value) = env("CLIPDECK_STORAGE_SLOT") {
            config.storage_slot = value;
        }
        if let Some(value) = env("CLIPDECK_TRANSITION_DELAY_MS") {
            config.transition_delay_ms =
                value
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| PlaylistError::InvalidConfig {
                        reason: format!("CLIPDECK_TRANSITION_DELAY_MS is not a number: {value}"),
                    })?;
        }

        config.validate()?;
        debug!(config = ?config, "playlist config loaded");
        Ok(config)
    }

    fn from_toml_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| PlaylistError::StorageIo {
            context: "read config file",
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| PlaylistError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<()> {
        let reason = if self.source_uri.trim().is_empty() {
            Some("source_uri must not be empty")
        } else if self.storage_slot.trim().is_empty() {
            Some("storage_slot must not be empty")
        } else if self.full_video_name.trim().is_empty() {
            Some("full_video_name must not be empty")
        } else if !self.full_video_end.is_finite() || self.full_video_end <= 0.0 {
            Some("full_video_end must be a positive number of seconds")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(PlaylistError::InvalidConfig {
                reason: reason.to_string(),
            }),
            None => Ok(()),
        }
    }

    pub fn transition_delay(&self) -> Duration {
        Duration::from_millis(self.transition_delay_ms)
    }

    /// Returns the list used when nothing usable was persisted.
    pub fn default_clips(&self) -> ClipList {
        ClipList::with_full_video(self.full_video_name.clone(), self.full_video_end)
    }

    /// Returns the file-backed slot described by these settings.
    pub fn file_storage(&self) -> JsonFileStorage {
        JsonFileStorage::new(&self.storage_dir, &self.storage_slot)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::Duration;

    use super::PlaylistConfig;
    use crate::error::PlaylistError;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn write_temp_config(contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "clipdeck-config-{}-{}.toml",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("system clock must be after unix epoch")
                .as_nanos()
        ));
        std::fs::write(&path, contents).expect("write config");
        path
    }

    #[test]
    fn defaults_match_the_reference_playlist() {
        let config = PlaylistConfig::load_with_env(None, no_env).expect("defaults are valid");

        assert_eq!(config.storage_slot, "videoClips");
        assert_eq!(config.transition_delay(), Duration::from_secs(3));
        let clips = config.default_clips();
        assert_eq!(clips.len(), 1);
        assert_eq!(clips.get(0).map(|clip| clip.end), Some(52.0));
        assert!(
            config
                .file_storage()
                .path()
                .ends_with("videoClips.json")
        );
    }

    #[test]
    fn file_values_are_overridden_by_environment() {
        let path = write_temp_config(
            "source_uri = \"file:///tmp/movie.mp4\"\ntransition_delay_ms = 500\n",
        );
        let env: HashMap<&str, &str> = HashMap::from([
            ("CLIPDECK_STORAGE_SLOT", "demo"),
            ("CLIPDECK_TRANSITION_DELAY_MS", "250"),
        ]);

        let config = PlaylistConfig::load_with_env(Some(&path), |key| {
            env.get(key).map(|value| value.to_string())
        })
        .expect("config should load");

        assert_eq!(config.source_uri, "file:///tmp/movie.mp4");
        assert_eq!(config.storage_slot, "demo");
        assert_eq!(config.transition_delay_ms, 250);
        assert_eq!(config.full_video_name, "Full video");

        std::fs::remove_file(path).expect("cleanup");
    }

    #[test]
    fn unknown_keys_and_invalid_values_are_rejected() {
        let path = write_temp_config("storage = \"x\"\n");
        assert!(matches!(
            PlaylistConfig::load_with_env(Some(&path), no_env),
            Err(PlaylistError::ConfigParse { .. })
        ));
        std::fs::remove_file(path).expect("cleanup");

        let path = write_temp_config("full_video_end = 0.0\n");
        assert!(matches!(
            PlaylistConfig::load_with_env(Some(&path), no_env),
            Err(PlaylistError::InvalidConfig { .. })
        ));
        std::fs::remove_file(path).expect("cleanup");

        let result = PlaylistConfig::load_with_env(None, |key| {
            (key == "CLIPDECK_TRANSITION_DELAY_MS").then(|| "soon".to_string())
        });
        assert!(matches!(result, Err(PlaylistError::InvalidConfig { .. })));
    }
}
