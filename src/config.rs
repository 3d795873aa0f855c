use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Audio settings. The question set and all timings are fixed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub tone_frequency_hz: f32,
    pub volume: f32,
    pub mute: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tone_frequency_hz: crate::game::DEFAULT_TONE_HZ,
            volume: 0.5,
            mute: false,
        }
    }
}

impl Config {
    /// Clamp values into ranges the audio backend accepts
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !self.tone_frequency_hz.is_finite() || self.tone_frequency_hz <= 0.0 {
            self.tone_frequency_hz = defaults.tone_frequency_hz;
        }
        self.tone_frequency_hz = self.tone_frequency_hz.clamp(100.0, 3_000.0);
        self.volume = if self.volume.is_finite() {
            self.volume.clamp(0.0, 1.0)
        } else {
            defaults.volume
        };
        self
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "morsequiz") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("morsequiz_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        match fs::read(&self.path) {
            Ok(bytes) => match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg.sanitized(),
                Err(err) => {
                    tracing::warn!(path = %self.path.display(), %err, "ignoring unreadable config")
                }
            },
            Err(err) => {
                tracing::debug!(path = %self.path.display(), %err, "no config file, using defaults")
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn save_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config {
            tone_frequency_hz: 550.0,
            volume: 0.8,
            mute: true,
        };
        store.save(&cfg).unwrap();
        assert_eq!(store.load(), cfg);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("absent.json"));
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn garbage_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, b"{ not json").unwrap();
        assert_eq!(FileConfigStore::with_path(&path).load(), Config::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{ "mute": true }"#).unwrap();
        let cfg = FileConfigStore::with_path(&path).load();
        assert!(cfg.mute);
        assert_eq!(cfg.volume, Config::default().volume);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let cfg = Config {
            tone_frequency_hz: -5.0,
            volume: 4.0,
            mute: false,
        }
        .sanitized();
        assert_eq!(cfg.tone_frequency_hz, Config::default().tone_frequency_hz);
        assert_eq!(cfg.volume, 1.0);
    }
}
