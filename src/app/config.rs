//! Configuration Management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cache settings
    pub cache: CacheConfig,
    /// Mining defaults
    pub mining: MiningConfig,
    /// Scheduler worker bounds
    pub scheduler: SchedulerConfig,
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Attach the in-memory cache backend
    pub enabled: bool,
    /// Entry lifetime in seconds
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 24 * 60 * 60,
        }
    }
}

/// Mining configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MiningConfig {
    /// Minimum subsequence length
    pub min_length: usize,
    /// Minimum occurrence count for persistence
    pub min_frequency: u64,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            min_length: 2,
            min_frequency: 2,
        }
    }
}

/// Scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Concurrent workers on the processing queue
    pub processing_workers: usize,
    /// Concurrent workers on the image-analysis queue
    pub image_workers: usize,
    /// Concurrent workers on the pattern-mining queue
    pub mining_workers: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            processing_workers: 3,
            image_workers: 2,
            mining_workers: 1,
        }
    }
}

impl Config {
    /// Validate config values are within acceptable ranges.
    /// Returns Ok(()) if valid, or Err with a description of the first invalid field.
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.cache.ttl_secs == 0 {
            return Err(crate::Error::Config("ttl_secs must be > 0".to_string()));
        }
        if self.mining.min_length < 2 {
            return Err(crate::Error::Config(format!(
                "min_length must be at least 2, got {}",
                self.mining.min_length
            )));
        }
        if self.mining.min_frequency == 0 {
            return Err(crate::Error::Config("min_frequency must be > 0".to_string()));
        }
        if self.scheduler.processing_workers == 0
            || self.scheduler.image_workers == 0
            || self.scheduler.mining_workers == 0
        {
            return Err(crate::Error::Config(
                "every queue needs at least one worker".to_string(),
            ));
        }
        Ok(())
    }

    /// Load config from file
    pub fn load(path: &PathBuf) -> Result<Self, crate::Error> {
        let content = std::fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from the default location, falling back to defaults
    pub fn load_default() -> Result<Self, crate::Error> {
        let path = Self::default_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file
    pub fn save(&self, path: &PathBuf) -> Result<(), crate::Error> {
        let content =
            toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Default config location
    pub fn default_path() -> PathBuf {
        std::env::var_os("MACRO_HUMANIZER_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("macro-humanizer.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_are_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let mut config = Config::default();
        config.mining.min_length = 1;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.cache.ttl_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.scheduler.processing_workers = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn saves_and_loads_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.mining.min_frequency = 5;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.mining.min_frequency, 5);
        assert!(loaded.cache.enabled);
    }

    #[test]
    fn invalid_file_fails_to_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "mining = { min_length = 1 }").unwrap();
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn partial_files_fall_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[mining]\nmin_frequency = 3\n").unwrap();
        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.mining.min_frequency, 3);
        assert_eq!(loaded.mining.min_length, 2);
        assert_eq!(loaded.scheduler.processing_workers, 3);
    }
}
