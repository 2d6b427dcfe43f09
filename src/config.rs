//! Configuration management for the wildcam storage subsystem
//!
//! Values come from an optional TOML file layered with `WILDCAM_*`
//! environment overrides. Anything left unset falls back to the defaults
//! below, which match the fixed layout of the camera firmware.

use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

use crate::device::TransferMode;
use crate::storage::StorageLayout;

const MB: u64 = 1024 * 1024;

/// Config file locations tried by [`StorageConfig::load`], in order.
const CONFIG_PATHS: [&str; 2] = [
    "wildcam-storage/storage", // Installed layout: /opt/wildcam/wildcam-storage/storage.toml
    "storage",                 // Local development: ./storage.toml
];

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    // ═══ DEVICE ═══
    /// Host directory where the card is mounted
    /// Environment: WILDCAM_MOUNT_POINT
    pub mount_point: String,

    /// Capacity reported for the card in MB
    pub capacity_mb: u64,

    /// Bus width used when mounting (`one_bit` or `four_bit`)
    pub transfer_mode: TransferMode,

    // ═══ LAYOUT ═══
    pub images_dir: String,
    pub logs_dir: String,
    pub filename_prefix: String,
    pub filename_extension: String,

    // ═══ CAPACITY MONITORING ═══
    /// Usage percentage at which the card is reported as nearly full
    pub warning_threshold_percent: u8,

    /// Headroom kept free on top of a requested write when checking space
    pub reserve_bytes: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            mount_point: "/sdcard".to_string(),
            capacity_mb: 4096,
            transfer_mode: TransferMode::OneBit,
            images_dir: "/images".to_string(),
            logs_dir: "/logs".to_string(),
            filename_prefix: "IMG_".to_string(),
            filename_extension: "jpg".to_string(),
            warning_threshold_percent: 85,
            reserve_bytes: 1024,
        }
    }
}

impl StorageConfig {
    /// Load from the first config file found (if any) with environment overrides
    pub fn load() -> Result<Self, config::ConfigError> {
        for config_path in CONFIG_PATHS {
            let candidate = PathBuf::from(format!("{config_path}.toml"));
            if candidate.is_file() {
                return Self::load_from(Some(config_path));
            }
        }
        Self::load_from(None)
    }

    /// Load from an explicit file (extension optional) with environment overrides
    pub fn load_from(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path));
        }

        let settings = builder
            .add_source(Environment::with_prefix("WILDCAM"))
            .build()?;

        let config: StorageConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.mount_point.is_empty() {
            return Err(config::ConfigError::Message(
                "mount_point cannot be empty".into(),
            ));
        }

        if self.capacity_mb == 0 {
            return Err(config::ConfigError::Message(
                "capacity_mb must be greater than 0".into(),
            ));
        }

        if self.capacity_mb > u64::MAX / MB {
            return Err(config::ConfigError::Message(format!(
                "capacity_mb must be at most {}",
                u64::MAX / MB
            )));
        }

        for (name, dir) in [("images_dir", &self.images_dir), ("logs_dir", &self.logs_dir)] {
            if !dir.starts_with('/') || dir.len() < 2 || dir.ends_with('/') {
                return Err(config::ConfigError::Message(format!(
                    "{name} must be an absolute directory path like /images, got {dir:?}"
                )));
            }
        }

        if self.images_dir == self.logs_dir {
            return Err(config::ConfigError::Message(
                "images_dir and logs_dir must differ".into(),
            ));
        }

        if self.filename_prefix.is_empty() || self.filename_extension.is_empty() {
            return Err(config::ConfigError::Message(
                "filename_prefix and filename_extension cannot be empty".into(),
            ));
        }

        if self.warning_threshold_percent == 0 || self.warning_threshold_percent > 100 {
            return Err(config::ConfigError::Message(
                "warning_threshold_percent must be between 1 and 100".into(),
            ));
        }

        Ok(())
    }

    pub fn mount_point_path(&self) -> PathBuf {
        PathBuf::from(&self.mount_point)
    }

    pub fn capacity_bytes(&self) -> u64 {
        self.capacity_mb.saturating_mul(MB)
    }

    /// Directory layout and naming handed to the storage manager
    pub fn layout(&self) -> StorageLayout {
        StorageLayout {
            images_dir: self.images_dir.clone(),
            logs_dir: self.logs_dir.clone(),
            transfer_mode: self.transfer_mode,
            filename_prefix: self.filename_prefix.clone(),
            filename_extension: self.filename_extension.clone(),
            warning_threshold_percent: self.warning_threshold_percent,
            reserve_bytes: self.reserve_bytes,
        }
    }
}
