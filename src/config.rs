//! Configuration loading helpers.
//!
//! Tuning knobs live in a TOML file and/or `OXICAT__section__field`
//! environment overrides, so the empirically chosen buffer sizes stay named,
//! testable values instead of compiled-in constants.

use std::env;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::policy::{BlockSizePolicy, CopyProfile};

/// Errors returned by configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error while reading config files.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parse error.
    #[error("toml parse error: {0}")]
    Toml(#[from] toml::de::Error),
    /// Invalid value for a key.
    #[error("invalid value for {key}: {value}")]
    InvalidValue {
        /// Configuration key.
        key: String,
        /// Raw value string.
        value: String,
    },
    /// Unknown configuration key.
    #[error("unknown config key: {0}")]
    UnknownKey(String),
}

/// Top-level configuration schema.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OxicatConfig {
    /// Copy pipeline configuration.
    pub copy: Option<CopySpec>,
}

/// Copy configuration overrides.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CopySpec {
    /// Profile name: one of `unbuffered`, `page-sized`, `page-aligned`,
    /// `fs-block`, `empirical`, `sequential`.
    pub profile: Option<String>,
    /// Tuned byte count for the `empirical` profile.
    pub empirical_bytes: Option<usize>,
    /// Tuned byte count for the `sequential` profile.
    pub sequential_bytes: Option<usize>,
    /// Force page alignment of the buffer on or off.
    pub page_aligned: Option<bool>,
}

impl OxicatConfig {
    /// Load configuration from a TOML file.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Load configuration from the `OXICAT_CONFIG` env var (if set),
    /// then apply `OXICAT__section__field` overrides.
    pub fn load_from_env() -> Result<Self, ConfigError> {
        let config_path = env::var("OXICAT_CONFIG").ok();
        let mut config = match config_path {
            Some(path) => Self::load_from_path(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply environment overrides in-place.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        for (key, value) in env::vars() {
            if !key.starts_with("OXICAT__") {
                continue;
            }
            let path = key["OXICAT__".len()..].to_ascii_lowercase();
            let parts: Vec<&str> = path.split("__").collect();
            let value = value.trim().to_string();

            match parts.as_slice() {
                ["copy", "profile"] => {
                    self.copy_mut().profile = Some(value);
                }
                ["copy", "empirical_bytes"] => {
                    self.copy_mut().empirical_bytes = Some(parse_value(&key, &value)?);
                }
                ["copy", "sequential_bytes"] => {
                    self.copy_mut().sequential_bytes = Some(parse_value(&key, &value)?);
                }
                ["copy", "page_aligned"] => {
                    self.copy_mut().page_aligned = Some(parse_value(&key, &value)?);
                }
                _ => return Err(ConfigError::UnknownKey(key)),
            }
        }

        Ok(())
    }

    /// Resolve a [`CopyProfile`] from defaults, file/env values, and an
    /// optional caller-supplied profile name (which wins).
    pub fn resolve_profile(&self, override_name: Option<&str>) -> Result<CopyProfile, ConfigError> {
        let spec = self.copy.clone().unwrap_or_default();

        let name = override_name
            .map(str::to_string)
            .or_else(|| spec.profile.clone())
            .unwrap_or_else(|| CopyProfile::empirical().name().to_string());

        let mut profile = CopyProfile::by_name(&name).ok_or_else(|| ConfigError::InvalidValue {
            key: "copy.profile".to_string(),
            value: name.clone(),
        })?;

        if let Some(bytes) = spec.empirical_bytes {
            require_nonzero("copy.empirical_bytes", bytes)?;
            if matches!(profile.policy, BlockSizePolicy::Empirical { .. }) {
                profile.policy = BlockSizePolicy::Empirical { bytes };
            }
        }

        if let Some(bytes) = spec.sequential_bytes {
            require_nonzero("copy.sequential_bytes", bytes)?;
            if matches!(profile.policy, BlockSizePolicy::EmpiricalSequential { .. }) {
                profile.policy = BlockSizePolicy::EmpiricalSequential { bytes };
            }
        }

        if let Some(aligned) = spec.page_aligned {
            profile.page_aligned = aligned;
        }

        Ok(profile)
    }

    fn copy_mut(&mut self) -> &mut CopySpec {
        if self.copy.is_none() {
            self.copy = Some(CopySpec::default());
        }
        self.copy.as_mut().expect("copy config")
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn require_nonzero(key: &str, bytes: usize) -> Result<(), ConfigError> {
    if bytes == 0 {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: "0".to_string(),
        });
    }
    Ok(())
}
