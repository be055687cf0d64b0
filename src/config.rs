// CLASSIFICATION: COMMUNITY
// Filename: config.rs v0.2
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! Daemon configuration: a TOML file, then command-line overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, ValueEnum};
use log::debug;
use serde::Deserialize;
use thiserror::Error;

use crate::device::settings::{DEFAULT_PASSWORD, DEFAULT_SSID};
use crate::device::{BootOptions, MAX_PULSE};
use crate::registry::layout::MAX_TAGS;
use crate::registry::Layout;

/// Environment variable consulted when `--config` is absent.
pub const CONFIG_ENV: &str = "TAGRELAY_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Volatile RAM image; contents are lost on exit.
    Memory,
    /// Image file on the host.
    File,
}

#[derive(Parser, Debug, Default)]
#[command(name = "tagrelayd", author, version, about = "Tag registry relay controller")]
pub struct Cli {
    /// TOML config file (falls back to $TAGRELAY_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub listen: Option<String>,
    #[arg(long, value_enum)]
    pub backend: Option<Backend>,
    #[arg(long)]
    pub image: Option<PathBuf>,
    #[arg(long = "max-tags")]
    pub max_tags: Option<u32>,
    #[arg(long = "pulse-secs")]
    pub pulse_secs: Option<u64>,
}

impl Cli {
    fn config_path(&self) -> Option<PathBuf> {
        self.config
            .clone()
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DaemonConfig {
    pub listen: String,
    pub backend: Backend,
    pub image: PathBuf,
    pub image_size: usize,
    pub max_tags: u32,
    pub pulse_secs: u64,
    pub relay_pin: u8,
    pub ap_ssid: String,
    pub ap_password: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8080".into(),
            backend: Backend::File,
            image: PathBuf::from("tagrelay.img"),
            image_size: 4096,
            max_tags: MAX_TAGS,
            pulse_secs: 5,
            relay_pin: 16,
            ap_ssid: DEFAULT_SSID.into(),
            ap_password: DEFAULT_PASSWORD.into(),
        }
    }
}

impl DaemonConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let cfg: Self = toml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// File named by the CLI or environment (defaults otherwise), with CLI
    /// flags applied on top.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let mut cfg = match cli.config_path() {
            Some(path) => {
                debug!("config: loading {}", path.display());
                Self::from_file(&path)?
            }
            None => Self::default(),
        };
        if let Some(listen) = &cli.listen {
            cfg.listen = listen.clone();
        }
        if let Some(backend) = cli.backend {
            cfg.backend = backend;
        }
        if let Some(image) = &cli.image {
            cfg.image = image.clone();
        }
        if let Some(max) = cli.max_tags {
            cfg.max_tags = max;
        }
        if let Some(secs) = cli.pulse_secs {
            cfg.pulse_secs = secs;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.pulse_secs == 0 || self.pulse_secs > MAX_PULSE.as_secs() {
            return Err(ConfigError::Invalid(format!(
                "pulse_secs must be between 1 and {}",
                MAX_PULSE.as_secs()
            )));
        }
        if self.max_tags == 0 {
            return Err(ConfigError::Invalid("max_tags must be positive".into()));
        }
        let need = self.layout().end();
        if self.image_size < need {
            return Err(ConfigError::Invalid(format!(
                "image_size {} below the {} bytes {} tags need",
                self.image_size, need, self.max_tags
            )));
        }
        if self.ap_ssid.is_empty() || self.ap_password.is_empty() {
            return Err(ConfigError::Invalid("AP credentials must not be empty".into()));
        }
        Ok(())
    }

    pub fn layout(&self) -> Layout {
        Layout::with_capacity(self.max_tags)
    }

    pub fn boot_options(&self) -> BootOptions {
        BootOptions {
            layout: self.layout(),
            ap_ssid: self.ap_ssid.clone(),
            ap_password: self.ap_password.clone(),
            pulse: Duration::from_secs(self.pulse_secs),
        }
    }
}
