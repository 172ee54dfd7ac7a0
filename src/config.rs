//! Runtime configuration.
//!
//! Values come from a `key = value` file, then environment overrides, and
//! finally command-line flags applied by the binary.

use std::path::Path;

use crate::error::ConfigError;

const DEFAULT_CONFIG_PATH: &str = "/etc/zbsniff.conf";
const DEFAULT_DEVICE: &str = "zep";
const DEFAULT_CHANNEL: u8 = 11;
const DEFAULT_COUNT: u64 = 10;
const DEFAULT_LOG: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Radio device identifier
    pub device: String,
    /// IEEE 802.15.4 channel to listen on
    pub channel: u8,
    /// Frames to capture; 0 captures until interrupted
    pub count: u64,
    /// Log filter used when RUST_LOG is unset
    pub log: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device: DEFAULT_DEVICE.to_string(),
            channel: DEFAULT_CHANNEL,
            count: DEFAULT_COUNT,
            log: DEFAULT_LOG.to_string(),
        }
    }
}

impl Config {
    /// Load from `ZBSNIFF_CONFIG` (or the default path) and the environment.
    ///
    /// A missing config file is not an error.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = std::env::var("ZBSNIFF_CONFIG")
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let mut config = if Path::new(&config_path).exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::parse_str(&content)?
        } else {
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse config file contents on top of the defaults.
    pub fn parse_str(content: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(ConfigError::Invalid(format!("Malformed line: {}", line)));
            };
            let value = value.trim();
            match key.trim() {
                "device" => config.device = value.to_string(),
                "channel" => config.channel = parse_channel(value, "channel")?,
                "count" => config.count = parse_count(value, "count")?,
                "log" => config.log = value.to_string(),
                // Unknown keys are ignored
                _ => {}
            }
        }

        Ok(config)
    }

    /// Apply `ZBSNIFF_*` overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("ZBSNIFF_DEVICE") {
            self.device = val;
        }
        if let Some(val) = lookup("ZBSNIFF_CHANNEL") {
            self.channel = parse_channel(&val, "ZBSNIFF_CHANNEL")?;
        }
        if let Some(val) = lookup("ZBSNIFF_COUNT") {
            self.count = parse_count(&val, "ZBSNIFF_COUNT")?;
        }
        if let Some(val) = lookup("ZBSNIFF_LOG") {
            self.log = val;
        }
        Ok(())
    }

    /// Frame limit for a live capture; `None` means unbounded.
    pub fn count_limit(&self) -> Option<u64> {
        (self.count > 0).then_some(self.count)
    }

    /// Filter directive for the tracing subscriber.
    pub fn tracing_filter(&self) -> String {
        format!("zbsniff={}", self.log)
    }
}

fn parse_channel(value: &str, name: &str) -> Result<u8, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("Invalid {}: {}", name, value)))
}

fn parse_count(value: &str, name: &str) -> Result<u64, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("Invalid {}: {}", name, value)))
}
