//! Terminal configuration management

use anyhow::{Context, Result, anyhow};
use common::DeviceFilter;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TerminalConfig {
    #[serde(default)]
    pub terminal: TerminalSettings,
    #[serde(default)]
    pub usb: UsbSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "TerminalSettings::default_log_level")]
    pub log_level: String,
}

impl Default for TerminalSettings {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
        }
    }
}

impl TerminalSettings {
    fn default_log_level() -> String {
        "warn".to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsbSettings {
    /// Timeout for each write and each read, in milliseconds
    #[serde(default = "UsbSettings::default_timeout_ms")]
    pub timeout_ms: u64,
    /// Only list devices matching one of these VID:PID patterns
    /// (e.g. "0x1234:0x5678", "0x1234:*"). Empty lists every device.
    #[serde(default)]
    pub filters: Vec<String>,
}

impl Default for UsbSettings {
    fn default() -> Self {
        Self {
            timeout_ms: Self::default_timeout_ms(),
            filters: Vec::new(),
        }
    }
}

impl UsbSettings {
    fn default_timeout_ms() -> u64 {
        1000
    }
}

impl TerminalConfig {
    /// Load configuration from the specified path
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = if let Some(p) = path {
            p
        } else {
            let candidates = vec![
                Self::default_path(),
                PathBuf::from("/etc/hid-terminal/terminal.toml"),
            ];

            candidates
                .into_iter()
                .find(|p| p.exists())
                .ok_or_else(|| anyhow!("No configuration file found"))?
        };

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: TerminalConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        config.validate()?;

        tracing::info!("Loaded configuration from: {}", config_path.display());
        Ok(config)
    }

    /// Load configuration from a user-supplied path, expanding `~`
    pub fn load_from(path: &str) -> Result<Self> {
        let path_buf = PathBuf::from(shellexpand::tilde(path).as_ref());
        Self::load(Some(path_buf))
    }

    /// Load configuration or return defaults if not found
    pub fn load_or_default() -> Self {
        match Self::load(None) {
            Ok(config) => config,
            Err(e) => {
                tracing::debug!("Using default configuration: {:#}", e);
                Self::default()
            }
        }
    }

    /// Save configuration to the specified path
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::info!("Saved configuration to: {}", path.display());
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("hid-terminal").join("terminal.toml")
        } else {
            PathBuf::from(".config/hid-terminal/terminal.toml")
        }
    }

    /// Parsed device filters
    pub fn filters(&self) -> Result<Vec<DeviceFilter>> {
        self.usb
            .filters
            .iter()
            .map(|f| DeviceFilter::parse(f).map_err(|e| anyhow!(e)))
            .collect()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.usb.timeout_ms)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        Self::validate_log_level(&self.terminal.log_level)?;

        if self.usb.timeout_ms == 0 {
            return Err(anyhow!("Invalid timeout_ms 0, must be greater than 0"));
        }

        self.filters()?;
        Ok(())
    }

    pub fn validate_log_level(level: &str) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&level) {
            return Err(anyhow!(
                "Invalid log level '{}', must be one of: {}",
                level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = TerminalConfig::default();
        assert_eq!(config.terminal.log_level, "warn");
        assert_eq!(config.usb.timeout_ms, 1000);
        assert!(config.usb.filters.is_empty());
        assert_eq!(config.timeout(), Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: TerminalConfig = toml::from_str(
            r#"
[usb]
filters = ["0x04f9:*"]
"#,
        )
        .unwrap();
        assert_eq!(config.terminal.log_level, "warn");
        assert_eq!(config.usb.timeout_ms, 1000);
        assert_eq!(config.filters().unwrap().len(), 1);
    }

    #[test]
    fn test_empty_config_is_default() {
        let config: TerminalConfig = toml::from_str("").unwrap();
        assert_eq!(config.usb.timeout_ms, 1000);
    }

    #[test]
    fn test_validate_log_level() {
        let mut config = TerminalConfig::default();
        config.terminal.log_level = "invalid".to_string();
        assert!(config.validate().is_err());

        config.terminal.log_level = "debug".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_timeout() {
        let mut config = TerminalConfig::default();
        config.usb.timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_filters() {
        let mut config = TerminalConfig::default();
        config.usb.filters = vec!["0x1234:0x5678".to_string(), "*:*".to_string()];
        assert!(config.validate().is_ok());

        config.usb.filters.push("1234:5678".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("terminal.toml");

        let mut config = TerminalConfig::default();
        config.terminal.log_level = "debug".to_string();
        config.usb.timeout_ms = 250;
        config.usb.filters = vec!["0x1234:*".to_string()];
        config.save(&path).unwrap();

        let loaded = TerminalConfig::load(Some(path)).unwrap();
        assert_eq!(loaded.terminal.log_level, "debug");
        assert_eq!(loaded.usb.timeout_ms, 250);
        assert_eq!(loaded.usb.filters, vec!["0x1234:*".to_string()]);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("terminal.toml");
        fs::write(&path, "[terminal]\nlog_level = \"loud\"\n").unwrap();
        assert!(TerminalConfig::load(Some(path)).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        assert!(TerminalConfig::load(Some(dir.path().join("absent.toml"))).is_err());
    }
}
