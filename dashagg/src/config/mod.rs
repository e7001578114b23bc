//! Configuration management for dashagg
//!
//! Default config location: ~/.dashagg/config.toml

use crate::catalog::{Catalog, CatalogLoader};
use crate::query::{empty_bool_query, ExtendedBounds};
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub compiler: CompilerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct CatalogConfig {
    /// YAML catalog file; the built-in catalog is used when unset
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CompilerConfig {
    /// Bucket count for top-values entries without `terms_size` or `size`
    #[serde(default = "default_terms_size")]
    pub default_terms_size: u64,
    /// Time zone for date histograms without `timeZone`; empty leaves it to the store
    #[serde(default = "default_time_zone")]
    pub default_time_zone: String,
    /// Applied to date histograms when the caller gives no bounds
    #[serde(default)]
    pub extended_bounds: Option<ExtendedBounds>,
    /// Query clause for requests when the caller gives none
    #[serde(default)]
    pub query: Option<Value>,
}

fn default_terms_size() -> u64 {
    5
}

fn default_time_zone() -> String {
    "Asia/Calcutta".to_string()
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            default_terms_size: default_terms_size(),
            default_time_zone: default_time_zone(),
            extended_bounds: None,
            query: None,
        }
    }
}

impl CompilerConfig {
    pub fn time_zone(&self) -> Option<&str> {
        Some(self.default_time_zone.as_str()).filter(|tz| !tz.is_empty())
    }

    /// The configured default query, else an empty bool query
    pub fn default_query(&self) -> Value {
        self.query.clone().unwrap_or_else(empty_bool_query)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    pub file: Option<PathBuf>,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log output format: "pretty" or "json"
    /// Override with LOG_FORMAT env var
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: default_log_format(),
        }
    }
}

/// Default config file (~/.dashagg/config.toml)
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".dashagg")
        .join("config.toml")
}

/// Expand ~ to home directory in path
pub fn expand_tilde(path: &Path) -> Result<PathBuf> {
    let s = path.to_string_lossy();
    if let Some(rest) = s.strip_prefix("~/") {
        let home = dirs::home_dir().ok_or_else(|| anyhow!("Cannot determine home directory"))?;
        Ok(home.join(rest))
    } else if s == "~" {
        dirs::home_dir().ok_or_else(|| anyhow!("Cannot determine home directory"))
    } else {
        Ok(path.to_path_buf())
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(s)?;
        config.expand_paths()?;
        Ok(config)
    }

    /// Load config from file path, or fall back to defaults when it does not exist
    pub fn load_or_default(config_path: &Path) -> Result<Self> {
        let config_path = expand_tilde(config_path)?;
        if config_path.exists() {
            let content = fs::read_to_string(&config_path)?;
            let config = Self::from_toml_str(&content)?;
            tracing::debug!(path = %config_path.display(), "Loaded config");
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    /// Load the configured catalog file, or the built-in catalog
    pub fn load_catalog(&self) -> Result<Catalog> {
        match &self.catalog.path {
            Some(path) => Ok(CatalogLoader::new(path).load()?),
            None => Ok(Catalog::builtin()?),
        }
    }

    /// Expand ~ in all paths
    fn expand_paths(&mut self) -> Result<()> {
        if let Some(ref p) = self.catalog.path {
            self.catalog.path = Some(expand_tilde(p)?);
        }
        if let Some(ref f) = self.logging.file {
            self.logging.file = Some(expand_tilde(f)?);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.compiler.default_terms_size, 5);
        assert_eq!(
            config.compiler.time_zone(),
            Some("Asia/Calcutta")
        );
        assert!(config.compiler.extended_bounds.is_none());
        assert!(config.catalog.path.is_none());
        assert_eq!(config.observability.log_format, "pretty");
    }

    #[test]
    fn test_partial_toml() {
        let config = Config::from_toml_str(
            r#"
[compiler]
default_terms_size = 10
extended_bounds = { min = 1725647400000, max = 1725820199999 }

[logging]
level = "debug"
"#,
        )
        .unwrap();

        assert_eq!(config.compiler.default_terms_size, 10);
        assert_eq!(
            config.compiler.time_zone(),
            Some("Asia/Calcutta")
        );
        assert_eq!(
            config.compiler.extended_bounds,
            Some(ExtendedBounds {
                min: 1725647400000,
                max: 1725820199999
            })
        );
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_empty_time_zone_disables_fallback() {
        let config = Config::from_toml_str("[compiler]\ndefault_time_zone = \"\"\n").unwrap();
        assert_eq!(config.compiler.default_time_zone, "");
        assert!(config.compiler.time_zone().is_none());
    }

    #[test]
    fn test_default_query_is_empty_bool() {
        let config = CompilerConfig::default();
        assert_eq!(config.default_query(), empty_bool_query());
    }

    #[test]
    fn test_expand_tilde() {
        let plain = Path::new("/etc/dashagg/catalog.yaml");
        assert_eq!(expand_tilde(plain).unwrap(), plain);

        if let Some(home) = dirs::home_dir() {
            assert_eq!(
                expand_tilde(Path::new("~/catalog.yaml")).unwrap(),
                home.join("catalog.yaml")
            );
        }
    }

    #[test]
    fn test_builtin_catalog_when_unset() {
        let catalog = Config::default().load_catalog().unwrap();
        assert!(catalog.module_type("line_chart").is_some());
    }
}
