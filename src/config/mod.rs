//! Configuration System for n3graph
//!
//! Provides a small configuration layer supporting:
//! - TOML configuration files
//! - Environment variable overrides
//! - Multiple config file locations
//!
//! # Configuration File Locations
//!
//! Configuration files are searched in order (first found wins):
//! 1. `./n3graph.toml` - Project-local configuration
//! 2. `~/.config/n3graph/config.toml` - User configuration (XDG)
//! 3. `~/.n3graph/config.toml` - User configuration (legacy)
//! 4. `/etc/n3graph/config.toml` - System-wide configuration
//!
//! # Environment Variables
//!
//! - `N3GRAPH_LOG_LEVEL` - Logging verbosity (quiet, normal, verbose, debug)
//! - `N3GRAPH_BLANK_PREFIX` - Prefix for minted blank node ids
//! - `N3GRAPH_AUTO_OPTIMISE` - Optimise update commands before evaluation (true/false)
//!
//! # Example Configuration
//!
//! ```toml
//! # n3graph.toml
//!
//! [general]
//! log_level = "verbose"
//!
//! [graph]
//! blank_node_prefix = "n"
//! default_prefixes = true
//!
//! [update]
//! auto_optimise = true
//!
//! [prefixes]
//! ex = "http://example.org/"
//! foaf = "http://xmlns.com/foaf/0.1/"
//! ```

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::NamespaceMap;
use crate::error::{Error, Result};

// ============================================================================
// Configuration Schema
// ============================================================================

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,
    /// Graph construction settings
    pub graph: GraphConfig,
    /// Update command settings
    pub update: UpdateConfig,
    /// Custom prefix definitions
    pub prefixes: BTreeMap<String, String>,
}

/// General configuration options
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct GeneralConfig {
    /// Logging level
    pub log_level: LogLevel,
}

/// Settings applied to every new graph
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GraphConfig {
    /// Prefix for minted blank node ids
    pub blank_node_prefix: String,
    /// Predefine rdf, rdfs, xsd and owl
    pub default_prefixes: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            blank_node_prefix: "b".to_string(),
            default_prefixes: true,
        }
    }
}

/// Update command settings
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct UpdateConfig {
    /// Call `optimise` before each evaluation
    pub auto_optimise: bool,
}

/// Log level options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Quiet,
    #[default]
    Normal,
    Verbose,
    Debug,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Verbose => "verbose",
            LogLevel::Debug => "debug",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "quiet" | "q" | "0" => Some(LogLevel::Quiet),
            "normal" | "n" | "1" => Some(LogLevel::Normal),
            "verbose" | "v" | "2" => Some(LogLevel::Verbose),
            "debug" | "d" | "3" => Some(LogLevel::Debug),
            _ => None,
        }
    }

    /// Directive for a tracing `EnvFilter`
    pub fn filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Quiet => "error",
            LogLevel::Normal => "warn",
            LogLevel::Verbose => "info",
            LogLevel::Debug => "debug",
        }
    }
}

// ============================================================================
// Configuration Loading
// ============================================================================

impl Config {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from default locations
    ///
    /// The first existing file from `config_paths` is read, then
    /// environment variable overrides are applied.
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        for path in Self::config_paths() {
            if path.exists() {
                config = Self::load_from_file(&path)?;
                break;
            }
        }

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::parse(&content, path)
    }

    /// Load configuration from a TOML string
    pub fn load_from_str(content: &str) -> Result<Self> {
        Self::parse(content, Path::new("<string>"))
    }

    fn parse(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Get the list of config file search paths
    pub fn config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // Project-local
        paths.push(PathBuf::from("./n3graph.toml"));

        // XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("n3graph").join("config.toml"));
        }

        // Legacy home directory
        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".n3graph").join("config.toml"));
        }

        // System-wide (Unix only)
        #[cfg(unix)]
        paths.push(PathBuf::from("/etc/n3graph/config.toml"));

        paths
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    /// Apply overrides from any key lookup
    ///
    /// Unparseable values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(level) = lookup("N3GRAPH_LOG_LEVEL").as_deref().and_then(LogLevel::from_str) {
            self.general.log_level = level;
        }

        if let Some(prefix) = lookup("N3GRAPH_BLANK_PREFIX") {
            if !prefix.is_empty() {
                self.graph.blank_node_prefix = prefix;
            }
        }

        if let Some(val) = lookup("N3GRAPH_AUTO_OPTIMISE") {
            match val.to_lowercase().as_str() {
                "true" | "1" | "yes" => self.update.auto_optimise = true,
                "false" | "0" | "no" => self.update.auto_optimise = false,
                _ => {}
            }
        }
    }

    /// Prefix map for new graphs
    pub fn namespaces(&self) -> NamespaceMap {
        let mut map = if self.graph.default_prefixes {
            NamespaceMap::with_defaults()
        } else {
            NamespaceMap::new()
        };
        for (prefix, uri) in &self.prefixes {
            map.add(prefix.clone(), uri.as_str());
        }
        map
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config {
            path: PathBuf::from("<string>"),
            message: e.to_string(),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::new();
        assert_eq!(config.general.log_level, LogLevel::Normal);
        assert_eq!(config.graph.blank_node_prefix, "b");
        assert!(config.graph.default_prefixes);
        assert!(!config.update.auto_optimise);
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
            [general]
            log_level = "verbose"

            [graph]
            blank_node_prefix = "n"
            default_prefixes = false

            [update]
            auto_optimise = true
        "#;

        let config = Config::load_from_str(toml).unwrap();
        assert_eq!(config.general.log_level, LogLevel::Verbose);
        assert_eq!(config.graph.blank_node_prefix, "n");
        assert!(!config.graph.default_prefixes);
        assert!(config.update.auto_optimise);
    }

    #[test]
    fn test_invalid_config() {
        let err = Config::load_from_str("[general\nlog_level = 1").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_log_level_from_str() {
        assert_eq!(LogLevel::from_str("quiet"), Some(LogLevel::Quiet));
        assert_eq!(LogLevel::from_str("V"), Some(LogLevel::Verbose));
        assert_eq!(LogLevel::from_str("debug"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::from_str("loud"), None);
        assert_eq!(LogLevel::Debug.filter_directive(), "debug");
    }

    #[test]
    fn test_overrides() {
        let mut config = Config::new();
        config.apply_overrides(|key| match key {
            "N3GRAPH_LOG_LEVEL" => Some("debug".into()),
            "N3GRAPH_BLANK_PREFIX" => Some("node".into()),
            "N3GRAPH_AUTO_OPTIMISE" => Some("yes".into()),
            _ => None,
        });
        assert_eq!(config.general.log_level, LogLevel::Debug);
        assert_eq!(config.graph.blank_node_prefix, "node");
        assert!(config.update.auto_optimise);

        config.apply_overrides(|key| match key {
            "N3GRAPH_AUTO_OPTIMISE" => Some("maybe".into()),
            _ => None,
        });
        assert!(config.update.auto_optimise);
    }

    #[test]
    fn test_prefixes() {
        let toml = r#"
            [prefixes]
            ex = "http://example.org/"
            foaf = "http://xmlns.com/foaf/0.1/"
        "#;

        let config = Config::load_from_str(toml).unwrap();
        let ns = config.namespaces();
        assert_eq!(ns.get("ex").unwrap().as_str(), "http://example.org/");
        assert_eq!(ns.get("foaf").unwrap().as_str(), "http://xmlns.com/foaf/0.1/");
        assert!(ns.has_prefix("rdf"));
    }

    #[test]
    fn test_serialize_config() {
        let mut config = Config::new();
        config.prefixes.insert("ex".into(), "http://example.org/".into());
        let toml = config.to_toml().unwrap();
        let back = Config::load_from_str(&toml).unwrap();
        assert_eq!(back, config);
    }
}
