//! Configuration management for yinpin
//!
//! Supports feature-specific configuration sections:
//! - [rename] - dictionary, mapping and script rewrite settings

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Current configuration version
pub const CURRENT_CONFIG_VERSION: &str = "1";

/// Supported configuration versions
pub const SUPPORTED_CONFIG_VERSIONS: &[&str] = &["1"];

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Configuration version for tracking schema changes
    #[serde(default = "default_config_version")]
    pub version: String,

    /// Rename workflow configuration
    #[serde(default)]
    pub rename: Option<RenameConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_config_version(),
            rename: None,
        }
    }
}

/// Configuration for the rename workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameConfig {
    /// JSON object mapping single characters to their replacement
    #[serde(default = "default_dictionary_file")]
    pub dictionary_file: String,

    /// `{"files": {...}, "folders": {...}}` written after a scan
    #[serde(default = "default_mapping_file")]
    pub mapping_file: String,

    /// Operator log, also parsed back by `fix-refs --from-log`
    #[serde(default = "default_log_file")]
    pub log_file: String,

    #[serde(default = "default_missing_chars_file")]
    pub missing_chars_file: String,

    /// Reviewable per-line script edits
    #[serde(default = "default_edits_file")]
    pub edits_file: String,

    #[serde(default = "default_audio_extensions")]
    pub audio_extensions: Vec<String>,

    #[serde(default = "default_script_extension")]
    pub script_extension: String,

    /// Directory prefixes a script may put in front of a relative asset path
    #[serde(default = "default_reference_prefixes")]
    pub reference_prefixes: Vec<String>,

    /// Asset roots scanned by `run`, relative to the game directory
    #[serde(default = "default_audio_roots")]
    pub audio_roots: Vec<String>,

    #[serde(default)]
    pub lossy_rewrite: LossyRewriteConfig,
}

impl Default for RenameConfig {
    fn default() -> Self {
        Self {
            dictionary_file: default_dictionary_file(),
            mapping_file: default_mapping_file(),
            log_file: default_log_file(),
            missing_chars_file: default_missing_chars_file(),
            edits_file: default_edits_file(),
            audio_extensions: default_audio_extensions(),
            script_extension: default_script_extension(),
            reference_prefixes: default_reference_prefixes(),
            audio_roots: default_audio_roots(),
            lossy_rewrite: LossyRewriteConfig::default(),
        }
    }
}

/// Extension swap scripts may have applied when an asset was re-encoded.
/// An empty `from` disables the variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LossyRewriteConfig {
    #[serde(default = "default_lossy_from")]
    pub from: String,

    #[serde(default = "default_lossy_to")]
    pub to: String,
}

impl Default for LossyRewriteConfig {
    fn default() -> Self {
        Self {
            from: default_lossy_from(),
            to: default_lossy_to(),
        }
    }
}

// Default value functions for root Config
fn default_config_version() -> String {
    CURRENT_CONFIG_VERSION.to_string()
}

// Default value functions for Rename
fn default_dictionary_file() -> String {
    "chinese_dictionary.json".to_string()
}

fn default_mapping_file() -> String {
    "rename_mapping.json".to_string()
}

fn default_log_file() -> String {
    "rename_log.txt".to_string()
}

fn default_missing_chars_file() -> String {
    "missing_characters.json".to_string()
}

fn default_edits_file() -> String {
    "rpy_update_mapping.json".to_string()
}

fn default_audio_extensions() -> Vec<String> {
    ["mp3", "flac", "wav", "ogg"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_script_extension() -> String {
    "rpy".to_string()
}

fn default_reference_prefixes() -> Vec<String> {
    vec!["audio/".to_string(), "sound/".to_string()]
}

fn default_audio_roots() -> Vec<String> {
    vec!["audio".to_string(), "sound".to_string()]
}

fn default_lossy_from() -> String {
    ".flac".to_string()
}

fn default_lossy_to() -> String {
    ".mp3".to_string()
}

/// Config home directory, respecting `XDG_CONFIG_HOME`
pub fn get_config_home() -> Option<PathBuf> {
    match std::env::var_os("XDG_CONFIG_HOME") {
        Some(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => dirs::home_dir().map(|h| h.join(".config")),
    }
}

impl Config {
    /// Check if the configuration version is supported
    pub fn is_version_supported(&self) -> bool {
        SUPPORTED_CONFIG_VERSIONS.contains(&self.version.as_str())
    }

    /// Get a warning message for unsupported versions
    pub fn version_warning(&self) -> Option<String> {
        if !self.is_version_supported() {
            Some(format!(
                "Configuration version '{}' is not supported. Supported versions: {}. Using defaults where needed.",
                self.version,
                SUPPORTED_CONFIG_VERSIONS.join(", ")
            ))
        } else {
            None
        }
    }

    /// Parse a configuration document, warning on unsupported versions
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        let mut config: Config = toml::from_str(content)?;

        if let Some(warning) = config.version_warning() {
            tracing::warn!("{}", warning);
        }

        if config.version.is_empty() {
            config.version = CURRENT_CONFIG_VERSION.to_string();
        }

        Ok(config)
    }

    /// Get the default config directory path
    pub fn get_config_dir() -> Option<PathBuf> {
        get_config_home().map(|h| h.join("yinpin"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.version, "1");
        assert!(config.rename.is_none());
    }

    #[test]
    fn test_config_version_validation() {
        let config = Config {
            version: "1".to_string(),
            rename: None,
        };
        assert!(config.is_version_supported());
        assert!(config.version_warning().is_none());

        let unsupported_config = Config {
            version: "999".to_string(),
            rename: None,
        };
        assert!(!unsupported_config.is_version_supported());
        assert!(unsupported_config.version_warning().is_some());
    }

    #[test]
    fn test_rename_config_defaults() {
        let rename = RenameConfig::default();
        assert_eq!(rename.dictionary_file, "chinese_dictionary.json");
        assert_eq!(rename.script_extension, "rpy");
        assert_eq!(rename.audio_extensions, vec!["mp3", "flac", "wav", "ogg"]);
        assert_eq!(rename.reference_prefixes, vec!["audio/", "sound/"]);
        assert_eq!(rename.lossy_rewrite.from, ".flac");
        assert_eq!(rename.lossy_rewrite.to, ".mp3");
    }

    #[test]
    fn test_parse_config_with_rename_section() {
        let toml_str = r#"
version = "1"

[rename]
dictionary_file = "dict/zh.json"
audio_extensions = ["ogg"]

[rename.lossy_rewrite]
from = ""
"#;

        let config = Config::from_toml_str(toml_str).unwrap();
        assert!(config.is_version_supported());

        let rename = config.rename.unwrap();
        assert_eq!(rename.dictionary_file, "dict/zh.json");
        assert_eq!(rename.audio_extensions, vec!["ogg"]);
        assert_eq!(rename.mapping_file, "rename_mapping.json");
        assert_eq!(rename.lossy_rewrite.from, "");
        assert_eq!(rename.lossy_rewrite.to, ".mp3");
    }
}
