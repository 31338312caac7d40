use crate::cli::RenameArgs;
use crate::error::{RenameError, RenameResult};
use crate::rewrite::ReferenceStyle;
use std::fs;
use std::path::{Path, PathBuf};

/// Resolved settings for one invocation
#[derive(Debug, Clone)]
pub struct Config {
    pub dictionary_file: PathBuf,
    pub mapping_file: PathBuf,
    pub log_file: PathBuf,
    pub missing_chars_file: PathBuf,
    pub edits_file: PathBuf,
    pub audio_extensions: Vec<String>,
    pub script_extension: String,
    pub reference_prefixes: Vec<String>,
    pub audio_roots: Vec<String>,
    pub lossy_from: String,
    pub lossy_to: String,
}

impl From<yinpin_core::RenameConfig> for Config {
    fn from(other: yinpin_core::RenameConfig) -> Self {
        Self {
            dictionary_file: PathBuf::from(expand_path(&other.dictionary_file)),
            mapping_file: PathBuf::from(expand_path(&other.mapping_file)),
            log_file: PathBuf::from(expand_path(&other.log_file)),
            missing_chars_file: PathBuf::from(expand_path(&other.missing_chars_file)),
            edits_file: PathBuf::from(expand_path(&other.edits_file)),
            audio_extensions: other.audio_extensions,
            script_extension: other.script_extension,
            reference_prefixes: other.reference_prefixes,
            audio_roots: other.audio_roots,
            lossy_from: other.lossy_rewrite.from,
            lossy_to: other.lossy_rewrite.to,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        yinpin_core::RenameConfig::default().into()
    }
}

impl Config {
    /// Load configuration with priority:
    /// 1. Defaults
    /// 2. Global config
    /// 3. Repo config
    /// 4. Custom config file
    /// 5. CLI arguments (including their environment variables)
    pub fn load(cli_config: Option<&str>, cli_overrides: &RenameArgs) -> RenameResult<Self> {
        let mut config = Self::default();

        if let Some(config_dir) = yinpin_core::Config::get_config_dir() {
            let global_config = config_dir.join("config.toml");
            if global_config.exists() {
                config = Self::from_file(&global_config)?;
            }
        }

        let repo_config = Path::new(".yinpin.toml");
        if repo_config.exists() {
            config = Self::from_file(repo_config)?;
        }

        if let Some(custom_config) = cli_config {
            let custom_path = expand_path(custom_config);
            config = Self::from_file(Path::new(&custom_path))?;
        }

        if let Some(ref dictionary) = cli_overrides.dictionary {
            config.dictionary_file = PathBuf::from(expand_path(dictionary));
        }
        if let Some(ref log_file) = cli_overrides.log_file {
            config.log_file = PathBuf::from(expand_path(log_file));
        }
        if let Some(ref mapping_file) = cli_overrides.mapping_file {
            config.mapping_file = PathBuf::from(expand_path(mapping_file));
        }

        Ok(config)
    }

    /// Whole `[rename]` section of `path`; fields it omits fall back to defaults.
    fn from_file(path: &Path) -> RenameResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            RenameError::Config(format!(
                "Failed to read config from {}: {}",
                path.display(),
                e
            ))
        })?;

        let root_config = yinpin_core::Config::from_toml_str(&content).map_err(|e| {
            RenameError::Config(format!(
                "Failed to parse config from {}: {}",
                path.display(),
                e
            ))
        })?;

        let rename_config = root_config.rename.ok_or_else(|| {
            RenameError::Config(format!(
                "No [rename] section found in config file: {}",
                path.display()
            ))
        })?;

        Ok(rename_config.into())
    }

    pub fn reference_style(&self) -> ReferenceStyle {
        ReferenceStyle {
            prefixes: self.reference_prefixes.clone(),
            lossy_from: self.lossy_from.clone(),
            lossy_to: self.lossy_to.clone(),
        }
    }
}

/// Expand tilde and environment variables in paths
pub fn expand_path(path: &str) -> String {
    let mut expanded = path.to_string();

    if expanded.starts_with("~/") {
        if let Some(home) = dirs::home_dir() {
            expanded = expanded.replacen("~/", &format!("{}/", home.display()), 1);
        }
    } else if expanded == "~" {
        if let Some(home) = dirs::home_dir() {
            expanded = home.to_string_lossy().to_string();
        }
    }

    if expanded.contains('$') {
        if let Ok(re) = regex::Regex::new(r"\$([A-Z_][A-Z0-9_]*)") {
            expanded = re
                .replace_all(&expanded, |caps: &regex::Captures| {
                    let var_name = &caps[1];
                    std::env::var(var_name).unwrap_or_else(|_| format!("${}", var_name))
                })
                .to_string();
        }
    }

    expanded
}
