//! Character dictionary: single character to ASCII replacement

use crate::error::{RenameError, RenameResult};
use pinyin::ToPinyin;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

/// Immutable lookup table loaded once per run and passed to every operation.
///
/// An empty value means "delete this character".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharacterMap {
    entries: HashMap<char, String>,
}

impl CharacterMap {
    /// Load a dictionary file.
    ///
    /// A missing file yields an empty map and a warning; use
    /// [`CharacterMap::ensure_usable`] where a dictionary is required.
    pub fn load(path: &Path) -> RenameResult<Self> {
        if !path.exists() {
            tracing::warn!("dictionary file does not exist: {}", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            RenameError::Dictionary(format!("failed to read {}: {}", path.display(), e))
        })?;
        let map = Self::from_json_str(&content).map_err(|e| match e {
            RenameError::Dictionary(msg) => {
                RenameError::Dictionary(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })?;

        tracing::info!(
            "loaded dictionary {} ({} characters)",
            path.display(),
            map.len()
        );
        Ok(map)
    }

    pub fn from_json_str(content: &str) -> RenameResult<Self> {
        let raw: BTreeMap<String, String> = serde_json::from_str(content)
            .map_err(|e| RenameError::Dictionary(format!("invalid dictionary JSON: {}", e)))?;

        let mut entries = HashMap::with_capacity(raw.len());
        for (key, value) in raw {
            let mut chars = key.chars();
            match (chars.next(), chars.next()) {
                (Some(ch), None) => {
                    entries.insert(ch, value);
                }
                _ => {
                    return Err(RenameError::Dictionary(format!(
                        "key {:?} must be exactly one character",
                        key
                    )))
                }
            }
        }

        Ok(Self { entries })
    }

    /// Fail unless the dictionary has at least one entry.
    pub fn ensure_usable(&self, source: &Path) -> RenameResult<()> {
        if self.entries.is_empty() {
            return Err(RenameError::Dictionary(format!(
                "dictionary {} is empty or missing, prepare it before renaming",
                source.display()
            )));
        }
        Ok(())
    }

    pub fn get(&self, ch: char) -> Option<&str> {
        self.entries.get(&ch).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(char, S)> for CharacterMap {
    fn from_iter<I: IntoIterator<Item = (char, S)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k, v.into())).collect(),
        }
    }
}

/// Toneless reading to pre-fill the missing characters file.
pub fn suggest_pinyin(ch: char) -> Option<&'static str> {
    ch.to_pinyin().map(|p| p.plain())
}
