//! JSON and log documents shared between runs

use crate::dictionary::suggest_pinyin;
use crate::error::RenameResult;
use crate::plan::{RenameMap, RenameMapping};
use crate::rewrite::{ReferenceEdit, ScriptEdits};
use crate::scan::{FILE_TAG, FOLDER_TAG};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Marker older preview logs put in front of discovery lines
pub const PREVIEW_MARKER: &str = "[预览] ";

pub fn save_mapping(path: &Path, mapping: &RenameMapping) -> RenameResult<()> {
    let content = serde_json::to_string_pretty(mapping)?;
    fs::write(path, content)?;
    Ok(())
}

/// Missing file is a warning and an empty mapping.
pub fn load_mapping(path: &Path) -> RenameResult<RenameMapping> {
    if !path.exists() {
        tracing::warn!("mapping file not found: {}", path.display());
        return Ok(RenameMapping::default());
    }
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Rebuild a mapping from operator log text.
///
/// Only `文件: old -> new` and `文件夹: old -> new` lines count, optionally
/// behind the preview marker. Everything else is ignored.
pub fn parse_rename_log(text: &str) -> RenameMapping {
    let mut mapping = RenameMapping::default();

    for line in text.lines() {
        let line = line.trim();
        let line = line.strip_prefix(PREVIEW_MARKER).unwrap_or(line);

        let (map, rest): (&mut RenameMap, &str) = if let Some(rest) = line.strip_prefix(FOLDER_TAG)
        {
            (&mut mapping.folders, rest)
        } else if let Some(rest) = line.strip_prefix(FILE_TAG) {
            (&mut mapping.files, rest)
        } else {
            continue;
        };

        let parts: Vec<&str> = rest.split(" -> ").collect();
        if let [old, new] = parts.as_slice() {
            let (old, new) = (old.trim(), new.trim());
            if !old.is_empty() && !new.is_empty() {
                map.insert(old.to_string(), new.to_string());
            }
        }
    }

    mapping
}

/// Missing file is a warning and an empty mapping.
pub fn load_rename_log(path: &Path) -> RenameResult<RenameMapping> {
    if !path.exists() {
        tracing::warn!("rename log not found: {}", path.display());
        return Ok(RenameMapping::default());
    }
    let content = fs::read_to_string(path)?;
    Ok(parse_rename_log(&content))
}

/// Write every unknown character with a suggested reading for review.
pub fn write_missing_characters(path: &Path, unknown: &BTreeSet<char>) -> RenameResult<()> {
    let entries: BTreeMap<String, String> = unknown
        .iter()
        .map(|ch| {
            (
                ch.to_string(),
                suggest_pinyin(*ch).unwrap_or_default().to_string(),
            )
        })
        .collect();
    fs::write(path, serde_json::to_string_pretty(&entries)?)?;
    Ok(())
}

pub fn save_edits(path: &Path, found: &[ScriptEdits]) -> RenameResult<()> {
    let document = crate::rewrite::edits_by_file(found);
    fs::write(path, serde_json::to_string_pretty(&document)?)?;
    Ok(())
}

pub fn load_edits(path: &Path) -> RenameResult<Vec<ScriptEdits>> {
    let content = fs::read_to_string(path)?;
    let document: BTreeMap<String, Vec<ReferenceEdit>> = serde_json::from_str(&content)?;

    Ok(document
        .into_iter()
        .map(|(file, mut edits)| {
            let path = PathBuf::from(file);
            for edit in &mut edits {
                edit.file = path.clone();
            }
            ScriptEdits { path, edits }
        })
        .collect())
}
