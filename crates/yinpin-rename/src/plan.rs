//! Rename mappings and relative path helpers
//!
//! All relative paths are `/`-separated strings, independent of the host
//! separator, so mappings can be saved on one machine and replayed on another.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};

/// Old relative path to new relative path
pub type RenameMap = BTreeMap<String, String>;

/// One rename, ordered by the depth of its old path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameEntry {
    pub old: String,
    pub new: String,
}

impl RenameEntry {
    pub fn new(old: impl Into<String>, new: impl Into<String>) -> Self {
        Self {
            old: old.into(),
            new: new.into(),
        }
    }

    pub fn depth(&self) -> usize {
        depth(&self.old)
    }
}

/// Entries deepest first, ties broken by path so the order is reproducible.
pub fn entries_by_depth(map: &RenameMap) -> Vec<RenameEntry> {
    let mut entries: Vec<RenameEntry> = map
        .iter()
        .map(|(old, new)| RenameEntry::new(old.as_str(), new.as_str()))
        .collect();
    entries.sort_by(|a, b| b.depth().cmp(&a.depth()).then_with(|| a.old.cmp(&b.old)));
    entries
}

/// The persisted `rename_mapping.json` document.
///
/// Folder values keep the old parent and carry only the new leaf name, which
/// is what a deepest-first rename sees on disk. File values are fully
/// translated through every ancestor folder rename.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameMapping {
    #[serde(default)]
    pub files: RenameMap,

    #[serde(default)]
    pub folders: RenameMap,
}

impl RenameMapping {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.folders.is_empty()
    }

    /// Merge another mapping into this one (other takes precedence)
    pub fn merge(&mut self, other: RenameMapping) {
        self.files.extend(other.files);
        self.folders.extend(other.folders);
    }

    pub fn translator(&self) -> PathTranslator<'_> {
        PathTranslator::new(&self.folders)
    }

    /// File renames keyed by where each file sits once folders are renamed.
    pub fn staged_files(&self) -> RenameMap {
        let translator = self.translator();
        self.files
            .iter()
            .map(|(old, new)| (staged_path(&translator, old), new.clone()))
            .collect()
    }

    /// The renames that actually happened, given what each pass reported as
    /// renamed. File entries are matched by their staged path.
    pub fn completed(&self, folders: &[RenameEntry], files: &[RenameEntry]) -> RenameMapping {
        let done_folders: BTreeSet<&str> = folders.iter().map(|e| e.old.as_str()).collect();
        let done_files: BTreeSet<&str> = files.iter().map(|e| e.old.as_str()).collect();
        let translator = self.translator();

        RenameMapping {
            files: self
                .files
                .iter()
                .filter(|(old, _)| done_files.contains(staged_path(&translator, old).as_str()))
                .map(|(old, new)| (old.clone(), new.clone()))
                .collect(),
            folders: self
                .folders
                .iter()
                .filter(|(old, _)| done_folders.contains(old.as_str()))
                .map(|(old, new)| (old.clone(), new.clone()))
                .collect(),
        }
    }
}

fn staged_path(translator: &PathTranslator<'_>, old: &str) -> String {
    join(parent(old).map(|p| translator.translate(p)).as_deref(), leaf(old))
}

/// Applies folder renames to every ancestor segment of a path.
pub struct PathTranslator<'a> {
    folders: &'a RenameMap,
}

impl<'a> PathTranslator<'a> {
    pub fn new(folders: &'a RenameMap) -> Self {
        Self { folders }
    }

    /// `A/B/c.mp3` with folders `{A: a, A/B: A/b}` becomes `a/b/c.mp3`.
    ///
    /// Segments are looked up by their old prefix, so a path that is already
    /// translated, or only partly translated, comes out fully translated.
    pub fn translate(&self, path: &str) -> String {
        let mut old_prefix = String::with_capacity(path.len());
        let mut segments = Vec::new();

        for (i, segment) in path.split('/').enumerate() {
            if i > 0 {
                old_prefix.push('/');
            }
            old_prefix.push_str(segment);

            match self.folders.get(&old_prefix) {
                Some(renamed) => segments.push(leaf(renamed)),
                None => segments.push(segment),
            }
        }

        segments.join("/")
    }
}

/// Count of `/` separators
pub fn depth(path: &str) -> usize {
    path.matches('/').count()
}

pub fn leaf(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

pub fn parent(path: &str) -> Option<&str> {
    path.rfind('/').map(|idx| &path[..idx])
}

pub fn join(parent: Option<&str>, name: &str) -> String {
    match parent {
        Some(p) if !p.is_empty() => format!("{}/{}", p, name),
        _ => name.to_string(),
    }
}

/// `/`-separated form of a path relative to its scan root
pub fn to_relative_string(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Native path for a `/`-separated relative path under `root`
pub fn to_native(root: &Path, relative: &str) -> PathBuf {
    relative
        .split('/')
        .filter(|s| !s.is_empty())
        .fold(root.to_path_buf(), |acc, s| acc.join(s))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folders() -> RenameMap {
        [
            ("夏夜".to_string(), "xiaye".to_string()),
            ("夏夜/店长".to_string(), "夏夜/dianzhang".to_string()),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_translate_cascades_through_ancestors() {
        let folders = folders();
        let translator = PathTranslator::new(&folders);

        assert_eq!(translator.translate("夏夜/店长/a.mp3"), "xiaye/dianzhang/a.mp3");
        assert_eq!(translator.translate("夏夜/店长"), "xiaye/dianzhang");
        assert_eq!(translator.translate("夏夜/other"), "xiaye/other");
        assert_eq!(translator.translate("bgm/店长"), "bgm/店长");
    }

    #[test]
    fn test_translate_partial_path() {
        let folders = folders();
        let translator = PathTranslator::new(&folders);

        assert_eq!(translator.translate("夏夜/dianzhang/a.mp3"), "xiaye/dianzhang/a.mp3");
        assert_eq!(translator.translate("xiaye/dianzhang/a.mp3"), "xiaye/dianzhang/a.mp3");
    }

    #[test]
    fn test_staged_files() {
        let mapping = RenameMapping {
            files: [(
                "夏夜/店长/开始.mp3".to_string(),
                "xiaye/dianzhang/kaishi.mp3".to_string(),
            )]
            .into_iter()
            .collect(),
            folders: folders(),
        };

        let staged = mapping.staged_files();
        assert_eq!(
            staged.get("xiaye/dianzhang/开始.mp3").map(String::as_str),
            Some("xiaye/dianzhang/kaishi.mp3")
        );
    }

    #[test]
    fn test_completed_keeps_only_reported_renames() {
        let mapping = RenameMapping {
            files: [
                ("夏夜/店长/开始.mp3".to_string(), "xiaye/dianzhang/kaishi.mp3".to_string()),
                ("店长.mp3".to_string(), "dianzhang.mp3".to_string()),
            ]
            .into_iter()
            .collect(),
            folders: folders(),
        };

        let done = mapping.completed(
            &[RenameEntry::new("夏夜/店长", "夏夜/dianzhang")],
            &[RenameEntry::new("xiaye/dianzhang/开始.mp3", "xiaye/dianzhang/kaishi.mp3")],
        );

        assert_eq!(done.folders.keys().collect::<Vec<_>>(), vec!["夏夜/店长"]);
        assert_eq!(done.files.keys().collect::<Vec<_>>(), vec!["夏夜/店长/开始.mp3"]);
    }

    #[test]
    fn test_entries_by_depth() {
        let map: RenameMap = [
            ("a".to_string(), "A".to_string()),
            ("a/b/c".to_string(), "a/b/C".to_string()),
            ("a/b".to_string(), "a/B".to_string()),
            ("z/y".to_string(), "z/Y".to_string()),
        ]
        .into_iter()
        .collect();

        let order: Vec<String> = entries_by_depth(&map).into_iter().map(|e| e.old).collect();
        assert_eq!(order, vec!["a/b/c", "a/b", "z/y", "a"]);
    }

    #[test]
    fn test_path_helpers() {
        assert_eq!(depth("a/b/c.mp3"), 2);
        assert_eq!(leaf("a/b/c.mp3"), "c.mp3");
        assert_eq!(parent("a/b/c.mp3"), Some("a/b"));
        assert_eq!(parent("c.mp3"), None);
        assert_eq!(join(Some("a"), "b"), "a/b");
        assert_eq!(join(None, "b"), "b");
        assert_eq!(to_relative_string(Path::new("a").join("b").as_path()), "a/b");
        assert_eq!(to_native(Path::new("root"), "a/b"), Path::new("root").join("a").join("b"));
    }

    #[test]
    fn test_mapping_json_shape() {
        let json = r#"{"files": {"店长.flac": "dianzhang.flac"}, "folders": {}}"#;
        let mapping: RenameMapping = serde_json::from_str(json).unwrap();
        assert_eq!(mapping.files.len(), 1);
        assert!(mapping.folders.is_empty());

        let partial: RenameMapping = serde_json::from_str(r#"{"files": {}}"#).unwrap();
        assert!(partial.is_empty());
    }
}
