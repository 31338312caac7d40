//! Applies rename maps deepest path first

use crate::oplog::OperatorLog;
use crate::plan::{entries_by_depth, to_native, RenameEntry, RenameMap, RenameMapping};
use std::fs;
use std::io;
use std::path::Path;

/// Filesystem primitives used by the sequencer
pub trait FsOps {
    fn exists(&self, path: &Path) -> bool;
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
}

/// The real filesystem
pub struct StdFs;

impl FsOps for StdFs {
    fn exists(&self, path: &Path) -> bool {
        // symlink_metadata so a dangling link still counts as occupied
        fs::symlink_metadata(path).is_ok()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Folder,
}

impl EntryKind {
    pub fn as_str(&self) -> &str {
        match self {
            EntryKind::File => "file",
            EntryKind::Folder => "folder",
        }
    }
}

#[derive(Debug, Default)]
pub struct RenameOutcome {
    pub renamed: Vec<RenameEntry>,
    pub previewed: Vec<RenameEntry>,
    pub missing: Vec<RenameEntry>,
    pub occupied: Vec<RenameEntry>,
    pub failed: Vec<(RenameEntry, String)>,
}

impl RenameOutcome {
    pub fn problems(&self) -> usize {
        self.missing.len() + self.occupied.len() + self.failed.len()
    }
}

/// Apply one map under `root`.
///
/// Without `commit` nothing is touched and each rename is only logged.
/// Per-entry failures are logged and skipped; the rest of the batch still runs.
pub fn apply_renames(
    root: &Path,
    map: &RenameMap,
    kind: EntryKind,
    commit: bool,
    fs: &dyn FsOps,
    log: &mut OperatorLog,
) -> RenameOutcome {
    let mut outcome = RenameOutcome::default();

    for entry in entries_by_depth(map) {
        if entry.old == entry.new {
            continue;
        }

        if !commit {
            log.quiet(format!(
                "[preview] would rename {}: {} -> {}",
                kind.as_str(),
                entry.old,
                entry.new
            ));
            outcome.previewed.push(entry);
            continue;
        }

        let source = to_native(root, &entry.old);
        let target = to_native(root, &entry.new);

        if !fs.exists(&source) {
            log.warn(format!("{} does not exist: {}", kind.as_str(), source.display()));
            outcome.missing.push(entry);
            continue;
        }
        if fs.exists(&target) {
            log.warn(format!(
                "target already exists, not renaming {}: {} -> {}",
                kind.as_str(),
                entry.old,
                entry.new
            ));
            outcome.occupied.push(entry);
            continue;
        }

        let result = match target.parent() {
            Some(parent) => fs.create_dir_all(parent),
            None => Ok(()),
        }
        .and_then(|_| fs.rename(&source, &target));

        match result {
            Ok(()) => {
                log.line(format!("renamed {}: {} -> {}", kind.as_str(), entry.old, entry.new));
                outcome.renamed.push(entry);
            }
            Err(e) => {
                log.error(format!(
                    "failed to rename {} {} -> {}: {}",
                    kind.as_str(),
                    source.display(),
                    target.display(),
                    e
                ));
                outcome.failed.push((entry, e.to_string()));
            }
        }
    }

    outcome
}

/// Folders first, deepest first, then files from their post-folder-rename
/// location.
pub fn apply_mapping(
    root: &Path,
    mapping: &RenameMapping,
    commit: bool,
    fs: &dyn FsOps,
    log: &mut OperatorLog,
) -> (RenameOutcome, RenameOutcome) {
    let folders = apply_renames(root, &mapping.folders, EntryKind::Folder, commit, fs, log);
    let files = apply_renames(
        root,
        &mapping.staged_files(),
        EntryKind::File,
        commit,
        fs,
        log,
    );
    (folders, files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::BTreeSet;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// In-memory tree that records every rename in call order
    #[derive(Default)]
    struct RecordingFs {
        paths: RefCell<BTreeSet<PathBuf>>,
        renames: RefCell<Vec<(PathBuf, PathBuf)>>,
    }

    impl RecordingFs {
        fn with(paths: &[&str]) -> Self {
            let fs = Self::default();
            for p in paths {
                fs.paths.borrow_mut().insert(to_native(Path::new("/r"), p));
            }
            fs
        }
    }

    impl FsOps for RecordingFs {
        fn exists(&self, path: &Path) -> bool {
            self.paths.borrow().contains(path)
        }

        fn create_dir_all(&self, _path: &Path) -> io::Result<()> {
            Ok(())
        }

        fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
            let mut paths = self.paths.borrow_mut();
            let moved: Vec<PathBuf> = paths.iter().filter(|p| p.starts_with(from)).cloned().collect();
            for p in moved {
                paths.remove(&p);
                let rest = p.strip_prefix(from).unwrap();
                paths.insert(if rest.as_os_str().is_empty() {
                    to.to_path_buf()
                } else {
                    to.join(rest)
                });
            }
            self.renames.borrow_mut().push((from.to_path_buf(), to.to_path_buf()));
            Ok(())
        }
    }

    fn map(pairs: &[(&str, &str)]) -> RenameMap {
        pairs
            .iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect()
    }

    #[test]
    fn test_child_renamed_before_parent() {
        let fs = RecordingFs::with(&["夏夜", "夏夜/店长"]);
        let folders = map(&[("夏夜", "xiaye"), ("夏夜/店长", "夏夜/dianzhang")]);
        let mut log = OperatorLog::in_memory();

        let outcome = apply_renames(Path::new("/r"), &folders, EntryKind::Folder, true, &fs, &mut log);

        assert_eq!(outcome.renamed.len(), 2);
        let renames = fs.renames.borrow();
        assert_eq!(renames[0].0, to_native(Path::new("/r"), "夏夜/店长"));
        assert_eq!(renames[1].0, to_native(Path::new("/r"), "夏夜"));
        assert!(fs.exists(&to_native(Path::new("/r"), "xiaye/dianzhang")));
    }

    #[test]
    fn test_preview_does_not_touch_fs() {
        let fs = RecordingFs::with(&["店长.mp3"]);
        let files = map(&[("店长.mp3", "dianzhang.mp3")]);
        let mut log = OperatorLog::in_memory();

        let outcome = apply_renames(Path::new("/r"), &files, EntryKind::File, false, &fs, &mut log);

        assert_eq!(outcome.previewed.len(), 1);
        assert!(fs.renames.borrow().is_empty());
        assert_eq!(
            log.lines(),
            ["[preview] would rename file: 店长.mp3 -> dianzhang.mp3".to_string()]
        );
    }

    #[test]
    fn test_missing_source_skipped_and_batch_continues() {
        let fs = RecordingFs::with(&["店长.mp3"]);
        let files = map(&[("夏夜.mp3", "xiaye.mp3"), ("店长.mp3", "dianzhang.mp3")]);
        let mut log = OperatorLog::in_memory();

        let outcome = apply_renames(Path::new("/r"), &files, EntryKind::File, true, &fs, &mut log);

        assert_eq!(outcome.missing.len(), 1);
        assert_eq!(outcome.renamed.len(), 1);
        assert!(log.lines().iter().any(|l| l.starts_with("warning: file does not exist")));
    }

    #[test]
    fn test_identity_and_occupied_targets() {
        let fs = RecordingFs::with(&["same.mp3", "店长.mp3", "dianzhang.mp3"]);
        let files = map(&[("same.mp3", "same.mp3"), ("店长.mp3", "dianzhang.mp3")]);
        let mut log = OperatorLog::in_memory();

        let outcome = apply_renames(Path::new("/r"), &files, EntryKind::File, true, &fs, &mut log);

        assert!(outcome.renamed.is_empty());
        assert_eq!(outcome.occupied.len(), 1);
        assert_eq!(outcome.problems(), 1);
        assert!(fs.renames.borrow().is_empty());
    }

    #[test]
    fn test_apply_mapping_on_disk() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        std::fs::create_dir_all(root.join("夏夜").join("店长")).unwrap();
        std::fs::write(root.join("夏夜").join("店长").join("开始.mp3"), b"x").unwrap();

        let mapping = RenameMapping {
            files: map(&[("夏夜/店长/开始.mp3", "xiaye/dianzhang/kaishi.mp3")]),
            folders: map(&[("夏夜", "xiaye"), ("夏夜/店长", "夏夜/dianzhang")]),
        };
        let mut log = OperatorLog::in_memory();

        let (folders, files) = apply_mapping(root, &mapping, true, &StdFs, &mut log);

        assert_eq!(folders.renamed.len(), 2);
        assert_eq!(files.renamed.len(), 1);
        assert_eq!(files.problems(), 0);
        assert!(root.join("xiaye").join("dianzhang").join("kaishi.mp3").is_file());
        assert!(!root.join("夏夜").exists());
    }
}
