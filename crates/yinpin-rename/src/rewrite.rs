//! Rewrites asset references in script files after a rename
//!
//! Matching is literal substring replacement over a few surface forms of
//! each old path (quoted, re-encoded, prefixed). There is no script grammar
//! behind it; see DESIGN.md for the trade-off.

use crate::oplog::OperatorLog;
use crate::plan::{PathTranslator, RenameMap};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One changed line of a script file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceEdit {
    #[serde(skip)]
    pub file: PathBuf,

    /// 1-based
    #[serde(rename = "line_num")]
    pub line: usize,

    #[serde(rename = "old_line")]
    pub before: String,

    #[serde(rename = "new_line")]
    pub after: String,
}

/// All edits found in one script file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptEdits {
    pub path: PathBuf,
    pub edits: Vec<ReferenceEdit>,
}

/// How references may be spelled in scripts
#[derive(Debug, Clone)]
pub struct ReferenceStyle {
    pub prefixes: Vec<String>,
    /// Extension swap applied to both sides, e.g. `.flac` to `.mp3`.
    /// Disabled when `lossy_from` is empty.
    pub lossy_from: String,
    pub lossy_to: String,
}

impl Default for ReferenceStyle {
    fn default() -> Self {
        Self {
            prefixes: vec!["audio/".to_string(), "sound/".to_string()],
            lossy_from: ".flac".to_string(),
            lossy_to: ".mp3".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub pattern: String,
    pub replacement: String,
}

impl Substitution {
    fn new(pattern: String, replacement: String) -> Self {
        Self {
            pattern,
            replacement,
        }
    }
}

#[derive(Debug, Clone)]
struct TableEntry {
    old: String,
    new: String,
    variants: Vec<Substitution>,
}

/// Combined file and folder substitutions, longest old path first
#[derive(Debug, Clone)]
pub struct SubstitutionTable {
    entries: Vec<TableEntry>,
}

impl SubstitutionTable {
    /// File entries are re-translated through the folder renames so none
    /// keeps a stale folder name; every folder becomes an entry of its own
    /// pointing at its fully translated path.
    pub fn build(files: &RenameMap, folders: &RenameMap, style: &ReferenceStyle) -> Self {
        let translator = PathTranslator::new(folders);
        let mut combined: RenameMap = files
            .iter()
            .map(|(old, new)| (old.clone(), translator.translate(new)))
            .collect();
        for old in folders.keys() {
            combined
                .entry(old.clone())
                .or_insert_with(|| translator.translate(old));
        }

        let mut entries: Vec<TableEntry> = combined
            .into_iter()
            .filter(|(old, new)| old != new)
            .map(|(old, new)| {
                let is_folder = folders.contains_key(&old) && !files.contains_key(&old);
                let variants = variants(&old, &new, is_folder, style);
                TableEntry { old, new, variants }
            })
            .collect();

        // A folder entry applied first would split every file entry under it.
        entries.sort_by(|a, b| b.old.len().cmp(&a.old.len()).then_with(|| a.old.cmp(&b.old)));

        Self { entries }
    }

    /// `(old, new)` pairs in application order
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|e| (e.old.as_str(), e.new.as_str()))
    }

    /// Rewritten line and the substitutions that fired, or `None` if the
    /// line is untouched.
    pub fn rewrite_line(&self, line: &str) -> Option<(String, Vec<&Substitution>)> {
        let mut current = line.to_string();
        let mut applied = Vec::new();

        for entry in &self.entries {
            for sub in &entry.variants {
                if current.contains(&sub.pattern) {
                    current = current.replace(&sub.pattern, &sub.replacement);
                    applied.push(sub);
                }
            }
        }

        if current == line {
            None
        } else {
            Some((current, applied))
        }
    }
}

fn variants(old: &str, new: &str, is_folder: bool, style: &ReferenceStyle) -> Vec<Substitution> {
    let mut subs = vec![
        Substitution::new(format!("\"{}\"", old), format!("\"{}\"", new)),
        Substitution::new(format!("'{}'", old), format!("'{}'", new)),
    ];

    if !style.lossy_from.is_empty() && old.contains(&style.lossy_from) {
        let lossy_old = old.replace(&style.lossy_from, &style.lossy_to);
        let lossy_new = new.replace(&style.lossy_from, &style.lossy_to);
        subs.push(Substitution::new(
            format!("\"{}\"", lossy_old),
            format!("\"{}\"", lossy_new),
        ));
        subs.push(Substitution::new(
            format!("'{}'", lossy_old),
            format!("'{}'", lossy_new),
        ));
    }

    for prefix in &style.prefixes {
        subs.push(Substitution::new(
            format!("{}{}", prefix, old),
            format!("{}{}", prefix, new),
        ));
    }

    if is_folder {
        subs.push(Substitution::new(format!("\"{}/", old), format!("\"{}/", new)));
        subs.push(Substitution::new(format!("'{}/", old), format!("'{}/", new)));
    }

    subs
}

/// Finds and applies reference edits in one script tree
pub struct ReferenceRewriter {
    table: SubstitutionTable,
    extension: String,
}

impl ReferenceRewriter {
    pub fn new(table: SubstitutionTable, extension: &str) -> Self {
        Self {
            table,
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    /// Every script file under `root`, sorted. Unreadable entries are logged
    /// and left out.
    pub fn script_files(&self, root: &Path, log: &mut OperatorLog) -> Vec<PathBuf> {
        let mut files = Vec::new();

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log.error(format!("cannot read entry under {}: {}", root.display(), e));
                    continue;
                }
            };

            let is_script = entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.extension));
            if is_script {
                files.push(entry.into_path());
            }
        }

        files
    }

    /// Collect the edits without writing anything.
    pub fn find(&self, root: &Path, log: &mut OperatorLog) -> Vec<ScriptEdits> {
        if !root.exists() {
            log.warn(format!("script path does not exist: {}", root.display()));
            return Vec::new();
        }

        for (old, new) in self.table.pairs() {
            log.quiet(format!("  substitute: {} -> {}", old, new));
        }
        let files = self.script_files(root, log);
        log.line(format!("found {} .{} files", files.len(), self.extension));

        let mut found = Vec::new();
        for path in files {
            let content = match fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    log.error(format!("failed to read {}: {}", path.display(), e));
                    continue;
                }
            };

            let mut edits = Vec::new();
            for (idx, line) in content.lines().enumerate() {
                if let Some((after, applied)) = self.table.rewrite_line(line) {
                    for sub in applied {
                        log.quiet(format!("  replace: {} -> {}", sub.pattern, sub.replacement));
                    }
                    edits.push(ReferenceEdit {
                        file: path.clone(),
                        line: idx + 1,
                        before: line.to_string(),
                        after,
                    });
                }
            }

            if !edits.is_empty() {
                found.push(ScriptEdits { path, edits });
            }
        }

        found
    }

    /// Find, then either write the changes or only report them.
    ///
    /// Returns the files that were (or, in preview, would be) updated.
    pub fn run(&self, root: &Path, commit: bool, log: &mut OperatorLog) -> Vec<PathBuf> {
        let found = self.find(root, log);
        if commit {
            apply_reference_edits(&found, log)
        } else {
            for script in &found {
                log.line(format!("[preview] would update: {}", script.path.display()));
            }
            found.into_iter().map(|s| s.path).collect()
        }
    }
}

/// Rewrite script references for a completed rename.
pub fn rewrite_references(
    script_root: &Path,
    files: &RenameMap,
    folders: &RenameMap,
    style: &ReferenceStyle,
    extension: &str,
    commit: bool,
    log: &mut OperatorLog,
) -> Vec<PathBuf> {
    let table = SubstitutionTable::build(files, folders, style);
    ReferenceRewriter::new(table, extension).run(script_root, commit, log)
}

/// Collect reference edits for a rename without writing anything.
pub fn find_reference_edits(
    script_root: &Path,
    files: &RenameMap,
    folders: &RenameMap,
    style: &ReferenceStyle,
    extension: &str,
    log: &mut OperatorLog,
) -> Vec<ScriptEdits> {
    let table = SubstitutionTable::build(files, folders, style);
    ReferenceRewriter::new(table, extension).find(script_root, log)
}

/// Drop edits the table would no longer produce, e.g. after some renames
/// failed and the table was rebuilt from the completed ones.
pub fn retain_applicable(
    found: Vec<ScriptEdits>,
    table: &SubstitutionTable,
    log: &mut OperatorLog,
) -> Vec<ScriptEdits> {
    found
        .into_iter()
        .filter_map(|mut script| {
            script.edits.retain(|edit| {
                let expected = table.rewrite_line(&edit.before).map(|(line, _)| line);
                let keep = expected.as_deref() == Some(edit.after.as_str());
                if !keep {
                    log.warn(format!(
                        "{}:{} refers to a rename that did not happen, leaving it",
                        script.path.display(),
                        edit.line
                    ));
                }
                keep
            });
            (!script.edits.is_empty()).then_some(script)
        })
        .collect()
}

/// Write previously found edits back to their files.
///
/// Each edit replaces its line only while the line still reads exactly as
/// recorded; anything else is reported as stale and left alone.
pub fn apply_reference_edits(found: &[ScriptEdits], log: &mut OperatorLog) -> Vec<PathBuf> {
    let mut updated = Vec::new();

    for script in found {
        let content = match fs::read_to_string(&script.path) {
            Ok(content) => content,
            Err(e) => {
                log.error(format!("failed to read {}: {}", script.path.display(), e));
                continue;
            }
        };

        let mut lines: Vec<String> = content.split_inclusive('\n').map(str::to_string).collect();
        let mut changed = 0;

        for edit in &script.edits {
            let slot = match edit.line.checked_sub(1) {
                Some(idx) => lines.get_mut(idx),
                None => None,
            };
            let Some(slot) = slot else {
                log.warn(format!(
                    "{}:{} is past the end of the file",
                    script.path.display(),
                    edit.line
                ));
                continue;
            };

            let (body, ending) = split_line_ending(slot);
            if body != edit.before {
                log.warn(format!(
                    "{}:{} changed since it was scanned, skipping",
                    script.path.display(),
                    edit.line
                ));
                continue;
            }

            *slot = format!("{}{}", edit.after, ending);
            changed += 1;
        }

        if changed == 0 {
            continue;
        }

        match fs::write(&script.path, lines.concat()) {
            Ok(()) => {
                log.line(format!(
                    "updated {} ({} lines)",
                    script.path.display(),
                    changed
                ));
                updated.push(script.path.clone());
            }
            Err(e) => {
                log.error(format!("failed to write {}: {}", script.path.display(), e));
            }
        }
    }

    updated
}

fn split_line_ending(line: &str) -> (&str, &'static str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}

/// Group edits by file for the review document.
pub fn edits_by_file(found: &[ScriptEdits]) -> BTreeMap<String, Vec<ReferenceEdit>> {
    found
        .iter()
        .map(|s| (s.path.to_string_lossy().into_owned(), s.edits.clone()))
        .collect()
}
