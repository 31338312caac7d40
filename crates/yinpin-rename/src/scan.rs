//! Finds Chinese-named folders and audio files and computes their new names

use crate::dictionary::CharacterMap;
use crate::oplog::OperatorLog;
use crate::plan::{self, PathTranslator, RenameMap, RenameMapping};
use crate::transliterate::{contains_cjk, normalize, split_extension};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use walkdir::WalkDir;

/// Tag of a file discovery line in the operator log
pub const FILE_TAG: &str = "文件: ";
/// Tag of a folder discovery line in the operator log
pub const FOLDER_TAG: &str = "文件夹: ";

/// Two or more sources that would end up at the same place
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    pub target: String,
    pub sources: Vec<String>,
    /// Something not being renamed already occupies the target
    pub exists_on_disk: bool,
}

#[derive(Debug, Default)]
pub struct ScanReport {
    pub files: RenameMap,
    pub dirs: RenameMap,
    pub unknown: BTreeSet<char>,
    pub collisions: Vec<Collision>,
}

impl ScanReport {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.dirs.is_empty()
    }

    pub fn to_mapping(&self) -> RenameMapping {
        RenameMapping {
            files: self.files.clone(),
            folders: self.dirs.clone(),
        }
    }
}

struct Found {
    relative: String,
    name: String,
    is_dir: bool,
}

pub struct Scanner<'a> {
    dictionary: &'a CharacterMap,
    audio_extensions: Vec<String>,
}

impl<'a> Scanner<'a> {
    pub fn new(dictionary: &'a CharacterMap, audio_extensions: &[String]) -> Self {
        let audio_extensions = audio_extensions
            .iter()
            .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        Self {
            dictionary,
            audio_extensions,
        }
    }

    pub fn is_audio(&self, name: &str) -> bool {
        let (_, ext) = split_extension(name);
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        !ext.is_empty() && self.audio_extensions.contains(&ext)
    }

    /// Walk `root` once and compute every rename.
    ///
    /// Folder targets keep the old parent; file targets are translated
    /// through all ancestor folder renames. A missing root is a warning and
    /// an empty report.
    pub fn scan(&self, root: &Path, log: &mut OperatorLog) -> ScanReport {
        let mut report = ScanReport::default();

        if !root.exists() {
            log.warn(format!("path does not exist: {}", root.display()));
            return report;
        }

        log.line(format!("scanning: {}", root.display()));
        let found = self.walk(root, log);

        for entry in found.iter().filter(|f| f.is_dir && contains_cjk(&f.name)) {
            let normalized = normalize(&entry.name, self.dictionary);
            let target = plan::join(plan::parent(&entry.relative), &normalized.name);
            if target == entry.relative {
                continue;
            }

            log.line(format!("{}{} -> {}", FOLDER_TAG, entry.relative, target));
            log_unknown(log, &normalized.unknown);
            report.unknown.extend(normalized.unknown);
            report.dirs.insert(entry.relative.clone(), target);
        }

        let translator = PathTranslator::new(&report.dirs);
        for entry in found
            .iter()
            .filter(|f| !f.is_dir && self.is_audio(&f.name) && contains_cjk(&f.name))
        {
            let normalized = normalize(&entry.name, self.dictionary);
            let parent = plan::parent(&entry.relative).map(|p| translator.translate(p));
            let target = plan::join(parent.as_deref(), &normalized.name);
            if target == entry.relative {
                continue;
            }

            log.line(format!("{}{} -> {}", FILE_TAG, entry.relative, target));
            log_unknown(log, &normalized.unknown);
            report.unknown.extend(normalized.unknown);
            report.files.insert(entry.relative.clone(), target);
        }

        report.collisions = find_collisions(root, &report);
        for collision in &report.collisions {
            let reason = if collision.exists_on_disk {
                "target already exists"
            } else {
                "multiple sources share the target"
            };
            log.warn(format!(
                "{}: {} <- {}",
                reason,
                collision.target,
                collision.sources.join(", ")
            ));
        }

        report
    }

    fn walk(&self, root: &Path, log: &mut OperatorLog) -> Vec<Found> {
        let mut found = Vec::new();

        for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log.warn(format!("cannot read entry under {}: {}", root.display(), e));
                    continue;
                }
            };

            let Some(name) = entry.file_name().to_str() else {
                log.warn(format!("skipping non UTF-8 name: {}", entry.path().display()));
                continue;
            };
            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };

            found.push(Found {
                relative: plan::to_relative_string(relative),
                name: name.to_string(),
                is_dir: entry.file_type().is_dir(),
            });
        }

        found
    }
}

fn log_unknown(log: &mut OperatorLog, unknown: &BTreeSet<char>) {
    if !unknown.is_empty() {
        let chars: Vec<String> = unknown.iter().map(|c| c.to_string()).collect();
        log.line(format!("    unknown characters: {}", chars.join(", ")));
    }
}

fn find_collisions(root: &Path, report: &ScanReport) -> Vec<Collision> {
    let mut collisions = Vec::new();

    for (map, translator_applies) in [(&report.dirs, false), (&report.files, true)] {
        let mut by_target: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for (old, new) in map {
            by_target.entry(new.as_str()).or_default().push(old.as_str());
        }

        for (target, sources) in by_target {
            // Where the target sits before anything moves: file targets
            // carry translated parents, so look next to the old file.
            let on_disk = if translator_applies {
                plan::join(plan::parent(sources[0]), plan::leaf(target))
            } else {
                target.to_string()
            };
            let exists_on_disk = !map.contains_key(on_disk.as_str())
                && plan::to_native(root, &on_disk).exists();

            if sources.len() > 1 || exists_on_disk {
                collisions.push(Collision {
                    target: target.to_string(),
                    sources: sources.into_iter().map(str::to_string).collect(),
                    exists_on_disk,
                });
            }
        }
    }

    collisions
}
