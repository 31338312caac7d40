//! Pinyin renaming of Chinese-named audio assets
//!
//! The workflow runs in strictly ordered phases:
//!
//! - `scan`: find CJK-named folders and audio files, compute new names
//! - `sequence`: apply the renames deepest first
//! - `rewrite`: repair asset references in script files
//!
//! Every phase writes to an [`OperatorLog`] so the operator can audit a run.

mod cli;
mod commands;
mod config;
mod error;

pub mod dictionary;
pub mod oplog;
pub mod plan;
pub mod rewrite;
pub mod scan;
pub mod sequence;
pub mod store;
pub mod transliterate;

pub use cli::{RenameArgs, RenameCommand};
pub use config::{expand_path, Config};
pub use dictionary::CharacterMap;
pub use error::{RenameError, RenameResult};
pub use oplog::OperatorLog;
pub use plan::{RenameMap, RenameMapping};
pub use rewrite::{
    apply_reference_edits, find_reference_edits, rewrite_references, ReferenceEdit,
    ReferenceStyle, ScriptEdits,
};
pub use scan::{ScanReport, Scanner};
pub use sequence::{apply_mapping, apply_renames, EntryKind, FsOps, RenameOutcome, StdFs};
pub use transliterate::{normalize, Normalized};

use anyhow::Result;

pub fn run(args: RenameArgs) -> Result<()> {
    commands::execute(args)
}
