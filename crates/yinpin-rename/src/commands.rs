use crate::cli::{RenameArgs, RenameCommand};
use crate::config::{expand_path, Config};
use crate::dictionary::CharacterMap;
use crate::error::RenameError;
use crate::oplog::OperatorLog;
use crate::plan::RenameMapping;
use crate::rewrite::{
    apply_reference_edits, find_reference_edits, retain_applicable, ScriptEdits, SubstitutionTable,
};
use crate::scan::{Collision, ScanReport, Scanner};
use crate::sequence::{apply_mapping, RenameOutcome, StdFs};
use crate::store;
use anyhow::Result;
use chrono::Local;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Interaction switches shared by every subcommand
#[derive(Debug, Clone, Copy)]
struct Flow {
    dry_run: bool,
    assume_yes: bool,
}

pub fn execute(args: RenameArgs) -> Result<()> {
    let config = Config::load(args.config.as_deref(), &args)?;
    let flow = Flow {
        dry_run: args.dry_run,
        assume_yes: args.yes,
    };

    match args.command {
        RenameCommand::Rename { path, strict } => cmd_rename(&config, path, strict, flow),
        RenameCommand::FixRefs { path, from_log } => cmd_fix_refs(&config, path, from_log, flow),
        RenameCommand::Run { game_dir, strict } => cmd_run(&config, game_dir, strict, flow),
    }
}

fn cmd_rename(config: &Config, path: Option<String>, strict: bool, flow: Flow) -> Result<()> {
    let root = resolve_path(path, "Directory to rename")?;
    let dictionary = load_dictionary(config)?;

    let mut log = OperatorLog::create(&config.log_file)?;
    write_header(&mut log, "rename", &root);

    let report = Scanner::new(&dictionary, &config.audio_extensions).scan(&root, &mut log);
    if report.is_empty() {
        eprintln!("No Chinese-named audio files or folders found");
        return Ok(());
    }

    let mapping = report.to_mapping();
    store::save_mapping(&config.mapping_file, &mapping)?;
    log.line(format!("mapping saved to: {}", config.mapping_file.display()));

    report_unknown(config, &report.unknown, &mut log)?;
    report_collisions(&report);

    apply_mapping(&root, &mapping, false, &StdFs, &mut log);
    log.flush();
    eprintln!(
        "{} folders and {} files to rename; details in {}",
        mapping.folders.len(),
        mapping.files.len(),
        config.log_file.display()
    );

    if flow.dry_run || (strict && !report.unknown.is_empty()) {
        return Ok(());
    }
    if !confirm("Rename now?", flow)? {
        log.line("cancelled");
        eprintln!("Cancelled");
        return Ok(());
    }

    let (folders, files) = apply_mapping(&root, &mapping, true, &StdFs, &mut log);
    summarize_renames(&folders, &files);
    Ok(())
}

fn cmd_fix_refs(config: &Config, path: Option<String>, from_log: bool, flow: Flow) -> Result<()> {
    let script_root = resolve_path(path, "Directory with script files")?;
    let mapping = load_saved_mapping(config, from_log)?;
    if mapping.is_empty() {
        anyhow::bail!(
            "no rename mapping in {} or {}",
            config.mapping_file.display(),
            config.log_file.display()
        );
    }

    // Appending keeps the log that may have just been parsed.
    let mut log = OperatorLog::append(&config.log_file)?;
    write_header(&mut log, "fix-refs", &script_root);

    let found = find_reference_edits(
        &script_root,
        &mapping.files,
        &mapping.folders,
        &config.reference_style(),
        &config.script_extension,
        &mut log,
    );
    if !review_edits(config, &found, &mut log)? {
        return Ok(());
    }

    if flow.dry_run {
        return Ok(());
    }
    if !confirm("Update these script files?", flow)? {
        log.line("cancelled");
        eprintln!("Cancelled");
        return Ok(());
    }

    apply_reviewed_edits(config, None, &mut log)?;
    Ok(())
}

fn cmd_run(config: &Config, game_dir: Option<String>, strict: bool, flow: Flow) -> Result<()> {
    let game_dir = resolve_path(game_dir, "Game directory")?;
    if !game_dir.is_dir() {
        return Err(RenameError::MissingPath(game_dir.display().to_string()).into());
    }
    let dictionary = load_dictionary(config)?;

    let mut log = OperatorLog::create(&config.log_file)?;
    write_header(&mut log, "run", &game_dir);

    let scanner = Scanner::new(&dictionary, &config.audio_extensions);
    let mut roots: Vec<(PathBuf, RenameMapping)> = Vec::new();
    let mut combined = RenameMapping::default();
    let mut unknown = BTreeSet::new();

    for name in &config.audio_roots {
        let root = game_dir.join(name);
        let report = scanner.scan(&root, &mut log);
        log.line(format!(
            "{}: {} files, {} folders",
            name,
            report.files.len(),
            report.dirs.len()
        ));
        report_collisions(&report);
        unknown.extend(report.unknown.iter().copied());

        let mapping = report.to_mapping();
        combined.merge(mapping.clone());
        roots.push((root, mapping));
    }

    report_unknown(config, &unknown, &mut log)?;
    if combined.is_empty() {
        eprintln!("No Chinese-named audio files or folders found");
        return Ok(());
    }
    store::save_mapping(&config.mapping_file, &combined)?;
    log.line(format!("mapping saved to: {}", config.mapping_file.display()));

    for (root, mapping) in &roots {
        apply_mapping(root, mapping, false, &StdFs, &mut log);
    }
    let found = find_reference_edits(
        &game_dir,
        &combined.files,
        &combined.folders,
        &config.reference_style(),
        &config.script_extension,
        &mut log,
    );
    let has_edits = review_edits(config, &found, &mut log)?;
    eprintln!(
        "{} folders and {} files to rename; details in {}",
        combined.folders.len(),
        combined.files.len(),
        config.log_file.display()
    );

    if flow.dry_run || (strict && !unknown.is_empty()) {
        return Ok(());
    }
    if !confirm("Rename and update scripts now?", flow)? {
        log.line("cancelled");
        eprintln!("Cancelled");
        return Ok(());
    }

    let mut completed = RenameMapping::default();
    let mut problems = 0;
    for (root, mapping) in &roots {
        log.line(format!("renaming under: {}", root.display()));
        let (folders, files) = apply_mapping(root, mapping, true, &StdFs, &mut log);
        summarize_renames(&folders, &files);
        problems += folders.problems() + files.problems();
        completed.merge(mapping.completed(&folders.renamed, &files.renamed));
    }

    if has_edits {
        let only = (problems > 0).then_some(&completed);
        apply_reviewed_edits(config, only, &mut log)?;
    }
    log.line("done");
    Ok(())
}

fn load_dictionary(config: &Config) -> Result<CharacterMap> {
    let dictionary = CharacterMap::load(&config.dictionary_file)?;
    dictionary.ensure_usable(&config.dictionary_file)?;
    Ok(dictionary)
}

/// Mapping file first, the operator log when that is empty or asked for.
fn load_saved_mapping(config: &Config, from_log: bool) -> Result<RenameMapping> {
    if !from_log {
        let mapping = store::load_mapping(&config.mapping_file)?;
        if !mapping.is_empty() {
            return Ok(mapping);
        }
        tracing::info!("falling back to {}", config.log_file.display());
    }
    Ok(store::load_rename_log(&config.log_file)?)
}

fn write_header(log: &mut OperatorLog, command: &str, target: &Path) {
    log.quiet(format!(
        "yinpin {} at {}",
        command,
        Local::now().format("%Y-%m-%d %H:%M:%S")
    ));
    log.quiet(format!("target: {}", target.display()));
}

fn report_unknown(
    config: &Config,
    unknown: &BTreeSet<char>,
    log: &mut OperatorLog,
) -> Result<()> {
    if unknown.is_empty() {
        return Ok(());
    }

    let chars: Vec<String> = unknown.iter().map(|c| c.to_string()).collect();
    log.warn(format!(
        "{} characters missing from the dictionary: {}",
        unknown.len(),
        chars.join(", ")
    ));
    store::write_missing_characters(&config.missing_chars_file, unknown)?;
    log.line(format!(
        "missing characters saved to: {}",
        config.missing_chars_file.display()
    ));
    Ok(())
}

fn report_collisions(report: &ScanReport) {
    for collision in &report.collisions {
        eprintln!("Warning: {}", collision_message(collision));
    }
}

fn collision_message(collision: &Collision) -> String {
    let outcome = if collision.exists_on_disk {
        "already exists, none of these will be renamed"
    } else {
        "only the first rename will be applied"
    };
    format!(
        "{} <- {} ({})",
        collision.target,
        collision.sources.join(", "),
        outcome
    )
}

/// Apply the edits file as the operator left it after review.
///
/// With `completed`, edits for renames that did not happen are dropped.
fn apply_reviewed_edits(
    config: &Config,
    completed: Option<&RenameMapping>,
    log: &mut OperatorLog,
) -> Result<Vec<PathBuf>> {
    let mut reviewed = store::load_edits(&config.edits_file)?;
    log.line(format!("applying edits from: {}", config.edits_file.display()));

    if let Some(mapping) = completed {
        log.warn("some renames did not happen; only updating references to completed ones");
        let table =
            SubstitutionTable::build(&mapping.files, &mapping.folders, &config.reference_style());
        reviewed = retain_applicable(reviewed, &table, log);
    }

    let updated = apply_reference_edits(&reviewed, log);
    eprintln!("Updated {} of {} script files", updated.len(), reviewed.len());
    Ok(updated)
}

/// Save the review document; `false` when there is nothing to update.
fn review_edits(config: &Config, found: &[ScriptEdits], log: &mut OperatorLog) -> Result<bool> {
    if found.is_empty() {
        log.line("no script references to update");
        eprintln!("No script references to update");
        return Ok(false);
    }

    for script in found {
        log.line(format!(
            "[preview] would update: {} ({} lines)",
            script.path.display(),
            script.edits.len()
        ));
    }
    store::save_edits(&config.edits_file, found)?;
    eprintln!(
        "{} script files to update; review {}",
        found.len(),
        config.edits_file.display()
    );
    Ok(true)
}

fn summarize_renames(folders: &RenameOutcome, files: &RenameOutcome) {
    eprintln!(
        "Renamed {} folders and {} files",
        folders.renamed.len(),
        files.renamed.len()
    );
    let problems = folders.problems() + files.problems();
    if problems > 0 {
        eprintln!("{} entries were skipped; see the log", problems);
    }
}

fn resolve_path(given: Option<String>, prompt: &str) -> Result<PathBuf> {
    let raw = match given {
        Some(path) => path,
        None => dialoguer::Input::<String>::new()
            .with_prompt(prompt)
            .interact_text()?,
    };
    Ok(PathBuf::from(expand_path(clean_path_input(&raw))))
}

/// Strip whitespace and the quotes a shell drag-and-drop leaves behind.
fn clean_path_input(raw: &str) -> &str {
    raw.trim().trim_matches(|c| c == '"' || c == '\'')
}

fn confirm(prompt: &str, flow: Flow) -> Result<bool> {
    if flow.assume_yes {
        return Ok(true);
    }
    Ok(dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?)
}
