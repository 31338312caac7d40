use clap::{Args, Subcommand};

#[derive(Debug, Args)]
pub struct RenameArgs {
    #[command(subcommand)]
    pub command: RenameCommand,

    /// Specify configuration file path
    #[arg(long, global = true, env = "YINPIN_CONFIG")]
    pub config: Option<String>,

    /// Override character dictionary file
    #[arg(long, global = true, env = "YINPIN_DICTIONARY")]
    pub dictionary: Option<String>,

    /// Override operator log file
    #[arg(long, global = true)]
    pub log_file: Option<String>,

    /// Override rename mapping file
    #[arg(long, global = true)]
    pub mapping_file: Option<String>,

    /// Log level
    #[arg(long, global = true, env = "YINPIN_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Dry run (write the preview log and mapping, change nothing)
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Answer yes to every confirmation
    #[arg(short, long, global = true)]
    pub yes: bool,
}

#[derive(Debug, Subcommand)]
pub enum RenameCommand {
    /// Rename Chinese-named folders and audio files under a directory
    Rename {
        /// Directory to scan (prompted for when omitted)
        path: Option<String>,

        /// Stop after the preview when the dictionary is missing characters
        #[arg(long)]
        strict: bool,
    },

    /// Rewrite script references from a saved mapping
    FixRefs {
        /// Directory holding the script files (prompted for when omitted)
        path: Option<String>,

        /// Rebuild the mapping from the operator log instead of the mapping file
        #[arg(long)]
        from_log: bool,
    },

    /// Rename every audio root of a game directory, then fix its scripts
    Run {
        /// Game directory (prompted for when omitted)
        game_dir: Option<String>,

        /// Stop after the preview when the dictionary is missing characters
        #[arg(long)]
        strict: bool,
    },
}
