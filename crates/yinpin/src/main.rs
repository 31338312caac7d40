use clap::Parser;
use yinpin_rename::RenameArgs;

#[derive(Debug, Parser)]
#[command(name = "yinpin")]
#[command(version, about = "Rename Chinese-named audio assets to pinyin and fix script references", long_about = None)]
struct Cli {
    #[command(flatten)]
    rename: RenameArgs,

    /// Also write diagnostics to yinpin.log in this directory
    #[arg(long, global = true, env = "YINPIN_LOG_DIR")]
    log_dir: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let log_dir = cli.log_dir.as_deref().map(std::path::Path::new);
    let guard = yinpin_core::init_logging(&cli.rename.log_level, log_dir);

    if let Err(e) = yinpin_rename::run(cli.rename) {
        tracing::debug!("fatal: {:?}", e);
        eprintln!("Error: {:#}", e);
        drop(guard);
        std::process::exit(1);
    }
}
