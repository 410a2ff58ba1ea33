use std::path::PathBuf;

use clap::Parser;
use git_theseus::commands::migrate::{MigrateOptions, handle_migrate};
use git_theseus::config;

#[derive(Parser)]
#[command(name = "git-theseus", version)]
#[command(
    about = "Rebuild files line by line as commits that keep the original authors and dates",
    long_about = None
)]
struct Cli {
    /// JSON descriptor of the lines visible in each file as of each original commit
    #[arg(long = "input-file", value_name = "PATH")]
    input_file: PathBuf,

    /// Print the commits that would be created without creating them
    #[arg(long = "dryrun")]
    dryrun: bool,

    /// Run as if started in <REPO_DIR>
    #[arg(short = 'C', value_name = "REPO_DIR", default_value = ".")]
    repo_dir: String,
}

fn main() {
    let cli = Cli::parse();

    config::Config::init();

    handle_migrate(&MigrateOptions {
        input_file: cli.input_file,
        dry_run: cli.dryrun,
        repo_dir: cli.repo_dir,
    });
}
