/// Lyric Import — stores text files as lyric records for learning.
///
/// Usage: lyric_import [--store <dir>] <file.txt>...
///
/// Each file becomes one record named after its file stem; importing a file
/// with the same stem again replaces the earlier record.
use clap::Parser;
use lyric_markov::config::Config;
use lyric_markov::store::{RonStore, Store};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "lyric_import")]
#[command(version)]
#[command(about = "Import lyric text files into the store", long_about = None)]
struct Cli {
    /// Lyric text files, one song per file
    #[arg(required = true, value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Configuration file (RON); defaults apply when it does not exist
    #[arg(short, long, value_name = "PATH", default_value = "lyric_markov.ron")]
    config: PathBuf,

    /// Store directory (overrides the config file)
    #[arg(long, value_name = "DIR")]
    store: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load_or_default(&cli.config).unwrap_or_else(|e| {
        eprintln!("Error loading config '{}': {}", cli.config.display(), e);
        process::exit(1);
    });
    let store = RonStore::new(cli.store.clone().unwrap_or(config.store_dir));

    for path in &cli.files {
        let name = match path.file_stem() {
            Some(stem) => stem.to_string_lossy().to_string(),
            None => {
                eprintln!("Error: '{}' has no file name", path.display());
                process::exit(1);
            }
        };
        let body = std::fs::read_to_string(path).unwrap_or_else(|e| {
            eprintln!("Error reading '{}': {}", path.display(), e);
            process::exit(1);
        });
        store.save_lyric(&name, &body).unwrap_or_else(|e| {
            eprintln!("Error storing '{}': {}", name, e);
            process::exit(1);
        });
        println!("Imported '{}' as '{}'", path.display(), name);
    }

    println!(
        "{} lyrics imported into '{}'",
        cli.files.len(),
        store.root().display()
    );
}
