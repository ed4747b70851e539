/// Lyric Markov — learns a Markov model from the stored lyrics, or
/// generates a new lyric from a learned model.
///
/// Usage: lyric_markov (--learn | --generate) [--order <n>] [--markov <name>] [--line <n>]
use clap::{ArgGroup, Parser};
use lyric_markov::config::Config;
use lyric_markov::core::generator::Generator;
use lyric_markov::core::learner::Learner;
use lyric_markov::store::{RonStore, Store};
use lyric_markov::tokenizer::Tokenizer;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::ThreadPoolBuilder;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "lyric_markov")]
#[command(version)]
#[command(about = "Learn word transitions from lyrics and generate new ones", long_about = None)]
#[command(group(ArgGroup::new("mode").required(true).args(["learn", "generate"])))]
struct Cli {
    /// Learn a model from every stored lyric
    #[arg(short, long)]
    learn: bool,

    /// Generate a lyric from a learned model
    #[arg(short, long)]
    generate: bool,

    /// Markov order used when learning (overrides the config file)
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    order: Option<u32>,

    /// Name of the model to save or load
    #[arg(short = 'm', long = "markov", value_name = "NAME", default_value = "markov")]
    markov: String,

    /// Number of lines to generate (overrides the config file)
    #[arg(long = "line", value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    line: Option<u32>,

    /// Configuration file (RON); defaults apply when it does not exist
    #[arg(short, long, value_name = "PATH", default_value = "lyric_markov.ron")]
    config: PathBuf,

    /// Store directory (overrides the config file)
    #[arg(long, value_name = "DIR")]
    store: Option<PathBuf>,

    /// RNG seed for reproducible generation
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Worker threads used when learning (defaults to one per CPU)
    #[arg(short, long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    jobs: Option<u32>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = Config::load_or_default(&cli.config).unwrap_or_else(|e| {
        eprintln!("Error loading config '{}': {}", cli.config.display(), e);
        process::exit(1);
    });
    if let Some(order) = cli.order {
        config.order = order as usize;
    }
    if let Some(line) = cli.line {
        config.line_count = line as usize;
    }
    if let Some(store) = &cli.store {
        config.store_dir = store.clone();
    }

    let store = RonStore::new(&config.store_dir);

    if cli.learn {
        learn(&cli, &config, &store);
    } else {
        generate(&cli, &config, &store);
    }
}

fn learn(cli: &Cli, config: &Config, store: &RonStore) {
    println!("[learn mode]");

    if let Some(jobs) = cli.jobs {
        ThreadPoolBuilder::new()
            .num_threads(jobs as usize)
            .build_global()
            .unwrap_or_else(|e| {
                eprintln!("Error configuring worker threads: {}", e);
                process::exit(1);
            });
    }

    let tokenizer = config.tokenizer.build();
    tokenizer.check().unwrap_or_else(|e| {
        eprintln!("Error: tokenizer is not usable: {}", e);
        process::exit(1);
    });

    let lyrics = store.load_lyrics().unwrap_or_else(|e| {
        eprintln!("Error loading lyrics from '{}': {}", store.root().display(), e);
        process::exit(1);
    });

    let total = lyrics.len();
    let width = total.to_string().len();
    println!("Learning a {}-order model from {} lyrics...", config.order, total);

    let mut learner = Learner::new(config.order, tokenizer);
    let stats = learner
        .learn_batch_with_progress(&lyrics, |done| {
            eprint!("\r{:0width$} / {} lyrics done", done, total, width = width);
        })
        .unwrap_or_else(|e| {
            eprintln!();
            eprintln!("Error learning lyrics: {}", e);
            process::exit(1);
        });
    eprintln!();

    let model = learner.into_model();
    println!(
        "Model learned: {} lines, {} tokens, {} distinct grams",
        stats.lines,
        stats.tokens,
        model.len()
    );

    store.save_model(&cli.markov, &model).unwrap_or_else(|e| {
        eprintln!("Error saving model '{}': {}", cli.markov, e);
        process::exit(1);
    });
    println!("Model saved as '{}'", cli.markov);
}

fn generate(cli: &Cli, config: &Config, store: &RonStore) {
    println!("[generate mode]");
    println!();

    let model = store.load_model(&cli.markov).unwrap_or_else(|e| {
        eprintln!("Error loading model: {}", e);
        process::exit(1);
    });

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let generator = Generator::with_config(&model, config.generator_config());
    let lyric = generator
        .generate(config.line_count, &mut rng)
        .unwrap_or_else(|e| {
            eprintln!("Error generating lyric: {}", e);
            process::exit(1);
        });

    println!("{}", lyric);
}
