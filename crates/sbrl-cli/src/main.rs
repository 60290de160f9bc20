//! Command-line entry point binding the text-format loader, the core
//! trainer, and the model serializer (spec §6's "training entry point
//! (abstractly)", made concrete).

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use sbrl_core::{seeded_rng, train, TrainerConfig};
use sbrl_io::{load_dataset, resolve_alphas, Model};

/// Trains a Scalable Bayesian Rule List from precomputed candidate
/// rules and class labels.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the candidate-rules text file.
    #[arg(long)]
    rules: PathBuf,

    /// Path to the class-labels text file.
    #[arg(long)]
    labels: PathBuf,

    /// Poisson prior mean on rule-list length.
    #[arg(long, default_value_t = 3.0)]
    lambda: f64,

    /// Poisson prior mean on per-rule cardinality.
    #[arg(long, default_value_t = 1.0)]
    eta: f64,

    /// Per-class Dirichlet concentration: one value (broadcast to every
    /// class) or exactly as many values as there are classes.
    #[arg(long, num_args = 1.., value_delimiter = ',', default_value = "1.0")]
    alpha: Vec<f64>,

    /// MCMC iterations per chain.
    #[arg(long, default_value_t = 5000)]
    max_iters: usize,

    /// Number of independently seeded chains.
    #[arg(long, default_value_t = 10)]
    n_chains: usize,

    /// RNG seed; negative draws fresh entropy from wall-clock time.
    #[arg(long, default_value_t = -1)]
    seed: i64,

    /// Where to write the trained model as JSON.
    #[arg(long, default_value = "model.json")]
    out: PathBuf,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbosity: u8) -> anyhow::Result<()> {
    std::fs::create_dir_all("logs").context("creating logs directory")?;
    let term_level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .context("system clock before unix epoch")?
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{time}.log")).context("creating log file")?,
    );
    let term = simplelog::TermLogger::new(
        term_level,
        config,
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).context("initializing logger")?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose)?;

    let (rules, labels, n_samples) =
        load_dataset(&args.rules, &args.labels).context("loading rules/labels")?;
    log::info!(
        "loaded {} rules, {} classes, {n_samples} samples",
        rules.len() - 1,
        labels.len()
    );

    let alphas = resolve_alphas(&args.alpha, labels.len()).context("resolving alpha")?;
    let config = TrainerConfig {
        lambda: args.lambda,
        eta: args.eta,
        alphas,
        max_iters: args.max_iters,
        n_chains: args.n_chains,
    };

    let mut rng = seeded_rng(args.seed);
    let trained = train(&rules, &labels, n_samples, &config, &mut rng).context("training")?;
    log::info!(
        "best rule list has {} entries, log posterior improved over default-only baseline",
        trained.rule_ids.len()
    );

    let feature_strings = rules.iter().map(|r| r.feature().to_string()).collect();
    let model = Model::from_trained(&trained, feature_strings);
    model.to_json_file(&args.out).context("writing model")?;
    log::info!("wrote model to {}", args.out.display());

    Ok(())
}
