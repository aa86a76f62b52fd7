//! Epsilon-greedy bandit simulation — runs one experiment and reports
//! per-arm estimates, reward totals and explore/exploit counts.
//!
//! Entry point that loads configuration, seeds the random source and prints
//! the report (and optionally the win-rate chart).

mod plot;

use std::path::PathBuf;

use anyhow::Context;
use bandit_core::config::AppConfig;
use bandit_rl_engine::Experiment;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "epsilon-greedy")]
#[command(about = "Epsilon-greedy multi-armed bandit simulation")]
#[command(version)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, env = "EPSILON_GREEDY_CONFIG")]
    config: Option<PathBuf>,

    /// Number of trials (overrides config)
    #[arg(long, allow_negative_numbers = true)]
    trials: Option<i64>,

    /// Exploration probability (overrides config)
    #[arg(long, allow_negative_numbers = true)]
    epsilon: Option<f64>,

    /// Comma-separated arm win probabilities (overrides config)
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    arms: Option<Vec<f64>>,

    /// Random seed for a reproducible run (overrides config)
    #[arg(long)]
    seed: Option<u64>,

    /// Print the summary as JSON
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Draw the cumulative win-rate chart
    #[arg(long, default_value_t = false)]
    plot: bool,

    /// Emit logs as JSON
    #[arg(long, default_value_t = false)]
    json_logs: bool,
}

fn init_tracing(json: bool) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "epsilon_greedy=info,bandit_rl_engine=info".into()),
        )
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn apply_overrides(cli: &Cli, config: &mut AppConfig) {
    if let Some(trials) = cli.trials {
        debug!(trials, "Overriding num_trials");
        config.experiment.num_trials = trials;
    }
    if let Some(epsilon) = cli.epsilon {
        debug!(epsilon, "Overriding epsilon");
        config.experiment.epsilon = epsilon;
    }
    if let Some(arms) = &cli.arms {
        debug!(?arms, "Overriding arm probabilities");
        config.experiment.arm_probabilities = arms.clone();
    }
    if let Some(seed) = cli.seed {
        debug!(seed, "Overriding seed");
        config.experiment.seed = Some(seed);
    }
    config.report.json |= cli.json;
    config.report.plot |= cli.plot;
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let mut config =
        AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    apply_overrides(&cli, &mut config);

    info!(
        num_trials = config.experiment.num_trials,
        epsilon = config.experiment.epsilon,
        arms = ?config.experiment.arm_probabilities,
        "Configuration loaded"
    );

    let experiment =
        Experiment::new(&config.experiment).context("Invalid experiment configuration")?;

    let mut rng = match config.experiment.seed {
        Some(seed) => {
            info!(seed, "Using seeded random source");
            StdRng::seed_from_u64(seed)
        }
        None => {
            info!("Using entropy-seeded random source");
            StdRng::from_entropy()
        }
    };

    let outcome = experiment.run(&mut rng);
    let summary = outcome.summary();

    if config.report.json {
        println!("{}", summary.to_json()?);
    } else {
        println!("{summary}");
    }

    if config.report.plot {
        let curve: Vec<f64> = outcome.win_rate_curve().collect();
        println!();
        print!(
            "{}",
            plot::render(
                &curve,
                outcome.best_true_probability(),
                config.report.plot_width,
                config.report.plot_height,
            )
        );
    }

    Ok(())
}
