//! F1 Prediction CLI
//!
//! Collects a season's race and qualifying results and trains a race winner
//! classifier on grid position.

use clap::{Parser, Subcommand};
use f1predict::{Config, Result};

#[derive(Parser)]
#[command(name = "f1predict")]
#[command(about = "F1 race winner prediction from qualifying position", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Season year (overrides the config file)
    #[arg(short, long, global = true)]
    season: Option<u16>,

    /// Use only cached API responses (requires cache_dir)
    #[arg(long, global = true)]
    offline: bool,

    /// Skip writing the descriptive season tables
    #[arg(long, global = true)]
    no_artifacts: bool,

    /// Runs collect then train when omitted
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, merge and store a season's results
    Collect,
    /// Train and evaluate the winner classifier
    Train {
        /// Override number of trees
        #[arg(long)]
        trees: Option<usize>,
        /// Override the random seed
        #[arg(long)]
        seed: Option<u64>,
        /// Override the held-out fraction
        #[arg(long)]
        test_size: Option<f64>,
    },
    /// Initialize a new project with default config
    Init,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load or create config
    let mut config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    if let Some(season) = cli.season {
        config.season = season;
    }
    if cli.no_artifacts {
        config.visualize = false;
    }

    // Run command
    let result = match cli.command {
        None => commands::run_all(&config, cli.offline),
        Some(Commands::Collect) => commands::collect(&config, cli.offline),
        Some(Commands::Train {
            trees,
            seed,
            test_size,
        }) => {
            if let Some(n) = trees {
                config.training.n_estimators = n;
            }
            if let Some(s) = seed {
                config.training.seed = s;
            }
            if let Some(t) = test_size {
                config.training.test_size = t;
            }
            commands::train(&config, cli.offline).map(|_| ())
        }
        Some(Commands::Init) => commands::init(&cli.config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use f1predict::data::sources::ergast::ErgastClient;
    use f1predict::pipeline::{prepare_directories, Pipeline};
    use f1predict::training::TrainingOutcome;

    fn client(config: &Config, offline: bool) -> Result<ErgastClient> {
        Ok(ErgastClient::from_config(&config.data)?.offline_only(offline))
    }

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        prepare_directories(&config)?;
        println!(
            "Created {}/, {}/ and {}/ directories",
            config.data.data_dir, config.data.results_dir, config.data.models_dir
        );

        println!("\nNext steps:");
        println!("  1. Edit {} to choose the season", config_path);
        println!("  2. Run 'f1predict collect' to fetch results");
        println!("  3. Run 'f1predict train' to train and evaluate the model");

        Ok(())
    }

    pub fn collect(config: &Config, offline: bool) -> Result<()> {
        config.validate()?;
        let season = config.season()?;
        prepare_directories(config)?;

        let source = client(config, offline)?;
        let pipeline = Pipeline::from_config(&source, config);
        let merged = pipeline.collect_and_save(season)?;

        println!(
            "Stored {} merged rows in {}",
            merged.len(),
            pipeline.store().path(season).display()
        );
        if config.visualize {
            println!("Season tables written to {}/", config.data.results_dir);
        }

        Ok(())
    }

    pub fn train(config: &Config, offline: bool) -> Result<TrainingOutcome> {
        config.validate()?;
        let season = config.season()?;
        prepare_directories(config)?;

        let source = client(config, offline)?;
        let pipeline = Pipeline::from_config(&source, config);
        let outcome = pipeline.train(season, &config.training)?;

        print_outcome(&outcome);
        Ok(outcome)
    }

    pub fn run_all(config: &Config, offline: bool) -> Result<()> {
        config.validate()?;
        let season = config.season()?;
        prepare_directories(config)?;

        let source = client(config, offline)?;
        let pipeline = Pipeline::from_config(&source, config);
        let merged = pipeline.collect_and_save(season)?;
        println!("Stored {} merged rows for {}", merged.len(), season);

        let outcome = pipeline.train(season, &config.training)?;
        print_outcome(&outcome);

        println!(
            "\nPipeline completed successfully! Model accuracy: {:.4}",
            outcome.accuracy
        );
        Ok(())
    }

    fn print_outcome(outcome: &TrainingOutcome) {
        println!("Training accuracy: {:.4}", outcome.train_accuracy);
        println!("Testing accuracy: {:.4}", outcome.accuracy);
        println!("\nClassification Report:");
        print!("{}", outcome.report);

        println!("\nWin rate by qualifying position:");
        for (pos, rate) in outcome.winning_positions() {
            println!("Position {}: {:.1}%", pos, rate * 100.0);
        }
    }
}
