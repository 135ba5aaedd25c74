//! Paper Atlas - 3D semantic map of a research paper corpus
//!
//! CLI commands:
//! - gui: Launch the explorer and analysis dashboard (default)
//! - inspect: Load the data once and print an integrity summary

mod analysis;
mod color;
mod config;
mod filter;
mod gui;
mod loader;
mod logging;
mod model;
mod render;
mod state;
mod ui;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "paper_atlas")]
#[command(about = "3D semantic map of a research paper corpus")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to atlas.yaml config
    #[arg(short, long, default_value = "atlas.yaml")]
    config: PathBuf,

    /// Data base: a directory or an http(s) URL holding data/*.json
    #[arg(short, long)]
    data: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch native GUI viewer
    Gui,

    /// Load the dataset and report how consistent it is
    Inspect,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = config::Env::load();
    let _guard = logging::init_logging(&env.log_dir)?;
    tracing::info!("Paper Atlas starting up");

    let cli = Cli::parse();
    tracing::debug!("CLI args parsed: config={:?}, data={:?}", cli.config, cli.data);

    let mut config = if cli.config.exists() {
        tracing::info!("Loading config from {:?}", cli.config);
        config::Config::load(&cli.config)
            .with_context(|| format!("Failed to load config {:?}", cli.config))?
    } else {
        tracing::warn!("Config file not found: {:?}, using defaults", cli.config);
        config::Config::default()
    };
    config.apply_overrides(&env, cli.data.as_deref());
    tracing::info!("Data base: {}", config.data.base);

    match cli.command.unwrap_or(Commands::Gui) {
        Commands::Gui => {
            tracing::info!("Launching native GUI viewer");
            gui::run_viewer(config, tokio::runtime::Handle::current())?;
        }
        Commands::Inspect => {
            inspect(&config).await?;
        }
    }

    Ok(())
}

/// Print counts and integrity findings for the configured data base
async fn inspect(config: &config::Config) -> anyhow::Result<()> {
    let loader = loader::Loader::from_base(&config.data.base)?;
    let dataset = loader.load_dataset().await?;
    let report = dataset.integrity_report();

    println!("Data base: {}", config.data.base);
    println!("  Papers:    {} ({} noise)", report.papers, report.noise_papers);
    println!("  Topics:    {}", report.topics);
    println!("  Journals:  {}", report.journals);
    println!("  Global:    {}", if report.has_global { "present" } else { "missing" });
    println!("  Undefined topic distances: {}", report.undefined_topic_distances);

    if report.is_consistent() {
        println!("Every paper references a known topic.");
    } else {
        println!(
            "{} papers reference unknown topics: {}",
            report.unknown_cluster_papers,
            report.unknown_clusters.iter().cloned().collect::<Vec<_>>().join(", ")
        );
    }

    match loader.load_analysis().await {
        Ok(analysis) => println!(
            "Analysis: {} topics, {} papers",
            analysis.topic_counts.len(),
            analysis.total_papers()
        ),
        Err(e) => println!("Analysis: unavailable ({})", e),
    }

    Ok(())
}
