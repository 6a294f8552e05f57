//! plda
//!
//! Graph-regularized topic modeling from the command line.
//!
//! # Usage
//!
//! ```bash
//! plda build-graph --word-list words.txt --pairs cooc.txt --dictionary en-de.tsv
//! plda inspect-graph [GRAPH]
//! plda train --corpus docs/ [--labels labels.tsv] [--output report.json]
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/plda/config.toml)
//! 3. Environment variables (PLDA_*)
//! 4. CLI flags

use anyhow::Result;
use clap::Parser;

use plda_cli::{build_graph, init_logging, inspect_graph, load_settings, train, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref(), cli.log_level.as_deref())?;
    init_logging(&settings.log_level)?;

    match cli.command {
        Commands::BuildGraph(args) => {
            let stats = build_graph(&settings, &args)?;
            println!(
                "Built graph: {} vertices, {} edges (total weight {})",
                stats.num_vertices, stats.num_edges, stats.total_weight
            );
        }
        Commands::InspectGraph { graph, word_lists } => {
            inspect_graph(&settings, graph.as_deref(), &word_lists)?;
        }
        Commands::Train(args) => {
            train(settings, args).await?;
        }
    }

    Ok(())
}
