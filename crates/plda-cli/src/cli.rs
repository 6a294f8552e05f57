//! CLI argument parsing for the `plda` binary.
//!
//! CLI flags override every other configuration source.

use clap::{Args, Parser, Subcommand};

/// Graph-regularized topic modeling
///
/// Builds a word-similarity graph, fits graph-smoothed topic-word priors and
/// runs collapsed Gibbs sampling over a corpus directory.
#[derive(Parser, Debug)]
#[command(name = "plda")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/plda/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Pipeline commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the similarity graph from word lists and relation sources
    BuildGraph(BuildGraphArgs),

    /// Print summary statistics of a graph file
    InspectGraph {
        /// Graph file (default from config)
        graph: Option<String>,

        /// Word list(s) whose size the graph must match
        #[arg(long = "word-list")]
        word_lists: Vec<String>,
    },

    /// Sample, fit priors over the graph, and sample again
    Train(TrainArgs),
}

/// Arguments for `build-graph`.
#[derive(Args, Debug, Clone, Default)]
pub struct BuildGraphArgs {
    /// Word list file, repeatable; replaces the configured lists
    #[arg(long = "word-list")]
    pub word_lists: Vec<String>,

    /// Co-occurrence pairs file (`word word` per line), repeatable
    #[arg(long)]
    pub pairs: Vec<String>,

    /// Dictionary file (`head<TAB>entry;entry`), repeatable
    #[arg(long)]
    pub dictionary: Vec<String>,

    /// Output graph file (default from config)
    #[arg(short, long)]
    pub output: Option<String>,
}

/// Arguments for `train`.
#[derive(Args, Debug, Clone, Default)]
pub struct TrainArgs {
    /// Directory with one document per file
    #[arg(long)]
    pub corpus: String,

    /// Labels file (`doc_id<TAB>t1,t2`)
    #[arg(long)]
    pub labels: Option<String>,

    /// Word list file, repeatable; replaces the configured lists
    #[arg(long = "word-list")]
    pub word_lists: Vec<String>,

    /// Graph file (default from config)
    #[arg(short, long)]
    pub graph: Option<String>,

    /// Write the JSON report here instead of stdout
    #[arg(short, long)]
    pub output: Option<String>,

    /// Override number of topics
    #[arg(short = 'k', long)]
    pub topics: Option<usize>,

    /// Override RNG seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Override sweep cap of the main phase
    #[arg(long)]
    pub max_sweeps: Option<usize>,

    /// Words listed per topic in the report
    #[arg(long, default_value = "10")]
    pub top_words: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_build_graph() {
        let cli = Cli::parse_from([
            "plda",
            "build-graph",
            "--word-list",
            "en.txt",
            "--word-list",
            "de.txt",
            "--pairs",
            "cooc.txt",
            "--dictionary",
            "en-de.tsv",
            "-o",
            "graph.txt",
        ]);
        match cli.command {
            Commands::BuildGraph(args) => {
                assert_eq!(args.word_lists, vec!["en.txt", "de.txt"]);
                assert_eq!(args.pairs, vec!["cooc.txt"]);
                assert_eq!(args.dictionary, vec!["en-de.tsv"]);
                assert_eq!(args.output, Some("graph.txt".to_string()));
            }
            _ => panic!("Expected BuildGraph command"),
        }
    }

    #[test]
    fn test_cli_inspect_graph() {
        let cli = Cli::parse_from(["plda", "inspect-graph", "/tmp/graph.txt"]);
        match cli.command {
            Commands::InspectGraph { graph, word_lists } => {
                assert_eq!(graph, Some("/tmp/graph.txt".to_string()));
                assert!(word_lists.is_empty());
            }
            _ => panic!("Expected InspectGraph command"),
        }
    }

    #[test]
    fn test_cli_train() {
        let cli = Cli::parse_from([
            "plda", "train", "--corpus", "docs", "-k", "5", "--seed", "7", "--labels", "l.tsv",
        ]);
        match cli.command {
            Commands::Train(args) => {
                assert_eq!(args.corpus, "docs");
                assert_eq!(args.topics, Some(5));
                assert_eq!(args.seed, Some(7));
                assert_eq!(args.labels, Some("l.tsv".to_string()));
                assert_eq!(args.top_words, 10);
                assert!(args.max_sweeps.is_none());
            }
            _ => panic!("Expected Train command"),
        }
    }

    #[test]
    fn test_cli_train_requires_corpus() {
        assert!(Cli::try_parse_from(["plda", "train"]).is_err());
    }

    #[test]
    fn test_cli_with_config() {
        let cli = Cli::parse_from(["plda", "--config", "/path/to/config.toml", "inspect-graph"]);
        assert_eq!(cli.config, Some("/path/to/config.toml".to_string()));
    }

    #[test]
    fn test_cli_with_log_level() {
        let cli = Cli::parse_from(["plda", "inspect-graph", "--log-level", "debug"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }
}
