//! Command implementations for the `plda` binary.
//!
//! - build-graph: vocabulary + relation sources -> graph file
//! - inspect-graph: graph file -> summary statistics
//! - train: warm-up sampling, prior fitting over the graph, main sampling,
//!   JSON report

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::signal;
use tracing::{info, warn};

use plda_lexicon::{read_graph, write_graph, GraphBuilder, GraphStats, SimilarityGraph, Vocabulary};
use plda_prior::{resolve_seed_words, Optimized, PriorFitter};
use plda_sampler::{
    read_labels, ConvergencePolicy, Corpus, DirectoryCorpus, GibbsSampler, RunReport, StopHandle,
    TerminationReason,
};
use plda_types::{expand_home, RelationFormat, RelationSourceSettings, Settings};

use crate::cli::{BuildGraphArgs, TrainArgs};

/// Load settings and apply the global CLI overrides.
pub fn load_settings(config_path: Option<&str>, log_level: Option<&str>) -> Result<Settings> {
    let mut settings = Settings::load(config_path).context("Failed to load configuration")?;
    if let Some(log_level) = log_level {
        settings.log_level = log_level.to_string();
    }
    Ok(settings)
}

/// Install the global tracing subscriber.
pub fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

/// Vocabulary from explicit word lists, falling back to the configured ones.
pub fn load_vocabulary(settings: &Settings, overrides: &[String]) -> Result<Vocabulary> {
    let lists: Vec<PathBuf> = if overrides.is_empty() {
        settings
            .vocabulary
            .word_lists
            .iter()
            .map(|p| expand_home(p))
            .collect()
    } else {
        overrides.iter().map(|p| expand_home(p)).collect()
    };
    if lists.is_empty() {
        anyhow::bail!("No word lists given (use --word-list or vocabulary.word_lists)");
    }
    Vocabulary::from_word_lists(&lists).context("Failed to load vocabulary")
}

fn graph_path(settings: &Settings, path: Option<&str>) -> PathBuf {
    match path {
        Some(path) => expand_home(path),
        None => settings.expanded_graph_path(),
    }
}

/// Build the similarity graph and write it out.
pub fn build_graph(settings: &Settings, args: &BuildGraphArgs) -> Result<GraphStats> {
    let vocabulary = load_vocabulary(settings, &args.word_lists)?;

    let mut sources: Vec<RelationSourceSettings> = settings.graph.sources.clone();
    sources.extend(args.pairs.iter().map(|path| RelationSourceSettings {
        path: path.clone(),
        format: RelationFormat::Pairs,
    }));
    sources.extend(args.dictionary.iter().map(|path| RelationSourceSettings {
        path: path.clone(),
        format: RelationFormat::Dictionary,
    }));
    if sources.is_empty() {
        warn!("No relation sources given, graph will have no edges");
    }

    let mut builder = GraphBuilder::new(&vocabulary);
    for source in &sources {
        let path = expand_home(&source.path);
        builder
            .add_relation_source(&path, source.format)
            .with_context(|| format!("Failed to read relation source {}", path.display()))?;
    }
    let totals = builder.totals();
    if totals.malformed > 0 {
        warn!(malformed = totals.malformed, "Some relation lines were skipped");
    }
    let graph = builder.build();

    let output = graph_path(settings, args.output.as_deref());
    write_graph(&graph, &output).context("Failed to write graph")?;
    Ok(graph.stats())
}

/// Read a graph file and print its statistics.
pub fn inspect_graph(
    settings: &Settings,
    path: Option<&str>,
    word_lists: &[String],
) -> Result<GraphStats> {
    let expected = if word_lists.is_empty() {
        None
    } else {
        Some(load_vocabulary(settings, word_lists)?.len())
    };
    let path = graph_path(settings, path);
    let graph = read_graph(&path, expected).context("Failed to read graph")?;
    let stats = graph.stats();

    println!("Graph: {}", path.display());
    println!("  Vertices:          {}", stats.num_vertices);
    println!("  Edges:             {}", stats.num_edges);
    println!("  Total weight:      {}", stats.total_weight);
    println!("  Isolated vertices: {}", stats.isolated_vertices);
    println!("  Max degree:        {}", stats.max_degree);
    Ok(stats)
}

/// A word and its probability under a topic.
#[derive(Debug, Clone, Serialize)]
pub struct WordWeight {
    pub word: String,
    pub probability: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopicSummary {
    pub topic: usize,
    pub top_words: Vec<WordWeight>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentTopics {
    pub id: String,
    pub theta: Vec<f64>,
}

/// Everything a training run reports.
#[derive(Debug, Clone, Serialize)]
pub struct TrainReport {
    pub created_at: DateTime<Utc>,
    pub num_topics: usize,
    pub documents: usize,
    pub tokens: usize,
    pub dropped_tokens: usize,
    pub warmup: Option<RunReport>,
    pub prior_fit: Option<Optimized>,
    pub sampling: Option<RunReport>,
    pub log_likelihood: f64,
    pub topics: Vec<TopicSummary>,
    pub document_topics: Vec<DocumentTopics>,
}

impl TrainReport {
    /// True if either phase ended on a stop request.
    pub fn cancelled(&self) -> bool {
        [&self.warmup, &self.sampling]
            .iter()
            .any(|run| matches!(run, Some(r) if r.reason == TerminationReason::Cancelled))
    }
}

/// Warm-up with symmetric priors, fit priors over the graph, then sample
/// with the fitted priors.
///
/// A stop request skips the remaining phases; the report still describes the
/// last consistent state.
pub fn run_training(
    settings: &Settings,
    vocabulary: &Vocabulary,
    graph: &SimilarityGraph,
    corpus: Corpus,
    stop: StopHandle,
    top_words: usize,
) -> Result<TrainReport> {
    let mut sampler = GibbsSampler::from_settings(&settings.sampler, vocabulary.len())
        .context("Invalid sampler settings")?
        .with_stop_handle(stop);
    let documents = corpus.len();
    let tokens = corpus.num_tokens();
    let dropped_tokens = corpus.dropped_tokens();
    sampler.load(corpus).context("Failed to load corpus")?;

    let mut warmup = None;
    if settings.sampler.warmup_sweeps > 0 {
        let report = sampler
            .run(&ConvergencePolicy::fixed(settings.sampler.warmup_sweeps))
            .context("Warm-up sampling failed")?;
        warmup = Some(report);
    }

    let mut prior_fit = None;
    let mut sampling = None;
    if !matches!(&warmup, Some(r) if r.reason == TerminationReason::Cancelled) {
        let fitter =
            PriorFitter::new(graph, settings.prior.clone()).context("Invalid prior settings")?;
        let seeds = resolve_seed_words(vocabulary, &settings.prior.seed_words);
        let fitted = fitter
            .fit(sampler.counts().topic_word_rows(), &seeds)
            .context("Prior fitting failed")?;
        sampler
            .set_word_priors(fitted.priors)
            .context("Fitted priors do not match the sampler")?;
        prior_fit = Some(fitted.outcome);

        let report = sampler
            .run(&ConvergencePolicy::from_settings(&settings.sampler))
            .context("Sampling failed")?;
        sampling = Some(report);
    }

    let topics = sampler
        .top_words(top_words)
        .into_iter()
        .enumerate()
        .map(|(topic, words)| TopicSummary {
            topic,
            top_words: words
                .into_iter()
                .map(|(id, probability)| WordWeight {
                    word: vocabulary.word_of(id).unwrap_or_default().to_string(),
                    probability,
                })
                .collect(),
        })
        .collect();
    let document_topics = sampler
        .corpus()
        .documents()
        .iter()
        .zip(sampler.theta())
        .map(|(doc, theta)| DocumentTopics {
            id: doc.id.clone(),
            theta,
        })
        .collect();

    Ok(TrainReport {
        created_at: Utc::now(),
        num_topics: sampler.num_topics(),
        documents,
        tokens,
        dropped_tokens,
        warmup,
        prior_fit,
        sampling,
        log_likelihood: sampler.log_likelihood(),
        topics,
        document_topics,
    })
}

/// Load inputs, train on a blocking thread, and write the report.
///
/// Ctrl+C requests a stop at the next sweep boundary.
pub async fn train(mut settings: Settings, args: TrainArgs) -> Result<TrainReport> {
    if let Some(topics) = args.topics {
        settings.sampler.num_topics = topics;
    }
    if let Some(seed) = args.seed {
        settings.sampler.seed = seed;
    }
    if let Some(max_sweeps) = args.max_sweeps {
        settings.sampler.max_sweeps = max_sweeps;
    }
    settings.validate().context("Invalid configuration")?;

    let vocabulary = load_vocabulary(&settings, &args.word_lists)?;
    let graph_file = graph_path(&settings, args.graph.as_deref());
    let graph = read_graph(&graph_file, Some(vocabulary.len())).context("Failed to read graph")?;

    let adapter = DirectoryCorpus::new(expand_home(&args.corpus)).context("Failed to open corpus")?;
    let mut corpus = Corpus::from_adapter(&adapter, &vocabulary).context("Failed to load corpus")?;
    if let Some(labels) = &args.labels {
        let labels = read_labels(&expand_home(labels)).context("Failed to read labels")?;
        let applied = corpus.apply_labels(&labels);
        info!(labeled = applied, "Applied document labels");
    }

    let stop = StopHandle::new();
    let watcher_stop = stop.clone();
    let watcher = tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, stopping after the current sweep...");
            watcher_stop.request_stop();
        }
    });

    let top_words = args.top_words;
    let task_settings = settings.clone();
    let report = tokio::task::spawn_blocking(move || {
        run_training(&task_settings, &vocabulary, &graph, corpus, stop, top_words)
    })
    .await
    .context("Training task failed")??;
    watcher.abort();

    let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
    match &args.output {
        Some(path) => {
            write_report(&expand_home(path), &json)?;
            info!(path = %path, "Wrote training report");
        }
        None => println!("{}", json),
    }
    if report.cancelled() {
        warn!("Training was cancelled before completion");
    }
    Ok(report)
}

fn write_report(path: &Path, json: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).context("Failed to create report directory")?;
        }
    }
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use plda_sampler::InMemoryCorpus;
    use tempfile::TempDir;

    fn settings_for(dir: &TempDir) -> Settings {
        let mut settings = Settings::default();
        settings.graph.graph_path = dir.path().join("graph.txt").to_string_lossy().to_string();
        settings.sampler.num_topics = 2;
        settings.sampler.warmup_sweeps = 5;
        settings.sampler.max_sweeps = 10;
        settings.sampler.burn_in = 0;
        settings.sampler.plateau = None;
        settings
    }

    fn write(dir: &TempDir, name: &str, content: &str) -> String {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path.to_string_lossy().to_string()
    }

    #[test]
    fn test_load_vocabulary_requires_lists() {
        let settings = Settings::default();
        assert!(load_vocabulary(&settings, &[]).is_err());
    }

    #[test]
    fn test_build_and_inspect_graph() {
        let dir = TempDir::new().unwrap();
        let settings = settings_for(&dir);
        let args = BuildGraphArgs {
            word_lists: vec![write(&dir, "words.txt", "cat dog kitten puppy")],
            pairs: vec![write(&dir, "pairs.txt", "cat kitten\ndog puppy\ncat kitten\nfoo bar\n")],
            dictionary: vec![write(&dir, "dict.tsv", "dog\tpuppy;cat\n")],
            output: None,
        };

        let stats = build_graph(&settings, &args).unwrap();
        assert_eq!(stats.num_vertices, 4);
        assert_eq!(stats.num_edges, 3);
        assert_eq!(stats.total_weight, 5);

        let inspected = inspect_graph(&settings, None, &args.word_lists).unwrap();
        assert_eq!(inspected, stats);
    }

    #[test]
    fn test_missing_relation_source_fails() {
        let dir = TempDir::new().unwrap();
        let settings = settings_for(&dir);
        let args = BuildGraphArgs {
            word_lists: vec![write(&dir, "words.txt", "a b")],
            pairs: vec!["/no/such/pairs.txt".to_string()],
            ..BuildGraphArgs::default()
        };
        assert!(build_graph(&settings, &args).is_err());
    }

    #[test]
    fn test_run_training_reports_all_phases() {
        let dir = TempDir::new().unwrap();
        let settings = settings_for(&dir);
        let vocabulary = Vocabulary::from_words(["apple", "pear", "goal", "match"]);
        let mut builder = GraphBuilder::new(&vocabulary);
        builder.add_word_pair("apple", "pear");
        let graph = builder.build();

        let mut adapter = InMemoryCorpus::new();
        adapter.push_text("fruit", "apple pear apple pear");
        adapter.push_text("sport", "goal match goal referee");
        let corpus = Corpus::from_adapter(&adapter, &vocabulary).unwrap();

        let report =
            run_training(&settings, &vocabulary, &graph, corpus, StopHandle::new(), 3).unwrap();

        assert_eq!(report.num_topics, 2);
        assert_eq!(report.documents, 2);
        assert_eq!(report.tokens, 7);
        assert_eq!(report.dropped_tokens, 1);
        assert_eq!(report.warmup.as_ref().unwrap().sweeps, 5);
        assert!(report.prior_fit.is_some());
        assert_eq!(report.sampling.as_ref().unwrap().sweeps, 10);
        assert_eq!(report.topics.len(), 2);
        assert_eq!(report.topics[0].top_words.len(), 3);
        assert_eq!(report.document_topics[1].id, "sport");
        assert!(!report.cancelled());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["sampling"]["reason"], "max_sweeps");
    }

    #[test]
    fn test_run_training_cancelled_skips_fit() {
        let dir = TempDir::new().unwrap();
        let settings = settings_for(&dir);
        let vocabulary = Vocabulary::from_words(["a", "b"]);
        let graph = SimilarityGraph::empty(2);
        let mut adapter = InMemoryCorpus::new();
        adapter.push_text("d", "a b a");
        let corpus = Corpus::from_adapter(&adapter, &vocabulary).unwrap();

        let stop = StopHandle::new();
        stop.request_stop();
        let report = run_training(&settings, &vocabulary, &graph, corpus, stop, 2).unwrap();

        assert!(report.cancelled());
        assert!(report.prior_fit.is_none());
        assert!(report.sampling.is_none());
    }
}
