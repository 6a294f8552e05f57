//! Configuration loading for the topic-model pipeline.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! The default config file lives at `~/.config/plda/config.toml`.

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::PldaError;

/// Record layout of a relation source file.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RelationFormat {
    /// One record per line: two whitespace-separated words.
    #[default]
    Pairs,
    /// `headword<TAB>entry;entry;...`, one edge per entry.
    Dictionary,
}

impl std::fmt::Display for RelationFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelationFormat::Pairs => write!(f, "pairs"),
            RelationFormat::Dictionary => write!(f, "dictionary"),
        }
    }
}

/// Word lists that define the vocabulary universe, read in order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VocabularySettings {
    #[serde(default)]
    pub word_lists: Vec<String>,
}

/// One relation source feeding the similarity graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationSourceSettings {
    pub path: String,

    #[serde(default)]
    pub format: RelationFormat,
}

/// Similarity graph inputs and output location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSettings {
    /// Serialized graph file
    #[serde(default = "default_graph_path")]
    pub graph_path: String,

    #[serde(default)]
    pub sources: Vec<RelationSourceSettings>,
}

fn default_graph_path() -> String {
    ProjectDirs::from("", "", "plda")
        .map(|p| p.data_local_dir().join("graph.txt"))
        .unwrap_or_else(|| PathBuf::from("./graph.txt"))
        .to_string_lossy()
        .to_string()
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            graph_path: default_graph_path(),
            sources: Vec::new(),
        }
    }
}

/// Prior fitting settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriorSettings {
    /// Weight of the graph smoothness term (lambda)
    #[serde(default = "default_smoothness_weight")]
    pub smoothness_weight: f64,

    /// Weight of the pull toward the count-derived anchor (mu)
    #[serde(default = "default_anchor_weight")]
    pub anchor_weight: f64,

    /// L2 penalty on the log-priors, 0 disables it
    #[serde(default)]
    pub ridge: f64,

    /// Pseudo-count added to topic-word counts before taking logs
    #[serde(default = "default_base_beta")]
    pub base_beta: f64,

    /// Multiplier applied to the anchor of seed words
    #[serde(default = "default_seed_boost")]
    pub seed_boost: f64,

    /// Optional seed words, one list per topic
    #[serde(default)]
    pub seed_words: Vec<Vec<String>>,

    /// L-BFGS correction pairs kept
    #[serde(default = "default_history_size")]
    pub history_size: usize,

    #[serde(default = "default_gradient_tolerance")]
    pub gradient_tolerance: f64,

    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
}

fn default_smoothness_weight() -> f64 {
    1.0
}
fn default_anchor_weight() -> f64 {
    1.0
}
fn default_base_beta() -> f64 {
    0.01
}
fn default_seed_boost() -> f64 {
    5.0
}
fn default_history_size() -> usize {
    7
}
fn default_gradient_tolerance() -> f64 {
    1e-5
}
fn default_max_iterations() -> usize {
    200
}

impl Default for PriorSettings {
    fn default() -> Self {
        Self {
            smoothness_weight: default_smoothness_weight(),
            anchor_weight: default_anchor_weight(),
            ridge: 0.0,
            base_beta: default_base_beta(),
            seed_boost: default_seed_boost(),
            seed_words: Vec::new(),
            history_size: default_history_size(),
            gradient_tolerance: default_gradient_tolerance(),
            max_iterations: default_max_iterations(),
        }
    }
}

impl PriorSettings {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.smoothness_weight < 0.0 || self.anchor_weight < 0.0 || self.ridge < 0.0 {
            return Err("prior weights must be >= 0".to_string());
        }
        if self.anchor_weight == 0.0 && self.ridge == 0.0 {
            return Err("anchor_weight or ridge must be > 0 to bound the objective".to_string());
        }
        if self.base_beta <= 0.0 {
            return Err(format!("base_beta must be > 0, got {}", self.base_beta));
        }
        if self.seed_boost < 1.0 {
            return Err(format!("seed_boost must be >= 1, got {}", self.seed_boost));
        }
        if self.history_size == 0 {
            return Err("history_size must be > 0".to_string());
        }
        if self.gradient_tolerance <= 0.0 {
            return Err("gradient_tolerance must be > 0".to_string());
        }
        Ok(())
    }
}

/// Trailing-window plateau test that may end sampling early.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlateauCriterion {
    /// Relative log-likelihood change across `window` sweeps below `tolerance`.
    Likelihood { window: usize, tolerance: f64 },
    /// Assignment change rate below `threshold` for `window` consecutive sweeps.
    ChangeRate { window: usize, threshold: f64 },
}

impl PlateauCriterion {
    pub fn window(&self) -> usize {
        match self {
            PlateauCriterion::Likelihood { window, .. } => *window,
            PlateauCriterion::ChangeRate { window, .. } => *window,
        }
    }
}

/// Gibbs sampling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplerSettings {
    #[serde(default = "default_num_topics")]
    pub num_topics: usize,

    /// Symmetric document-topic prior
    #[serde(default = "default_alpha")]
    pub alpha: f64,

    /// Symmetric topic-word prior used before priors are fitted
    #[serde(default = "default_beta")]
    pub beta: f64,

    /// Seed of the run-scoped random generator
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Sweeps run with symmetric priors before the graph fit
    #[serde(default = "default_warmup_sweeps")]
    pub warmup_sweeps: usize,

    #[serde(default = "default_max_sweeps")]
    pub max_sweeps: usize,

    /// Sweeps during which plateau detection is suspended
    #[serde(default = "default_burn_in")]
    pub burn_in: usize,

    #[serde(default = "default_plateau")]
    pub plateau: Option<PlateauCriterion>,
}

fn default_num_topics() -> usize {
    10
}
fn default_alpha() -> f64 {
    0.1
}
fn default_beta() -> f64 {
    0.01
}
fn default_seed() -> u64 {
    42
}
fn default_warmup_sweeps() -> usize {
    100
}
fn default_max_sweeps() -> usize {
    500
}
fn default_burn_in() -> usize {
    50
}
fn default_plateau() -> Option<PlateauCriterion> {
    Some(PlateauCriterion::Likelihood {
        window: 20,
        tolerance: 1e-4,
    })
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            num_topics: default_num_topics(),
            alpha: default_alpha(),
            beta: default_beta(),
            seed: default_seed(),
            warmup_sweeps: default_warmup_sweeps(),
            max_sweeps: default_max_sweeps(),
            burn_in: default_burn_in(),
            plateau: default_plateau(),
        }
    }
}

impl SamplerSettings {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.num_topics == 0 {
            return Err("num_topics must be > 0".to_string());
        }
        if !(self.alpha > 0.0 && self.beta > 0.0) {
            return Err(format!(
                "alpha and beta must be > 0, got {} and {}",
                self.alpha, self.beta
            ));
        }
        if self.max_sweeps == 0 {
            return Err("max_sweeps must be > 0".to_string());
        }
        if let Some(plateau) = &self.plateau {
            if plateau.window() == 0 {
                return Err("plateau window must be > 0".to_string());
            }
        }
        Ok(())
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub vocabulary: VocabularySettings,

    #[serde(default)]
    pub graph: GraphSettings,

    #[serde(default)]
    pub prior: PriorSettings,

    #[serde(default)]
    pub sampler: SamplerSettings,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            vocabulary: VocabularySettings::default(),
            graph: GraphSettings::default(),
            prior: PriorSettings::default(),
            sampler: SamplerSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/plda/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (PLDA_*, nested keys joined by `__`)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, PldaError> {
        let config_dir = ProjectDirs::from("", "", "plda")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("log_level", default_log_level())
            .map_err(|e| PldaError::Config(e.to_string()))?
            .set_default("graph.graph_path", default_graph_path())
            .map_err(|e| PldaError::Config(e.to_string()))?
            .set_default("sampler.num_topics", default_num_topics() as i64)
            .map_err(|e| PldaError::Config(e.to_string()))?
            .set_default("sampler.seed", default_seed() as i64)
            .map_err(|e| PldaError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // e.g. PLDA_LOG_LEVEL, PLDA_SAMPLER__NUM_TOPICS
        builder = builder.add_source(
            Environment::with_prefix("PLDA")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| PldaError::Config(e.to_string()))?;

        let settings: Settings = config
            .try_deserialize()
            .map_err(|e| PldaError::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<(), PldaError> {
        self.prior.validate().map_err(PldaError::Config)?;
        self.sampler.validate().map_err(PldaError::Config)?;
        if self.prior.seed_words.len() > self.sampler.num_topics {
            return Err(PldaError::Config(format!(
                "{} seed word lists for {} topics",
                self.prior.seed_words.len(),
                self.sampler.num_topics
            )));
        }
        Ok(())
    }

    /// Expand ~ in graph_path to the home directory
    pub fn expanded_graph_path(&self) -> PathBuf {
        expand_home(&self.graph.graph_path)
    }
}

/// Expand a leading `~/` using `$HOME`.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
