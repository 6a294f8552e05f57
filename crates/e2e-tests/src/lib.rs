//! End-to-end test infrastructure for the topic-model pipeline.
//!
//! Provides a shared TestHarness that lays out word lists, relation sources,
//! corpus directories and labels files in a temp directory.

use std::fs;
use std::path::{Path, PathBuf};

use plda_types::Settings;

/// Fruit and sport words, two clean clusters.
pub const FIXTURE_WORDS: &str = "apple pear plum cherry\ngoal match referee striker\n";

/// Co-occurrence pairs linking words inside each cluster.
pub const FIXTURE_PAIRS: &str = "\
apple pear
pear plum
plum cherry
goal match
match referee
referee striker
";

/// Corpus documents (id, text).
pub const FIXTURE_DOCS: &[(&str, &str)] = &[
    ("fruit-1.txt", "apple pear apple plum pear apple"),
    ("fruit-2.txt", "pear plum cherry plum pear cherry"),
    ("fruit-3.txt", "cherry apple plum apple cherry pear"),
    ("sport-1.txt", "goal match goal referee match goal"),
    ("sport-2.txt", "striker goal striker match referee"),
    ("sport-3.txt", "referee match striker goal match referee"),
];

/// Shared test harness for E2E tests.
pub struct TestHarness {
    /// Keeps temp dir alive for the lifetime of the harness
    pub _temp_dir: tempfile::TempDir,
    /// Root of the temp dir
    pub root: PathBuf,
}

impl TestHarness {
    /// Create a new test harness with an empty temp directory.
    pub fn new() -> Self {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path().to_path_buf();
        Self {
            _temp_dir: temp_dir,
            root,
        }
    }

    /// Write `content` to `name` below the root, creating parents.
    pub fn write_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.root.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        fs::write(&path, content).expect("Failed to write fixture file");
        path
    }

    /// Write each document as its own file under `dir`.
    pub fn write_corpus(&self, dir: &str, docs: &[(&str, &str)]) -> PathBuf {
        let corpus_dir = self.root.join(dir);
        fs::create_dir_all(&corpus_dir).expect("Failed to create corpus dir");
        for (name, text) in docs {
            fs::write(corpus_dir.join(name), text).expect("Failed to write document");
        }
        corpus_dir
    }

    /// Path below the root, not created.
    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Settings pointing at this harness, with a short deterministic schedule.
    pub fn settings(&self, num_topics: usize) -> Settings {
        let mut settings = Settings::default();
        settings.graph.graph_path = path_string(&self.path("graph.txt"));
        settings.sampler.num_topics = num_topics;
        settings.sampler.seed = 11;
        settings.sampler.warmup_sweeps = 100;
        settings.sampler.max_sweeps = 60;
        settings.sampler.burn_in = 10;
        settings.sampler.plateau = None;
        settings
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Lossy UTF-8 rendering of a path for settings fields.
pub fn path_string(path: &Path) -> String {
    path.to_string_lossy().to_string()
}
