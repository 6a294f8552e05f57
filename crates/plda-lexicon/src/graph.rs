//! Word-similarity graph and its incremental builder.
//!
//! The graph is an index-addressed adjacency table over vocabulary ids. Every
//! undirected edge is stored in both endpoint rows with the same weight.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use plda_lexicon::{GraphBuilder, RelationFormat, Vocabulary};
//!
//! let vocab = Vocabulary::from_word_lists(&["words.txt"])?;
//! let mut builder = GraphBuilder::new(&vocab);
//! builder.add_relation_source(Path::new("cooc.txt"), RelationFormat::Pairs)?;
//! builder.add_relation_source(Path::new("dict.tsv"), RelationFormat::Dictionary)?;
//! let graph = builder.build();
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use plda_types::WordId;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::error::LexiconError;
use crate::relation::{parse_line, RelationFormat, SourceStats};
use crate::vocabulary::Vocabulary;

/// Undirected weighted graph over vocabulary ids.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SimilarityGraph {
    adjacency: Vec<BTreeMap<WordId, u32>>,
}

/// Summary figures for logging and inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub num_vertices: usize,
    pub num_edges: usize,
    pub total_weight: u64,
    pub isolated_vertices: usize,
    pub max_degree: usize,
}

impl SimilarityGraph {
    /// Graph with `num_vertices` isolated vertices.
    pub fn empty(num_vertices: usize) -> Self {
        Self {
            adjacency: vec![BTreeMap::new(); num_vertices],
        }
    }

    /// Callers guarantee symmetry and the absence of self-loops.
    pub(crate) fn from_adjacency(adjacency: Vec<BTreeMap<WordId, u32>>) -> Self {
        Self { adjacency }
    }

    pub fn num_vertices(&self) -> usize {
        self.adjacency.len()
    }

    /// Number of undirected edges.
    pub fn num_edges(&self) -> usize {
        self.adjacency.iter().map(BTreeMap::len).sum::<usize>() / 2
    }

    /// Neighbors of `vertex` with edge weights, in ascending id order.
    ///
    /// # Panics
    /// Panics if `vertex` is out of range.
    pub fn neighbors(&self, vertex: WordId) -> impl Iterator<Item = (WordId, u32)> + '_ {
        self.adjacency[vertex as usize].iter().map(|(&n, &w)| (n, w))
    }

    pub fn weight(&self, a: WordId, b: WordId) -> Option<u32> {
        self.adjacency.get(a as usize)?.get(&b).copied()
    }

    pub fn degree(&self, vertex: WordId) -> usize {
        self.adjacency[vertex as usize].len()
    }

    /// Sum of the weights of all edges touching `vertex`.
    pub fn weighted_degree(&self, vertex: WordId) -> u64 {
        self.adjacency[vertex as usize]
            .values()
            .map(|&w| u64::from(w))
            .sum()
    }

    /// Sum of edge weights, each undirected edge counted once.
    pub fn total_weight(&self) -> u64 {
        self.adjacency
            .iter()
            .enumerate()
            .flat_map(|(v, row)| {
                row.iter()
                    .filter(move |&(&n, _)| (n as usize) > v)
                    .map(|(_, &w)| u64::from(w))
            })
            .sum()
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            num_vertices: self.num_vertices(),
            num_edges: self.num_edges(),
            total_weight: self.total_weight(),
            isolated_vertices: self.adjacency.iter().filter(|row| row.is_empty()).count(),
            max_degree: self.adjacency.iter().map(BTreeMap::len).max().unwrap_or(0),
        }
    }

    pub(crate) fn rows(&self) -> &[BTreeMap<WordId, u32>] {
        &self.adjacency
    }
}

/// What happened to a single asserted relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationOutcome {
    /// New edge, or an existing edge whose weight grew by one
    Added,
    /// At least one word is not in the vocabulary
    UnknownWord,
    /// Both sides name the same word
    SelfReference,
}

/// Accumulates relation evidence into a [`SimilarityGraph`].
///
/// Repeating a pair, within a source or across sources, increments its
/// weight by one, so the final weight counts source-wide support.
#[derive(Debug)]
pub struct GraphBuilder<'v> {
    vocabulary: &'v Vocabulary,
    adjacency: Vec<BTreeMap<WordId, u32>>,
    totals: SourceStats,
    sources: usize,
}

impl<'v> GraphBuilder<'v> {
    /// Create a builder whose vertices are the ids of `vocabulary`.
    pub fn new(vocabulary: &'v Vocabulary) -> Self {
        Self {
            vocabulary,
            adjacency: vec![BTreeMap::new(); vocabulary.len()],
            totals: SourceStats::default(),
            sources: 0,
        }
    }

    /// Assert an edge between two vocabulary ids.
    pub fn add_relation(&mut self, a: WordId, b: WordId) -> RelationOutcome {
        let n = self.adjacency.len();
        if a as usize >= n || b as usize >= n {
            return RelationOutcome::UnknownWord;
        }
        if a == b {
            return RelationOutcome::SelfReference;
        }

        *self.adjacency[a as usize].entry(b).or_insert(0) += 1;
        *self.adjacency[b as usize].entry(a).or_insert(0) += 1;
        RelationOutcome::Added
    }

    /// Assert an edge between two surface words.
    ///
    /// Words outside the vocabulary are skipped silently.
    pub fn add_word_pair(&mut self, word_a: &str, word_b: &str) -> RelationOutcome {
        match (self.vocabulary.id_of(word_a), self.vocabulary.id_of(word_b)) {
            (Some(a), Some(b)) => self.add_relation(a, b),
            _ => RelationOutcome::UnknownWord,
        }
    }

    /// Parse a relation file and add every pair it asserts.
    ///
    /// Malformed lines are skipped with a warning; they do not abort the source.
    ///
    /// # Errors
    ///
    /// Returns `MissingResource` if the file cannot be read.
    #[instrument(skip(self))]
    pub fn add_relation_source(
        &mut self,
        path: &Path,
        format: RelationFormat,
    ) -> Result<SourceStats, LexiconError> {
        let bytes = std::fs::read(path).map_err(|e| LexiconError::missing(path, e))?;
        let lines = bytes.split(|&b| b == b'\n').map(|line| {
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            std::str::from_utf8(line).map_err(|e| format!("invalid UTF-8: {}", e))
        });
        let stats = self.add_relation_lines(lines, format, &path.display().to_string());

        info!(
            path = %path.display(),
            format = %format,
            records = stats.records,
            edges_added = stats.edges_added,
            unknown_words = stats.unknown_words,
            malformed = stats.malformed,
            "Added relation source"
        );
        Ok(stats)
    }

    /// Ingest relation records held in memory. `source` names them in warnings.
    pub fn add_relation_text(
        &mut self,
        content: &str,
        format: RelationFormat,
        source: &str,
    ) -> SourceStats {
        self.add_relation_lines(content.lines().map(Ok), format, source)
    }

    /// Lines that failed to decode count as malformed.
    fn add_relation_lines<'a, I>(
        &mut self,
        lines: I,
        format: RelationFormat,
        source: &str,
    ) -> SourceStats
    where
        I: Iterator<Item = Result<&'a str, String>>,
    {
        let mut stats = SourceStats::default();

        for (index, line) in lines.enumerate() {
            let pairs = match line.and_then(|line| parse_line(line, format)) {
                Ok(pairs) => pairs,
                Err(message) => {
                    warn!(
                        source = %source,
                        line = index + 1,
                        error = %message,
                        "Skipping malformed relation line"
                    );
                    stats.malformed += 1;
                    continue;
                }
            };

            for (a, b) in pairs {
                stats.records += 1;
                match self.add_word_pair(a, b) {
                    RelationOutcome::Added => stats.edges_added += 1,
                    RelationOutcome::UnknownWord => stats.unknown_words += 1,
                    RelationOutcome::SelfReference => {
                        debug!(word = %a, "Ignoring self-relation");
                        stats.self_references += 1;
                    }
                }
            }
        }

        self.sources += 1;
        self.totals.merge(stats);
        stats
    }

    /// Counters accumulated over every source added so far.
    pub fn totals(&self) -> SourceStats {
        self.totals
    }

    /// Number of distinct undirected edges so far.
    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(BTreeMap::len).sum::<usize>() / 2
    }

    /// Finalize the adjacency table.
    pub fn build(self) -> SimilarityGraph {
        let graph = SimilarityGraph::from_adjacency(self.adjacency);
        debug!(
            sources = self.sources,
            vertices = graph.num_vertices(),
            edges = graph.num_edges(),
            "Built similarity graph"
        );
        graph
    }
}
