//! Text serialization of [`SimilarityGraph`].
//!
//! Line `i` (in vertex id order) lists the neighbors of vertex `i` as
//! space-separated `id:weight` tokens in ascending id order. An isolated
//! vertex is an empty line. A bare `id` token reads as weight 1.
//!
//! ```text
//! 1:2 4:1
//! 0:2
//!
//! ```
//!
//! Reading is strict: any malformed token, out-of-range id, self-loop,
//! zero weight, duplicate neighbor or one-sided edge fails the whole file.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use plda_types::WordId;
use tracing::{debug, info, instrument};

use crate::error::LexiconError;
use crate::graph::SimilarityGraph;

/// Render the graph in its text form.
pub fn serialize(graph: &SimilarityGraph) -> String {
    let mut out = String::new();
    for row in graph.rows() {
        let mut first = true;
        for (neighbor, weight) in row {
            if !first {
                out.push(' ');
            }
            first = false;
            // Writing into a String cannot fail
            let _ = write!(out, "{}:{}", neighbor, weight);
        }
        out.push('\n');
    }
    out
}

/// Write the graph to `path`, creating parent directories as needed.
#[instrument(skip(graph))]
pub fn write_graph(graph: &SimilarityGraph, path: &Path) -> Result<(), LexiconError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut writer = BufWriter::new(fs::File::create(path)?);
    writer.write_all(serialize(graph).as_bytes())?;
    writer.flush()?;

    info!(
        path = %path.display(),
        vertices = graph.num_vertices(),
        edges = graph.num_edges(),
        "Wrote similarity graph"
    );
    Ok(())
}

/// Parse the text form.
///
/// When `expected_vertices` is set, the line count must match it (normally
/// the vocabulary size).
pub fn deserialize(
    text: &str,
    expected_vertices: Option<usize>,
) -> Result<SimilarityGraph, LexiconError> {
    let rows: Vec<&str> = text.lines().collect();
    let n = rows.len();

    if let Some(expected) = expected_vertices {
        if expected != n {
            return Err(LexiconError::parse(
                n.min(expected) + 1,
                format!("graph has {} vertices, expected {}", n, expected),
            ));
        }
    }

    let mut adjacency: Vec<BTreeMap<WordId, u32>> = Vec::with_capacity(n);
    for (vertex, row) in rows.iter().enumerate() {
        let line = vertex + 1;
        let mut neighbors = BTreeMap::new();

        for token in row.split_whitespace() {
            let (id, weight) = parse_token(token).map_err(|msg| LexiconError::parse(line, msg))?;

            if id as usize >= n {
                return Err(LexiconError::parse(
                    line,
                    format!("neighbor {} out of range for {} vertices", id, n),
                ));
            }
            if id as usize == vertex {
                return Err(LexiconError::parse(line, format!("self-loop on {}", vertex)));
            }
            if neighbors.insert(id, weight).is_some() {
                return Err(LexiconError::parse(line, format!("duplicate neighbor {}", id)));
            }
        }
        adjacency.push(neighbors);
    }

    for (vertex, row) in adjacency.iter().enumerate() {
        for (&neighbor, &weight) in row {
            let reverse = adjacency[neighbor as usize].get(&(vertex as WordId));
            if reverse != Some(&weight) {
                return Err(LexiconError::parse(
                    vertex + 1,
                    format!(
                        "edge {}-{} (weight {}) has no matching reverse edge",
                        vertex, neighbor, weight
                    ),
                ));
            }
        }
    }

    let graph = SimilarityGraph::from_adjacency(adjacency);
    debug!(
        vertices = graph.num_vertices(),
        edges = graph.num_edges(),
        "Parsed similarity graph"
    );
    Ok(graph)
}

/// Read a graph file.
///
/// # Errors
///
/// `MissingResource` when the file cannot be read, `Parse` for any structural
/// problem.
#[instrument]
pub fn read_graph(
    path: &Path,
    expected_vertices: Option<usize>,
) -> Result<SimilarityGraph, LexiconError> {
    let text = fs::read_to_string(path).map_err(|e| LexiconError::missing(path, e))?;
    let graph = deserialize(&text, expected_vertices)?;
    info!(
        path = %path.display(),
        vertices = graph.num_vertices(),
        edges = graph.num_edges(),
        "Loaded similarity graph"
    );
    Ok(graph)
}

fn parse_token(token: &str) -> Result<(WordId, u32), String> {
    let (id, weight) = match token.split_once(':') {
        Some((id, weight)) => (id, Some(weight)),
        None => (token, None),
    };

    let id: WordId = id
        .parse()
        .map_err(|_| format!("invalid neighbor id {:?}", id))?;
    let weight = match weight {
        Some(w) => w.parse().map_err(|_| format!("invalid weight {:?}", w))?,
        None => 1,
    };
    if weight == 0 {
        return Err(format!("zero weight for neighbor {}", id));
    }
    Ok((id, weight))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;
    use crate::relation::RelationFormat;
    use crate::vocabulary::Vocabulary;

    /// Nine vertices named "0".."8" with a handful of relations.
    fn fixture_graph() -> SimilarityGraph {
        let vocab = Vocabulary::from_words((0..9).map(|i| i.to_string()));
        let mut builder = GraphBuilder::new(&vocab);
        builder.add_relation_text(
            "1 2\n3 8\n0 4\n2 5\n2 1\n6 7\n",
            RelationFormat::Pairs,
            "fixture",
        );
        builder.build()
    }

    #[test]
    fn test_serialize_format() {
        let graph = fixture_graph();
        let text = serialize(&graph);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 9);
        assert_eq!(lines[0], "4:1");
        assert_eq!(lines[1], "2:2");
        assert_eq!(lines[2], "1:2 5:1");
        assert_eq!(lines[3], "8:1");
        assert_eq!(lines[8], "3:1");
    }

    #[test]
    fn test_round_trip() {
        let graph = fixture_graph();
        let parsed = deserialize(&serialize(&graph), Some(9)).unwrap();
        assert_eq!(parsed, graph);
        assert_eq!(parsed.weight(1, 2), Some(2));
        assert_eq!(parsed.weight(3, 8), Some(1));
        assert_eq!(parsed.weight(8, 3), Some(1));
    }

    #[test]
    fn test_reserialize_is_byte_identical() {
        let text = serialize(&fixture_graph());
        let again = serialize(&deserialize(&text, None).unwrap());
        assert_eq!(text, again);
    }

    #[test]
    fn test_isolated_trailing_vertices() {
        let graph = SimilarityGraph::empty(3);
        let text = serialize(&graph);
        assert_eq!(text, "\n\n\n");
        assert_eq!(deserialize(&text, Some(3)).unwrap().num_vertices(), 3);
    }

    #[test]
    fn test_bare_ids_read_as_unit_weight() {
        let graph = deserialize("1 2\n0\n0\n", None).unwrap();
        assert_eq!(graph.weight(0, 1), Some(1));
        assert_eq!(graph.weight(2, 0), Some(1));
        assert_eq!(serialize(&graph), "1:1 2:1\n0:1\n0:1\n");
    }

    #[test]
    fn test_asymmetric_edge_is_fatal() {
        let result = deserialize("1:1\n\n", None);
        match result {
            Err(LexiconError::Parse { line, message }) => {
                assert_eq!(line, 1);
                assert!(message.contains("reverse"));
            }
            other => panic!("Expected Parse error, got {:?}", other),
        }

        // Same pair, different weights
        assert!(deserialize("1:2\n0:1\n", None).is_err());
    }

    #[test]
    fn test_structural_errors_are_fatal() {
        assert!(matches!(
            deserialize("5:1\n", None),
            Err(LexiconError::Parse { line: 1, .. })
        ));
        assert!(deserialize("0:1\n", None).is_err()); // self-loop
        assert!(deserialize("1:1 1:1\n0:1\n", None).is_err()); // duplicate
        assert!(deserialize("1:0\n0:0\n", None).is_err()); // zero weight
        assert!(deserialize("x:1\n", None).is_err());
        assert!(deserialize("1:-3\n0:-3\n", None).is_err());
    }

    #[test]
    fn test_vertex_count_mismatch() {
        let text = serialize(&fixture_graph());
        assert!(matches!(
            deserialize(&text, Some(10)),
            Err(LexiconError::Parse { .. })
        ));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("graph.txt");
        let graph = fixture_graph();

        write_graph(&graph, &path).unwrap();
        let loaded = read_graph(&path, Some(9)).unwrap();
        assert_eq!(loaded, graph);
    }

    #[test]
    fn test_read_missing_graph() {
        let result = read_graph(Path::new("/no/such/graph.txt"), None);
        assert!(matches!(result, Err(LexiconError::MissingResource { .. })));
    }
}
