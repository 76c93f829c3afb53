//! The `.hgr` hypergraph text format (component G): comment lines, a
//! mandatory problem line, then one line of 1-based vertex ids per edge.

use crate::instance::Instance;
use crate::SolverError;
use std::io::BufRead;

/// Parses an `.hgr` file body from `reader` into an `Instance`. Vertex ids
/// in the file are 1-based; they are translated to 0-based before
/// `Instance::new` validates them.
pub fn read(reader: impl BufRead) -> Result<Instance, SolverError> {
    let mut num_nodes = None;
    let mut num_edges = None;
    let mut edges: Vec<Vec<usize>> = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line.map_err(|err| SolverError::Input(format!("line {}: {}", line_no + 1, err)))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('c') {
            continue;
        }

        if line.starts_with('p') {
            let parts: Vec<_> = line.split_whitespace().collect();
            if parts.len() != 4 || parts[1] != "hs" {
                return Err(SolverError::Input(format!(
                    "line {}: invalid problem line '{}'",
                    line_no + 1,
                    line
                )));
            }
            let n: usize = parts[2]
                .parse()
                .map_err(|_| SolverError::Input(format!("line {}: invalid vertex count", line_no + 1)))?;
            let m: usize = parts[3]
                .parse()
                .map_err(|_| SolverError::Input(format!("line {}: invalid edge count", line_no + 1)))?;
            num_nodes = Some(n);
            num_edges = Some(m);
            continue;
        }

        let num_nodes = num_nodes.ok_or_else(|| {
            SolverError::Input(format!("line {}: edge appears before problem line", line_no + 1))
        })?;

        let vertices: Vec<usize> = line
            .split_whitespace()
            .map(|tok| {
                tok.parse::<usize>()
                    .map_err(|_| SolverError::Input(format!("line {}: invalid vertex id '{}'", line_no + 1, tok)))
            })
            .collect::<Result<_, _>>()?;
        if vertices.is_empty() {
            continue;
        }
        for &v in &vertices {
            if v < 1 || v > num_nodes {
                return Err(SolverError::Input(format!(
                    "line {}: vertex {} out of range for {} vertices",
                    line_no + 1,
                    v,
                    num_nodes
                )));
            }
        }
        edges.push(vertices.into_iter().map(|v| v - 1).collect());
    }

    let num_nodes = num_nodes
        .ok_or_else(|| SolverError::Input("missing problem line ('p hs N M')".to_string()))?;
    let num_edges = num_edges.expect("set together with num_nodes");
    if num_nodes == 0 || num_edges == 0 {
        return Err(SolverError::Input(
            "problem line must declare a positive vertex and edge count".to_string(),
        ));
    }
    if edges.len() != num_edges {
        return Err(SolverError::Input(format!(
            "problem line declared {} edges but {} were found",
            num_edges,
            edges.len()
        )));
    }

    Instance::new(num_nodes, edges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parses_well_formed_instance() {
        let text = "c a comment\np hs 4 2\n1 2 3\n2 3 4\n";
        let instance = read(Cursor::new(text)).unwrap();
        assert_eq!(instance.num_nodes(), 4);
        assert_eq!(instance.num_edges(), 2);
    }

    #[test]
    fn rejects_edge_count_mismatch() {
        let text = "p hs 3 2\n1 2\n";
        let err = read(Cursor::new(text)).unwrap_err();
        assert!(matches!(err, SolverError::Input(_)));
    }

    #[test]
    fn rejects_out_of_range_vertex() {
        let text = "p hs 2 1\n1 5\n";
        let err = read(Cursor::new(text)).unwrap_err();
        assert!(matches!(err, SolverError::Input(_)));
    }

    #[test]
    fn rejects_missing_problem_line() {
        let text = "1 2\n";
        let err = read(Cursor::new(text)).unwrap_err();
        assert!(matches!(err, SolverError::Input(_)));
    }

    #[test]
    fn skips_blank_and_comment_lines() {
        let text = "\nc header\n\np hs 2 1\nc mid-file comment\n1 2\n";
        let instance = read(Cursor::new(text)).unwrap();
        assert_eq!(instance.num_edges(), 1);
    }
}
