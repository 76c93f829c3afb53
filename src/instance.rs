//! The incidence store (component A): a bidirectional vertex/edge membership
//! relation supporting O(1) deletion and LIFO restoration, used both by the
//! reduction engine and the search driver.

use crate::create_idx_struct;
use crate::data_structures::cont_idx_vec::ContiguousIdxVec;
use crate::data_structures::segtree::{SegTree, SegTreeOp};
use crate::data_structures::skipvec::SkipVec;
use crate::SolverError;
use log::trace;

create_idx_struct!(NodeIdx);
create_idx_struct!(EdgeIdx);
create_idx_struct!(EntryIdx);

struct EdgeDegreeOp;

impl SegTreeOp for EdgeDegreeOp {
    /// `(current cardinality, representative edge)`. Deleted edges carry an
    /// invalid edge id so they never win the min.
    type Item = (u32, EdgeIdx);

    fn combine(left: &Self::Item, right: &Self::Item) -> Self::Item {
        if !left.1.valid() {
            return *right;
        }
        if !right.1.valid() {
            return *left;
        }
        if left.0 <= right.0 {
            *left
        } else {
            *right
        }
    }
}

/// The live (undeleted) hypergraph plus the machinery to mutate it in place
/// and restore it to an earlier state, in strict LIFO order of the
/// corresponding deletions.
///
/// Every `delete_*` call must be matched, in reverse order, by the
/// corresponding `restore_*` call; the undo "token" is this calling
/// discipline itself rather than a returned value, which is how the search
/// driver and reduction engine use these operations.
#[derive(Clone)]
pub struct Instance {
    nodes: ContiguousIdxVec<NodeIdx>,
    edges: ContiguousIdxVec<EdgeIdx>,
    node_incidences: Vec<SkipVec<(EdgeIdx, EntryIdx)>>,
    edge_incidences: Vec<SkipVec<(NodeIdx, EntryIdx)>>,
    edge_degrees: SegTree<EdgeDegreeOp>,
}

impl Instance {
    /// Builds an instance from a 0-based vertex universe size and a list of
    /// hyperedges (each a list of 0-based vertex ids). Edges must be
    /// non-empty and reference in-range vertices. This is the sole
    /// constructor: there is no "copy vs. fresh" branching, only this and
    /// `Clone` (used by tests, never by the search driver, which mutates one
    /// instance in place and restores it instead of cloning).
    pub fn new(num_nodes: usize, edges: Vec<Vec<usize>>) -> Result<Self, SolverError> {
        let num_edges = edges.len();
        for (edge_pos, edge) in edges.iter().enumerate() {
            if edge.is_empty() {
                return Err(SolverError::Input(format!(
                    "edge {} is empty; empty edges are not allowed",
                    edge_pos
                )));
            }
            for &v in edge {
                if v >= num_nodes {
                    return Err(SolverError::Input(format!(
                        "vertex {} in edge {} is out of range for {} vertices",
                        v, edge_pos, num_nodes
                    )));
                }
            }
        }

        let nodes: ContiguousIdxVec<NodeIdx> = (0..num_nodes).map(NodeIdx::from).collect();
        let edges_idx: ContiguousIdxVec<EdgeIdx> = (0..num_edges).map(EdgeIdx::from).collect();

        let mut edge_incidences: Vec<SkipVec<(NodeIdx, EntryIdx)>> = edges
            .iter()
            .map(|edge| {
                edge.iter()
                    .map(|&v| (NodeIdx::from(v), EntryIdx::INVALID))
                    .collect()
            })
            .collect();

        // Flatten every incidence entry, then sort by the node it refers to.
        // This groups entries by node without an O(n*m) scan, mirroring how
        // the on-disk loader cross-links both sides of the relation.
        let mut flat: Vec<(EdgeIdx, EntryIdx)> = edge_incidences
            .iter()
            .enumerate()
            .flat_map(|(edge_pos, incidences)| {
                let edge_idx = EdgeIdx::from(edge_pos);
                incidences
                    .iter()
                    .map(move |(entry_idx, _)| (edge_idx, EntryIdx::from(entry_idx)))
            })
            .collect();
        flat.sort_by_cached_key(|&(edge_idx, entry_idx)| {
            edge_incidences[edge_idx.idx()][entry_idx.idx()]
        });

        let mut node_incidences: Vec<SkipVec<(EdgeIdx, EntryIdx)>> = Vec::with_capacity(num_nodes);
        let mut rem = &flat[..];
        for node_pos in 0..num_nodes {
            let node_idx = NodeIdx::from(node_pos);
            let degree = rem
                .iter()
                .take_while(|&&(e, en)| edge_incidences[e.idx()][en.idx()].0 == node_idx)
                .count();
            let run = &rem[..degree];
            for (pos, &(edge_idx, edge_entry_idx)) in run.iter().enumerate() {
                edge_incidences[edge_idx.idx()][edge_entry_idx.idx()].1 = EntryIdx::from(pos);
            }
            node_incidences.push(run.iter().copied().collect());
            rem = &rem[degree..];
        }

        let edge_degrees = if num_edges == 0 {
            std::iter::once((u32::MAX, EdgeIdx::INVALID)).collect()
        } else {
            (0..num_edges)
                .map(|idx| (edge_incidences[idx].len() as u32, EdgeIdx::from(idx)))
                .collect()
        };

        Ok(Self {
            nodes,
            edges: edges_idx,
            node_incidences,
            edge_incidences,
            edge_degrees,
        })
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn num_nodes_total(&self) -> usize {
        self.node_incidences.len()
    }

    pub fn num_edges_total(&self) -> usize {
        self.edge_incidences.len()
    }

    /// Edges incident to a node.
    pub fn node(
        &self,
        node_idx: NodeIdx,
    ) -> impl Iterator<Item = EdgeIdx> + ExactSizeIterator + Clone + '_ {
        self.node_incidences[node_idx.idx()]
            .iter()
            .map(|(_, (edge_idx, _))| *edge_idx)
    }

    pub fn node_vec(&self, node_idx: NodeIdx) -> Vec<EdgeIdx> {
        self.node(node_idx).collect()
    }

    /// Vertices incident to an edge.
    pub fn edge(
        &self,
        edge_idx: EdgeIdx,
    ) -> impl Iterator<Item = NodeIdx> + ExactSizeIterator + Clone + '_ {
        self.edge_incidences[edge_idx.idx()]
            .iter()
            .map(|(_, (node_idx, _))| *node_idx)
    }

    pub fn edge_vec(&self, edge_idx: EdgeIdx) -> Vec<NodeIdx> {
        self.edge(edge_idx).collect()
    }

    /// Alive nodes, in arbitrary order.
    pub fn nodes(&self) -> &[NodeIdx] {
        &self.nodes
    }

    /// Alive edges, in arbitrary order.
    pub fn edges(&self) -> &[EdgeIdx] {
        &self.edges
    }

    pub fn is_node_deleted(&self, node_idx: NodeIdx) -> bool {
        self.nodes.is_deleted(node_idx.idx())
    }

    pub fn is_edge_deleted(&self, edge_idx: EdgeIdx) -> bool {
        self.edges.is_deleted(edge_idx.idx())
    }

    pub fn node_degree(&self, node_idx: NodeIdx) -> usize {
        self.node_incidences[node_idx.idx()].len()
    }

    pub fn edge_degree(&self, edge_idx: EdgeIdx) -> usize {
        self.edge_incidences[edge_idx.idx()].len()
    }

    /// The current minimum cardinality among live edges and a witness edge
    /// achieving it, or `None` if no edges remain (the instance is solved).
    pub fn min_edge_degree(&self) -> Option<(usize, EdgeIdx)> {
        let (degree, edge_idx) = *self.edge_degrees.root();
        if edge_idx.valid() {
            Some((degree as usize, edge_idx))
        } else {
            None
        }
    }

    /// True iff every live edge has at least one live member.
    pub fn is_feasible(&self) -> bool {
        !matches!(self.min_edge_degree(), Some((0, _)))
    }

    /// The live vertex of maximum degree, tie-broken by the smallest
    /// incident edge cardinality (most constrained), then by lowest id.
    /// `None` if no vertices remain.
    pub fn max_degree_node(&self) -> Option<NodeIdx> {
        self.nodes()
            .iter()
            .copied()
            .map(|node_idx| {
                let degree = self.node_degree(node_idx);
                let smallest_incident_edge = self
                    .node(node_idx)
                    .map(|edge_idx| self.edge_degree(edge_idx))
                    .min()
                    .unwrap_or(usize::MAX);
                (
                    degree,
                    std::cmp::Reverse(smallest_incident_edge),
                    std::cmp::Reverse(node_idx),
                    node_idx,
                )
            })
            .max()
            .map(|(_, _, _, node_idx)| node_idx)
    }

    /// Deletes a node, decrementing the degree of every edge it was
    /// incident to. Does not touch the edges themselves.
    pub fn delete_node(&mut self, node_idx: NodeIdx) {
        trace!("Deleting node {}", node_idx);
        for (_idx, (edge_idx, entry_idx)) in &self.node_incidences[node_idx.idx()] {
            self.edge_incidences[edge_idx.idx()].delete(entry_idx.idx());
            self.edge_degrees.change(edge_idx.idx(), |item| item.0 -= 1);
        }
        self.nodes.delete(node_idx.idx());
    }

    /// Restores a previously deleted node. Restorations must happen in
    /// reverse order of the corresponding deletions.
    pub fn restore_node(&mut self, node_idx: NodeIdx) {
        trace!("Restoring node {}", node_idx);
        for (_idx, (edge_idx, entry_idx)) in self.node_incidences[node_idx.idx()].iter().rev() {
            self.edge_incidences[edge_idx.idx()].restore(entry_idx.idx());
            self.edge_degrees.change(edge_idx.idx(), |item| item.0 += 1);
        }
        self.nodes.restore(node_idx.idx());
    }

    /// Deletes an edge, removing it from every member's incidence list.
    pub fn delete_edge(&mut self, edge_idx: EdgeIdx) {
        trace!("Deleting edge {}", edge_idx);
        for (_idx, (node_idx, entry_idx)) in &self.edge_incidences[edge_idx.idx()] {
            self.node_incidences[node_idx.idx()].delete(entry_idx.idx());
        }
        self.edges.delete(edge_idx.idx());
        self.edge_degrees
            .set(edge_idx.idx(), (u32::MAX, EdgeIdx::INVALID));
    }

    /// Restores a previously deleted edge. Restorations must happen in
    /// reverse order of the corresponding deletions.
    pub fn restore_edge(&mut self, edge_idx: EdgeIdx) {
        trace!("Restoring edge {}", edge_idx);
        for (_idx, (node_idx, entry_idx)) in self.edge_incidences[edge_idx.idx()].iter().rev() {
            self.node_incidences[node_idx.idx()].restore(entry_idx.idx());
        }
        self.edges.restore(edge_idx.idx());
        let degree = self.edge_degree(edge_idx) as u32;
        self.edge_degrees.set(edge_idx.idx(), (degree, edge_idx));
    }

    /// Deletes every edge incident to `node_idx`. The node itself must
    /// already be deleted (this is how "select v" is implemented: delete v,
    /// then delete everything it hits).
    pub fn delete_incident_edges(&mut self, node_idx: NodeIdx) {
        trace!("Deleting all edges incident to {}", node_idx);
        debug_assert!(
            self.nodes.is_deleted(node_idx.idx()),
            "node passed to delete_incident_edges must already be deleted"
        );
        // Temporarily move the (otherwise untouched) incidence list out so
        // we can mutate other edges' incidences while iterating it.
        let incidence = std::mem::take(&mut self.node_incidences[node_idx.idx()]);
        for (_, (edge_idx, _)) in &incidence {
            self.delete_edge(*edge_idx);
        }
        self.node_incidences[node_idx.idx()] = incidence;
    }

    /// Reverses `delete_incident_edges`. Must be called before
    /// `restore_node` for the same node.
    pub fn restore_incident_edges(&mut self, node_idx: NodeIdx) {
        trace!("Restoring all edges incident to {}", node_idx);
        debug_assert!(
            self.nodes.is_deleted(node_idx.idx()),
            "node passed to restore_incident_edges must still be deleted"
        );
        let incidence = std::mem::take(&mut self.node_incidences[node_idx.idx()]);
        for (_, (edge_idx, _)) in incidence.iter().rev() {
            self.restore_edge(*edge_idx);
        }
        self.node_incidences[node_idx.idx()] = incidence;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy() -> Instance {
        // {[0,1,2],[1,2,3],[2,3,4],[3,4,5]}
        Instance::new(6, vec![vec![0, 1, 2], vec![1, 2, 3], vec![2, 3, 4], vec![3, 4, 5]]).unwrap()
    }

    #[test]
    fn membership_invariant_holds_after_build() {
        let inst = toy();
        for &edge_idx in inst.edges() {
            for node_idx in inst.edge(edge_idx) {
                assert!(inst.node(node_idx).any(|e| e == edge_idx));
            }
        }
        for &node_idx in inst.nodes() {
            for edge_idx in inst.node(node_idx) {
                assert!(inst.edge(edge_idx).any(|n| n == node_idx));
            }
        }
    }

    #[test]
    fn delete_restore_node_is_byte_identical() {
        let mut inst = toy();
        let before: Vec<_> = inst.edges().iter().map(|&e| inst.edge_vec(e)).collect();
        let node2 = NodeIdx::from(2usize);
        inst.delete_node(node2);
        assert!(inst.is_node_deleted(node2));
        inst.restore_node(node2);
        let after: Vec<_> = inst.edges().iter().map(|&e| inst.edge_vec(e)).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn forced_selection_round_trips() {
        let mut inst = toy();
        let node2 = NodeIdx::from(2usize);
        inst.delete_node(node2);
        inst.delete_incident_edges(node2);
        assert_eq!(inst.num_edges(), 2);
        inst.restore_incident_edges(node2);
        inst.restore_node(node2);
        assert_eq!(inst.num_edges(), 4);
        assert_eq!(inst.num_nodes(), 6);
    }

    #[test]
    fn min_edge_degree_detects_unit_and_empty() {
        let mut inst = Instance::new(2, vec![vec![0]]).unwrap();
        assert_eq!(inst.min_edge_degree(), Some((1, EdgeIdx::from(0usize))));
        inst.delete_node(NodeIdx::from(0usize));
        assert_eq!(inst.min_edge_degree(), Some((0, EdgeIdx::from(0usize))));
        assert!(!inst.is_feasible());
    }

    #[test]
    fn rejects_empty_edge() {
        let err = Instance::new(2, vec![vec![]]).unwrap_err();
        assert!(matches!(err, SolverError::Input(_)));
    }

    #[test]
    fn rejects_out_of_range_vertex() {
        let err = Instance::new(2, vec![vec![5]]).unwrap_err();
        assert!(matches!(err, SolverError::Input(_)));
    }
}
