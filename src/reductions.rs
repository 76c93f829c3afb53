//! The reduction engine (component B): rules applied to fixpoint at every
//! search node before branching, each shrinking the live instance while
//! recording enough to restore it exactly.

use crate::data_structures::subset_trie::SubsetTrie;
use crate::data_structures::superset_trie::SupersetTrie;
use crate::instance::{EdgeIdx, Instance, NodeIdx};
use crate::lower_bound::{calc_efficiency_bound, calc_max_degree_bound, calc_sum_degree_bound, PackingBound};
use crate::report::{GreedyMode, ReductionStats, Settings};
use crate::small_indices::{IdxHashSet, SmallIdx};
use log::trace;

/// A single reversible mutation applied to an `Instance` by a reduction
/// rule. `Reduction` below groups the ones applied in one fixpoint pass so
/// the search driver can restore them as one unit.
#[derive(Copy, Clone, Debug)]
pub enum ReducedItem {
    RemovedNode(NodeIdx),
    RemovedEdge(EdgeIdx),
    ForcedNode(NodeIdx),
}

impl ReducedItem {
    fn apply(self, instance: &mut Instance, partial_hs: &mut Vec<NodeIdx>) {
        match self {
            Self::RemovedNode(node_idx) => instance.delete_node(node_idx),
            Self::RemovedEdge(edge_idx) => instance.delete_edge(edge_idx),
            Self::ForcedNode(node_idx) => {
                instance.delete_node(node_idx);
                instance.delete_incident_edges(node_idx);
                partial_hs.push(node_idx);
            }
        }
    }

    fn undo(self, instance: &mut Instance, partial_hs: &mut Vec<NodeIdx>) {
        match self {
            Self::RemovedNode(node_idx) => instance.restore_node(node_idx),
            Self::RemovedEdge(edge_idx) => instance.restore_edge(edge_idx),
            Self::ForcedNode(node_idx) => {
                instance.restore_incident_edges(node_idx);
                instance.restore_node(node_idx);
                debug_assert_eq!(partial_hs.last().copied(), Some(node_idx));
                partial_hs.pop();
            }
        }
    }
}

/// The reversible effect of one fixpoint pass of `reduce`. Must be undone,
/// as a unit, in the reverse order the items were applied.
#[derive(Clone, Debug, Default)]
pub struct Reduction(Vec<ReducedItem>);

impl Reduction {
    pub fn undo(&self, instance: &mut Instance, partial_hs: &mut Vec<NodeIdx>) {
        for item in self.0.iter().rev() {
            item.undo(instance, partial_hs);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReductionResult {
    /// No edges remain: `partial_hs` (plus whatever the reduction forced) is
    /// a valid hitting set for the node's instance.
    Solved,
    /// The branch cannot produce a hitting set smaller than the current
    /// incumbent; prune it.
    Unsolvable,
    /// Reached a fixpoint with live edges remaining; the caller should
    /// branch.
    Exhausted,
}

/// Bounds computed during this reduction pass, for reporting and for the
/// search driver's own bound bookkeeping at the root.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComputedBounds {
    pub max_degree: Option<usize>,
    pub sum_degree: Option<usize>,
    pub efficiency: Option<usize>,
    pub packing: Option<usize>,
    pub sum_over_packing: Option<usize>,
}

impl ComputedBounds {
    pub fn max(&self) -> usize {
        [
            self.max_degree,
            self.sum_degree,
            self.efficiency,
            self.packing,
            self.sum_over_packing,
        ]
        .into_iter()
        .flatten()
        .max()
        .unwrap_or(0)
    }
}

fn find_size_1_edge(instance: &Instance) -> Option<ReducedItem> {
    instance.min_edge_degree().and_then(|(degree, edge_idx)| {
        if degree == 1 {
            let node_idx = instance
                .edge(edge_idx)
                .next()
                .expect("degree-1 edge has no members");
            Some(ReducedItem::ForcedNode(node_idx))
        } else {
            None
        }
    })
}

fn find_dominated_edges(instance: &Instance) -> Vec<ReducedItem> {
    let mut edges = instance.edges().to_vec();
    edges.sort_unstable_by_key(|&edge| instance.edge_degree(edge));
    let mut trie: SubsetTrie<NodeIdx, bool, std::vec::IntoIter<NodeIdx>> =
        SubsetTrie::new(instance.num_nodes_total());
    let mut dominated = Vec::new();
    for edge_idx in edges {
        if trie.find_subset(instance.edge_vec(edge_idx)) {
            dominated.push(ReducedItem::RemovedEdge(edge_idx));
        } else {
            trie.insert(true, instance.edge_vec(edge_idx));
        }
    }
    dominated
}

fn find_dominated_nodes(instance: &Instance) -> Vec<ReducedItem> {
    let mut nodes = instance.nodes().to_vec();
    nodes.sort_unstable_by_key(|&node| std::cmp::Reverse(instance.node_degree(node)));
    let mut trie: SupersetTrie<EdgeIdx, std::vec::IntoIter<EdgeIdx>> =
        SupersetTrie::new(instance.num_edges_total());
    let mut dominated = Vec::new();
    for node_idx in nodes {
        if trie.contains_superset(instance.node_vec(node_idx)) {
            dominated.push(ReducedItem::RemovedNode(node_idx));
        } else {
            trie.insert(instance.node_vec(node_idx));
        }
    }
    dominated
}

/// Max-degree repeated deletion: always pick a currently-maximum-degree
/// vertex, delete it and everything it hits, until no edges remain. Mutates
/// `instance` and restores it before returning, so callers see no net
/// effect besides the returned hitting set.
pub fn greedy_approx(instance: &mut Instance) -> Vec<NodeIdx> {
    let mut hs = Vec::new();
    while !instance.edges().is_empty() {
        let node = instance
            .max_degree_node()
            .expect("live edges imply live nodes");
        instance.delete_node(node);
        instance.delete_incident_edges(node);
        hs.push(node);
    }
    for &node in hs.iter().rev() {
        instance.restore_incident_edges(node);
        instance.restore_node(node);
    }
    hs
}

/// Single-pass local search over a valid hitting set: try dropping each
/// member once, keeping the drop only if every edge it hits is still hit by
/// another surviving member. Never re-inserts a dropped member, so this is
/// O(|hs|) work, not a fixpoint. `instance` must be the (full, not
/// partially-reduced) instance `hs` is a hitting set for — the search driver
/// calls this both per greedy run (`run_greedy`, below) and once more on the
/// final incumbent against the fully restored root instance, since a
/// branch-forced incumbent never passes through `run_greedy` at all.
pub(crate) fn local_search(instance: &Instance, hs: &mut Vec<NodeIdx>) {
    let hs_set: IdxHashSet<NodeIdx> = hs.iter().copied().collect();
    let mut hit_counts = vec![0u32; instance.num_edges_total()];
    for &edge in instance.edges() {
        hit_counts[edge.idx()] = instance.edge(edge).filter(|node| hs_set.contains(node)).count() as u32;
    }

    let mut kept = Vec::with_capacity(hs.len());
    for &node in hs.iter() {
        let can_drop = instance.node(node).all(|edge| hit_counts[edge.idx()] > 1);
        if can_drop {
            for edge in instance.node(node) {
                hit_counts[edge.idx()] -= 1;
            }
        } else {
            kept.push(node);
        }
    }
    *hs = kept;
}

fn run_greedy(
    instance: &mut Instance,
    settings: &Settings,
    partial_hs: &[NodeIdx],
    minimum_hs: &mut Vec<NodeIdx>,
    stats: &mut ReductionStats,
) {
    stats.greedy_runs += 1;
    let mut hs = greedy_approx(instance);
    if settings.enable_local_search {
        local_search(instance, &mut hs);
    }
    if minimum_hs.is_empty() || partial_hs.len() + hs.len() < minimum_hs.len() {
        stats.greedy_bound_improvements += 1;
        minimum_hs.clear();
        minimum_hs.extend_from_slice(partial_hs);
        minimum_hs.extend(hs);
    }
}

/// Runs every enabled reduction rule to a fixpoint, starting a branch at
/// `instance`/`partial_hs`. Returns whether the branch is solved, provably
/// no better than `minimum_hs`, or needs branching, plus the reversible
/// effect to undo before the caller moves on. Also updates `minimum_hs`
/// whenever a greedy run beats it and accumulates bound/reduction
/// telemetry.
pub fn reduce(
    instance: &mut Instance,
    settings: &Settings,
    partial_hs: &mut Vec<NodeIdx>,
    minimum_hs: &mut Vec<NodeIdx>,
    stats: &mut ReductionStats,
) -> (ReductionResult, Reduction, ComputedBounds) {
    let mut reduced = Vec::new();
    let mut bounds = ComputedBounds::default();

    if matches!(settings.greedy_mode, GreedyMode::Once) {
        run_greedy(instance, settings, partial_hs, minimum_hs, stats);
    }

    let result = loop {
        if !minimum_hs.is_empty() && partial_hs.len() >= minimum_hs.len() {
            break ReductionResult::Unsolvable;
        }
        match instance.min_edge_degree() {
            None => break ReductionResult::Solved,
            Some((0, _)) => break ReductionResult::Unsolvable,
            Some(_) => {}
        }

        if let Some(forced) = find_size_1_edge(instance) {
            forced.apply(instance, partial_hs);
            reduced.push(forced);
            stats.unit_edge_runs += 1;
            stats.unit_edge_vertices_found += 1;
            continue;
        }

        let before = reduced.len();
        reduced.extend(find_dominated_edges(instance));
        stats.edge_domination_runs += 1;
        stats.edge_dominations_found += reduced.len() - before;
        if reduced.len() > before {
            for item in &reduced[before..] {
                item.apply(instance, partial_hs);
            }
            continue;
        }

        let before = reduced.len();
        reduced.extend(find_dominated_nodes(instance));
        stats.vertex_domination_runs += 1;
        stats.vertex_dominations_found += reduced.len() - before;
        if reduced.len() > before {
            for item in &reduced[before..] {
                item.apply(instance, partial_hs);
            }
            continue;
        }

        if matches!(settings.greedy_mode, GreedyMode::AlwaysBeforeExpensiveReductions) {
            run_greedy(instance, settings, partial_hs, minimum_hs, stats);
            if !minimum_hs.is_empty() && partial_hs.len() >= minimum_hs.len() {
                break ReductionResult::Unsolvable;
            }
        }

        let smallest_known = minimum_hs.len();
        let before = reduced.len();

        if settings.enable_max_degree_bound {
            if let Some(bound) = calc_max_degree_bound(instance) {
                bounds.max_degree = Some(bound);
                if !minimum_hs.is_empty() && partial_hs.len() + bound >= smallest_known {
                    stats.max_degree_bound_breaks += 1;
                    break ReductionResult::Unsolvable;
                }
            }
        }

        if settings.enable_sum_degree_bound {
            let bound = calc_sum_degree_bound(instance);
            bounds.sum_degree = Some(bound);
            if !minimum_hs.is_empty() && partial_hs.len() + bound >= smallest_known {
                stats.sum_degree_bound_breaks += 1;
                break ReductionResult::Unsolvable;
            }
        }

        if settings.enable_efficiency_bound {
            let (bound, discard) = calc_efficiency_bound(instance);
            let rounded = bound.round();
            bounds.efficiency = rounded;
            if let Some(rounded) = rounded {
                if !minimum_hs.is_empty() && partial_hs.len() + rounded >= smallest_known {
                    stats.efficiency_bound_breaks += 1;
                    break ReductionResult::Unsolvable;
                }
            }
            if !minimum_hs.is_empty() {
                for &node in instance.nodes() {
                    if let Some(discard_bound) = discard[node.idx()].round() {
                        if partial_hs.len() + discard_bound >= smallest_known {
                            reduced.push(ReducedItem::ForcedNode(node));
                        }
                    }
                }
            }
        }

        if settings.enable_packing_bound {
            let packing = PackingBound::new(instance, settings);
            bounds.packing = Some(packing.bound());
            if !minimum_hs.is_empty() && partial_hs.len() + packing.bound() >= smallest_known {
                stats.packing_bound_breaks += 1;
                break ReductionResult::Unsolvable;
            }

            if settings.enable_sum_over_packing_bound {
                let bound = packing.calc_sum_over_packing_bound(instance);
                bounds.sum_over_packing = Some(bound);
                if !minimum_hs.is_empty() && partial_hs.len() + bound >= smallest_known {
                    stats.sum_over_packing_bound_breaks += 1;
                    break ReductionResult::Unsolvable;
                }
            }

            if !minimum_hs.is_empty() {
                for (node, discard_bound) in packing.calc_discard_bounds(instance) {
                    if partial_hs.len() + discard_bound >= smallest_known {
                        reduced.push(ReducedItem::ForcedNode(node));
                    }
                }
            }
        }

        if reduced.len() > before {
            for item in &reduced[before..] {
                item.apply(instance, partial_hs);
            }
            continue;
        }

        break ReductionResult::Exhausted;
    };

    trace!(
        "reduce: {:?}, {} reversible items, bounds {:?}",
        result,
        reduced.len(),
        bounds
    );

    (result, Reduction(reduced), bounds)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy() -> Instance {
        Instance::new(6, vec![vec![0, 1, 2], vec![1, 2, 3], vec![2, 3, 4], vec![3, 4, 5]]).unwrap()
    }

    #[test]
    fn reduce_to_solved_on_toy_instance() {
        let mut instance = toy();
        let settings = Settings::default();
        let mut partial_hs = Vec::new();
        let mut minimum_hs = vec![NodeIdx::from(0usize); 10];
        let mut stats = ReductionStats::default();
        let (result, reduction, _bounds) =
            reduce(&mut instance, &settings, &mut partial_hs, &mut minimum_hs, &mut stats);
        assert!(matches!(
            result,
            ReductionResult::Solved | ReductionResult::Exhausted
        ));
        reduction.undo(&mut instance, &mut partial_hs);
        assert_eq!(instance.num_edges(), 4);
        assert!(partial_hs.is_empty());
    }

    #[test]
    fn greedy_approx_is_a_valid_hitting_set() {
        let mut instance = toy();
        let hs = greedy_approx(&mut instance);
        assert_eq!(instance.num_edges(), 4, "greedy_approx must restore the instance");
        for &edge in instance.edges() {
            assert!(instance.edge(edge).any(|node| hs.contains(&node)));
        }
    }

    #[test]
    fn unit_edge_forces_its_sole_member() {
        let instance = Instance::new(3, vec![vec![0], vec![0, 1, 2]]).unwrap();
        let forced = find_size_1_edge(&instance).unwrap();
        assert!(matches!(forced, ReducedItem::ForcedNode(n) if n == NodeIdx::from(0usize)));
    }

    #[test]
    fn dominated_edge_is_detected() {
        // edge {0,1} is a subset of {0,1,2}, so the latter is redundant.
        let instance = Instance::new(3, vec![vec![0, 1], vec![0, 1, 2]]).unwrap();
        let dominated = find_dominated_edges(&instance);
        assert_eq!(dominated.len(), 1);
        assert!(matches!(dominated[0], ReducedItem::RemovedEdge(e) if e == EdgeIdx::from(1usize)));
    }

    #[test]
    fn dominated_node_is_detected() {
        // vertex 0 is only in {0,1}; vertex 1 is in {0,1} and {1,2}, so
        // vertex 0's incidence set is a subset of vertex 1's.
        let instance = Instance::new(3, vec![vec![0, 1], vec![1, 2]]).unwrap();
        let dominated = find_dominated_nodes(&instance);
        assert_eq!(dominated.len(), 1);
        assert!(matches!(dominated[0], ReducedItem::RemovedNode(n) if n == NodeIdx::from(0usize)));
    }
}
