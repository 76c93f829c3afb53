//! The search driver (component E): deterministic branch-and-bound over the
//! reduced instance, tracking the incumbent as a field rather than a global
//! and unwinding cleanly on a time limit or early-stop threshold.

use crate::instance::{Instance, NodeIdx};
use crate::reductions::{self, ComputedBounds, ReductionResult};
use crate::report::{Report, ReductionStats, RootBounds, RuntimeStats, Settings};
use crate::small_indices::{IdxHashSet, SmallIdx};
use crate::SolverError;
use log::info;
use std::time::{Duration, Instant};

/// Builds the initial incumbent from `settings.initial_hitting_set`,
/// rejecting it (as a configuration error, not an internal one) if it does
/// not actually hit every live edge of `instance`.
fn validate_initial_hitting_set(instance: &Instance, settings: &Settings) -> Result<Vec<NodeIdx>, SolverError> {
    let Some(seed) = &settings.initial_hitting_set else {
        return Ok(Vec::new());
    };

    let mut seed_nodes = Vec::with_capacity(seed.len());
    for &v in seed {
        if v >= instance.num_nodes_total() {
            return Err(SolverError::Config(format!(
                "initial_hitting_set contains out-of-range vertex {}",
                v
            )));
        }
        seed_nodes.push(NodeIdx::from(v));
    }

    let seed_set: IdxHashSet<NodeIdx> = seed_nodes.iter().copied().collect();
    for &edge in instance.edges() {
        if instance.edge(edge).all(|node| !seed_set.contains(&node)) {
            return Err(SolverError::Config(
                "initial_hitting_set does not hit every edge of the instance".to_string(),
            ));
        }
    }

    Ok(seed_nodes)
}

struct Search<'a> {
    settings: &'a Settings,
    incumbent: Vec<NodeIdx>,
    branching_steps: usize,
    deadline: Option<Instant>,
    stopped_early: bool,
    stats: ReductionStats,
}

impl Search<'_> {
    /// Whether continuing to branch is still worthwhile: the deadline has
    /// not passed and the incumbent has not already reached `stop_at`.
    /// Either condition, once true, latches `stopped_early` for the rest of
    /// the solve so the final report never claims a proof it didn't
    /// complete.
    fn should_stop_branching(&mut self) -> bool {
        if self.stopped_early {
            return true;
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                self.stopped_early = true;
                return true;
            }
        }
        false
    }

    fn record_if_better(&mut self, partial_hs: &[NodeIdx]) {
        if self.incumbent.is_empty() || partial_hs.len() < self.incumbent.len() {
            self.incumbent.clear();
            self.incumbent.extend_from_slice(partial_hs);
            info!("found hitting set of size {}", self.incumbent.len());
        }
    }

    /// Explores the subtree rooted at `instance`/`partial_hs`, returning the
    /// bounds computed for this node's own reduction pass (used by the
    /// caller only for the outermost, root-level invocation).
    fn explore(&mut self, instance: &mut Instance, partial_hs: &mut Vec<NodeIdx>) -> ComputedBounds {
        // The reduction pass for this node (including its greedy run) always
        // completes, even over budget, so a time limit of zero still yields
        // the root's greedy upper bound instead of no incumbent at all.
        // Cancellation is only consulted before starting further branching.
        self.branching_steps += 1;
        let (result, reduction, bounds) =
            reductions::reduce(instance, self.settings, partial_hs, &mut self.incumbent, &mut self.stats);

        // The incumbent can improve via this node's own greedy run even
        // when the fixpoint result is `Unsolvable`, so `stop_at` is checked
        // unconditionally, not only on the `Solved`/`Exhausted` arms below.
        if let Some(stop_at) = self.settings.stop_at {
            if !self.incumbent.is_empty() && self.incumbent.len() <= stop_at {
                self.stopped_early = true;
            }
        }

        match result {
            ReductionResult::Solved => self.record_if_better(partial_hs),
            ReductionResult::Unsolvable => {}
            ReductionResult::Exhausted => {
                if !self.should_stop_branching() {
                    let node = instance
                        .max_degree_node()
                        .expect("an exhausted fixpoint with live edges has live vertices");
                    instance.delete_node(node);

                    instance.delete_incident_edges(node);
                    partial_hs.push(node);
                    self.explore(instance, partial_hs);
                    partial_hs.pop();
                    instance.restore_incident_edges(node);

                    if !self.should_stop_branching() {
                        self.explore(instance, partial_hs);
                    }

                    instance.restore_node(node);
                }
            }
        }

        reduction.undo(instance, partial_hs);
        bounds
    }
}

/// Solves `instance` under `settings`, returning the hitting set found (as
/// 0-based vertex ids) and a full report. Never panics on a malformed
/// `initial_hitting_set` or config; those surface as `SolverError::Config`.
pub fn solve(mut instance: Instance, instance_name: String, settings: Settings) -> Result<(Vec<usize>, Report), SolverError> {
    settings.validate()?;
    let total_start = Instant::now();

    let incumbent = validate_initial_hitting_set(&instance, &settings)?;
    let deadline = settings
        .time_limit
        .map(|secs| total_start + Duration::from_secs_f64(secs));

    let mut search = Search {
        settings: &settings,
        incumbent,
        branching_steps: 0,
        deadline,
        stopped_early: false,
        stats: ReductionStats::default(),
    };

    let mut partial_hs = Vec::new();
    let reduction_start = Instant::now();
    let root_bounds_computed = search.explore(&mut instance, &mut partial_hs);
    let applying_reductions = reduction_start.elapsed();

    // `explore` always undoes every reduction/branch it applied before
    // returning, so `instance` is back in its original, fully-live state
    // here — exactly what `local_search` needs to check redundancy against.
    // This is the only place a branch-discovered incumbent (one that never
    // passed through `run_greedy`'s own local-search call) gets checked.
    if settings.enable_local_search && !search.incumbent.is_empty() {
        reductions::local_search(&instance, &mut search.incumbent);
    }

    let proved_optimal = !search.stopped_early;
    let wall_time = total_start.elapsed();

    let root_bounds = RootBounds {
        max_degree: root_bounds_computed.max_degree,
        sum_degree: root_bounds_computed.sum_degree,
        efficiency: root_bounds_computed.efficiency,
        packing: root_bounds_computed.packing,
        sum_over_packing: root_bounds_computed.sum_over_packing,
        greedy_upper: search.incumbent.len(),
    };

    let runtimes = RuntimeStats {
        total: wall_time,
        applying_reductions,
        ..RuntimeStats::default()
    };

    let report = Report {
        instance_name,
        opt: search.incumbent.len(),
        branching_steps: search.branching_steps,
        proved_optimal,
        settings,
        root_bounds,
        runtimes,
        reductions: search.stats,
        wall_time_seconds: wall_time.as_secs_f64(),
    };

    let hitting_set = search.incumbent.iter().map(|node| node.idx()).collect();
    Ok((hitting_set, report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solves_toy_instance_optimally() {
        let instance =
            Instance::new(6, vec![vec![0, 1, 2], vec![1, 2, 3], vec![2, 3, 4], vec![3, 4, 5]]).unwrap();
        let (hs, report) = solve(instance, "toy".to_string(), Settings::default()).unwrap();
        assert_eq!(hs.len(), 2);
        assert!(report.proved_optimal);
        assert_eq!(report.opt, 2);
    }

    #[test]
    fn solves_disjoint_edges_instance() {
        // Three pairwise-disjoint edges: the optimum must pick one vertex
        // from each, so the minimum hitting set has size 3.
        let instance = Instance::new(6, vec![vec![0, 1], vec![2, 3], vec![4, 5]]).unwrap();
        let (hs, report) = solve(instance, "disjoint".to_string(), Settings::default()).unwrap();
        assert_eq!(hs.len(), 3);
        assert!(report.proved_optimal);
    }

    #[test]
    fn rejects_invalid_initial_hitting_set() {
        let instance = Instance::new(3, vec![vec![0, 1], vec![1, 2]]).unwrap();
        let settings = Settings {
            initial_hitting_set: Some(vec![0]),
            ..Settings::default()
        };
        let err = solve(instance, "bad-seed".to_string(), settings).unwrap_err();
        assert!(matches!(err, SolverError::Config(_)));
    }

    /// 32 sets over a universe of 32 elements (1-based in the original,
    /// translated to 0-based here), large and irregular enough that the
    /// root's degree-based bounds don't immediately prove optimality and
    /// real branching is required.
    fn hard_instance() -> Instance {
        let raw: Vec<Vec<usize>> = vec![
            vec![13, 23, 28], vec![6, 15, 16, 31], vec![7, 8, 10, 17, 27], vec![12, 14, 18, 29],
            vec![11, 13, 23, 28], vec![6, 15, 16, 20, 21], vec![15, 20, 21, 22], vec![14, 18, 19, 29],
            vec![4, 5, 8], vec![6, 16, 30, 31], vec![7, 14, 18, 22, 26, 29, 32], vec![3, 11, 23, 24, 25],
            vec![2, 7, 17, 29, 32], vec![13, 23, 24, 28], vec![12, 22, 26, 29], vec![8, 9, 10],
            vec![4, 5, 19], vec![1, 2, 27], vec![2, 30, 31, 32], vec![21, 22, 26, 29], vec![9, 10, 17],
            vec![6, 15, 16, 31, 32], vec![1, 2, 7, 30], vec![1, 17, 27], vec![4, 8, 18, 19],
            vec![7, 16, 29, 30, 32], vec![3, 24, 25], vec![15, 20, 21], vec![5, 8, 9, 17, 19],
            vec![11, 12, 13, 24], vec![11, 12, 14, 26],
        ];
        let edges: Vec<Vec<usize>> = raw
            .into_iter()
            .map(|edge| edge.into_iter().map(|v| v - 1).collect())
            .collect();
        Instance::new(32, edges).unwrap()
    }

    #[test]
    fn zero_time_limit_yields_non_optimal_result() {
        let instance = hard_instance();
        let settings = Settings {
            time_limit: Some(0.0),
            ..Settings::default()
        };
        let (hs, report) = solve(instance, "timed-out".to_string(), settings).unwrap();
        assert!(!report.proved_optimal);
        assert!(!hs.is_empty());
    }

    #[test]
    fn hard_instance_solves_to_known_optimum_given_time() {
        let instance = hard_instance();
        let (hs, report) = solve(instance, "hard".to_string(), Settings::default()).unwrap();
        assert!(report.proved_optimal);
        assert_eq!(hs.len(), 9);
    }

    #[test]
    fn stop_at_halts_before_optimum_is_proved() {
        let instance = Instance::new(6, vec![vec![0, 1, 2], vec![1, 2, 3], vec![2, 3, 4], vec![3, 4, 5]]).unwrap();
        let settings = Settings {
            stop_at: Some(2),
            ..Settings::default()
        };
        let (hs, report) = solve(instance, "stop-at".to_string(), settings).unwrap();
        assert_eq!(hs.len(), 2);
        assert!(!report.proved_optimal);
    }
}
