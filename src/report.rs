//! Configuration (component F, input side) and the reporting record it
//! feeds into (component F, output side): tunables for the search driver,
//! reductions and bounds, and the telemetry counters accumulated while
//! solving.

use serde::{Deserialize, Serialize, Serializer};
use std::time::Duration;

fn serialize_duration_as_seconds<S>(duration: &Duration, ser: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    ser.serialize_f64(duration.as_secs_f64())
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RuntimeStats {
    #[serde(serialize_with = "serialize_duration_as_seconds")]
    pub total: Duration,

    #[serde(serialize_with = "serialize_duration_as_seconds")]
    pub greedy: Duration,

    #[serde(serialize_with = "serialize_duration_as_seconds")]
    pub max_degree_bound: Duration,

    #[serde(serialize_with = "serialize_duration_as_seconds")]
    pub sum_degree_bound: Duration,

    #[serde(serialize_with = "serialize_duration_as_seconds")]
    pub efficiency_bound: Duration,

    #[serde(serialize_with = "serialize_duration_as_seconds")]
    pub packing_bound: Duration,

    #[serde(serialize_with = "serialize_duration_as_seconds")]
    pub sum_over_packing_bound: Duration,

    #[serde(serialize_with = "serialize_duration_as_seconds")]
    pub applying_reductions: Duration,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReductionStats {
    pub max_degree_bound_breaks: usize,
    pub sum_degree_bound_breaks: usize,
    pub efficiency_bound_breaks: usize,
    pub packing_bound_breaks: usize,
    pub sum_over_packing_bound_breaks: usize,

    pub greedy_runs: usize,
    pub greedy_bound_improvements: usize,

    pub unit_edge_runs: usize,
    pub unit_edge_vertices_found: usize,

    pub vertex_domination_runs: usize,
    pub vertex_dominations_found: usize,

    pub edge_domination_runs: usize,
    pub edge_dominations_found: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RootBounds {
    pub max_degree: Option<usize>,
    pub sum_degree: Option<usize>,
    pub efficiency: Option<usize>,
    pub packing: Option<usize>,
    pub sum_over_packing: Option<usize>,
    pub greedy_upper: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GreedyMode {
    Once,
    AlwaysBeforeExpensiveReductions,
}

impl Default for GreedyMode {
    fn default() -> Self {
        Self::Once
    }
}

/// Solver tunables. Every field has a default, so a config file may specify
/// only the fields it wants to override.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Terminate early once the incumbent size is at most this.
    pub stop_at: Option<usize>,

    /// Seed the incumbent with this hitting set (0-based vertex ids).
    /// Rejected at solver construction if it does not actually hit every
    /// edge.
    pub initial_hitting_set: Option<Vec<usize>>,

    /// Wall-clock deadline for the whole solve, in seconds.
    pub time_limit: Option<f64>,

    /// Run local search on each greedy incumbent and once more on the
    /// final incumbent, and feed the packing bound's 2-opt improvement
    /// pass.
    pub enable_local_search: bool,

    pub enable_max_degree_bound: bool,
    pub enable_sum_degree_bound: bool,
    pub enable_efficiency_bound: bool,
    pub enable_packing_bound: bool,

    /// Requires `enable_packing_bound`.
    pub enable_sum_over_packing_bound: bool,

    /// Reserved for a future incremental packing-rebuild cadence; accepted
    /// and validated but currently has no effect (the packing bound is
    /// always rebuilt from scratch each reduction pass).
    pub packing_from_scratch_limit: usize,

    pub greedy_mode: GreedyMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            stop_at: None,
            initial_hitting_set: None,
            time_limit: None,
            enable_local_search: true,
            enable_max_degree_bound: true,
            enable_sum_degree_bound: true,
            enable_efficiency_bound: true,
            enable_packing_bound: true,
            enable_sum_over_packing_bound: true,
            packing_from_scratch_limit: 3,
            greedy_mode: GreedyMode::Once,
        }
    }
}

impl Settings {
    /// Checks the settings for internal inconsistency that can be caught
    /// without touching an instance (negative time limit, etc). Validity of
    /// `initial_hitting_set` against a concrete instance is checked
    /// separately once the instance is known.
    pub fn validate(&self) -> Result<(), crate::SolverError> {
        if let Some(limit) = self.time_limit {
            if limit < 0.0 {
                return Err(crate::SolverError::Config(format!(
                    "time_limit must be non-negative, got {}",
                    limit
                )));
            }
        }
        if self.enable_sum_over_packing_bound && !self.enable_packing_bound {
            return Err(crate::SolverError::Config(
                "enable_sum_over_packing_bound requires enable_packing_bound".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub instance_name: String,
    pub opt: usize,
    pub branching_steps: usize,
    pub proved_optimal: bool,
    pub settings: Settings,
    pub root_bounds: RootBounds,
    pub runtimes: RuntimeStats,
    pub reductions: ReductionStats,
    pub wall_time_seconds: f64,
}
