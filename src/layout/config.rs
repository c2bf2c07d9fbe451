//! Configuration for the placer

use std::time::Duration;

use crate::project::Project;

/// Time budget used when neither the config nor the project sets one
pub const DEFAULT_TIME_LIMIT: Duration = Duration::from_secs(30);

/// Longest time budget accepted from a project file
pub const MAX_TIME_LIMIT: Duration = Duration::from_secs(24 * 60 * 60);

/// Objective weights and penalty costs are clamped to `0..=MAX_WEIGHT`
pub const MAX_WEIGHT: i64 = 1 << 20;

/// Which rule parts are hard constraints and which are penalized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RulePolicy {
    /// `PLACE_AFTER` cross-axis centering is a penalized preference
    pub soft_place_after_alignment: bool,
    /// Every `CORRIDOR` may be violated at `penalty_cost` per item,
    /// not only the ones marked `soft`
    pub soft_corridors: bool,
}

impl Default for RulePolicy {
    fn default() -> Self {
        Self {
            soft_place_after_alignment: true,
            soft_corridors: false,
        }
    }
}

/// Configuration options for compiling and solving a placement
#[derive(Debug, Clone, PartialEq)]
pub struct PlacerConfig {
    /// Fixed-point multiplier from physical units to solver integers
    pub scale: i64,

    /// Objective cost of one violated soft indicator
    pub penalty_cost: i64,

    /// Per-unit weight of the center distance between flow-connected items
    pub flow_weight: i64,

    /// Per-unit weight of the center distance between unconnected items
    pub cohesion_weight: i64,

    /// Per-unit weight of the X and Y spans of all item origins
    pub compactness_weight: i64,

    /// Overrides `solver_options.time_limit_sec`
    pub time_limit: Option<Duration>,

    /// Overrides `solver_options.workers`
    pub workers: Option<usize>,

    pub policy: RulePolicy,
}

impl Default for PlacerConfig {
    fn default() -> Self {
        Self {
            scale: 1000,
            penalty_cost: 10_000,
            flow_weight: 1,
            cohesion_weight: 10,
            compactness_weight: 1,
            time_limit: None,
            workers: None,
            policy: RulePolicy::default(),
        }
    }
}

impl PlacerConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scale(mut self, scale: i64) -> Self {
        self.scale = scale.max(1);
        self
    }

    pub fn with_penalty_cost(mut self, cost: i64) -> Self {
        self.penalty_cost = cost;
        self
    }

    /// Set the flow and cohesion weights
    pub fn with_distance_weights(mut self, flow: i64, cohesion: i64) -> Self {
        self.flow_weight = flow;
        self.cohesion_weight = cohesion;
        self
    }

    pub fn with_compactness_weight(mut self, weight: i64) -> Self {
        self.compactness_weight = weight;
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers.max(1));
        self
    }

    pub fn with_policy(mut self, policy: RulePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Effective time budget: config, then project, then the default
    pub fn time_limit_for(&self, project: &Project) -> Duration {
        self.time_limit
            .or_else(|| {
                project
                    .solver_options
                    .as_ref()
                    .and_then(|o| o.time_limit_sec)
                    .filter(|s| *s > 0.0)
                    .map(capped_duration)
            })
            .unwrap_or(DEFAULT_TIME_LIMIT)
    }

    /// Effective worker count: config, then project, then one
    pub fn workers_for(&self, project: &Project) -> usize {
        self.workers
            .or_else(|| project.solver_options.as_ref().and_then(|o| o.workers))
            .unwrap_or(1)
            .max(1)
    }

    /// Objective weight of one scaled unit of `COMPACT_GROUP` spread
    pub fn group_weight(&self) -> i64 {
        (bounded_weight(self.penalty_cost) / self.scale.max(1)).max(1)
    }
}

/// A weight the objective can multiply without overflow
pub fn bounded_weight(weight: i64) -> i64 {
    weight.clamp(0, MAX_WEIGHT)
}

/// Seconds to a duration no longer than [`MAX_TIME_LIMIT`]
pub fn capped_duration(seconds: f64) -> Duration {
    Duration::try_from_secs_f64(seconds).map_or(MAX_TIME_LIMIT, |d| d.min(MAX_TIME_LIMIT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{Architecture, Meta, RoomDimensions, SolverOptions};

    fn project(options: Option<SolverOptions>) -> Project {
        Project {
            meta: Meta {
                project_name: "cfg".into(),
                schema_version: None,
            },
            architecture: Architecture {
                room_dimensions: RoomDimensions {
                    width: 5.0,
                    depth: 5.0,
                    height: 3.0,
                },
                wall_thickness: 0.0,
                roof: None,
            },
            equipment: Vec::new(),
            rules: Vec::new(),
            solver_options: options,
        }
    }

    #[test]
    fn test_default_config() {
        let config = PlacerConfig::default();
        assert_eq!(config.scale, 1000);
        assert_eq!(config.penalty_cost, 10_000);
        assert_eq!((config.flow_weight, config.cohesion_weight), (1, 10));
        assert_eq!(config.group_weight(), 10);
        assert!(config.policy.soft_place_after_alignment);
    }

    #[test]
    fn test_builder_pattern() {
        let config = PlacerConfig::new()
            .with_scale(100)
            .with_penalty_cost(50)
            .with_workers(0);
        assert_eq!(config.scale, 100);
        assert_eq!(config.group_weight(), 1);
        assert_eq!(config.workers, Some(1));
    }

    #[test]
    fn test_time_limit_resolution() {
        let from_project = project(Some(SolverOptions {
            time_limit_sec: Some(5.0),
            workers: Some(3),
        }));
        let config = PlacerConfig::default();
        assert_eq!(config.time_limit_for(&from_project), Duration::from_secs(5));
        assert_eq!(config.workers_for(&from_project), 3);
        assert_eq!(config.time_limit_for(&project(None)), DEFAULT_TIME_LIMIT);

        let overridden = config.with_time_limit(Duration::from_millis(250)).with_workers(2);
        assert_eq!(overridden.time_limit_for(&from_project), Duration::from_millis(250));
        assert_eq!(overridden.workers_for(&from_project), 2);
    }

    #[test]
    fn test_huge_time_limit_is_capped() {
        let huge = project(Some(SolverOptions {
            time_limit_sec: Some(1e30),
            workers: None,
        }));
        assert_eq!(PlacerConfig::default().time_limit_for(&huge), MAX_TIME_LIMIT);

        let endless = project(Some(SolverOptions {
            time_limit_sec: Some(f64::INFINITY),
            workers: None,
        }));
        assert_eq!(PlacerConfig::default().time_limit_for(&endless), MAX_TIME_LIMIT);
        assert_eq!(capped_duration(f64::NAN), MAX_TIME_LIMIT);
        assert_eq!(capped_duration(1.5), Duration::from_millis(1500));
    }

    #[test]
    fn test_weights_are_bounded() {
        assert_eq!(bounded_weight(i64::MAX), MAX_WEIGHT);
        assert_eq!(bounded_weight(-3), 0);
        assert_eq!(PlacerConfig::default().with_penalty_cost(i64::MAX).with_scale(1).group_weight(), MAX_WEIGHT);
    }
}
