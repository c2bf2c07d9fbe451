//! Factory Layout - rule-driven equipment placement for rectangular rooms
//!
//! This library compiles a project (room, equipment, placement rules) into an
//! integer optimization model, solves it, and returns the position of every
//! item in the room's physical units.
//!
//! # Example
//!
//! ```rust
//! use factory_layout::{place, PlacerConfig, Project};
//!
//! let project = Project::from_json_str(r#"{
//!     "meta": { "project_name": "demo" },
//!     "architecture": {
//!         "room_dimensions": { "width": 6, "depth": 4, "height": 3 },
//!         "wall_thickness": 0.2
//!     },
//!     "equipment": [
//!         { "id": "A", "name": "Press", "footprint": { "width": 1, "depth": 1 }, "height": 1 }
//!     ],
//!     "rules": [
//!         { "type": "PLACE_AT", "target": "A", "params": { "position": [1, 1] } }
//!     ]
//! }"#).unwrap();
//!
//! let report = place(&project, &PlacerConfig::default().with_scale(100)).unwrap();
//! assert_eq!(report.solution.get("A").map(|p| (p.x, p.y)), Some((1.0, 1.0)));
//! ```

pub mod error;
pub mod ident;
pub mod layout;
pub mod project;
pub mod renderer;
pub mod rules;
pub mod solver;
pub mod stylesheet;

use std::time::Duration;

use log::info;

pub use error::ProjectError;
pub use layout::{
    CompileWarning, PlaceError, Placement, PlacementSolution, PlacerConfig, RuleError, RulePolicy,
};
pub use project::Project;
pub use renderer::{render_floor_plan, SvgConfig};
pub use rules::{Rule, RuleKind};
pub use solver::{Backend, MilpBackend, SolveParams, SolveStatus};
pub use stylesheet::Stylesheet;

/// Outcome of a successful placement
#[derive(Debug, Clone)]
pub struct PlacementReport {
    pub solution: PlacementSolution,
    /// `Optimal` or `Feasible`
    pub status: SolveStatus,
    /// Rules compiled into the model, as `#index description`
    pub applied_rules: Vec<String>,
    /// Rules skipped during compilation
    pub warnings: Vec<CompileWarning>,
    pub objective: i64,
    pub elapsed: Duration,
}

/// Place every item of a project with the HiGHS backend
pub fn place(project: &Project, config: &PlacerConfig) -> Result<PlacementReport, PlaceError> {
    place_with_backend(project, config, &MilpBackend)
}

/// Place every item of a project with a caller-supplied solver backend
///
/// Infeasibility and timeouts come back as distinct [`PlaceError`] variants,
/// both carrying the rules that were applied.
pub fn place_with_backend(
    project: &Project,
    config: &PlacerConfig,
    backend: &dyn Backend,
) -> Result<PlacementReport, PlaceError> {
    let compiled = layout::compile(project, config)?;
    let params = SolveParams {
        time_limit: config.time_limit_for(project),
        workers: config.workers_for(project),
    };
    info!(
        "solving '{}' with {} (limit {:.1}s, {} worker(s))",
        project.meta.project_name,
        backend.name(),
        params.time_limit.as_secs_f64(),
        params.workers
    );

    let result = solver::solve_with(backend, &compiled.model, &params)?;
    let applied_rules = compiled.report.applied_descriptions();
    let warnings = compiled.report.warnings;

    let assignment = match (result.status, result.assignment) {
        (status, Some(assignment)) if status.has_solution() => assignment,
        (SolveStatus::Infeasible, _) => {
            return Err(PlaceError::Infeasible {
                applied_rules,
                warnings,
            })
        }
        _ => {
            return Err(PlaceError::Timeout {
                time_limit: params.time_limit,
                applied_rules,
                warnings,
            })
        }
    };

    let solution = layout::extract(
        &assignment,
        &compiled.boxes,
        &compiled.orientations,
        compiled.scale,
    );
    info!(
        "placed {} item(s): {} (objective {})",
        solution.len(),
        result.status,
        assignment.objective()
    );

    Ok(PlacementReport {
        solution,
        status: result.status,
        applied_rules,
        warnings,
        objective: assignment.objective(),
        elapsed: result.elapsed,
    })
}
