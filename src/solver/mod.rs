//! Solver adapter
//!
//! Submits a [`CpModel`] to a [`Backend`] with a time budget and worker count,
//! and maps what the backend reports onto [`SolveStatus`]. No placement logic
//! lives here.

pub mod milp;
pub mod model;

use std::fmt;
use std::time::{Duration, Instant};

use log::info;
use thiserror::Error;

pub use milp::MilpBackend;
pub use model::{
    Assignment, BoolVar, Constraint, ConstraintOrigin, ConstraintSource, CpModel, IntVar,
    LinearExpr, Literal, Rect2D,
};

/// Errors raised by the adapter or a backend
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("invalid model: {0}")]
    InvalidModel(String),

    #[error("backend '{backend}' failed: {message}")]
    Backend { backend: String, message: String },
}

/// Limits handed to a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolveParams {
    /// Wall-clock budget; the backend must return by then
    pub time_limit: Duration,
    /// Number of search workers the caller asked for
    pub workers: usize,
}

impl Default for SolveParams {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_secs(30),
            workers: 1,
        }
    }
}

/// Raw result of a backend run
#[derive(Debug, Clone)]
pub struct BackendOutcome {
    /// Best assignment found, covering every model variable
    pub solution: Option<Assignment>,
    /// The search space was fully explored (optimality or infeasibility proven)
    pub search_complete: bool,
}

impl BackendOutcome {
    /// Proven that no assignment exists
    pub fn infeasible() -> Self {
        Self {
            solution: None,
            search_complete: true,
        }
    }
}

/// An integer optimization engine
pub trait Backend {
    fn name(&self) -> &str;

    fn solve(&self, model: &CpModel, params: &SolveParams) -> Result<BackendOutcome, SolverError>;
}

/// Outcome of a solve attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// Proven best solution
    Optimal,
    /// A solution, without proof it is the best (time limit hit)
    Feasible,
    /// Proven that no solution exists
    Infeasible,
    /// No solution found and nothing proven (time limit hit)
    Unknown,
}

impl SolveStatus {
    pub fn from_outcome(has_solution: bool, search_complete: bool) -> Self {
        match (has_solution, search_complete) {
            (true, true) => SolveStatus::Optimal,
            (true, false) => SolveStatus::Feasible,
            (false, true) => SolveStatus::Infeasible,
            (false, false) => SolveStatus::Unknown,
        }
    }

    pub fn has_solution(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SolveStatus::Optimal => "OPTIMAL",
            SolveStatus::Feasible => "FEASIBLE",
            SolveStatus::Infeasible => "INFEASIBLE",
            SolveStatus::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// Status plus the assignment (present exactly when the status has a solution)
#[derive(Debug, Clone)]
pub struct SolveResult {
    pub status: SolveStatus,
    pub assignment: Option<Assignment>,
    pub elapsed: Duration,
}

/// Solve with the HiGHS backend
pub fn solve(model: &CpModel, params: &SolveParams) -> Result<SolveResult, SolverError> {
    solve_with(&MilpBackend, model, params)
}

/// Solve with an explicit backend
pub fn solve_with(
    backend: &dyn Backend,
    model: &CpModel,
    params: &SolveParams,
) -> Result<SolveResult, SolverError> {
    validate(model)?;

    let started = Instant::now();
    let outcome = backend.solve(model, params)?;
    let elapsed = started.elapsed();

    if let Some(assignment) = &outcome.solution {
        if assignment.values().len() != model.num_vars() {
            return Err(SolverError::Backend {
                backend: backend.name().to_string(),
                message: format!(
                    "assignment covers {} of {} variables",
                    assignment.values().len(),
                    model.num_vars()
                ),
            });
        }
    }

    let status = SolveStatus::from_outcome(outcome.solution.is_some(), outcome.search_complete);
    info!(
        "{}: {} after {:.3}s",
        backend.name(),
        status,
        elapsed.as_secs_f64()
    );

    Ok(SolveResult {
        status,
        assignment: outcome.solution,
        elapsed,
    })
}

fn validate(model: &CpModel) -> Result<(), SolverError> {
    for decl in model.vars() {
        if decl.lb > decl.ub {
            return Err(SolverError::InvalidModel(format!(
                "variable '{}' has empty domain [{}, {}]",
                decl.name, decl.lb, decl.ub
            )));
        }
    }
    let n = model.num_vars();
    let check = |var: IntVar| {
        if var.index() < n {
            Ok(())
        } else {
            Err(SolverError::InvalidModel(format!(
                "reference to undeclared variable #{}",
                var.index()
            )))
        }
    };
    for entry in model.constraints() {
        for lit in &entry.enforcement {
            check(lit.var())?;
        }
        match &entry.constraint {
            Constraint::Linear { expr, .. } => {
                for (v, _) in expr.terms() {
                    check(*v)?;
                }
            }
            Constraint::BoolOr(lits) => {
                for lit in lits {
                    check(lit.var())?;
                }
            }
            Constraint::Abs { target, var } => {
                check(*target)?;
                check(*var)?;
            }
            Constraint::NoOverlap2D(rects) => {
                for r in rects {
                    check(r.x)?;
                    check(r.y)?;
                }
            }
        }
    }
    Ok(())
}
