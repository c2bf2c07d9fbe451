//! MILP backend on HiGHS through `good_lp`
//!
//! Every model variable becomes an integer column with its declared bounds.
//! Enforcement literals, clauses, absolute values and the pairwise no-overlap
//! disjunction are written with big-M terms. Each M is derived from the
//! variable bounds of the constraint it relaxes, so it is never larger than
//! that constraint needs.
//!
//! HiGHS answers in floating point. Values are rounded back to integers and
//! re-checked against the model before they are reported as a solution.

use std::time::Instant;

use good_lp::solvers::highs::highs;
use good_lp::{
    constraint, variable, Expression, ProblemVariables, ResolutionError, Solution, SolverModel,
    Variable,
};
use log::{debug, warn};

use super::model::{clamp_i64, Constraint, ConstraintEntry, CpModel, IntVar, LinearExpr, Literal};
use super::{Assignment, Backend, BackendOutcome, SolveParams, SolverError};

const BACKEND: &str = "highs";

/// Mixed-integer backend solving the model with HiGHS
#[derive(Debug, Clone, Copy, Default)]
pub struct MilpBackend;

impl Backend for MilpBackend {
    fn name(&self) -> &str {
        BACKEND
    }

    fn solve(&self, model: &CpModel, params: &SolveParams) -> Result<BackendOutcome, SolverError> {
        if let Some(entry) = constant_conflict(model) {
            debug!("{} cannot hold under any placement", entry.source);
            return Ok(BackendOutcome::infeasible());
        }
        if model.num_vars() == 0 {
            let objective = model.objective().map_or(0, LinearExpr::constant_value);
            return Ok(BackendOutcome {
                solution: Some(Assignment::new(Vec::new(), objective)),
                search_complete: true,
            });
        }

        let started = Instant::now();
        let mut vars = ProblemVariables::new();
        let columns: Vec<Variable> = model
            .vars()
            .iter()
            .map(|decl| {
                let definition = if decl.is_bool {
                    variable().binary()
                } else {
                    variable()
                        .integer()
                        .min(decl.lb as f64)
                        .max(decl.ub as f64)
                };
                vars.add(definition.name(decl.name.clone()))
            })
            .collect();

        // Auxiliary binaries must exist before the problem is created
        let relaxable = relaxable_abs(model);
        let mut relaxed: Vec<(IntVar, IntVar)> = Vec::new();
        let mut aux: Vec<Vec<Variable>> = Vec::with_capacity(model.constraints().len());
        for (index, entry) in model.constraints().iter().enumerate() {
            let extra = match &entry.constraint {
                Constraint::Abs { target, var } if relaxable[index] => {
                    relaxed.push((*target, *var));
                    Vec::new()
                }
                Constraint::Abs { .. } => vec![vars.add(variable().binary())],
                Constraint::NoOverlap2D(rects) => {
                    let pairs = rects.len() * rects.len().saturating_sub(1) / 2;
                    (0..4 * pairs).map(|_| vars.add(variable().binary())).collect()
                }
                _ => Vec::new(),
            };
            aux.push(extra);
        }

        let objective = model
            .objective()
            .map_or_else(|| Expression::from(0.0), |o| expression(&columns, o));
        let mut problem = vars
            .minimise(objective)
            .using(highs)
            .set_time_limit(params.time_limit.as_secs_f64());

        let mut rows = 0usize;
        for (entry, extra) in model.constraints().iter().zip(&aux) {
            for row in translate(model, &columns, entry, extra)? {
                problem.add_constraint(row);
                rows += 1;
            }
        }
        debug!(
            "{}: {} columns, {} rows ({} abs relaxed), {} worker(s) requested",
            BACKEND,
            columns.len() + aux.iter().map(Vec::len).sum::<usize>(),
            rows,
            relaxed.len(),
            params.workers
        );

        match problem.solve() {
            Ok(solution) => {
                let mut values: Vec<i64> = columns
                    .iter()
                    .zip(model.vars())
                    .map(|(column, decl)| (solution.value(*column).round() as i64).clamp(decl.lb, decl.ub))
                    .collect();
                for (target, var) in &relaxed {
                    values[target.index()] = values[var.index()].abs();
                }

                // HiGHS returns before the deadline only once the gap is closed
                let search_complete = started.elapsed() < params.time_limit;
                if let Some(entry) = model.violation(&values) {
                    warn!("{}: returned values break {}", BACKEND, entry.source);
                    return Ok(BackendOutcome {
                        solution: None,
                        search_complete: false,
                    });
                }
                let objective = model
                    .objective()
                    .map_or(0, |o| clamp_i64(o.eval(&values)));
                Ok(BackendOutcome {
                    solution: Some(Assignment::new(values, objective)),
                    search_complete,
                })
            }
            Err(ResolutionError::Infeasible) => Ok(BackendOutcome::infeasible()),
            Err(e) => Err(SolverError::Backend {
                backend: BACKEND.to_string(),
                message: e.to_string(),
            }),
        }
    }
}

/// An unconditional constraint without variables that does not hold
fn constant_conflict(model: &CpModel) -> Option<&ConstraintEntry> {
    model.constraints().iter().find(|entry| match &entry.constraint {
        Constraint::Linear { expr, .. } if expr.is_constant() && entry.enforcement.is_empty() => {
            !entry.constraint.holds(&[])
        }
        Constraint::BoolOr(lits) => lits.is_empty() && entry.enforcement.is_empty(),
        _ => false,
    })
}

/// Abs constraints whose target only feeds a minimized objective
///
/// Such a target settles on `|var|` by itself, so `t >= var` and `t >= -var`
/// suffice.
fn relaxable_abs(model: &CpModel) -> Vec<bool> {
    let mut uses = vec![0usize; model.num_vars()];
    let mut touch = |v: IntVar| uses[v.index()] += 1;
    for entry in model.constraints() {
        entry.enforcement.iter().for_each(|l| touch(l.var()));
        match &entry.constraint {
            Constraint::Linear { expr, .. } => expr.terms().iter().for_each(|(v, _)| touch(*v)),
            Constraint::BoolOr(lits) => lits.iter().for_each(|l| touch(l.var())),
            Constraint::Abs { target, var } => {
                touch(*target);
                touch(*var);
            }
            Constraint::NoOverlap2D(rects) => rects.iter().for_each(|r| {
                touch(r.x);
                touch(r.y);
            }),
        }
    }

    let mut weight = vec![0i64; model.num_vars()];
    if let Some(objective) = model.objective() {
        for (v, c) in objective.terms() {
            weight[v.index()] = *c;
        }
    }

    model
        .constraints()
        .iter()
        .map(|entry| match &entry.constraint {
            Constraint::Abs { target, .. } => {
                entry.enforcement.is_empty()
                    && uses[target.index()] == 1
                    && weight[target.index()] >= 0
            }
            _ => false,
        })
        .collect()
}

fn expression(columns: &[Variable], expr: &LinearExpr) -> Expression {
    expr.terms()
        .iter()
        .fold(Expression::from(expr.constant_value() as f64), |acc, (v, c)| {
            acc + (*c as f64) * columns[v.index()]
        })
}

/// `weight * lit`, with a negated literal read as `1 - var`
fn literal(columns: &[Variable], lit: Literal, weight: f64) -> Expression {
    let column = columns[lit.var().index()];
    if lit.is_negated() {
        Expression::from(weight) - weight * column
    } else {
        weight * column
    }
}

/// `m * (number of enforcement literals that do not hold)`
fn slack(columns: &[Variable], enforcement: &[Literal], m: f64) -> Expression {
    enforcement
        .iter()
        .fold(Expression::from(0.0), |acc, lit| acc + literal(columns, lit.not(), m))
}

fn translate(
    model: &CpModel,
    columns: &[Variable],
    entry: &ConstraintEntry,
    aux: &[Variable],
) -> Result<Vec<good_lp::Constraint>, SolverError> {
    let enforcement = &entry.enforcement;
    let mut rows = Vec::new();

    match &entry.constraint {
        Constraint::Linear { expr, lb, ub } => {
            let (lo, hi) = model.expr_bounds(expr);
            if enforcement.is_empty() {
                let e = expression(columns, expr);
                match (lb, ub) {
                    (Some(l), Some(u)) if l == u => {
                        let k = *l as f64;
                        rows.push(constraint!(e == k));
                    }
                    _ => {
                        if let Some(u) = ub {
                            let (e, k) = (e.clone(), *u as f64);
                            rows.push(constraint!(e <= k));
                        }
                        if let Some(l) = lb {
                            let k = *l as f64;
                            rows.push(constraint!(e >= k));
                        }
                    }
                }
            } else {
                // A side that holds over the whole domain needs no row
                if let Some(u) = ub {
                    let m = hi as f64 - *u as f64;
                    if m > 0.0 {
                        let e = expression(columns, expr);
                        let rhs = Expression::from(*u as f64) + slack(columns, enforcement, m);
                        rows.push(constraint!(e <= rhs));
                    }
                }
                if let Some(l) = lb {
                    let m = *l as f64 - lo as f64;
                    if m > 0.0 {
                        let e = expression(columns, expr);
                        let rhs = Expression::from(*l as f64) - slack(columns, enforcement, m);
                        rows.push(constraint!(e >= rhs));
                    }
                }
            }
        }

        Constraint::BoolOr(lits) => {
            let any = lits
                .iter()
                .fold(slack(columns, enforcement, 1.0), |acc, lit| acc + literal(columns, *lit, 1.0));
            rows.push(constraint!(any >= 1.0));
        }

        Constraint::Abs { target, var } => {
            require_unconditional(entry)?;
            let (t, x) = (columns[target.index()], columns[var.index()]);
            rows.push(constraint!(t - x >= 0.0));
            rows.push(constraint!(t + x >= 0.0));
            if let Some(&sign) = aux.first() {
                let decl = &model.vars()[var.index()];
                let m = 2.0 * (decl.lb.unsigned_abs().max(decl.ub.unsigned_abs()) as f64);
                // sign = 1 selects t = x, sign = 0 selects t = -x
                let chosen = Expression::from(m) - m * sign;
                rows.push(constraint!(t - x <= chosen));
                rows.push(constraint!(t + x <= m * sign));
            }
        }

        Constraint::NoOverlap2D(rects) => {
            require_unconditional(entry)?;
            let bound = |v: IntVar| {
                let decl = &model.vars()[v.index()];
                (decl.lb as f64, decl.ub as f64)
            };
            let mut selectors = aux.chunks(4);
            for (i, a) in rects.iter().enumerate() {
                for b in &rects[i + 1..] {
                    let Some(&[left, right, below, above]) = selectors.next() else {
                        return Err(SolverError::InvalidModel(format!(
                            "no-overlap selectors missing for {}",
                            entry.source
                        )));
                    };
                    let (ax, ay, bx, by) = (bound(a.x), bound(a.y), bound(b.x), bound(b.y));
                    let (aw, ah, bw, bh) = (a.width as f64, a.height as f64, b.width as f64, b.height as f64);

                    // Amount by which each separation can fail over the domains
                    let m_left = ax.1 + aw - bx.0;
                    let m_right = bx.1 + bw - ax.0;
                    let m_below = ay.1 + ah - by.0;
                    let m_above = by.1 + bh - ay.0;
                    if m_left <= 0.0 || m_right <= 0.0 || m_below <= 0.0 || m_above <= 0.0 {
                        continue;
                    }

                    let (cax, cay, cbx, cby) = (
                        columns[a.x.index()],
                        columns[a.y.index()],
                        columns[b.x.index()],
                        columns[b.y.index()],
                    );
                    // Selected side: `a` ends before `b` starts; otherwise relaxed by m
                    let apart = |m: f64, selector: Variable, size: f64| {
                        Expression::from(m - size) - m * selector
                    };
                    rows.push(constraint!(left + right + below + above >= 1.0));
                    rows.push(constraint!(cax - cbx <= apart(m_left, left, aw)));
                    rows.push(constraint!(cbx - cax <= apart(m_right, right, bw)));
                    rows.push(constraint!(cay - cby <= apart(m_below, below, ah)));
                    rows.push(constraint!(cby - cay <= apart(m_above, above, bh)));
                }
            }
        }
    }
    Ok(rows)
}

fn require_unconditional(entry: &ConstraintEntry) -> Result<(), SolverError> {
    if entry.enforcement.is_empty() {
        Ok(())
    } else {
        Err(SolverError::InvalidModel(format!(
            "enforcement literals are only supported on linear constraints and clauses ({})",
            entry.source
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::{solve_with, ConstraintSource, Rect2D, SolveStatus};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn src() -> ConstraintSource {
        ConstraintSource::structural("test")
    }

    fn params() -> SolveParams {
        SolveParams {
            time_limit: Duration::from_secs(5),
            workers: 1,
        }
    }

    #[test]
    fn test_minimizes_within_bounds() {
        let mut model = CpModel::new();
        let x = model.new_int_var(3, 9, "x");
        let y = model.new_int_var(0, 9, "y");
        model.add_ge(x + y, 7, src());
        model.minimize(x * 2 + y);

        let result = solve_with(&MilpBackend, &model, &params()).unwrap();
        assert_eq!(result.status, SolveStatus::Optimal);
        let assignment = result.assignment.unwrap();
        assert_eq!((assignment.value(x), assignment.value(y)), (3, 4));
        assert_eq!(assignment.objective(), 10);
    }

    #[test]
    fn test_enforced_constraint_and_clause() {
        let mut model = CpModel::new();
        let x = model.new_int_var(0, 10, "x");
        let low = model.new_bool_var("low");
        let high = model.new_bool_var("high");
        let c = model.add_le(x, 2, src());
        model.only_enforce_if(c, &[low.into()]);
        let c = model.add_ge(x, 8, src());
        model.only_enforce_if(c, &[high.into()]);
        model.add_bool_or(vec![low.into(), high.into()], src());
        model.add_ge(x, 5, src());
        model.minimize(x);

        let assignment = solve_with(&MilpBackend, &model, &params())
            .unwrap()
            .assignment
            .unwrap();
        assert_eq!(assignment.value(x), 8);
        assert!(assignment.bool_value(high));
    }

    #[test]
    fn test_no_overlap_separates_boxes() {
        let mut model = CpModel::new();
        let rects: Vec<Rect2D> = (0..3)
            .map(|i| Rect2D {
                x: model.new_int_var(0, 6, format!("x{}", i)),
                width: 3,
                y: model.new_int_var(0, 0, format!("y{}", i)),
                height: 2,
            })
            .collect();
        model.add_no_overlap_2d(rects.clone(), src());

        let result = solve_with(&MilpBackend, &model, &params()).unwrap();
        let assignment = result.assignment.unwrap();
        let mut xs: Vec<i64> = rects.iter().map(|r| assignment.value(r.x)).collect();
        xs.sort();
        assert_eq!(xs, vec![0, 3, 6]);
    }

    #[test]
    fn test_crowded_row_is_infeasible() {
        let mut model = CpModel::new();
        let rects: Vec<Rect2D> = (0..3)
            .map(|i| Rect2D {
                x: model.new_int_var(0, 5, format!("x{}", i)),
                width: 3,
                y: model.new_int_var(0, 0, format!("y{}", i)),
                height: 2,
            })
            .collect();
        model.add_no_overlap_2d(rects, src());

        let result = solve_with(&MilpBackend, &model, &params()).unwrap();
        assert_eq!(result.status, SolveStatus::Infeasible);
    }

    #[test]
    fn test_abs_in_objective_and_in_constraint() {
        let mut model = CpModel::new();
        let x = model.new_int_var(-6, 4, "x");
        let relaxed = model.new_abs(x, "abs_relaxed", src());
        let exact = model.new_abs(x - 1, "abs_exact", src());
        // Forcing |x - 1| up makes the exact form matter
        model.add_ge(exact, 5, src());
        model.minimize(LinearExpr::from(relaxed));

        let assignment = solve_with(&MilpBackend, &model, &params())
            .unwrap()
            .assignment
            .unwrap();
        assert_eq!(assignment.value(x), -4);
        assert_eq!(assignment.value(relaxed), 4);
        assert_eq!(assignment.value(exact), 5);
    }

    #[test]
    fn test_constant_conflict_short_circuits() {
        let mut model = CpModel::new();
        model.new_int_var(0, 3, "x");
        model.add_linear(LinearExpr::constant(1), None, Some(0), src());

        let result = solve_with(&MilpBackend, &model, &params()).unwrap();
        assert_eq!(result.status, SolveStatus::Infeasible);
    }
}
