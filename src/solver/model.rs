//! Engine-neutral integer model
//!
//! The layout compiler writes everything it knows into a [`CpModel`]: bounded
//! integer variables, booleans, linear (in)equalities that may be enforced only
//! when some literals hold, clauses, absolute values and a 2D no-overlap
//! constraint. A [`Backend`](super::Backend) consumes the model and returns an
//! [`Assignment`] for every declared variable; [`CpModel::violation`] checks
//! that assignment exactly.

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

// ============================================================================
// Variables and literals
// ============================================================================

/// Handle to a bounded integer variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntVar(usize);

impl IntVar {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Handle to a 0/1 variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoolVar(IntVar);

impl BoolVar {
    /// The underlying 0/1 integer variable
    pub fn var(self) -> IntVar {
        self.0
    }

    /// Literal that holds when this variable is false
    pub fn not(self) -> Literal {
        Literal {
            var: self.0,
            negated: true,
        }
    }
}

/// A boolean variable or its negation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Literal {
    var: IntVar,
    negated: bool,
}

impl Literal {
    pub fn var(self) -> IntVar {
        self.var
    }

    pub fn is_negated(self) -> bool {
        self.negated
    }

    pub fn not(self) -> Literal {
        Literal {
            var: self.var,
            negated: !self.negated,
        }
    }

    /// Whether the literal holds under the given 0/1 value of its variable
    pub fn holds(self, value: i64) -> bool {
        (value != 0) != self.negated
    }
}

impl From<BoolVar> for Literal {
    fn from(b: BoolVar) -> Self {
        Literal {
            var: b.0,
            negated: false,
        }
    }
}

/// Declaration of a variable
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub name: String,
    pub lb: i64,
    pub ub: i64,
    pub is_bool: bool,
}

// ============================================================================
// Linear expressions
// ============================================================================

/// `sum(coef * var) + constant`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinearExpr {
    terms: Vec<(IntVar, i64)>,
    constant: i64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constant(value: i64) -> Self {
        Self {
            terms: Vec::new(),
            constant: value,
        }
    }

    pub fn term(var: IntVar, coef: i64) -> Self {
        Self {
            terms: vec![(var, coef)],
            constant: 0,
        }
    }

    /// Add `coef * var`, merging with an existing term on the same variable
    pub fn add_term(&mut self, var: IntVar, coef: i64) -> &mut Self {
        if coef == 0 {
            return self;
        }
        match self.terms.iter_mut().find(|(v, _)| *v == var) {
            Some((_, c)) => *c += coef,
            None => self.terms.push((var, coef)),
        }
        self.terms.retain(|(_, c)| *c != 0);
        self
    }

    pub fn add_constant(&mut self, value: i64) -> &mut Self {
        self.constant += value;
        self
    }

    pub fn terms(&self) -> &[(IntVar, i64)] {
        &self.terms
    }

    pub fn constant_value(&self) -> i64 {
        self.constant
    }

    pub fn is_constant(&self) -> bool {
        self.terms.is_empty()
    }

    /// Evaluate the expression against a full assignment
    pub fn eval(&self, values: &[i64]) -> i128 {
        self.terms.iter().fold(self.constant as i128, |acc, (v, c)| {
            acc + *c as i128 * values[v.index()] as i128
        })
    }
}

impl From<IntVar> for LinearExpr {
    fn from(var: IntVar) -> Self {
        LinearExpr::term(var, 1)
    }
}

impl From<BoolVar> for LinearExpr {
    fn from(var: BoolVar) -> Self {
        LinearExpr::term(var.var(), 1)
    }
}

impl From<i64> for LinearExpr {
    fn from(value: i64) -> Self {
        LinearExpr::constant(value)
    }
}

impl From<i32> for LinearExpr {
    fn from(value: i32) -> Self {
        LinearExpr::constant(value as i64)
    }
}

impl<T: Into<LinearExpr>> Add<T> for LinearExpr {
    type Output = LinearExpr;

    fn add(mut self, rhs: T) -> LinearExpr {
        let rhs: LinearExpr = rhs.into();
        for (v, c) in rhs.terms {
            self.add_term(v, c);
        }
        self.constant += rhs.constant;
        self
    }
}

impl<T: Into<LinearExpr>> Sub<T> for LinearExpr {
    type Output = LinearExpr;

    fn sub(self, rhs: T) -> LinearExpr {
        let rhs: LinearExpr = rhs.into();
        self + (-rhs)
    }
}

impl Neg for LinearExpr {
    type Output = LinearExpr;

    fn neg(self) -> LinearExpr {
        self * -1
    }
}

impl Mul<i64> for LinearExpr {
    type Output = LinearExpr;

    fn mul(mut self, k: i64) -> LinearExpr {
        for (_, c) in &mut self.terms {
            *c *= k;
        }
        self.terms.retain(|(_, c)| *c != 0);
        self.constant *= k;
        self
    }
}

impl<T: Into<LinearExpr>> Add<T> for IntVar {
    type Output = LinearExpr;

    fn add(self, rhs: T) -> LinearExpr {
        LinearExpr::from(self) + rhs
    }
}

impl<T: Into<LinearExpr>> Sub<T> for IntVar {
    type Output = LinearExpr;

    fn sub(self, rhs: T) -> LinearExpr {
        LinearExpr::from(self) - rhs
    }
}

impl Mul<i64> for IntVar {
    type Output = LinearExpr;

    fn mul(self, k: i64) -> LinearExpr {
        LinearExpr::term(self, k)
    }
}

impl Mul<IntVar> for i64 {
    type Output = LinearExpr;

    fn mul(self, var: IntVar) -> LinearExpr {
        LinearExpr::term(var, self)
    }
}

// ============================================================================
// Constraint sources
// ============================================================================

/// Origin of a constraint (for diagnostics)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintOrigin {
    /// Always-on geometry: room bounds, no-overlap, clearance links
    Structural,
    /// Emitted while compiling the rule at this declaration index
    Rule(usize),
    /// Auxiliary definitions used by the objective
    Objective,
}

/// Tracks where a constraint came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintSource {
    pub description: String,
    pub origin: ConstraintOrigin,
}

impl ConstraintSource {
    pub fn structural(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            origin: ConstraintOrigin::Structural,
        }
    }

    pub fn rule(index: usize, description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            origin: ConstraintOrigin::Rule(index),
        }
    }

    pub fn objective(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            origin: ConstraintOrigin::Objective,
        }
    }
}

impl fmt::Display for ConstraintSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.origin {
            ConstraintOrigin::Structural => write!(f, "[structural] {}", self.description),
            ConstraintOrigin::Rule(i) => write!(f, "[rule #{}] {}", i, self.description),
            ConstraintOrigin::Objective => write!(f, "[objective] {}", self.description),
        }
    }
}

// ============================================================================
// Constraints
// ============================================================================

/// A fixed-size rectangle whose origin is a pair of variables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect2D {
    pub x: IntVar,
    pub width: i64,
    pub y: IntVar,
    pub height: i64,
}

/// A constraint in the model
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// lb <= expr <= ub; a missing bound is unbounded on that side
    Linear {
        expr: LinearExpr,
        lb: Option<i64>,
        ub: Option<i64>,
    },

    /// At least one literal holds
    BoolOr(Vec<Literal>),

    /// target = |var|
    Abs { target: IntVar, var: IntVar },

    /// No two rectangles overlap on both axes
    NoOverlap2D(Vec<Rect2D>),
}

/// A constraint together with its enforcement literals and origin
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintEntry {
    pub constraint: Constraint,
    /// The constraint is only required when all of these hold
    pub enforcement: Vec<Literal>,
    pub source: ConstraintSource,
}

/// Handle returned for constraints that accept enforcement literals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstraintRef(usize);

// ============================================================================
// Model
// ============================================================================

/// An integer optimization model built imperatively by the compiler
#[derive(Debug, Clone, Default)]
pub struct CpModel {
    vars: Vec<VarDecl>,
    constraints: Vec<ConstraintEntry>,
    objective: Option<LinearExpr>,
}

impl CpModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_int_var(&mut self, lb: i64, ub: i64, name: impl Into<String>) -> IntVar {
        self.vars.push(VarDecl {
            name: name.into(),
            lb,
            ub,
            is_bool: false,
        });
        IntVar(self.vars.len() - 1)
    }

    pub fn new_bool_var(&mut self, name: impl Into<String>) -> BoolVar {
        self.vars.push(VarDecl {
            name: name.into(),
            lb: 0,
            ub: 1,
            is_bool: true,
        });
        BoolVar(IntVar(self.vars.len() - 1))
    }

    /// Bounds of an expression under the declared variable bounds
    pub fn expr_bounds(&self, expr: &LinearExpr) -> (i64, i64) {
        let mut lo = expr.constant as i128;
        let mut hi = expr.constant as i128;
        for (v, c) in &expr.terms {
            let decl = &self.vars[v.index()];
            let a = *c as i128 * decl.lb as i128;
            let b = *c as i128 * decl.ub as i128;
            lo += a.min(b);
            hi += a.max(b);
        }
        (clamp_i64(lo), clamp_i64(hi))
    }

    fn push(&mut self, constraint: Constraint, source: ConstraintSource) -> ConstraintRef {
        self.constraints.push(ConstraintEntry {
            constraint,
            enforcement: Vec::new(),
            source,
        });
        ConstraintRef(self.constraints.len() - 1)
    }

    /// lb <= expr <= ub
    pub fn add_linear(
        &mut self,
        expr: impl Into<LinearExpr>,
        lb: Option<i64>,
        ub: Option<i64>,
        source: ConstraintSource,
    ) -> ConstraintRef {
        self.push(
            Constraint::Linear {
                expr: expr.into(),
                lb,
                ub,
            },
            source,
        )
    }

    /// lhs == rhs
    pub fn add_eq(
        &mut self,
        lhs: impl Into<LinearExpr>,
        rhs: impl Into<LinearExpr>,
        source: ConstraintSource,
    ) -> ConstraintRef {
        let lhs: LinearExpr = lhs.into();
        let rhs: LinearExpr = rhs.into();
        let expr = lhs - rhs;
        let k = -expr.constant;
        let expr = expr + k;
        self.add_linear(expr, Some(k), Some(k), source)
    }

    /// lhs <= rhs
    pub fn add_le(
        &mut self,
        lhs: impl Into<LinearExpr>,
        rhs: impl Into<LinearExpr>,
        source: ConstraintSource,
    ) -> ConstraintRef {
        let lhs: LinearExpr = lhs.into();
        let rhs: LinearExpr = rhs.into();
        let expr = lhs - rhs;
        let k = -expr.constant;
        let expr = expr + k;
        self.add_linear(expr, None, Some(k), source)
    }

    /// lhs >= rhs
    pub fn add_ge(
        &mut self,
        lhs: impl Into<LinearExpr>,
        rhs: impl Into<LinearExpr>,
        source: ConstraintSource,
    ) -> ConstraintRef {
        self.add_le(rhs, lhs, source)
    }

    /// At least one of the literals holds
    pub fn add_bool_or(&mut self, literals: Vec<Literal>, source: ConstraintSource) -> ConstraintRef {
        self.push(Constraint::BoolOr(literals), source)
    }

    /// Only require the referenced constraint when every literal holds
    pub fn only_enforce_if(&mut self, constraint: ConstraintRef, literals: &[Literal]) {
        self.constraints[constraint.0]
            .enforcement
            .extend_from_slice(literals);
    }

    /// New variable equal to `|expr|`
    pub fn new_abs(
        &mut self,
        expr: impl Into<LinearExpr>,
        name: impl Into<String>,
        source: ConstraintSource,
    ) -> IntVar {
        let expr = expr.into();
        let name = name.into();
        let (lo, hi) = self.expr_bounds(&expr);
        let diff = self.new_int_var(lo, hi, format!("{}_diff", name));
        self.add_eq(diff, expr, source.clone());
        let bound = lo.saturating_abs().max(hi.saturating_abs());
        let target = self.new_int_var(0, bound, name);
        self.push(Constraint::Abs { target, var: diff }, source);
        target
    }

    /// No two of the rectangles may overlap on both axes
    pub fn add_no_overlap_2d(&mut self, rects: Vec<Rect2D>, source: ConstraintSource) {
        self.push(Constraint::NoOverlap2D(rects), source);
    }

    pub fn minimize(&mut self, expr: impl Into<LinearExpr>) {
        self.objective = Some(expr.into());
    }

    pub fn vars(&self) -> &[VarDecl] {
        &self.vars
    }

    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }

    pub fn var_name(&self, var: IntVar) -> &str {
        &self.vars[var.index()].name
    }

    pub fn constraints(&self) -> &[ConstraintEntry] {
        &self.constraints
    }

    pub fn objective(&self) -> Option<&LinearExpr> {
        self.objective.as_ref()
    }

    /// First constraint the assignment breaks, if any
    pub fn violation(&self, values: &[i64]) -> Option<&ConstraintEntry> {
        self.constraints.iter().find(|entry| {
            let enforced = entry
                .enforcement
                .iter()
                .all(|lit| lit.holds(values[lit.var().index()]));
            enforced && !entry.constraint.holds(values)
        })
    }
}

impl Constraint {
    /// Whether the constraint is satisfied by a full assignment
    pub fn holds(&self, values: &[i64]) -> bool {
        let value = |v: IntVar| values[v.index()];
        match self {
            Constraint::Linear { expr, lb, ub } => {
                let x = expr.eval(values);
                lb.map_or(true, |lb| x >= lb as i128) && ub.map_or(true, |ub| x <= ub as i128)
            }
            Constraint::BoolOr(lits) => lits.iter().any(|l| l.holds(value(l.var()))),
            Constraint::Abs { target, var } => value(*target) as i128 == (value(*var) as i128).abs(),
            Constraint::NoOverlap2D(rects) => rects.iter().enumerate().all(|(i, a)| {
                rects[i + 1..].iter().all(|b| {
                    let (ax, ay, bx, by) = (value(a.x), value(a.y), value(b.x), value(b.y));
                    ax + a.width <= bx
                        || bx + b.width <= ax
                        || ay + a.height <= by
                        || by + b.height <= ay
                })
            }),
        }
    }
}

pub(crate) fn clamp_i64(value: i128) -> i64 {
    value.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

// ============================================================================
// Assignment
// ============================================================================

/// Values for every declared variable of a solved model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    values: Vec<i64>,
    objective: i64,
}

impl Assignment {
    pub fn new(values: Vec<i64>, objective: i64) -> Self {
        Self { values, objective }
    }

    pub fn value(&self, var: IntVar) -> i64 {
        self.values[var.index()]
    }

    pub fn bool_value(&self, var: BoolVar) -> bool {
        self.values[var.var().index()] != 0
    }

    pub fn eval(&self, expr: &LinearExpr) -> i64 {
        clamp_i64(expr.eval(&self.values))
    }

    pub fn objective(&self) -> i64 {
        self.objective
    }

    pub fn values(&self) -> &[i64] {
        &self.values
    }
}
