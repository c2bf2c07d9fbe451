//! Objective composition
//!
//! The minimized expression is the sum of
//! - the X and Y spans of all footprint origins (compactness),
//! - weighted Manhattan center distances of every item pair,
//! - the spread of each `COMPACT_GROUP`,
//! - the cost of every violated soft indicator.
//!
//! Weights pass through [`bounded_weight`] first, so no coefficient overflows.

use crate::solver::{ConstraintSource, CpModel, IntVar, LinearExpr};

use super::compiler::ObjectiveTerms;
use super::config::{bounded_weight, PlacerConfig};
use super::vbox::VirtualBox;

/// Which center a distance term measures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Center {
    Footprint,
    Virtual,
}

fn center(b: &VirtualBox, which: Center) -> (LinearExpr, LinearExpr) {
    match which {
        Center::Footprint => (b.center_x(), b.center_y()),
        Center::Virtual => (b.virtual_center_x(), b.virtual_center_y()),
    }
}

/// Build the objective and install it with [`CpModel::minimize`]
pub fn compose(model: &mut CpModel, boxes: &[VirtualBox], terms: &ObjectiveTerms, config: &PlacerConfig) {
    let mut objective = LinearExpr::new();

    let compactness = bounded_weight(config.compactness_weight);
    if compactness != 0 && boxes.len() > 1 {
        let xs: Vec<IntVar> = boxes.iter().map(|b| b.px).collect();
        let ys: Vec<IntVar> = boxes.iter().map(|b| b.py).collect();
        objective = objective + span(model, &xs, "x") * compactness;
        objective = objective + span(model, &ys, "y") * compactness;
    }

    for i in 0..boxes.len() {
        for j in (i + 1)..boxes.len() {
            let (weight, which) = if terms.flow_pairs.contains(&(i, j)) {
                (bounded_weight(config.flow_weight), Center::Footprint)
            } else {
                (bounded_weight(config.cohesion_weight), Center::Virtual)
            };
            if weight == 0 {
                continue;
            }
            let d = manhattan(model, &boxes[i], &boxes[j], which, "pair");
            objective = objective + d * weight;
        }
    }

    let group_weight = config.group_weight();
    for (g, members) in terms.groups.iter().enumerate() {
        for (k, &i) in members.iter().enumerate() {
            for &j in &members[k + 1..] {
                let tag = format!("group{}", g);
                let d = manhattan(model, &boxes[i], &boxes[j], Center::Footprint, &tag);
                objective = objective + d * group_weight;
            }
        }
    }

    for penalty in &terms.penalties {
        let var = penalty.violated.var();
        let cost = bounded_weight(penalty.cost);
        if penalty.violated.is_negated() {
            objective = objective + (LinearExpr::constant(cost) - var * cost);
        } else {
            objective = objective + var * cost;
        }
    }

    model.minimize(objective);
}

/// `max(vars) - min(vars)` through two bounding variables
fn span(model: &mut CpModel, vars: &[IntVar], axis: &str) -> LinearExpr {
    let (mut lo, mut hi) = (i64::MAX, i64::MIN);
    for v in vars {
        let decl = &model.vars()[v.index()];
        lo = lo.min(decl.lb);
        hi = hi.max(decl.ub);
    }
    let upper = model.new_int_var(lo, hi, format!("span_{}_max", axis));
    let lower = model.new_int_var(lo, hi, format!("span_{}_min", axis));
    for &v in vars {
        model.add_ge(upper, v, ConstraintSource::objective(format!("{} span upper", axis)));
        model.add_le(lower, v, ConstraintSource::objective(format!("{} span lower", axis)));
    }
    upper - lower
}

fn manhattan(model: &mut CpModel, a: &VirtualBox, b: &VirtualBox, which: Center, tag: &str) -> LinearExpr {
    let (ax, ay) = center(a, which);
    let (bx, by) = center(b, which);
    let src = || ConstraintSource::objective(format!("{} distance '{}' - '{}'", tag, a.id, b.id));
    let dx = model.new_abs(ax - bx, format!("{}_dx_{}_{}", tag, a.index, b.index), src());
    let dy = model.new_abs(ay - by, format!("{}_dy_{}_{}", tag, a.index, b.index), src());
    dx + dy
}
