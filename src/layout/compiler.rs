//! Constraint compiler
//!
//! Turns a validated [`Project`] into a [`CpModel`]: one virtual box per item,
//! a no-overlap constraint over all boxes, then every rule in declaration
//! order. A rule that cannot be compiled is skipped with a
//! [`CompileWarning`]; it never adds anything to the model, so the result is
//! the same as if the rule had not been written.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use log::{debug, info, warn};

use crate::error::ProjectError;
use crate::ident::ItemRegistry;
use crate::project::Project;
use crate::rules::{Alignment, Area, Axis, Rule, RuleKind, Wall};
use crate::solver::{BoolVar, ConstraintSource, CpModel, LinearExpr, Literal};

use super::config::PlacerConfig;
use super::error::{CompileWarning, RuleError};
use super::objective;
use super::scale::Scale;
use super::vbox::{self, Interior, VirtualBox};

/// A rule that made it into the model
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedRule {
    pub index: usize,
    pub kind: RuleKind,
    pub description: String,
}

impl fmt::Display for AppliedRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.index, self.description)
    }
}

/// What happened to each rule
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompileReport {
    pub applied: Vec<AppliedRule>,
    pub warnings: Vec<CompileWarning>,
}

impl CompileReport {
    pub fn applied_descriptions(&self) -> Vec<String> {
        self.applied.iter().map(|r| r.to_string()).collect()
    }
}

/// A soft constraint: `cost` is paid when `violated` holds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoftPenalty {
    pub rule_index: usize,
    pub violated: Literal,
    pub cost: i64,
}

/// Inputs of the objective collected while compiling rules
#[derive(Debug, Clone, Default)]
pub struct ObjectiveTerms {
    /// Item pairs `(low, high)` linked by `PLACE_AFTER`
    pub flow_pairs: BTreeSet<(usize, usize)>,
    pub penalties: Vec<SoftPenalty>,
    /// Item indices of every `COMPACT_GROUP`
    pub groups: Vec<Vec<usize>>,
}

/// A compiled, ready-to-solve layout model
#[derive(Debug, Clone)]
pub struct CompiledLayout {
    pub model: CpModel,
    pub boxes: Vec<VirtualBox>,
    pub interior: Interior,
    pub scale: Scale,
    pub report: CompileReport,
    pub terms: ObjectiveTerms,
    /// Item index -> fixed yaw in degrees
    pub orientations: BTreeMap<usize, f64>,
}

/// Build the full model for a project
///
/// Fails only on invalid room or item data; rule problems become warnings.
pub fn compile(project: &Project, config: &PlacerConfig) -> Result<CompiledLayout, ProjectError> {
    project.validate()?;

    let registry = ItemRegistry::new(
        project
            .equipment
            .iter()
            .map(|e| (e.id.as_str(), e.name.as_str())),
    )
    .map_err(ProjectError::DuplicateId)?;

    let scale = Scale::new(config.scale);
    let interior = Interior::of(project, scale)?;
    let mut model = CpModel::new();

    let boxes: Vec<VirtualBox> = project
        .equipment
        .iter()
        .enumerate()
        .map(|(i, item)| vbox::expand(&mut model, i, item, &interior, scale))
        .collect::<Result<_, _>>()?;

    model.add_no_overlap_2d(
        boxes.iter().map(VirtualBox::rect).collect(),
        ConstraintSource::structural("virtual boxes do not overlap"),
    );

    // Disjoint boxes cannot cover more than the floor
    let packed: i128 = boxes.iter().map(VirtualBox::area).sum();
    if packed > interior.area() {
        debug!(
            "padded boxes need {} square units, interior has {}",
            packed,
            interior.area()
        );
        model.add_linear(
            LinearExpr::constant(1),
            None,
            Some(0),
            ConstraintSource::structural("padded boxes fit the interior area"),
        );
    }

    let mut compiler = Compiler {
        config,
        registry: &registry,
        model,
        boxes,
        interior,
        scale,
        terms: ObjectiveTerms::default(),
        orientations: BTreeMap::new(),
        orientation_sources: BTreeMap::new(),
    };

    let mut report = CompileReport::default();
    for (index, raw) in project.rules.iter().enumerate() {
        let outcome = Rule::from_raw(raw).and_then(|rule| {
            compiler.apply(index, &rule)?;
            Ok(rule)
        });
        match outcome {
            Ok(rule) => {
                debug!("applied rule #{} {}", index, rule);
                report.applied.push(AppliedRule {
                    index,
                    kind: rule.kind(),
                    description: rule.to_string(),
                });
            }
            Err(error) => {
                let warning = CompileWarning {
                    rule_index: index,
                    rule_type: raw.kind.clone(),
                    comment: raw.comment.clone(),
                    error,
                };
                warn!("{}", warning);
                report.warnings.push(warning);
            }
        }
    }

    let Compiler {
        mut model,
        boxes,
        terms,
        orientations,
        ..
    } = compiler;

    objective::compose(&mut model, &boxes, &terms, config);

    info!(
        "compiled {} item(s): {} rule(s) applied, {} skipped, {} variables, {} constraints",
        boxes.len(),
        report.applied.len(),
        report.warnings.len(),
        model.num_vars(),
        model.constraints().len()
    );

    Ok(CompiledLayout {
        model,
        boxes,
        interior,
        scale,
        report,
        terms,
        orientations,
    })
}

/// Directions `(ux, uy)` whose half-planes approximate a clearance circle
const SEPARATIONS: [(i64, i64); 16] = [
    (1, 0),
    (2, 1),
    (1, 1),
    (1, 2),
    (0, 1),
    (-1, 2),
    (-1, 1),
    (-2, 1),
    (-1, 0),
    (-2, -1),
    (-1, -1),
    (-1, -2),
    (0, -1),
    (1, -2),
    (1, -1),
    (2, -1),
];

struct Compiler<'a> {
    config: &'a PlacerConfig,
    registry: &'a ItemRegistry,
    model: CpModel,
    boxes: Vec<VirtualBox>,
    interior: Interior,
    scale: Scale,
    terms: ObjectiveTerms,
    orientations: BTreeMap<usize, f64>,
    /// Rule index that set each orientation
    orientation_sources: BTreeMap<usize, usize>,
}

impl<'a> Compiler<'a> {
    fn resolve(&self, reference: &str) -> Result<usize, RuleError> {
        self.registry
            .resolve(reference)
            .ok_or_else(|| {
                RuleError::unknown_item(reference).with_suggestions(self.registry.suggest(reference))
            })
    }

    fn resolve_pair(&self, first: &str, second: &str) -> Result<(usize, usize), RuleError> {
        let a = self.resolve(first)?;
        let b = self.resolve(second)?;
        if a == b {
            return Err(RuleError::invalid(
                "targets",
                format!("'{}' and '{}' name the same item", first, second),
            ));
        }
        Ok((a, b))
    }

    fn len(&self, field: &str, value: f64) -> Result<i64, RuleError> {
        self.scale.to_scaled(value).ok_or_else(|| {
            RuleError::invalid(
                field,
                format!(
                    "{} is outside the representable range (|x| <= {}) at scale {}",
                    value,
                    self.scale.max_length(),
                    self.scale.factor()
                ),
            )
        })
    }

    /// Scaled length times two, matching the doubled centers
    fn len2(&self, field: &str, value: f64) -> Result<i64, RuleError> {
        self.len(field, value)?
            .checked_mul(2)
            .ok_or_else(|| RuleError::invalid(field, format!("{} overflows when doubled", value)))
    }

    /// Validate and resolve everything first, then emit
    fn apply(&mut self, index: usize, rule: &Rule) -> Result<(), RuleError> {
        let src = |what: String| ConstraintSource::rule(index, what);

        match rule {
            Rule::AvoidZone { area } => {
                let zone = self.scaled_area(area)?;
                for i in 0..self.boxes.len() {
                    self.keep_outside(index, i, zone, None);
                }
            }

            Rule::PlaceInZone { target, area } => {
                let t = self.resolve(target)?;
                let (x1, y1, x2, y2) = self.scaled_area(area)?;
                let b = &self.boxes[t];
                let (vx, vy, vw, vd) = (b.vx, b.vy, b.vw, b.vd);
                let desc = format!("'{}' inside zone", b.id);
                self.model.add_ge(vx, x1, src(desc.clone()));
                self.model.add_ge(vy, y1, src(desc.clone()));
                self.model.add_le(vx + vw, x2, src(desc.clone()));
                self.model.add_le(vy + vd, y2, src(desc));
            }

            Rule::AttachToWall {
                target,
                side,
                distance,
            } => {
                let t = self.resolve(target)?;
                let d = self.len("distance", *distance)?;
                let b = &self.boxes[t];
                let interior = self.interior;
                let desc = src(format!("'{}' on wall {:?}", b.id, side));
                match side {
                    Wall::Xmin => self.model.add_eq(b.vx, interior.min_x + d, desc),
                    Wall::Xmax => self.model.add_eq(b.vx + b.vw, interior.max_x - d, desc),
                    Wall::Ymin => self.model.add_eq(b.vy, interior.min_y + d, desc),
                    Wall::Ymax => self.model.add_eq(b.vy + b.vd, interior.max_y - d, desc),
                };
            }

            Rule::Align {
                first,
                second,
                axis,
            } => {
                let (a, b) = self.resolve_pair(first, second)?;
                let (ca, cb) = (self.center2(a, *axis), self.center2(b, *axis));
                self.model
                    .add_eq(ca, cb, src(format!("centers of '{}' and '{}' on {:?}", first, second, axis)));
            }

            Rule::PlaceAfter {
                target,
                anchor,
                direction,
                distance,
                alignment,
            } => {
                let (t, a) = self.resolve_pair(target, anchor)?;
                let d = self.len("distance", *distance)?;
                let (tb, ab) = (&self.boxes[t], &self.boxes[a]);
                let (flow_t, flow_a, anchor_size) = match direction {
                    Axis::X => (tb.px, ab.px, ab.width),
                    Axis::Y => (tb.py, ab.py, ab.depth),
                };
                self.model.add_eq(
                    flow_t,
                    flow_a + (anchor_size + d),
                    src(format!("'{}' after '{}' along {:?}", tb.id, ab.id, direction)),
                );

                if *alignment == Alignment::Center {
                    let cross = direction.cross();
                    let (ct, ca) = (self.center2(t, cross), self.center2(a, cross));
                    let desc = src(format!("'{}' centered on '{}' along {:?}", target, anchor, cross));
                    if self.config.policy.soft_place_after_alignment {
                        let aligned = self.model.new_bool_var(format!("aligned_{}_{}_{}", index, a, t));
                        let c = self.model.add_eq(ct, ca, desc);
                        self.model.only_enforce_if(c, &[aligned.into()]);
                        self.terms.penalties.push(SoftPenalty {
                            rule_index: index,
                            violated: aligned.not(),
                            cost: self.config.penalty_cost,
                        });
                    } else {
                        self.model.add_eq(ct, ca, desc);
                    }
                }
                self.terms.flow_pairs.insert((t.min(a), t.max(a)));
            }

            Rule::Corridor {
                from,
                to,
                width,
                soft,
            } => {
                let half = width / 2.0;
                let area = Area {
                    x1: from.0.min(to.0) - half,
                    y1: from.1.min(to.1) - half,
                    x2: from.0.max(to.0) + half,
                    y2: from.1.max(to.1) + half,
                };
                let zone = self.scaled_area(&area)?;
                let soft = *soft || self.config.policy.soft_corridors;
                for i in 0..self.boxes.len() {
                    let violation = if soft {
                        let v = self.model.new_bool_var(format!("corridor_{}_{}_blocked", index, i));
                        self.terms.penalties.push(SoftPenalty {
                            rule_index: index,
                            violated: v.into(),
                            cost: self.config.penalty_cost,
                        });
                        Some(v)
                    } else {
                        None
                    };
                    self.keep_outside(index, i, zone, violation);
                }
            }

            Rule::MinDistance {
                first,
                second,
                distance,
            } => {
                let (a, b) = self.resolve_pair(first, second)?;
                let d2 = self.len2("distance", *distance)?;
                self.min_center_distance(index, a, b, d2);
            }

            Rule::ParallelLine {
                first,
                second,
                offset,
                axis,
            } => {
                let (a, b) = self.resolve_pair(first, second)?;
                let off2 = self.len2("offset", *offset)?;
                let (ca, cb) = (self.center2(a, *axis), self.center2(b, *axis));
                self.model.add_eq(
                    ca,
                    cb + off2,
                    src(format!("'{}' parallel to '{}' on {:?}", first, second, axis)),
                );
            }

            Rule::ServiceZone { target, margin } => {
                let t = self.resolve(target)?;
                let m2 = self.len2("margin", *margin)?;
                for other in 0..self.boxes.len() {
                    if other != t {
                        self.min_center_distance(index, t, other, m2);
                    }
                }
            }

            Rule::CompactGroup { members } => {
                let indices = members
                    .iter()
                    .map(|m| self.resolve(m))
                    .collect::<Result<Vec<_>, _>>()?;
                let mut unique: Vec<usize> = Vec::new();
                for i in indices {
                    if !unique.contains(&i) {
                        unique.push(i);
                    }
                }
                if unique.len() < 2 {
                    return Err(RuleError::invalid(
                        "members",
                        "members resolve to fewer than two distinct items",
                    ));
                }
                self.terms.groups.push(unique);
            }

            Rule::Orientation {
                target,
                rotation_deg,
            } => {
                let t = self.resolve(target)?;
                if let Some(previous) = self.orientation_sources.get(&t) {
                    return Err(RuleError::invalid(
                        "rotation_deg",
                        format!("orientation of '{}' already set by rule #{}", target, previous),
                    ));
                }
                self.orientations.insert(t, *rotation_deg);
                self.orientation_sources.insert(t, index);
            }

            Rule::PlaceAt {
                target,
                x,
                y,
                rotation_deg,
            } => {
                let t = self.resolve(target)?;
                let (xs, ys) = (self.len("position", *x)?, self.len("position", *y)?);
                let b = &self.boxes[t];
                let (px, py) = (b.px, b.py);
                self.model.add_eq(px, xs, src(format!("'{}' pinned at x", target)));
                self.model.add_eq(py, ys, src(format!("'{}' pinned at y", target)));
                if let Some(rotation) = rotation_deg {
                    if !self.orientation_sources.contains_key(&t) {
                        self.orientations.insert(t, *rotation);
                        self.orientation_sources.insert(t, index);
                    }
                }
            }
        }
        Ok(())
    }

    fn scaled_area(&self, area: &Area) -> Result<(i64, i64, i64, i64), RuleError> {
        Ok((
            self.len("area", area.x1)?,
            self.len("area", area.y1)?,
            self.len("area", area.x2)?,
            self.len("area", area.y2)?,
        ))
    }

    fn center2(&self, item: usize, axis: Axis) -> LinearExpr {
        match axis {
            Axis::X => self.boxes[item].center2_x(),
            Axis::Y => self.boxes[item].center2_y(),
        }
    }

    /// Box `item` lies left of, right of, below or above the zone
    ///
    /// With a `violation` literal the disjunction may be dropped at a cost.
    fn keep_outside(
        &mut self,
        index: usize,
        item: usize,
        (x1, y1, x2, y2): (i64, i64, i64, i64),
        violation: Option<BoolVar>,
    ) {
        let b = &self.boxes[item];
        let (vx, vy, vw, vd) = (b.vx, b.vy, b.vw, b.vd);
        let id = b.id.clone();
        let src = || ConstraintSource::rule(index, format!("'{}' outside zone", id));

        let left = self.model.new_bool_var(format!("zone_{}_{}_left", index, item));
        let right = self.model.new_bool_var(format!("zone_{}_{}_right", index, item));
        let below = self.model.new_bool_var(format!("zone_{}_{}_below", index, item));
        let above = self.model.new_bool_var(format!("zone_{}_{}_above", index, item));

        let c = self.model.add_le(vx + vw, x1, src());
        self.model.only_enforce_if(c, &[left.into()]);
        let c = self.model.add_ge(vx, x2, src());
        self.model.only_enforce_if(c, &[right.into()]);
        let c = self.model.add_le(vy + vd, y1, src());
        self.model.only_enforce_if(c, &[below.into()]);
        let c = self.model.add_ge(vy, y2, src());
        self.model.only_enforce_if(c, &[above.into()]);

        let mut sides: Vec<Literal> = vec![left.into(), right.into(), below.into(), above.into()];
        if let Some(v) = violation {
            sides.push(v.into());
        }
        self.model.add_bool_or(sides, src());
    }

    /// Footprint centers of `a` and `b` at least `d2 / 2` apart, with `d2`
    /// already doubled
    ///
    /// The circle of radius `d2` around `a` is replaced by the 16-gon drawn
    /// from [`SEPARATIONS`]: `b` must lie beyond one of its edges. Every
    /// placement this admits keeps the true distance, at the price of up to
    /// 3% of extra clearance between the listed directions.
    fn min_center_distance(&mut self, index: usize, a: usize, b: usize, d2: i64) {
        if d2 <= 0 {
            return;
        }
        let (ida, idb) = (self.boxes[a].id.clone(), self.boxes[b].id.clone());
        let src = || ConstraintSource::rule(index, format!("distance '{}' - '{}'", ida, idb));
        let dx = self.boxes[a].center2_x() - self.boxes[b].center2_x();
        let dy = self.boxes[a].center2_y() - self.boxes[b].center2_y();

        let mut sides: Vec<Literal> = Vec::with_capacity(SEPARATIONS.len());
        for (k, &(ux, uy)) in SEPARATIONS.iter().enumerate() {
            let norm = ((ux * ux + uy * uy) as f64).sqrt();
            let reach = (d2 as f64 * norm).ceil() as i64;
            let side = self.model.new_bool_var(format!("dist_{}_{}_{}_{}", index, a, b, k));
            let c = self.model.add_ge(dx.clone() * ux + dy.clone() * uy, reach, src());
            self.model.only_enforce_if(c, &[side.into()]);
            sides.push(side.into());
        }
        self.model.add_bool_or(sides, src());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{Architecture, EquipmentItem, Footprint, Meta, RawRule, RoomDimensions};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn project(rules: Vec<serde_json::Value>) -> Project {
        let item = |id: &str| EquipmentItem {
            id: id.into(),
            name: format!("Item {}", id),
            footprint: Footprint {
                width: 2.0,
                depth: 2.0,
            },
            height: 1.0,
            maintenance_zone: None,
        };
        Project {
            meta: Meta {
                project_name: "compile".into(),
                schema_version: None,
            },
            architecture: Architecture {
                room_dimensions: RoomDimensions {
                    width: 10.0,
                    depth: 8.0,
                    height: 3.0,
                },
                wall_thickness: 0.2,
                roof: None,
            },
            equipment: vec![item("A"), item("B"), item("C")],
            rules: rules
                .into_iter()
                .map(|r| serde_json::from_value::<RawRule>(r).unwrap())
                .collect(),
            solver_options: None,
        }
    }

    fn config() -> PlacerConfig {
        PlacerConfig::default().with_scale(100)
    }

    #[test]
    fn test_structural_model() {
        let compiled = compile(&project(vec![]), &config()).unwrap();
        assert_eq!(compiled.boxes.len(), 3);
        assert_eq!(
            compiled.interior,
            Interior {
                min_x: 20,
                min_y: 20,
                max_x: 980,
                max_y: 780
            }
        );
        assert!(compiled.report.applied.is_empty());
        assert!(compiled.model.objective().is_some());
    }

    #[test]
    fn test_each_rule_problem_is_one_warning() {
        let compiled = compile(
            &project(vec![
                json!({ "type": "TELEPORT", "params": {} }),
                json!({ "type": "ALIGN", "target1": "A", "target2": "Z", "params": { "axis": "X" } }),
                json!({ "type": "AVOID_ZONE", "params": { "area": [5, 5, 1, 1] } }),
                json!({ "type": "PLACE_AT", "target": "A", "params": { "position": [1, 1] } }),
            ]),
            &config(),
        )
        .unwrap();

        let kinds: Vec<_> = compiled
            .report
            .warnings
            .iter()
            .map(|w| (w.rule_index, w.error.category()))
            .collect();
        assert_eq!(kinds, vec![(0, "unsupported"), (1, "reference"), (2, "value")]);
        assert_eq!(compiled.report.applied_descriptions(), vec!["#3 PLACE_AT 'A' at (1, 1)"]);
    }

    #[test]
    fn test_skipped_rule_leaves_model_untouched() {
        let base = compile(&project(vec![]), &config()).unwrap();
        let with_bad = compile(
            &project(vec![json!({
                "type": "MIN_DISTANCE", "target1": "A", "target2": "ghost",
                "params": { "distance": 3 }
            })]),
            &config(),
        )
        .unwrap();

        assert_eq!(with_bad.model.num_vars(), base.model.num_vars());
        assert_eq!(with_bad.model.constraints(), base.model.constraints());
        assert_eq!(with_bad.model.objective(), base.model.objective());
    }

    #[test]
    fn test_place_after_registers_flow_pair_and_penalty() {
        let compiled = compile(
            &project(vec![json!({
                "type": "PLACE_AFTER", "target": "C",
                "params": { "anchor": "A", "direction": "Y", "distance": 1 }
            })]),
            &config(),
        )
        .unwrap();

        assert_eq!(compiled.terms.flow_pairs, BTreeSet::from([(0, 2)]));
        assert_eq!(compiled.terms.penalties.len(), 1);
        assert_eq!(compiled.terms.penalties[0].cost, 10_000);
        assert!(compiled.terms.penalties[0].violated.is_negated());
    }

    #[test]
    fn test_hard_alignment_policy() {
        let policy = crate::layout::config::RulePolicy {
            soft_place_after_alignment: false,
            ..Default::default()
        };
        let compiled = compile(
            &project(vec![json!({
                "type": "PLACE_AFTER", "target": "B",
                "params": { "anchor": "A" }
            })]),
            &config().with_policy(policy),
        )
        .unwrap();
        assert!(compiled.terms.penalties.is_empty());
    }

    #[test]
    fn test_duplicate_orientation_keeps_first() {
        let compiled = compile(
            &project(vec![
                json!({ "type": "ORIENTATION", "target": "B", "params": { "rotation_deg": 90 } }),
                json!({ "type": "ORIENTATION", "target": "B", "params": { "rotation_deg": 180 } }),
            ]),
            &config(),
        )
        .unwrap();
        assert_eq!(compiled.orientations.get(&1), Some(&90.0));
        assert_eq!(compiled.report.warnings.len(), 1);
        assert_eq!(compiled.report.warnings[0].rule_index, 1);
    }

    #[test]
    fn test_same_item_pair_is_rejected() {
        let compiled = compile(
            &project(vec![json!({
                "type": "MIN_DISTANCE", "target1": "A", "target2": "A",
                "params": { "distance": 1 }
            })]),
            &config(),
        )
        .unwrap();
        assert_eq!(compiled.report.warnings[0].error.category(), "value");
    }

    #[test]
    fn test_references_resolve_by_display_name() {
        let compiled = compile(
            &project(vec![json!({
                "type": "SERVICE_ZONE", "target": "Item B", "params": { "margin": 1.5 }
            })]),
            &config(),
        )
        .unwrap();
        assert!(compiled.report.warnings.is_empty());
        assert_eq!(compiled.report.applied[0].kind, RuleKind::ServiceZone);
    }

    #[test]
    fn test_unscalable_lengths_skip_the_rule() {
        let base = compile(&project(vec![]), &config()).unwrap();
        let compiled = compile(
            &project(vec![
                json!({ "type": "PLACE_AT", "target": "A", "params": { "position": [1e20, 1] } }),
                json!({
                    "type": "MIN_DISTANCE", "target1": "A", "target2": "B",
                    "params": { "distance": 1e17 }
                }),
                json!({ "type": "AVOID_ZONE", "params": { "area": [-1e300, 0, 1, 1] } }),
            ]),
            &config(),
        )
        .unwrap();

        let fields: Vec<_> = compiled
            .report
            .warnings
            .iter()
            .map(|w| match &w.error {
                RuleError::InvalidValue { field, reason } => {
                    assert!(reason.contains("outside the representable range"), "{}", reason);
                    (w.rule_index, field.as_str())
                }
                other => panic!("expected an invalid value, got {:?}", other),
            })
            .collect();
        assert_eq!(fields, vec![(0, "position"), (1, "distance"), (2, "area")]);
        assert!(compiled.report.applied.is_empty());
        assert_eq!(compiled.model.constraints(), base.model.constraints());
    }

    #[test]
    fn test_boxes_larger_than_the_floor_conflict() {
        let mut crowded = project(vec![]);
        for item in &mut crowded.equipment {
            item.footprint = Footprint {
                width: 5.0,
                depth: 5.0,
            };
        }
        let has_conflict = |p: &Project| {
            compile(p, &config())
                .unwrap()
                .model
                .constraints()
                .iter()
                .any(|e| e.source.description == "padded boxes fit the interior area")
        };

        assert!(has_conflict(&crowded));
        assert!(!has_conflict(&project(vec![])));
    }

    #[test]
    fn test_min_distance_is_a_sixteen_way_choice() {
        let compiled = compile(
            &project(vec![json!({
                "type": "MIN_DISTANCE", "target1": "A", "target2": "B",
                "params": { "distance": 3 }
            })]),
            &config(),
        )
        .unwrap();

        let clauses: Vec<usize> = compiled
            .model
            .constraints()
            .iter()
            .filter_map(|e| match &e.constraint {
                crate::solver::Constraint::BoolOr(lits) => Some(lits.len()),
                _ => None,
            })
            .collect();
        assert_eq!(clauses, vec![16]);
    }
}
