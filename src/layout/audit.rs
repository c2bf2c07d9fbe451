//! Post-hoc placement audit
//!
//! Re-checks a finished placement in physical units, independently of the
//! solver: footprints must not overlap and every virtual box must stay in
//! the room interior.

use std::fmt;

use crate::project::{EquipmentItem, Project};

use super::extract::{Placement, PlacementSolution};

/// Slack for comparing rescaled coordinates
const EPS: f64 = 1e-9;

/// A defect found in a placement
#[derive(Debug, Clone, PartialEq)]
pub struct AuditFinding {
    pub category: AuditCategory,
    pub message: String,
}

impl fmt::Display for AuditFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.category, self.message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditCategory {
    Overlap,
    Containment,
}

impl fmt::Display for AuditCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditCategory::Overlap => write!(f, "overlap"),
            AuditCategory::Containment => write!(f, "containment"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Rect {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
}

impl Rect {
    fn right(&self) -> f64 {
        self.x + self.w
    }

    fn top(&self) -> f64 {
        self.y + self.h
    }

    /// Positive-area intersection; shared edges do not count
    fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right() - EPS
            && other.x < self.right() - EPS
            && self.y < other.top() - EPS
            && other.y < self.top() - EPS
    }
}

fn footprint(item: &EquipmentItem, p: &Placement) -> Rect {
    Rect {
        x: p.x,
        y: p.y,
        w: item.footprint.width,
        h: item.footprint.depth,
    }
}

fn virtual_box(item: &EquipmentItem, p: &Placement) -> Rect {
    let zone = item.clearance();
    Rect {
        x: p.x - zone.left,
        y: p.y - zone.back,
        w: zone.left + item.footprint.width + zone.right,
        h: zone.back + item.footprint.depth + zone.front,
    }
}

/// Placed items in equipment order
fn placed<'a>(
    project: &'a Project,
    solution: &'a PlacementSolution,
) -> impl Iterator<Item = (&'a EquipmentItem, &'a Placement)> {
    project
        .equipment
        .iter()
        .filter_map(move |item| solution.get(&item.id).map(|p| (item, p)))
}

/// Run all audit checks on a placement
pub fn check(project: &Project, solution: &PlacementSolution) -> Vec<AuditFinding> {
    let mut findings: Vec<AuditFinding> = collisions(project, solution)
        .into_iter()
        .map(|message| AuditFinding {
            category: AuditCategory::Overlap,
            message,
        })
        .collect();
    check_containment(project, solution, &mut findings);
    findings
}

/// One description per pair of overlapping footprints
pub fn collisions(project: &Project, solution: &PlacementSolution) -> Vec<String> {
    let items: Vec<_> = placed(project, solution).collect();
    let mut out = Vec::new();
    for i in 0..items.len() {
        for j in (i + 1)..items.len() {
            let (a, pa) = items[i];
            let (b, pb) = items[j];
            if footprint(a, pa).intersects(&footprint(b, pb)) {
                out.push(format!(
                    "Collision detected between: '{}' and '{}'",
                    a.name, b.name
                ));
            }
        }
    }
    out
}

fn check_containment(project: &Project, solution: &PlacementSolution, findings: &mut Vec<AuditFinding>) {
    let (x1, y1, x2, y2) = project.interior();
    for (item, p) in placed(project, solution) {
        let vb = virtual_box(item, p);
        let overflow = [
            ("Xmin", x1 - vb.x),
            ("Xmax", vb.right() - x2),
            ("Ymin", y1 - vb.y),
            ("Ymax", vb.top() - y2),
        ];
        for (side, by) in overflow {
            if by > EPS {
                findings.push(AuditFinding {
                    category: AuditCategory::Containment,
                    message: format!(
                        "'{}' extends {:.3} past wall {}",
                        item.name, by, side
                    ),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{Architecture, Footprint, MaintenanceZone, Meta, RoomDimensions};
    use pretty_assertions::assert_eq;

    fn project() -> Project {
        let item = |id: &str, name: &str, zone| EquipmentItem {
            id: id.into(),
            name: name.into(),
            footprint: Footprint {
                width: 2.0,
                depth: 2.0,
            },
            height: 1.0,
            maintenance_zone: zone,
        };
        Project {
            meta: Meta {
                project_name: "audit".into(),
                schema_version: None,
            },
            architecture: Architecture {
                room_dimensions: RoomDimensions {
                    width: 10.0,
                    depth: 8.0,
                    height: 3.0,
                },
                wall_thickness: 0.5,
                roof: None,
            },
            equipment: vec![
                item("A", "Press", None),
                item("B", "Lathe", None),
                item(
                    "C",
                    "Oven",
                    Some(MaintenanceZone {
                        front: 1.0,
                        ..Default::default()
                    }),
                ),
            ],
            rules: Vec::new(),
            solver_options: None,
        }
    }

    fn at(x: f64, y: f64) -> Placement {
        Placement {
            x,
            y,
            rotation_deg: 0.0,
        }
    }

    #[test]
    fn test_overlap_reported_with_display_names() {
        let solution: PlacementSolution = [
            ("A".to_string(), at(1.0, 1.0)),
            ("B".to_string(), at(2.0, 2.0)),
            ("C".to_string(), at(6.0, 1.0)),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            collisions(&project(), &solution),
            vec!["Collision detected between: 'Press' and 'Lathe'"]
        );
    }

    #[test]
    fn test_touching_is_not_a_collision() {
        let solution: PlacementSolution = [
            ("A".to_string(), at(1.0, 1.0)),
            ("B".to_string(), at(3.0, 1.0)),
            ("C".to_string(), at(1.0, 3.0)),
        ]
        .into_iter()
        .collect();
        assert!(check(&project(), &solution).is_empty());
    }

    #[test]
    fn test_containment_uses_clearance() {
        // Oven footprint fits but its front clearance crosses the Ymax wall
        let solution: PlacementSolution = [("C".to_string(), at(4.0, 5.0))].into_iter().collect();
        let findings = check(&project(), &solution);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].category, AuditCategory::Containment);
        insta::assert_snapshot!(findings[0].to_string(), @"[containment] 'Oven' extends 0.500 past wall Ymax");
    }
}
