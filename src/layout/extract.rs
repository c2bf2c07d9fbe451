//! Solution extraction
//!
//! Reads the footprint origin of every item out of a solver assignment and
//! converts it back to physical units.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::solver::Assignment;

use super::scale::Scale;
use super::vbox::VirtualBox;

/// Final pose of one item in physical units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Footprint origin (lowest corner)
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub rotation_deg: f64,
}

/// Item id -> placement, serialized as a plain map
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlacementSolution {
    placements: BTreeMap<String, Placement>,
}

impl PlacementSolution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, placement: Placement) {
        self.placements.insert(id.into(), placement);
    }

    pub fn get(&self, id: &str) -> Option<&Placement> {
        self.placements.get(id)
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Placement)> {
        self.placements.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl FromIterator<(String, Placement)> for PlacementSolution {
    fn from_iter<I: IntoIterator<Item = (String, Placement)>>(iter: I) -> Self {
        Self {
            placements: iter.into_iter().collect(),
        }
    }
}

/// Convert an assignment into placements keyed by the ids written in the
/// project
///
/// Only meaningful for an assignment of a feasible or optimal solve.
pub fn extract(
    assignment: &Assignment,
    boxes: &[VirtualBox],
    orientations: &BTreeMap<usize, f64>,
    scale: Scale,
) -> PlacementSolution {
    boxes
        .iter()
        .map(|b| {
            let placement = Placement {
                x: scale.from_scaled(assignment.value(b.px)),
                y: scale.from_scaled(assignment.value(b.py)),
                rotation_deg: orientations.get(&b.index).copied().unwrap_or(0.0),
            };
            (b.id.clone(), placement)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::vbox::{self, Interior};
    use crate::project::{EquipmentItem, Footprint};
    use crate::solver::CpModel;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extract_scales_back_and_copies_orientation() {
        let mut model = CpModel::new();
        let interior = Interior {
            min_x: 0,
            min_y: 0,
            max_x: 10_000,
            max_y: 10_000,
        };
        let item = |id: &str| EquipmentItem {
            id: id.into(),
            name: id.into(),
            footprint: Footprint {
                width: 1.0,
                depth: 1.0,
            },
            height: 1.0,
            maintenance_zone: None,
        };
        let scale = Scale::new(1000);
        let boxes = vec![
            vbox::expand(&mut model, 0, &item("Lathe"), &interior, scale).unwrap(),
            vbox::expand(&mut model, 1, &item("Drill"), &interior, scale).unwrap(),
        ];

        let mut values = vec![0; model.num_vars()];
        values[boxes[0].px.index()] = 1250;
        values[boxes[0].py.index()] = 400;
        values[boxes[1].px.index()] = 3000;
        values[boxes[1].py.index()] = 7;
        let assignment = Assignment::new(values, 0);
        let orientations = BTreeMap::from([(1, 90.0)]);

        let solution = extract(&assignment, &boxes, &orientations, scale);
        assert_eq!(
            solution.get("Lathe"),
            Some(&Placement {
                x: 1.25,
                y: 0.4,
                rotation_deg: 0.0
            })
        );
        assert_eq!(solution.get("Drill").map(|p| (p.x, p.rotation_deg)), Some((3.0, 90.0)));
    }

    #[test]
    fn test_serializes_as_plain_map() {
        let solution: PlacementSolution = [(
            "A".to_string(),
            Placement {
                x: 1.5,
                y: 2.0,
                rotation_deg: 0.0,
            },
        )]
        .into_iter()
        .collect();
        insta::assert_snapshot!(
            serde_json::to_string(&solution).unwrap(),
            @r#"{"A":{"x":1.5,"y":2.0,"rotation_deg":0.0}}"#
        );
    }
}
