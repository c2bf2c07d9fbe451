//! Project configuration
//!
//! The shape mirrors the project files: metadata, room architecture, the
//! equipment list and a heterogeneous rule list. Rules stay raw here
//! ([`RawRule`]); turning them into typed [`Rule`](crate::rules::Rule)s is
//! the compiler's job, so one malformed rule never rejects a whole project.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ProjectError;
use crate::ident::ItemRegistry;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub meta: Meta,
    pub architecture: Architecture,
    pub equipment: Vec<EquipmentItem>,
    #[serde(default)]
    pub rules: Vec<RawRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solver_options: Option<SolverOptions>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    pub project_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Architecture {
    pub room_dimensions: RoomDimensions,
    #[serde(default)]
    pub wall_thickness: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roof: Option<Roof>,
}

/// Internal room size in physical units (X = width, Y = depth, Z = height)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoomDimensions {
    pub width: f64,
    pub depth: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RoofKind {
    Flat,
    Gable,
}

/// Roof description; scene metadata only, never part of packing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roof {
    #[serde(rename = "type")]
    pub kind: RoofKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thickness: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    pub width: f64,
    pub depth: f64,
}

/// Clearance kept free around a footprint; back/front run along Y, left/right along X
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceZone {
    #[serde(default)]
    pub front: f64,
    #[serde(default)]
    pub back: f64,
    #[serde(default)]
    pub left: f64,
    #[serde(default)]
    pub right: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentItem {
    pub id: String,
    pub name: String,
    pub footprint: Footprint,
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance_zone: Option<MaintenanceZone>,
}

impl EquipmentItem {
    /// Maintenance clearance, all zero when absent
    pub fn clearance(&self) -> MaintenanceZone {
        self.maintenance_zone.unwrap_or_default()
    }
}

/// A rule as written in the project file
///
/// Item references may sit at the top level or inside `params`; the typed
/// conversion prefers the top-level ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRule {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target2: Option<String>,
    #[serde(default)]
    pub params: serde_json::Map<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit_sec: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
}

impl Project {
    /// Load a project, choosing the format from the file extension
    pub fn from_file(path: &Path) -> Result<Self, ProjectError> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json_str(&content),
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::from_toml_str(&content),
            other => Err(ProjectError::UnsupportedFormat(
                other.unwrap_or_default().to_string(),
            )),
        }
    }

    /// Parse and validate a JSON project
    pub fn from_json_str(content: &str) -> Result<Self, ProjectError> {
        let project: Project = serde_json::from_str(content)?;
        project.validate()?;
        Ok(project)
    }

    /// Parse and validate a TOML project
    pub fn from_toml_str(content: &str) -> Result<Self, ProjectError> {
        let project: Project = toml::from_str(content)?;
        project.validate()?;
        Ok(project)
    }

    /// Reject room and item data that cannot describe a layout
    ///
    /// Rules are not checked here; bad rules are skipped with a warning
    /// during compilation.
    pub fn validate(&self) -> Result<(), ProjectError> {
        let room = &self.architecture.room_dimensions;
        positive("architecture.room_dimensions.width", room.width)?;
        positive("architecture.room_dimensions.depth", room.depth)?;
        positive("architecture.room_dimensions.height", room.height)?;
        non_negative("architecture.wall_thickness", self.architecture.wall_thickness)?;

        let wall = self.architecture.wall_thickness;
        if 2.0 * wall >= room.width || 2.0 * wall >= room.depth {
            return Err(ProjectError::invalid(
                "architecture.wall_thickness",
                format!(
                    "walls of {} leave no interior in a {} x {} room",
                    wall, room.width, room.depth
                ),
            ));
        }

        if let Some(roof) = &self.architecture.roof {
            if let Some(h) = roof.height {
                positive("architecture.roof.height", h)?;
            }
            if let Some(t) = roof.thickness {
                positive("architecture.roof.thickness", t)?;
            }
        }

        for item in &self.equipment {
            let field = |name: &str| format!("equipment '{}' {}", item.id, name);
            positive(&field("footprint.width"), item.footprint.width)?;
            positive(&field("footprint.depth"), item.footprint.depth)?;
            positive(&field("height"), item.height)?;
            let zone = item.clearance();
            non_negative(&field("maintenance_zone.front"), zone.front)?;
            non_negative(&field("maintenance_zone.back"), zone.back)?;
            non_negative(&field("maintenance_zone.left"), zone.left)?;
            non_negative(&field("maintenance_zone.right"), zone.right)?;
        }

        ItemRegistry::new(self.equipment.iter().map(|e| (e.id.as_str(), e.name.as_str())))
            .map_err(ProjectError::DuplicateId)?;

        if let Some(options) = &self.solver_options {
            if let Some(limit) = options.time_limit_sec {
                positive("solver_options.time_limit_sec", limit)?;
            }
            if options.workers == Some(0) {
                return Err(ProjectError::invalid(
                    "solver_options.workers",
                    "must be at least 1",
                ));
            }
        }
        Ok(())
    }

    /// Interior placeable region as `(min_x, min_y, max_x, max_y)`
    pub fn interior(&self) -> (f64, f64, f64, f64) {
        let room = &self.architecture.room_dimensions;
        let wall = self.architecture.wall_thickness;
        (wall, wall, room.width - wall, room.depth - wall)
    }

    /// Find an equipment item by its raw id
    pub fn item(&self, id: &str) -> Option<&EquipmentItem> {
        self.equipment.iter().find(|e| e.id == id)
    }
}

fn positive(field: &str, value: f64) -> Result<(), ProjectError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ProjectError::invalid(field, format!("must be > 0, got {}", value)))
    }
}

fn non_negative(field: &str, value: f64) -> Result<(), ProjectError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ProjectError::invalid(field, format!("must be >= 0, got {}", value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MINIMAL: &str = r#"{
        "meta": { "project_name": "demo", "schema_version": "1.0" },
        "architecture": {
            "room_dimensions": { "width": 10, "depth": 8, "height": 3 },
            "wall_thickness": 0.5,
            "roof": { "type": "GABLE", "height": 2.5 }
        },
        "equipment": [
            { "id": "A", "name": "Press", "footprint": { "width": 2, "depth": 2 }, "height": 1.5,
              "maintenance_zone": { "front": 0.5 } }
        ],
        "rules": [
            { "type": "ATTACH_TO_WALL", "params": { "target": "A", "side": "Xmin" },
              "comment": "against the west wall" }
        ],
        "solver_options": { "time_limit_sec": 5 }
    }"#;

    #[test]
    fn test_parse_minimal_project() {
        let project = Project::from_json_str(MINIMAL).unwrap();
        assert_eq!(project.meta.schema_version.as_deref(), Some("1.0"));
        assert_eq!(project.architecture.roof.as_ref().map(|r| r.kind), Some(RoofKind::Gable));
        assert_eq!(
            project.equipment[0].clearance(),
            MaintenanceZone {
                front: 0.5,
                ..MaintenanceZone::default()
            }
        );
        assert_eq!(project.rules[0].kind, "ATTACH_TO_WALL");
        assert_eq!(project.rules[0].params["side"], "Xmin");
        assert_eq!(project.rules[0].comment.as_deref(), Some("against the west wall"));
        assert_eq!(project.interior(), (0.5, 0.5, 9.5, 7.5));
    }

    #[test]
    fn test_rejects_non_positive_footprint() {
        let bad = MINIMAL.replace(r#""width": 2"#, r#""width": 0"#);
        let err = Project::from_json_str(&bad).unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"invalid value for equipment 'A' footprint.width: must be > 0, got 0");
    }

    #[test]
    fn test_rejects_walls_thicker_than_room() {
        let bad = MINIMAL.replace(r#""wall_thickness": 0.5"#, r#""wall_thickness": 5"#);
        let err = Project::from_json_str(&bad).unwrap_err();
        assert!(matches!(err, ProjectError::InvalidValue { .. }));
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let bad = MINIMAL.replace(
            r#""equipment": ["#,
            r#""equipment": [
            { "id": "A", "name": "Other", "footprint": { "width": 1, "depth": 1 }, "height": 1 },"#,
        );
        let err = Project::from_json_str(&bad).unwrap_err();
        assert!(matches!(err, ProjectError::DuplicateId(id) if id == "A"));
    }

    #[test]
    fn test_rules_default_to_empty() {
        let json = r#"{
            "meta": { "project_name": "empty" },
            "architecture": { "room_dimensions": { "width": 4, "depth": 4, "height": 3 } },
            "equipment": []
        }"#;
        let project = Project::from_json_str(json).unwrap();
        assert!(project.rules.is_empty());
        assert!(project.solver_options.is_none());
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let dir = std::env::temp_dir().join("factory_layout_project_ext_test.yaml");
        std::fs::write(&dir, MINIMAL).unwrap();
        let err = Project::from_file(&dir).unwrap_err();
        let _ = std::fs::remove_file(&dir);
        assert!(matches!(err, ProjectError::UnsupportedFormat(ext) if ext == "yaml"));
    }
}
