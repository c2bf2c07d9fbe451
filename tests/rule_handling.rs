//! Skipped-rule behavior and diagnostics

use std::time::Duration;

use factory_layout::layout::compile;
use factory_layout::{place, PlaceError, PlacerConfig, Project, RuleError};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn config() -> PlacerConfig {
    PlacerConfig::default()
        .with_scale(100)
        .with_time_limit(Duration::from_secs(2))
}

fn pinned_project(extra: Vec<Value>) -> Project {
    let mut rules = vec![
        json!({ "type": "PLACE_AT", "target": "press", "params": { "position": [1.0, 1.0] } }),
        json!({ "type": "PLACE_AT", "target": "lathe", "params": { "position": [4.0, 1.0] } }),
        json!({ "type": "PLACE_AT", "target": "oven", "params": { "position": [1.0, 4.0] } }),
    ];
    rules.extend(extra);
    let doc = json!({
        "meta": { "project_name": "rules" },
        "architecture": {
            "room_dimensions": { "width": 8.0, "depth": 6.0, "height": 3.0 },
            "wall_thickness": 0.25
        },
        "equipment": [
            { "id": "press", "name": "Hydraulic Press", "footprint": { "width": 1.0, "depth": 1.0 }, "height": 2.0 },
            { "id": "lathe", "name": "Lathe", "footprint": { "width": 2.0, "depth": 1.0 }, "height": 1.5 },
            { "id": "oven", "name": "Oven", "footprint": { "width": 1.0, "depth": 1.5 }, "height": 2.0 }
        ],
        "rules": rules
    });
    Project::from_json_str(&doc.to_string()).expect("valid project")
}

#[test]
fn test_unknown_reference_changes_nothing() {
    let clean = pinned_project(vec![]);
    let with_typo = pinned_project(vec![json!({
        "type": "ALIGN", "target1": "press", "target2": "lathee",
        "params": { "axis": "X" }, "comment": "typo"
    })]);

    let a = place(&clean, &config()).unwrap();
    let b = place(&with_typo, &config()).unwrap();

    assert_eq!(a.solution, b.solution);
    assert_eq!(a.applied_rules, b.applied_rules);
    assert!(a.warnings.is_empty());
    assert_eq!(b.warnings.len(), 1);
    insta::assert_snapshot!(
        b.warnings[0].to_string(),
        @"rule #3 (ALIGN) skipped: unknown item 'lathee' (did you mean 'lathe'?) [typo]"
    );
}

#[test]
fn test_each_bad_rule_yields_one_warning_of_its_kind() {
    let project = pinned_project(vec![
        json!({ "type": "LEVITATE", "target": "press", "params": {} }),
        json!({ "type": "SERVICE_ZONE", "params": { "margin": 0.5 } }),
        json!({ "type": "AVOID_ZONE", "params": { "area": [5.0, 5.0, 2.0, 2.0] } }),
    ]);

    let report = place(&project, &config()).unwrap();
    let errors: Vec<&RuleError> = report.warnings.iter().map(|w| &w.error).collect();
    assert_eq!(errors.len(), 3);
    assert!(matches!(errors[0], RuleError::UnsupportedType(t) if t == "LEVITATE"));
    assert!(matches!(errors[1], RuleError::InvalidValue { field, .. } if field == "target"));
    assert!(matches!(errors[2], RuleError::InvalidValue { field, .. } if field == "area"));

    let indices: Vec<usize> = report.warnings.iter().map(|w| w.rule_index).collect();
    assert_eq!(indices, vec![3, 4, 5]);
    assert_eq!(report.applied_rules.len(), 3);
    assert!(report.applied_rules.iter().all(|r| r.contains("PLACE_AT")));
}

#[test]
fn test_references_by_display_name_and_case() {
    let project = pinned_project(vec![
        json!({ "type": "MIN_DISTANCE", "target1": "Hydraulic Press", "target2": "OVEN", "params": { "distance": 2.0 } }),
    ]);
    let compiled = compile(&project, &config()).unwrap();
    // Lookups are case sensitive
    assert_eq!(compiled.report.applied.len(), 3);
    assert_eq!(compiled.report.warnings.len(), 1);

    let project = pinned_project(vec![
        json!({ "type": "MIN_DISTANCE", "target1": "Hydraulic Press", "target2": "Oven", "params": { "distance": 2.0 } }),
    ]);
    let compiled = compile(&project, &config()).unwrap();
    assert_eq!(compiled.report.applied.len(), 4);
    assert!(compiled.report.warnings.is_empty());
}

#[test]
fn test_contradicting_pins_report_applied_rules() {
    let project = pinned_project(vec![json!({
        "type": "ALIGN", "target1": "press", "target2": "lathe", "params": { "axis": "X" }
    })]);

    let err = place(&project, &config()).unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"INFEASIBLE: no placement satisfies the 4 applied rule(s)");
    assert_eq!(err.applied_rules()[3], "#3 ALIGN 'press' and 'lathe' on X");
}

#[test]
fn test_invalid_room_fails_fast() {
    let doc = json!({
        "meta": { "project_name": "bad" },
        "architecture": {
            "room_dimensions": { "width": 0.0, "depth": 6.0, "height": 3.0 }
        },
        "equipment": []
    });
    let err = Project::from_json_str(&doc.to_string()).unwrap_err();
    insta::assert_snapshot!(
        err.to_string(),
        @"invalid value for architecture.room_dimensions.width: must be > 0, got 0"
    );
}

#[test]
fn test_unscalable_lengths_are_skipped_not_clamped() {
    let clean = pinned_project(vec![]);
    let project = pinned_project(vec![
        json!({ "type": "PLACE_AT", "target": "oven", "params": { "position": [1e20, 4.0] } }),
        json!({ "type": "MIN_DISTANCE", "target1": "press", "target2": "lathe", "params": { "distance": 1e17 } }),
        json!({ "type": "AVOID_ZONE", "params": { "area": [-1e300, 0.0, 1.0, 1.0] } }),
    ]);

    let a = place(&clean, &config()).unwrap();
    let b = place(&project, &config()).unwrap();
    assert_eq!(a.solution, b.solution);
    assert_eq!(a.applied_rules, b.applied_rules);

    let fields: Vec<(usize, &str)> = b
        .warnings
        .iter()
        .filter_map(|w| match &w.error {
            RuleError::InvalidValue { field, .. } => Some((w.rule_index, field.as_str())),
            _ => None,
        })
        .collect();
    assert_eq!(fields, vec![(3, "position"), (4, "distance"), (5, "area")]);
}

#[test]
fn test_unscalable_room_is_a_project_error() {
    let doc = json!({
        "meta": { "project_name": "vast" },
        "architecture": {
            "room_dimensions": { "width": 1e300, "depth": 6.0, "height": 3.0 }
        },
        "equipment": []
    });
    let project = Project::from_json_str(&doc.to_string()).unwrap();

    let err = place(&project, &config()).unwrap_err();
    assert!(matches!(err, PlaceError::Project(_)), "{}", err);
}
