//! Typed placement rules
//!
//! A [`RawRule`] is converted in two steps: its `type` string selects a
//! [`RuleKind`], then the `params` bag is deserialized into that kind's
//! parameter struct. Item references stay as written; resolving them against
//! the equipment list happens in the compiler.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::layout::error::RuleError;
use crate::project::RawRule;

/// Closed set of rule types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    AvoidZone,
    PlaceInZone,
    AttachToWall,
    Align,
    PlaceAfter,
    Corridor,
    MinDistance,
    ParallelLine,
    ServiceZone,
    CompactGroup,
    Orientation,
    PlaceAt,
}

impl RuleKind {
    pub const ALL: [RuleKind; 12] = [
        RuleKind::AvoidZone,
        RuleKind::PlaceInZone,
        RuleKind::AttachToWall,
        RuleKind::Align,
        RuleKind::PlaceAfter,
        RuleKind::Corridor,
        RuleKind::MinDistance,
        RuleKind::ParallelLine,
        RuleKind::ServiceZone,
        RuleKind::CompactGroup,
        RuleKind::Orientation,
        RuleKind::PlaceAt,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RuleKind::AvoidZone => "AVOID_ZONE",
            RuleKind::PlaceInZone => "PLACE_IN_ZONE",
            RuleKind::AttachToWall => "ATTACH_TO_WALL",
            RuleKind::Align => "ALIGN",
            RuleKind::PlaceAfter => "PLACE_AFTER",
            RuleKind::Corridor => "CORRIDOR",
            RuleKind::MinDistance => "MIN_DISTANCE",
            RuleKind::ParallelLine => "PARALLEL_LINE",
            RuleKind::ServiceZone => "SERVICE_ZONE",
            RuleKind::CompactGroup => "COMPACT_GROUP",
            RuleKind::Orientation => "ORIENTATION",
            RuleKind::PlaceAt => "PLACE_AT",
        }
    }

    /// Parse a `type` tag; case and surrounding whitespace are ignored
    pub fn parse(tag: &str) -> Option<Self> {
        let tag = tag.trim().to_ascii_uppercase();
        if tag == "PRODUCTION_ZONE" {
            return Some(RuleKind::PlaceInZone);
        }
        Self::ALL.into_iter().find(|k| k.as_str() == tag)
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Interior wall of the room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Wall {
    #[serde(alias = "xmin", alias = "XMIN")]
    Xmin,
    #[serde(alias = "xmax", alias = "XMAX")]
    Xmax,
    #[serde(alias = "ymin", alias = "YMIN")]
    Ymin,
    #[serde(alias = "ymax", alias = "YMAX")]
    Ymax,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    #[serde(alias = "x")]
    X,
    #[serde(alias = "y")]
    Y,
}

impl Axis {
    pub fn cross(self) -> Axis {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::X,
        }
    }
}

/// Cross-axis alignment requested by `PLACE_AFTER`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Center,
    None,
}

/// Axis-aligned rectangle in physical units, written `[x1, y1, x2, y2]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Area {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Area {
    fn from_corners(field: &str, [x1, y1, x2, y2]: [f64; 4]) -> Result<Self, RuleError> {
        if ![x1, y1, x2, y2].iter().all(|v| v.is_finite()) {
            return Err(RuleError::invalid(field, "coordinates must be finite"));
        }
        if x2 <= x1 || y2 <= y1 {
            return Err(RuleError::invalid(
                field,
                format!(
                    "expected [x1, y1, x2, y2] with x1 < x2 and y1 < y2, got [{}, {}, {}, {}]",
                    x1, y1, x2, y2
                ),
            ));
        }
        Ok(Self { x1, y1, x2, y2 })
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}, {}]", self.x1, self.y1, self.x2, self.y2)
    }
}

/// A validated rule; item references are still raw strings
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// Every item's virtual box stays outside the area
    AvoidZone { area: Area },
    /// The target's virtual box stays inside the area
    PlaceInZone { target: String, area: Area },
    AttachToWall {
        target: String,
        side: Wall,
        distance: f64,
    },
    /// Footprint centers equal on the axis
    Align {
        first: String,
        second: String,
        axis: Axis,
    },
    /// Target follows the anchor along `direction`
    PlaceAfter {
        target: String,
        anchor: String,
        direction: Axis,
        distance: f64,
        alignment: Alignment,
    },
    /// Keep a swept rectangle of `width` between two points clear
    Corridor {
        from: (f64, f64),
        to: (f64, f64),
        width: f64,
        soft: bool,
    },
    MinDistance {
        first: String,
        second: String,
        distance: f64,
    },
    /// `center(first) = center(second) + offset` on the axis
    ParallelLine {
        first: String,
        second: String,
        offset: f64,
        axis: Axis,
    },
    /// Target's center keeps `margin` from every other center
    ServiceZone { target: String, margin: f64 },
    CompactGroup { members: Vec<String> },
    Orientation { target: String, rotation_deg: f64 },
    /// Pin the target's footprint origin
    PlaceAt {
        target: String,
        x: f64,
        y: f64,
        rotation_deg: Option<f64>,
    },
}

impl Rule {
    pub fn kind(&self) -> RuleKind {
        match self {
            Rule::AvoidZone { .. } => RuleKind::AvoidZone,
            Rule::PlaceInZone { .. } => RuleKind::PlaceInZone,
            Rule::AttachToWall { .. } => RuleKind::AttachToWall,
            Rule::Align { .. } => RuleKind::Align,
            Rule::PlaceAfter { .. } => RuleKind::PlaceAfter,
            Rule::Corridor { .. } => RuleKind::Corridor,
            Rule::MinDistance { .. } => RuleKind::MinDistance,
            Rule::ParallelLine { .. } => RuleKind::ParallelLine,
            Rule::ServiceZone { .. } => RuleKind::ServiceZone,
            Rule::CompactGroup { .. } => RuleKind::CompactGroup,
            Rule::Orientation { .. } => RuleKind::Orientation,
            Rule::PlaceAt { .. } => RuleKind::PlaceAt,
        }
    }

    /// Convert a raw rule, validating every parameter
    pub fn from_raw(raw: &RawRule) -> Result<Rule, RuleError> {
        let kind =
            RuleKind::parse(&raw.kind).ok_or_else(|| RuleError::UnsupportedType(raw.kind.clone()))?;

        let rule = match kind {
            RuleKind::AvoidZone => {
                let p: AreaParams = params(raw)?;
                Rule::AvoidZone {
                    area: Area::from_corners("area", p.area)?,
                }
            }
            RuleKind::PlaceInZone => {
                let p: TargetAreaParams = params(raw)?;
                Rule::PlaceInZone {
                    target: pick("target", &raw.target, p.target)?,
                    area: Area::from_corners("area", p.area)?,
                }
            }
            RuleKind::AttachToWall => {
                let p: AttachParams = params(raw)?;
                Rule::AttachToWall {
                    target: pick("target", &raw.target, p.target)?,
                    side: p.side,
                    distance: non_negative("distance", p.distance)?,
                }
            }
            RuleKind::Align => {
                let p: PairParams = params(raw)?;
                Rule::Align {
                    first: pick("target1", &raw.target1, p.target1)?,
                    second: pick("target2", &raw.target2, p.target2)?,
                    axis: p.axis.ok_or_else(|| RuleError::invalid("axis", "missing"))?,
                }
            }
            RuleKind::PlaceAfter => {
                let p: PlaceAfterParams = params(raw)?;
                let anchor = match p.anchor {
                    Some(anchor) => anchor,
                    None => pick("anchor", &raw.target2, None)?,
                };
                Rule::PlaceAfter {
                    target: pick("target", &raw.target, p.target)?,
                    anchor,
                    direction: p.direction,
                    distance: non_negative("distance", p.distance)?,
                    alignment: p.alignment,
                }
            }
            RuleKind::Corridor => {
                let p: CorridorParams = params(raw)?;
                finite("from", p.from[0])?;
                finite("from", p.from[1])?;
                finite("to", p.to[0])?;
                finite("to", p.to[1])?;
                Rule::Corridor {
                    from: (p.from[0], p.from[1]),
                    to: (p.to[0], p.to[1]),
                    width: positive("width", p.width)?,
                    soft: p.soft,
                }
            }
            RuleKind::MinDistance => {
                let p: PairParams = params(raw)?;
                Rule::MinDistance {
                    first: pick("target1", &raw.target1, p.target1)?,
                    second: pick("target2", &raw.target2, p.target2)?,
                    distance: non_negative(
                        "distance",
                        p.distance.ok_or_else(|| RuleError::invalid("distance", "missing"))?,
                    )?,
                }
            }
            RuleKind::ParallelLine => {
                let p: PairParams = params(raw)?;
                Rule::ParallelLine {
                    first: pick("target1", &raw.target1, p.target1)?,
                    second: pick("target2", &raw.target2, p.target2)?,
                    offset: finite("offset", p.offset.unwrap_or(0.0))?,
                    axis: p.axis.unwrap_or(Axis::X),
                }
            }
            RuleKind::ServiceZone => {
                let p: ServiceZoneParams = params(raw)?;
                Rule::ServiceZone {
                    target: pick("target", &raw.target, p.target)?,
                    margin: non_negative("margin", p.margin)?,
                }
            }
            RuleKind::CompactGroup => {
                let p: GroupParams = params(raw)?;
                let mut members: Vec<String> = Vec::new();
                for m in p.members {
                    if !members.contains(&m) {
                        members.push(m);
                    }
                }
                if members.len() < 2 {
                    return Err(RuleError::invalid(
                        "members",
                        "a group needs at least two distinct items",
                    ));
                }
                Rule::CompactGroup { members }
            }
            RuleKind::Orientation => {
                let p: OrientationParams = params(raw)?;
                Rule::Orientation {
                    target: pick("target", &raw.target, p.target)?,
                    rotation_deg: finite("rotation_deg", p.rotation_deg)?,
                }
            }
            RuleKind::PlaceAt => {
                let p: PlaceAtParams = params(raw)?;
                Rule::PlaceAt {
                    target: pick("target", &raw.target, p.target)?,
                    x: finite("position", p.position[0])?,
                    y: finite("position", p.position[1])?,
                    rotation_deg: p.rotation_deg.map(|r| finite("rotation_deg", r)).transpose()?,
                }
            }
        };
        Ok(rule)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::AvoidZone { area } => write!(f, "AVOID_ZONE {}", area),
            Rule::PlaceInZone { target, area } => write!(f, "PLACE_IN_ZONE '{}' in {}", target, area),
            Rule::AttachToWall {
                target,
                side,
                distance,
            } => write!(f, "ATTACH_TO_WALL '{}' to {:?} at {}", target, side, distance),
            Rule::Align { first, second, axis } => {
                write!(f, "ALIGN '{}' and '{}' on {:?}", first, second, axis)
            }
            Rule::PlaceAfter {
                target,
                anchor,
                direction,
                distance,
                alignment,
            } => write!(
                f,
                "PLACE_AFTER '{}' after '{}' along {:?} +{} (alignment {:?})",
                target, anchor, direction, distance, alignment
            ),
            Rule::Corridor {
                from,
                to,
                width,
                soft,
            } => write!(
                f,
                "CORRIDOR ({}, {}) -> ({}, {}) width {}{}",
                from.0,
                from.1,
                to.0,
                to.1,
                width,
                if *soft { " (soft)" } else { "" }
            ),
            Rule::MinDistance {
                first,
                second,
                distance,
            } => write!(f, "MIN_DISTANCE '{}' - '{}' >= {}", first, second, distance),
            Rule::ParallelLine {
                first,
                second,
                offset,
                axis,
            } => write!(
                f,
                "PARALLEL_LINE '{}' = '{}' {:+} on {:?}",
                first, second, offset, axis
            ),
            Rule::ServiceZone { target, margin } => {
                write!(f, "SERVICE_ZONE '{}' margin {}", target, margin)
            }
            Rule::CompactGroup { members } => write!(f, "COMPACT_GROUP [{}]", members.join(", ")),
            Rule::Orientation {
                target,
                rotation_deg,
            } => write!(f, "ORIENTATION '{}' {} deg", target, rotation_deg),
            Rule::PlaceAt { target, x, y, .. } => write!(f, "PLACE_AT '{}' at ({}, {})", target, x, y),
        }
    }
}

// ============================================================================
// Parameter bags
// ============================================================================

#[derive(Deserialize)]
struct AreaParams {
    area: [f64; 4],
}

#[derive(Deserialize)]
struct TargetAreaParams {
    target: Option<String>,
    area: [f64; 4],
}

#[derive(Deserialize)]
struct AttachParams {
    target: Option<String>,
    side: Wall,
    #[serde(default)]
    distance: f64,
}

/// Shared by the two-item rules; each reads the fields it needs
#[derive(Deserialize)]
struct PairParams {
    target1: Option<String>,
    target2: Option<String>,
    axis: Option<Axis>,
    distance: Option<f64>,
    offset: Option<f64>,
}

fn default_direction() -> Axis {
    Axis::Y
}

fn default_alignment() -> Alignment {
    Alignment::Center
}

#[derive(Deserialize)]
struct PlaceAfterParams {
    target: Option<String>,
    anchor: Option<String>,
    #[serde(default = "default_direction")]
    direction: Axis,
    #[serde(default)]
    distance: f64,
    #[serde(default = "default_alignment")]
    alignment: Alignment,
}

#[derive(Deserialize)]
struct CorridorParams {
    from: [f64; 2],
    to: [f64; 2],
    width: f64,
    #[serde(default)]
    soft: bool,
}

#[derive(Deserialize)]
struct ServiceZoneParams {
    target: Option<String>,
    margin: f64,
}

#[derive(Deserialize)]
struct GroupParams {
    #[serde(alias = "targets", alias = "items")]
    members: Vec<String>,
}

#[derive(Deserialize)]
struct OrientationParams {
    target: Option<String>,
    rotation_deg: f64,
}

#[derive(Deserialize)]
struct PlaceAtParams {
    target: Option<String>,
    position: [f64; 2],
    rotation_deg: Option<f64>,
}

fn params<T: DeserializeOwned>(raw: &RawRule) -> Result<T, RuleError> {
    serde_json::from_value(serde_json::Value::Object(raw.params.clone()))
        .map_err(|e| RuleError::invalid("params", e.to_string()))
}

/// Top-level reference wins over the one in `params`
fn pick(field: &str, top: &Option<String>, param: Option<String>) -> Result<String, RuleError> {
    top.clone()
        .or(param)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| RuleError::invalid(field, "missing item reference"))
}

fn finite(field: &str, value: f64) -> Result<f64, RuleError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(RuleError::invalid(field, format!("must be finite, got {}", value)))
    }
}

fn non_negative(field: &str, value: f64) -> Result<f64, RuleError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(RuleError::invalid(field, format!("must be >= 0, got {}", value)))
    }
}

fn positive(field: &str, value: f64) -> Result<f64, RuleError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(RuleError::invalid(field, format!("must be > 0, got {}", value)))
    }
}
