//! Virtual boxes: footprints padded by their maintenance clearance
//!
//! Packing and zoning constraints act on the virtual box origin `(vx, vy)`;
//! the reported position is the footprint origin `(px, py)`, linked by
//! `px = vx + left` and `py = vy + back`.

use crate::error::ProjectError;
use crate::project::{EquipmentItem, Project};
use crate::solver::{ConstraintSource, CpModel, IntVar, LinearExpr, Rect2D};

use super::scale::Scale;

/// Placeable room interior in solver units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interior {
    pub min_x: i64,
    pub min_y: i64,
    pub max_x: i64,
    pub max_y: i64,
}

impl Interior {
    pub fn of(project: &Project, scale: Scale) -> Result<Self, ProjectError> {
        let (x1, y1, x2, y2) = project.interior();
        Ok(Self {
            min_x: scaled(scale, "architecture.wall_thickness", x1)?,
            min_y: scaled(scale, "architecture.wall_thickness", y1)?,
            max_x: scaled(scale, "architecture.room_dimensions.width", x2)?,
            max_y: scaled(scale, "architecture.room_dimensions.depth", y2)?,
        })
    }

    /// Placeable area in squared solver units
    pub fn area(&self) -> i128 {
        (self.max_x - self.min_x) as i128 * (self.max_y - self.min_y) as i128
    }
}

fn scaled(scale: Scale, field: &str, value: f64) -> Result<i64, ProjectError> {
    scale.to_scaled(value).ok_or_else(|| {
        ProjectError::invalid(
            field,
            format!(
                "{} exceeds the largest length ({}) at scale {}",
                value,
                scale.max_length(),
                scale.factor()
            ),
        )
    })
}

/// Solver-side view of one item
#[derive(Debug, Clone)]
pub struct VirtualBox {
    /// Position in the project's equipment list
    pub index: usize,
    /// Id as written in the project
    pub id: String,
    pub name: String,

    /// Footprint size
    pub width: i64,
    pub depth: i64,
    /// Clearance on the low side of each axis
    pub left: i64,
    pub back: i64,
    /// Padded size
    pub vw: i64,
    pub vd: i64,

    pub vx: IntVar,
    pub vy: IntVar,
    pub px: IntVar,
    pub py: IntVar,
}

impl VirtualBox {
    /// Footprint center on X, doubled so it stays integral
    pub fn center2_x(&self) -> LinearExpr {
        self.px * 2 + self.width
    }

    pub fn center2_y(&self) -> LinearExpr {
        self.py * 2 + self.depth
    }

    /// Virtual box center on X (integer half size)
    pub fn virtual_center_x(&self) -> LinearExpr {
        self.vx + self.vw / 2
    }

    pub fn virtual_center_y(&self) -> LinearExpr {
        self.vy + self.vd / 2
    }

    /// Footprint center on X (integer half size)
    pub fn center_x(&self) -> LinearExpr {
        self.px + self.width / 2
    }

    pub fn center_y(&self) -> LinearExpr {
        self.py + self.depth / 2
    }

    pub fn rect(&self) -> Rect2D {
        Rect2D {
            x: self.vx,
            width: self.vw,
            y: self.vy,
            height: self.vd,
        }
    }

    /// Padded area in squared solver units
    pub fn area(&self) -> i128 {
        self.vw as i128 * self.vd as i128
    }

    /// Whether the padded box fits in the interior at all
    pub fn fits(&self, interior: &Interior) -> bool {
        self.vw <= interior.max_x - interior.min_x && self.vd <= interior.max_y - interior.min_y
    }
}

/// Allocate the position variables of one item and link them
///
/// A box too large for the room gets a one-point domain plus a bound that
/// cannot hold, so the solve reports infeasibility instead of failing to
/// build the model.
pub fn expand(
    model: &mut CpModel,
    index: usize,
    item: &EquipmentItem,
    interior: &Interior,
    scale: Scale,
) -> Result<VirtualBox, ProjectError> {
    let zone = item.clearance();
    let field = |name: &str| format!("equipment '{}' {}", item.id, name);
    let width = scaled(scale, &field("footprint.width"), item.footprint.width)?;
    let depth = scaled(scale, &field("footprint.depth"), item.footprint.depth)?;
    let left = scaled(scale, &field("maintenance_zone.left"), zone.left)?;
    let back = scaled(scale, &field("maintenance_zone.back"), zone.back)?;
    let right = scaled(scale, &field("maintenance_zone.right"), zone.right)?;
    let front = scaled(scale, &field("maintenance_zone.front"), zone.front)?;
    let vw = left + width + right;
    let vd = back + depth + front;

    let max_vx = (interior.max_x - vw).max(interior.min_x);
    let max_vy = (interior.max_y - vd).max(interior.min_y);

    let vx = model.new_int_var(interior.min_x, max_vx, format!("vx_{}", item.id));
    let vy = model.new_int_var(interior.min_y, max_vy, format!("vy_{}", item.id));
    let px = model.new_int_var(interior.min_x + left, max_vx + left, format!("x_{}", item.id));
    let py = model.new_int_var(interior.min_y + back, max_vy + back, format!("y_{}", item.id));

    let src = |what: &str| ConstraintSource::structural(format!("{} '{}'", what, item.id));
    model.add_eq(px, vx + left, src("clearance offset x of"));
    model.add_eq(py, vy + back, src("clearance offset y of"));

    let vbox = VirtualBox {
        index,
        id: item.id.clone(),
        name: item.name.clone(),
        width,
        depth,
        left,
        back,
        vw,
        vd,
        vx,
        vy,
        px,
        py,
    };

    if !vbox.fits(interior) {
        model.add_le(vx + vw, interior.max_x, src("room width holds"));
        model.add_le(vy + vd, interior.max_y, src("room depth holds"));
    }
    Ok(vbox)
}
