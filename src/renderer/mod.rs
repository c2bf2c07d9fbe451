//! SVG renderer for placements
//!
//! Draws a top-down floor plan: walls, floor, maintenance clearances and
//! item footprints with their names.

pub mod config;
pub mod svg;

pub use config::SvgConfig;
pub use svg::render_floor_plan;
