//! SVG generation for floor plans

use crate::layout::PlacementSolution;
use crate::project::{EquipmentItem, Project};
use crate::stylesheet::Stylesheet;

use super::SvgConfig;

/// Pixel rectangle of the drawing, before padding
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Build SVG elements incrementally
pub struct SvgBuilder {
    config: SvgConfig,
    styles: Vec<String>,
    elements: Vec<String>,
    indent: usize,
}

impl SvgBuilder {
    pub fn new(config: SvgConfig) -> Self {
        Self {
            config,
            styles: vec![],
            elements: vec![],
            indent: 1,
        }
    }

    /// Add CSS custom properties from a stylesheet
    pub fn add_stylesheet(&mut self, stylesheet: &Stylesheet) {
        let mut css = String::from(":root {\n");
        for (token, value) in &stylesheet.colors {
            css.push_str(&format!("    --{}: {};\n", token, value));
        }
        css.push_str("  }");
        self.styles.push(css);
    }

    fn prefix(&self) -> String {
        self.config.class_prefix.clone().unwrap_or_default()
    }

    fn indent_str(&self) -> String {
        if self.config.pretty_print {
            "  ".repeat(self.indent)
        } else {
            String::new()
        }
    }

    fn newline(&self) -> &str {
        if self.config.pretty_print {
            "\n"
        } else {
            ""
        }
    }

    /// Add a rectangle with prefixed classes
    pub fn add_rect(&mut self, id: Option<&str>, x: f64, y: f64, w: f64, h: f64, class: &str, styles: &str) {
        let prefix = self.prefix();
        let id_attr = id
            .map(|i| format!(r#" id="{}""#, escape_xml(i)))
            .unwrap_or_default();
        self.elements.push(format!(
            r#"{}<rect{} class="{}{}" x="{}" y="{}" width="{}" height="{}"{}/>"#,
            self.indent_str(),
            id_attr,
            prefix,
            class,
            x,
            y,
            w,
            h,
            styles
        ));
    }

    /// Add a centered label
    pub fn add_text(&mut self, text: &str, x: f64, y: f64, styles: &str) {
        let prefix = self.prefix();
        self.elements.push(format!(
            r#"{}<text class="{}label" x="{}" y="{}" text-anchor="middle" dominant-baseline="middle"{}>{}</text>"#,
            self.indent_str(),
            prefix,
            x,
            y,
            styles,
            escape_xml(text)
        ));
    }

    pub fn start_group(&mut self, id: Option<&str>, class: &str) {
        let prefix = self.prefix();
        let id_attr = id
            .map(|i| format!(r#" id="{}""#, escape_xml(i)))
            .unwrap_or_default();
        self.elements.push(format!(
            r#"{}<g{} class="{}{}">"#,
            self.indent_str(),
            id_attr,
            prefix,
            class
        ));
        self.indent += 1;
    }

    pub fn end_group(&mut self) {
        self.indent = self.indent.saturating_sub(1);
        self.elements.push(format!("{}</g>", self.indent_str()));
    }

    /// Build the final SVG string
    pub fn build(self, viewbox: ViewBox) -> String {
        let padding = self.config.viewbox_padding;
        let nl = self.newline();
        let mut svg = String::new();

        if self.config.standalone {
            svg.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
            svg.push_str(nl);
        }

        svg.push_str(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="{} {} {} {}">"#,
            viewbox.x - padding,
            viewbox.y - padding,
            viewbox.width + 2.0 * padding,
            viewbox.height + 2.0 * padding
        ));
        svg.push_str(nl);

        if !self.styles.is_empty() {
            svg.push_str("  <style>");
            svg.push_str(nl);
            for style in &self.styles {
                svg.push_str("  ");
                svg.push_str(style);
                svg.push_str(nl);
            }
            svg.push_str("  </style>");
            svg.push_str(nl);
        }

        for elem in &self.elements {
            svg.push_str(elem);
            svg.push_str(nl);
        }

        svg.push_str("</svg>");
        svg
    }
}

/// Maps room coordinates (origin at the Xmin/Ymin corner, Y up) to pixels
/// (origin top-left, Y down)
struct Canvas {
    ppu: f64,
    depth: f64,
}

impl Canvas {
    fn rect(&self, x: f64, y: f64, w: f64, h: f64) -> (f64, f64, f64, f64) {
        (
            x * self.ppu,
            (self.depth - y - h) * self.ppu,
            w * self.ppu,
            h * self.ppu,
        )
    }
}

fn fill(token: &str, stroke: Option<&str>) -> String {
    match stroke {
        Some(s) => format!(r#" fill="var(--{})" stroke="var(--{})""#, token, s),
        None => format!(r#" fill="var(--{})""#, token),
    }
}

/// Render a placement as a top-down floor plan
///
/// Items without a placement are left out.
pub fn render_floor_plan(
    project: &Project,
    solution: &PlacementSolution,
    config: &SvgConfig,
    stylesheet: &Stylesheet,
) -> String {
    let room = &project.architecture.room_dimensions;
    let canvas = Canvas {
        ppu: config.pixels_per_unit,
        depth: room.depth,
    };
    let mut builder = SvgBuilder::new(config.clone());
    builder.add_stylesheet(stylesheet);

    builder.start_group(Some("room"), "room");
    let (x, y, w, h) = canvas.rect(0.0, 0.0, room.width, room.depth);
    builder.add_rect(None, x, y, w, h, "wall", &fill("wall", None));
    let (x1, y1, x2, y2) = project.interior();
    let (x, y, w, h) = canvas.rect(x1, y1, x2 - x1, y2 - y1);
    builder.add_rect(None, x, y, w, h, "floor", &fill("floor", None));
    builder.end_group();

    for item in &project.equipment {
        if let Some(p) = solution.get(&item.id) {
            render_item(&mut builder, &canvas, item, p.x, p.y, p.rotation_deg, config);
        }
    }

    builder.build(ViewBox {
        x: 0.0,
        y: 0.0,
        width: room.width * canvas.ppu,
        height: room.depth * canvas.ppu,
    })
}

fn render_item(
    builder: &mut SvgBuilder,
    canvas: &Canvas,
    item: &EquipmentItem,
    px: f64,
    py: f64,
    rotation_deg: f64,
    config: &SvgConfig,
) {
    builder.start_group(Some(&item.id), "item");

    let zone = item.clearance();
    let has_clearance = zone.left > 0.0 || zone.right > 0.0 || zone.front > 0.0 || zone.back > 0.0;
    if config.show_clearance && has_clearance {
        let (x, y, w, h) = canvas.rect(
            px - zone.left,
            py - zone.back,
            zone.left + item.footprint.width + zone.right,
            zone.back + item.footprint.depth + zone.front,
        );
        builder.add_rect(
            None,
            x,
            y,
            w,
            h,
            "clearance",
            &format!(r#"{} stroke-dasharray="4 2""#, fill("clearance", Some("clearance-stroke"))),
        );
    }

    let (x, y, w, h) = canvas.rect(px, py, item.footprint.width, item.footprint.depth);
    builder.add_rect(None, x, y, w, h, "footprint", &fill("footprint", Some("footprint-stroke")));

    let label = if rotation_deg != 0.0 {
        format!("{} ({}°)", item.name, rotation_deg)
    } else {
        item.name.clone()
    };
    builder.add_text(&label, x + w / 2.0, y + h / 2.0, r#" fill="var(--label)""#);
    builder.end_group();
}

/// Escape special XML characters
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
