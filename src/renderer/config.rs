//! Configuration for SVG rendering

/// Configuration options for SVG output
#[derive(Debug, Clone, PartialEq)]
pub struct SvgConfig {
    /// Pixels per physical unit
    pub pixels_per_unit: f64,

    /// Padding around the viewBox, in pixels
    pub viewbox_padding: f64,

    /// Whether to include the XML declaration
    pub standalone: bool,

    /// Whether to format output with indentation
    pub pretty_print: bool,

    /// Prefix for CSS class names (e.g., "fl-" for "fl-footprint")
    pub class_prefix: Option<String>,

    /// Draw maintenance clearances around footprints
    pub show_clearance: bool,
}

impl Default for SvgConfig {
    fn default() -> Self {
        Self {
            pixels_per_unit: 50.0,
            viewbox_padding: 20.0,
            standalone: true,
            pretty_print: true,
            class_prefix: Some("fl-".to_string()),
            show_clearance: true,
        }
    }
}

impl SvgConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the drawing scale; non-positive values are ignored
    pub fn with_pixels_per_unit(mut self, ppu: f64) -> Self {
        if ppu.is_finite() && ppu > 0.0 {
            self.pixels_per_unit = ppu;
        }
        self
    }

    pub fn with_viewbox_padding(mut self, padding: f64) -> Self {
        self.viewbox_padding = padding;
        self
    }

    pub fn with_standalone(mut self, standalone: bool) -> Self {
        self.standalone = standalone;
        self
    }

    pub fn with_pretty_print(mut self, pretty: bool) -> Self {
        self.pretty_print = pretty;
        self
    }

    pub fn with_class_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.class_prefix = Some(prefix.into());
        self
    }

    pub fn without_class_prefix(mut self) -> Self {
        self.class_prefix = None;
        self
    }

    pub fn with_clearance(mut self, show: bool) -> Self {
        self.show_clearance = show;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SvgConfig::default();
        assert_eq!(config.pixels_per_unit, 50.0);
        assert!(config.standalone);
        assert_eq!(config.class_prefix, Some("fl-".to_string()));
    }

    #[test]
    fn test_builder_pattern() {
        let config = SvgConfig::new()
            .with_pixels_per_unit(-1.0)
            .with_viewbox_padding(0.0)
            .with_pretty_print(false)
            .without_class_prefix()
            .with_clearance(false);

        assert_eq!(config.pixels_per_unit, 50.0);
        assert_eq!(config.viewbox_padding, 0.0);
        assert!(!config.pretty_print);
        assert_eq!(config.class_prefix, None);
        assert!(!config.show_clearance);
    }
}
