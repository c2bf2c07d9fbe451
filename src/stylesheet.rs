//! Floor-plan palettes
//!
//! The SVG renderer paints through symbolic color tokens (`wall`,
//! `footprint`, ...). A stylesheet maps tokens to concrete colors and can be
//! loaded from TOML, so plans can be rendered in different schemes.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading or parsing stylesheets
#[derive(Error, Debug)]
pub enum StylesheetError {
    #[error("failed to read stylesheet file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse stylesheet TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// A stylesheet mapping symbolic colors to concrete values
#[derive(Debug, Clone, PartialEq)]
pub struct Stylesheet {
    pub name: Option<String>,
    /// Token name -> color
    pub colors: BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct TomlStylesheet {
    metadata: Option<TomlMetadata>,
    #[serde(default)]
    colors: BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct TomlMetadata {
    name: Option<String>,
}

/// Token and color of the built-in palette
const DEFAULT_PALETTE: &[(&str, &str)] = &[
    ("floor", "#fafafa"),
    ("wall", "#455a64"),
    ("clearance", "#e3f2fd"),
    ("clearance-stroke", "#90caf9"),
    ("footprint", "#ffcc80"),
    ("footprint-stroke", "#e65100"),
    ("label", "#1a1a1a"),
];

impl Stylesheet {
    /// Load stylesheet from TOML file
    pub fn from_file(path: &Path) -> Result<Self, StylesheetError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load stylesheet from TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, StylesheetError> {
        let parsed: TomlStylesheet = toml::from_str(content)?;
        Ok(Stylesheet {
            name: parsed.metadata.and_then(|m| m.name),
            colors: parsed.colors,
        })
    }

    /// Color for a token defined in this stylesheet
    pub fn resolve(&self, token: &str) -> Option<&str> {
        self.colors.get(token).map(|s| s.as_str())
    }

    /// Color for a token, falling back to the built-in palette, then gray
    pub fn resolve_or_default(&self, token: &str) -> String {
        self.resolve(token)
            .or_else(|| {
                DEFAULT_PALETTE
                    .iter()
                    .find(|(t, _)| *t == token)
                    .map(|(_, c)| *c)
            })
            .unwrap_or("#666666")
            .to_string()
    }
}

impl Default for Stylesheet {
    fn default() -> Self {
        Self {
            name: Some("default".to_string()),
            colors: DEFAULT_PALETTE
                .iter()
                .map(|(t, c)| (t.to_string(), c.to_string()))
                .collect(),
        }
    }
}
