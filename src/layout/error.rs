//! Error types for rule compilation and placement

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::error::ProjectError;
use crate::solver::SolverError;

/// Why a single rule was skipped
///
/// These never abort compilation; each one becomes a [`CompileWarning`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuleError {
    /// The rule names an item that is not in the equipment list
    #[error("unknown item '{reference}'{}", did_you_mean(suggestions))]
    UnknownItem {
        reference: String,
        suggestions: Vec<String>,
    },

    /// Missing or malformed parameter
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    /// The rule type is not one the compiler knows
    #[error("unsupported rule type '{0}'")]
    UnsupportedType(String),
}

impl RuleError {
    pub fn unknown_item(reference: impl Into<String>) -> Self {
        Self::UnknownItem {
            reference: reference.into(),
            suggestions: Vec::new(),
        }
    }

    /// Attach near-miss ids to an unknown reference
    pub fn with_suggestions(self, ids: Vec<String>) -> Self {
        match self {
            Self::UnknownItem { reference, .. } => Self::UnknownItem {
                reference,
                suggestions: ids,
            },
            other => other,
        }
    }

    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Short category name used in reports
    pub fn category(&self) -> &'static str {
        match self {
            Self::UnknownItem { .. } => "reference",
            Self::InvalidValue { .. } => "value",
            Self::UnsupportedType(_) => "unsupported",
        }
    }
}

fn did_you_mean(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        let quoted: Vec<String> = suggestions.iter().map(|s| format!("'{}'", s)).collect();
        format!(" (did you mean {}?)", quoted.join(", "))
    }
}

/// A skipped rule together with where it was declared
#[derive(Debug, Clone, PartialEq)]
pub struct CompileWarning {
    /// Position of the rule in the project's rule list
    pub rule_index: usize,
    /// The rule's `type` as written
    pub rule_type: String,
    pub comment: Option<String>,
    pub error: RuleError,
}

impl fmt::Display for CompileWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rule #{} ({}) skipped: {}",
            self.rule_index, self.rule_type, self.error
        )?;
        if let Some(comment) = &self.comment {
            write!(f, " [{}]", comment)?;
        }
        Ok(())
    }
}

/// Terminal failures of the placement pipeline
#[derive(Debug, Error)]
pub enum PlaceError {
    /// Room or item data rejected before compilation
    #[error("invalid project: {0}")]
    Project(#[from] ProjectError),

    /// The solver proved that the applied rules cannot all hold
    #[error("INFEASIBLE: no placement satisfies the {} applied rule(s)", applied_rules.len())]
    Infeasible {
        applied_rules: Vec<String>,
        warnings: Vec<CompileWarning>,
    },

    /// Time ran out before any placement was found; nothing was proven
    #[error("UNKNOWN: no placement found within {:.1}s", time_limit.as_secs_f64())]
    Timeout {
        time_limit: Duration,
        applied_rules: Vec<String>,
        warnings: Vec<CompileWarning>,
    },

    #[error("solver error: {0}")]
    Solver(#[from] SolverError),
}

impl PlaceError {
    /// Rules that were compiled into the failed model
    pub fn applied_rules(&self) -> &[String] {
        match self {
            Self::Infeasible { applied_rules, .. } | Self::Timeout { applied_rules, .. } => {
                applied_rules
            }
            _ => &[],
        }
    }

    pub fn warnings(&self) -> &[CompileWarning] {
        match self {
            Self::Infeasible { warnings, .. } | Self::Timeout { warnings, .. } => warnings,
            _ => &[],
        }
    }
}
