//! Placement model construction and result handling
//!
//! This module takes a validated [`Project`](crate::project::Project), builds
//! the integer model the solver works on, and turns a solver assignment back
//! into a [`PlacementSolution`] in physical units.

pub mod audit;
pub mod compiler;
pub mod config;
pub mod error;
pub mod extract;
pub mod objective;
pub mod scale;
pub mod vbox;

pub use audit::{AuditCategory, AuditFinding};
pub use compiler::{compile, AppliedRule, CompileReport, CompiledLayout};
pub use config::{PlacerConfig, RulePolicy};
pub use error::{CompileWarning, PlaceError, RuleError};
pub use extract::{extract, Placement, PlacementSolution};
pub use scale::Scale;
pub use vbox::{Interior, VirtualBox};
