//! Shared types for the Inko semantic analysis workspace.
//!
//! This crate provides the pieces every other crate in the workspace
//! depends on:
//!
//! - [`Span`] / [`Location`] — source locations for AST nodes and diagnostics
//! - [`Diagnostic`] / [`Diagnostics`] — errors and warnings as values
//! - [`Config`] — the fixed identifiers the core expects from configuration

pub mod config;
pub mod diagnostics;
pub mod span;

pub use config::Config;
pub use diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticKind, Diagnostics};
pub use span::{FileId, Location, Span};
