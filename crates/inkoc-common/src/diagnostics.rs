//! Diagnostics as values (§4.3, §7, §9 "Diagnostics as values").
//!
//! A diagnostic never unwinds anything: passes call [`Diagnostics::emit`]
//! and keep going, setting the offending expression's type to `Error` so a
//! single run surfaces as many independent problems as possible (§7's
//! propagation policy).

use crate::span::Location;
use serde::Serialize;
use std::fmt;

/// Whether a diagnostic is fatal to the *program* (but never to the pass).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum DiagnosticCategory {
    Error,
    Warning,
}

/// The diagnostic kinds enumerated in §7.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum DiagnosticKind {
    UndefinedConstant,
    UndefinedIdentifier,
    UndefinedAttribute,
    Redefined,
    TypeMismatch,
    ArityMismatch,
    InvalidKeywordArgument,
    ReservedConstant,
    InvalidTraitRequirement,
    InvalidImplementation,
    InvalidReopen,
    InvalidContext,
    InvalidCast,
    InvalidDereference,
    UnknownRawInstruction,
    /// The only warning-category kind (§7: "UselessTry (warning)").
    UselessTry,
}

impl DiagnosticKind {
    /// The fixed category for this kind; every kind but [`Self::UselessTry`]
    /// is an error (§7's table marks exactly one row as a warning).
    pub const fn category(self) -> DiagnosticCategory {
        match self {
            DiagnosticKind::UselessTry => DiagnosticCategory::Warning,
            _ => DiagnosticCategory::Error,
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticKind::UndefinedConstant => "undefined constant",
            DiagnosticKind::UndefinedIdentifier => "undefined identifier",
            DiagnosticKind::UndefinedAttribute => "undefined attribute",
            DiagnosticKind::Redefined => "already defined",
            DiagnosticKind::TypeMismatch => "type mismatch",
            DiagnosticKind::ArityMismatch => "wrong number of arguments",
            DiagnosticKind::InvalidKeywordArgument => "invalid keyword argument",
            DiagnosticKind::ReservedConstant => "reserved constant",
            DiagnosticKind::InvalidTraitRequirement => "invalid trait requirement",
            DiagnosticKind::InvalidImplementation => "invalid trait implementation",
            DiagnosticKind::InvalidReopen => "invalid reopen",
            DiagnosticKind::InvalidContext => "invalid context",
            DiagnosticKind::InvalidCast => "invalid cast",
            DiagnosticKind::InvalidDereference => "invalid dereference",
            DiagnosticKind::UnknownRawInstruction => "unknown raw instruction",
            DiagnosticKind::UselessTry => "useless try",
        };
        f.write_str(name)
    }
}

/// A single error or warning, with its source location (§4.3).
#[derive(Clone, Debug, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub location: Location,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>, location: Location) -> Self {
        Diagnostic {
            kind,
            message: message.into(),
            location,
        }
    }

    pub const fn category(&self) -> DiagnosticCategory {
        self.kind.category()
    }
}

/// The compilation-wide diagnostics sink (part of [`State`], §3.5).
///
/// [`State`]: inkoc_symbols::State
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics::default()
    }

    pub fn emit(&mut self, kind: DiagnosticKind, message: impl Into<String>, location: Location) {
        self.entries.push(Diagnostic::new(kind, message, location));
    }

    pub fn all(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries
            .iter()
            .filter(|d| d.category() == DiagnosticCategory::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries
            .iter()
            .filter(|d| d.category() == DiagnosticCategory::Warning)
    }

    /// §8: "For all well-typed programs, `Diagnostics.errors?` is false."
    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn has_warnings(&self) -> bool {
        self.warnings().next().is_some()
    }

    /// Drops every entry recorded after `len`. `ProcessDeferredMethods`
    /// (§6's supplemented pass) uses this to discard a deferred method's
    /// premature diagnostics before the retry under complete symbols.
    pub fn truncate(&mut self, len: usize) {
        self.entries.truncate(len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::{FileId, Span};

    fn loc() -> Location {
        Location::new(FileId(0), Span::new(0, 1))
    }

    #[test]
    fn useless_try_is_a_warning_everything_else_is_an_error() {
        assert_eq!(
            DiagnosticKind::UselessTry.category(),
            DiagnosticCategory::Warning
        );
        assert_eq!(
            DiagnosticKind::TypeMismatch.category(),
            DiagnosticCategory::Error
        );
    }

    #[test]
    fn has_errors_ignores_warnings() {
        let mut diags = Diagnostics::new();
        diags.emit(DiagnosticKind::UselessTry, "try never throws", loc());
        assert!(!diags.has_errors());
        assert!(diags.has_warnings());

        diags.emit(DiagnosticKind::TypeMismatch, "nope", loc());
        assert!(diags.has_errors());
    }

    /// A build driver reports diagnostics over a wire protocol by
    /// serializing them directly rather than reformatting their fields.
    #[test]
    fn a_diagnostic_round_trips_through_json() {
        let diagnostic = Diagnostic::new(DiagnosticKind::TypeMismatch, "nope", loc());
        let json = serde_json::to_string(&diagnostic).unwrap();
        assert!(json.contains("TypeMismatch"));
        assert!(json.contains("nope"));
    }
}
