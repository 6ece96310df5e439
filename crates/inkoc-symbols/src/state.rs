//! The single piece of mutable state threaded through every pass (§3.5,
//! §9 "no global mutable state other than the `State` value threaded
//! through").

use crate::scope::TypeScope;
use inkoc_common::{Config, DiagnosticKind, Diagnostics, Location};
use inkoc_types::{TypeDb, TypeId};
use tracing::debug;

/// A method body set aside mid-`DefineType` because a name it references
/// was not yet defined — retried once by `ProcessDeferredMethods` (§6's
/// supplemented pass).
///
/// `node` is the raw index of the `inkoc_ast::NodeId` the method's
/// `MethodDef` lives at; this crate does not depend on `inkoc-ast`, so the
/// pass that re-walks the body is the one that knows how to interpret it.
#[derive(Clone, Copy, Debug)]
pub struct DeferredMethod {
    pub method: TypeId,
    pub node: u32,
    pub scope: TypeScope,
    pub is_constructor: bool,
    /// `Diagnostics` length at the moment of deferral; the retry truncates
    /// back to this mark first so the premature failure does not linger
    /// alongside whatever the re-check produces.
    pub diagnostics_mark: usize,
}

#[derive(Debug)]
pub struct State {
    pub types: TypeDb,
    pub diagnostics: Diagnostics,
    pub config: Config,
    deferred_methods: Vec<DeferredMethod>,
}

impl State {
    pub fn new(config: Config) -> Self {
        let types = TypeDb::new(&config);
        State {
            types,
            diagnostics: Diagnostics::new(),
            config,
            deferred_methods: Vec::new(),
        }
    }

    /// Emits a diagnostic and returns the `Error` type, the standard
    /// error-return idiom (§9 "Diagnostics as values"): callers assign the
    /// offending expression this type and keep walking.
    pub fn emit(&mut self, kind: DiagnosticKind, message: impl Into<String>, location: Location) -> TypeId {
        let message = message.into();
        debug!(kind = %kind, %message, "diagnostic emitted");
        self.diagnostics.emit(kind, message, location);
        self.types.arena().error()
    }

    pub fn defer_method(&mut self, method: TypeId, node: u32, scope: TypeScope, is_constructor: bool) {
        self.deferred_methods.push(DeferredMethod {
            method,
            node,
            scope,
            is_constructor,
            diagnostics_mark: self.diagnostics.len(),
        });
    }

    /// Drains the worklist so `ProcessDeferredMethods` can retry each entry
    /// exactly once; entries it pushes back in (a second genuine failure)
    /// are not drained again.
    pub fn take_deferred_methods(&mut self) -> Vec<DeferredMethod> {
        std::mem::take(&mut self.deferred_methods)
    }

    pub fn has_deferred_methods(&self) -> bool {
        !self.deferred_methods.is_empty()
    }
}
