//! `InsertImplicitImports` (§6).
//!
//! Synthesizes an implicit import of the well-known bootstrap module that
//! supplies the `Trait` prototype and the top-level object prototype,
//! mirroring Inko's implicit `std::bootstrap` import. Mutates only the
//! AST's import list — no type work. A module that already explicitly
//! imports the same path is left alone, which also makes this idempotent.

use inkoc_ast::{Arena, ImportDecl, NodeId, NodeKind};
use inkoc_common::Span;

const BOOTSTRAP_MODULE: &[&str] = &["std", "bootstrap"];

#[tracing::instrument(skip_all, fields(pass = "InsertImplicitImports"))]
pub fn run(ast: &mut Arena, module_root: NodeId) {
    let NodeKind::Module { imports, .. } = &mut ast.get_mut(module_root).kind else {
        return;
    };

    let already_imported = imports
        .iter()
        .any(|import| import.module_path == BOOTSTRAP_MODULE);
    if already_imported {
        return;
    }

    imports.push(ImportDecl {
        module_path: BOOTSTRAP_MODULE.iter().map(|s| s.to_string()).collect(),
        symbol: None,
        implicit: true,
        span: Span::synthetic(),
    });
}
