//! `DefineType`, the core pass (§4.5). Dispatches on AST node kind; for
//! every node the contract is: compute a type, store it via
//! `Arena::set_type`, emit diagnostics for ill-formed constructs, and
//! return `Error` instead of aborting when one is emitted.

use inkoc_ast::{Arena, LetTarget, NodeId, NodeKind};
use inkoc_common::{DiagnosticKind, Location};
use inkoc_symbols::{ScopeArena, ScopeId, State, Symbol, SymbolKind, TirModule, TypeScope};
use inkoc_types::{
    instantiate, is_compatible, substitute, Argument, BlockKind, BlockType, Member, ObjectType, Type, TypeId,
    TypeParameterType,
};

use crate::calls::check_call;
use crate::type_nodes::{instantiate_checked, resolve_type_node};

#[tracing::instrument(skip_all, fields(pass = "DefineType", module = %module.name))]
pub fn run(ast: &mut Arena, scopes: &mut ScopeArena, module: &mut TirModule, module_root: NodeId, state: &mut State) {
    let root_scope = ScopeId(ast.scope_of(module_root).expect("SetupSymbolTables ran first"));
    let scope = TypeScope::new(module.module_type, module.module_type, root_scope);
    define_node(ast, scopes, module, state, module_root, &scope);
}

fn span_loc(module: &TirModule, ast: &Arena, node: NodeId) -> Location {
    Location::new(module.location.file, ast.span(node))
}

fn type_params_of(state: &State, object: TypeId) -> Vec<(String, TypeId)> {
    let Some(obj) = state.types.arena().get(object).as_object() else {
        return Vec::new();
    };
    obj.type_parameters
        .iter()
        .filter_map(|id| {
            state
                .types
                .arena()
                .get(*id)
                .as_type_parameter()
                .map(|p| (p.name.clone(), *id))
        })
        .collect()
}

fn define_node(
    ast: &mut Arena,
    scopes: &mut ScopeArena,
    module: &mut TirModule,
    state: &mut State,
    node: NodeId,
    scope: &TypeScope,
) -> TypeId {
    let kind = ast.kind(node).clone();
    let ty = match kind {
        NodeKind::IntegerLiteral(_) => state.types.integer(),
        NodeKind::FloatLiteral(_) => state.types.float(),
        NodeKind::StringLiteral(_) => state.types.string(),

        NodeKind::Constant { .. } | NodeKind::OptionalConstant(_) | NodeKind::SelfExpr => {
            define_constant(ast, module, state, node, scope)
        }

        NodeKind::Identifier(name) => define_identifier(ast, scopes, module, state, node, scope, &name),
        NodeKind::Attribute(name) => define_attribute(module, state, node, scope, &name, span_loc(module, ast, node)),
        NodeKind::GlobalRef(name) => define_global_ref(module, state, &name, span_loc(module, ast, node)),

        NodeKind::Call {
            receiver,
            message,
            explicit_type_arguments,
            positional_args,
            keyword_args,
        } => define_call(
            ast,
            scopes,
            module,
            state,
            node,
            scope,
            receiver,
            &message,
            &explicit_type_arguments,
            &positional_args,
            &keyword_args,
        ),

        NodeKind::BlockLiteral {
            kind,
            parameters,
            return_type,
            throw_type,
            body,
        } => define_block_literal(ast, scopes, module, state, node, scope, kind, &parameters, return_type, throw_type, &body, None),

        NodeKind::MethodDef { .. } => define_method(ast, scopes, module, state, node, scope),

        NodeKind::BlockTypeSignature { .. } => {
            let type_params = scope_type_params(state, scope);
            resolve_type_node(ast, node, module, state, &type_params)
        }

        NodeKind::Return(value) => define_return(ast, scopes, module, state, node, scope, value),
        NodeKind::Throw(value) => define_throw(ast, scopes, module, state, node, scope, value),
        NodeKind::Try {
            body,
            bang,
            else_error_binding,
            else_body,
        } => define_try(ast, scopes, module, state, node, scope, body, bang, else_error_binding, else_body),

        NodeKind::ObjectDef { .. } => define_object(ast, scopes, module, state, node, scope),
        NodeKind::TraitDef { .. } => define_trait(ast, scopes, module, state, node, scope),
        NodeKind::TraitImpl { header, body } => define_trait_impl(ast, scopes, module, state, node, scope, header, &body),

        NodeKind::Let {
            target,
            name,
            mutable,
            type_annotation,
            value,
        } => define_let(ast, scopes, module, state, node, scope, target, &name, mutable, type_annotation, value),

        NodeKind::Reassign { target, value } => define_reassign(ast, scopes, module, state, node, scope, target, value),

        NodeKind::Cast { value, target_type } => define_cast(ast, scopes, module, state, node, scope, value, target_type),

        NodeKind::Dereference(value) => define_dereference(ast, scopes, module, state, node, scope, value),

        NodeKind::RawInstruction { name, args } => define_raw_instruction(ast, scopes, module, state, node, scope, &name, &args),

        NodeKind::ArrayLiteral(items) => define_array_literal(ast, scopes, module, state, node, scope, &items),

        NodeKind::Module { body, .. } => {
            for child in body {
                define_node(ast, scopes, module, state, child, scope);
            }
            state.types.nil()
        }
    };

    ast.set_type(node, ty);
    ty
}

fn scope_type_params(state: &State, scope: &TypeScope) -> Vec<(String, TypeId)> {
    type_params_of(state, scope.self_type)
}

// ---------------------------------------------------------------------------
// Constants / identifiers / attributes / globals
// ---------------------------------------------------------------------------

fn define_constant(
    ast: &Arena,
    module: &mut TirModule,
    state: &mut State,
    node: NodeId,
    scope: &TypeScope,
) -> TypeId {
    match ast.kind(node).clone() {
        // `Self` is meaningful everywhere a `TypeScope` exists, including at
        // module scope, where it names the module's own type.
        NodeKind::SelfExpr => scope.self_type,
        NodeKind::OptionalConstant(inner) => {
            let inner_ty = define_constant(ast, module, state, inner, scope);
            state.types.arena_mut().optional_of(inner_ty)
        }
        NodeKind::Constant {
            segments,
            type_arguments,
        } => {
            let location = span_loc(module, ast, node);
            let Some((first, rest)) = segments.split_first() else {
                return state.emit(DiagnosticKind::UndefinedConstant, "empty constant", location);
            };

            if state.config.is_reserved(first) && matches!(first.as_str(), "Dynamic" | "Void" | "Never") {
                let singleton = match first.as_str() {
                    "Dynamic" => state.types.arena().dynamic(),
                    "Void" => state.types.arena().void(),
                    "Never" => state.types.arena().never(),
                    _ => unreachable!(),
                };
                return singleton;
            }

            let mut current = if let Some(symbol) = lookup_self_type_chain(state, scope.self_type, first) {
                symbol
            } else if let Some(symbol) = module.globals.lookup(first) {
                symbol.ty
            } else {
                return state.emit(
                    DiagnosticKind::UndefinedConstant,
                    format!("undefined constant '{first}'"),
                    location,
                );
            };

            for segment in rest {
                let Some(object) = state.types.arena().get(current).as_object() else {
                    return state.emit(
                        DiagnosticKind::UndefinedConstant,
                        format!("'{segment}' has no attributes"),
                        location,
                    );
                };
                let Some(member) = object.attributes.get(segment) else {
                    return state.emit(
                        DiagnosticKind::UndefinedConstant,
                        format!("undefined constant '{segment}'"),
                        location,
                    );
                };
                current = member.ty;
            }

            if type_arguments.is_empty() {
                return current;
            }

            let type_params = scope_type_params(state, scope);
            let args: Vec<_> = type_arguments
                .iter()
                .map(|arg| resolve_type_node(ast, *arg, module, state, &type_params))
                .collect();
            instantiate_checked(state, current, &args, location)
        }
        _ => unreachable!("define_constant only called on constant-shaped nodes"),
    }
}

fn lookup_self_type_chain(state: &State, self_type: TypeId, name: &str) -> Option<TypeId> {
    let object = state.types.arena().get(self_type).as_object()?;
    if let Some(member) = object.attributes.get(name) {
        return Some(member.ty);
    }
    object.methods.get(name).copied()
}

fn define_identifier(
    ast: &Arena,
    scopes: &mut ScopeArena,
    module: &mut TirModule,
    state: &mut State,
    node: NodeId,
    scope: &TypeScope,
    name: &str,
) -> TypeId {
    let location = span_loc(module, ast, node);

    if let Some(symbol) = scopes.lookup(scope.locals, name) {
        return symbol.ty;
    }
    if let Some(object) = state.types.arena().get(scope.self_type).as_object() {
        if let Some(member) = object.attributes.get(name) {
            return member.ty;
        }
        if let Some(method) = object.methods.get(name).copied() {
            return method_result_type(state, method);
        }
    }
    if let Some(object) = state.types.arena().get(module.module_type).as_object() {
        if let Some(method) = object.methods.get(name).copied() {
            return method_result_type(state, method);
        }
    }
    if let Some(symbol) = module.globals.lookup(name) {
        return symbol.ty;
    }

    state.emit(DiagnosticKind::UndefinedIdentifier, format!("undefined identifier '{name}'"), location)
}

fn method_result_type(state: &State, method: TypeId) -> TypeId {
    state
        .types
        .arena()
        .get(method)
        .as_block()
        .map(|b| b.return_type)
        .unwrap_or_else(|| state.types.arena().error())
}

fn define_attribute(
    module: &TirModule,
    state: &mut State,
    _node: NodeId,
    scope: &TypeScope,
    name: &str,
    location: Location,
) -> TypeId {
    let _ = module;
    let Some(object) = state.types.arena().get(scope.self_type).as_object() else {
        return state.emit(DiagnosticKind::UndefinedAttribute, format!("undefined attribute '@{name}'"), location);
    };
    match object.attributes.get(name) {
        Some(member) => member.ty,
        None => state.emit(DiagnosticKind::UndefinedAttribute, format!("undefined attribute '@{name}'"), location),
    }
}

fn define_global_ref(module: &TirModule, state: &mut State, name: &str, location: Location) -> TypeId {
    match module.globals.lookup(name) {
        Some(symbol) => symbol.ty,
        None => state.emit(DiagnosticKind::UndefinedIdentifier, format!("undefined global '::{name}'"), location),
    }
}

// ---------------------------------------------------------------------------
// Calls
// ---------------------------------------------------------------------------

#[allow(clippy::too_many_arguments)]
fn define_call(
    ast: &mut Arena,
    scopes: &mut ScopeArena,
    module: &mut TirModule,
    state: &mut State,
    node: NodeId,
    scope: &TypeScope,
    receiver: Option<NodeId>,
    message: &str,
    explicit_type_arguments: &[NodeId],
    positional_args: &[NodeId],
    keyword_args: &[(String, NodeId)],
) -> TypeId {
    let location = span_loc(module, ast, node);

    let receiver_ty = match receiver {
        Some(recv) => define_node(ast, scopes, module, state, recv, scope),
        None => scope.self_type,
    };
    let receiver_kind = state.types.arena().get(receiver_ty).clone();

    // Resolve the candidate method signature(s) before walking argument
    // subtrees, so a block-literal argument without its own parameter
    // annotations can take them from the expected `Block` parameter
    // (§4.5's "declared from the receiver's signature") instead of
    // defaulting to `Dynamic`.
    let (expected_method, optional_methods) = match &receiver_kind {
        Type::Optional(inner) => {
            let nil = state.types.nil();
            let inner_method = resolve_method(state, *inner, message);
            let nil_method = resolve_method(state, nil, message);
            (inner_method.or(nil_method), Some((*inner, inner_method, nil_method)))
        }
        Type::Error | Type::Dynamic => (None, None),
        _ => (resolve_method(state, receiver_ty, message), None),
    };

    // Type-check every argument's subtree regardless of receiver shape —
    // §4.5: "assign types to the arguments' subtrees" even for `Dynamic`.
    let positional: Vec<(TypeId, Location)> = positional_args
        .iter()
        .enumerate()
        .map(|(index, arg)| {
            let expected = expected_positional_type(state, expected_method, index);
            (
                define_call_argument(ast, scopes, module, state, *arg, scope, expected),
                span_loc(module, ast, *arg),
            )
        })
        .collect();
    let keyword: Vec<(String, TypeId, Location)> = keyword_args
        .iter()
        .map(|(name, arg)| {
            let expected = expected_keyword_type(state, expected_method, name);
            (
                name.clone(),
                define_call_argument(ast, scopes, module, state, *arg, scope, expected),
                span_loc(module, ast, *arg),
            )
        })
        .collect();

    if matches!(receiver_kind, Type::Error) {
        return state.types.arena().error();
    }
    if matches!(receiver_kind, Type::Dynamic) {
        return state.types.arena().dynamic();
    }

    let type_params = scope_type_params(state, scope);
    let explicit_args: Vec<TypeId> = explicit_type_arguments
        .iter()
        .map(|n| resolve_type_node(ast, *n, module, state, &type_params))
        .collect();

    if let Some((inner, method_on_inner, method_on_nil)) = optional_methods {
        return match (method_on_inner, method_on_nil) {
            (Some(inner_method), Some(nil_method)) => {
                if !is_compatible(state.types.arena(), nil_method, inner_method)
                    && !is_compatible(state.types.arena(), inner_method, nil_method)
                {
                    state.emit(DiagnosticKind::TypeMismatch, format!("'{message}' is incompatible between T and nil"), location);
                }
                // Both T and nil implement it with a compatible signature
                // (§4.5): the call returns the common, unwrapped result
                // rather than lifting it back into `Optional`.
                check_call(state, inner_method, inner, &explicit_args, &positional, &keyword, location).result_type
            }
            (Some(inner_method), None) => {
                let result = check_call(state, inner_method, inner, &explicit_args, &positional, &keyword, location);
                state.types.arena_mut().optional_of(result.result_type)
            }
            _ => state.emit(DiagnosticKind::UndefinedIdentifier, format!("undefined method '{message}'"), location),
        };
    }

    match resolve_method(state, receiver_ty, message) {
        Some(method) => check_call(state, method, receiver_ty, &explicit_args, &positional, &keyword, location).result_type,
        None => state.emit(DiagnosticKind::UndefinedIdentifier, format!("undefined method '{message}'"), location),
    }
}

fn expected_positional_type(state: &State, method: Option<TypeId>, index: usize) -> Option<TypeId> {
    let block = state.types.arena().get(method?).as_block()?;
    block.arguments.get_index(index).map(|(_, a)| a.ty)
}

fn expected_keyword_type(state: &State, method: Option<TypeId>, name: &str) -> Option<TypeId> {
    let block = state.types.arena().get(method?).as_block()?;
    block.arguments.get(name).map(|a| a.ty)
}

/// Type-checks one call argument, propagating `expected` (the corresponding
/// declared parameter's type, when the receiver's method could already be
/// resolved) into a block-literal argument's own parameter inference instead
/// of discarding it the way a bare [`define_node`] call would.
fn define_call_argument(
    ast: &mut Arena,
    scopes: &mut ScopeArena,
    module: &mut TirModule,
    state: &mut State,
    node: NodeId,
    scope: &TypeScope,
    expected: Option<TypeId>,
) -> TypeId {
    if let NodeKind::BlockLiteral {
        kind,
        parameters,
        return_type,
        throw_type,
        body,
    } = ast.kind(node).clone()
    {
        let expected_block = expected.and_then(|ty| state.types.arena().get(ty).as_block().cloned());
        let ty = define_block_literal(
            ast,
            scopes,
            module,
            state,
            node,
            scope,
            kind,
            &parameters,
            return_type,
            throw_type,
            &body,
            expected_block.as_ref(),
        );
        ast.set_type(node, ty);
        return ty;
    }
    define_node(ast, scopes, module, state, node, scope)
}

fn resolve_method(state: &State, receiver: TypeId, message: &str) -> Option<TypeId> {
    // §4.5: "Each method automatically defines a synthetic `call` method on
    // itself with the same signature" — calling `.call(...)` on a block
    // value dispatches back to the block itself.
    if message == "call" && matches!(state.types.arena().get(receiver), Type::Block(_)) {
        return Some(receiver);
    }
    match state.types.arena().get(receiver) {
        Type::Object(obj) => obj.methods.get(message).copied(),
        Type::Instance(inst) => {
            let base = state.types.arena().get(inst.base);
            match base {
                Type::Object(obj) => obj.methods.get(message).copied(),
                Type::Trait(t) => t
                    .methods
                    .get(message)
                    .or_else(|| t.required_methods.get(message))
                    .copied(),
                _ => None,
            }
        }
        Type::Trait(t) => t.methods.get(message).or_else(|| t.required_methods.get(message)).copied(),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Blocks (closures/lambdas) and methods
// ---------------------------------------------------------------------------

#[allow(clippy::too_many_arguments)]
fn define_block_literal(
    ast: &mut Arena,
    scopes: &mut ScopeArena,
    module: &mut TirModule,
    state: &mut State,
    node: NodeId,
    scope: &TypeScope,
    kind: BlockKind,
    parameters: &[inkoc_ast::Parameter],
    return_type: Option<NodeId>,
    throw_type: Option<NodeId>,
    body: &[NodeId],
    expected: Option<&BlockType>,
) -> TypeId {
    let inner_scope_id = ScopeId(ast.scope_of(node).expect("SetupSymbolTables ran first"));
    let type_params = scope_type_params(state, scope);

    // An anonymous closure passed where a lambda is expected is re-typed as
    // a lambda (§4.5); a lambda literal's own declared kind is never
    // downgraded by context.
    let effective_kind = if kind == BlockKind::Closure && expected.map(|b| b.kind) == Some(BlockKind::Lambda) {
        BlockKind::Lambda
    } else {
        kind
    };

    let mut block = BlockType::new(effective_kind, state.types.nil());
    for (index, parameter) in parameters.iter().enumerate() {
        let ty = match &parameter.type_annotation {
            Some(annotation) => resolve_type_node(ast, *annotation, module, state, &type_params),
            None => expected
                .and_then(|b| b.arguments.get_index(index).map(|(_, a)| a.ty))
                .unwrap_or_else(|| state.types.arena().dynamic()),
        };
        block.arguments.insert(
            parameter.name.clone(),
            Argument {
                name: parameter.name.clone(),
                ty,
                mutable: false,
                default: parameter.default.is_some(),
                rest: parameter.rest,
            },
        );
        let _ = scopes
            .get_mut(inner_scope_id)
            .table
            .define(parameter.name.clone(), Symbol::new(ty, false, SymbolKind::Any));
    }

    // `block_type` only needs to signal "some block encloses this point" for
    // `return`/`throw` context checks; the real signature is installed once,
    // below, after the body has been walked and the return/throw types are
    // known.
    let inner_scope = scope.nested(inner_scope_id, Some(state.types.arena().dynamic()));

    let mut last_type = state.types.nil();
    for stmt in body {
        last_type = define_node(ast, scopes, module, state, *stmt, &inner_scope);
    }

    block.return_type = match return_type {
        Some(annotation) => {
            let declared = resolve_type_node(ast, annotation, module, state, &type_params);
            let self_marker = state.types.arena().self_type();
            let declared = substitute(state.types.arena_mut(), declared, self_marker, scope.self_type);
            if !is_compatible(state.types.arena(), last_type, declared) {
                state.emit(DiagnosticKind::TypeMismatch, "block body does not match its declared return type", span_loc(module, ast, node));
            }
            declared
        }
        None => last_type,
    };
    block.throw_type = match throw_type {
        Some(annotation) => Some(resolve_type_node(ast, annotation, module, state, &type_params)),
        None => infer_throw_type(ast, state, body),
    };

    state.types.arena_mut().alloc(Type::Block(Box::new(block)))
}

/// The error type bound by `try EXPR else (e) { ... }`'s `e` — the thrown
/// value's type for a bare `throw`, or the called method's declared
/// `throw_type` for a call (§4.5's "`try`/`else`").
fn resolve_body_throw_type(ast: &Arena, state: &State, scope: &TypeScope, body: NodeId) -> TypeId {
    match ast.kind(body) {
        NodeKind::Throw(_) => ast.type_of(body).unwrap_or_else(|| state.types.arena().dynamic()),
        NodeKind::Call { receiver, message, .. } => {
            let receiver_ty = match receiver {
                Some(recv) => ast.type_of(*recv).unwrap_or(scope.self_type),
                None => scope.self_type,
            };
            resolve_method(state, receiver_ty, message)
                .and_then(|m| state.types.arena().get(m).as_block().and_then(|b| b.throw_type))
                .unwrap_or_else(|| state.types.arena().dynamic())
        }
        _ => state.types.arena().dynamic(),
    }
}

fn infer_throw_type(ast: &Arena, state: &State, body: &[NodeId]) -> Option<TypeId> {
    for stmt in body {
        match ast.kind(*stmt) {
            NodeKind::Throw(_) => return ast.type_of(*stmt).or(Some(state.types.arena().dynamic())),
            NodeKind::Try { bang: false, else_body: None, .. } => {
                return ast.type_of(*stmt);
            }
            _ => {}
        }
    }
    None
}

fn define_method(
    ast: &mut Arena,
    scopes: &mut ScopeArena,
    module: &mut TirModule,
    state: &mut State,
    node: NodeId,
    scope: &TypeScope,
) -> TypeId {
    // `DefineTypeSignatures`/`ImplementTraits` may already have shelled
    // this declaration (e.g. inside an `impl` block); reuse that shell
    // instead of allocating a second `Block` for the same method.
    if let Some(existing) = ast.type_of(node) {
        if matches!(state.types.arena().get(existing), Type::Block(_)) {
            let is_constructor = matches!(ast.kind(node), NodeKind::MethodDef { name, .. } if *name == state.config.init_message);
            check_method_body(ast, scopes, module, state, node, scope, existing, is_constructor, true);
            return existing;
        }
    }

    let NodeKind::MethodDef {
        name,
        type_parameters,
        where_bounds,
        parameters,
        return_type,
        throw_type,
        body,
        ..
    } = ast.kind(node).clone()
    else {
        unreachable!()
    };

    let mut own_type_params = scope_type_params(state, scope);
    let mut method_type_params = Vec::new();
    for decl in &type_parameters {
        let required: Vec<TypeId> = decl
            .required_traits
            .iter()
            .filter_map(|req_node| match define_constant(ast, module, state, *req_node, scope) {
                id if matches!(state.types.arena().get(id), Type::Trait(_)) => Some(id),
                _ => {
                    state.emit(DiagnosticKind::InvalidTraitRequirement, format!("'{}' is not a trait", decl.name), span_loc(module, ast, *req_node));
                    None
                }
            })
            .collect();
        let param_id = state.types.arena_mut().alloc(Type::TypeParameter(Box::new(TypeParameterType {
            name: decl.name.clone(),
            required_traits: required,
        })));
        method_type_params.push(param_id);
        own_type_params.push((decl.name.clone(), param_id));
    }

    // `where P: Trait` bounds (§4.1.4) layer onto whichever parameter `P`
    // names — the method's own fresh parameter or the enclosing object's —
    // without rewriting that parameter's own declaration.
    let mut method_bounds: indexmap::IndexMap<TypeId, Vec<TypeId>> = indexmap::IndexMap::new();
    for (param_name, required_nodes) in &where_bounds {
        let Some((_, param_id)) = own_type_params.iter().find(|(name, _)| name == param_name) else {
            state.emit(DiagnosticKind::InvalidTraitRequirement, format!("'{param_name}' does not name a type parameter in scope"), span_loc(module, ast, node));
            continue;
        };
        let param_id = *param_id;
        let required: Vec<TypeId> = required_nodes
            .iter()
            .filter_map(|req_node| match define_constant(ast, module, state, *req_node, scope) {
                id if matches!(state.types.arena().get(id), Type::Trait(_)) => Some(id),
                _ => {
                    state.emit(DiagnosticKind::InvalidTraitRequirement, format!("'{param_name}' bound is not a trait"), span_loc(module, ast, *req_node));
                    None
                }
            })
            .collect();
        method_bounds.entry(param_id).or_default().extend(required);
    }

    let return_ty = match return_type {
        Some(node) => resolve_type_node(ast, node, module, state, &own_type_params),
        None if body.is_none() => state.types.arena().dynamic(),
        None => state.types.nil(),
    };

    let mut block = BlockType::new(BlockKind::Method, return_ty);
    block.type_parameters = method_type_params;
    block.method_bounds = method_bounds;
    for parameter in &parameters {
        let ty = match &parameter.type_annotation {
            Some(annotation) => resolve_type_node(ast, *annotation, module, state, &own_type_params),
            None => state.types.arena().dynamic(),
        };
        block.arguments.insert(
            parameter.name.clone(),
            Argument {
                name: parameter.name.clone(),
                ty,
                mutable: false,
                default: parameter.default.is_some(),
                rest: parameter.rest,
            },
        );
    }
    block.throw_type = match throw_type {
        Some(node) => Some(resolve_type_node(ast, node, module, state, &own_type_params)),
        None => None,
    };

    let method_ty = state.types.arena_mut().alloc(Type::Block(Box::new(block)));
    ast.set_type(node, method_ty);

    let is_constructor = name == state.config.init_message;
    if let Some(object) = state.types.arena_mut().get_mut(scope.self_type).as_object_mut() {
        object.methods.insert(name, method_ty);
    }

    check_method_body(ast, scopes, module, state, node, scope, method_ty, is_constructor, true);
    method_ty
}

/// Type-checks a method's body. `allow_defer` is true for the main
/// `DefineType` walk and false for `ProcessDeferredMethods`'s retry — a
/// deferred method gets exactly one extra chance before its diagnostics
/// become final (§4.6).
#[allow(clippy::too_many_arguments)]
pub(crate) fn check_method_body(
    ast: &mut Arena,
    scopes: &mut ScopeArena,
    module: &mut TirModule,
    state: &mut State,
    node: NodeId,
    scope: &TypeScope,
    method_ty: TypeId,
    is_constructor: bool,
    allow_defer: bool,
) {
    let NodeKind::MethodDef {
        parameters, body, ..
    } = ast.kind(node).clone() else {
        return;
    };
    let Some(body) = body else { return };
    let Some(scope_id) = ast.scope_of(node) else { return };
    let method_scope_id = ScopeId(scope_id);

    let self_marker = state.types.arena().self_type();
    for parameter in &parameters {
        let declared_ty = state
            .types
            .arena()
            .get(method_ty)
            .as_block()
            .and_then(|b| b.arguments.get(&parameter.name))
            .map(|a| a.ty)
            .unwrap_or_else(|| state.types.arena().dynamic());
        let declared_ty = substitute(state.types.arena_mut(), declared_ty, self_marker, scope.self_type);
        let _ = scopes
            .get_mut(method_scope_id)
            .table
            .define(parameter.name.clone(), Symbol::new(declared_ty, false, SymbolKind::Any));
    }

    let mut method_scope = scope.nested(method_scope_id, Some(method_ty));
    method_scope.enclosing_method = Some(method_ty);
    method_scope.is_constructor = is_constructor;

    let mark = state.diagnostics.len();
    for stmt in &body {
        define_node(ast, scopes, module, state, *stmt, &method_scope);
    }

    if allow_defer {
        let unresolved = state.diagnostics.all()[mark..].iter().any(|d| {
            matches!(
                d.kind,
                DiagnosticKind::UndefinedConstant | DiagnosticKind::UndefinedIdentifier | DiagnosticKind::UndefinedAttribute
            )
        });
        if unresolved {
            state.diagnostics.truncate(mark);
            state.defer_method(method_ty, node.0, method_scope, is_constructor);
        }
    }
}

// ---------------------------------------------------------------------------
// Control flow
// ---------------------------------------------------------------------------

fn define_return(
    ast: &mut Arena,
    scopes: &mut ScopeArena,
    module: &mut TirModule,
    state: &mut State,
    node: NodeId,
    scope: &TypeScope,
    value: Option<NodeId>,
) -> TypeId {
    let location = span_loc(module, ast, node);
    let Some(method) = scope.enclosing_method else {
        state.emit(DiagnosticKind::InvalidContext, "'return' outside of a method", location);
        return state.types.arena().void();
    };
    let value_ty = match value {
        Some(v) => define_node(ast, scopes, module, state, v, scope),
        None => state.types.nil(),
    };
    let declared_return = state.types.arena().get(method).as_block().map(|b| b.return_type);
    if let Some(declared_return) = declared_return {
        let self_marker = state.types.arena().self_type();
        let resolved_return = substitute(state.types.arena_mut(), declared_return, self_marker, scope.self_type);
        if !is_compatible(state.types.arena(), value_ty, resolved_return) {
            state.emit(DiagnosticKind::TypeMismatch, "return value is incompatible with the method's return type", location);
        }
    }
    state.types.arena().void()
}

fn define_throw(
    ast: &mut Arena,
    scopes: &mut ScopeArena,
    module: &mut TirModule,
    state: &mut State,
    node: NodeId,
    scope: &TypeScope,
    value: NodeId,
) -> TypeId {
    let location = span_loc(module, ast, node);
    if scope.block_type.is_none() || scope.self_type == module.module_type && scope.enclosing_method.is_none() {
        state.emit(DiagnosticKind::InvalidContext, "'throw' at module top level", location);
    }
    define_node(ast, scopes, module, state, value, scope)
}

#[allow(clippy::too_many_arguments)]
fn define_try(
    ast: &mut Arena,
    scopes: &mut ScopeArena,
    module: &mut TirModule,
    state: &mut State,
    node: NodeId,
    scope: &TypeScope,
    body: NodeId,
    bang: bool,
    else_error_binding: Option<String>,
    else_body: Option<NodeId>,
) -> TypeId {
    let location = span_loc(module, ast, node);
    let body_ty = define_node(ast, scopes, module, state, body, scope);
    let throws = matches!(ast.kind(body), NodeKind::Throw(_))
        || matches!(ast.kind(body), NodeKind::Call { .. });

    match else_body {
        None => {
            if !bang && !throws {
                state.emit(DiagnosticKind::UselessTry, "'try' on an expression that never throws", location);
            }
            body_ty
        }
        Some(else_body_node) => {
            let else_scope_id = ScopeId(ast.scope_of(else_body_node).unwrap_or(scope.locals.0));
            let mut else_scope = scope.nested(ScopeId(else_scope_id.0), scope.block_type);
            else_scope.enclosing_method = scope.enclosing_method;
            if let Some(binding) = &else_error_binding {
                let error_ty = if throws {
                    resolve_body_throw_type(ast, state, scope, body)
                } else {
                    state.types.arena().dynamic()
                };
                let _ = scopes
                    .get_mut(else_scope_id)
                    .table
                    .define(binding.clone(), Symbol::new(error_ty, false, SymbolKind::Any));
            }
            let else_ty = define_node(ast, scopes, module, state, else_body_node, &else_scope);

            let nil = state.types.nil();
            if else_ty == nil && body_ty != nil {
                state.types.arena_mut().optional_of(body_ty)
            } else if is_compatible(state.types.arena(), else_ty, body_ty) || is_compatible(state.types.arena(), body_ty, else_ty) {
                body_ty
            } else {
                state.emit(DiagnosticKind::TypeMismatch, "'try'/'else' branches have incompatible types", location)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Object / trait declarations
// ---------------------------------------------------------------------------

fn define_object(
    ast: &mut Arena,
    scopes: &mut ScopeArena,
    module: &mut TirModule,
    state: &mut State,
    node: NodeId,
    scope: &TypeScope,
) -> TypeId {
    let NodeKind::ObjectDef {
        name,
        reopen,
        type_parameters,
        body,
    } = ast.kind(node).clone()
    else {
        unreachable!()
    };

    let location = span_loc(module, ast, node);
    let object_id = if reopen {
        match module.globals.lookup(&name) {
            Some(symbol) if matches!(state.types.arena().get(symbol.ty), Type::Object(_)) => symbol.ty,
            Some(_) => {
                return state.emit(DiagnosticKind::InvalidReopen, format!("'{name}' is not an object"), location);
            }
            None => {
                return state.emit(DiagnosticKind::UndefinedConstant, format!("undefined constant '{name}'"), location);
            }
        }
    } else {
        match ast.type_of(node) {
            Some(shell) => shell,
            None => {
                // DefineTypeSignatures skips reserved/duplicate names; fall
                // back to Error so the body is still walked for further
                // diagnostics instead of panicking.
                state.types.arena().error()
            }
        }
    };

    if reopen {
        let declared_arity = state
            .types
            .arena()
            .get(object_id)
            .as_object()
            .map(|o| o.type_parameters.len())
            .unwrap_or(0);
        if declared_arity != type_parameters.len() {
            state.emit(DiagnosticKind::InvalidReopen, format!("'{name}' reopened with a mismatched type-parameter list"), location);
        }
    } else {
        resolve_required_traits(ast, module, state, &type_parameters, object_id, scope);
    }

    let inner_scope = scope.nested(scope.locals, None);
    let mut object_scope = inner_scope;
    object_scope.self_type = object_id;
    object_scope.block_type = None;
    object_scope.enclosing_method = None;

    for child in body {
        define_node(ast, scopes, module, state, child, &object_scope);
    }

    object_id
}

fn resolve_required_traits(
    ast: &Arena,
    module: &mut TirModule,
    state: &mut State,
    type_parameters: &[inkoc_ast::TypeParamDecl],
    owner: TypeId,
    scope: &TypeScope,
) {
    let param_ids: Vec<TypeId> = state
        .types
        .arena()
        .get(owner)
        .as_object()
        .map(|o| o.type_parameters.clone())
        .or_else(|| state.types.arena().get(owner).as_trait().map(|t| t.type_parameters.clone()))
        .unwrap_or_default();

    for (decl, param_id) in type_parameters.iter().zip(param_ids.iter()) {
        let mut required = Vec::new();
        for req_node in &decl.required_traits {
            let ty = define_constant(ast, module, state, *req_node, scope);
            if matches!(state.types.arena().get(ty), Type::Trait(_)) {
                required.push(ty);
            } else if !matches!(state.types.arena().get(ty), Type::Error) {
                state.emit(
                    DiagnosticKind::InvalidTraitRequirement,
                    format!("'{}' is not a trait", decl.name),
                    span_loc(module, ast, *req_node),
                );
            }
        }
        if let Some(param) = state.types.arena_mut().get_mut(*param_id).as_type_parameter_mut() {
            param.required_traits = required;
        }
    }
}

fn define_trait(
    ast: &mut Arena,
    scopes: &mut ScopeArena,
    module: &mut TirModule,
    state: &mut State,
    node: NodeId,
    scope: &TypeScope,
) -> TypeId {
    let NodeKind::TraitDef {
        name,
        reopen,
        type_parameters,
        required_traits,
        body,
    } = ast.kind(node).clone()
    else {
        unreachable!()
    };
    let location = span_loc(module, ast, node);

    if reopen {
        return state.emit(DiagnosticKind::InvalidReopen, format!("trait '{name}' cannot be reopened"), location);
    }

    let trait_id = match ast.type_of(node) {
        Some(shell) => shell,
        None => state.types.arena().error(),
    };

    resolve_required_traits(ast, module, state, &type_parameters, trait_id, scope);

    let mut required: Vec<TypeId> = Vec::new();
    for req_node in &required_traits {
        let ty = define_constant(ast, module, state, *req_node, scope);
        if matches!(state.types.arena().get(ty), Type::Trait(_)) {
            required.push(ty);
        } else if !matches!(state.types.arena().get(ty), Type::Error) {
            state.emit(DiagnosticKind::InvalidTraitRequirement, format!("'{name}' requires a trait"), span_loc(module, ast, *req_node));
        }
    }
    if let Some(t) = state.types.arena_mut().get_mut(trait_id).as_trait_mut() {
        t.required_traits = required;
    }

    let mut trait_scope = scope.nested(scope.locals, None);
    trait_scope.self_type = trait_id;
    for child in body {
        let child_ty = define_node(ast, scopes, module, state, child, &trait_scope);
        if let NodeKind::MethodDef { name: method_name, body: None, .. } = ast.kind(child) {
            if let Some(t) = state.types.arena_mut().get_mut(trait_id).as_trait_mut() {
                t.required_methods.insert(method_name.clone(), child_ty);
            }
        }
    }

    trait_id
}

fn define_trait_impl(
    ast: &mut Arena,
    scopes: &mut ScopeArena,
    module: &mut TirModule,
    state: &mut State,
    _node: NodeId,
    scope: &TypeScope,
    header: inkoc_ast::TraitImplHeader,
    body: &[NodeId],
) -> TypeId {
    let object_id = module
        .globals
        .lookup(&header.object_name)
        .map(|s| s.ty)
        .unwrap_or_else(|| state.types.arena().error());

    let mut impl_scope = scope.nested(scope.locals, None);
    impl_scope.self_type = object_id;
    for child in body {
        define_node(ast, scopes, module, state, *child, &impl_scope);
    }
    object_id
}

// ---------------------------------------------------------------------------
// Bindings, casts, dereference, raw instructions, arrays
// ---------------------------------------------------------------------------

#[allow(clippy::too_many_arguments)]
fn define_let(
    ast: &mut Arena,
    scopes: &mut ScopeArena,
    module: &mut TirModule,
    state: &mut State,
    node: NodeId,
    scope: &TypeScope,
    target: LetTarget,
    name: &str,
    mutable: bool,
    type_annotation: Option<NodeId>,
    value: NodeId,
) -> TypeId {
    let location = span_loc(module, ast, node);
    let value_ty = define_node(ast, scopes, module, state, value, scope);

    let declared_ty = match type_annotation {
        Some(annotation) => {
            let type_params = scope_type_params(state, scope);
            let declared = resolve_type_node(ast, annotation, module, state, &type_params);
            let self_marker = state.types.arena().self_type();
            let declared = substitute(state.types.arena_mut(), declared, self_marker, scope.self_type);
            if !is_compatible(state.types.arena(), value_ty, declared) {
                state.emit(DiagnosticKind::TypeMismatch, format!("initializer is incompatible with the declared type of '{name}'"), location);
            }
            declared
        }
        None => value_ty,
    };

    match target {
        LetTarget::Local => {
            let result = scopes
                .get_mut(scope.locals)
                .table
                .define(name.to_string(), Symbol::new(declared_ty, mutable, SymbolKind::Any));
            if result.is_err() {
                state.emit(DiagnosticKind::Redefined, format!("'{name}' is already defined"), location);
            }
            declared_ty
        }
        LetTarget::Attribute => {
            if !scope.is_constructor {
                let error = state.emit(
                    DiagnosticKind::InvalidContext,
                    "attribute definitions are only allowed in a constructor",
                    location,
                );
                if let Some(object) = state.types.arena_mut().get_mut(scope.self_type).as_object_mut() {
                    object.attributes.insert(name.to_string(), Member { ty: error, mutable });
                }
                return error;
            }
            if let Some(object) = state.types.arena_mut().get_mut(scope.self_type).as_object_mut() {
                if object.attributes.contains_key(name) {
                    state.emit(DiagnosticKind::Redefined, format!("'@{name}' is already defined"), location);
                } else {
                    object.attributes.insert(name.to_string(), Member { ty: declared_ty, mutable });
                }
            }
            declared_ty
        }
        LetTarget::ModuleGlobal => {
            if module.globals.define(name.to_string(), Symbol::new(declared_ty, mutable, SymbolKind::Constant)).is_err() {
                state.emit(DiagnosticKind::Redefined, format!("'{name}' is already defined"), location);
            }
            declared_ty
        }
    }
}

fn define_reassign(
    ast: &mut Arena,
    scopes: &mut ScopeArena,
    module: &mut TirModule,
    state: &mut State,
    node: NodeId,
    scope: &TypeScope,
    target: NodeId,
    value: NodeId,
) -> TypeId {
    let location = span_loc(module, ast, node);
    let value_ty = define_node(ast, scopes, module, state, value, scope);

    let (existing_ty, mutable) = match ast.kind(target).clone() {
        NodeKind::Identifier(name) => match scopes.lookup(scope.locals, &name) {
            Some(symbol) => (symbol.ty, symbol.mutable),
            None => {
                return state.emit(DiagnosticKind::UndefinedIdentifier, format!("undefined identifier '{name}'"), location);
            }
        },
        NodeKind::Attribute(name) => {
            let Some(object) = state.types.arena().get(scope.self_type).as_object() else {
                return state.emit(DiagnosticKind::UndefinedAttribute, format!("undefined attribute '@{name}'"), location);
            };
            match object.attributes.get(&name) {
                Some(member) => (member.ty, member.mutable),
                None => {
                    return state.emit(DiagnosticKind::UndefinedAttribute, format!("undefined attribute '@{name}'"), location);
                }
            }
        }
        _ => return define_node(ast, scopes, module, state, target, scope),
    };

    if !mutable {
        state.emit(DiagnosticKind::InvalidContext, "cannot reassign an immutable binding", location);
    }
    if !is_compatible(state.types.arena(), value_ty, existing_ty) {
        state.emit(DiagnosticKind::TypeMismatch, "reassignment is incompatible with the binding's declared type", location);
    }
    existing_ty
}

fn define_cast(
    ast: &mut Arena,
    scopes: &mut ScopeArena,
    module: &mut TirModule,
    state: &mut State,
    node: NodeId,
    scope: &TypeScope,
    value: NodeId,
    target_type: NodeId,
) -> TypeId {
    let location = span_loc(module, ast, node);
    let value_ty = define_node(ast, scopes, module, state, value, scope);
    let type_params = scope_type_params(state, scope);
    let target_ty = resolve_type_node(ast, target_type, module, state, &type_params);
    let self_marker = state.types.arena().self_type();
    let target_ty = substitute(state.types.arena_mut(), target_ty, self_marker, scope.self_type);

    if !is_compatible(state.types.arena(), value_ty, target_ty) && !is_compatible(state.types.arena(), target_ty, value_ty) {
        state.emit(DiagnosticKind::InvalidCast, "incompatible cast", location);
    }
    target_ty
}

fn define_dereference(
    ast: &mut Arena,
    scopes: &mut ScopeArena,
    module: &mut TirModule,
    state: &mut State,
    node: NodeId,
    scope: &TypeScope,
    value: NodeId,
) -> TypeId {
    let location = span_loc(module, ast, node);
    let value_ty = define_node(ast, scopes, module, state, value, scope);
    match state.types.arena().get(value_ty).clone() {
        Type::Optional(inner) => inner,
        _ => {
            state.emit(DiagnosticKind::InvalidDereference, "dereference of a non-optional value", location);
            value_ty
        }
    }
}

fn define_raw_instruction(
    ast: &mut Arena,
    scopes: &mut ScopeArena,
    module: &mut TirModule,
    state: &mut State,
    node: NodeId,
    scope: &TypeScope,
    name: &str,
    args: &[NodeId],
) -> TypeId {
    let location = span_loc(module, ast, node);
    let arg_types: Vec<TypeId> = args
        .iter()
        .map(|arg| define_node(ast, scopes, module, state, *arg, scope))
        .collect();

    match name {
        "get_true" | "get_false" => state.types.boolean(),
        "get_toplevel" => state.types.top_level(),
        "set_prototype" => arg_types.get(1).copied().unwrap_or_else(|| state.types.arena().error()),
        "set_attribute" => arg_types.get(2).copied().unwrap_or_else(|| state.types.arena().error()),
        "set_attribute_to_object" => {
            let mut object = ObjectType::new("");
            object.prototype = Some(state.types.top_level());
            state.types.arena_mut().alloc(Type::Object(Box::new(object)))
        }
        "get_attribute" => arg_types.get(1).copied().map(|_| state.types.arena().dynamic()).unwrap_or_else(|| state.types.arena().error()),
        "set_object" => {
            let prototype = arg_types.first().copied();
            let mut object = ObjectType::new("");
            object.prototype = prototype.or(Some(state.types.top_level()));
            state.types.arena_mut().alloc(Type::Object(Box::new(object)))
        }
        "array_at" | "array_remove" => {
            let element = array_element_type(state, arg_types.first().copied());
            state.types.arena_mut().optional_of(element)
        }
        "array_set" => arg_types.get(2).copied().unwrap_or_else(|| state.types.arena().error()),
        _ => state.emit(DiagnosticKind::UnknownRawInstruction, format!("unknown raw instruction '_INKOC.{name}'"), location),
    }
}

fn array_element_type(state: &State, array_ty: Option<TypeId>) -> TypeId {
    let Some(array_ty) = array_ty else { return state.types.arena().dynamic() };
    match state.types.arena().get(array_ty) {
        Type::Instance(inst) => inst.bindings.values().next().copied().unwrap_or_else(|| state.types.arena().dynamic()),
        _ => state.types.arena().dynamic(),
    }
}

fn define_array_literal(
    ast: &mut Arena,
    scopes: &mut ScopeArena,
    module: &mut TirModule,
    state: &mut State,
    _node: NodeId,
    scope: &TypeScope,
    items: &[NodeId],
) -> TypeId {
    let element_types: Vec<TypeId> = items
        .iter()
        .map(|item| define_node(ast, scopes, module, state, *item, scope))
        .collect();

    let array = state.types.array();
    let Some(first) = element_types.first().copied() else {
        return array;
    };
    let mut unified = first;
    for other in &element_types[1..] {
        if !is_compatible(state.types.arena(), *other, unified) {
            unified = state.types.arena().dynamic();
            break;
        }
    }
    instantiate(state.types.arena_mut(), array, &[unified])
}
