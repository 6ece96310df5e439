//! End-to-end scenarios driven through `run_pipeline`, one per behavior
//! called out as a concrete example rather than a "for all" property (those
//! live in `inkoc-types`'s own test suite, next to the rules they exercise).

use inkoc_ast::{
    Arena, ImportDecl, LetTarget, NodeKind, Parameter, TraitImplHeader, TypeParamDecl,
};
use inkoc_common::{Config, FileId, Location, Span};
use inkoc_passes::passes::implement_traits;
use inkoc_passes::run_pipeline;
use inkoc_symbols::{ModuleRegistry, State, Symbol, SymbolKind, TirModule};
use inkoc_types::{BlockKind, BlockType, ObjectType, TraitType, Type};

fn fresh_module(state: &State, name: &str) -> TirModule {
    let error = state.types.arena().error();
    TirModule::new(name, error, error, Location::new(FileId(0), Span::new(0, 0)))
}

fn constant(ast: &mut Arena, name: &str) -> inkoc_ast::NodeId {
    ast.push(
        NodeKind::Constant {
            segments: vec![name.to_string()],
            type_arguments: Vec::new(),
        },
        Span::new(0, name.len() as u32),
    )
}

/// An integer literal is assigned `Integer` and the module runs clean.
#[test]
fn s1_integer_literal_is_typed_integer() {
    let mut state = State::new(Config::default());
    let mut module = fresh_module(&state, "main");
    let registry = ModuleRegistry::new();
    let mut ast = Arena::new();

    let literal = ast.push(NodeKind::IntegerLiteral(10), Span::new(0, 2));
    let root = ast.push(
        NodeKind::Module {
            imports: Vec::<ImportDecl>::new(),
            body: vec![literal],
        },
        Span::new(0, 2),
    );

    run_pipeline(&mut ast, root, &mut module, &registry, &mut state);

    assert!(!state.diagnostics.has_errors());
    assert_eq!(ast.type_of(literal), Some(state.types.integer()));
}

/// Calling a generic method with a concrete argument binds its type
/// parameter from that argument and substitutes it into the result,
/// without mutating the method's own declaration.
#[test]
fn s2_generic_method_infers_its_result_from_the_argument() {
    let mut state = State::new(Config::default());
    let mut module = fresh_module(&state, "main");
    let registry = ModuleRegistry::new();
    let mut ast = Arena::new();

    let param_t = constant(&mut ast, "T");
    let return_t = constant(&mut ast, "T");
    let identity = ast.push(
        NodeKind::MethodDef {
            name: "identity".into(),
            is_static: false,
            type_parameters: Vec::new(),
            where_bounds: Vec::new(),
            parameters: vec![Parameter {
                name: "value".into(),
                type_annotation: Some(param_t),
                default: None,
                rest: false,
                span: Span::new(0, 1),
            }],
            return_type: Some(return_t),
            throw_type: None,
            body: Some(Vec::new()),
        },
        Span::new(0, 1),
    );
    let box_def = ast.push(
        NodeKind::ObjectDef {
            name: "Box".into(),
            reopen: false,
            type_parameters: vec![TypeParamDecl {
                name: "T".into(),
                required_traits: Vec::new(),
                span: Span::new(0, 1),
            }],
            body: vec![identity],
        },
        Span::new(0, 1),
    );

    let receiver = constant(&mut ast, "Box");
    let argument = ast.push(NodeKind::IntegerLiteral(7), Span::new(0, 1));
    let call = ast.push(
        NodeKind::Call {
            receiver: Some(receiver),
            message: "identity".into(),
            explicit_type_arguments: Vec::new(),
            positional_args: vec![argument],
            keyword_args: Vec::new(),
        },
        Span::new(0, 1),
    );
    let root = ast.push(
        NodeKind::Module {
            imports: Vec::<ImportDecl>::new(),
            body: vec![box_def, call],
        },
        Span::new(0, 1),
    );

    run_pipeline(&mut ast, root, &mut module, &registry, &mut state);

    assert!(!state.diagnostics.has_errors());
    assert_eq!(ast.type_of(call), Some(state.types.integer()));

    // The declaration itself never picked up a binding for `T`.
    let box_ty = module.globals.lookup("Box").unwrap().ty;
    let object = state.types.arena().get(box_ty).as_object().unwrap();
    let identity_ty = *object.methods.get("identity").unwrap();
    let block = state.types.arena().get(identity_ty).as_block().unwrap();
    assert!(matches!(
        state.types.arena().get(block.arguments.get("value").unwrap().ty),
        Type::TypeParameter(_)
    ));
}

/// `let @x = ...` outside a constructor is rejected: the expression's type
/// is `Error`, exactly one diagnostic is emitted, and the attribute is still
/// recorded (as `Error`) rather than left entirely undefined.
#[test]
fn s3_attribute_definition_outside_constructor_is_an_error() {
    let mut state = State::new(Config::default());
    let mut module = fresh_module(&state, "main");
    let registry = ModuleRegistry::new();
    let mut ast = Arena::new();

    let value = ast.push(NodeKind::IntegerLiteral(10), Span::new(0, 2));
    let let_node = ast.push(
        NodeKind::Let {
            target: LetTarget::Attribute,
            name: "x".into(),
            mutable: false,
            type_annotation: None,
            value,
        },
        Span::new(0, 2),
    );
    let root = ast.push(
        NodeKind::Module {
            imports: Vec::<ImportDecl>::new(),
            body: vec![let_node],
        },
        Span::new(0, 2),
    );

    run_pipeline(&mut ast, root, &mut module, &registry, &mut state);

    assert_eq!(ast.type_of(let_node), Some(state.types.arena().error()));
    let errors: Vec<_> = state.diagnostics.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, inkoc_common::DiagnosticKind::InvalidContext);

    let module_object = state.types.arena().get(module.module_type).as_object().unwrap();
    let attribute = module_object.attributes.get("x").unwrap();
    assert!(matches!(state.types.arena().get(attribute.ty), Type::Error));
}

/// Sending a message through an optional receiver lifts the result into
/// `Optional`, rather than requiring the caller to dereference first.
#[test]
fn s4_message_dispatch_through_an_optional_receiver_lifts_the_result() {
    let mut state = State::new(Config::default());
    let mut module = fresh_module(&state, "main");
    let registry = ModuleRegistry::new();
    let mut ast = Arena::new();

    let hello = ast.push(
        NodeKind::MethodDef {
            name: "hello".into(),
            is_static: false,
            type_parameters: Vec::new(),
            where_bounds: Vec::new(),
            parameters: Vec::new(),
            return_type: None,
            throw_type: None,
            body: Some(Vec::new()),
        },
        Span::new(0, 1),
    );
    let greeter = ast.push(
        NodeKind::ObjectDef {
            name: "Greeter".into(),
            reopen: false,
            type_parameters: Vec::new(),
            body: vec![hello],
        },
        Span::new(0, 1),
    );

    let optional_greeter = {
        let greeter_ref = constant(&mut ast, "Greeter");
        ast.push(NodeKind::OptionalConstant(greeter_ref), Span::new(0, 1))
    };
    let dynamic_value = constant(&mut ast, "Dynamic");
    let let_g = ast.push(
        NodeKind::Let {
            target: LetTarget::Local,
            name: "g".into(),
            mutable: false,
            type_annotation: Some(optional_greeter),
            value: dynamic_value,
        },
        Span::new(0, 1),
    );

    let receiver = ast.push(NodeKind::Identifier("g".into()), Span::new(0, 1));
    let call = ast.push(
        NodeKind::Call {
            receiver: Some(receiver),
            message: "hello".into(),
            explicit_type_arguments: Vec::new(),
            positional_args: Vec::new(),
            keyword_args: Vec::new(),
        },
        Span::new(0, 1),
    );
    let root = ast.push(
        NodeKind::Module {
            imports: Vec::<ImportDecl>::new(),
            body: vec![greeter, let_g, call],
        },
        Span::new(0, 1),
    );

    run_pipeline(&mut ast, root, &mut module, &registry, &mut state);

    assert!(!state.diagnostics.has_errors());
    let result = ast.type_of(call).unwrap();
    match state.types.arena().get(result) {
        Type::Optional(inner) => assert_eq!(*inner, state.types.nil()),
        other => panic!("expected an Optional, got {other:?}"),
    }
}

/// Calling a generic method without binding every type parameter leaves the
/// unbound parameter resolving to itself, instead of erroring or defaulting
/// to `Dynamic`.
#[test]
fn s5_uninstantiated_generic_parameter_does_not_bind() {
    let mut state = State::new(Config::default());
    let mut module = fresh_module(&state, "main");
    let registry = ModuleRegistry::new();
    let mut ast = Arena::new();

    let return_u = constant(&mut ast, "U");
    let empty_method = ast.push(
        NodeKind::MethodDef {
            name: "empty".into(),
            is_static: false,
            type_parameters: vec![TypeParamDecl {
                name: "U".into(),
                required_traits: Vec::new(),
                span: Span::new(0, 1),
            }],
            where_bounds: Vec::new(),
            parameters: Vec::new(),
            return_type: Some(return_u),
            throw_type: None,
            body: Some(Vec::new()),
        },
        Span::new(0, 1),
    );
    let box2 = ast.push(
        NodeKind::ObjectDef {
            name: "Box2".into(),
            reopen: false,
            type_parameters: Vec::new(),
            body: vec![empty_method],
        },
        Span::new(0, 1),
    );

    let receiver = constant(&mut ast, "Box2");
    let call = ast.push(
        NodeKind::Call {
            receiver: Some(receiver),
            message: "empty".into(),
            explicit_type_arguments: Vec::new(),
            positional_args: Vec::new(),
            keyword_args: Vec::new(),
        },
        Span::new(0, 1),
    );
    let root = ast.push(
        NodeKind::Module {
            imports: Vec::<ImportDecl>::new(),
            body: vec![box2, call],
        },
        Span::new(0, 1),
    );

    run_pipeline(&mut ast, root, &mut module, &registry, &mut state);

    assert!(!state.diagnostics.has_errors());
    let box2_ty = module.globals.lookup("Box2").unwrap().ty;
    let object = state.types.arena().get(box2_ty).as_object().unwrap();
    let empty_ty = *object.methods.get("empty").unwrap();
    let declared_u = state.types.arena().get(empty_ty).as_block().unwrap().type_parameters[0];

    assert_eq!(ast.type_of(call), Some(declared_u));
    assert!(matches!(state.types.arena().get(declared_u), Type::TypeParameter(_)));
}

/// `try BODY else nil` lifts a non-nil body type into `Optional`, instead of
/// unifying it with `nil` directly.
#[test]
fn s6_try_else_nil_lifts_the_body_type_to_optional() {
    let mut state = State::new(Config::default());
    let mut module = fresh_module(&state, "main");
    let registry = ModuleRegistry::new();
    let mut ast = Arena::new();

    // `DefineThisModuleType` only runs inside `run_pipeline`, which replaces
    // `module.module_type`; the "Nil" global is seeded directly since no
    // surface syntax names the built-in `Nil` prototype by that identifier.
    let nil_ty = state.types.nil();
    let _ = module
        .globals
        .define("Nil", Symbol::new(nil_ty, false, SymbolKind::Constant));

    let body = ast.push(NodeKind::IntegerLiteral(42), Span::new(0, 2));
    let else_body = constant(&mut ast, "Nil");
    let try_node = ast.push(
        NodeKind::Try {
            body,
            bang: false,
            else_error_binding: None,
            else_body: Some(else_body),
        },
        Span::new(0, 2),
    );
    let root = ast.push(
        NodeKind::Module {
            imports: Vec::<ImportDecl>::new(),
            body: vec![try_node],
        },
        Span::new(0, 2),
    );

    run_pipeline(&mut ast, root, &mut module, &registry, &mut state);

    assert!(!state.diagnostics.has_errors());
    let result = ast.type_of(try_node).unwrap();
    match state.types.arena().get(result) {
        Type::Optional(inner) => assert_eq!(*inner, state.types.integer()),
        other => panic!("expected an Optional, got {other:?}"),
    }
}

/// An `impl Trait for Object` that leaves a required method unimplemented
/// is rejected with `InvalidImplementation`, and the object is left without
/// the implementation recorded.
#[test]
fn s7_trait_implementation_missing_a_required_method_is_rejected() {
    let mut state = State::new(Config::default());
    let mut module = fresh_module(&state, "main");

    let mut greet = TraitType::new("Greet");
    let required_sig = state
        .types
        .arena_mut()
        .alloc(Type::Block(Box::new(BlockType::new(BlockKind::Method, state.types.nil()))));
    greet.required_methods.insert("hello".into(), required_sig);
    let trait_id = state.types.arena_mut().alloc(Type::Trait(Box::new(greet)));
    let _ = module
        .globals
        .define("Greet", Symbol::new(trait_id, false, SymbolKind::Constant));

    let object_id = state
        .types
        .arena_mut()
        .alloc(Type::Object(Box::new(ObjectType::new("Rock"))));
    let _ = module
        .globals
        .define("Rock", Symbol::new(object_id, false, SymbolKind::Constant));

    let mut ast = Arena::new();
    let impl_node = ast.push(
        NodeKind::TraitImpl {
            header: TraitImplHeader {
                trait_name: "Greet".into(),
                trait_type_arguments: Vec::new(),
                object_name: "Rock".into(),
                object_type_arguments: Vec::new(),
            },
            body: Vec::new(),
        },
        Span::new(0, 1),
    );
    let root = ast.push(
        NodeKind::Module {
            imports: Vec::<ImportDecl>::new(),
            body: vec![impl_node],
        },
        Span::new(0, 1),
    );

    implement_traits::run(&mut ast, root, &mut module, &mut state);

    let errors: Vec<_> = state.diagnostics.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, inkoc_common::DiagnosticKind::InvalidImplementation);

    let object = state.types.arena().get(object_id).as_object().unwrap();
    assert!(!object.implemented_traits.contains_key(&trait_id));
}
