//! Node kinds, one per construct named in §4.5.

use inkoc_common::Span;
pub use inkoc_types::BlockKind;
use smallvec::SmallVec;

/// Stable index of a node within its [`Arena`](crate::arena::Arena).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Which binding space a `let` introduces a name into (§4.5 "Variable
/// definitions").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LetTarget {
    /// `let x`, `let mut x` — a local in the nearest scope-bearing table.
    Local,
    /// `let @x` — an attribute on the current `self_type`; valid only
    /// inside a constructor method.
    Attribute,
    /// `let X` — a module-level global, name starting with a capital letter.
    ModuleGlobal,
}

/// A declared method/closure/lambda parameter.
#[derive(Clone, Debug)]
pub struct Parameter {
    pub name: String,
    pub type_annotation: Option<NodeId>,
    pub default: Option<NodeId>,
    pub rest: bool,
    pub span: Span,
}

/// A declared type parameter, with its required-trait list and any
/// method-local `where` bound layered on top later (§4.1.4).
#[derive(Clone, Debug)]
pub struct TypeParamDecl {
    pub name: String,
    /// Constant-reference nodes naming the required traits.
    pub required_traits: Vec<NodeId>,
    pub span: Span,
}

/// The `impl Trait[Args] for Object[Args] { ... }` header.
#[derive(Clone, Debug)]
pub struct TraitImplHeader {
    pub trait_name: String,
    pub trait_type_arguments: Vec<NodeId>,
    pub object_name: String,
    pub object_type_arguments: Vec<NodeId>,
}

/// All AST node shapes the passes dispatch on (§4.5).
#[derive(Clone, Debug)]
pub enum NodeKind {
    // -- Literals --------------------------------------------------------
    IntegerLiteral(i64),
    FloatLiteral(f64),
    StringLiteral(String),

    // -- Constants, identifiers, attributes, globals ----------------------
    /// `A`, `A::B::C`, optionally `A!(T, U)` for the last segment.
    Constant {
        segments: Vec<String>,
        type_arguments: Vec<NodeId>,
    },
    /// `?A` — wraps another constant-like node.
    OptionalConstant(NodeId),
    SelfExpr,
    Identifier(String),
    /// `@x`
    Attribute(String),
    /// `::name`
    GlobalRef(String),

    // -- Calls -------------------------------------------------------------
    Call {
        receiver: Option<NodeId>,
        message: String,
        explicit_type_arguments: Vec<NodeId>,
        positional_args: Vec<NodeId>,
        keyword_args: Vec<(String, NodeId)>,
    },

    // -- Blocks --------------------------------------------------------------
    BlockLiteral {
        kind: BlockKind,
        parameters: Vec<Parameter>,
        return_type: Option<NodeId>,
        throw_type: Option<NodeId>,
        body: Vec<NodeId>,
    },
    /// A method definition (`def`), including trait required methods
    /// (`body` is `None`) and static methods (`is_static`).
    MethodDef {
        name: String,
        is_static: bool,
        type_parameters: Vec<TypeParamDecl>,
        where_bounds: Vec<(String, Vec<NodeId>)>,
        parameters: Vec<Parameter>,
        return_type: Option<NodeId>,
        throw_type: Option<NodeId>,
        body: Option<Vec<NodeId>>,
    },
    /// A standalone block-type signature used in type position, e.g.
    /// `do (T) !! E -> R` or `?do (T) -> R`.
    BlockTypeSignature {
        kind: BlockKind,
        optional: bool,
        parameter_types: Vec<NodeId>,
        throw_type: Option<NodeId>,
        return_type: Option<NodeId>,
    },

    // -- Control flow --------------------------------------------------------
    Return(Option<NodeId>),
    Throw(NodeId),
    Try {
        body: NodeId,
        /// `try!`: never warns, never contributes to the enclosing throw type.
        bang: bool,
        /// `else (err) { ... }`
        else_error_binding: Option<String>,
        else_body: Option<NodeId>,
    },

    // -- Declarations --------------------------------------------------------
    ObjectDef {
        name: String,
        reopen: bool,
        type_parameters: Vec<TypeParamDecl>,
        body: Vec<NodeId>,
    },
    TraitDef {
        name: String,
        reopen: bool,
        type_parameters: Vec<TypeParamDecl>,
        required_traits: Vec<NodeId>,
        body: Vec<NodeId>,
    },
    TraitImpl {
        header: TraitImplHeader,
        body: Vec<NodeId>,
    },

    // -- Bindings --------------------------------------------------------------
    Let {
        target: LetTarget,
        name: String,
        mutable: bool,
        type_annotation: Option<NodeId>,
        value: NodeId,
    },
    Reassign {
        target: NodeId,
        value: NodeId,
    },

    // -- Misc expressions --------------------------------------------------------
    Cast {
        value: NodeId,
        target_type: NodeId,
    },
    Dereference(NodeId),
    RawInstruction {
        name: String,
        args: SmallVec<[NodeId; 4]>,
    },
    ArrayLiteral(Vec<NodeId>),

    // -- Module root --------------------------------------------------------
    Module {
        imports: Vec<ImportDecl>,
        body: Vec<NodeId>,
    },
}

/// An explicit `import a::b::(C)` declaration; implicit imports are
/// synthesized onto this list by the `InsertImplicitImports` pass.
#[derive(Clone, Debug)]
pub struct ImportDecl {
    pub module_path: Vec<String>,
    pub symbol: Option<String>,
    pub implicit: bool,
    pub span: Span,
}

/// A node: its shape plus its source span. The resolved [`TypeId`] lives in
/// the parallel slot the [`Arena`](crate::arena::Arena) owns, not here,
/// since not every node kind produces a type (e.g. `Parameter` is not a
/// node at all, and `Module` itself never does).
///
/// [`TypeId`]: inkoc_types::TypeId
#[derive(Clone, Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
}
