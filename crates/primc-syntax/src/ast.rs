//! Syntax node definitions.
//!
//! Every node that can be the target of a binding or a diagnostic carries a
//! [`NodeId`]. Ids are `NodeId::NONE` when a tree is built and are assigned by
//! [`crate::number_nodes`] before binding, so JSON inputs may omit them.

use bitflags::bitflags;
use primc_common::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Identity
// =============================================================================

/// Identity of a syntax node within one compilation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const NONE: NodeId = NodeId(u32::MAX);

    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }

    #[must_use]
    pub const fn is_some(self) -> bool {
        !self.is_none()
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::NONE
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            f.write_str("#none")
        } else {
            write!(f, "#{}", self.0)
        }
    }
}

bitflags! {
    /// Declaration modifiers. Type-level `readonly`/`ref` turn a struct into a
    /// readonly struct / ref struct; member-level `readonly` marks a readonly
    /// struct member.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Modifiers: u32 {
        const PUBLIC = 1 << 0;
        const PROTECTED = 1 << 1;
        const PRIVATE = 1 << 2;
        const INTERNAL = 1 << 3;
        const STATIC = 1 << 4;
        const ABSTRACT = 1 << 5;
        const SEALED = 1 << 6;
        const PARTIAL = 1 << 7;
        const READONLY = 1 << 8;
        const REF = 1 << 9;
        const EXTERN = 1 << 10;
        const VIRTUAL = 1 << 11;
        const OVERRIDE = 1 << 12;
        const UNSAFE = 1 << 13;
        const CONST = 1 << 14;
    }
}

// =============================================================================
// Types
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TypeKind {
    Class,
    Struct,
    Interface,
    Enum,
}

impl TypeKind {
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Struct => "struct",
            Self::Interface => "interface",
            Self::Enum => "enum",
        }
    }
}

/// A type as written in source.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TypeRef {
    Named(String),
    Generic { name: String, arguments: Vec<TypeRef> },
    Pointer(Box<TypeRef>),
    Array(Box<TypeRef>),
    Nullable(Box<TypeRef>),
}

impl TypeRef {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// The simple name of a named or generic type; `None` for constructed
    /// pointer/array/nullable forms.
    #[must_use]
    pub fn simple_name(&self) -> Option<&str> {
        match self {
            Self::Named(name) | Self::Generic { name, .. } => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::Generic { name, arguments } => {
                write!(f, "{name}<")?;
                for (i, arg) in arguments.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(">")
            }
            Self::Pointer(inner) => write!(f, "{inner}*"),
            Self::Array(inner) => write!(f, "{inner}[]"),
            Self::Nullable(inner) => write!(f, "{inner}?"),
        }
    }
}

/// How a parameter or argument is passed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PassingMode {
    #[default]
    Value,
    Ref,
    Out,
    In,
}

impl PassingMode {
    #[must_use]
    pub const fn is_by_ref(self) -> bool {
        !matches!(self, Self::Value)
    }

    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Value => "",
            Self::Ref => "ref",
            Self::Out => "out",
            Self::In => "in",
        }
    }
}

// =============================================================================
// Declarations
// =============================================================================

/// One declaration part of a (possibly partial) type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDeclSyntax {
    #[serde(default)]
    pub id: NodeId,
    pub name: String,
    pub kind: TypeKind,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub type_parameters: Vec<String>,
    /// `Some(vec![])` is an explicit empty list `()`.
    #[serde(default)]
    pub parameter_list: Option<Vec<ParameterSyntax>>,
    #[serde(default)]
    pub parameter_list_span: Span,
    #[serde(default)]
    pub base_list: Vec<BaseTypeSyntax>,
    #[serde(default)]
    pub members: Vec<MemberSyntax>,
    #[serde(default)]
    pub span: Span,
}

impl TypeDeclSyntax {
    #[must_use]
    pub fn new(kind: TypeKind, name: impl Into<String>) -> Self {
        Self {
            id: NodeId::NONE,
            name: name.into(),
            kind,
            modifiers: Modifiers::empty(),
            type_parameters: Vec::new(),
            parameter_list: None,
            parameter_list_span: Span::default(),
            base_list: Vec::new(),
            members: Vec::new(),
            span: Span::default(),
        }
    }

    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.modifiers.contains(Modifiers::PARTIAL)
    }

    /// Nested type declarations directly inside this part.
    pub fn nested_types(&self) -> impl Iterator<Item = &TypeDeclSyntax> {
        self.members.iter().filter_map(|member| match member {
            MemberSyntax::NestedType(decl) => Some(decl.as_ref()),
            _ => None,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterSyntax {
    #[serde(default)]
    pub id: NodeId,
    pub name: String,
    pub ty: TypeRef,
    #[serde(default)]
    pub mode: PassingMode,
    #[serde(default)]
    pub default_value: Option<Expr>,
    #[serde(default)]
    pub span: Span,
}

/// An entry of the base list; `arguments` is the `(...)` of `: Base(...)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseTypeSyntax {
    #[serde(default)]
    pub id: NodeId,
    pub ty: TypeRef,
    #[serde(default)]
    pub arguments: Option<Vec<Argument>>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Argument {
    #[serde(default)]
    pub mode: PassingMode,
    pub expr: Expr,
}

// =============================================================================
// Members
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MemberSyntax {
    Field(FieldSyntax),
    Property(PropertySyntax),
    Event(EventSyntax),
    Method(MethodSyntax),
    Constructor(ConstructorSyntax),
    Destructor(DestructorSyntax),
    NestedType(Box<TypeDeclSyntax>),
}

impl MemberSyntax {
    #[must_use]
    pub fn id(&self) -> NodeId {
        match self {
            Self::Field(f) => f.id,
            Self::Property(p) => p.id,
            Self::Event(e) => e.id,
            Self::Method(m) => m.id,
            Self::Constructor(c) => c.id,
            Self::Destructor(d) => d.id,
            Self::NestedType(t) => t.id,
        }
    }

    #[must_use]
    pub fn modifiers(&self) -> Modifiers {
        match self {
            Self::Field(f) => f.modifiers,
            Self::Property(p) => p.modifiers,
            Self::Event(e) => e.modifiers,
            Self::Method(m) => m.modifiers,
            Self::Constructor(c) => c.modifiers,
            Self::Destructor(_) => Modifiers::empty(),
            Self::NestedType(t) => t.modifiers,
        }
    }

    #[must_use]
    pub fn is_static(&self) -> bool {
        self.modifiers().contains(Modifiers::STATIC)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSyntax {
    #[serde(default)]
    pub id: NodeId,
    pub name: String,
    pub ty: TypeRef,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub initializer: Option<Expr>,
    #[serde(default)]
    pub span: Span,
}

/// Property or indexer (indexers have a non-empty `parameters` list).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySyntax {
    #[serde(default)]
    pub id: NodeId,
    pub name: String,
    pub ty: TypeRef,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub parameters: Vec<ParameterSyntax>,
    #[serde(default)]
    pub accessors: Vec<AccessorSyntax>,
    #[serde(default)]
    pub expression_body: Option<Expr>,
    #[serde(default)]
    pub initializer: Option<Expr>,
    #[serde(default)]
    pub span: Span,
}

impl PropertySyntax {
    /// An auto-property: accessors without bodies and no expression body.
    #[must_use]
    pub fn is_auto(&self) -> bool {
        self.expression_body.is_none()
            && !self.accessors.is_empty()
            && self.accessors.iter().all(|a| a.body.is_none())
    }
}

/// Event; field-like when `accessors` is empty.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSyntax {
    #[serde(default)]
    pub id: NodeId,
    pub name: String,
    pub ty: TypeRef,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub accessors: Vec<AccessorSyntax>,
    #[serde(default)]
    pub initializer: Option<Expr>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AccessorKind {
    Get,
    Set,
    Init,
    Add,
    Remove,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessorSyntax {
    #[serde(default)]
    pub id: NodeId,
    pub kind: AccessorKind,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub body: Option<Body>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodSyntax {
    #[serde(default)]
    pub id: NodeId,
    pub name: String,
    pub return_type: TypeRef,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub parameters: Vec<ParameterSyntax>,
    #[serde(default)]
    pub body: Option<Body>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InitializerKind {
    This,
    Base,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstructorInitializer {
    #[serde(default)]
    pub id: NodeId,
    pub kind: InitializerKind,
    #[serde(default)]
    pub arguments: Vec<Argument>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstructorSyntax {
    #[serde(default)]
    pub id: NodeId,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub parameters: Vec<ParameterSyntax>,
    #[serde(default)]
    pub initializer: Option<ConstructorInitializer>,
    #[serde(default)]
    pub body: Option<Body>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestructorSyntax {
    #[serde(default)]
    pub id: NodeId,
    #[serde(default)]
    pub body: Option<Body>,
    #[serde(default)]
    pub span: Span,
}

// =============================================================================
// Statements
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Body {
    Block(Block),
    Expression(Expr),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    #[serde(default)]
    pub id: NodeId,
    #[serde(default)]
    pub statements: Vec<Stmt>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stmt {
    #[serde(default)]
    pub id: NodeId,
    pub kind: StmtKind,
    #[serde(default)]
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StmtKind {
    Local {
        name: String,
        #[serde(default)]
        ty: Option<TypeRef>,
        #[serde(default)]
        initializer: Option<Expr>,
    },
    Expression(Expr),
    Return(Option<Expr>),
    Block(Block),
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        #[serde(default)]
        else_branch: Option<Box<Stmt>>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
    Lock {
        subject: Expr,
        body: Box<Stmt>,
    },
    Using {
        resource: Expr,
        body: Box<Stmt>,
    },
    Fixed {
        name: String,
        ty: TypeRef,
        initializer: Expr,
        body: Box<Stmt>,
    },
    LocalFunction {
        name: String,
        #[serde(default)]
        modifiers: Modifiers,
        #[serde(default)]
        parameters: Vec<ParameterSyntax>,
        body: Body,
    },
}

// =============================================================================
// Expressions
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expr {
    #[serde(default)]
    pub id: NodeId,
    pub kind: ExprKind,
    #[serde(default)]
    pub span: Span,
}

impl Expr {
    #[must_use]
    pub fn new(kind: ExprKind) -> Self {
        Self {
            id: NodeId::NONE,
            kind,
            span: Span::default(),
        }
    }

    /// The identifier if this expression is a bare simple name.
    #[must_use]
    pub fn as_name(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Name(name) => Some(name),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Literal {
    Int(i64),
    Bool(bool),
    String(String),
    Null,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Gt,
    And,
    Or,
}

impl BinaryOp {
    /// `&&` and `||` evaluate their right operand conditionally.
    #[must_use]
    pub const fn is_short_circuit(self) -> bool {
        matches!(self, Self::And | Self::Or)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnaryOp {
    Neg,
    Not,
    PreIncrement,
    PostIncrement,
    PreDecrement,
    PostDecrement,
}

impl UnaryOp {
    #[must_use]
    pub const fn writes_operand(self) -> bool {
        !matches!(self, Self::Neg | Self::Not)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExprKind {
    Literal(Literal),
    Name(String),
    MemberAccess {
        receiver: Box<Expr>,
        name: String,
    },
    Invocation {
        callee: Box<Expr>,
        #[serde(default)]
        arguments: Vec<Argument>,
    },
    ObjectCreation {
        ty: TypeRef,
        #[serde(default)]
        arguments: Vec<Argument>,
    },
    Assignment {
        target: Box<Expr>,
        op: AssignOp,
        value: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    AddressOf(Box<Expr>),
    Lambda {
        #[serde(default)]
        parameters: Vec<ParameterSyntax>,
        body: Box<Body>,
        #[serde(default)]
        is_static: bool,
    },
    NameOf(Box<Expr>),
    This,
    Conditional {
        condition: Box<Expr>,
        when_true: Box<Expr>,
        when_false: Box<Expr>,
    },
    Default(Option<TypeRef>),
}
