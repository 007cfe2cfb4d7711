//! Terse tree construction.
//!
//! Trees built here carry `NodeId::NONE` and empty spans; the binder numbers
//! them when a compilation is created.
//!
//! ```
//! use primc_syntax::factory::*;
//!
//! let point = class_decl("Point")
//!     .with_params(vec![param("X", "int"), param("Y", "int")])
//!     .with_member(expr_property("Sum", "int", add(name("X"), name("Y"))));
//! assert_eq!(point.parameter_list.as_ref().map(Vec::len), Some(2));
//! ```

use crate::ast::*;
use primc_common::Span;

// =============================================================================
// Types and declarations
// =============================================================================

#[must_use]
pub fn ty(name: &str) -> TypeRef {
    TypeRef::named(name)
}

#[must_use]
pub fn generic(name: &str, arguments: Vec<TypeRef>) -> TypeRef {
    TypeRef::Generic {
        name: name.to_string(),
        arguments,
    }
}

#[must_use]
pub fn pointer(inner: TypeRef) -> TypeRef {
    TypeRef::Pointer(Box::new(inner))
}

#[must_use]
pub fn array(inner: TypeRef) -> TypeRef {
    TypeRef::Array(Box::new(inner))
}

#[must_use]
pub fn class_decl(name: &str) -> TypeDeclSyntax {
    TypeDeclSyntax::new(TypeKind::Class, name)
}

#[must_use]
pub fn struct_decl(name: &str) -> TypeDeclSyntax {
    TypeDeclSyntax::new(TypeKind::Struct, name)
}

#[must_use]
pub fn interface_decl(name: &str) -> TypeDeclSyntax {
    TypeDeclSyntax::new(TypeKind::Interface, name)
}

#[must_use]
pub fn enum_decl(name: &str) -> TypeDeclSyntax {
    TypeDeclSyntax::new(TypeKind::Enum, name)
}

impl TypeDeclSyntax {
    /// Attach a primary parameter list (`vec![]` is the explicit `()`).
    #[must_use]
    pub fn with_params(mut self, params: Vec<ParameterSyntax>) -> Self {
        self.parameter_list = Some(params);
        self
    }

    #[must_use]
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers |= modifiers;
        self
    }

    #[must_use]
    pub fn partial(self) -> Self {
        self.with_modifiers(Modifiers::PARTIAL)
    }

    #[must_use]
    pub fn readonly(self) -> Self {
        self.with_modifiers(Modifiers::READONLY)
    }

    #[must_use]
    pub fn ref_struct(self) -> Self {
        self.with_modifiers(Modifiers::REF)
    }

    #[must_use]
    pub fn abstract_(self) -> Self {
        self.with_modifiers(Modifiers::ABSTRACT)
    }

    #[must_use]
    pub fn static_(self) -> Self {
        self.with_modifiers(Modifiers::STATIC)
    }

    #[must_use]
    pub fn with_base(mut self, base: BaseTypeSyntax) -> Self {
        self.base_list.push(base);
        self
    }

    #[must_use]
    pub fn with_type_parameters(mut self, names: &[&str]) -> Self {
        self.type_parameters = names.iter().map(|n| (*n).to_string()).collect();
        self
    }

    #[must_use]
    pub fn with_member(mut self, member: impl Into<MemberSyntax>) -> Self {
        self.members.push(member.into());
        self
    }

    #[must_use]
    pub fn with_members(mut self, members: Vec<MemberSyntax>) -> Self {
        self.members.extend(members);
        self
    }

    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

fn make_param(name: &str, type_name: &str, mode: PassingMode) -> ParameterSyntax {
    ParameterSyntax {
        id: NodeId::NONE,
        name: name.to_string(),
        ty: ty(type_name),
        mode,
        default_value: None,
        span: Span::default(),
    }
}

#[must_use]
pub fn param(name: &str, type_name: &str) -> ParameterSyntax {
    make_param(name, type_name, PassingMode::Value)
}

#[must_use]
pub fn ref_param(name: &str, type_name: &str) -> ParameterSyntax {
    make_param(name, type_name, PassingMode::Ref)
}

#[must_use]
pub fn out_param(name: &str, type_name: &str) -> ParameterSyntax {
    make_param(name, type_name, PassingMode::Out)
}

#[must_use]
pub fn in_param(name: &str, type_name: &str) -> ParameterSyntax {
    make_param(name, type_name, PassingMode::In)
}

impl ParameterSyntax {
    #[must_use]
    pub fn with_default(mut self, value: Expr) -> Self {
        self.default_value = Some(value);
        self
    }

    #[must_use]
    pub fn with_type(mut self, ty: TypeRef) -> Self {
        self.ty = ty;
        self
    }
}

/// `: Name` without an argument list.
#[must_use]
pub fn base(type_name: &str) -> BaseTypeSyntax {
    BaseTypeSyntax {
        id: NodeId::NONE,
        ty: ty(type_name),
        arguments: None,
        span: Span::default(),
    }
}

/// `: Name(args...)`.
#[must_use]
pub fn base_with_args(type_name: &str, arguments: Vec<Argument>) -> BaseTypeSyntax {
    BaseTypeSyntax {
        arguments: Some(arguments),
        ..base(type_name)
    }
}

// =============================================================================
// Members
// =============================================================================

#[must_use]
pub fn field(name: &str, type_name: &str) -> FieldSyntax {
    FieldSyntax {
        id: NodeId::NONE,
        name: name.to_string(),
        ty: ty(type_name),
        modifiers: Modifiers::empty(),
        initializer: None,
        span: Span::default(),
    }
}

impl FieldSyntax {
    #[must_use]
    pub fn with_init(mut self, value: Expr) -> Self {
        self.initializer = Some(value);
        self
    }

    #[must_use]
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers |= modifiers;
        self
    }

    #[must_use]
    pub fn with_type(mut self, ty: TypeRef) -> Self {
        self.ty = ty;
        self
    }

    #[must_use]
    pub fn static_(self) -> Self {
        self.with_modifiers(Modifiers::STATIC)
    }
}

#[must_use]
pub fn accessor(kind: AccessorKind, body: Option<Body>) -> AccessorSyntax {
    AccessorSyntax {
        id: NodeId::NONE,
        kind,
        modifiers: Modifiers::empty(),
        body,
        span: Span::default(),
    }
}

impl AccessorSyntax {
    #[must_use]
    pub fn readonly(mut self) -> Self {
        self.modifiers |= Modifiers::READONLY;
        self
    }
}

/// `T Name { get; set; }` or any other body-less accessor combination.
#[must_use]
pub fn auto_property(name: &str, type_name: &str, kinds: &[AccessorKind]) -> PropertySyntax {
    property(
        name,
        type_name,
        kinds.iter().map(|kind| accessor(*kind, None)).collect(),
    )
}

#[must_use]
pub fn property(name: &str, type_name: &str, accessors: Vec<AccessorSyntax>) -> PropertySyntax {
    PropertySyntax {
        id: NodeId::NONE,
        name: name.to_string(),
        ty: ty(type_name),
        modifiers: Modifiers::empty(),
        parameters: Vec::new(),
        accessors,
        expression_body: None,
        initializer: None,
        span: Span::default(),
    }
}

/// `T Name => expr;`
#[must_use]
pub fn expr_property(name: &str, type_name: &str, body: Expr) -> PropertySyntax {
    PropertySyntax {
        expression_body: Some(body),
        ..property(name, type_name, Vec::new())
    }
}

impl PropertySyntax {
    #[must_use]
    pub fn with_init(mut self, value: Expr) -> Self {
        self.initializer = Some(value);
        self
    }

    #[must_use]
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers |= modifiers;
        self
    }

    #[must_use]
    pub fn static_(self) -> Self {
        self.with_modifiers(Modifiers::STATIC)
    }

    /// Turn the property into an indexer `this[params]`.
    #[must_use]
    pub fn with_index_params(mut self, params: Vec<ParameterSyntax>) -> Self {
        self.parameters = params;
        self
    }
}

/// Field-like event.
#[must_use]
pub fn event(name: &str, type_name: &str) -> EventSyntax {
    EventSyntax {
        id: NodeId::NONE,
        name: name.to_string(),
        ty: ty(type_name),
        modifiers: Modifiers::empty(),
        accessors: Vec::new(),
        initializer: None,
        span: Span::default(),
    }
}

impl EventSyntax {
    #[must_use]
    pub fn with_accessors(mut self, accessors: Vec<AccessorSyntax>) -> Self {
        self.accessors = accessors;
        self
    }

    #[must_use]
    pub fn with_init(mut self, value: Expr) -> Self {
        self.initializer = Some(value);
        self
    }
}

#[must_use]
pub fn method(name: &str, return_type: &str, params: Vec<ParameterSyntax>, body: Body) -> MethodSyntax {
    MethodSyntax {
        id: NodeId::NONE,
        name: name.to_string(),
        return_type: ty(return_type),
        modifiers: Modifiers::empty(),
        parameters: params,
        body: Some(body),
        span: Span::default(),
    }
}

/// `static extern R Name(params);` serviced by the host at evaluation time.
#[must_use]
pub fn extern_method(name: &str, return_type: &str, params: Vec<ParameterSyntax>) -> MethodSyntax {
    MethodSyntax {
        id: NodeId::NONE,
        name: name.to_string(),
        return_type: ty(return_type),
        modifiers: Modifiers::STATIC | Modifiers::EXTERN,
        parameters: params,
        body: None,
        span: Span::default(),
    }
}

impl MethodSyntax {
    #[must_use]
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers |= modifiers;
        self
    }

    #[must_use]
    pub fn static_(self) -> Self {
        self.with_modifiers(Modifiers::STATIC)
    }

    #[must_use]
    pub fn readonly(self) -> Self {
        self.with_modifiers(Modifiers::READONLY)
    }
}

#[must_use]
pub fn ctor(
    params: Vec<ParameterSyntax>,
    initializer: Option<ConstructorInitializer>,
    body: Body,
) -> ConstructorSyntax {
    ConstructorSyntax {
        id: NodeId::NONE,
        modifiers: Modifiers::PUBLIC,
        parameters: params,
        initializer,
        body: Some(body),
        span: Span::default(),
    }
}

#[must_use]
pub fn this_init(arguments: Vec<Argument>) -> Option<ConstructorInitializer> {
    Some(ConstructorInitializer {
        id: NodeId::NONE,
        kind: InitializerKind::This,
        arguments,
        span: Span::default(),
    })
}

#[must_use]
pub fn base_init(arguments: Vec<Argument>) -> Option<ConstructorInitializer> {
    Some(ConstructorInitializer {
        id: NodeId::NONE,
        kind: InitializerKind::Base,
        arguments,
        span: Span::default(),
    })
}

#[must_use]
pub fn destructor(body: Body) -> DestructorSyntax {
    DestructorSyntax {
        id: NodeId::NONE,
        body: Some(body),
        span: Span::default(),
    }
}

#[must_use]
pub fn nested(decl: TypeDeclSyntax) -> MemberSyntax {
    MemberSyntax::NestedType(Box::new(decl))
}

impl From<FieldSyntax> for MemberSyntax {
    fn from(value: FieldSyntax) -> Self {
        Self::Field(value)
    }
}

impl From<PropertySyntax> for MemberSyntax {
    fn from(value: PropertySyntax) -> Self {
        Self::Property(value)
    }
}

impl From<EventSyntax> for MemberSyntax {
    fn from(value: EventSyntax) -> Self {
        Self::Event(value)
    }
}

impl From<MethodSyntax> for MemberSyntax {
    fn from(value: MethodSyntax) -> Self {
        Self::Method(value)
    }
}

impl From<ConstructorSyntax> for MemberSyntax {
    fn from(value: ConstructorSyntax) -> Self {
        Self::Constructor(value)
    }
}

impl From<DestructorSyntax> for MemberSyntax {
    fn from(value: DestructorSyntax) -> Self {
        Self::Destructor(value)
    }
}

impl From<TypeDeclSyntax> for MemberSyntax {
    fn from(value: TypeDeclSyntax) -> Self {
        Self::NestedType(Box::new(value))
    }
}

// =============================================================================
// Bodies and statements
// =============================================================================

#[must_use]
pub fn block(statements: Vec<Stmt>) -> Body {
    Body::Block(Block {
        id: NodeId::NONE,
        statements,
        span: Span::default(),
    })
}

#[must_use]
pub fn expr_body(expr: Expr) -> Body {
    Body::Expression(expr)
}

fn stmt(kind: StmtKind) -> Stmt {
    Stmt {
        id: NodeId::NONE,
        kind,
        span: Span::default(),
    }
}

/// `var name = init;`
#[must_use]
pub fn local(name: &str, initializer: Expr) -> Stmt {
    stmt(StmtKind::Local {
        name: name.to_string(),
        ty: None,
        initializer: Some(initializer),
    })
}

/// `T name;`
#[must_use]
pub fn local_uninit(name: &str, type_name: &str) -> Stmt {
    stmt(StmtKind::Local {
        name: name.to_string(),
        ty: Some(ty(type_name)),
        initializer: None,
    })
}

#[must_use]
pub fn expr_stmt(expr: Expr) -> Stmt {
    stmt(StmtKind::Expression(expr))
}

#[must_use]
pub fn ret(value: Expr) -> Stmt {
    stmt(StmtKind::Return(Some(value)))
}

#[must_use]
pub fn ret_void() -> Stmt {
    stmt(StmtKind::Return(None))
}

#[must_use]
pub fn block_stmt(statements: Vec<Stmt>) -> Stmt {
    stmt(StmtKind::Block(Block {
        id: NodeId::NONE,
        statements,
        span: Span::default(),
    }))
}

#[must_use]
pub fn if_(condition: Expr, then_branch: Stmt, else_branch: Option<Stmt>) -> Stmt {
    stmt(StmtKind::If {
        condition,
        then_branch: Box::new(then_branch),
        else_branch: else_branch.map(Box::new),
    })
}

#[must_use]
pub fn while_(condition: Expr, body: Stmt) -> Stmt {
    stmt(StmtKind::While {
        condition,
        body: Box::new(body),
    })
}

#[must_use]
pub fn lock(subject: Expr, body: Stmt) -> Stmt {
    stmt(StmtKind::Lock {
        subject,
        body: Box::new(body),
    })
}

#[must_use]
pub fn using(resource: Expr, body: Stmt) -> Stmt {
    stmt(StmtKind::Using {
        resource,
        body: Box::new(body),
    })
}

/// `fixed (T* name = init) body`
#[must_use]
pub fn fixed(name: &str, pointer_type: TypeRef, initializer: Expr, body: Stmt) -> Stmt {
    stmt(StmtKind::Fixed {
        name: name.to_string(),
        ty: pointer_type,
        initializer,
        body: Box::new(body),
    })
}

#[must_use]
pub fn local_function(name: &str, params: Vec<ParameterSyntax>, body: Body) -> Stmt {
    stmt(StmtKind::LocalFunction {
        name: name.to_string(),
        modifiers: Modifiers::empty(),
        parameters: params,
        body,
    })
}

#[must_use]
pub fn static_local_function(name: &str, params: Vec<ParameterSyntax>, body: Body) -> Stmt {
    stmt(StmtKind::LocalFunction {
        name: name.to_string(),
        modifiers: Modifiers::STATIC,
        parameters: params,
        body,
    })
}

// =============================================================================
// Expressions
// =============================================================================

fn expr(kind: ExprKind) -> Expr {
    Expr::new(kind)
}

#[must_use]
pub fn int(value: i64) -> Expr {
    expr(ExprKind::Literal(Literal::Int(value)))
}

#[must_use]
pub fn boolean(value: bool) -> Expr {
    expr(ExprKind::Literal(Literal::Bool(value)))
}

#[must_use]
pub fn string(value: &str) -> Expr {
    expr(ExprKind::Literal(Literal::String(value.to_string())))
}

#[must_use]
pub fn null() -> Expr {
    expr(ExprKind::Literal(Literal::Null))
}

#[must_use]
pub fn name(identifier: &str) -> Expr {
    expr(ExprKind::Name(identifier.to_string()))
}

#[must_use]
pub fn this() -> Expr {
    expr(ExprKind::This)
}

#[must_use]
pub fn default_of(type_name: Option<&str>) -> Expr {
    expr(ExprKind::Default(type_name.map(ty)))
}

/// `receiver.name`
#[must_use]
pub fn member(receiver: Expr, member_name: &str) -> Expr {
    expr(ExprKind::MemberAccess {
        receiver: Box::new(receiver),
        name: member_name.to_string(),
    })
}

#[must_use]
pub fn call(callee: Expr, arguments: Vec<Argument>) -> Expr {
    expr(ExprKind::Invocation {
        callee: Box::new(callee),
        arguments,
    })
}

/// `Name(values...)` with by-value arguments.
#[must_use]
pub fn invoke(callee_name: &str, values: Vec<Expr>) -> Expr {
    call(name(callee_name), values.into_iter().map(arg).collect())
}

#[must_use]
pub fn new_obj(type_name: &str, arguments: Vec<Argument>) -> Expr {
    expr(ExprKind::ObjectCreation {
        ty: ty(type_name),
        arguments,
    })
}

#[must_use]
pub fn arg(value: Expr) -> Argument {
    Argument {
        mode: PassingMode::Value,
        expr: value,
    }
}

#[must_use]
pub fn ref_arg(value: Expr) -> Argument {
    Argument {
        mode: PassingMode::Ref,
        expr: value,
    }
}

#[must_use]
pub fn out_arg(value: Expr) -> Argument {
    Argument {
        mode: PassingMode::Out,
        expr: value,
    }
}

#[must_use]
pub fn in_arg(value: Expr) -> Argument {
    Argument {
        mode: PassingMode::In,
        expr: value,
    }
}

#[must_use]
pub fn assign(target: Expr, value: Expr) -> Expr {
    compound(AssignOp::Assign, target, value)
}

#[must_use]
pub fn compound(op: AssignOp, target: Expr, value: Expr) -> Expr {
    expr(ExprKind::Assignment {
        target: Box::new(target),
        op,
        value: Box::new(value),
    })
}

#[must_use]
pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    expr(ExprKind::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    })
}

#[must_use]
pub fn add(left: Expr, right: Expr) -> Expr {
    binary(BinaryOp::Add, left, right)
}

#[must_use]
pub fn unary(op: UnaryOp, operand: Expr) -> Expr {
    expr(ExprKind::Unary {
        op,
        operand: Box::new(operand),
    })
}

/// `operand++`
#[must_use]
pub fn increment(operand: Expr) -> Expr {
    unary(UnaryOp::PostIncrement, operand)
}

#[must_use]
pub fn address_of(operand: Expr) -> Expr {
    expr(ExprKind::AddressOf(Box::new(operand)))
}

#[must_use]
pub fn nameof(operand: Expr) -> Expr {
    expr(ExprKind::NameOf(Box::new(operand)))
}

#[must_use]
pub fn lambda(params: Vec<ParameterSyntax>, body: Body) -> Expr {
    expr(ExprKind::Lambda {
        parameters: params,
        body: Box::new(body),
        is_static: false,
    })
}

#[must_use]
pub fn static_lambda(params: Vec<ParameterSyntax>, body: Body) -> Expr {
    expr(ExprKind::Lambda {
        parameters: params,
        body: Box::new(body),
        is_static: true,
    })
}

#[must_use]
pub fn conditional(condition: Expr, when_true: Expr, when_false: Expr) -> Expr {
    expr(ExprKind::Conditional {
        condition: Box::new(condition),
        when_true: Box::new(when_true),
        when_false: Box::new(when_false),
    })
}
