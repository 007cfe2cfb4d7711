//! Identifier-occurrence walker.
//!
//! Both resolution phases run the same deterministic walk over a type's
//! initializers, base arguments and member bodies, so they see identical
//! occurrence sequences. Work is split into [`WalkUnit`]s so the driver can
//! check for cancellation between members.
//!
//! Unit order is evaluation order for the implicit primary constructor:
//! instance initializers (in part and declaration order), then base
//! arguments, then everything else.

use crate::context::{
    InitializerRegion, LocalDecl, MemberAccessUse, ResolutionContext, ResolutionPhase, ScopeKind,
};
use crate::symbols::{MemberId, MemberKind, TypeSymbol};
use primc_common::Span;
use primc_common::limits::{WALK_STACK_GROWTH, WALK_STACK_RED_ZONE};
use primc_syntax::{
    AccessorKind, AccessorSyntax, Argument, AssignOp, Block, Body, Expr, ExprKind, MemberSyntax,
    Modifiers, NodeId, ParameterSyntax, PassingMode, Stmt, StmtKind,
};
use serde::Serialize;
use smallvec::SmallVec;
use tracing::trace;

/// How an occurrence is used by its enclosing expression.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Access {
    Read,
    /// Target of a simple assignment.
    Write,
    /// Compound assignment or increment/decrement target.
    ReadWrite,
    /// Receiver of a member that is written (`x.F = ...`, `x.F++`).
    WriteThrough,
    RefArgument,
    OutArgument,
    InArgument,
    AddressOf,
}

impl Access {
    /// Writes the variable itself.
    #[must_use]
    pub const fn is_write(self) -> bool {
        matches!(
            self,
            Self::Write | Self::ReadWrite | Self::RefArgument | Self::OutArgument
        )
    }

    /// Reads the variable's current value before any write.
    #[must_use]
    pub const fn reads(self) -> bool {
        !matches!(self, Self::Write | Self::OutArgument)
    }

    const fn for_argument(mode: PassingMode) -> Self {
        match mode {
            PassingMode::Value => Self::Read,
            PassingMode::Ref => Self::RefArgument,
            PassingMode::Out => Self::OutArgument,
            PassingMode::In => Self::InArgument,
        }
    }
}

/// One simple-name occurrence and the facts about its position that the
/// constraint validators need.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Occurrence {
    pub node: NodeId,
    pub span: Span,
    pub name: String,
    /// Position in walk order.
    pub seq: u32,
    pub scope: ScopeKind,
    pub member: Option<MemberId>,
    pub access: Access,
    pub in_lambda: bool,
    pub in_nameof: bool,
    /// Inside the initializer of a `fixed` statement.
    pub in_fixed_initializer: bool,
    pub in_init_accessor: bool,
    /// Inside a `readonly` method, property or accessor.
    pub in_readonly_member: bool,
    /// Evaluated only on some paths (branches, short-circuit operands,
    /// lambda bodies).
    pub conditional: bool,
    /// Occurrence nodes of the enclosing `lock`/`using` subjects.
    pub guards: SmallVec<[NodeId; 2]>,
    pub receiver: Option<MemberAccessUse>,
    /// For `WriteThrough`, the members from this variable to the written
    /// location: `x.F.G = 1` gives `["F", "G"]`.
    pub member_path: SmallVec<[String; 2]>,
    /// The whole initializer expression is this name.
    pub is_exact_initializer: bool,
    /// The whole by-value base argument is this name.
    pub is_exact_base_argument: bool,
}

pub(crate) trait OccurrenceSink {
    fn occurrence(&mut self, occurrence: &Occurrence, ctx: &ResolutionContext<'_>);
}

/// A slice of the walk between cancellation checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum WalkUnit {
    /// An instance field, property or event initializer.
    Initializer(MemberId),
    /// Arguments of a base-list entry, by entry index.
    BaseArguments(usize),
    /// Default values of the primary parameters.
    PrimaryDefaults,
    /// Everything else a member contains.
    Member(MemberId),
}

/// Units of `ty` in evaluation order.
pub(crate) fn walk_units(ty: &TypeSymbol) -> Vec<WalkUnit> {
    let mut units = Vec::with_capacity(ty.members.len() * 2 + 2);
    for member in &ty.members {
        if !member.is_static && initializer_of(ty, member.id).is_some() {
            units.push(WalkUnit::Initializer(member.id));
        }
    }
    for (index, entry) in ty.base_list.iter().enumerate() {
        if entry.arguments.is_some() {
            units.push(WalkUnit::BaseArguments(index));
        }
    }
    if ty.parameters().iter().any(|p| p.default_value.is_some()) {
        units.push(WalkUnit::PrimaryDefaults);
    }
    for member in &ty.members {
        if member.kind != MemberKind::NestedType {
            units.push(WalkUnit::Member(member.id));
        }
    }
    units
}

/// The initializer expression of a field, property or event member.
pub(crate) fn initializer_of(ty: &TypeSymbol, member: MemberId) -> Option<&Expr> {
    let symbol = ty.member(member)?;
    match ty.member_syntax(symbol)? {
        MemberSyntax::Field(f) => f.initializer.as_ref(),
        MemberSyntax::Property(p) => p.initializer.as_ref(),
        MemberSyntax::Event(e) => e.initializer.as_ref(),
        _ => None,
    }
}

pub(crate) struct OccurrenceWalker<'a, S> {
    ty: &'a TypeSymbol,
    phase: ResolutionPhase,
    sink: &'a mut S,
    locals: Vec<LocalDecl>,
    scope: ScopeKind,
    member: Option<MemberId>,
    in_lambda: bool,
    in_nameof: bool,
    in_fixed_initializer: bool,
    in_init_accessor: bool,
    in_readonly_member: bool,
    conditional: bool,
    exact_initializer: bool,
    exact_base_argument: bool,
    guards: SmallVec<[NodeId; 2]>,
    seq: u32,
}

impl<'a, S: OccurrenceSink> OccurrenceWalker<'a, S> {
    pub(crate) fn new(ty: &'a TypeSymbol, phase: ResolutionPhase, sink: &'a mut S) -> Self {
        Self {
            ty,
            phase,
            sink,
            locals: Vec::new(),
            scope: ScopeKind::InstanceMember,
            member: None,
            in_lambda: false,
            in_nameof: false,
            in_fixed_initializer: false,
            in_init_accessor: false,
            in_readonly_member: false,
            conditional: false,
            exact_initializer: false,
            exact_base_argument: false,
            guards: SmallVec::new(),
            seq: 0,
        }
    }

    fn reset(&mut self, scope: ScopeKind, member: Option<MemberId>) {
        self.locals.clear();
        self.guards.clear();
        self.scope = scope;
        self.member = member;
        self.in_lambda = false;
        self.in_nameof = false;
        self.in_fixed_initializer = false;
        self.in_init_accessor = false;
        self.in_readonly_member = false;
        self.conditional = false;
        self.exact_initializer = false;
        self.exact_base_argument = false;
    }

    pub(crate) fn walk(&mut self, unit: WalkUnit) {
        trace!(?unit, phase = ?self.phase, "walk unit");
        match unit {
            WalkUnit::Initializer(member) => self.walk_initializer(member),
            WalkUnit::BaseArguments(index) => self.walk_base_arguments(index),
            WalkUnit::PrimaryDefaults => {
                let ty = self.ty;
                self.reset(ScopeKind::DefaultValue, None);
                for param in ty.parameters() {
                    if let Some(default) = &param.default_value {
                        self.expr(default, Access::Read);
                    }
                }
            }
            WalkUnit::Member(member) => self.walk_member(member),
        }
    }

    fn walk_initializer(&mut self, member: MemberId) {
        let ty = self.ty;
        let Some(symbol) = ty.member(member) else {
            return;
        };
        let Some(init) = initializer_of(ty, member) else {
            return;
        };
        let region = match symbol.kind {
            MemberKind::Property => InitializerRegion::PropertyInitializer,
            MemberKind::Event => InitializerRegion::EventInitializer,
            _ => InitializerRegion::FieldInitializer,
        };
        self.reset(ScopeKind::ConstructorScope(region), Some(member));
        self.exact_initializer = init.as_name().is_some();
        self.expr(init, Access::Read);
        self.exact_initializer = false;
    }

    fn walk_base_arguments(&mut self, index: usize) {
        let ty = self.ty;
        let Some(arguments) = ty.base_list.get(index).and_then(|e| e.arguments.as_ref()) else {
            return;
        };
        self.reset(
            ScopeKind::ConstructorScope(InitializerRegion::BaseArguments),
            None,
        );
        for argument in arguments {
            self.exact_base_argument =
                argument.mode == PassingMode::Value && argument.expr.as_name().is_some();
            self.expr(&argument.expr, Access::for_argument(argument.mode));
            self.exact_base_argument = false;
        }
    }

    fn walk_member(&mut self, member: MemberId) {
        let ty = self.ty;
        let Some(symbol) = ty.member(member) else {
            return;
        };
        let Some(syntax) = ty.member_syntax(symbol) else {
            return;
        };
        let body_scope = if symbol.is_static {
            ScopeKind::StaticMember
        } else {
            ScopeKind::InstanceMember
        };
        match syntax {
            MemberSyntax::Field(field) => {
                if symbol.is_static
                    && let Some(init) = &field.initializer
                {
                    self.reset(ScopeKind::StaticMember, Some(member));
                    self.expr(init, Access::Read);
                }
            }
            MemberSyntax::Property(prop) => {
                self.parameter_defaults(&prop.parameters, member);
                let readonly = prop.modifiers.contains(Modifiers::READONLY);
                for accessor in &prop.accessors {
                    self.accessor(accessor, &prop.parameters, body_scope, member, readonly);
                }
                if let Some(body) = &prop.expression_body {
                    self.reset(body_scope, Some(member));
                    self.declare_parameters(&prop.parameters);
                    self.in_readonly_member = readonly;
                    self.expr(body, Access::Read);
                }
                if symbol.is_static
                    && let Some(init) = &prop.initializer
                {
                    self.reset(ScopeKind::StaticMember, Some(member));
                    self.expr(init, Access::Read);
                }
            }
            MemberSyntax::Event(event) => {
                let readonly = event.modifiers.contains(Modifiers::READONLY);
                for accessor in &event.accessors {
                    self.accessor(accessor, &[], body_scope, member, readonly);
                }
                if symbol.is_static
                    && let Some(init) = &event.initializer
                {
                    self.reset(ScopeKind::StaticMember, Some(member));
                    self.expr(init, Access::Read);
                }
            }
            MemberSyntax::Method(method) => {
                self.parameter_defaults(&method.parameters, member);
                if let Some(body) = &method.body {
                    self.reset(body_scope, Some(member));
                    self.declare_parameters(&method.parameters);
                    self.in_readonly_member = method.modifiers.contains(Modifiers::READONLY);
                    self.body(body);
                }
            }
            MemberSyntax::Constructor(ctor) => {
                self.parameter_defaults(&ctor.parameters, member);
                if let Some(init) = &ctor.initializer {
                    self.reset(ScopeKind::ConstructorInitializer, Some(member));
                    self.declare_parameters(&ctor.parameters);
                    self.arguments(&init.arguments);
                }
                if let Some(body) = &ctor.body {
                    self.reset(body_scope, Some(member));
                    self.declare_parameters(&ctor.parameters);
                    self.body(body);
                }
            }
            MemberSyntax::Destructor(dtor) => {
                if let Some(body) = &dtor.body {
                    self.reset(ScopeKind::InstanceMember, Some(member));
                    self.body(body);
                }
            }
            MemberSyntax::NestedType(_) => {}
        }
    }

    fn accessor(
        &mut self,
        accessor: &AccessorSyntax,
        index_params: &[ParameterSyntax],
        scope: ScopeKind,
        member: MemberId,
        readonly_owner: bool,
    ) {
        let Some(body) = &accessor.body else {
            return;
        };
        self.reset(scope, Some(member));
        self.declare_parameters(index_params);
        if matches!(
            accessor.kind,
            AccessorKind::Set | AccessorKind::Init | AccessorKind::Add | AccessorKind::Remove
        ) {
            self.declare("value", accessor.id);
        }
        self.in_init_accessor = accessor.kind == AccessorKind::Init;
        self.in_readonly_member =
            readonly_owner || accessor.modifiers.contains(Modifiers::READONLY);
        self.body(body);
    }

    fn parameter_defaults(&mut self, params: &[ParameterSyntax], member: MemberId) {
        if params.iter().all(|p| p.default_value.is_none()) {
            return;
        }
        self.reset(ScopeKind::DefaultValue, Some(member));
        for param in params {
            if let Some(default) = &param.default_value {
                self.expr(default, Access::Read);
            }
        }
    }

    // =========================================================================
    // Locals
    // =========================================================================

    fn declare(&mut self, name: &str, node: NodeId) {
        self.locals.push(LocalDecl {
            name: name.to_string(),
            node,
        });
    }

    fn declare_parameters(&mut self, params: &[ParameterSyntax]) {
        for param in params {
            self.declare(&param.name, param.id);
        }
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn body(&mut self, body: &Body) {
        match body {
            Body::Block(block) => self.block(block),
            Body::Expression(expr) => self.expr(expr, Access::Read),
        }
    }

    fn block(&mut self, block: &Block) {
        let mark = self.locals.len();
        for stmt in &block.statements {
            if let StmtKind::LocalFunction { name, .. } = &stmt.kind {
                self.declare(name, stmt.id);
            }
        }
        for stmt in &block.statements {
            self.stmt(stmt);
        }
        self.locals.truncate(mark);
    }

    fn conditionally(&mut self, f: impl FnOnce(&mut Self)) {
        let saved = std::mem::replace(&mut self.conditional, true);
        f(self);
        self.conditional = saved;
    }

    fn stmt(&mut self, stmt: &Stmt) {
        stacker::maybe_grow(WALK_STACK_RED_ZONE, WALK_STACK_GROWTH, || {
            self.stmt_inner(stmt);
        });
    }

    fn stmt_inner(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Local { name, initializer, .. } => {
                if let Some(init) = initializer {
                    self.expr(init, Access::Read);
                }
                self.declare(name, stmt.id);
            }
            StmtKind::Expression(expr) => self.expr(expr, Access::Read),
            StmtKind::Return(value) => {
                if let Some(value) = value {
                    self.expr(value, Access::Read);
                }
            }
            StmtKind::Block(block) => self.block(block),
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.expr(condition, Access::Read);
                self.conditionally(|w| {
                    w.scoped_stmt(then_branch);
                    if let Some(else_branch) = else_branch {
                        w.scoped_stmt(else_branch);
                    }
                });
            }
            StmtKind::While { condition, body } => {
                self.expr(condition, Access::Read);
                self.conditionally(|w| w.scoped_stmt(body));
            }
            StmtKind::Lock { subject, body } => self.guarded(subject, body),
            StmtKind::Using { resource, body } => self.guarded(resource, body),
            StmtKind::Fixed {
                name,
                initializer,
                body,
                ..
            } => {
                let saved = std::mem::replace(&mut self.in_fixed_initializer, true);
                self.expr(initializer, Access::Read);
                self.in_fixed_initializer = saved;
                let mark = self.locals.len();
                self.declare(name, stmt.id);
                self.stmt(body);
                self.locals.truncate(mark);
            }
            StmtKind::LocalFunction {
                modifiers,
                parameters,
                body,
                ..
            } => self.nested_function(parameters, body, modifiers.contains(Modifiers::STATIC)),
        }
    }

    /// An embedded statement gets its own local scope.
    fn scoped_stmt(&mut self, stmt: &Stmt) {
        let mark = self.locals.len();
        self.stmt(stmt);
        self.locals.truncate(mark);
    }

    fn guarded(&mut self, subject: &Expr, body: &Stmt) {
        self.expr(subject, Access::Read);
        let pushed = subject.as_name().is_some();
        if pushed {
            self.guards.push(subject.id);
        }
        self.scoped_stmt(body);
        if pushed {
            self.guards.pop();
        }
    }

    fn nested_function(&mut self, params: &[ParameterSyntax], body: &Body, is_static: bool) {
        let mark = self.locals.len();
        let saved_scope = self.scope;
        let saved_lambda = std::mem::replace(&mut self.in_lambda, true);
        let saved_conditional = std::mem::replace(&mut self.conditional, true);
        self.declare_parameters(params);
        if is_static {
            self.scope = ScopeKind::StaticMember;
        }
        self.body(body);
        self.scope = saved_scope;
        self.in_lambda = saved_lambda;
        self.conditional = saved_conditional;
        self.locals.truncate(mark);
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn arguments(&mut self, arguments: &[Argument]) {
        for argument in arguments {
            self.expr(&argument.expr, Access::for_argument(argument.mode));
        }
    }

    /// Deep nesting grows the stack on demand instead of truncating the walk,
    /// so every occurrence is seen by both phases.
    fn expr(&mut self, expr: &Expr, access: Access) {
        stacker::maybe_grow(WALK_STACK_RED_ZONE, WALK_STACK_GROWTH, || {
            self.expr_inner(expr, access);
        });
    }

    fn expr_inner(&mut self, expr: &Expr, access: Access) {
        match &expr.kind {
            ExprKind::Literal(_) | ExprKind::This | ExprKind::Default(_) => {}
            ExprKind::Name(name) => self.name(expr, name, access, None, SmallVec::new()),
            ExprKind::MemberAccess { receiver, name } => {
                self.member_access(receiver, name, access, None, &[]);
            }
            ExprKind::Invocation { callee, arguments } => {
                if let ExprKind::MemberAccess { receiver, name } = &callee.kind {
                    let modes = arguments.iter().map(|a| a.mode).collect();
                    self.member_access(receiver, name, Access::Read, Some(modes), &[]);
                } else {
                    self.expr(callee, Access::Read);
                }
                self.arguments(arguments);
            }
            ExprKind::ObjectCreation { arguments, .. } => self.arguments(arguments),
            ExprKind::Assignment { target, op, value } => {
                if *op == AssignOp::Assign {
                    self.expr(value, Access::Read);
                    self.expr(target, Access::Write);
                } else {
                    self.expr(target, Access::ReadWrite);
                    self.expr(value, Access::Read);
                }
            }
            ExprKind::Binary { op, left, right } => {
                self.expr(left, Access::Read);
                if op.is_short_circuit() {
                    self.conditionally(|w| w.expr(right, Access::Read));
                } else {
                    self.expr(right, Access::Read);
                }
            }
            ExprKind::Unary { op, operand } => {
                let access = if op.writes_operand() {
                    Access::ReadWrite
                } else {
                    Access::Read
                };
                self.expr(operand, access);
            }
            ExprKind::AddressOf(operand) => self.expr(operand, Access::AddressOf),
            ExprKind::NameOf(operand) => {
                let saved = std::mem::replace(&mut self.in_nameof, true);
                self.expr(operand, Access::Read);
                self.in_nameof = saved;
            }
            ExprKind::Lambda {
                parameters,
                body,
                is_static,
            } => self.nested_function(parameters, body, *is_static),
            ExprKind::Conditional {
                condition,
                when_true,
                when_false,
            } => {
                self.expr(condition, Access::Read);
                self.conditionally(|w| {
                    w.expr(when_true, Access::Read);
                    w.expr(when_false, Access::Read);
                });
            }
        }
    }

    /// `outer` lists the members applied after this one, nearest first.
    fn member_access(
        &mut self,
        receiver: &Expr,
        member_name: &str,
        access: Access,
        invocation: Option<Vec<PassingMode>>,
        outer: &[String],
    ) {
        let receiver_access = match access {
            Access::AddressOf => Access::AddressOf,
            a if a.is_write() || a == Access::WriteThrough => Access::WriteThrough,
            _ => Access::Read,
        };
        let through = receiver_access == Access::WriteThrough;
        match &receiver.kind {
            ExprKind::Name(name) => {
                let use_ = MemberAccessUse {
                    member_name: member_name.to_string(),
                    invocation,
                };
                let path = if through {
                    std::iter::once(member_name.to_string())
                        .chain(outer.iter().cloned())
                        .collect()
                } else {
                    SmallVec::new()
                };
                self.name(receiver, name, receiver_access, Some(use_), path);
            }
            ExprKind::MemberAccess {
                receiver: inner,
                name: inner_name,
            } if through => {
                let mut path = Vec::with_capacity(outer.len() + 1);
                path.push(member_name.to_string());
                path.extend_from_slice(outer);
                stacker::maybe_grow(WALK_STACK_RED_ZONE, WALK_STACK_GROWTH, || {
                    self.member_access(inner, inner_name, receiver_access, None, &path);
                });
            }
            _ => self.expr(receiver, receiver_access),
        }
    }

    fn name(
        &mut self,
        expr: &Expr,
        name: &str,
        access: Access,
        receiver: Option<MemberAccessUse>,
        member_path: SmallVec<[String; 2]>,
    ) {
        let occurrence = Occurrence {
            node: expr.id,
            span: expr.span,
            name: name.to_string(),
            seq: self.seq,
            scope: self.scope,
            member: self.member,
            access,
            in_lambda: self.in_lambda,
            in_nameof: self.in_nameof,
            in_fixed_initializer: self.in_fixed_initializer,
            in_init_accessor: self.in_init_accessor,
            in_readonly_member: self.in_readonly_member,
            conditional: self.conditional,
            guards: self.guards.clone(),
            receiver,
            member_path,
            is_exact_initializer: self.exact_initializer,
            is_exact_base_argument: self.exact_base_argument,
        };
        self.seq += 1;
        let ctx = ResolutionContext {
            type_id: self.ty.id,
            scope: self.scope,
            phase: self.phase,
            member: self.member,
            locals: &self.locals,
            in_lambda: self.in_lambda,
            in_nameof: self.in_nameof,
            receiver_of: occurrence.receiver.as_ref(),
        };
        self.sink.occurrence(&occurrence, &ctx);
    }
}
