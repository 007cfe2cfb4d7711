//! Tree-walking interpreter.
//!
//! Simple names are never looked up again at run time: each one reads the
//! binding the analysis recorded for its node. A captured parameter lives
//! in its backing field on the object, an uncaptured one only in the frame
//! of the primary constructor that received it.

use crate::error::RuntimeError;
use crate::host::Host;
use crate::value::{Object, ObjectRef, Value};
use indexmap::IndexMap;
use primc_binder::{
    AnalysisResults, Binding, BuiltinType, ConstructorCall, ConstructorTarget, InitStep, MemberId,
    MemberKind, MemberRef, MemberSymbol, ParamId, SymbolTable, TypeClass, TypeId, TypeSymbol,
};
use primc_common::limits::{MAX_EVAL_CALL_DEPTH, MAX_EVAL_LOOP_ITERATIONS};
use primc_syntax::{
    AccessorKind, Argument, AssignOp, BinaryOp, Block, Body, Expr, ExprKind, InitializerKind,
    Literal, MemberSyntax, Modifiers, NodeId, ParameterSyntax, PassingMode, Stmt, StmtKind,
    TypeKind, TypeRef, UnaryOp,
};
use rustc_hash::FxHashMap;
use tracing::{debug, instrument, trace};

type EvalResult<T> = Result<T, RuntimeError>;

/// Activation record of one constructor, method or accessor.
struct Frame {
    ty: TypeId,
    this: Option<ObjectRef>,
    /// Primary-constructor arguments, by ordinal. Empty outside the primary
    /// constructor.
    params: Vec<Value>,
    locals: FxHashMap<NodeId, Value>,
}

impl Frame {
    fn new(ty: TypeId, this: Option<ObjectRef>) -> Self {
        Self {
            ty,
            this,
            params: Vec::new(),
            locals: FxHashMap::default(),
        }
    }

    fn this(&self) -> EvalResult<&ObjectRef> {
        self.this
            .as_ref()
            .ok_or_else(|| RuntimeError::trap("no instance in a static context"))
    }

    fn param(&self, id: ParamId) -> EvalResult<Value> {
        if id.owner != self.ty {
            return Err(RuntimeError::trap("parameter of another constructor"));
        }
        self.params
            .get(id.ordinal as usize)
            .cloned()
            .ok_or_else(|| RuntimeError::trap("parameter read outside its constructor"))
    }

    fn set_param(&mut self, id: ParamId, value: Value) -> EvalResult<()> {
        match self.params.get_mut(id.ordinal as usize) {
            Some(slot) if id.owner == self.ty => {
                *slot = value;
                Ok(())
            }
            _ => Err(RuntimeError::trap("parameter written outside its constructor")),
        }
    }
}

enum Flow {
    Next,
    Return(Value),
}

pub struct Interpreter<'a, H> {
    results: &'a AnalysisResults,
    table: &'a SymbolTable,
    host: H,
    statics: FxHashMap<MemberId, Value>,
    depth: u32,
}

impl<'a, H: Host> Interpreter<'a, H> {
    #[must_use]
    pub fn new(results: &'a AnalysisResults, host: H) -> Self {
        Self {
            results,
            table: results.symbols(),
            host,
            statics: FxHashMap::default(),
            depth: 0,
        }
    }

    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    #[must_use]
    pub fn into_host(self) -> H {
        self.host
    }

    // =========================================================================
    // Entry points
    // =========================================================================

    /// `new T(args)` for the top-level type `type_name`.
    #[instrument(level = "debug", skip(self, args), fields(arity = args.len()))]
    pub fn construct(&mut self, type_name: &str, args: Vec<Value>) -> EvalResult<ObjectRef> {
        let ty = self.type_named(type_name)?;
        self.instantiate(ty, args)
    }

    /// `default(S)` / `new S()` for a value type: the synthesized
    /// parameterless constructor, which runs no user code.
    pub fn construct_default(&mut self, type_name: &str) -> EvalResult<ObjectRef> {
        let ty = self.type_named(type_name)?;
        let symbol = self.type_symbol(ty)?;
        if symbol.kind != TypeKind::Struct {
            return Err(RuntimeError::NotConstructible {
                type_name: symbol.name.clone(),
            });
        }
        let object = self.allocate(ty)?;
        if let Some(ctor) = self.results.default_constructor(ty) {
            for step in &ctor.plan.steps {
                if *step != InitStep::ZeroInit {
                    return Err(RuntimeError::trap("default constructor runs user code"));
                }
            }
        }
        Ok(object)
    }

    /// Read a field or property of `object`.
    pub fn get(&mut self, object: &ObjectRef, member: &str) -> EvalResult<Value> {
        let symbol = self.member_on(object.type_id(), member)?;
        self.read_member(Some(object), symbol)
    }

    /// Call an instance or static method through `object`.
    pub fn call(&mut self, object: &ObjectRef, method: &str, args: Vec<Value>) -> EvalResult<Value> {
        let symbol = self.find_method(object.type_id(), method, args.len())?;
        let this = (!symbol.is_static).then(|| object.clone());
        self.invoke(symbol, this, args)
    }

    /// Call a static method of the top-level type `type_name`.
    pub fn call_static(
        &mut self,
        type_name: &str,
        method: &str,
        args: Vec<Value>,
    ) -> EvalResult<Value> {
        let ty = self.type_named(type_name)?;
        let symbol = self.find_method(ty, method, args.len())?;
        if !symbol.is_static {
            return Err(RuntimeError::trap(format!(
                "{method} is an instance method"
            )));
        }
        self.invoke(symbol, None, args)
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    fn type_named(&self, name: &str) -> EvalResult<TypeId> {
        self.results
            .type_id(name)
            .ok_or_else(|| RuntimeError::UnknownType {
                name: name.to_string(),
            })
    }

    fn type_symbol(&self, ty: TypeId) -> EvalResult<&'a TypeSymbol> {
        let table = self.table;
        table.get(ty).ok_or_else(|| RuntimeError::UnknownType {
            name: ty.to_string(),
        })
    }

    fn type_name(&self, ty: TypeId) -> String {
        self.table
            .get(ty)
            .map_or_else(|| ty.to_string(), |t| t.name.clone())
    }

    fn member_on(&self, ty: TypeId, name: &str) -> EvalResult<&'a MemberSymbol> {
        let table = self.table;
        table
            .lookup_member(ty, name)
            .ok_or_else(|| RuntimeError::UnknownMember {
                type_name: self.type_name(ty),
                member: name.to_string(),
            })
    }

    fn find_method(&self, ty: TypeId, name: &str, arity: usize) -> EvalResult<&'a MemberSymbol> {
        let table = self.table;
        let modes = vec![PassingMode::Value; arity];
        table
            .lookup_members(ty, name)
            .into_iter()
            .find(|m| m.kind == MemberKind::Method && m.accepts(&modes))
            .ok_or_else(|| RuntimeError::UnknownMember {
                type_name: self.type_name(ty),
                member: name.to_string(),
            })
    }

    fn syntax_of(&self, member: &'a MemberSymbol) -> EvalResult<&'a MemberSyntax> {
        self.type_symbol(member.id.owner)?
            .member_syntax(member)
            .ok_or_else(|| RuntimeError::trap(format!("no syntax for member {}", member.name)))
    }

    fn binding(&self, expr: &Expr) -> EvalResult<&'a Binding> {
        let results = self.results;
        results
            .binding(expr.id)
            .map(|r| &r.binding)
            .ok_or(RuntimeError::Unbound { node: expr.id })
    }

    fn enter(&mut self) -> EvalResult<()> {
        if self.depth >= MAX_EVAL_CALL_DEPTH {
            return Err(RuntimeError::CallDepthExceeded {
                limit: MAX_EVAL_CALL_DEPTH,
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    // =========================================================================
    // Objects and constructors
    // =========================================================================

    fn default_for(&self, ty: &TypeRef, context: TypeId) -> Value {
        match self.table.classify(ty, context) {
            TypeClass::Builtin(BuiltinType::Bool) => Value::Bool(false),
            TypeClass::Builtin(
                BuiltinType::String
                | BuiltinType::Object
                | BuiltinType::Void
                | BuiltinType::Span
                | BuiltinType::ReadOnlySpan,
            ) => Value::Null,
            TypeClass::Builtin(_) => Value::Int(0),
            _ => Value::Null,
        }
    }

    /// A zeroed instance: every stored field of the base chain plus the
    /// backing fields of captured parameters.
    fn allocate(&self, ty: TypeId) -> EvalResult<ObjectRef> {
        let symbol = self.type_symbol(ty)?;
        let mut fields = IndexMap::new();
        for current in self.table.base_chain(ty) {
            for member in current.members.iter().filter(|m| !m.is_static) {
                let stored = match current.member_syntax(member) {
                    Some(MemberSyntax::Field(_)) => true,
                    Some(MemberSyntax::Property(p)) => p.is_auto(),
                    Some(MemberSyntax::Event(e)) => e.accessors.is_empty(),
                    _ => false,
                };
                if stored && let Some(field_ty) = &member.ty {
                    fields
                        .entry(member.name.clone())
                        .or_insert_with(|| self.default_for(field_ty, current.id));
                }
            }
            for captured in self.results.captured_fields(current.id) {
                fields
                    .entry(captured.backing_field_name.clone())
                    .or_insert_with(|| self.default_for(&captured.field_type, current.id));
            }
        }
        Ok(ObjectRef::new(Object {
            ty,
            type_name: symbol.name.clone(),
            fields,
        }))
    }

    fn instantiate(&mut self, ty: TypeId, args: Vec<Value>) -> EvalResult<ObjectRef> {
        let symbol = self.type_symbol(ty)?;
        if matches!(symbol.kind, TypeKind::Interface | TypeKind::Enum)
            || symbol.is_abstract()
            || symbol.is_static_class()
        {
            return Err(RuntimeError::NotConstructible {
                type_name: symbol.name.clone(),
            });
        }
        let modes = vec![PassingMode::Value; args.len()];
        let target = self
            .table
            .select_constructor(ty, &modes)
            .ok_or_else(|| RuntimeError::NoConstructor {
                type_name: symbol.name.clone(),
                arity: args.len(),
            })?;
        let object = self.allocate(ty)?;
        self.run_constructor(&object, target, args)?;
        debug!(type_name = %symbol.name, "object constructed");
        Ok(object)
    }

    fn run_constructor(
        &mut self,
        object: &ObjectRef,
        target: ConstructorTarget,
        args: Vec<Value>,
    ) -> EvalResult<()> {
        self.enter()?;
        let result = match target {
            ConstructorTarget::Primary(ty) => self.run_primary(object, ty, args),
            ConstructorTarget::Explicit(member) => self.run_explicit(object, member, args),
            ConstructorTarget::Implicit(ty) => self.run_implicit(object, ty),
        };
        self.leave();
        result
    }

    fn run_primary(&mut self, object: &ObjectRef, ty: TypeId, args: Vec<Value>) -> EvalResult<()> {
        let results = self.results;
        let symbol = self.type_symbol(ty)?;
        let ctor = results
            .primary_constructor(ty)
            .filter(|c| !c.has_errors)
            .ok_or_else(|| RuntimeError::ConstructorUnavailable {
                type_name: symbol.name.clone(),
            })?;

        let mut frame = Frame::new(ty, Some(object.clone()));
        let mut args = args.into_iter();
        for param in symbol.parameters() {
            let value = match (args.next(), &param.default_value) {
                (Some(value), _) => value,
                (None, Some(default)) => self.eval(&mut Frame::new(ty, None), default)?,
                (None, None) => {
                    return Err(RuntimeError::NoConstructor {
                        type_name: symbol.name.clone(),
                        arity: frame.params.len(),
                    });
                }
            };
            frame.params.push(value);
        }

        for step in &ctor.plan.steps {
            trace!(?step, type_name = %symbol.name, "constructor step");
            match step {
                InitStep::StoreBackingField { parameter, field } => {
                    let value = frame.param(*parameter)?;
                    object.set_field(field, value);
                }
                InitStep::RunInitializer { member, name, .. } => {
                    self.run_initializer(&mut frame, symbol, *member, name)?;
                }
                InitStep::CallBase => {
                    self.call_base(&mut frame, symbol, ctor.base_or_this_call.as_ref())?;
                }
                InitStep::ZeroInit => {}
            }
        }
        Ok(())
    }

    fn run_initializer(
        &mut self,
        frame: &mut Frame,
        symbol: &'a TypeSymbol,
        member: MemberId,
        name: &str,
    ) -> EvalResult<()> {
        let Some(init) = symbol.member(member).and_then(|m| initializer(symbol, m)) else {
            return Ok(());
        };
        let value = self.eval(frame, init)?;
        frame.this()?.set_field(name, value);
        Ok(())
    }

    /// Instance initializers of a type without a primary constructor, in
    /// declaration order.
    fn run_initializers(&mut self, object: &ObjectRef, ty: TypeId) -> EvalResult<()> {
        let symbol = self.type_symbol(ty)?;
        let mut frame = Frame::new(ty, Some(object.clone()));
        for member in symbol.members.iter().filter(|m| !m.is_static) {
            self.run_initializer(&mut frame, symbol, member.id, &member.name)?;
        }
        Ok(())
    }

    fn call_base(
        &mut self,
        frame: &mut Frame,
        symbol: &'a TypeSymbol,
        call: Option<&ConstructorCall>,
    ) -> EvalResult<()> {
        let Some(call) = call else {
            return Ok(());
        };
        let arguments = symbol
            .base_list
            .iter()
            .find(|e| e.node == call.node)
            .and_then(|e| e.arguments.as_deref())
            .unwrap_or_default();
        let values = self.eval_arguments(frame, arguments)?;
        match call.target {
            Some(target) => {
                let object = frame.this()?.clone();
                self.run_constructor(&object, target, values)
            }
            None => {
                trace!(base = %call.base_type, "base constructor outside the compilation");
                Ok(())
            }
        }
    }

    fn implicit_base(&mut self, object: &ObjectRef, ty: TypeId, values: Vec<Value>) -> EvalResult<()> {
        let symbol = self.type_symbol(ty)?;
        let Some(base) = symbol.base_type else {
            return Ok(());
        };
        let modes = vec![PassingMode::Value; values.len()];
        let target = self
            .table
            .select_constructor(base, &modes)
            .ok_or_else(|| RuntimeError::NoConstructor {
                type_name: self.type_name(base),
                arity: values.len(),
            })?;
        self.run_constructor(object, target, values)
    }

    fn run_implicit(&mut self, object: &ObjectRef, ty: TypeId) -> EvalResult<()> {
        self.run_initializers(object, ty)?;
        self.implicit_base(object, ty, Vec::new())
    }

    fn run_explicit(&mut self, object: &ObjectRef, member: MemberId, args: Vec<Value>) -> EvalResult<()> {
        let table = self.table;
        let symbol = table
            .member(member)
            .ok_or_else(|| RuntimeError::trap("unknown constructor"))?;
        let MemberSyntax::Constructor(ctor) = self.syntax_of(symbol)? else {
            return Err(RuntimeError::trap("constructor target is not a constructor"));
        };
        let mut frame = Frame::new(member.owner, Some(object.clone()));
        self.bind_parameters(&mut frame, &ctor.parameters, args)?;

        match &ctor.initializer {
            Some(init) if init.kind == InitializerKind::This => {
                let values = self.eval_arguments(&mut frame, &init.arguments)?;
                let modes: Vec<PassingMode> = init.arguments.iter().map(|a| a.mode).collect();
                let target = table.select_constructor(member.owner, &modes).ok_or_else(|| {
                    RuntimeError::NoConstructor {
                        type_name: self.type_name(member.owner),
                        arity: values.len(),
                    }
                })?;
                self.run_constructor(object, target, values)?;
            }
            Some(init) => {
                self.run_initializers(object, member.owner)?;
                let values = self.eval_arguments(&mut frame, &init.arguments)?;
                self.implicit_base(object, member.owner, values)?;
            }
            None => {
                self.run_initializers(object, member.owner)?;
                self.implicit_base(object, member.owner, Vec::new())?;
            }
        }

        if let Some(body) = &ctor.body {
            self.exec_body(&mut frame, body)?;
        }
        Ok(())
    }

    // =========================================================================
    // Members
    // =========================================================================

    fn bind_parameters(
        &mut self,
        frame: &mut Frame,
        params: &[ParameterSyntax],
        args: Vec<Value>,
    ) -> EvalResult<()> {
        let mut args = args.into_iter();
        for param in params {
            let value = match (args.next(), &param.default_value) {
                (Some(value), _) => value,
                (None, Some(default)) => self.eval(&mut Frame::new(frame.ty, None), default)?,
                (None, None) => {
                    return Err(RuntimeError::trap(format!("missing argument {}", param.name)));
                }
            };
            frame.locals.insert(param.id, value);
        }
        Ok(())
    }

    fn invoke(
        &mut self,
        member: &'a MemberSymbol,
        this: Option<ObjectRef>,
        args: Vec<Value>,
    ) -> EvalResult<Value> {
        let MemberSyntax::Method(method) = self.syntax_of(member)? else {
            return Err(RuntimeError::trap(format!("{} is not a method", member.name)));
        };
        let Some(body) = &method.body else {
            if method.modifiers.contains(Modifiers::EXTERN) {
                trace!(name = %method.name, "extern call");
                return self.host.call_extern(&method.name, &args);
            }
            return Err(RuntimeError::trap(format!("{} has no body", method.name)));
        };
        let this = if member.is_static { None } else { this };
        let mut frame = Frame::new(member.id.owner, this);
        self.enter()?;
        let result = self
            .bind_parameters(&mut frame, &method.parameters, args)
            .and_then(|()| self.exec_body(&mut frame, body));
        self.leave();
        result
    }

    fn static_value(&mut self, member: &'a MemberSymbol) -> EvalResult<Value> {
        if let Some(value) = self.statics.get(&member.id) {
            return Ok(value.clone());
        }
        let symbol = self.type_symbol(member.id.owner)?;
        let value = match initializer(symbol, member) {
            Some(init) => self.eval(&mut Frame::new(symbol.id, None), init)?,
            None => member
                .ty
                .as_ref()
                .map_or(Value::Null, |t| self.default_for(t, symbol.id)),
        };
        self.statics.insert(member.id, value.clone());
        Ok(value)
    }

    fn read_member(&mut self, this: Option<&ObjectRef>, member: &'a MemberSymbol) -> EvalResult<Value> {
        let this = if member.is_static { None } else { this };
        match self.syntax_of(member)? {
            MemberSyntax::Field(_) => self.read_stored(this, member),
            MemberSyntax::Event(e) if e.accessors.is_empty() => self.read_stored(this, member),
            MemberSyntax::Property(p) if p.is_auto() => self.read_stored(this, member),
            MemberSyntax::Property(p) => {
                let mut frame = Frame::new(member.id.owner, this.cloned());
                if let Some(body) = &p.expression_body {
                    return self.eval(&mut frame, body);
                }
                let getter = p
                    .accessors
                    .iter()
                    .find(|a| a.kind == AccessorKind::Get)
                    .and_then(|a| a.body.as_ref())
                    .ok_or_else(|| RuntimeError::trap(format!("{} has no getter", p.name)))?;
                self.enter()?;
                let result = self.exec_body(&mut frame, getter);
                self.leave();
                result
            }
            MemberSyntax::NestedType(_) => member
                .nested_type
                .map(Value::Type)
                .ok_or_else(|| RuntimeError::trap("unresolved nested type")),
            _ => Err(RuntimeError::Unsupported {
                what: "method groups as values",
            }),
        }
    }

    fn read_stored(&mut self, this: Option<&ObjectRef>, member: &'a MemberSymbol) -> EvalResult<Value> {
        if member.is_static {
            return self.static_value(member);
        }
        let this = this.ok_or_else(|| RuntimeError::trap("no instance in a static context"))?;
        this.field(&member.name)
            .ok_or_else(|| RuntimeError::UnknownMember {
                type_name: this.borrow().type_name.clone(),
                member: member.name.clone(),
            })
    }

    fn write_member(
        &mut self,
        this: Option<&ObjectRef>,
        member: &'a MemberSymbol,
        value: Value,
    ) -> EvalResult<()> {
        let stored = match self.syntax_of(member)? {
            MemberSyntax::Field(_) => true,
            MemberSyntax::Event(e) => e.accessors.is_empty(),
            MemberSyntax::Property(p) if p.is_auto() => true,
            MemberSyntax::Property(p) => {
                let setter = p
                    .accessors
                    .iter()
                    .find(|a| matches!(a.kind, AccessorKind::Set | AccessorKind::Init))
                    .ok_or_else(|| RuntimeError::trap(format!("{} has no setter", p.name)))?;
                let Some(body) = &setter.body else {
                    return Err(RuntimeError::trap(format!("{} has no setter body", p.name)));
                };
                let this = if member.is_static { None } else { this.cloned() };
                let mut frame = Frame::new(member.id.owner, this);
                frame.locals.insert(setter.id, value);
                self.enter()?;
                let result = self.exec_body(&mut frame, body);
                self.leave();
                return result.map(|_| ());
            }
            _ => false,
        };
        if !stored {
            return Err(RuntimeError::Unsupported {
                what: "assignment to a method or type",
            });
        }
        if member.is_static {
            self.statics.insert(member.id, value);
            return Ok(());
        }
        let this = this.ok_or_else(|| RuntimeError::trap("no instance in a static context"))?;
        this.set_field(&member.name, value);
        Ok(())
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn exec_body(&mut self, frame: &mut Frame, body: &Body) -> EvalResult<Value> {
        match body {
            Body::Expression(expr) => self.eval(frame, expr),
            Body::Block(block) => match self.exec_block(frame, block)? {
                Flow::Return(value) => Ok(value),
                Flow::Next => Ok(Value::Unit),
            },
        }
    }

    fn exec_block(&mut self, frame: &mut Frame, block: &Block) -> EvalResult<Flow> {
        for stmt in &block.statements {
            if let Flow::Return(value) = self.exec(frame, stmt)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Next)
    }

    fn exec(&mut self, frame: &mut Frame, stmt: &Stmt) -> EvalResult<Flow> {
        match &stmt.kind {
            StmtKind::Local {
                ty, initializer, ..
            } => {
                let value = match (initializer, ty) {
                    (Some(init), _) => self.eval(frame, init)?,
                    (None, Some(ty)) => self.default_for(ty, frame.ty),
                    (None, None) => Value::Null,
                };
                frame.locals.insert(stmt.id, value);
            }
            StmtKind::Expression(expr) => {
                self.eval(frame, expr)?;
            }
            StmtKind::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval(frame, expr)?,
                    None => Value::Unit,
                };
                return Ok(Flow::Return(value));
            }
            StmtKind::Block(block) => return self.exec_block(frame, block),
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.condition(frame, condition)? {
                    return self.exec(frame, then_branch);
                }
                if let Some(else_branch) = else_branch {
                    return self.exec(frame, else_branch);
                }
            }
            StmtKind::While { condition, body } => {
                let mut iterations = 0u64;
                while self.condition(frame, condition)? {
                    iterations += 1;
                    if iterations > MAX_EVAL_LOOP_ITERATIONS {
                        return Err(RuntimeError::trap("loop iteration limit exceeded"));
                    }
                    if let Flow::Return(value) = self.exec(frame, body)? {
                        return Ok(Flow::Return(value));
                    }
                }
            }
            StmtKind::Lock { subject, body } => {
                self.eval(frame, subject)?;
                return self.exec(frame, body);
            }
            StmtKind::Using { resource, body } => {
                self.eval(frame, resource)?;
                return self.exec(frame, body);
            }
            StmtKind::Fixed { .. } => {
                return Err(RuntimeError::Unsupported {
                    what: "fixed statements",
                });
            }
            StmtKind::LocalFunction { .. } => {}
        }
        Ok(Flow::Next)
    }

    fn condition(&mut self, frame: &mut Frame, expr: &Expr) -> EvalResult<bool> {
        let value = self.eval(frame, expr)?;
        value.as_bool().ok_or(RuntimeError::TypeError {
            op: "condition",
            expected: "bool",
            got: value.kind(),
        })
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn eval_arguments(&mut self, frame: &mut Frame, arguments: &[Argument]) -> EvalResult<Vec<Value>> {
        let mut values = Vec::with_capacity(arguments.len());
        for argument in arguments {
            if matches!(argument.mode, PassingMode::Ref | PassingMode::Out) {
                return Err(RuntimeError::Unsupported {
                    what: "by-reference arguments",
                });
            }
            values.push(self.eval(frame, &argument.expr)?);
        }
        Ok(values)
    }

    fn eval(&mut self, frame: &mut Frame, expr: &Expr) -> EvalResult<Value> {
        match &expr.kind {
            ExprKind::Literal(literal) => Ok(match literal {
                Literal::Int(v) => Value::Int(*v),
                Literal::Bool(v) => Value::Bool(*v),
                Literal::String(s) => Value::str(s),
                Literal::Null => Value::Null,
            }),
            ExprKind::Name(name) => self.eval_name(frame, expr, name),
            ExprKind::MemberAccess { receiver, name } => {
                let receiver = self.eval(frame, receiver)?;
                self.read_through(&receiver, name)
            }
            ExprKind::Invocation { callee, arguments } => self.eval_call(frame, callee, arguments),
            ExprKind::ObjectCreation { ty, arguments } => {
                let name = ty.simple_name().unwrap_or_default();
                let target = self
                    .table
                    .lookup_type(name, Some(frame.ty))
                    .ok_or_else(|| RuntimeError::UnknownType {
                        name: ty.to_string(),
                    })?;
                let values = self.eval_arguments(frame, arguments)?;
                self.instantiate(target, values).map(Value::Object)
            }
            ExprKind::Assignment { target, op, value } => {
                let value = match compound_operator(*op) {
                    None => self.eval(frame, value)?,
                    Some(op) => {
                        let current = self.eval(frame, target)?;
                        let rhs = self.eval(frame, value)?;
                        binary(op, &current, &rhs)?
                    }
                };
                self.assign(frame, target, value.clone())?;
                Ok(value)
            }
            ExprKind::Binary { op, left, right } => {
                let left = self.eval(frame, left)?;
                if op.is_short_circuit() {
                    let lhs = left.as_bool().ok_or(RuntimeError::TypeError {
                        op: "logical operator",
                        expected: "bool",
                        got: left.kind(),
                    })?;
                    let decided = matches!((op, lhs), (BinaryOp::And, false) | (BinaryOp::Or, true));
                    if decided {
                        return Ok(Value::Bool(lhs));
                    }
                    return self.condition(frame, right).map(Value::Bool);
                }
                let right = self.eval(frame, right)?;
                binary(*op, &left, &right)
            }
            ExprKind::Unary { op, operand } => self.eval_unary(frame, *op, operand),
            ExprKind::NameOf(operand) => {
                let name = match &operand.kind {
                    ExprKind::Name(name) | ExprKind::MemberAccess { name, .. } => name.as_str(),
                    _ => return Err(RuntimeError::trap("nameof of a non-name")),
                };
                Ok(Value::str(name))
            }
            ExprKind::This => frame.this().cloned().map(Value::Object),
            ExprKind::Conditional {
                condition,
                when_true,
                when_false,
            } => {
                if self.condition(frame, condition)? {
                    self.eval(frame, when_true)
                } else {
                    self.eval(frame, when_false)
                }
            }
            ExprKind::Default(ty) => Ok(ty
                .as_ref()
                .map_or(Value::Null, |t| self.default_for(t, frame.ty))),
            ExprKind::AddressOf(_) => Err(RuntimeError::Unsupported {
                what: "address-of",
            }),
            ExprKind::Lambda { .. } => Err(RuntimeError::Unsupported { what: "lambdas" }),
        }
    }

    fn eval_name(&mut self, frame: &mut Frame, expr: &Expr, name: &str) -> EvalResult<Value> {
        match self.binding(expr)? {
            Binding::Local(node) => frame
                .locals
                .get(node)
                .cloned()
                .ok_or_else(|| RuntimeError::UninitializedLocal {
                    name: name.to_string(),
                }),
            Binding::Parameter(param) => frame.param(*param),
            Binding::ParameterName(_) => Ok(Value::str(name)),
            Binding::Member(MemberRef::BackingField(param)) => {
                let field = self.backing_field(*param)?;
                frame.this()?.field(&field).ok_or_else(|| RuntimeError::UnknownMember {
                    type_name: self.type_name(param.owner),
                    member: field,
                })
            }
            Binding::Member(MemberRef::Declared(id)) => {
                let table = self.table;
                let member = table
                    .member(*id)
                    .ok_or_else(|| RuntimeError::Unresolved {
                        name: name.to_string(),
                    })?;
                let this = frame.this.clone();
                self.read_member(this.as_ref(), member)
            }
            Binding::Type(ty) => Ok(Value::Type(*ty)),
            Binding::Ambiguous(_)
            | Binding::NotInScope
            | Binding::InvalidContext(_)
            | Binding::Rejected(_) => Err(RuntimeError::Unresolved {
                name: name.to_string(),
            }),
        }
    }

    fn backing_field(&self, param: ParamId) -> EvalResult<String> {
        self.table
            .parameter(param)
            .map(|p| p.backing_field_name())
            .ok_or_else(|| RuntimeError::trap("unknown primary parameter"))
    }

    /// `receiver.name` where the receiver is already evaluated.
    fn read_through(&mut self, receiver: &Value, name: &str) -> EvalResult<Value> {
        match receiver {
            Value::Object(object) => {
                let member = self.member_on(object.type_id(), name)?;
                self.read_member(Some(object), member)
            }
            Value::Type(ty) => {
                let member = self.member_on(*ty, name)?;
                if !member.is_static && member.kind != MemberKind::NestedType {
                    return Err(RuntimeError::trap(format!(
                        "{name} is an instance member"
                    )));
                }
                self.read_member(None, member)
            }
            Value::Str(s) if name == "Length" => Ok(Value::Int(s.chars().count() as i64)),
            other => Err(RuntimeError::TypeError {
                op: "member access",
                expected: "object or type",
                got: other.kind(),
            }),
        }
    }

    fn eval_call(&mut self, frame: &mut Frame, callee: &Expr, arguments: &[Argument]) -> EvalResult<Value> {
        match &callee.kind {
            ExprKind::Name(name) => {
                let Binding::Member(MemberRef::Declared(id)) = self.binding(callee)? else {
                    return Err(RuntimeError::Unsupported {
                        what: "invocation of a local or parameter",
                    });
                };
                let values = self.eval_arguments(frame, arguments)?;
                let method = self.find_method(id.owner, name, values.len())?;
                let this = if method.is_static {
                    None
                } else {
                    Some(frame.this()?.clone())
                };
                self.invoke(method, this, values)
            }
            ExprKind::MemberAccess { receiver, name } => {
                let receiver = self.eval(frame, receiver)?;
                let values = self.eval_arguments(frame, arguments)?;
                match receiver {
                    Value::Object(object) => {
                        let method = self.find_method(object.type_id(), name, values.len())?;
                        self.invoke(method, Some(object), values)
                    }
                    Value::Type(ty) => {
                        let method = self.find_method(ty, name, values.len())?;
                        if !method.is_static {
                            return Err(RuntimeError::trap(format!(
                                "{name} is an instance method"
                            )));
                        }
                        self.invoke(method, None, values)
                    }
                    other => Err(RuntimeError::TypeError {
                        op: "invocation",
                        expected: "object or type",
                        got: other.kind(),
                    }),
                }
            }
            _ => Err(RuntimeError::Unsupported {
                what: "invocation of a computed callee",
            }),
        }
    }

    fn eval_unary(&mut self, frame: &mut Frame, op: UnaryOp, operand: &Expr) -> EvalResult<Value> {
        let current = self.eval(frame, operand)?;
        match op {
            UnaryOp::Not => current
                .as_bool()
                .map(|b| Value::Bool(!b))
                .ok_or(RuntimeError::TypeError {
                    op: "!",
                    expected: "bool",
                    got: current.kind(),
                }),
            UnaryOp::Neg => {
                let v = int_operand("-", &current)?;
                v.checked_neg()
                    .map(Value::Int)
                    .ok_or(RuntimeError::Overflow { op: "-" })
            }
            UnaryOp::PreIncrement
            | UnaryOp::PostIncrement
            | UnaryOp::PreDecrement
            | UnaryOp::PostDecrement => {
                let v = int_operand("increment", &current)?;
                let delta = if matches!(op, UnaryOp::PreIncrement | UnaryOp::PostIncrement) {
                    1
                } else {
                    -1
                };
                let updated = v
                    .checked_add(delta)
                    .ok_or(RuntimeError::Overflow { op: "increment" })?;
                self.assign(frame, operand, Value::Int(updated))?;
                if matches!(op, UnaryOp::PreIncrement | UnaryOp::PreDecrement) {
                    Ok(Value::Int(updated))
                } else {
                    Ok(Value::Int(v))
                }
            }
        }
    }

    fn assign(&mut self, frame: &mut Frame, target: &Expr, value: Value) -> EvalResult<()> {
        match &target.kind {
            ExprKind::Name(name) => match self.binding(target)? {
                Binding::Local(node) => {
                    frame.locals.insert(*node, value);
                    Ok(())
                }
                Binding::Parameter(param) => frame.set_param(*param, value),
                Binding::Member(MemberRef::BackingField(param)) => {
                    let field = self.backing_field(*param)?;
                    frame.this()?.set_field(&field, value);
                    Ok(())
                }
                Binding::Member(MemberRef::Declared(id)) => {
                    let table = self.table;
                    let member = table.member(*id).ok_or_else(|| RuntimeError::Unresolved {
                        name: name.clone(),
                    })?;
                    let this = frame.this.clone();
                    self.write_member(this.as_ref(), member, value)
                }
                _ => Err(RuntimeError::Unresolved { name: name.clone() }),
            },
            ExprKind::MemberAccess { receiver, name } => match self.eval(frame, receiver)? {
                Value::Object(object) => {
                    let member = self.member_on(object.type_id(), name)?;
                    self.write_member(Some(&object), member, value)
                }
                Value::Type(ty) => {
                    let member = self.member_on(ty, name)?;
                    self.write_member(None, member, value)
                }
                other => Err(RuntimeError::TypeError {
                    op: "assignment",
                    expected: "object or type",
                    got: other.kind(),
                }),
            },
            _ => Err(RuntimeError::Unsupported {
                what: "assignment to a computed target",
            }),
        }
    }
}

/// The initializer of a field, property or event member.
fn initializer<'t>(ty: &'t TypeSymbol, member: &MemberSymbol) -> Option<&'t Expr> {
    match ty.member_syntax(member)? {
        MemberSyntax::Field(f) => f.initializer.as_ref(),
        MemberSyntax::Property(p) => p.initializer.as_ref(),
        MemberSyntax::Event(e) => e.initializer.as_ref(),
        _ => None,
    }
}

fn compound_operator(op: AssignOp) -> Option<BinaryOp> {
    match op {
        AssignOp::Assign => None,
        AssignOp::Add => Some(BinaryOp::Add),
        AssignOp::Sub => Some(BinaryOp::Sub),
        AssignOp::Mul => Some(BinaryOp::Mul),
    }
}

fn int_operand(op: &'static str, value: &Value) -> EvalResult<i64> {
    value.as_int().ok_or(RuntimeError::TypeError {
        op,
        expected: "int",
        got: value.kind(),
    })
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> EvalResult<Value> {
    match op {
        BinaryOp::Eq => return Ok(Value::Bool(left == right)),
        BinaryOp::Ne => return Ok(Value::Bool(left != right)),
        BinaryOp::Add if matches!(left, Value::Str(_)) || matches!(right, Value::Str(_)) => {
            return Ok(Value::str(&format!("{left}{right}")));
        }
        BinaryOp::And | BinaryOp::Or => {
            let (Some(a), Some(b)) = (left.as_bool(), right.as_bool()) else {
                return Err(RuntimeError::TypeError {
                    op: "logical operator",
                    expected: "bool",
                    got: left.kind(),
                });
            };
            return Ok(Value::Bool(if op == BinaryOp::And { a && b } else { a || b }));
        }
        _ => {}
    }
    let a = int_operand("arithmetic", left)?;
    let b = int_operand("arithmetic", right)?;
    let overflow = |op| RuntimeError::Overflow { op };
    Ok(match op {
        BinaryOp::Add => Value::Int(a.checked_add(b).ok_or_else(|| overflow("+"))?),
        BinaryOp::Sub => Value::Int(a.checked_sub(b).ok_or_else(|| overflow("-"))?),
        BinaryOp::Mul => Value::Int(a.checked_mul(b).ok_or_else(|| overflow("*"))?),
        BinaryOp::Div => {
            if b == 0 {
                return Err(RuntimeError::DivisionByZero);
            }
            Value::Int(a.checked_div(b).ok_or_else(|| overflow("/"))?)
        }
        BinaryOp::Lt => Value::Bool(a < b),
        BinaryOp::Gt => Value::Bool(a > b),
        BinaryOp::Eq | BinaryOp::Ne | BinaryOp::And | BinaryOp::Or => {
            return Err(RuntimeError::trap("operator handled above"));
        }
    })
}
