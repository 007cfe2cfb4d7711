//! Tree traversal.
//!
//! [`Visitor`] is a read-only walk with overridable hooks; each hook's default
//! calls the matching `walk_*` function so an override can decide whether to
//! descend. [`number_nodes`] is the one mutating pass: it assigns every node
//! its [`NodeId`] in pre-order.

use crate::ast::*;

pub trait Visitor {
    fn visit_type_decl(&mut self, decl: &TypeDeclSyntax) {
        walk_type_decl(self, decl);
    }

    fn visit_parameter(&mut self, param: &ParameterSyntax) {
        if let Some(default) = &param.default_value {
            self.visit_expr(default);
        }
    }

    fn visit_member(&mut self, member: &MemberSyntax) {
        walk_member(self, member);
    }

    fn visit_body(&mut self, body: &Body) {
        walk_body(self, body);
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr);
    }
}

pub fn walk_type_decl<V: Visitor + ?Sized>(v: &mut V, decl: &TypeDeclSyntax) {
    for param in decl.parameter_list.iter().flatten() {
        v.visit_parameter(param);
    }
    for base in &decl.base_list {
        for arg in base.arguments.iter().flatten() {
            v.visit_expr(&arg.expr);
        }
    }
    for member in &decl.members {
        v.visit_member(member);
    }
}

pub fn walk_member<V: Visitor + ?Sized>(v: &mut V, member: &MemberSyntax) {
    match member {
        MemberSyntax::Field(field) => {
            if let Some(init) = &field.initializer {
                v.visit_expr(init);
            }
        }
        MemberSyntax::Property(prop) => {
            for param in &prop.parameters {
                v.visit_parameter(param);
            }
            for accessor in &prop.accessors {
                if let Some(body) = &accessor.body {
                    v.visit_body(body);
                }
            }
            if let Some(body) = &prop.expression_body {
                v.visit_expr(body);
            }
            if let Some(init) = &prop.initializer {
                v.visit_expr(init);
            }
        }
        MemberSyntax::Event(event) => {
            for accessor in &event.accessors {
                if let Some(body) = &accessor.body {
                    v.visit_body(body);
                }
            }
            if let Some(init) = &event.initializer {
                v.visit_expr(init);
            }
        }
        MemberSyntax::Method(method) => {
            for param in &method.parameters {
                v.visit_parameter(param);
            }
            if let Some(body) = &method.body {
                v.visit_body(body);
            }
        }
        MemberSyntax::Constructor(ctor) => {
            for param in &ctor.parameters {
                v.visit_parameter(param);
            }
            if let Some(init) = &ctor.initializer {
                for arg in &init.arguments {
                    v.visit_expr(&arg.expr);
                }
            }
            if let Some(body) = &ctor.body {
                v.visit_body(body);
            }
        }
        MemberSyntax::Destructor(dtor) => {
            if let Some(body) = &dtor.body {
                v.visit_body(body);
            }
        }
        MemberSyntax::NestedType(decl) => v.visit_type_decl(decl),
    }
}

pub fn walk_body<V: Visitor + ?Sized>(v: &mut V, body: &Body) {
    match body {
        Body::Block(block) => {
            for stmt in &block.statements {
                v.visit_stmt(stmt);
            }
        }
        Body::Expression(expr) => v.visit_expr(expr),
    }
}

pub fn walk_stmt<V: Visitor + ?Sized>(v: &mut V, stmt: &Stmt) {
    match &stmt.kind {
        StmtKind::Local { initializer, .. } => {
            if let Some(init) = initializer {
                v.visit_expr(init);
            }
        }
        StmtKind::Expression(expr) => v.visit_expr(expr),
        StmtKind::Return(value) => {
            if let Some(value) = value {
                v.visit_expr(value);
            }
        }
        StmtKind::Block(block) => {
            for stmt in &block.statements {
                v.visit_stmt(stmt);
            }
        }
        StmtKind::If {
            condition,
            then_branch,
            else_branch,
        } => {
            v.visit_expr(condition);
            v.visit_stmt(then_branch);
            if let Some(else_branch) = else_branch {
                v.visit_stmt(else_branch);
            }
        }
        StmtKind::While { condition, body } => {
            v.visit_expr(condition);
            v.visit_stmt(body);
        }
        StmtKind::Lock { subject, body } => {
            v.visit_expr(subject);
            v.visit_stmt(body);
        }
        StmtKind::Using { resource, body } => {
            v.visit_expr(resource);
            v.visit_stmt(body);
        }
        StmtKind::Fixed {
            initializer, body, ..
        } => {
            v.visit_expr(initializer);
            v.visit_stmt(body);
        }
        StmtKind::LocalFunction {
            parameters, body, ..
        } => {
            for param in parameters {
                v.visit_parameter(param);
            }
            v.visit_body(body);
        }
    }
}

pub fn walk_expr<V: Visitor + ?Sized>(v: &mut V, expr: &Expr) {
    match &expr.kind {
        ExprKind::Literal(_) | ExprKind::Name(_) | ExprKind::This | ExprKind::Default(_) => {}
        ExprKind::MemberAccess { receiver, .. } => v.visit_expr(receiver),
        ExprKind::Invocation { callee, arguments } => {
            v.visit_expr(callee);
            for arg in arguments {
                v.visit_expr(&arg.expr);
            }
        }
        ExprKind::ObjectCreation { arguments, .. } => {
            for arg in arguments {
                v.visit_expr(&arg.expr);
            }
        }
        ExprKind::Assignment { target, value, .. } => {
            v.visit_expr(target);
            v.visit_expr(value);
        }
        ExprKind::Binary { left, right, .. } => {
            v.visit_expr(left);
            v.visit_expr(right);
        }
        ExprKind::Unary { operand, .. } => v.visit_expr(operand),
        ExprKind::AddressOf(operand) | ExprKind::NameOf(operand) => v.visit_expr(operand),
        ExprKind::Lambda {
            parameters, body, ..
        } => {
            for param in parameters {
                v.visit_parameter(param);
            }
            v.visit_body(body);
        }
        ExprKind::Conditional {
            condition,
            when_true,
            when_false,
        } => {
            v.visit_expr(condition);
            v.visit_expr(when_true);
            v.visit_expr(when_false);
        }
    }
}

// =============================================================================
// Node numbering
// =============================================================================

/// Assign a fresh [`NodeId`] to every node of `decls`, in declaration order and
/// pre-order within each declaration. Existing ids are overwritten, so the
/// numbering depends only on tree shape. Returns the number of ids handed out.
pub fn number_nodes(decls: &mut [TypeDeclSyntax]) -> u32 {
    let mut numberer = Numberer { next: 0 };
    for decl in decls {
        numberer.type_decl(decl);
    }
    numberer.next
}

struct Numberer {
    next: u32,
}

impl Numberer {
    fn fresh(&mut self, id: &mut NodeId) {
        *id = NodeId(self.next);
        self.next += 1;
    }

    fn type_decl(&mut self, decl: &mut TypeDeclSyntax) {
        self.fresh(&mut decl.id);
        for param in decl.parameter_list.iter_mut().flatten() {
            self.parameter(param);
        }
        for base in &mut decl.base_list {
            self.fresh(&mut base.id);
            for arg in base.arguments.iter_mut().flatten() {
                self.expr(&mut arg.expr);
            }
        }
        for member in &mut decl.members {
            self.member(member);
        }
    }

    fn parameter(&mut self, param: &mut ParameterSyntax) {
        self.fresh(&mut param.id);
        if let Some(default) = &mut param.default_value {
            self.expr(default);
        }
    }

    fn accessors(&mut self, accessors: &mut [AccessorSyntax]) {
        for accessor in accessors {
            self.fresh(&mut accessor.id);
            if let Some(body) = &mut accessor.body {
                self.body(body);
            }
        }
    }

    fn member(&mut self, member: &mut MemberSyntax) {
        match member {
            MemberSyntax::Field(field) => {
                self.fresh(&mut field.id);
                if let Some(init) = &mut field.initializer {
                    self.expr(init);
                }
            }
            MemberSyntax::Property(prop) => {
                self.fresh(&mut prop.id);
                for param in &mut prop.parameters {
                    self.parameter(param);
                }
                self.accessors(&mut prop.accessors);
                if let Some(body) = &mut prop.expression_body {
                    self.expr(body);
                }
                if let Some(init) = &mut prop.initializer {
                    self.expr(init);
                }
            }
            MemberSyntax::Event(event) => {
                self.fresh(&mut event.id);
                self.accessors(&mut event.accessors);
                if let Some(init) = &mut event.initializer {
                    self.expr(init);
                }
            }
            MemberSyntax::Method(method) => {
                self.fresh(&mut method.id);
                for param in &mut method.parameters {
                    self.parameter(param);
                }
                if let Some(body) = &mut method.body {
                    self.body(body);
                }
            }
            MemberSyntax::Constructor(ctor) => {
                self.fresh(&mut ctor.id);
                for param in &mut ctor.parameters {
                    self.parameter(param);
                }
                if let Some(init) = &mut ctor.initializer {
                    self.fresh(&mut init.id);
                    for arg in &mut init.arguments {
                        self.expr(&mut arg.expr);
                    }
                }
                if let Some(body) = &mut ctor.body {
                    self.body(body);
                }
            }
            MemberSyntax::Destructor(dtor) => {
                self.fresh(&mut dtor.id);
                if let Some(body) = &mut dtor.body {
                    self.body(body);
                }
            }
            MemberSyntax::NestedType(decl) => self.type_decl(decl),
        }
    }

    fn block(&mut self, block: &mut Block) {
        self.fresh(&mut block.id);
        for stmt in &mut block.statements {
            self.stmt(stmt);
        }
    }

    fn body(&mut self, body: &mut Body) {
        match body {
            Body::Block(block) => self.block(block),
            Body::Expression(expr) => self.expr(expr),
        }
    }

    fn stmt(&mut self, stmt: &mut Stmt) {
        self.fresh(&mut stmt.id);
        match &mut stmt.kind {
            StmtKind::Local { initializer, .. } => {
                if let Some(init) = initializer {
                    self.expr(init);
                }
            }
            StmtKind::Expression(expr) => self.expr(expr),
            StmtKind::Return(value) => {
                if let Some(value) = value {
                    self.expr(value);
                }
            }
            StmtKind::Block(block) => self.block(block),
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.expr(condition);
                self.stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.stmt(else_branch);
                }
            }
            StmtKind::While { condition, body } => {
                self.expr(condition);
                self.stmt(body);
            }
            StmtKind::Lock { subject, body } => {
                self.expr(subject);
                self.stmt(body);
            }
            StmtKind::Using { resource, body } => {
                self.expr(resource);
                self.stmt(body);
            }
            StmtKind::Fixed {
                initializer, body, ..
            } => {
                self.expr(initializer);
                self.stmt(body);
            }
            StmtKind::LocalFunction {
                parameters, body, ..
            } => {
                for param in parameters {
                    self.parameter(param);
                }
                self.body(body);
            }
        }
    }

    fn expr(&mut self, expr: &mut Expr) {
        self.fresh(&mut expr.id);
        match &mut expr.kind {
            ExprKind::Literal(_) | ExprKind::Name(_) | ExprKind::This | ExprKind::Default(_) => {}
            ExprKind::MemberAccess { receiver, .. } => self.expr(receiver),
            ExprKind::Invocation { callee, arguments } => {
                self.expr(callee);
                for arg in arguments {
                    self.expr(&mut arg.expr);
                }
            }
            ExprKind::ObjectCreation { arguments, .. } => {
                for arg in arguments {
                    self.expr(&mut arg.expr);
                }
            }
            ExprKind::Assignment { target, value, .. } => {
                self.expr(target);
                self.expr(value);
            }
            ExprKind::Binary { left, right, .. } => {
                self.expr(left);
                self.expr(right);
            }
            ExprKind::Unary { operand, .. } => self.expr(operand),
            ExprKind::AddressOf(operand) | ExprKind::NameOf(operand) => self.expr(operand),
            ExprKind::Lambda {
                parameters, body, ..
            } => {
                for param in parameters {
                    self.parameter(param);
                }
                self.body(body);
            }
            ExprKind::Conditional {
                condition,
                when_true,
                when_false,
            } => {
                self.expr(condition);
                self.expr(when_true);
                self.expr(when_false);
            }
        }
    }
}
