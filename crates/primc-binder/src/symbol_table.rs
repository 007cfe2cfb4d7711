//! The shared, read-only symbol table of one compilation.
//!
//! Built once from numbered syntax: partial parts are merged, members and
//! primary parameters are collected, base lists are resolved, and
//! declaration-shape errors are reported. Nothing here looks inside member
//! bodies.

use crate::error::AnalysisError;
use crate::symbols::{
    BaseEntry, ConstructorParameter, ConstructorTarget, MemberId, MemberKind, MemberSymbol,
    ParamId, ParamSignature, TypeId, TypeSymbol, signature_accepts,
};
use primc_common::limits::MAX_BASE_CHAIN_LENGTH;
use primc_common::{Diagnostic, DiagnosticCode, DiagnosticLocation, Span};
use primc_syntax::{
    Expr, ExprKind, InitializerKind, MemberSyntax, Modifiers, NodeId, ParameterSyntax,
    PassingMode, TypeDeclSyntax, TypeKind,
};
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;
use tracing::{debug, trace};

#[derive(Debug, Default)]
pub struct SymbolTable {
    types: Vec<TypeSymbol>,
    /// `(containing type, simple name)` -> type.
    scopes: FxHashMap<(Option<TypeId>, String), TypeId>,
    diagnostics: Vec<Diagnostic>,
}

impl SymbolTable {
    /// Build the table from numbered declarations.
    #[tracing::instrument(level = "debug", skip_all, fields(parts = decls.len()))]
    pub fn build(decls: &[TypeDeclSyntax]) -> Self {
        let mut table = Self::default();
        for decl in decls {
            table.declare(decl, None);
        }
        for index in 0..table.types.len() {
            table.collect_members(index);
        }
        for index in 0..table.types.len() {
            table.resolve_base_list(index);
        }
        for index in 0..table.types.len() {
            table.collect_primary_parameters(index);
            table.check_declaration_shape(index);
        }
        table.check_circular_bases();
        debug!(
            types = table.types.len(),
            diagnostics = table.diagnostics.len(),
            "symbol table built"
        );
        table
    }

    fn declare(&mut self, decl: &TypeDeclSyntax, containing: Option<TypeId>) -> TypeId {
        let key = (containing, decl.name.clone());
        let id = if let Some(&id) = self.scopes.get(&key) {
            trace!(name = %decl.name, "merging partial part");
            id
        } else {
            let id = TypeId(self.types.len() as u32);
            self.types.push(TypeSymbol {
                id,
                name: decl.name.clone(),
                kind: decl.kind,
                modifiers: Modifiers::empty(),
                parts: Vec::new(),
                containing,
                base_list: Vec::new(),
                base_type: None,
                interfaces: Vec::new(),
                members: Vec::new(),
                primary_parameters: None,
                primary_part: None,
                synthesis_blocked: false,
            });
            self.scopes.insert(key, id);
            id
        };
        let ty = &mut self.types[id.index()];
        ty.modifiers |= decl.modifiers;
        ty.parts.push(Arc::new(decl.clone()));
        for nested in decl.nested_types() {
            self.declare(nested, Some(id));
        }
        id
    }

    fn collect_members(&mut self, index: usize) {
        let owner = self.types[index].id;
        let is_enum = self.types[index].kind == TypeKind::Enum;
        let parts = self.types[index].parts.clone();
        let mut members = Vec::new();
        for (part_index, part) in parts.iter().enumerate() {
            for (position, member) in part.members.iter().enumerate() {
                let id = MemberId {
                    owner,
                    index: members.len() as u32,
                };
                let mut symbol = member_symbol(id, member, part_index, position);
                if let MemberSyntax::NestedType(decl) = member {
                    symbol.nested_type = self.scopes.get(&(Some(owner), decl.name.clone())).copied();
                }
                if is_enum && symbol.kind == MemberKind::Field {
                    symbol.is_static = true;
                }
                members.push(symbol);
            }
        }
        self.types[index].members = members;
    }

    fn resolve_base_list(&mut self, index: usize) {
        let mut entries = Vec::new();
        for (part_index, part) in self.types[index].parts.iter().enumerate() {
            for base in &part.base_list {
                let target = base
                    .ty
                    .simple_name()
                    .and_then(|name| self.lookup_type(name, self.types[index].containing));
                entries.push(BaseEntry {
                    ty: base.ty.clone(),
                    target,
                    arguments: base.arguments.clone(),
                    part: part_index,
                    node: base.id,
                    span: base.span,
                });
            }
        }
        let mut base_type = None;
        let mut interfaces = Vec::new();
        for entry in &entries {
            let Some(target) = entry.target else {
                continue;
            };
            match self.types[target.index()].kind {
                TypeKind::Interface => interfaces.push(target),
                TypeKind::Class if base_type.is_none() => base_type = Some(target),
                _ => {}
            }
        }
        let ty = &mut self.types[index];
        if ty.kind == TypeKind::Class {
            ty.base_type = base_type;
        }
        ty.interfaces = interfaces;
        ty.base_list = entries;
    }

    fn collect_primary_parameters(&mut self, index: usize) {
        let ty = &self.types[index];
        let with_list: Vec<usize> = ty
            .parts
            .iter()
            .enumerate()
            .filter(|(_, part)| part.parameter_list.is_some())
            .map(|(i, _)| i)
            .collect();
        let Some(&first) = with_list.first() else {
            return;
        };
        let authoritative = with_list
            .iter()
            .copied()
            .find(|&i| {
                ty.parts[i]
                    .parameter_list
                    .as_ref()
                    .is_some_and(|list| !list.is_empty())
            })
            .unwrap_or(first);

        let mut errors = Vec::new();
        for &other in &with_list {
            let part = &ty.parts[other];
            let non_empty = part.parameter_list.as_ref().is_some_and(|l| !l.is_empty());
            if other != authoritative && non_empty {
                errors.push(Diagnostic::new(
                    DiagnosticCode::MultipleRecordParameterLists,
                    DiagnosticLocation::new(&ty.name, part.id.0, part.parameter_list_span),
                    &[],
                ));
            }
        }

        let owner = ty.id;
        let params: Vec<ConstructorParameter> = ty.parts[authoritative]
            .parameter_list
            .iter()
            .flatten()
            .enumerate()
            .map(|(ordinal, param)| constructor_parameter(owner, ordinal as u32, param))
            .collect();

        let ty = &mut self.types[index];
        ty.primary_parameters = Some(params);
        ty.primary_part = Some(authoritative);
        if !errors.is_empty() {
            ty.synthesis_blocked = true;
            self.diagnostics.extend(errors);
        }
    }

    fn check_declaration_shape(&mut self, index: usize) {
        let mut diags = Vec::new();
        let mut blocked = false;
        let ty = &self.types[index];
        let (anchor_node, anchor_span) = ty.anchor();
        let at = |node: NodeId, span: Span| DiagnosticLocation::new(&ty.name, node.0, span);

        if let Some(params) = &ty.primary_parameters {
            match ty.kind {
                TypeKind::Interface | TypeKind::Enum => {
                    diags.push(Diagnostic::new(
                        DiagnosticCode::UnexpectedParameterList,
                        at(anchor_node, anchor_span),
                        &[&ty.name],
                    ));
                    blocked = true;
                }
                TypeKind::Class if ty.is_static_class() => {
                    diags.push(Diagnostic::new(
                        DiagnosticCode::ConstructorInStaticClass,
                        at(anchor_node, anchor_span),
                        &[&ty.name],
                    ));
                    blocked = true;
                }
                _ => {}
            }

            let mut seen = FxHashSet::default();
            for param in params {
                if !seen.insert(param.name.as_str()) {
                    diags.push(Diagnostic::new(
                        DiagnosticCode::DuplicateParameterName,
                        at(param.node, param.span),
                        &[&param.name],
                    ));
                    blocked = true;
                }
                if let Some(default) = &param.default_value
                    && !is_constant(default)
                {
                    diags.push(Diagnostic::new(
                        DiagnosticCode::DefaultValueMustBeConstant,
                        at(default.id, default.span),
                        &[&param.name],
                    ));
                }
            }

            let primary: Vec<ParamSignature> = params.iter().map(|p| p.signature()).collect();
            for ctor in ty.instance_constructors() {
                if same_signature(&ctor.parameters, &primary) {
                    diags.push(Diagnostic::new(
                        DiagnosticCode::MemberAlreadyExists,
                        at(ctor.node, ctor.span),
                        &[&ty.name],
                    ));
                    blocked = true;
                    continue;
                }
                let chains_to_this = matches!(
                    ty.member_syntax(ctor),
                    Some(MemberSyntax::Constructor(syntax))
                        if syntax.initializer.as_ref().is_some_and(|i| i.kind == InitializerKind::This)
                );
                if !chains_to_this {
                    diags.push(Diagnostic::new(
                        DiagnosticCode::InstanceConstructorMustHaveThisInitializer,
                        at(ctor.node, ctor.span),
                        &[],
                    ));
                }
            }
        }

        for entry in &ty.base_list {
            if entry.arguments.is_none() {
                continue;
            }
            let names_interface = entry
                .target
                .is_some_and(|t| self.types[t.index()].kind == TypeKind::Interface);
            if ty.primary_part != Some(entry.part)
                || ty.kind != TypeKind::Class
                || names_interface
            {
                diags.push(Diagnostic::new(
                    DiagnosticCode::UnexpectedArgumentList,
                    at(entry.node, entry.span),
                    &[],
                ));
            }
        }

        if !ty.is_ref_struct() {
            for member in &ty.members {
                let stores_value = match member.kind {
                    MemberKind::Field => true,
                    MemberKind::Property => matches!(
                        ty.member_syntax(member),
                        Some(MemberSyntax::Property(p)) if p.is_auto()
                    ),
                    _ => false,
                };
                if !stores_value || member.is_static {
                    continue;
                }
                if let Some(field_ty) = &member.ty
                    && self.is_ref_like(field_ty, ty.id)
                {
                    diags.push(Diagnostic::new(
                        DiagnosticCode::FieldCantBeRefLike,
                        at(member.node, member.span),
                        &[&field_ty.to_string()],
                    ));
                }
            }
        }

        if blocked {
            self.types[index].synthesis_blocked = true;
        }
        self.diagnostics.extend(diags);
    }

    fn check_circular_bases(&mut self) {
        let mut in_cycle = FxHashSet::default();
        for ty in &self.types {
            let mut seen = FxHashSet::default();
            let mut current = ty.base_type;
            while let Some(id) = current {
                if id == ty.id {
                    in_cycle.insert(ty.id);
                    break;
                }
                if !seen.insert(id) {
                    break;
                }
                current = self.types[id.index()].base_type;
            }
        }
        let mut cyclic: Vec<TypeId> = in_cycle.into_iter().collect();
        cyclic.sort();
        for id in cyclic {
            let ty = &self.types[id.index()];
            let base_name = ty
                .base_type
                .map(|b| self.types[b.index()].name.clone())
                .unwrap_or_default();
            let (node, span) = ty
                .base_list
                .iter()
                .find(|e| e.target == ty.base_type)
                .map_or_else(|| ty.anchor(), |e| (e.node, e.span));
            debug!(ty = %ty.name, base = %base_name, "circular base");
            self.diagnostics.push(Diagnostic::new(
                DiagnosticCode::CircularBase,
                DiagnosticLocation::new(&ty.name, node.0, span),
                &[&ty.name, &base_name],
            ));
            let ty = &mut self.types[id.index()];
            ty.base_type = None;
            ty.synthesis_blocked = true;
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    #[must_use]
    pub fn types(&self) -> &[TypeSymbol] {
        &self.types
    }

    #[must_use]
    pub fn get(&self, id: TypeId) -> Option<&TypeSymbol> {
        self.types.get(id.index())
    }

    /// Declaration-shape diagnostics found while building.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    #[must_use]
    pub fn member(&self, id: MemberId) -> Option<&MemberSymbol> {
        self.get(id.owner)?.member(id)
    }

    #[must_use]
    pub fn parameter(&self, id: ParamId) -> Option<&ConstructorParameter> {
        self.get(id.owner)?.parameter(id)
    }

    /// Find a type by simple name: types nested in `context` and its
    /// containing types first, then top-level types.
    #[must_use]
    pub fn lookup_type(&self, name: &str, context: Option<TypeId>) -> Option<TypeId> {
        let mut current = context;
        while let Some(id) = current {
            if let Some(&found) = self.scopes.get(&(Some(id), name.to_string())) {
                return Some(found);
            }
            if let Some(ty) = self.get(id)
                && ty.name == name
            {
                return Some(id);
            }
            current = self.get(id).and_then(|t| t.containing);
        }
        self.scopes.get(&(None, name.to_string())).copied()
    }

    /// `ty` followed by its base classes, bounded by `MAX_BASE_CHAIN_LENGTH`.
    pub fn base_chain(&self, ty: TypeId) -> impl Iterator<Item = &TypeSymbol> {
        let mut current = self.get(ty);
        std::iter::from_fn(move || {
            let ty = current?;
            current = ty.base_type.and_then(|b| self.get(b));
            Some(ty)
        })
        .take(MAX_BASE_CHAIN_LENGTH)
    }

    /// Named members of `ty` called `name`: own members first, then the first
    /// base class declaring inheritable members with that name.
    #[must_use]
    pub fn lookup_members(&self, ty: TypeId, name: &str) -> Vec<&MemberSymbol> {
        for (depth, current) in self.base_chain(ty).enumerate() {
            let found: Vec<&MemberSymbol> = current
                .members_named(name)
                .filter(|m| depth == 0 || m.is_inheritable())
                .collect();
            if !found.is_empty() {
                return found;
            }
        }
        Vec::new()
    }

    /// First member of [`Self::lookup_members`].
    #[must_use]
    pub fn lookup_member(&self, ty: TypeId, name: &str) -> Option<&MemberSymbol> {
        self.lookup_members(ty, name).into_iter().next()
    }

    /// Every member called `name` on `ty` and all of its base classes,
    /// including hidden ones; used for static/instance applicability.
    #[must_use]
    pub fn all_members_named(&self, ty: TypeId, name: &str) -> Vec<&MemberSymbol> {
        self.base_chain(ty)
            .enumerate()
            .flat_map(|(depth, current)| {
                current
                    .members_named(name)
                    .filter(move |m| depth == 0 || m.is_inheritable())
            })
            .collect()
    }

    /// Select the constructor of `ty` a call with `args` binds to.
    ///
    /// Candidates are the primary constructor, then explicit instance
    /// constructors in declaration order; a type with neither has the
    /// implicit parameterless one. The first applicable candidate wins.
    #[must_use]
    pub fn select_constructor(&self, ty: TypeId, args: &[PassingMode]) -> Option<ConstructorTarget> {
        let target = self.get(ty)?;
        if let Some(params) = &target.primary_parameters {
            let sig: Vec<ParamSignature> = params.iter().map(|p| p.signature()).collect();
            if signature_accepts(&sig, args) {
                return Some(ConstructorTarget::Primary(ty));
            }
        }
        let mut explicit = target.instance_constructors().peekable();
        if explicit.peek().is_none() && target.primary_parameters.is_none() {
            return args.is_empty().then_some(ConstructorTarget::Implicit(ty));
        }
        explicit
            .find(|ctor| ctor.accepts(args))
            .map(|ctor| ConstructorTarget::Explicit(ctor.id))
    }

    /// Group types into levels so every type's base class sits in an earlier
    /// level. Types of one level are independent of each other.
    pub fn topological_levels(&self) -> Result<Vec<Vec<TypeId>>, AnalysisError> {
        let mut depth_of = vec![None::<usize>; self.types.len()];
        for ty in &self.types {
            let mut chain = Vec::new();
            let mut current = Some(ty.id);
            let mut known = 0;
            while let Some(id) = current {
                if let Some(depth) = depth_of[id.index()] {
                    known = depth + 1;
                    break;
                }
                chain.push(id);
                if chain.len() > MAX_BASE_CHAIN_LENGTH {
                    return Err(AnalysisError::BaseChainTooLong {
                        type_name: ty.name.clone(),
                        limit: MAX_BASE_CHAIN_LENGTH,
                    });
                }
                current = self.types[id.index()].base_type;
            }
            for (offset, id) in chain.iter().rev().enumerate() {
                depth_of[id.index()] = Some(known + offset);
            }
        }
        let mut levels: Vec<Vec<TypeId>> = Vec::new();
        for (index, depth) in depth_of.into_iter().enumerate() {
            let depth = depth.unwrap_or_default();
            if levels.len() <= depth {
                levels.resize_with(depth + 1, Vec::new);
            }
            levels[depth].push(TypeId(index as u32));
        }
        Ok(levels)
    }
}

fn member_symbol(id: MemberId, member: &MemberSyntax, part: usize, position: usize) -> MemberSymbol {
    let signature = |params: &[ParameterSyntax]| -> Vec<ParamSignature> {
        params
            .iter()
            .map(|p| ParamSignature {
                ty: p.ty.clone(),
                mode: p.mode,
                has_default: p.default_value.is_some(),
            })
            .collect()
    };
    let modifiers = member.modifiers();
    let mut symbol = MemberSymbol {
        id,
        name: String::new(),
        kind: MemberKind::Field,
        modifiers,
        is_static: modifiers.intersects(Modifiers::STATIC | Modifiers::CONST),
        ty: None,
        parameters: Vec::new(),
        nested_type: None,
        part,
        position,
        node: member.id(),
        span: Span::default(),
    };
    match member {
        MemberSyntax::Field(f) => {
            symbol.name.clone_from(&f.name);
            symbol.ty = Some(f.ty.clone());
            symbol.span = f.span;
        }
        MemberSyntax::Property(p) => {
            symbol.kind = if p.parameters.is_empty() {
                MemberKind::Property
            } else {
                MemberKind::Indexer
            };
            symbol.name.clone_from(&p.name);
            symbol.ty = Some(p.ty.clone());
            symbol.parameters = signature(&p.parameters);
            symbol.span = p.span;
        }
        MemberSyntax::Event(e) => {
            symbol.kind = MemberKind::Event;
            symbol.name.clone_from(&e.name);
            symbol.ty = Some(e.ty.clone());
            symbol.span = e.span;
        }
        MemberSyntax::Method(m) => {
            symbol.kind = MemberKind::Method;
            symbol.name.clone_from(&m.name);
            symbol.ty = Some(m.return_type.clone());
            symbol.parameters = signature(&m.parameters);
            symbol.span = m.span;
        }
        MemberSyntax::Constructor(c) => {
            symbol.kind = if symbol.is_static {
                MemberKind::StaticConstructor
            } else {
                MemberKind::Constructor
            };
            symbol.name = ".ctor".to_string();
            symbol.parameters = signature(&c.parameters);
            symbol.span = c.span;
        }
        MemberSyntax::Destructor(d) => {
            symbol.kind = MemberKind::Destructor;
            symbol.name = "Finalize".to_string();
            symbol.span = d.span;
        }
        MemberSyntax::NestedType(t) => {
            symbol.kind = MemberKind::NestedType;
            symbol.name.clone_from(&t.name);
            symbol.is_static = true;
            symbol.span = t.span;
        }
    }
    symbol
}

fn constructor_parameter(owner: TypeId, ordinal: u32, param: &ParameterSyntax) -> ConstructorParameter {
    ConstructorParameter {
        id: ParamId { owner, ordinal },
        name: param.name.clone(),
        declared_type: param.ty.clone(),
        passing_mode: param.mode,
        default_value: param.default_value.clone(),
        ordinal,
        node: param.id,
        span: param.span,
    }
}

fn same_signature(a: &[ParamSignature], b: &[ParamSignature]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.ty == y.ty && x.mode == y.mode)
}

/// Literals, `default`, and unary/binary/conditional arithmetic over them.
fn is_constant(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Literal(_) | ExprKind::Default(_) | ExprKind::NameOf(_) => true,
        ExprKind::Unary { op, operand } => !op.writes_operand() && is_constant(operand),
        ExprKind::Binary { left, right, .. } => is_constant(left) && is_constant(right),
        ExprKind::Conditional {
            condition,
            when_true,
            when_false,
        } => is_constant(condition) && is_constant(when_true) && is_constant(when_false),
        _ => false,
    }
}
