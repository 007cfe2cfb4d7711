//! Struct layout cycles and the unmanaged predicate.
//!
//! A struct embeds the value types of its instance fields, auto-properties
//! and captured-parameter backing fields. An embedding edge that lies on a
//! cycle makes the layout infinite.

use crate::symbol_table::SymbolTable;
use crate::symbols::{CapturedParameterField, MemberKind, TypeId, TypeSymbol};
use crate::types::TypeClass;
use primc_common::limits::MAX_LAYOUT_DEPTH;
use primc_common::{Diagnostic, DiagnosticCode, DiagnosticLocation, Span};
use primc_syntax::{MemberSyntax, NodeId, TypeKind, TypeRef};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

#[derive(Clone, Debug)]
enum EdgeOrigin {
    Field { name: String },
    Captured { parameter: String },
}

#[derive(Clone, Debug)]
struct LayoutEdge {
    from: TypeId,
    to: TypeId,
    origin: EdgeOrigin,
    type_text: String,
    node: NodeId,
    span: Span,
}

/// Results of the compilation-wide layout pass.
#[derive(Debug, Default)]
pub(crate) struct LayoutReport {
    pub diagnostics: Vec<Diagnostic>,
    /// Types whose captured-parameter edges close a cycle.
    pub cyclic_captures: FxHashSet<TypeId>,
    pub unmanaged: FxHashMap<TypeId, bool>,
}

/// Stored fields a struct lays out inline: explicit instance fields and
/// auto-properties, plus the backing fields of its captured parameters.
fn stored_fields<'a>(
    ty: &'a TypeSymbol,
    captured: &'a [CapturedParameterField],
) -> Vec<(&'a TypeRef, EdgeOrigin, NodeId, Span)> {
    let mut fields = Vec::new();
    for member in &ty.members {
        if member.is_static {
            continue;
        }
        let stored = match (member.kind, ty.member_syntax(member)) {
            (MemberKind::Field, _) => true,
            (MemberKind::Property, Some(MemberSyntax::Property(p))) => p.is_auto(),
            _ => false,
        };
        if stored && let Some(field_ty) = &member.ty {
            let origin = EdgeOrigin::Field {
                name: member.name.clone(),
            };
            fields.push((field_ty, origin, member.node, member.span));
        }
    }
    for field in captured {
        if let Some(param) = ty.parameter(field.parameter) {
            let origin = EdgeOrigin::Captured {
                parameter: param.name.clone(),
            };
            fields.push((&field.field_type, origin, param.node, param.span));
        }
    }
    fields
}

fn edges(
    table: &SymbolTable,
    captured: &FxHashMap<TypeId, Vec<CapturedParameterField>>,
) -> Vec<LayoutEdge> {
    let mut edges = Vec::new();
    for ty in table.types().iter().filter(|t| t.kind == TypeKind::Struct) {
        let captured_fields = captured.get(&ty.id).map(Vec::as_slice).unwrap_or_default();
        for (field_ty, origin, node, span) in stored_fields(ty, captured_fields) {
            if let Some(to) = table.embedded_value_type(field_ty, ty.id) {
                edges.push(LayoutEdge {
                    from: ty.id,
                    to,
                    origin,
                    type_text: field_ty.to_string(),
                    node,
                    span,
                });
            }
        }
    }
    edges
}

fn reaches(adjacency: &FxHashMap<TypeId, Vec<TypeId>>, from: TypeId, target: TypeId) -> bool {
    let mut visited = FxHashSet::default();
    let mut stack = vec![from];
    while let Some(current) = stack.pop() {
        if current == target {
            return true;
        }
        if !visited.insert(current) {
            continue;
        }
        if let Some(next) = adjacency.get(&current) {
            stack.extend(next.iter().copied());
        }
    }
    false
}

/// Check every struct's layout and compute the unmanaged predicate.
pub(crate) fn check_layout(
    table: &SymbolTable,
    captured: &FxHashMap<TypeId, Vec<CapturedParameterField>>,
) -> LayoutReport {
    let edges = edges(table, captured);
    let mut adjacency: FxHashMap<TypeId, Vec<TypeId>> = FxHashMap::default();
    for edge in &edges {
        adjacency.entry(edge.from).or_default().push(edge.to);
    }

    let mut report = LayoutReport::default();
    for edge in &edges {
        if !reaches(&adjacency, edge.to, edge.from) {
            continue;
        }
        let Some(owner) = table.get(edge.from) else {
            continue;
        };
        let location = DiagnosticLocation::new(&owner.name, edge.node.0, edge.span);
        trace!(from = %owner.name, to = %edge.type_text, "layout edge on cycle");
        let diagnostic = match &edge.origin {
            EdgeOrigin::Field { name } => Diagnostic::new(
                DiagnosticCode::StructLayoutCycle,
                location,
                &[name, &edge.type_text],
            ),
            EdgeOrigin::Captured { parameter } => {
                report.cyclic_captures.insert(edge.from);
                Diagnostic::new(
                    DiagnosticCode::StructLayoutCyclePrimaryConstructorParameter,
                    location,
                    &[parameter, &edge.type_text],
                )
            }
        };
        report.diagnostics.push(diagnostic);
    }

    let mut unmanaged = UnmanagedCache {
        table,
        captured,
        memo: FxHashMap::default(),
        in_progress: FxHashMap::default(),
    };
    for ty in table.types() {
        let (value, _) = unmanaged.type_is_unmanaged(ty.id, 0);
        report.unmanaged.insert(ty.id, value);
    }
    debug!(
        cycles = report.diagnostics.len(),
        "layout check complete"
    );
    report
}

/// Marker for a verdict that assumed nothing still being computed.
const SETTLED: u32 = u32::MAX;

struct UnmanagedCache<'a> {
    table: &'a SymbolTable,
    captured: &'a FxHashMap<TypeId, Vec<CapturedParameterField>>,
    memo: FxHashMap<TypeId, bool>,
    /// Structs on the current path, by depth.
    in_progress: FxHashMap<TypeId, u32>,
}

impl UnmanagedCache<'_> {
    /// The verdict for `id`, plus the shallowest in-progress struct it
    /// provisionally assumed unmanaged ([`SETTLED`] if none).
    ///
    /// A `false` verdict is always final. A `true` verdict is cached only
    /// once every struct it assumed has finished.
    fn type_is_unmanaged(&mut self, id: TypeId, depth: u32) -> (bool, u32) {
        if let Some(known) = self.memo.get(&id) {
            return (*known, SETTLED);
        }
        if let Some(&open) = self.in_progress.get(&id) {
            return (true, open);
        }
        if depth > MAX_LAYOUT_DEPTH {
            return (false, SETTLED);
        }
        let Some(ty) = self.table.get(id) else {
            return (false, SETTLED);
        };
        let (result, assumed) = match ty.kind {
            TypeKind::Enum => (true, SETTLED),
            TypeKind::Struct if !ty.is_ref_struct() => {
                self.in_progress.insert(id, depth);
                let captured = self.captured.get(&id).map(Vec::as_slice).unwrap_or_default();
                let mut assumed = SETTLED;
                let mut result = true;
                for (field_ty, ..) in stored_fields(ty, captured) {
                    let (field_ok, field_assumed) = self.field_is_unmanaged(field_ty, id, depth);
                    if !field_ok {
                        result = false;
                        break;
                    }
                    assumed = assumed.min(field_assumed);
                }
                self.in_progress.remove(&id);
                if result { (true, assumed) } else { (false, SETTLED) }
            }
            _ => (false, SETTLED),
        };
        if !result || assumed >= depth {
            self.memo.insert(id, result);
            return (result, SETTLED);
        }
        trace!(type_id = %id, assumed, "provisional unmanaged verdict");
        (result, assumed)
    }

    fn field_is_unmanaged(&mut self, ty: &TypeRef, context: TypeId, depth: u32) -> (bool, u32) {
        let class = self.table.classify(ty, context);
        self.class_is_unmanaged(&class, depth)
    }

    fn class_is_unmanaged(&mut self, class: &TypeClass, depth: u32) -> (bool, u32) {
        match class {
            TypeClass::Builtin(builtin) => (builtin.is_unmanaged(), SETTLED),
            TypeClass::Pointer => (true, SETTLED),
            TypeClass::User(id) => self.type_is_unmanaged(*id, depth + 1),
            TypeClass::Nullable(inner) => self.class_is_unmanaged(inner, depth),
            TypeClass::Array | TypeClass::TypeParameter | TypeClass::Unknown => (false, SETTLED),
        }
    }
}
