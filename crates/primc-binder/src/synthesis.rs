//! Synthesis of the primary constructor, its captured-parameter fields and
//! the parameterless constructor of value types.

use crate::capture::{BoundOccurrence, CaptureFlags};
use crate::occurrences::initializer_of;
use crate::symbol_table::SymbolTable;
use crate::symbols::{
    Accessibility, CapturedParameterField, ConstructorCall, ConstructorPlan, InitStep, MemberKind,
    SynthesizedDefaultConstructor, SynthesizedPrimaryConstructor, TypeId, TypeSymbol,
};
use primc_common::{Diagnostic, DiagnosticCode, DiagnosticLocation};
use primc_syntax::{NodeId, PassingMode, TypeKind};
use rustc_hash::FxHashSet;
use std::collections::BTreeSet;
use tracing::debug;

/// Errors that always belong to the primary constructor.
const CONSTRUCTOR_ERRORS: &[DiagnosticCode] = &[
    DiagnosticCode::NoMatchingBaseConstructor,
    DiagnosticCode::UseOfUnassignedOutParameter,
    DiagnosticCode::OutParameterUnassigned,
    DiagnosticCode::AnonDelegateCantUseRefParameter,
    DiagnosticCode::DefaultValueMustBeConstant,
];

#[derive(Debug, Default)]
pub(crate) struct Synthesized {
    pub primary: Option<SynthesizedPrimaryConstructor>,
    pub default_constructor: Option<SynthesizedDefaultConstructor>,
    pub fields: Vec<CapturedParameterField>,
}

pub(crate) struct SynthesisInput<'a> {
    pub table: &'a SymbolTable,
    pub ty: &'a TypeSymbol,
    pub flags: &'a CaptureFlags,
    pub occurrences: &'a [BoundOccurrence],
    /// Base types whose own analysis reported errors; no base-call error is
    /// repeated for them.
    pub failed_bases: &'a FxHashSet<TypeId>,
}

pub(crate) fn synthesize(
    input: &SynthesisInput<'_>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Synthesized {
    let ty = input.ty;
    if !ty.has_primary_constructor() || ty.synthesis_blocked {
        return Synthesized::default();
    }

    let fields = captured_fields(input);
    let base_call = base_call(input, diagnostics);

    let mut steps: Vec<InitStep> = fields
        .iter()
        .map(|f| InitStep::StoreBackingField {
            parameter: f.parameter,
            field: f.backing_field_name.clone(),
        })
        .collect();
    for member in &ty.members {
        if member.is_static
            || !matches!(member.kind, MemberKind::Field | MemberKind::Property | MemberKind::Event)
        {
            continue;
        }
        if let Some(init) = initializer_of(ty, member.id) {
            steps.push(InitStep::RunInitializer {
                member: member.id,
                name: member.name.clone(),
                node: init.id,
            });
        }
    }
    if base_call.is_some() {
        steps.push(InitStep::CallBase);
    }

    let has_errors = constructor_has_errors(input, diagnostics);
    let primary = SynthesizedPrimaryConstructor {
        owner: ty.id,
        owner_name: ty.name.clone(),
        parameters: ty.parameters().to_vec(),
        accessibility: if ty.is_abstract() {
            Accessibility::Protected
        } else {
            Accessibility::Public
        },
        base_or_this_call: base_call,
        captured_parameters: fields.iter().map(|f| f.parameter).collect::<BTreeSet<_>>(),
        plan: ConstructorPlan { steps },
        has_errors,
    };

    let default_constructor = (ty.kind == TypeKind::Struct
        && !ty.parameters().is_empty()
        && !ty
            .instance_constructors()
            .any(|c| c.parameters.is_empty()))
    .then(|| SynthesizedDefaultConstructor {
        owner: ty.id,
        plan: ConstructorPlan {
            steps: vec![InitStep::ZeroInit],
        },
    });

    debug!(
        type_name = %ty.name,
        captured = fields.len(),
        has_errors,
        "primary constructor synthesized"
    );
    Synthesized {
        primary: Some(primary),
        default_constructor,
        fields,
    }
}

fn captured_fields(input: &SynthesisInput<'_>) -> Vec<CapturedParameterField> {
    let ty = input.ty;
    ty.parameters()
        .iter()
        .filter(|p| input.flags.is_captured(p.id))
        .map(|p| CapturedParameterField {
            parameter: p.id,
            parameter_name: p.name.clone(),
            backing_field_name: p.backing_field_name(),
            field_type: p.declared_type.clone(),
            is_readonly: ty.is_readonly_struct() && p.passing_mode == PassingMode::Value,
            initial_value: p.id,
        })
        .collect()
}

/// The implicit base call of a class: the primary part's argument list, or
/// an argument-less call to a user base class.
fn base_call(
    input: &SynthesisInput<'_>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<ConstructorCall> {
    let ty = input.ty;
    if ty.kind != TypeKind::Class {
        return None;
    }
    let with_args = ty.base_list.iter().find(|e| {
        e.arguments.is_some()
            && Some(e.part) == ty.primary_part
            && e.target.and_then(|t| input.table.get(t)).is_none_or(|t| t.kind == TypeKind::Class)
    });
    let entry = with_args.or_else(|| {
        ty.base_type
            .and_then(|b| ty.base_list.iter().find(|e| e.target == Some(b)))
    })?;
    let arguments = entry.arguments.as_deref().unwrap_or_default();
    let modes: Vec<PassingMode> = arguments.iter().map(|a| a.mode).collect();

    let target = entry.target.and_then(|base| {
        let found = input.table.select_constructor(base, &modes);
        if found.is_none() && !input.failed_bases.contains(&base) {
            let base_name = input.table.get(base).map_or("", |b| b.name.as_str());
            diagnostics.push(Diagnostic::new(
                DiagnosticCode::NoMatchingBaseConstructor,
                DiagnosticLocation::new(&ty.name, entry.node.0, entry.span),
                &[base_name, &modes.len().to_string()],
            ));
        }
        found
    });

    Some(ConstructorCall {
        base_type: entry.ty.clone(),
        target,
        arguments: arguments.iter().map(|a| (a.mode, a.expr.id)).collect(),
        node: entry.node,
    })
}

/// Errors at parameter declarations, base-list entries or constructor-scope
/// occurrences block code generation for the primary constructor.
fn constructor_has_errors(input: &SynthesisInput<'_>, diagnostics: &[Diagnostic]) -> bool {
    let ty = input.ty;
    let mut nodes: FxHashSet<NodeId> = ty.parameters().iter().map(|p| p.node).collect();
    nodes.extend(ty.base_list.iter().map(|e| e.node));
    nodes.extend(
        input
            .occurrences
            .iter()
            .filter(|b| b.occurrence.scope.is_constructor_scope())
            .map(|b| b.occurrence.node),
    );
    let declaration_errors = input
        .table
        .diagnostics()
        .iter()
        .filter(|d| d.location.type_name == ty.name);
    diagnostics
        .iter()
        .chain(declaration_errors)
        .filter(|d| d.is_error())
        .any(|d| CONSTRUCTOR_ERRORS.contains(&d.code) || nodes.contains(&NodeId(d.location.node)))
}
