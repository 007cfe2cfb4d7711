//! Warnings about parameters that are unread, stored twice, or hidden by
//! an inherited member.

use super::ValidationInput;
use crate::resolver::{Binding, MemberRef};
use crate::symbols::MemberKind;
use primc_common::{Diagnostic, DiagnosticCode};

pub(super) fn check(input: &ValidationInput<'_>, diagnostics: &mut Vec<Diagnostic>) {
    if input.options.report_unread_parameters && !input.ty.synthesis_blocked {
        unread(input, diagnostics);
    }
    if input.options.report_advisory_warnings {
        double_storage(input, diagnostics);
        shadowed_by_base(input, diagnostics);
    }
}

fn unread(input: &ValidationInput<'_>, diagnostics: &mut Vec<Diagnostic>) {
    for (param, usage) in input.ty.parameters().iter().zip(input.usages) {
        if !usage.referenced {
            diagnostics.push(input.at_parameter(
                DiagnosticCode::UnreadPrimaryConstructorParameter,
                param,
                &[&param.name],
            ));
        }
    }
}

/// A captured parameter also stored by a base constructor or an initializer.
fn double_storage(input: &ValidationInput<'_>, diagnostics: &mut Vec<Diagnostic>) {
    for (bound, param) in input.parameter_uses() {
        if !input.flags.is_captured(param.id) {
            continue;
        }
        let occ = &bound.occurrence;
        let code = if occ.is_exact_base_argument {
            DiagnosticCode::CapturedParameterPassedToBase
        } else if occ.is_exact_initializer {
            DiagnosticCode::CapturedParameterInFieldInitializer
        } else {
            continue;
        };
        diagnostics.push(input.at_occurrence(code, bound, &[&param.name]));
    }
}

/// Member code names an inherited instance member that a parameter of the
/// same name would otherwise have meant, and the parameter never reaches the
/// base.
fn shadowed_by_base(input: &ValidationInput<'_>, diagnostics: &mut Vec<Diagnostic>) {
    let Some(base) = input.ty.base_type.and_then(|b| input.table.get(b)) else {
        return;
    };
    for (param, usage) in input.ty.parameters().iter().zip(input.usages) {
        if usage.passed_to_base {
            continue;
        }
        let hidden = input.occurrences.iter().any(|bound| {
            bound.occurrence.name == param.name
                && !bound.occurrence.scope.is_constructor_scope()
                && matches!(
                    bound.resolution.binding,
                    Binding::Member(MemberRef::Declared(m))
                        if m.owner != input.ty.id
                            && input.table.member(m).is_some_and(|s| {
                                !s.is_static && s.kind != MemberKind::NestedType
                            })
                )
        });
        if hidden {
            diagnostics.push(input.at_parameter(
                DiagnosticCode::CapturedParameterIsShadowedAndNotPassedToBase,
                param,
                &[&param.name, &base.name],
            ));
        }
    }
}
