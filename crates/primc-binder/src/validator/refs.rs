//! Captures that cannot exist: by-reference and ref-like parameters, and
//! struct parameters seen through lambdas.

use super::ValidationInput;
use crate::resolver::Binding;
use primc_common::{Diagnostic, DiagnosticCode};
use primc_syntax::TypeKind;

pub(super) fn check(input: &ValidationInput<'_>, diagnostics: &mut Vec<Diagnostic>) {
    for bound in input.occurrences {
        let occ = &bound.occurrence;
        match bound.resolution.binding {
            Binding::Rejected(p) => {
                let Some(param) = input.own_parameter(p) else {
                    continue;
                };
                let code = if param.passing_mode.is_by_ref() {
                    if occ.scope.is_constructor_scope() && occ.in_lambda {
                        DiagnosticCode::AnonDelegateCantUseRefParameter
                    } else {
                        DiagnosticCode::UnsupportedCapturingRef
                    }
                } else {
                    DiagnosticCode::UnsupportedCapturingRefLike
                };
                diagnostics.push(input.at_occurrence(code, bound, &[&param.name]));
            }
            Binding::Parameter(p) if occ.in_lambda && occ.scope.is_constructor_scope() => {
                let Some(param) = input.own_parameter(p) else {
                    continue;
                };
                if param.passing_mode.is_by_ref() {
                    diagnostics.push(input.at_occurrence(
                        DiagnosticCode::AnonDelegateCantUseRefParameter,
                        bound,
                        &[&param.name],
                    ));
                }
            }
            _ => {}
        }
    }

    if input.ty.kind == TypeKind::Struct {
        for (bound, param) in input.backing_field_uses() {
            if !bound.occurrence.in_lambda {
                continue;
            }
            // Initializer lambdas bind the field only because a member captured it.
            let code = if bound.occurrence.scope.is_constructor_scope() {
                DiagnosticCode::AnonDelegateCantUseStructPrimaryConstructorParameterCaptured
            } else {
                DiagnosticCode::AnonDelegateCantUseStructPrimaryConstructorParameterInMember
            };
            diagnostics.push(input.at_occurrence(code, bound, &[&param.name]));
        }
    }
}
