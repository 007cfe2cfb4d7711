//! `out` primary parameters must be assigned by the initializers and base
//! arguments before they are read, and by the end of them.

use super::ValidationInput;
use crate::occurrences::Access;
use primc_common::{Diagnostic, DiagnosticCode};
use primc_syntax::PassingMode;

pub(super) fn check(input: &ValidationInput<'_>, diagnostics: &mut Vec<Diagnostic>) {
    for param in input.ty.parameters() {
        if param.passing_mode != PassingMode::Out {
            continue;
        }
        let mut assigned = false;
        let uses = input
            .parameter_uses()
            .filter(|(b, p)| p.id == param.id && b.occurrence.scope.is_constructor_scope())
            .filter(|(b, _)| !b.occurrence.in_lambda);
        for (bound, _) in uses {
            let occ = &bound.occurrence;
            match occ.access {
                Access::Write | Access::OutArgument => {
                    if !occ.conditional {
                        assigned = true;
                    }
                }
                _ if !assigned => diagnostics.push(input.at_occurrence(
                    DiagnosticCode::UseOfUnassignedOutParameter,
                    bound,
                    &[&param.name],
                )),
                _ => {}
            }
        }
        if !assigned {
            diagnostics.push(input.at_parameter(
                DiagnosticCode::OutParameterUnassigned,
                param,
                &[&param.name],
            ));
        }
    }
}
