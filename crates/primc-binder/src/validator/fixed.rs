//! Address-of on parameters and their backing fields.

use super::ValidationInput;
use crate::occurrences::Access;
use primc_common::{Diagnostic, DiagnosticCode};

pub(super) fn check(input: &ValidationInput<'_>, diagnostics: &mut Vec<Diagnostic>) {
    for (bound, param) in input.backing_field_uses() {
        let occ = &bound.occurrence;
        if occ.access == Access::AddressOf && !occ.in_fixed_initializer {
            diagnostics.push(input.at_occurrence(DiagnosticCode::FixedNeeded, bound, &[&param.name]));
        }
    }
    for (bound, param) in input.parameter_uses() {
        let occ = &bound.occurrence;
        if occ.access == Access::AddressOf && occ.in_fixed_initializer {
            diagnostics.push(input.at_occurrence(
                DiagnosticCode::FixedNotNeeded,
                bound,
                &[&param.name],
            ));
        }
    }
}
