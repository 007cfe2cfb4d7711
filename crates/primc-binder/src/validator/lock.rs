//! Assignments to a parameter that guards an enclosing `lock` or `using`.

use super::ValidationInput;
use primc_common::{Diagnostic, DiagnosticCode};
use primc_syntax::NodeId;
use rustc_hash::FxHashMap;

pub(super) fn check(input: &ValidationInput<'_>, diagnostics: &mut Vec<Diagnostic>) {
    let referenced: FxHashMap<NodeId, _> = input
        .occurrences
        .iter()
        .filter_map(|b| {
            b.resolution
                .binding
                .referenced_parameter()
                .map(|p| (b.occurrence.node, p))
        })
        .collect();

    for bound in input.occurrences {
        let occ = &bound.occurrence;
        if !occ.access.is_write() || occ.guards.is_empty() {
            continue;
        }
        let Some(param) = bound.resolution.binding.referenced_parameter() else {
            continue;
        };
        if param.owner != input.ty.id {
            continue;
        }
        if occ.guards.iter().any(|g| referenced.get(g) == Some(&param)) {
            diagnostics.push(input.at_occurrence(
                DiagnosticCode::AssignmentToLockOrDispose,
                bound,
                &[&occ.name],
            ));
        }
    }
}
