//! Writes to the backing fields of a readonly struct or from a readonly
//! member.

use super::ValidationInput;
use crate::occurrences::Access;
use crate::symbols::ConstructorParameter;
use crate::types::TypeClass;
use primc_common::{Diagnostic, DiagnosticCode};
use primc_syntax::TypeKind;

pub(super) fn check(input: &ValidationInput<'_>, diagnostics: &mut Vec<Diagnostic>) {
    if input.ty.kind != TypeKind::Struct {
        return;
    }
    let readonly_type = input.ty.is_readonly_struct();
    for (bound, param) in input.backing_field_uses() {
        let occ = &bound.occurrence;
        if !(readonly_type || occ.in_readonly_member) || occ.in_init_accessor {
            continue;
        }
        let code = if occ.access.is_write() {
            DiagnosticCode::AssignReadonlyPrimaryConstructorParameter
        } else if occ.access == Access::WriteThrough
            && writes_inline(input, param, &occ.member_path)
        {
            DiagnosticCode::AssignReadonlyPrimaryConstructorParameter2
        } else {
            continue;
        };
        diagnostics.push(input.at_occurrence(code, bound, &[&param.name]));
    }
}

/// The written location lives inside the backing field: the parameter and
/// every member before the last one in `path` are value types.
fn writes_inline(
    input: &ValidationInput<'_>,
    param: &ConstructorParameter,
    path: &[String],
) -> bool {
    let table = input.table;
    let mut current = (&param.declared_type, input.ty.id);
    if !table.is_value_type(current.0, current.1) {
        return false;
    }
    let Some((_, through)) = path.split_last() else {
        return true;
    };
    for member_name in through {
        // Unresolvable steps keep the conservative answer.
        let TypeClass::User(owner) = table.classify(current.0, current.1) else {
            return true;
        };
        let Some(member) = table.lookup_member(owner, member_name) else {
            return true;
        };
        let Some(member_ty) = &member.ty else {
            return true;
        };
        if !table.is_value_type(member_ty, member.id.owner) {
            return false;
        }
        current = (member_ty, member.id.owner);
    }
    true
}
