//! Constraint checks over final bindings.
//!
//! Each rule module inspects the bound occurrences of one type and appends
//! diagnostics. Layout checks span several types and run once per
//! compilation from [`layout`].

mod advisory;
mod definite_assignment;
mod fixed;
pub(crate) mod layout;
mod lock;
mod readonly;
mod refs;

use crate::capture::{BoundOccurrence, CaptureFlags, ParameterUsage};
use crate::context::BinderOptions;
use crate::resolver::{Binding, MemberRef};
use crate::symbol_table::SymbolTable;
use crate::symbols::{ConstructorParameter, ParamId, TypeSymbol};
use primc_common::{Diagnostic, DiagnosticCode, DiagnosticLocation};
use tracing::debug;

pub(crate) struct ValidationInput<'a> {
    pub table: &'a SymbolTable,
    pub options: &'a BinderOptions,
    pub ty: &'a TypeSymbol,
    pub flags: &'a CaptureFlags,
    pub usages: &'a [ParameterUsage],
    pub occurrences: &'a [BoundOccurrence],
}

impl ValidationInput<'_> {
    /// This type's parameter `id`.
    fn own_parameter(&self, id: ParamId) -> Option<&ConstructorParameter> {
        self.ty.parameter(id)
    }

    /// Occurrences bound to a backing field of this type.
    fn backing_field_uses(
        &self,
    ) -> impl Iterator<Item = (&BoundOccurrence, &ConstructorParameter)> {
        self.occurrences.iter().filter_map(|bound| match bound.resolution.binding {
            Binding::Member(MemberRef::BackingField(p)) => {
                self.own_parameter(p).map(|param| (bound, param))
            }
            _ => None,
        })
    }

    /// Occurrences bound to this type's parameter as a constructor local.
    fn parameter_uses(&self) -> impl Iterator<Item = (&BoundOccurrence, &ConstructorParameter)> {
        self.occurrences.iter().filter_map(|bound| match bound.resolution.binding {
            Binding::Parameter(p) => self.own_parameter(p).map(|param| (bound, param)),
            _ => None,
        })
    }

    fn at_occurrence(
        &self,
        code: DiagnosticCode,
        bound: &BoundOccurrence,
        args: &[&str],
    ) -> Diagnostic {
        let occ = &bound.occurrence;
        Diagnostic::new(
            code,
            DiagnosticLocation::new(&self.ty.name, occ.node.0, occ.span),
            args,
        )
    }

    fn at_parameter(
        &self,
        code: DiagnosticCode,
        param: &ConstructorParameter,
        args: &[&str],
    ) -> Diagnostic {
        Diagnostic::new(
            code,
            DiagnosticLocation::new(&self.ty.name, param.node.0, param.span),
            args,
        )
    }
}

/// Run every per-type rule.
pub(crate) fn validate_type(input: &ValidationInput<'_>, diagnostics: &mut Vec<Diagnostic>) {
    let before = diagnostics.len();
    refs::check(input, diagnostics);
    readonly::check(input, diagnostics);
    fixed::check(input, diagnostics);
    definite_assignment::check(input, diagnostics);
    if input.options.report_advisory_warnings {
        lock::check(input, diagnostics);
    }
    advisory::check(input, diagnostics);
    debug!(
        type_name = %input.ty.name,
        reported = diagnostics.len() - before,
        "validation complete"
    );
}
