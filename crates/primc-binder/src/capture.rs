//! Two-phase capture analysis.
//!
//! Phase one resolves every occurrence tentatively (parameters visible in
//! member scope) and records which parameters member code uses. The
//! resulting decisions are published once into [`CaptureFlags`]. Phase two
//! walks the same occurrences again and binds member-scope uses of captured
//! parameters to their backing fields.

use crate::context::{
    BinderOptions, CancellationToken, InitializerRegion, ResolutionContext, ResolutionPhase,
    ScopeKind,
};
use crate::error::AnalysisError;
use crate::occurrences::{Occurrence, OccurrenceSink, OccurrenceWalker, WalkUnit, walk_units};
use crate::resolver::{
    Binding, Candidate, CaptureDecision, CaptureLookup, Resolution, ScopeResolver, is_capturable,
};
use crate::symbol_table::SymbolTable;
use crate::symbols::{ParamId, TypeId, TypeSymbol};
use once_cell::sync::OnceCell;
use primc_common::{Diagnostic, DiagnosticCode, DiagnosticLocation};
use primc_syntax::NodeId;
use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::{debug, error, instrument, trace};

// =============================================================================
// Usage facts
// =============================================================================

/// What phase one learned about one primary parameter.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterUsage {
    pub parameter: Option<ParamId>,
    /// Named anywhere, `nameof` included.
    pub referenced: bool,
    /// Used from an instance member body.
    pub used_in_member: bool,
    /// Used from a lambda inside the base argument list.
    pub used_in_base_lambda: bool,
    /// Used directly in an initializer or base argument.
    pub used_in_constructor_scope: bool,
    /// Appears in the base argument list outside a lambda.
    pub passed_to_base: bool,
    /// First capture-triggering occurrence.
    pub first_capture_site: Option<NodeId>,
}

impl ParameterUsage {
    fn new(parameter: ParamId) -> Self {
        Self {
            parameter: Some(parameter),
            ..Self::default()
        }
    }

    /// Decision for a parameter with this usage.
    #[must_use]
    pub fn decide(&self, capturable: bool) -> CaptureDecision {
        let needs_field = self.used_in_member || self.used_in_base_lambda;
        match (needs_field, capturable) {
            (true, true) => CaptureDecision::Captured,
            (true, false) => CaptureDecision::Rejected,
            (false, _) => CaptureDecision::NotCaptured,
        }
    }
}

// =============================================================================
// Published decisions
// =============================================================================

/// Write-once capture decisions for the parameters of one type.
#[derive(Debug)]
pub struct CaptureFlags {
    owner: TypeId,
    cells: Vec<OnceCell<CaptureDecision>>,
}

impl CaptureFlags {
    #[must_use]
    pub fn new(owner: TypeId, parameter_count: usize) -> Self {
        Self {
            owner,
            cells: (0..parameter_count).map(|_| OnceCell::new()).collect(),
        }
    }

    /// Publish a decision. Publishing the same decision twice is a no-op;
    /// publishing a different one is a binder bug.
    pub fn publish(&self, param: ParamId, decision: CaptureDecision) {
        let Some(cell) = self.cell(param) else {
            return;
        };
        if let Err((existing, _)) = cell.try_insert(decision)
            && *existing != decision
        {
            error!(?param, ?decision, "capture decision republished with a different value");
            debug_assert!(false, "capture decision for {param:?} changed after publication");
        }
    }

    fn cell(&self, param: ParamId) -> Option<&OnceCell<CaptureDecision>> {
        if param.owner != self.owner {
            return None;
        }
        self.cells.get(param.ordinal as usize)
    }

    #[must_use]
    pub fn get(&self, param: ParamId) -> Option<CaptureDecision> {
        self.cell(param).and_then(|c| c.get().copied())
    }

    #[must_use]
    pub fn is_captured(&self, param: ParamId) -> bool {
        self.get(param) == Some(CaptureDecision::Captured)
    }

    /// Decisions in parameter order.
    #[must_use]
    pub fn decisions(&self) -> Vec<(ParamId, CaptureDecision)> {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(ordinal, cell)| {
                let id = ParamId {
                    owner: self.owner,
                    ordinal: ordinal as u32,
                };
                cell.get().map(|d| (id, *d))
            })
            .collect()
    }
}

impl CaptureLookup for CaptureFlags {
    fn decision(&self, param: ParamId) -> Option<CaptureDecision> {
        if param.owner != self.owner {
            return None;
        }
        self.get(param)
    }
}

// =============================================================================
// Phase one
// =============================================================================

struct UsageCollector<'a> {
    resolver: ScopeResolver<'a>,
    owner: TypeId,
    usages: Vec<ParameterUsage>,
}

impl OccurrenceSink for UsageCollector<'_> {
    fn occurrence(&mut self, occurrence: &Occurrence, ctx: &ResolutionContext<'_>) {
        let resolution = self.resolver.resolve(&occurrence.name, ctx);
        let Some(param) = resolution.binding.referenced_parameter() else {
            return;
        };
        if param.owner != self.owner {
            return;
        }
        let Some(usage) = self.usages.get_mut(param.ordinal as usize) else {
            return;
        };
        usage.referenced = true;
        // Color-Color receivers and nameof never capture.
        if !matches!(resolution.binding, Binding::Parameter(_)) {
            return;
        }
        match ctx.scope {
            ScopeKind::InstanceMember => usage.used_in_member = true,
            ScopeKind::ConstructorScope(region) => {
                if ctx.captures_parameters() {
                    usage.used_in_base_lambda = true;
                } else {
                    usage.used_in_constructor_scope = true;
                    if region == InitializerRegion::BaseArguments {
                        usage.passed_to_base = true;
                    }
                }
            }
            _ => {}
        }
        if ctx.captures_parameters() && usage.first_capture_site.is_none() {
            usage.first_capture_site = Some(occurrence.node);
        }
    }
}

// =============================================================================
// Phase two
// =============================================================================

/// An occurrence with its final binding.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BoundOccurrence {
    pub occurrence: Occurrence,
    pub resolution: Resolution,
}

struct FinalBinder<'a> {
    resolver: ScopeResolver<'a>,
    ty: &'a TypeSymbol,
    bound: Vec<BoundOccurrence>,
    diagnostics: Vec<Diagnostic>,
}

impl FinalBinder<'_> {
    fn location(&self, occurrence: &Occurrence) -> DiagnosticLocation {
        DiagnosticLocation::new(&self.ty.name, occurrence.node.0, occurrence.span)
    }

    /// Parameter-never-silently-disappears check: a name whose best candidate
    /// is this type's parameter must not end up unbound where it would have
    /// been captured.
    fn check_capture_consistency(
        &self,
        occurrence: &Occurrence,
        resolution: &Resolution,
        ctx: &ResolutionContext<'_>,
    ) {
        if resolution.binding != Binding::NotInScope || !ctx.captures_parameters() {
            return;
        }
        if let Some(Candidate::Parameter(p)) = resolution.candidates.first()
            && p.owner == self.ty.id
        {
            error!(
                type_name = %self.ty.name,
                name = %occurrence.name,
                node = %occurrence.node,
                "captured-position parameter reference resolved to nothing"
            );
            debug_assert!(false, "parameter {} lost its binding", occurrence.name);
        }
    }

    fn report(&mut self, occurrence: &Occurrence, resolution: &Resolution) {
        let table = self.resolver.table();
        match &resolution.binding {
            Binding::InvalidContext(p) => {
                if let Some(param) = table.parameter(*p) {
                    let diag = Diagnostic::new(
                        DiagnosticCode::InvalidPrimaryConstructorParameterReference,
                        self.location(occurrence),
                        &[&param.name],
                    );
                    self.diagnostics.push(diag);
                }
            }
            Binding::Ambiguous(candidates) => {
                let ty_name = candidates.iter().find_map(|c| match c {
                    Candidate::Type(t) => table.get(*t).map(|t| t.name.clone()),
                    _ => None,
                });
                let member = occurrence
                    .receiver
                    .as_ref()
                    .map(|r| r.member_name.as_str())
                    .unwrap_or_default();
                let diag = Diagnostic::new(
                    DiagnosticCode::AmbiguousColorColorReceiver,
                    self.location(occurrence),
                    &[&occurrence.name, ty_name.as_deref().unwrap_or_default(), member],
                );
                self.diagnostics.push(diag);
            }
            Binding::NotInScope if self.names_primary_parameter(&occurrence.name) => {
                let diag = Diagnostic::new(
                    DiagnosticCode::NameNotInContext,
                    self.location(occurrence),
                    &[&occurrence.name],
                );
                self.diagnostics.push(diag);
            }
            _ => {}
        }
    }

    /// The name is a primary parameter of this type or an enclosing one.
    fn names_primary_parameter(&self, name: &str) -> bool {
        let table = self.resolver.table();
        let mut current = Some(self.ty.id);
        while let Some(id) = current {
            let Some(ty) = table.get(id) else {
                return false;
            };
            if ty.parameter_named(name).is_some() {
                return true;
            }
            current = ty.containing;
        }
        false
    }
}

impl OccurrenceSink for FinalBinder<'_> {
    fn occurrence(&mut self, occurrence: &Occurrence, ctx: &ResolutionContext<'_>) {
        let resolution = self.resolver.resolve(&occurrence.name, ctx);
        trace!(name = %occurrence.name, binding = ?resolution.binding, "final binding");
        self.check_capture_consistency(occurrence, &resolution, ctx);
        self.report(occurrence, &resolution);
        self.bound.push(BoundOccurrence {
            occurrence: occurrence.clone(),
            resolution,
        });
    }
}

// =============================================================================
// Driver
// =============================================================================

/// Everything the two phases produce for one type.
#[derive(Debug)]
pub struct CaptureOutcome {
    pub flags: CaptureFlags,
    pub usages: Vec<ParameterUsage>,
    pub occurrences: Vec<BoundOccurrence>,
    pub diagnostics: Vec<Diagnostic>,
}

impl CaptureOutcome {
    /// Final bindings keyed by occurrence node.
    #[must_use]
    pub fn bindings(&self) -> FxHashMap<NodeId, Resolution> {
        self.occurrences
            .iter()
            .map(|b| (b.occurrence.node, b.resolution.clone()))
            .collect()
    }
}

pub struct CaptureAnalyzer<'a> {
    table: &'a SymbolTable,
    options: &'a BinderOptions,
    cancel: &'a CancellationToken,
}

impl<'a> CaptureAnalyzer<'a> {
    #[must_use]
    pub fn new(
        table: &'a SymbolTable,
        options: &'a BinderOptions,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            table,
            options,
            cancel,
        }
    }

    fn walk<S: OccurrenceSink>(
        &self,
        ty: &TypeSymbol,
        units: &[WalkUnit],
        phase: ResolutionPhase,
        sink: &mut S,
    ) -> Result<(), AnalysisError> {
        let mut walker = OccurrenceWalker::new(ty, phase, sink);
        for unit in units {
            if self.cancel.is_cancelled() {
                return Err(AnalysisError::Cancelled);
            }
            walker.walk(*unit);
        }
        Ok(())
    }

    /// Run both phases over `ty`.
    #[instrument(level = "debug", skip_all, fields(type_name = %ty.name))]
    pub fn analyze(&self, ty: &TypeSymbol) -> Result<CaptureOutcome, AnalysisError> {
        let units = walk_units(ty);
        let params = ty.parameters();

        let mut collector = UsageCollector {
            resolver: ScopeResolver::new(self.table, self.options),
            owner: ty.id,
            usages: params.iter().map(|p| ParameterUsage::new(p.id)).collect(),
        };
        self.walk(ty, &units, ResolutionPhase::Tentative, &mut collector)?;

        let flags = CaptureFlags::new(ty.id, params.len());
        for (param, usage) in params.iter().zip(&collector.usages) {
            flags.publish(param.id, usage.decide(is_capturable(self.table, param)));
        }
        let captured = flags
            .decisions()
            .iter()
            .filter(|(_, d)| *d == CaptureDecision::Captured)
            .count();
        debug!(captured, "capture decisions published");

        let mut binder = FinalBinder {
            resolver: ScopeResolver::new(self.table, self.options).with_captures(&flags),
            ty,
            bound: Vec::with_capacity(primc_common::limits::OCCURRENCE_TABLE_CAPACITY),
            diagnostics: Vec::new(),
        };
        self.walk(ty, &units, ResolutionPhase::Final, &mut binder)?;
        let FinalBinder { bound, diagnostics, .. } = binder;

        Ok(CaptureOutcome {
            usages: collector.usages,
            occurrences: bound,
            diagnostics,
            flags,
        })
    }
}
