//! Compilation-level driver.
//!
//! Types are analysed base-before-derived. Types in the same topological
//! level do not depend on each other and run on the rayon pool when
//! [`BinderOptions::parallel`] is set. Results are merged and sorted so the
//! output is identical whichever way a level was scheduled.

use crate::capture::{BoundOccurrence, CaptureAnalyzer, ParameterUsage};
use crate::context::{BinderOptions, CancellationToken};
use crate::error::AnalysisError;
use crate::resolver::{CaptureDecision, CaptureLookup, Resolution, ScopeResolver};
use crate::symbol_table::SymbolTable;
use crate::symbols::{
    CapturedParameterField, ParamId, SynthesizedDefaultConstructor, SynthesizedPrimaryConstructor,
    TypeId, TypeSymbol,
};
use crate::synthesis::{SynthesisInput, synthesize};
use crate::validator::layout::check_layout;
use crate::validator::{ValidationInput, validate_type};
use primc_common::Diagnostic;
use primc_syntax::{NodeId, TypeDeclSyntax, number_nodes};
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, info_span, instrument};

/// Everything produced for one type.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeAnalysis {
    pub type_id: TypeId,
    pub name: String,
    pub primary_constructor: Option<SynthesizedPrimaryConstructor>,
    pub default_constructor: Option<SynthesizedDefaultConstructor>,
    pub captured_fields: Vec<CapturedParameterField>,
    pub capture_decisions: Vec<(ParamId, CaptureDecision)>,
    pub usages: Vec<ParameterUsage>,
    pub diagnostics: Vec<Diagnostic>,
    #[serde(skip)]
    pub occurrences: Vec<BoundOccurrence>,
}

impl TypeAnalysis {
    #[must_use]
    pub fn decision(&self, param: ParamId) -> Option<CaptureDecision> {
        self.capture_decisions
            .iter()
            .find(|(p, _)| *p == param)
            .map(|(_, d)| *d)
    }

    fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
            || self.primary_constructor.as_ref().is_some_and(|c| c.has_errors)
    }
}

/// A set of parsed type declarations ready for analysis.
pub struct Compilation {
    table: Arc<SymbolTable>,
}

impl Compilation {
    /// Number every node and build the symbol table.
    #[must_use]
    pub fn new(mut declarations: Vec<TypeDeclSyntax>) -> Self {
        let nodes = number_nodes(&mut declarations);
        debug!(types = declarations.len(), nodes, "compilation created");
        Self {
            table: Arc::new(SymbolTable::build(&declarations)),
        }
    }

    #[must_use]
    pub fn symbols(&self) -> &SymbolTable {
        &self.table
    }

    /// Top-level type called `name`.
    #[must_use]
    pub fn type_id(&self, name: &str) -> Option<TypeId> {
        self.table.lookup_type(name, None)
    }

    /// Analyse every type. Cancellation is observed between types and
    /// between members; a cancelled run publishes nothing.
    #[instrument(level = "info", skip_all)]
    pub fn analyze(
        &self,
        options: &BinderOptions,
        cancel: &CancellationToken,
    ) -> Result<AnalysisResults, AnalysisError> {
        let table = &*self.table;
        let levels = table.topological_levels()?;
        let mut analyses: Vec<Option<TypeAnalysis>> = vec![None; table.types().len()];
        let mut failed: FxHashSet<TypeId> = FxHashSet::default();

        for (depth, level) in levels.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(AnalysisError::Cancelled);
            }
            let _span = info_span!("level", depth, types = level.len()).entered();
            let level: Vec<&TypeSymbol> = level.iter().filter_map(|id| table.get(*id)).collect();
            let run = |ty: &&TypeSymbol| analyze_type(table, options, cancel, ty, &failed);
            let results: Vec<TypeAnalysis> = if options.parallel {
                level.par_iter().map(run).collect::<Result<_, _>>()?
            } else {
                level.iter().map(run).collect::<Result<_, _>>()?
            };
            for analysis in results {
                let ty_failed = analysis.has_errors()
                    || table.get(analysis.type_id).is_some_and(|t| t.synthesis_blocked);
                if ty_failed {
                    failed.insert(analysis.type_id);
                }
                let index = analysis.type_id.index();
                analyses[index] = Some(analysis);
            }
        }
        if cancel.is_cancelled() {
            return Err(AnalysisError::Cancelled);
        }

        let analyses: Vec<TypeAnalysis> = analyses.into_iter().flatten().collect();
        let captured: FxHashMap<TypeId, Vec<CapturedParameterField>> = analyses
            .iter()
            .map(|a| (a.type_id, a.captured_fields.clone()))
            .collect();
        let layout = check_layout(table, &captured);

        let mut analyses = analyses;
        for analysis in &mut analyses {
            if layout.cyclic_captures.contains(&analysis.type_id)
                && let Some(ctor) = &mut analysis.primary_constructor
            {
                ctor.has_errors = true;
            }
        }

        let mut diagnostics: Vec<Diagnostic> = table.diagnostics().to_vec();
        diagnostics.extend(analyses.iter().flat_map(|a| a.diagnostics.iter().cloned()));
        diagnostics.extend(layout.diagnostics);
        diagnostics.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        diagnostics.dedup();

        let bindings = analyses
            .iter()
            .flat_map(|a| a.occurrences.iter())
            .map(|b| (b.occurrence.node, b.resolution.clone()))
            .collect();

        info!(
            types = analyses.len(),
            diagnostics = diagnostics.len(),
            "analysis complete"
        );
        Ok(AnalysisResults {
            table: Arc::clone(&self.table),
            analyses: analyses.into_iter().map(Arc::new).collect(),
            diagnostics,
            bindings,
            unmanaged: layout.unmanaged,
        })
    }
}

#[instrument(level = "debug", skip_all, fields(type_name = %ty.name))]
fn analyze_type(
    table: &SymbolTable,
    options: &BinderOptions,
    cancel: &CancellationToken,
    ty: &TypeSymbol,
    failed_bases: &FxHashSet<TypeId>,
) -> Result<TypeAnalysis, AnalysisError> {
    let outcome = CaptureAnalyzer::new(table, options, cancel).analyze(ty)?;
    let mut diagnostics = outcome.diagnostics;
    validate_type(
        &ValidationInput {
            table,
            options,
            ty,
            flags: &outcome.flags,
            usages: &outcome.usages,
            occurrences: &outcome.occurrences,
        },
        &mut diagnostics,
    );
    let synthesized = synthesize(
        &SynthesisInput {
            table,
            ty,
            flags: &outcome.flags,
            occurrences: &outcome.occurrences,
            failed_bases,
        },
        &mut diagnostics,
    );
    Ok(TypeAnalysis {
        type_id: ty.id,
        name: ty.name.clone(),
        primary_constructor: synthesized.primary,
        default_constructor: synthesized.default_constructor,
        captured_fields: synthesized.fields,
        capture_decisions: outcome.flags.decisions(),
        usages: outcome.usages,
        diagnostics,
        occurrences: outcome.occurrences,
    })
}

/// The published result of [`Compilation::analyze`].
#[derive(Debug)]
pub struct AnalysisResults {
    table: Arc<SymbolTable>,
    analyses: Vec<Arc<TypeAnalysis>>,
    diagnostics: Vec<Diagnostic>,
    bindings: FxHashMap<NodeId, Resolution>,
    unmanaged: FxHashMap<TypeId, bool>,
}

impl AnalysisResults {
    #[must_use]
    pub fn symbols(&self) -> &SymbolTable {
        &self.table
    }

    /// All diagnostics, sorted by type, position and code.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    #[must_use]
    pub fn bindings(&self) -> &FxHashMap<NodeId, Resolution> {
        &self.bindings
    }

    #[must_use]
    pub fn binding(&self, node: NodeId) -> Option<&Resolution> {
        self.bindings.get(&node)
    }

    #[must_use]
    pub fn type_analysis(&self, id: TypeId) -> Option<&TypeAnalysis> {
        self.analyses
            .iter()
            .find(|a| a.type_id == id)
            .map(Arc::as_ref)
    }

    pub fn type_analyses(&self) -> impl Iterator<Item = &TypeAnalysis> {
        self.analyses.iter().map(Arc::as_ref)
    }

    /// Top-level type called `name`.
    #[must_use]
    pub fn type_id(&self, name: &str) -> Option<TypeId> {
        self.table.lookup_type(name, None)
    }

    #[must_use]
    pub fn primary_constructor(&self, id: TypeId) -> Option<&SynthesizedPrimaryConstructor> {
        self.type_analysis(id)?.primary_constructor.as_ref()
    }

    #[must_use]
    pub fn default_constructor(&self, id: TypeId) -> Option<&SynthesizedDefaultConstructor> {
        self.type_analysis(id)?.default_constructor.as_ref()
    }

    #[must_use]
    pub fn captured_fields(&self, id: TypeId) -> &[CapturedParameterField] {
        self.type_analysis(id)
            .map(|a| a.captured_fields.as_slice())
            .unwrap_or_default()
    }

    /// Names of the captured parameters of `id`, in parameter order.
    #[must_use]
    pub fn captured_parameter_names(&self, id: TypeId) -> Vec<&str> {
        self.captured_fields(id)
            .iter()
            .map(|f| f.parameter_name.as_str())
            .collect()
    }

    /// The type satisfies the `unmanaged` constraint.
    #[must_use]
    pub fn is_unmanaged(&self, id: TypeId) -> bool {
        self.unmanaged.get(&id).copied().unwrap_or(false)
    }

    /// A resolver that answers final-phase queries against these results.
    #[must_use]
    pub fn resolver<'a>(&'a self, options: &'a BinderOptions) -> ScopeResolver<'a> {
        ScopeResolver::new(&self.table, options).with_captures(self)
    }
}

impl CaptureLookup for AnalysisResults {
    fn decision(&self, param: ParamId) -> Option<CaptureDecision> {
        self.type_analysis(param.owner)?.decision(param)
    }
}
