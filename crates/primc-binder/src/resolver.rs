//! Scope resolution for simple names inside a type with a primary
//! constructor.
//!
//! A name is offered to an ordered chain of [`ScopeLayer`]s. The first layer
//! that matches provides the binding; every layer that matches contributes a
//! candidate, so callers can report the full candidate set. After the chain,
//! the type-name-equals-parameter-name ("Color Color") rule may rebind a
//! member-access receiver to the type.

use crate::context::{BinderOptions, ResolutionContext, ResolutionPhase, ScopeKind, ShadowPolicy};
use crate::symbol_table::SymbolTable;
use crate::symbols::{ConstructorParameter, MemberId, MemberKind, MemberSymbol, ParamId, TypeId};
use primc_syntax::NodeId;
use serde::Serialize;
use tracing::trace;

// =============================================================================
// Bindings
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MemberRef {
    Declared(MemberId),
    /// The synthesized field of a captured parameter.
    BackingField(ParamId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Candidate {
    Local(NodeId),
    Parameter(ParamId),
    Member(MemberId),
    Type(TypeId),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Binding {
    Local(NodeId),
    /// The parameter itself, as a constructor-local value.
    Parameter(ParamId),
    /// Only the parameter's name is used (`nameof`); never a capture.
    ParameterName(ParamId),
    Member(MemberRef),
    Type(TypeId),
    Ambiguous(Vec<Candidate>),
    NotInScope,
    /// A primary parameter named where it can never be used.
    InvalidContext(ParamId),
    /// A member-scope use of a parameter that cannot be captured
    /// (by-reference or ref-like); no field exists for it.
    Rejected(ParamId),
}

impl Binding {
    /// The primary parameter this binding refers to in any form.
    #[must_use]
    pub fn referenced_parameter(&self) -> Option<ParamId> {
        match self {
            Self::Parameter(p)
            | Self::ParameterName(p)
            | Self::InvalidContext(p)
            | Self::Rejected(p)
            | Self::Member(MemberRef::BackingField(p)) => Some(*p),
            Self::Ambiguous(candidates) => candidates.iter().find_map(|c| match c {
                Candidate::Parameter(p) => Some(*p),
                _ => None,
            }),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(
            self,
            Self::Ambiguous(_) | Self::NotInScope | Self::InvalidContext(_) | Self::Rejected(_)
        )
    }
}

/// A binding together with every candidate the layers found, best first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub binding: Binding,
    pub candidates: Vec<Candidate>,
}

impl Resolution {
    #[must_use]
    pub fn not_in_scope() -> Self {
        Self {
            binding: Binding::NotInScope,
            candidates: Vec::new(),
        }
    }
}

// =============================================================================
// Capture decisions
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CaptureDecision {
    /// Promoted to a backing field.
    Captured,
    /// Used from member scope but cannot be captured.
    Rejected,
    NotCaptured,
}

/// Source of published capture decisions for final-phase resolution.
pub trait CaptureLookup: Sync {
    fn decision(&self, param: ParamId) -> Option<CaptureDecision>;
}

/// By-value parameters of non-ref-like type can become fields.
#[must_use]
pub fn is_capturable(table: &SymbolTable, param: &ConstructorParameter) -> bool {
    !param.passing_mode.is_by_ref() && !table.is_ref_like(&param.declared_type, param.id.owner)
}

// =============================================================================
// Layers
// =============================================================================

struct LayerMatch {
    candidate: Candidate,
    binding: Binding,
}

impl LayerMatch {
    fn member(member: &MemberSymbol) -> Self {
        match (member.kind, member.nested_type) {
            (MemberKind::NestedType, Some(nested)) => Self {
                candidate: Candidate::Type(nested),
                binding: Binding::Type(nested),
            },
            _ => Self {
                candidate: Candidate::Member(member.id),
                binding: Binding::Member(MemberRef::Declared(member.id)),
            },
        }
    }
}

trait ScopeLayer {
    fn name(&self) -> &'static str;

    fn lookup(
        &self,
        name: &str,
        ctx: &ResolutionContext<'_>,
        resolver: &ScopeResolver<'_>,
    ) -> Option<LayerMatch>;
}

/// Locals, lambda/local-function/method parameters, `value`.
struct LocalLayer;

impl ScopeLayer for LocalLayer {
    fn name(&self) -> &'static str {
        "local"
    }

    fn lookup(&self, name: &str, ctx: &ResolutionContext<'_>, _: &ScopeResolver<'_>) -> Option<LayerMatch> {
        let local = ctx.locals.iter().rev().find(|l| l.name == name)?;
        Some(LayerMatch {
            candidate: Candidate::Local(local.node),
            binding: Binding::Local(local.node),
        })
    }
}

/// In constructor scope the parameter wins over a same-named member, unless
/// the member-biased policy is configured.
struct ConstructorScopeParameterLayer;

impl ScopeLayer for ConstructorScopeParameterLayer {
    fn name(&self) -> &'static str {
        "constructor-scope-parameter"
    }

    fn lookup(&self, name: &str, ctx: &ResolutionContext<'_>, resolver: &ScopeResolver<'_>) -> Option<LayerMatch> {
        if resolver.options.shadow_policy != ShadowPolicy::ParameterBiased
            || !ctx.scope.is_constructor_scope()
        {
            return None;
        }
        let param = resolver.table.get(ctx.type_id)?.parameter_named(name)?;
        Some(resolver.parameter_match(param, ctx))
    }
}

/// Members of the type and inheritable members of its base classes.
struct MemberLayer;

impl ScopeLayer for MemberLayer {
    fn name(&self) -> &'static str {
        "member"
    }

    fn lookup(&self, name: &str, ctx: &ResolutionContext<'_>, resolver: &ScopeResolver<'_>) -> Option<LayerMatch> {
        resolver
            .table
            .lookup_member(ctx.type_id, name)
            .map(LayerMatch::member)
    }
}

/// The type's own primary parameters, per scope kind and phase.
struct PrimaryParameterLayer;

impl ScopeLayer for PrimaryParameterLayer {
    fn name(&self) -> &'static str {
        "primary-parameter"
    }

    fn lookup(&self, name: &str, ctx: &ResolutionContext<'_>, resolver: &ScopeResolver<'_>) -> Option<LayerMatch> {
        if ctx.scope == ScopeKind::DefaultValue {
            return None;
        }
        let param = resolver.table.get(ctx.type_id)?.parameter_named(name)?;
        Some(resolver.parameter_match(param, ctx))
    }
}

/// Members and primary parameters of containing types. A containing type's
/// parameters are never usable from a nested type.
struct OuterTypeLayer;

impl ScopeLayer for OuterTypeLayer {
    fn name(&self) -> &'static str {
        "outer-type"
    }

    fn lookup(&self, name: &str, ctx: &ResolutionContext<'_>, resolver: &ScopeResolver<'_>) -> Option<LayerMatch> {
        let table = resolver.table;
        let mut current = table.get(ctx.type_id)?.containing;
        while let Some(outer) = current {
            if let Some(member) = table.lookup_member(outer, name) {
                return Some(LayerMatch::member(member));
            }
            let outer_ty = table.get(outer)?;
            if let Some(param) = outer_ty.parameter_named(name) {
                let binding = if ctx.in_nameof {
                    Binding::ParameterName(param.id)
                } else {
                    Binding::InvalidContext(param.id)
                };
                return Some(LayerMatch {
                    candidate: Candidate::Parameter(param.id),
                    binding,
                });
            }
            current = outer_ty.containing;
        }
        None
    }
}

/// Nested, sibling and top-level type names.
struct TypeNameLayer;

impl ScopeLayer for TypeNameLayer {
    fn name(&self) -> &'static str {
        "type-name"
    }

    fn lookup(&self, name: &str, ctx: &ResolutionContext<'_>, resolver: &ScopeResolver<'_>) -> Option<LayerMatch> {
        let id = resolver.table.lookup_type(name, Some(ctx.type_id))?;
        Some(LayerMatch {
            candidate: Candidate::Type(id),
            binding: Binding::Type(id),
        })
    }
}

const LAYERS: [&dyn ScopeLayer; 6] = [
    &LocalLayer,
    &ConstructorScopeParameterLayer,
    &MemberLayer,
    &PrimaryParameterLayer,
    &OuterTypeLayer,
    &TypeNameLayer,
];

// =============================================================================
// Resolver
// =============================================================================

/// Outcome of checking `T.member` both as a static access on type `T` and as
/// an instance access through a value of type `T`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ReceiverApplicability {
    StaticOnly,
    InstanceOnly,
    Both,
    Neither,
}

pub struct ScopeResolver<'a> {
    table: &'a SymbolTable,
    options: &'a BinderOptions,
    captures: Option<&'a dyn CaptureLookup>,
}

impl<'a> ScopeResolver<'a> {
    #[must_use]
    pub fn new(table: &'a SymbolTable, options: &'a BinderOptions) -> Self {
        Self {
            table,
            options,
            captures: None,
        }
    }

    /// Use published capture decisions for [`ResolutionPhase::Final`].
    #[must_use]
    pub fn with_captures(mut self, captures: &'a dyn CaptureLookup) -> Self {
        self.captures = Some(captures);
        self
    }

    #[must_use]
    pub fn table(&self) -> &'a SymbolTable {
        self.table
    }

    /// Resolve a simple name at the position described by `ctx`.
    #[must_use]
    pub fn resolve(&self, name: &str, ctx: &ResolutionContext<'_>) -> Resolution {
        let mut winner: Option<LayerMatch> = None;
        let mut candidates = Vec::new();
        for layer in LAYERS {
            let Some(found) = layer.lookup(name, ctx, self) else {
                continue;
            };
            trace!(name, layer = layer.name(), candidate = ?found.candidate, "layer match");
            if !candidates.contains(&found.candidate) {
                candidates.push(found.candidate);
            }
            if winner.is_none() {
                winner = Some(found);
            }
        }
        let Some(winner) = winner else {
            return Resolution::not_in_scope();
        };
        let binding = self.apply_color_color(name, ctx, &winner, &candidates);
        Resolution {
            binding,
            candidates,
        }
    }

    fn parameter_match(&self, param: &ConstructorParameter, ctx: &ResolutionContext<'_>) -> LayerMatch {
        LayerMatch {
            candidate: Candidate::Parameter(param.id),
            binding: self.parameter_binding(param, ctx),
        }
    }

    fn parameter_binding(&self, param: &ConstructorParameter, ctx: &ResolutionContext<'_>) -> Binding {
        if ctx.in_nameof {
            return Binding::ParameterName(param.id);
        }
        match ctx.scope {
            ScopeKind::StaticMember | ScopeKind::ConstructorInitializer => {
                return Binding::InvalidContext(param.id);
            }
            ScopeKind::DefaultValue => return Binding::NotInScope,
            _ => {}
        }
        if ctx.phase == ResolutionPhase::Tentative {
            return Binding::Parameter(param.id);
        }
        let Some(captures) = self.captures else {
            return Binding::Parameter(param.id);
        };
        if !ctx.captures_parameters() {
            // Initializer lambdas share the field with every other capture site.
            if ctx.in_lambda
                && ctx.scope.is_constructor_scope()
                && captures.decision(param.id) == Some(CaptureDecision::Captured)
            {
                return Binding::Member(MemberRef::BackingField(param.id));
            }
            return Binding::Parameter(param.id);
        }
        match captures.decision(param.id) {
            Some(CaptureDecision::Captured) => Binding::Member(MemberRef::BackingField(param.id)),
            Some(CaptureDecision::Rejected) => Binding::Rejected(param.id),
            Some(CaptureDecision::NotCaptured) if !is_capturable(self.table, param) => {
                Binding::Rejected(param.id)
            }
            Some(CaptureDecision::NotCaptured) => Binding::NotInScope,
            None => Binding::Parameter(param.id),
        }
    }

    fn apply_color_color(
        &self,
        name: &str,
        ctx: &ResolutionContext<'_>,
        winner: &LayerMatch,
        candidates: &[Candidate],
    ) -> Binding {
        let fallback = winner.binding.clone();
        if !self.options.color_color_allowed || ctx.in_nameof {
            return fallback;
        }
        let Some(receiver) = ctx.receiver_of else {
            return fallback;
        };
        let Candidate::Parameter(param_id) = winner.candidate else {
            return fallback;
        };
        let Some(param) = self.table.parameter(param_id) else {
            return fallback;
        };
        if param.declared_type.simple_name() != Some(name) {
            return fallback;
        }
        let Some(type_id) = candidates.iter().find_map(|c| match c {
            Candidate::Type(t) => Some(*t),
            _ => None,
        }) else {
            return fallback;
        };
        if self.table.lookup_type(name, Some(param_id.owner)) != Some(type_id) {
            return fallback;
        }

        let applicability = self.receiver_applicability(type_id, &receiver.member_name, receiver.invocation.as_deref());
        trace!(name, member = %receiver.member_name, ?applicability, "color-color receiver");
        match (applicability, &fallback) {
            (ReceiverApplicability::StaticOnly, _) => Binding::Type(type_id),
            (ReceiverApplicability::Both, Binding::InvalidContext(_)) => Binding::Type(type_id),
            (ReceiverApplicability::Both, _) => Binding::Ambiguous(vec![
                Candidate::Parameter(param_id),
                Candidate::Type(type_id),
            ]),
            _ => fallback,
        }
    }

    fn receiver_applicability(
        &self,
        type_id: TypeId,
        member_name: &str,
        invocation: Option<&[primc_syntax::PassingMode]>,
    ) -> ReceiverApplicability {
        let mut static_ok = false;
        let mut instance_ok = false;
        for member in self.table.all_members_named(type_id, member_name) {
            let applicable = match invocation {
                Some(args) if member.kind == MemberKind::Method => member.accepts(args),
                Some(_) => member.kind != MemberKind::NestedType,
                None => true,
            };
            if !applicable {
                continue;
            }
            if member.is_static {
                static_ok = true;
            } else {
                instance_ok = true;
            }
        }
        match (static_ok, instance_ok) {
            (true, true) => ReceiverApplicability::Both,
            (true, false) => ReceiverApplicability::StaticOnly,
            (false, true) => ReceiverApplicability::InstanceOnly,
            (false, false) => ReceiverApplicability::Neither,
        }
    }
}
