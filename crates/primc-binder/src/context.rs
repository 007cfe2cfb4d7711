//! Options and per-occurrence resolution context.

use crate::symbols::{MemberId, TypeId};
use primc_syntax::{NodeId, PassingMode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

// =============================================================================
// Options
// =============================================================================

/// Which declaration wins in constructor scope when a primary parameter and
/// an instance member share a name.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShadowPolicy {
    /// The parameter wins in initializers and base arguments.
    #[default]
    ParameterBiased,
    /// An explicitly declared member always wins, constructor scope included.
    MemberBiased,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BinderOptions {
    pub shadow_policy: ShadowPolicy,
    /// Apply the type-name-equals-parameter-name receiver rule.
    pub color_color_allowed: bool,
    pub report_unread_parameters: bool,
    /// Gates the lock/using, passed-to-base, field-initializer and
    /// shadowed-by-base warnings.
    pub report_advisory_warnings: bool,
    /// Analyse the independent types of one base-before-derived level on the
    /// rayon pool.
    pub parallel: bool,
}

impl Default for BinderOptions {
    fn default() -> Self {
        Self {
            shadow_policy: ShadowPolicy::ParameterBiased,
            color_color_allowed: true,
            report_unread_parameters: true,
            report_advisory_warnings: true,
            parallel: true,
        }
    }
}

// =============================================================================
// Cancellation
// =============================================================================

/// Cooperative cancellation flag shared between a host and an analysis run.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

// =============================================================================
// Resolution context
// =============================================================================

/// Where inside the implicit primary constructor an expression sits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum InitializerRegion {
    FieldInitializer,
    PropertyInitializer,
    EventInitializer,
    BaseArguments,
}

/// The lexical context kind of an identifier occurrence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ScopeKind {
    /// Instance initializers and the base argument list.
    ConstructorScope(InitializerRegion),
    /// Bodies of instance methods, accessors, explicit constructors and
    /// finalizers.
    InstanceMember,
    /// Static member bodies, static initializers, static lambdas.
    StaticMember,
    /// `this(...)` / `base(...)` arguments of an explicit constructor.
    ConstructorInitializer,
    /// Default values of member parameters.
    DefaultValue,
}

impl ScopeKind {
    #[must_use]
    pub const fn is_constructor_scope(self) -> bool {
        matches!(self, Self::ConstructorScope(_))
    }
}

/// Which pass of the two-phase resolution is running.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ResolutionPhase {
    /// Parameters are optimistically visible in member scope.
    Tentative,
    /// Member-scope references follow the published capture decisions.
    Final,
}

/// A name declared by a local, a lambda/local-function/method parameter, a
/// `fixed` variable or an accessor's implicit `value`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LocalDecl {
    pub name: String,
    pub node: NodeId,
}

/// The occurrence is the receiver of `name.member` (or `name.member(args)`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MemberAccessUse {
    pub member_name: String,
    /// Passing modes when the access is invoked.
    pub invocation: Option<Vec<PassingMode>>,
}

#[derive(Clone, Debug)]
pub struct ResolutionContext<'a> {
    pub type_id: TypeId,
    pub scope: ScopeKind,
    pub phase: ResolutionPhase,
    /// Enclosing member, when the occurrence is inside one.
    pub member: Option<MemberId>,
    /// Visible locals, outermost first.
    pub locals: &'a [LocalDecl],
    /// Inside a lambda or local function.
    pub in_lambda: bool,
    pub in_nameof: bool,
    pub receiver_of: Option<&'a MemberAccessUse>,
}

impl<'a> ResolutionContext<'a> {
    /// A context with no locals, not inside a lambda, `nameof` or member access.
    #[must_use]
    pub fn new(type_id: TypeId, scope: ScopeKind, phase: ResolutionPhase) -> Self {
        Self {
            type_id,
            scope,
            phase,
            member: None,
            locals: &[],
            in_lambda: false,
            in_nameof: false,
            receiver_of: None,
        }
    }

    #[must_use]
    pub fn with_locals(mut self, locals: &'a [LocalDecl]) -> Self {
        self.locals = locals;
        self
    }

    #[must_use]
    pub fn with_receiver(mut self, receiver: &'a MemberAccessUse) -> Self {
        self.receiver_of = Some(receiver);
        self
    }

    #[must_use]
    pub fn inside_lambda(mut self) -> Self {
        self.in_lambda = true;
        self
    }

    #[must_use]
    pub fn inside_nameof(mut self) -> Self {
        self.in_nameof = true;
        self
    }

    /// References at this position promote a parameter to a field: instance
    /// member bodies, and lambdas nested in the base argument list.
    #[must_use]
    pub fn captures_parameters(&self) -> bool {
        match self.scope {
            ScopeKind::InstanceMember => true,
            ScopeKind::ConstructorScope(InitializerRegion::BaseArguments) => self.in_lambda,
            _ => false,
        }
    }
}
