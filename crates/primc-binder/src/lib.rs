//! Primary-constructor binder.
//!
//! Given the parse trees of a compilation, this crate resolves every simple
//! name inside types with primary constructors, decides which parameters
//! must be captured into backing fields, validates the constraints captures
//! are subject to, and synthesizes the constructor artifacts:
//! - `symbol_table` - merged declarations, base lists, declaration-shape errors
//! - `resolver` - the scope-layer chain and the Color-Color receiver rule
//! - `occurrences` - the deterministic identifier walk shared by both phases
//! - `capture` - tentative usage collection and final binding
//! - `validator` - ref/readonly/fixed/lock/definite-assignment/layout rules
//! - `synthesis` - primary constructor, backing fields, default constructor
//! - `compilation` - base-before-derived scheduling and result merging

pub mod capture;
pub mod compilation;
pub mod context;
pub mod error;
pub mod occurrences;
pub mod resolver;
pub mod symbol_table;
pub mod symbols;
mod synthesis;
pub mod types;
mod validator;

pub use capture::{BoundOccurrence, CaptureAnalyzer, CaptureFlags, CaptureOutcome, ParameterUsage};
pub use compilation::{AnalysisResults, Compilation, TypeAnalysis};
pub use context::{
    BinderOptions, CancellationToken, InitializerRegion, LocalDecl, MemberAccessUse,
    ResolutionContext, ResolutionPhase, ScopeKind, ShadowPolicy,
};
pub use error::AnalysisError;
pub use occurrences::{Access, Occurrence};
pub use resolver::{
    Binding, Candidate, CaptureDecision, CaptureLookup, MemberRef, Resolution, ScopeResolver,
    is_capturable,
};
pub use symbol_table::SymbolTable;
pub use symbols::{
    Accessibility, BaseEntry, CapturedParameterField, ConstructorCall, ConstructorParameter,
    ConstructorPlan, ConstructorTarget, InitStep, MemberId, MemberKind, MemberSymbol, ParamId,
    ParamSignature, SynthesizedDefaultConstructor, SynthesizedPrimaryConstructor, TypeId,
    TypeSymbol,
};
pub use types::{BuiltinType, TypeClass};
