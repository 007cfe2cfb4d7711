//! Diagnostic codes and their message templates.

use serde::Serialize;

use super::{DiagnosticCategory, DiagnosticMessage};

/// Every diagnostic the binder can produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum DiagnosticCode {
    // Declaration shape
    MultipleRecordParameterLists,
    DuplicateParameterName,
    ConstructorInStaticClass,
    UnexpectedParameterList,
    UnexpectedArgumentList,
    MemberAlreadyExists,
    InstanceConstructorMustHaveThisInitializer,
    DefaultValueMustBeConstant,
    FieldCantBeRefLike,
    CircularBase,
    NoMatchingBaseConstructor,

    // Resolution
    InvalidPrimaryConstructorParameterReference,
    AmbiguousColorColorReceiver,
    NameNotInContext,

    // Constraints
    UnsupportedCapturingRef,
    UnsupportedCapturingRefLike,
    AssignReadonlyPrimaryConstructorParameter,
    AssignReadonlyPrimaryConstructorParameter2,
    StructLayoutCyclePrimaryConstructorParameter,
    StructLayoutCycle,
    AnonDelegateCantUseStructPrimaryConstructorParameterInMember,
    AnonDelegateCantUseStructPrimaryConstructorParameterCaptured,
    AnonDelegateCantUseRefParameter,
    UseOfUnassignedOutParameter,
    OutParameterUnassigned,
    FixedNeeded,
    FixedNotNeeded,

    // Advisory
    UnreadPrimaryConstructorParameter,
    CapturedParameterPassedToBase,
    CapturedParameterInFieldInitializer,
    CapturedParameterIsShadowedAndNotPassedToBase,
    AssignmentToLockOrDispose,
}

impl DiagnosticCode {
    /// The message table entry for this code.
    #[must_use]
    pub fn message(self) -> &'static DiagnosticMessage {
        DIAGNOSTIC_MESSAGES
            .iter()
            .find(|m| m.code == self)
            .unwrap_or(&FALLBACK_MESSAGE)
    }

    #[must_use]
    pub fn category(self) -> DiagnosticCategory {
        self.message().category
    }

    /// The stable textual name used in JSON output and test expectations.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MultipleRecordParameterLists => "MultipleRecordParameterLists",
            Self::DuplicateParameterName => "DuplicateParameterName",
            Self::ConstructorInStaticClass => "ConstructorInStaticClass",
            Self::UnexpectedParameterList => "UnexpectedParameterList",
            Self::UnexpectedArgumentList => "UnexpectedArgumentList",
            Self::MemberAlreadyExists => "MemberAlreadyExists",
            Self::InstanceConstructorMustHaveThisInitializer => {
                "InstanceConstructorMustHaveThisInitializer"
            }
            Self::DefaultValueMustBeConstant => "DefaultValueMustBeConstant",
            Self::FieldCantBeRefLike => "FieldCantBeRefLike",
            Self::CircularBase => "CircularBase",
            Self::NoMatchingBaseConstructor => "NoMatchingBaseConstructor",
            Self::InvalidPrimaryConstructorParameterReference => {
                "InvalidPrimaryConstructorParameterReference"
            }
            Self::AmbiguousColorColorReceiver => "AmbiguousColorColorReceiver",
            Self::NameNotInContext => "NameNotInContext",
            Self::UnsupportedCapturingRef => "UnsupportedCapturingRef",
            Self::UnsupportedCapturingRefLike => "UnsupportedCapturingRefLike",
            Self::AssignReadonlyPrimaryConstructorParameter => {
                "AssignReadonlyPrimaryConstructorParameter"
            }
            Self::AssignReadonlyPrimaryConstructorParameter2 => {
                "AssignReadonlyPrimaryConstructorParameter2"
            }
            Self::StructLayoutCyclePrimaryConstructorParameter => {
                "StructLayoutCyclePrimaryConstructorParameter"
            }
            Self::StructLayoutCycle => "StructLayoutCycle",
            Self::AnonDelegateCantUseStructPrimaryConstructorParameterInMember => {
                "AnonDelegateCantUseStructPrimaryConstructorParameterInMember"
            }
            Self::AnonDelegateCantUseStructPrimaryConstructorParameterCaptured => {
                "AnonDelegateCantUseStructPrimaryConstructorParameterCaptured"
            }
            Self::AnonDelegateCantUseRefParameter => "AnonDelegateCantUseRefParameter",
            Self::UseOfUnassignedOutParameter => "UseOfUnassignedOutParameter",
            Self::OutParameterUnassigned => "OutParameterUnassigned",
            Self::FixedNeeded => "FixedNeeded",
            Self::FixedNotNeeded => "FixedNotNeeded",
            Self::UnreadPrimaryConstructorParameter => "UnreadPrimaryConstructorParameter",
            Self::CapturedParameterPassedToBase => "CapturedParameterPassedToBase",
            Self::CapturedParameterInFieldInitializer => "CapturedParameterInFieldInitializer",
            Self::CapturedParameterIsShadowedAndNotPassedToBase => {
                "CapturedParameterIsShadowedAndNotPassedToBase"
            }
            Self::AssignmentToLockOrDispose => "AssignmentToLockOrDispose",
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const FALLBACK_MESSAGE: DiagnosticMessage = DiagnosticMessage {
    code: DiagnosticCode::NameNotInContext,
    category: DiagnosticCategory::Error,
    message: "{0}",
};

const fn error(code: DiagnosticCode, message: &'static str) -> DiagnosticMessage {
    DiagnosticMessage {
        code,
        category: DiagnosticCategory::Error,
        message,
    }
}

const fn warning(code: DiagnosticCode, message: &'static str) -> DiagnosticMessage {
    DiagnosticMessage {
        code,
        category: DiagnosticCategory::Warning,
        message,
    }
}

pub static DIAGNOSTIC_MESSAGES: &[DiagnosticMessage] = &[
    error(
        DiagnosticCode::MultipleRecordParameterLists,
        "Only a single partial type declaration may have a parameter list.",
    ),
    error(
        DiagnosticCode::DuplicateParameterName,
        "The parameter name '{0}' is a duplicate.",
    ),
    error(
        DiagnosticCode::ConstructorInStaticClass,
        "'{0}': static classes cannot have instance constructors.",
    ),
    error(
        DiagnosticCode::UnexpectedParameterList,
        "Unexpected parameter list on '{0}'.",
    ),
    error(DiagnosticCode::UnexpectedArgumentList, "Unexpected argument list."),
    error(
        DiagnosticCode::MemberAlreadyExists,
        "Type '{0}' already defines a member called '{0}' with the same parameter types.",
    ),
    error(
        DiagnosticCode::InstanceConstructorMustHaveThisInitializer,
        "A constructor declared in a type with parameter list must have 'this' constructor initializer.",
    ),
    error(
        DiagnosticCode::DefaultValueMustBeConstant,
        "Default parameter value for '{0}' must be a compile-time constant.",
    ),
    error(
        DiagnosticCode::FieldCantBeRefLike,
        "Field or auto-implemented property cannot be of type '{0}' unless it is an instance member of a ref struct.",
    ),
    error(
        DiagnosticCode::CircularBase,
        "Circular base type dependency involving '{0}' and '{1}'.",
    ),
    error(
        DiagnosticCode::NoMatchingBaseConstructor,
        "'{0}' does not contain a constructor that takes {1} arguments.",
    ),
    error(
        DiagnosticCode::InvalidPrimaryConstructorParameterReference,
        "Cannot use primary constructor parameter '{0}' in this context.",
    ),
    error(
        DiagnosticCode::AmbiguousColorColorReceiver,
        "Member access '{2}' on '{0}' is ambiguous between type '{1}' and primary constructor parameter '{0}'.",
    ),
    error(
        DiagnosticCode::NameNotInContext,
        "The name '{0}' does not exist in the current context.",
    ),
    error(
        DiagnosticCode::UnsupportedCapturingRef,
        "Cannot use ref, out, or in primary constructor parameter '{0}' inside an instance member.",
    ),
    error(
        DiagnosticCode::UnsupportedCapturingRefLike,
        "Cannot use primary constructor parameter '{0}' that has ref-like type inside an instance member.",
    ),
    error(
        DiagnosticCode::AssignReadonlyPrimaryConstructorParameter,
        "Cannot assign to primary constructor parameter '{0}' of a readonly type (except in init-only setter of the type or a variable initializer).",
    ),
    error(
        DiagnosticCode::AssignReadonlyPrimaryConstructorParameter2,
        "Members of primary constructor parameter '{0}' of a readonly type cannot be modified (except in init-only setter of the type or a variable initializer).",
    ),
    error(
        DiagnosticCode::StructLayoutCyclePrimaryConstructorParameter,
        "Primary constructor parameter '{0}' of type '{1}' causes a cycle in the struct layout.",
    ),
    error(
        DiagnosticCode::StructLayoutCycle,
        "Struct member '{0}' of type '{1}' causes a cycle in the struct layout.",
    ),
    error(
        DiagnosticCode::AnonDelegateCantUseStructPrimaryConstructorParameterInMember,
        "Anonymous methods, lambda expressions, query expressions, and local functions inside an instance member of a struct cannot access primary constructor parameter '{0}'.",
    ),
    error(
        DiagnosticCode::AnonDelegateCantUseStructPrimaryConstructorParameterCaptured,
        "Anonymous methods, lambda expressions, query expressions, and local functions inside a struct cannot access primary constructor parameter '{0}' also used inside an instance member.",
    ),
    error(
        DiagnosticCode::AnonDelegateCantUseRefParameter,
        "Cannot use ref, out, or in parameter '{0}' inside an anonymous method, lambda expression, or local function.",
    ),
    error(
        DiagnosticCode::UseOfUnassignedOutParameter,
        "Use of unassigned out parameter '{0}'.",
    ),
    error(
        DiagnosticCode::OutParameterUnassigned,
        "The out parameter '{0}' must be assigned to before control leaves the primary constructor.",
    ),
    error(
        DiagnosticCode::FixedNeeded,
        "You can only take the address of primary constructor parameter '{0}' inside of a fixed statement initializer.",
    ),
    error(
        DiagnosticCode::FixedNotNeeded,
        "You cannot use the fixed statement to take the address of already fixed parameter '{0}'.",
    ),
    warning(
        DiagnosticCode::UnreadPrimaryConstructorParameter,
        "Parameter '{0}' is unread. Did you forget to use it to initialize the property with that name?",
    ),
    warning(
        DiagnosticCode::CapturedParameterPassedToBase,
        "Parameter '{0}' is captured into the state of the enclosing type and its value is also passed to the base constructor. The value might be captured by the base class as well.",
    ),
    warning(
        DiagnosticCode::CapturedParameterInFieldInitializer,
        "Parameter '{0}' is captured into the state of the enclosing type and its value is also used to initialize a field, property, or event.",
    ),
    warning(
        DiagnosticCode::CapturedParameterIsShadowedAndNotPassedToBase,
        "Primary constructor parameter '{0}' is shadowed by a member from base '{1}' and is not passed to the base constructor.",
    ),
    warning(
        DiagnosticCode::AssignmentToLockOrDispose,
        "Possibly incorrect assignment to '{0}' which is the argument to a using or lock statement.",
    ),
];
