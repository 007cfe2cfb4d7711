//! Symbol model: type, member and parameter symbols plus the artifacts the
//! synthesis driver hands to code generation.

use primc_common::Span;
use primc_syntax::{
    Expr, MemberSyntax, Modifiers, NodeId, PassingMode, TypeDeclSyntax, TypeKind, TypeRef,
};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

// =============================================================================
// Identities
// =============================================================================

/// Index of a merged type in the [`crate::SymbolTable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TypeId(pub u32);

impl TypeId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type#{}", self.0)
    }
}

/// A member of a type, numbered across all partial parts in part order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MemberId {
    pub owner: TypeId,
    pub index: u32,
}

/// A primary-constructor parameter, identified by owner and ordinal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ParamId {
    pub owner: TypeId,
    pub ordinal: u32,
}

// =============================================================================
// Members
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MemberKind {
    Field,
    Property,
    Indexer,
    Event,
    Method,
    Constructor,
    StaticConstructor,
    Destructor,
    NestedType,
}

impl MemberKind {
    /// Members that take part in simple-name lookup.
    #[must_use]
    pub const fn is_named(self) -> bool {
        !matches!(
            self,
            Self::Indexer | Self::Constructor | Self::StaticConstructor | Self::Destructor
        )
    }
}

/// Shape of one formal parameter, enough for arity/mode applicability.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ParamSignature {
    pub ty: TypeRef,
    pub mode: PassingMode,
    pub has_default: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct MemberSymbol {
    pub id: MemberId,
    pub name: String,
    pub kind: MemberKind,
    pub modifiers: Modifiers,
    pub is_static: bool,
    /// Field/property/event type, or a method's return type.
    pub ty: Option<TypeRef>,
    pub parameters: Vec<ParamSignature>,
    /// For `NestedType` members, the nested type's id.
    pub nested_type: Option<TypeId>,
    /// Part index and member index within that part.
    pub part: usize,
    pub position: usize,
    pub node: NodeId,
    pub span: Span,
}

impl MemberSymbol {
    /// Visible from a derived type: anything not private. Members without an
    /// accessibility modifier are private.
    #[must_use]
    pub fn is_inheritable(&self) -> bool {
        self.modifiers
            .intersects(Modifiers::PUBLIC | Modifiers::PROTECTED | Modifiers::INTERNAL)
    }

    #[must_use]
    pub fn required_arity(&self) -> usize {
        self.parameters.iter().filter(|p| !p.has_default).count()
    }

    /// Arity and passing-mode applicability against an argument list.
    /// A by-value argument is accepted for an `in` parameter.
    #[must_use]
    pub fn accepts(&self, args: &[PassingMode]) -> bool {
        signature_accepts(&self.parameters, args)
    }
}

pub(crate) fn signature_accepts(params: &[ParamSignature], args: &[PassingMode]) -> bool {
    let required = params.iter().filter(|p| !p.has_default).count();
    if args.len() < required || args.len() > params.len() {
        return false;
    }
    params.iter().zip(args).all(|(param, arg)| {
        param.mode == *arg || (param.mode == PassingMode::In && *arg == PassingMode::Value)
    })
}

// =============================================================================
// Primary-constructor parameters
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConstructorParameter {
    pub id: ParamId,
    pub name: String,
    pub declared_type: TypeRef,
    pub passing_mode: PassingMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Expr>,
    pub ordinal: u32,
    pub node: NodeId,
    pub span: Span,
}

impl ConstructorParameter {
    #[must_use]
    pub fn signature(&self) -> ParamSignature {
        ParamSignature {
            ty: self.declared_type.clone(),
            mode: self.passing_mode,
            has_default: self.default_value.is_some(),
        }
    }

    /// Name of the field a captured parameter is promoted to.
    #[must_use]
    pub fn backing_field_name(&self) -> String {
        let mut name = String::with_capacity(
            self.name.len() + primc_common::limits::BACKING_FIELD_NAME_OVERHEAD,
        );
        name.push('<');
        name.push_str(&self.name);
        name.push_str(">P");
        name
    }
}

// =============================================================================
// Types
// =============================================================================

/// A base-list entry after name lookup.
#[derive(Clone, Debug, Serialize)]
pub struct BaseEntry {
    pub ty: TypeRef,
    /// The user type the entry names, if any.
    pub target: Option<TypeId>,
    pub arguments: Option<Vec<primc_syntax::Argument>>,
    pub part: usize,
    pub node: NodeId,
    pub span: Span,
}

/// A merged (partial-part group) type declaration.
#[derive(Clone, Debug)]
pub struct TypeSymbol {
    pub id: TypeId,
    pub name: String,
    pub kind: TypeKind,
    /// Union of every part's modifiers.
    pub modifiers: Modifiers,
    pub parts: Vec<Arc<TypeDeclSyntax>>,
    pub containing: Option<TypeId>,
    pub base_list: Vec<BaseEntry>,
    /// The class this type derives from, when it is a user type.
    pub base_type: Option<TypeId>,
    pub interfaces: Vec<TypeId>,
    pub members: Vec<MemberSymbol>,
    /// Parameters of the authoritative parameter list.
    pub primary_parameters: Option<Vec<ConstructorParameter>>,
    /// Index of the part that carries the authoritative parameter list.
    pub primary_part: Option<usize>,
    /// A declaration-shape error blocks constructor synthesis.
    pub synthesis_blocked: bool,
}

impl TypeSymbol {
    #[must_use]
    pub fn is_value_type(&self) -> bool {
        matches!(self.kind, TypeKind::Struct | TypeKind::Enum)
    }

    #[must_use]
    pub fn is_readonly_struct(&self) -> bool {
        self.kind == TypeKind::Struct && self.modifiers.contains(Modifiers::READONLY)
    }

    #[must_use]
    pub fn is_ref_struct(&self) -> bool {
        self.kind == TypeKind::Struct && self.modifiers.contains(Modifiers::REF)
    }

    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.modifiers.contains(Modifiers::ABSTRACT)
    }

    #[must_use]
    pub fn is_static_class(&self) -> bool {
        self.kind == TypeKind::Class && self.modifiers.contains(Modifiers::STATIC)
    }

    #[must_use]
    pub fn has_primary_constructor(&self) -> bool {
        self.primary_parameters.is_some()
    }

    /// Primary parameters, empty when the type has no parameter list.
    #[must_use]
    pub fn parameters(&self) -> &[ConstructorParameter] {
        self.primary_parameters.as_deref().unwrap_or_default()
    }

    #[must_use]
    pub fn parameter(&self, id: ParamId) -> Option<&ConstructorParameter> {
        if id.owner != self.id {
            return None;
        }
        self.parameters().get(id.ordinal as usize)
    }

    #[must_use]
    pub fn parameter_named(&self, name: &str) -> Option<&ConstructorParameter> {
        self.parameters().iter().find(|p| p.name == name)
    }

    #[must_use]
    pub fn member(&self, id: MemberId) -> Option<&MemberSymbol> {
        if id.owner != self.id {
            return None;
        }
        self.members.get(id.index as usize)
    }

    /// Own named members with `name`, in declaration order.
    pub fn members_named<'a, 'n>(
        &'a self,
        name: &'n str,
    ) -> impl Iterator<Item = &'a MemberSymbol> + use<'a, 'n> {
        self.members
            .iter()
            .filter(move |m| m.kind.is_named() && m.name == name)
    }

    /// Explicit instance constructors, in declaration order.
    pub fn instance_constructors(&self) -> impl Iterator<Item = &MemberSymbol> {
        self.members
            .iter()
            .filter(|m| m.kind == MemberKind::Constructor)
    }

    /// The syntax a member symbol was built from.
    #[must_use]
    pub fn member_syntax(&self, member: &MemberSymbol) -> Option<&MemberSyntax> {
        self.parts.get(member.part)?.members.get(member.position)
    }

    /// Node and span used to anchor type-level diagnostics.
    #[must_use]
    pub fn anchor(&self) -> (NodeId, Span) {
        self.parts
            .first()
            .map_or((NodeId::NONE, Span::default()), |part| (part.id, part.span))
    }
}

// =============================================================================
// Synthesized artifacts
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Accessibility {
    Public,
    Protected,
}

/// Which constructor of the base type a base call targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ConstructorTarget {
    Primary(TypeId),
    Explicit(MemberId),
    /// The implicit parameterless constructor of a type without constructors.
    Implicit(TypeId),
}

/// The implicit `base(...)` call of a primary constructor.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConstructorCall {
    pub base_type: TypeRef,
    /// `None` when the base is not a user type or no constructor applies.
    pub target: Option<ConstructorTarget>,
    /// Argument passing modes and expression nodes, in order.
    pub arguments: Vec<(PassingMode, NodeId)>,
    pub node: NodeId,
}

/// One step of a synthesized constructor body.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "step")]
pub enum InitStep {
    /// `this.<p>P = p;`
    StoreBackingField { parameter: ParamId, field: String },
    /// Run an instance field/property/event initializer.
    RunInitializer { member: MemberId, name: String, node: NodeId },
    /// Evaluate the base arguments and invoke the base constructor.
    CallBase,
    /// Zero every field (`default(S)`), running no user code.
    ZeroInit,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ConstructorPlan {
    pub steps: Vec<InitStep>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SynthesizedPrimaryConstructor {
    pub owner: TypeId,
    pub owner_name: String,
    pub parameters: Vec<ConstructorParameter>,
    pub accessibility: Accessibility,
    pub base_or_this_call: Option<ConstructorCall>,
    pub captured_parameters: BTreeSet<ParamId>,
    pub plan: ConstructorPlan,
    /// Errors were reported against this constructor; code generation skips it.
    pub has_errors: bool,
}

/// The zero-argument constructor a value type with a non-empty parameter
/// list also exposes.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SynthesizedDefaultConstructor {
    pub owner: TypeId,
    pub plan: ConstructorPlan,
}

/// Storage for a captured parameter.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CapturedParameterField {
    pub parameter: ParamId,
    pub parameter_name: String,
    pub backing_field_name: String,
    pub field_type: TypeRef,
    pub is_readonly: bool,
    /// The field is initialized from this parameter at the head of the
    /// primary constructor.
    pub initial_value: ParamId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backing_field_name_is_not_an_identifier() {
        let param = ConstructorParameter {
            id: ParamId {
                owner: TypeId(0),
                ordinal: 0,
            },
            name: "x".to_string(),
            declared_type: TypeRef::named("int"),
            passing_mode: PassingMode::Value,
            default_value: None,
            ordinal: 0,
            node: NodeId::NONE,
            span: Span::default(),
        };
        assert_eq!(param.backing_field_name(), "<x>P");
    }

    #[test]
    fn test_signature_accepts_defaults_and_in_arguments() {
        let params = vec![
            ParamSignature {
                ty: TypeRef::named("int"),
                mode: PassingMode::In,
                has_default: false,
            },
            ParamSignature {
                ty: TypeRef::named("int"),
                mode: PassingMode::Value,
                has_default: true,
            },
        ];
        assert!(signature_accepts(&params, &[PassingMode::Value]));
        assert!(signature_accepts(&params, &[PassingMode::In, PassingMode::Value]));
        assert!(!signature_accepts(&params, &[]));
        assert!(!signature_accepts(&params, &[PassingMode::Ref]));
    }
}
