//! Classification of written types: value vs reference, ref-like, and the
//! unmanaged category used by generic-constraint checks.

use crate::symbol_table::SymbolTable;
use crate::symbols::TypeId;
use primc_syntax::{TypeKind, TypeRef};

/// Predefined types the binder knows without declarations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BuiltinType {
    Bool,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Decimal,
    NativeInt,
    String,
    Object,
    Void,
    Span,
    ReadOnlySpan,
}

impl BuiltinType {
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "bool" | "Boolean" => Self::Bool,
            "byte" | "Byte" => Self::Byte,
            "char" | "Char" => Self::Char,
            "short" | "Int16" => Self::Short,
            "int" | "Int32" => Self::Int,
            "long" | "Int64" => Self::Long,
            "float" | "Single" => Self::Float,
            "double" | "Double" => Self::Double,
            "decimal" | "Decimal" => Self::Decimal,
            "nint" | "IntPtr" => Self::NativeInt,
            "string" | "String" => Self::String,
            "object" | "Object" => Self::Object,
            "void" => Self::Void,
            "Span" => Self::Span,
            "ReadOnlySpan" => Self::ReadOnlySpan,
            _ => return None,
        })
    }

    #[must_use]
    pub const fn is_value_type(self) -> bool {
        !matches!(self, Self::String | Self::Object | Self::Void)
    }

    #[must_use]
    pub const fn is_ref_like(self) -> bool {
        matches!(self, Self::Span | Self::ReadOnlySpan)
    }

    #[must_use]
    pub const fn is_unmanaged(self) -> bool {
        self.is_value_type() && !self.is_ref_like()
    }
}

/// What a [`TypeRef`] denotes from a given declaration context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeClass {
    Builtin(BuiltinType),
    User(TypeId),
    Pointer,
    Array,
    Nullable(Box<TypeClass>),
    TypeParameter,
    Unknown,
}

impl SymbolTable {
    /// Classify `ty` as written inside `context`.
    #[must_use]
    pub fn classify(&self, ty: &TypeRef, context: TypeId) -> TypeClass {
        match ty {
            TypeRef::Pointer(_) => TypeClass::Pointer,
            TypeRef::Array(_) => TypeClass::Array,
            TypeRef::Nullable(inner) => TypeClass::Nullable(Box::new(self.classify(inner, context))),
            TypeRef::Named(name) | TypeRef::Generic { name, .. } => {
                if self.is_type_parameter(name, context) {
                    TypeClass::TypeParameter
                } else if let Some(id) = self.lookup_type(name, Some(context)) {
                    TypeClass::User(id)
                } else if let Some(builtin) = BuiltinType::from_name(name) {
                    TypeClass::Builtin(builtin)
                } else {
                    TypeClass::Unknown
                }
            }
        }
    }

    fn is_type_parameter(&self, name: &str, context: TypeId) -> bool {
        let mut current = Some(context);
        while let Some(id) = current {
            let Some(ty) = self.get(id) else {
                return false;
            };
            if ty
                .parts
                .iter()
                .any(|part| part.type_parameters.iter().any(|p| p == name))
            {
                return true;
            }
            current = ty.containing;
        }
        false
    }

    /// Structs, enums, predefined value types and nullable value types.
    #[must_use]
    pub fn is_value_type(&self, ty: &TypeRef, context: TypeId) -> bool {
        self.class_is_value_type(&self.classify(ty, context))
    }

    fn class_is_value_type(&self, class: &TypeClass) -> bool {
        match class {
            TypeClass::Builtin(builtin) => builtin.is_value_type(),
            TypeClass::User(id) => self.get(*id).is_some_and(|t| t.is_value_type()),
            TypeClass::Pointer => true,
            TypeClass::Nullable(inner) => self.class_is_value_type(inner),
            TypeClass::Array | TypeClass::TypeParameter | TypeClass::Unknown => false,
        }
    }

    /// Stack-only types: `Span`, `ReadOnlySpan` and user `ref struct`s.
    #[must_use]
    pub fn is_ref_like(&self, ty: &TypeRef, context: TypeId) -> bool {
        match self.classify(ty, context) {
            TypeClass::Builtin(builtin) => builtin.is_ref_like(),
            TypeClass::User(id) => self.get(id).is_some_and(|t| t.is_ref_struct()),
            _ => false,
        }
    }

    /// The user value type a field of type `ty` embeds inline, if any.
    ///
    /// Pointers, arrays and reference types do not embed their target.
    /// `Nullable<S>` embeds `S`.
    #[must_use]
    pub fn embedded_value_type(&self, ty: &TypeRef, context: TypeId) -> Option<TypeId> {
        match self.classify(ty, context) {
            TypeClass::User(id) => {
                let target = self.get(id)?;
                (target.kind == TypeKind::Struct).then_some(id)
            }
            TypeClass::Nullable(inner) => match *inner {
                TypeClass::User(id) => {
                    let target = self.get(id)?;
                    (target.kind == TypeKind::Struct).then_some(id)
                }
                _ => None,
            },
            _ => None,
        }
    }
}
