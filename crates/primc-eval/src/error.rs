//! Runtime errors raised by the evaluator.

use crate::value::ValueKind;
use primc_syntax::NodeId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("trap: {message}")]
    Trap { message: String },

    #[error("unknown type: {name}")]
    UnknownType { name: String },

    #[error("type {type_name} has no member named {member}")]
    UnknownMember { type_name: String, member: String },

    #[error("no binding recorded for node {node}")]
    Unbound { node: NodeId },

    #[error("name {name} did not resolve to a value")]
    Unresolved { name: String },

    #[error("local {name} read before it was assigned")]
    UninitializedLocal { name: String },

    #[error("{type_name} cannot be instantiated")]
    NotConstructible { type_name: String },

    #[error("no constructor of {type_name} accepts {arity} argument(s)")]
    NoConstructor { type_name: String, arity: usize },

    #[error("the primary constructor of {type_name} was not generated")]
    ConstructorUnavailable { type_name: String },

    #[error("type error in {op}: expected {expected}, got {got:?}")]
    TypeError {
        op: &'static str,
        expected: &'static str,
        got: ValueKind,
    },

    #[error("missing host function: {name}")]
    MissingHostFunction { name: String },

    #[error("unsupported construct: {what}")]
    Unsupported { what: &'static str },

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow in {op}")]
    Overflow { op: &'static str },

    #[error("call depth limit of {limit} exceeded")]
    CallDepthExceeded { limit: u32 },
}

impl RuntimeError {
    pub(crate) fn trap(message: impl Into<String>) -> Self {
        Self::Trap {
            message: message.into(),
        }
    }
}
