//! Reference evaluator for analysed compilations.
//!
//! Executes synthesized constructor plans and member bodies over a small
//! value model so that initialization order and captured state can be
//! observed from tests and tooling:
//! - `value` - runtime values and heap objects
//! - `host` - the seam `extern` methods are routed through
//! - `interpreter` - the tree-walking interpreter

pub mod error;
pub mod host;
pub mod interpreter;
pub mod value;

pub use error::RuntimeError;
pub use host::{Host, RecordingHost};
pub use interpreter::Interpreter;
pub use value::{Object, ObjectRef, Value, ValueKind};
