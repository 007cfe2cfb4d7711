//! Parse-tree model for type declarations with primary constructors.
//!
//! The binder never parses source text. It consumes the trees defined here,
//! which an external parser (or a test, through [`factory`]) produces:
//! - `ast` - declarations, members, statements and expressions
//! - `visit` - read-only visitor plus the node numbering pass
//! - `factory` - terse constructors for building trees by hand

pub mod ast;
pub mod factory;
pub mod visit;

pub use ast::*;
pub use visit::{Visitor, number_nodes, walk_body, walk_expr, walk_stmt};
