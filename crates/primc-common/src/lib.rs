//! Common types and utilities for the primc binder.
//!
//! This crate provides foundational types used across all primc crates:
//! - Source spans (`Span`)
//! - Diagnostic categories, codes, message templates and the `Diagnostic` record
//! - Centralized limits and thresholds

// Span - Source location tracking (byte offsets)
pub mod span;
pub use span::Span;

// Centralized limits and thresholds
pub mod limits;

// Diagnostic records and the message table
pub mod diagnostics;
pub use diagnostics::{
    Diagnostic, DiagnosticCategory, DiagnosticCode, DiagnosticLocation,
    DiagnosticRelatedInformation, format_message,
};
