//! Centralized limits and thresholds for the primc binder.
//!
//! Every walk in the binder is bounded by the size of its input, so these
//! limits are not about termination. They keep pathological inputs (absurd base
//! chains produced by tooling, runaway evaluation) from exhausting the stack.

// =============================================================================
// Recursion Depth Limits
// =============================================================================

/// Remaining stack below which the occurrence walker switches to a freshly
/// allocated segment. The walker never truncates deep expressions.
pub const WALK_STACK_RED_ZONE: usize = 64 * 1024;

/// Size of each stack segment the occurrence walker allocates.
pub const WALK_STACK_GROWTH: usize = 1024 * 1024;

/// Maximum number of base types followed when looking up inherited members
/// or computing the topological analysis order.
///
/// Cyclic base lists are rejected before analysis, so this only guards
/// against malformed symbol tables handed in by tooling.
pub const MAX_BASE_CHAIN_LENGTH: usize = 256;

/// Maximum depth of the struct-layout containment graph explored when
/// computing the unmanaged predicate.
pub const MAX_LAYOUT_DEPTH: u32 = 128;

// =============================================================================
// Capacity Limits
// =============================================================================

/// Initial capacity for per-type occurrence tables.
pub const OCCURRENCE_TABLE_CAPACITY: usize = 64;

/// Number of characters reserved for a mangled backing-field name beyond the
/// parameter name itself (`<` + `>P`).
pub const BACKING_FIELD_NAME_OVERHEAD: usize = 3;

// =============================================================================
// Evaluator Limits
// =============================================================================

/// Maximum nesting of constructor and method calls in the reference
/// evaluator before it traps.
pub const MAX_EVAL_CALL_DEPTH: u32 = 256;

/// Maximum iterations of a single `while` loop in the reference evaluator.
pub const MAX_EVAL_LOOP_ITERATIONS: u64 = 1_000_000;
