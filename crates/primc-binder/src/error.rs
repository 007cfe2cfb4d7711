use thiserror::Error;

/// Operational failures of an analysis run.
///
/// User-facing problems in the analysed code are never reported here; they
/// are [`primc_common::Diagnostic`]s in the results.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// The host cancelled the run; nothing was published.
    #[error("analysis was cancelled")]
    Cancelled,

    /// A base chain longer than `primc_common::limits::MAX_BASE_CHAIN_LENGTH`.
    #[error("base type chain of '{type_name}' exceeds {limit} types")]
    BaseChainTooLong { type_name: String, limit: usize },
}
