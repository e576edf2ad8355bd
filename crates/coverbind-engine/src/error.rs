use thiserror::Error;

/// Hard failures of a comparison request.
///
/// Partial failures (no amount, condition mismatch, ...) are decisions and
/// never appear here.
#[derive(Debug, Error)]
pub enum CompareError {
    #[error("coverage code is required")]
    EmptyCoverageCode,

    #[error("at least one insurer is required")]
    NoInsurers,

    #[error("cannot compare '{0}': coverage code does not exist")]
    CoverageNotFound(String),

    #[error("model defect: {0}")]
    Model(#[from] coverbind_core::ModelError),

    #[error("insurer task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
