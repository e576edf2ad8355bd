use thiserror::Error;

use crate::decision::CompareDecision;
use crate::evidence::EvidencePurpose;

/// Construction-time defects in the evidence and decision model.
///
/// These never describe a comparison outcome. Partial failures are
/// [`CompareDecision`] variants, not errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("{0} slot has an empty excerpt")]
    EmptyExcerpt(EvidencePurpose),

    #[error("amount slot requires an extracted value")]
    MissingAmountValue,

    #[error("{0} slot must not carry an extracted value")]
    UnexpectedValue(EvidencePurpose),

    #[error("{found} slot placed in the {expected} position")]
    MisplacedSlot {
        expected: EvidencePurpose,
        found: EvidencePurpose,
    },

    #[error("decision {0} requires an amount value")]
    MissingAmount(CompareDecision),

    #[error("decision {0} must not carry an amount")]
    UnexpectedAmount(CompareDecision),

    #[error("normalised amount {numeric:?} does not match value {value:?}")]
    AmountMismatch { value: String, numeric: Option<i64> },

    #[error("decision no_amount must not carry bound evidence")]
    BoundEvidenceWithoutAmount,

    #[error("explanation decision {explanation} differs from result decision {result}")]
    DecisionMismatch {
        result: CompareDecision,
        explanation: CompareDecision,
    },

    #[error("reason is not a fact statement: {0:?}")]
    InferentialReason(String),

    #[error("unknown insurer: {0}")]
    UnknownInsurer(String),

    #[error("unknown document type: {0}")]
    UnknownDocType(String),
}
