pub mod amount;
pub mod decision;
pub mod error;
pub mod evidence;
pub mod evidence_id;
pub mod explain;
pub mod insurer;

pub use amount::normalize_amount;
pub use decision::{
    BindingResult, BoundEvidence, CompareDecision, CompareExplanation, DecisionRule,
    UNKNOWN_DOC_ID,
};
pub use error::ModelError;
pub use evidence::{
    DropReason, DroppedEvidence, EvidencePurpose, EvidenceSlot, EvidenceSlots,
    NoAmountFoundResult, NoAmountReason, RetrievalDebug, RetrievalDebugBuilder, RetrievalOutcome,
    RetrievalPass,
};
pub use evidence_id::{EvidenceId, EvidenceIdGenerator, RandomIdGenerator, SequentialIdGenerator};
pub use explain::{ExplainViewResponse, MultiInsurerExplainView};
pub use insurer::{DocType, Insurer};
