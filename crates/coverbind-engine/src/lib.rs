//! Evidence-to-decision pipeline.
//!
//! Retriever → Binder → Mapper, strictly downstream. Each stage owns and
//! fully builds its output; nothing flows back upstream.

pub mod binder;
pub mod config;
mod error;
pub mod explain;
pub mod pipeline;
pub mod retriever;

pub use binder::{
    ConflictAssessment, ConflictPolicy, EvidenceBinder, KeywordConflictPolicy,
    StrictKeywordConflictPolicy,
};
pub use config::RetrieverConfig;
pub use error::CompareError;
pub use explain::ExplainViewMapper;
pub use pipeline::{
    CompareOutcome, ComparePipeline, CompareRequest, DecisionSummary, InsurerOutcome,
};
pub use retriever::{EvidenceRetriever, EvidenceScore};
