//! Collaborators consumed by the comparison pipeline: document lookup by
//! coverage code and canonical coverage registry.

mod batches;
mod corpus;
mod error;
mod memory;

pub use corpus::Corpus;
pub use error::StoreError;
pub use memory::{MemoryCoverageRegistry, MemoryDocumentStore};

use coverbind_core::{DocType, Insurer};
use serde::{Deserialize, Serialize};

/// One raw excerpt as stored, before classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvidence {
    pub doc_type: DocType,
    pub doc_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    pub text: String,
    pub coverage_code: String,
}

/// Document lookup by canonical coverage code.
///
/// Implementations must return only excerpts already scoped to
/// `coverage_code`, and must return them in a stable order: the same store
/// contents always yield the same sequence. Retrieval trusts both guarantees
/// and uses input order as its final tie-break.
pub trait DocumentStore: Send + Sync {
    fn get_documents_by_coverage_code(&self, coverage_code: &str, insurer: Insurer)
    -> Vec<RawEvidence>;
}

/// Canonical coverage codes and their official names.
pub trait CoverageRegistry: Send + Sync {
    fn get_name(&self, coverage_code: &str) -> Option<String>;

    fn exists(&self, coverage_code: &str) -> bool {
        self.get_name(coverage_code).is_some()
    }
}
