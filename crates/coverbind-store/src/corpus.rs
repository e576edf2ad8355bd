//! JSON corpus loading.
//!
//! A corpus file bundles the coverage registry with pre-chunked excerpts:
//!
//! ```json
//! {
//!   "coverages": [{ "code": "A4200_1", "name": "암진단비" }],
//!   "documents": [{
//!     "insurer": "SAMSUNG", "coverage_code": "A4200_1",
//!     "doc_type": "약관", "doc_id": "SAMSUNG_CANCER_2024",
//!     "page": 45, "text": "암 진단 확정시 5천만원 지급"
//!   }]
//! }
//! ```
//!
//! Documents keep file order within each (coverage code, insurer) pair.

use std::path::Path;

use coverbind_core::Insurer;
use serde::Deserialize;
use tracing::info;

use crate::{MemoryCoverageRegistry, MemoryDocumentStore, RawEvidence, StoreError};

#[derive(Deserialize)]
struct CorpusFile {
    #[serde(default)]
    coverages: Vec<CoverageEntry>,
    #[serde(default)]
    documents: Vec<CorpusDocument>,
}

#[derive(Deserialize)]
struct CoverageEntry {
    code: String,
    name: String,
}

#[derive(Deserialize)]
struct CorpusDocument {
    insurer: Insurer,
    #[serde(flatten)]
    raw: RawEvidence,
}

/// Registry and document store loaded together.
#[derive(Debug, Default, Clone)]
pub struct Corpus {
    pub registry: MemoryCoverageRegistry,
    pub documents: MemoryDocumentStore,
}

impl Corpus {
    /// Parse a corpus from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, StoreError> {
        let file: CorpusFile = serde_json::from_str(json)?;

        let mut registry = MemoryCoverageRegistry::new();
        for entry in file.coverages {
            registry.insert(entry.code, entry.name);
        }

        let mut documents = MemoryDocumentStore::new();
        for doc in file.documents {
            documents.insert(doc.insurer, doc.raw);
        }

        Ok(Self {
            registry,
            documents,
        })
    }

    /// Load a corpus file from disk.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            return Err(StoreError::CorpusNotFound(path.to_path_buf()));
        }
        let json = std::fs::read_to_string(path)?;
        let corpus = Self::from_json_str(&json)?;
        info!(
            path = %path.display(),
            coverages = corpus.registry.len(),
            documents = corpus.documents.len(),
            "loaded corpus"
        );
        Ok(corpus)
    }
}
