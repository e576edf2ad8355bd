//! Opaque evidence identifiers used for citation only.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Citation handle for one bound piece of evidence.
///
/// Unique within a binding result. Carries no meaning and must not be used
/// for ordering or equality of the underlying evidence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct EvidenceId(String);

impl EvidenceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EvidenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of fresh evidence ids, injected into the binder.
pub trait EvidenceIdGenerator: Send + Sync {
    fn next_id(&self) -> EvidenceId;
}

/// Random ids of the form `EVID-1A2B3C4D`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIdGenerator;

impl EvidenceIdGenerator for RandomIdGenerator {
    fn next_id(&self) -> EvidenceId {
        let hex = uuid::Uuid::new_v4().simple().to_string();
        EvidenceId(format!("EVID-{}", hex[..8].to_ascii_uppercase()))
    }
}

/// Deterministic ids (`EVID-00000001`, `EVID-00000002`, ...) for reproducible runs.
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    counter: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EvidenceIdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> EvidenceId {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        EvidenceId(format!("EVID-{n:08}"))
    }
}
