//! Evidence slots produced by two-pass retrieval.
//!
//! Every excerpt that survives retrieval serves exactly one purpose:
//!
//! - `amount`: payout amount, limit, or payout rate
//! - `condition`: payout conditions, exceptions, exclusions
//! - `definition`: term definitions, disease/procedure scope
//!
//! An excerpt without a purpose is never used in a comparison. Rejected
//! excerpts are recorded in [`RetrievalDebug`] with the reason they were
//! dropped.

use std::fmt;

use serde::Serialize;

use crate::{DocType, ModelError};

/// Default number of characters kept from a dropped excerpt in the debug trail.
pub const DROPPED_EXCERPT_CHARS: usize = 100;

/// What an evidence slot is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidencePurpose {
    Amount,
    Condition,
    Definition,
}

impl EvidencePurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Amount => "amount",
            Self::Condition => "condition",
            Self::Definition => "definition",
        }
    }
}

impl fmt::Display for EvidencePurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Retrieval phase that produced a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RetrievalPass {
    /// Amount-centric pass.
    #[serde(rename = "pass_1")]
    Pass1,
    /// Context completion pass. Never used without an amount slot.
    #[serde(rename = "pass_2")]
    Pass2,
}

/// Why an excerpt was rejected during retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    NoAmount,
    NoContent,
    ReferenceOnly,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoAmount => "no_amount",
            Self::NoContent => "no_content",
            Self::ReferenceOnly => "reference_only",
        }
    }
}

/// A single classified excerpt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvidenceSlot {
    purpose: EvidencePurpose,
    source_doc: DocType,
    excerpt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    doc_id: Option<String>,
    retrieval_pass: RetrievalPass,
}

impl EvidenceSlot {
    /// Build an amount slot. `value` is the extracted amount text.
    pub fn amount(
        source_doc: DocType,
        excerpt: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Self, ModelError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ModelError::MissingAmountValue);
        }
        Self::build(EvidencePurpose::Amount, source_doc, excerpt.into(), Some(value))
    }

    /// Build a condition slot.
    pub fn condition(source_doc: DocType, excerpt: impl Into<String>) -> Result<Self, ModelError> {
        Self::build(EvidencePurpose::Condition, source_doc, excerpt.into(), None)
    }

    /// Build a definition slot.
    pub fn definition(source_doc: DocType, excerpt: impl Into<String>) -> Result<Self, ModelError> {
        Self::build(EvidencePurpose::Definition, source_doc, excerpt.into(), None)
    }

    /// Build a slot for any purpose, validating the value rule for that purpose.
    pub fn new(
        purpose: EvidencePurpose,
        source_doc: DocType,
        excerpt: impl Into<String>,
        value: Option<String>,
    ) -> Result<Self, ModelError> {
        match (purpose, value) {
            (EvidencePurpose::Amount, Some(v)) => Self::amount(source_doc, excerpt, v),
            (EvidencePurpose::Amount, None) => Err(ModelError::MissingAmountValue),
            (p, Some(_)) => Err(ModelError::UnexpectedValue(p)),
            (p, None) => Self::build(p, source_doc, excerpt.into(), None),
        }
    }

    fn build(
        purpose: EvidencePurpose,
        source_doc: DocType,
        excerpt: String,
        value: Option<String>,
    ) -> Result<Self, ModelError> {
        if excerpt.trim().is_empty() {
            return Err(ModelError::EmptyExcerpt(purpose));
        }
        let retrieval_pass = match purpose {
            EvidencePurpose::Amount => RetrievalPass::Pass1,
            EvidencePurpose::Condition | EvidencePurpose::Definition => RetrievalPass::Pass2,
        };
        Ok(Self {
            purpose,
            source_doc,
            excerpt,
            value,
            page: None,
            doc_id: None,
            retrieval_pass,
        })
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_doc_id(mut self, doc_id: impl Into<String>) -> Self {
        self.doc_id = Some(doc_id.into());
        self
    }

    pub fn with_pass(mut self, pass: RetrievalPass) -> Self {
        self.retrieval_pass = pass;
        self
    }

    pub fn purpose(&self) -> EvidencePurpose {
        self.purpose
    }

    pub fn source_doc(&self) -> DocType {
        self.source_doc
    }

    pub fn excerpt(&self) -> &str {
        &self.excerpt
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn page(&self) -> Option<u32> {
        self.page
    }

    pub fn doc_id(&self) -> Option<&str> {
        self.doc_id.as_deref()
    }

    pub fn retrieval_pass(&self) -> RetrievalPass {
        self.retrieval_pass
    }
}

/// At most one slot per purpose.
///
/// Condition and definition slots only supplement an amount slot; a bundle
/// without an amount resolves to a definition-only or empty outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EvidenceSlots {
    #[serde(skip_serializing_if = "Option::is_none")]
    amount: Option<EvidenceSlot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    condition: Option<EvidenceSlot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    definition: Option<EvidenceSlot>,
}

impl EvidenceSlots {
    /// Assemble a bundle, checking each slot sits in the position matching its purpose.
    pub fn new(
        amount: Option<EvidenceSlot>,
        condition: Option<EvidenceSlot>,
        definition: Option<EvidenceSlot>,
    ) -> Result<Self, ModelError> {
        check_position(amount.as_ref(), EvidencePurpose::Amount)?;
        check_position(condition.as_ref(), EvidencePurpose::Condition)?;
        check_position(definition.as_ref(), EvidencePurpose::Definition)?;
        Ok(Self {
            amount,
            condition,
            definition,
        })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn amount(&self) -> Option<&EvidenceSlot> {
        self.amount.as_ref()
    }

    pub fn condition(&self) -> Option<&EvidenceSlot> {
        self.condition.as_ref()
    }

    pub fn definition(&self) -> Option<&EvidenceSlot> {
        self.definition.as_ref()
    }

    pub fn has_amount(&self) -> bool {
        self.amount.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.amount.is_none() && self.condition.is_none() && self.definition.is_none()
    }
}

fn check_position(slot: Option<&EvidenceSlot>, expected: EvidencePurpose) -> Result<(), ModelError> {
    match slot {
        Some(s) if s.purpose != expected => Err(ModelError::MisplacedSlot {
            expected,
            found: s.purpose,
        }),
        _ => Ok(()),
    }
}

/// Reason codes for a retrieval that found no amount-bearing text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoAmountReason {
    /// The document store returned nothing for the coverage code.
    NoDocumentsFound,
    /// Documents exist but none carries an amount pattern.
    NoAmountBearingEvidence,
}

impl NoAmountReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoDocumentsFound => "no_documents_found",
            Self::NoAmountBearingEvidence => "no_amount_bearing_evidence",
        }
    }
}

impl fmt::Display for NoAmountReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal retrieval outcome when no amount evidence exists.
///
/// Distinct from an empty [`EvidenceSlots`] so "zero documents" and
/// "documents without an amount" stay distinguishable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NoAmountFoundResult {
    pub reason: NoAmountReason,
}

impl NoAmountFoundResult {
    pub fn new(reason: NoAmountReason) -> Self {
        Self { reason }
    }
}

/// Input to the binder: either a slot bundle or an explicit no-amount result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RetrievalOutcome {
    Slots(EvidenceSlots),
    #[serde(rename = "no_amount_found")]
    NoAmount(NoAmountFoundResult),
}

impl From<EvidenceSlots> for RetrievalOutcome {
    fn from(slots: EvidenceSlots) -> Self {
        Self::Slots(slots)
    }
}

impl From<NoAmountFoundResult> for RetrievalOutcome {
    fn from(result: NoAmountFoundResult) -> Self {
        Self::NoAmount(result)
    }
}

/// One rejected excerpt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedEvidence {
    pub reason: DropReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_id: Option<String>,
}

/// Debug trail that accompanies every retrieval result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RetrievalDebug {
    #[serde(rename = "retrieval_pass_1_count")]
    pass_1_count: usize,
    #[serde(rename = "retrieval_pass_2_count")]
    pass_2_count: usize,
    dropped_evidence: Vec<DroppedEvidence>,
}

impl RetrievalDebug {
    /// Amount candidates found in pass 1.
    pub fn pass_1_count(&self) -> usize {
        self.pass_1_count
    }

    /// Context slots filled in pass 2.
    pub fn pass_2_count(&self) -> usize {
        self.pass_2_count
    }

    pub fn dropped_evidence(&self) -> &[DroppedEvidence] {
        &self.dropped_evidence
    }

    /// Number of dropped excerpts with the given reason.
    pub fn dropped_count(&self, reason: DropReason) -> usize {
        self.dropped_evidence
            .iter()
            .filter(|d| d.reason == reason)
            .count()
    }
}

/// Append-only accumulator for [`RetrievalDebug`], frozen by [`finish`](Self::finish).
#[derive(Debug)]
pub struct RetrievalDebugBuilder {
    debug: RetrievalDebug,
    excerpt_limit: usize,
}

impl Default for RetrievalDebugBuilder {
    fn default() -> Self {
        Self::new(DROPPED_EXCERPT_CHARS)
    }
}

impl RetrievalDebugBuilder {
    /// `excerpt_limit` caps how many characters of a dropped excerpt are kept.
    pub fn new(excerpt_limit: usize) -> Self {
        Self {
            debug: RetrievalDebug::default(),
            excerpt_limit,
        }
    }

    pub fn record_drop(&mut self, reason: DropReason, text: &str, doc_id: Option<&str>) {
        let excerpt = if text.is_empty() {
            None
        } else {
            Some(text.chars().take(self.excerpt_limit).collect())
        };
        self.debug.dropped_evidence.push(DroppedEvidence {
            reason,
            excerpt,
            doc_id: doc_id.map(str::to_string),
        });
    }

    pub fn set_pass_1_count(&mut self, count: usize) {
        self.debug.pass_1_count = count;
    }

    pub fn record_pass_2_hit(&mut self) {
        self.debug.pass_2_count += 1;
    }

    pub fn finish(self) -> RetrievalDebug {
        self.debug
    }
}
