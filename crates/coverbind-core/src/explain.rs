//! Explain-view types.
//!
//! Keeps facts (evidence tabs), rules (rule trace), and the conclusion
//! (decision, headline, reason cards) in separate structures. "Nothing found"
//! is shown as a reason card, never as an empty field.

use serde::Serialize;

use crate::{CompareDecision, DecisionRule, DocType, EvidenceId, Insurer};

/// Severity of a reason card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CardType {
    Info,
    Warning,
    Error,
}

impl CardType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

/// Source pointer shown on a reason card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvidenceReference {
    pub doc_type: DocType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReasonCard {
    #[serde(rename = "type")]
    pub card_type: CardType,
    pub title: &'static str,
    pub message: &'static str,
    pub decision: CompareDecision,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<EvidenceReference>,
}

/// Row in the amount tab. Value, source, page, and excerpt are always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AmountEvidenceItem {
    pub value: String,
    pub source_doc: DocType,
    pub page: u32,
    pub excerpt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConditionEvidenceItem {
    pub source_doc: DocType,
    pub excerpt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_id: Option<String>,
    pub has_conflict: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefinitionEvidenceItem {
    pub source_doc: DocType,
    pub excerpt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_id: Option<String>,
}

/// Evidence partitioned by slot type. Slots never mix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EvidenceTabs {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub amount: Vec<AmountEvidenceItem>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub condition: Vec<ConditionEvidenceItem>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub definition: Vec<DefinitionEvidenceItem>,
}

impl EvidenceTabs {
    pub fn has_amount(&self) -> bool {
        !self.amount.is_empty()
    }

    pub fn has_condition(&self) -> bool {
        !self.condition.is_empty()
    }

    pub fn has_definition(&self) -> bool {
        !self.definition.is_empty()
    }

    pub fn len(&self) -> usize {
        self.amount.len() + self.condition.len() + self.definition.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedEvidenceInfo {
    pub id: EvidenceId,
    pub reason: &'static str,
}

/// Rules exactly as the binder recorded them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleTrace {
    pub applied_rules: Vec<DecisionRule>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dropped_evidence: Vec<DroppedEvidenceInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExplainViewResponse {
    pub decision: CompareDecision,
    pub headline: &'static str,
    pub reason_cards: Vec<ReasonCard>,
    pub evidence_tabs: EvidenceTabs,
    pub rule_trace: RuleTrace,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsurerExplainView {
    pub insurer: Insurer,
    pub explain_view: ExplainViewResponse,
}

/// One explain view per insurer, in request order. Insurers are not ranked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MultiInsurerExplainView {
    pub canonical_coverage_code: String,
    pub canonical_coverage_name: String,
    pub insurer_views: Vec<InsurerExplainView>,
}
