//! Decision types for binding evidence slots to a comparison result.
//!
//! Evidence is fact, the decision is the outcome of fixed rules, and the
//! explanation is the log of those rules. Explanations are recorded, never
//! generated.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{DocType, EvidenceId, EvidencePurpose, ModelError, normalize_amount};

/// Phrases that mark a reason as inference rather than fact.
const INFERENTIAL_MARKERS: &[&str] = &[
    "appears to",
    "likely",
    "seems",
    "probably",
    "presumably",
    "보입니다",
    "추정",
    "것 같",
];

/// Terminal state of one insurer's comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareDecision {
    /// Amount evidence bound; result confirmed.
    Determined,
    /// No amount-bearing evidence.
    NoAmount,
    /// Amount found but a condition conflicts with it.
    ConditionMismatch,
    /// Only a definition exists.
    DefinitionOnly,
    /// Nothing usable.
    InsufficientEvidence,
}

impl CompareDecision {
    pub const ALL: [CompareDecision; 5] = [
        Self::Determined,
        Self::NoAmount,
        Self::ConditionMismatch,
        Self::DefinitionOnly,
        Self::InsufficientEvidence,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Determined => "determined",
            Self::NoAmount => "no_amount",
            Self::ConditionMismatch => "condition_mismatch",
            Self::DefinitionOnly => "definition_only",
            Self::InsufficientEvidence => "insufficient_evidence",
        }
    }

    /// Every outcome other than `determined` is a partial failure and must be shown.
    pub fn is_partial_failure(&self) -> bool {
        match self {
            Self::Determined => false,
            Self::NoAmount
            | Self::ConditionMismatch
            | Self::DefinitionOnly
            | Self::InsufficientEvidence => true,
        }
    }

    pub fn is_determined(&self) -> bool {
        !self.is_partial_failure()
    }

    /// Whether a result with this decision carries the bound amount.
    pub fn carries_amount(&self) -> bool {
        match self {
            Self::Determined | Self::ConditionMismatch => true,
            Self::NoAmount | Self::DefinitionOnly | Self::InsufficientEvidence => false,
        }
    }
}

impl fmt::Display for CompareDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named decision rules. Recorded verbatim in the rule trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionRule {
    // Amount binding
    AmountPrimary,
    DocPriority,
    ConditionExplicit,
    PageAsc,

    // Condition binding
    ConditionSameDoc,
    ConditionConflict,

    // Definition binding
    DefinitionOnly,
    DefinitionNoAmount,

    // Failure
    NoEvidence,
    #[serde(rename = "pass_1_empty")]
    Pass1Empty,
}

impl DecisionRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AmountPrimary => "amount_primary",
            Self::DocPriority => "doc_priority",
            Self::ConditionExplicit => "condition_explicit",
            Self::PageAsc => "page_asc",
            Self::ConditionSameDoc => "condition_same_doc",
            Self::ConditionConflict => "condition_conflict",
            Self::DefinitionOnly => "definition_only",
            Self::DefinitionNoAmount => "definition_no_amount",
            Self::NoEvidence => "no_evidence",
            Self::Pass1Empty => "pass_1_empty",
        }
    }
}

impl fmt::Display for DecisionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rule log for one binding.
///
/// Reasons are fact statements only ("amount evidence found in 약관").
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompareExplanation {
    pub decision: CompareDecision,
    pub applied_rules: Vec<DecisionRule>,
    pub used_evidence_ids: Vec<EvidenceId>,
    #[serde(rename = "dropped_evidence")]
    pub dropped_evidence_ids: Vec<EvidenceId>,
    #[serde(rename = "reason")]
    pub reasons: Vec<String>,
}

/// Doc id recorded on bound evidence whose slot carried none.
pub const UNKNOWN_DOC_ID: &str = "unknown";

/// Evidence actually used in the final decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoundEvidence {
    pub evidence_id: EvidenceId,
    pub slot_type: EvidencePurpose,
    pub doc_type: DocType,
    pub doc_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binding_rule: Option<DecisionRule>,
}

/// Final outcome of binding one insurer's evidence.
///
/// Built through [`BindingResult::new`], which rejects results that break the
/// decision invariants, so every value in circulation is well-formed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BindingResult {
    decision: CompareDecision,
    explanation: CompareExplanation,
    bound_evidence: Vec<BoundEvidence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    amount_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    amount_numeric: Option<i64>,
}

impl BindingResult {
    /// Validate and assemble a binding result.
    ///
    /// - `determined` / `condition_mismatch` require `amount_value`, and
    ///   `amount_numeric` must equal the normalisation of that value.
    /// - other decisions must carry neither amount field.
    /// - `no_amount` must carry no bound evidence.
    /// - the explanation decision must equal `decision`.
    /// - every reason must be a fact statement.
    pub fn new(
        decision: CompareDecision,
        explanation: CompareExplanation,
        bound_evidence: Vec<BoundEvidence>,
        amount_value: Option<String>,
        amount_numeric: Option<i64>,
    ) -> Result<Self, ModelError> {
        if explanation.decision != decision {
            return Err(ModelError::DecisionMismatch {
                result: decision,
                explanation: explanation.decision,
            });
        }

        if decision.carries_amount() {
            let value = amount_value
                .as_deref()
                .ok_or(ModelError::MissingAmount(decision))?;
            if normalize_amount(value) != amount_numeric {
                return Err(ModelError::AmountMismatch {
                    value: value.to_string(),
                    numeric: amount_numeric,
                });
            }
        } else if amount_value.is_some() || amount_numeric.is_some() {
            return Err(ModelError::UnexpectedAmount(decision));
        }

        if decision == CompareDecision::NoAmount && !bound_evidence.is_empty() {
            return Err(ModelError::BoundEvidenceWithoutAmount);
        }

        if let Some(reason) = explanation.reasons.iter().find(|r| is_inferential(r)) {
            return Err(ModelError::InferentialReason(reason.clone()));
        }

        Ok(Self {
            decision,
            explanation,
            bound_evidence,
            amount_value,
            amount_numeric,
        })
    }

    pub fn decision(&self) -> CompareDecision {
        self.decision
    }

    pub fn explanation(&self) -> &CompareExplanation {
        &self.explanation
    }

    pub fn bound_evidence(&self) -> &[BoundEvidence] {
        &self.bound_evidence
    }

    pub fn amount_value(&self) -> Option<&str> {
        self.amount_value.as_deref()
    }

    pub fn amount_numeric(&self) -> Option<i64> {
        self.amount_numeric
    }
}

/// Whether a reason string contains inferential language.
pub fn is_inferential(reason: &str) -> bool {
    let lower = reason.to_lowercase();
    INFERENTIAL_MARKERS.iter().any(|m| lower.contains(m))
}
