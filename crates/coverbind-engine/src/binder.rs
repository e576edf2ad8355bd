//! Rule-based evidence binding.
//!
//! Turns one retrieval outcome into a [`BindingResult`] by walking a fixed
//! sequence of rules. Every rule that fires is recorded by id, every reason
//! is a fact statement built from document labels and page numbers, and
//! every slot that is not bound gets an id in the dropped list.

use std::sync::{Arc, LazyLock};

use coverbind_core::{
    BindingResult, BoundEvidence, CompareDecision, CompareExplanation, DecisionRule, EvidenceId,
    EvidenceIdGenerator, EvidenceSlot, EvidenceSlots, ModelError, NoAmountFoundResult,
    RandomIdGenerator, RetrievalOutcome, UNKNOWN_DOC_ID, normalize_amount,
};
use regex::Regex;
use tracing::debug;

// ── Conflict policies ──

/// Non-coverage language: "not covered", "excluded", "exempt", "uncovered".
static NON_COVERAGE_TERMS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("보장하지 않", r"보장하지\s*않"),
        ("제외", r"제외"),
        ("면책", r"면책"),
        ("불보장", r"불보장"),
    ]
    .into_iter()
    .map(|(label, p)| (label, Regex::new(p).expect("static conflict pattern")))
    .collect()
});

fn non_coverage_terms(text: &str) -> Vec<&'static str> {
    NON_COVERAGE_TERMS
        .iter()
        .filter(|(_, re)| re.is_match(text))
        .map(|(label, _)| *label)
        .collect()
}

/// What a [`ConflictPolicy`] found in a condition excerpt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictAssessment {
    /// Fixed term labels that matched. Never document text.
    pub matched: Vec<&'static str>,
    pub is_conflict: bool,
}

/// Decides whether a condition contradicts the bound amount.
pub trait ConflictPolicy: Send + Sync {
    fn name(&self) -> &'static str;
    fn assess(&self, amount: &EvidenceSlot, condition: &EvidenceSlot) -> ConflictAssessment;
}

/// Scans for non-coverage terms and logs matches. Never asserts a conflict.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordConflictPolicy;

impl ConflictPolicy for KeywordConflictPolicy {
    fn name(&self) -> &'static str {
        "keyword"
    }

    fn assess(&self, _amount: &EvidenceSlot, condition: &EvidenceSlot) -> ConflictAssessment {
        let matched = non_coverage_terms(condition.excerpt());
        if !matched.is_empty() {
            debug!(?matched, "non-coverage terms in condition, not asserted");
        }
        ConflictAssessment {
            matched,
            is_conflict: false,
        }
    }
}

/// Asserts a conflict whenever any non-coverage term matches.
#[derive(Debug, Default, Clone, Copy)]
pub struct StrictKeywordConflictPolicy;

impl ConflictPolicy for StrictKeywordConflictPolicy {
    fn name(&self) -> &'static str {
        "strict"
    }

    fn assess(&self, _amount: &EvidenceSlot, condition: &EvidenceSlot) -> ConflictAssessment {
        let matched = non_coverage_terms(condition.excerpt());
        let is_conflict = !matched.is_empty();
        ConflictAssessment {
            matched,
            is_conflict,
        }
    }
}

// ── Binding context ──

/// Accumulates rules, reasons, and evidence while the binder walks its rules.
/// Frozen into a validated [`BindingResult`] by [`finish`](Self::finish).
struct BindingContext<'a> {
    ids: &'a dyn EvidenceIdGenerator,
    rules: Vec<DecisionRule>,
    reasons: Vec<String>,
    used: Vec<EvidenceId>,
    dropped: Vec<EvidenceId>,
    bound: Vec<BoundEvidence>,
}

impl<'a> BindingContext<'a> {
    fn new(ids: &'a dyn EvidenceIdGenerator) -> Self {
        Self {
            ids,
            rules: Vec::new(),
            reasons: Vec::new(),
            used: Vec::new(),
            dropped: Vec::new(),
            bound: Vec::new(),
        }
    }

    fn apply(&mut self, rule: DecisionRule) {
        self.rules.push(rule);
    }

    fn reason(&mut self, reason: impl Into<String>) {
        self.reasons.push(reason.into());
    }

    fn bind(&mut self, slot: &EvidenceSlot, binding_rule: Option<DecisionRule>) {
        let evidence_id = self.ids.next_id();
        self.used.push(evidence_id.clone());
        self.bound.push(BoundEvidence {
            evidence_id,
            slot_type: slot.purpose(),
            doc_type: slot.source_doc(),
            doc_id: slot.doc_id().unwrap_or(UNKNOWN_DOC_ID).to_string(),
            page: slot.page(),
            excerpt: Some(slot.excerpt().to_string()),
            binding_rule,
        });
    }

    fn drop_slot(&mut self) {
        let id = self.ids.next_id();
        self.dropped.push(id);
    }

    fn finish(
        self,
        decision: CompareDecision,
        amount_value: Option<String>,
        amount_numeric: Option<i64>,
    ) -> Result<BindingResult, ModelError> {
        let explanation = CompareExplanation {
            decision,
            applied_rules: self.rules,
            used_evidence_ids: self.used,
            dropped_evidence_ids: self.dropped,
            reasons: self.reasons,
        };
        BindingResult::new(decision, explanation, self.bound, amount_value, amount_numeric)
    }
}

/// "약관 page 45", or just "약관" when the page is unknown.
fn location(slot: &EvidenceSlot) -> String {
    match slot.page() {
        Some(page) => format!("{} page {page}", slot.source_doc()),
        None => slot.source_doc().to_string(),
    }
}

fn same_document(a: &EvidenceSlot, b: &EvidenceSlot) -> bool {
    matches!((a.doc_id(), b.doc_id()), (Some(x), Some(y)) if x == y)
}

// ── Binder ──

/// Binds retrieved evidence slots to a [`CompareDecision`].
///
/// Deterministic for a given input apart from the evidence ids, which come
/// from the injected generator.
#[derive(Clone)]
pub struct EvidenceBinder {
    ids: Arc<dyn EvidenceIdGenerator>,
    policy: Arc<dyn ConflictPolicy>,
}

impl Default for EvidenceBinder {
    fn default() -> Self {
        Self::new(Arc::new(RandomIdGenerator), Arc::new(KeywordConflictPolicy))
    }
}

impl EvidenceBinder {
    pub fn new(ids: Arc<dyn EvidenceIdGenerator>, policy: Arc<dyn ConflictPolicy>) -> Self {
        Self { ids, policy }
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    /// Bind a retrieval outcome.
    ///
    /// Partial failures come back as decisions. An `Err` means the binder
    /// produced a result that breaks the decision invariants.
    pub fn bind(&self, outcome: &RetrievalOutcome) -> Result<BindingResult, ModelError> {
        let result = match outcome {
            RetrievalOutcome::NoAmount(no_amount) => self.bind_no_amount(no_amount),
            RetrievalOutcome::Slots(slots) => self.bind_slots(slots),
        }?;
        debug!(
            decision = %result.decision(),
            rules = result.explanation().applied_rules.len(),
            bound = result.bound_evidence().len(),
            "binding complete"
        );
        Ok(result)
    }

    fn bind_no_amount(&self, no_amount: &NoAmountFoundResult) -> Result<BindingResult, ModelError> {
        let mut ctx = BindingContext::new(self.ids.as_ref());
        ctx.apply(DecisionRule::Pass1Empty);
        ctx.reason(format!("pass 1 returned no amount evidence: {}", no_amount.reason));
        ctx.finish(CompareDecision::NoAmount, None, None)
    }

    fn bind_slots(&self, slots: &EvidenceSlots) -> Result<BindingResult, ModelError> {
        let mut ctx = BindingContext::new(self.ids.as_ref());

        let Some(amount) = slots.amount() else {
            return Self::bind_without_amount(ctx, slots);
        };

        // Amount
        ctx.apply(DecisionRule::AmountPrimary);
        ctx.apply(DecisionRule::DocPriority);
        ctx.bind(amount, Some(DecisionRule::AmountPrimary));
        ctx.reason(format!("amount evidence found in {}", location(amount)));

        let amount_value = amount.value().unwrap_or(amount.excerpt()).to_string();
        let amount_numeric = normalize_amount(&amount_value);
        match amount_numeric {
            Some(n) => ctx.reason(format!("amount normalized to {n}")),
            None => ctx.reason("amount value has no recognised scale"),
        }

        // Condition
        let mut conflict = false;
        if let Some(condition) = slots.condition() {
            let same_doc = same_document(amount, condition);
            if same_doc {
                ctx.apply(DecisionRule::ConditionSameDoc);
            }

            let assessment = self.policy.assess(amount, condition);
            if assessment.is_conflict {
                conflict = true;
                ctx.apply(DecisionRule::ConditionConflict);
                ctx.drop_slot();
                ctx.reason(format!(
                    "condition evidence in {} contains non-coverage terms ({}); amount retained",
                    location(condition),
                    assessment.matched.join(", ")
                ));
            } else {
                let rule = same_doc.then_some(DecisionRule::ConditionSameDoc);
                ctx.bind(condition, rule);
                if same_doc {
                    ctx.reason("condition evidence found in the amount document");
                } else {
                    ctx.reason(format!("condition evidence found in {}", location(condition)));
                }
            }
        }

        // Definition
        if let Some(definition) = slots.definition() {
            if conflict {
                ctx.drop_slot();
            } else {
                ctx.bind(definition, None);
                ctx.reason(format!("definition evidence found in {}", location(definition)));
            }
        }

        let decision = if conflict {
            CompareDecision::ConditionMismatch
        } else {
            CompareDecision::Determined
        };
        ctx.finish(decision, Some(amount_value), amount_numeric)
    }

    fn bind_without_amount(
        mut ctx: BindingContext<'_>,
        slots: &EvidenceSlots,
    ) -> Result<BindingResult, ModelError> {
        match slots.definition() {
            Some(definition) => {
                ctx.apply(DecisionRule::DefinitionOnly);
                ctx.apply(DecisionRule::DefinitionNoAmount);
                ctx.bind(definition, Some(DecisionRule::DefinitionOnly));
                ctx.reason(format!(
                    "definition evidence found in {} without amount evidence",
                    location(definition)
                ));
                if slots.condition().is_some() {
                    ctx.drop_slot();
                }
                ctx.finish(CompareDecision::DefinitionOnly, None, None)
            }
            None => {
                ctx.apply(DecisionRule::NoEvidence);
                match slots.condition() {
                    Some(condition) => {
                        ctx.drop_slot();
                        ctx.reason(format!(
                            "condition evidence found in {} without amount evidence",
                            location(condition)
                        ));
                    }
                    None => ctx.reason("no amount, condition or definition evidence retrieved"),
                }
                ctx.finish(CompareDecision::InsufficientEvidence, None, None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coverbind_core::{
        DocType, EvidencePurpose, NoAmountReason, SequentialIdGenerator, decision::is_inferential,
    };

    const DOC: &str = "SAMSUNG_CANCER_2024";

    fn binder() -> EvidenceBinder {
        EvidenceBinder::new(
            Arc::new(SequentialIdGenerator::new()),
            Arc::new(KeywordConflictPolicy),
        )
    }

    fn strict_binder() -> EvidenceBinder {
        EvidenceBinder::new(
            Arc::new(SequentialIdGenerator::new()),
            Arc::new(StrictKeywordConflictPolicy),
        )
    }

    fn amount(value: &str) -> EvidenceSlot {
        EvidenceSlot::amount(DocType::Yakgwan, format!("암 진단 확정시 {value} 지급"), value)
            .unwrap()
            .with_page(45)
            .with_doc_id(DOC)
    }

    fn condition(doc_id: &str) -> EvidenceSlot {
        EvidenceSlot::condition(DocType::Yakgwan, "계약일로부터 90일 이내 진단 시 보장하지 않음")
            .unwrap()
            .with_page(46)
            .with_doc_id(doc_id)
    }

    fn definition() -> EvidenceSlot {
        EvidenceSlot::definition(
            DocType::Yakgwan,
            "암이라 함은 한국표준질병사인분류에서 정의하는 악성신생물을 말합니다",
        )
        .unwrap()
        .with_page(10)
        .with_doc_id(DOC)
    }

    fn slots(
        a: Option<EvidenceSlot>,
        c: Option<EvidenceSlot>,
        d: Option<EvidenceSlot>,
    ) -> RetrievalOutcome {
        EvidenceSlots::new(a, c, d).unwrap().into()
    }

    #[test]
    fn no_amount_found() {
        let outcome = NoAmountFoundResult::new(NoAmountReason::NoDocumentsFound).into();
        let result = binder().bind(&outcome).unwrap();

        assert_eq!(result.decision(), CompareDecision::NoAmount);
        assert_eq!(result.explanation().applied_rules, vec![DecisionRule::Pass1Empty]);
        assert!(result.bound_evidence().is_empty());
        assert!(result.amount_value().is_none());
        assert!(result.explanation().reasons[0].contains("no_documents_found"));
    }

    #[test]
    fn empty_slots_are_insufficient() {
        let result = binder().bind(&slots(None, None, None)).unwrap();
        assert_eq!(result.decision(), CompareDecision::InsufficientEvidence);
        assert_eq!(result.explanation().applied_rules, vec![DecisionRule::NoEvidence]);
        assert!(result.bound_evidence().is_empty());
        assert!(result.amount_numeric().is_none());
    }

    #[test]
    fn definition_only() {
        let result = binder().bind(&slots(None, None, Some(definition()))).unwrap();

        assert_eq!(result.decision(), CompareDecision::DefinitionOnly);
        assert_eq!(
            result.explanation().applied_rules,
            vec![DecisionRule::DefinitionOnly, DecisionRule::DefinitionNoAmount]
        );
        assert_eq!(result.bound_evidence().len(), 1);
        assert_eq!(result.bound_evidence()[0].slot_type, EvidencePurpose::Definition);
        assert_eq!(result.bound_evidence()[0].binding_rule, Some(DecisionRule::DefinitionOnly));
        assert!(result.amount_value().is_none());
        assert!(result.amount_numeric().is_none());
    }

    #[test]
    fn condition_without_amount_is_dropped() {
        let result = binder().bind(&slots(None, Some(condition(DOC)), None)).unwrap();
        assert_eq!(result.decision(), CompareDecision::InsufficientEvidence);
        assert!(result.bound_evidence().is_empty());
        assert_eq!(result.explanation().dropped_evidence_ids.len(), 1);
    }

    #[test]
    fn amount_only_is_determined() {
        let result = binder().bind(&slots(Some(amount("5천만원")), None, None)).unwrap();

        assert_eq!(result.decision(), CompareDecision::Determined);
        assert_eq!(
            result.explanation().applied_rules,
            vec![DecisionRule::AmountPrimary, DecisionRule::DocPriority]
        );
        assert_eq!(result.amount_value(), Some("5천만원"));
        assert_eq!(result.amount_numeric(), Some(50_000_000));

        let bound = &result.bound_evidence()[0];
        assert_eq!(bound.slot_type, EvidencePurpose::Amount);
        assert_eq!(bound.binding_rule, Some(DecisionRule::AmountPrimary));
        assert_eq!(bound.doc_id, DOC);
        assert_eq!(bound.page, Some(45));
    }

    #[test]
    fn amount_scales() {
        for (value, expected) in [("3천만원", 30_000_000), ("1억", 100_000_000)] {
            let result = binder().bind(&slots(Some(amount(value)), None, None)).unwrap();
            assert_eq!(result.amount_numeric(), Some(expected));
        }
    }

    #[test]
    fn unscaled_amount_still_determined() {
        let result = binder().bind(&slots(Some(amount("보험금 한도")), None, None)).unwrap();
        assert_eq!(result.decision(), CompareDecision::Determined);
        assert_eq!(result.amount_value(), Some("보험금 한도"));
        assert_eq!(result.amount_numeric(), None);
    }

    #[test]
    fn amount_with_condition_same_doc() {
        let result = binder()
            .bind(&slots(Some(amount("5천만원")), Some(condition(DOC)), None))
            .unwrap();

        assert_eq!(result.decision(), CompareDecision::Determined);
        assert!(result.explanation().applied_rules.contains(&DecisionRule::ConditionSameDoc));
        assert_eq!(result.bound_evidence().len(), 2);
        assert_eq!(
            result.bound_evidence()[1].binding_rule,
            Some(DecisionRule::ConditionSameDoc)
        );
    }

    #[test]
    fn condition_from_other_doc() {
        let result = binder()
            .bind(&slots(Some(amount("5천만원")), Some(condition("OTHER")), None))
            .unwrap();
        assert!(!result.explanation().applied_rules.contains(&DecisionRule::ConditionSameDoc));
        assert_eq!(result.bound_evidence()[1].binding_rule, None);
    }

    #[test]
    fn missing_doc_ids_never_count_as_same_doc() {
        let a = EvidenceSlot::amount(DocType::Yakgwan, "5천만원 지급", "5천만원").unwrap();
        let c = EvidenceSlot::condition(DocType::Yakgwan, "90일 이내 면책").unwrap();
        let result = binder().bind(&slots(Some(a), Some(c), None)).unwrap();
        assert!(!result.explanation().applied_rules.contains(&DecisionRule::ConditionSameDoc));
    }

    #[test]
    fn slot_without_doc_id_binds_as_unknown() {
        let a = EvidenceSlot::amount(DocType::Yakgwan, "5천만원 지급", "5천만원").unwrap();
        let result = binder().bind(&slots(Some(a), None, None)).unwrap();
        assert_eq!(result.bound_evidence()[0].doc_id, UNKNOWN_DOC_ID);

        let v = serde_json::to_value(&result).unwrap();
        assert_eq!(v["bound_evidence"][0]["doc_id"], "unknown");
    }

    #[test]
    fn default_policy_never_asserts_conflict() {
        let result = binder()
            .bind(&slots(Some(amount("5천만원")), Some(condition(DOC)), Some(definition())))
            .unwrap();
        assert_eq!(result.decision(), CompareDecision::Determined);
        assert_eq!(result.bound_evidence().len(), 3);
        assert!(result.explanation().dropped_evidence_ids.is_empty());
    }

    #[test]
    fn strict_policy_reports_mismatch() {
        let result = strict_binder()
            .bind(&slots(Some(amount("5천만원")), Some(condition(DOC)), Some(definition())))
            .unwrap();

        assert_eq!(result.decision(), CompareDecision::ConditionMismatch);
        assert!(result.explanation().applied_rules.contains(&DecisionRule::ConditionConflict));
        assert_eq!(result.amount_value(), Some("5천만원"));
        assert_eq!(result.amount_numeric(), Some(50_000_000));
        // Only the amount stays bound.
        assert_eq!(result.bound_evidence().len(), 1);
        assert_eq!(result.explanation().dropped_evidence_ids.len(), 2);
        assert!(
            result
                .explanation()
                .reasons
                .iter()
                .any(|r| r.contains("보장하지 않") && r.contains("amount retained"))
        );
    }

    #[test]
    fn strict_policy_ignores_plain_conditions() {
        let c = EvidenceSlot::condition(DocType::Yakgwan, "유사암은 진단비의 20% 감액 지급").unwrap();
        let result = strict_binder()
            .bind(&slots(Some(amount("5천만원")), Some(c), None))
            .unwrap();
        assert_eq!(result.decision(), CompareDecision::Determined);
    }

    #[test]
    fn reasons_are_facts_without_document_text() {
        let result = strict_binder()
            .bind(&slots(Some(amount("5천만원")), Some(condition(DOC)), Some(definition())))
            .unwrap();
        for reason in &result.explanation().reasons {
            assert!(!is_inferential(reason), "{reason}");
            assert!(!reason.contains(DOC));
            assert!(!reason.contains("악성신생물"));
        }
    }

    #[test]
    fn binding_is_idempotent_apart_from_ids() {
        let input = slots(Some(amount("5천만원")), Some(condition(DOC)), Some(definition()));

        // Fresh sequential generators give byte-identical results.
        assert_eq!(binder().bind(&input).unwrap(), binder().bind(&input).unwrap());

        // A shared random generator changes only the ids.
        let shared = EvidenceBinder::default();
        let a = shared.bind(&input).unwrap();
        let b = shared.bind(&input).unwrap();
        assert_eq!(a.decision(), b.decision());
        assert_eq!(a.explanation().applied_rules, b.explanation().applied_rules);
        assert_eq!(a.explanation().reasons, b.explanation().reasons);
        assert_eq!(a.amount_numeric(), b.amount_numeric());
        assert_ne!(a.explanation().used_evidence_ids, b.explanation().used_evidence_ids);
    }

    #[test]
    fn evidence_ids_unique_within_result() {
        let result = strict_binder()
            .bind(&slots(Some(amount("5천만원")), Some(condition(DOC)), Some(definition())))
            .unwrap();
        let ex = result.explanation();
        let mut all: Vec<_> = ex.used_evidence_ids.iter().chain(&ex.dropped_evidence_ids).collect();
        let total = all.len();
        all.sort_by_key(|id| id.as_str());
        all.dedup();
        assert_eq!(all.len(), total);
    }

    #[test]
    fn policy_names() {
        assert_eq!(binder().policy_name(), "keyword");
        assert_eq!(strict_binder().policy_name(), "strict");
    }
}
