//! Binding result → explain view.
//!
//! A pure projection. No decision is re-evaluated here and nothing is added
//! that the binder did not record.

use coverbind_core::explain::{
    AmountEvidenceItem, CardType, ConditionEvidenceItem, DefinitionEvidenceItem,
    DroppedEvidenceInfo, EvidenceReference, EvidenceTabs, InsurerExplainView, ReasonCard,
    RuleTrace,
};
use coverbind_core::{
    BindingResult, CompareDecision, EvidencePurpose, ExplainViewResponse, Insurer,
    MultiInsurerExplainView, UNKNOWN_DOC_ID,
};

/// Fixed presentation for one decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Presentation {
    card_type: CardType,
    title: &'static str,
    message: &'static str,
    headline: &'static str,
}

fn presentation(decision: CompareDecision) -> Presentation {
    match decision {
        CompareDecision::Determined => Presentation {
            card_type: CardType::Info,
            title: "결과 확정",
            message: "약관 근거에서 금액이 확인되었습니다",
            headline: "비교 결과 확정",
        },
        CompareDecision::NoAmount => Presentation {
            card_type: CardType::Error,
            title: "금액 근거 부족",
            message: "약관 및 사업방법서에서 지급 금액이 명시된 근거를 찾지 못했습니다",
            headline: "금액 근거 없음",
        },
        CompareDecision::ConditionMismatch => Presentation {
            card_type: CardType::Warning,
            title: "조건 충돌",
            message: "금액은 확인되었으나 적용 조건 간 충돌이 감지되었습니다",
            headline: "조건 충돌 감지",
        },
        CompareDecision::DefinitionOnly => Presentation {
            card_type: CardType::Info,
            title: "정의만 존재",
            message: "용어 정의는 확인되었으나 지급 금액 근거가 없습니다",
            headline: "정의만 존재",
        },
        CompareDecision::InsufficientEvidence => Presentation {
            card_type: CardType::Error,
            title: "판단 불가",
            message: "비교 판단에 필요한 근거가 충분하지 않습니다",
            headline: "판단 불가",
        },
    }
}

const DROPPED: &str = "dropped";

/// Maps [`BindingResult`]s to explain views.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExplainViewMapper;

impl ExplainViewMapper {
    pub fn new() -> Self {
        Self
    }

    pub fn map(&self, result: &BindingResult) -> ExplainViewResponse {
        let decision = result.decision();
        let p = presentation(decision);

        ExplainViewResponse {
            decision,
            headline: p.headline,
            reason_cards: vec![reason_card(result, p)],
            evidence_tabs: evidence_tabs(result),
            rule_trace: rule_trace(result),
        }
    }

    /// One view per insurer, in the order given.
    pub fn map_multi_insurer(
        &self,
        coverage_code: &str,
        coverage_name: &str,
        results: &[(Insurer, BindingResult)],
    ) -> MultiInsurerExplainView {
        MultiInsurerExplainView {
            canonical_coverage_code: coverage_code.to_string(),
            canonical_coverage_name: coverage_name.to_string(),
            insurer_views: results
                .iter()
                .map(|(insurer, result)| InsurerExplainView {
                    insurer: *insurer,
                    explain_view: self.map(result),
                })
                .collect(),
        }
    }
}

fn reason_card(result: &BindingResult, p: Presentation) -> ReasonCard {
    ReasonCard {
        card_type: p.card_type,
        title: p.title,
        message: p.message,
        decision: result.decision(),
        references: result
            .bound_evidence()
            .iter()
            .map(|b| EvidenceReference {
                doc_type: b.doc_type,
                doc_id: (b.doc_id != UNKNOWN_DOC_ID).then(|| b.doc_id.clone()),
                page: b.page,
            })
            .collect(),
    }
}

fn evidence_tabs(result: &BindingResult) -> EvidenceTabs {
    let has_conflict = result.decision() == CompareDecision::ConditionMismatch;
    let mut tabs = EvidenceTabs::default();

    for b in result.bound_evidence() {
        let doc_id = (b.doc_id != UNKNOWN_DOC_ID).then(|| b.doc_id.clone());
        let excerpt = b.excerpt.clone().unwrap_or_default();
        match b.slot_type {
            EvidencePurpose::Amount => tabs.amount.push(AmountEvidenceItem {
                value: result.amount_value().unwrap_or_default().to_string(),
                source_doc: b.doc_type,
                page: b.page.unwrap_or(0),
                excerpt,
                doc_id,
            }),
            EvidencePurpose::Condition => tabs.condition.push(ConditionEvidenceItem {
                source_doc: b.doc_type,
                excerpt,
                page: b.page,
                doc_id,
                has_conflict,
            }),
            EvidencePurpose::Definition => tabs.definition.push(DefinitionEvidenceItem {
                source_doc: b.doc_type,
                excerpt,
                page: b.page,
                doc_id,
            }),
        }
    }
    tabs
}

fn rule_trace(result: &BindingResult) -> RuleTrace {
    let ex = result.explanation();
    RuleTrace {
        applied_rules: ex.applied_rules.clone(),
        dropped_evidence: ex
            .dropped_evidence_ids
            .iter()
            .map(|id| DroppedEvidenceInfo {
                id: id.clone(),
                reason: DROPPED,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::{EvidenceBinder, KeywordConflictPolicy, StrictKeywordConflictPolicy};
    use coverbind_core::{
        DocType, EvidenceSlot, EvidenceSlots, NoAmountFoundResult, NoAmountReason,
        RetrievalOutcome, SequentialIdGenerator,
    };
    use std::sync::Arc;

    fn bind(outcome: RetrievalOutcome, strict: bool) -> BindingResult {
        let binder = if strict {
            EvidenceBinder::new(
                Arc::new(SequentialIdGenerator::new()),
                Arc::new(StrictKeywordConflictPolicy),
            )
        } else {
            EvidenceBinder::new(
                Arc::new(SequentialIdGenerator::new()),
                Arc::new(KeywordConflictPolicy),
            )
        };
        binder.bind(&outcome).unwrap()
    }

    fn amount() -> EvidenceSlot {
        EvidenceSlot::amount(DocType::Yakgwan, "암 진단 확정시 5천만원 지급", "5천만원")
            .unwrap()
            .with_page(45)
            .with_doc_id("SAMSUNG_CANCER_2024")
    }

    fn condition() -> EvidenceSlot {
        EvidenceSlot::condition(DocType::Yakgwan, "계약일로부터 90일 이내 진단 시 보장하지 않음")
            .unwrap()
            .with_page(46)
            .with_doc_id("SAMSUNG_CANCER_2024")
    }

    fn definition() -> EvidenceSlot {
        EvidenceSlot::definition(DocType::Saeop, "암이라 함은 악성신생물을 말합니다").unwrap()
    }

    fn slots(a: Option<EvidenceSlot>, c: Option<EvidenceSlot>, d: Option<EvidenceSlot>) -> RetrievalOutcome {
        EvidenceSlots::new(a, c, d).unwrap().into()
    }

    fn all_decision_results() -> Vec<BindingResult> {
        vec![
            bind(slots(Some(amount()), None, None), false),
            bind(NoAmountFoundResult::new(NoAmountReason::NoAmountBearingEvidence).into(), false),
            bind(slots(Some(amount()), Some(condition()), None), true),
            bind(slots(None, None, Some(definition())), false),
            bind(slots(None, None, None), false),
        ]
    }

    #[test]
    fn one_card_per_decision_with_fixed_severity() {
        let mapper = ExplainViewMapper::new();
        let results = all_decision_results();
        let decisions: Vec<_> = results.iter().map(BindingResult::decision).collect();
        assert_eq!(decisions, CompareDecision::ALL.to_vec());

        for result in &results {
            let view = mapper.map(result);
            assert_eq!(view.reason_cards.len(), 1);
            let card = &view.reason_cards[0];
            assert_eq!(card.decision, result.decision());

            let expected = match result.decision() {
                CompareDecision::Determined => (CardType::Info, "결과 확정", "비교 결과 확정"),
                CompareDecision::NoAmount => (CardType::Error, "금액 근거 부족", "금액 근거 없음"),
                CompareDecision::ConditionMismatch => {
                    (CardType::Warning, "조건 충돌", "조건 충돌 감지")
                }
                CompareDecision::DefinitionOnly => (CardType::Info, "정의만 존재", "정의만 존재"),
                CompareDecision::InsufficientEvidence => {
                    (CardType::Error, "판단 불가", "판단 불가")
                }
            };
            assert_eq!((card.card_type, card.title, view.headline), expected);
            assert!(!card.message.is_empty());
        }
    }

    #[test]
    fn tabs_partition_bound_evidence() {
        let mapper = ExplainViewMapper::new();
        for result in all_decision_results() {
            let view = mapper.map(&result);
            let tabs = &view.evidence_tabs;
            assert_eq!(tabs.len(), result.bound_evidence().len());

            let count = |p: EvidencePurpose| {
                result.bound_evidence().iter().filter(|b| b.slot_type == p).count()
            };
            assert_eq!(tabs.amount.len(), count(EvidencePurpose::Amount));
            assert_eq!(tabs.condition.len(), count(EvidencePurpose::Condition));
            assert_eq!(tabs.definition.len(), count(EvidencePurpose::Definition));
        }
    }

    #[test]
    fn determined_with_condition_shows_both_tabs() {
        let view = ExplainViewMapper::new()
            .map(&bind(slots(Some(amount()), Some(condition()), None), false));

        assert_eq!(view.decision, CompareDecision::Determined);
        assert!(view.evidence_tabs.has_amount());
        assert!(view.evidence_tabs.has_condition());
        assert!(!view.evidence_tabs.has_definition());
        assert!(!view.evidence_tabs.condition[0].has_conflict);

        let a = &view.evidence_tabs.amount[0];
        assert_eq!(a.value, "5천만원");
        assert_eq!(a.page, 45);
        assert_eq!(a.source_doc, DocType::Yakgwan);
        assert_eq!(view.reason_cards[0].references.len(), 2);
    }

    #[test]
    fn definition_only_shows_only_definition_tab() {
        let view = ExplainViewMapper::new().map(&bind(slots(None, None, Some(definition())), false));
        assert_eq!(view.reason_cards[0].card_type, CardType::Info);
        assert!(!view.evidence_tabs.has_amount());
        assert!(!view.evidence_tabs.has_condition());
        assert_eq!(view.evidence_tabs.definition.len(), 1);
        // Definition slot had no doc id or page.
        assert_eq!(view.reason_cards[0].references[0].doc_id, None);
        assert_eq!(view.evidence_tabs.definition[0].page, None);
    }

    #[test]
    fn determined_card_wording() {
        let view = ExplainViewMapper::new().map(&bind(slots(Some(amount()), None, None), false));
        assert_eq!(view.reason_cards[0].message, "약관 근거에서 금액이 확인되었습니다");
        assert_eq!(view.reason_cards[0].references[0].doc_id.as_deref(), Some("SAMSUNG_CANCER_2024"));
    }

    #[test]
    fn insufficient_evidence_has_empty_tabs() {
        let view = ExplainViewMapper::new().map(&bind(slots(None, None, None), false));
        assert!(view.evidence_tabs.is_empty());
        assert!(view.reason_cards[0].references.is_empty());

        let v = serde_json::to_value(&view).unwrap();
        assert_eq!(v["evidence_tabs"], serde_json::json!({}));
        assert!(v["reason_cards"][0].get("references").is_none());
        assert_eq!(v["reason_cards"][0]["type"], "ERROR");
        assert_eq!(v["rule_trace"]["applied_rules"][0], "no_evidence");
    }

    #[test]
    fn mismatch_trace_lists_dropped_ids() {
        let result = bind(slots(Some(amount()), Some(condition()), None), true);
        let view = ExplainViewMapper::new().map(&result);

        assert_eq!(view.rule_trace.applied_rules, result.explanation().applied_rules);
        assert_eq!(view.rule_trace.dropped_evidence.len(), 1);
        assert_eq!(view.rule_trace.dropped_evidence[0].reason, "dropped");
        assert_eq!(
            view.rule_trace.dropped_evidence[0].id,
            result.explanation().dropped_evidence_ids[0]
        );
        assert!(view.evidence_tabs.has_amount());
        assert!(!view.evidence_tabs.has_condition());
    }

    #[test]
    fn amount_page_defaults_to_zero() {
        let a = EvidenceSlot::amount(DocType::Saeop, "1억 지급", "1억").unwrap();
        let view = ExplainViewMapper::new().map(&bind(slots(Some(a), None, None), false));
        assert_eq!(view.evidence_tabs.amount[0].page, 0);
        assert_eq!(view.evidence_tabs.amount[0].source_doc, DocType::Saeop);
    }

    #[test]
    fn multi_insurer_keeps_input_order() {
        let results = vec![
            (Insurer::Meritz, bind(slots(None, None, None), false)),
            (Insurer::Samsung, bind(slots(Some(amount()), None, None), false)),
        ];
        let view = ExplainViewMapper::new().map_multi_insurer("A4200_1", "암진단비", &results);

        assert_eq!(view.canonical_coverage_code, "A4200_1");
        assert_eq!(view.canonical_coverage_name, "암진단비");
        let order: Vec<_> = view.insurer_views.iter().map(|v| v.insurer).collect();
        assert_eq!(order, vec![Insurer::Meritz, Insurer::Samsung]);
        assert_eq!(
            view.insurer_views[0].explain_view.decision,
            CompareDecision::InsufficientEvidence
        );
        assert_eq!(view.insurer_views[1].explain_view.decision, CompareDecision::Determined);
    }
}
