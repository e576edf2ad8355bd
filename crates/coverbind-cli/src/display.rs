//! Terminal card display for comparison results.
//!
//! Each insurer renders as a card grouped into Decision, Reason, Evidence,
//! and Rule Trace sections. Rendering builds a `String` so the layout can be
//! checked in tests; the `print_*` wrappers write it to stdout.

use std::fmt::Write;

use coverbind_core::explain::{ExplainViewResponse, InsurerExplainView, ReasonCard};
use coverbind_core::{Insurer, RetrievalDebug, RetrievalOutcome};
use coverbind_engine::{CompareOutcome, DecisionSummary};
use coverbind_store::MemoryCoverageRegistry;

const MAX_EXCERPT_CHARS: usize = 60;

// ── Public API ──

pub fn print_comparison(outcome: &CompareOutcome) {
    print!("{}", render_comparison(outcome));
}

pub fn print_retrieval(
    coverage_code: &str,
    insurer: Insurer,
    outcome: &RetrievalOutcome,
    debug: &RetrievalDebug,
) {
    print!("{}", render_retrieval(coverage_code, insurer, outcome, debug));
}

pub fn print_coverages(registry: &MemoryCoverageRegistry) {
    if registry.is_empty() {
        println!("No coverages in corpus.");
        return;
    }
    for (code, name) in registry.entries() {
        println!("  {:<18} {}", code, name);
    }
}

// ── Comparison cards ──

pub fn render_comparison(outcome: &CompareOutcome) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== {} {} ===", outcome.coverage_code, outcome.coverage_name);
    let _ = writeln!(out);

    for view in &outcome.view.insurer_views {
        render_insurer(&mut out, view);
    }
    render_summary(&mut out, &outcome.summary);
    out
}

fn render_insurer(out: &mut String, view: &InsurerExplainView) {
    let ev = &view.explain_view;
    let _ = writeln!(out, "── {} ──", view.insurer);

    let _ = writeln!(out, "Decision");
    let _ = writeln!(out, "  {:<18} {}", "decision", ev.decision);
    let _ = writeln!(out, "  {:<18} {}", "headline", ev.headline);
    let _ = writeln!(out);

    let _ = writeln!(out, "Reason");
    for card in &ev.reason_cards {
        render_card(out, card);
    }
    let _ = writeln!(out);

    if !ev.evidence_tabs.is_empty() {
        let _ = writeln!(out, "Evidence");
        render_tabs(out, ev);
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "Rule Trace");
    let rules: Vec<&str> = ev.rule_trace.applied_rules.iter().map(|r| r.as_str()).collect();
    let _ = writeln!(out, "  {:<18} {}", "applied", rules.join(", "));
    if !ev.rule_trace.dropped_evidence.is_empty() {
        let ids: Vec<&str> = ev
            .rule_trace
            .dropped_evidence
            .iter()
            .map(|d| d.id.as_str())
            .collect();
        let _ = writeln!(out, "  {:<18} {}", "dropped", ids.join(", "));
    }
    let _ = writeln!(out);
}

fn render_card(out: &mut String, card: &ReasonCard) {
    let _ = writeln!(out, "  [{}] {}", card.card_type.as_str(), card.title);
    let _ = writeln!(out, "  {:<18} {}", "message", card.message);
    for r in &card.references {
        let _ = writeln!(
            out,
            "  {:<18} {} {} {}",
            "source",
            r.doc_type,
            r.doc_id.as_deref().unwrap_or("-"),
            r.page.map_or_else(|| "-".to_string(), |p| format!("p.{p}"))
        );
    }
}

fn render_tabs(out: &mut String, ev: &ExplainViewResponse) {
    let tabs = &ev.evidence_tabs;
    for a in &tabs.amount {
        let _ = writeln!(out, "  {:<18} {} ({} p.{})", "amount", a.value, a.source_doc, a.page);
        let _ = writeln!(out, "  {:<18} {}", "", truncate(&a.excerpt));
    }
    for c in &tabs.condition {
        let flag = if c.has_conflict { " [conflict]" } else { "" };
        let _ = writeln!(out, "  {:<18} {}{}{}", "condition", c.source_doc, page(c.page), flag);
        let _ = writeln!(out, "  {:<18} {}", "", truncate(&c.excerpt));
    }
    for d in &tabs.definition {
        let _ = writeln!(out, "  {:<18} {}{}", "definition", d.source_doc, page(d.page));
        let _ = writeln!(out, "  {:<18} {}", "", truncate(&d.excerpt));
    }
}

fn render_summary(out: &mut String, summary: &DecisionSummary) {
    let _ = writeln!(out, "Summary");
    let _ = writeln!(out, "  {:<18} {}", "insurers", summary.total());
    let _ = writeln!(out, "  {:<18} {}", "determined", summary.determined);
    let _ = writeln!(out, "  {:<18} {}", "partial failures", summary.partial_failures());
}

// ── Retrieval debug ──

pub fn render_retrieval(
    coverage_code: &str,
    insurer: Insurer,
    outcome: &RetrievalOutcome,
    debug: &RetrievalDebug,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== {coverage_code} / {insurer} ===");
    let _ = writeln!(out);

    let _ = writeln!(out, "Slots");
    match outcome {
        RetrievalOutcome::NoAmount(r) => {
            let _ = writeln!(out, "  {:<18} {}", "no amount", r.reason);
        }
        RetrievalOutcome::Slots(slots) => {
            for slot in [slots.amount(), slots.condition(), slots.definition()]
                .into_iter()
                .flatten()
            {
                let _ = writeln!(
                    out,
                    "  {:<18} {}{} {}",
                    slot.purpose().as_str(),
                    slot.source_doc(),
                    page(slot.page()),
                    slot.doc_id().unwrap_or("-")
                );
                let _ = writeln!(out, "  {:<18} {}", "", truncate(slot.excerpt()));
            }
        }
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "Debug");
    let _ = writeln!(out, "  {:<18} {}", "pass 1 candidates", debug.pass_1_count());
    let _ = writeln!(out, "  {:<18} {}", "pass 2 hits", debug.pass_2_count());
    let dropped = debug.dropped_evidence();
    if !dropped.is_empty() {
        let _ = writeln!(out, "  dropped ({}):", dropped.len());
        for d in dropped {
            let _ = writeln!(
                out,
                "    {:<16} {} {}",
                d.reason.as_str(),
                d.doc_id.as_deref().unwrap_or("-"),
                d.excerpt.as_deref().map(truncate).unwrap_or_default()
            );
        }
    }
    out
}

// ── Helpers ──

fn page(page: Option<u32>) -> String {
    page.map(|p| format!(" p.{p}")).unwrap_or_default()
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_EXCERPT_CHARS {
        return text.to_string();
    }
    let head: String = text.chars().take(MAX_EXCERPT_CHARS).collect();
    format!("{head}…")
}

#[cfg(test)]
mod tests {
    use super::*;
    use coverbind_core::{DocType, SequentialIdGenerator};
    use coverbind_engine::{
        ComparePipeline, CompareRequest, EvidenceBinder, EvidenceRetriever,
        StrictKeywordConflictPolicy,
    };
    use coverbind_store::{Corpus, DocumentStore};
    use std::sync::Arc;

    const CORPUS: &str = r#"{
        "coverages": [{ "code": "A4200_1", "name": "암진단비" }],
        "documents": [
            { "insurer": "SAMSUNG", "coverage_code": "A4200_1", "doc_type": "약관",
              "doc_id": "SAMSUNG_CANCER_2024", "page": 45, "text": "암 진단 확정시 5천만원 지급" },
            { "insurer": "SAMSUNG", "coverage_code": "A4200_1", "doc_type": "약관",
              "doc_id": "SAMSUNG_CANCER_2024", "page": 46,
              "text": "계약일로부터 90일 이내 진단 시 보장하지 않음" },
            { "insurer": "KB", "coverage_code": "A4200_1", "doc_type": "약관",
              "doc_id": "KB_CANCER_2024", "page": 3, "text": "자세한 내용은 약관 참조" }
        ]
    }"#;

    fn outcome() -> CompareOutcome {
        let corpus = Corpus::from_json_str(CORPUS).unwrap();
        let pipeline = ComparePipeline::new(
            Arc::new(corpus.registry),
            Arc::new(EvidenceRetriever::new(Arc::new(corpus.documents))),
            EvidenceBinder::new(
                Arc::new(SequentialIdGenerator::new()),
                Arc::new(StrictKeywordConflictPolicy),
            ),
        );
        pipeline
            .compare(&CompareRequest::new("A4200_1", [Insurer::Samsung, Insurer::Kb]).unwrap())
            .unwrap()
    }

    #[test]
    fn comparison_card_sections() {
        let text = render_comparison(&outcome());

        assert!(text.starts_with("=== A4200_1 암진단비 ==="));
        assert!(text.contains("── SAMSUNG ──"));
        assert!(text.contains("[WARNING] 조건 충돌"));
        assert!(text.contains("condition_conflict"));
        assert!(text.contains("EVID-00000002"));
        assert!(text.contains("── KB ──"));
        assert!(text.contains("[ERROR] 금액 근거 부족"));
        assert!(text.contains("partial failures"));
    }

    #[test]
    fn retrieval_debug_lists_drops() {
        let corpus = Corpus::from_json_str(CORPUS).unwrap();
        let docs = corpus
            .documents
            .get_documents_by_coverage_code("A4200_1", Insurer::Kb);
        assert_eq!(docs[0].doc_type, DocType::Yakgwan);

        let retriever = EvidenceRetriever::new(Arc::new(corpus.documents));
        let (outcome, debug) = retriever.retrieve("A4200_1", Insurer::Kb).unwrap();
        let text = render_retrieval("A4200_1", Insurer::Kb, &outcome, &debug);

        assert!(text.contains("no_amount_bearing_evidence"));
        assert!(text.contains("reference_only"));
        assert!(text.contains("KB_CANCER_2024"));
    }

    #[test]
    fn truncates_by_characters() {
        let long = "가".repeat(MAX_EXCERPT_CHARS + 5);
        let t = truncate(&long);
        assert_eq!(t.chars().count(), MAX_EXCERPT_CHARS + 1);
        assert!(t.ends_with('…'));
        assert_eq!(truncate("짧은 글"), "짧은 글");
    }
}
