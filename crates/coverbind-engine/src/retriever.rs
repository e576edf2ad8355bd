//! Two-pass evidence retrieval.
//!
//! Pass 1 (amount-centric) keeps only excerpts that state an amount, limit,
//! or payout rate and picks one by document priority and page. Pass 2
//! (context completion) attaches the first condition and the first
//! definition excerpt found among the remaining survivors. Pass 2 evidence
//! never stands alone.
//!
//! Nothing is silently discarded: every rejected excerpt lands in the
//! [`RetrievalDebug`] trail with its reason.

use std::sync::{Arc, LazyLock};

use coverbind_core::{
    DropReason, EvidenceSlot, EvidenceSlots, Insurer, ModelError, NoAmountFoundResult,
    NoAmountReason, RetrievalDebug, RetrievalDebugBuilder, RetrievalOutcome, RetrievalPass,
};
use coverbind_store::{DocumentStore, RawEvidence};
use regex::Regex;
use tracing::{debug, info};

use crate::{CompareError, RetrieverConfig};

/// Amount patterns, tried in order. The first match anchors the excerpt window.
const AMOUNT_PATTERNS: &[&str] = &[
    r"\d+만원",
    r"\d+천만원",
    r"\d+억",
    r"\d+원",
    r"\d+%",
    r"지급액",
    r"보험금",
    r"한도",
];

/// Exceptions, exclusions, reductions, payout-rate language.
const CONDITION_KEYWORDS: &[&str] = &[
    "면책", "제외", "예외", "불보장", "감액", "지급률", "조건", "이내", "이상",
];

/// Defines / means / scope language.
const DEFINITION_KEYWORDS: &[&str] = &["정의", "범위", "의미", "말합니다", "라 함은", "이란"];

/// Text with neither a digit nor a Hangul syllable carries no content.
static CONTENT_FREE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^0-9가-힣]*$").expect("static content pattern"));

/// Boilerplate that only points elsewhere ("see policy terms").
static REFERENCE_ONLY: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"약관\s*참조", r"에\s*따른다$"]
        .into_iter()
        .map(|p| Regex::new(p).expect("static reference pattern"))
        .collect()
});

static AMOUNT_REGEXES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    AMOUNT_PATTERNS
        .iter()
        .map(|p| Regex::new(p).expect("static amount pattern"))
        .collect()
});

/// Page assumed for excerpts without a page number when ranking.
const MISSING_PAGE_RANK: u32 = 999;

/// Ranking key for amount candidates. Lower sorts first.
///
/// Ordered by document priority (약관 before 사업방법서), then page, then the
/// position the document store returned the excerpt in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct EvidenceScore {
    pub doc_priority: u8,
    pub page: u32,
    pub position: usize,
}

impl EvidenceScore {
    pub fn of(slot: &EvidenceSlot, position: usize) -> Self {
        Self {
            doc_priority: slot.source_doc().priority(),
            page: slot.page().unwrap_or(MISSING_PAGE_RANK),
            position,
        }
    }
}

/// Two-pass retriever over a [`DocumentStore`].
pub struct EvidenceRetriever {
    store: Arc<dyn DocumentStore>,
    config: RetrieverConfig,
}

impl EvidenceRetriever {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_config(store, RetrieverConfig::default())
    }

    pub fn with_config(store: Arc<dyn DocumentStore>, config: RetrieverConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &RetrieverConfig {
        &self.config
    }

    /// Retrieve evidence for one (coverage code, insurer) pair.
    ///
    /// Returns either a slot bundle with an amount slot, or a
    /// [`NoAmountFoundResult`]; the debug trail comes back in both cases.
    pub fn retrieve(
        &self,
        coverage_code: &str,
        insurer: Insurer,
    ) -> Result<(RetrievalOutcome, RetrievalDebug), CompareError> {
        if coverage_code.trim().is_empty() {
            return Err(CompareError::EmptyCoverageCode);
        }

        let raws = self.store.get_documents_by_coverage_code(coverage_code, insurer);
        let (outcome, trail) = self.classify(&raws)?;

        info!(
            coverage_code,
            %insurer,
            documents = raws.len(),
            pass_1 = trail.pass_1_count(),
            pass_2 = trail.pass_2_count(),
            dropped = trail.dropped_evidence().len(),
            has_amount = matches!(outcome, RetrievalOutcome::Slots(_)),
            "retrieval complete"
        );
        Ok((outcome, trail))
    }

    /// Run both passes over excerpts already scoped to one coverage code.
    pub fn classify(
        &self,
        raws: &[RawEvidence],
    ) -> Result<(RetrievalOutcome, RetrievalDebug), ModelError> {
        let mut debug = RetrievalDebugBuilder::new(self.config.dropped_excerpt_chars);

        if raws.is_empty() {
            let outcome = NoAmountFoundResult::new(NoAmountReason::NoDocumentsFound).into();
            return Ok((outcome, debug.finish()));
        }

        // ── Pass 1: amount-centric ──

        let mut survivors = Vec::with_capacity(raws.len());
        let mut candidates: Vec<(usize, EvidenceSlot)> = Vec::new();

        for (position, raw) in raws.iter().enumerate() {
            if let Some(reason) = self.drop_reason(&raw.text) {
                debug!(doc_id = %raw.doc_id, page = ?raw.page, reason = reason.as_str(), "excerpt dropped");
                debug.record_drop(reason, &raw.text, Some(&raw.doc_id));
                continue;
            }
            survivors.push(position);

            match self.extract_amount(&raw.text) {
                Some(window) => {
                    let slot = with_source(
                        EvidenceSlot::amount(raw.doc_type, window.clone(), window)?,
                        raw,
                    )
                    .with_pass(RetrievalPass::Pass1);
                    candidates.push((position, slot));
                }
                None => {
                    debug!(doc_id = %raw.doc_id, page = ?raw.page, "no amount pattern");
                    debug.record_drop(DropReason::NoAmount, &raw.text, Some(&raw.doc_id));
                }
            }
        }

        debug.set_pass_1_count(candidates.len());

        let Some((selected, amount)) = candidates
            .into_iter()
            .min_by_key(|(position, slot)| EvidenceScore::of(slot, *position))
        else {
            let outcome = NoAmountFoundResult::new(NoAmountReason::NoAmountBearingEvidence).into();
            return Ok((outcome, debug.finish()));
        };

        // ── Pass 2: context completion ──

        let mut condition = None;
        let mut definition = None;

        for &position in survivors.iter().filter(|&&p| p != selected) {
            let raw = &raws[position];
            let text = raw.text.trim();

            if condition.is_none() && contains_any(text, CONDITION_KEYWORDS) {
                condition = Some(
                    with_source(EvidenceSlot::condition(raw.doc_type, text)?, raw)
                        .with_pass(RetrievalPass::Pass2),
                );
                debug.record_pass_2_hit();
            }

            if definition.is_none() && contains_any(text, DEFINITION_KEYWORDS) {
                definition = Some(
                    with_source(EvidenceSlot::definition(raw.doc_type, text)?, raw)
                        .with_pass(RetrievalPass::Pass2),
                );
                debug.record_pass_2_hit();
            }

            if condition.is_some() && definition.is_some() {
                break;
            }
        }

        let slots = EvidenceSlots::new(Some(amount), condition, definition)?;
        Ok((slots.into(), debug.finish()))
    }

    /// Drop rules, applied before any amount matching.
    fn drop_reason(&self, text: &str) -> Option<DropReason> {
        let trimmed = text.trim();
        if trimmed.chars().count() < self.config.min_excerpt_chars {
            return Some(DropReason::NoContent);
        }
        if CONTENT_FREE.is_match(trimmed) {
            return Some(DropReason::NoContent);
        }
        if REFERENCE_ONLY.iter().any(|re| re.is_match(trimmed)) {
            return Some(DropReason::ReferenceOnly);
        }
        None
    }

    /// Window of `context_chars` characters around the first amount pattern that matches.
    fn extract_amount(&self, text: &str) -> Option<String> {
        AMOUNT_REGEXES.iter().find_map(|re| {
            re.find(text)
                .map(|m| context_window(text, m.start(), m.end(), self.config.context_chars))
        })
    }
}

fn with_source(slot: EvidenceSlot, raw: &RawEvidence) -> EvidenceSlot {
    let slot = slot.with_doc_id(raw.doc_id.clone());
    match raw.page {
        Some(page) => slot.with_page(page),
        None => slot,
    }
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| text.contains(kw))
}

/// Slice `radius` characters either side of the byte range `start..end`, trimmed.
///
/// Works on character boundaries so multi-byte Hangul is never split.
fn context_window(text: &str, start: usize, end: usize, radius: usize) -> String {
    let from = if radius == 0 {
        start
    } else {
        text[..start]
            .char_indices()
            .rev()
            .take(radius)
            .last()
            .map_or(start, |(i, _)| i)
    };
    let to = text[end..]
        .char_indices()
        .nth(radius)
        .map_or(text.len(), |(i, _)| end + i);
    text[from..to].trim().to_string()
}
