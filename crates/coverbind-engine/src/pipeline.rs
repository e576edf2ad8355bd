//! Per-coverage comparison across insurers.
//!
//! Validates the request, resolves the canonical coverage name, then runs
//! retrieve → bind per insurer and maps the results into one multi-insurer
//! explain view. Insurers are compared independently and never ranked.

use std::sync::Arc;

use coverbind_core::{
    BindingResult, CompareDecision, Insurer, MultiInsurerExplainView, RetrievalDebug,
    RetrievalOutcome,
};
use coverbind_store::CoverageRegistry;
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::info;

use crate::{CompareError, EvidenceBinder, EvidenceRetriever, ExplainViewMapper};

/// A validated comparison request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompareRequest {
    coverage_code: String,
    insurers: Vec<Insurer>,
}

impl CompareRequest {
    /// Rejects an empty coverage code or insurer list. Duplicate insurers are
    /// removed, keeping the first occurrence.
    pub fn new(
        coverage_code: impl Into<String>,
        insurers: impl IntoIterator<Item = Insurer>,
    ) -> Result<Self, CompareError> {
        let coverage_code = coverage_code.into().trim().to_string();
        if coverage_code.is_empty() {
            return Err(CompareError::EmptyCoverageCode);
        }

        let mut unique = Vec::new();
        for insurer in insurers {
            if !unique.contains(&insurer) {
                unique.push(insurer);
            }
        }
        if unique.is_empty() {
            return Err(CompareError::NoInsurers);
        }

        Ok(Self {
            coverage_code,
            insurers: unique,
        })
    }

    pub fn coverage_code(&self) -> &str {
        &self.coverage_code
    }

    pub fn insurers(&self) -> &[Insurer] {
        &self.insurers
    }
}

/// Everything produced for one insurer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsurerOutcome {
    pub insurer: Insurer,
    pub retrieval: RetrievalOutcome,
    pub debug: RetrievalDebug,
    pub binding: BindingResult,
}

/// Decision counts across insurers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DecisionSummary {
    pub determined: usize,
    pub no_amount: usize,
    pub condition_mismatch: usize,
    pub definition_only: usize,
    pub insufficient_evidence: usize,
}

impl DecisionSummary {
    pub fn record(&mut self, decision: CompareDecision) {
        *self.slot(decision) += 1;
    }

    pub fn count(&self, decision: CompareDecision) -> usize {
        match decision {
            CompareDecision::Determined => self.determined,
            CompareDecision::NoAmount => self.no_amount,
            CompareDecision::ConditionMismatch => self.condition_mismatch,
            CompareDecision::DefinitionOnly => self.definition_only,
            CompareDecision::InsufficientEvidence => self.insufficient_evidence,
        }
    }

    /// Insurers whose decision is anything other than `determined`.
    pub fn partial_failures(&self) -> usize {
        CompareDecision::ALL
            .into_iter()
            .filter(CompareDecision::is_partial_failure)
            .map(|d| self.count(d))
            .sum()
    }

    pub fn total(&self) -> usize {
        CompareDecision::ALL.into_iter().map(|d| self.count(d)).sum()
    }

    fn slot(&mut self, decision: CompareDecision) -> &mut usize {
        match decision {
            CompareDecision::Determined => &mut self.determined,
            CompareDecision::NoAmount => &mut self.no_amount,
            CompareDecision::ConditionMismatch => &mut self.condition_mismatch,
            CompareDecision::DefinitionOnly => &mut self.definition_only,
            CompareDecision::InsufficientEvidence => &mut self.insufficient_evidence,
        }
    }
}

impl FromIterator<CompareDecision> for DecisionSummary {
    fn from_iter<T: IntoIterator<Item = CompareDecision>>(iter: T) -> Self {
        let mut summary = Self::default();
        for decision in iter {
            summary.record(decision);
        }
        summary
    }
}

/// Result of one comparison request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompareOutcome {
    pub coverage_code: String,
    pub coverage_name: String,
    pub insurers: Vec<InsurerOutcome>,
    pub view: MultiInsurerExplainView,
    pub summary: DecisionSummary,
}

/// Retriever → binder → mapper over a coverage registry.
#[derive(Clone)]
pub struct ComparePipeline {
    registry: Arc<dyn CoverageRegistry>,
    retriever: Arc<EvidenceRetriever>,
    binder: EvidenceBinder,
    mapper: ExplainViewMapper,
}

impl ComparePipeline {
    pub fn new(
        registry: Arc<dyn CoverageRegistry>,
        retriever: Arc<EvidenceRetriever>,
        binder: EvidenceBinder,
    ) -> Self {
        Self {
            registry,
            retriever,
            binder,
            mapper: ExplainViewMapper::new(),
        }
    }

    pub fn retriever(&self) -> &EvidenceRetriever {
        &self.retriever
    }

    /// Compare insurers one after another.
    pub fn compare(&self, request: &CompareRequest) -> Result<CompareOutcome, CompareError> {
        let coverage_name = self.resolve_name(request.coverage_code())?;

        let insurers = request
            .insurers()
            .iter()
            .map(|&insurer| {
                run_insurer(&self.retriever, &self.binder, request.coverage_code(), insurer)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(self.assemble(request, coverage_name, insurers))
    }

    /// Compare insurers in parallel, one blocking task each. Results come
    /// back in request order.
    pub async fn compare_concurrent(
        &self,
        request: &CompareRequest,
    ) -> Result<CompareOutcome, CompareError> {
        let coverage_name = self.resolve_name(request.coverage_code())?;

        let mut tasks = JoinSet::new();
        for (index, &insurer) in request.insurers().iter().enumerate() {
            let retriever = Arc::clone(&self.retriever);
            let binder = self.binder.clone();
            let code = request.coverage_code().to_string();
            tasks.spawn_blocking(move || (index, run_insurer(&retriever, &binder, &code, insurer)));
        }

        let mut slots: Vec<Option<InsurerOutcome>> =
            (0..request.insurers().len()).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            let (index, outcome) = joined?;
            slots[index] = Some(outcome?);
        }

        let insurers = slots.into_iter().flatten().collect();
        Ok(self.assemble(request, coverage_name, insurers))
    }

    fn resolve_name(&self, coverage_code: &str) -> Result<String, CompareError> {
        self.registry
            .get_name(coverage_code)
            .ok_or_else(|| CompareError::CoverageNotFound(coverage_code.to_string()))
    }

    fn assemble(
        &self,
        request: &CompareRequest,
        coverage_name: String,
        insurers: Vec<InsurerOutcome>,
    ) -> CompareOutcome {
        let pairs: Vec<(Insurer, BindingResult)> = insurers
            .iter()
            .map(|o| (o.insurer, o.binding.clone()))
            .collect();
        let view = self
            .mapper
            .map_multi_insurer(request.coverage_code(), &coverage_name, &pairs);
        let summary: DecisionSummary = insurers.iter().map(|o| o.binding.decision()).collect();

        info!(
            coverage_code = request.coverage_code(),
            insurers = summary.total(),
            determined = summary.determined,
            partial_failures = summary.partial_failures(),
            "comparison complete"
        );

        CompareOutcome {
            coverage_code: request.coverage_code().to_string(),
            coverage_name,
            insurers,
            view,
            summary,
        }
    }
}

fn run_insurer(
    retriever: &EvidenceRetriever,
    binder: &EvidenceBinder,
    coverage_code: &str,
    insurer: Insurer,
) -> Result<InsurerOutcome, CompareError> {
    let (retrieval, debug) = retriever.retrieve(coverage_code, insurer)?;
    let binding = binder.bind(&retrieval)?;
    info!(coverage_code, %insurer, decision = %binding.decision(), "insurer decided");
    Ok(InsurerOutcome {
        insurer,
        retrieval,
        debug,
        binding,
    })
}
