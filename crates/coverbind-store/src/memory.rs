//! In-memory collaborators.

use std::collections::{BTreeMap, HashMap};

use coverbind_core::Insurer;

use crate::{CoverageRegistry, DocumentStore, RawEvidence};

/// Excerpts keyed by (coverage code, insurer), kept in insertion order.
#[derive(Debug, Default, Clone)]
pub struct MemoryDocumentStore {
    docs: HashMap<(String, Insurer), Vec<RawEvidence>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an excerpt under its own coverage code.
    pub fn insert(&mut self, insurer: Insurer, raw: RawEvidence) {
        self.docs
            .entry((raw.coverage_code.clone(), insurer))
            .or_default()
            .push(raw);
    }

    /// Total number of stored excerpts.
    pub fn len(&self) -> usize {
        self.docs.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Insurers with at least one excerpt for `coverage_code`, sorted.
    pub fn insurers_for(&self, coverage_code: &str) -> Vec<Insurer> {
        let mut insurers: Vec<Insurer> = self
            .docs
            .keys()
            .filter(|(code, _)| code == coverage_code)
            .map(|(_, insurer)| *insurer)
            .collect();
        insurers.sort();
        insurers
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn get_documents_by_coverage_code(
        &self,
        coverage_code: &str,
        insurer: Insurer,
    ) -> Vec<RawEvidence> {
        self.docs
            .get(&(coverage_code.to_string(), insurer))
            .cloned()
            .unwrap_or_default()
    }
}

/// Coverage code → official name.
#[derive(Debug, Default, Clone)]
pub struct MemoryCoverageRegistry {
    names: BTreeMap<String, String>,
}

impl MemoryCoverageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, code: impl Into<String>, name: impl Into<String>) {
        self.names.insert(code.into(), name.into());
    }

    /// `(code, name)` pairs ordered by code.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl CoverageRegistry for MemoryCoverageRegistry {
    fn get_name(&self, coverage_code: &str) -> Option<String> {
        self.names.get(coverage_code).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coverbind_core::DocType;

    fn raw(code: &str, page: u32, text: &str) -> RawEvidence {
        RawEvidence {
            doc_type: DocType::Yakgwan,
            doc_id: "SAMSUNG_CANCER_2024".into(),
            page: Some(page),
            text: text.into(),
            coverage_code: code.into(),
        }
    }

    #[test]
    fn lookup_is_scoped_to_code_and_insurer() {
        let mut store = MemoryDocumentStore::new();
        store.insert(Insurer::Samsung, raw("A4200_1", 45, "암 진단 확정시 5천만원 지급"));
        store.insert(Insurer::Samsung, raw("A4210", 12, "유사암 진단시 1천만원 지급"));
        store.insert(Insurer::Kb, raw("A4200_1", 30, "암 진단시 3천만원 지급"));

        let docs = store.get_documents_by_coverage_code("A4200_1", Insurer::Samsung);
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].page, Some(45));
        assert!(store.get_documents_by_coverage_code("A4200_1", Insurer::Meritz).is_empty());
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn lookup_preserves_insertion_order() {
        let mut store = MemoryDocumentStore::new();
        for page in [9, 3, 7] {
            store.insert(Insurer::Lotte, raw("A4200_1", page, "암 진단시 2천만원 지급"));
        }
        let pages: Vec<_> = store
            .get_documents_by_coverage_code("A4200_1", Insurer::Lotte)
            .into_iter()
            .map(|r| r.page)
            .collect();
        assert_eq!(pages, vec![Some(9), Some(3), Some(7)]);
    }

    #[test]
    fn insurers_for_code_sorted() {
        let mut store = MemoryDocumentStore::new();
        store.insert(Insurer::Kb, raw("A4200_1", 1, "암 진단시 3천만원 지급"));
        store.insert(Insurer::Samsung, raw("A4200_1", 1, "암 진단시 5천만원 지급"));
        assert_eq!(store.insurers_for("A4200_1"), vec![Insurer::Samsung, Insurer::Kb]);
    }

    #[test]
    fn registry_lookup() {
        let mut reg = MemoryCoverageRegistry::new();
        reg.insert("A4200_1", "암진단비");
        assert!(reg.exists("A4200_1"));
        assert!(!reg.exists("Z9999"));
        assert_eq!(reg.get_name("A4200_1").as_deref(), Some("암진단비"));
    }
}
