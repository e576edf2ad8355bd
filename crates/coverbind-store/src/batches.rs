//! Build a [`MemoryDocumentStore`] from Arrow RecordBatches.
//!
//! Expects columns `coverage_code`, `insurer`, `doc_type`, `doc_id`, `text`
//! (Utf8 or LargeUtf8) and an optional nullable integer `page`. Row order is
//! preserved per (coverage code, insurer).

use std::fs::File;
use std::path::Path;

use arrow::array::{Array, Int32Array, Int64Array, LargeStringArray, StringArray, UInt32Array};
use arrow::ipc::reader::FileReader;
use arrow::record_batch::RecordBatch;
use coverbind_core::{DocType, Insurer};
use tracing::debug;

use crate::{MemoryDocumentStore, RawEvidence, StoreError};

impl MemoryDocumentStore {
    pub fn from_batches(batches: &[RecordBatch]) -> Result<Self, StoreError> {
        let mut store = Self::new();

        for batch in batches {
            let code_col = required(batch, "coverage_code")?;
            let insurer_col = required(batch, "insurer")?;
            let doc_type_col = required(batch, "doc_type")?;
            let doc_id_col = required(batch, "doc_id")?;
            let text_col = required(batch, "text")?;
            let page_col = batch.column_by_name("page");

            for row in 0..batch.num_rows() {
                let insurer: Insurer = get_required_string(insurer_col, "insurer", row)?.parse()?;
                let doc_type: DocType =
                    get_required_string(doc_type_col, "doc_type", row)?.parse()?;
                let page = match page_col {
                    Some(col) => get_page(col.as_ref(), row)?,
                    None => None,
                };

                store.insert(
                    insurer,
                    RawEvidence {
                        doc_type,
                        doc_id: get_required_string(doc_id_col, "doc_id", row)?,
                        page,
                        text: get_string(text_col, row).unwrap_or_default(),
                        coverage_code: get_required_string(code_col, "coverage_code", row)?,
                    },
                );
            }
            debug!(rows = batch.num_rows(), "loaded document batch");
        }

        Ok(store)
    }

    /// Load every batch of an Arrow IPC file.
    pub fn load_ipc(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            return Err(StoreError::CorpusNotFound(path.to_path_buf()));
        }
        let reader = FileReader::try_new(File::open(path)?, None)?;
        let batches = reader.collect::<Result<Vec<_>, _>>()?;
        debug!(path = %path.display(), batches = batches.len(), "read arrow file");
        Self::from_batches(&batches)
    }
}

// ── Arrow extraction helpers ──

fn required<'a>(batch: &'a RecordBatch, name: &'static str) -> Result<&'a dyn Array, StoreError> {
    batch
        .column_by_name(name)
        .map(|c| c.as_ref())
        .ok_or(StoreError::MissingColumn(name))
}

/// Extract a string value from an Arrow array (handles Utf8 and LargeUtf8).
fn get_string(col: &dyn Array, row: usize) -> Option<String> {
    if col.is_null(row) {
        return None;
    }
    col.as_any()
        .downcast_ref::<StringArray>()
        .map(|arr| arr.value(row).to_string())
        .or_else(|| {
            col.as_any()
                .downcast_ref::<LargeStringArray>()
                .map(|arr| arr.value(row).to_string())
        })
}

fn get_required_string(
    col: &dyn Array,
    column: &'static str,
    row: usize,
) -> Result<String, StoreError> {
    get_string(col, row).ok_or(StoreError::NullValue { column, row })
}

/// Page numbers may arrive as Int32, Int64, or UInt32. Negative pages are treated as absent.
fn get_page(col: &dyn Array, row: usize) -> Result<Option<u32>, StoreError> {
    if col.is_null(row) {
        return Ok(None);
    }
    if let Some(arr) = col.as_any().downcast_ref::<UInt32Array>() {
        return Ok(Some(arr.value(row)));
    }
    if let Some(arr) = col.as_any().downcast_ref::<Int32Array>() {
        return Ok(u32::try_from(arr.value(row)).ok());
    }
    if let Some(arr) = col.as_any().downcast_ref::<Int64Array>() {
        return Ok(u32::try_from(arr.value(row)).ok());
    }
    Err(StoreError::UnsupportedColumnType("page"))
}
