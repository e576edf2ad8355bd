use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("corpus file not found: {0}")]
    CorpusNotFound(std::path::PathBuf),

    #[error("missing column: {0}")]
    MissingColumn(&'static str),

    #[error("null {column} at row {row}")]
    NullValue { column: &'static str, row: usize },

    #[error("column {0} has an unsupported type")]
    UnsupportedColumnType(&'static str),

    #[error("invalid value: {0}")]
    Model(#[from] coverbind_core::ModelError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}
