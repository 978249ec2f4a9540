use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Missing required columns: {}", missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    #[error("Non-numeric value in column '{column}' at row {row}")]
    NonNumericCell { row: usize, column: String },

    #[error("Row {row} has {actual} cells, expected {expected}")]
    RaggedRow { row: usize, expected: usize, actual: usize },

    #[error("Duplicate column '{name}'")]
    DuplicateColumn { name: String },

    #[error("Dataset has no rows")]
    EmptyDataset,

    #[error("No dataset uploaded")]
    NoDataset,

    #[error("Sheet '{name}' not found")]
    UnknownSheet { name: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type DashResult<T> = Result<T, DashError>;
