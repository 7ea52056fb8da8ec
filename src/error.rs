use thiserror::Error;

/// Data-shape problems that stop one dataset from being charted.
///
/// These never cross the composer boundary: the composer turns them into
/// plan notes and moves on to the next dataset.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShapeError {
    #[error("dataset '{dataset}' has no columns or no rows")]
    EmptyDataset { dataset: String },

    #[error("dataset '{dataset}': column '{column}' has {found} values, expected {expected}")]
    RaggedColumns {
        dataset: String,
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("dataset '{dataset}': column '{column}' is declared more than once")]
    DuplicateColumn { dataset: String, column: String },
}

pub type ShapeResult<T> = std::result::Result<T, ShapeError>;
