//! Layout error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("layout engine error: {0}")]
    Taffy(#[from] taffy::TaffyError),

    /// Two elements in one mounted tree share an id
    #[error("duplicate element id: {0}")]
    DuplicateId(String),
}

pub type Result<T> = std::result::Result<T, LayoutError>;
