use crate::model::PubId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("invalid citation row at line {line}: {reason}")]
    Validation { line: usize, reason: String },

    #[error("publication {0} is not cited by any page")]
    SeedNotFound(PubId),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GraphError>;
