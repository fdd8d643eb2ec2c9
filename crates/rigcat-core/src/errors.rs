use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("category not found")]
    NotFound,
    #[error("invalid request: {0}")]
    Invalid(String),
    #[error("catalog source error: {0}")]
    Source(String),
    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
