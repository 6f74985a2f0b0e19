pub mod agent;
pub mod cache;
pub mod extract;
pub mod fetcher;
pub mod link;
pub mod metrics;

use seasongate_db::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("identity not found in link: {0}")]
    IdentityNotFound(String),
    #[error("metadata extraction failed: {0}")]
    Extraction(#[from] ExtractionError),
    #[error("network error: {0}")]
    Network(String),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// A mandatory field could not be read from a fetched page.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("season id not found")]
    SeasonIdMissing,
    #[error("serial id not found")]
    SerialIdMissing,
}
