use drava_metadata_store::MetadataError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LoadManagerError>;

#[derive(Debug, Error)]
pub enum LoadManagerError {
    /// Placement exhausted every recovery path and still found no broker.
    #[error("no broker available to assign bundle {0}")]
    NoBrokerAvailable(String),

    /// The manager could not register itself at startup.
    #[error("load manager start failed: {0}")]
    StartFailure(String),

    #[error("metadata store error: {0}")]
    Metadata(#[from] MetadataError),
}
