use crate::services::media_tool::MediaToolError;
use thiserror::Error;

/// Coarse classification used to report an ingestion failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Rejected before anything was persisted
    InvalidInput,
    /// Caller does not own the record
    Unauthorized,
    /// A collaborator or external tool failed
    UpstreamFailure,
    /// The upload is not valid media of the declared type
    DataFailure,
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Not authorized to update this video")]
    NotOwner,

    #[error("Upload exceeds the maximum allowed size of {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("Failed to stage upload: {0}")]
    Staging(#[source] std::io::Error),

    #[error("Uploaded file does not contain a video stream")]
    NotAVideoFile,

    #[error("Failed to probe media: {0}")]
    ProbeFailure(#[source] MediaToolError),

    #[error("Failed to optimize video for streaming: {0}")]
    RemuxFailure(String),

    #[error("Failed to publish asset: {0}")]
    PublishFailure(#[source] anyhow::Error),

    #[error("Failed to update video record: {0}")]
    RecordUpdate(#[source] anyhow::Error),
}

impl IngestError {
    pub fn kind(&self) -> FailureKind {
        match self {
            IngestError::UnsupportedMediaType(_) | IngestError::PayloadTooLarge { .. } => {
                FailureKind::InvalidInput
            }
            IngestError::NotOwner => FailureKind::Unauthorized,
            IngestError::NotAVideoFile => FailureKind::DataFailure,
            IngestError::Staging(_)
            | IngestError::ProbeFailure(_)
            | IngestError::RemuxFailure(_)
            | IngestError::PublishFailure(_)
            | IngestError::RecordUpdate(_) => FailureKind::UpstreamFailure,
        }
    }
}
