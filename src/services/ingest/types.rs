use crate::services::media_validator::AssetClass;
use std::fmt;
use tokio::io::AsyncRead;
use tracing::{debug, info, warn};

use super::IngestError;

/// One inbound file: its declared content type and its byte stream
pub struct Upload<R> {
    pub content_type: Option<String>,
    pub body: R,
}

impl<R> Upload<R>
where
    R: AsyncRead + Unpin + Send,
{
    pub fn new(content_type: Option<String>, body: R) -> Self {
        Self { content_type, body }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStage {
    Received,
    Validated,
    Staged,
    Probed,
    Optimized,
    Published,
    RecordUpdated,
    Cleaned,
    Failed,
}

impl IngestStage {
    pub fn is_terminal(self) -> bool {
        matches!(self, IngestStage::Cleaned | IngestStage::Failed)
    }
}

impl fmt::Display for IngestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IngestStage::Received => "received",
            IngestStage::Validated => "validated",
            IngestStage::Staged => "staged",
            IngestStage::Probed => "probed",
            IngestStage::Optimized => "optimized",
            IngestStage::Published => "published",
            IngestStage::RecordUpdated => "record_updated",
            IngestStage::Cleaned => "cleaned",
            IngestStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Stage tracker for a single ingestion request
pub(crate) struct Progress {
    video_id: String,
    class: AssetClass,
    stage: IngestStage,
}

impl Progress {
    pub(crate) fn new(video_id: &str, class: AssetClass) -> Self {
        debug!("{} ingest for video {}: {}", class, video_id, IngestStage::Received);
        Self {
            video_id: video_id.to_string(),
            class,
            stage: IngestStage::Received,
        }
    }

    pub(crate) fn advance(&mut self, next: IngestStage) {
        debug_assert!(!self.stage.is_terminal());
        debug!(
            "{} ingest for video {}: {} -> {}",
            self.class, self.video_id, self.stage, next
        );
        self.stage = next;
    }

    /// Moves to the terminal state matching `result`; call after staged files are gone
    pub(crate) fn finish<T>(mut self, result: Result<T, IngestError>) -> Result<T, IngestError> {
        match &result {
            Ok(_) => {
                self.advance(IngestStage::Cleaned);
                info!("✅ {} ingest for video {} complete", self.class, self.video_id);
            }
            Err(e) => {
                warn!(
                    "❌ {} ingest for video {} failed after stage '{}': {}",
                    self.class, self.video_id, self.stage, e
                );
                self.advance(IngestStage::Failed);
            }
        }
        result
    }
}
