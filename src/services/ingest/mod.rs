//! Thumbnail and video ingestion pipelines.
//!
//! Both pipelines receive an already authenticated owner and an already
//! loaded record. Staged files live in a per-request [`StagingArea`] that is
//! dropped before the outcome is reported, whichever way the pipeline exits.

mod error;
mod thumbnail;
mod types;
mod video;

pub use error::{FailureKind, IngestError};
pub use types::{IngestStage, Upload};

use crate::config::AppConfig;
use crate::entities::videos;
use crate::services::media_tool::MediaTool;
use crate::services::publisher::{AssetPublisher, PublishedAsset};
use crate::services::staging::StagingArea;
use crate::services::video_store::VideoStore;
use std::sync::Arc;
use tracing::{error, warn};

pub struct IngestService {
    videos: Arc<dyn VideoStore>,
    publisher: AssetPublisher,
    media_tool: Arc<dyn MediaTool>,
    config: AppConfig,
}

impl IngestService {
    pub fn new(
        videos: Arc<dyn VideoStore>,
        publisher: AssetPublisher,
        media_tool: Arc<dyn MediaTool>,
        config: AppConfig,
    ) -> Self {
        Self {
            videos,
            publisher,
            media_tool,
            config,
        }
    }

    fn ensure_owner(&self, owner_id: &str, video: &videos::Model) -> Result<(), IngestError> {
        if video.user_id != owner_id {
            warn!(
                "User {} attempted to modify video {} owned by {}",
                owner_id, video.id, video.user_id
            );
            return Err(IngestError::NotOwner);
        }
        Ok(())
    }

    fn staging_area(&self) -> StagingArea {
        StagingArea::new(&self.config.staging_dir)
    }

    /// Persists `video`; on failure the just published asset is deleted again
    async fn commit(
        &self,
        video: &videos::Model,
        published: &PublishedAsset,
    ) -> Result<videos::Model, IngestError> {
        match self.videos.update(video).await {
            Ok(updated) => Ok(updated),
            Err(e) => {
                match self.publisher.retract(published).await {
                    Ok(()) => warn!(
                        "Record update for video {} failed, retracted {}",
                        video.id, published.key
                    ),
                    Err(retract_err) => error!(
                        "Record update for video {} failed and {} could not be retracted: {}",
                        video.id, published.key, retract_err
                    ),
                }
                Err(IngestError::RecordUpdate(e))
            }
        }
    }
}
