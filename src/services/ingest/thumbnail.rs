use super::types::{IngestStage, Progress, Upload};
use super::{IngestError, IngestService};
use crate::entities::videos;
use crate::services::media_validator::{self, AssetClass};
use tokio::io::AsyncRead;

impl IngestService {
    /// Replaces the thumbnail of `video` with the uploaded image.
    ///
    /// The previous thumbnail is deleted only after the record points at the new one.
    pub async fn ingest_thumbnail<R>(
        &self,
        owner_id: &str,
        video: videos::Model,
        upload: Upload<R>,
    ) -> Result<videos::Model, IngestError>
    where
        R: AsyncRead + Unpin + Send,
    {
        self.ensure_owner(owner_id, &video)?;

        let mut progress = Progress::new(&video.id, AssetClass::Image);
        let result = self.run_thumbnail(&mut progress, video, upload).await;
        progress.finish(result)
    }

    async fn run_thumbnail<R>(
        &self,
        progress: &mut Progress,
        mut video: videos::Model,
        upload: Upload<R>,
    ) -> Result<videos::Model, IngestError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let descriptor =
            media_validator::validate(upload.content_type.as_deref(), AssetClass::Image)?;
        progress.advance(IngestStage::Validated);

        let mut staging = self.staging_area();
        let staged = staging
            .stage(upload.body, descriptor.extension(), self.config.max_thumbnail_size)
            .await?;
        progress.advance(IngestStage::Staged);

        let published = self.publisher.publish(&staged, &descriptor, None).await?;
        progress.advance(IngestStage::Published);

        let previous_url = video.thumbnail_url.replace(published.url.clone());
        let updated = self.commit(&video, &published).await?;
        progress.advance(IngestStage::RecordUpdated);

        let superseded = previous_url
            .as_deref()
            .and_then(|url| self.publisher.thumbnail_key_from_url(url))
            .filter(|key| key != published.key.as_str());

        if let Some(old_key) = superseded {
            if let Err(e) = self.publisher.remove_thumbnail(&old_key).await {
                tracing::warn!("Failed to delete superseded thumbnail {}: {}", old_key, e);
            }
        }

        Ok(updated)
    }
}
