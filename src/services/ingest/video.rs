use super::types::{IngestStage, Progress, Upload};
use super::{IngestError, IngestService};
use crate::entities::videos;
use crate::services::faststart;
use crate::services::media_validator::{self, AssetClass};
use crate::services::probe;
use tokio::io::AsyncRead;

impl IngestService {
    /// Stores an uploaded MP4 under `<orientation>/` and points `video` at it.
    ///
    /// The published object is the fast-start rewrite of the upload, never the
    /// upload itself. Nothing durable is touched before the rewrite succeeds.
    pub async fn ingest_video<R>(
        &self,
        owner_id: &str,
        video: videos::Model,
        upload: Upload<R>,
    ) -> Result<videos::Model, IngestError>
    where
        R: AsyncRead + Unpin + Send,
    {
        self.ensure_owner(owner_id, &video)?;

        let mut progress = Progress::new(&video.id, AssetClass::Video);
        let result = self.run_video(&mut progress, video, upload).await;
        progress.finish(result)
    }

    async fn run_video<R>(
        &self,
        progress: &mut Progress,
        mut video: videos::Model,
        upload: Upload<R>,
    ) -> Result<videos::Model, IngestError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let descriptor =
            media_validator::validate(upload.content_type.as_deref(), AssetClass::Video)?;
        progress.advance(IngestStage::Validated);

        let mut staging = self.staging_area();
        let staged = staging
            .stage(upload.body, descriptor.extension(), self.config.max_video_size)
            .await?;
        progress.advance(IngestStage::Staged);

        let orientation = probe::probe_orientation(self.media_tool.as_ref(), &staged).await?;
        progress.advance(IngestStage::Probed);

        let optimized =
            faststart::optimize_for_streaming(self.media_tool.as_ref(), &mut staging, &staged)
                .await?;
        progress.advance(IngestStage::Optimized);

        let published = self
            .publisher
            .publish(&optimized, &descriptor, Some(orientation.as_str()))
            .await?;
        progress.advance(IngestStage::Published);

        video.video_url = Some(published.url.clone());
        let updated = self.commit(&video, &published).await?;
        progress.advance(IngestStage::RecordUpdated);

        Ok(updated)
    }
}
