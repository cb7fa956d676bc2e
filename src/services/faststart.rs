use crate::services::ingest::IngestError;
use crate::services::media_tool::MediaTool;
use crate::services::staging::StagingArea;
use std::path::{Path, PathBuf};

/// Rewrites a staged MP4 so its index precedes the media payload.
///
/// The result is a new file inside `staging`; `input` is left untouched.
/// An empty result counts as a failure even when the tool reported success.
pub async fn optimize_for_streaming(
    tool: &dyn MediaTool,
    staging: &mut StagingArea,
    input: &Path,
) -> Result<PathBuf, IngestError> {
    let output = staging.reserve(".mp4").map_err(IngestError::Staging)?;

    tool.remux_faststart(input, &output)
        .await
        .map_err(|e| IngestError::RemuxFailure(e.to_string()))?;

    let size = tokio::fs::metadata(&output)
        .await
        .map_err(|e| IngestError::RemuxFailure(format!("could not stat processed file: {}", e)))?
        .len();

    if size == 0 {
        return Err(IngestError::RemuxFailure(
            "processed file is empty".to_string(),
        ));
    }

    tracing::debug!("Remuxed {} into {} ({} bytes)", input.display(), output.display(), size);
    Ok(output)
}
