use crate::services::ingest::IngestError;
use crate::services::media_tool::MediaTool;
use std::fmt;
use std::path::Path;

/// Orientation of a video, used as the namespace of its storage key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Landscape,
    Portrait,
    Other,
}

impl Orientation {
    pub fn from_aspect_ratio(display_aspect_ratio: &str) -> Self {
        match display_aspect_ratio.trim() {
            "16:9" => Orientation::Landscape,
            "9:16" => Orientation::Portrait,
            _ => Orientation::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Landscape => "landscape",
            Orientation::Portrait => "portrait",
            Orientation::Other => "other",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies the first video stream of a staged file.
///
/// A file without any video stream is the uploader's fault (`NotAVideoFile`);
/// a tool that cannot run or emits garbage is ours (`ProbeFailure`).
pub async fn probe_orientation(
    tool: &dyn MediaTool,
    path: &Path,
) -> Result<Orientation, IngestError> {
    let report = tool.probe(path).await.map_err(IngestError::ProbeFailure)?;

    let stream = report
        .first_video_stream()
        .ok_or(IngestError::NotAVideoFile)?;

    let orientation = stream
        .display_aspect_ratio
        .as_deref()
        .map(Orientation::from_aspect_ratio)
        .unwrap_or(Orientation::Other);

    tracing::debug!(
        "Probed {}: {}x{} ({:?}) -> {}",
        path.display(),
        stream.width.unwrap_or_default(),
        stream.height.unwrap_or_default(),
        stream.display_aspect_ratio,
        orientation
    );
    Ok(orientation)
}
