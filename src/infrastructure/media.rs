use crate::config::AppConfig;
use crate::services::media_tool::{FfmpegTool, MediaTool};
use std::sync::Arc;
use tracing::{info, warn};

pub async fn setup_media_tool(config: &AppConfig) -> Arc<dyn MediaTool> {
    let tool = FfmpegTool::from_config(config);

    if tool.health_check().await {
        info!(
            "🎬 Media tools ready ({}, {})",
            config.ffprobe_path, config.ffmpeg_path
        );
    } else {
        warn!(
            "⚠️  Media tools unavailable ({}, {}); video uploads will fail",
            config.ffprobe_path, config.ffmpeg_path
        );
    }

    Arc::new(tool)
}
