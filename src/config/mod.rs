use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Process-wide configuration for the ingestion backend
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HTTP port (default: 8091)
    pub port: u16,

    /// Root directory for locally stored thumbnails (default: "./assets")
    pub assets_root: PathBuf,

    /// Public base URL that serves `/assets/` (default: "http://localhost:<port>")
    pub assets_base_url: String,

    /// Directory for request-scoped staging files (default: OS temp dir)
    pub staging_dir: PathBuf,

    /// Object storage bucket for videos
    pub s3_bucket: String,

    /// Object storage region (default: "us-east-1")
    pub s3_region: String,

    /// Custom S3 endpoint, e.g. MinIO
    pub s3_endpoint: Option<String>,

    /// CDN distribution base URL placed in front of the bucket
    pub s3_cf_distribution: Option<String>,

    /// JWT signing secret
    pub jwt_secret: String,

    /// Thumbnail upload ceiling in bytes (default: 10 MB)
    pub max_thumbnail_size: usize,

    /// Video upload ceiling in bytes (default: 1 GB)
    pub max_video_size: usize,

    pub ffprobe_path: String,
    pub ffmpeg_path: String,

    /// Per-invocation limit for ffprobe/ffmpeg in seconds, 0 disables (default: 600)
    pub media_tool_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8091,
            assets_root: PathBuf::from("./assets"),
            assets_base_url: "http://localhost:8091".to_string(),
            staging_dir: env::temp_dir(),
            s3_bucket: "media".to_string(),
            s3_region: "us-east-1".to_string(),
            s3_endpoint: None,
            s3_cf_distribution: None,
            jwt_secret: "secret".to_string(),
            max_thumbnail_size: 10 * 1024 * 1024, // 10 MB
            max_video_size: 1024 * 1024 * 1024,   // 1 GB
            ffprobe_path: "ffprobe".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
            media_tool_timeout_secs: 600,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default.port);

        Self {
            port,

            assets_root: env::var("ASSETS_ROOT")
                .map(PathBuf::from)
                .unwrap_or(default.assets_root),

            assets_base_url: env::var("ASSETS_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| format!("http://localhost:{}", port)),

            staging_dir: env::var("STAGING_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.staging_dir),

            s3_bucket: env::var("S3_BUCKET").unwrap_or(default.s3_bucket),

            s3_region: env::var("S3_REGION").unwrap_or(default.s3_region),

            s3_endpoint: env::var("S3_ENDPOINT").ok().filter(|v| !v.is_empty()),

            s3_cf_distribution: env::var("S3_CF_DISTRIBUTION")
                .ok()
                .filter(|v| !v.is_empty())
                .map(|v| v.trim_end_matches('/').to_string()),

            jwt_secret: env::var("JWT_SECRET").unwrap_or(default.jwt_secret), // dev fallback, production() enforces it

            max_thumbnail_size: env::var("MAX_THUMBNAIL_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_thumbnail_size),

            max_video_size: env::var("MAX_VIDEO_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_video_size),

            ffprobe_path: env::var("FFPROBE_PATH").unwrap_or(default.ffprobe_path),

            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or(default.ffmpeg_path),

            media_tool_timeout_secs: env::var("MEDIA_TOOL_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.media_tool_timeout_secs),
        }
    }

    /// Create config for development (local MinIO, relaxed tool timeout)
    pub fn development() -> Self {
        Self {
            s3_endpoint: Some("http://127.0.0.1:9000".to_string()),
            media_tool_timeout_secs: 0,
            ..Self::default()
        }
    }

    /// Create config for production (secret must be provided)
    pub fn production() -> Self {
        Self {
            jwt_secret: env::var("JWT_SECRET").expect("CRITICAL: JWT_SECRET must be set"),
            ..Self::from_env()
        }
    }

    /// Base URL under which published video keys resolve.
    ///
    /// A CDN distribution wins over the bucket URL; with a custom endpoint the
    /// bucket is addressed path-style.
    pub fn video_base_url(&self) -> String {
        if let Some(distribution) = &self.s3_cf_distribution {
            return distribution.clone();
        }
        match &self.s3_endpoint {
            Some(endpoint) => format!("{}/{}", endpoint.trim_end_matches('/'), self.s3_bucket),
            None => format!(
                "https://{}.s3.{}.amazonaws.com",
                self.s3_bucket, self.s3_region
            ),
        }
    }

    pub fn media_tool_timeout(&self) -> Option<Duration> {
        match self.media_tool_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}
