use crate::config::AppConfig;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::process::{Output, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum MediaToolError {
    #[error("failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with {status}: {stderr}")]
    Exit {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("{tool} did not finish within {secs}s")]
    TimedOut { tool: String, secs: u64 },

    #[error("invalid probe output: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Parsed `ffprobe -show_streams` document
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProbeReport {
    #[serde(default)]
    pub streams: Vec<ProbeStream>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProbeStream {
    pub codec_type: Option<String>,
    pub codec_name: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub display_aspect_ratio: Option<String>,
}

impl ProbeReport {
    pub fn first_video_stream(&self) -> Option<&ProbeStream> {
        self.streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"))
    }
}

/// External media inspection and remuxing
#[async_trait]
pub trait MediaTool: Send + Sync {
    /// Inspect the streams of a file
    async fn probe(&self, path: &Path) -> Result<ProbeReport, MediaToolError>;

    /// Copy all streams of `input` into `output` with the index moved in front of the payload
    async fn remux_faststart(&self, input: &Path, output: &Path) -> Result<(), MediaToolError>;

    /// Check that the tools can be executed
    async fn health_check(&self) -> bool;
}

/// `MediaTool` backed by the ffprobe and ffmpeg binaries
pub struct FfmpegTool {
    ffprobe_path: String,
    ffmpeg_path: String,
    timeout: Option<Duration>,
}

impl FfmpegTool {
    pub fn new(ffprobe_path: String, ffmpeg_path: String, timeout: Option<Duration>) -> Self {
        Self {
            ffprobe_path,
            ffmpeg_path,
            timeout,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.ffprobe_path.clone(),
            config.ffmpeg_path.clone(),
            config.media_tool_timeout(),
        )
    }

    async fn run(&self, tool: &str, mut cmd: Command) -> Result<Output, MediaToolError> {
        cmd.stdin(Stdio::null()).kill_on_drop(true);

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, cmd.output())
                .await
                .map_err(|_| MediaToolError::TimedOut {
                    tool: tool.to_string(),
                    secs: limit.as_secs(),
                })?,
            None => cmd.output().await,
        }
        .map_err(|source| MediaToolError::Spawn {
            tool: tool.to_string(),
            source,
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::error!("{} failed: {}", tool, stderr);
            return Err(MediaToolError::Exit {
                tool: tool.to_string(),
                status: output.status.to_string(),
                stderr,
            });
        }

        Ok(output)
    }
}

#[async_trait]
impl MediaTool for FfmpegTool {
    async fn probe(&self, path: &Path) -> Result<ProbeReport, MediaToolError> {
        let mut cmd = Command::new(&self.ffprobe_path);
        cmd.arg("-v")
            .arg("error")
            .arg("-print_format")
            .arg("json")
            .arg("-show_streams")
            .arg(path);

        let output = self.run("ffprobe", cmd).await?;
        Ok(serde_json::from_slice(&output.stdout)?)
    }

    async fn remux_faststart(&self, input: &Path, output: &Path) -> Result<(), MediaToolError> {
        let mut cmd = Command::new(&self.ffmpeg_path);
        cmd.arg("-y") // the staged output already exists
            .arg("-v")
            .arg("error")
            .arg("-i")
            .arg(input)
            .arg("-c")
            .arg("copy")
            .arg("-movflags")
            .arg("faststart")
            .arg("-f")
            .arg("mp4")
            .arg(output);

        self.run("ffmpeg", cmd).await?;
        Ok(())
    }

    async fn health_check(&self) -> bool {
        for (tool, path) in [("ffprobe", &self.ffprobe_path), ("ffmpeg", &self.ffmpeg_path)] {
            let mut cmd = Command::new(path);
            cmd.arg("-version").stdout(Stdio::null());
            if self.run(tool, cmd).await.is_err() {
                return false;
            }
        }
        true
    }
}
