use crate::AppState;
use crate::api::error::AppError;
use crate::api::handlers::videos::{VideoResponse, load_video};
use crate::services::ingest::Upload;
use crate::utils::auth::Claims;
use axum::{
    Extension, Json,
    extract::{Multipart, Path, State, multipart::MultipartError},
    http::StatusCode,
};
use futures::TryStreamExt;
use tokio_util::io::StreamReader;

pub const THUMBNAIL_FIELD: &str = "thumbnail";
pub const VIDEO_FIELD: &str = "video";

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::BadRequest(e.body_text())
    }
}

/// Reads the rest of the body so the client sees the error instead of a reset
async fn drain(multipart: &mut Multipart) {
    while let Ok(Some(_)) = multipart.next_field().await {}
}

#[utoipa::path(
    post,
    path = "/api/thumbnail_upload/{video_id}",
    params(
        ("video_id" = String, Path, description = "Video ID")
    ),
    request_body(content = Object, description = "Multipart form with a `thumbnail` image (image/png or image/jpeg)", content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Thumbnail stored", body = VideoResponse),
        (status = 400, description = "Invalid video ID, form or media type"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Video not found"),
        (status = 413, description = "Thumbnail too large")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "uploads"
)]
pub async fn upload_thumbnail(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(video_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<VideoResponse>, AppError> {
    let video = load_video(&state, &video_id).await?;

    let result = loop {
        let field = match multipart.next_field().await.map_err(multipart_error)? {
            Some(field) => field,
            None => break Err(AppError::BadRequest("No thumbnail file provided".to_string())),
        };
        if field.name() != Some(THUMBNAIL_FIELD) {
            continue;
        }

        let content_type = field.content_type().map(|s| s.to_string());
        let reader = StreamReader::new(field.map_err(std::io::Error::other));

        break state
            .ingest
            .ingest_thumbnail(&claims.sub, video, Upload::new(content_type, reader))
            .await
            .map_err(AppError::from);
    };

    match result {
        Ok(updated) => Ok(Json(updated.into())),
        Err(e) => {
            drain(&mut multipart).await;
            Err(e)
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/video_upload/{video_id}",
    params(
        ("video_id" = String, Path, description = "Video ID")
    ),
    request_body(content = Object, description = "Multipart form with a `video` file (video/mp4)", content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Video stored", body = VideoResponse),
        (status = 400, description = "Invalid video ID, form, media type or not a video"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Video not found"),
        (status = 413, description = "Video too large"),
        (status = 500, description = "Probing, remuxing or publishing failed")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "uploads"
)]
pub async fn upload_video(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(video_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<VideoResponse>, AppError> {
    let video = load_video(&state, &video_id).await?;

    let result = loop {
        let field = match multipart.next_field().await.map_err(multipart_error)? {
            Some(field) => field,
            None => break Err(AppError::BadRequest("No video file provided".to_string())),
        };
        if field.name() != Some(VIDEO_FIELD) {
            continue;
        }

        let content_type = field.content_type().map(|s| s.to_string());
        let reader = StreamReader::new(field.map_err(std::io::Error::other));

        break state
            .ingest
            .ingest_video(&claims.sub, video, Upload::new(content_type, reader))
            .await
            .map_err(AppError::from);
    };

    match result {
        Ok(updated) => Ok(Json(updated.into())),
        Err(e) => {
            drain(&mut multipart).await;
            Err(e)
        }
    }
}
