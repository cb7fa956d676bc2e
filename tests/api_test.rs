use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use rust_media_backend::config::AppConfig;
use rust_media_backend::infrastructure::database;
use rust_media_backend::services::ingest::IngestService;
use rust_media_backend::services::media_tool::{
    MediaTool, MediaToolError, ProbeReport, ProbeStream,
};
use rust_media_backend::services::publisher::AssetPublisher;
use rust_media_backend::services::storage::{LocalStorageService, StorageService};
use rust_media_backend::services::video_store::SeaOrmVideoStore;
use rust_media_backend::utils::auth::create_jwt;
use rust_media_backend::{AppState, create_app};
use sea_orm::Database;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::ServiceExt;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const SECRET: &str = "api-test-secret";
const BOUNDARY: &str = "---------------------------123456789012345678901234567";

struct MockStorageService {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn upload_path(&self, key: &str, path: &Path, _content_type: &str) -> anyhow::Result<()> {
        let data = tokio::fs::read(path).await?;
        self.files.lock().unwrap().insert(key.to_string(), data);
        Ok(())
    }

    async fn delete_file(&self, key: &str) -> anyhow::Result<()> {
        self.files.lock().unwrap().remove(key);
        Ok(())
    }

    async fn file_exists(&self, key: &str) -> anyhow::Result<bool> {
        Ok(self.files.lock().unwrap().contains_key(key))
    }
}

struct LandscapeTool;

#[async_trait]
impl MediaTool for LandscapeTool {
    async fn probe(&self, _path: &Path) -> Result<ProbeReport, MediaToolError> {
        Ok(ProbeReport {
            streams: vec![ProbeStream {
                codec_type: Some("video".to_string()),
                display_aspect_ratio: Some("16:9".to_string()),
                ..Default::default()
            }],
        })
    }

    async fn remux_faststart(&self, input: &Path, output: &Path) -> Result<(), MediaToolError> {
        tokio::fs::copy(input, output).await.unwrap();
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

struct TestApp {
    app: Router,
    _assets: TempDir,
    _staging: TempDir,
}

async fn setup() -> TestApp {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::new("rust_media_backend=debug,tower_http=debug"))
        .with(fmt::layer().with_test_writer())
        .try_init();

    let db = Database::connect("sqlite::memory:").await.unwrap();
    database::run_migrations(&db).await.unwrap();

    let assets = tempfile::tempdir().unwrap();
    let staging = tempfile::tempdir().unwrap();
    let config = AppConfig {
        assets_root: assets.path().to_path_buf(),
        staging_dir: staging.path().to_path_buf(),
        s3_cf_distribution: Some("https://cdn.example.com".to_string()),
        jwt_secret: SECRET.to_string(),
        ..AppConfig::default()
    };

    let videos = Arc::new(SeaOrmVideoStore::new(db));
    let objects: Arc<dyn StorageService> = Arc::new(MockStorageService {
        files: Mutex::new(HashMap::new()),
    });
    let media_tool: Arc<dyn MediaTool> = Arc::new(LandscapeTool);
    let publisher = AssetPublisher::new(
        Arc::new(LocalStorageService::new(assets.path())),
        objects.clone(),
        &config,
    );
    let ingest = Arc::new(IngestService::new(
        videos.clone(),
        publisher,
        media_tool.clone(),
        config.clone(),
    ));

    let state = AppState {
        videos,
        ingest,
        media_tool,
        objects,
        config,
    };

    TestApp {
        app: create_app(state),
        _assets: assets,
        _staging: staging,
    }
}

fn bearer(user: &str) -> String {
    format!("Bearer {}", create_jwt(user, SECRET).unwrap())
}

fn multipart_body(field: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{boundary}\r\n\
        Content-Disposition: form-data; name=\"note\"\r\n\r\n\
        ignored\r\n\
        --{boundary}\r\n\
        Content-Disposition: form-data; name=\"{field}\"; filename=\"upload.bin\"\r\n\
        Content-Type: {content_type}\r\n\r\n",
        boundary = BOUNDARY,
        field = field,
        content_type = content_type
    )
    .into_bytes();
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn upload_request(uri: &str, user: Option<&str>, body: Vec<u8>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri(uri).header(
        "Content-Type",
        format!("multipart/form-data; boundary={}", BOUNDARY),
    );
    if let Some(user) = user {
        builder = builder.header("Authorization", bearer(user));
    }
    builder.body(Body::from(body)).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

async fn create_video(app: &Router, user: &str) -> String {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/videos")
                .header("Authorization", bearer(user))
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"title": "Boots demo", "description": "test"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    json_body(response).await["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health() {
    let t = setup().await;
    let response = t
        .app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let json = json_body(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["database"], "connected");
}

#[tokio::test]
async fn test_requires_bearer_token() {
    let t = setup().await;
    let id = create_video(&t.app, "user-1").await;

    let response = t
        .app
        .clone()
        .oneshot(upload_request(
            &format!("/api/thumbnail_upload/{}", id),
            None,
            multipart_body("thumbnail", "image/png", b"png"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = t
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/videos")
                .header("Authorization", "Bearer not-a-jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"], "Invalid token");
}

#[tokio::test]
async fn test_thumbnail_upload_and_serve() {
    let t = setup().await;
    let id = create_video(&t.app, "user-1").await;

    let response = t
        .app
        .clone()
        .oneshot(upload_request(
            &format!("/api/thumbnail_upload/{}", id),
            Some("user-1"),
            multipart_body("thumbnail", "image/jpeg", b"jpeg bytes"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    let url = json["thumbnail_url"].as_str().unwrap();
    let path = url.strip_prefix("http://localhost:8091").unwrap();
    assert!(path.starts_with("/assets/") && path.ends_with(".jpeg"));

    let response = t
        .app
        .clone()
        .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"jpeg bytes");
}

#[tokio::test]
async fn test_video_upload() {
    let t = setup().await;
    let id = create_video(&t.app, "user-1").await;

    let response = t
        .app
        .clone()
        .oneshot(upload_request(
            &format!("/api/video_upload/{}", id),
            Some("user-1"),
            multipart_body("video", "video/mp4", b"mdat"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert!(
        json["video_url"]
            .as_str()
            .unwrap()
            .starts_with("https://cdn.example.com/landscape/")
    );

    let response = t
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/videos/{}", id))
                .header("Authorization", bearer("user-1"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["video_url"], json["video_url"]);
}

#[tokio::test]
async fn test_upload_error_statuses() {
    let t = setup().await;
    let id = create_video(&t.app, "owner").await;

    let cases = [
        (
            "/api/thumbnail_upload/not-a-uuid".to_string(),
            "owner",
            multipart_body("thumbnail", "image/png", b"png"),
            StatusCode::BAD_REQUEST,
        ),
        (
            format!("/api/thumbnail_upload/{}", uuid::Uuid::new_v4()),
            "owner",
            multipart_body("thumbnail", "image/png", b"png"),
            StatusCode::NOT_FOUND,
        ),
        (
            format!("/api/thumbnail_upload/{}", id),
            "intruder",
            multipart_body("thumbnail", "image/png", b"png"),
            StatusCode::UNAUTHORIZED,
        ),
        (
            format!("/api/thumbnail_upload/{}", id),
            "owner",
            multipart_body("thumbnail", "image/gif", b"gif"),
            StatusCode::BAD_REQUEST,
        ),
        (
            format!("/api/thumbnail_upload/{}", id),
            "owner",
            multipart_body("avatar", "image/png", b"png"),
            StatusCode::BAD_REQUEST,
        ),
        (
            format!("/api/video_upload/{}", id),
            "owner",
            multipart_body("video", "video/quicktime", b"mov"),
            StatusCode::BAD_REQUEST,
        ),
    ];

    for (uri, user, body, expected) in cases {
        let response = t
            .app
            .clone()
            .oneshot(upload_request(&uri, Some(user), body))
            .await
            .unwrap();
        assert_eq!(response.status(), expected, "{} as {}", uri, user);
        assert!(json_body(response).await["error"].is_string());
    }
}

fn form_part(name: &str, content_type: Option<&str>, data: &[u8]) -> Vec<u8> {
    let mut part = format!(
        "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}.bin\"\r\n",
        BOUNDARY, name, name
    )
    .into_bytes();
    if let Some(content_type) = content_type {
        part.extend_from_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
    }
    part.extend_from_slice(b"\r\n");
    part.extend_from_slice(data);
    part.extend_from_slice(b"\r\n");
    part
}

fn finish_form(mut parts: Vec<u8>) -> Vec<u8> {
    parts.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    parts
}

#[tokio::test]
async fn test_body_over_route_limit_is_413() {
    const MIB: usize = 1024 * 1024;
    let t = setup().await;
    let id = create_video(&t.app, "owner").await;
    let uri = format!("/api/thumbnail_upload/{}", id);

    // Thumbnail alone is under its own limit, the whole body is not
    let mut split = form_part("note", None, &vec![b'n'; 3 * MIB]);
    split.extend(form_part("thumbnail", Some("image/png"), &vec![0u8; 9 * MIB]));

    // The limit trips while an ignored field is skipped
    let mut leading = form_part("note", None, &vec![b'n'; 12 * MIB]);
    leading.extend(form_part("thumbnail", Some("image/png"), b"png"));

    for body in [finish_form(split), finish_form(leading)] {
        let response = t
            .app
            .clone()
            .oneshot(upload_request(&uri, Some("owner"), body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(json_body(response).await["error"].is_string());
    }

    let response = t
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/videos/{}", id))
                .header("Authorization", bearer("owner"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(json_body(response).await["thumbnail_url"].is_null());
}

#[tokio::test]
async fn test_list_and_get_are_scoped_to_owner() {
    let t = setup().await;
    let id = create_video(&t.app, "alice").await;
    create_video(&t.app, "alice").await;
    create_video(&t.app, "bob").await;

    let response = t
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/videos")
                .header("Authorization", bearer("alice"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await.as_array().unwrap().len(), 2);

    let response = t
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/videos/{}", id))
                .header("Authorization", bearer("bob"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_video_validates_title() {
    let t = setup().await;
    let response = t
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/videos")
                .header("Authorization", bearer("user-1"))
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"title": ""}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
