use clap::{Parser, ValueEnum};
use dotenvy::dotenv;
use rust_media_backend::config::AppConfig;
use rust_media_backend::infrastructure::{database, media, storage};
use rust_media_backend::services::ingest::IngestService;
use rust_media_backend::services::publisher::AssetPublisher;
use rust_media_backend::services::video_store::SeaOrmVideoStore;
use rust_media_backend::{AppState, create_app};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Profile {
    /// Read everything from the environment
    Env,
    /// Local MinIO endpoint, no media tool timeout
    Development,
    /// Like `env`, but JWT_SECRET is mandatory
    Production,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration preset
    #[arg(long, value_enum, default_value = "env")]
    profile: Profile,

    /// Port for the API server (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment & logging
    dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rust_media_backend=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = match args.profile {
        Profile::Env => AppConfig::from_env(),
        Profile::Development => AppConfig::development(),
        Profile::Production => AppConfig::production(),
    };
    if let Some(port) = args.port {
        if std::env::var("ASSETS_BASE_URL").is_err() {
            config.assets_base_url = format!("http://localhost:{}", port);
        }
        config.port = port;
    }

    info!("🚀 Starting Rust Media Backend [Profile: {:?}]...", args.profile);
    info!(
        "🛡️  Limits: thumbnail={}MB, video={}MB, tool timeout={:?}",
        config.max_thumbnail_size / 1024 / 1024,
        config.max_video_size / 1024 / 1024,
        config.media_tool_timeout()
    );

    // 2. Infrastructure
    let db = database::setup_database().await?;
    let assets = storage::setup_asset_storage(&config).await?;
    let objects = storage::setup_object_storage(&config).await;
    let media_tool = media::setup_media_tool(&config).await;

    // 3. Services
    let videos = Arc::new(SeaOrmVideoStore::new(db));
    let publisher = AssetPublisher::new(assets, objects.clone(), &config);
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
        config: config.clone(),
    };

    // 4. HTTP server
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &axum::http::Request<_>| {
            let request_id = request
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("unknown");
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id,
            )
        })
        .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
            info!("📥 {} {}", request.method(), request.uri());
        })
        .on_response(
            |response: &axum::http::Response<_>,
             latency: std::time::Duration,
             _span: &tracing::Span| {
                info!(
                    "📤 Finished in {:?} with status {}",
                    latency,
                    response.status()
                );
            },
        );

    let app = create_app(state).layer(trace_layer);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("✅ API Server listening on: http://0.0.0.0:{}", config.port);
    info!("📖 Swagger UI documentation: http://localhost:{}/swagger-ui", config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Backend exited cleanly.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("⌨️  Ctrl+C received, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("💤 SIGTERM received, initiating graceful shutdown...");
        },
    }
}
