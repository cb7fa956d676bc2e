use crate::config::AppConfig;
use crate::services::storage::{LocalStorageService, S3StorageService};
use aws_sdk_s3::config::{Credentials, Region};
use std::env;
use std::sync::Arc;
use tracing::info;

/// S3 client for published videos; creates the bucket when it is missing
pub async fn setup_object_storage(config: &AppConfig) -> Arc<S3StorageService> {
    let bucket = config.s3_bucket.clone();

    let mut loader = aws_config::from_env().region(Region::new(config.s3_region.clone()));

    if let Some(endpoint) = &config.s3_endpoint {
        info!("☁️  S3 Storage: {} (Bucket: {})", endpoint, bucket);
        loader = loader.endpoint_url(endpoint);
    } else {
        info!("☁️  S3 Storage: AWS {} (Bucket: {})", config.s3_region, bucket);
    }

    if let (Ok(access_key), Ok(secret_key)) =
        (env::var("S3_ACCESS_KEY"), env::var("S3_SECRET_KEY"))
    {
        loader = loader.credentials_provider(Credentials::new(
            access_key, secret_key, None, None, "static",
        ));
    }

    let aws_config = loader.load().await;

    let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
        .force_path_style(config.s3_endpoint.is_some())
        .build();

    let s3_client = aws_sdk_s3::Client::from_conf(s3_config);

    match s3_client.head_bucket().bucket(&bucket).send().await {
        Ok(_) => info!("✅ Bucket '{}' is ready", bucket),
        Err(_) => {
            info!("🪣 Bucket '{}' not found, creating...", bucket);
            if let Err(e) = s3_client.create_bucket().bucket(&bucket).send().await {
                tracing::error!("❌ Failed to create bucket '{}': {}", bucket, e);
            } else {
                info!("✅ Bucket '{}' created successfully", bucket);
            }
        }
    }

    Arc::new(S3StorageService::new(s3_client, bucket))
}

/// Local thumbnail store plus the staging directory
pub async fn setup_asset_storage(config: &AppConfig) -> anyhow::Result<Arc<LocalStorageService>> {
    let assets = LocalStorageService::new(&config.assets_root);
    assets.ensure_root().await?;
    tokio::fs::create_dir_all(&config.staging_dir).await?;

    info!(
        "🖼️  Assets: {} served at {}/assets (staging in {})",
        assets.root().display(),
        config.assets_base_url,
        config.staging_dir.display()
    );

    Ok(Arc::new(assets))
}
