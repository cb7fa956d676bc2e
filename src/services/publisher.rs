use crate::config::AppConfig;
use crate::services::ingest::IngestError;
use crate::services::media_validator::{AssetClass, MediaDescriptor};
use crate::services::storage::StorageService;
use anyhow::Result;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

const TOKEN_BYTES: usize = 32;

/// Storage key of one published asset version
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetKey(String);

impl AssetKey {
    /// Fresh `[<prefix>/]<token><ext>` key
    pub fn generate(descriptor: &MediaDescriptor, prefix: Option<&str>) -> Self {
        let name = format!("{}{}", random_token(), descriptor.extension());
        match prefix {
            Some(prefix) => Self(format!("{}/{}", prefix, name)),
            None => Self(name),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 32 random bytes, URL-safe base64 without padding
pub fn random_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[derive(Debug, Clone)]
pub struct PublishedAsset {
    pub key: AssetKey,
    pub url: String,
    pub class: AssetClass,
}

/// Copies final staged files into durable storage and builds their public URLs.
///
/// Images go to the local asset store and resolve under `<assets_base_url>/assets/`;
/// videos go to object storage and resolve under the configured video base URL.
pub struct AssetPublisher {
    assets: Arc<dyn StorageService>,
    objects: Arc<dyn StorageService>,
    assets_base_url: String,
    video_base_url: String,
}

impl AssetPublisher {
    pub fn new(
        assets: Arc<dyn StorageService>,
        objects: Arc<dyn StorageService>,
        config: &AppConfig,
    ) -> Self {
        Self {
            assets,
            objects,
            assets_base_url: config.assets_base_url.trim_end_matches('/').to_string(),
            video_base_url: config.video_base_url().trim_end_matches('/').to_string(),
        }
    }

    fn store_for(&self, class: AssetClass) -> &Arc<dyn StorageService> {
        match class {
            AssetClass::Image => &self.assets,
            AssetClass::Video => &self.objects,
        }
    }

    fn assets_prefix(&self) -> String {
        format!("{}/assets/", self.assets_base_url)
    }

    pub fn url_for(&self, class: AssetClass, key: &AssetKey) -> String {
        match class {
            AssetClass::Image => format!("{}{}", self.assets_prefix(), key),
            AssetClass::Video => format!("{}/{}", self.video_base_url, key),
        }
    }

    /// Stores `path` under a freshly generated key; one new object per call
    pub async fn publish(
        &self,
        path: &Path,
        descriptor: &MediaDescriptor,
        key_prefix: Option<&str>,
    ) -> Result<PublishedAsset, IngestError> {
        let class = descriptor.class();
        let key = AssetKey::generate(descriptor, key_prefix);

        self.store_for(class)
            .upload_path(key.as_str(), path, descriptor.mime_type())
            .await
            .map_err(IngestError::PublishFailure)?;

        let url = self.url_for(class, &key);
        tracing::info!("Published {} asset {}", class, key);
        Ok(PublishedAsset { key, url, class })
    }

    /// Key of a thumbnail previously published by this deployment, if `url` is one
    pub fn thumbnail_key_from_url(&self, url: &str) -> Option<String> {
        let key = url.strip_prefix(&self.assets_prefix())?;
        let is_plain_name = !key.is_empty()
            && !key.contains(['/', '\\', '?', '#'])
            && key != "."
            && key != "..";
        is_plain_name.then(|| key.to_string())
    }

    pub async fn remove_thumbnail(&self, key: &str) -> Result<()> {
        self.assets.delete_file(key).await
    }

    /// Deletes an asset published earlier in the same request
    pub async fn retract(&self, asset: &PublishedAsset) -> Result<()> {
        self.store_for(asset.class).delete_file(asset.key.as_str()).await
    }
}
