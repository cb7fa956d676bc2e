use crate::services::ingest::IngestError;
use std::fmt;

/// Kind of asset an upload is destined to become
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetClass {
    Image,
    Video,
}

impl AssetClass {
    /// Exact MIME essences accepted for this class
    pub fn allowed_types(self) -> &'static [&'static str] {
        match self {
            AssetClass::Image => &["image/png", "image/jpeg"],
            AssetClass::Video => &["video/mp4"],
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetClass::Image => write!(f, "image"),
            AssetClass::Video => write!(f, "video"),
        }
    }
}

/// Validated media type of an upload, derived once from its declared content type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaDescriptor {
    mime_type: String,
    extension: String,
    class: AssetClass,
}

impl MediaDescriptor {
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Storage extension including the leading dot, e.g. `.jpeg`
    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn class(&self) -> AssetClass {
        self.class
    }
}

/// Checks a declared content type against the allow-list of `class`.
///
/// Parameters such as `charset` are ignored. Missing or unparsable values are
/// rejected, never guessed.
pub fn validate(
    declared_content_type: Option<&str>,
    class: AssetClass,
) -> Result<MediaDescriptor, IngestError> {
    let declared = declared_content_type
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| IngestError::UnsupportedMediaType("missing content type".to_string()))?;

    let parsed: mime::Mime = declared
        .parse()
        .map_err(|_| IngestError::UnsupportedMediaType(declared.to_string()))?;

    let essence = parsed.essence_str().to_ascii_lowercase();
    if !class.allowed_types().contains(&essence.as_str()) {
        tracing::debug!("Rejected {} upload declared as '{}'", class, declared);
        return Err(IngestError::UnsupportedMediaType(essence));
    }

    Ok(MediaDescriptor {
        extension: format!(".{}", parsed.subtype().as_str().to_ascii_lowercase()),
        mime_type: essence,
        class,
    })
}
