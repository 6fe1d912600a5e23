// Uploaded recipe images: format sniffing, file naming and disk storage

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};
use uuid::Uuid;

const RECIPE_UPLOAD_DIR: &str = "uploads/recipe";

/// Image formats accepted for upload, recognised by their leading bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    Webp,
    Bmp,
}

impl ImageFormat {
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [0xFF, 0xD8, 0xFF, ..] => Some(Self::Jpeg),
            [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => Some(Self::Png),
            [b'G', b'I', b'F', b'8', b'7' | b'9', b'a', ..] => Some(Self::Gif),
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some(Self::Webp),
            [b'B', b'M', ..] if bytes.len() > 26 => Some(Self::Bmp),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => ".jpg",
            Self::Png => ".png",
            Self::Gif => ".gif",
            Self::Webp => ".webp",
            Self::Bmp => ".bmp",
        }
    }
}

/// `uploads/recipe/<uuid><ext>`, the extension taken from the detected format.
/// The client's file name never reaches the disk.
pub fn recipe_image_file_path(format: ImageFormat) -> String {
    recipe_image_file_path_with(Uuid::new_v4(), format)
}

pub fn recipe_image_file_path_with(id: impl std::fmt::Display, format: ImageFormat) -> String {
    format!("{RECIPE_UPLOAD_DIR}/{id}{}", format.extension())
}

/// Files under the media root, addressed by root-relative paths
#[derive(Clone, Debug)]
pub struct MediaStorage {
    root: PathBuf,
    url: String,
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>, url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            url: url.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Public URL prefix the media root is served under
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Rejects anything that could escape the media root
    fn resolve(&self, relative: &str) -> Option<PathBuf> {
        let path: &Path = Path::new(relative);
        path.components()
            .all(|component: Component<'_>| matches!(component, Component::Normal(_)))
            .then(|| self.root.join(path))
    }

    /// Writes an already validated image and returns its media-relative path
    pub async fn save_recipe_image(&self, format: ImageFormat, bytes: &[u8]) -> Result<String> {
        let relative: String = recipe_image_file_path(format);

        let target: PathBuf = self
            .resolve(&relative)
            .with_context(|| format!("Refusing to write outside the media root: {relative}"))?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create media directory {}", parent.display()))?;
        }

        tokio::fs::write(&target, bytes)
            .await
            .with_context(|| format!("Failed to write image {}", target.display()))?;

        info!("Stored recipe image at {}", target.display());
        Ok(relative)
    }

    /// Best-effort removal; a missing file is not an error
    pub async fn remove(&self, relative: &str) {
        let Some(target) = self.resolve(relative) else {
            warn!("Ignoring removal of suspicious media path {}", relative);
            return;
        };

        match tokio::fs::remove_file(&target).await {
            Ok(()) => info!("Removed media file {}", target.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove media file {}: {}", target.display(), e),
        }
    }
}
