use anyhow::Context;
use async_trait::async_trait;
use base64ct::{Base64, Encoding};
use bytes::Bytes;
use std::path::PathBuf;
use time::OffsetDateTime;
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

pub const AVATAR_URL_PATH: &str = "/media/avatars";

#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn put_object(&self, filename: &str, body: Bytes) -> anyhow::Result<()>;
    async fn delete_object(&self, filename: &str) -> anyhow::Result<()>;
}

/// Local-filesystem media store; avatars live in a flat directory.
#[derive(Clone)]
pub struct FsMediaStore {
    root: PathBuf,
}

impl FsMediaStore {
    pub async fn new(root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .with_context(|| format!("create media dir {}", root.display()))?;
        Ok(Self { root })
    }
}

#[async_trait]
impl MediaStore for FsMediaStore {
    async fn put_object(&self, filename: &str, body: Bytes) -> anyhow::Result<()> {
        let path = self.root.join(filename);
        tokio::fs::write(&path, &body)
            .await
            .with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    async fn delete_object(&self, filename: &str) -> anyhow::Result<()> {
        let path = self.root.join(filename);
        tokio::fs::remove_file(&path)
            .await
            .with_context(|| format!("remove {}", path.display()))?;
        Ok(())
    }
}

pub struct DecodedImage {
    pub bytes: Bytes,
    pub ext: &'static str,
}

/// True for `data:<mime>;base64,<payload>` style values; everything else is
/// treated as an already-stored reference and left untouched.
pub fn is_data_uri(value: &str) -> bool {
    value.starts_with("data:") && value.contains(";base64,")
}

pub fn decode_data_uri(payload: &str) -> Option<DecodedImage> {
    let (head, b64) = payload.split_once(";base64,")?;
    let mime = head.strip_prefix("data:")?;
    let ext = ext_from_mime(mime)?;
    let bytes = Base64::decode_vec(b64).ok()?;
    Some(DecodedImage {
        bytes: Bytes::from(bytes),
        ext,
    })
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// Decodes an uploaded avatar and stores it under a nanosecond-stamped
/// filename, returning the public URL persisted on the user record.
pub async fn save_avatar(st: &AppState, payload: &str) -> Result<String, ApiError> {
    let img = decode_data_uri(payload)
        .ok_or_else(|| ApiError::Validation("invalid profile image data".into()))?;
    let filename = format!(
        "{}.{}",
        OffsetDateTime::now_utc().unix_timestamp_nanos(),
        img.ext
    );
    st.media
        .put_object(&filename, img.bytes)
        .await
        .map_err(ApiError::AvatarSave)?;
    debug!(filename = %filename, "avatar stored");
    Ok(format!(
        "{}{}/{}",
        st.config.public_base_url, AVATAR_URL_PATH, filename
    ))
}

/// Removes a previously stored avatar. Only URLs under our avatar path are
/// touched; external references are skipped.
pub async fn delete_avatar(st: &AppState, image_url: &str) -> Result<(), ApiError> {
    let Some(filename) = stored_filename(image_url) else {
        return Ok(());
    };
    st.media
        .delete_object(filename)
        .await
        .map_err(ApiError::AvatarCleanup)
}

fn stored_filename(image_url: &str) -> Option<&str> {
    let (_, rest) = image_url.split_once(AVATAR_URL_PATH)?;
    rest.strip_prefix('/').filter(|f| !f.is_empty())
}
