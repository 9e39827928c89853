use std::collections::HashMap;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, error};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::supabase::SupabaseClient;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Invalid file: {0}")]
    InvalidFile(String),

    #[error("Media upload failed: {0}")]
    Upload(String),

    #[error("Media delete failed: {0}")]
    Delete(String),
}

impl From<MediaError> for AppError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::InvalidFile(msg) => AppError::ValidationError(msg),
            other => AppError::ExternalService(other.to_string()),
        }
    }
}

/// Decoded upload payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl MediaFile {
    /// Accepts `data:<mime>;base64,<payload>` or a bare base64 payload.
    pub fn from_data_uri(data: &str) -> Result<Self, MediaError> {
        let (content_type, payload) = match data.strip_prefix("data:") {
            Some(rest) => {
                let (meta, payload) = rest
                    .split_once(',')
                    .ok_or_else(|| MediaError::InvalidFile("Malformed data URI".to_string()))?;
                let mime = meta
                    .strip_suffix(";base64")
                    .ok_or_else(|| MediaError::InvalidFile("Data URI must be base64 encoded".to_string()))?;
                (mime.to_string(), payload)
            }
            None => ("application/octet-stream".to_string(), data),
        };

        let bytes = BASE64
            .decode(payload.trim())
            .map_err(|e| MediaError::InvalidFile(format!("Invalid base64 payload: {}", e)))?;
        if bytes.is_empty() {
            return Err(MediaError::InvalidFile("File is empty".to_string()));
        }

        Ok(Self { bytes, content_type })
    }

    pub fn extension(&self) -> &'static str {
        match self.content_type.as_str() {
            "image/png" => "png",
            "image/jpeg" | "image/jpg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            "application/pdf" => "pdf",
            _ => "bin",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMedia {
    pub url: String,
    pub public_id: String,
}

#[async_trait]
pub trait MediaStorage: Send + Sync {
    async fn upload(&self, file: MediaFile, folder: &str) -> Result<StoredMedia, MediaError>;
    async fn delete(&self, public_id: &str) -> Result<(), MediaError>;
}

fn object_path(file: &MediaFile, folder: &str) -> String {
    format!("{}/{}.{}", folder.trim_matches('/'), Uuid::new_v4(), file.extension())
}

/// Objects in a public Supabase Storage bucket.
pub struct SupabaseMediaStorage {
    supabase: SupabaseClient,
    bucket: String,
}

impl SupabaseMediaStorage {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            bucket: config.storage_bucket.clone(),
        }
    }
}

#[async_trait]
impl MediaStorage for SupabaseMediaStorage {
    async fn upload(&self, file: MediaFile, folder: &str) -> Result<StoredMedia, MediaError> {
        let public_id = object_path(&file, folder);
        debug!("Uploading {} bytes to {}/{}", file.bytes.len(), self.bucket, public_id);

        self.supabase
            .upload_object(&self.bucket, &public_id, file.bytes, &file.content_type)
            .await
            .map_err(|e| {
                error!("Storage upload failed: {}", e);
                MediaError::Upload(e.to_string())
            })?;

        Ok(StoredMedia {
            url: self.supabase.get_public_url(&self.bucket, &public_id),
            public_id,
        })
    }

    async fn delete(&self, public_id: &str) -> Result<(), MediaError> {
        self.supabase
            .delete_object(&self.bucket, public_id)
            .await
            .map_err(|e| MediaError::Delete(e.to_string()))
    }
}

/// Keeps uploads in memory; used with the in-memory store and in tests.
#[derive(Debug, Default)]
pub struct InMemoryMediaStorage {
    objects: RwLock<HashMap<String, MediaFile>>,
}

impl InMemoryMediaStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contains(&self, public_id: &str) -> bool {
        self.objects.read().await.contains_key(public_id)
    }
}

#[async_trait]
impl MediaStorage for InMemoryMediaStorage {
    async fn upload(&self, file: MediaFile, folder: &str) -> Result<StoredMedia, MediaError> {
        let public_id = object_path(&file, folder);
        self.objects.write().await.insert(public_id.clone(), file);
        Ok(StoredMedia {
            url: format!("memory://{}", public_id),
            public_id,
        })
    }

    async fn delete(&self, public_id: &str) -> Result<(), MediaError> {
        self.objects
            .write()
            .await
            .remove(public_id)
            .map(|_| ())
            .ok_or_else(|| MediaError::Delete(format!("No object {}", public_id)))
    }
}
