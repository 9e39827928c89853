use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use shared_database::{ClinicStore, MediaFile, MediaStorage};
use shared_models::clinic::GalleryImage;
use shared_utils::validation::non_empty;
use shared_utils::AppState;

use crate::models::{ClinicError, GalleryUploadRequest, GALLERY_FOLDER};

pub struct GalleryService {
    store: Arc<dyn ClinicStore>,
    media: Arc<dyn MediaStorage>,
}

impl GalleryService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
            media: state.media.clone(),
        }
    }

    pub async fn list_images(&self) -> Result<Vec<GalleryImage>, ClinicError> {
        Ok(self.store.list_gallery_images().await?)
    }

    pub async fn add_image(&self, request: GalleryUploadRequest) -> Result<GalleryImage, ClinicError> {
        let file = MediaFile::from_data_uri(&request.file)?;
        let stored = self.media.upload(file, GALLERY_FOLDER).await?;

        let image = self.store
            .insert_gallery_image(GalleryImage {
                id: Uuid::new_v4(),
                url: stored.url,
                public_id: stored.public_id,
                caption: non_empty(request.caption),
                category: non_empty(request.category),
                created_at: Utc::now(),
            })
            .await?;
        info!("Gallery image {} added", image.id);
        Ok(image)
    }

    /// Deletes the stored object first; the row goes only once that succeeds.
    pub async fn remove_image(&self, id: Uuid) -> Result<(), ClinicError> {
        let image = self.store.find_gallery_image(id).await?.ok_or(ClinicError::ImageNotFound)?;
        self.media.delete(&image.public_id).await?;
        self.store.delete_gallery_image(image.id).await?;
        info!("Gallery image {} removed", image.id);
        Ok(())
    }
}
