//! Avatar service coordinating image storage and user records.
//!
//! Uploaded avatars are bounded by the configured thumbnail ceiling, stored
//! under a unique name in `avatars/`, and linked to the user row.

use anyhow::{Context, Result};
use kb_core::config::ImageConfig;
use kb_core::UserId;
use kb_db::models::UserUpdate;
use kb_db::pool::{get_conn, DbPool};
use kb_db::queries::users;
use kb_images::{image_to_base64, ImageStorage, StoredImage};

/// Storage directory for avatar uploads.
pub const AVATAR_DIR: &str = "avatars";

/// High-level service that coordinates filesystem storage with user records.
pub struct AvatarService {
    storage: ImageStorage,
    pool: DbPool,
    max_size: u32,
}

impl AvatarService {
    /// Create a new `AvatarService`.
    ///
    /// # Arguments
    ///
    /// * `storage` - The filesystem image storage backend
    /// * `pool` - Database connection pool
    /// * `max_size` - Ceiling for the longer side of stored avatars
    pub fn new(storage: ImageStorage, pool: DbPool, max_size: u32) -> Self {
        Self {
            storage,
            pool,
            max_size,
        }
    }

    /// Build the service from the `images` config section.
    pub fn from_config(config: &ImageConfig, pool: DbPool) -> Self {
        Self::new(
            ImageStorage::new(config.storage_dir.clone()),
            pool,
            config.max_size,
        )
    }

    pub fn storage(&self) -> &ImageStorage {
        &self.storage
    }

    /// Store a new avatar for a user and record it.
    ///
    /// The previous avatar file, if any, is removed once the user row points
    /// at the new one.
    ///
    /// # Arguments
    ///
    /// * `user_id` - The user receiving the avatar
    /// * `file_name` - Original upload name; its extension picks the format
    /// * `data` - Raw image bytes
    pub fn set_avatar(&self, user_id: UserId, file_name: &str, data: &[u8]) -> Result<StoredImage> {
        let conn = get_conn(&self.pool).context("Failed to get database connection")?;

        let user = users::get_user(&conn, user_id)
            .context("Failed to query user from database")?
            .ok_or_else(|| kb_core::Error::not_found("user", user_id))?;

        let name = ImageStorage::upload_path(AVATAR_DIR, file_name);
        let stored = self
            .storage
            .save_bytes(&name, data, Some(self.max_size))
            .context("Failed to store avatar image")?;

        let update = UserUpdate {
            avatar: Some(Some(name.clone())),
            ..Default::default()
        };
        if let Err(e) = users::update_user(&conn, user_id, &update) {
            if let Err(cleanup) = self.storage.delete(&name) {
                tracing::warn!("Failed to remove orphaned avatar {}: {}", name, cleanup);
            }
            return Err(e).context("Failed to record avatar on user");
        }

        if let Some(previous) = user.avatar {
            if let Err(e) = self.storage.delete(&previous) {
                tracing::warn!("Failed to remove previous avatar {}: {}", previous, e);
            }
        }

        tracing::info!(
            %user_id,
            path = %stored.path,
            width = stored.width,
            height = stored.height,
            "stored avatar"
        );
        Ok(stored)
    }

    /// Return the user's avatar as base64, or `None` if no avatar is set.
    pub fn avatar_base64(&self, user_id: UserId) -> Result<Option<String>> {
        let conn = get_conn(&self.pool).context("Failed to get database connection")?;
        let user = users::get_user(&conn, user_id)
            .context("Failed to query user from database")?
            .ok_or_else(|| kb_core::Error::not_found("user", user_id))?;

        let Some(name) = user.avatar else {
            return Ok(None);
        };
        let encoded = image_to_base64(&self.storage.path(&name), None)
            .with_context(|| format!("Failed to encode avatar {}", name))?;
        Ok(Some(encoded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};
    use kb_db::pool::init_memory_pool;
    use kb_images::{encode_image, ImageFormatTag};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::new(width, height));
        encode_image(&img, ImageFormatTag::Png).unwrap()
    }

    fn service(dir: &std::path::Path, max_size: u32) -> AvatarService {
        let pool = init_memory_pool().unwrap();
        AvatarService::new(ImageStorage::new(dir.to_path_buf()), pool, max_size)
    }

    #[test]
    fn set_avatar_downsizes_and_records() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path(), 64);
        let conn = get_conn(&svc.pool).unwrap();
        let user = users::create_user(&conn, "John", "Doe").unwrap();

        let stored = svc.set_avatar(user.id, "github-logo.png", &png_bytes(512, 256)).unwrap();
        assert_eq!((stored.width, stored.height), (64, 32));
        assert!(stored.path.starts_with("avatars/github-logo_"));

        let user = users::get_user(&conn, user.id).unwrap().unwrap();
        assert_eq!(user.avatar.as_deref(), Some(stored.path.as_str()));
        assert!(svc.storage().path(&stored.path).exists());
    }

    #[test]
    fn replacing_avatar_removes_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path(), 64);
        let conn = get_conn(&svc.pool).unwrap();
        let user = users::create_user(&conn, "John", "Doe").unwrap();

        let first = svc.set_avatar(user.id, "a.png", &png_bytes(8, 8)).unwrap();
        let second = svc.set_avatar(user.id, "b.jpg", &png_bytes(8, 8)).unwrap();
        assert!(!svc.storage().path(&first.path).exists());
        assert!(svc.storage().path(&second.path).exists());
    }

    #[test]
    fn set_avatar_unknown_user() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path(), 64);
        let err = svc.set_avatar(UserId::new(), "a.png", &png_bytes(8, 8)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<kb_core::Error>(),
            Some(kb_core::Error::NotFound { .. })
        ));
    }

    #[test]
    fn avatar_base64_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path(), 64);
        let conn = get_conn(&svc.pool).unwrap();
        let user = users::create_user(&conn, "John", "Doe").unwrap();

        assert!(svc.avatar_base64(user.id).unwrap().is_none());
        svc.set_avatar(user.id, "a.png", &png_bytes(8, 8)).unwrap();
        let encoded = svc.avatar_base64(user.id).unwrap().unwrap();
        assert!(!encoded.is_empty());
    }
}
