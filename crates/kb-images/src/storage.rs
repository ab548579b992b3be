//! Filesystem-level image storage.
//!
//! Images live under `{base_dir}/{name}` where `name` is a storage-relative
//! path such as `avatars/logo_<uuid>.png`. The encoding format is always
//! derived from the name's extension.

use std::path::{Component, Path, PathBuf};

use image::{DynamicImage, GenericImageView};
use kb_core::{Error, Result};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::downsize::maybe_downsize;
use crate::files::{decode_bytes, encode_image};
use crate::format::ImageFormatTag;

/// Metadata about a stored image file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    /// Content hash (first 16 hex chars of SHA-256) of the written bytes.
    pub hash: String,
    /// Width of the stored image in pixels.
    pub width: u32,
    /// Height of the stored image in pixels.
    pub height: u32,
    /// Path relative to the storage base directory.
    pub path: String,
}

/// Filesystem manager for image storage.
#[derive(Debug, Clone)]
pub struct ImageStorage {
    base_dir: PathBuf,
}

impl ImageStorage {
    /// Create a new `ImageStorage` with the given base directory.
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Build a collision-free upload name: `{dir}/{stem}_{uuid}.{ext}`.
    pub fn upload_path(dir: &str, file_name: &str) -> String {
        let file = Path::new(file_name);
        let stem = file
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("file");
        let unique = match file.extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{stem}_{}.{ext}", Uuid::new_v4()),
            None => format!("{stem}_{}", Uuid::new_v4()),
        };

        let dir = dir.trim_end_matches('/');
        if dir.is_empty() {
            unique
        } else {
            format!("{dir}/{unique}")
        }
    }

    /// Absolute path of a stored image.
    pub fn path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }

    /// Encode `image` in the format implied by `name` and write it,
    /// replacing any existing file.
    pub fn save(&self, name: &str, image: &DynamicImage) -> Result<StoredImage> {
        let path = self.checked_path(name)?;
        let format = ImageFormatTag::from_path(&path)?;
        let data = encode_image(image, format)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, &data)?;

        let (width, height) = image.dimensions();
        tracing::debug!(name, %format, width, height, "stored image");

        Ok(StoredImage {
            hash: compute_hash(&data),
            width,
            height,
            path: name.to_string(),
        })
    }

    /// Decode raw bytes, optionally bound the longer side by `max_size`, then
    /// [`save`](Self::save) the result.
    pub fn save_bytes(&self, name: &str, data: &[u8], max_size: Option<u32>) -> Result<StoredImage> {
        let (img, _) = decode_bytes(data)?;
        let img = match max_size {
            Some(max_size) => maybe_downsize(img, max_size)?.1,
            None => img,
        };
        self.save(name, &img)
    }

    /// Read the raw bytes of a stored image.
    pub fn read(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.checked_path(name)?;
        match std::fs::read(&path) {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::not_found("image", name))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a stored image. Returns false if it did not exist.
    pub fn delete(&self, name: &str) -> Result<bool> {
        let path = self.checked_path(name)?;
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&path)?;
        Ok(true)
    }

    /// Resolve `name` under the base directory, refusing anything that
    /// could escape it.
    fn checked_path(&self, name: &str) -> Result<PathBuf> {
        let rel = Path::new(name);
        let escapes = rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if name.is_empty() || escapes {
            return Err(Error::Validation(format!("invalid storage name '{name}'")));
        }
        Ok(self.base_dir.join(rel))
    }
}

/// Compute the content hash for image data.
///
/// Returns the first 16 hex characters of the SHA-256 digest.
fn compute_hash(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    hex::encode(&digest[..8])
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn red(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([255, 0, 0])))
    }

    #[test]
    fn compute_hash_is_stable() {
        assert_eq!(compute_hash(b"same"), compute_hash(b"same"));
        assert_ne!(compute_hash(b"data1"), compute_hash(b"data2"));
        assert_eq!(compute_hash(b"x").len(), 16);
    }

    #[test]
    fn upload_path_is_unique() {
        let a = ImageStorage::upload_path("avatars", "github-logo.png");
        let b = ImageStorage::upload_path("avatars/", "github-logo.png");
        assert_ne!(a, b);
        assert!(a.starts_with("avatars/github-logo_"));
        assert!(a.ends_with(".png"));
        // stem + '_' + 36-char uuid + ".png"
        assert_eq!(a.len(), "avatars/github-logo_".len() + 36 + ".png".len());
    }

    #[test]
    fn upload_path_without_extension_or_dir() {
        let name = ImageStorage::upload_path("", "README");
        assert!(name.starts_with("README_"));
        assert!(!name.contains('/'));
        assert!(!name.contains('.'));
    }

    #[test]
    fn save_read_delete() {
        let dir = tempfile::tempdir().unwrap();
        let storage = ImageStorage::new(dir.path().to_path_buf());

        let stored = storage.save("nested/red.png", &red(4, 3)).unwrap();
        assert_eq!((stored.width, stored.height), (4, 3));
        assert_eq!(stored.path, "nested/red.png");
        assert_eq!(stored.hash.len(), 16);

        let bytes = storage.read("nested/red.png").unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), image::ImageFormat::Png);
        assert_eq!(stored.hash, compute_hash(&bytes));

        assert!(storage.delete("nested/red.png").unwrap());
        assert!(!storage.delete("nested/red.png").unwrap());
        assert!(matches!(
            storage.read("nested/red.png").unwrap_err(),
            Error::NotFound { .. }
        ));
    }

    #[test]
    fn save_overrides_existing_image() {
        let dir = tempfile::tempdir().unwrap();
        let storage = ImageStorage::new(dir.path().to_path_buf());
        storage.save("logo.jpg", &red(64, 64)).unwrap();
        let replaced = storage.save("logo.jpg", &red(8, 8)).unwrap();
        assert_eq!(replaced.width, 8);
        assert_eq!(image::image_dimensions(storage.path("logo.jpg")).unwrap(), (8, 8));
    }

    #[test]
    fn save_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let storage = ImageStorage::new(dir.path().to_path_buf());
        let err = storage.save("red.webp", &red(2, 2)).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn names_cannot_escape_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        let storage = ImageStorage::new(dir.path().join("images"));
        for name in ["../red.png", "/etc/red.png", ""] {
            let err = storage.save(name, &red(2, 2)).unwrap_err();
            assert!(matches!(err, Error::Validation(_)), "{name}");
        }
    }

    #[test]
    fn save_bytes_downsizes() {
        let dir = tempfile::tempdir().unwrap();
        let storage = ImageStorage::new(dir.path().to_path_buf());
        let png = encode_image(&red(300, 150), ImageFormatTag::Png).unwrap();

        let stored = storage.save_bytes("small.gif", &png, Some(100)).unwrap();
        assert_eq!((stored.width, stored.height), (100, 50));
        let (_, format) = decode_bytes(&storage.read("small.gif").unwrap()).unwrap();
        assert_eq!(format, ImageFormatTag::Gif);

        let stored = storage.save_bytes("full.png", &png, None).unwrap();
        assert_eq!((stored.width, stored.height), (300, 150));
    }
}
