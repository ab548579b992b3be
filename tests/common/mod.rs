//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which creates an in-memory DB, a scratch image
//! directory and an [`AvatarService`] wired to both, plus fixture helpers
//! for writing images and hashing files.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use image::{DynamicImage, Rgba, RgbaImage};
use kb_db::pool::{init_memory_pool, DbPool};
use kb_images::{encode_image, ImageFormatTag, ImageStorage};
use kitbag::images::AvatarService;
use sha2::{Digest, Sha256};
use tempfile::TempDir;

/// Test harness wrapping an in-memory database and a temporary image
/// directory.
pub struct TestHarness {
    pub db: DbPool,
    pub dir: TempDir,
}

impl TestHarness {
    pub fn new() -> Self {
        Self {
            db: init_memory_pool().expect("failed to create in-memory pool"),
            dir: tempfile::tempdir().expect("failed to create temp dir"),
        }
    }

    /// Get a database connection from the pool.
    pub fn conn(&self) -> kb_db::pool::PooledConnection {
        kb_db::pool::get_conn(&self.db).expect("failed to get db connection")
    }

    /// An avatar service storing under `{dir}/images`.
    pub fn avatars(&self, max_size: u32) -> AvatarService {
        let storage = ImageStorage::new(self.dir.path().join("images"));
        AvatarService::new(storage, self.db.clone(), max_size)
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

/// A deterministic RGBA gradient.
pub fn gradient(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, ((x * y) % 256) as u8, 255])
    }))
}

/// Write a gradient image to `path`, encoded per its extension.
pub fn write_image(path: &Path, width: u32, height: u32) {
    let format = ImageFormatTag::from_path(path).expect("fixture extension");
    let data = encode_image(&gradient(width, height), format).expect("encode fixture");
    std::fs::write(path, data).expect("write fixture");
}

/// SHA-256 of a file's contents as hex.
pub fn file_hash(path: &Path) -> String {
    let data = std::fs::read(path).expect("read file");
    hex::encode(Sha256::digest(&data))
}
