//! # kb-images
//!
//! Image downsizing helpers built on the `image` crate.
//!
//! Two resize semantics are exposed side by side:
//!
//! - [`maybe_downsize`] bounds the *longer* side of an in-memory image by a
//!   single `max_size`, scaling the shorter side by the same ratio.
//! - [`downsize_and_save`] fits an image file inside a `max_width` x
//!   `max_height` box and rewrites it in place, leaving files that already
//!   fit byte-for-byte untouched.
//!
//! ## Quick start
//!
//! ```no_run
//! use kb_images::{downsize_and_save, image_to_base64};
//! use std::path::Path;
//!
//! let changed = downsize_and_save(Path::new("logo.png"), 100, 100).unwrap();
//! let encoded = image_to_base64(Path::new("logo.png"), Some(64)).unwrap();
//! println!("resized: {changed}, {} base64 chars", encoded.len());
//! ```

pub mod downsize;
pub mod files;
pub mod format;
pub mod storage;

// Re-export key items at crate root for convenience.
pub use downsize::{fit_within, maybe_downsize, scaled_dimensions};
pub use files::{downsize_and_save, encode_image, image_to_base64, load_image};
pub use format::ImageFormatTag;
pub use storage::{ImageStorage, StoredImage};
