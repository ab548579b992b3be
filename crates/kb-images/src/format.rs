//! Mapping between file extensions, `image` formats and the formats kitbag
//! knows how to write back.

use std::fmt;
use std::path::Path;

use image::ImageFormat;
use kb_core::{Error, Result};

/// Encoding formats an image can be stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormatTag {
    Jpeg,
    Png,
    Gif,
    Tiff,
}

impl ImageFormatTag {
    /// Map a file extension (case-insensitive, leading dot optional).
    pub fn from_extension(ext: &str) -> Result<Self> {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            "gif" => Ok(Self::Gif),
            "tif" | "tiff" => Ok(Self::Tiff),
            _ => Err(Error::UnsupportedFormat(format!(
                "no image format for extension '{ext}'"
            ))),
        }
    }

    /// Map the extension of `path`.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| {
                Error::UnsupportedFormat(format!("{} has no file extension", path.display()))
            })?;
        Self::from_extension(ext)
    }

    /// Map a format detected by the `image` crate.
    pub fn from_image_format(format: ImageFormat) -> Result<Self> {
        match format {
            ImageFormat::Jpeg => Ok(Self::Jpeg),
            ImageFormat::Png => Ok(Self::Png),
            ImageFormat::Gif => Ok(Self::Gif),
            ImageFormat::Tiff => Ok(Self::Tiff),
            other => Err(Error::UnsupportedFormat(format!("{other:?}"))),
        }
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Png => ImageFormat::Png,
            Self::Gif => ImageFormat::Gif,
            Self::Tiff => ImageFormat::Tiff,
        }
    }

    /// Returns true if the format can carry an alpha channel.
    pub fn supports_alpha(self) -> bool {
        !matches!(self, Self::Jpeg)
    }
}

impl fmt::Display for ImageFormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Jpeg => "JPEG",
            Self::Png => "PNG",
            Self::Gif => "GIF",
            Self::Tiff => "TIFF",
        };
        f.write_str(s)
    }
}
