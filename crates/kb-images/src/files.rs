//! File-level operations: loading, encoding, in-place box-fit resizing and
//! base64 export.

use std::borrow::Cow;
use std::io::Cursor;
use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{ColorType, DynamicImage, ImageError, ImageReader};
use kb_core::{Error, Result};

use crate::downsize::{ensure_positive, fit_within, maybe_downsize, FILTER};
use crate::format::ImageFormatTag;

/// Map an `image` error raised while reading or decoding.
///
/// Running out of bytes mid-image means the data is malformed, not that the
/// filesystem failed.
pub(crate) fn decode_error(e: ImageError) -> Error {
    match e {
        ImageError::IoError(source) if source.kind() == std::io::ErrorKind::UnexpectedEof => {
            Error::Decode(source.to_string())
        }
        ImageError::IoError(source) => Error::Io { source },
        ImageError::Unsupported(u) => Error::UnsupportedFormat(u.to_string()),
        other => Error::Decode(other.to_string()),
    }
}

/// Map an `image` error raised while encoding.
fn encode_error(e: ImageError) -> Error {
    match e {
        ImageError::IoError(source) => Error::Io { source },
        ImageError::Unsupported(u) => Error::UnsupportedFormat(u.to_string()),
        other => Error::Internal(format!("image encoding failed: {other}")),
    }
}

/// Decode image bytes, detecting the format from the content.
pub(crate) fn decode_bytes(data: &[u8]) -> Result<(DynamicImage, ImageFormatTag)> {
    let detected = image::guess_format(data).map_err(decode_error)?;
    let tag = ImageFormatTag::from_image_format(detected)?;
    let img = image::load_from_memory_with_format(data, detected).map_err(decode_error)?;
    Ok((img, tag))
}

/// Load an image file together with the format it is encoded in on disk.
pub fn load_image(path: &Path) -> Result<(DynamicImage, ImageFormatTag)> {
    let data = std::fs::read(path)?;
    decode_bytes(&data)
}

/// Encode `image` into memory using `format`.
///
/// JPEG has no alpha channel, so images are flattened to RGB first; GIF is
/// written from RGBA.
pub fn encode_image(image: &DynamicImage, format: ImageFormatTag) -> Result<Vec<u8>> {
    let prepared: Cow<'_, DynamicImage> = match (format, image.color()) {
        (f, ColorType::L8 | ColorType::Rgb8) if !f.supports_alpha() => Cow::Borrowed(image),
        (f, _) if !f.supports_alpha() => Cow::Owned(DynamicImage::ImageRgb8(image.to_rgb8())),
        (ImageFormatTag::Gif, ColorType::Rgba8) => Cow::Borrowed(image),
        (ImageFormatTag::Gif, _) => Cow::Owned(DynamicImage::ImageRgba8(image.to_rgba8())),
        _ => Cow::Borrowed(image),
    };

    let mut buf = Cursor::new(Vec::new());
    prepared
        .write_to(&mut buf, format.image_format())
        .map_err(encode_error)?;
    Ok(buf.into_inner())
}

/// Shrink the image at `path` to fit inside `max_width` x `max_height`,
/// keeping its aspect ratio, and overwrite the file in place.
///
/// Only the header is read when the image already fits, and the file is left
/// exactly as it was. Returns whether the file was rewritten.
pub fn downsize_and_save(path: &Path, max_width: u32, max_height: u32) -> Result<bool> {
    ensure_positive("max_width", max_width)?;
    ensure_positive("max_height", max_height)?;
    let format = ImageFormatTag::from_path(path)?;

    // The header is sniffed from content, like `load_image`; the extension
    // only picks the output encoding.
    let (width, height) = ImageReader::open(path)?
        .with_guessed_format()?
        .into_dimensions()
        .map_err(decode_error)?;
    let Some((new_w, new_h)) = fit_within(width, height, max_width, max_height) else {
        tracing::debug!(path = %path.display(), width, height, "image already fits");
        return Ok(false);
    };

    let (img, _) = load_image(path)?;
    let resized = img.resize_exact(new_w, new_h, FILTER);
    let data = encode_image(&resized, format)?;
    std::fs::write(path, data)?;

    tracing::debug!(path = %path.display(), width, height, new_w, new_h, "downsized image in place");
    Ok(true)
}

/// Re-encode the image at `path` in its own format and return it as base64.
///
/// With `max_size` set, the image is first passed through
/// [`maybe_downsize`].
pub fn image_to_base64(path: &Path, max_size: Option<u32>) -> Result<String> {
    let (img, format) = load_image(path)?;
    let img = match max_size {
        Some(max_size) => maybe_downsize(img, max_size)?.1,
        None => img,
    };
    let data = encode_image(&img, format)?;
    Ok(STANDARD.encode(data))
}
