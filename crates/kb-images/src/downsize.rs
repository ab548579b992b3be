//! Dimension math and in-memory downsizing.

use std::cmp::Ordering;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use kb_core::{Error, Result};

/// Resampling filter used for every downsize.
pub(crate) const FILTER: FilterType = FilterType::Lanczos3;

/// Divide `num` by `den`, rounding ties to the even neighbour.
fn div_round_half_even(num: u64, den: u64) -> u64 {
    let q = num / den;
    let r = num % den;
    match (2 * r).cmp(&den) {
        Ordering::Less => q,
        Ordering::Greater => q + 1,
        Ordering::Equal if q % 2 == 0 => q,
        Ordering::Equal => q + 1,
    }
}

pub(crate) fn ensure_positive(name: &str, value: u32) -> Result<()> {
    if value == 0 {
        return Err(Error::Validation(format!("{name} must be a positive integer")));
    }
    Ok(())
}

/// Target dimensions for bounding the longer side by `max_size`.
///
/// Returns `None` when the image already fits. Otherwise the longer side
/// becomes exactly `max_size` and the shorter side is scaled by the same
/// ratio, rounded half-to-even and kept at least 1. Square images take the
/// width branch.
pub fn scaled_dimensions(width: u32, height: u32, max_size: u32) -> Option<(u32, u32)> {
    let (min_length, max_length) = if width <= height {
        (width, height)
    } else {
        (height, width)
    };
    if max_length <= max_size {
        return None;
    }

    let factor = div_round_half_even(
        u64::from(max_size) * u64::from(min_length),
        u64::from(max_length),
    )
    .max(1) as u32;

    if width == max_length {
        Some((max_size, factor))
    } else {
        Some((factor, max_size))
    }
}

/// Target dimensions for fitting inside a `max_width` x `max_height` box.
///
/// Returns `None` when neither bound is exceeded. The aspect ratio is kept;
/// the free side is floored or ceiled, whichever lands closer to the
/// original ratio (floor on a tie), and never drops below 1.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> Option<(u32, u32)> {
    if width <= max_width && height <= max_height {
        return None;
    }

    let aspect = f64::from(width) / f64::from(height);
    let box_w = f64::from(max_width);
    let box_h = f64::from(max_height);

    if box_w / box_h >= aspect {
        let w = round_aspect(box_h * aspect, |n| (aspect - n / box_h).abs());
        Some((w, max_height))
    } else {
        let h = round_aspect(box_w / aspect, |n| {
            if n == 0.0 {
                0.0
            } else {
                (aspect - box_w / n).abs()
            }
        });
        Some((max_width, h))
    }
}

fn round_aspect(number: f64, key: impl Fn(f64) -> f64) -> u32 {
    let floor = number.floor();
    let ceil = number.ceil();
    let chosen = if key(ceil) < key(floor) { ceil } else { floor };
    (chosen as u32).max(1)
}

/// Downsize `image` so its longer side is at most `max_size`.
///
/// Returns `(false, image)` untouched when it already fits, or `(true, copy)`
/// with a freshly resampled image. A `max_size` of zero is rejected.
pub fn maybe_downsize(image: DynamicImage, max_size: u32) -> Result<(bool, DynamicImage)> {
    ensure_positive("max_size", max_size)?;

    let (width, height) = image.dimensions();
    match scaled_dimensions(width, height, max_size) {
        None => Ok((false, image)),
        Some((new_w, new_h)) => {
            tracing::debug!(width, height, new_w, new_h, "downsizing image");
            Ok((true, image.resize_exact(new_w, new_h, FILTER)))
        }
    }
}
