//! Binarize an image given a threshold.
//!
//! The global rule comes in two directions: thresholding down marks the
//! pixels at or below the threshold, thresholding up marks the pixels
//! strictly above it. Every pixel lands in exactly one class whichever
//! direction is chosen. The locally adaptive variants compare each pixel
//! against a blurred local statistic instead of a single global value.

use scalepoint_image::{Image, ImageError};

use crate::filter::kernels::sigma_for_radius;
use crate::filter::{gaussian_blur, mean_blur, FloatPixel};
use crate::parallel;

/// Errors that can occur while thresholding.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ThresholdError {
    /// The local statistic scale is not a positive number.
    #[error("threshold scale must be positive, got {0}")]
    InvalidScale(f32),

    /// Error from the underlying image operations.
    #[error(transparent)]
    Image(#[from] ImageError),
}

fn check_dst_size<T, const C: usize, U, const D: usize>(
    src: &Image<T, C>,
    dst: &Image<U, D>,
) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            dst.cols(),
            dst.rows(),
            src.cols(),
            src.rows(),
        ));
    }
    Ok(())
}

/// Binarize an image against a global threshold.
///
/// With `down` set, pixels at or below `value` map to one and the rest to
/// zero; otherwise pixels strictly above `value` map to one. A pixel equal
/// to the threshold is marked by the down rule and not by the up rule.
///
/// # Arguments
///
/// * `src` - The source image of shape (H, W, C).
/// * `dst` - The destination binary image of shape (H, W, C).
/// * `value` - The threshold.
/// * `down` - Direction of the comparison.
///
/// # Examples
///
/// ```
/// use scalepoint_image::{Image, ImageSize};
/// use scalepoint_imgproc::threshold::threshold;
///
/// let size = ImageSize { width: 2, height: 2 };
/// let src = Image::<u8, 1>::new(size, vec![10, 100, 150, 200]).unwrap();
/// let mut dst = Image::<u8, 1>::from_size_val(size, 0).unwrap();
///
/// threshold(&src, &mut dst, 100, false).unwrap();
/// assert_eq!(dst.as_slice(), &[0, 0, 1, 1]);
/// ```
pub fn threshold<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<u8, C>,
    value: T,
    down: bool,
) -> Result<(), ImageError>
where
    T: PartialOrd + Clone + Send + Sync,
{
    check_dst_size(src, dst)?;

    if down {
        parallel::par_iter_rows_val(src, dst, |src_pixel, dst_pixel| {
            *dst_pixel = u8::from(*src_pixel <= value);
        });
    } else {
        parallel::par_iter_rows_val(src, dst, |src_pixel, dst_pixel| {
            *dst_pixel = u8::from(*src_pixel > value);
        });
    }

    Ok(())
}

/// Binarize an image against the scaled mean of its local window.
///
/// The statistic is a box blur of radius `radius`. Thresholding down marks
/// pixels at or below the scaled mean; thresholding up scales the pixel
/// instead and marks it when it exceeds the mean, so the two directions
/// stay complementary for a scale of one.
///
/// # Arguments
///
/// * `src` - The source image of shape (H, W).
/// * `dst` - The destination binary image of shape (H, W).
/// * `radius` - Radius of the local window.
/// * `scale` - Multiplier applied in the comparison, must be positive.
/// * `down` - Direction of the comparison.
/// * `storage1` - Storage for the local statistic, same shape as `src`.
/// * `storage2` - Storage for the blur passes, same shape as `src`.
pub fn local_mean_threshold<T: FloatPixel>(
    src: &Image<T, 1>,
    dst: &mut Image<u8, 1>,
    radius: usize,
    scale: f32,
    down: bool,
    storage1: &mut Image<T, 1>,
    storage2: &mut Image<T, 1>,
) -> Result<(), ThresholdError> {
    if !(scale > 0.0) {
        return Err(ThresholdError::InvalidScale(scale));
    }
    check_dst_size(src, dst)?;

    mean_blur(src, storage1, radius, storage2)?;
    apply_local_rule(src, storage1, dst, scale, down);
    Ok(())
}

/// Binarize an image against the scaled gaussian weighted local mean.
///
/// Same comparison rules as [`local_mean_threshold`], with the statistic
/// taken from a gaussian blur whose sigma is derived from the radius.
pub fn local_gaussian_threshold<T: FloatPixel>(
    src: &Image<T, 1>,
    dst: &mut Image<u8, 1>,
    radius: usize,
    scale: f32,
    down: bool,
    storage1: &mut Image<T, 1>,
    storage2: &mut Image<T, 1>,
) -> Result<(), ThresholdError> {
    if !(scale > 0.0) {
        return Err(ThresholdError::InvalidScale(scale));
    }
    check_dst_size(src, dst)?;

    let kernel_size = 2 * radius + 1;
    gaussian_blur(src, storage1, kernel_size, sigma_for_radius(radius), storage2)?;
    apply_local_rule(src, storage1, dst, scale, down);
    Ok(())
}

fn apply_local_rule<T: FloatPixel>(
    src: &Image<T, 1>,
    stat: &Image<T, 1>,
    dst: &mut Image<u8, 1>,
    scale: f32,
    down: bool,
) {
    if down {
        parallel::par_iter_rows_val_two(src, stat, dst, |src_pixel, stat_pixel, dst_pixel| {
            *dst_pixel = u8::from(src_pixel.to_f32() <= stat_pixel.to_f32() * scale);
        });
    } else {
        parallel::par_iter_rows_val_two(src, stat, dst, |src_pixel, stat_pixel, dst_pixel| {
            *dst_pixel = u8::from(src_pixel.to_f32() * scale > stat_pixel.to_f32());
        });
    }
}
