use rayon::prelude::*;

use scalepoint_image::{Image, ImageError};

use super::kernels::{box_blur_kernel_1d, gaussian_kernel_1d};

/// Trait for floating point casting
pub trait FloatPixel: Copy + Send + Sync {
    /// Convert the type to f32
    fn to_f32(&self) -> f32;
    /// Convert the type from f32
    fn from_f32(val: f32) -> Self;
}

impl FloatPixel for f32 {
    fn to_f32(&self) -> f32 {
        *self
    }

    fn from_f32(val: f32) -> Self {
        val
    }
}

impl FloatPixel for f64 {
    fn to_f32(&self) -> f32 {
        *self as f32
    }

    fn from_f32(val: f32) -> Self {
        val as f64
    }
}

impl FloatPixel for u8 {
    fn to_f32(&self) -> f32 {
        *self as f32
    }

    fn from_f32(val: f32) -> Self {
        val.round().clamp(0.0, 255.0) as u8
    }
}

impl FloatPixel for u16 {
    fn to_f32(&self) -> f32 {
        *self as f32
    }

    fn from_f32(val: f32) -> Self {
        val.round().clamp(0.0, 65535.0) as u16
    }
}

/// Horizontal 1-D pass with the kernel clipped at the edges and the sum
/// renormalized by the weights that fell inside the row.
fn horizontal_filter_clipped<T: FloatPixel>(src: &[T], dst: &mut [T], cols: usize, kernel: &[f32]) {
    let radius = kernel.len() as isize / 2;

    dst.par_chunks_mut(cols).enumerate().for_each(|(r, dst_row)| {
        let src_row = &src[r * cols..(r + 1) * cols];
        for (x, dst_px) in dst_row.iter_mut().enumerate() {
            let mut acc = 0.0f32;
            let mut norm = 0.0f32;
            for (i, &w) in kernel.iter().enumerate() {
                let xx = x as isize + i as isize - radius;
                if xx >= 0 && xx < cols as isize {
                    acc += src_row[xx as usize].to_f32() * w;
                    norm += w;
                }
            }
            *dst_px = T::from_f32(acc / norm);
        }
    });
}

/// Vertical companion of [`horizontal_filter_clipped`].
fn vertical_filter_clipped<T: FloatPixel>(
    src: &[T],
    dst: &mut [T],
    cols: usize,
    rows: usize,
    kernel: &[f32],
) {
    let radius = kernel.len() as isize / 2;

    dst.par_chunks_mut(cols).enumerate().for_each(|(r, dst_row)| {
        for (x, dst_px) in dst_row.iter_mut().enumerate() {
            let mut acc = 0.0f32;
            let mut norm = 0.0f32;
            for (i, &w) in kernel.iter().enumerate() {
                let yy = r as isize + i as isize - radius;
                if yy >= 0 && yy < rows as isize {
                    acc += src[yy as usize * cols + x].to_f32() * w;
                    norm += w;
                }
            }
            *dst_px = T::from_f32(acc / norm);
        }
    });
}

fn check_blur_sizes<T, const C: usize>(
    src: &Image<T, C>,
    dst: &Image<T, C>,
    scratch: &Image<T, C>,
) -> Result<(), ImageError> {
    for img in [dst, scratch] {
        if src.size() != img.size() {
            return Err(ImageError::InvalidImageSize(
                img.cols(),
                img.rows(),
                src.cols(),
                src.rows(),
            ));
        }
    }
    Ok(())
}

/// Blur a single channel image with a separable box mean filter.
///
/// Pixels near the border average only the window taps inside the image,
/// so the output is the mean of the pixels present. A radius of zero is
/// the identity.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W).
/// * `dst` - The destination image with shape (H, W).
/// * `radius` - Radius of the square window.
/// * `scratch` - Storage for the horizontal pass, same shape as `src`.
pub fn mean_blur<T: FloatPixel>(
    src: &Image<T, 1>,
    dst: &mut Image<T, 1>,
    radius: usize,
    scratch: &mut Image<T, 1>,
) -> Result<(), ImageError> {
    check_blur_sizes(src, dst, scratch)?;

    if radius == 0 {
        dst.as_slice_mut().copy_from_slice(src.as_slice());
        return Ok(());
    }

    let kernel = box_blur_kernel_1d(2 * radius + 1);
    let cols = src.cols();
    let rows = src.rows();

    horizontal_filter_clipped(src.as_slice(), scratch.as_slice_mut(), cols, &kernel);
    vertical_filter_clipped(scratch.as_slice(), dst.as_slice_mut(), cols, rows, &kernel);

    Ok(())
}

/// Blur a single channel image with a separable gaussian filter.
///
/// Border pixels renormalize over the kernel weights inside the image. A
/// kernel size of one is the identity.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W).
/// * `dst` - The destination image with shape (H, W).
/// * `kernel_size` - The size of the kernel, must be odd.
/// * `sigma` - The sigma of the gaussian kernel.
/// * `scratch` - Storage for the horizontal pass, same shape as `src`.
///
/// # Errors
///
/// Fails with [`ImageError::InvalidKernelLength`] on an even kernel size,
/// which would shift the blur center off the pixel grid.
pub fn gaussian_blur<T: FloatPixel>(
    src: &Image<T, 1>,
    dst: &mut Image<T, 1>,
    kernel_size: usize,
    sigma: f32,
    scratch: &mut Image<T, 1>,
) -> Result<(), ImageError> {
    if kernel_size % 2 == 0 {
        return Err(ImageError::InvalidKernelLength(kernel_size));
    }
    check_blur_sizes(src, dst, scratch)?;

    if kernel_size <= 1 {
        dst.as_slice_mut().copy_from_slice(src.as_slice());
        return Ok(());
    }

    let kernel = gaussian_kernel_1d(kernel_size, sigma);
    let cols = src.cols();
    let rows = src.rows();

    horizontal_filter_clipped(src.as_slice(), scratch.as_slice_mut(), cols, &kernel);
    vertical_filter_clipped(scratch.as_slice(), dst.as_slice_mut(), cols, rows, &kernel);

    Ok(())
}
