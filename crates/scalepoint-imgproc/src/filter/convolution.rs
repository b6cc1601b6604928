use num_traits::Zero;
use rayon::prelude::*;

use scalepoint_image::{Image, ImageError};

use super::kernels::{
    gradient_kernels_f32, gradient_kernels_f64, gradient_kernels_i32, GradientKernels,
    Kernel1D, KernelFamily,
};

/// How convolution treats pixels within the kernel radius of an image edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BorderMode {
    /// Compute border pixels from the taps that fall inside the image,
    /// keeping the kernel normalization.
    #[default]
    Clip,
    /// Write zero at border pixels.
    Skip,
}

/// Accumulator arithmetic for one numeric domain of the convolution kernels.
///
/// Fixed-point kernels accumulate in `i32` and normalize with truncating
/// integer division; floating-point kernels divide exactly.
pub trait KernelAcc:
    Copy + Send + Sync + Zero + std::ops::Mul<Output = Self> + PartialOrd
{
    /// Divide the accumulated sum by the kernel normalization divisor.
    fn normalize(self, divisor: Self) -> Self;
}

impl KernelAcc for i32 {
    fn normalize(self, divisor: Self) -> Self {
        // truncating division, the fixed-point rounding rule
        self / divisor
    }
}

impl KernelAcc for f32 {
    fn normalize(self, divisor: Self) -> Self {
        self / divisor
    }
}

impl KernelAcc for f64 {
    fn normalize(self, divisor: Self) -> Self {
        self / divisor
    }
}

/// Conversion between an image element type and a kernel accumulator domain.
///
/// `from_acc` saturates fixed-point values to the destination range.
pub trait PixelAcc<A>: Copy + Send + Sync {
    /// Widen the element into the accumulator domain.
    fn to_acc(self) -> A;
    /// Narrow an accumulated value back into the element type.
    fn from_acc(acc: A) -> Self;
}

impl PixelAcc<i32> for u8 {
    fn to_acc(self) -> i32 {
        self as i32
    }

    fn from_acc(acc: i32) -> Self {
        acc.clamp(u8::MIN as i32, u8::MAX as i32) as u8
    }
}

impl PixelAcc<i32> for i8 {
    fn to_acc(self) -> i32 {
        self as i32
    }

    fn from_acc(acc: i32) -> Self {
        acc.clamp(i8::MIN as i32, i8::MAX as i32) as i8
    }
}

impl PixelAcc<i32> for u16 {
    fn to_acc(self) -> i32 {
        self as i32
    }

    fn from_acc(acc: i32) -> Self {
        acc.clamp(u16::MIN as i32, u16::MAX as i32) as u16
    }
}

impl PixelAcc<i32> for i16 {
    fn to_acc(self) -> i32 {
        self as i32
    }

    fn from_acc(acc: i32) -> Self {
        acc.clamp(i16::MIN as i32, i16::MAX as i32) as i16
    }
}

impl PixelAcc<i32> for i32 {
    fn to_acc(self) -> i32 {
        self
    }

    fn from_acc(acc: i32) -> Self {
        acc
    }
}

impl PixelAcc<f32> for f32 {
    fn to_acc(self) -> f32 {
        self
    }

    fn from_acc(acc: f32) -> Self {
        acc
    }
}

impl PixelAcc<f64> for f64 {
    fn to_acc(self) -> f64 {
        self
    }

    fn from_acc(acc: f64) -> Self {
        acc
    }
}

/// Accumulator domains that carry the derivative kernel tables.
pub trait KernelDomain: KernelAcc {
    /// Get the kernel pair for `family` in this domain.
    fn gradient_kernels(family: KernelFamily) -> GradientKernels<Self>;
}

impl KernelDomain for i32 {
    fn gradient_kernels(family: KernelFamily) -> GradientKernels<Self> {
        gradient_kernels_i32(family)
    }
}

impl KernelDomain for f32 {
    fn gradient_kernels(family: KernelFamily) -> GradientKernels<Self> {
        gradient_kernels_f32(family)
    }
}

impl KernelDomain for f64 {
    fn gradient_kernels(family: KernelFamily) -> GradientKernels<Self> {
        gradient_kernels_f64(family)
    }
}

/// Maps a derivative output element type to its accumulator domain.
pub trait DerivativePixel: Copy {
    /// Accumulator domain used when producing this element type.
    type Acc: KernelDomain;
}

impl DerivativePixel for i16 {
    type Acc = i32;
}

impl DerivativePixel for i32 {
    type Acc = i32;
}

impl DerivativePixel for f32 {
    type Acc = f32;
}

impl DerivativePixel for f64 {
    type Acc = f64;
}

/// Convolve the outer product of two 1-D kernels over a single channel image.
///
/// The sum over the full 2-D support is accumulated in the domain `A` and
/// normalized once by the product of the two kernel divisors, so interior
/// pixels match a direct 2-D reference convolution exactly under the
/// domain's rounding rule. Rows are processed in parallel.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W).
/// * `dst` - The destination image with shape (H, W).
/// * `kernel_x` - The kernel applied along the x axis.
/// * `kernel_y` - The kernel applied along the y axis.
/// * `border` - How pixels within the kernel radius of an edge are handled.
pub fn convolve_outer<S, D, A>(
    src: &Image<S, 1>,
    dst: &mut Image<D, 1>,
    kernel_x: &Kernel1D<A>,
    kernel_y: &Kernel1D<A>,
    border: BorderMode,
) -> Result<(), ImageError>
where
    S: PixelAcc<A>,
    D: PixelAcc<A>,
    A: KernelAcc,
{
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            dst.cols(),
            dst.rows(),
            src.cols(),
            src.rows(),
        ));
    }

    let cols = src.cols();
    let rows = src.rows();
    let rx = kernel_x.radius() as isize;
    let ry = kernel_y.radius() as isize;
    let divisor = kernel_x.divisor() * kernel_y.divisor();

    let src_data = src.as_slice();
    let kx = kernel_x.weights();
    let ky = kernel_y.weights();

    dst.as_slice_mut()
        .par_chunks_mut(cols)
        .enumerate()
        .for_each(|(y, dst_row)| {
            let y = y as isize;
            for (x, dst_px) in dst_row.iter_mut().enumerate() {
                let x = x as isize;

                let on_border =
                    x < rx || x + rx >= cols as isize || y < ry || y + ry >= rows as isize;
                if on_border && border == BorderMode::Skip {
                    *dst_px = D::from_acc(A::zero());
                    continue;
                }

                let mut acc = A::zero();
                for (j, &wy) in ky.iter().enumerate() {
                    let yy = y + j as isize - ry;
                    if yy < 0 || yy >= rows as isize {
                        continue;
                    }
                    let row_offset = yy as usize * cols;
                    for (i, &wx) in kx.iter().enumerate() {
                        let xx = x + i as isize - rx;
                        if xx < 0 || xx >= cols as isize {
                            continue;
                        }
                        let val = unsafe { src_data.get_unchecked(row_offset + xx as usize) };
                        acc = acc + val.to_acc() * wx * wy;
                    }
                }
                *dst_px = D::from_acc(acc.normalize(divisor));
            }
        });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scalepoint_image::ImageSize;

    #[test]
    fn test_convolve_outer_interior_i32() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 3,
            height: 3,
        };
        #[rustfmt::skip]
        let src = Image::<u8, 1>::new(
            size,
            vec![
                1, 2, 3,
                4, 5, 6,
                7, 8, 9,
            ],
        )?;
        let mut dst = Image::<i16, 1>::from_size_val(size, 0)?;

        // x derivative with uniform smoothing along y
        let kx = Kernel1D::new(vec![-1, 0, 1], 1)?;
        let ky = Kernel1D::new(vec![1, 1, 1], 1)?;
        convolve_outer(&src, &mut dst, &kx, &ky, BorderMode::Skip)?;

        // center: (3 - 1) + (6 - 4) + (9 - 7) = 6, border zeroed by Skip
        #[rustfmt::skip]
        assert_eq!(
            dst.as_slice(),
            &[
                0, 0, 0,
                0, 6, 0,
                0, 0, 0,
            ]
        );

        Ok(())
    }

    #[test]
    fn test_convolve_outer_clip_border() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 3,
            height: 3,
        };
        #[rustfmt::skip]
        let src = Image::<u8, 1>::new(
            size,
            vec![
                1, 2, 3,
                4, 5, 6,
                7, 8, 9,
            ],
        )?;
        let mut dst = Image::<i16, 1>::from_size_val(size, 0)?;

        let kx = Kernel1D::new(vec![-1, 0, 1], 1)?;
        let ky = Kernel1D::new(vec![1, 1, 1], 1)?;
        convolve_outer(&src, &mut dst, &kx, &ky, BorderMode::Clip)?;

        // top-left pixel keeps only the taps inside: 2 + 5 = 7
        assert_eq!(dst.get(0, 0, 0), Some(&7i16));
        // center is the full support sum
        assert_eq!(dst.get(1, 1, 0), Some(&6i16));

        Ok(())
    }

    #[test]
    fn test_convolve_outer_truncating_division() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 3,
            height: 1,
        };
        let src = Image::<u8, 1>::new(size, vec![0, 5, 0])?;
        let mut dst = Image::<i16, 1>::from_size_val(size, 0)?;

        let kx = Kernel1D::new(vec![1, 1, 1], 2)?;
        let ky = Kernel1D::new(vec![1], 1)?;
        convolve_outer(&src, &mut dst, &kx, &ky, BorderMode::Clip)?;

        // 5 / 2 truncates to 2 in the fixed-point domain
        assert_eq!(dst.as_slice(), &[2, 2, 2]);

        Ok(())
    }

    #[test]
    fn test_convolve_outer_f32_exact() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 3,
            height: 1,
        };
        let src = Image::<f32, 1>::new(size, vec![0.0, 5.0, 0.0])?;
        let mut dst = Image::<f32, 1>::from_size_val(size, 0.0)?;

        let kx = Kernel1D::new(vec![1.0, 1.0, 1.0], 2.0)?;
        let ky = Kernel1D::new(vec![1.0], 1.0)?;
        convolve_outer(&src, &mut dst, &kx, &ky, BorderMode::Clip)?;

        assert_eq!(dst.as_slice(), &[2.5, 2.5, 2.5]);

        Ok(())
    }

    #[test]
    fn test_convolve_outer_size_mismatch() -> Result<(), ImageError> {
        let src = Image::<f32, 1>::from_size_val(
            ImageSize {
                width: 4,
                height: 4,
            },
            0.0,
        )?;
        let mut dst = Image::<f32, 1>::from_size_val(
            ImageSize {
                width: 3,
                height: 4,
            },
            0.0,
        )?;

        let kx = Kernel1D::new(vec![1.0], 1.0)?;
        let ky = Kernel1D::new(vec![1.0], 1.0)?;
        let res = convolve_outer(&src, &mut dst, &kx, &ky, BorderMode::Clip);
        assert!(matches!(res, Err(ImageError::InvalidImageSize(3, 4, 4, 4))));

        Ok(())
    }

    #[test]
    fn test_fixed_point_saturation() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 3,
            height: 1,
        };
        let src = Image::<i16, 1>::new(size, vec![i16::MAX, i16::MAX, i16::MAX])?;
        let mut dst = Image::<i16, 1>::from_size_val(size, 0)?;

        let kx = Kernel1D::new(vec![1, 1, 1], 1)?;
        let ky = Kernel1D::new(vec![1], 1)?;
        convolve_outer(&src, &mut dst, &kx, &ky, BorderMode::Clip)?;

        // 3 * i16::MAX saturates to the destination range
        assert_eq!(dst.get(1, 0, 0), Some(&i16::MAX));

        Ok(())
    }
}
