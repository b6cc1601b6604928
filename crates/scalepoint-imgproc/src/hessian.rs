//! Second order image derivatives from first order ones.
//!
//! Re-applying a derivative kernel pair to the gradient images yields the
//! three Hessian components: the second derivative is the kernel applied
//! to the first. `Ixy` is always taken as the y derivative of the x
//! gradient, so the three outputs come from one consistent composition.

use scalepoint_image::{Image, ImageError};

use crate::filter::kernels::KernelFamily;
use crate::filter::{convolve_outer, BorderMode, DerivativePixel, KernelDomain, PixelAcc};

/// Compute the Hessian components from precomputed gradients.
///
/// The gradients must have been produced with the same kernel family for
/// the result to equal a direct second order convolution of the source
/// image. Fixed point outputs saturate to the destination range when the
/// magnitude growth of the second pass overflows it.
///
/// # Arguments
///
/// * `dx` - The x derivative with shape (H, W).
/// * `dy` - The y derivative with shape (H, W).
/// * `ixx` - Destination for the second derivative along x.
/// * `iyy` - Destination for the second derivative along y.
/// * `ixy` - Destination for the mixed derivative.
/// * `family` - The derivative kernel family used to produce `dx`/`dy`.
/// * `border` - How pixels within the kernel radius of an edge are handled.
pub fn hessian_from_gradient<S, D>(
    dx: &Image<S, 1>,
    dy: &Image<S, 1>,
    ixx: &mut Image<D, 1>,
    iyy: &mut Image<D, 1>,
    ixy: &mut Image<D, 1>,
    family: KernelFamily,
    border: BorderMode,
) -> Result<(), ImageError>
where
    S: PixelAcc<D::Acc>,
    D: DerivativePixel + PixelAcc<D::Acc>,
{
    if dx.size() != dy.size() {
        return Err(ImageError::InvalidImageSize(
            dy.cols(),
            dy.rows(),
            dx.cols(),
            dx.rows(),
        ));
    }

    let kernels = D::Acc::gradient_kernels(family);
    convolve_outer(dx, ixx, &kernels.deriv, &kernels.smooth, border)?;
    convolve_outer(dy, iyy, &kernels.smooth, &kernels.deriv, border)?;
    convolve_outer(dx, ixy, &kernels.smooth, &kernels.deriv, border)?;
    Ok(())
}

/// Compute the Hessian components with the Prewitt kernel pair.
pub fn hessian_prewitt<S, D>(
    dx: &Image<S, 1>,
    dy: &Image<S, 1>,
    ixx: &mut Image<D, 1>,
    iyy: &mut Image<D, 1>,
    ixy: &mut Image<D, 1>,
    border: BorderMode,
) -> Result<(), ImageError>
where
    S: PixelAcc<D::Acc>,
    D: DerivativePixel + PixelAcc<D::Acc>,
{
    hessian_from_gradient(dx, dy, ixx, iyy, ixy, KernelFamily::Prewitt, border)
}

/// Compute the Hessian components with the Sobel kernel pair.
pub fn hessian_sobel<S, D>(
    dx: &Image<S, 1>,
    dy: &Image<S, 1>,
    ixx: &mut Image<D, 1>,
    iyy: &mut Image<D, 1>,
    ixy: &mut Image<D, 1>,
    border: BorderMode,
) -> Result<(), ImageError>
where
    S: PixelAcc<D::Acc>,
    D: DerivativePixel + PixelAcc<D::Acc>,
{
    hessian_from_gradient(dx, dy, ixx, iyy, ixy, KernelFamily::Sobel, border)
}

/// Compute the Hessian components with the minimal symmetric difference kernel.
pub fn hessian_three<S, D>(
    dx: &Image<S, 1>,
    dy: &Image<S, 1>,
    ixx: &mut Image<D, 1>,
    iyy: &mut Image<D, 1>,
    ixy: &mut Image<D, 1>,
    border: BorderMode,
) -> Result<(), ImageError>
where
    S: PixelAcc<D::Acc>,
    D: DerivativePixel + PixelAcc<D::Acc>,
{
    hessian_from_gradient(dx, dy, ixx, iyy, ixy, KernelFamily::Three, border)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::kernels::{gradient_kernels_f32, gradient_kernels_i32};
    use crate::gradient::gradient;
    use scalepoint_image::ImageSize;

    /// Discrete 1-D convolution of two weight sequences.
    fn compose_1d<K>(a: &[K], b: &[K]) -> Vec<K>
    where
        K: Copy + num_traits::Zero + std::ops::Mul<Output = K> + std::ops::AddAssign,
    {
        let mut out = vec![K::zero(); a.len() + b.len() - 1];
        for (i, &wa) in a.iter().enumerate() {
            for (j, &wb) in b.iter().enumerate() {
                out[i + j] += wa * wb;
            }
        }
        out
    }

    /// Direct 2-D reference convolution of an i32 outer product kernel,
    /// full support only (interior pixels).
    fn reference_interior_i32(
        src: &Image<u8, 1>,
        kernel_x: &[i32],
        kernel_y: &[i32],
        x: usize,
        y: usize,
    ) -> i32 {
        let rx = kernel_x.len() / 2;
        let ry = kernel_y.len() / 2;
        let mut acc = 0i32;
        for (j, &wy) in kernel_y.iter().enumerate() {
            for (i, &wx) in kernel_x.iter().enumerate() {
                let xx = x + i - rx;
                let yy = y + j - ry;
                acc += *src.get(xx, yy, 0).unwrap() as i32 * wx * wy;
            }
        }
        acc
    }

    fn reference_interior_f32(
        src: &Image<f32, 1>,
        kernel_x: &[f32],
        kernel_y: &[f32],
        divisor: f32,
        x: usize,
        y: usize,
    ) -> f32 {
        let rx = kernel_x.len() / 2;
        let ry = kernel_y.len() / 2;
        let mut acc = 0.0f32;
        for (j, &wy) in kernel_y.iter().enumerate() {
            for (i, &wx) in kernel_x.iter().enumerate() {
                let xx = x + i - rx;
                let yy = y + j - ry;
                acc += src.get(xx, yy, 0).unwrap() * wx * wy;
            }
        }
        acc / divisor
    }

    const WIDTH: usize = 20;
    const HEIGHT: usize = 25;

    fn random_u8_image(seed: u64) -> Image<u8, 1> {
        use rand::{rngs::StdRng, Rng, SeedableRng};
        let mut rng = StdRng::seed_from_u64(seed);
        let size = ImageSize {
            width: WIDTH,
            height: HEIGHT,
        };
        let data = (0..WIDTH * HEIGHT).map(|_| rng.random_range(0..=255)).collect();
        Image::new(size, data).unwrap()
    }

    /// Second order output must equal the direct convolution of the
    /// self-composed kernel applied to the original image, for every
    /// family, at full-support pixels.
    #[test]
    fn test_hessian_equals_composed_convolution_i32() -> Result<(), ImageError> {
        let src = random_u8_image(234);
        let size = src.size();

        for family in [KernelFamily::Prewitt, KernelFamily::Sobel, KernelFamily::Three] {
            let mut dx = Image::<i16, 1>::from_size_val(size, 0)?;
            let mut dy = Image::<i16, 1>::from_size_val(size, 0)?;
            gradient(&src, &mut dx, &mut dy, family, BorderMode::Clip)?;

            let mut ixx = Image::<i16, 1>::from_size_val(size, 0)?;
            let mut iyy = Image::<i16, 1>::from_size_val(size, 0)?;
            let mut ixy = Image::<i16, 1>::from_size_val(size, 0)?;
            hessian_from_gradient(&dx, &dy, &mut ixx, &mut iyy, &mut ixy, family, BorderMode::Clip)?;

            let kernels = gradient_kernels_i32(family);
            let deriv2 = compose_1d(kernels.deriv.weights(), kernels.deriv.weights());
            let smooth2 = compose_1d(kernels.smooth.weights(), kernels.smooth.weights());
            let mixed = compose_1d(kernels.deriv.weights(), kernels.smooth.weights());

            // full composed support is two kernel radii
            for y in 2..HEIGHT - 2 {
                for x in 2..WIDTH - 2 {
                    let want_xx = reference_interior_i32(&src, &deriv2, &smooth2, x, y);
                    let want_yy = reference_interior_i32(&src, &smooth2, &deriv2, x, y);
                    let want_xy = reference_interior_i32(&src, &mixed, &mixed, x, y);
                    assert_eq!(*ixx.get(x, y, 0).unwrap() as i32, want_xx, "{family:?} ixx at ({x},{y})");
                    assert_eq!(*iyy.get(x, y, 0).unwrap() as i32, want_yy, "{family:?} iyy at ({x},{y})");
                    assert_eq!(*ixy.get(x, y, 0).unwrap() as i32, want_xy, "{family:?} ixy at ({x},{y})");
                }
            }
        }

        Ok(())
    }

    #[test]
    fn test_hessian_equals_composed_convolution_f32() -> Result<(), ImageError> {
        let src_u8 = random_u8_image(567);
        let src: Image<f32, 1> = src_u8.cast()?;
        let size = src.size();

        for family in [KernelFamily::Prewitt, KernelFamily::Sobel, KernelFamily::Three] {
            let mut dx = Image::<f32, 1>::from_size_val(size, 0.0)?;
            let mut dy = Image::<f32, 1>::from_size_val(size, 0.0)?;
            gradient(&src, &mut dx, &mut dy, family, BorderMode::Clip)?;

            let mut ixx = Image::<f32, 1>::from_size_val(size, 0.0)?;
            let mut iyy = Image::<f32, 1>::from_size_val(size, 0.0)?;
            let mut ixy = Image::<f32, 1>::from_size_val(size, 0.0)?;
            hessian_from_gradient(&dx, &dy, &mut ixx, &mut iyy, &mut ixy, family, BorderMode::Clip)?;

            let kernels = gradient_kernels_f32(family);
            let deriv2 = compose_1d(kernels.deriv.weights(), kernels.deriv.weights());
            let smooth2 = compose_1d(kernels.smooth.weights(), kernels.smooth.weights());
            let mixed = compose_1d(kernels.deriv.weights(), kernels.smooth.weights());
            let divisor = (kernels.deriv.divisor() * kernels.smooth.divisor()).powi(2);

            for y in 2..HEIGHT - 2 {
                for x in 2..WIDTH - 2 {
                    let want_xx = reference_interior_f32(&src, &deriv2, &smooth2, divisor, x, y);
                    let want_yy = reference_interior_f32(&src, &smooth2, &deriv2, divisor, x, y);
                    let want_xy = reference_interior_f32(&src, &mixed, &mixed, divisor, x, y);
                    approx::assert_relative_eq!(
                        ixx.get(x, y, 0).unwrap(),
                        &want_xx,
                        max_relative = 1e-4,
                        epsilon = 1e-3
                    );
                    approx::assert_relative_eq!(
                        iyy.get(x, y, 0).unwrap(),
                        &want_yy,
                        max_relative = 1e-4,
                        epsilon = 1e-3
                    );
                    approx::assert_relative_eq!(
                        ixy.get(x, y, 0).unwrap(),
                        &want_xy,
                        max_relative = 1e-4,
                        epsilon = 1e-3
                    );
                }
            }
        }

        Ok(())
    }

    #[test]
    fn test_hessian_gradient_size_mismatch() -> Result<(), ImageError> {
        let dx = Image::<f32, 1>::from_size_val(
            ImageSize {
                width: 5,
                height: 5,
            },
            0.0,
        )?;
        let dy = Image::<f32, 1>::from_size_val(
            ImageSize {
                width: 5,
                height: 4,
            },
            0.0,
        )?;
        let mut ixx = Image::<f32, 1>::from_size_val(dx.size(), 0.0)?;
        let mut iyy = Image::<f32, 1>::from_size_val(dx.size(), 0.0)?;
        let mut ixy = Image::<f32, 1>::from_size_val(dx.size(), 0.0)?;

        let res = hessian_sobel(&dx, &dy, &mut ixx, &mut iyy, &mut ixy, BorderMode::Clip);
        assert!(matches!(res, Err(ImageError::InvalidImageSize(5, 4, 5, 5))));

        Ok(())
    }
}
