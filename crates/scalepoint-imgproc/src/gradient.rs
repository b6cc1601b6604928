//! First order image derivatives.
//!
//! The gradient of a single channel image is computed by convolving a 1-D
//! derivative kernel along one axis and its companion smoothing kernel
//! along the other. Three kernel families are supported, each in a fixed
//! point and a floating point domain; the canonical fixed point path takes
//! a `u8` source and produces widened `i16` derivatives.

use scalepoint_image::{Image, ImageError};

use crate::filter::kernels::KernelFamily;
use crate::filter::{convolve_outer, BorderMode, DerivativePixel, KernelDomain, PixelAcc};

/// Compute the first order derivatives along x and y.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W).
/// * `dx` - The destination image for the x derivative, same shape.
/// * `dy` - The destination image for the y derivative, same shape.
/// * `family` - The derivative kernel family.
/// * `border` - How pixels within the kernel radius of an edge are handled.
pub fn gradient<S, D>(
    src: &Image<S, 1>,
    dx: &mut Image<D, 1>,
    dy: &mut Image<D, 1>,
    family: KernelFamily,
    border: BorderMode,
) -> Result<(), ImageError>
where
    S: PixelAcc<D::Acc>,
    D: DerivativePixel + PixelAcc<D::Acc>,
{
    let kernels = D::Acc::gradient_kernels(family);
    convolve_outer(src, dx, &kernels.deriv, &kernels.smooth, border)?;
    convolve_outer(src, dy, &kernels.smooth, &kernels.deriv, border)?;
    Ok(())
}

/// Compute the gradient with the Prewitt kernel pair.
pub fn gradient_prewitt<S, D>(
    src: &Image<S, 1>,
    dx: &mut Image<D, 1>,
    dy: &mut Image<D, 1>,
    border: BorderMode,
) -> Result<(), ImageError>
where
    S: PixelAcc<D::Acc>,
    D: DerivativePixel + PixelAcc<D::Acc>,
{
    gradient(src, dx, dy, KernelFamily::Prewitt, border)
}

/// Compute the gradient with the Sobel kernel pair.
pub fn gradient_sobel<S, D>(
    src: &Image<S, 1>,
    dx: &mut Image<D, 1>,
    dy: &mut Image<D, 1>,
    border: BorderMode,
) -> Result<(), ImageError>
where
    S: PixelAcc<D::Acc>,
    D: DerivativePixel + PixelAcc<D::Acc>,
{
    gradient(src, dx, dy, KernelFamily::Sobel, border)
}

/// Compute the gradient with the minimal symmetric difference kernel.
pub fn gradient_three<S, D>(
    src: &Image<S, 1>,
    dx: &mut Image<D, 1>,
    dy: &mut Image<D, 1>,
    border: BorderMode,
) -> Result<(), ImageError>
where
    S: PixelAcc<D::Acc>,
    D: DerivativePixel + PixelAcc<D::Acc>,
{
    gradient(src, dx, dy, KernelFamily::Three, border)
}
