use scalepoint_image::ImageError;

/// A 1-D convolution kernel with odd support and a normalization divisor.
///
/// Convolution sums are divided by `divisor` once per pass; fixed-point
/// domains truncate, floating-point domains divide exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel1D<K> {
    weights: Vec<K>,
    divisor: K,
}

impl<K: Copy> Kernel1D<K> {
    /// Create a new kernel from its weights and normalization divisor.
    ///
    /// # Errors
    ///
    /// Fails if the number of weights is even, a kernel needs a well
    /// defined center tap.
    pub fn new(weights: Vec<K>, divisor: K) -> Result<Self, ImageError> {
        if weights.len() % 2 == 0 {
            return Err(ImageError::InvalidKernelLength(weights.len()));
        }
        Ok(Self { weights, divisor })
    }

    /// Build a kernel from one of the static weight tables, all odd length.
    fn from_table(weights: Vec<K>, divisor: K) -> Self {
        Self { weights, divisor }
    }

    /// Get the kernel weights.
    pub fn weights(&self) -> &[K] {
        &self.weights
    }

    /// Get the normalization divisor.
    pub fn divisor(&self) -> K {
        self.divisor
    }

    /// Get the kernel radius (half the support).
    pub fn radius(&self) -> usize {
        self.weights.len() / 2
    }
}

/// The supported derivative kernel families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelFamily {
    /// Derivative tap with uniform cross-axis smoothing.
    Prewitt,
    /// Derivative tap with weighted cross-axis smoothing.
    Sobel,
    /// Minimal symmetric difference with no cross-axis smoothing.
    Three,
}

/// A derivative/smoothing kernel pair for one family in one numeric domain.
///
/// The x-gradient is the outer product of `deriv` along x and `smooth`
/// along y; the y-gradient swaps the axes.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientKernels<K> {
    /// Kernel applied along the derivative axis.
    pub deriv: Kernel1D<K>,
    /// Kernel applied along the cross axis.
    pub smooth: Kernel1D<K>,
}

static DERIV_WEIGHTS: [i32; 3] = [-1, 0, 1];
static PREWITT_SMOOTH: [i32; 3] = [1, 1, 1];
static SOBEL_SMOOTH: [i32; 3] = [1, 2, 1];

/// Get the fixed-point kernel pair for a family.
///
/// Integer kernels keep a divisor of one, so gradient magnitudes grow by
/// the full kernel gain and the caller picks a wide enough output type.
pub fn gradient_kernels_i32(family: KernelFamily) -> GradientKernels<i32> {
    let (smooth, smooth_div) = match family {
        KernelFamily::Prewitt => (PREWITT_SMOOTH.to_vec(), 1),
        KernelFamily::Sobel => (SOBEL_SMOOTH.to_vec(), 1),
        KernelFamily::Three => (vec![1], 1),
    };
    GradientKernels {
        deriv: Kernel1D::from_table(DERIV_WEIGHTS.to_vec(), 1),
        smooth: Kernel1D::from_table(smooth, smooth_div),
    }
}

/// Get the single precision kernel pair for a family.
///
/// Floating point kernels carry the conventional normalization so the
/// response approximates the continuous derivative.
pub fn gradient_kernels_f32(family: KernelFamily) -> GradientKernels<f32> {
    let deriv_weights: Vec<f32> = DERIV_WEIGHTS.iter().map(|&w| w as f32).collect();
    let (smooth, smooth_div, deriv_div) = match family {
        KernelFamily::Prewitt => (vec![1.0, 1.0, 1.0], 3.0, 1.0),
        KernelFamily::Sobel => (vec![1.0, 2.0, 1.0], 4.0, 1.0),
        KernelFamily::Three => (vec![1.0], 1.0, 2.0),
    };
    GradientKernels {
        deriv: Kernel1D::from_table(deriv_weights, deriv_div),
        smooth: Kernel1D::from_table(smooth, smooth_div),
    }
}

/// Get the double precision kernel pair for a family.
pub fn gradient_kernels_f64(family: KernelFamily) -> GradientKernels<f64> {
    let f32_kernels = gradient_kernels_f32(family);
    let widen = |k: &Kernel1D<f32>| {
        Kernel1D::from_table(
            k.weights().iter().map(|&w| w as f64).collect(),
            k.divisor() as f64,
        )
    };
    GradientKernels {
        deriv: widen(&f32_kernels.deriv),
        smooth: widen(&f32_kernels.smooth),
    }
}

/// Create a box blur kernel.
///
/// # Arguments
///
/// * `kernel_size` - The size of the kernel.
pub fn box_blur_kernel_1d(kernel_size: usize) -> Vec<f32> {
    vec![1.0 / kernel_size as f32; kernel_size]
}

/// Create a gaussian blur kernel.
///
/// # Arguments
///
/// * `kernel_size` - The size of the kernel.
/// * `sigma` - The sigma of the gaussian kernel.
pub fn gaussian_kernel_1d(kernel_size: usize, sigma: f32) -> Vec<f32> {
    let mut kernel = Vec::with_capacity(kernel_size);

    let mean = (kernel_size - 1) as f32 / 2.0;
    let sigma_sq = sigma * sigma;

    // compute the kernel
    for i in 0..kernel_size {
        let x = i as f32 - mean;
        kernel.push((-(x * x) / (2.0 * sigma_sq)).exp());
    }

    // normalize the kernel
    let norm = kernel.iter().sum::<f32>();
    kernel.iter_mut().for_each(|k| *k /= norm);
    kernel
}

/// Derive a gaussian sigma from a window radius.
pub fn sigma_for_radius(radius: usize) -> f32 {
    (2 * radius + 1) as f32 / 6.0
}

/// Derive a window radius covering three sigmas.
pub fn radius_for_sigma(sigma: f32) -> usize {
    (sigma * 3.0).ceil() as usize
}
