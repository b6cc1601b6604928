//! Gaussian scale space construction.

use scalepoint_image::{Image, ImageError};

use crate::filter::kernels::radius_for_sigma;
use crate::filter::gaussian_blur;

/// Errors that can occur while building or querying a scale space.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ScaleSpaceError {
    /// The sigma sequence is empty.
    #[error("scale sequence must not be empty")]
    EmptyScales,

    /// The sigma sequence contains a non-positive or non-increasing value.
    #[error("scale levels must be positive and strictly increasing, got {0}")]
    InvalidScale(f32),

    /// The scale space was queried before an image was assigned.
    #[error("no image has been assigned to the scale space")]
    NoImageSet,

    /// The requested level does not exist.
    #[error("scale level {0} out of bounds ({1} levels)")]
    LevelOutOfBounds(usize, usize),

    /// Error from the underlying image operations.
    #[error(transparent)]
    Image(#[from] ImageError),
}

/// A sequence of increasingly blurred versions of one source image.
///
/// Each level is blurred directly from the source with its own sigma, so
/// levels carry no accumulated resampling drift. Assigning a new source
/// with [`GaussianScaleSpace::set_image`] invalidates all cached levels.
///
/// # Examples
///
/// ```
/// use scalepoint_image::{Image, ImageSize};
/// use scalepoint_imgproc::scale_space::GaussianScaleSpace;
///
/// let mut ss = GaussianScaleSpace::new(vec![1.2, 2.4, 3.6]).unwrap();
/// let image = Image::<f32, 1>::from_size_val(
///     ImageSize { width: 16, height: 16 },
///     0.5,
/// ).unwrap();
///
/// ss.set_image(&image).unwrap();
/// assert_eq!(ss.num_levels(), 3);
/// assert_eq!(ss.sigma(1), Some(2.4));
/// assert_eq!(ss.level(1).unwrap().size(), image.size());
/// ```
pub struct GaussianScaleSpace {
    sigmas: Vec<f32>,
    levels: Vec<Image<f32, 1>>,
}

impl GaussianScaleSpace {
    /// Create a scale space over the given sigma ladder.
    ///
    /// # Errors
    ///
    /// Fails if the sequence is empty, contains a non-positive sigma or is
    /// not strictly increasing.
    pub fn new(sigmas: Vec<f32>) -> Result<Self, ScaleSpaceError> {
        if sigmas.is_empty() {
            return Err(ScaleSpaceError::EmptyScales);
        }

        let mut prev = 0.0f32;
        for &sigma in &sigmas {
            if !sigma.is_finite() || sigma <= prev {
                return Err(ScaleSpaceError::InvalidScale(sigma));
            }
            prev = sigma;
        }

        Ok(Self {
            sigmas,
            levels: Vec::new(),
        })
    }

    /// Assign the source image and compute every blurred level.
    ///
    /// Any levels from a previously assigned image are discarded first.
    pub fn set_image(&mut self, src: &Image<f32, 1>) -> Result<(), ScaleSpaceError> {
        self.levels.clear();

        let mut scratch = Image::from_size_val(src.size(), 0.0f32)?;
        for &sigma in &self.sigmas {
            let kernel_size = 2 * radius_for_sigma(sigma) + 1;
            let mut level = Image::from_size_val(src.size(), 0.0f32)?;
            gaussian_blur(src, &mut level, kernel_size, sigma, &mut scratch)?;
            self.levels.push(level);
        }

        Ok(())
    }

    /// Get the number of scale levels.
    pub fn num_levels(&self) -> usize {
        self.sigmas.len()
    }

    /// Get the sigma at a level index.
    pub fn sigma(&self, level: usize) -> Option<f32> {
        self.sigmas.get(level).copied()
    }

    /// Get the blurred image at a level index.
    ///
    /// # Errors
    ///
    /// Fails with [`ScaleSpaceError::NoImageSet`] before
    /// [`GaussianScaleSpace::set_image`] has been called.
    pub fn level(&self, level: usize) -> Result<&Image<f32, 1>, ScaleSpaceError> {
        if self.levels.is_empty() {
            return Err(ScaleSpaceError::NoImageSet);
        }
        self.levels
            .get(level)
            .ok_or(ScaleSpaceError::LevelOutOfBounds(level, self.sigmas.len()))
    }
}
