//! Multi scale interest point detection from the Hessian.
//!
//! Candidates are spatial maxima of a scale normalized Hessian response at
//! each level of a gaussian scale space, then confirmed across scale with
//! the normalized Laplacian. A blob of size sigma produces its strongest
//! Laplacian magnitude at the level whose sigma matches it, which pins the
//! detection to the right scale.

use scalepoint_image::{Image, ImageError};

use crate::filter::kernels::KernelFamily;
use crate::filter::BorderMode;
use crate::gradient::gradient;
use crate::hessian::hessian_from_gradient;
use crate::scale_space::{GaussianScaleSpace, ScaleSpaceError};

/// Errors that can occur during interest point detection.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum DetectError {
    /// The scale space has too few levels for cross scale confirmation.
    #[error("scale space needs at least 3 levels for detection, got {0}")]
    EmptyScaleSpace(usize),

    /// The detector configuration is invalid.
    #[error("invalid detector configuration: {0}")]
    InvalidConfiguration(String),

    /// Error from the scale space.
    #[error(transparent)]
    ScaleSpace(#[from] ScaleSpaceError),

    /// Error from the underlying image operations.
    #[error(transparent)]
    Image(#[from] ImageError),
}

/// The per pixel response the spatial maxima are taken over.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResponseFunction {
    /// Determinant of the Hessian, scaled by sigma to the fourth power.
    Determinant,
    /// Magnitude of the Hessian trace, scaled by sigma squared.
    Trace,
    /// Harris style determinant minus weighted squared trace.
    Harris {
        /// Weight of the squared trace term, typically 0.04.
        k: f32,
    },
}

/// An interest point found in the scale space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterestPoint {
    /// Column of the point in pixels.
    pub x: usize,
    /// Row of the point in pixels.
    pub y: usize,
    /// Sigma of the scale level the point was confirmed at.
    pub sigma: f32,
    /// Scale normalized response at the point.
    pub response: f32,
}

/// Configuration for [`HessianLaplaceDetector`].
#[derive(Debug, Clone, PartialEq)]
pub struct HessianLaplaceConfig {
    /// Radius of the square non maximum suppression window.
    pub radius: usize,
    /// Minimum response a candidate must exceed.
    pub response_floor: f32,
    /// Maximum number of points kept, strongest first.
    pub max_features: usize,
    /// Derivative kernel family used for the Hessian.
    pub family: KernelFamily,
    /// Response the spatial maxima are taken over.
    pub response: ResponseFunction,
}

impl Default for HessianLaplaceConfig {
    fn default() -> Self {
        Self {
            radius: 2,
            response_floor: 0.0,
            max_features: 500,
            family: KernelFamily::Sobel,
            response: ResponseFunction::Determinant,
        }
    }
}

/// Response and Laplacian planes for one scale level.
struct LevelResponse {
    sigma: f32,
    response: Image<f32, 1>,
    laplacian: Image<f32, 1>,
}

/// Scale space interest point detector.
///
/// # Examples
///
/// ```
/// use scalepoint_image::{Image, ImageSize};
/// use scalepoint_imgproc::features::{HessianLaplaceConfig, HessianLaplaceDetector};
/// use scalepoint_imgproc::scale_space::GaussianScaleSpace;
///
/// let image = Image::<f32, 1>::from_size_val(
///     ImageSize { width: 32, height: 32 },
///     0.0,
/// ).unwrap();
///
/// let mut ss = GaussianScaleSpace::new(vec![1.2, 2.4, 3.6]).unwrap();
/// ss.set_image(&image).unwrap();
///
/// let mut detector = HessianLaplaceDetector::new(HessianLaplaceConfig::default()).unwrap();
/// detector.detect(&ss).unwrap();
/// assert!(detector.interest_points().is_empty());
/// ```
pub struct HessianLaplaceDetector {
    config: HessianLaplaceConfig,
    points: Vec<InterestPoint>,
}

impl HessianLaplaceDetector {
    /// Create a detector with the given configuration.
    ///
    /// # Errors
    ///
    /// Fails if the suppression radius or the feature cap is zero, or the
    /// response floor is negative.
    pub fn new(config: HessianLaplaceConfig) -> Result<Self, DetectError> {
        if config.radius == 0 {
            return Err(DetectError::InvalidConfiguration(
                "suppression radius must be at least 1".to_string(),
            ));
        }
        if config.max_features == 0 {
            return Err(DetectError::InvalidConfiguration(
                "max_features must be at least 1".to_string(),
            ));
        }
        if !(config.response_floor >= 0.0) {
            return Err(DetectError::InvalidConfiguration(format!(
                "response floor must be non negative, got {}",
                config.response_floor
            )));
        }
        Ok(Self {
            config,
            points: Vec::new(),
        })
    }

    /// Run detection over a scale space with an assigned image.
    ///
    /// Previously detected points are discarded. Points are stored
    /// strongest response first, capped at the configured maximum; ties
    /// keep scan order.
    pub fn detect(&mut self, scale_space: &GaussianScaleSpace) -> Result<(), DetectError> {
        self.points.clear();

        let num_levels = scale_space.num_levels();
        if num_levels < 3 {
            return Err(DetectError::EmptyScaleSpace(num_levels));
        }

        let mut levels = Vec::with_capacity(num_levels);
        for i in 0..num_levels {
            let image = scale_space.level(i)?;
            let sigma = match scale_space.sigma(i) {
                Some(sigma) => sigma,
                None => return Err(DetectError::EmptyScaleSpace(num_levels)),
            };
            levels.push(self.compute_level(image, sigma)?);
        }

        for i in 0..num_levels {
            self.detect_level(&levels, i);
        }

        self.points
            .sort_by(|a, b| b.response.total_cmp(&a.response));
        self.points.truncate(self.config.max_features);

        Ok(())
    }

    /// Get the points found by the last call to [`HessianLaplaceDetector::detect`].
    pub fn interest_points(&self) -> &[InterestPoint] {
        &self.points
    }

    fn compute_level(
        &self,
        image: &Image<f32, 1>,
        sigma: f32,
    ) -> Result<LevelResponse, ImageError> {
        let size = image.size();
        let mut dx = Image::from_size_val(size, 0.0f32)?;
        let mut dy = Image::from_size_val(size, 0.0f32)?;
        gradient(image, &mut dx, &mut dy, self.config.family, BorderMode::Clip)?;

        let mut ixx = Image::from_size_val(size, 0.0f32)?;
        let mut iyy = Image::from_size_val(size, 0.0f32)?;
        let mut ixy = Image::from_size_val(size, 0.0f32)?;
        hessian_from_gradient(
            &dx,
            &dy,
            &mut ixx,
            &mut iyy,
            &mut ixy,
            self.config.family,
            BorderMode::Clip,
        )?;

        let scale2 = sigma * sigma;
        let scale4 = scale2 * scale2;
        let response_fn = self.config.response;

        let mut response = Image::from_size_val(size, 0.0f32)?;
        let mut laplacian = Image::from_size_val(size, 0.0f32)?;
        for (((&xx, &yy), &xy), (resp, lap)) in ixx
            .as_slice()
            .iter()
            .zip(iyy.as_slice())
            .zip(ixy.as_slice())
            .zip(
                response
                    .as_slice_mut()
                    .iter_mut()
                    .zip(laplacian.as_slice_mut()),
            )
        {
            let trace = xx + yy;
            let det = xx * yy - xy * xy;
            *lap = trace * scale2;
            *resp = match response_fn {
                ResponseFunction::Determinant => det * scale4,
                ResponseFunction::Trace => trace.abs() * scale2,
                ResponseFunction::Harris { k } => (det - k * trace * trace) * scale4,
            };
        }

        Ok(LevelResponse {
            sigma,
            response,
            laplacian,
        })
    }

    fn detect_level(&mut self, levels: &[LevelResponse], level: usize) {
        let sigma = levels[level].sigma;
        let response = &levels[level].response;
        let cols = response.cols();
        let rows = response.rows();
        let radius = self.config.radius;

        // keep the window inside the image and away from the border pixels
        // where the clipped derivative support distorts the response
        let margin = radius.max(2);
        if cols <= 2 * margin || rows <= 2 * margin {
            return;
        }

        let resp = response.as_slice();
        let lap = levels[level].laplacian.as_slice();
        // the first and last level compare against their single neighbor
        let lap_below = level.checked_sub(1).map(|i| levels[i].laplacian.as_slice());
        let lap_above = levels.get(level + 1).map(|l| l.laplacian.as_slice());

        for y in margin..rows - margin {
            for x in margin..cols - margin {
                let idx = y * cols + x;
                let value = resp[idx];
                if !(value > self.config.response_floor) {
                    continue;
                }

                let mut is_max = true;
                'window: for wy in y - radius..=y + radius {
                    for wx in x - radius..=x + radius {
                        if wx == x && wy == y {
                            continue;
                        }
                        if resp[wy * cols + wx] > value {
                            is_max = false;
                            break 'window;
                        }
                    }
                }
                if !is_max {
                    continue;
                }

                let magnitude = lap[idx].abs();
                if lap_below.is_some_and(|below| magnitude < below[idx].abs())
                    || lap_above.is_some_and(|above| magnitude < above[idx].abs())
                {
                    continue;
                }

                self.points.push(InterestPoint {
                    x,
                    y,
                    sigma,
                    response: value,
                });
            }
        }
    }
}
