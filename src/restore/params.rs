//! User-facing restoration parameters.
//!
//! The raw knobs follow the plug-in dialog: integer-ish sliders for the blur
//! model, a `lambda` strength in `0..=10000` and an "area smoothness"
//! `lambda_min` in `0..=100`. [`RefocusParams::regularization`] maps the last
//! two onto the engine's global strength and the lambda-field floor.
use serde::{Deserialize, Serialize};

use crate::boundary::Boundary;
use crate::error::{RefocusError, Result};
use crate::hopfield::LAMBDA_EPS;
use crate::kernel::BlurModel;
use crate::lambda::MAX_WINDOW;

/// Upper end of the `lambda` slider.
pub const LAMBDA_MAX: f64 = 10_000.0;
/// Upper end of the `lambda_min` slider.
pub const LAMBDA_MIN_MAX: f64 = 100.0;
/// A lambda floor at or above this disables area smoothing.
pub const LAMBDA_MIN_USABLE_MAX: f64 = 0.999;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefocusParams {
    /// Defocus disk radius (px), `0..=32`.
    pub radius: f64,
    /// Gaussian blur sigma (px), `0..=32`.
    pub gauss: f64,
    /// Motion blur length (px), `0..=32`.
    pub motion: f64,
    /// Motion direction in degrees, `[0, 360)`.
    pub motion_angle: f64,
    /// Regularization strength, `0..=10000`.
    pub lambda: f64,
    /// Area smoothness, `0..=100`; larger values let edges keep less smoothing.
    pub lambda_min: f64,
    /// Half-size of the local variance window, `1..=16`.
    pub window: usize,
    /// Number of outer iterations, `1..=200` from the dialog (0 is accepted).
    pub iterations: usize,
    /// Recompute the lambda fields before every iteration.
    pub adaptive_smoothing: bool,
    pub boundary: Boundary,
    /// Seed of the step-size generator.
    pub seed: u64,
}

impl Default for RefocusParams {
    fn default() -> Self {
        Self {
            radius: 6.0,
            gauss: 0.0,
            motion: 0.0,
            motion_angle: 0.0,
            lambda: 100.0,
            lambda_min: 30.0,
            window: 3,
            iterations: 100,
            adaptive_smoothing: true,
            boundary: Boundary::Mirror,
            seed: 0,
        }
    }
}

/// Derived regularization settings of one run.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Regularization {
    /// Global strength handed to every engine.
    pub lambda: f64,
    /// Floor of the lambda fields.
    pub lambda_min: f64,
    /// Lambda fields are built at all.
    pub smooth: bool,
    /// Lambda fields are recomputed every iteration.
    pub adaptive: bool,
}

impl RefocusParams {
    /// Copy with every field clamped into the dialog ranges.
    pub fn clamped(&self) -> Self {
        let clamp = |v: f64, hi: f64| if v.is_finite() { v.clamp(0.0, hi) } else { 0.0 };
        let angle = if self.motion_angle.is_finite() {
            self.motion_angle.rem_euclid(360.0)
        } else {
            0.0
        };
        Self {
            radius: clamp(self.radius, 32.0),
            gauss: clamp(self.gauss, 32.0),
            motion: clamp(self.motion, 32.0),
            motion_angle: if angle >= 360.0 { 0.0 } else { angle },
            lambda: clamp(self.lambda, LAMBDA_MAX),
            lambda_min: clamp(self.lambda_min, LAMBDA_MIN_MAX),
            window: self.window.clamp(1, MAX_WINDOW),
            iterations: self.iterations.min(200),
            ..self.clone()
        }
    }

    /// Reject non-finite or negative values and windows outside `1..=16`.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("radius", self.radius),
            ("gauss", self.gauss),
            ("motion", self.motion),
            ("lambda", self.lambda),
            ("lambda_min", self.lambda_min),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(RefocusError::InvalidInput(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
        }
        if !self.motion_angle.is_finite() {
            return Err(RefocusError::InvalidInput(format!(
                "motion_angle must be finite, got {}",
                self.motion_angle
            )));
        }
        if !(1..=MAX_WINDOW).contains(&self.window) {
            return Err(RefocusError::InvalidInput(format!(
                "window must lie in 1..={MAX_WINDOW}, got {}",
                self.window
            )));
        }
        Ok(())
    }

    /// `lambda_min = exp(-lambda_min / 4)`, `lambda = lambda / 10000 · 0.001 / lambda_min`.
    pub fn regularization(&self) -> Regularization {
        let lambda_min = (-self.lambda_min / 4.0).exp();
        let lambda = self.lambda / LAMBDA_MAX * 0.001 / lambda_min;
        let smooth = lambda > LAMBDA_EPS && lambda_min < LAMBDA_MIN_USABLE_MAX;
        Regularization {
            lambda,
            lambda_min,
            smooth,
            adaptive: self.adaptive_smoothing && smooth,
        }
    }

    pub fn blur_model(&self) -> BlurModel {
        BlurModel {
            defocus_radius: self.radius,
            gauss_sigma: self.gauss,
            motion_length: self.motion,
            motion_angle_deg: self.motion_angle,
        }
    }
}
