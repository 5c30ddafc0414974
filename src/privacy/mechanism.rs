//! Laplace mechanism.

use crate::preprocessing::error::PreprocessingError;
use rand::Rng;
use rand_distr::Exp1;

/// Adds Laplace noise with scale `sensitivity / epsilon`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Laplace {
    scale: f64,
}

impl Laplace {
    /// # Errors
    /// Returns [`PreprocessingError::InvalidParameter`] if `epsilon` is not
    /// positive and finite, or `sensitivity` is negative or non-finite.
    pub fn new(sensitivity: f64, epsilon: f64) -> Result<Self, PreprocessingError> {
        super::budget::validate_epsilon(epsilon)?;
        if !(sensitivity.is_finite() && sensitivity >= 0.0) {
            return Err(PreprocessingError::InvalidParameter(format!(
                "sensitivity must be non-negative and finite, got {sensitivity}"
            )));
        }
        Ok(Self {
            scale: sensitivity / epsilon,
        })
    }

    /// Noise scale `b` of the distribution.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Return `value` plus one Laplace(0, b) draw.
    pub fn randomise<R: Rng + ?Sized>(&self, value: f64, rng: &mut R) -> f64 {
        if self.scale == 0.0 {
            return value;
        }
        // The difference of two i.i.d. Exp(1) draws is Laplace(0, 1).
        let a: f64 = rng.sample(Exp1);
        let b: f64 = rng.sample(Exp1);
        value + self.scale * (a - b)
    }
}
