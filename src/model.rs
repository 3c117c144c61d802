//! Multinomial linear classifier parameters and the forward pass.
//!
//! A [`Model`] scores every class with `z[c] = b[c] + sum_k W[c][k] * x[k]` and turns the scores
//! into probabilities with softmax. Weights are row-major with shape `(num_classes,
//! feature_size)`, one row per class.
//!
//! Two layers of API are exposed, like the rest of the crate:
//!
//! - [`Model::predict`] validates shapes and returns [`Error::ShapeMismatch`].
//! - [`Model::forward_into`] and [`Model::sgd_step`] are the allocation-free hot path used by
//!   the training loop; they panic on misuse via `assert!`.

use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::data::Dataset;
use crate::loss::{argmax, softmax_in_place};
use crate::{Error, Result};

/// Half-width of the uniform range used by [`Model::reset`].
pub const INIT_RANGE: f64 = 0.05;

#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    feature_size: usize,
    num_classes: usize,
    learning_rate: f32,
    /// Row-major matrix with shape (num_classes, feature_size).
    weights: Vec<f64>,
    biases: Vec<f64>,
}

/// The outcome of one forward pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    probabilities: Vec<f64>,
    most_likely: usize,
}

impl Prediction {
    /// Per-class probabilities (sum to 1).
    #[inline]
    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    /// Probability of `class`, if in range.
    #[inline]
    pub fn probability(&self, class: usize) -> Option<f64> {
        self.probabilities.get(class).copied()
    }

    /// Index of the highest-probability class (lowest index on ties).
    #[inline]
    pub fn most_likely(&self) -> usize {
        self.most_likely
    }

    /// Probability of the predicted class.
    #[inline]
    pub fn confidence(&self) -> f64 {
        self.probabilities[self.most_likely]
    }

    /// Name of the predicted class in `data`.
    pub fn class_name<'a>(&self, data: &'a Dataset) -> Option<&'a str> {
        data.class_name(self.most_likely)
    }
}

impl Model {
    /// A model with all weights and biases set to zero.
    pub fn new(feature_size: usize, num_classes: usize, learning_rate: f32) -> Result<Self> {
        validate_dims(feature_size, num_classes)?;
        validate_learning_rate(learning_rate)?;

        let len = param_len(feature_size, num_classes)?;
        Ok(Self {
            feature_size,
            num_classes,
            learning_rate,
            weights: vec![0.0; len],
            biases: vec![0.0; num_classes],
        })
    }

    /// A model initialized with [`Model::reset`] from a deterministic seed.
    pub fn new_with_seed(
        feature_size: usize,
        num_classes: usize,
        learning_rate: f32,
        seed: u64,
    ) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::new_with_rng(feature_size, num_classes, learning_rate, &mut rng)
    }

    /// A model initialized with [`Model::reset`] from `rng`.
    pub fn new_with_rng<R: Rng + ?Sized>(
        feature_size: usize,
        num_classes: usize,
        learning_rate: f32,
        rng: &mut R,
    ) -> Result<Self> {
        let mut model = Self::new(feature_size, num_classes, learning_rate)?;
        model.reset(rng);
        Ok(model)
    }

    /// Build a model from explicit parameters.
    ///
    /// Validates dimensions, parameter lengths, the learning rate, and that every parameter is
    /// finite.
    pub fn from_parts(
        feature_size: usize,
        num_classes: usize,
        learning_rate: f32,
        weights: Vec<f64>,
        biases: Vec<f64>,
    ) -> Result<Self> {
        let model =
            Self::from_raw_parts(feature_size, num_classes, learning_rate, weights, biases)?;
        if model.weights.iter().chain(&model.biases).any(|v| !v.is_finite()) {
            return Err(Error::InvalidData(
                "parameters must contain only finite values".to_owned(),
            ));
        }
        Ok(model)
    }

    /// Like [`Model::from_parts`] but accepts any parameter values, so a binary file always
    /// reloads to exactly the model that wrote it.
    pub(crate) fn from_raw_parts(
        feature_size: usize,
        num_classes: usize,
        learning_rate: f32,
        weights: Vec<f64>,
        biases: Vec<f64>,
    ) -> Result<Self> {
        validate_dims(feature_size, num_classes)?;
        validate_learning_rate(learning_rate)?;

        let expected = param_len(feature_size, num_classes)?;
        if weights.len() != expected {
            return Err(Error::InvalidData(format!(
                "weights length {} does not match num_classes * feature_size ({num_classes} * {feature_size})",
                weights.len()
            )));
        }
        if biases.len() != num_classes {
            return Err(Error::InvalidData(format!(
                "biases length {} does not match num_classes {num_classes}",
                biases.len()
            )));
        }

        Ok(Self {
            feature_size,
            num_classes,
            learning_rate,
            weights,
            biases,
        })
    }

    /// Reinitialize: weights uniform in `[-INIT_RANGE, INIT_RANGE]`, biases zero.
    ///
    /// Random weights break the symmetry between classes before the first update.
    pub fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let dist = Uniform::new_inclusive(-INIT_RANGE, INIT_RANGE);
        for w in &mut self.weights {
            *w = dist.sample(rng);
        }
        self.biases.fill(0.0);
    }

    /// [`Model::reset`] with a deterministic seed.
    pub fn reset_with_seed(&mut self, seed: u64) {
        let mut rng = StdRng::seed_from_u64(seed);
        self.reset(&mut rng);
    }

    #[inline]
    pub fn feature_size(&self) -> usize {
        self.feature_size
    }

    #[inline]
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    #[inline]
    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    /// Row-major `(num_classes, feature_size)` weights.
    #[inline]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Weights of a single class.
    #[inline]
    pub fn class_weights(&self, class: usize) -> Option<&[f64]> {
        if class >= self.num_classes {
            return None;
        }
        let start = class * self.feature_size;
        Some(&self.weights[start..start + self.feature_size])
    }

    #[inline]
    pub fn biases(&self) -> &[f64] {
        &self.biases
    }

    #[inline]
    pub fn weights_mut(&mut self) -> &mut [f64] {
        &mut self.weights
    }

    #[inline]
    pub fn biases_mut(&mut self) -> &mut [f64] {
        &mut self.biases
    }

    /// Shape-checked forward pass.
    ///
    /// Returns [`Error::ShapeMismatch`] if `features.len() != self.feature_size()`.
    pub fn predict(&self, features: &[f64]) -> Result<Prediction> {
        if features.len() != self.feature_size {
            return Err(Error::ShapeMismatch(format!(
                "sample has {} features, model expects {}",
                features.len(),
                self.feature_size
            )));
        }

        let mut probabilities = vec![0.0; self.num_classes];
        let most_likely = self.forward_into(features, &mut probabilities);
        Ok(Prediction {
            probabilities,
            most_likely,
        })
    }

    /// Forward pass for a single sample into a caller-owned buffer.
    ///
    /// Writes class probabilities into `probabilities` and returns the arg-max class.
    ///
    /// Shape contract:
    /// - `features.len() == self.feature_size()`
    /// - `probabilities.len() == self.num_classes()`
    #[inline]
    pub fn forward_into(&self, features: &[f64], probabilities: &mut [f64]) -> usize {
        assert_eq!(
            features.len(),
            self.feature_size,
            "features len {} does not match model feature_size {}",
            features.len(),
            self.feature_size
        );
        assert_eq!(
            probabilities.len(),
            self.num_classes,
            "probabilities len {} does not match model num_classes {}",
            probabilities.len(),
            self.num_classes
        );

        for (c, out) in probabilities.iter_mut().enumerate() {
            let row = &self.weights[c * self.feature_size..(c + 1) * self.feature_size];
            let mut sum = self.biases[c];
            for (&w, &x) in row.iter().zip(features) {
                sum = w.mul_add(x, sum);
            }
            *out = sum;
        }

        softmax_in_place(probabilities);
        argmax(probabilities)
    }

    /// Applies one SGD update from a per-class score gradient.
    ///
    /// `w[c][k] -= lr * d_scores[c] * x[k]` and `b[c] -= lr * d_scores[c]`.
    ///
    /// Shape contract:
    /// - `features.len() == self.feature_size()`
    /// - `d_scores.len() == self.num_classes()`
    #[inline]
    pub fn sgd_step(&mut self, features: &[f64], d_scores: &[f64]) {
        assert_eq!(
            features.len(),
            self.feature_size,
            "features len {} does not match model feature_size {}",
            features.len(),
            self.feature_size
        );
        assert_eq!(
            d_scores.len(),
            self.num_classes,
            "d_scores len {} does not match model num_classes {}",
            d_scores.len(),
            self.num_classes
        );

        let lr = f64::from(self.learning_rate);
        for (c, &error) in d_scores.iter().enumerate() {
            let step = lr * error;
            let row = &mut self.weights[c * self.feature_size..(c + 1) * self.feature_size];
            for (w, &x) in row.iter_mut().zip(features) {
                *w = (-step).mul_add(x, *w);
            }
            self.biases[c] -= step;
        }
    }
}

fn validate_dims(feature_size: usize, num_classes: usize) -> Result<()> {
    if feature_size == 0 || num_classes == 0 {
        return Err(Error::InvalidConfig(format!(
            "model dims must be > 0, got feature_size={feature_size} num_classes={num_classes}"
        )));
    }
    Ok(())
}

pub(crate) fn validate_learning_rate(learning_rate: f32) -> Result<()> {
    if !(learning_rate.is_finite() && learning_rate > 0.0) {
        return Err(Error::InvalidConfig(format!(
            "learning rate must be finite and > 0, got {learning_rate}"
        )));
    }
    Ok(())
}

pub(crate) fn param_len(feature_size: usize, num_classes: usize) -> Result<usize> {
    feature_size.checked_mul(num_classes).ok_or_else(|| {
        Error::Allocation(format!(
            "weight shape {num_classes}x{feature_size} overflows usize"
        ))
    })
}
