//! Online SGD training and evaluation for [`Model`].
//!
//! Training visits every sample of every training batch in source order and updates the model
//! after each one. There is no shuffling, momentum, regularization or learning-rate decay, so a
//! run is fully determined by the initial parameters and the dataset.

use log::{debug, info};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::loss::{cross_entropy, softmax_cross_entropy_backward};
use crate::metrics::{ConfusionMatrix, EvalReport};
use crate::{Batch, Dataset, Error, Model, Result};

/// How much the training loop logs.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Nothing.
    Quiet,
    /// One `info` line per epoch.
    #[default]
    Epochs,
    /// Per-epoch lines plus a `debug` line for the first `limit` samples of each epoch.
    Samples { limit: usize },
}

impl Verbosity {
    #[inline]
    fn logs_epochs(self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }

    #[inline]
    fn sample_limit(self) -> usize {
        match self {
            Verbosity::Samples { limit } => limit,
            Verbosity::Quiet | Verbosity::Epochs => 0,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrainConfig {
    pub epochs: usize,
    pub verbosity: Verbosity,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            epochs: 10,
            verbosity: Verbosity::Epochs,
        }
    }
}

impl TrainConfig {
    pub fn new(epochs: usize) -> Self {
        Self {
            epochs,
            ..Self::default()
        }
    }

    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(Error::InvalidConfig("epochs must be > 0".to_owned()));
        }
        Ok(())
    }

    /// Parse a config from JSON. Missing fields take their defaults.
    #[cfg(feature = "serde")]
    pub fn from_json_str(s: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(s)
            .map_err(|e| Error::InvalidConfig(format!("failed to parse train config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochReport {
    /// 1-based epoch number.
    pub epoch: usize,
    /// `total_loss / samples`.
    pub avg_loss: f64,
    pub samples: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainReport {
    pub epochs: Vec<EpochReport>,
}

impl TrainReport {
    /// Average loss of the last epoch.
    pub fn final_loss(&self) -> Option<f64> {
        self.epochs.last().map(|e| e.avg_loss)
    }
}

impl Model {
    /// Train on `data`'s training batches for `cfg.epochs` epochs of online SGD.
    ///
    /// For each sample the score gradient `probability - one_hot(label)` is applied immediately:
    /// `w[c][k] -= lr * error[c] * x[k]`, `b[c] -= lr * error[c]`.
    ///
    /// Errors:
    /// - [`Error::InvalidConfig`] if `cfg` is invalid
    /// - [`Error::NoData`] if there are no training samples
    /// - [`Error::ShapeMismatch`] if the dataset's feature size or class count differ from the
    ///   model's
    pub fn train(&mut self, data: &Dataset, cfg: &TrainConfig) -> Result<TrainReport> {
        cfg.validate()?;
        if data.train_len() == 0 {
            return Err(Error::NoData("dataset has no training samples".to_owned()));
        }
        self.check_dataset(data)?;

        let mut probabilities = vec![0.0_f64; self.num_classes()];
        let mut d_scores = vec![0.0_f64; self.num_classes()];
        let sample_limit = cfg.verbosity.sample_limit();
        let mut epochs = Vec::with_capacity(cfg.epochs);

        for epoch in 1..=cfg.epochs {
            let mut total_loss = 0.0_f64;
            let mut seen = 0_usize;

            for sample in data.train_batches().iter().flat_map(Batch::iter) {
                let predicted = self.forward_into(sample.features(), &mut probabilities);
                let loss =
                    softmax_cross_entropy_backward(&probabilities, sample.label(), &mut d_scores);
                total_loss += loss;
                self.sgd_step(sample.features(), &d_scores);

                if seen < sample_limit {
                    debug!(
                        "epoch {epoch} sample {seen}: label={} predicted={predicted} loss={loss:.6}",
                        sample.label()
                    );
                }
                seen += 1;
            }

            if seen == 0 {
                return Err(Error::NoData(format!("epoch {epoch} saw no samples")));
            }

            let avg_loss = total_loss / seen as f64;
            if cfg.verbosity.logs_epochs() {
                info!("epoch {epoch}/{}: avg_loss={avg_loss:.4}", cfg.epochs);
            }
            epochs.push(EpochReport {
                epoch,
                avg_loss,
                samples: seen,
            });
        }

        Ok(TrainReport { epochs })
    }

    /// Evaluate on `data`'s test batches.
    pub fn test(&self, data: &Dataset) -> Result<EvalReport> {
        self.check_dataset(data)?;
        let report = self.evaluate(data.test_batches())?;
        info!(
            "test accuracy: {:.2}% average loss: {:.4}",
            report.accuracy, report.avg_loss
        );
        Ok(report)
    }

    /// Accuracy, mean clamped cross-entropy and confusion matrix over `batches`.
    ///
    /// Errors with [`Error::NoData`] if `batches` hold no samples and with
    /// [`Error::ShapeMismatch`] if a sample does not fit the model.
    pub fn evaluate(&self, batches: &[Batch]) -> Result<EvalReport> {
        let mut probabilities = vec![0.0_f64; self.num_classes()];
        let mut confusion = ConfusionMatrix::new(self.num_classes());
        let mut total_loss = 0.0_f64;
        let mut correct = 0_usize;
        let mut samples = 0_usize;

        for sample in batches.iter().flat_map(Batch::iter) {
            if sample.feature_size() != self.feature_size() {
                return Err(Error::ShapeMismatch(format!(
                    "sample has {} features, model expects {}",
                    sample.feature_size(),
                    self.feature_size()
                )));
            }
            if sample.label() >= self.num_classes() {
                return Err(Error::ShapeMismatch(format!(
                    "label {} out of range for {} classes",
                    sample.label(),
                    self.num_classes()
                )));
            }

            let predicted = self.forward_into(sample.features(), &mut probabilities);
            total_loss += cross_entropy(probabilities[sample.label()]);
            if predicted == sample.label() {
                correct += 1;
            }
            confusion.record(sample.label(), predicted);
            samples += 1;
        }

        if samples == 0 {
            return Err(Error::NoData("no samples to evaluate".to_owned()));
        }

        Ok(EvalReport {
            accuracy: 100.0 * correct as f64 / samples as f64,
            avg_loss: total_loss / samples as f64,
            correct,
            samples,
            confusion,
        })
    }

    fn check_dataset(&self, data: &Dataset) -> Result<()> {
        if data.num_classes() != self.num_classes() {
            return Err(Error::ShapeMismatch(format!(
                "dataset has {} classes, model has {}",
                data.num_classes(),
                self.num_classes()
            )));
        }
        let has_samples = data.train_len() > 0 || data.test_len() > 0;
        if has_samples && data.feature_size() != self.feature_size() {
            return Err(Error::ShapeMismatch(format!(
                "dataset feature size {} does not match model feature_size {}",
                data.feature_size(),
                self.feature_size()
            )));
        }
        Ok(())
    }
}
