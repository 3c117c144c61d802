//! Evaluation metrics.
//!
//! Metrics are evaluation helpers (they do not participate in training). They are accumulated
//! sample by sample during [`crate::Model::test`].

use std::fmt;

/// Square confusion matrix. Rows are true labels, columns are predicted labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrix {
    num_classes: usize,
    /// Row-major (true, predicted) counts.
    counts: Vec<usize>,
}

impl ConfusionMatrix {
    pub fn new(num_classes: usize) -> Self {
        Self {
            num_classes,
            counts: vec![0; num_classes * num_classes],
        }
    }

    /// Count one prediction. Panics if either label is out of range.
    #[inline]
    pub fn record(&mut self, actual: usize, predicted: usize) {
        assert!(
            actual < self.num_classes && predicted < self.num_classes,
            "labels ({actual}, {predicted}) out of range for {} classes",
            self.num_classes
        );
        self.counts[actual * self.num_classes + predicted] += 1;
    }

    #[inline]
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Count of samples with true label `actual` predicted as `predicted`.
    #[inline]
    pub fn get(&self, actual: usize, predicted: usize) -> Option<usize> {
        if actual < self.num_classes && predicted < self.num_classes {
            Some(self.counts[actual * self.num_classes + predicted])
        } else {
            None
        }
    }

    /// Prediction counts for samples whose true label is `actual`.
    pub fn row(&self, actual: usize) -> Option<&[usize]> {
        if actual >= self.num_classes {
            return None;
        }
        let start = actual * self.num_classes;
        Some(&self.counts[start..start + self.num_classes])
    }

    /// Total samples recorded.
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Samples on the diagonal.
    pub fn correct(&self) -> usize {
        (0..self.num_classes)
            .map(|i| self.counts[i * self.num_classes + i])
            .sum()
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .counts
            .iter()
            .max()
            .map_or(1, |m| m.to_string().len())
            .max(4);
        for row in self.counts.chunks(self.num_classes.max(1)) {
            for v in row {
                write!(f, "{v:>width$} ")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Result of evaluating a model over a dataset's test batches.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalReport {
    /// Percentage of correctly classified samples, in `[0, 100]`.
    pub accuracy: f64,
    /// Mean clamped cross-entropy.
    pub avg_loss: f64,
    pub correct: usize,
    pub samples: usize,
    pub confusion: ConfusionMatrix,
}
