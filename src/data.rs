//! Labeled samples grouped into fixed-size batches.
//!
//! The classifier consumes a [`Dataset`]: ordered train and test [`Batch`]es of [`Sample`]s, all
//! with one feature length, plus a class-name table. Batches can be built in memory or decoded
//! from byte records of the form `label byte + feature_size pixel bytes` (pixels scaled to
//! `[0, 1]` by dividing by 255).

use std::path::Path;

use log::debug;

use crate::{Error, Result};

/// Sample count per CIFAR-10 batch file.
pub const CIFAR10_BATCH_SIZE: usize = 10_000;
/// Pixels per CIFAR-10 image (32x32, 3 channels).
pub const CIFAR10_FEATURE_SIZE: usize = 32 * 32 * 3;
pub const CIFAR10_CLASS_NAMES: [&str; 10] = [
    "airplane",
    "automobile",
    "bird",
    "cat",
    "deer",
    "dog",
    "frog",
    "horse",
    "ship",
    "truck",
];
const CIFAR10_TRAIN_FILES: [&str; 5] = [
    "data_batch_1.bin",
    "data_batch_2.bin",
    "data_batch_3.bin",
    "data_batch_4.bin",
    "data_batch_5.bin",
];
const CIFAR10_TEST_FILES: [&str; 1] = ["test_batch.bin"];

/// One labeled example.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    label: usize,
    features: Vec<f64>,
}

impl Sample {
    pub fn new(label: usize, features: Vec<f64>) -> Self {
        Self { label, features }
    }

    /// Decode one record body: each byte becomes `byte / 255.0`.
    pub fn from_pixels(label: usize, pixels: &[u8]) -> Self {
        let features = pixels.iter().map(|&p| f64::from(p) / 255.0).collect();
        Self { label, features }
    }

    #[inline]
    pub fn label(&self) -> usize {
        self.label
    }

    #[inline]
    pub fn features(&self) -> &[f64] {
        &self.features
    }

    #[inline]
    pub fn feature_size(&self) -> usize {
        self.features.len()
    }
}

/// An ordered group of samples that share one feature length.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    samples: Vec<Sample>,
    feature_size: usize,
}

impl Batch {
    /// Build a batch from samples. All samples must have the same feature length.
    pub fn new(samples: Vec<Sample>) -> Result<Self> {
        let feature_size = samples.first().map_or(0, Sample::feature_size);
        for (i, s) in samples.iter().enumerate() {
            if s.feature_size() != feature_size {
                return Err(Error::InvalidData(format!(
                    "sample {i} has {} features, expected {feature_size}",
                    s.feature_size()
                )));
            }
        }
        Ok(Self {
            samples,
            feature_size,
        })
    }

    /// Decode exactly `num_samples` records of `1 + feature_size` bytes.
    ///
    /// Input that cannot fill `num_samples` records is rejected; a batch is never partial.
    /// Bytes after the last record are ignored.
    pub fn from_records(bytes: &[u8], feature_size: usize, num_samples: usize) -> Result<Self> {
        if feature_size == 0 {
            return Err(Error::InvalidData("feature_size must be > 0".to_owned()));
        }
        let record_len = feature_size + 1;
        let available = bytes.len() / record_len;
        if available < num_samples {
            return Err(Error::InvalidData(format!(
                "batch holds {available} complete records, expected {num_samples}"
            )));
        }

        let samples = bytes
            .chunks_exact(record_len)
            .take(num_samples)
            .map(|record| Sample::from_pixels(usize::from(record[0]), &record[1..]))
            .collect();

        Ok(Self {
            samples,
            feature_size,
        })
    }

    /// Read a batch file and decode it with [`Batch::from_records`].
    pub fn load<P: AsRef<Path>>(path: P, feature_size: usize, num_samples: usize) -> Result<Self> {
        let p = path.as_ref();
        let bytes = std::fs::read(p).map_err(|e| Error::io(p, e))?;
        let batch = Self::from_records(&bytes, feature_size, num_samples).map_err(|e| {
            Error::InvalidData(format!("unable to load batch {}: {e}", p.display()))
        })?;
        debug!("loaded {} samples from {}", batch.len(), p.display());
        Ok(batch)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[inline]
    pub fn feature_size(&self) -> usize {
        self.feature_size
    }

    #[inline]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Iterate the samples in source order.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }
}

impl<'a> IntoIterator for &'a Batch {
    type Item = &'a Sample;
    type IntoIter = std::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

/// Train and test batches plus class metadata.
#[derive(Debug, Clone)]
pub struct Dataset {
    train: Vec<Batch>,
    test: Vec<Batch>,
    feature_size: usize,
    num_classes: usize,
    class_names: Vec<String>,
}

impl Dataset {
    /// Build a dataset, validating that:
    /// - `class_names.len() == num_classes` and `num_classes > 0`
    /// - every non-empty batch has the same feature length
    /// - every label is `< num_classes`
    pub fn new(
        train: Vec<Batch>,
        test: Vec<Batch>,
        num_classes: usize,
        class_names: Vec<String>,
    ) -> Result<Self> {
        if num_classes == 0 {
            return Err(Error::InvalidData("num_classes must be > 0".to_owned()));
        }
        if class_names.len() != num_classes {
            return Err(Error::InvalidData(format!(
                "{} class names given for {num_classes} classes",
                class_names.len()
            )));
        }

        let mut feature_size = None;
        for batch in train.iter().chain(&test).filter(|b| !b.is_empty()) {
            match feature_size {
                None => feature_size = Some(batch.feature_size()),
                Some(fs) if fs != batch.feature_size() => {
                    return Err(Error::InvalidData(format!(
                        "batch feature size {} does not match {fs}",
                        batch.feature_size()
                    )));
                }
                Some(_) => {}
            }
            if let Some(s) = batch.iter().find(|s| s.label() >= num_classes) {
                return Err(Error::InvalidData(format!(
                    "label {} is out of range for {num_classes} classes",
                    s.label()
                )));
            }
        }

        Ok(Self {
            train,
            test,
            feature_size: feature_size.unwrap_or(0),
            num_classes,
            class_names,
        })
    }

    /// Load the binary CIFAR-10 layout from `root`: five training files and one test file of
    /// 10 000 records each.
    pub fn load_cifar10<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        let load_all = |names: &[&str]| -> Result<Vec<Batch>> {
            names
                .iter()
                .map(|name| {
                    Batch::load(root.join(name), CIFAR10_FEATURE_SIZE, CIFAR10_BATCH_SIZE)
                })
                .collect()
        };

        let train = load_all(&CIFAR10_TRAIN_FILES)?;
        let test = load_all(&CIFAR10_TEST_FILES)?;
        let class_names = CIFAR10_CLASS_NAMES.iter().map(|s| (*s).to_owned()).collect();

        Self::new(train, test, CIFAR10_CLASS_NAMES.len(), class_names)
    }

    #[inline]
    pub fn train_batches(&self) -> &[Batch] {
        &self.train
    }

    #[inline]
    pub fn test_batches(&self) -> &[Batch] {
        &self.test
    }

    /// Feature length shared by every sample (0 if the dataset has no samples).
    #[inline]
    pub fn feature_size(&self) -> usize {
        self.feature_size
    }

    #[inline]
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    #[inline]
    pub fn class_names(&self) -> &[String] {
        &self.class_names
    }

    /// Human-readable name of `label`, if it is in range.
    #[inline]
    pub fn class_name(&self, label: usize) -> Option<&str> {
        self.class_names.get(label).map(String::as_str)
    }

    /// Number of training samples across all batches.
    pub fn train_len(&self) -> usize {
        self.train.iter().map(Batch::len).sum()
    }

    /// Number of test samples across all batches.
    pub fn test_len(&self) -> usize {
        self.test.iter().map(Batch::len).sum()
    }
}
