//! From-scratch linear models.
//!
//! `rust-linmodels` implements two small numerical learning primitives without any external
//! linear-algebra or ML library:
//!
//! - a dense [`Matrix`] engine (transpose, multiply, Gauss-Jordan inversion with partial
//!   pivoting) and an ordinary least-squares [`linear_regression`] solved through the normal
//!   equations
//! - a multinomial linear classifier ([`Model`]): softmax over per-class linear scores, trained
//!   by per-sample SGD on cross-entropy, with a flat binary parameter file
//!
//! # Panics vs `Result`
//!
//! - Low-level hot path (panics on misuse): [`Model::forward_into`], [`Model::sgd_step`],
//!   the helpers in [`loss`]. Shape mismatches are programmer error and trip `assert!`.
//! - Everything else validates its inputs and returns [`Result`].
//!
//! # Data layout
//!
//! - Scalars are `f64`; the learning rate is `f32` to match the persisted layout.
//! - [`Matrix`] and model weights are row-major. Weights have shape `(num_classes,
//!   feature_size)`.
//!
//! # Regression
//!
//! ```rust
//! # fn main() -> rust_linmodels::Result<()> {
//! let fit = rust_linmodels::linear_regression(&[1.0, 2.0, 3.0, 4.0], &[2.0, 4.0, 6.0, 8.0])?;
//! assert!((fit.slope() - 2.0).abs() < 1e-9);
//! assert!((fit.r_squared() - 1.0).abs() < 1e-9);
//! # Ok(())
//! # }
//! ```
//!
//! # Classification
//!
//! ```rust
//! use rust_linmodels::{Batch, Dataset, Model, Sample, TrainConfig};
//!
//! # fn main() -> rust_linmodels::Result<()> {
//! let train = Batch::new(vec![
//!     Sample::new(0, vec![1.0, 0.0]),
//!     Sample::new(1, vec![0.0, 1.0]),
//! ])?;
//! let names = vec!["left".to_owned(), "right".to_owned()];
//! let data = Dataset::new(vec![train.clone()], vec![train], 2, names)?;
//!
//! let mut model = Model::new_with_seed(2, 2, 0.5, 0)?;
//! model.train(&data, &TrainConfig::new(20))?;
//!
//! let pred = model.predict(&[0.9, 0.1])?;
//! assert_eq!(pred.most_likely(), 0);
//! assert_eq!(model.test(&data)?.accuracy, 100.0);
//! # Ok(())
//! # }
//! ```

pub mod data;
pub mod error;
pub mod loss;
pub(crate) mod matmul;
pub mod matrix;
pub mod metrics;
pub mod model;
pub mod persist;
pub mod regression;
pub mod train;

#[cfg(feature = "serde")]
pub mod serde_model;

pub use data::{Batch, Dataset, Sample};
pub use error::{Error, Result};
pub use matrix::Matrix;
pub use metrics::{ConfusionMatrix, EvalReport};
pub use model::{Model, Prediction};
pub use regression::{linear_regression, RegressionResult};
pub use train::{EpochReport, TrainConfig, TrainReport, Verbosity};
