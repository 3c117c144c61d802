//! Softmax and cross-entropy.
//!
//! These are small, allocation-free helpers used by the classifier like:
//!
//! - compute raw class scores `z = W x + b`
//! - normalize them in place with [`softmax_in_place`]
//! - compute the loss with [`cross_entropy`] and the score gradient with
//!   [`softmax_cross_entropy_backward`]

/// Probability floor/ceiling used before taking a logarithm.
pub const PROB_EPSILON: f64 = 1e-9;

/// Normalize `scores` into a probability distribution, in place.
///
/// Subtracts the max score before exponentiating so large scores cannot overflow, then divides
/// by the sum.
///
/// Panics if `scores` is empty.
#[inline]
pub fn softmax_in_place(scores: &mut [f64]) {
    assert!(!scores.is_empty(), "softmax requires at least 1 class");

    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let mut sum = 0.0_f64;
    for v in scores.iter_mut() {
        *v = (*v - max).exp();
        sum += *v;
    }

    let inv_sum = 1.0 / sum;
    for v in scores.iter_mut() {
        *v *= inv_sum;
    }
}

/// Softmax into a new vector.
#[inline]
pub fn softmax(scores: &[f64]) -> Vec<f64> {
    let mut out = scores.to_vec();
    softmax_in_place(&mut out);
    out
}

/// Cross-entropy of the probability assigned to the true class: `-ln(p)`.
///
/// `p` is clamped into `[PROB_EPSILON, 1 - PROB_EPSILON]` so a zero probability yields a large
/// finite loss instead of infinity.
#[inline]
pub fn cross_entropy(p_true: f64) -> f64 {
    -p_true.clamp(PROB_EPSILON, 1.0 - PROB_EPSILON).ln()
}

/// Gradient of softmax cross-entropy w.r.t. the pre-softmax scores.
///
/// Writes `d_scores[c] = probabilities[c] - one_hot(label)[c]` and returns the loss.
///
/// Shape contract:
/// - `probabilities.len() == d_scores.len()`
/// - `label < probabilities.len()`
#[inline]
pub fn softmax_cross_entropy_backward(
    probabilities: &[f64],
    label: usize,
    d_scores: &mut [f64],
) -> f64 {
    assert_eq!(
        probabilities.len(),
        d_scores.len(),
        "probabilities len {} does not match d_scores len {}",
        probabilities.len(),
        d_scores.len()
    );
    assert!(
        label < probabilities.len(),
        "label {label} out of range for {} classes",
        probabilities.len()
    );

    for (c, (d, &p)) in d_scores.iter_mut().zip(probabilities).enumerate() {
        *d = if c == label { p - 1.0 } else { p };
    }

    cross_entropy(probabilities[label])
}

/// Index of the largest value (the first one on ties).
///
/// Panics if `xs` is empty.
#[inline]
pub fn argmax(xs: &[f64]) -> usize {
    assert!(!xs.is_empty(), "argmax requires at least 1 value");

    let mut best = 0;
    for (i, &v) in xs.iter().enumerate().skip(1) {
        if v > xs[best] {
            best = i;
        }
    }
    best
}
