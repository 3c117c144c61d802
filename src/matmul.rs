//! Strided GEMM kernel behind `Matrix::multiply` and `Matrix::transpose`.
//!
//! A plain triple loop accumulating in `f64` with fused multiply-add. Strides let callers
//! describe row-major, column-major or transposed views of the same buffer without copying.

/// Computes `C = A * B` where `A` is `(m, k)` and `B` is `(k, n)`.
///
/// `rs*`/`cs*` are the row and column strides of each operand. `c` is overwritten.
#[allow(clippy::too_many_arguments)]
#[inline]
pub(crate) fn gemm_f64(
    m: usize,
    n: usize,
    k: usize,
    a: &[f64],
    rsa: usize,
    csa: usize,
    b: &[f64],
    rsb: usize,
    csb: usize,
    c: &mut [f64],
    rsc: usize,
    csc: usize,
) {
    debug_assert!(rsa > 0 || m <= 1);
    debug_assert!(csa > 0 || k <= 1);
    debug_assert!(rsb > 0 || k <= 1);
    debug_assert!(csb > 0 || n <= 1);
    debug_assert!(rsc > 0 || m <= 1);
    debug_assert!(csc > 0 || n <= 1);

    // Bounds are validated by `Matrix`; keep this minimal and inlineable.
    for i in 0..m {
        let a0 = i * rsa;
        for j in 0..n {
            let b0 = j * csb;
            let mut acc = 0.0_f64;
            for p in 0..k {
                acc = a[a0 + p * csa].mul_add(b[p * rsb + b0], acc);
            }
            c[i * rsc + j * csc] = acc;
        }
    }
}

/// Copies an `(rows, cols)` row-major buffer into `out` as its `(cols, rows)` transpose.
#[inline]
pub(crate) fn transpose_into(rows: usize, cols: usize, src: &[f64], out: &mut [f64]) {
    debug_assert_eq!(src.len(), rows * cols);
    debug_assert_eq!(out.len(), rows * cols);

    for r in 0..rows {
        let row = &src[r * cols..(r + 1) * cols];
        for (c, &v) in row.iter().enumerate() {
            out[c * rows + r] = v;
        }
    }
}
