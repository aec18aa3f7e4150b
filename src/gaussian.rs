//! Separable Gaussian blur (C2): 1-D kernel generation and two-pass
//! convolution over a `DoubleMatrix`, plus the full-bitmap convenience
//! wrapper.

use std::f64::consts::PI;

use crate::bitmap::{Bitmap, Channel};
use crate::matrix::{self, DoubleMatrix};

pub const DEFAULT_SIGMA: f64 = 2.0;
pub const DEFAULT_NB_STDDEV: usize = 5;

/// Generate a normalised 1-D Gaussian kernel of length `n`. If `sigma == 0`
/// it is derived from `n` via `0.3*((n-1)*0.5-1)+0.8`, matching OpenCV's
/// well-known `getGaussianKernel` heuristic that the source copies.
pub fn generate_1d_kernel(sigma: f64, n: usize) -> DoubleMatrix {
    assert!(n >= 1, "kernel length must be >= 1");
    let sigma = if sigma == 0.0 {
        0.3 * ((n as f64 - 1.0) * 0.5 - 1.0) + 0.8
    } else {
        sigma
    };

    let half = (n / 2) as i32;
    let mut values = Vec::with_capacity(n);
    let variance = sigma * sigma;
    let norm = 1.0 / (2.0 * PI * variance).sqrt();
    for p in 0..n as i32 {
        let x = (p - half) as f64;
        values.push(norm * (-(x * x) / (2.0 * variance)).exp());
    }

    let sum: f64 = values.iter().sum();
    for v in &mut values {
        *v /= sum;
    }

    DoubleMatrix::from_values(n, 1, values)
}

/// Blur a single grayscale matrix: convolve with the kernel along x, then
/// (via transpose) along y.
pub fn blur_matrix(matrix: &DoubleMatrix, sigma: f64, nb_stddev: usize) -> DoubleMatrix {
    let kernel_row = generate_1d_kernel(sigma, nb_stddev);
    let pass1 = matrix.convolve(&kernel_row);
    let kernel_col = kernel_row.transpose();
    pass1.convolve(&kernel_col)
}

/// Blur every one of R, G, B independently and write the result back into a
/// freshly allocated bitmap of the same shape; alpha is forced to `0xFF`.
pub fn blur_bitmap(input: &Bitmap, sigma: f64, nb_stddev: usize) -> Bitmap {
    log::debug!(
        "gaussian: blurring {}x{} bitmap (sigma={sigma}, nb_stddev={nb_stddev})",
        input.w,
        input.h
    );
    let mut out = Bitmap::new(input.w, input.h);
    for channel in [Channel::R, Channel::G, Channel::B] {
        let m = matrix::channel_to_matrix(input, channel);
        let blurred = blur_matrix(&m, sigma, nb_stddev);
        matrix::matrix_to_channel(&blurred, &mut out, channel);
    }
    out
}

/// The public `gaussian(in, out, sigma, nb_stddev)` filter (§6).
pub fn gaussian(input: &Bitmap, output: &mut Bitmap, sigma: f64, nb_stddev: usize) {
    assert_eq!(input.w, output.w);
    assert_eq!(input.h, output.h);
    output.copy_from(&blur_bitmap(input, sigma, nb_stddev));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_sums_to_one() {
        let k = generate_1d_kernel(0.0, 5);
        let sum: f64 = (0..5).map(|i| k.get(i, 0)).sum();
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn one_tap_kernel_is_identity() {
        let k = generate_1d_kernel(0.0, 1);
        assert_eq!(k.w, 1);
        assert!((k.get(0, 0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn scenario_1_gaussian_identity_checkerboard() {
        // 4x4 checkerboard of 0x00000000 / 0xFFFFFFFF.
        let mut rgba = Vec::with_capacity(4 * 4 * 4);
        for y in 0..4 {
            for x in 0..4 {
                let white = (x + y) % 2 == 0;
                if white {
                    rgba.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0xFF]);
                } else {
                    rgba.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
                }
            }
        }
        let input = Bitmap::from_rgba(4, 4, &rgba);
        let mut output = Bitmap::new(4, 4);
        gaussian(&input, &mut output, 0.0, 1);

        for y in 0..4i32 {
            for x in 0..4i32 {
                assert_eq!(
                    output.get_channel(x, y, Channel::R),
                    input.get_channel(x, y, Channel::R)
                );
                assert_eq!(
                    output.get_channel(x, y, Channel::G),
                    input.get_channel(x, y, Channel::G)
                );
                assert_eq!(
                    output.get_channel(x, y, Channel::B),
                    input.get_channel(x, y, Channel::B)
                );
                assert_eq!(output.get_channel(x, y, Channel::A), 0xFF);
            }
        }
    }
}
