//! `DoubleMatrix`: the row-major `f64` grid used as the intermediate
//! representation of every multi-stage pipeline, plus its primitive
//! operations (C1).

use std::io::Write;

use anyhow::{Context, Result};

use crate::bitmap::{Bitmap, Channel};

/// A rectangular grid of `f64`, stored row-major.
#[derive(Debug, Clone)]
pub struct DoubleMatrix {
    pub w: usize,
    pub h: usize,
    values: Vec<f64>,
}

impl DoubleMatrix {
    pub fn new(w: usize, h: usize) -> Self {
        assert!(w >= 1 && h >= 1);
        DoubleMatrix {
            w,
            h,
            values: vec![0.0; w * h],
        }
    }

    pub fn from_values(w: usize, h: usize, values: Vec<f64>) -> Self {
        assert_eq!(values.len(), w * h);
        DoubleMatrix { w, h, values }
    }

    pub fn get(&self, x: i32, y: i32) -> f64 {
        debug_assert!(x >= 0 && y >= 0 && (x as usize) < self.w && (y as usize) < self.h);
        self.values[y as usize * self.w + x as usize]
    }

    pub fn set(&mut self, x: i32, y: i32, value: f64) {
        debug_assert!(x >= 0 && y >= 0 && (x as usize) < self.w && (y as usize) < self.h);
        self.values[y as usize * self.w + x as usize] = value;
    }

    fn same_shape(a: &DoubleMatrix, b: &DoubleMatrix) {
        assert_eq!(a.w, b.w, "matrix width mismatch");
        assert_eq!(a.h, b.h, "matrix height mismatch");
    }

    /// `T[y,x] = self[x,y]`.
    pub fn transpose(&self) -> DoubleMatrix {
        let mut out = DoubleMatrix::new(self.h, self.w);
        for x in 0..self.w as i32 {
            for y in 0..self.h as i32 {
                out.set(y, x, self.get(x, y));
            }
        }
        out
    }

    /// 2-D convolution with `kernel`, matching the source's integer-division
    /// kernel-centring and "break the inner scan on out-of-range index"
    /// truncation semantics exactly — this is *not* zero padding: once a
    /// kernel column/row samples outside the image, the rest of that column
    /// (for `kernel_x`) or row (for `kernel_y`) is simply never visited.
    pub fn convolve(&self, kernel: &DoubleMatrix) -> DoubleMatrix {
        let mut out = DoubleMatrix::new(self.w, self.h);
        let kw = kernel.w as i32;
        let kh = kernel.h as i32;

        for img_x in 0..self.w as i32 {
            for img_y in 0..self.h as i32 {
                let mut val = 0.0;

                'outer: for kernel_x in 0..kw {
                    let sx = img_x - kernel_x + (kw / 2);
                    if sx < 0 || sx >= self.w as i32 {
                        break 'outer;
                    }

                    for kernel_y in 0..kh {
                        let sy = img_y - kernel_y + (kh / 2);
                        if sy < 0 || sy >= self.h as i32 {
                            break;
                        }

                        let img_val = self.get(sx, sy);
                        let kernel_val = kernel.get(kernel_x, kernel_y);
                        val += img_val * kernel_val;
                    }
                }

                out.set(img_x, img_y, val);
            }
        }

        out
    }

    /// `Normalize(in, factor, out_min, out_max)` — §4.1.
    pub fn normalize(&self, factor: f64, out_min: f64, out_max: f64) -> DoubleMatrix {
        let (in_min, in_max, factor) = if factor == 0.0 {
            let mut in_min = f64::MAX;
            let mut in_max = f64::MIN;
            for &v in &self.values {
                in_min = in_min.min(v);
                in_max = in_max.max(v);
            }
            let factor = (out_max - out_min) / (in_max - in_min);
            (in_min, in_max, factor)
        } else {
            (out_min, out_max, factor)
        };

        let mut out = DoubleMatrix::new(self.w, self.h);
        for i in 0..self.values.len() {
            let v = (self.values[i] - in_min) * factor + out_min;
            out.values[i] = v;
        }
        out
    }

    /// `v -> in_min + in_max - v`, linear inversion about the midpoint of
    /// the matrix's own value range.
    pub fn grayscale_reverse(&self) -> DoubleMatrix {
        let mut in_min = f64::MAX;
        let mut in_max = f64::MIN;
        for &v in &self.values {
            in_min = in_min.min(v);
            in_max = in_max.max(v);
        }
        let factor = (in_min - in_max) / (in_max - in_min);

        let mut out = DoubleMatrix::new(self.w, self.h);
        for i in 0..self.values.len() {
            out.values[i] = self.values[i] * factor + in_max;
        }
        out
    }

    pub fn min_max(&self) -> (f64, f64) {
        let mut min = f64::MAX;
        let mut max = f64::MIN;
        for &v in &self.values {
            min = min.min(v);
            max = max.max(v);
        }
        (min, max)
    }

    pub fn add_scaled(a: &DoubleMatrix, alpha: f64, b: &DoubleMatrix, beta: f64) -> DoubleMatrix {
        DoubleMatrix::same_shape(a, b);
        let values = a
            .values
            .iter()
            .zip(&b.values)
            .map(|(&x, &y)| alpha * x + beta * y)
            .collect();
        DoubleMatrix::from_values(a.w, a.h, values)
    }
}

/// `gray = (R+G+B)/3` written into a freshly allocated matrix of the same
/// shape as `bitmap`.
pub fn bitmap_to_grayscale_matrix(bitmap: &Bitmap) -> DoubleMatrix {
    let mut out = DoubleMatrix::new(bitmap.w, bitmap.h);
    for x in 0..bitmap.w as i32 {
        for y in 0..bitmap.h as i32 {
            out.set(x, y, bitmap.get_grayscale(x, y) as f64);
        }
    }
    out
}

/// Inverse of `bitmap_to_grayscale_matrix`: clamp to `[0,255]`, write into
/// R/G/B, force alpha to `0xFF`.
pub fn grayscale_matrix_to_bitmap(matrix: &DoubleMatrix) -> Bitmap {
    let mut out = Bitmap::new(matrix.w, matrix.h);
    for x in 0..matrix.w as i32 {
        for y in 0..matrix.h as i32 {
            let v = matrix.get(x, y).round().clamp(0.0, 255.0) as u8;
            out.set_channel(x, y, Channel::R, v);
            out.set_channel(x, y, Channel::G, v);
            out.set_channel(x, y, Channel::B, v);
            out.set_channel(x, y, Channel::A, 0xFF);
        }
    }
    out
}

/// Extract a single channel into a matrix the same shape as `bitmap`.
pub fn channel_to_matrix(bitmap: &Bitmap, channel: Channel) -> DoubleMatrix {
    let mut out = DoubleMatrix::new(bitmap.w, bitmap.h);
    for x in 0..bitmap.w as i32 {
        for y in 0..bitmap.h as i32 {
            out.set(x, y, bitmap.get_channel(x, y, channel) as f64);
        }
    }
    out
}

/// Inject a matrix back into one channel of `bitmap`, clamping to `[0,255]`
/// and forcing alpha to `0xFF`.
pub fn matrix_to_channel(matrix: &DoubleMatrix, bitmap: &mut Bitmap, channel: Channel) {
    assert_eq!(matrix.w, bitmap.w);
    assert_eq!(matrix.h, bitmap.h);
    for x in 0..bitmap.w as i32 {
        for y in 0..bitmap.h as i32 {
            let v = matrix.get(x, y).round().clamp(0.0, 255.0) as u8;
            bitmap.set_channel(x, y, channel, v);
            bitmap.set_channel(x, y, Channel::A, 0xFF);
        }
    }
}

/// Dump a matrix as a binary PGM (P5), scaling by `factor` and clamping to
/// `[0,255]`. Debug-only I/O glue; see `bitmap::write_bitmap_to_ppm`.
pub fn write_matrix_to_pgm(path: &str, matrix: &DoubleMatrix, factor: f64) -> Result<()> {
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("failed to create PGM file at {path}"))?;
    write!(file, "P5\n{} {}\n255\n", matrix.w, matrix.h)?;
    let mut row = Vec::with_capacity(matrix.w);
    for y in 0..matrix.h as i32 {
        row.clear();
        for x in 0..matrix.w as i32 {
            let val = (matrix.get(x, y) * factor).clamp(0.0, 255.0);
            row.push(val as u8);
        }
        file.write_all(&row)?;
    }
    log::debug!("wrote PGM debug dump to {path} ({}x{})", matrix.w, matrix.h);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transpose_is_involutive() {
        let m = DoubleMatrix::from_values(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let tt = m.transpose().transpose();
        assert_eq!(tt.w, m.w);
        assert_eq!(tt.h, m.h);
        for y in 0..m.h as i32 {
            for x in 0..m.w as i32 {
                assert_eq!(tt.get(x, y), m.get(x, y));
            }
        }
    }

    #[test]
    fn convolution_is_linear() {
        let a = DoubleMatrix::from_values(3, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        let b = DoubleMatrix::from_values(
            3,
            3,
            vec![9.0, 8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0],
        );
        let k = DoubleMatrix::from_values(3, 3, vec![-1.0, 0.0, 1.0, -2.0, 0.0, 2.0, -1.0, 0.0, 1.0]);

        let alpha = 2.0;
        let beta = -3.0;
        let combo = DoubleMatrix::add_scaled(&a, alpha, &b, beta);

        let lhs = combo.convolve(&k);
        let rhs = DoubleMatrix::add_scaled(&a.convolve(&k), alpha, &b.convolve(&k), beta);

        for i in 0..9 {
            assert!((lhs_value(&lhs, i) - lhs_value(&rhs, i)).abs() < 1e-9);
        }
    }

    fn lhs_value(m: &DoubleMatrix, i: usize) -> f64 {
        m.get((i % m.w) as i32, (i / m.w) as i32)
    }

    #[test]
    fn convolution_breaks_scan_on_out_of_range() {
        // A uniform field convolved with any zero-sum kernel away from the
        // border is zero; this just exercises that the truncation at the
        // border does not panic and produces finite values everywhere.
        let m = DoubleMatrix::from_values(2, 2, vec![5.0; 4]);
        let k = DoubleMatrix::from_values(3, 3, vec![-1.0, 0.0, 1.0, -2.0, 0.0, 2.0, -1.0, 0.0, 1.0]);
        let out = m.convolve(&k);
        for y in 0..2 {
            for x in 0..2 {
                assert!(out.get(x, y).is_finite());
            }
        }
    }

    #[test]
    fn normalize_factor_zero_hits_both_bounds() {
        let m = DoubleMatrix::from_values(3, 1, vec![0.0, 5.0, 10.0]);
        let out = m.normalize(0.0, 0.0, 1.0);
        assert!((out.get(0, 0) - 0.0).abs() < 1e-12);
        assert!((out.get(2, 0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn grayscale_reverse_is_midpoint_symmetric() {
        let m = DoubleMatrix::from_values(3, 1, vec![0.0, 5.0, 10.0]);
        let out = m.grayscale_reverse();
        assert!((out.get(0, 0) - 10.0).abs() < 1e-9);
        assert!((out.get(1, 0) - 5.0).abs() < 1e-9);
        assert!((out.get(2, 0) - 0.0).abs() < 1e-9);
    }
}
