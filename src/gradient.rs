//! Sobel/Scharr gradient computation (C3).

use crate::bitmap::{Bitmap, Channel};
use crate::gaussian;
use crate::matrix::{self, DoubleMatrix};

pub fn sobel_x_kernel() -> DoubleMatrix {
    DoubleMatrix::from_values(3, 3, vec![-1.0, 0.0, 1.0, -2.0, 0.0, 2.0, -1.0, 0.0, 1.0])
}

pub fn sobel_y_kernel() -> DoubleMatrix {
    DoubleMatrix::from_values(3, 3, vec![-1.0, -2.0, -1.0, 0.0, 0.0, 0.0, 1.0, 2.0, 1.0])
}

pub fn scharr_x_kernel() -> DoubleMatrix {
    DoubleMatrix::from_values(3, 3, vec![3.0, 0.0, -3.0, 10.0, 0.0, -10.0, 3.0, 0.0, -3.0])
}

pub fn scharr_y_kernel() -> DoubleMatrix {
    DoubleMatrix::from_values(3, 3, vec![3.0, 10.0, 3.0, 0.0, 0.0, 0.0, -3.0, -10.0, -3.0])
}

/// The four matrices produced by a gradient pass: `g_x`, `g_y`, intensity
/// (`hypot(g_x,g_y)`) and direction (`atan2(g_y,g_x)`, range `[-pi,pi]`).
pub struct GradientBundle {
    pub g_x: DoubleMatrix,
    pub g_y: DoubleMatrix,
    pub intensity: DoubleMatrix,
    pub direction: DoubleMatrix,
}

/// `SobelOnMatrix` (§4.3): convolve with `kx`/`ky`, optionally re-blur each
/// gradient component, then derive intensity/direction.
pub fn sobel_on_matrix(
    input: &DoubleMatrix,
    kx: &DoubleMatrix,
    ky: &DoubleMatrix,
    gaussian_sigma: f64,
    gaussian_stddev: usize,
) -> GradientBundle {
    let mut g_x = input.convolve(kx);
    let mut g_y = input.convolve(ky);

    if gaussian_stddev > 0 {
        g_x = gaussian::blur_matrix(&g_x, gaussian_sigma, gaussian_stddev);
        g_y = gaussian::blur_matrix(&g_y, gaussian_sigma, gaussian_stddev);
    }

    let mut intensity = DoubleMatrix::new(input.w, input.h);
    let mut direction = DoubleMatrix::new(input.w, input.h);
    for x in 0..input.w as i32 {
        for y in 0..input.h as i32 {
            let gx = g_x.get(x, y);
            let gy = g_y.get(x, y);
            intensity.set(x, y, gx.hypot(gy));
            direction.set(x, y, gy.atan2(gx));
        }
    }

    GradientBundle {
        g_x,
        g_y,
        intensity,
        direction,
    }
}

/// The public `sobel(in, out)` filter (§6): grayscale, default Sobel
/// kernels, no re-blur, clamp intensity into `[0,255]` (no rescaling —
/// matches `pf_grayscale_dbl_matrix_to_rgb_bitmap`, which only clamps).
pub fn sobel(input: &Bitmap, output: &mut Bitmap) {
    assert_eq!(input.w, output.w);
    assert_eq!(input.h, output.h);
    log::debug!("sobel: processing {}x{} bitmap", input.w, input.h);

    let gray = matrix::bitmap_to_grayscale_matrix(input);
    let bundle = sobel_on_matrix(&gray, &sobel_x_kernel(), &sobel_y_kernel(), 0.0, 0);
    output.copy_from(&matrix::grayscale_matrix_to_bitmap(&bundle.intensity));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_2_uniform_field_has_zero_gradient() {
        let mut rgba = Vec::with_capacity(4 * 4 * 4);
        for _ in 0..16 {
            rgba.extend_from_slice(&[128, 0, 0, 255]);
        }
        let input = Bitmap::from_rgba(4, 4, &rgba);
        let gray = matrix::bitmap_to_grayscale_matrix(&input);
        let bundle = sobel_on_matrix(&gray, &sobel_x_kernel(), &sobel_y_kernel(), 0.0, 0);
        for x in 0..4i32 {
            for y in 0..4i32 {
                assert_eq!(bundle.g_x.get(x, y), 0.0);
                assert_eq!(bundle.intensity.get(x, y), 0.0);
            }
        }
    }
}
