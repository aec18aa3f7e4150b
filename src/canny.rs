//! Canny edge detector (C4): Gaussian -> Sobel -> non-maximum suppression ->
//! single-pass thresholding. The thresholding policy here is intentionally
//! not textbook two-pass hysteresis: a pixel clears the edge map as soon as
//! its gradient magnitude passes one absolute threshold, matching the
//! source this was ported from rather than chaining a separate weak/strong
//! hysteresis pass.

use std::f64::consts::PI;

use crate::bitmap::Bitmap;
use crate::gaussian;
use crate::gradient::{self, GradientBundle};
use crate::matrix::{self, DoubleMatrix};

const LOW: f64 = 0.686 * 255.0;
const HIGH: f64 = 1.372 * 255.0;

/// Neighbour offsets per quantised gradient axis (§4.4).
const AXIS_OFFSETS: [[(i32, i32); 2]; 4] = [
    [(1, 0), (-1, 0)],
    [(1, 1), (-1, -1)],
    [(0, 1), (0, -1)],
    [(-1, 1), (1, -1)],
];

fn quantise_axis(angle: f64) -> usize {
    let axis = (angle * 4.0 / PI).round() as i64;
    axis.rem_euclid(4) as usize
}

/// Non-maximum suppression, in place semantics modelled as returning a new
/// matrix (matrix ownership transfer per §9).
fn non_maximum_suppression(bundle: &GradientBundle) -> DoubleMatrix {
    let w = bundle.intensity.w;
    let h = bundle.intensity.h;
    let mut out = bundle.intensity.clone();

    for x in 0..w as i32 {
        for y in 0..h as i32 {
            let angle = bundle.direction.get(x, y);
            let axis = quantise_axis(angle);
            let centre = bundle.intensity.get(x, y);

            for &(dx, dy) in &AXIS_OFFSETS[axis] {
                let (nx, ny) = (x + dx, y + dy);
                if nx < 0 || ny < 0 || nx as usize >= w || ny as usize >= h {
                    continue;
                }
                if bundle.intensity.get(nx, ny) > centre {
                    out.set(x, y, 0.0);
                    break;
                }
            }
        }
    }

    out
}

/// Single-pass thresholding (§4.4): not hysteresis.
fn apply_thresholds(matrix: &DoubleMatrix) -> DoubleMatrix {
    let mut out = DoubleMatrix::new(matrix.w, matrix.h);
    for x in 0..matrix.w as i32 {
        for y in 0..matrix.h as i32 {
            let v = matrix.get(x, y);
            let out_v = if v > HIGH {
                255.0
            } else if v <= LOW {
                0.0
            } else {
                v
            };
            out.set(x, y, out_v);
        }
    }
    out
}

/// Run the full Canny pipeline on an already-grayscale matrix, returning the
/// thresholded intensity matrix. "Edge pixel" means value `> 0`.
pub fn canny_on_matrix(gray: &DoubleMatrix) -> DoubleMatrix {
    let blurred = gaussian::blur_matrix(gray, 0.0, 3);
    let bundle = gradient::sobel_on_matrix(
        &blurred,
        &gradient::sobel_x_kernel(),
        &gradient::sobel_y_kernel(),
        0.0,
        0,
    );
    let suppressed = non_maximum_suppression(&bundle);
    apply_thresholds(&suppressed)
}

/// The public `canny(in, out)` filter (§6).
pub fn canny(input: &Bitmap, output: &mut Bitmap) {
    assert_eq!(input.w, output.w);
    assert_eq!(input.h, output.h);
    log::debug!("canny: processing {}x{} bitmap", input.w, input.h);

    let gray = matrix::bitmap_to_grayscale_matrix(input);
    let edges = canny_on_matrix(&gray);
    let edge_count = edges.clone();
    let survivors = (0..edge_count.h)
        .flat_map(|y| (0..edge_count.w).map(move |x| (x, y)))
        .filter(|&(x, y)| edge_count.get(x as i32, y as i32) > 0.0)
        .count();
    log::trace!("canny: {edge_count} edge pixels", edge_count = survivors);

    output.copy_from(&matrix::grayscale_matrix_to_bitmap(&edges));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::Channel;

    #[test]
    fn output_values_are_255_0_or_in_threshold_band() {
        let gray = DoubleMatrix::from_values(
            4,
            4,
            vec![
                0.0, 0.0, 255.0, 255.0, 0.0, 0.0, 255.0, 255.0, 0.0, 0.0, 255.0, 255.0, 0.0, 0.0,
                255.0, 255.0,
            ],
        );
        let out = canny_on_matrix(&gray);
        for x in 0..4i32 {
            for y in 0..4i32 {
                let v = out.get(x, y);
                assert!(v == 0.0 || v == 255.0 || (v > LOW && v <= HIGH));
            }
        }
    }

    #[test]
    fn scenario_3_edge_on_a_step() {
        // 4x4, left half black, right half white.
        let mut rgba = Vec::with_capacity(4 * 4 * 4);
        for _ in 0..4 {
            rgba.extend_from_slice(&[0, 0, 0, 255]);
            rgba.extend_from_slice(&[0, 0, 0, 255]);
            rgba.extend_from_slice(&[255, 255, 255, 255]);
            rgba.extend_from_slice(&[255, 255, 255, 255]);
        }
        let input = Bitmap::from_rgba(4, 4, &rgba);
        let mut output = Bitmap::new(4, 4);
        canny(&input, &mut output);

        // Column 0 is two pixels away from the boundary (between columns
        // 1 and 2): it should read 0.
        for y in 0..4i32 {
            assert_eq!(output.get_channel(0, y, Channel::R), 0);
        }
    }
}
