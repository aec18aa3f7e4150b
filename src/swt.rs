//! Stroke Width Transform text detection (C6): the crate's most involved
//! pipeline. Preprocessing hands a gradient field and a Canny edge map to
//! [`ray`], which traces per-pixel strokes; [`letters`] groups and filters
//! the resulting stroke widths into letter candidates; [`chains`] links
//! letters into lines of text; [`render`] paints the survivors back out.

pub mod chains;
pub mod letters;
pub mod ray;
pub mod render;

use rayon::prelude::*;

use crate::bitmap::Bitmap;
use crate::canny;
use crate::gaussian;
use crate::gradient;
use crate::matrix::{self, DoubleMatrix};

pub use render::OutputType;

/// Derive the per-pixel `(cos, sin)` of the gradient direction the ray
/// tracer steps along.
fn gradient_cos_sin(direction: &DoubleMatrix) -> (DoubleMatrix, DoubleMatrix) {
    let mut cos_theta = DoubleMatrix::new(direction.w, direction.h);
    let mut sin_theta = DoubleMatrix::new(direction.w, direction.h);
    for y in 0..direction.h as i32 {
        for x in 0..direction.w as i32 {
            let angle = direction.get(x, y);
            cos_theta.set(x, y, angle.cos());
            sin_theta.set(x, y, angle.sin());
        }
    }
    (cos_theta, sin_theta)
}

/// Run the full detection pipeline and render the result into `output`
/// according to `output_type` (§4.6 / §6).
pub fn swt(input: &Bitmap, output: &mut Bitmap, output_type: OutputType) {
    assert_eq!(input.w, output.w);
    assert_eq!(input.h, output.h);
    log::debug!("swt: processing {}x{} bitmap ({output_type:?})", input.w, input.h);

    let gray = matrix::bitmap_to_grayscale_matrix(input);
    let edge = canny::canny_on_matrix(&gray);

    let blurred = gaussian::blur_matrix(&gray, 0.0, 3);
    let bundle = gradient::sobel_on_matrix(
        &blurred,
        &gradient::scharr_x_kernel(),
        &gradient::scharr_y_kernel(),
        0.0,
        0,
    );
    let (cos_theta, sin_theta) = gradient_cos_sin(&bundle.direction);

    let (mut swt_matrix, mut rays) = ray::trace_rays(&edge, &cos_theta, &sin_theta);
    ray::equalize_to_ray_median(&mut swt_matrix, &mut rays);
    log::trace!("swt: traced {} rays", rays.len());

    let mut candidates = letters::find_possible_letters(&swt_matrix);
    // Each candidate's statistics depend only on its own point list, so this
    // pass fans out across the candidate set rather than running serially.
    candidates
        .par_iter_mut()
        .for_each(|letter| letters::compute_letter_stats(input, &swt_matrix, letter));
    log::trace!("swt: {} raw letter candidates", candidates.len());

    let shaped = letters::filter_by_shape(candidates, input.h);
    let filtered = letters::filter_by_center_crowding(shaped);
    log::trace!("swt: {} letters after shape/crowding filters", filtered.len());

    let mut valid_chains = chains::make_valid_pairs(&filtered);
    chains::merge_chains(&mut valid_chains, &filtered);
    let surviving = valid_chains.iter().filter(|c| !c.merged).count();
    log::debug!("swt: {surviving} surviving chains");

    match output_type {
        OutputType::OriginalBoxes => {
            render::render_chains_boxes(input, output, &valid_chains, &filtered);
        }
        OutputType::BwText | OutputType::GrayscaleText => {
            render::render_chains_text(&swt_matrix, output, &valid_chains, &filtered, output_type);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::Channel;

    fn blank_page(w: usize, h: usize) -> Bitmap {
        Bitmap::new(w, h)
    }

    #[test]
    fn blank_page_produces_no_text_boxes() {
        let input = blank_page(16, 16);
        let mut output = Bitmap::new(16, 16);
        swt(&input, &mut output, OutputType::OriginalBoxes);
        for y in 0..16i32 {
            for x in 0..16i32 {
                assert_eq!(output.get_channel(x, y, Channel::R), 0xFF);
            }
        }
    }

    fn uniform_bitmap(w: usize, h: usize, rgba: [u8; 4]) -> Bitmap {
        let mut buf = Vec::with_capacity(w * h * 4);
        for _ in 0..(w * h) {
            buf.extend_from_slice(&rgba);
        }
        Bitmap::from_rgba(w, h, &buf)
    }

    #[test]
    fn scenario_4_uniform_grey_page_has_no_surviving_text() {
        let input = uniform_bitmap(32, 32, [0x80, 0x80, 0x80, 0xFF]);
        let mut output = Bitmap::new(32, 32);
        swt(&input, &mut output, OutputType::BwText);
        for y in 0..32i32 {
            for x in 0..32i32 {
                assert_eq!(output.get_channel(x, y, Channel::R), 0xFF);
                assert_eq!(output.get_channel(x, y, Channel::G), 0xFF);
                assert_eq!(output.get_channel(x, y, Channel::B), 0xFF);
            }
        }
    }

    /// 64x16, white background, a single vertical black bar from (20,2) to
    /// (22,13) inclusive: a single letter-shaped stroke with nothing to pair
    /// with, so no chain ever reaches the length-3 rendering threshold.
    fn synthetic_stroke_bitmap() -> Bitmap {
        let mut bitmap = uniform_bitmap(64, 16, [0xFF, 0xFF, 0xFF, 0xFF]);
        for y in 2..=13i32 {
            for x in 20..=22i32 {
                bitmap.set_pixel(x, y, crate::bitmap::pack(0, 0, 0, 0xFF));
            }
        }
        bitmap
    }

    #[test]
    fn scenario_5_single_stroke_never_forms_a_chain_bw_text() {
        let input = synthetic_stroke_bitmap();
        let mut output = Bitmap::new(64, 16);
        swt(&input, &mut output, OutputType::BwText);
        for y in 0..16i32 {
            for x in 0..64i32 {
                assert_eq!(output.get_channel(x, y, Channel::R), 0xFF);
            }
        }
    }

    #[test]
    fn scenario_5_single_stroke_never_forms_a_chain_original_boxes() {
        let input = synthetic_stroke_bitmap();
        let mut output = Bitmap::new(64, 16);
        swt(&input, &mut output, OutputType::OriginalBoxes);
        for y in 0..16i32 {
            for x in 0..64i32 {
                assert_eq!(output.get_pixel(x, y), crate::bitmap::WHITE);
            }
        }
    }
}
