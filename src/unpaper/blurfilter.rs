//! Clear sparse, blurry regions: `SCAN_SIZE`-square blocks with too few dark
//! pixels (compared against their immediate diagonal neighbours) are wiped.

use crate::bitmap::Bitmap;

const SCAN_SIZE: i32 = 100;
const SCAN_STEP: i32 = 50;
const INTENSITY: f64 = 0.01;
const WHITE_THRESHOLD: f64 = 0.9;

fn white_min() -> i32 {
    (WHITE_THRESHOLD * 255.0) as i32
}

/// `blurfilter(in, out)` (§4.7). Slides a grid of non-overlapping
/// `SCAN_SIZE` blocks across the page; a block is cleared when the densest
/// of itself and its four diagonal neighbours (sampled `SCAN_STEP` pixels
/// into each corner) still falls below `INTENSITY` dark pixels per block
/// area.
///
/// The per-block clear call reuses the same inclusive "right"/"bottom"
/// block-edge variable that `count_pixels_rect` uses, rather than
/// `left + SCAN_SIZE`; since [`Bitmap::clear_rect`]'s far bound is
/// exclusive, this leaves the last column and row of every cleared block
/// untouched. That one-pixel seam matches the source exactly.
pub fn blurfilter(input: &Bitmap, output: &mut Bitmap) {
    assert_eq!(input.w, output.w);
    assert_eq!(input.h, output.h);
    log::debug!("blurfilter: processing {}x{} bitmap", input.w, input.h);
    output.copy_from(input);

    let w = output.w as i32;
    let h = output.h as i32;
    let max_left = w - SCAN_SIZE;
    let max_top = h - SCAN_SIZE;
    if max_left < 0 || max_top < 0 {
        return;
    }

    let blocks_per_row = (w / SCAN_SIZE) as usize;
    let total = (SCAN_SIZE * SCAN_SIZE) as f64;
    let white_min = white_min();

    let mut prev_counts = vec![0i32; blocks_per_row + 2];
    let mut cur_counts = vec![0i32; blocks_per_row + 2];
    let mut next_counts = vec![0i32; blocks_per_row + 2];

    let top = 0;
    let bottom0 = SCAN_SIZE - 1;
    let mut right = SCAN_SIZE - 1;
    let mut block = 1usize;
    let mut left = 0;
    while left <= max_left {
        cur_counts[block] = output.count_pixels_rect(left, top, right, bottom0, white_min);
        block += 1;
        right += SCAN_SIZE;
        left += SCAN_SIZE;
    }
    cur_counts[0] = total as i32;
    cur_counts[blocks_per_row] = total as i32;
    next_counts[0] = total as i32;
    next_counts[blocks_per_row] = total as i32;

    let mut top = 0;
    let mut bottom = SCAN_SIZE - 1;
    while top <= max_top {
        let mut left = 0;
        let mut right = SCAN_SIZE - 1;
        next_counts[0] =
            output.count_pixels_rect(left, top + SCAN_STEP, right, bottom + SCAN_SIZE, white_min);

        let mut block = 1usize;
        while left <= max_left {
            let mut max = cur_counts[block];
            max = max.max(prev_counts[block - 1]);
            max = max.max(prev_counts[block + 1]);
            max = max.max(next_counts[block - 1]);
            next_counts[block + 1] = output.count_pixels_rect(
                left + SCAN_SIZE,
                top + SCAN_STEP,
                right + SCAN_SIZE,
                bottom + SCAN_SIZE,
                white_min,
            );
            max = max.max(next_counts[block + 1]);

            if (max as f64) / total <= INTENSITY {
                output.clear_rect(left, top, right, bottom);
                cur_counts[block] = total as i32;
            }

            right += SCAN_SIZE;
            left += SCAN_SIZE;
            block += 1;
        }

        bottom += SCAN_SIZE;
        top += SCAN_SIZE;
        std::mem::swap(&mut prev_counts, &mut cur_counts);
        std::mem::swap(&mut cur_counts, &mut next_counts);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::Channel;

    fn checkerboard(w: usize, h: usize) -> Bitmap {
        let mut rgba = Vec::with_capacity(w * h * 4);
        for y in 0..h {
            for x in 0..w {
                let dark = (x / 2 + y / 2) % 2 == 0;
                let v = if dark { 0 } else { 255 };
                rgba.extend_from_slice(&[v, v, v, 255]);
            }
        }
        Bitmap::from_rgba(w, h, &rgba)
    }

    #[test]
    fn sparse_noise_block_gets_cleared() {
        let mut rgba = vec![255u8; 220 * 220 * 4];
        // A single dark pixel in an otherwise blank 220x220 page: far below
        // the density threshold for its block.
        let idx = (50 * 220 + 50) * 4;
        rgba[idx] = 0;
        rgba[idx + 1] = 0;
        rgba[idx + 2] = 0;
        let input = Bitmap::from_rgba(220, 220, &rgba);
        let mut output = Bitmap::new(220, 220);
        blurfilter(&input, &mut output);
        assert_eq!(output.get_channel(50, 50, Channel::R), 0xFF);
    }

    #[test]
    fn dense_checkerboard_block_survives() {
        let input = checkerboard(220, 220);
        let mut output = Bitmap::new(220, 220);
        blurfilter(&input, &mut output);
        // At least some dark pixels remain inside the first block.
        let mut any_dark = false;
        for y in 0..90i32 {
            for x in 0..90i32 {
                if output.get_channel(x, y, Channel::R) == 0 {
                    any_dark = true;
                }
            }
        }
        assert!(any_dark);
    }

    #[test]
    fn smaller_than_one_block_is_a_no_op() {
        let input = checkerboard(10, 10);
        let mut output = Bitmap::new(10, 10);
        blurfilter(&input, &mut output);
        assert_eq!(output.to_rgba(), input.to_rgba());
    }
}
