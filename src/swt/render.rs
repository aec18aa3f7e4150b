//! Render the surviving chains back onto a bitmap, in one of three modes.

use crate::bitmap::Bitmap;
use crate::matrix::{self, DoubleMatrix};
use crate::swt::chains::Chain;
use crate::swt::letters::Letter;

const MIN_COMPONENTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputType {
    BwText,
    GrayscaleText,
    OriginalBoxes,
}

/// `ORIGINAL_BOXES`: white out the page, then copy back the source pixels
/// inside the union bounding box of every chain with at least
/// `MIN_COMPONENTS` letters.
pub fn render_chains_boxes(input: &Bitmap, output: &mut Bitmap, chains: &[Chain], letters: &[Letter]) {
    output.fill_white();

    for chain in chains {
        if chain.merged || chain.letters.len() < MIN_COMPONENTS {
            continue;
        }

        let mut min_x = i32::MAX;
        let mut min_y = i32::MAX;
        let mut max_x = i32::MIN;
        let mut max_y = i32::MIN;
        for &li in &chain.letters {
            let s = &letters[li].stats;
            min_x = min_x.min(s.min.x);
            min_y = min_y.min(s.min.y);
            max_x = max_x.max(s.max.x);
            max_y = max_y.max(s.max.y);
        }

        for y in min_y..max_y {
            for x in min_x..max_x {
                let pixel = input.get_pixel(x, y);
                output.set_pixel(x, y, pixel);
            }
        }
    }
}

/// `BW_TEXT` / `GRAYSCALE_TEXT`: paint each surviving chain's letter pixels
/// with either a flat on/off value (`BwText`) or their raw stroke width
/// (`GrayscaleText`) into a scratch matrix that starts at zero everywhere,
/// then normalise with inverted output bounds (`out_min=255, out_max=0`) so
/// the untouched background (value `0`) lands on white and touched pixels
/// land below it, without ever explicitly filling the background white.
pub fn render_chains_text(
    swt: &DoubleMatrix,
    output: &mut Bitmap,
    chains: &[Chain],
    letters: &[Letter],
    output_type: OutputType,
) {
    let mut out_val = DoubleMatrix::new(swt.w, swt.h);

    for chain in chains {
        if chain.merged || chain.letters.len() < MIN_COMPONENTS {
            continue;
        }
        for &li in &chain.letters {
            for &p in &letters[li].points {
                let val = swt.get(p.x, p.y);
                let painted = match output_type {
                    OutputType::BwText => {
                        if val != 0.0 {
                            255.0
                        } else {
                            0.0
                        }
                    }
                    _ => val,
                };
                out_val.set(p.x, p.y, painted);
            }
        }
    }

    let normalized = out_val.normalize(0.0, 255.0, 0.0);
    output.copy_from(&matrix::grayscale_matrix_to_bitmap(&normalized));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::Point;
    use crate::swt::letters::LetterStats;

    fn chain_of(indices: Vec<usize>) -> Chain {
        Chain {
            letters: indices,
            dist: 0.0,
            direction: (1.0, 0.0),
            merged: false,
        }
    }

    #[test]
    fn short_chains_are_not_rendered_as_boxes() {
        let input = Bitmap::new(4, 4);
        let mut output = Bitmap::new(4, 4);
        let letters = vec![Letter {
            points: vec![Point::new(0, 0)],
            stats: LetterStats {
                min: Point::new(0, 0),
                max: Point::new(3, 3),
                ..Default::default()
            },
        }];
        let chains = vec![chain_of(vec![0])];
        render_chains_boxes(&input, &mut output, &chains, &letters);
        // Below MIN_COMPONENTS: the whole page stays white.
        for y in 0..4i32 {
            for x in 0..4i32 {
                assert_eq!(output.get_pixel(x, y), crate::bitmap::WHITE);
            }
        }
    }

    #[test]
    fn untouched_pixels_render_lighter_than_touched_ones_in_text_mode() {
        let mut swt = DoubleMatrix::new(4, 4);
        for y in 0..4 {
            for x in 0..4 {
                swt.set(x, y, 2.0);
            }
        }
        let letters = vec![Letter {
            points: vec![Point::new(0, 0), Point::new(1, 0), Point::new(2, 0)],
            stats: LetterStats {
                min: Point::new(0, 0),
                max: Point::new(2, 0),
                ..Default::default()
            },
        }];
        let chains = vec![chain_of(vec![0, 0, 0])];
        let mut output = Bitmap::new(4, 4);
        render_chains_text(&swt, &mut output, &chains, &letters, OutputType::GrayscaleText);

        let touched = output.get_channel(0, 0, crate::bitmap::Channel::R);
        let untouched = output.get_channel(3, 3, crate::bitmap::Channel::R);
        assert!(untouched > touched, "untouched background should be lighter");
        assert_eq!(untouched, 255);
    }
}
