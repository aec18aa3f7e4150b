//! Detect the horizontal extent of actual page content around the image
//! centre and mask away everything outside it (scanner bed edges, facing
//! page bleed-through).

use crate::bitmap::{Bitmap, Point, Rectangle};

const SCAN_SIZE: i32 = 50;
const SCAN_STEP: i32 = 5;
const SCAN_THRESHOLD: f64 = 0.1;
const SCAN_MIN: i32 = 100;

fn brightness_rect(img: &Bitmap, x1: i32, y1: i32, x2: i32, y2: i32) -> i32 {
    let mut total: i64 = 0;
    let count = ((x2 - x1) * (y2 - y1)) as i64;
    for x in x1..x2 {
        for y in y1..y2 {
            total += img.get_grayscale(x, y) as i64;
        }
    }
    (total / count) as i32
}

/// Shift a `SCAN_SIZE`-wide, full-height window by `shift_x` from
/// `(start_x, start_y)` until its blackness drops below the running average
/// blackness seen so far, and return how many steps that took.
fn detect_edge(img: &Bitmap, start_x: i32, start_y: i32, shift_x: i32) -> i32 {
    assert_ne!(shift_x, 0);
    let scan_depth = img.h as i32;

    let mut left = start_x - SCAN_SIZE / 2;
    let mut right = start_x + SCAN_SIZE / 2;
    let top = start_y - scan_depth / 2;
    let bottom = start_y + scan_depth / 2;

    let mut total = 0.0;
    let mut count = 0i32;
    loop {
        let blackness = (255 - brightness_rect(img, left, top, right, bottom)) as f64;
        total += blackness;
        count += 1;
        let threshold = SCAN_THRESHOLD * total / count as f64;
        if blackness < threshold || blackness as i32 == 0 {
            return count;
        }
        left += shift_x;
        right += shift_x;
    }
}

fn detect_mask(img: &Bitmap, x: i32, y: i32) -> Rectangle {
    let w = img.w as i32;
    let h = img.h as i32;

    let edge = detect_edge(img, x, y, -SCAN_STEP);
    let left = x - SCAN_STEP * edge - SCAN_SIZE / 2;
    let edge = detect_edge(img, x, y, SCAN_STEP);
    let right = x + SCAN_STEP * edge + SCAN_SIZE / 2;

    let width = right - left;
    if width < SCAN_MIN || width >= w {
        Rectangle::new(Point::new(0, 0), Point::new(w, h))
    } else {
        Rectangle::new(Point::new(left, 0), Point::new(right, h))
    }
}

/// `masks(in, out)` (§4.7): find the horizontal content band around the
/// page centre and white out everything outside it. As with `border`, the
/// Python binding's pre-emptive white fill is reproduced even though the
/// copy right after it overwrites every pixel anyway (§9).
pub fn masks(input: &Bitmap, output: &mut Bitmap) {
    assert_eq!(input.w, output.w);
    assert_eq!(input.h, output.h);
    log::debug!("masks: processing {}x{} bitmap", input.w, input.h);

    output.fill_white();
    output.copy_from(input);
    let mask = detect_mask(input, input.w as i32 / 2, input.h as i32 / 2);
    output.apply_mask(&mask);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::Channel;

    fn page_with_side_margins(w: usize, h: usize, margin: usize) -> Bitmap {
        let mut rgba = vec![255u8; w * h * 4];
        for y in 0..h {
            for x in margin..(w - margin) {
                let idx = (y * w + x) * 4;
                rgba[idx] = 0;
                rgba[idx + 1] = 0;
                rgba[idx + 2] = 0;
            }
        }
        Bitmap::from_rgba(w, h, &rgba)
    }

    #[test]
    fn side_margins_are_masked_away() {
        let input = page_with_side_margins(200, 100, 60);
        let mut output = Bitmap::new(200, 100);
        masks(&input, &mut output);
        assert_eq!(output.get_channel(10, 50, Channel::R), 0xFF);
        assert_eq!(output.get_channel(100, 50, Channel::R), 0);
    }

    #[test]
    fn narrow_content_band_falls_back_to_full_width() {
        // A content band well under SCAN_MIN pixels wide triggers the
        // full-width fallback rather than masking most of the page away.
        let input = page_with_side_margins(200, 100, 95);
        let mask = detect_mask(&input, 100, 50);
        assert_eq!(mask.a.x, 0);
        assert_eq!(mask.b.x, 200);
    }
}
