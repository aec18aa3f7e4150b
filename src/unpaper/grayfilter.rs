//! Clear faint, nearly-black-free blocks left over from a scan (ink
//! bleed-through, JPEG artefacts) that never contain genuinely dark text.

use crate::bitmap::Bitmap;

const SCAN_SIZE: i32 = 50;
const SCAN_STEP: i32 = 20;
const THRESHOLD: f64 = 0.5;
const BLACK_THRESHOLD: f64 = 0.33;

fn black_max() -> i32 {
    (255.0 * (1.0 - BLACK_THRESHOLD)) as i32
}

fn threshold_abs() -> i32 {
    (255.0 * THRESHOLD) as i32
}

/// Average lightness over `[x1,x2) x [y1,y2)`. The denominator uses an
/// inclusive-style `(x2-x1+1)*(y2-y1+1)` pixel count even though the scan
/// itself is half-open, so it always slightly under-divides — preserved
/// from the source rather than "corrected".
fn lightness_rect(img: &Bitmap, x1: i32, y1: i32, x2: i32, y2: i32) -> i32 {
    let mut total: i64 = 0;
    let count = ((x2 - x1 + 1) * (y2 - y1 + 1)) as i64;
    for x in x1..x2 {
        for y in y1..y2 {
            total += img.get_lightness(x, y) as i64;
        }
    }
    (total / count) as i32
}

/// `grayfilter(in, out)` (§4.7): slide a `SCAN_SIZE` window by `SCAN_STEP`
/// across the page; clear a window that has no sufficiently dark pixel at
/// all and whose overall lightness deficit still falls under `THRESHOLD`.
pub fn grayfilter(input: &Bitmap, output: &mut Bitmap) {
    assert_eq!(input.w, output.w);
    assert_eq!(input.h, output.h);
    log::debug!("grayfilter: processing {}x{} bitmap", input.w, input.h);
    output.copy_from(input);

    let w = output.w as i32;
    let h = output.h as i32;
    let black_max = black_max();
    let threshold_abs = threshold_abs();

    let mut left = 0;
    let mut top = 0;
    let mut right = SCAN_SIZE - 1;
    let mut bottom = SCAN_SIZE - 1;

    loop {
        let count = output.count_pixels_rect(left, top, right, bottom, black_max);
        if count == 0 {
            let lightness = lightness_rect(output, left, top, right, bottom);
            if 255 - lightness < threshold_abs {
                output.clear_rect(left, top, right, bottom);
            }
        }

        if left < w {
            left += SCAN_STEP;
            right += SCAN_STEP;
        } else {
            if bottom >= h {
                return;
            }
            left = 0;
            right = SCAN_SIZE - 1;
            top += SCAN_STEP;
            bottom += SCAN_STEP;
        }
    }
}
