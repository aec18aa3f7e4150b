//! Remove small, isolated clusters of dark pixels (speckle noise) while
//! leaving genuine strokes — which have enough connected darkness nearby to
//! survive the neighbor count — untouched.

use crate::bitmap::{Bitmap, WHITE};

const WHITE_THRESHOLD: f64 = 0.9;
const INTENSITY: i32 = 4;

fn white_min() -> i32 {
    (WHITE_THRESHOLD * 255.0) as i32
}

/// Visit the square ring of pixels at Chebyshev distance `level` from
/// `(x, y)`, calling `visit` on every one whose lightness is below
/// `white_min`. The top and bottom rows run the full width of the ring; the
/// left and right columns only cover the strictly interior rows, so each
/// corner is visited once, via the horizontal rows.
fn browse_pixel_neighbors_level(img: &Bitmap, x: i32, y: i32, level: i32, mut visit: impl FnMut(i32, i32)) {
    let white_min = white_min();
    for xx in (x - level)..=(x + level) {
        if img.get_lightness(xx, y - level) < white_min {
            visit(xx, y - level);
        }
        if img.get_lightness(xx, y + level) < white_min {
            visit(xx, y + level);
        }
    }
    for yy in (y - (level - 1))..=(y + (level - 1)) {
        if img.get_lightness(x - level, yy) < white_min {
            visit(x - level, yy);
        }
        if img.get_lightness(x + level, yy) < white_min {
            visit(x + level, yy);
        }
    }
}

/// Count dark pixels reachable from `(x, y)` ring by ring, stopping as soon
/// as a whole ring comes back empty or `INTENSITY` rings have been checked.
fn count_pixel_neighbors(img: &Bitmap, x: i32, y: i32) -> i32 {
    let mut count = 1;
    let mut level = 1;
    let mut level_count = -1;
    while level_count != 0 && level <= INTENSITY {
        level_count = 0;
        browse_pixel_neighbors_level(img, x, y, level, |_, _| level_count += 1);
        count += level_count;
        level += 1;
    }
    count
}

/// Clear `(x, y)` and every dark pixel reachable from it, ring by ring,
/// with no upper bound on `level` — safe only once `count_pixel_neighbors`
/// has already confirmed the reachable set is small.
fn clear_pixel_neighbors(img: &mut Bitmap, x: i32, y: i32) {
    img.set_pixel(x, y, WHITE);
    let mut level = 1;
    let mut level_count = -1;
    while level_count != 0 {
        level_count = 0;
        let mut cleared = Vec::new();
        browse_pixel_neighbors_level(img, x, y, level, |xx, yy| {
            level_count += 1;
            cleared.push((xx, yy));
        });
        for (xx, yy) in cleared {
            img.set_pixel(xx, yy, WHITE);
        }
        level += 1;
    }
}

/// `noisefilter(in, out)` (§4.7): clear every small speckle whose entire
/// connected dark neighborhood (within `INTENSITY` rings) numbers no more
/// than `INTENSITY` pixels.
pub fn noisefilter(input: &Bitmap, output: &mut Bitmap) {
    assert_eq!(input.w, output.w);
    assert_eq!(input.h, output.h);
    log::debug!("noisefilter: processing {}x{} bitmap", input.w, input.h);
    output.copy_from(input);

    let white_min = white_min();
    for y in 0..output.h as i32 {
        for x in 0..output.w as i32 {
            if output.get_darkness_inverse(x, y) < white_min {
                let neighbors = count_pixel_neighbors(output, x, y);
                if neighbors <= INTENSITY {
                    clear_pixel_neighbors(output, x, y);
                }
            }
        }
    }
}
