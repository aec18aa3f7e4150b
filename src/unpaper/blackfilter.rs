//! Flood-fill away large solid-black regions (scanner artefacts, black
//! borders from photocopying a book) left behind by the source scan.

use crate::bitmap::{Bitmap, WHITE};

const THRESHOLD: f64 = 0.33;
const SCAN_SIZE: i32 = 20;
const SCAN_DEPTH: i32 = 500;
const SCAN_STEP: i32 = 5;
const SCAN_THRESHOLD: f64 = 0.95;
const INTENSITY: i32 = 20;

fn abs_scan_threshold() -> u8 {
    (255.0 * SCAN_THRESHOLD) as u8
}

fn abs_threshold() -> i32 {
    (255.0 * (1.0 - THRESHOLD)) as i32
}

/// Average darkness over the half-open rectangle `[x1,x2) x [y1,y2)`.
fn darkness_rect(img: &Bitmap, x1: i32, y1: i32, x2: i32, y2: i32) -> u8 {
    let mut total: u32 = 0;
    let count = ((x2 - x1) * (y2 - y1)) as u32;
    for y in y1..y2 {
        for x in x1..x2 {
            total += img.get_darkness_inverse(x, y) as u32;
        }
    }
    255 - (total / count) as u8
}

/// Fill pixels from `(x, y)` stepping by `(step_x, step_y)` to white while
/// they stay dark, tolerating up to `INTENSITY` consecutive bright pixels
/// before giving up. Returns how far the fill travelled.
fn fill_line(img: &mut Bitmap, x: i32, y: i32, step_x: i32, step_y: i32) -> i32 {
    let mut x = x;
    let mut y = y;
    let mut distance = 0;
    let mut intensity_count = 1;

    loop {
        x += step_x;
        y += step_y;
        let pixel = img.get_grayscale(x, y);
        if pixel <= abs_threshold() {
            intensity_count = INTENSITY;
        } else {
            intensity_count -= 1;
        }

        if intensity_count > 0 && x >= 0 && x < img.w as i32 && y >= 0 && y < img.h as i32 {
            img.set_pixel(x, y, WHITE);
            distance += 1;
        } else {
            return distance;
        }
    }
}

fn flood_fill_around_line(img: &mut Bitmap, x: i32, y: i32, step_x: i32, step_y: i32, distance: i32) {
    let mut x = x;
    let mut y = y;
    for _ in 0..distance {
        if step_x != 0 {
            x += step_x;
            flood_fill(img, x, y + 1);
            flood_fill(img, x, y - 1);
        } else {
            y += step_y;
            flood_fill(img, x + 1, y);
            flood_fill(img, x - 1, y);
        }
    }
}

/// Direct recursion, matching the source exactly (§9): this is a flood fill
/// over scanner noise blobs, not the page-sized stroke graph `swt` walks,
/// so it is exempt from the explicit-stack requirement used there.
fn flood_fill(img: &mut Bitmap, x: i32, y: i32) {
    let pixel = img.get_grayscale(x, y);
    if pixel > abs_threshold() {
        return;
    }

    img.set_pixel(x, y, WHITE);
    let left = fill_line(img, x, y, -1, 0);
    let top = fill_line(img, x, y, 0, -1);
    let right = fill_line(img, x, y, 1, 0);
    let bottom = fill_line(img, x, y, 0, 1);

    flood_fill_around_line(img, x, y, -1, 0, left);
    flood_fill_around_line(img, x, y, 0, -1, top);
    flood_fill_around_line(img, x, y, 1, 0, right);
    flood_fill_around_line(img, x, y, 0, 1, bottom);
}

fn blackfilter_scan(img: &mut Bitmap, step_x: i32, step_y: i32) {
    let w = img.w as i32;
    let h = img.h as i32;

    let (mut right, mut bottom, shift_x, shift_y) = if step_x != 0 {
        (SCAN_SIZE - 1, SCAN_DEPTH - 1, 0, SCAN_DEPTH)
    } else {
        (SCAN_DEPTH - 1, SCAN_SIZE - 1, SCAN_DEPTH, 0)
    };
    let mut left = 0;
    let mut top = 0;
    let threshold = abs_scan_threshold();

    while left < w && top < h {
        let (mut l, mut t, mut r, mut b) = (left, top, right, bottom);
        if r > w || b > h {
            let diff_x = r - w;
            let diff_y = b - h;
            l -= diff_x;
            t -= diff_y;
            r -= diff_x;
            b -= diff_y;
        }

        while l < w && t < h {
            let blackness = darkness_rect(img, l, t, r, b);
            if blackness >= threshold {
                for y in t..b {
                    for x in l..r {
                        flood_fill(img, x, y);
                    }
                }
            }
            l += step_x;
            t += step_y;
            r += step_x;
            b += step_y;
        }

        left += shift_x;
        top += shift_y;
        right += shift_x;
        bottom += shift_y;
    }
}

/// `blackfilter(in, out)` (§4.7): horizontal scan followed by a vertical
/// scan, each flood-filling away any `SCAN_SIZE`-wide stripe whose
/// average darkness clears `SCAN_THRESHOLD`.
pub fn blackfilter(input: &Bitmap, output: &mut Bitmap) {
    assert_eq!(input.w, output.w);
    assert_eq!(input.h, output.h);
    log::debug!("blackfilter: processing {}x{} bitmap", input.w, input.h);

    output.copy_from(input);
    blackfilter_scan(output, SCAN_STEP, 0);
    blackfilter_scan(output, 0, SCAN_STEP);
}
