//! Pixel-difference comparison (C8): highlight mismatches beyond a grayscale
//! tolerance, counting how many pixels disagree.

use crate::bitmap::{Bitmap, Channel};

pub const DEFAULT_TOLERANCE: i32 = 10;

/// `compare(a, b, out, tolerance)` (§4.8): `a` and `b` are treated as equal
/// at a pixel when their grayscale values are within `tolerance` of each
/// other. Equal pixels pass the shared grayscale value through; unequal
/// ones are rendered as a translucent-looking red highlight. Returns the
/// number of pixels found unequal.
pub fn compare(a: &Bitmap, b: &Bitmap, out: &mut Bitmap, tolerance: i32) -> u32 {
    assert_eq!(a.w, b.w);
    assert_eq!(a.h, b.h);
    assert_eq!(a.w, out.w);
    assert_eq!(a.h, out.h);
    log::debug!("compare: {}x{} bitmaps, tolerance={tolerance}", a.w, a.h);

    let mut mismatches = 0u32;
    for y in 0..a.h as i32 {
        for x in 0..a.w as i32 {
            let v1 = a.get_grayscale(x, y);
            let mut v2 = b.get_grayscale(x, y);
            if (v1 - v2).abs() <= tolerance {
                v2 = v1;
            }

            out.set_channel(x, y, Channel::A, 0xFF);
            if v1 == v2 {
                out.set_channel(x, y, Channel::R, v1 as u8);
                out.set_channel(x, y, Channel::G, v1 as u8);
                out.set_channel(x, y, Channel::B, v1 as u8);
            } else {
                let shade = ((v1 + v2) / 4) as u8;
                out.set_channel(x, y, Channel::R, 0xFF);
                out.set_channel(x, y, Channel::G, shade);
                out.set_channel(x, y, Channel::B, shade);
                mismatches += 1;
            }
        }
    }
    mismatches
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(w: usize, h: usize, rgba: [u8; 4]) -> Bitmap {
        let mut buf = Vec::with_capacity(w * h * 4);
        for _ in 0..(w * h) {
            buf.extend_from_slice(&rgba);
        }
        Bitmap::from_rgba(w, h, &buf)
    }

    #[test]
    fn identical_bitmaps_have_no_mismatches() {
        let a = solid(4, 4, [10, 20, 30, 255]);
        let b = a.clone();
        let mut out = Bitmap::new(4, 4);
        let count = compare(&a, &b, &mut out, DEFAULT_TOLERANCE);
        assert_eq!(count, 0);
        for y in 0..4i32 {
            for x in 0..4i32 {
                assert_eq!(out.get_channel(x, y, Channel::A), 0xFF);
            }
        }
    }

    #[test]
    fn within_tolerance_counts_as_equal() {
        let a = solid(1, 1, [100, 100, 100, 255]);
        let b = solid(1, 1, [105, 105, 105, 255]);
        let mut out = Bitmap::new(1, 1);
        let count = compare(&a, &b, &mut out, 10);
        assert_eq!(count, 0);
        assert_eq!(out.get_channel(0, 0, Channel::R), 100);
    }

    #[test]
    fn beyond_tolerance_is_flagged_red() {
        let a = solid(1, 1, [0, 0, 0, 255]);
        let b = solid(1, 1, [200, 200, 200, 255]);
        let mut out = Bitmap::new(1, 1);
        let count = compare(&a, &b, &mut out, 10);
        assert_eq!(count, 1);
        assert_eq!(out.get_channel(0, 0, Channel::R), 0xFF);
        assert_eq!(out.get_channel(0, 0, Channel::G), 50);
        assert_eq!(out.get_channel(0, 0, Channel::B), 50);
    }
}
