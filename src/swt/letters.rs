//! Group stroke-width pixels into letter candidates: adjacency-graph
//! construction, an explicit-stack connected-components pass, per-letter
//! statistics, and the shape/crowding filters that separate text strokes
//! from noise.

use std::f64::consts::PI;

use crate::bitmap::{Bitmap, Channel, Point};
use crate::matrix::DoubleMatrix;
use crate::swt::ray;

/// Forward adjacency offsets (§4.6): each pixel only looks "ahead" in these
/// four directions, but every link recorded is symmetric.
const ADJACENCY_OFFSETS: [(i32, i32); 4] = [(1, 0), (1, 1), (0, 1), (-1, 1)];
const MAX_RATIO: f64 = 3.0;

const MAX_VARIANCE_FACTOR: f64 = 2.0;
const MAX_Y_RATIO: f64 = 0.33;
const ROTATED_BBOX_STEP: f64 = PI / 36.0;
const MIN_ASPECT_RATIO: f64 = 1.0 / 10.0;
const MAX_ASPECT_RATIO: f64 = 10.0;
const MAX_CROWDING_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, Default)]
pub struct LetterStats {
    pub min: Point,
    pub max: Point,
    pub mean_r: f64,
    pub mean_g: f64,
    pub mean_b: f64,
    pub mean_swt: f64,
    pub variance: f64,
    pub center: Point,
    pub median: f64,
}

#[derive(Debug, Clone)]
pub struct Letter {
    pub points: Vec<Point>,
    pub stats: LetterStats,
}

fn valid(v: f64) -> bool {
    v > 0.0 && v.is_finite()
}

/// Build the symmetric adjacency list (one entry per raster cell, flat
/// `y * w + x` indexed): two pixels with a valid stroke width link when they
/// are 4-offset neighbours and neither's width is more than 3x the other's.
fn build_adjacency(swt: &DoubleMatrix) -> Vec<Vec<u32>> {
    let w = swt.w;
    let h = swt.h;
    let mut adjacency = vec![Vec::new(); w * h];

    for y in 0..h as i32 {
        for x in 0..w as i32 {
            let val = swt.get(x, y);
            if !valid(val) {
                continue;
            }
            let idx = y as usize * w + x as usize;

            for &(dx, dy) in &ADJACENCY_OFFSETS {
                let (nx, ny) = (x + dx, y + dy);
                if nx < 0 || ny < 0 || nx as usize >= w || ny as usize >= h {
                    continue;
                }
                let nval = swt.get(nx, ny);
                if !valid(nval) {
                    continue;
                }
                if (val / nval).max(nval / val) >= MAX_RATIO {
                    continue;
                }

                let nidx = ny as usize * w + nx as usize;
                adjacency[idx].push(nidx as u32);
                adjacency[nidx].push(idx as u32);
            }
        }
    }

    for links in &adjacency {
        debug_assert!(links.len() <= 8);
    }
    adjacency
}

/// Connected components over the adjacency graph, via an explicit stack
/// rather than recursion (§9: this grouping pass runs once per page, so a
/// recursive walk would risk overflowing the call stack on a dense image).
fn connected_components(adjacency: &[Vec<u32>], w: usize) -> Vec<Vec<Point>> {
    let mut visited = vec![false; adjacency.len()];
    let mut groups = Vec::new();
    let mut stack = Vec::with_capacity(adjacency.len());

    for start in 0..adjacency.len() {
        if visited[start] || adjacency[start].is_empty() {
            continue;
        }

        let mut points = Vec::new();
        stack.clear();
        stack.push(start);
        visited[start] = true;

        while let Some(idx) = stack.pop() {
            let x = (idx % w) as i32;
            let y = (idx / w) as i32;
            points.push(Point::new(x, y));

            for &next in &adjacency[idx] {
                let next = next as usize;
                if !visited[next] {
                    visited[next] = true;
                    stack.push(next);
                }
            }
        }

        groups.push(points);
    }
    groups
}

pub fn find_possible_letters(swt: &DoubleMatrix) -> Vec<Letter> {
    let adjacency = build_adjacency(swt);
    connected_components(&adjacency, swt.w)
        .into_iter()
        .map(|points| Letter {
            points,
            stats: LetterStats::default(),
        })
        .collect()
}

/// Fill in a letter's bounding box, mean colour/stroke-width, variance,
/// centre and median stroke width. The bounding box's `max` starts at
/// `(0, 0)` rather than the image minimum, matching the source: every raster
/// coordinate is non-negative, so it is still a correct running maximum.
pub fn compute_letter_stats(bitmap: &Bitmap, swt: &DoubleMatrix, letter: &mut Letter) {
    let n = letter.points.len() as f64;
    let mut min = Point::new(i32::MAX, i32::MAX);
    let mut max = Point::new(0, 0);
    let mut mean_r = 0.0;
    let mut mean_g = 0.0;
    let mut mean_b = 0.0;
    let mut mean_swt = 0.0;

    for &p in &letter.points {
        mean_r += bitmap.get_channel(p.x, p.y, Channel::R) as f64;
        mean_g += bitmap.get_channel(p.x, p.y, Channel::G) as f64;
        mean_b += bitmap.get_channel(p.x, p.y, Channel::B) as f64;
        mean_swt += swt.get(p.x, p.y);
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }
    mean_r /= n;
    mean_g /= n;
    mean_b /= n;
    mean_swt /= n;

    let mut variance = 0.0;
    for &p in &letter.points {
        let d = swt.get(p.x, p.y) - mean_swt;
        variance += d * d;
    }
    variance /= n;

    let center = Point::new((max.x + min.x) / 2, (max.y + min.y) / 2);
    let median = ray::median_of(swt, &mut letter.points);

    letter.stats = LetterStats {
        min,
        max,
        mean_r,
        mean_g,
        mean_b,
        mean_swt,
        variance,
        center,
        median,
    };
}

/// Project `points` through a family of rotations and check whether any of
/// them yields a bounding box whose width/height ratio falls in
/// `[1/10, 10]` — a letter seen "the right way up" at some rotation. `theta`
/// runs `pi/36, 2*pi/36, ..` up to and including `pi/2`.
fn check_ratio(points: &[Point]) -> bool {
    let mut theta = ROTATED_BBOX_STEP;
    while theta <= std::f64::consts::FRAC_PI_2 + 1e-9 {
        let (sin_t, cos_t) = theta.sin_cos();
        let mut min_x = f64::MAX;
        let mut max_x = f64::MIN;
        let mut min_y = f64::MAX;
        let mut max_y = f64::MIN;

        for p in points {
            let x = p.x as f64 * cos_t + p.y as f64 * -sin_t;
            let y = p.x as f64 * sin_t + p.y as f64 * cos_t;
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }

        let ratio = (max_x - min_x) / (max_y - min_y);
        if ratio >= MIN_ASPECT_RATIO && ratio <= MAX_ASPECT_RATIO {
            return true;
        }
        theta += ROTATED_BBOX_STEP;
    }
    false
}

fn is_valid_letter(letter: &Letter, image_h: usize) -> bool {
    let stats = &letter.stats;
    if stats.variance > MAX_VARIANCE_FACTOR * stats.mean_swt {
        return false;
    }
    if (stats.max.y - stats.min.y) as f64 / image_h as f64 > MAX_Y_RATIO {
        return false;
    }
    check_ratio(&letter.points)
}

/// Drop letters that fail the shape filter (§4.6): too much stroke-width
/// variance, too tall relative to the page, or no rotation at which they
/// look letter-shaped.
pub fn filter_by_shape(letters: Vec<Letter>, image_h: usize) -> Vec<Letter> {
    letters
        .into_iter()
        .filter(|l| is_valid_letter(l, image_h))
        .collect()
}

/// Drop letters whose bounding box contains the centres of at least
/// `MAX_CROWDING_COUNT` other letters — usually a stray box enclosing a
/// whole word rather than a single glyph.
pub fn filter_by_center_crowding(letters: Vec<Letter>) -> Vec<Letter> {
    let keep: Vec<bool> = letters
        .iter()
        .enumerate()
        .map(|(i, li)| {
            let count = letters
                .iter()
                .enumerate()
                .filter(|&(j, lj)| {
                    j != i
                        && lj.stats.center.x >= li.stats.min.x
                        && lj.stats.center.x <= li.stats.max.x
                        && lj.stats.center.y >= li.stats.min.y
                        && lj.stats.center.y <= li.stats.max.y
                })
                .count();
            count < MAX_CROWDING_COUNT
        })
        .collect();

    letters
        .into_iter()
        .zip(keep)
        .filter_map(|(letter, keep)| keep.then_some(letter))
        .collect()
}
