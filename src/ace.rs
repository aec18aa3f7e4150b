//! Automatic Color Equalization (C5): the only multithreaded filter in this
//! crate. Two stages — chromatic-spatial adjustment, then dynamic tone
//! scaling — each run as exactly `nb_threads` OS-level workers over disjoint
//! horizontal stripes, joined at an explicit barrier between stages.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::bitmap::{self, Bitmap, Channel};

const MAX_THREADS: usize = 32;
const COLOR_CHANNELS: [Channel; 3] = [Channel::R, Channel::G, Channel::B];

#[derive(Debug, Clone, Copy)]
pub struct AceParams {
    pub nb_samples: usize,
    pub slope: f64,
    pub limit: f64,
    pub nb_threads: usize,
}

impl Default for AceParams {
    fn default() -> Self {
        AceParams {
            nb_samples: 100,
            slope: 10.0,
            limit: 1000.0,
            nb_threads: 2,
        }
    }
}

/// Contiguous, disjoint row ranges (`[start, end)`) covering `0..h`, one per
/// worker. The last stripe absorbs the remainder of `h / nb_threads`.
fn stripe_row_ranges(h: usize, nb_threads: usize) -> Vec<(usize, usize)> {
    let per_thread = h / nb_threads;
    let mut ranges = Vec::with_capacity(nb_threads);
    let mut start = 0;
    for t in 0..nb_threads {
        let end = if t + 1 == nb_threads { h } else { start + per_thread };
        ranges.push((start, end));
        start = end;
    }
    ranges
}

/// Resolve the effective thread count. The source's quirk is preserved
/// exactly: a request above `MAX_THREADS` is clamped down to it, but a
/// request above the image height falls all the way back to a single
/// thread rather than being clamped to `h`.
fn effective_nb_threads(requested: usize, h: usize) -> usize {
    let mut nb_threads = requested.max(1);
    if nb_threads > MAX_THREADS {
        nb_threads = MAX_THREADS;
    }
    if nb_threads > h {
        nb_threads = 1;
    }
    nb_threads
}

fn draw_samples(nb_samples: usize, w: usize, h: usize, seed: u64) -> Vec<(i32, i32)> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..nb_samples)
        .map(|_| {
            let x = rng.gen_range(0..w as i32);
            let y = rng.gen_range(0..h as i32);
            (x, y)
        })
        .collect()
}

/// Stage 1 for a single pixel: accumulate per-channel saturation sums and
/// the shared denominator (once per sample, not per channel — see the
/// `denominator_accumulates_once_per_sample` test below).
fn stage1_pixel_score(
    input: &Bitmap,
    samples: &[(i32, i32)],
    slope: f64,
    limit: f64,
    h: usize,
    i: i32,
    j: i32,
) -> [f64; 3] {
    let mut sums = [0.0f64; 3];
    let mut denominator = 0.0f64;
    let threshold = (h / 5) as f64;

    for &(sx, sy) in samples {
        let dist = ((i - sx) as f64).hypot((j - sy) as f64);
        if dist < threshold {
            continue;
        }
        for (c, &channel) in COLOR_CHANNELS.iter().enumerate() {
            let delta =
                input.get_channel(i, j, channel) as f64 - input.get_channel(sx, sy, channel) as f64;
            let saturation = (delta * slope).clamp(-limit, limit) / dist;
            sums[c] += saturation;
        }
        denominator += limit / dist;
    }

    [
        sums[0] / denominator,
        sums[1] / denominator,
        sums[2] / denominator,
    ]
}

/// `ace(in, out, params, seed)` (§4.5 / §6).
pub fn ace(input: &Bitmap, output: &mut Bitmap, params: &AceParams, seed: u64) {
    assert_eq!(input.w, output.w);
    assert_eq!(input.h, output.h);
    let w = input.w;
    let h = input.h;

    let nb_threads = effective_nb_threads(params.nb_threads, h);
    log::debug!(
        "ace: {w}x{h} bitmap, {nb_threads} threads, {} samples, seed={seed}",
        params.nb_samples
    );

    let samples = draw_samples(params.nb_samples, w, h, seed);
    let stripes = stripe_row_ranges(h, nb_threads);

    let mut score = vec![[0.0f64; 3]; w * h];
    let mut local_bounds: Vec<([f64; 3], [f64; 3])> = Vec::with_capacity(nb_threads);

    // Stage 1 — chromatic-spatial adjustment, parallel by stripe.
    {
        let mut score_slices: Vec<&mut [[f64; 3]]> = Vec::with_capacity(nb_threads);
        let mut rest = score.as_mut_slice();
        for &(start, end) in &stripes {
            let (head, tail) = rest.split_at_mut((end - start) * w);
            score_slices.push(head);
            rest = tail;
        }

        std::thread::scope(|scope| {
            let handles: Vec<_> = stripes
                .iter()
                .zip(score_slices)
                .enumerate()
                .map(|(idx, (&(row_start, row_end), score_slice))| {
                    let samples = &samples;
                    let input = &*input;
                    let params = *params;
                    scope.spawn(move || {
                        log::trace!(
                            "ace stage1: stripe {idx} rows [{row_start},{row_end}) starting"
                        );
                        let mut local_min = [f64::MAX; 3];
                        let mut local_max = [f64::MIN; 3];
                        for j in row_start..row_end {
                            for i in 0..w {
                                let score_val = stage1_pixel_score(
                                    input,
                                    samples,
                                    params.slope,
                                    params.limit,
                                    h,
                                    i as i32,
                                    j as i32,
                                );
                                let local_idx = (j - row_start) * w + i;
                                score_slice[local_idx] = score_val;
                                for c in 0..3 {
                                    local_min[c] = local_min[c].min(score_val[c]);
                                    local_max[c] = local_max[c].max(score_val[c]);
                                }
                            }
                        }
                        (local_min, local_max)
                    })
                })
                .collect();

            for handle in handles {
                local_bounds.push(handle.join().expect("ace stage1 worker panicked"));
            }
        });
    }

    // Barrier: reduce per-stripe min/max into global bounds.
    let mut global_min = [f64::MAX; 3];
    let mut global_max = [f64::MIN; 3];
    for (local_min, local_max) in &local_bounds {
        for c in 0..3 {
            global_min[c] = global_min[c].min(local_min[c]);
            global_max[c] = global_max[c].max(local_max[c]);
        }
    }

    // Stage 2 — dynamic tone scaling, parallel by the same stripes.
    {
        let mut out_slices: Vec<&mut [u32]> = Vec::with_capacity(nb_threads);
        let mut rest = output.pixels_mut();
        for &(start, end) in &stripes {
            let (head, tail) = rest.split_at_mut((end - start) * w);
            out_slices.push(head);
            rest = tail;
        }

        let score_ref = &score;
        std::thread::scope(|scope| {
            for (idx, (&(row_start, row_end), out_slice)) in
                stripes.iter().zip(out_slices).enumerate()
            {
                scope.spawn(move || {
                    log::trace!("ace stage2: stripe {idx} rows [{row_start},{row_end}) starting");
                    for j in row_start..row_end {
                        for i in 0..w {
                            let s = score_ref[j * w + i];
                            let mut channels = [0u8; 3];
                            for c in 0..3 {
                                let scaled = 255.0 * (s[c] - global_min[c])
                                    / (global_max[c] - global_min[c]);
                                channels[c] = scaled.clamp(0.0, 255.0) as u8;
                            }
                            let local_idx = (j - row_start) * w + i;
                            out_slice[local_idx] =
                                bitmap::pack(channels[0], channels[1], channels[2], 0xFF);
                        }
                    }
                });
            }
        });
    }
}
