//! Pair formation and greedy chain merging: letters that look like they
//! belong to the same line of text get linked into pairs, and compatible
//! pairs are then merged end-to-end into longer chains.

use crate::swt::letters::Letter;

const MAX_MEDIAN_RATIO: f64 = 2.0;
const MAX_DIMENSION_RATIO: f64 = 2.0;
const MAX_COLOR_DIST: f64 = 1600.0;
const MAX_DIST_RATIO: f64 = 9.0;
const MERGE_STRICTNESS: f64 = std::f64::consts::PI / 6.0;

/// A chain of letters, stored as an ordered list of indices into the
/// caller's letter arena (`letters[0]` is the chain's "first" end,
/// `letters.last()` its "last"). `dist` is the squared distance between the
/// two ends' centres; `direction` is the unit vector from first to last.
#[derive(Debug, Clone)]
pub struct Chain {
    pub letters: Vec<usize>,
    pub dist: f64,
    pub direction: (f64, f64),
    pub merged: bool,
}

/// Form every valid 2-letter chain from `letters` (indexed `0..letters.len()`
/// in the returned chains). A pair is valid when their median stroke widths
/// and dimensions are within a factor of 2 of each other, their mean colours
/// are close, and their centres aren't implausibly far apart relative to
/// their size (§4.6).
pub fn make_valid_pairs(letters: &[Letter]) -> Vec<Chain> {
    let mut chains = Vec::new();

    for a in 0..letters.len() {
        for b in (a + 1)..letters.len() {
            let sa = &letters[a].stats;
            let sb = &letters[b].stats;

            let median_ratio = sa.median / sb.median;
            if median_ratio > MAX_MEDIAN_RATIO || 1.0 / median_ratio > MAX_MEDIAN_RATIO {
                continue;
            }

            let ha = (sa.max.y - sa.min.y) as f64;
            let hb = (sb.max.y - sb.min.y) as f64;
            let dim_ratio = ha / hb;
            if dim_ratio > MAX_DIMENSION_RATIO || 1.0 / dim_ratio > MAX_DIMENSION_RATIO {
                continue;
            }

            let color_dist = (sa.mean_r - sb.mean_r).powi(2)
                + (sa.mean_g - sb.mean_g).powi(2)
                + (sa.mean_b - sb.mean_b).powi(2);
            if color_dist >= MAX_COLOR_DIST {
                continue;
            }

            let dx = (sb.center.x - sa.center.x) as f64;
            let dy = (sb.center.y - sa.center.y) as f64;
            let dist = dx * dx + dy * dy;

            let wa = (sa.max.x - sa.min.x) as f64;
            let wb = (sb.max.x - sb.min.x) as f64;
            let weird = wa.min(hb).max(wb.min(ha));
            let weird = weird * weird;
            if dist >= MAX_DIST_RATIO * weird {
                continue;
            }

            let h = dx.hypot(dy);
            chains.push(Chain {
                letters: vec![a, b],
                dist,
                direction: (dx / h, dy / h),
                merged: false,
            });
        }
    }

    chains
}

fn recompute_endpoints(chain: &mut Chain, letters: &[Letter]) {
    let first = chain.letters[0];
    let last = *chain.letters.last().unwrap();
    let cf = letters[first].stats.center;
    let cl = letters[last].stats.center;
    let dx = (cl.x - cf.x) as f64;
    let dy = (cl.y - cf.y) as f64;
    chain.dist = dx * dx + dy * dy;
    let h = dx.hypot(dy);
    chain.direction = (dx / h, dy / h);
}

/// Greedily splice chains that share an endpoint and point in compatible
/// directions, shortest pairs first.
///
/// This mirrors a genuine aliasing quirk in the source: the loop variable
/// that tracks "the chain currently being grown" is reassigned in place
/// whenever a merge swaps which side survives, so across one outer pass it
/// can drift across array positions rather than always referring to
/// `chains[i]`. `cur_i` plays that role here.
pub fn merge_chains(chains: &mut [Chain], letters: &[Letter]) {
    chains.sort_by(|a, b| a.dist.partial_cmp(&b.dist).unwrap());
    let n = chains.len();

    for i in 0..n {
        let mut cur_i = i;
        for j in 0..n {
            if i == j {
                continue;
            }
            let cur_j = j;
            if chains[cur_i].merged || chains[cur_j].merged {
                continue;
            }

            let i_first = chains[cur_i].letters[0];
            let i_last = *chains[cur_i].letters.last().unwrap();
            let j_first = chains[cur_j].letters[0];
            let j_last = *chains[cur_j].letters.last().unwrap();

            let shares_end =
                i_first == j_first || i_first == j_last || i_last == j_last || i_last == j_first;
            if !shares_end {
                continue;
            }

            let (i_dx, i_dy) = chains[cur_i].direction;
            let (mut j_dx, mut j_dy) = chains[cur_j].direction;
            let same_polarity = i_first == j_first || i_last == j_last;
            if same_polarity {
                j_dx = -j_dx;
                j_dy = -j_dy;
            }
            let dot = (i_dx * j_dx + i_dy * j_dy).clamp(-1.0, 1.0);
            if dot.acos() >= MERGE_STRICTNESS {
                continue;
            }

            if same_polarity {
                chains[cur_j].letters.reverse();
            }

            let i_last_now = *chains[cur_i].letters.last().unwrap();
            let j_first_now = chains[cur_j].letters[0];
            let (grown, dying) = if i_last_now == j_first_now {
                (cur_j, cur_i)
            } else {
                (cur_i, cur_j)
            };
            debug_assert_eq!(chains[grown].letters[0], *chains[dying].letters.last().unwrap());

            let mut spliced = chains[dying].letters.clone();
            spliced.pop();
            spliced.extend_from_slice(&chains[grown].letters);
            chains[grown].letters = spliced;
            chains[dying].merged = true;

            recompute_endpoints(&mut chains[grown], letters);
            cur_i = grown;
        }
    }
}
