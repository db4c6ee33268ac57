//! Builds the cumulative p-value table for a scaled matrix by
//! convolving per-column discrete score distributions under the
//! background model. See spec §4.3.

use ndarray::Array2;

use crate::alphabet::ALPHABET_SIZE;
use crate::meme::Background;

/// Returns `pvalues[k] = P(score >= k)` for every reachable integer
/// score `k` in `[0, s_max]`, where `s_max = sum_c max_b M[c][b]`.
pub fn build_pvalues(matrix: &Array2<i32>, background: &Background) -> Vec<f64> {
    let w = matrix.nrows();
    // PMF over reachable scores, score 0 has probability 1 before any column.
    let mut pmf = vec![1.0_f64];

    for c in 0..w {
        let col_max = (0..ALPHABET_SIZE)
            .map(|b| matrix[[c, b]])
            .max()
            .unwrap_or(0) as usize;
        let mut next = vec![0.0_f64; pmf.len() + col_max];
        for (s, &p) in pmf.iter().enumerate() {
            if p <= 0.0 {
                continue;
            }
            for b in 0..ALPHABET_SIZE {
                let shift = matrix[[c, b]] as usize;
                next[s + shift] += p * background[b];
            }
        }
        pmf = next;
    }

    // Cumulative tail, right to left.
    let mut pvalues = vec![0.0_f64; pmf.len()];
    let mut running = 0.0_f64;
    for k in (0..pmf.len()).rev() {
        running += pmf[k];
        pvalues[k] = running;
    }
    pvalues
}
