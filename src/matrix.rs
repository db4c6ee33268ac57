//! Turns a parsed [`RawMotif`] into one or two scaled, integer
//! [`ScoreMatrix`] instances (forward, and optionally reverse
//! complement), each carrying its own p-value table. See spec §4.2.

use ndarray::Array2;

use crate::alphabet::ALPHABET_SIZE;
use crate::errors::RunError;
use crate::meme::{Background, RawMotif};
use crate::pvalue::build_pvalues;

/// MEME-compatible integer resolution for the scaled matrix.
pub const BINS: f64 = 100.0;

/// Default pseudocount mass added across the background distribution.
pub const DEFAULT_PSEUDO_SITES: f64 = 0.1;

#[derive(Debug, Clone)]
pub struct ScoreMatrix {
    pub name: String,
    /// `w` rows x 4 columns of non-negative scaled log-odds scores.
    pub values: Array2<i32>,
    pub scale: f64,
    pub min_before_scaling: f64,
    pub is_reverse_complement: bool,
    /// `pvalues[k]` = P(score >= k) under the background, for k in [0, s_max].
    pub pvalues: Vec<f64>,
}

impl ScoreMatrix {
    pub fn width(&self) -> usize {
        self.values.nrows()
    }

    pub fn s_max(&self) -> i32 {
        (self.pvalues.len() as i32) - 1
    }

    /// Score for base `base_idx` (0..3) at column `pos`. Returns
    /// `InvalidBase` for an out-of-range base, matching the
    /// programmatic-API error kind in spec §7.
    pub fn value(&self, pos: usize, base_idx: usize) -> Result<i32, RunError> {
        if base_idx >= ALPHABET_SIZE {
            return Err(RunError::invalid_base(format!(
                "base index {base_idx} out of range"
            )));
        }
        Ok(self.values[[pos, base_idx]])
    }

    /// Recovers the real (bits) log-odds score from an integer score.
    pub fn real_score(&self, integer_score: i32) -> f64 {
        integer_score as f64 / self.scale
            + self.width() as f64 * self.min_before_scaling
    }

    /// p-value for an integer score, clamping scores at or above `s_max`
    /// to the highest table index (spec §4.4 tie-break).
    pub fn pvalue(&self, integer_score: i32) -> f64 {
        let idx = integer_score.clamp(0, self.s_max()) as usize;
        self.pvalues[idx]
    }
}

fn reverse_complement_rows(rows: &[[f64; ALPHABET_SIZE]]) -> Vec<[f64; ALPHABET_SIZE]> {
    rows.iter()
        .rev()
        .map(|row| [row[3], row[2], row[1], row[0]])
        .collect()
}

fn build_single_matrix(
    name: &str,
    rows: &[[f64; ALPHABET_SIZE]],
    nsites: f64,
    background: &Background,
    pseudo_sites: f64,
    is_reverse_complement: bool,
) -> ScoreMatrix {
    let w = rows.len();
    let mut log_odds = vec![[0.0_f64; ALPHABET_SIZE]; w];
    let mut min_l = f64::INFINITY;
    let mut max_l = f64::NEG_INFINITY;

    for (c, row) in rows.iter().enumerate() {
        for b in 0..ALPHABET_SIZE {
            let f = (row[b] + pseudo_sites * background[b]) / (nsites + pseudo_sites);
            let l = (f / background[b]).log2();
            log_odds[c][b] = l;
            min_l = min_l.min(l);
            max_l = max_l.max(l);
        }
    }

    let scale = if max_l > min_l { BINS / (max_l - min_l) } else { 0.0 };

    let mut values = Array2::<i32>::zeros((w, ALPHABET_SIZE));
    for c in 0..w {
        for b in 0..ALPHABET_SIZE {
            let scaled = ((log_odds[c][b] - min_l) * scale).round() as i32;
            values[[c, b]] = scaled.max(0);
        }
    }

    let pvalues = build_pvalues(&values, background);

    ScoreMatrix {
        name: name.to_owned(),
        values,
        scale,
        min_before_scaling: min_l,
        is_reverse_complement,
        pvalues,
    }
}

/// Builds the forward matrix, and the reverse-complement matrix when
/// `include_reverse_complement` is set. Each matrix independently runs
/// the full pseudocount -> log-odds -> scale -> p-value pipeline.
pub fn build_score_matrices(
    motif: &RawMotif,
    background: &Background,
    pseudo_sites: f64,
    include_reverse_complement: bool,
) -> Result<Vec<ScoreMatrix>, RunError> {
    if motif.rows.is_empty() {
        return Err(RunError::format(format!(
            "motif {} has zero-width matrix",
            motif.name
        )));
    }

    let mut matrices = Vec::with_capacity(2);
    matrices.push(build_single_matrix(
        &motif.name,
        &motif.rows,
        motif.nsites,
        background,
        pseudo_sites,
        false,
    ));

    if include_reverse_complement {
        let rc_rows = reverse_complement_rows(&motif.rows);
        matrices.push(build_single_matrix(
            &motif.name,
            &rc_rows,
            motif.nsites,
            background,
            pseudo_sites,
            true,
        ));
    }

    Ok(matrices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meme::UNIFORM_BACKGROUND;

    fn motif_a() -> RawMotif {
        // Single-column motif strongly favoring A, per spec scenario 1.
        RawMotif {
            name: "A".to_owned(),
            nsites: 1.0,
            rows: vec![[1.0, 0.0, 0.0, 0.0]],
        }
    }

    #[test]
    fn scaled_entries_stay_within_bins_under_uniform_background() {
        let motif = motif_a();
        let matrices = build_score_matrices(
            &motif,
            &UNIFORM_BACKGROUND,
            DEFAULT_PSEUDO_SITES,
            false,
        )
        .unwrap();
        let m = &matrices[0];
        for v in m.values.iter() {
            assert!(*v >= 0 && *v as f64 <= BINS);
        }
    }

    #[test]
    fn scenario_1_log_odds_values() {
        let motif = motif_a();
        let matrices = build_score_matrices(
            &motif,
            &UNIFORM_BACKGROUND,
            DEFAULT_PSEUDO_SITES,
            false,
        )
        .unwrap();
        let m = &matrices[0];
        // f(A) = (1 + 0.025) / 1.1 ~= 0.9318; L(A) = log2(0.9318/0.25) ~= 1.898
        let f_a = (1.0 + DEFAULT_PSEUDO_SITES * 0.25) / (1.0 + DEFAULT_PSEUDO_SITES);
        let l_a = (f_a / 0.25_f64).log2();
        assert!((l_a - 1.898).abs() < 0.01);
        // A should score strictly higher than any other base in this column.
        let a_score = m.value(0, 0).unwrap();
        for b in 1..4 {
            assert!(a_score > m.value(0, b).unwrap());
        }
    }

    #[test]
    fn reverse_complement_reverses_rows_and_swaps_columns() {
        // Two-column motif: column 0 pure G, column 1 pure T.
        let motif = RawMotif {
            name: "GT".to_owned(),
            nsites: 1.0,
            rows: vec![[0.0, 0.0, 1.0, 0.0], [0.0, 0.0, 0.0, 1.0]],
        };
        let matrices = build_score_matrices(
            &motif,
            &UNIFORM_BACKGROUND,
            DEFAULT_PSEUDO_SITES,
            true,
        )
        .unwrap();
        assert_eq!(matrices.len(), 2);
        let rc = &matrices[1];
        assert!(rc.is_reverse_complement);
        // RC of GT is AC: column 0 pure A, column 1 pure C.
        let a_score = rc.value(0, 0).unwrap();
        let c_score = rc.value(1, 1).unwrap();
        for b in 1..4 {
            assert!(a_score > rc.value(0, b).unwrap() || b == 0);
        }
        assert!(a_score > rc.value(0, 3).unwrap());
        assert!(c_score > rc.value(1, 0).unwrap());
    }

    #[test]
    fn zero_width_motif_is_rejected() {
        let motif = RawMotif { name: "empty".to_owned(), nsites: 1.0, rows: vec![] };
        let err = build_score_matrices(
            &motif,
            &UNIFORM_BACKGROUND,
            DEFAULT_PSEUDO_SITES,
            false,
        )
        .unwrap_err();
        assert!(matches!(err, RunError::FormatError(_)));
    }
}
