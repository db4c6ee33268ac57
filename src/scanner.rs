//! Slides a matrix across every window of a sequence and delivers a
//! [`Score`] for each one, scorable or not. See spec §4.4.
//!
//! Strand is a property of the matrix (`ScoreMatrix::is_reverse_complement`),
//! never of `Score` itself — see DESIGN.md for the rationale.

use crate::alphabet::{alphabet_index, UNSCORABLE};
use crate::matrix::ScoreMatrix;

/// One scored window. `start`/`stop` are 1-based inclusive, matching the
/// reported interface consumers expect (spec §4.4).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    pub pvalue: f64,
    pub score: f64,
    pub start: usize,
    pub stop: usize,
}

impl Score {
    pub fn is_unscorable(&self) -> bool {
        self.pvalue.is_nan()
    }
}

/// A sink for emitted scores. The tabular printer and the BAM driver
/// both implement this, mirroring `writers.rs`'s `OutWriter<T>` shape.
///
/// `sequence` is passed alongside `score` (rather than borrowed inside
/// `Score` itself) so a consumer that needs the matched slice can read
/// it during the call; per spec §9 a `Score` is only ever valid for the
/// duration of this invocation.
pub trait ScanConsumer {
    fn accept(
        &mut self,
        matrix: &ScoreMatrix,
        sequence_name: &str,
        sequence: &str,
        score: Score,
    );
}

impl<F> ScanConsumer for F
where
    F: FnMut(&ScoreMatrix, &str, &str, Score),
{
    fn accept(
        &mut self,
        matrix: &ScoreMatrix,
        sequence_name: &str,
        sequence: &str,
        score: Score,
    ) {
        self(matrix, sequence_name, sequence, score)
    }
}

/// Scans every length-`w` window of `sequence` against `matrix`,
/// delivering exactly `max(0, |sequence| - w + 1)` scores in increasing
/// `start` order.
pub fn scan<C: ScanConsumer>(
    matrix: &ScoreMatrix,
    sequence_name: &str,
    sequence: &str,
    consumer: &mut C,
) {
    let bytes = sequence.as_bytes();
    let n = bytes.len();
    let w = matrix.width();
    if w == 0 || w > n {
        return;
    }

    for i in 0..=(n - w) {
        let mut total = 0_i32;
        let mut scorable = true;
        for c in 0..w {
            let base = alphabet_index(bytes[i + c]);
            if base == UNSCORABLE {
                scorable = false;
                break;
            }
            total += matrix.value(c, base).expect("base in range by construction");
        }

        let score = if scorable {
            Score {
                pvalue: matrix.pvalue(total),
                score: matrix.real_score(total),
                start: i + 1,
                stop: i + w,
            }
        } else {
            Score { pvalue: f64::NAN, score: 0.0, start: i + 1, stop: i + w }
        };

        consumer.accept(matrix, sequence_name, sequence, score);
    }
}
