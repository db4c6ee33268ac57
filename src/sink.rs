//! Tab-separated FIMO-style printer. Mirrors the `OutWriter<T>` shape
//! used by `writers.rs`'s table/TSV writers, but consumes scores
//! directly from the scanner as they are produced rather than buffering
//! a whole result set first.

use std::io::Write;

use crate::matrix::ScoreMatrix;
use crate::scanner::{ScanConsumer, Score};

/// Scores with a p-value at or above this threshold are not hits and
/// are never printed (spec §4.6 step 4, §4.7).
pub const HIT_PVALUE_THRESHOLD: f64 = 1e-4;

/// True when `score` clears the hit threshold (scorable and
/// `pvalue < HIT_PVALUE_THRESHOLD`). Shared by the FASTA sink and the
/// BAM driver so "what counts as a hit" has one definition.
pub fn is_hit(score: &Score) -> bool {
    !score.is_unscorable() && score.pvalue < HIT_PVALUE_THRESHOLD
}

/// Renders one FIMO-style tab-separated row. `start`/`stop` are passed
/// explicitly (rather than taken from `score`) so the BAM driver can
/// report `read.pos`-shifted coordinates while reusing this formatting.
pub fn format_row(
    pattern_name: &str,
    sequence_name: &str,
    start: i64,
    stop: i64,
    strand: char,
    score: f64,
    pvalue: f64,
    matched_sequence: &str,
) -> String {
    format!(
        "{pattern_name}\t{sequence_name}\t{start}\t{stop}\t{strand}\t{:.6}\t{:.3e}\t\t{}",
        score,
        pvalue,
        matched_sequence.to_ascii_uppercase(),
    )
}

pub const HEADER_LINE: &str =
    "#pattern_name\tsequence_name\tstart\tstop\tstrand\tscore\tpvalue\tq-value\tmatched_sequence";

pub struct TabularSink<W: Write> {
    writer: W,
    header_written: bool,
}

impl<W: Write> TabularSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, header_written: false }
    }

    /// Writes the `#`-prefixed header line if it hasn't been written yet.
    /// Idempotent, and independent of whether any hit is ever printed —
    /// spec §4.7 requires the header once at start, not once before the
    /// first row.
    pub fn write_header(&mut self) -> std::io::Result<()> {
        if !self.header_written {
            writeln!(self.writer, "{HEADER_LINE}")?;
            self.header_written = true;
        }
        Ok(())
    }

    /// Writes one record if `score` clears the hit threshold; returns
    /// whether a row was written.
    pub fn write_score(
        &mut self,
        matrix: &ScoreMatrix,
        sequence_name: &str,
        sequence: &str,
        score: Score,
    ) -> std::io::Result<bool> {
        self.write_header()?;
        if !is_hit(&score) {
            return Ok(false);
        }
        let strand = if matrix.is_reverse_complement { '-' } else { '+' };
        let matched = &sequence[score.start - 1..score.stop];
        let row = format_row(
            &matrix.name,
            sequence_name,
            score.start as i64,
            score.stop as i64,
            strand,
            score.score,
            score.pvalue,
            matched,
        );
        writeln!(self.writer, "{row}")?;
        Ok(true)
    }
}

impl<W: Write> ScanConsumer for TabularSink<W> {
    fn accept(
        &mut self,
        matrix: &ScoreMatrix,
        sequence_name: &str,
        sequence: &str,
        score: Score,
    ) {
        // A malformed downstream writer (e.g. closed BAM-mode stdout) is
        // not fatal to the scan itself; callers that need to know write
        // failures use `write_score` directly.
        let _ = self.write_score(matrix, sequence_name, sequence, score);
    }
}
