//! Accumulates BAM-scan counters and renders the shutdown summary
//! block: six `#`-prefixed ratio lines written to stdout. See spec §6,
//! and §4.8.

use std::io::Write;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counters {
    pub read_count: u64,
    pub unmapped_count: u64,
    pub read_hit_count: u64,
    pub unmapped_hit_count: u64,
    pub total_hit_count: u64,
}

impl Counters {
    pub fn mapped_reads(&self) -> u64 {
        self.read_count - self.unmapped_count
    }

    pub fn mapped_hit_count(&self) -> u64 {
        self.read_hit_count - self.unmapped_hit_count
    }
}

fn pct(numerator: u64, denominator: u64) -> f64 {
    // Intentionally not guarded: 0/0 renders as the IEEE "NaN" float,
    // which is the correct answer for an empty run, not an error.
    (numerator as f64 / denominator as f64) * 100.0
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    numerator as f64 / denominator as f64
}

/// Writes the summary block. `unmapped_only` suppresses the two lines
/// that compare mapped/total hits, which are meaningless when only
/// unmapped reads were ever scored.
pub fn write_summary<W: Write>(
    counters: &Counters,
    unmapped_only: bool,
    out: &mut W,
) -> std::io::Result<()> {
    writeln!(
        out,
        "# (total hits)/(total reads) = {}/{} = {:.2}%",
        counters.read_hit_count,
        counters.read_count,
        pct(counters.read_hit_count, counters.read_count)
    )?;

    if !unmapped_only {
        writeln!(
            out,
            "# (mapped hits)/(mapped reads) = {}/{} = {:.2}%",
            counters.mapped_hit_count(),
            counters.mapped_reads(),
            pct(counters.mapped_hit_count(), counters.mapped_reads())
        )?;
    }

    writeln!(
        out,
        "# (unmapped hits)/(unmapped reads) = {}/{} = {:.2}%",
        counters.unmapped_hit_count,
        counters.unmapped_count,
        pct(counters.unmapped_hit_count, counters.unmapped_count)
    )?;

    if !unmapped_only {
        writeln!(
            out,
            "# (unmapped hits)/(total hits) = {}/{} = {:.2}%",
            counters.unmapped_hit_count,
            counters.read_hit_count,
            pct(counters.unmapped_hit_count, counters.read_hit_count)
        )?;
    }

    writeln!(
        out,
        "# (unmapped reads)/(total reads) = {}/{} = {:.2}%",
        counters.unmapped_count,
        counters.read_count,
        pct(counters.unmapped_count, counters.read_count)
    )?;

    writeln!(
        out,
        "# total hits: {} (average hits per hit read = {:.3})",
        counters.total_hit_count,
        ratio(counters.total_hit_count, counters.read_hit_count)
    )?;

    Ok(())
}
