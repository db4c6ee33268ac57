//! BED region parsing: columns 1-3 used (chrom, start, end), other
//! columns ignored. See spec §3, §4.6. Modeled on
//! `position_filter::StrandedPositionFilter::from_bed_file`'s
//! line-parsing loop, simplified since we don't need an interval-overlap
//! index here (each region becomes one direct htslib fetch).

use std::io::BufRead;

use derive_new::new;

use crate::errors::RunError;

/// A half-open, 0-based genomic interval.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct Region {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
}

impl Region {
    pub fn label(&self) -> String {
        format!("{}:{}-{}", self.chrom, self.start, self.end)
    }
}

/// Parses a BED stream into a list of regions. Malformed lines
/// (missing columns, non-numeric coordinates) are a `FormatError`;
/// whether a chromosome actually exists in a given BAM is resolved
/// later by the BAM driver, not here.
pub fn parse_bed<R: BufRead>(reader: R) -> Result<Vec<Region>, RunError> {
    let mut regions = Vec::new();
    for line in reader.lines() {
        let line = line.map_err(|e| RunError::io(e.to_string()))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let parts: Vec<&str> = trimmed.split_whitespace().collect();
        if parts.len() < 3 {
            return Err(RunError::format(format!(
                "BED line has fewer than 3 columns: {line:?}"
            )));
        }
        let start: u64 = parts[1]
            .parse()
            .map_err(|_| RunError::format(format!("bad BED start in {line:?}")))?;
        let end: u64 = parts[2]
            .parse()
            .map_err(|_| RunError::format(format!("bad BED end in {line:?}")))?;
        regions.push(Region::new(parts[0].to_owned(), start, end));
    }
    Ok(regions)
}
