//! FASTA driver: reads records and scans each one against every
//! matrix, forwarding scores to the tabular sink. See spec §4.5.

use std::io::Write;
use std::path::Path;

use bio::io::fasta;

use crate::errors::RunError;
use crate::matrix::ScoreMatrix;
use crate::scanner::scan;
use crate::sink::TabularSink;

/// Scans every record in `path` against every matrix in `matrices`, in
/// matrix order, forwarding each emitted score to `sink`. Records are
/// not retained past their own iteration.
pub fn run_fasta<W: Write>(
    matrices: &[ScoreMatrix],
    path: &Path,
    sink: &mut TabularSink<W>,
) -> Result<(), RunError> {
    let reader = fasta::Reader::from_file(path)
        .map_err(|e| RunError::io(format!("{}: {e}", path.display())))?;
    sink.write_header().map_err(|e| RunError::io(e.to_string()))?;

    for record in reader.records() {
        let record = record.map_err(|e| RunError::io(e.to_string()))?;
        let sequence = std::str::from_utf8(record.seq())
            .map_err(|e| RunError::format(format!("non-UTF8 FASTA sequence: {e}")))?;
        for matrix in matrices {
            scan(matrix, record.id(), sequence, sink);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{build_score_matrices, DEFAULT_PSEUDO_SITES};
    use crate::meme::{RawMotif, UNIFORM_BACKGROUND};
    use std::io::Write as _;

    fn write_fasta(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".fasta").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn scans_every_record_against_every_matrix() {
        let motif = RawMotif {
            name: "A".to_owned(),
            nsites: 1.0,
            rows: vec![[1.0, 0.0, 0.0, 0.0]],
        };
        let matrices = build_score_matrices(
            &motif,
            &UNIFORM_BACKGROUND,
            DEFAULT_PSEUDO_SITES,
            false,
        )
        .unwrap();

        let file = write_fasta(">first\nAAAA\n>second\nCCCC\n");
        let mut buf = Vec::new();
        {
            let mut sink = TabularSink::new(&mut buf);
            run_fasta(&matrices, file.path(), &mut sink).unwrap();
        }
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("first"));
        assert!(!text.contains("second"));
    }
}
