//! BAM driver: opens an input (optionally indexed for region fetch),
//! iterates reads, unpacks sequences, scans them against every matrix,
//! tallies hit counters, and optionally writes a passthrough archive of
//! reads that produced at least one hit. See spec §4.6.
//!
//! Grounded on `util::Region`/`util::get_targets` (tid lookup),
//! `util::add_modkit_pg_records` (output provenance), and
//! `util::get_spinner` (progress reporting) — the BAM I/O library
//! itself (`rust_htslib`) is unchanged.

use std::io::Write;
use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use rust_htslib::bam::{self, header::HeaderRecord, HeaderView, Read as HtsRead};

use crate::errors::RunError;
use crate::matrix::ScoreMatrix;
use crate::region::Region;
use crate::scanner::scan;
use crate::sink::{format_row, is_hit, HEADER_LINE};
use crate::summary::Counters;

/// htslib's 4-bit-to-ASCII decode table (SAM spec order). Indexing by
/// the raw nibble code avoids allocating per read via `Seq::as_bytes`
/// and lets us reuse one scratch buffer across the whole scan.
const SEQ_NT16_STR: [u8; 16] = *b"=ACMGRSVTWYHKDBN";

fn unpack_into(record: &bam::Record, buf: &mut Vec<u8>) {
    let seq = record.seq();
    let len = seq.len();
    buf.clear();
    buf.reserve(len.saturating_sub(buf.capacity()));
    for i in 0..len {
        buf.push(SEQ_NT16_STR[seq.encoded_base(i) as usize]);
    }
}

fn chrom_to_tid(header: &HeaderView, chrom: &str) -> Option<u32> {
    (0..header.target_count()).find(|&tid| {
        header
            .tid2name(tid)
            .eq_ignore_ascii_case(chrom.as_bytes())
    })
}

fn query_name(record: &bam::Record) -> String {
    String::from_utf8(record.qname().to_vec()).unwrap_or_else(|_| "???".to_owned())
}

/// Appends a `@PG` provenance record to the output header, mirroring
/// `util::add_modkit_pg_records` without that function's run-chaining
/// logic (we always write exactly one invocation's record per run).
pub fn add_pg_record(header: &mut bam::Header) {
    let command_line = std::env::args().collect::<Vec<String>>().join(" ");
    let version = env!("CARGO_PKG_VERSION");
    let mut record = HeaderRecord::new(b"PG");
    record.push_tag(b"ID", &"motif_liquidator");
    record.push_tag(b"PN", &"motif_liquidator");
    record.push_tag(b"VN", &version.to_owned());
    record.push_tag(b"CL", &command_line);
    header.push_record(&record);
}

fn get_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.blue} [{elapsed_precise}] {pos} reads {msg}")
            .unwrap(),
    );
    spinner
}

pub struct BamDriverConfig<'a> {
    pub unmapped_only: bool,
    pub verbose: bool,
    pub regions: Option<&'a [Region]>,
    pub suppress_progress: bool,
}

/// Scans every read (or every read in every region) in `in_path`
/// against `matrices`, returning the accumulated counters. Writes
/// passthrough reads to `out_path` when given.
pub fn run_bam<W: Write>(
    matrices: &[ScoreMatrix],
    in_path: &Path,
    out_path: Option<&Path>,
    config: &BamDriverConfig,
    stdout: &mut W,
) -> Result<Counters, RunError> {
    let mut counters = Counters::default();
    let mut buf = Vec::new();

    if config.verbose {
        let _ = writeln!(stdout, "{HEADER_LINE}");
    }

    let mut out_writer = match out_path {
        Some(path) => {
            let header_source = bam::Reader::from_path(in_path)?;
            let mut header = bam::Header::from_template(header_source.header());
            add_pg_record(&mut header);
            Some(bam::Writer::from_path(path, &header, bam::Format::Bam)?)
        }
        None => None,
    };

    let spinner = get_spinner();
    if config.suppress_progress {
        spinner.set_draw_target(indicatif::ProgressDrawTarget::hidden());
    }

    match config.regions {
        None => {
            let mut reader = bam::Reader::from_path(in_path)?;
            let mut record = bam::Record::new();
            loop {
                match reader.read(&mut record) {
                    Some(Ok(())) => {}
                    Some(Err(e)) => return Err(RunError::from(e)),
                    None => break,
                }
                let sequence_name = query_name(&record);
                process_read(
                    &record,
                    &sequence_name,
                    matrices,
                    &mut counters,
                    config,
                    &mut buf,
                    stdout,
                    out_writer.as_mut(),
                )?;
                spinner.inc(1);
            }
            // The passthrough writer must be flushed and closed before the
            // reader below it goes out of scope at this arm's end (spec
            // §5): an explicit drop here runs ahead of that implicit one.
            drop(out_writer);
        }
        Some(regions) => {
            let mut reader = bam::IndexedReader::from_path(in_path)?;
            let header = reader.header().clone();
            for region in regions {
                let tid = match chrom_to_tid(&header, &region.chrom) {
                    Some(tid) => tid,
                    None => {
                        info!(
                            "skipping region {}, chromosome not in BAM header",
                            region.label()
                        );
                        continue;
                    }
                };
                let fetch_def = bam::FetchDefinition::Region(
                    tid as i32,
                    region.start as i64,
                    region.end as i64,
                );
                reader.fetch(fetch_def).map_err(|e| {
                    RunError::index(format!(
                        "failed to fetch region {}: {e}",
                        region.label()
                    ))
                })?;

                let mut record = bam::Record::new();
                loop {
                    match reader.read(&mut record) {
                        Some(Ok(())) => {}
                        Some(Err(e)) => return Err(RunError::from(e)),
                        None => break,
                    }
                    process_read(
                        &record,
                        &region.label(),
                        matrices,
                        &mut counters,
                        config,
                        &mut buf,
                        stdout,
                        out_writer.as_mut(),
                    )?;
                    spinner.inc(1);
                }
            }
            drop(out_writer);
        }
    }

    spinner.finish_and_clear();
    Ok(counters)
}

#[allow(clippy::too_many_arguments)]
fn process_read<W: Write>(
    record: &bam::Record,
    sequence_name: &str,
    matrices: &[ScoreMatrix],
    counters: &mut Counters,
    config: &BamDriverConfig,
    buf: &mut Vec<u8>,
    stdout: &mut W,
    mut out_writer: Option<&mut bam::Writer>,
) -> Result<(), RunError> {
    counters.read_count += 1;
    let unmapped = record.is_unmapped();
    if unmapped {
        counters.unmapped_count += 1;
    }
    if config.unmapped_only && !unmapped {
        return Ok(());
    }

    unpack_into(record, buf);
    let sequence = std::str::from_utf8(buf)
        .expect("htslib decode table is pure ASCII");

    let pre = counters.total_hit_count;
    // read.pos() is meaningless for unmapped reads; substitute 0 (spec §9).
    let read_pos = if unmapped { 0 } else { record.pos() };

    for matrix in matrices {
        let counters = &mut *counters;
        let stdout = &mut *stdout;
        scan(matrix, sequence_name, sequence, &mut |m: &ScoreMatrix,
                                                     name: &str,
                                                     seq: &str,
                                                     score: crate::scanner::Score| {
            if !is_hit(&score) {
                return;
            }
            counters.total_hit_count += 1;
            if config.verbose {
                let strand = if m.is_reverse_complement { '-' } else { '+' };
                let matched = &seq[score.start - 1..score.stop];
                let row = format_row(
                    &m.name,
                    name,
                    read_pos + score.start as i64,
                    read_pos + score.stop as i64,
                    strand,
                    score.score,
                    score.pvalue,
                    matched,
                );
                let _ = writeln!(stdout, "{row}");
            }
        });
    }

    if counters.total_hit_count > pre {
        counters.read_hit_count += 1;
        if unmapped {
            counters.unmapped_hit_count += 1;
        }
        if let Some(writer) = out_writer.as_mut() {
            writer.write(record).map_err(|e| RunError::io(e.to_string()))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    use rust_htslib::bam::{Format, Header, HeaderView, Record, Writer};

    use crate::matrix::{build_score_matrices, DEFAULT_PSEUDO_SITES};
    use crate::meme::{RawMotif, UNIFORM_BACKGROUND};

    fn header_view() -> Rc<HeaderView> {
        Rc::new(HeaderView::from_bytes(b"@SQ\tSN:chr1\tLN:1000\n"))
    }

    fn make_record(qname: &[u8], seq: &[u8], hv: &Rc<HeaderView>, mapped_at: Option<i64>) -> Record {
        let mut rec = Record::new();
        let qual = vec![255u8; seq.len()];
        rec.set(qname, None, seq, &qual);
        rec.set_header(hv.clone());
        match mapped_at {
            Some(pos) => {
                rec.set_tid(0);
                rec.set_pos(pos);
                rec.unset_unmapped();
            }
            None => rec.set_unmapped(),
        }
        rec
    }

    fn write_test_bam(path: &Path, records: &[Record]) {
        let hv = header_view();
        let header = Header::from_template(&hv);
        let mut writer = Writer::from_path(path, &header, Format::Bam).unwrap();
        for rec in records {
            writer.write(rec).unwrap();
        }
    }

    fn motif_aa() -> ScoreMatrix {
        let motif = RawMotif {
            name: "AA".to_owned(),
            nsites: 1.0,
            rows: vec![[1.0, 0.0, 0.0, 0.0], [1.0, 0.0, 0.0, 0.0]],
        };
        build_score_matrices(&motif, &UNIFORM_BACKGROUND, DEFAULT_PSEUDO_SITES, false)
            .unwrap()
            .remove(0)
    }

    #[test]
    fn passthrough_archive_contains_only_hit_reads() {
        let hv = header_view();
        let hit_read = make_record(b"hit", b"AAAA", &hv, Some(0));
        let miss_read = make_record(b"miss", b"CCCC", &hv, Some(4));

        let dir = tempfile::tempdir().unwrap();
        let in_path = dir.path().join("in.bam");
        let out_path = dir.path().join("out.bam");
        write_test_bam(&in_path, &[hit_read, miss_read]);

        let matrices = vec![motif_aa()];
        let config = BamDriverConfig {
            unmapped_only: false,
            verbose: false,
            regions: None,
            suppress_progress: true,
        };
        let mut stdout = Vec::new();
        let counters =
            run_bam(&matrices, &in_path, Some(&out_path), &config, &mut stdout).unwrap();
        assert_eq!(counters.read_hit_count, 1);

        let mut reader = bam::Reader::from_path(&out_path).unwrap();
        let mut record = bam::Record::new();
        let mut written = Vec::new();
        while let Some(Ok(())) = reader.read(&mut record) {
            written.push(query_name(&record));
        }
        assert_eq!(written, vec!["hit".to_owned()]);
    }
}
