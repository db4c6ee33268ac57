//! Integration tests for the three driver scenarios built against small
//! in-memory/temp-file fixtures: a FASTA record that is entirely
//! unscorable, a BAM file scanned unmapped-only, and a BED region
//! naming a chromosome absent from the BAM header.

use std::io::Write as _;

use rust_htslib::bam::{self, Format, Header, HeaderView, Read as _, Record, Writer};

use motif_liquidator::bam::{run_bam, BamDriverConfig};
use motif_liquidator::fasta::run_fasta;
use motif_liquidator::matrix::{build_score_matrices, DEFAULT_PSEUDO_SITES};
use motif_liquidator::meme::{RawMotif, UNIFORM_BACKGROUND};
use motif_liquidator::region::Region;
use motif_liquidator::sink::{TabularSink, HEADER_LINE};

fn write_fasta(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".fasta").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn header_view() -> std::rc::Rc<HeaderView> {
    std::rc::Rc::new(HeaderView::from_bytes(b"@SQ\tSN:chr1\tLN:1000\n"))
}

fn make_record(
    qname: &[u8],
    seq: &[u8],
    hv: &std::rc::Rc<HeaderView>,
    mapped_at: Option<i64>,
) -> Record {
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

fn write_test_bam(path: &std::path::Path, records: &[Record]) {
    let hv = header_view();
    let header = Header::from_template(&hv);
    let mut writer = Writer::from_path(path, &header, Format::Bam).unwrap();
    for rec in records {
        writer.write(rec).unwrap();
    }
}

#[test]
fn scenario_3_all_n_fasta_record_emits_header_only_no_hits() {
    let motif = RawMotif {
        name: "m".to_owned(),
        nsites: 1.0,
        rows: vec![[0.25, 0.25, 0.25, 0.25], [0.25, 0.25, 0.25, 0.25]],
    };
    let matrices =
        build_score_matrices(&motif, &UNIFORM_BACKGROUND, DEFAULT_PSEUDO_SITES, false).unwrap();

    let file = write_fasta(">r\nNNNN\n");
    let mut buf = Vec::new();
    {
        let mut sink = TabularSink::new(&mut buf);
        run_fasta(&matrices, file.path(), &mut sink).unwrap();
    }
    let text = String::from_utf8(buf).unwrap();
    assert_eq!(
        text.trim_end(),
        HEADER_LINE,
        "header must still be printed even though every window is unscorable: {text:?}"
    );
}

#[test]
fn scenario_4_bam_unmapped_only_counts_only_unmapped_reads() {
    let motif = RawMotif {
        name: "AA".to_owned(),
        nsites: 1.0,
        rows: vec![[1.0, 0.0, 0.0, 0.0], [1.0, 0.0, 0.0, 0.0]],
    };
    let matrices =
        build_score_matrices(&motif, &UNIFORM_BACKGROUND, DEFAULT_PSEUDO_SITES, false).unwrap();

    let hv = header_view();
    let unmapped_read = make_record(b"read_unmapped", b"AAAA", &hv, None);
    let mapped_read = make_record(b"read_mapped", b"CCCC", &hv, Some(0));

    let dir = tempfile::tempdir().unwrap();
    let in_path = dir.path().join("in.bam");
    write_test_bam(&in_path, &[unmapped_read, mapped_read]);

    let config = BamDriverConfig {
        unmapped_only: true,
        verbose: false,
        regions: None,
        suppress_progress: true,
    };
    let mut stdout = Vec::new();
    let counters = run_bam(&matrices, &in_path, None, &config, &mut stdout).unwrap();

    assert_eq!(counters.read_count, 2);
    assert_eq!(counters.unmapped_count, 1);
    assert_eq!(counters.read_hit_count, 1);
    assert_eq!(counters.unmapped_hit_count, 1);
}

#[test]
fn scenario_5_bed_region_on_absent_chromosome_is_skipped_without_error() {
    let motif = RawMotif {
        name: "AA".to_owned(),
        nsites: 1.0,
        rows: vec![[1.0, 0.0, 0.0, 0.0], [1.0, 0.0, 0.0, 0.0]],
    };
    let matrices =
        build_score_matrices(&motif, &UNIFORM_BACKGROUND, DEFAULT_PSEUDO_SITES, false).unwrap();

    let hv = header_view();
    let read = make_record(b"read1", b"AAAA", &hv, Some(0));

    let dir = tempfile::tempdir().unwrap();
    let in_path = dir.path().join("in.bam");
    write_test_bam(&in_path, &[read]);
    bam::index::build(&in_path, None, bam::index::Type::Bai, 1).unwrap();

    let regions = [Region::new("chrX".to_owned(), 0, 10)];
    let config = BamDriverConfig {
        unmapped_only: false,
        verbose: false,
        regions: Some(&regions),
        suppress_progress: true,
    };
    let mut stdout = Vec::new();
    let counters = run_bam(&matrices, &in_path, None, &config, &mut stdout).unwrap();

    assert_eq!(counters.read_count, 0);
    assert_eq!(counters.read_hit_count, 0);
}
