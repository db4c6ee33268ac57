//! CLI entry point. Parses arguments, builds score matrices from the
//! motif file, dispatches to the FASTA or BAM driver by the sequence
//! file's extension, and prints the shutdown summary. See
//! §4.9.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::anyhow;
use clap::Parser;
use log::{error, info};

use motif_liquidator::bam::{run_bam, BamDriverConfig};
use motif_liquidator::errors::RunError;
use motif_liquidator::fasta::run_fasta;
use motif_liquidator::logging::init_logging;
use motif_liquidator::matrix::{build_score_matrices, DEFAULT_PSEUDO_SITES, ScoreMatrix};
use motif_liquidator::meme::{self, Background, UNIFORM_BACKGROUND};
use motif_liquidator::region::parse_bed;
use motif_liquidator::sink::TabularSink;
use motif_liquidator::summary::write_summary;

#[derive(Parser, Debug)]
#[command(
    name = "motif_liquidator",
    about = "Scans FASTA or BAM sequences for statistically significant PWM motif hits",
    version
)]
struct Cli {
    /// MEME minimal-format file with one or more motifs.
    motif_file: PathBuf,

    /// FASTA (.fasta) or BAM (.bam) file of sequences to scan.
    sequence_file: PathBuf,

    /// MEME-style background letter-frequency file; defaults to uniform.
    #[arg(short, long)]
    background: Option<PathBuf>,

    /// Output path: tabular hits for FASTA input, passthrough BAM archive
    /// for BAM input. Tabular output goes to standard output when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// BED file of regions to restrict scanning to. BAM input only.
    #[arg(short, long)]
    region: Option<PathBuf>,

    /// Score only unmapped reads. BAM input only.
    #[arg(short, long)]
    unmapped_only: bool,

    /// Emit per-hit tabular lines to standard output (BAM input only;
    /// FASTA hits are always written to the output sink).
    #[arg(short, long)]
    verbose: bool,

    /// Write debug logs to this file in addition to the console.
    #[arg(long)]
    log_filepath: Option<PathBuf>,
}

fn load_background(path: Option<&Path>) -> Result<Background, RunError> {
    match path {
        Some(p) => {
            let file = File::open(p).map_err(|e| RunError::io(format!("{}: {e}", p.display())))?;
            meme::read_background(BufReader::new(file))
        }
        None => Ok(UNIFORM_BACKGROUND),
    }
}

fn build_matrices(motif_file: &Path, background: &Background) -> Result<Vec<ScoreMatrix>, RunError> {
    let file = File::open(motif_file)
        .map_err(|e| RunError::io(format!("{}: {e}", motif_file.display())))?;
    let (_bg, motifs) = meme::parse_meme(BufReader::new(file))?;
    let mut matrices = Vec::new();
    for motif in &motifs {
        matrices.extend(build_score_matrices(
            motif,
            background,
            DEFAULT_PSEUDO_SITES,
            true,
        )?);
    }
    Ok(matrices)
}

fn extension_lower(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let background = load_background(cli.background.as_deref())?;
    let matrices = build_matrices(&cli.motif_file, &background)?;
    info!("built {} score matrices", matrices.len());

    let ext = extension_lower(&cli.sequence_file);
    let is_bam = ext == "bam";

    if cli.region.is_some() && !is_bam {
        return Err(anyhow!("--region is only valid with BAM input"));
    }
    if cli.unmapped_only && !is_bam {
        return Err(anyhow!("--unmapped-only is only valid with BAM input"));
    }

    match ext.as_str() {
        "bam" => {
            let regions = match &cli.region {
                Some(bed_path) => {
                    let file = File::open(bed_path)
                        .map_err(|e| RunError::io(format!("{}: {e}", bed_path.display())))?;
                    Some(parse_bed(BufReader::new(file))?)
                }
                None => None,
            };
            let config = BamDriverConfig {
                unmapped_only: cli.unmapped_only,
                verbose: cli.verbose,
                regions: regions.as_deref(),
                suppress_progress: false,
            };
            let stdout = io::stdout();
            let mut stdout = stdout.lock();
            let counters = run_bam(
                &matrices,
                &cli.sequence_file,
                cli.output.as_deref(),
                &config,
                &mut stdout,
            )?;
            write_summary(&counters, cli.unmapped_only, &mut stdout)
                .map_err(|e| RunError::io(e.to_string()))?;
        }
        "fasta" => {
            match &cli.output {
                Some(out_path) => {
                    let file = File::create(out_path)
                        .map_err(|e| RunError::io(format!("{}: {e}", out_path.display())))?;
                    let mut sink = TabularSink::new(BufWriter::new(file));
                    run_fasta(&matrices, &cli.sequence_file, &mut sink)?;
                }
                None => {
                    let stdout = io::stdout();
                    let mut sink = TabularSink::new(stdout.lock());
                    run_fasta(&matrices, &cli.sequence_file, &mut sink)?;
                }
            }
        }
        other => {
            return Err(anyhow!(
                "unrecognized sequence file extension {other:?}; expected .bam or .fasta"
            ));
        }
    }

    Ok(())
}

/// clap's own `Error::exit()` exits 0 on `--help`/`--version`; spec §6
/// requires exit 1 for `-h/--help`, so we intercept those error kinds
/// before letting clap print and exit on its own terms.
fn parse_cli() -> Result<Cli, ExitCode> {
    match Cli::try_parse() {
        Ok(cli) => Ok(cli),
        Err(e) => {
            print!("{e}");
            Err(ExitCode::FAILURE)
        }
    }
}

fn main() -> ExitCode {
    let cli = match parse_cli() {
        Ok(cli) => cli,
        Err(code) => return code,
    };

    let _handle = init_logging(cli.log_filepath.as_deref(), cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            let _ = writeln!(io::stderr(), "error: {e}");
            ExitCode::FAILURE
        }
    }
}
