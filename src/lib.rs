//! motif_liquidator: scans DNA sequences (FASTA records or BAM reads)
//! against MEME-format position weight matrices, reporting hits by
//! their exact p-value.

pub mod alphabet;
pub mod bam;
pub mod errors;
pub mod fasta;
pub mod logging;
pub mod matrix;
pub mod meme;
pub mod pvalue;
pub mod region;
pub mod scanner;
pub mod sink;
pub mod summary;
