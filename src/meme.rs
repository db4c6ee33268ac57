//! Parser for the MEME "minimal" motif format: background frequencies,
//! motif headers, and letter-probability matrix rows. See spec §4.1.

use std::io::BufRead;

use itertools::Itertools;

use crate::alphabet::ALPHABET_SIZE;
use crate::errors::RunError;

/// Background letter frequencies, ordered A, C, G, T.
pub type Background = [f64; ALPHABET_SIZE];

pub const UNIFORM_BACKGROUND: Background = [0.25, 0.25, 0.25, 0.25];

/// One parsed `MOTIF` block: its name, its training-site count, and its
/// raw (unscaled) per-column frequency/count rows.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMotif {
    pub name: String,
    pub nsites: f64,
    pub rows: Vec<[f64; ALPHABET_SIZE]>,
}

impl RawMotif {
    pub fn width(&self) -> usize {
        self.rows.len()
    }
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn parse_background_pairs(line: &str) -> Result<Background, RunError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != 8 {
        return Err(RunError::format(format!(
            "expected 4 letter/frequency pairs, got: {line:?}"
        )));
    }
    let mut background = [0.0_f64; ALPHABET_SIZE];
    for (letter_tok, value_tok) in tokens.into_iter().tuples() {
        let letter = letter_tok.to_ascii_uppercase();
        let value: f64 = value_tok.parse().map_err(|_| {
            RunError::format(format!("bad background value in {line:?}"))
        })?;
        let idx = match letter.as_str() {
            "A" => 0,
            "C" => 1,
            "G" => 2,
            "T" => 3,
            other => {
                return Err(RunError::format(format!(
                    "unknown background letter {other:?}"
                )))
            }
        };
        background[idx] = value;
    }
    validate_background(&background)?;
    Ok(background)
}

fn validate_background(background: &Background) -> Result<(), RunError> {
    if background.iter().any(|&v| v <= 0.0) {
        return Err(RunError::format(
            "background frequencies must all be > 0",
        ));
    }
    let sum: f64 = background.iter().sum();
    if (sum - 1.0).abs() > 1e-3 {
        return Err(RunError::format(format!(
            "background frequencies must sum to 1.0, got {sum}"
        )));
    }
    Ok(())
}

/// Parses a key=value directive line such as
/// `letter-probability matrix: alength= 4 w= 8 nsites= 20 E= 0`.
fn parse_matrix_header(
    line: &str,
) -> Result<(usize, usize, f64), RunError> {
    let mut alength = None;
    let mut w = None;
    let mut nsites = 1.0_f64;

    let after_colon = line.splitn(2, ':').nth(1).unwrap_or("");
    let tokens: Vec<&str> = after_colon.split_whitespace().collect();
    let mut i = 0;
    while i < tokens.len() {
        let key = tokens[i].trim_end_matches('=');
        let value = if tokens[i].ends_with('=') {
            i += 1;
            tokens.get(i).copied().unwrap_or("")
        } else if let Some((_, v)) = tokens[i].split_once('=') {
            v
        } else {
            i += 1;
            continue;
        };
        match key {
            "alength" => {
                alength = value.parse::<usize>().ok();
            }
            "w" => {
                w = value.parse::<usize>().ok();
            }
            "nsites" => {
                nsites = value.parse::<f64>().unwrap_or(1.0);
            }
            _ => {}
        }
        i += 1;
    }

    let alength = alength
        .ok_or_else(|| RunError::format("missing alength= in matrix header"))?;
    if alength != ALPHABET_SIZE {
        return Err(RunError::unsupported_alphabet(format!(
            "alength={alength}, only alength=4 (ACGT) is supported"
        )));
    }
    let w = w.ok_or_else(|| RunError::format("missing w= in matrix header"))?;
    Ok((alength, w, nsites))
}

fn parse_row(line: &str) -> Result<[f64; ALPHABET_SIZE], RunError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != ALPHABET_SIZE {
        return Err(RunError::format(format!(
            "expected {ALPHABET_SIZE} values per row, got: {line:?}"
        )));
    }
    let mut row = [0.0_f64; ALPHABET_SIZE];
    for (i, tok) in tokens.iter().enumerate() {
        row[i] = tok.parse().map_err(|_| {
            RunError::format(format!("bad matrix value in {line:?}"))
        })?;
        if row[i] < 0.0 {
            return Err(RunError::format(format!(
                "negative matrix value in {line:?}"
            )));
        }
    }
    Ok(row)
}

/// Parses a full MEME minimal-format stream: an optional background
/// section and zero or more `MOTIF` blocks.
pub fn parse_meme<R: BufRead>(
    reader: R,
) -> Result<(Option<Background>, Vec<RawMotif>), RunError> {
    let mut background = None;
    let mut motifs = Vec::new();

    let mut lines = reader.lines().peekable();
    let mut pending_name: Option<String> = None;

    while let Some(line) = lines.next() {
        let line = line.map_err(|e| RunError::io(e.to_string()))?;

        if line.contains("Background letter frequencies") {
            while let Some(Ok(next)) = lines.peek() {
                if is_blank(next) {
                    lines.next();
                } else {
                    break;
                }
            }
            let bg_line = lines
                .next()
                .ok_or_else(|| {
                    RunError::format("missing background frequencies line")
                })?
                .map_err(|e| RunError::io(e.to_string()))?;
            background = Some(parse_background_pairs(&bg_line)?);
            continue;
        }

        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix("MOTIF") {
            let name = rest
                .split_whitespace()
                .next()
                .ok_or_else(|| RunError::format("MOTIF line missing a name"))?
                .to_owned();
            pending_name = Some(name);
            continue;
        }

        if trimmed.contains("letter-probability matrix:") {
            let (_alength, w, nsites) = parse_matrix_header(trimmed)?;
            let name = pending_name.take().ok_or_else(|| {
                RunError::format("letter-probability matrix with no preceding MOTIF")
            })?;
            let mut rows = Vec::with_capacity(w);
            while rows.len() < w {
                let row_line = lines
                    .next()
                    .ok_or_else(|| {
                        RunError::format(format!(
                            "motif {name} truncated: expected {w} rows, got {}",
                            rows.len()
                        ))
                    })?
                    .map_err(|e| RunError::io(e.to_string()))?;
                if is_blank(&row_line) {
                    continue;
                }
                rows.push(parse_row(&row_line)?);
            }
            motifs.push(RawMotif { name, nsites, rows });
            continue;
        }

        // MEME version header, URL, comments: ignored.
    }

    Ok((background, motifs))
}

/// Parses a background-only file (same grammar, no motifs expected).
pub fn read_background<R: BufRead>(reader: R) -> Result<Background, RunError> {
    let (background, _motifs) = parse_meme(reader)?;
    background
        .ok_or_else(|| RunError::format("no background frequencies section found"))
}
