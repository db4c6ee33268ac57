//! Error taxonomy for this crate.
//!
//! `InputError` is a single malformed-input message; `RunError` is the
//! taxonomy library driver functions (`run_fasta`, `run_bam`, the MEME
//! parser) return directly. The CLI binary's `run` wraps it in
//! `anyhow::Result` via `?`; `main` is the only place that turns an
//! error into a process exit code.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputError(pub String);

impl InputError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for InputError {}

impl From<String> for InputError {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for InputError {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    UsageError(String),
    IoError(String),
    FormatError(String),
    UnsupportedAlphabet(String),
    InvalidBase(String),
    IndexError(String),
}

impl RunError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self::UsageError(msg.into())
    }
    pub fn io(msg: impl Into<String>) -> Self {
        Self::IoError(msg.into())
    }
    pub fn format(msg: impl Into<String>) -> Self {
        Self::FormatError(msg.into())
    }
    pub fn unsupported_alphabet(msg: impl Into<String>) -> Self {
        Self::UnsupportedAlphabet(msg.into())
    }
    pub fn invalid_base(msg: impl Into<String>) -> Self {
        Self::InvalidBase(msg.into())
    }
    pub fn index(msg: impl Into<String>) -> Self {
        Self::IndexError(msg.into())
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UsageError(m) => write!(f, "usage error: {m}"),
            Self::IoError(m) => write!(f, "I/O error: {m}"),
            Self::FormatError(m) => write!(f, "format error: {m}"),
            Self::UnsupportedAlphabet(m) => {
                write!(f, "unsupported alphabet: {m}")
            }
            Self::InvalidBase(m) => write!(f, "invalid base: {m}"),
            Self::IndexError(m) => write!(f, "index error: {m}"),
        }
    }
}

impl std::error::Error for RunError {}

impl From<InputError> for RunError {
    fn from(e: InputError) -> Self {
        Self::FormatError(e.0)
    }
}

impl From<std::io::Error> for RunError {
    fn from(e: std::io::Error) -> Self {
        Self::IoError(e.to_string())
    }
}

impl From<rust_htslib::errors::Error> for RunError {
    fn from(e: rust_htslib::errors::Error) -> Self {
        Self::IoError(e.to_string())
    }
}
