use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum GrabberError {
    #[error("invalid accession: {0}")]
    InvalidAccession(String),

    #[error("unsupported return type: {0} (only fasta is supported)")]
    UnsupportedReturnType(String),

    #[error("a search must complete before a fetch: {0}")]
    MissingSession(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("E-utilities request failed: {0}")]
    EutilsHttp(String),

    #[error("E-utilities returned status {status}: {message}")]
    EutilsStatus { status: u16, message: String },

    #[error("malformed E-utilities response: {0}")]
    ResponseParse(String),

    #[error("record not found: {0}")]
    RecordNotFound(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
