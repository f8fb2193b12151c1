use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum LineageError {
    #[error("required tool not found: {0}")]
    #[diagnostic(help(
        "NCBI Entrez Direct (EDirect) tools are required: https://www.ncbi.nlm.nih.gov/books/NBK179288/"
    ))]
    MissingTool(String),

    #[error("failed to read accession list at {path}: {message}")]
    InputRead { path: PathBuf, message: String },

    #[error("failed to read accession list: {0}")]
    InputStream(String),

    #[error("failed to write lineage table: {0}")]
    OutputWrite(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("invalid config value: {0}")]
    InvalidConfig(String),

    #[error("unknown taxonomic rank: {0}")]
    UnknownRank(String),
}
