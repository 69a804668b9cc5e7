use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProverError {
    #[error("not enough axioms: found {found}, at least {required} are required")]
    NotEnoughAxioms { found: usize, required: usize },

    #[error("derivation log '{}' is unavailable: {source}", path.display())]
    LogUnavailable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("I/O error on the derivation log: {0}")]
    LogIo(#[from] std::io::Error),

    #[error("derivation of '{formula}' is missing from the log")]
    MissingDerivation { formula: String },

    #[error("failed to read configuration file '{}': {source}", file.display())]
    ConfigIo {
        file: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse configuration file '{}': {source}", file.display())]
    ConfigParse {
        file: PathBuf,
        source: toml::de::Error,
    },
}

pub type ProverResult<T> = Result<T, ProverError>;
