//! Search settings, loadable from TOML.
//!
//! ```
//! use hyprop::config::SolverConfig;
//!
//! let config = SolverConfig::from_toml_str("time_budget_ms = 500").unwrap();
//! assert_eq!(config.time_budget_ms, 500);
//! assert_eq!(config.max_formula_size, 20);
//! ```
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ProverError, ProverResult};

pub const DEFAULT_TIME_BUDGET_MS: u64 = 60_000;
pub const DEFAULT_MAX_FORMULA_SIZE: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Wall-clock budget of the search. `0` selects the default.
    pub time_budget_ms: u64,
    /// Candidates and derivations with more nodes are discarded.
    pub max_formula_size: usize,
    /// Where the derivation log is written. `None` uses a temporary file removed on close.
    pub log_path: Option<PathBuf>,
    /// Seed the contraposition lemma next to the axioms.
    pub seed_contraposition: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_budget_ms: DEFAULT_TIME_BUDGET_MS,
            max_formula_size: DEFAULT_MAX_FORMULA_SIZE,
            log_path: None,
            seed_contraposition: true,
        }
    }
}

impl SolverConfig {
    pub fn with_time_budget(mut self, time_budget_ms: u64) -> Self {
        self.time_budget_ms = time_budget_ms;
        self
    }

    pub fn with_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    /// Budget with `0` mapped to the default.
    pub fn effective_time_budget_ms(&self) -> u64 {
        match self.time_budget_ms {
            0 => DEFAULT_TIME_BUDGET_MS,
            budget => budget,
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Load a configuration file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> ProverResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ProverError::ConfigIo {
            file: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text).map_err(|source| ProverError::ConfigParse {
            file: path.to_path_buf(),
            source,
        })
    }
}
