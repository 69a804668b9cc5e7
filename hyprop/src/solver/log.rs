//! Flat-file derivation log.
//!
//! Every formula the search accepts is appended as one line, so a proof can be replayed
//! backwards once a target is reached without keeping parents in memory.
//!
//! # File Format
//!
//! ```text
//! <formula> axiom
//! <formula> mp <minor> <major>
//! ```
//!
//! Fields are separated by whitespace; rendered formulas never contain any. A formula may be
//! recorded more than once; readers keep the first record.
use std::collections::HashMap;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use log::warn;

use crate::expr::Expression;

/// Combined with the process id to keep temporary log names unique.
static LOG_FILE_COUNTER: AtomicU64 = AtomicU64::new(0);

const AXIOM: &str = "axiom";
const MODUS_PONENS: &str = "mp";

/// How a formula entered the search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    Axiom,
    ModusPonens { minor: String, major: String },
}

/// One record of the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Derivation {
    pub formula: String,
    pub rule: Rule,
}

impl Derivation {
    /// Premises of the rule, in record order.
    pub fn parents(&self) -> impl Iterator<Item = &str> {
        let parents = match &self.rule {
            Rule::Axiom => None,
            Rule::ModusPonens { minor, major } => Some([minor.as_str(), major.as_str()]),
        };
        parents.into_iter().flatten()
    }

    pub fn is_axiom(&self) -> bool {
        matches!(self.rule, Rule::Axiom)
    }

    /// Parse one line; `None` for anything malformed.
    pub fn parse_line(line: &str) -> Option<Self> {
        let mut fields = line.split_whitespace();
        let formula = fields.next()?.to_owned();
        let rule = match fields.next()? {
            AXIOM => Rule::Axiom,
            MODUS_PONENS => Rule::ModusPonens {
                minor: fields.next()?.to_owned(),
                major: fields.next()?.to_owned(),
            },
            _ => return None,
        };
        match fields.next() {
            Some(_) => None,
            None => Some(Self { formula, rule }),
        }
    }
}

impl fmt::Display for Derivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.rule {
            Rule::Axiom => write!(f, "{} {AXIOM}", self.formula),
            Rule::ModusPonens { minor, major } => {
                write!(f, "{} {MODUS_PONENS} {minor} {major}", self.formula)
            }
        }
    }
}

/// Append-only derivation log backed by a file.
///
/// This type is **not** thread-safe; each solver owns its own log.
pub struct DerivationLog {
    path: PathBuf,
    /// `None` once closed.
    writer: Option<BufWriter<File>>,
    /// Temporary logs are deleted on close.
    temporary: bool,
    records: u64,
}

impl DerivationLog {
    /// Create a log at `path`, truncating any previous content.
    pub fn create<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;

        Ok(DerivationLog {
            path,
            writer: Some(BufWriter::new(file)),
            temporary: false,
            records: 0,
        })
    }

    /// Create a log with a unique name in the system temp directory, removed on close.
    pub fn create_temp() -> io::Result<Self> {
        let counter = LOG_FILE_COUNTER.fetch_add(1, Ordering::Relaxed);
        let filename = format!("hyprop_derivations_{}_{}.log", std::process::id(), counter);
        let mut log = Self::create(std::env::temp_dir().join(filename))?;
        log.temporary = true;
        Ok(log)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_temporary(&self) -> bool {
        self.temporary
    }

    /// Number of records written so far.
    pub fn record_count(&self) -> u64 {
        self.records
    }

    pub fn record_axiom(&mut self, formula: &Expression) -> io::Result<()> {
        self.write(&Derivation {
            formula: formula.string().to_owned(),
            rule: Rule::Axiom,
        })
    }

    /// Record `result` as derived by modus ponens from `minor` and `major` (`minor>result`).
    pub fn record_modus_ponens(
        &mut self,
        result: &Expression,
        minor: &Expression,
        major: &Expression,
    ) -> io::Result<()> {
        self.write(&Derivation {
            formula: result.string().to_owned(),
            rule: Rule::ModusPonens {
                minor: minor.string().to_owned(),
                major: major.string().to_owned(),
            },
        })
    }

    fn write(&mut self, derivation: &Derivation) -> io::Result<()> {
        let writer = self.writer.as_mut().ok_or_else(closed)?;
        writeln!(writer, "{derivation}")?;
        self.records += 1;
        Ok(())
    }

    /// Flush any buffered records to disk.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.as_mut().ok_or_else(closed)?.flush()
    }

    /// Read every record back, keyed by formula. The first record of a formula wins.
    ///
    /// Malformed lines are skipped with a warning.
    pub fn load(&mut self) -> io::Result<HashMap<String, Derivation>> {
        self.flush()?;

        let reader = BufReader::new(File::open(&self.path)?);
        let mut derivations = HashMap::new();
        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match Derivation::parse_line(&line) {
                Some(derivation) => {
                    derivations
                        .entry(derivation.formula.clone())
                        .or_insert(derivation);
                }
                None => warn!(
                    "{}:{}: skipping malformed derivation record '{line}'",
                    self.path.display(),
                    number + 1
                ),
            }
        }
        Ok(derivations)
    }

    /// Flush and release the file. Temporary logs are deleted.
    pub fn close(mut self) -> io::Result<()> {
        self.release()
    }

    fn release(&mut self) -> io::Result<()> {
        let Some(mut writer) = self.writer.take() else {
            return Ok(());
        };
        let flushed = writer.flush();
        drop(writer);
        if self.temporary {
            std::fs::remove_file(&self.path)?;
        }
        flushed
    }
}

impl Drop for DerivationLog {
    fn drop(&mut self) {
        // Best-effort release when `close` was not called.
        let _ = self.release();
    }
}

fn closed() -> io::Error {
    io::Error::other("derivation log is closed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use tempfile::tempdir;

    #[test]
    fn records_round_trip_through_the_file() {
        let dir = tempdir().unwrap();
        let mut log = DerivationLog::create(dir.path().join("derivations.log")).unwrap();
        let a = parse("a").unwrap();
        let ab = parse("a>b").unwrap();
        let b = parse("b").unwrap();

        log.record_axiom(&a).unwrap();
        log.record_axiom(&ab).unwrap();
        log.record_modus_ponens(&b, &a, &ab).unwrap();
        assert_eq!(log.record_count(), 3);

        let derivations = log.load().unwrap();
        assert_eq!(derivations.len(), 3);
        assert!(derivations["a"].is_axiom());
        assert_eq!(
            derivations["b"].rule,
            Rule::ModusPonens {
                minor: "a".into(),
                major: "a>b".into()
            }
        );
        assert_eq!(derivations["b"].parents().collect::<Vec<_>>(), ["a", "a>b"]);

        let text = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(text, "a axiom\na>b axiom\nb mp a a>b\n");
        log.close().unwrap();
    }

    #[test]
    fn first_record_wins() {
        let dir = tempdir().unwrap();
        let mut log = DerivationLog::create(dir.path().join("derivations.log")).unwrap();
        let a = parse("a").unwrap();
        let ab = parse("a>b").unwrap();
        log.record_axiom(&ab).unwrap();
        log.record_modus_ponens(&ab, &a, &ab).unwrap();
        assert!(log.load().unwrap()["a>b"].is_axiom());
    }

    #[test]
    fn malformed_lines_are_skipped() {
        assert_eq!(Derivation::parse_line("a"), None);
        assert_eq!(Derivation::parse_line("a mp b"), None);
        assert_eq!(Derivation::parse_line("a axiom extra"), None);
        assert_eq!(Derivation::parse_line("a guess"), None);

        let dir = tempdir().unwrap();
        let path = dir.path().join("derivations.log");
        let mut log = DerivationLog::create(&path).unwrap();
        log.record_axiom(&parse("a").unwrap()).unwrap();
        log.flush().unwrap();
        std::fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .unwrap()
            .write_all(b"broken\n\nb axiom\n")
            .unwrap();

        let derivations = log.load().unwrap();
        assert_eq!(derivations.len(), 2);
        assert!(derivations.contains_key("b"));
    }

    #[test]
    fn temporary_logs_are_removed() {
        let log = DerivationLog::create_temp().unwrap();
        let path = log.path().to_path_buf();
        assert!(log.is_temporary());
        assert!(path.exists());
        log.close().unwrap();
        assert!(!path.exists());

        let dropped = DerivationLog::create_temp().unwrap();
        let path = dropped.path().to_path_buf();
        drop(dropped);
        assert!(!path.exists());
    }

    #[test]
    fn temporary_names_are_unique() {
        let first = DerivationLog::create_temp().unwrap();
        let second = DerivationLog::create_temp().unwrap();
        assert_ne!(first.path(), second.path());
    }
}
