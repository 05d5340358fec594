use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use signal_core::Decision;

/// Append-only JSON-lines journal of decisions. One serialized
/// `Decision` per line, in chronological order.
pub struct DecisionJournal {
    path: PathBuf,
}

impl DecisionJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Append one decision as a single JSON line.
    pub fn append(&self, decision: &Decision) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("creating journal directory {}", parent.display())
                })?;
            }
        }

        let line = serde_json::to_string(decision).context("serializing decision")?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("opening journal {}", self.path.display()))?;
        writeln!(file, "{line}")
            .with_context(|| format!("appending to journal {}", self.path.display()))?;
        Ok(())
    }

    /// The most recent `limit` decisions, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<Decision>> {
        let mut decisions = self.read_all()?;
        decisions.reverse();
        decisions.truncate(limit);
        Ok(decisions)
    }

    /// Decisions for one symbol, newest first.
    pub fn for_symbol(&self, symbol: &str, limit: usize) -> Result<Vec<Decision>> {
        let mut decisions = self.read_all()?;
        decisions.retain(|d| d.symbol == symbol);
        decisions.reverse();
        decisions.truncate(limit);
        Ok(decisions)
    }

    /// All journal entries in file order. Unparseable lines are
    /// skipped with a warning so one corrupt write cannot poison the
    /// whole journal.
    fn read_all(&self) -> Result<Vec<Decision>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)
            .with_context(|| format!("opening journal {}", self.path.display()))?;
        let mut decisions = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.context("reading journal line")?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Decision>(&line) {
                Ok(decision) => decisions.push(decision),
                Err(e) => tracing::warn!("Skipping malformed journal line: {}", e),
            }
        }
        Ok(decisions)
    }
}
