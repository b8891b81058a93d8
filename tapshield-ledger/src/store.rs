//! Ledger persistence.
//!
//! The ledger is persisted as an append-only journal of [`JournalEntry`]
//! values. Opening a ledger replays the journal; every mutation appends one
//! entry *before* touching in-memory state, so a failed append leaves the
//! ledger unchanged.

use crate::address::Address;
use crate::errors::LedgerError;
use crate::state::{ClaimRecord, FaucetRegistry};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub type Result<T> = std::result::Result<T, LedgerError>;

/// One durable ledger mutation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JournalEntry {
    FaucetRegistered { registry: FaucetRegistry },
    ClaimRecorded { address: Address, record: ClaimRecord },
}

/// Storage backend for the ledger journal.
pub trait LedgerStore: Send + Sync {
    /// Read every entry in append order.
    fn load(&self) -> Result<Vec<JournalEntry>>;

    /// Durably append one entry. Must not return `Ok` before the entry would
    /// survive a restart.
    fn append(&self, entry: &JournalEntry) -> Result<()>;
}

/// Volatile journal kept in memory.
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    entries: Mutex<Vec<JournalEntry>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn load(&self) -> Result<Vec<JournalEntry>> {
        Ok(self.entries.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn append(&self, entry: &JournalEntry) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(entry.clone());
        Ok(())
    }
}

/// JSON-lines journal on disk (native only).
///
/// Appends take an exclusive `fs2` lock on the journal file and `sync_data`
/// before returning. A torn final line left by an interrupted write is
/// truncated away before the next entry is written. The lock guards against interleaved writes; it does not
/// make two processes share one in-memory ledger, so run a single writer per
/// journal.
#[derive(Debug)]
pub struct FileLedgerStore {
    path: PathBuf,
}

impl FileLedgerStore {
    pub const FILE_NAME: &'static str = "ledger.jsonl";

    /// Open (or prepare) the journal at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(Self { path })
    }

    /// Journal inside `dir` using the default file name.
    pub fn in_dir(dir: &Path) -> Result<Self> {
        Self::new(dir.join(Self::FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cut the file back to its last complete line.
    fn discard_torn_tail(&self, file: &mut File) -> std::io::Result<()> {
        let len = file.metadata()?.len();
        if len == 0 {
            return Ok(());
        }

        let mut last = [0u8; 1];
        file.seek(SeekFrom::Start(len - 1))?;
        file.read_exact(&mut last)?;
        if last[0] == b'\n' {
            return Ok(());
        }

        let mut contents = Vec::new();
        file.seek(SeekFrom::Start(0))?;
        file.read_to_end(&mut contents)?;
        let keep = contents
            .iter()
            .rposition(|&b| b == b'\n')
            .map_or(0, |i| i + 1);

        tracing::warn!(
            "Truncating {} torn bytes from {}",
            contents.len() - keep,
            self.path.display()
        );
        file.set_len(keep as u64)
    }

    fn write_entry(&self, file: &mut File, line: &str) -> std::io::Result<()> {
        self.discard_torn_tail(file)?;
        file.seek(SeekFrom::End(0))?;
        file.write_all(line.as_bytes())?;
        file.sync_data()
    }
}

impl LedgerStore for FileLedgerStore {
    fn load(&self) -> Result<Vec<JournalEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = OpenOptions::new().read(true).open(&self.path)?;
        FileExt::lock_shared(&file)?;

        let lines: Vec<String> = BufReader::new(&file)
            .lines()
            .collect::<std::io::Result<_>>()
            .inspect_err(|_| {
                let _ = FileExt::unlock(&file);
            })?;
        FileExt::unlock(&file)?;

        let last = lines.len().saturating_sub(1);
        let mut entries = Vec::with_capacity(lines.len());
        for (lineno, line) in lines.iter().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<JournalEntry>(line) {
                Ok(entry) => entries.push(entry),
                // A torn final line is a write that was never acknowledged.
                Err(e) if lineno == last => {
                    tracing::warn!(
                        "Ignoring torn journal tail in {}: {}",
                        self.path.display(),
                        e
                    );
                }
                Err(e) => {
                    return Err(LedgerError::Corrupted(format!(
                        "{} line {}: {}",
                        self.path.display(),
                        lineno + 1,
                        e
                    )))
                }
            }
        }

        tracing::debug!(
            "Loaded {} journal entries from {}",
            entries.len(),
            self.path.display()
        );
        Ok(entries)
    }

    fn append(&self, entry: &JournalEntry) -> Result<()> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&self.path)?;

        FileExt::lock_exclusive(&file)?;
        let written = self.write_entry(&mut file, &line);
        FileExt::unlock(&file)?;
        written?;

        Ok(())
    }
}
