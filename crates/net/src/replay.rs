//! Request logs for replaying inventory sessions.
//!
//! Every accepted client request is written as one JSON line. Feeding the
//! entries back into a fresh server, tick by tick, reproduces the same
//! inventory state.

use crate::protocol::PlayerId;
use anyhow::{Context, Result};
use gridstash_inventory::InventoryRequest;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// One logged request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestLogEntry {
    /// Host tick at which the request was applied.
    pub tick: u64,
    /// Requesting player.
    pub player_id: PlayerId,
    /// The request itself.
    pub request: InventoryRequest,
}

/// Request logger that writes JSONL.
pub struct RequestLogger {
    writer: BufWriter<File>,
    entries_written: u64,
}

impl RequestLogger {
    /// Create a new request log at `path`, truncating any existing file.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path.as_ref())
            .with_context(|| format!("Failed to create request log: {:?}", path.as_ref()))?;
        Ok(Self {
            writer: BufWriter::new(file),
            entries_written: 0,
        })
    }

    /// Append one request.
    pub fn log(
        &mut self,
        tick: u64,
        player_id: PlayerId,
        request: &InventoryRequest,
    ) -> Result<()> {
        let entry = RequestLogEntry {
            tick,
            player_id,
            request: request.clone(),
        };
        serde_json::to_writer(&mut self.writer, &entry)?;
        writeln!(&mut self.writer)?;
        self.entries_written += 1;
        Ok(())
    }

    /// Flush buffered writes.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Number of entries written.
    pub fn entries_written(&self) -> u64 {
        self.entries_written
    }
}

/// Reads a request log and hands entries back in tick order.
pub struct ReplayPlayer {
    entries: Vec<RequestLogEntry>,
    current_index: usize,
}

impl ReplayPlayer {
    /// Load a replay from a JSONL file. Blank lines are skipped.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())
            .with_context(|| format!("Failed to open replay file: {:?}", path.as_ref()))?;
        let reader = BufReader::new(file);

        let mut entries = Vec::new();
        for (line_num, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read line {}", line_num + 1))?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: RequestLogEntry = serde_json::from_str(&line)
                .with_context(|| format!("Failed to parse line {}: {}", line_num + 1, line))?;
            entries.push(entry);
        }

        Ok(Self {
            entries,
            current_index: 0,
        })
    }

    /// All entries recorded for `tick`, advancing past them.
    ///
    /// Entries from earlier ticks that were never requested are skipped.
    pub fn requests_for_tick(&mut self, tick: u64) -> Vec<RequestLogEntry> {
        let mut requests = Vec::new();

        while let Some(entry) = self.entries.get(self.current_index) {
            if entry.tick > tick {
                break;
            }
            if entry.tick == tick {
                requests.push(entry.clone());
            }
            self.current_index += 1;
        }

        requests
    }

    /// Tick of the last entry, if any.
    pub fn last_tick(&self) -> Option<u64> {
        self.entries.last().map(|entry| entry.tick)
    }

    /// Reset playback to the beginning.
    pub fn reset(&mut self) {
        self.current_index = 0;
    }

    /// Total number of entries.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Whether every entry has been handed out.
    pub fn is_finished(&self) -> bool {
        self.current_index >= self.entries.len()
    }
}
