//! JSON Lines recorder with file rotation.
//!
//! Each record is one serialized [`DiagnosticsReport`] per line. A new file is
//! started after `max_records_per_file` records, and only the newest
//! `max_files_to_keep` files written by this recorder are kept on disk.

use chrono::Utc;
use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::DiagnosticsReport;
use crate::error::Result;

/// Rotating JSONL writer for diagnostics reports.
#[derive(Debug)]
pub struct JsonlRecorder {
    dir: PathBuf,
    max_records_per_file: usize,
    max_files_to_keep: usize,
    writer: Option<BufWriter<File>>,
    records_in_file: usize,
    files: VecDeque<PathBuf>,
    file_seq: u64,
}

impl JsonlRecorder {
    /// Creates a recorder writing into `dir`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created.
    pub fn new<P: AsRef<Path>>(
        dir: P,
        max_records_per_file: usize,
        max_files_to_keep: usize,
    ) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        info!("Recording diagnostics to {}", dir.display());

        Ok(Self {
            dir,
            max_records_per_file: max_records_per_file.max(1),
            max_files_to_keep: max_files_to_keep.max(1),
            writer: None,
            records_in_file: 0,
            files: VecDeque::new(),
            file_seq: 0,
        })
    }

    /// Appends one report, rotating files as needed.
    ///
    /// # Errors
    ///
    /// Returns error if serialization or any file operation fails.
    pub fn record(&mut self, report: &DiagnosticsReport) -> Result<()> {
        if self.writer.is_none() || self.records_in_file >= self.max_records_per_file {
            self.rotate()?;
        }

        let line = serde_json::to_string(report)?;
        if let Some(writer) = self.writer.as_mut() {
            writer.write_all(line.as_bytes())?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        self.records_in_file += 1;
        Ok(())
    }

    /// Files currently retained, oldest first.
    #[must_use]
    pub fn files(&self) -> Vec<PathBuf> {
        self.files.iter().cloned().collect()
    }

    fn rotate(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }

        let name = format!(
            "diagnostics_{}_{:04}.jsonl",
            Utc::now().format("%Y%m%d_%H%M%S"),
            self.file_seq
        );
        self.file_seq += 1;
        let path = self.dir.join(name);

        let file = File::create(&path)?;
        debug!("Opened diagnostics file {}", path.display());
        self.writer = Some(BufWriter::new(file));
        self.records_in_file = 0;
        self.files.push_back(path);

        while self.files.len() > self.max_files_to_keep {
            if let Some(oldest) = self.files.pop_front() {
                if let Err(e) = fs::remove_file(&oldest) {
                    warn!("Failed to remove old diagnostics file {}: {}", oldest.display(), e);
                }
            }
        }
        Ok(())
    }
}
