//! Recording storage - append-only JSON array logs
//!
//! A log is written in three phases: `[` on create, comma-joined event lines
//! on every flush, and `]` on finish. Everything flushed before a crash stays
//! on disk; only the closing bracket is missing.

use crate::codec::{self, LOG_CLOSE, LOG_OPEN, LOG_SEPARATOR};
use crate::events::{InputEvent, RecordingMode};
use chrono::{DateTime, Local};
use inputsim_core::{Error, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Incremental writer for one recording file
#[derive(Debug)]
pub struct EventLogWriter {
    path: PathBuf,
    file: File,
    wrote_any: bool,
    events_written: usize,
    finished: bool,
}

impl EventLogWriter {
    /// Create (or truncate) `path` and write the array opening.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut file = File::create(&path)?;
        file.write_all(LOG_OPEN.as_bytes())?;
        file.flush()?;
        let file = OpenOptions::new().append(true).open(&path)?;

        Ok(Self {
            path,
            file,
            wrote_any: false,
            events_written: 0,
            finished: false,
        })
    }

    /// Append events, continuing the comma sequence from earlier calls.
    pub fn append(&mut self, events: &[InputEvent]) -> Result<usize> {
        if self.finished {
            return Err(Error::new(
                inputsim_core::ErrorCode::Io,
                format!("Event log already finalized: {}", self.path.display()),
            ));
        }
        if events.is_empty() {
            return Ok(0);
        }

        let mut w = BufWriter::new(&self.file);
        for event in events {
            let line = codec::encode(event)?;
            if self.wrote_any {
                w.write_all(LOG_SEPARATOR.as_bytes())?;
            }
            w.write_all(line.as_bytes())?;
            self.wrote_any = true;
            self.events_written += 1;
        }
        w.flush()?;
        Ok(events.len())
    }

    /// Close the JSON array. Calling it again is a no-op.
    pub fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        (&self.file).write_all(LOG_CLOSE.as_bytes())?;
        (&self.file).flush()?;
        self.finished = true;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn events_written(&self) -> usize {
        self.events_written
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

/// Directory of recordings
pub struct RecordingStorage {
    dir: PathBuf,
}

impl RecordingStorage {
    pub fn with_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Full path for a recording name; `.json` is appended when missing.
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(file_name(name))
    }

    /// Path for a new recording, generating a timestamped name when `name` is empty.
    pub fn new_recording_path(&self, name: Option<&str>, mode: RecordingMode) -> PathBuf {
        match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(n) => self.path(n),
            None => self.path(&default_recording_name(mode, Local::now())),
        }
    }

    /// Load and decode a recording
    pub fn load(&self, name: &str) -> Result<Vec<InputEvent>> {
        load_file(self.path(name))
    }

    /// List recording file names, optionally filtered by a case-insensitive substring
    pub fn list(&self, filter: Option<&str>) -> Result<Vec<String>> {
        let needle = filter
            .map(|f| f.trim().to_lowercase())
            .filter(|f| !f.is_empty());

        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            if let Some(s) = name.to_str() {
                if !s.ends_with(".json") {
                    continue;
                }
                if let Some(needle) = &needle {
                    if !s.to_lowercase().contains(needle.as_str()) {
                        continue;
                    }
                }
                files.push(s.to_string());
            }
        }
        files.sort();
        Ok(files)
    }

    pub fn delete(&self, name: &str) -> Result<()> {
        let path = self.path(name);
        if !path.exists() {
            return Err(Error::file_not_found(&path));
        }
        fs::remove_file(path)?;
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Read and decode a finished log file
pub fn load_file(path: impl AsRef<Path>) -> Result<Vec<InputEvent>> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(Error::file_not_found(path));
    }
    let text = fs::read_to_string(path)?;
    codec::decode_all(&text)
}

/// `Cont-input_recording_2024-05-01_13-45-10` / `Disc-...`
pub fn default_recording_name(mode: RecordingMode, now: DateTime<Local>) -> String {
    let prefix = match mode {
        RecordingMode::Continuous => "Cont-",
        RecordingMode::Frame => "Disc-",
    };
    format!("{}input_recording_{}", prefix, now.format("%Y-%m-%d_%H-%M-%S"))
}

fn file_name(name: &str) -> String {
    if name.ends_with(".json") {
        name.to_string()
    } else {
        format!("{}.json", name)
    }
}
