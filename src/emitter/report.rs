use crate::emitter::WrittenOutput;
use crate::error::PackScribeError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Parse,
    Read,
    NoModName,
    Collision,
    Io,
}

impl SkipReason {
    pub fn from_error(error: &PackScribeError) -> Self {
        match error {
            PackScribeError::Parse { .. } => SkipReason::Parse,
            PackScribeError::Read { .. } => SkipReason::Read,
            PackScribeError::ClassificationMiss { .. } => SkipReason::NoModName,
            PackScribeError::OutputExists { .. } => SkipReason::Collision,
            _ => SkipReason::Io,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: SkipReason,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveRecord {
    pub from: PathBuf,
    pub to: PathBuf,
    pub mod_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub title: String,
}

/// Outcome of one command invocation.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub command: String,
    pub root: PathBuf,
    pub dry_run: bool,
    pub files_scanned: usize,
    pub records: usize,
    pub outputs: Vec<WrittenOutput>,
    pub moves: Vec<MoveRecord>,
    pub generated: Vec<GeneratedFile>,
    pub skipped: Vec<SkippedFile>,
    pub warnings: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
    #[serde(skip)]
    start_time: Option<Instant>,
}

impl RunReport {
    pub fn new<S: Into<String>>(command: S, root: &Path, dry_run: bool) -> Self {
        Self {
            command: command.into(),
            root: root.to_path_buf(),
            dry_run,
            files_scanned: 0,
            records: 0,
            outputs: Vec::new(),
            moves: Vec::new(),
            generated: Vec::new(),
            skipped: Vec::new(),
            warnings: Vec::new(),
            started_at: Utc::now(),
            duration: Duration::ZERO,
            start_time: Some(Instant::now()),
        }
    }

    pub fn skip(&mut self, path: &Path, error: &PackScribeError) {
        self.skipped.push(SkippedFile {
            path: path.to_path_buf(),
            reason: SkipReason::from_error(error),
            message: error.to_string(),
        });
    }

    pub fn warn<S: Into<String>>(&mut self, message: S) {
        self.warnings.push(message.into());
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time
            .map(|start| start.elapsed())
            .unwrap_or(self.duration)
    }

    pub fn finish(mut self) -> Self {
        self.duration = self.elapsed();
        self.start_time = None;
        self
    }

    /// True when some input was skipped or the walk hit unreadable entries.
    pub fn has_issues(&self) -> bool {
        !self.skipped.is_empty() || !self.warnings.is_empty()
    }

    /// True when a file was left in place because its target already existed.
    pub fn has_collisions(&self) -> bool {
        self.skipped
            .iter()
            .any(|skipped| skipped.reason == SkipReason::Collision)
    }
}
