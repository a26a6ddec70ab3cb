use crate::config::WritePolicy;
use crate::error::{PackScribeError, Result};
use serde::Serialize;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrittenOutput {
    pub path: PathBuf,
    pub lines: usize,
    pub bytes: u64,
}

/// Writes one record per line, `\n`-terminated.
pub struct LineWriter {
    policy: WritePolicy,
    dry_run: bool,
    buffer_size: usize,
}

impl LineWriter {
    pub fn new(policy: WritePolicy) -> Self {
        Self {
            policy,
            dry_run: false,
            buffer_size: 64 * 1024,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Applies the write policy to `path` without writing anything.
    ///
    /// Commands with several outputs resolve all of them first, so a `fail`
    /// collision on any output leaves every other output untouched.
    pub fn resolve(&self, path: &Path) -> Result<PathBuf> {
        resolve_target(path, self.policy)
    }

    /// Writes `lines` to `path` (or the path the policy picks instead).
    ///
    /// In dry-run mode nothing touches the disk, but the target is still
    /// resolved so a `fail` policy reports the same error it would for real.
    pub fn write<I, S>(&self, path: &Path, lines: I) -> Result<WrittenOutput>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let target = self.resolve(path)?;
        self.write_resolved(target, lines)
    }

    /// Writes to a target already returned by [`LineWriter::resolve`].
    pub fn write_resolved<I, S>(&self, target: PathBuf, lines: I) -> Result<WrittenOutput>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if self.dry_run {
            let (count, bytes) = lines.into_iter().fold((0usize, 0u64), |(n, b), line| {
                (n + 1, b + single_line(line.as_ref()).len() as u64 + 1)
            });
            return Ok(WrittenOutput {
                path: target,
                lines: count,
                bytes,
            });
        }

        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = fs::File::create(&target)?;
        let mut writer = BufWriter::with_capacity(self.buffer_size, file);
        let mut count = 0usize;
        let mut bytes = 0u64;

        for line in lines {
            let line = single_line(line.as_ref());
            writer.write_all(line.as_bytes())?;
            writer.write_all(b"\n")?;
            count += 1;
            bytes += line.len() as u64 + 1;
        }

        writer.flush()?;
        tracing::info!(path = %target.display(), lines = count, "wrote output");

        Ok(WrittenOutput {
            path: target,
            lines: count,
            bytes,
        })
    }
}

/// Keeps a record on one line by escaping embedded line breaks.
fn single_line(record: &str) -> std::borrow::Cow<'_, str> {
    if record.contains(['\n', '\r']) {
        record.replace('\r', "\\r").replace('\n', "\\n").into()
    } else {
        record.into()
    }
}

/// Applies a write policy to a destination path.
pub fn resolve_target(path: &Path, policy: WritePolicy) -> Result<PathBuf> {
    if !path.exists() {
        return Ok(path.to_path_buf());
    }

    match policy {
        WritePolicy::Overwrite => Ok(path.to_path_buf()),
        WritePolicy::Fail => Err(PackScribeError::OutputExists {
            path: path.display().to_string(),
        }),
        WritePolicy::Version => versioned_path(path),
    }
}

/// First free `stem-N.ext` beside `path`.
fn versioned_path(path: &Path) -> Result<PathBuf> {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .ok_or_else(|| PackScribeError::InvalidPath {
            path: path.display().to_string(),
        })?;
    let extension = path.extension().map(|e| e.to_string_lossy().to_string());

    for n in 1..=9999u32 {
        let name = match extension {
            Some(ref ext) => format!("{}-{}.{}", stem, n, ext),
            None => format!("{}-{}", stem, n),
        };
        let candidate = path.with_file_name(name);
        if !candidate.exists() {
            return Ok(candidate);
        }
    }

    Err(PackScribeError::OutputExists {
        path: path.display().to_string(),
    })
}
