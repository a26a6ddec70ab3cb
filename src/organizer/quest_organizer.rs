use crate::config::WritePolicy;
use crate::emitter::{resolve_target, MoveRecord};
use crate::error::{PackScribeError, Result};
use crate::extractor::ModClassifier;
use std::fs;
use std::path::{Path, PathBuf};

/// Moves quest files into `<destination>/<mod name>/`.
///
/// This is the only command that changes its inputs: a moved file no longer
/// exists at its original path.
pub struct QuestOrganizer {
    destination: PathBuf,
    collision: WritePolicy,
    classifier: ModClassifier,
    dry_run: bool,
}

impl QuestOrganizer {
    pub fn new<P: Into<PathBuf>>(destination: P, collision: WritePolicy) -> Result<Self> {
        Ok(Self {
            destination: destination.into(),
            collision,
            classifier: ModClassifier::new()?,
            dry_run: false,
        })
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Creates the destination root. Safe to call when it already exists.
    pub fn prepare(&self) -> Result<()> {
        if !self.dry_run {
            fs::create_dir_all(&self.destination)?;
        }
        Ok(())
    }

    /// Classifies `file` and moves it into its mod folder.
    ///
    /// Files with no usable mod name are left in place and reported as
    /// `ClassificationMiss`. Under the `fail` collision policy an existing
    /// file of the same name also leaves the source in place.
    pub fn organize_file(&self, file: &Path) -> Result<MoveRecord> {
        let mod_name = self.classifier.classify_file(file)?;

        let file_name = file.file_name().ok_or_else(|| PackScribeError::InvalidPath {
            path: file.display().to_string(),
        })?;

        let mod_folder = self.destination.join(&mod_name);
        if !self.dry_run {
            fs::create_dir_all(&mod_folder)?;
        }

        let target = resolve_target(&mod_folder.join(file_name), self.collision)?;

        if !self.dry_run {
            move_file(file, &target)?;
        }

        tracing::info!(
            from = %file.display(),
            to = %target.display(),
            mod_name = %mod_name,
            dry_run = self.dry_run,
            "moved quest file"
        );

        Ok(MoveRecord {
            from: file.to_path_buf(),
            to: target,
            mod_name,
        })
    }
}

/// Renames `from` to `to`, falling back to copy-then-delete when a plain
/// rename is refused (for example across filesystems).
pub fn move_file(from: &Path, to: &Path) -> Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(rename_error) => {
            tracing::debug!(
                error = %rename_error,
                "rename failed, copying {} instead",
                from.display()
            );
            fs::copy(from, to).map_err(|_| PackScribeError::Io(rename_error))?;
            fs::remove_file(from)?;
            Ok(())
        }
    }
}
