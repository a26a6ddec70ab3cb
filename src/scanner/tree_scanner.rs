use crate::config::ScanConfig;
use crate::error::{PackScribeError, Result};
use crate::scanner::file_filter::SuffixFilter;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, FilterEntry, WalkDir};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub path: PathBuf,
    pub relative_path: PathBuf,
    pub size: u64,
}

impl CandidateFile {
    pub fn display_path(&self) -> String {
        self.relative_path.display().to_string()
    }
}

pub struct TreeScanner {
    max_depth: usize,
    follow_links: bool,
    excluded: Vec<PathBuf>,
}

impl TreeScanner {
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            max_depth: config.max_depth,
            follow_links: config.follow_links,
            excluded: Vec::new(),
        }
    }

    /// Limits traversal to `depth` levels below the root (1 = root entries only).
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth.max(1);
        self
    }

    /// Skips a directory subtree entirely.
    pub fn with_excluded<P: AsRef<Path>>(mut self, dir: P) -> Self {
        let dir = dir.as_ref();
        self.excluded
            .push(dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf()));
        self
    }

    /// Validates the root, then returns a lazy walk over matching files.
    ///
    /// Entries within a directory are visited in file name order. Unreadable
    /// subdirectories are skipped and recorded as warnings on the iterator.
    pub fn walk<P: AsRef<Path>>(&self, root: P, filter: SuffixFilter) -> Result<CandidateFiles> {
        let root_path = root.as_ref();
        validate_root(root_path)?;

        let excluded = self.excluded.clone();
        let keep: Box<dyn FnMut(&DirEntry) -> bool> =
            Box::new(move |entry| should_traverse(entry, &excluded));

        let walker = WalkDir::new(root_path)
            .max_depth(self.max_depth)
            .follow_links(self.follow_links)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(keep);

        Ok(CandidateFiles {
            walker,
            filter,
            root: root_path.to_path_buf(),
            warnings: Vec::new(),
            files_seen: 0,
        })
    }
}

/// Fails unless `root` exists and is a directory.
pub fn validate_root(root: &Path) -> Result<()> {
    if !root.exists() {
        return Err(PackScribeError::RootNotFound {
            path: root.display().to_string(),
        });
    }

    if !root.is_dir() {
        return Err(PackScribeError::NotADirectory {
            path: root.display().to_string(),
        });
    }

    Ok(())
}

fn should_traverse(entry: &DirEntry, excluded: &[PathBuf]) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() || excluded.is_empty() {
        return true;
    }

    let path = entry
        .path()
        .canonicalize()
        .unwrap_or_else(|_| entry.path().to_path_buf());
    !excluded.iter().any(|ex| *ex == path)
}

pub struct CandidateFiles {
    walker: FilterEntry<walkdir::IntoIter, Box<dyn FnMut(&DirEntry) -> bool>>,
    filter: SuffixFilter,
    root: PathBuf,
    warnings: Vec<String>,
    files_seen: usize,
}

impl CandidateFiles {
    pub fn into_warnings(self) -> Vec<String> {
        self.warnings
    }

    /// Regular files visited so far, matching or not.
    pub fn files_seen(&self) -> usize {
        self.files_seen
    }

    fn warn(&mut self, message: String) {
        tracing::warn!("{}", message);
        self.warnings.push(message);
    }
}

impl Iterator for CandidateFiles {
    type Item = CandidateFile;

    fn next(&mut self) -> Option<CandidateFile> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    let message = if err
                        .io_error()
                        .is_some_and(|e| e.kind() == std::io::ErrorKind::PermissionDenied)
                    {
                        format!("Permission denied: {}", err)
                    } else {
                        PackScribeError::from(err).to_string()
                    };
                    self.warn(message);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }
            self.files_seen += 1;

            let path = entry.path();
            if !self.filter.matches(path) {
                continue;
            }

            let size = match entry.metadata() {
                Ok(metadata) => metadata.len(),
                Err(err) => {
                    self.warn(format!("Cannot stat {}: {}", path.display(), err));
                    continue;
                }
            };

            let relative_path = path
                .strip_prefix(&self.root)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| path.to_path_buf());

            tracing::debug!(path = %path.display(), size, "candidate file");

            return Some(CandidateFile {
                path: path.to_path_buf(),
                relative_path,
                size,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn scanner() -> TreeScanner {
        TreeScanner::new(&ScanConfig::default())
    }

    fn collect_names(scanner: &TreeScanner, root: &Path, extension: &str) -> Vec<String> {
        scanner
            .walk(root, SuffixFilter::new(&[extension]))
            .unwrap()
            .map(|f| f.relative_path.display().to_string())
            .collect()
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("loot_tables");

        let result = scanner().walk(&missing, SuffixFilter::new(&["json"]));
        assert!(matches!(result, Err(PackScribeError::RootNotFound { .. })));
    }

    #[test]
    fn test_file_root_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("table.json");
        fs::write(&file, "{}").unwrap();

        let result = scanner().walk(&file, SuffixFilter::new(&["json"]));
        assert!(matches!(result, Err(PackScribeError::NotADirectory { .. })));
    }

    #[test]
    fn test_recursive_suffix_scan() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("chests/nested")).unwrap();
        fs::write(root.join("a.json"), "{}").unwrap();
        fs::write(root.join("chests/b.json"), "{}").unwrap();
        fs::write(root.join("chests/nested/c.JSON"), "{}").unwrap();
        fs::write(root.join("chests/readme.txt"), "skip").unwrap();

        let mut files = scanner().walk(root, SuffixFilter::new(&["json"])).unwrap();
        let found: Vec<PathBuf> = files.by_ref().map(|f| f.relative_path).collect();

        assert_eq!(found.len(), 3);
        assert!(found.contains(&PathBuf::from("a.json")));
        assert!(found.contains(&PathBuf::from("chests/b.json")));
        assert!(found.contains(&PathBuf::from("chests/nested/c.JSON")));
        assert_eq!(files.files_seen(), 4);
        assert!(files.into_warnings().is_empty());
    }

    #[test]
    fn test_depth_limit_scans_root_only() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::write(root.join("top.snbt"), "").unwrap();
        fs::write(root.join("sub/deep.snbt"), "").unwrap();

        let names = collect_names(&scanner().with_max_depth(1), root, "snbt");
        assert_eq!(names, vec!["top.snbt"]);
    }

    #[test]
    fn test_excluded_directory_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("organized_quests/minecraft")).unwrap();
        fs::write(root.join("quest.snbt"), "").unwrap();
        fs::write(root.join("organized_quests/minecraft/done.snbt"), "").unwrap();

        let scanner = scanner().with_excluded(root.join("organized_quests"));
        assert_eq!(collect_names(&scanner, root, "snbt"), vec!["quest.snbt"]);
    }

    #[test]
    fn test_files_are_visited_in_name_order() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        for name in ["c.json", "a.json", "b.json"] {
            fs::write(root.join(name), "{}").unwrap();
        }

        let names = collect_names(&scanner(), root, "json");
        assert_eq!(names, vec!["a.json", "b.json", "c.json"]);
    }

    #[test]
    fn test_empty_tree_yields_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let mut files = scanner()
            .walk(temp_dir.path(), SuffixFilter::new(&["json"]))
            .unwrap();

        assert!(files.next().is_none());
        assert_eq!(files.files_seen(), 0);
        assert!(files.into_warnings().is_empty());
    }
}
