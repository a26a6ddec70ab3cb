use std::path::Path;

/// Case-insensitive extension filter for candidate files.
#[derive(Debug, Clone)]
pub struct SuffixFilter {
    extensions: Vec<String>,
}

impl SuffixFilter {
    pub fn new<S: AsRef<str>>(extensions: &[S]) -> Self {
        let mut filter = Self {
            extensions: Vec::new(),
        };
        for extension in extensions {
            filter.add_extension(extension.as_ref());
        }
        filter
    }

    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.iter().any(|ext| e.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }

    fn add_extension(&mut self, extension: &str) {
        let ext = extension.trim().trim_start_matches('.').to_lowercase();
        if !ext.is_empty() && !self.extensions.contains(&ext) {
            self.extensions.push(ext);
        }
    }
}
