use crate::error::{PackScribeError, Result};
use crate::extractor::quest_text::{compile, read_quest_text, ITEM_FIELD_PATTERN};
use regex::Regex;
use std::path::Path;

/// Infers which mod a quest file belongs to from its `item:` fields.
pub struct ModClassifier {
    item_pattern: Regex,
}

impl ModClassifier {
    pub fn new() -> Result<Self> {
        Ok(Self {
            item_pattern: compile(ITEM_FIELD_PATTERN)?,
        })
    }

    /// Namespace of the first `item:` value with a non-empty prefix.
    pub fn classify(&self, text: &str) -> Option<String> {
        self.item_pattern
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| namespace_of(m.as_str()))
            .find(|namespace| !namespace.is_empty())
            .map(str::to_string)
    }

    /// Reads and classifies a file, rejecting names unusable as a folder.
    pub fn classify_file(&self, path: &Path) -> Result<String> {
        let content = read_quest_text(path)?;
        self.classify(&content)
            .filter(|name| is_valid_folder_name(name))
            .ok_or_else(|| PackScribeError::ClassificationMiss {
                path: path.display().to_string(),
            })
    }
}

/// Everything before the first `:`; an id without one is its own namespace.
pub fn namespace_of(item_id: &str) -> &str {
    item_id.split(':').next().unwrap_or("")
}

pub fn is_valid_folder_name(name: &str) -> bool {
    const INVALID_CHARS: [char; 8] = ['<', '>', '"', '|', '?', '*', '/', '\\'];

    !name.is_empty()
        && name != "."
        && name != ".."
        && !name
            .chars()
            .any(|c| INVALID_CHARS.contains(&c) || c.is_control())
        && !name.ends_with(' ')
        && !name.ends_with('.')
}
