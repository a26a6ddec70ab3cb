use crate::config::DescriptorScan;
use crate::error::{PackScribeError, Result};
use regex::Regex;
use std::fs;
use std::path::Path;

/// `item: "<value>"`, value captured lazily and never across a line break.
pub const ITEM_FIELD_PATTERN: &str = r#"item:\s*"(.*?)""#;

/// Legacy descriptor pattern; stops at the first `}` after the id.
pub const LEXICAL_DESCRIPTOR_PATTERN: &str = r#"\{id:".*?".*?\}"#;

const DESCRIPTOR_START: &str = "{id:\"";

/// Everything pulled out of one quest file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestItems {
    pub item_ids: Vec<String>,
    pub descriptors: Vec<String>,
    /// Descriptor openings that never closed on their own line.
    pub unterminated: usize,
}

pub struct QuestTextExtractor {
    item_pattern: Regex,
    lexical_descriptor: Regex,
    mode: DescriptorScan,
}

impl QuestTextExtractor {
    pub fn new(mode: DescriptorScan) -> Result<Self> {
        Ok(Self {
            item_pattern: compile(ITEM_FIELD_PATTERN)?,
            lexical_descriptor: compile(LEXICAL_DESCRIPTOR_PATTERN)?,
            mode,
        })
    }

    pub fn extract_from_file(&self, path: &Path) -> Result<QuestItems> {
        let content = read_quest_text(path)?;
        Ok(self.extract(&content))
    }

    pub fn extract(&self, text: &str) -> QuestItems {
        let (descriptors, unterminated) = match self.mode {
            DescriptorScan::Balanced => scan_balanced_descriptors(text),
            DescriptorScan::Lexical => (self.lexical_descriptors(text), 0),
        };

        QuestItems {
            item_ids: self.item_ids(text),
            descriptors,
            unterminated,
        }
    }

    pub fn item_ids(&self, text: &str) -> Vec<String> {
        self.item_pattern
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .collect()
    }

    fn lexical_descriptors(&self, text: &str) -> Vec<String> {
        self.lexical_descriptor
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }
}

/// Reads a quest file as text. Invalid UTF-8 sequences become U+FFFD, so a
/// stray byte only costs the record it sits in.
pub(crate) fn read_quest_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|source| PackScribeError::Read {
        path: path.display().to_string(),
        source,
    })?;

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub(crate) fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| PackScribeError::Config {
        message: format!("Invalid pattern {}: {}", pattern, e),
    })
}

/// Finds every `{id:"...` compound and extends it to its matching brace.
///
/// Braces inside quoted strings do not count. A compound nested inside a
/// captured one is part of the outer capture. An opening that reaches the end
/// of its line unbalanced is dropped and counted.
pub fn scan_balanced_descriptors(text: &str) -> (Vec<String>, usize) {
    let mut descriptors = Vec::new();
    let mut unterminated = 0;
    let mut cursor = 0;

    while let Some(offset) = text[cursor..].find(DESCRIPTOR_START) {
        let start = cursor + offset;
        match balanced_len(&text[start..]) {
            Some(len) => {
                descriptors.push(text[start..start + len].to_string());
                cursor = start + len;
            }
            None => {
                unterminated += 1;
                cursor = start + 1;
            }
        }
    }

    (descriptors, unterminated)
}

/// Byte length of the brace-balanced prefix of `s`, which starts with `{`.
fn balanced_len(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if c == '\n' {
            return None;
        }

        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '"' | '\'' => quote = Some(c),
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }

    None
}
