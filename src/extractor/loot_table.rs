use crate::config::{render_template, POOL_PLACEHOLDER, TABLE_PLACEHOLDER};
use crate::error::{PackScribeError, Result};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Key under which LootTweaker stores dump metadata.
pub const DUMP_INFO_KEY: &str = "loottweaker:dump_info";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LootEntry {
    pub table_id: String,
    pub pool: String,
}

impl LootEntry {
    pub fn new<S: Into<String>>(table_id: S, pool: S) -> Self {
        Self {
            table_id: table_id.into(),
            pool: pool.into(),
        }
    }

    pub fn render(&self, template: &str) -> String {
        render_template(
            template,
            &[
                (TABLE_PLACEHOLDER, self.table_id.as_str()),
                (POOL_PLACEHOLDER, self.pool.as_str()),
            ],
        )
    }
}

/// Pulls `(table id, pool name)` pairs out of LootTweaker JSON dumps.
#[derive(Debug, Default, Clone, Copy)]
pub struct LootTableExtractor;

impl LootTableExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract_from_file(&self, path: &Path) -> Result<Vec<LootEntry>> {
        let content = fs::read_to_string(path).map_err(|source| PackScribeError::Read {
            path: path.display().to_string(),
            source,
        })?;

        self.extract_from_str(&content, path)
    }

    pub fn extract_from_str(&self, content: &str, path: &Path) -> Result<Vec<LootEntry>> {
        let document: Value =
            serde_json::from_str(content).map_err(|e| PackScribeError::Parse {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Ok(self.extract_from_document(&document))
    }

    /// A document without a non-empty `loottweaker:dump_info.id` yields nothing.
    /// Pools without a non-empty string `name` are skipped.
    pub fn extract_from_document(&self, document: &Value) -> Vec<LootEntry> {
        let table_id = match document
            .get(DUMP_INFO_KEY)
            .and_then(|info| info.get("id"))
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
        {
            Some(id) => id,
            None => return Vec::new(),
        };

        document
            .get("pools")
            .and_then(Value::as_array)
            .map(|pools| {
                pools
                    .iter()
                    .filter_map(|pool| pool.get("name").and_then(Value::as_str))
                    .filter(|name| !name.is_empty())
                    .map(|name| LootEntry::new(table_id, name))
                    .collect()
            })
            .unwrap_or_default()
    }
}
