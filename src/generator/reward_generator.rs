use crate::config::{render_template, RewardConfig, INDEX_PLACEHOLDER, NAME_PLACEHOLDER};
use crate::emitter::GeneratedFile;
use crate::error::{PackScribeError, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

const MAX_NAME_ATTEMPTS: usize = 32;

/// Source of the 8-character hex ids used for uids and file names.
pub trait IdSource {
    fn next_id(&mut self) -> String;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RandomHexIds;

impl IdSource for RandomHexIds {
    fn next_id(&mut self) -> String {
        format!("{:08x}", rand::random::<u32>())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestDefinition {
    pub title: String,
    pub icon: String,
    pub x: f64,
    pub y: f64,
    pub optional: bool,
    pub tasks: Vec<QuestTask>,
    pub rewards: Vec<QuestReward>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestTask {
    pub uid: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub items: Vec<TaskItem>,
    pub consume_items: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskItem {
    pub item: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestReward {
    pub uid: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub item: String,
}

/// Writes one item-for-item trade quest per fragment name.
pub struct RewardGenerator {
    config: RewardConfig,
    ids: Box<dyn IdSource>,
    dry_run: bool,
}

impl RewardGenerator {
    pub fn new(config: RewardConfig) -> Self {
        Self {
            config,
            ids: Box::new(RandomHexIds),
            dry_run: false,
        }
    }

    pub fn with_id_source<I: IdSource + 'static>(mut self, ids: I) -> Self {
        self.ids = Box::new(ids);
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.config.output_dir
    }

    pub fn fragments(&self) -> &[String] {
        &self.config.fragments
    }

    pub fn prepare(&self) -> Result<()> {
        if self.config.fragments.is_empty() {
            return Err(PackScribeError::Config {
                message: "No fragment names to generate quests for".to_string(),
            });
        }

        if !self.dry_run {
            fs::create_dir_all(&self.config.output_dir)?;
        }
        Ok(())
    }

    pub fn build_quest(&mut self, index: usize, name: &str) -> QuestDefinition {
        let index_text = index.to_string();
        let fields = [(NAME_PLACEHOLDER, name), (INDEX_PLACEHOLDER, index_text.as_str())];
        let icon = render_template(&self.config.icon_template, &fields);

        QuestDefinition {
            title: render_template(&self.config.title_template, &fields),
            icon: icon.clone(),
            x: index as f64 * self.config.spacing,
            y: 0.0,
            optional: true,
            tasks: vec![QuestTask {
                uid: self.ids.next_id(),
                kind: "item".to_string(),
                items: vec![TaskItem {
                    item: self.config.cost_item.clone(),
                }],
                consume_items: true,
            }],
            rewards: vec![QuestReward {
                uid: self.ids.next_id(),
                kind: "item".to_string(),
                item: icon,
            }],
        }
    }

    /// Builds, names and writes the quest for fragment `index`.
    pub fn write_quest(&mut self, index: usize, name: &str) -> Result<GeneratedFile> {
        let quest = self.build_quest(index, name);
        let content = render_quest(&quest)?;
        let path = self.free_quest_path()?;

        if !self.dry_run {
            fs::write(&path, content)?;
        }
        tracing::debug!(path = %path.display(), title = %quest.title, "generated quest");

        Ok(GeneratedFile {
            path,
            title: quest.title,
        })
    }

    fn free_quest_path(&mut self) -> Result<PathBuf> {
        for _ in 0..MAX_NAME_ATTEMPTS {
            let path = self
                .config
                .output_dir
                .join(format!("{}.snbt", self.ids.next_id()));
            if !path.exists() {
                return Ok(path);
            }
        }

        Err(PackScribeError::OutputExists {
            path: self.config.output_dir.display().to_string(),
        })
    }
}

/// Serializes a quest as 4-space indented JSON.
pub fn render_quest(quest: &QuestDefinition) -> Result<String> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    quest
        .serialize(&mut serializer)
        .map_err(|e| PackScribeError::Config {
            message: format!("Failed to serialize quest: {}", e),
        })?;

    String::from_utf8(buffer).map_err(|e| PackScribeError::Config {
        message: format!("Quest output is not UTF-8: {}", e),
    })
}

/// One fragment name per line; blank lines and `#` comments are ignored.
pub fn load_fragment_list(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path).map_err(|source| PackScribeError::Read {
        path: path.display().to_string(),
        source,
    })?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}
