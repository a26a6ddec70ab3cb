use crate::error::{PackScribeError, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub scan: ScanConfig,
    pub loot: LootConfig,
    pub items: ItemsConfig,
    pub organize: OrganizeConfig,
    pub rewards: RewardConfig,
    pub emit: EmitConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScanConfig {
    pub max_depth: usize,
    pub follow_links: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LootConfig {
    pub root: PathBuf,
    pub output: PathBuf,
    pub extensions: Vec<String>,
    pub template: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ItemsConfig {
    pub root: PathBuf,
    pub ids_output: PathBuf,
    pub full_output: PathBuf,
    pub extensions: Vec<String>,
    pub descriptor_scan: DescriptorScan,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OrganizeConfig {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub extensions: Vec<String>,
    pub recursive: bool,
    pub collision: WritePolicy,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RewardConfig {
    pub output_dir: PathBuf,
    pub title_template: String,
    pub icon_template: String,
    pub cost_item: String,
    pub spacing: f64,
    pub fragments: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct EmitConfig {
    pub policy: WritePolicy,
}

/// What to do when a file is about to be written or moved onto an existing path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WritePolicy {
    /// Replace the existing file
    #[default]
    Overwrite,
    /// Leave the existing file alone and report an error
    Fail,
    /// Pick the first free `name-N.ext` next to the existing file
    Version,
}

/// How `{id:"..."}` item descriptors are located in quest text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DescriptorScan {
    /// Track brace depth so nested compounds are captured whole
    #[default]
    Balanced,
    /// Stop at the first closing brace
    Lexical,
}

pub const TABLE_PLACEHOLDER: &str = "{table}";
pub const POOL_PLACEHOLDER: &str = "{pool}";
pub const NAME_PLACEHOLDER: &str = "{name}";
pub const INDEX_PLACEHOLDER: &str = "{index}";

/// Substitutes placeholders in one left-to-right pass.
///
/// Inserted values are never scanned again, so a value that itself contains
/// a placeholder token comes out verbatim.
pub fn render_template(template: &str, fields: &[(&str, &str)]) -> String {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;

    loop {
        let next = fields
            .iter()
            .filter(|(placeholder, _)| !placeholder.is_empty())
            .filter_map(|&(placeholder, value)| {
                rest.find(placeholder).map(|at| (at, placeholder, value))
            })
            .min_by_key(|(at, _, _)| *at);

        match next {
            Some((at, placeholder, value)) => {
                rendered.push_str(&rest[..at]);
                rendered.push_str(value);
                rest = &rest[at + placeholder.len()..];
            }
            None => {
                rendered.push_str(rest);
                return rendered;
            }
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_depth: 64,
            follow_links: false,
        }
    }
}

impl Default for LootConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("loot_tables"),
            output: PathBuf::from("generated_apply_calls.txt"),
            extensions: vec!["json".to_string()],
            template: r#"applyCoinEntriesToTable("{table}", "{pool}");"#.to_string(),
        }
    }
}

impl Default for ItemsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("organized_quests"),
            ids_output: PathBuf::from("extracted_item_ids.txt"),
            full_output: PathBuf::from("extracted_full_items.txt"),
            extensions: vec!["snbt".to_string()],
            descriptor_scan: DescriptorScan::Balanced,
        }
    }
}

impl Default for OrganizeConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from("."),
            destination: PathBuf::from("organized_quests"),
            extensions: vec!["snbt".to_string()],
            recursive: false,
            collision: WritePolicy::Fail,
        }
    }
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("quests"),
            title_template: "{name} Charm [1 Enderium Coin]".to_string(),
            icon_template: "xreliquary:mob_charm_fragment:{index}".to_string(),
            cost_item: "thermalfoundation:coin 103".to_string(),
            spacing: 2.0,
            fragments: [
                "Zombie",
                "Skeleton",
                "Wither Skeleton",
                "Creeper",
                "Witch",
                "Zombie Pigman",
                "Cave Spider",
                "Spider",
                "Enderman",
                "Ghast",
                "Slime",
                "Magma Cube",
                "Blaze",
                "Guardian",
            ]
            .iter()
            .map(|name| name.to_string())
            .collect(),
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(PackScribeError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| PackScribeError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| PackScribeError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        Ok(config)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_paths = ["packscribe.toml", ".packscribe.toml"];

                for default_path in &default_paths {
                    if Path::new(default_path).exists() {
                        return Self::load_from_file(default_path);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    pub fn merge_with_cli_args(&mut self, overrides: &CliOverrides) {
        if let Some(ref root) = overrides.loot_root {
            self.loot.root = root.clone();
        }
        if let Some(ref output) = overrides.loot_output {
            self.loot.output = output.clone();
        }
        if let Some(ref template) = overrides.template {
            self.loot.template = template.clone();
        }

        if let Some(ref root) = overrides.items_root {
            self.items.root = root.clone();
        }
        if let Some(ref output) = overrides.ids_output {
            self.items.ids_output = output.clone();
        }
        if let Some(ref output) = overrides.full_output {
            self.items.full_output = output.clone();
        }
        if let Some(scan) = overrides.descriptor_scan {
            self.items.descriptor_scan = scan;
        }

        if let Some(ref source) = overrides.organize_source {
            self.organize.source = source.clone();
        }
        if let Some(ref destination) = overrides.organize_destination {
            self.organize.destination = destination.clone();
        }
        if let Some(collision) = overrides.collision {
            self.organize.collision = collision;
        }
        if overrides.recursive {
            self.organize.recursive = true;
        }

        if let Some(ref output_dir) = overrides.rewards_output_dir {
            self.rewards.output_dir = output_dir.clone();
        }
        if let Some(ref fragments) = overrides.fragments {
            self.rewards.fragments = fragments.clone();
        }

        if let Some(policy) = overrides.emit_policy {
            self.emit.policy = policy;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.scan.max_depth == 0 {
            return Err(PackScribeError::Config {
                message: "Maximum directory depth must be greater than 0".to_string(),
            });
        }

        for (section, extensions) in [
            ("loot", &self.loot.extensions),
            ("items", &self.items.extensions),
            ("organize", &self.organize.extensions),
        ] {
            if extensions.iter().all(|e| e.trim().is_empty()) {
                return Err(PackScribeError::Config {
                    message: format!("[{}] needs at least one file extension", section),
                });
            }
        }

        for placeholder in [TABLE_PLACEHOLDER, POOL_PLACEHOLDER] {
            if !self.loot.template.contains(placeholder) {
                return Err(PackScribeError::Config {
                    message: format!("Loot template must contain {}", placeholder),
                });
            }
        }

        if !self.rewards.spacing.is_finite() || self.rewards.spacing <= 0.0 {
            return Err(PackScribeError::Config {
                message: "Reward spacing must be a positive number".to_string(),
            });
        }

        if self.rewards.fragments.iter().any(|f| f.trim().is_empty()) {
            return Err(PackScribeError::Config {
                message: "Fragment names cannot be blank".to_string(),
            });
        }

        Ok(())
    }

    pub fn create_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config).unwrap_or_else(|_| String::new())
    }
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub loot_root: Option<PathBuf>,
    pub loot_output: Option<PathBuf>,
    pub template: Option<String>,
    pub items_root: Option<PathBuf>,
    pub ids_output: Option<PathBuf>,
    pub full_output: Option<PathBuf>,
    pub descriptor_scan: Option<DescriptorScan>,
    pub organize_source: Option<PathBuf>,
    pub organize_destination: Option<PathBuf>,
    pub collision: Option<WritePolicy>,
    pub recursive: bool,
    pub rewards_output_dir: Option<PathBuf>,
    pub fragments: Option<Vec<String>>,
    pub emit_policy: Option<WritePolicy>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_loot_paths(mut self, root: Option<PathBuf>, output: Option<PathBuf>) -> Self {
        self.loot_root = root;
        self.loot_output = output;
        self
    }

    pub fn with_template(mut self, template: Option<String>) -> Self {
        self.template = template;
        self
    }

    pub fn with_items_paths(
        mut self,
        root: Option<PathBuf>,
        ids_output: Option<PathBuf>,
        full_output: Option<PathBuf>,
    ) -> Self {
        self.items_root = root;
        self.ids_output = ids_output;
        self.full_output = full_output;
        self
    }

    pub fn with_descriptor_scan(mut self, scan: Option<DescriptorScan>) -> Self {
        self.descriptor_scan = scan;
        self
    }

    pub fn with_organize_paths(
        mut self,
        source: Option<PathBuf>,
        destination: Option<PathBuf>,
    ) -> Self {
        self.organize_source = source;
        self.organize_destination = destination;
        self
    }

    pub fn with_collision(mut self, collision: Option<WritePolicy>) -> Self {
        self.collision = collision;
        self
    }

    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn with_rewards_output_dir(mut self, output_dir: Option<PathBuf>) -> Self {
        self.rewards_output_dir = output_dir;
        self
    }

    pub fn with_fragments(mut self, fragments: Option<Vec<String>>) -> Self {
        self.fragments = fragments;
        self
    }

    pub fn with_emit_policy(mut self, policy: Option<WritePolicy>) -> Self {
        self.emit_policy = policy;
        self
    }
}
