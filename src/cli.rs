use crate::config::{CliOverrides, Config, DescriptorScan, WritePolicy};
use crate::error::Result;
use crate::generator::load_fragment_list;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "packscribe")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Batch tooling for Minecraft modpack data files")]
#[command(
    long_about = "PackScribe walks loot table dumps and quest files, extracts the records \
                  a modpack script needs, sorts quests by mod and generates reward quests."
)]
#[command(before_help = "⛏️  PackScribe - Modpack Data Tooling")]
#[command(after_help = "EXAMPLES:\n  \
    packscribe loot --root loot_tables\n  \
    packscribe items --root organized_quests --descriptor-scan lexical\n  \
    packscribe organize --source chapters --destination organized_quests --collision version\n  \
    packscribe rewards --fragments fragments.txt --output-dir quests\n  \
    packscribe init-config packscribe.toml")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Verbose output level (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Dry run (show what would be done without executing)
    #[arg(
        long,
        global = true,
        help = "Report what would be written or moved without touching the filesystem"
    )]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Turn loot table dumps into one script call per (table, pool)
    Loot {
        /// Directory containing loot table JSON dumps
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// File the generated calls are written to
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Line template with {table} and {pool} placeholders
        #[arg(short, long)]
        template: Option<String>,

        /// What to do when the output file already exists
        #[arg(long, value_enum)]
        policy: Option<WritePolicy>,
    },

    /// Collect item ids and item descriptors from quest files
    Items {
        /// Directory containing quest files
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// File the item ids are written to
        #[arg(long)]
        ids_output: Option<PathBuf>,

        /// File the full item descriptors are written to
        #[arg(long)]
        full_output: Option<PathBuf>,

        /// How item descriptors are located
        #[arg(long, value_enum)]
        descriptor_scan: Option<DescriptorScan>,

        /// What to do when an output file already exists
        #[arg(long, value_enum)]
        policy: Option<WritePolicy>,
    },

    /// Move quest files into one folder per mod
    Organize {
        /// Directory holding the unsorted quest files
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Directory the per-mod folders are created in
        #[arg(short, long)]
        destination: Option<PathBuf>,

        /// What to do when a file of the same name is already sorted
        #[arg(long, value_enum)]
        collision: Option<WritePolicy>,

        /// Also pick up quest files in subdirectories of the source
        #[arg(long)]
        recursive: bool,
    },

    /// Generate one trade quest file per mob charm fragment
    Rewards {
        /// Directory the quest files are written to
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Text file with one fragment name per line
        #[arg(short, long)]
        fragments: Option<PathBuf>,
    },

    /// Write a sample configuration file
    InitConfig {
        /// Where to write the configuration
        #[arg(default_value = "packscribe.toml")]
        path: PathBuf,

        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Loot { .. } => "loot",
            Command::Items { .. } => "items",
            Command::Organize { .. } => "organize",
            Command::Rewards { .. } => "rewards",
            Command::InitConfig { .. } => "init-config",
        }
    }
}

impl Cli {
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_with_defaults(self.config.as_ref())?;

        let overrides = self.create_cli_overrides()?;
        config.merge_with_cli_args(&overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn create_cli_overrides(&self) -> Result<CliOverrides> {
        let overrides = CliOverrides::new();

        let overrides = match &self.command {
            Command::Loot {
                root,
                output,
                template,
                policy,
            } => overrides
                .with_loot_paths(root.clone(), output.clone())
                .with_template(template.clone())
                .with_emit_policy(*policy),
            Command::Items {
                root,
                ids_output,
                full_output,
                descriptor_scan,
                policy,
            } => overrides
                .with_items_paths(root.clone(), ids_output.clone(), full_output.clone())
                .with_descriptor_scan(*descriptor_scan)
                .with_emit_policy(*policy),
            Command::Organize {
                source,
                destination,
                collision,
                recursive,
            } => overrides
                .with_organize_paths(source.clone(), destination.clone())
                .with_collision(*collision)
                .with_recursive(*recursive),
            Command::Rewards {
                output_dir,
                fragments,
            } => {
                let fragments = match fragments {
                    Some(path) => Some(load_fragment_list(path)?),
                    None => None,
                };
                overrides
                    .with_rewards_output_dir(output_dir.clone())
                    .with_fragments(fragments)
            }
            Command::InitConfig { .. } => overrides,
        };

        Ok(overrides)
    }

    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_loot_command() {
        let cli = Cli::try_parse_from([
            "packscribe",
            "loot",
            "--root",
            "dumps",
            "--policy",
            "version",
        ])
        .unwrap();

        assert_eq!(cli.command.name(), "loot");
        let overrides = cli.create_cli_overrides().unwrap();
        assert_eq!(overrides.loot_root, Some(PathBuf::from("dumps")));
        assert_eq!(overrides.emit_policy, Some(WritePolicy::Version));
        assert!(overrides.loot_output.is_none());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["packscribe", "items", "--dry-run", "-vv"]).unwrap();

        assert!(cli.dry_run);
        assert_eq!(cli.verbosity_level(), 2);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["packscribe", "-q", "-v", "loot"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_organize_overrides() {
        let cli = Cli::try_parse_from([
            "packscribe",
            "organize",
            "--source",
            "chapters",
            "--collision",
            "overwrite",
            "--recursive",
        ])
        .unwrap();

        let mut config = Config::default();
        config.merge_with_cli_args(&cli.create_cli_overrides().unwrap());

        assert_eq!(config.organize.source, PathBuf::from("chapters"));
        assert_eq!(config.organize.collision, WritePolicy::Overwrite);
        assert!(config.organize.recursive);
        assert_eq!(config.organize.destination, PathBuf::from("organized_quests"));
    }

    #[test]
    fn test_rewards_fragment_file() {
        let temp_dir = TempDir::new().unwrap();
        let list = temp_dir.path().join("fragments.txt");
        fs::write(&list, "Zombie\nBlaze\n").unwrap();

        let cli = Cli::try_parse_from([
            "packscribe",
            "rewards",
            "--fragments",
            list.to_str().unwrap(),
        ])
        .unwrap();

        let overrides = cli.create_cli_overrides().unwrap();
        assert_eq!(
            overrides.fragments,
            Some(vec!["Zombie".to_string(), "Blaze".to_string()])
        );
    }

    #[test]
    fn test_missing_fragment_file_is_an_error() {
        let cli = Cli::try_parse_from([
            "packscribe",
            "rewards",
            "--fragments",
            "/definitely/not/fragments.txt",
        ])
        .unwrap();

        assert!(cli.create_cli_overrides().is_err());
    }

    #[test]
    fn test_init_config_default_path() {
        let cli = Cli::try_parse_from(["packscribe", "init-config"]).unwrap();
        match cli.command {
            Command::InitConfig { path, force } => {
                assert_eq!(path, PathBuf::from("packscribe.toml"));
                assert!(!force);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
