pub mod cli;
pub mod config;
pub mod emitter;
pub mod error;
pub mod extractor;
pub mod generator;
pub mod organizer;
pub mod scanner;
pub mod ui;

// Public API re-exports
pub use cli::{Cli, Command, OutputFormat};
pub use config::{CliOverrides, Config, DescriptorScan, WritePolicy};
pub use error::{PackScribeError, Result, UserFriendlyError};

// Core functionality re-exports
pub use emitter::{LineWriter, RunReport, SkipReason};
pub use extractor::{LootEntry, LootTableExtractor, ModClassifier, QuestTextExtractor, RecordSet};
pub use generator::{IdSource, RewardGenerator};
pub use organizer::QuestOrganizer;
pub use scanner::{CandidateFile, CandidateFiles, SuffixFilter, TreeScanner};
pub use ui::{OutputFormatter, OutputMode, ProgressManager};

use std::path::Path;

/// Main library interface: one method per command.
pub struct PackScribe {
    config: Config,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
    dry_run: bool,
}

impl PackScribe {
    pub fn new(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        let progress_manager = ProgressManager::new(!quiet && output_mode == OutputMode::Human);

        Self {
            config,
            output_formatter,
            progress_manager,
            dry_run: false,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Create a PackScribe instance from CLI arguments
    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let config = cli_args.load_config()?;
        let output_mode = match cli_args.output_format {
            OutputFormat::Human => OutputMode::Human,
            OutputFormat::Json => OutputMode::Json,
            OutputFormat::Plain => OutputMode::Plain,
        };

        let verbose = cli_args.verbosity_level();
        Ok(Self::new(config, output_mode, verbose, cli_args.quiet)
            .with_dry_run(cli_args.dry_run))
    }

    pub fn run(&self, command: &Command) -> Result<RunReport> {
        match command {
            Command::Loot { .. } => self.compile_loot_calls(),
            Command::Items { .. } => self.extract_items(),
            Command::Organize { .. } => self.organize_quests(),
            Command::Rewards { .. } => self.generate_rewards(),
            Command::InitConfig { .. } => Err(PackScribeError::Config {
                message: "init-config does not run the pipeline".to_string(),
            }),
        }
    }

    /// Writes one templated call per (loot table, pool) pair.
    pub fn compile_loot_calls(&self) -> Result<RunReport> {
        let loot = &self.config.loot;
        self.output_formatter
            .start_operation(&format!("Scanning loot tables in {}", loot.root.display()));

        let mut report = RunReport::new("loot", &loot.root, self.dry_run);
        let files = TreeScanner::new(&self.config.scan)
            .walk(&loot.root, SuffixFilter::new(loot.extensions.as_slice()))?;

        let extractor = LootTableExtractor::new();
        let mut entries = RecordSet::new();
        self.drain_candidates(&mut report, files, |file| {
            let found = extractor.extract_from_file(&file.path)?;
            let added = entries.extend_from(&file.path, found);
            tracing::debug!(path = %file.path.display(), records = added, "loot entries");
            Ok(())
        })?;

        report.records = entries.len();
        self.output_formatter.debug(&format!(
            "{} loot tables contributed entries",
            entries.contributing_files()
        ));
        for record in entries.iter() {
            tracing::trace!(
                source = %record.source.display(),
                table = %record.value.table_id,
                pool = %record.value.pool,
                "loot entry"
            );
        }

        let output = self.line_writer().write(
            &loot.output,
            entries.values().map(|entry| entry.render(&loot.template)),
        )?;
        self.output_formatter.success(&format!(
            "{} {} calls to {}",
            self.write_verb(),
            output.lines,
            output.path.display()
        ));
        report.outputs.push(output);

        Ok(report.finish())
    }

    /// Writes every `item:` id and every item descriptor found in quest files.
    pub fn extract_items(&self) -> Result<RunReport> {
        let items = &self.config.items;
        self.output_formatter
            .start_operation(&format!("Scanning quest files in {}", items.root.display()));

        let mut report = RunReport::new("items", &items.root, self.dry_run);
        let files = TreeScanner::new(&self.config.scan)
            .walk(&items.root, SuffixFilter::new(items.extensions.as_slice()))?;

        let extractor = QuestTextExtractor::new(items.descriptor_scan)?;
        let mut ids = RecordSet::new();
        let mut descriptors = RecordSet::new();
        let mut unterminated = Vec::new();
        self.drain_candidates(&mut report, files, |file| {
            let found = extractor.extract_from_file(&file.path)?;
            if found.unterminated > 0 {
                unterminated.push(format!(
                    "{} unterminated item descriptor(s) in {}",
                    found.unterminated,
                    file.path.display()
                ));
            }
            ids.extend_from(&file.path, found.item_ids);
            descriptors.extend_from(&file.path, found.descriptors);
            Ok(())
        })?;

        for warning in unterminated {
            tracing::warn!("{}", warning);
            report.warn(warning);
        }
        report.records = ids.len() + descriptors.len();

        let writer = self.line_writer();
        let ids_target = writer.resolve(&items.ids_output)?;
        let full_target = writer.resolve(&items.full_output)?;
        let ids_output = writer.write_resolved(ids_target, ids.values())?;
        let full_output = writer.write_resolved(full_target, descriptors.values())?;

        self.output_formatter.success(&format!(
            "{} {} item ids to {}",
            self.write_verb(),
            ids_output.lines,
            ids_output.path.display()
        ));
        self.output_formatter.success(&format!(
            "{} {} item descriptors to {}",
            self.write_verb(),
            full_output.lines,
            full_output.path.display()
        ));
        report.outputs.push(ids_output);
        report.outputs.push(full_output);

        Ok(report.finish())
    }

    /// Moves quest files into one folder per mod namespace.
    pub fn organize_quests(&self) -> Result<RunReport> {
        let organize = &self.config.organize;
        scanner::validate_root(&organize.source)?;

        self.output_formatter.start_operation(&format!(
            "Organizing quest files from {} into {}",
            organize.source.display(),
            organize.destination.display()
        ));

        let organizer = QuestOrganizer::new(organize.destination.clone(), organize.collision)?
            .with_dry_run(self.dry_run);
        organizer.prepare()?;

        let scanner = TreeScanner::new(&self.config.scan).with_excluded(organizer.destination());
        let scanner = if organize.recursive {
            scanner
        } else {
            scanner.with_max_depth(1)
        };

        let mut report = RunReport::new("organize", &organize.source, self.dry_run);
        let files = scanner.walk(
            &organize.source,
            SuffixFilter::new(organize.extensions.as_slice()),
        )?;

        let mut moves = Vec::new();
        self.drain_candidates(&mut report, files, |file| {
            let record = organizer.organize_file(&file.path)?;
            self.output_formatter.debug(&format!(
                "{} -> {}",
                file.display_path(),
                record.to.display()
            ));
            moves.push(record);
            Ok(())
        })?;

        report.records = moves.len();
        report.moves = moves;

        let verb = if self.dry_run { "Would move" } else { "Moved" };
        self.output_formatter.success(&format!(
            "{} {} quest files into {}",
            verb,
            report.moves.len(),
            organizer.destination().display()
        ));

        Ok(report.finish())
    }

    /// Writes one trade quest per configured fragment name.
    pub fn generate_rewards(&self) -> Result<RunReport> {
        let mut generator =
            RewardGenerator::new(self.config.rewards.clone()).with_dry_run(self.dry_run);
        generator.prepare()?;

        self.output_formatter.start_operation(&format!(
            "Generating reward quests in {}",
            generator.output_dir().display()
        ));

        let mut report = RunReport::new("rewards", generator.output_dir(), self.dry_run);
        let fragments = generator.fragments().to_vec();
        let progress = self
            .progress_manager
            .create_file_progress(fragments.len() as u64);

        for (index, name) in fragments.iter().enumerate() {
            let generated = generator.write_quest(index, name)?;
            ui::progress::update_file_progress(&progress, &generated.path);
            self.output_formatter
                .info(&format!("Generated {}", generated.path.display()));
            report.generated.push(generated);
        }

        report.records = report.generated.len();
        ui::progress::finish_progress_with_summary(
            &progress,
            &format!("Generated {} quests", report.generated.len()),
            report.elapsed(),
        );

        Ok(report.finish())
    }

    /// Feeds every candidate to `handle`. Per-file errors skip that file
    /// only; anything else stops the walk and is returned. Walk warnings are
    /// carried into the report.
    fn drain_candidates<F>(
        &self,
        report: &mut RunReport,
        mut files: CandidateFiles,
        mut handle: F,
    ) -> Result<()>
    where
        F: FnMut(&CandidateFile) -> Result<()>,
    {
        let spinner = self.progress_manager.create_scan_spinner("Scanning");

        for file in files.by_ref() {
            report.files_scanned += 1;
            ui::progress::update_file_progress(&spinner, &file.path);

            match handle(&file) {
                Ok(()) => {}
                Err(error) if error.is_per_file() => {
                    tracing::warn!(path = %file.path.display(), error = %error, "skipping file");
                    self.output_formatter
                        .warning(&format!("Skipped {}: {}", file.display_path(), error));
                    report.skip(&file.path, &error);
                }
                Err(error) => {
                    spinner.abandon();
                    return Err(error);
                }
            }
        }

        tracing::debug!(
            visited = files.files_seen(),
            candidates = report.files_scanned,
            "walk finished"
        );
        for warning in files.into_warnings() {
            report.warn(warning);
        }

        ui::progress::finish_progress_with_summary(
            &spinner,
            &format!("Scanned {} files", report.files_scanned),
            report.elapsed(),
        );
        Ok(())
    }

    fn line_writer(&self) -> LineWriter {
        LineWriter::new(self.config.emit.policy).with_dry_run(self.dry_run)
    }

    fn write_verb(&self) -> &'static str {
        if self.dry_run {
            "Would write"
        } else {
            "Wrote"
        }
    }

    /// Generate sample configuration file
    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        let sample_config = Config::create_sample_config();
        std::fs::write(output_path.as_ref(), sample_config)?;
        Ok(())
    }

    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Handle error with user-friendly output
    pub fn handle_error(&self, error: &PackScribeError) {
        self.output_formatter.print_user_friendly_error(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn quiet_instance(config: Config) -> PackScribe {
        PackScribe::new(config, OutputMode::Plain, 0, true)
    }

    fn loot_dump(id: &str, pools: &[&str]) -> String {
        let pools: Vec<String> = pools
            .iter()
            .map(|name| format!("{{\"name\": \"{}\", \"rolls\": 1}}", name))
            .collect();
        format!(
            "{{\"loottweaker:dump_info\": {{\"id\": \"{}\"}}, \"pools\": [{}]}}",
            id,
            pools.join(", ")
        )
    }

    fn loot_config(dir: &Path) -> Config {
        let mut config = Config::default();
        config.loot.root = dir.join("loot_tables");
        config.loot.output = dir.join("generated_apply_calls.txt");
        config
    }

    #[test]
    fn test_loot_calls_in_traversal_order() {
        let temp_dir = TempDir::new().unwrap();
        let config = loot_config(temp_dir.path());
        let chests = config.loot.root.join("chests");
        fs::create_dir_all(&chests).unwrap();
        fs::write(
            chests.join("a_mineshaft.json"),
            loot_dump("minecraft:chests/abandoned_mineshaft", &["main", "pool1"]),
        )
        .unwrap();
        fs::write(
            chests.join("b_igloo.json"),
            loot_dump("minecraft:chests/igloo_chest", &["main"]),
        )
        .unwrap();
        fs::write(chests.join("c_broken.json"), "{ not json").unwrap();
        fs::write(chests.join("notes.txt"), "ignored").unwrap();

        let report = quiet_instance(config.clone()).compile_loot_calls().unwrap();

        let output = fs::read_to_string(&config.loot.output).unwrap();
        assert_eq!(
            output,
            "applyCoinEntriesToTable(\"minecraft:chests/abandoned_mineshaft\", \"main\");\n\
             applyCoinEntriesToTable(\"minecraft:chests/abandoned_mineshaft\", \"pool1\");\n\
             applyCoinEntriesToTable(\"minecraft:chests/igloo_chest\", \"main\");\n"
        );
        assert_eq!(report.files_scanned, 3);
        assert_eq!(report.records, 3);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].reason, SkipReason::Parse);
    }

    #[test]
    fn test_empty_root_writes_empty_output() {
        let temp_dir = TempDir::new().unwrap();
        let config = loot_config(temp_dir.path());
        fs::create_dir_all(&config.loot.root).unwrap();

        let report = quiet_instance(config.clone()).compile_loot_calls().unwrap();

        assert_eq!(report.records, 0);
        assert!(!report.has_issues());
        assert_eq!(fs::read_to_string(&config.loot.output).unwrap(), "");
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let config = loot_config(temp_dir.path());

        let result = quiet_instance(config.clone()).compile_loot_calls();

        assert!(matches!(result, Err(PackScribeError::RootNotFound { .. })));
        assert!(!config.loot.output.exists());
    }

    #[test]
    fn test_fail_policy_keeps_existing_output() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = loot_config(temp_dir.path());
        config.emit.policy = WritePolicy::Fail;
        fs::create_dir_all(&config.loot.root).unwrap();
        fs::write(&config.loot.output, "keep me\n").unwrap();

        let result = quiet_instance(config.clone()).compile_loot_calls();

        assert!(matches!(result, Err(PackScribeError::OutputExists { .. })));
        assert_eq!(fs::read_to_string(&config.loot.output).unwrap(), "keep me\n");
    }

    #[test]
    fn test_items_collision_writes_neither_output() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.emit.policy = WritePolicy::Fail;
        config.items.root = temp_dir.path().join("organized_quests");
        config.items.ids_output = temp_dir.path().join("ids.txt");
        config.items.full_output = temp_dir.path().join("full.txt");
        fs::create_dir_all(&config.items.root).unwrap();
        fs::write(config.items.root.join("q.snbt"), "item: \"a:b\"\n").unwrap();
        fs::write(&config.items.full_output, "keep me\n").unwrap();

        let result = quiet_instance(config.clone()).extract_items();

        assert!(matches!(result, Err(PackScribeError::OutputExists { .. })));
        assert!(!config.items.ids_output.exists());
        assert_eq!(
            fs::read_to_string(&config.items.full_output).unwrap(),
            "keep me\n"
        );
    }

    #[test]
    fn test_items_keep_duplicates_across_files() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.items.root = temp_dir.path().join("organized_quests");
        config.items.ids_output = temp_dir.path().join("ids.txt");
        config.items.full_output = temp_dir.path().join("full.txt");

        let botania = config.items.root.join("botania");
        fs::create_dir_all(&botania).unwrap();
        let quest = "tasks: [{ item: \"botania:petal\" }]\n\
                     rewards: [{ item: {id:\"botania:rune\", tag:{display:{Name:\"x\"}}} }]\n";
        fs::write(botania.join("one.snbt"), quest).unwrap();
        fs::write(botania.join("two.snbt"), quest).unwrap();

        let report = quiet_instance(config.clone()).extract_items().unwrap();

        assert_eq!(
            fs::read_to_string(&config.items.ids_output).unwrap(),
            "botania:petal\nbotania:petal\n"
        );
        assert_eq!(
            fs::read_to_string(&config.items.full_output).unwrap(),
            "{id:\"botania:rune\", tag:{display:{Name:\"x\"}}}\n\
             {id:\"botania:rune\", tag:{display:{Name:\"x\"}}}\n"
        );
        assert_eq!(report.outputs.len(), 2);
        assert_eq!(report.records, 4);
    }

    #[test]
    fn test_organize_and_rerun() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.organize.source = temp_dir.path().join("chapters");
        config.organize.destination = temp_dir.path().join("organized_quests");
        fs::create_dir_all(&config.organize.source).unwrap();

        fs::write(
            config.organize.source.join("a.snbt"),
            "item: \"modA:thing\"\nitem: \"modB:other\"\n",
        )
        .unwrap();
        fs::write(config.organize.source.join("b.snbt"), "title: \"none\"\n").unwrap();

        let report = quiet_instance(config.clone()).organize_quests().unwrap();
        assert_eq!(report.moves.len(), 1);
        assert_eq!(report.moves[0].mod_name, "modA");
        assert_eq!(report.skipped[0].reason, SkipReason::NoModName);
        assert!(config.organize.destination.join("modA/a.snbt").exists());
        assert!(config.organize.source.join("b.snbt").exists());

        fs::write(config.organize.source.join("c.snbt"), "item: \"modA:more\"\n").unwrap();
        let report = quiet_instance(config.clone()).organize_quests().unwrap();
        assert_eq!(report.moves.len(), 1);
        assert!(config.organize.destination.join("modA/c.snbt").exists());
    }

    #[test]
    fn test_organize_collision_skips_and_continues() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.organize.source = temp_dir.path().join("chapters");
        config.organize.destination = temp_dir.path().join("organized_quests");
        fs::create_dir_all(&config.organize.source).unwrap();
        fs::create_dir_all(config.organize.destination.join("modA")).unwrap();

        fs::write(config.organize.source.join("a.snbt"), "item: \"modA:x\"\n").unwrap();
        fs::write(config.organize.source.join("b.snbt"), "item: \"modA:y\"\n").unwrap();
        fs::write(config.organize.destination.join("modA/a.snbt"), "sorted\n").unwrap();

        let report = quiet_instance(config.clone()).organize_quests().unwrap();

        assert_eq!(report.moves.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].reason, SkipReason::Collision);
        assert!(report.has_collisions());
        assert!(config.organize.source.join("a.snbt").exists());
        assert!(config.organize.destination.join("modA/b.snbt").exists());
    }

    #[test]
    fn test_recursive_organize_skips_destination() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.organize.source = temp_dir.path().to_path_buf();
        config.organize.destination = temp_dir.path().join("organized_quests");
        config.organize.recursive = true;

        let sorted = config.organize.destination.join("minecraft");
        fs::create_dir_all(&sorted).unwrap();
        fs::write(sorted.join("old.snbt"), "item: \"minecraft:stone\"\n").unwrap();
        fs::create_dir_all(temp_dir.path().join("chapter1")).unwrap();
        fs::write(
            temp_dir.path().join("chapter1/new.snbt"),
            "item: \"minecraft:dirt\"\n",
        )
        .unwrap();

        let report = quiet_instance(config).organize_quests().unwrap();

        assert_eq!(report.files_scanned, 1);
        assert!(sorted.join("new.snbt").exists());
        assert!(sorted.join("old.snbt").exists());
    }

    #[test]
    fn test_rewards_dry_run_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.rewards.output_dir = temp_dir.path().join("quests");

        let report = quiet_instance(config.clone())
            .with_dry_run(true)
            .generate_rewards()
            .unwrap();

        assert_eq!(report.generated.len(), 14);
        assert!(report.dry_run);
        assert!(!config.rewards.output_dir.exists());
    }

    #[test]
    fn test_sample_config_generation() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("sample.toml");

        PackScribe::generate_sample_config(&config_path).unwrap();

        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("[loot]"));
        assert!(content.contains("[emit]"));
    }
}
