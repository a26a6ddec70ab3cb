use anyhow::Context;
use clap::Parser;
use packscribe::{
    Cli, Command, OutputFormatter, OutputMode, PackScribe, PackScribeError, RunReport,
    UserFriendlyError,
};
use std::path::Path;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    let exit_code = run();
    process::exit(exit_code);
}

fn run() -> i32 {
    let cli = Cli::parse();

    if let Err(e) = setup_logging(cli.verbose, cli.quiet) {
        eprintln!("Failed to initialize logging: {:#}", e);
    }

    // Handle special commands first
    if let Command::InitConfig { path, force } = &cli.command {
        return handle_init_config(path, *force);
    }

    let packscribe = match PackScribe::from_cli(&cli) {
        Ok(packscribe) => packscribe,
        Err(e) => {
            print_startup_error(&e);
            return exit_code(&e);
        }
    };

    if packscribe.is_dry_run() {
        packscribe
            .output_formatter()
            .info("DRY RUN MODE - nothing will be written or moved");
    }

    match packscribe.run(&cli.command) {
        Ok(report) => {
            packscribe.output_formatter().print_run_report(&report);
            report_exit_code(&report)
        }
        Err(e) => {
            tracing::error!(error = %e, command = cli.command.name(), "command failed");
            packscribe.handle_error(&e);
            exit_code(&e)
        }
    }
}

fn report_exit_code(report: &RunReport) -> i32 {
    if report.has_collisions() {
        4 // Some targets already existed under the fail policy
    } else if report.has_issues() {
        2 // Success with skipped files or warnings
    } else {
        0
    }
}

fn exit_code(error: &PackScribeError) -> i32 {
    match error {
        PackScribeError::RootNotFound { .. } | PackScribeError::NotADirectory { .. } => 3,
        PackScribeError::OutputExists { .. } => 4,
        PackScribeError::Config { .. } => 5,
        _ => 1,
    }
}

fn handle_init_config(path: &Path, force: bool) -> i32 {
    if path.exists() && !force {
        let error = PackScribeError::OutputExists {
            path: path.display().to_string(),
        };
        print_startup_error(&error);
        return exit_code(&error);
    }

    match PackScribe::generate_sample_config(path) {
        Ok(()) => {
            println!("Generated sample configuration file: {}", path.display());
            println!("\nTo use this configuration:");
            println!("  packscribe --config {} <COMMAND>", path.display());
            println!("\nEdit the file to customize settings for your modpack.");
            0
        }
        Err(e) => {
            eprintln!("Failed to generate configuration file: {}", e.user_message());
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            1
        }
    }
}

fn print_startup_error(error: &PackScribeError) {
    let formatter = OutputFormatter::new(OutputMode::Human, 0, false);
    formatter.print_user_friendly_error(error);
}

/// Diagnostics go to stderr; `RUST_LOG` wins over the verbosity flags.
fn setup_logging(verbose: u8, quiet: bool) -> anyhow::Result<()> {
    let default_level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("packscribe={}", default_level)))
        .context("invalid log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_init_config_command() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("packscribe.toml");

        assert_eq!(handle_init_config(&config_path, false), 0);
        assert!(config_path.exists());

        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("[organize]"));
    }

    #[test]
    fn test_init_config_refuses_to_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("packscribe.toml");
        fs::write(&config_path, "# mine").unwrap();

        assert_eq!(handle_init_config(&config_path, false), 4);
        assert_eq!(fs::read_to_string(&config_path).unwrap(), "# mine");

        assert_eq!(handle_init_config(&config_path, true), 0);
        assert!(fs::read_to_string(&config_path).unwrap().contains("[loot]"));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            exit_code(&PackScribeError::RootNotFound {
                path: "loot_tables".to_string()
            }),
            3
        );
        assert_eq!(
            exit_code(&PackScribeError::OutputExists {
                path: "out.txt".to_string()
            }),
            4
        );
        assert_eq!(
            exit_code(&PackScribeError::Config {
                message: "bad".to_string()
            }),
            5
        );
        assert_eq!(
            exit_code(&PackScribeError::Walk {
                message: "loop".to_string()
            }),
            1
        );
    }

    #[test]
    fn test_report_exit_code() {
        let mut report = RunReport::new("loot", Path::new("loot_tables"), false);
        assert_eq!(report_exit_code(&report), 0);

        report.warn("Permission denied: loot_tables/locked");
        assert_eq!(report_exit_code(&report), 2);

        report.skip(
            Path::new("chapters/q1.snbt"),
            &PackScribeError::OutputExists {
                path: "organized_quests/botania/q1.snbt".to_string(),
            },
        );
        assert_eq!(report_exit_code(&report), 4);
    }
}
