use thiserror::Error;

#[derive(Error, Debug)]
pub enum PackScribeError {
    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Scan root not found: {path}")]
    RootNotFound { path: String },

    #[error("Scan root is not a directory: {path}")]
    NotADirectory { path: String },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Failed to read {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No mod name could be identified in {path}")]
    ClassificationMiss { path: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Output already exists: {path}")]
    OutputExists { path: String },

    #[error("Path validation failed: {path}")]
    InvalidPath { path: String },

    #[error("Directory walk failed: {message}")]
    Walk { message: String },
}

impl PackScribeError {
    /// Errors scoped to one candidate file. The walk records them as skipped
    /// files and moves on; any other error ends the command.
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            PackScribeError::Parse { .. }
                | PackScribeError::Read { .. }
                | PackScribeError::ClassificationMiss { .. }
                | PackScribeError::OutputExists { .. }
                | PackScribeError::InvalidPath { .. }
        )
    }
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for PackScribeError {
    fn user_message(&self) -> String {
        match self {
            PackScribeError::RootNotFound { path } => {
                format!("Directory to scan does not exist: {}", path)
            }
            PackScribeError::NotADirectory { path } => {
                format!("Expected a directory but found a file: {}", path)
            }
            PackScribeError::Parse { path, message } => {
                format!("Could not parse {}: {}", path, message)
            }
            PackScribeError::Read { path, source } => {
                format!("Could not read {}: {}", path, source)
            }
            PackScribeError::ClassificationMiss { path } => {
                format!("No mod name found in: {}", path)
            }
            PackScribeError::Config { message } => {
                format!("Configuration error: {}", message)
            }
            PackScribeError::OutputExists { path } => {
                format!("Refusing to overwrite existing file: {}", path)
            }
            PackScribeError::InvalidPath { path } => {
                format!("Invalid file path: {}", path)
            }
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            PackScribeError::RootNotFound { .. } => Some(
                "Check the --root/--source path, or run from the folder that contains the dump directory.".to_string()
            ),
            PackScribeError::NotADirectory { .. } => Some(
                "Point the command at the folder containing the files, not at a single file.".to_string()
            ),
            PackScribeError::Config { .. } => Some(
                "Check your configuration file syntax. Run `packscribe init-config` to generate a fresh sample.".to_string()
            ),
            PackScribeError::OutputExists { .. } => Some(
                "Remove the existing file, pick another output path, or use --policy overwrite or --policy version.".to_string()
            ),
            PackScribeError::ClassificationMiss { .. } => Some(
                "The file has no `item: \"mod:name\"` field. Move it by hand or add an item entry.".to_string()
            ),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for PackScribeError {
    fn from(error: toml::de::Error) -> Self {
        PackScribeError::Config {
            message: error.to_string(),
        }
    }
}

impl From<walkdir::Error> for PackScribeError {
    fn from(error: walkdir::Error) -> Self {
        PackScribeError::Walk {
            message: error.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PackScribeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_friendly_messages() {
        let error = PackScribeError::RootNotFound {
            path: "loot_tables".to_string(),
        };
        assert!(error.user_message().contains("does not exist"));
        assert!(error.suggestion().is_some());
    }

    #[test]
    fn test_per_file_classification() {
        let parse = PackScribeError::Parse {
            path: "a.json".to_string(),
            message: "expected value".to_string(),
        };
        assert!(parse.is_per_file());

        let collision = PackScribeError::OutputExists {
            path: "organized_quests/minecraft/a.snbt".to_string(),
        };
        assert!(collision.is_per_file());

        let root = PackScribeError::RootNotFound {
            path: "missing".to_string(),
        };
        assert!(!root.is_per_file());

        let io = PackScribeError::Io(std::io::Error::other("disk full"));
        assert!(!io.is_per_file());
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_error = toml::from_str::<toml::Value>("= broken").unwrap_err();
        let error = PackScribeError::from(toml_error);
        assert!(matches!(error, PackScribeError::Config { .. }));
    }
}
