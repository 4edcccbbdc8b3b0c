use std::path::Path;

use crate::error::Error;

/// Name of the project config file, looked up in the working directory.
pub const CONFIG_FILE: &str = ".srcsplice.toml";

/// Default target size limit (16 MiB).
const DEFAULT_MAX_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// Project configuration loaded from `.srcsplice.toml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Write `<target><suffix>` with the original content before replacing.
    pub backup_suffix: Option<String>,
    /// Targets larger than this are rejected before any step runs.
    pub max_file_size: u64,
    /// Refuse to write output that breaks delimiter balance.
    pub verify_balance: bool,
}

/// Raw TOML structure for `.srcsplice.toml`.
#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct SrcspliceTomlConfig {
    #[serde(default)]
    backup_suffix: Option<String>,
    #[serde(default)]
    max_file_size: Option<u64>,
    #[serde(default)]
    verify_balance: Option<bool>,
}

impl Default for Config {
    fn default() -> Self {
        return Self {
            backup_suffix: None,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            verify_balance: true,
        };
    }
}

impl Config {
    /// Load config from `.srcsplice.toml` in the given root directory.
    /// Returns defaults if the file doesn't exist. Returns an error if the file
    /// exists but is malformed; a config the user wrote is never silently ignored.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// `Error::TomlDe` if the TOML is malformed, or `Error::RecipeInvalid`
    /// for an empty backup suffix.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(CONFIG_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::Io(e)),
        };

        let raw: SrcspliceTomlConfig = toml::from_str(&content)?;
        if raw.backup_suffix.as_deref().is_some_and(str::is_empty) {
            return Err(Error::RecipeInvalid {
                file: path,
                reason: "`backup_suffix` must not be empty".to_string(),
            });
        }

        let defaults = Self::default();
        return Ok(Self {
            backup_suffix: raw.backup_suffix,
            max_file_size: raw.max_file_size.unwrap_or(defaults.max_file_size),
            verify_balance: raw.verify_balance.unwrap_or(defaults.verify_balance),
        });
    }
}
