//! Configuration loading and persistence

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{DtsError, DtsResult};

use super::types::{Config, CONFIG_FILE_NAME};

/// Non-fatal configuration warning (e.g. an unknown key)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub key: String,
    pub file: PathBuf,
    pub line: Option<usize>,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.line {
            Some(line) => write!(f, "unknown key '{}' in {}:{}", self.key, self.file.display(), line),
            None => write!(f, "unknown key '{}' in {}", self.key, self.file.display()),
        }
    }
}

/// Parse config JSON, collecting unknown keys as warnings.
///
/// `file` is only used for error and warning attribution.
pub fn from_json_with_warnings(json: &str, file: &Path) -> DtsResult<(Config, Vec<ConfigWarning>)> {
    let mut unknown_paths: Vec<String> = Vec::new();
    let mut deserializer = serde_json::Deserializer::from_str(json);

    let mut config: Config = serde_ignored::deserialize(&mut deserializer, |p| {
        unknown_paths.push(p.to_string());
    })
    .map_err(|e| DtsError::InvalidConfig {
        file: file.to_path_buf(),
        message: e.to_string(),
    })?;
    deserializer.end().map_err(|e| DtsError::InvalidConfig {
        file: file.to_path_buf(),
        message: e.to_string(),
    })?;

    config.normalize();
    config.validate().map_err(|message| DtsError::InvalidConfig {
        file: file.to_path_buf(),
        message,
    })?;

    let warnings = unknown_paths
        .into_iter()
        .map(|path_str| {
            let key = path_str
                .split('.')
                .next_back()
                .unwrap_or(path_str.as_str())
                .to_string();
            ConfigWarning {
                line: find_line_number(json, &key),
                key,
                file: file.to_path_buf(),
            }
        })
        .collect();

    Ok((config, warnings))
}

/// Load a config file, collecting non-fatal warnings
pub fn load_with_warnings(path: &Path) -> DtsResult<(Config, Vec<ConfigWarning>)> {
    let content = fs::read_to_string(path).map_err(|source| DtsError::ReadFailed {
        file: path.to_path_buf(),
        source,
    })?;
    from_json_with_warnings(&content, path)
}

/// Load the config file in `base_dir`, or defaults.
///
/// A missing file gives defaults silently; an unreadable or invalid file
/// gives defaults with a logged warning.
pub fn load_or_default(base_dir: &Path) -> Config {
    let path = base_dir.join(CONFIG_FILE_NAME);
    match load_with_warnings(&path) {
        Ok((config, warnings)) => {
            for warning in &warnings {
                warn!("{warning}");
            }
            config
        }
        Err(DtsError::ReadFailed { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
            Config::default()
        }
        Err(err) => {
            warn!("{err}; using defaults");
            Config::default()
        }
    }
}

fn find_line_number(content: &str, key: &str) -> Option<usize> {
    let quoted = format!("\"{key}\"");
    content
        .lines()
        .position(|line| line.contains(&quoted))
        .map(|i| i + 1)
}

impl Config {
    /// Parse config JSON, ignoring warnings
    pub fn from_json(json: &str) -> DtsResult<Self> {
        from_json_with_warnings(json, Path::new(CONFIG_FILE_NAME)).map(|(config, _)| config)
    }

    /// Load from a file path
    pub fn load(path: &Path) -> DtsResult<Self> {
        load_with_warnings(path).map(|(config, _)| config)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Write as JSON to `path`
    pub fn save(&self, path: &Path) -> DtsResult<()> {
        let mut json = self.to_json();
        json.push('\n');
        fs::write(path, json)?;
        Ok(())
    }
}
