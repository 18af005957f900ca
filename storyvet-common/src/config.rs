//! Configuration loading and data directory resolution

use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "STORYVET_DATA_DIR";

/// Database file name inside the data directory
const DATABASE_FILE: &str = "storyvet.db";

/// Resolve the data directory, in priority order:
/// 1. Command-line argument (highest priority)
/// 2. `STORYVET_DATA_DIR` environment variable
/// 3. `data_dir` key in the TOML config file
/// 4. OS-dependent default (fallback)
pub fn resolve_data_dir(cli_arg: Option<&Path>) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(DATA_DIR_ENV) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = data_dir_from_config_file() {
        return path;
    }

    default_data_dir()
}

/// Path of the SQLite database inside the data directory
pub fn database_path(data_dir: &Path) -> PathBuf {
    data_dir.join(DATABASE_FILE)
}

/// Read `data_dir` from the platform config file, if one exists
fn data_dir_from_config_file() -> Option<PathBuf> {
    let config_path = dirs::config_dir()?.join("storyvet").join("config.toml");
    let content = std::fs::read_to_string(&config_path).ok()?;
    let config = toml::from_str::<toml::Value>(&content).ok()?;
    config
        .get("data_dir")
        .and_then(|v| v.as_str())
        .map(PathBuf::from)
}

/// OS-dependent default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("storyvet"))
        .unwrap_or_else(|| PathBuf::from("./storyvet_data"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_arg_wins() {
        let dir = resolve_data_dir(Some(Path::new("/tmp/storyvet-test")));
        assert_eq!(dir, PathBuf::from("/tmp/storyvet-test"));
    }

    #[test]
    fn test_database_path_appends_file_name() {
        let path = database_path(Path::new("/var/lib/storyvet"));
        assert_eq!(path, PathBuf::from("/var/lib/storyvet/storyvet.db"));
    }
}
