use bridgemark_engine::{FormatterOptions, InMemoryDirectory};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to read directory fixture at {directory_path}: {source}")]
    DirectoryReadError {
        directory_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse directory fixture at {directory_path}: {source}")]
    DirectoryParseError {
        directory_path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Optional TOML fixture describing users, puppets, portals and messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,

    #[serde(default)]
    pub formatter: FormatterOptions,
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        config.directory = config
            .directory
            .map(|path| expand_path(&path).unwrap_or(path));

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        Self::load_from_path(Self::config_path())
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(config_path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/bridgemark");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// Loads the configured directory fixture, or an empty directory when
    /// none is configured.
    pub fn load_directory(&self) -> Result<InMemoryDirectory, ConfigError> {
        match &self.directory {
            Some(path) => load_directory(path),
            None => Ok(InMemoryDirectory::default()),
        }
    }
}

/// Reads a directory fixture from TOML.
pub fn load_directory<P: AsRef<Path>>(directory_path: P) -> Result<InMemoryDirectory, ConfigError> {
    let directory_path = expand_path(directory_path.as_ref())
        .unwrap_or_else(|| directory_path.as_ref().to_path_buf());

    let content = std::fs::read_to_string(&directory_path).map_err(|source| {
        ConfigError::DirectoryReadError {
            directory_path: directory_path.clone(),
            source,
        }
    })?;

    toml::from_str(&content).map_err(|source| ConfigError::DirectoryParseError {
        directory_path,
        source,
    })
}

/// Expands `~` and environment variables. `None` if a variable is unset.
pub fn expand_path(path: &Path) -> Option<PathBuf> {
    let path_str = path.to_string_lossy();
    shellexpand::full(&path_str)
        .ok()
        .map(|expanded| PathBuf::from(expanded.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridgemark_engine::{Directory, MessageHistory, PortalKey};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const FIXTURE: &str = r##"
[[users]]
mxid = "@alice:example.org"
discord_id = "1001"

[[puppets]]
discord_id = "2001"
mxid = "@_discord_2001:example.org"
display_name = "Bob"

[[portals]]
room_id = "!general:example.org"
guild_id = "9001"
name = "general"
key = { channel_id = "3001" }

[[messages]]
discord_id = "4001"
channel_id = "3001"
mxid = "$event"

[aliases]
"#general:example.org" = "!general:example.org"
"##;

    #[test]
    fn config_path_lives_under_dot_config() {
        let path = Config::config_path();
        let path_str = path.to_string_lossy();
        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/bridgemark/config.toml"));
    }

    #[test]
    fn missing_config_file_is_not_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = Config::load_from_path(temp_dir.path().join("absent.toml")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn empty_config_uses_formatter_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.formatter, FormatterOptions::default());
        assert_eq!(config.directory, None);
    }

    #[test]
    fn partial_formatter_section_keeps_other_defaults() {
        let config: Config = toml::from_str(
            r#"
[formatter]
tab_width = 2
private_channel_placeholder = "dm"
"#,
        )
        .unwrap();
        assert_eq!(config.formatter.tab_width, 2);
        assert_eq!(config.formatter.private_channel_placeholder, "dm");
        assert_eq!(
            config.formatter.permalink_base,
            "https://discord.com/channels"
        );
    }

    #[test]
    fn save_then_load_preserves_settings() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested").join("config.toml");
        let mut config = Config {
            directory: Some(PathBuf::from("/srv/bridge/directory.toml")),
            ..Config::default()
        };
        config.formatter.horizontal_rule = "\n***\n".to_string();

        config.save_to_path(&config_file).unwrap();
        let loaded = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded.directory, config.directory);
        assert_eq!(loaded.formatter, config.formatter);
    }

    #[test]
    fn directory_path_is_expanded_on_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "directory = \"~/bridge/directory.toml\"\n").unwrap();

        let config = Config::load_from_path(&config_file).unwrap().unwrap();
        let directory = config.directory.unwrap();
        assert!(!directory.to_string_lossy().starts_with('~'));
        assert!(directory.ends_with("bridge/directory.toml"));
    }

    #[test]
    fn invalid_toml_reports_the_path() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "[formatter\ntab_width = ").unwrap();

        let err = Config::load_from_path(&config_file).unwrap_err();
        assert!(matches!(err, ConfigError::ConfigParseError { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn directory_fixture_loads_all_tables() {
        let temp_dir = TempDir::new().unwrap();
        let fixture = temp_dir.path().join("directory.toml");
        std::fs::write(&fixture, FIXTURE).unwrap();

        let config = Config {
            directory: Some(fixture),
            ..Config::default()
        };
        let directory = config.load_directory().unwrap();

        assert_eq!(
            directory.resolve_alias("#general:example.org").unwrap(),
            Some("!general:example.org".to_string())
        );
        let portal = directory
            .portal_by_room_id("!general:example.org")
            .unwrap()
            .unwrap();
        assert_eq!(portal.channel_id(), "3001");
        assert_eq!(
            directory
                .puppet_by_discord_id("2001")
                .unwrap()
                .and_then(|p| p.display_name),
            Some("Bob".to_string())
        );
        assert!(
            directory
                .message_by_event_id(&PortalKey::new("3001"), "$event")
                .unwrap()
                .is_some()
        );
    }

    #[test]
    fn no_configured_directory_is_empty() {
        let directory = Config::default().load_directory().unwrap();
        assert!(directory.puppet_by_mxid("@x:example.org").unwrap().is_none());
    }

    #[test]
    fn missing_directory_fixture_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = load_directory(temp_dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::DirectoryReadError { .. }));
    }
}
