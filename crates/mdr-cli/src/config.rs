//! `mdr.toml` configuration.
//!
//! ```toml
//! author = "jdoe"
//!
//! [store]
//! path = "mdr-store.json"
//!
//! [cache]
//! capacity = 1000
//! ttl_secs = 60
//! enabled = true
//!
//! [[libraries]]
//! name = "Sponsor"
//! editable = true
//! ```
//!
//! Every key is optional. Listing `[[libraries]]` replaces the default set.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use mdr_model::Library;
use mdr_repository::CacheConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MdrConfig {
    /// Author id recorded when `--author` is not given.
    pub author: Option<String>,
    pub store: StoreSection,
    pub cache: CacheSection,
    /// Libraries registered in every store opened with this configuration.
    pub libraries: Vec<LibrarySection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreSection {
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheSection {
    pub capacity: usize,
    pub ttl_secs: u64,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LibrarySection {
    pub name: String,
    #[serde(default = "default_editable")]
    pub editable: bool,
}

fn default_editable() -> bool {
    true
}

impl Default for MdrConfig {
    fn default() -> Self {
        Self {
            author: None,
            store: StoreSection::default(),
            cache: CacheSection::default(),
            libraries: vec![
                LibrarySection {
                    name: "Sponsor".to_string(),
                    editable: true,
                },
                LibrarySection {
                    name: "CDISC".to_string(),
                    editable: false,
                },
            ],
        }
    }
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            path: PathBuf::from("mdr-store.json"),
        }
    }
}

impl Default for CacheSection {
    fn default() -> Self {
        let defaults = CacheConfig::default();
        Self {
            capacity: defaults.capacity,
            ttl_secs: defaults.ttl.as_secs(),
            enabled: defaults.enabled,
        }
    }
}

impl MdrConfig {
    /// Loads the configuration at `path`; `None` or a missing file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "config file not found, using defaults");
                return Ok(Self::default());
            }
            Err(error) => {
                return Err(error)
                    .with_context(|| format!("failed to read config {}", path.display()));
            }
        };
        let config = Self::parse(&text)
            .with_context(|| format!("invalid config {}", path.display()))?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            capacity: self.cache.capacity,
            ttl: Duration::from_secs(self.cache.ttl_secs),
            enabled: self.cache.enabled,
        }
    }

    pub fn libraries(&self) -> impl Iterator<Item = Library> + '_ {
        self.libraries
            .iter()
            .map(|library| Library::from_repository_values(library.name.clone(), library.editable))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = MdrConfig::default();
        assert_eq!(config.store.path, PathBuf::from("mdr-store.json"));
        assert_eq!(config.cache.capacity, 1000);
        assert_eq!(config.cache_config().ttl, Duration::from_secs(60));
        let libraries: Vec<String> = config
            .libraries()
            .map(|l| format!("{} editable={}", l.name, l.is_editable))
            .collect();
        insta::assert_snapshot!(libraries.join("\n"), @r"
        Sponsor editable=true
        CDISC editable=false
        ");
    }

    #[test]
    fn test_parse_partial_config() {
        let config = MdrConfig::parse(
            r#"
            author = "jdoe"

            [cache]
            ttl_secs = 5

            [[libraries]]
            name = "Internal"
            "#,
        )
        .unwrap();
        assert_eq!(config.author.as_deref(), Some("jdoe"));
        assert_eq!(config.cache.ttl_secs, 5);
        assert_eq!(config.cache.capacity, 1000);
        assert!(config.cache.enabled);
        assert_eq!(
            config.libraries,
            vec![LibrarySection {
                name: "Internal".into(),
                editable: true,
            }]
        );
        assert_eq!(config.store, StoreSection::default());
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(MdrConfig::parse("[store]\nfile = \"x.json\"\n").is_err());
    }

    #[test]
    fn test_missing_file_means_defaults() {
        let dir = tempdir().unwrap();
        let config = MdrConfig::load(Some(&dir.path().join("mdr.toml"))).unwrap();
        assert_eq!(config, MdrConfig::default());
        assert_eq!(MdrConfig::load(None).unwrap(), MdrConfig::default());
    }

    #[test]
    fn test_invalid_file_names_the_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mdr.toml");
        fs::write(&path, "author = 5\n").unwrap();
        let err = MdrConfig::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("invalid config"));
    }
}
