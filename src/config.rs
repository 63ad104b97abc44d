use crate::store::project_dirs;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Name used in the greeting header.
    pub user_name: Option<String>,
    pub log_level: String,
    /// Explicit store file; skips project/global lookup when set.
    pub store: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            user_name: None,
            log_level: "info".into(),
            store: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = project_dirs()?.config_dir().join("config.yml");
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let data = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
        if data.trim().is_empty() {
            return Ok(Config::default());
        }
        serde_yaml::from_str(&data).with_context(|| format!("parsing config {:?}", path))
    }

    pub fn greeting(&self) -> String {
        match self.user_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => {
                format!("Hey {}, let's design a beautiful day", name)
            }
            _ => "Let's design a beautiful day".to_string(),
        }
    }

    pub fn level_filter(&self) -> log::LevelFilter {
        self.log_level
            .trim()
            .parse()
            .unwrap_or(log::LevelFilter::Info)
    }
}
