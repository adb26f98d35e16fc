use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

pub const CONFIG_FILE: &str = ".testdeck.toml";

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub runner: RunnerConfig,
    #[serde(default)]
    pub links: LinksConfig,
}

#[derive(Debug, Deserialize)]
pub struct FilterConfig {
    #[serde(default = "default_debounce")]
    pub debounce_ms: u64,
}

impl FilterConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce(),
        }
    }
}

fn default_debounce() -> u64 {
    500
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunnerConfig {
    #[serde(default = "default_dotnet")]
    pub dotnet: String,
    #[serde(default)]
    pub no_build: bool,
    #[serde(default)]
    pub extra_args: Vec<String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            dotnet: default_dotnet(),
            no_build: false,
            extra_args: Vec::new(),
        }
    }
}

fn default_dotnet() -> String {
    "dotnet".to_string()
}

#[derive(Debug, Deserialize)]
pub struct LinksConfig {
    #[serde(default = "default_docs")]
    pub docs: String,
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            docs: default_docs(),
        }
    }
}

fn default_docs() -> String {
    "https://xunit.net/".to_string()
}

impl Config {
    pub fn load(dir: &Path) -> Self {
        let config_path = dir.join(CONFIG_FILE);
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        warn!(path = %config_path.display(), error = %e, "failed to parse config, using defaults");
                    }
                },
                Err(e) => {
                    warn!(path = %config_path.display(), error = %e, "failed to read config, using defaults");
                }
            }
        }
        Config::default()
    }
}
