use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemAvailConfig {
    #[serde(default)]
    pub sources: SourceConfig,

    /// Bytes per page.  Queried from the system when unset.
    #[serde(default)]
    pub page_size: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_zoneinfo")]
    pub zoneinfo: String,

    #[serde(default = "default_meminfo")]
    pub meminfo: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            zoneinfo: default_zoneinfo(),
            meminfo: default_meminfo(),
        }
    }
}

fn default_zoneinfo() -> String {
    "/proc/zoneinfo".into()
}

fn default_meminfo() -> String {
    "/proc/meminfo".into()
}

/// Parse a TOML config, warning about (but accepting) unknown keys.
pub fn parse_config(text: &str) -> Result<MemAvailConfig> {
    let de = toml::Deserializer::new(text);
    let mut unknown = Vec::new();
    let config: MemAvailConfig = serde_ignored::deserialize(de, |path| {
        unknown.push(path.to_string());
    })
    .context("parsing memavail config")?;
    for key in &unknown {
        tracing::warn!("unknown config key: {key}");
    }
    Ok(config)
}

pub fn load_config(path: &str) -> Result<MemAvailConfig> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading config {path}"))?;
    parse_config(&text)
}
