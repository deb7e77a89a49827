//! 读写 OTG 文档（YAML 默认，JSON 可选；来源为文件或 stdin）

use super::Config;
use crate::error::Result;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocFormat {
    /// YAML is a superset of JSON, so this accepts both.
    #[default]
    Yaml,
    Json,
}

/// Read the whole document from `path`, or from stdin when `path` is `None`.
pub fn read_source(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => {
            debug!(path = %path.display(), "reading OTG document from file");
            Ok(fs::read_to_string(path)?)
        }
        None => {
            debug!("reading OTG document from stdin");
            let mut raw = String::new();
            io::stdin().read_to_string(&mut raw)?;
            Ok(raw)
        }
    }
}

/// Parse a document into a generic JSON value, untouched for submission.
pub fn parse_value(raw: &str, format: DocFormat) -> Result<serde_json::Value> {
    let value = match format {
        DocFormat::Yaml => serde_yaml::from_str(raw)?,
        DocFormat::Json => serde_json::from_str(raw)?,
    };
    Ok(value)
}

pub fn parse_config(raw: &str, format: DocFormat) -> Result<Config> {
    // An empty stdin is an empty configuration, not an error.
    if raw.trim().is_empty() {
        return Ok(Config::default());
    }
    let config = match format {
        DocFormat::Yaml => serde_yaml::from_str(raw)?,
        DocFormat::Json => serde_json::from_str(raw)?,
    };
    Ok(config)
}

pub fn to_yaml(config: &Config) -> Result<String> {
    Ok(serde_yaml::to_string(config)?)
}
