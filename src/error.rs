//! 错误类型
//!
//! otgen 所有可失败操作统一返回 [`Result`]，由二进制入口记录日志并以退出码 1 结束。

use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, OtgenError>;

#[derive(Debug, Error)]
pub enum OtgenError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Bad flag value or flag combination.
    #[error("{0}")]
    InvalidArgument(String),

    #[error("No such {kind} in the provided OTG configuration: {name}")]
    NotFound { kind: &'static str, name: String },

    /// The OTG endpoint could not be reached or returned an unreadable body.
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The OTG endpoint reported an error.
    #[error("OTG API error (code {code}): {}", api_detail(.kind, .errors))]
    Api {
        code: i32,
        kind: Option<String>,
        errors: Vec<String>,
    },

    #[error("unexpected response from OTG API, expected {expected}")]
    UnexpectedResponse { expected: &'static str },

    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

fn api_detail(kind: &Option<String>, errors: &[String]) -> String {
    match kind {
        Some(kind) => format!("{kind}: {}", errors.join("; ")),
        None => errors.join("; "),
    }
}

impl OtgenError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        OtgenError::InvalidArgument(msg.into())
    }
}
