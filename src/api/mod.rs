//! OTG API 客户端抽象
//!
//! 编排器只依赖 [`OtgApi`]；生产环境使用 [`HttpApi`]，测试中用脚本化实现替换。

mod http;

pub use http::{HttpApi, ResponseKind, decode_response};

use crate::error::{OtgenError, Result};
use crate::otg::{ApiResponse, ControlState, MetricsRequest, MetricsResponse};
use tracing::warn;

/// Remote calls the run orchestrator needs.
pub trait OtgApi {
    fn set_config(&mut self, config: &serde_json::Value) -> Result<ApiResponse>;
    fn set_control_state(&mut self, state: &ControlState) -> Result<ApiResponse>;
    fn get_metrics(&mut self, req: &MetricsRequest) -> Result<ApiResponse>;
}

impl ApiResponse {
    /// Accept a warning response, logging each warning. Errors become `Err`.
    pub fn into_ack(self) -> Result<()> {
        match self {
            ApiResponse::Warning(w) => {
                for msg in &w.warnings {
                    warn!("WARNING: {msg}");
                }
                Ok(())
            }
            ApiResponse::Error(e) => Err(e.into()),
            ApiResponse::Metrics(_) => Err(OtgenError::UnexpectedResponse {
                expected: "a warning response",
            }),
        }
    }

    pub fn into_metrics(self) -> Result<MetricsResponse> {
        match self {
            ApiResponse::Metrics(m) => Ok(m),
            ApiResponse::Error(e) => Err(e.into()),
            ApiResponse::Warning(_) => Err(OtgenError::UnexpectedResponse {
                expected: "a metrics response",
            }),
        }
    }
}

impl From<crate::otg::ApiError> for OtgenError {
    fn from(e: crate::otg::ApiError) -> Self {
        OtgenError::Api {
            code: e.code,
            kind: e.kind,
            errors: e.errors,
        }
    }
}
