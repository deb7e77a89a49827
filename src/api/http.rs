//! HTTP transport for the OTG REST API.

use super::OtgApi;
use crate::error::{OtgenError, Result};
use crate::otg::{ApiError, ApiResponse, ControlState, MetricsRequest, ResponseWarning};
use reqwest::blocking::Client;
use serde::Serialize;
use tracing::{debug, trace};

const PATH_CONFIG: &str = "/config";
const PATH_CONTROL_STATE: &str = "/control/state";
const PATH_METRICS: &str = "/monitor/metrics";

/// What a successful (2xx) body is expected to contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Warning,
    Metrics,
}

pub struct HttpApi {
    client: Client,
    base: String,
}

impl HttpApi {
    /// `verify = false` skips X.509 validation of the endpoint certificate.
    pub fn new(location: &str, verify: bool) -> Result<Self> {
        let client = Client::builder()
            .danger_accept_invalid_certs(!verify)
            .build()?;
        Ok(HttpApi {
            client,
            base: location.trim_end_matches('/').to_string(),
        })
    }

    fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        kind: ResponseKind,
    ) -> Result<ApiResponse> {
        let url = format!("{}{}", self.base, path);
        debug!(%url, "POST");
        let transport = |source| OtgenError::Transport {
            endpoint: url.clone(),
            source,
        };
        let resp = self.client.post(&url).json(body).send().map_err(transport)?;
        let status = resp.status().as_u16();
        let text = resp.text().map_err(transport)?;
        trace!(status, body = %text, "response");
        decode_response(status, &text, kind)
    }
}

impl OtgApi for HttpApi {
    fn set_config(&mut self, config: &serde_json::Value) -> Result<ApiResponse> {
        self.post(PATH_CONFIG, config, ResponseKind::Warning)
    }

    fn set_control_state(&mut self, state: &ControlState) -> Result<ApiResponse> {
        self.post(PATH_CONTROL_STATE, state, ResponseKind::Warning)
    }

    fn get_metrics(&mut self, req: &MetricsRequest) -> Result<ApiResponse> {
        self.post(PATH_METRICS, req, ResponseKind::Metrics)
    }
}

/// 将 HTTP 状态码与响应体解码为 [`ApiResponse`]。
pub fn decode_response(status: u16, body: &str, kind: ResponseKind) -> Result<ApiResponse> {
    if !(200..300).contains(&status) {
        return Ok(ApiResponse::Error(decode_error(status, body)));
    }
    match kind {
        ResponseKind::Metrics => Ok(ApiResponse::Metrics(serde_json::from_str(body)?)),
        ResponseKind::Warning if body.trim().is_empty() => {
            Ok(ApiResponse::Warning(ResponseWarning::default()))
        }
        ResponseKind::Warning => Ok(ApiResponse::Warning(serde_json::from_str(body)?)),
    }
}

fn decode_error(status: u16, body: &str) -> ApiError {
    match serde_json::from_str::<ApiError>(body) {
        Ok(mut e) if !e.errors.is_empty() => {
            if e.code == 0 {
                e.code = i32::from(status);
            }
            e
        }
        _ => ApiError {
            code: i32::from(status),
            kind: None,
            errors: vec![if body.trim().is_empty() {
                format!("HTTP status {status}")
            } else {
                body.trim().to_string()
            }],
        },
    }
}
