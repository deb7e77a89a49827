//! 指标响应模型与 API 响应联合类型
//!
//! 未建模的字段（latency、timestamps、tagged_metrics…）留在 `extra` 中，
//! 打印或透传时原样输出。

use super::config::Extra;
use super::num::{f64_lenient, u64_lenient};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choice: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub port_metrics: Vec<PortMetric>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flow_metrics: Vec<FlowMetric>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bgpv4_metrics: Vec<Bgpv4Metric>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl MetricsResponse {
    pub fn total_frames_tx(&self) -> u64 {
        self.port_metrics.iter().map(|p| p.frames_tx).sum()
    }

    /// True when every reported flow has stopped transmitting.
    pub fn all_flows_stopped(&self) -> bool {
        self.flow_metrics
            .iter()
            .all(|f| f.transmit == Some(FlowTransmit::Stopped))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortMetric {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture: Option<String>,
    #[serde(deserialize_with = "u64_lenient")]
    pub frames_tx: u64,
    #[serde(deserialize_with = "u64_lenient")]
    pub frames_rx: u64,
    #[serde(deserialize_with = "u64_lenient")]
    pub bytes_tx: u64,
    #[serde(deserialize_with = "u64_lenient")]
    pub bytes_rx: u64,
    #[serde(deserialize_with = "f64_lenient")]
    pub frames_tx_rate: f64,
    #[serde(deserialize_with = "f64_lenient")]
    pub frames_rx_rate: f64,
    #[serde(deserialize_with = "f64_lenient")]
    pub bytes_tx_rate: f64,
    #[serde(deserialize_with = "f64_lenient")]
    pub bytes_rx_rate: f64,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowTransmit {
    Started,
    Stopped,
    Paused,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowMetric {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transmit: Option<FlowTransmit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_tx: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_rx: Option<String>,
    #[serde(deserialize_with = "u64_lenient")]
    pub frames_tx: u64,
    #[serde(deserialize_with = "u64_lenient")]
    pub frames_rx: u64,
    #[serde(deserialize_with = "u64_lenient")]
    pub bytes_tx: u64,
    #[serde(deserialize_with = "u64_lenient")]
    pub bytes_rx: u64,
    #[serde(deserialize_with = "f64_lenient")]
    pub frames_tx_rate: f64,
    #[serde(deserialize_with = "f64_lenient")]
    pub frames_rx_rate: f64,
    #[serde(deserialize_with = "f64_lenient")]
    pub loss: f64,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Up,
    Down,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bgpv4Metric {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_state: Option<SessionState>,
    #[serde(deserialize_with = "u64_lenient")]
    pub session_flap_count: u64,
    #[serde(deserialize_with = "u64_lenient")]
    pub routes_advertised: u64,
    #[serde(deserialize_with = "u64_lenient")]
    pub routes_received: u64,
    #[serde(deserialize_with = "u64_lenient")]
    pub route_withdraws_sent: u64,
    #[serde(deserialize_with = "u64_lenient")]
    pub route_withdraws_received: u64,
    #[serde(deserialize_with = "u64_lenient")]
    pub updates_sent: u64,
    #[serde(deserialize_with = "u64_lenient")]
    pub updates_received: u64,
    #[serde(deserialize_with = "u64_lenient")]
    pub opens_sent: u64,
    #[serde(deserialize_with = "u64_lenient")]
    pub opens_received: u64,
    #[serde(deserialize_with = "u64_lenient")]
    pub keepalives_sent: u64,
    #[serde(deserialize_with = "u64_lenient")]
    pub keepalives_received: u64,
    #[serde(deserialize_with = "u64_lenient")]
    pub notifications_sent: u64,
    #[serde(deserialize_with = "u64_lenient")]
    pub notifications_received: u64,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseWarning {
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Error body the endpoint returns with a non-2xx status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub errors: Vec<String>,
}

/// 远端 API 可能返回的三类响应。
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    Metrics(MetricsResponse),
    Warning(ResponseWarning),
    Error(ApiError),
}
