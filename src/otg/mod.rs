//! Open Traffic Generator 数据模型
//!
//! 配置文档、控制请求、指标请求/响应，以及文档的读写。

mod config;
mod control;
mod document;
mod metrics;
mod num;

pub use config::{
    BgpAsType, BgpV4Interface, BgpV4Peer, BgpV4RouteRange, ConnectionChoice, Config, Device,
    DeviceBgp, DeviceEthernet, DeviceIpv4, DurationChoice, EthernetConnection, Extra,
    FixedPackets, Flow, FlowDuration, FlowHeader, FlowLatency, FlowMetricsConfig, FlowPort,
    FlowRate, FlowRouter, FlowSize, FlowTxRx, HeaderEthernet, HeaderIp, HeaderL4, LatencyMode,
    NextHopMode, Pattern, PatternChoice, PatternCounter, Port, RateChoice, RouterMode,
    SizeChoice, TxRxChoice, V4RouteAddress,
};
pub use control::{ControlState, MetricKind, MetricsRequest, State};
pub use document::{DocFormat, parse_config, parse_value, read_source, to_yaml};
pub use metrics::{
    ApiError, ApiResponse, Bgpv4Metric, FlowMetric, FlowTransmit, MetricsResponse, PortMetric,
    ResponseWarning, SessionState,
};
