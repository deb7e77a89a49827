//! OTG 配置对象模型（ports / devices / flows）
//!
//! 只建模 otgen 会读写的字段；其余键通过 `extra` 原样保留，保证 `create | add`
//! 管道不会丢失用户已有的配置。

use super::num::{opt_u64_lenient, u64_lenient};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keys this model does not know about, kept verbatim.
pub type Extra = Map<String, Value>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<Port>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub devices: Vec<Device>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flows: Vec<Flow>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Config {
    pub fn port(&self, name: &str) -> Option<&Port> {
        self.ports.iter().find(|p| p.name == name)
    }

    pub fn device(&self, name: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.name == name)
    }

    pub fn device_mut(&mut self, name: &str) -> Option<&mut Device> {
        self.devices.iter_mut().find(|d| d.name == name)
    }

    pub fn flow(&self, name: &str) -> Option<&Flow> {
        self.flows.iter().find(|f| f.name == name)
    }

    /// Devices that run BGP over IPv4: a router id and at least one IPv4 interface.
    pub fn bgp4_devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.iter().filter(|d| {
            d.bgp
                .as_ref()
                .is_some_and(|b| !b.router_id.is_empty() && !b.ipv4_interfaces.is_empty())
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Port {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ethernets: Vec<DeviceEthernet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bgp: Option<DeviceBgp>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Device {
    /// 设备的第一个 IPv4 接口（BGP 与 device flow 都以它为锚点）
    pub fn first_ipv4(&self) -> Option<&DeviceIpv4> {
        self.ethernets.first()?.ipv4_addresses.first()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceEthernet {
    pub name: String,
    #[serde(default)]
    pub mac: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection: Option<EthernetConnection>,
    /// Older model revisions attach the port directly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ipv4_addresses: Vec<DeviceIpv4>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionChoice {
    PortName,
    LagName,
    VxlanName,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EthernetConnection {
    pub choice: ConnectionChoice,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lag_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vxlan_name: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl EthernetConnection {
    pub fn port(name: impl Into<String>) -> Self {
        EthernetConnection {
            choice: ConnectionChoice::PortName,
            port_name: Some(name.into()),
            lag_name: None,
            vxlan_name: None,
            extra: Extra::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceIpv4 {
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub gateway: String,
    #[serde(default = "default_ipv4_prefix")]
    pub prefix: u32,
    #[serde(flatten)]
    pub extra: Extra,
}

fn default_ipv4_prefix() -> u32 {
    24
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceBgp {
    #[serde(default)]
    pub router_id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ipv4_interfaces: Vec<BgpV4Interface>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BgpV4Interface {
    pub ipv4_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub peers: Vec<BgpV4Peer>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BgpAsType {
    Ebgp,
    Ibgp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BgpV4Peer {
    pub name: String,
    pub peer_address: String,
    pub as_type: BgpAsType,
    pub as_number: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub v4_routes: Vec<BgpV4RouteRange>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl BgpV4Peer {
    /// Number of routes this peer is configured to advertise.
    pub fn advertised_routes(&self) -> u64 {
        self.v4_routes
            .iter()
            .flat_map(|rr| rr.addresses.iter())
            .map(|a| u64::from(a.count))
            .sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextHopMode {
    LocalIp,
    Manual,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BgpV4RouteRange {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_hop_mode: Option<NextHopMode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub addresses: Vec<V4RouteAddress>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct V4RouteAddress {
    pub address: String,
    #[serde(default = "default_ipv4_prefix")]
    pub prefix: u32,
    #[serde(default = "one")]
    pub count: u32,
    #[serde(default = "one")]
    pub step: u32,
    #[serde(flatten)]
    pub extra: Extra,
}

fn one() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    pub name: String,
    pub tx_rx: FlowTxRx,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub packet: Vec<FlowHeader>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<FlowSize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<FlowRate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<FlowDuration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<FlowMetricsConfig>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Flow {
    /// Packets to send when the duration is `fixed_packets`, otherwise 0.
    pub fn fixed_packets(&self) -> u64 {
        match &self.duration {
            Some(FlowDuration {
                choice: DurationChoice::FixedPackets,
                fixed_packets: Some(fp),
                ..
            }) => fp.packets,
            _ => 0,
        }
    }

    /// Packet-per-second rate, 0 when the rate is unset or not in pps.
    pub fn pps(&self) -> u64 {
        match &self.rate {
            Some(FlowRate {
                choice: RateChoice::Pps,
                pps: Some(pps),
                ..
            }) => *pps,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxRxChoice {
    Port,
    Device,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowTxRx {
    pub choice: TxRxChoice,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<FlowPort>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<FlowRouter>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl FlowTxRx {
    pub fn ports(tx: impl Into<String>, rx: impl Into<String>) -> Self {
        FlowTxRx {
            choice: TxRxChoice::Port,
            port: Some(FlowPort {
                tx_name: tx.into(),
                rx_name: None,
                rx_names: vec![rx.into()],
                extra: Extra::new(),
            }),
            device: None,
            extra: Extra::new(),
        }
    }

    pub fn devices(tx_names: Vec<String>, rx_names: Vec<String>) -> Self {
        FlowTxRx {
            choice: TxRxChoice::Device,
            port: None,
            device: Some(FlowRouter {
                mode: Some(RouterMode::Mesh),
                tx_names,
                rx_names,
                extra: Extra::new(),
            }),
            extra: Extra::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowPort {
    pub tx_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rx_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rx_names: Vec<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouterMode {
    Mesh,
    OneToOne,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowRouter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<RouterMode>,
    #[serde(default)]
    pub tx_names: Vec<String>,
    #[serde(default)]
    pub rx_names: Vec<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeChoice {
    Fixed,
    Increment,
    Random,
    WeightPairs,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowSize {
    pub choice: SizeChoice,
    #[serde(
        default,
        deserialize_with = "opt_u64_lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub fixed: Option<u64>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl FlowSize {
    pub fn fixed(bytes: u64) -> Self {
        FlowSize {
            choice: SizeChoice::Fixed,
            fixed: Some(bytes),
            extra: Extra::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateChoice {
    Pps,
    Bps,
    Kbps,
    Mbps,
    Gbps,
    Percentage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowRate {
    pub choice: RateChoice,
    #[serde(
        default,
        deserialize_with = "opt_u64_lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub pps: Option<u64>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl FlowRate {
    pub fn pps(pps: u64) -> Self {
        FlowRate {
            choice: RateChoice::Pps,
            pps: Some(pps),
            extra: Extra::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationChoice {
    FixedPackets,
    FixedSeconds,
    Burst,
    Continuous,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowDuration {
    pub choice: DurationChoice,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_packets: Option<FixedPackets>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl FlowDuration {
    pub fn fixed_packets(packets: u64) -> Self {
        FlowDuration {
            choice: DurationChoice::FixedPackets,
            fixed_packets: Some(FixedPackets {
                packets,
                gap: None,
                extra: Extra::new(),
            }),
            extra: Extra::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedPackets {
    #[serde(default, deserialize_with = "u64_lenient")]
    pub packets: u64,
    #[serde(
        default,
        deserialize_with = "opt_u64_lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub gap: Option<u64>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowMetricsConfig {
    #[serde(default)]
    pub enable: bool,
    #[serde(default)]
    pub loss: bool,
    #[serde(default)]
    pub timestamps: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency: Option<FlowLatency>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LatencyMode {
    StoreForward,
    CutThrough,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowLatency {
    #[serde(default)]
    pub enable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<LatencyMode>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// 报文头栈中的一层。`choice` 保持字符串，未建模的头（vlan、gre…）落在 `extra` 里。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowHeader {
    pub choice: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ethernet: Option<HeaderEthernet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4: Option<HeaderIp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6: Option<HeaderIp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tcp: Option<HeaderL4>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub udp: Option<HeaderL4>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icmp: Option<Extra>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icmpv6: Option<Extra>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl FlowHeader {
    pub fn ethernet(src: &str, dst: &str) -> Self {
        FlowHeader {
            choice: "ethernet".to_string(),
            ethernet: Some(HeaderEthernet {
                src: Some(Pattern::value(src.to_string())),
                dst: Some(Pattern::value(dst.to_string())),
                extra: Extra::new(),
            }),
            ..Default::default()
        }
    }

    pub fn ipv4(src: &str, dst: &str) -> Self {
        FlowHeader {
            choice: "ipv4".to_string(),
            ipv4: Some(HeaderIp::new(src, dst)),
            ..Default::default()
        }
    }

    pub fn ipv6(src: &str, dst: &str) -> Self {
        FlowHeader {
            choice: "ipv6".to_string(),
            ipv6: Some(HeaderIp::new(src, dst)),
            ..Default::default()
        }
    }

    pub fn tcp(l4: HeaderL4) -> Self {
        FlowHeader {
            choice: "tcp".to_string(),
            tcp: Some(l4),
            ..Default::default()
        }
    }

    pub fn udp(l4: HeaderL4) -> Self {
        FlowHeader {
            choice: "udp".to_string(),
            udp: Some(l4),
            ..Default::default()
        }
    }

    pub fn icmp() -> Self {
        FlowHeader {
            choice: "icmp".to_string(),
            icmp: Some(Extra::new()),
            ..Default::default()
        }
    }

    pub fn icmpv6() -> Self {
        FlowHeader {
            choice: "icmpv6".to_string(),
            icmpv6: Some(Extra::new()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeaderEthernet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<Pattern<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dst: Option<Pattern<String>>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeaderIp {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<Pattern<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dst: Option<Pattern<String>>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl HeaderIp {
    fn new(src: &str, dst: &str) -> Self {
        HeaderIp {
            src: Some(Pattern::value(src.to_string())),
            dst: Some(Pattern::value(dst.to_string())),
            extra: Extra::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeaderL4 {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src_port: Option<Pattern<u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dst_port: Option<Pattern<u32>>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternChoice {
    Value,
    Values,
    Increment,
    Decrement,
    Auto,
}

/// OTG 字段模式：固定值、列表、递增/递减计数器或 auto。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern<T> {
    pub choice: PatternChoice,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<T>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub increment: Option<PatternCounter<T>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decrement: Option<PatternCounter<T>>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl<T> Pattern<T> {
    pub fn value(v: T) -> Self {
        Pattern {
            choice: PatternChoice::Value,
            value: Some(v),
            values: None,
            increment: None,
            decrement: None,
            extra: Extra::new(),
        }
    }

    pub fn increment(start: T, step: T, count: u32) -> Self {
        Pattern {
            choice: PatternChoice::Increment,
            value: None,
            values: None,
            increment: Some(PatternCounter {
                start,
                step,
                count,
                extra: Extra::new(),
            }),
            decrement: None,
            extra: Extra::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternCounter<T> {
    pub start: T,
    pub step: T,
    pub count: u32,
    #[serde(flatten)]
    pub extra: Extra,
}
