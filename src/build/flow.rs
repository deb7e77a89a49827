use super::defaults::{self, Env, Side};
use super::get_or_create_port;
use crate::error::{OtgenError, Result};
use crate::otg::{
    Config, Device, Extra, Flow, FlowDuration, FlowHeader, FlowLatency, FlowMetricsConfig,
    FlowRate, FlowSize, FlowTxRx, HeaderL4, LatencyMode, Pattern,
};
use std::str::FromStr;
use tracing::{debug, warn};

// Source ports when none is given: 1024, 1031, ... up to 65535.
const SPORT_START: u32 = 1024;
const SPORT_STEP: u32 = 7;
const SPORT_COUNT: u32 = 65535 - 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IpVersion {
    #[default]
    V4,
    V6,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Proto {
    Icmp,
    #[default]
    Tcp,
    Udp,
}

impl FromStr for Proto {
    type Err = String;

    /// Accepts names or IANA protocol numbers.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "icmp" | "1" => Ok(Proto::Icmp),
            "tcp" | "6" => Ok(Proto::Tcp),
            "udp" | "17" => Ok(Proto::Udp),
            _ => Err(format!("Unsupported transport protocol: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LatencyMetrics {
    #[default]
    Disable,
    StoreForward,
    CutThrough,
}

impl FromStr for LatencyMetrics {
    type Err = String;

    /// `disable`, `sf` for store_forward, `ct` for cut_through.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "disable" | "" => Ok(LatencyMetrics::Disable),
            "sf" => Ok(LatencyMetrics::StoreForward),
            "ct" => Ok(LatencyMetrics::CutThrough),
            _ => Err(format!("Unsupported latency metrics mode: {s}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FlowOptions {
    pub name: String,
    pub tx: String,
    pub rx: Option<String>,
    pub src_mac: Option<String>,
    pub dst_mac: Option<String>,
    pub ip_version: IpVersion,
    pub src: Option<String>,
    pub dst: Option<String>,
    pub proto: Proto,
    /// `None` or 0 selects an incrementing source port.
    pub src_port: Option<u32>,
    pub dst_port: u32,
    /// Packets per second; 0 leaves the rate to the traffic engine.
    pub rate: u64,
    /// 0 means continuous transmission.
    pub count: u64,
    /// Frame size in bytes; 0 leaves it to the traffic engine.
    pub size: u64,
    pub disable_metrics: bool,
    pub loss: bool,
    pub latency: LatencyMetrics,
    pub timestamps: bool,
}

impl Default for FlowOptions {
    fn default() -> Self {
        FlowOptions {
            name: defaults::FLOW_NAME_1.to_string(),
            tx: defaults::PORT_NAME_P1.to_string(),
            rx: None,
            src_mac: None,
            dst_mac: None,
            ip_version: IpVersion::V4,
            src: None,
            dst: None,
            proto: Proto::Tcp,
            src_port: None,
            dst_port: 7,
            rate: 0,
            // A fixed count by default so a bare flow never runs forever.
            count: 1000,
            size: 0,
            disable_metrics: false,
            loss: false,
            latency: LatencyMetrics::Disable,
            timestamps: false,
        }
    }
}

/// Header-stack values after defaults are resolved.
struct Addressing {
    tx_rx: FlowTxRx,
    src_mac: String,
    dst_mac: String,
    src_ip: String,
    dst_ip: String,
}

/// 在配置中创建或替换一条流。
///
/// `--tx` 命名一个已有设备时生成 device 流，否则生成 port 流。
pub fn apply_flow(config: &mut Config, opts: &FlowOptions, env: Env) -> Result<()> {
    let addressing = match config.device(&opts.tx) {
        Some(tx_device) => device_addressing(config, tx_device, opts, env)?,
        None => port_addressing(config, opts, env)?,
    };

    let flow = build_flow(opts, addressing);
    match config.flows.iter().position(|f| f.name == opts.name) {
        Some(idx) => {
            debug!(flow = %opts.name, "flow already exists, will replace");
            config.flows[idx] = flow;
        }
        None => config.flows.push(flow),
    }
    Ok(())
}

fn port_addressing(config: &mut Config, opts: &FlowOptions, env: Env) -> Result<Addressing> {
    let tx = opts.tx.as_str();
    let known = tx == defaults::PORT_NAME_P1 || tx == defaults::PORT_NAME_P2;
    if !known && config.port(tx).is_none() {
        return Err(OtgenError::invalid(format!("Unsupported test port name: {tx}")));
    }
    let side = Side::of_port(tx);
    let rx = match &opts.rx {
        Some(rx) => rx.clone(),
        None => match side {
            Side::First => defaults::PORT_NAME_P2.to_string(),
            Side::Second => defaults::PORT_NAME_P1.to_string(),
        },
    };
    if config.device(&rx).is_some() {
        return Err(OtgenError::invalid(format!(
            "Tx is a port but Rx {rx} is a device; flow endpoints must be both ports or both devices"
        )));
    }

    get_or_create_port(config, tx, None, env);
    get_or_create_port(config, &rx, None, env);

    let (src_ip, dst_ip) = default_ip_pair(side, opts.ip_version, env);
    Ok(Addressing {
        tx_rx: FlowTxRx::ports(tx, rx),
        src_mac: opts.src_mac.clone().unwrap_or_else(|| side.default_src_mac(env)),
        dst_mac: opts.dst_mac.clone().unwrap_or_else(|| side.default_dst_mac(env)),
        src_ip: opts.src.clone().unwrap_or(src_ip),
        dst_ip: opts.dst.clone().unwrap_or(dst_ip),
    })
}

fn device_addressing(
    config: &Config,
    tx_device: &Device,
    opts: &FlowOptions,
    env: Env,
) -> Result<Addressing> {
    let rx_device = match &opts.rx {
        Some(rx) => Some(config.device(rx).ok_or_else(|| {
            OtgenError::invalid(format!(
                "Tx is a device but Rx {rx} is not; flow endpoints must be both ports or both devices"
            ))
        })?),
        None => config.devices.iter().find(|d| d.name != tx_device.name),
    };
    if rx_device.is_none() {
        warn!(flow = %opts.name, "no Rx device available, flow will have no Rx endpoint");
    }

    let tx_name = interface_name(tx_device)?;
    let rx_names = match rx_device {
        Some(d) => vec![interface_name(d)?],
        None => Vec::new(),
    };

    let tx_eth = &tx_device.ethernets[0];
    let tx_port = tx_eth
        .connection
        .as_ref()
        .and_then(|c| c.port_name.as_deref())
        .or(tx_eth.port_name.as_deref())
        .unwrap_or(defaults::PORT_NAME_P1);
    let side = Side::of_port(tx_port);
    let (default_src, default_dst) = default_ip_pair(side, opts.ip_version, env);

    // Device addresses only stand in for IPv4 flows.
    let device_ip = |d: &Device| match opts.ip_version {
        IpVersion::V4 => d.first_ipv4().map(|ip| ip.address.clone()),
        IpVersion::V6 => None,
    };

    let src_mac = match &opts.src_mac {
        Some(mac) => mac.clone(),
        None if !tx_eth.mac.is_empty() => tx_eth.mac.clone(),
        None => side.default_src_mac(env),
    };

    Ok(Addressing {
        tx_rx: FlowTxRx::devices(vec![tx_name], rx_names),
        src_mac,
        dst_mac: opts.dst_mac.clone().unwrap_or_else(|| side.default_dst_mac(env)),
        src_ip: opts
            .src
            .clone()
            .or_else(|| device_ip(tx_device))
            .unwrap_or(default_src),
        dst_ip: opts
            .dst
            .clone()
            .or_else(|| rx_device.and_then(device_ip))
            .unwrap_or(default_dst),
    })
}

/// The flow endpoint of a device: its first IPv4 interface, else its first ethernet.
fn interface_name(device: &Device) -> Result<String> {
    if let Some(ipv4) = device.first_ipv4() {
        return Ok(ipv4.name.clone());
    }
    device
        .ethernets
        .first()
        .map(|eth| eth.name.clone())
        .ok_or_else(|| OtgenError::invalid(format!("Device {} has no ethernet interface", device.name)))
}

fn default_ip_pair(side: Side, version: IpVersion, env: Env) -> (String, String) {
    match version {
        IpVersion::V4 => side.default_ipv4_pair(env),
        IpVersion::V6 => side.default_ipv6_pair(env),
    }
}

fn build_flow(opts: &FlowOptions, addr: Addressing) -> Flow {
    let mut packet = vec![FlowHeader::ethernet(&addr.src_mac, &addr.dst_mac)];
    packet.push(match opts.ip_version {
        IpVersion::V4 => FlowHeader::ipv4(&addr.src_ip, &addr.dst_ip),
        IpVersion::V6 => FlowHeader::ipv6(&addr.src_ip, &addr.dst_ip),
    });
    match opts.proto {
        Proto::Icmp => packet.push(match opts.ip_version {
            IpVersion::V4 => FlowHeader::icmp(),
            IpVersion::V6 => FlowHeader::icmpv6(),
        }),
        Proto::Tcp => packet.push(FlowHeader::tcp(l4_ports(opts))),
        Proto::Udp => packet.push(FlowHeader::udp(l4_ports(opts))),
    }

    let latency = match opts.latency {
        LatencyMetrics::Disable => None,
        LatencyMetrics::StoreForward => Some(LatencyMode::StoreForward),
        LatencyMetrics::CutThrough => Some(LatencyMode::CutThrough),
    }
    .map(|mode| FlowLatency {
        enable: true,
        mode: Some(mode),
        extra: Extra::new(),
    });

    Flow {
        name: opts.name.clone(),
        tx_rx: addr.tx_rx,
        packet,
        size: (opts.size > 0).then(|| FlowSize::fixed(opts.size)),
        rate: (opts.rate > 0).then(|| FlowRate::pps(opts.rate)),
        duration: (opts.count > 0).then(|| FlowDuration::fixed_packets(opts.count)),
        metrics: Some(FlowMetricsConfig {
            enable: !opts.disable_metrics,
            loss: opts.loss,
            timestamps: opts.timestamps,
            latency,
            extra: Extra::new(),
        }),
        extra: Extra::new(),
    }
}

fn l4_ports(opts: &FlowOptions) -> HeaderL4 {
    let src_port = match opts.src_port {
        Some(port) if port > 0 => Pattern::value(port),
        _ => Pattern::increment(SPORT_START, SPORT_STEP, SPORT_COUNT),
    };
    HeaderL4 {
        src_port: Some(src_port),
        dst_port: (opts.dst_port > 0).then(|| Pattern::value(opts.dst_port)),
        extra: Extra::new(),
    }
}
