//! `otgen run` 的运行参数

use crate::otg::{DocFormat, MetricKind};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Whether `run` starts and stops emulated protocols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProtocolsMode {
    /// Start protocols when devices are configured, stop them at the end.
    #[default]
    Auto,
    /// Never touch protocol state.
    Ignore,
    /// Start protocols but leave them running.
    Keep,
}

impl FromStr for ProtocolsMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(ProtocolsMode::Auto),
            "ignore" => Ok(ProtocolsMode::Ignore),
            "keep" => Ok(ProtocolsMode::Keep),
            _ => Err(format!("Unsupported protocols mode: {s}")),
        }
    }
}

/// Routes each BGP peer must receive before the protocol counts as up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RxBgp {
    Absolute(u64),
    /// Multiple of the routes the peer advertises.
    Multiplier(f64),
}

impl Default for RxBgp {
    fn default() -> Self {
        RxBgp::Multiplier(1.0)
    }
}

impl RxBgp {
    pub fn expected(self, advertised: u64) -> u64 {
        match self {
            RxBgp::Absolute(n) => n,
            RxBgp::Multiplier(m) => (advertised as f64 * m).ceil() as u64,
        }
    }
}

impl FromStr for RxBgp {
    type Err = String;

    /// `N` for an absolute count, `Nx` for a multiplier.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let bad = || format!("Unsupported --rxbgp value, expected N or Nx: {s}");
        match s.strip_suffix(['x', 'X']) {
            Some(m) => {
                let m: f64 = m.parse().map_err(|_| bad())?;
                if m < 0.0 || !m.is_finite() {
                    return Err(bad());
                }
                Ok(RxBgp::Multiplier(m))
            }
            None => s.parse().map(RxBgp::Absolute).map_err(|_| bad()),
        }
    }
}

/// Metric families to print while running; at least one is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricSelection {
    pub port: bool,
    pub flow: bool,
    pub bgp4: bool,
}

impl Default for MetricSelection {
    fn default() -> Self {
        MetricSelection {
            port: true,
            flow: false,
            bgp4: false,
        }
    }
}

impl MetricSelection {
    pub fn contains(&self, kind: MetricKind) -> bool {
        match kind {
            MetricKind::Port => self.port,
            MetricKind::Flow => self.flow,
            MetricKind::Bgpv4 => self.bgp4,
        }
    }

    /// The metric family that decides when traffic is done.
    pub fn driver(&self) -> MetricKind {
        if self.flow {
            MetricKind::Flow
        } else {
            MetricKind::Port
        }
    }

    /// Families fetched every traffic poll, in print order.
    pub fn traffic_kinds(&self) -> Vec<MetricKind> {
        [MetricKind::Port, MetricKind::Flow, MetricKind::Bgpv4]
            .into_iter()
            .filter(|k| self.contains(*k))
            .collect()
    }
}

impl FromStr for MetricSelection {
    type Err = String;

    /// Comma-separated list of `port`, `flow`, `bgp4`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut sel = MetricSelection {
            port: false,
            flow: false,
            bgp4: false,
        };
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match part {
                "port" => sel.port = true,
                "flow" => sel.flow = true,
                "bgp4" | "bgpv4" => sel.bgp4 = true,
                other => return Err(format!("Unsupported metrics type requested: {other}")),
            }
        }
        if !(sel.port || sel.flow || sel.bgp4) {
            return Err("At least one metrics type is required: port, flow, bgp4".to_string());
        }
        Ok(sel)
    }
}

#[derive(Debug, Clone)]
pub struct RunSettings {
    pub api: String,
    pub insecure: bool,
    pub file: Option<PathBuf>,
    pub format: DocFormat,
    pub metrics: MetricSelection,
    pub interval: Duration,
    /// Stop traffic once it runs this many ETAs; 0 disables the limit.
    pub xeta: f64,
    /// Wall-clock limit for convergence plus traffic.
    pub timeout: Option<Duration>,
    pub protocols: ProtocolsMode,
    pub rx_bgp: RxBgp,
}

impl Default for RunSettings {
    fn default() -> Self {
        RunSettings {
            api: crate::build::defaults::API_DEFAULT.to_string(),
            insecure: false,
            file: None,
            format: DocFormat::Yaml,
            metrics: MetricSelection::default(),
            interval: Duration::from_millis(500),
            xeta: 0.0,
            timeout: None,
            protocols: ProtocolsMode::Auto,
            rx_bgp: RxBgp::default(),
        }
    }
}

/// Parses Go-style durations: `500ms`, `0.5s`, `1m30s`, `2h`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let input = s.trim();
    if input == "0" {
        return Ok(Duration::ZERO);
    }
    if input.is_empty() {
        return Err("invalid duration: empty string".to_string());
    }

    let mut rest = input;
    let mut nanos: u64 = 0;
    while !rest.is_empty() {
        let num_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if num_end == 0 {
            return Err(format!("invalid duration: {input}"));
        }
        let value: f64 = rest[..num_end]
            .parse()
            .map_err(|_| format!("invalid duration: {input}"))?;
        rest = &rest[num_end..];

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let unit_nanos: u64 = match &rest[..unit_end] {
            "ns" => 1,
            "us" | "µs" | "μs" => 1_000,
            "ms" => 1_000_000,
            "s" => 1_000_000_000,
            "m" => 60 * 1_000_000_000,
            "h" => 3_600 * 1_000_000_000,
            "" => return Err(format!("missing unit in duration: {input}")),
            unit => return Err(format!("unknown unit {unit:?} in duration: {input}")),
        };
        rest = &rest[unit_end..];
        nanos = nanos.saturating_add((value * unit_nanos as f64).round() as u64);
    }
    Ok(Duration::from_nanos(nanos))
}
