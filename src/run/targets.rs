//! 运行目标：流量总包数 / ETA 与 BGP 收敛条件

use super::settings::RxBgp;
use crate::otg::{Config, MetricKind, MetricsResponse, SessionState};
use std::time::Duration;

/// Computed once before traffic starts, never recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrafficTargets {
    /// Sum of fixed packet counts across all flows.
    pub packets: u64,
    /// Longest per-flow `packets / pps`.
    pub eta: Duration,
}

impl TrafficTargets {
    pub fn from_config(config: &Config) -> Self {
        let mut targets = TrafficTargets::default();
        for flow in &config.flows {
            let packets = flow.fixed_packets();
            targets.packets += packets;
            let pps = flow.pps();
            if pps > 0 {
                let eta = Duration::from_secs(packets / pps);
                targets.eta = targets.eta.max(eta);
            }
        }
        targets
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrafficProgress {
    Running,
    Done,
    /// Ran longer than ETA x xeta.
    EtaExceeded,
}

/// 根据一次指标快照判断流量是否还在运行。
///
/// `driver` 为 port 时以累计 `frames_tx` 达到目标为结束；为 flow 时所有流都进入
/// `stopped` 即结束。`xeta > 0` 时超过 `eta * xeta` 会强制结束。
pub fn traffic_progress(
    driver: MetricKind,
    snapshot: &MetricsResponse,
    targets: &TrafficTargets,
    elapsed: Duration,
    xeta: f64,
) -> TrafficProgress {
    let running = match driver {
        MetricKind::Flow => !snapshot.all_flows_stopped(),
        _ => snapshot.total_frames_tx() < targets.packets,
    };
    if !running {
        return TrafficProgress::Done;
    }
    if xeta > 0.0 && elapsed.as_secs_f64() > targets.eta.as_secs_f64() * xeta {
        return TrafficProgress::EtaExceeded;
    }
    TrafficProgress::Running
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerTarget {
    pub name: String,
    pub advertise: u64,
    pub receive: u64,
}

/// Convergence expectations for every configured BGPv4 peer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BgpTargets {
    pub peers: Vec<PeerTarget>,
}

impl BgpTargets {
    pub fn from_config(config: &Config, rx: RxBgp) -> Self {
        let peers = config
            .bgp4_devices()
            .filter_map(|d| d.bgp.as_ref())
            .flat_map(|bgp| bgp.ipv4_interfaces.iter())
            .flat_map(|iface| iface.peers.iter())
            .map(|peer| {
                let advertise = peer.advertised_routes();
                PeerTarget {
                    name: peer.name.clone(),
                    advertise,
                    receive: rx.expected(advertise),
                }
            })
            .collect();
        BgpTargets { peers }
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Every peer is up, has advertised its routes and received the expected count.
    pub fn converged(&self, snapshot: &MetricsResponse) -> bool {
        self.peers.iter().all(|target| {
            snapshot
                .bgpv4_metrics
                .iter()
                .find(|m| m.name == target.name)
                .is_some_and(|m| {
                    m.session_state == Some(SessionState::Up)
                        && m.routes_advertised >= target.advertise
                        && m.routes_received >= target.receive
                })
        })
    }
}
