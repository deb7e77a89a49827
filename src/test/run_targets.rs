use super::metrics;
use crate::otg::{Config, DocFormat, MetricKind, parse_config};
use crate::run::{BgpTargets, RxBgp, TrafficProgress, TrafficTargets, traffic_progress};
use std::time::Duration;

const TWO_FLOWS: &str = r#"
flows:
- name: f1
  tx_rx: {choice: port, port: {tx_name: p1, rx_names: [p2]}}
  rate: {choice: pps, pps: 100}
  duration: {choice: fixed_packets, fixed_packets: {packets: 1000}}
- name: f2
  tx_rx: {choice: port, port: {tx_name: p2, rx_names: [p1]}}
  rate: {choice: pps, pps: "50"}
  duration: {choice: fixed_packets, fixed_packets: {packets: "1500"}}
- name: f3
  tx_rx: {choice: port, port: {tx_name: p1, rx_names: [p2]}}
"#;

const BGP_PAIR: &str = r#"
devices:
- name: otg1
  ethernets:
  - name: otg1.eth[0]
    mac: 02:00:00:00:01:aa
    ipv4_addresses:
    - {name: "otg1.eth[0].ipv4[0]", address: 192.0.2.1, gateway: 192.0.2.2}
  bgp:
    router_id: 192.0.2.1
    ipv4_interfaces:
    - ipv4_name: otg1.eth[0].ipv4[0]
      peers:
      - name: peer1
        peer_address: 192.0.2.2
        as_type: ebgp
        as_number: 65534
        v4_routes:
        - name: rr
          addresses:
          - {address: 198.51.100.0, prefix: 24, count: 3}
- name: otg2
  ethernets:
  - name: otg2.eth[0]
    mac: 02:00:00:00:02:aa
"#;

fn config(raw: &str) -> Config {
    parse_config(raw, DocFormat::Yaml).expect("parse config")
}

#[test]
fn traffic_targets_sum_packets_and_take_longest_eta() {
    let targets = TrafficTargets::from_config(&config(TWO_FLOWS));
    assert_eq!(targets.packets, 2500);
    assert_eq!(targets.eta, Duration::from_secs(30));
    assert_eq!(TrafficTargets::from_config(&Config::default()), TrafficTargets::default());
}

#[test]
fn port_driver_finishes_at_packet_target() {
    let targets = TrafficTargets {
        packets: 100,
        eta: Duration::from_secs(1),
    };
    let partial = metrics(r#"{"port_metrics":[{"name":"p1","frames_tx":"40"},{"name":"p2","frames_tx":"40"}]}"#);
    let full = metrics(r#"{"port_metrics":[{"name":"p1","frames_tx":"60"},{"name":"p2","frames_tx":"40"}]}"#);

    let elapsed = Duration::from_millis(500);
    assert_eq!(
        traffic_progress(MetricKind::Port, &partial, &targets, elapsed, 0.0),
        TrafficProgress::Running
    );
    assert_eq!(
        traffic_progress(MetricKind::Port, &full, &targets, elapsed, 0.0),
        TrafficProgress::Done
    );
}

#[test]
fn flow_driver_waits_for_every_flow_to_stop() {
    let targets = TrafficTargets::default();
    let mixed = metrics(r#"{"flow_metrics":[{"name":"f1","transmit":"stopped"},{"name":"f2","transmit":"started"}]}"#);
    let stopped = metrics(r#"{"flow_metrics":[{"name":"f1","transmit":"stopped"},{"name":"f2","transmit":"stopped"}]}"#);
    assert_eq!(
        traffic_progress(MetricKind::Flow, &mixed, &targets, Duration::ZERO, 0.0),
        TrafficProgress::Running
    );
    assert_eq!(
        traffic_progress(MetricKind::Flow, &stopped, &targets, Duration::ZERO, 0.0),
        TrafficProgress::Done
    );
}

#[test]
fn xeta_limits_running_traffic() {
    let targets = TrafficTargets {
        packets: 1000,
        eta: Duration::from_secs(10),
    };
    let snapshot = metrics(r#"{"port_metrics":[{"name":"p1","frames_tx":"10"}]}"#);
    let progress = |elapsed: Duration, xeta: f64| {
        traffic_progress(MetricKind::Port, &snapshot, &targets, elapsed, xeta)
    };
    assert_eq!(progress(Duration::from_secs(19), 2.0), TrafficProgress::Running);
    assert_eq!(progress(Duration::from_secs(21), 2.0), TrafficProgress::EtaExceeded);
    // 0 disables the limit
    assert_eq!(progress(Duration::from_secs(3600), 0.0), TrafficProgress::Running);
}

#[test]
fn bgp_targets_come_from_peers() {
    let targets = BgpTargets::from_config(&config(BGP_PAIR), RxBgp::Multiplier(2.0));
    assert_eq!(targets.peers.len(), 1);
    assert_eq!(targets.peers[0].name, "peer1");
    assert_eq!(targets.peers[0].advertise, 3);
    assert_eq!(targets.peers[0].receive, 6);
    assert!(BgpTargets::from_config(&config(TWO_FLOWS), RxBgp::default()).is_empty());
}

#[test]
fn convergence_needs_session_up_and_route_counts() {
    let targets = BgpTargets::from_config(&config(BGP_PAIR), RxBgp::Absolute(2));
    let down = metrics(r#"{"bgpv4_metrics":[{"name":"peer1","session_state":"down","routes_advertised":"3","routes_received":"2"}]}"#);
    let short = metrics(r#"{"bgpv4_metrics":[{"name":"peer1","session_state":"up","routes_advertised":"3","routes_received":"1"}]}"#);
    let other = metrics(r#"{"bgpv4_metrics":[{"name":"peer9","session_state":"up","routes_advertised":"3","routes_received":"2"}]}"#);
    let up = metrics(r#"{"bgpv4_metrics":[{"name":"peer1","session_state":"up","routes_advertised":"3","routes_received":"2"}]}"#);
    assert!(!targets.converged(&down));
    assert!(!targets.converged(&short));
    assert!(!targets.converged(&other));
    assert!(targets.converged(&up));
}
