use super::metrics;
use crate::otg::{
    ControlState, DocFormat, FlowTransmit, MetricKind, MetricsRequest, SessionState, State,
    parse_config, parse_value, to_yaml,
};
use serde_json::json;

const CONFIG_YAML: &str = r#"
ports:
- name: p1
  location: localhost:5555
- name: p2
  location: localhost:5556
devices:
- name: otg1
  ethernets:
  - name: otg1.eth[0]
    mac: 02:00:00:00:01:aa
    mtu: 1500
    connection:
      choice: port_name
      port_name: p1
    ipv4_addresses:
    - name: otg1.eth[0].ipv4[0]
      address: 192.0.2.1
      gateway: 192.0.2.2
      prefix: 24
  bgp:
    router_id: 192.0.2.1
    ipv4_interfaces:
    - ipv4_name: otg1.eth[0].ipv4[0]
      peers:
      - name: otg1.eth[0].ipv4[0].bgp.peer.192.0.2.2
        peer_address: 192.0.2.2
        as_type: ebgp
        as_number: 65534
        v4_routes:
        - name: rr
          next_hop_mode: local_ip
          addresses:
          - address: 198.51.100.0
            prefix: 24
            count: 4
flows:
- name: f1
  tx_rx:
    choice: port
    port:
      tx_name: p1
      rx_names: [p2]
  packet:
  - choice: ethernet
    ethernet:
      src: {choice: value, value: "02:00:00:00:01:aa"}
  - choice: vlan
    vlan:
      id: {choice: value, value: 100}
  rate:
    choice: pps
    pps: "200"
  duration:
    choice: fixed_packets
    fixed_packets:
      packets: "1000"
      gap: 12
lags:
- name: lag1
"#;

#[test]
fn config_parses_modelled_fields() {
    let cfg = parse_config(CONFIG_YAML, DocFormat::Yaml).expect("parse config");
    assert_eq!(cfg.ports.len(), 2);
    assert_eq!(cfg.port("p2").and_then(|p| p.location.as_deref()), Some("localhost:5556"));

    let dev = cfg.device("otg1").expect("device otg1");
    let ipv4 = dev.first_ipv4().expect("ipv4");
    assert_eq!(ipv4.address, "192.0.2.1");
    assert_eq!(ipv4.gateway, "192.0.2.2");
    assert_eq!(cfg.bgp4_devices().count(), 1);

    let peer = &dev.bgp.as_ref().expect("bgp").ipv4_interfaces[0].peers[0];
    assert_eq!(peer.advertised_routes(), 4);

    let flow = cfg.flow("f1").expect("flow f1");
    // protojson int64 as strings
    assert_eq!(flow.pps(), 200);
    assert_eq!(flow.fixed_packets(), 1000);
}

#[test]
fn unknown_keys_survive_a_yaml_round_trip() {
    let cfg = parse_config(CONFIG_YAML, DocFormat::Yaml).expect("parse config");
    let out = to_yaml(&cfg).expect("to yaml");
    let again = parse_config(&out, DocFormat::Yaml).expect("reparse");
    assert_eq!(cfg, again);

    let v: serde_json::Value = serde_yaml::from_str(&out).expect("yaml value");
    assert_eq!(v["lags"][0]["name"], "lag1");
    assert_eq!(v["devices"][0]["ethernets"][0]["mtu"], 1500);
    assert_eq!(v["flows"][0]["packet"][1]["vlan"]["id"]["value"], 100);
}

#[test]
fn empty_document_is_an_empty_config() {
    let cfg = parse_config("  \n", DocFormat::Yaml).expect("parse empty");
    assert!(cfg.ports.is_empty() && cfg.devices.is_empty() && cfg.flows.is_empty());
}

#[test]
fn json_documents_parse_with_either_format() {
    let raw = r#"{"ports":[{"name":"p1","location":"eth1"}],"options":{"port_options":{"location_preemption":true}}}"#;
    let from_json = parse_config(raw, DocFormat::Json).expect("json");
    let from_yaml = parse_config(raw, DocFormat::Yaml).expect("yaml accepts json");
    assert_eq!(from_json, from_yaml);

    let value = parse_value(raw, DocFormat::Json).expect("value");
    assert_eq!(value["options"]["port_options"]["location_preemption"], true);
}

#[test]
fn control_state_bodies_match_the_rest_api() {
    let start = serde_json::to_value(ControlState::protocols(State::Start)).expect("ser");
    assert_eq!(
        start,
        json!({"choice": "protocol", "protocol": {"choice": "all", "all": {"state": "start"}}})
    );

    let stop = serde_json::to_value(ControlState::traffic(State::Stop)).expect("ser");
    assert_eq!(
        stop,
        json!({"choice": "traffic", "traffic": {"choice": "flow_transmit", "flow_transmit": {"state": "stop"}}})
    );
}

#[test]
fn metrics_request_names_the_metric_family() {
    let bgp = serde_json::to_value(MetricsRequest::new(MetricKind::Bgpv4)).expect("ser");
    assert_eq!(bgp, json!({"choice": "bgpv4", "bgpv4": {}}));
    let port = serde_json::to_value(MetricsRequest::new(MetricKind::Port)).expect("ser");
    assert_eq!(port, json!({"choice": "port", "port": {}}));
}

#[test]
fn metrics_response_accepts_string_counters() {
    let m = metrics(
        r#"{"choice":"flow_metrics","flow_metrics":[
            {"name":"f1","transmit":"stopped","frames_tx":"1000","bytes_tx":"64000","frames_tx_rate":99.5},
            {"name":"f2","transmit":"started","frames_tx":5}
        ],
        "port_metrics":[{"name":"p1","frames_tx":"7","bytes_rx_rate":"12.5"}],
        "bgpv4_metrics":[{"name":"peer","session_state":"up","routes_received":"3"}]}"#,
    );
    assert_eq!(m.flow_metrics[0].frames_tx, 1000);
    assert_eq!(m.flow_metrics[0].transmit, Some(FlowTransmit::Stopped));
    assert!((m.flow_metrics[0].frames_tx_rate - 99.5).abs() < f64::EPSILON);
    assert_eq!(m.port_metrics[0].frames_tx, 7);
    assert!((m.port_metrics[0].bytes_rx_rate - 12.5).abs() < f64::EPSILON);
    assert_eq!(m.bgpv4_metrics[0].session_state, Some(SessionState::Up));
    assert_eq!(m.bgpv4_metrics[0].routes_received, 3);
    assert!(!m.all_flows_stopped());
    assert_eq!(m.total_frames_tx(), 7);
}

#[test]
fn metrics_response_rejects_negative_counters() {
    let err = serde_json::from_str::<crate::otg::MetricsResponse>(
        r#"{"port_metrics":[{"name":"p1","frames_tx":-1}]}"#,
    );
    assert!(err.is_err());
}
