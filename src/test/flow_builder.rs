use super::{fake_env, no_env};
use crate::build::{DeviceOptions, FlowOptions, IpVersion, LatencyMetrics, Proto, apply_device, apply_flow};
use crate::error::OtgenError;
use crate::otg::{
    Config, DocFormat, LatencyMode, Pattern, PatternChoice, TxRxChoice, parse_config, to_yaml,
};

fn header_value<'a>(p: &'a Option<Pattern<String>>) -> Option<&'a str> {
    p.as_ref().and_then(|p| p.value.as_deref())
}

#[test]
fn default_port_flow_p1_to_p2() {
    let mut cfg = Config::default();
    apply_flow(&mut cfg, &FlowOptions::default(), &no_env).expect("apply flow");

    assert_eq!(cfg.ports.len(), 2);
    assert_eq!(cfg.port("p1").and_then(|p| p.location.as_deref()), Some("localhost:5555"));
    assert_eq!(cfg.port("p2").and_then(|p| p.location.as_deref()), Some("localhost:5556"));

    let flow = cfg.flow("f1").expect("flow");
    assert_eq!(flow.tx_rx.choice, TxRxChoice::Port);
    let port = flow.tx_rx.port.as_ref().expect("port endpoints");
    assert_eq!(port.tx_name, "p1");
    assert_eq!(port.rx_names, vec!["p2".to_string()]);

    assert_eq!(flow.packet.len(), 3);
    let eth = flow.packet[0].ethernet.as_ref().expect("ethernet");
    assert_eq!(header_value(&eth.src), Some("02:00:00:00:01:aa"));
    assert_eq!(header_value(&eth.dst), Some("02:00:00:00:02:aa"));
    let ip = flow.packet[1].ipv4.as_ref().expect("ipv4");
    assert_eq!(header_value(&ip.src), Some("192.0.2.1"));
    assert_eq!(header_value(&ip.dst), Some("192.0.2.2"));

    let tcp = flow.packet[2].tcp.as_ref().expect("tcp");
    let sport = tcp.src_port.as_ref().expect("sport");
    assert_eq!(sport.choice, PatternChoice::Increment);
    let inc = sport.increment.as_ref().expect("increment");
    assert_eq!((inc.start, inc.step, inc.count), (1024, 7, 64511));
    assert_eq!(tcp.dst_port.as_ref().and_then(|p| p.value), Some(7));

    assert_eq!(flow.fixed_packets(), 1000);
    assert!(flow.rate.is_none());
    assert!(flow.size.is_none());
    let metrics = flow.metrics.as_ref().expect("metrics");
    assert!(metrics.enable);
    assert!(metrics.latency.is_none());
}

#[test]
fn p2_tx_swaps_ports_macs_and_addresses() {
    let env = fake_env(&[("OTG_FLOW_SRC_IPV4", "10.0.0.1"), ("OTG_FLOW_DST_IPV4", "10.0.0.2")]);
    let mut cfg = Config::default();
    let opts = FlowOptions {
        name: "back".to_string(),
        tx: "p2".to_string(),
        ..Default::default()
    };
    apply_flow(&mut cfg, &opts, &env).expect("apply flow");

    let flow = cfg.flow("back").expect("flow");
    let port = flow.tx_rx.port.as_ref().expect("port endpoints");
    assert_eq!(port.tx_name, "p2");
    assert_eq!(port.rx_names, vec!["p1".to_string()]);

    let eth = flow.packet[0].ethernet.as_ref().expect("ethernet");
    assert_eq!(header_value(&eth.src), Some("02:00:00:00:02:aa"));
    assert_eq!(header_value(&eth.dst), Some("02:00:00:00:01:aa"));
    let ip = flow.packet[1].ipv4.as_ref().expect("ipv4");
    assert_eq!(header_value(&ip.src), Some("10.0.0.2"));
    assert_eq!(header_value(&ip.dst), Some("10.0.0.1"));
}

#[test]
fn flags_shape_the_header_stack_and_metrics() {
    let mut cfg = Config::default();
    let opts = FlowOptions {
        ip_version: IpVersion::V6,
        proto: Proto::Udp,
        src_port: Some(5000),
        dst_port: 0,
        rate: 100,
        count: 0,
        size: 512,
        loss: true,
        latency: LatencyMetrics::CutThrough,
        timestamps: true,
        ..Default::default()
    };
    apply_flow(&mut cfg, &opts, &no_env).expect("apply flow");

    let flow = cfg.flow("f1").expect("flow");
    let ip = flow.packet[1].ipv6.as_ref().expect("ipv6");
    assert_eq!(header_value(&ip.src), Some("fe80::000:00ff:fe00:01aa"));
    let udp = flow.packet[2].udp.as_ref().expect("udp");
    assert_eq!(udp.src_port.as_ref().and_then(|p| p.value), Some(5000));
    assert!(udp.dst_port.is_none());

    assert_eq!(flow.pps(), 100);
    assert!(flow.duration.is_none(), "count 0 is continuous");
    assert_eq!(flow.size.as_ref().and_then(|s| s.fixed), Some(512));

    let metrics = flow.metrics.as_ref().expect("metrics");
    assert!(metrics.loss && metrics.timestamps);
    assert_eq!(
        metrics.latency.as_ref().and_then(|l| l.mode),
        Some(LatencyMode::CutThrough)
    );
}

#[test]
fn icmp_over_ipv6_uses_icmpv6_header() {
    let mut cfg = Config::default();
    let opts = FlowOptions {
        ip_version: IpVersion::V6,
        proto: Proto::Icmp,
        ..Default::default()
    };
    apply_flow(&mut cfg, &opts, &no_env).expect("apply flow");
    assert_eq!(cfg.flows[0].packet[2].choice, "icmpv6");
}

#[test]
fn same_name_replaces_the_flow_in_place() {
    let mut cfg = Config::default();
    apply_flow(&mut cfg, &FlowOptions::default(), &no_env).expect("f1");
    let second = FlowOptions {
        name: "f2".to_string(),
        ..Default::default()
    };
    apply_flow(&mut cfg, &second, &no_env).expect("f2");
    let replaced = FlowOptions {
        count: 5,
        ..Default::default()
    };
    apply_flow(&mut cfg, &replaced, &no_env).expect("f1 again");

    let names: Vec<&str> = cfg.flows.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["f1", "f2"]);
    assert_eq!(cfg.flows[0].fixed_packets(), 5);
}

#[test]
fn adding_a_flow_keeps_nested_keys_of_existing_flows() {
    let raw = r#"
ports:
- name: p1
  location: eth1
  vendor_hint: x1
- name: p2
  location: eth2
flows:
- name: f0
  tx_rx:
    choice: port
    port:
      tx_name: p1
      rx_names:
      - p2
  packet:
  - choice: ipv4
    ipv4:
      src:
        choice: value
        value: 1.1.1.1
        metric_tags:
        - name: src_tag
          offset: 0
          length: 32
      dst:
        choice: increment
        increment:
          start: 2.2.2.2
          step: 0.0.0.1
          count: 10
        auto: 2.2.2.2
  duration:
    choice: fixed_packets
    fixed_packets:
      packets: 10
      delay: 5
  metrics:
    enable: true
    loss: false
    timestamps: false
    predefined_metric_tags:
      rx_name: true
"#;
    let mut cfg = parse_config(raw, DocFormat::Yaml).expect("parse");
    let opts = FlowOptions {
        name: "f1".to_string(),
        ..Default::default()
    };
    apply_flow(&mut cfg, &opts, &no_env).expect("f1");

    let out = to_yaml(&cfg).expect("to yaml");
    let v: serde_json::Value = serde_yaml::from_str(&out).expect("yaml value");
    assert_eq!(v["ports"][0]["vendor_hint"], "x1");
    let f0 = &v["flows"][0];
    assert_eq!(f0["name"], "f0");
    let ipv4 = &f0["packet"][0]["ipv4"];
    assert_eq!(ipv4["src"]["metric_tags"][0]["name"], "src_tag");
    assert_eq!(ipv4["dst"]["auto"], "2.2.2.2");
    assert_eq!(ipv4["dst"]["increment"]["count"], 10);
    assert_eq!(f0["duration"]["fixed_packets"]["delay"], 5);
    assert_eq!(f0["metrics"]["predefined_metric_tags"]["rx_name"], true);
    assert_eq!(v["flows"][1]["name"], "f1");
}

#[test]
fn unknown_tx_port_is_rejected() {
    let mut cfg = Config::default();
    let opts = FlowOptions {
        tx: "p9".to_string(),
        ..Default::default()
    };
    let err = apply_flow(&mut cfg, &opts, &no_env).expect_err("p9 is unknown");
    assert!(matches!(err, OtgenError::InvalidArgument(_)));
    assert!(cfg.flows.is_empty());
}

#[test]
fn proto_accepts_names_and_numbers() {
    assert_eq!("udp".parse::<Proto>(), Ok(Proto::Udp));
    assert_eq!("6".parse::<Proto>(), Ok(Proto::Tcp));
    assert_eq!("1".parse::<Proto>(), Ok(Proto::Icmp));
    assert!("sctp".parse::<Proto>().is_err());
    assert_eq!("sf".parse::<LatencyMetrics>(), Ok(LatencyMetrics::StoreForward));
    assert!("fast".parse::<LatencyMetrics>().is_err());
}

fn two_devices() -> Config {
    let mut cfg = Config::default();
    apply_device(&mut cfg, &DeviceOptions::default(), &no_env).expect("otg1");
    let second = DeviceOptions {
        name: "otg2".to_string(),
        port: "p2".to_string(),
        ..Default::default()
    };
    apply_device(&mut cfg, &second, &no_env).expect("otg2");
    cfg
}

#[test]
fn device_flow_uses_device_interfaces_and_addresses() {
    let mut cfg = two_devices();
    let opts = FlowOptions {
        tx: "otg1".to_string(),
        ..Default::default()
    };
    apply_flow(&mut cfg, &opts, &no_env).expect("device flow");

    let flow = cfg.flow("f1").expect("flow");
    assert_eq!(flow.tx_rx.choice, TxRxChoice::Device);
    let dev = flow.tx_rx.device.as_ref().expect("device endpoints");
    assert_eq!(dev.tx_names, vec!["otg1.eth[0].ipv4[0]".to_string()]);
    assert_eq!(dev.rx_names, vec!["otg2.eth[0].ipv4[0]".to_string()]);

    let eth = flow.packet[0].ethernet.as_ref().expect("ethernet");
    assert_eq!(header_value(&eth.src), Some("02:00:00:00:01:aa"));
    let ip = flow.packet[1].ipv4.as_ref().expect("ipv4");
    assert_eq!(header_value(&ip.src), Some("192.0.2.1"));
    assert_eq!(header_value(&ip.dst), Some("192.0.2.2"));
    // no extra ports are created for device flows
    assert_eq!(cfg.ports.len(), 2);
}

#[test]
fn device_flow_without_peer_device_has_empty_rx() {
    let mut cfg = Config::default();
    apply_device(&mut cfg, &DeviceOptions::default(), &no_env).expect("otg1");
    let opts = FlowOptions {
        tx: "otg1".to_string(),
        ..Default::default()
    };
    apply_flow(&mut cfg, &opts, &no_env).expect("device flow");
    let dev = cfg.flows[0].tx_rx.device.as_ref().expect("device endpoints");
    assert!(dev.rx_names.is_empty());
}

#[test]
fn mixing_devices_and_ports_is_rejected() {
    let mut cfg = two_devices();
    let device_to_port = FlowOptions {
        tx: "otg1".to_string(),
        rx: Some("p2".to_string()),
        ..Default::default()
    };
    assert!(apply_flow(&mut cfg, &device_to_port, &no_env).is_err());

    let port_to_device = FlowOptions {
        tx: "p1".to_string(),
        rx: Some("otg2".to_string()),
        ..Default::default()
    };
    assert!(apply_flow(&mut cfg, &port_to_device, &no_env).is_err());
    assert!(cfg.flows.is_empty());
}
