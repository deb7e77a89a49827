use serde_json::Value;
use std::io::Write;
use std::process::{Command, Output, Stdio};

fn otgen(args: &[&str], stdin: &str, envs: &[(&str, &str)]) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_otgen"))
        .args(args)
        .env_clear()
        .envs(envs.iter().copied())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn otgen");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(stdin.as_bytes())
        .expect("write stdin");
    child.wait_with_output().expect("wait otgen")
}

fn yaml_stdout(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "otgen failed: status={:?}\nstderr:\n{}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
    serde_yaml::from_slice(&output.stdout).expect("stdout is YAML")
}

fn stdout_text(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).expect("utf8 stdout")
}

#[test]
fn create_device_prints_a_config() {
    let output = otgen(&["create", "device"], "", &[]);
    let cfg = yaml_stdout(&output);

    assert_eq!(cfg["ports"][0]["name"], "p1");
    assert_eq!(cfg["ports"][0]["location"], "localhost:5555");
    assert_eq!(cfg["devices"][0]["name"], "otg1");
    let ipv4 = &cfg["devices"][0]["ethernets"][0]["ipv4_addresses"][0];
    assert_eq!(ipv4["address"], "192.0.2.1");
    assert_eq!(ipv4["gateway"], "192.0.2.2");
}

#[test]
fn location_comes_from_the_environment() {
    let output = otgen(
        &["create", "device", "--port", "p2"],
        "",
        &[("OTG_LOCATION_P2", "10.10.10.2:5555")],
    );
    let cfg = yaml_stdout(&output);
    assert_eq!(cfg["ports"][0]["location"], "10.10.10.2:5555");
}

#[test]
fn device_flow_and_bgp_build_up_through_a_pipeline() {
    let first = otgen(&["create", "device", "-n", "otg1", "-p", "p1"], "", &[]);
    assert!(first.status.success());
    let second = otgen(
        &["add", "device", "-n", "otg2", "-p", "p2"],
        &stdout_text(&first),
        &[],
    );
    assert!(second.status.success());
    let third = otgen(
        &["add", "flow", "--tx", "otg1", "--rx", "otg2", "--proto", "udp", "--rate", "100"],
        &stdout_text(&second),
        &[],
    );
    assert!(third.status.success());
    let fourth = otgen(
        &["add", "bgp", "-d", "otg1", "--route", "198.51.100.0/24"],
        &stdout_text(&third),
        &[],
    );
    let cfg = yaml_stdout(&fourth);

    assert_eq!(cfg["ports"].as_array().map(Vec::len), Some(2));
    assert_eq!(cfg["devices"].as_array().map(Vec::len), Some(2));

    let flow = &cfg["flows"][0];
    assert_eq!(flow["tx_rx"]["choice"], "device");
    assert_eq!(flow["tx_rx"]["device"]["tx_names"][0], "otg1.eth[0].ipv4[0]");
    assert_eq!(flow["tx_rx"]["device"]["rx_names"][0], "otg2.eth[0].ipv4[0]");
    assert_eq!(flow["packet"][2]["choice"], "udp");

    let peer = &cfg["devices"][0]["bgp"]["ipv4_interfaces"][0]["peers"][0];
    assert_eq!(peer["peer_address"], "192.0.2.2");
    assert_eq!(peer["v4_routes"][0]["addresses"][0]["address"], "198.51.100.0");
}

#[test]
fn device_then_flow_round_trip() {
    let device = otgen(
        &["create", "device", "--ip", "10.0.0.1", "--gw", "10.0.0.2", "--prefix", "24"],
        "",
        &[],
    );
    let flow = otgen(&["add", "flow", "--tx", "otg1"], &stdout_text(&device), &[]);
    let cfg = yaml_stdout(&flow);

    let devices = cfg["devices"].as_array().expect("devices");
    assert_eq!(devices.len(), 1);
    let ipv4 = &devices[0]["ethernets"][0]["ipv4_addresses"][0];
    assert_eq!(ipv4["address"], "10.0.0.1");
    assert_eq!(ipv4["gateway"], "10.0.0.2");
    assert_eq!(ipv4["prefix"], 24);

    let flows = cfg["flows"].as_array().expect("flows");
    assert_eq!(flows.len(), 1);
    assert_eq!(flows[0]["tx_rx"]["choice"], "device");
    assert_eq!(flows[0]["tx_rx"]["device"]["tx_names"][0], ipv4["name"]);
    assert_eq!(flows[0]["packet"][1]["ipv4"]["src"]["value"], "10.0.0.1");
}

#[test]
fn add_keeps_unknown_sections() {
    let input = concat!(
        "ports:\n- name: p1\n  location: eth1\nlags:\n- name: lag1\n",
        "flows:\n- name: f0\n  tx_rx:\n    choice: port\n    port:\n      tx_name: p1\n",
        "  packet:\n  - choice: ethernet\n    ethernet:\n      src:\n",
        "        choice: value\n        value: \"00:11:22:33:44:55\"\n",
        "        metric_tags:\n        - name: smac\n",
        "  metrics:\n    enable: true\n    predefined_metric_tags:\n      rx_name: true\n",
    );
    let output = otgen(&["add", "flow"], input, &[]);
    let cfg = yaml_stdout(&output);

    assert_eq!(cfg["lags"][0]["name"], "lag1");
    assert_eq!(cfg["ports"][0]["location"], "eth1");
    assert_eq!(cfg["ports"][1]["name"], "p2");
    assert_eq!(cfg["flows"][0]["name"], "f0");
    let src = &cfg["flows"][0]["packet"][0]["ethernet"]["src"];
    assert_eq!(src["metric_tags"][0]["name"], "smac");
    assert_eq!(cfg["flows"][0]["metrics"]["predefined_metric_tags"]["rx_name"], true);
    assert_eq!(cfg["flows"][1]["name"], "f1");
}

#[test]
fn create_bgp_without_a_device_fails() {
    let output = otgen(&["create", "bgp"], "", &[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("otg1"));
}

#[test]
fn bad_flag_values_are_usage_errors() {
    let output = otgen(&["create", "flow", "--proto", "sctp"], "", &[]);
    assert_eq!(output.status.code(), Some(2));

    let output = otgen(&["create", "bgp", "--route", "10.0.0.0/40"], "", &[]);
    assert_eq!(output.status.code(), Some(2));
}
