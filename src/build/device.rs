use super::defaults::{self, Env, Side};
use super::get_or_create_port;
use crate::error::Result;
use crate::otg::{Config, Device, DeviceEthernet, DeviceIpv4, EthernetConnection};
use tracing::debug;

/// Resolved-as-far-as-the-CLI-knows options for an emulated device.
#[derive(Debug, Clone)]
pub struct DeviceOptions {
    pub name: String,
    pub port: String,
    pub location: Option<String>,
    pub mac: Option<String>,
    pub ip: Option<String>,
    pub gateway: Option<String>,
    pub prefix: u32,
}

impl Default for DeviceOptions {
    fn default() -> Self {
        DeviceOptions {
            name: defaults::DEVICE_NAME_1.to_string(),
            port: defaults::PORT_NAME_P1.to_string(),
            location: None,
            mac: None,
            ip: None,
            gateway: None,
            prefix: defaults::IPV4_DEFAULT_PREFIX,
        }
    }
}

/// 在配置中创建或更新一个仿真设备（以太网 + IPv4）。
pub fn apply_device(config: &mut Config, opts: &DeviceOptions, env: Env) -> Result<()> {
    get_or_create_port(config, &opts.port, opts.location.as_deref(), env);

    let side = Side::of_port(&opts.port);
    let mac = opts
        .mac
        .clone()
        .unwrap_or_else(|| side.default_src_mac(env));
    // The device's own address and its gateway swap on the second port.
    let (own_ip, peer_ip) = side.default_ipv4_pair(env);
    let ip = opts.ip.clone().unwrap_or(own_ip);
    let gateway = opts.gateway.clone().unwrap_or(peer_ip);

    let idx = match config.devices.iter().position(|d| d.name == opts.name) {
        Some(idx) => {
            debug!(device = %opts.name, "device already exists, will update");
            idx
        }
        None => {
            config.devices.push(Device {
                name: opts.name.clone(),
                ..Default::default()
            });
            config.devices.len() - 1
        }
    };
    let device = &mut config.devices[idx];

    if device.ethernets.is_empty() {
        device.ethernets.push(DeviceEthernet {
            name: format!("{}.eth[0]", opts.name),
            ..Default::default()
        });
    }
    let eth = &mut device.ethernets[0];
    eth.mac = mac;
    eth.connection = Some(EthernetConnection::port(&opts.port));
    eth.port_name = None;

    if eth.ipv4_addresses.is_empty() {
        eth.ipv4_addresses.push(DeviceIpv4 {
            name: format!("{}.ipv4[0]", eth.name),
            ..Default::default()
        });
    }
    let ipv4 = &mut eth.ipv4_addresses[0];
    debug!(device = %opts.name, address = %ip, gateway = %gateway, prefix = opts.prefix, "setting IPv4 interface");
    ipv4.address = ip;
    ipv4.gateway = gateway;
    ipv4.prefix = opts.prefix;

    Ok(())
}
