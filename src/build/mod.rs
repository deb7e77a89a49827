//! 配置构建器（device / flow / bgp）
//!
//! 每个构建器都是作用在 [`Config`] 上的纯函数：按名称查找实体，存在则更新，
//! 否则追加，然后写入解析好的字段值。

pub mod defaults;
mod bgp;
mod device;
mod flow;

pub use bgp::{BgpOptions, RouteSpec, apply_bgp, parse_as_type, parse_route};
pub use device::{DeviceOptions, apply_device};
pub use flow::{FlowOptions, IpVersion, LatencyMetrics, Proto, apply_flow};

use crate::otg::{Config, Extra, Port};
use defaults::Env;
use tracing::debug;

/// Returns the index of the named port, adding it with a resolved location if missing.
pub fn get_or_create_port(config: &mut Config, name: &str, location: Option<&str>, env: Env) -> usize {
    if let Some(idx) = config.ports.iter().position(|p| p.name == name) {
        return idx;
    }
    let location = location
        .map(str::to_string)
        .unwrap_or_else(|| defaults::port_location(env, name));
    debug!(port = name, %location, "adding test port");
    config.ports.push(Port {
        name: name.to_string(),
        location: Some(location),
        extra: Extra::new(),
    });
    config.ports.len() - 1
}
