//! 默认值与环境变量覆盖
//!
//! 每个字段的解析顺序：命令行参数 → 非空环境变量 → 内置常量。

pub const PORT_NAME_P1: &str = "p1";
pub const PORT_NAME_P2: &str = "p2";
pub const PORT_LOCATION_P1: &str = "localhost:5555";
pub const PORT_LOCATION_P2: &str = "localhost:5556";

pub const DEVICE_NAME_1: &str = "otg1";
pub const FLOW_NAME_1: &str = "f1";

// Locally administered MACs: 01/02 is the port, aa is the OTG side.
pub const MAC_DEFAULT_SRC: &str = "02:00:00:00:01:aa";
pub const MAC_DEFAULT_DST: &str = "02:00:00:00:02:aa";

// RFC 5737 documentation range; .1 is port 1, .2 is port 2.
pub const IPV4_DEFAULT_SRC: &str = "192.0.2.1";
pub const IPV4_DEFAULT_DST: &str = "192.0.2.2";
pub const IPV4_DEFAULT_PREFIX: u32 = 24;

// Link-local, derived from the default MACs.
pub const IPV6_DEFAULT_SRC: &str = "fe80::000:00ff:fe00:01aa";
pub const IPV6_DEFAULT_DST: &str = "fe80::000:00ff:fe00:02aa";

pub const BGP_ASN_DEFAULT: u32 = 65534;

pub const ENV_API: &str = "OTG_API";
pub const API_DEFAULT: &str = "https://localhost";

pub const ENV_FLOW_SRC_IPV4: &str = "OTG_FLOW_SRC_IPV4";
pub const ENV_FLOW_DST_IPV4: &str = "OTG_FLOW_DST_IPV4";
pub const ENV_FLOW_SRC_IPV6: &str = "OTG_FLOW_SRC_IPV6";
pub const ENV_FLOW_DST_IPV6: &str = "OTG_FLOW_DST_IPV6";

/// Environment lookup; injected so tests never touch the process environment.
pub type Env<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Reads the process environment, treating empty values as unset.
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

pub fn env_or(env: Env, key: &str, default: &str) -> String {
    env(key)
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// 双端口拓扑中的哪一侧；`p2` 一侧的默认 MAC/IP 与 `p1` 对调。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    First,
    Second,
}

impl Side {
    pub fn of_port(port: &str) -> Side {
        if port == PORT_NAME_P2 {
            Side::Second
        } else {
            Side::First
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            Side::First => "P1",
            Side::Second => "P2",
        }
    }

    pub fn default_src_mac(self, env: Env) -> String {
        let fallback = match self {
            Side::First => MAC_DEFAULT_SRC,
            Side::Second => MAC_DEFAULT_DST,
        };
        env_or(env, &format!("OTG_FLOW_SMAC_{}", self.suffix()), fallback)
    }

    pub fn default_dst_mac(self, env: Env) -> String {
        let fallback = match self {
            Side::First => MAC_DEFAULT_DST,
            Side::Second => MAC_DEFAULT_SRC,
        };
        env_or(env, &format!("OTG_FLOW_DMAC_{}", self.suffix()), fallback)
    }

    /// (source, destination) IPv4 defaults as seen from this side.
    pub fn default_ipv4_pair(self, env: Env) -> (String, String) {
        let src = env_or(env, ENV_FLOW_SRC_IPV4, IPV4_DEFAULT_SRC);
        let dst = env_or(env, ENV_FLOW_DST_IPV4, IPV4_DEFAULT_DST);
        match self {
            Side::First => (src, dst),
            Side::Second => (dst, src),
        }
    }

    pub fn default_ipv6_pair(self, env: Env) -> (String, String) {
        let src = env_or(env, ENV_FLOW_SRC_IPV6, IPV6_DEFAULT_SRC);
        let dst = env_or(env, ENV_FLOW_DST_IPV6, IPV6_DEFAULT_DST);
        match self {
            Side::First => (src, dst),
            Side::Second => (dst, src),
        }
    }
}

/// `$OTG_LOCATION_<PORT>` or the built-in location for that port.
pub fn port_location(env: Env, port: &str) -> String {
    let fallback = match Side::of_port(port) {
        Side::First => PORT_LOCATION_P1,
        Side::Second => PORT_LOCATION_P2,
    };
    env_or(
        env,
        &format!("OTG_LOCATION_{}", port.to_uppercase()),
        fallback,
    )
}

pub fn api_location(env: Env) -> String {
    env_or(env, ENV_API, API_DEFAULT)
}
