use super::defaults;
use crate::error::{OtgenError, Result};
use crate::otg::{
    BgpAsType, BgpV4Interface, BgpV4Peer, BgpV4RouteRange, Config, Extra, NextHopMode,
    V4RouteAddress,
};
use std::net::Ipv4Addr;
use tracing::debug;

/// An IPv4 route to advertise, parsed from `a.b.c.d/nn`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSpec {
    pub address: String,
    pub prefix: u32,
}

#[derive(Debug, Clone)]
pub struct BgpOptions {
    pub device: String,
    pub router_id: Option<String>,
    pub asn: u32,
    pub peer: Option<String>,
    pub as_type: BgpAsType,
    pub route: Option<RouteSpec>,
}

impl Default for BgpOptions {
    fn default() -> Self {
        BgpOptions {
            device: defaults::DEVICE_NAME_1.to_string(),
            router_id: None,
            asn: defaults::BGP_ASN_DEFAULT,
            peer: None,
            as_type: BgpAsType::Ebgp,
            route: None,
        }
    }
}

pub fn parse_as_type(s: &str) -> std::result::Result<BgpAsType, String> {
    match s {
        "ebgp" | "eBGP" | "EBGP" | "e" => Ok(BgpAsType::Ebgp),
        "ibgp" | "iBGP" | "IBGP" | "i" => Ok(BgpAsType::Ibgp),
        _ => Err(format!("Unsupported BGP peer type: {s}")),
    }
}

pub fn parse_route(s: &str) -> std::result::Result<RouteSpec, String> {
    let Some((address, prefix)) = s.split_once('/') else {
        return Err(format!("Route parameter does not follow x.x.x.x/nn format: {s}"));
    };
    if address.parse::<Ipv4Addr>().is_err() {
        return Err(format!("Route parameter does not follow x.x.x.x/nn format: {s}"));
    }
    let prefix: u32 = prefix
        .parse()
        .map_err(|_| format!("Wrong netmask prefix format in the route: {s}"))?;
    if prefix > 32 {
        return Err(format!("Netmask prefix has to be from 0 to 32 in the route: {s}"));
    }
    Ok(RouteSpec {
        address: address.to_string(),
        prefix,
    })
}

/// 给已有设备的第一个 IPv4 接口添加或更新 BGP 配置。
pub fn apply_bgp(config: &mut Config, opts: &BgpOptions) -> Result<()> {
    let device = config
        .device_mut(&opts.device)
        .ok_or_else(|| OtgenError::NotFound {
            kind: "device",
            name: opts.device.clone(),
        })?;
    debug!(device = %opts.device, "found matching device name");

    let ipv4 = device.first_ipv4().cloned().ok_or_else(|| {
        OtgenError::invalid(format!("Device {} has no IPv4 interface", opts.device))
    })?;

    let bgp = device.bgp.get_or_insert_with(Default::default);
    bgp.router_id = opts
        .router_id
        .clone()
        .unwrap_or_else(|| ipv4.address.clone());

    let iface_idx = match bgp
        .ipv4_interfaces
        .iter()
        .position(|i| i.ipv4_name == ipv4.name)
    {
        Some(idx) => {
            debug!(address = %ipv4.address, "BGP configuration already exists, will update");
            idx
        }
        None => {
            bgp.ipv4_interfaces.push(BgpV4Interface {
                ipv4_name: ipv4.name.clone(),
                peers: Vec::new(),
                extra: Extra::new(),
            });
            bgp.ipv4_interfaces.len() - 1
        }
    };
    let iface = &mut bgp.ipv4_interfaces[iface_idx];

    // Default peer is the interface gateway.
    let peer_ip = opts.peer.clone().unwrap_or_else(|| ipv4.gateway.clone());
    let peer_idx = match iface.peers.iter().position(|p| p.peer_address == peer_ip) {
        Some(idx) => {
            debug!(peer = %peer_ip, address = %ipv4.address, "BGP peer already exists, will update");
            idx
        }
        None => {
            debug!(
                address = %ipv4.address,
                asn = opts.asn,
                peer = %peer_ip,
                "adding BGP peer to the device's IPv4 interface"
            );
            iface.peers.push(BgpV4Peer {
                name: format!("{}.bgp.peer.{}", ipv4.name, peer_ip),
                peer_address: peer_ip.clone(),
                as_type: opts.as_type,
                as_number: opts.asn,
                v4_routes: Vec::new(),
                extra: Extra::new(),
            });
            iface.peers.len() - 1
        }
    };
    let peer = &mut iface.peers[peer_idx];
    peer.as_number = opts.asn;
    peer.as_type = opts.as_type;
    peer.peer_address = peer_ip;

    if let Some(route) = &opts.route {
        add_route(peer, route);
    }
    Ok(())
}

fn add_route(peer: &mut BgpV4Peer, route: &RouteSpec) {
    let rr_idx = match peer
        .v4_routes
        .iter()
        .position(|rr| rr.next_hop_mode == Some(NextHopMode::LocalIp))
    {
        Some(idx) => {
            debug!(peer = %peer.name, "reusing route range with local_ip next hop");
            idx
        }
        None => {
            let idx = peer.v4_routes.len();
            peer.v4_routes.push(BgpV4RouteRange {
                name: format!("{}.rr4[{}]", peer.name, idx),
                ..Default::default()
            });
            idx
        }
    };
    let rr = &mut peer.v4_routes[rr_idx];
    rr.next_hop_mode = Some(NextHopMode::LocalIp);

    let addr_idx = match rr.addresses.iter().position(|a| a.address == route.address) {
        Some(idx) => idx,
        None => {
            debug!(route = %route.address, prefix = route.prefix, "adding route");
            rr.addresses.push(V4RouteAddress {
                address: route.address.clone(),
                prefix: route.prefix,
                count: 1,
                step: 1,
                extra: Extra::new(),
            });
            rr.addresses.len() - 1
        }
    };
    let addr = &mut rr.addresses[addr_idx];
    addr.prefix = route.prefix;
    addr.count = 1;
    addr.step = 1;
}
