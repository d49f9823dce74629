// netinfo.rs (linux-only)
use local_ip_address::list_afinet_netifas;
use log::debug;
use std::fs;
use std::io;
use std::net::IpAddr;

pub const NO_IP: &str = "000.000.000.000";
pub const NO_MAC: &str = "00:00:00:00:00:00";

/// Address pair shown for one interface on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceInfo {
    pub name: String,
    pub ip: String,
    pub mac: String,
}

impl InterfaceInfo {
    pub fn unknown(name: &str) -> Self {
        Self { name: name.to_string(), ip: NO_IP.to_string(), mac: NO_MAC.to_string() }
    }
}

pub fn get_mac_addr_for(ifname: &str) -> io::Result<String> {
    let p = format!("/sys/class/net/{}/address", ifname);
    let s = fs::read_to_string(p)?;
    Ok(s.trim().to_ascii_lowercase())
}

/// sysfs first, then the mac_address crate, then the sentinel.
pub fn mac_or_default(ifname: &str) -> String {
    match get_mac_addr_for(ifname) {
        Ok(mac) if !mac.is_empty() => mac,
        _ => match mac_address::mac_address_by_name(ifname) {
            Ok(Some(mac)) => mac.to_string().to_ascii_lowercase(),
            other => {
                debug!("no MAC for {}: {:?}", ifname, other.err());
                NO_MAC.to_string()
            }
        },
    }
}

/// First IPv4 address bound to `ifname`, or the sentinel.
pub fn ip_or_default(ifname: &str) -> String {
    match list_afinet_netifas() {
        Ok(ifas) => ifas
            .into_iter()
            .find(|(name, ip)| name == ifname && matches!(ip, IpAddr::V4(_)))
            .map(|(_, ip)| ip.to_string())
            .unwrap_or_else(|| NO_IP.to_string()),
        Err(e) => {
            debug!("interface list unavailable: {}", e);
            NO_IP.to_string()
        }
    }
}

pub fn interface_info(ifname: &str) -> InterfaceInfo {
    InterfaceInfo {
        name: ifname.to_string(),
        ip: ip_or_default(ifname),
        mac: mac_or_default(ifname),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_interface_gets_sentinels() {
        let info = interface_info("octomon-does-not-exist0");
        assert_eq!(info.ip, NO_IP);
        assert_eq!(info.mac, NO_MAC);
    }

    #[test]
    fn test_unknown_matches_sentinels() {
        let info = InterfaceInfo::unknown("eth0");
        assert_eq!(info.name, "eth0");
        assert_eq!(info.ip, NO_IP);
        assert_eq!(info.mac, NO_MAC);
    }
}
