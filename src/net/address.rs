//! Rendezvous address selection.
//!
//! Picks one local address to bind the listener to. Enumeration goes through
//! `getifaddrs(3)`; the filtering and the choice among survivors are plain
//! functions over [`InterfaceEntry`] so they can be driven from fixtures.

use std::fmt;
use std::net::{IpAddr, SocketAddr, SocketAddrV4, SocketAddrV6};

use nix::ifaddrs::getifaddrs;
use nix::net::if_::InterfaceFlags;
use nix::sys::socket::SockaddrLike;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while choosing a bind address.
#[derive(Error, Debug)]
pub enum AddressError {
    #[error("getifaddrs failed: {0}")]
    Enumerate(#[from] nix::Error),

    #[error("Could not find an acceptable address to bind to")]
    NoUsableAddress,
}

/// Address family of a bind address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressFamily {
    V4,
    V6,
}

impl AddressFamily {
    /// Family of a socket address.
    pub fn of(addr: &SocketAddr) -> Self {
        match addr {
            SocketAddr::V4(_) => Self::V4,
            SocketAddr::V6(_) => Self::V6,
        }
    }
}

/// The address of one interface entry, as far as the selector cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterfaceAddress {
    V4(SocketAddrV4),
    V6(SocketAddrV6),
    /// Link-layer or any other family the selector does not bind to.
    Unsupported(String),
}

/// One `(interface, address)` pair from enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceEntry {
    pub name: String,
    pub loopback: bool,
    pub up: bool,
    pub address: Option<InterfaceAddress>,
}

impl InterfaceEntry {
    /// The bindable socket address of this entry, if it has one.
    pub fn socket_addr(&self) -> Option<SocketAddr> {
        match &self.address {
            Some(InterfaceAddress::V4(a)) => Some(SocketAddr::V4(SocketAddrV4::new(*a.ip(), 0))),
            Some(InterfaceAddress::V6(a)) => Some(SocketAddr::V6(SocketAddrV6::new(
                *a.ip(),
                0,
                a.flowinfo(),
                a.scope_id(),
            ))),
            _ => None,
        }
    }
}

impl fmt::Display for InterfaceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V4(a) => write!(f, "{}", a.ip()),
            Self::V6(a) => write!(f, "{}", a.ip()),
            Self::Unsupported(family) => write!(f, "<{}>", family),
        }
    }
}

/// Address chosen for the listener. The port is always 0 here; the real one
/// is only known after binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindAddress {
    pub family: AddressFamily,
    pub addr: SocketAddr,
}

impl BindAddress {
    /// Wraps an explicit address, keeping the port at 0.
    pub fn from_ip(ip: IpAddr) -> Self {
        let addr = SocketAddr::new(ip, 0);
        Self {
            family: AddressFamily::of(&addr),
            addr,
        }
    }
}

/// Chooses one address among the entries that passed filtering.
pub type AddressPolicy = fn(&[&InterfaceEntry]) -> Option<SocketAddr>;

/// Takes the first usable entry in enumeration order.
///
/// No preference for link-local vs routable addresses or for wireless vs
/// wired interfaces.
pub fn first_usable(candidates: &[&InterfaceEntry]) -> Option<SocketAddr> {
    candidates.iter().find_map(|entry| entry.socket_addr())
}

/// Lists every interface address on this host.
pub fn enumerate_interfaces() -> Result<Vec<InterfaceEntry>, AddressError> {
    // The iterator owns the getifaddrs snapshot and frees it on drop.
    let entries = getifaddrs()?
        .map(|ifa| {
            let address = ifa.address.as_ref().map(|storage| {
                if let Some(sin) = storage.as_sockaddr_in() {
                    InterfaceAddress::V4(SocketAddrV4::from(*sin))
                } else if let Some(sin6) = storage.as_sockaddr_in6() {
                    InterfaceAddress::V6(SocketAddrV6::from(*sin6))
                } else {
                    InterfaceAddress::Unsupported(format!("{:?}", storage.family()))
                }
            });

            InterfaceEntry {
                name: ifa.interface_name,
                loopback: ifa.flags.contains(InterfaceFlags::IFF_LOOPBACK),
                up: ifa.flags.contains(InterfaceFlags::IFF_UP),
                address,
            }
        })
        .collect();

    Ok(entries)
}

/// Filters `entries` and applies `policy` to what remains.
pub fn select_from(
    entries: &[InterfaceEntry],
    policy: AddressPolicy,
) -> Result<BindAddress, AddressError> {
    let mut candidates = Vec::new();

    for entry in entries {
        if entry.loopback {
            debug!("skipping {} because it is loopback", entry.name);
            continue;
        }
        if !entry.up {
            debug!("skipping {} because it is not up", entry.name);
            continue;
        }
        match &entry.address {
            Some(InterfaceAddress::V4(_)) | Some(InterfaceAddress::V6(_)) => {
                candidates.push(entry)
            }
            Some(InterfaceAddress::Unsupported(_)) | None => {}
        }
    }

    let addr = policy(&candidates).ok_or(AddressError::NoUsableAddress)?;

    for entry in &candidates {
        let chosen = entry.socket_addr().map(|a| a.ip()) == Some(addr.ip());
        if let Some(address) = &entry.address {
            debug!(
                "{} {}: {}",
                if chosen { "*" } else { " " },
                entry.name,
                address
            );
        }
    }

    Ok(BindAddress {
        family: AddressFamily::of(&addr),
        addr,
    })
}

/// Enumerates the host interfaces and picks the first usable address.
pub fn select_bind_address() -> Result<BindAddress, AddressError> {
    let entries = enumerate_interfaces()?;
    select_from(&entries, first_usable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    fn v4(name: &str, ip: [u8; 4], loopback: bool, up: bool) -> InterfaceEntry {
        InterfaceEntry {
            name: name.to_string(),
            loopback,
            up,
            address: Some(InterfaceAddress::V4(SocketAddrV4::new(Ipv4Addr::from(ip), 0))),
        }
    }

    fn v6(name: &str, ip: Ipv6Addr, scope: u32) -> InterfaceEntry {
        InterfaceEntry {
            name: name.to_string(),
            loopback: false,
            up: true,
            address: Some(InterfaceAddress::V6(SocketAddrV6::new(ip, 0, 0, scope))),
        }
    }

    #[test]
    fn test_loopback_up_and_other_down_fails() {
        let entries = vec![
            v4("lo", [127, 0, 0, 1], true, true),
            v4("eth0", [192, 168, 1, 10], false, false),
        ];
        assert!(matches!(
            select_from(&entries, first_usable),
            Err(AddressError::NoUsableAddress)
        ));
    }

    #[test]
    fn test_empty_enumeration_fails() {
        assert!(matches!(
            select_from(&[], first_usable),
            Err(AddressError::NoUsableAddress)
        ));
    }

    #[test]
    fn test_picks_first_usable() {
        let entries = vec![
            v4("lo", [127, 0, 0, 1], true, true),
            InterfaceEntry {
                name: "eth0".to_string(),
                loopback: false,
                up: true,
                address: Some(InterfaceAddress::Unsupported("Packet".to_string())),
            },
            InterfaceEntry {
                name: "tun0".to_string(),
                loopback: false,
                up: true,
                address: None,
            },
            v4("eth1", [10, 0, 0, 2], false, false),
            v4("wlan0", [192, 168, 1, 20], false, true),
            v4("eth2", [172, 16, 0, 3], false, true),
        ];

        let chosen = select_from(&entries, first_usable).unwrap();
        assert_eq!(chosen.family, AddressFamily::V4);
        assert_eq!(chosen.addr, "192.168.1.20:0".parse().unwrap());
    }

    #[test]
    fn test_v6_keeps_scope_and_zero_port() {
        let ip: Ipv6Addr = "fe80::1".parse().unwrap();
        let entries = vec![v6("eth0", ip, 3)];

        let chosen = select_from(&entries, first_usable).unwrap();
        assert_eq!(chosen.family, AddressFamily::V6);
        match chosen.addr {
            SocketAddr::V6(a) => {
                assert_eq!(*a.ip(), ip);
                assert_eq!(a.port(), 0);
                assert_eq!(a.scope_id(), 3);
            }
            SocketAddr::V4(_) => panic!("expected v6"),
        }
    }

    #[test]
    fn test_never_selects_loopback_or_down() {
        let entries = vec![
            v4("lo", [127, 0, 0, 1], true, true),
            v4("lo2", [127, 0, 0, 2], true, false),
            v4("eth0", [10, 1, 1, 1], false, false),
            v4("eth1", [10, 2, 2, 2], false, true),
        ];
        let chosen = select_from(&entries, first_usable).unwrap();
        assert_eq!(chosen.addr.ip(), IpAddr::from([10, 2, 2, 2]));
    }

    #[test]
    fn test_custom_policy() {
        fn prefer_v6(candidates: &[&InterfaceEntry]) -> Option<SocketAddr> {
            candidates
                .iter()
                .filter_map(|e| e.socket_addr())
                .find(|a| a.is_ipv6())
        }

        let entries = vec![
            v4("eth0", [10, 0, 0, 1], false, true),
            v6("eth0", "2001:db8::1".parse().unwrap(), 0),
        ];
        let chosen = select_from(&entries, prefer_v6).unwrap();
        assert_eq!(chosen.family, AddressFamily::V6);
    }

    #[test]
    fn test_bind_address_from_ip() {
        let bind = BindAddress::from_ip(IpAddr::from([127, 0, 0, 1]));
        assert_eq!(bind.family, AddressFamily::V4);
        assert_eq!(bind.addr.port(), 0);
    }

    #[test]
    fn test_enumerate_host_interfaces() {
        // Every host has at least a loopback interface.
        let entries = enumerate_interfaces().unwrap();
        assert!(!entries.is_empty());
    }
}
