//! Where the listener binds and how the peer is told about it.

pub mod address;
pub mod uri;

pub use address::{
    enumerate_interfaces, first_usable, select_bind_address, select_from, AddressError,
    AddressFamily, AddressPolicy, BindAddress, InterfaceAddress, InterfaceEntry,
};
pub use uri::{build_uri, RendezvousUri, UriError, URI_CAPACITY, URI_MIN_LEN};
