//! IPv4/ICMP/UDP packet codec (§4.1) and probe/reply correlation (§3, §4.5).

pub mod icmp;
pub mod ipv4;
pub mod reply;
pub mod udp;

pub use icmp::IcmpHeader;
pub use ipv4::Ipv4Header;
pub use reply::{ProbeReply, ProbeRequest, PAYLOAD_SIZE};
pub use udp::UdpHeader;
