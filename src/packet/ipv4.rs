//! Decoded view of an IPv4 header.

use std::net::Ipv4Addr;

/// Protocol number for ICMP.
pub const PROTO_ICMP: u8 = 1;
/// Protocol number for UDP.
pub const PROTO_UDP: u8 = 17;

/// The fields of an IPv4 header this crate cares about.
///
/// No checksum validation is performed: the kernel has already done
/// link-layer work by the time a raw socket hands us the packet (§4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Header {
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
    pub ttl: u8,
    pub protocol: u8,
}

/// Decode a 20-byte IPv4 header (IHL=5 assumed, per §4.1/§9).
///
/// # Panics
///
/// Panics if `bytes` is shorter than 20 bytes; callers are expected to
/// have already sliced a buffer of at least that length.
#[must_use]
pub fn decode(bytes: &[u8]) -> Ipv4Header {
    assert!(bytes.len() >= 20, "IPv4 header requires 20 bytes");
    let ttl = bytes[8];
    let protocol = bytes[9];
    let source = Ipv4Addr::new(bytes[12], bytes[13], bytes[14], bytes[15]);
    let destination = Ipv4Addr::new(bytes[16], bytes[17], bytes[18], bytes[19]);
    Ipv4Header {
        source,
        destination,
        ttl,
        protocol,
    }
}

/// Encode a minimal 20-byte IPv4 header matching [`decode`]'s layout.
///
/// Used only by tests to exercise the round-trip law from §8; this
/// crate never constructs outbound IPv4 headers by hand (the kernel
/// builds those for us when we `send_to` on a UDP socket).
#[must_use]
#[cfg(test)]
pub fn encode(header: &Ipv4Header) -> [u8; 20] {
    let mut out = [0u8; 20];
    out[0] = 0x45; // version 4, IHL 5
    out[8] = header.ttl;
    out[9] = header.protocol;
    out[12..16].copy_from_slice(&header.source.octets());
    out[16..20].copy_from_slice(&header.destination.octets());
    out
}
