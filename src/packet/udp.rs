//! Decoded view of a UDP header.

/// Source and destination port of a UDP datagram. Length and checksum
/// are present on the wire but unused by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UdpHeader {
    pub source_port: u16,
    pub destination_port: u16,
}

/// Decode an 8-byte UDP header (source port, destination port, length,
/// checksum).
///
/// # Panics
///
/// Panics if `bytes` is shorter than 8 bytes.
#[must_use]
pub fn decode(bytes: &[u8]) -> UdpHeader {
    assert!(bytes.len() >= 8, "UDP header requires 8 bytes");
    UdpHeader {
        source_port: u16::from_be_bytes([bytes[0], bytes[1]]),
        destination_port: u16::from_be_bytes([bytes[2], bytes[3]]),
    }
}

/// Encode an 8-byte UDP header matching [`decode`]'s layout (length and
/// checksum left zeroed; only used by round-trip tests).
#[must_use]
#[cfg(test)]
pub fn encode(header: &UdpHeader) -> [u8; 8] {
    let mut out = [0u8; 8];
    out[0..2].copy_from_slice(&header.source_port.to_be_bytes());
    out[2..4].copy_from_slice(&header.destination_port.to_be_bytes());
    out
}
