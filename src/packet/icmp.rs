//! Decoded view of an ICMP type/code header.

/// ICMP Time Exceeded.
pub const TYPE_TIME_EXCEEDED: u8 = 11;
/// ICMP Destination Unreachable.
pub const TYPE_DESTINATION_UNREACHABLE: u8 = 3;

/// The first four bytes of an ICMP message: type, code and checksum.
/// The checksum is not retained; the kernel has already validated
/// link-layer integrity by the time this reaches a raw socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IcmpHeader {
    pub kind: u8,
    pub code: u8,
}

/// Decode a 4-byte ICMP type/code/checksum header.
///
/// # Panics
///
/// Panics if `bytes` is shorter than 4 bytes.
#[must_use]
pub fn decode(bytes: &[u8]) -> IcmpHeader {
    assert!(bytes.len() >= 4, "ICMP header requires 4 bytes");
    IcmpHeader {
        kind: bytes[0],
        code: bytes[1],
    }
}

/// Encode a 4-byte ICMP header matching [`decode`]'s layout (checksum
/// left zeroed; only used by round-trip tests).
#[must_use]
#[cfg(test)]
pub fn encode(header: &IcmpHeader) -> [u8; 4] {
    [header.kind, header.code, 0, 0]
}
