//! `ProbeRequest`/`ProbeReply` correlation and the raw-buffer decode that
//! turns a received ICMP datagram into a `ProbeReply` (§3, §4.1).

use crate::clock::MonotonicInstant;
use crate::error::TracerError;
use crate::packet::{icmp, ipv4, udp};
use rand::RngCore;
use std::net::Ipv4Addr;

/// Number of random bytes carried as the UDP probe payload and, when
/// present, echoed back inside the ICMP reply.
pub const PAYLOAD_SIZE: usize = 8;

/// Offsets into a raw ICMP datagram, per §4.1's fixed-IHL=5 layout.
mod offset {
    pub const OUTER_IPV4: std::ops::Range<usize> = 0..20;
    pub const ICMP: std::ops::Range<usize> = 20..24;
    // 24..28 is the unused ICMP "rest of header".
    pub const INNER_IPV4: std::ops::Range<usize> = 28..48;
    pub const INNER_UDP: std::ops::Range<usize> = 48..56;
    pub const INNER_PAYLOAD_START: usize = 56;
}

/// An outbound UDP probe, identified by a fixed, freshly-generated
/// 8-byte payload that doubles as the correlation key for the ICMP
/// reply it provokes.
#[derive(Debug, Clone)]
pub struct ProbeRequest {
    pub target: Ipv4Addr,
    pub ttl: u8,
    pub port: u16,
    pub payload: [u8; PAYLOAD_SIZE],
    pub created_at: MonotonicInstant,
    pub dispatch_ts: MonotonicInstant,
}

impl ProbeRequest {
    /// Build a fresh probe for `target` at `ttl`, with a new random
    /// payload and destination port `base_port + ttl`.
    #[must_use]
    pub fn new(target: Ipv4Addr, ttl: u8, base_port: u16) -> Self {
        let mut payload = [0u8; PAYLOAD_SIZE];
        rand::thread_rng().fill_bytes(&mut payload);
        let now = MonotonicInstant::now();
        Self {
            target,
            ttl,
            port: base_port + u16::from(ttl),
            payload,
            created_at: now,
            dispatch_ts: now,
        }
    }

    /// Construct a probe with an explicit payload, bypassing random
    /// generation, for deterministic tests.
    #[cfg(test)]
    #[must_use]
    pub fn with_payload(
        target: Ipv4Addr,
        ttl: u8,
        base_port: u16,
        payload: [u8; PAYLOAD_SIZE],
    ) -> Self {
        let now = MonotonicInstant::now();
        Self {
            target,
            ttl,
            port: base_port + u16::from(ttl),
            payload,
            created_at: now,
            dispatch_ts: now,
        }
    }

    /// Stamp `dispatch_ts` to "now", immediately before the send system
    /// call, so RTT excludes only user-space post-send work (§4.4).
    pub fn mark_dispatched(&mut self) {
        self.dispatch_ts = MonotonicInstant::now();
    }

    /// Whether `reply` correlates with this request, per §4.5's
    /// two-rule match: an echoed payload match, or a (dst-ip, dst-port)
    /// match when the payload was truncated away.
    #[must_use]
    pub fn matches(&self, reply: &ProbeReply) -> bool {
        if let Some(echoed) = reply.inner_udp_payload {
            if echoed == self.payload {
                return true;
            }
        }
        self.target == reply.inner_ipv4.destination && self.port == reply.inner_udp.destination_port
    }
}

/// A decoded ICMP reply to one of our UDP probes.
#[derive(Debug, Clone)]
pub struct ProbeReply {
    pub received_at: MonotonicInstant,
    pub outer_ipv4: ipv4::Ipv4Header,
    pub icmp: icmp::IcmpHeader,
    pub inner_ipv4: ipv4::Ipv4Header,
    pub inner_udp: udp::UdpHeader,
    pub inner_udp_payload: Option<[u8; PAYLOAD_SIZE]>,
}

impl ProbeReply {
    /// Decode a raw ICMP datagram captured on the raw socket.
    ///
    /// Fails with [`TracerError::InvalidProbeReply`] when the outer
    /// protocol isn't ICMP or the echoed inner protocol isn't UDP, per
    /// §3/§4.1.
    pub fn decode(bytes: &[u8]) -> Result<Self, TracerError> {
        if bytes.len() < offset::INNER_UDP.end {
            return Err(TracerError::InvalidProbeReply(format!(
                "packet too short: {} bytes",
                bytes.len()
            )));
        }
        let outer_ipv4 = ipv4::decode(&bytes[offset::OUTER_IPV4]);
        if outer_ipv4.protocol != ipv4::PROTO_ICMP {
            return Err(TracerError::InvalidProbeReply(format!(
                "outer IPv4 protocol {} is not ICMP",
                outer_ipv4.protocol
            )));
        }
        let icmp = icmp::decode(&bytes[offset::ICMP]);
        let inner_ipv4 = ipv4::decode(&bytes[offset::INNER_IPV4]);
        if inner_ipv4.protocol != ipv4::PROTO_UDP {
            return Err(TracerError::InvalidProbeReply(format!(
                "echoed inner IPv4 protocol {} is not UDP",
                inner_ipv4.protocol
            )));
        }
        let inner_udp = udp::decode(&bytes[offset::INNER_UDP]);
        let inner_udp_payload = bytes
            .get(offset::INNER_PAYLOAD_START..offset::INNER_PAYLOAD_START + PAYLOAD_SIZE)
            .and_then(|slice| slice.try_into().ok());
        Ok(Self {
            received_at: MonotonicInstant::now(),
            outer_ipv4,
            icmp,
            inner_ipv4,
            inner_udp,
            inner_udp_payload,
        })
    }
}
