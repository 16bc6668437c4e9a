//! Hostname resolution collaborator (§6).
//!
//! Out of scope beyond this single lookup call: the engine itself never
//! re-resolves, retries or caches. Grounded in the teacher's
//! `dns::DnsResolver`, which `main.rs` calls once before building a
//! `TracerConfig`.

use crate::error::{TraceResult, TracerError};
use std::net::{IpAddr, Ipv4Addr};

/// Resolve `host` to exactly one IPv4 address.
///
/// Fails with [`TracerError::InvalidAddress`] if `host` is not a valid
/// hostname/address or resolves to zero or more than one IPv4 address.
pub fn resolve(host: &str) -> TraceResult<Ipv4Addr> {
    let addrs = dns_lookup::lookup_host(host)
        .map_err(|err| TracerError::InvalidAddress(format!("{host}: {err}")))?;
    let mut ipv4_addrs = addrs.into_iter().filter_map(|addr| match addr {
        IpAddr::V4(v4) => Some(v4),
        IpAddr::V6(_) => None,
    });
    let first = ipv4_addrs
        .next()
        .ok_or_else(|| TracerError::InvalidAddress(host.to_string()))?;
    if ipv4_addrs.next().is_some() {
        return Err(TracerError::InvalidAddress(format!(
            "{host} resolved to more than one IPv4 address"
        )));
    }
    Ok(first)
}
