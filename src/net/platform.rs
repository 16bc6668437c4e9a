//! Socket construction and readiness polling, grounded in the teacher's
//! `tracing::net::platform` split (`make_recv_socket_ipv4`,
//! `is_readable`). This crate targets Unix raw ICMP sockets only; the
//! Windows `OVERLAPPED`/`WSAWaitForMultipleEvents` path the teacher also
//! carries is dropped (see DESIGN.md).

use crate::error::{TraceResult, TracerError};
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::net::{Ipv4Addr, SocketAddr};
use std::os::unix::io::AsRawFd;
use std::time::Duration;
use tracing::warn;

/// Open a non-blocking raw ICMP socket for receiving probe replies.
///
/// Requires `CAP_NET_RAW` on Linux (or an equivalent raw-socket
/// capability elsewhere); on denial returns
/// [`TracerError::RawSocketPermission`] with remediation text (§4.3,
/// §6).
pub fn make_icmp_recv_socket() -> TraceResult<Socket> {
    let socket = Socket::new(Domain::IPV4, Type::RAW, Some(Protocol::ICMPV4)).map_err(|err| {
        warn!(error = %err, "failed to open raw ICMP socket");
        permission_error(&err)
    })?;
    socket.set_nonblocking(true)?;
    Ok(socket)
}

/// Open a non-blocking UDP socket for dispatching probes. This needs no
/// elevated capability; any process may send UDP datagrams.
pub fn make_udp_send_socket() -> TraceResult<Socket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_nonblocking(true)?;
    Ok(socket)
}

/// Set the outbound `IP_TTL` socket option to `ttl`.
///
/// Split out from the send call itself so a caller can set the TTL,
/// stamp a dispatch timestamp, and only then call [`send_to`] —
/// matching §4.4's required "setsockopt(IP_TTL), timestamp, sendto"
/// ordering so the timestamp excludes the setsockopt syscall.
pub fn set_ttl(socket: &Socket, ttl: u8) -> TraceResult<()> {
    socket.set_ttl(u32::from(ttl))?;
    Ok(())
}

/// Send `payload` to `(target, port)` on `socket`'s current `IP_TTL`.
pub fn send_to(socket: &Socket, payload: &[u8], target: Ipv4Addr, port: u16) -> TraceResult<()> {
    let dest = SockAddr::from(SocketAddr::from((target, port)));
    socket.send_to(payload, &dest)?;
    Ok(())
}

/// Block up to `timeout` for `socket` to become readable. Used by the
/// reply watcher to cancel its receive loop promptly on stop (§4.3,
/// §4.7) without a blocking `recv` that could outlive `stop`.
pub fn wait_readable(socket: &Socket, timeout: Duration) -> TraceResult<bool> {
    let millis = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX);
    let mut fds = [nix::poll::PollFd::new(socket.as_raw_fd(), nix::poll::PollFlags::POLLIN)];
    let ready = nix::poll::poll(&mut fds, millis).map_err(std::io::Error::from)?;
    Ok(ready > 0)
}

#[cfg(target_os = "linux")]
fn permission_error(err: &std::io::Error) -> TracerError {
    if err.kind() == std::io::ErrorKind::PermissionDenied
        && !caps::has_cap(None, caps::CapSet::Effective, caps::Capability::CAP_NET_RAW)
            .unwrap_or(false)
    {
        return TracerError::RawSocketPermission {
            remediation: "grant CAP_NET_RAW to this binary (`sudo setcap cap_net_raw+ep \
                <path>`) or run as a privileged user"
                .to_string(),
        };
    }
    TracerError::Io(std::io::Error::new(err.kind(), err.to_string()))
}

#[cfg(not(target_os = "linux"))]
fn permission_error(err: &std::io::Error) -> TracerError {
    if err.kind() == std::io::ErrorKind::PermissionDenied {
        return TracerError::RawSocketPermission {
            remediation: "run as a privileged user to open a raw ICMP socket".to_string(),
        };
    }
    TracerError::Io(std::io::Error::new(err.kind(), err.to_string()))
}
