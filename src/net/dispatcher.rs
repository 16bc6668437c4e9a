//! Request dispatcher: owns the UDP send socket and serializes the
//! non-atomic `setsockopt(IP_TTL)` + `sendto` pair across every hop
//! prober (§4.4).

use crate::error::TraceResult;
use crate::net::platform;
use crate::packet::ProbeRequest;
use parking_lot::Mutex;
use socket2::Socket;

/// Dispatches UDP probes on a single shared socket.
///
/// The `setsockopt(IP_TTL)` + `sendto` sequence is not atomic at the
/// socket level, so dispatches from concurrent hop probers must be
/// serialized; this type does so with an internal mutex rather than
/// requiring the caller to coordinate (§4.4/§5: "the source serializes
/// via a single shared dispatcher").
pub struct RequestDispatcher {
    socket: Mutex<Socket>,
}

impl RequestDispatcher {
    /// Open a fresh UDP send socket.
    pub fn new() -> TraceResult<Self> {
        Ok(Self {
            socket: Mutex::new(platform::make_udp_send_socket()?),
        })
    }

    /// Set `IP_TTL` to `request.ttl`, stamp `request.dispatch_ts`
    /// immediately before the send call, then send its payload to
    /// `(request.target, request.port)` — in that order, so the
    /// measured RTT excludes the `setsockopt` syscall and covers only
    /// user-space work after the send (§4.4).
    pub fn dispatch(&self, request: &mut ProbeRequest) -> TraceResult<()> {
        let socket = self.socket.lock();
        platform::set_ttl(&socket, request.ttl)?;
        request.mark_dispatched();
        platform::send_to(&socket, &request.payload, request.target, request.port)
    }
}
