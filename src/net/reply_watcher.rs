//! Owns the raw ICMP socket, decodes inbound replies and appends them
//! to the shared ring buffer (§4.3).

use crate::cancel::StopHandle;
use crate::error::TraceResult;
use crate::net::platform;
use crate::packet::ProbeReply;
use crate::reply_buffer::ReplyBuffer;
use socket2::Socket;
use std::mem::MaybeUninit;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// How long each readiness poll waits before rechecking the stop
/// signal; bounds cancellation latency well under a second (§4.3).
const POLL_TIMEOUT: Duration = Duration::from_millis(200);

/// The maximum ICMP datagram size this crate will read (§4.3).
const MAX_PACKET_SIZE: usize = 1024;

/// Owns the raw ICMP receive socket and publishes decoded replies.
pub struct ReplyWatcher {
    socket: Socket,
}

impl ReplyWatcher {
    /// Open the raw ICMP socket. Fails with
    /// [`crate::error::TracerError::RawSocketPermission`] when the OS
    /// denies the capability (§4.3).
    pub fn new() -> TraceResult<Self> {
        Ok(Self {
            socket: platform::make_icmp_recv_socket()?,
        })
    }

    /// Run until `stop` is signaled: await one datagram per iteration,
    /// decode it and append the result to `reply_buffer`. Decode
    /// errors are logged and dropped; the loop continues (§4.3, §7).
    pub fn run(&self, reply_buffer: &Arc<ReplyBuffer>, stop: &StopHandle) {
        while !stop.is_set() {
            match platform::wait_readable(&self.socket, POLL_TIMEOUT) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(err) => {
                    debug!(error = %err, "reply watcher readiness poll failed");
                    continue;
                }
            }
            let mut buf = [MaybeUninit::uninit(); MAX_PACKET_SIZE];
            match self.socket.recv(&mut buf) {
                Ok(len) => {
                    // Safety: `recv` initialized the first `len` bytes.
                    let bytes: Vec<u8> = buf[..len]
                        .iter()
                        .map(|b| unsafe { b.assume_init() })
                        .collect();
                    match ProbeReply::decode(&bytes) {
                        Ok(reply) => reply_buffer.push(reply),
                        Err(err) => debug!(error = %err, "dropping undecodable packet"),
                    }
                }
                Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {}
                Err(err) => debug!(error = %err, "raw socket recv failed"),
            }
        }
    }
}
