//! Trace configuration and construction-time validation.
//!
//! Following the teacher's `config::validate_*` convention: these check
//! invariants once, at the point a `TraceParams` is assembled from
//! external input, and panic on violation rather than threading a
//! `Result` through every constructor. They are not probe-time checks.

use std::net::Ipv4Addr;
use std::time::Duration;

/// The fixed UDP base port; the destination port for a TTL `h` probe is
/// `BASE_PORT + h`.
pub const BASE_PORT: u16 = 33434;

/// Parameters for a single continuous trace.
#[derive(Debug, Clone)]
pub struct TraceParams {
    /// The target IPv4 address to trace a route to.
    pub target: Ipv4Addr,
    /// Highest TTL a hop prober will be spawned for.
    pub max_hops: u8,
    /// Documents the caller's intended usage: `TraceCoordinator::start`
    /// always returns its handle as soon as every hop prober has been
    /// spawned. A caller that wants the `return_early = false` behavior
    /// ("block until the trace is stopped") should call
    /// `TraceHandle::join` on the handle `start` returns; `start` itself
    /// never blocks on this flag, since the handle is the only thing
    /// able to stop the trace and blocking before it is returned would
    /// make the trace unstoppable.
    pub return_early: bool,
    /// Per-measurement timeout for a single probe/reply round trip.
    pub measurement_timeout: Duration,
    /// Delay between spawning consecutive per-TTL hop probers.
    pub ttl_increment_delay: Duration,
    /// UDP base port; destination port for TTL `h` is `base_port + h`.
    pub base_port: u16,
    /// Capacity of the shared reply ring buffer.
    pub reply_buffer_capacity: usize,
    /// Capacity of each hop's RTT sample history.
    pub rtt_history_capacity: usize,
}

impl TraceParams {
    /// Construct params for `target` with every other field at its
    /// documented default.
    #[must_use]
    pub fn new(target: Ipv4Addr) -> Self {
        Self {
            target,
            max_hops: 32,
            return_early: false,
            measurement_timeout: Duration::from_secs(1),
            ttl_increment_delay: Duration::from_millis(500),
            base_port: BASE_PORT,
            reply_buffer_capacity: 100,
            rtt_history_capacity: 100,
        }
    }

    pub(crate) fn validate(&self) {
        validate_max_hops(self.max_hops);
        validate_measurement_timeout(self.measurement_timeout);
        validate_ttl_increment_delay(self.ttl_increment_delay);
        validate_base_port(self.base_port);
    }
}

/// Panics if `max_hops` is zero.
pub fn validate_max_hops(max_hops: u8) {
    assert!(max_hops > 0, "max_hops must be greater than zero");
}

/// Panics if `timeout` is zero.
pub fn validate_measurement_timeout(timeout: Duration) {
    assert!(
        !timeout.is_zero(),
        "measurement_timeout must be greater than zero"
    );
}

/// Panics if `delay` is zero; a zero stagger defeats the purpose of
/// spreading out probe dispatch described in §4.6.
pub fn validate_ttl_increment_delay(delay: Duration) {
    assert!(
        !delay.is_zero(),
        "ttl_increment_delay must be greater than zero"
    );
}

/// Panics if `port` would let `base_port + 255` overflow `u16`.
pub fn validate_base_port(port: u16) {
    assert!(
        port.checked_add(255).is_some(),
        "base_port {port} is too high: base_port + ttl must fit in a u16"
    );
}
