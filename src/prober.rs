//! Continuously measures one TTL until the trace stops (§4.5).

use crate::cancel::StopHandle;
use crate::hop::RouteHop;
use crate::net::dispatcher::RequestDispatcher;
use crate::reply_buffer::ReplyBuffer;
use parking_lot::RwLock;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// How often a measurement's wait loop rescans the reply buffer (§4.5
/// step 4).
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Run the measurement loop for a single, pre-existing TTL slot.
///
/// `index` (`ttl - 1`) identifies this hop's slot in the coordinator's
/// hop list; per §5, each index is written by exactly one hop prober,
/// so the shared lock only ever needs to be held briefly to publish a
/// result, never for the duration of a measurement's network I/O and
/// polling sleep (§5: "hold ... exclusively owns the list" refers to
/// ownership of *which thread* writes an index, not how long the lock
/// is held for any one update).
#[allow(clippy::too_many_arguments)]
pub fn run_hop_prober(
    index: usize,
    hops: &Arc<RwLock<Vec<RouteHop>>>,
    dispatcher: &Arc<RequestDispatcher>,
    reply_buffer: &Arc<ReplyBuffer>,
    found_all_hops: &Arc<AtomicBool>,
    stop: &StopHandle,
    base_port: u16,
    measurement_timeout: Duration,
) {
    let ttl = hops.read()[index].ttl();
    debug!(ttl, "hop prober starting");

    while !stop.is_set() {
        let mut hop = hops.read()[index].clone();
        hop.measure_once(
            dispatcher,
            reply_buffer,
            found_all_hops,
            stop,
            base_port,
            measurement_timeout,
            POLL_INTERVAL,
        );
        hops.write()[index] = hop;
    }
    debug!(ttl, "hop prober stopped");
}
