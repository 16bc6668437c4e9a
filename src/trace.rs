//! Spawns per-TTL hop probers in a staggered fashion, detects when the
//! target has been reached, and controls trace lifecycle (§4.6).

use crate::cancel::StopHandle;
use crate::config::TraceParams;
use crate::error::TraceResult;
use crate::hop::{HopSnapshot, RouteHop};
use crate::net::dispatcher::RequestDispatcher;
use crate::net::reply_watcher::ReplyWatcher;
use crate::prober;
use crate::reply_buffer::ReplyBuffer;
use parking_lot::RwLock;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::debug;

/// Coordinates a continuous trace: launches the reply watcher, staggers
/// per-TTL hop probers, and exposes the live hop list (§4.6).
pub struct TraceCoordinator;

impl TraceCoordinator {
    /// Start a trace and return its handle immediately.
    ///
    /// The reply watcher and request dispatcher are constructed
    /// synchronously, before any thread is spawned, so a
    /// [`crate::error::TracerError::RawSocketPermission`] failure is
    /// returned directly and no trace begins (§8 scenario 6).
    ///
    /// `start` never blocks on [`TraceParams::return_early`] itself: the
    /// returned [`TraceHandle`] is the only thing that can stop the
    /// trace, so blocking here before it escapes would make the trace
    /// unstoppable. A caller with `return_early = false` gets the same
    /// "block until stopped" behavior by calling [`TraceHandle::join`]
    /// on the handle this function returns.
    pub fn start(params: TraceParams) -> TraceResult<TraceHandle> {
        params.validate();
        let target = params.target;

        let reply_watcher = ReplyWatcher::new()?;
        let dispatcher = Arc::new(RequestDispatcher::new()?);
        let reply_buffer = Arc::new(ReplyBuffer::new(params.reply_buffer_capacity));
        let hops = Arc::new(RwLock::new(Vec::with_capacity(usize::from(params.max_hops))));
        let found_all_hops = Arc::new(AtomicBool::new(false));
        let stop = StopHandle::new();

        let control_thread = {
            let hops = hops.clone();
            let found_all_hops = found_all_hops.clone();
            let stop = stop.clone();
            std::thread::Builder::new()
                .name("trace-control".into())
                .spawn(move || {
                    run_control_loop(
                        params,
                        reply_watcher,
                        dispatcher,
                        reply_buffer,
                        hops,
                        found_all_hops,
                        stop,
                    );
                })?
        };

        Ok(TraceHandle {
            target,
            hops,
            stop,
            control_thread: Some(control_thread),
        })
    }
}

/// Hosts the reply watcher and every per-TTL hop prober as scoped
/// threads. This is the Rust-native analogue of the original Python
/// implementation's `asyncio.TaskGroup`: `crossbeam::thread::scope`
/// guarantees every child thread is joined before it returns, so no
/// thread can leak past trace shutdown (§9).
#[allow(clippy::too_many_arguments)]
fn run_control_loop(
    params: TraceParams,
    reply_watcher: ReplyWatcher,
    dispatcher: Arc<RequestDispatcher>,
    reply_buffer: Arc<ReplyBuffer>,
    hops: Arc<RwLock<Vec<RouteHop>>>,
    found_all_hops: Arc<AtomicBool>,
    stop: StopHandle,
) {
    crossbeam::thread::scope(|scope| {
        let watcher_buffer = reply_buffer.clone();
        let watcher_stop = stop.clone();
        scope.spawn(move |_| {
            reply_watcher.run(&watcher_buffer, &watcher_stop);
        });

        for ttl in 1..=params.max_hops {
            if found_all_hops.load(Ordering::SeqCst) {
                debug!("target already reached, not spawning ttl {ttl}");
                break;
            }
            let index = {
                let mut hops = hops.write();
                hops.push(RouteHop::new(params.target, ttl, params.rtt_history_capacity));
                hops.len() - 1
            };
            let hops = hops.clone();
            let dispatcher = dispatcher.clone();
            let reply_buffer = reply_buffer.clone();
            let found_all_hops = found_all_hops.clone();
            let stop = stop.clone();
            let base_port = params.base_port;
            let measurement_timeout = params.measurement_timeout;
            scope.spawn(move |_| {
                prober::run_hop_prober(
                    index,
                    &hops,
                    &dispatcher,
                    &reply_buffer,
                    &found_all_hops,
                    &stop,
                    base_port,
                    measurement_timeout,
                );
            });

            if stop.wait_timeout(params.ttl_increment_delay) {
                break;
            }
        }
    })
    .expect("hop prober or reply watcher thread panicked");
}

/// A handle to a running trace: lets a caller read the live hop list
/// and stop the trace.
pub struct TraceHandle {
    target: Ipv4Addr,
    hops: Arc<RwLock<Vec<RouteHop>>>,
    stop: StopHandle,
    control_thread: Option<JoinHandle<()>>,
}

impl TraceHandle {
    /// The target this trace is routing to.
    #[must_use]
    pub fn target(&self) -> Ipv4Addr {
        self.target
    }

    /// A snapshot, ordered by TTL, of every hop that has at least one
    /// learned IP, truncated after (and including) the first hop whose
    /// address equals the target (§4.6).
    #[must_use]
    pub fn hops_snapshot(&self) -> Vec<HopSnapshot> {
        let hops = self.hops.read();
        let mut snapshot = Vec::with_capacity(hops.len());
        for hop in hops.iter() {
            let Some(hop_ipv4) = hop.hop_ipv4() else {
                continue;
            };
            let reached_target = hop_ipv4 == self.target;
            snapshot.push(HopSnapshot::from(hop));
            if reached_target {
                break;
            }
        }
        snapshot
    }

    /// Signal the trace to stop. Does not block; see [`Self::join`] to
    /// wait for every component thread to actually exit.
    pub fn stop(&self) {
        self.stop.set();
    }

    /// Whether [`Self::stop`] has been called.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stop.is_set()
    }

    /// Block until every component thread (reply watcher and all hop
    /// probers) has exited. Per §8, this must happen within one
    /// `measurement_timeout` plus one receive cycle of [`Self::stop`]
    /// being called.
    ///
    /// This is how a `return_early = false` caller gets `trace_route`'s
    /// documented "block and return only when stopped" behavior: call
    /// [`TraceCoordinator::start`], then `join` the handle it returns.
    /// `join` blocks forever unless something else (a signal handler, a
    /// timer, another thread) calls [`Self::stop`] first.
    pub fn join(mut self) -> TraceResult<()> {
        if let Some(control_thread) = self.control_thread.take() {
            control_thread.join().map_err(|_| {
                std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "trace control thread panicked",
                )
            })?;
        }
        Ok(())
    }
}

impl Drop for TraceHandle {
    fn drop(&mut self) {
        self.stop.set();
        if let Some(control_thread) = self.control_thread.take() {
            let _ = control_thread.join();
        }
    }
}
