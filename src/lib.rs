//! `udptrace-core`: a continuous UDP traceroute engine.
//!
//! Probes each TTL along a route with UDP datagrams, correlates the
//! resulting ICMP Time-Exceeded / Destination-Unreachable replies, and
//! tracks per-hop round-trip time and loss continuously over time — an
//! `mtr`-style engine with no rendering or CLI layer of its own.
//!
//! Start a trace with [`TraceCoordinator::start`], read its live hop
//! list with [`TraceHandle::hops_snapshot`], and stop it with
//! [`TraceHandle::stop`].

pub mod cancel;
pub mod clock;
pub mod config;
pub mod dns;
pub mod error;
pub mod hop;
pub mod net;
pub mod packet;
pub mod prober;
pub mod reply_buffer;
pub mod rtt;
pub mod trace;

pub use config::TraceParams;
pub use error::{TraceResult, TracerError};
pub use hop::HopSnapshot;
pub use trace::{TraceCoordinator, TraceHandle};
