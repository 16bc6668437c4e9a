//! Bounded, shared ring of recently-received `ProbeReply`s (§3, §5).
//!
//! Written by the reply watcher, scanned and drained by hop probers.
//! Cooperative scheduling in the original Python source made append and
//! removal race-free by construction; the multi-threaded re-architecture
//! the spec calls for (§9) instead guards the deque with a mutex.

use crate::packet::ProbeReply;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// A bounded, mutex-guarded deque of recent `ProbeReply` values.
pub struct ReplyBuffer {
    capacity: usize,
    inner: Mutex<VecDeque<ProbeReply>>,
}

impl ReplyBuffer {
    /// Create an empty buffer holding at most `capacity` replies.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Append `reply`, evicting the oldest entry if the buffer is full.
    pub fn push(&self, reply: ProbeReply) {
        let mut buffer = self.inner.lock();
        if buffer.len() == self.capacity {
            buffer.pop_front();
        }
        buffer.push_back(reply);
    }

    /// Remove and return the first (oldest-first scan order) reply for
    /// which `predicate` returns `true`, or `None` if no reply matches.
    ///
    /// First-match-wins: a reply is consumed by at most one caller.
    pub fn take_matching(&self, mut predicate: impl FnMut(&ProbeReply) -> bool) -> Option<ProbeReply> {
        let mut buffer = self.inner.lock();
        let index = buffer.iter().position(|reply| predicate(reply))?;
        buffer.remove(index)
    }

    /// Current number of buffered replies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether the buffer currently holds no replies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MonotonicInstant;
    use crate::packet::{IcmpHeader, Ipv4Header};
    use std::net::Ipv4Addr;

    fn reply_with_source(source: Ipv4Addr) -> ProbeReply {
        ProbeReply {
            received_at: MonotonicInstant::now(),
            outer_ipv4: Ipv4Header {
                source,
                destination: Ipv4Addr::UNSPECIFIED,
                ttl: 64,
                protocol: 1,
            },
            icmp: IcmpHeader { kind: 11, code: 0 },
            inner_ipv4: Ipv4Header {
                source: Ipv4Addr::UNSPECIFIED,
                destination: Ipv4Addr::UNSPECIFIED,
                ttl: 1,
                protocol: 17,
            },
            inner_udp: crate::packet::UdpHeader {
                source_port: 0,
                destination_port: 0,
            },
            inner_udp_payload: None,
        }
    }

    #[test]
    fn evicts_oldest_entry_once_full() {
        let buffer = ReplyBuffer::new(2);
        buffer.push(reply_with_source(Ipv4Addr::new(1, 1, 1, 1)));
        buffer.push(reply_with_source(Ipv4Addr::new(2, 2, 2, 2)));
        buffer.push(reply_with_source(Ipv4Addr::new(3, 3, 3, 3)));
        assert_eq!(buffer.len(), 2);
        assert!(buffer
            .take_matching(|r| r.outer_ipv4.source == Ipv4Addr::new(1, 1, 1, 1))
            .is_none());
        assert!(buffer
            .take_matching(|r| r.outer_ipv4.source == Ipv4Addr::new(3, 3, 3, 3))
            .is_some());
    }

    #[test]
    fn take_matching_removes_first_match_and_leaves_the_rest() {
        let buffer = ReplyBuffer::new(10);
        buffer.push(reply_with_source(Ipv4Addr::new(1, 1, 1, 1)));
        buffer.push(reply_with_source(Ipv4Addr::new(2, 2, 2, 2)));
        let found = buffer
            .take_matching(|r| r.outer_ipv4.source == Ipv4Addr::new(1, 1, 1, 1))
            .unwrap();
        assert_eq!(found.outer_ipv4.source, Ipv4Addr::new(1, 1, 1, 1));
        assert_eq!(buffer.len(), 1);
        assert!(buffer
            .take_matching(|r| r.outer_ipv4.source == Ipv4Addr::new(1, 1, 1, 1))
            .is_none());
    }

    #[test]
    fn scan_order_is_oldest_first() {
        let buffer = ReplyBuffer::new(10);
        buffer.push(reply_with_source(Ipv4Addr::new(1, 1, 1, 1)));
        buffer.push(reply_with_source(Ipv4Addr::new(1, 1, 1, 1)));
        // Both entries match; the older one (pushed first) must come out first.
        let first = buffer.take_matching(|r| r.outer_ipv4.source == Ipv4Addr::new(1, 1, 1, 1));
        assert!(first.is_some());
        assert_eq!(buffer.len(), 1);
    }
}
