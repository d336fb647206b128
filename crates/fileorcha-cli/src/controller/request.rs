//! Request tokens.
//!
//! Each user action kind has a sequence counter. Starting a request issues a
//! token with the next number; a completion is applied only when its token is
//! still the latest for that kind.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Upload,
    Download,
    Preview,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken {
    pub kind: RequestKind,
    pub seq: u64,
}

#[derive(Debug, Default)]
pub struct RequestTracker {
    latest: HashMap<RequestKind, u64>,
    in_flight: HashMap<RequestKind, u64>,
    next_seq: u64,
}

impl RequestTracker {
    pub fn begin(&mut self, kind: RequestKind) -> RequestToken {
        self.next_seq += 1;
        let seq = self.next_seq;
        self.latest.insert(kind, seq);
        self.in_flight.insert(kind, seq);
        RequestToken { kind, seq }
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        self.latest.get(&token.kind) == Some(&token.seq)
    }

    /// Mark the token finished. Returns whether its result should be applied.
    pub fn complete(&mut self, token: RequestToken) -> bool {
        if !self.is_current(token) {
            return false;
        }
        self.in_flight.remove(&token.kind);
        true
    }

    /// Supersede whatever is in flight for `kind`; its result will be discarded.
    pub fn invalidate(&mut self, kind: RequestKind) {
        self.next_seq += 1;
        self.latest.insert(kind, self.next_seq);
        self.in_flight.remove(&kind);
    }

    pub fn in_flight(&self, kind: RequestKind) -> bool {
        self.in_flight.contains_key(&kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_token_supersedes_older() {
        let mut tracker = RequestTracker::default();
        let first = tracker.begin(RequestKind::Download);
        let second = tracker.begin(RequestKind::Download);
        assert!(!tracker.is_current(first));
        assert!(!tracker.complete(first));
        assert!(tracker.in_flight(RequestKind::Download));
        assert!(tracker.complete(second));
        assert!(!tracker.in_flight(RequestKind::Download));
    }

    #[test]
    fn kinds_are_independent() {
        let mut tracker = RequestTracker::default();
        let upload = tracker.begin(RequestKind::Upload);
        let preview = tracker.begin(RequestKind::Preview);
        assert!(tracker.is_current(upload));
        assert!(tracker.is_current(preview));
    }

    #[test]
    fn invalidate_discards_pending_result() {
        let mut tracker = RequestTracker::default();
        let preview = tracker.begin(RequestKind::Preview);
        tracker.invalidate(RequestKind::Preview);
        assert!(!tracker.in_flight(RequestKind::Preview));
        assert!(!tracker.complete(preview));
    }
}
