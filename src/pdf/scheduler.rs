//! Render scheduling against a single output surface
//!
//! At most one rasterization is in flight at any time. Requests arriving
//! while the worker is busy collapse into a single pending slot with
//! last-write-wins semantics: holding an arrow key rasterizes at most one
//! stale intermediate page, and the final requested page is never dropped.

use super::request::RequestId;

/// Outcome of a render request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// The request should be sent to the worker now.
    Start(RequestId),
    /// A render is in flight; the page was parked in the pending slot.
    Coalesced,
}

/// Serializes page render requests and coalesces superseded ones.
///
/// The pending page is only ever set while a render is in flight and is
/// cleared the moment it is consumed.
#[derive(Debug, Default)]
pub struct RenderScheduler {
    in_flight: Option<RequestId>,
    pending: Option<u32>,
    next_id: u64,
}

impl RenderScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a render of `page`.
    ///
    /// Idle: allocates a request id, marks it in flight, and tells the
    /// caller to dispatch. Busy: overwrites the pending slot (discarding any
    /// previously pending page) and dispatches nothing.
    pub fn request(&mut self, page: u32) -> Dispatch {
        if self.in_flight.is_some() {
            self.pending = Some(page);
            return Dispatch::Coalesced;
        }

        self.next_id += 1;
        let id = RequestId::new(self.next_id);
        self.in_flight = Some(id);
        Dispatch::Start(id)
    }

    /// Record completion of an in-flight render (success or failure alike).
    ///
    /// Returns the pending page to dispatch next, if one was parked.
    /// Completions for unknown ids are ignored so a stale worker response
    /// cannot clear a newer in-flight marker.
    pub fn complete(&mut self, id: RequestId) -> Option<u32> {
        if self.in_flight != Some(id) {
            return None;
        }
        self.in_flight = None;
        self.pending.take()
    }

    /// Forget all in-flight and pending work. Used on viewer teardown;
    /// responses for dropped ids are ignored by [`Self::complete`].
    pub fn reset(&mut self) {
        self.in_flight = None;
        self.pending = None;
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    #[must_use]
    pub fn pending_page(&self) -> Option<u32> {
        self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start(sched: &mut RenderScheduler, page: u32) -> RequestId {
        match sched.request(page) {
            Dispatch::Start(id) => id,
            Dispatch::Coalesced => panic!("expected immediate dispatch for page {page}"),
        }
    }

    #[test]
    fn idle_request_dispatches_immediately() {
        let mut sched = RenderScheduler::new();
        assert!(matches!(sched.request(1), Dispatch::Start(_)));
        assert!(sched.is_busy());
        assert_eq!(sched.pending_page(), None);
    }

    #[test]
    fn busy_requests_coalesce_last_write_wins() {
        let mut sched = RenderScheduler::new();
        let id = start(&mut sched, 1);

        assert_eq!(sched.request(2), Dispatch::Coalesced);
        assert_eq!(sched.request(3), Dispatch::Coalesced);
        assert_eq!(sched.request(4), Dispatch::Coalesced);
        assert_eq!(sched.pending_page(), Some(4));

        // Completion hands back only the most recent page.
        assert_eq!(sched.complete(id), Some(4));
        assert!(!sched.is_busy());
        assert_eq!(sched.pending_page(), None);
    }

    #[test]
    fn rapid_navigation_settles_on_last_requested_page() {
        let mut sched = RenderScheduler::new();
        let mut in_flight = vec![start(&mut sched, 1)];

        // Burst of navigation while renders complete one at a time.
        for page in 2..=9 {
            sched.request(page);
        }

        let mut rendered = Vec::new();
        while let Some(id) = in_flight.pop() {
            assert!(in_flight.is_empty(), "only one render in flight at a time");
            rendered.push(id);
            if let Some(next) = sched.complete(id) {
                in_flight.push(start(&mut sched, next));
            }
        }

        // One stale intermediate at most: the burst costs the initial render
        // plus exactly one follow-up for the final page.
        assert_eq!(rendered.len(), 2);
        assert!(!sched.is_busy());
    }

    #[test]
    fn completion_of_unknown_id_is_ignored() {
        let mut sched = RenderScheduler::new();
        let stale = start(&mut sched, 1);
        sched.reset();

        let fresh = start(&mut sched, 2);
        assert_eq!(sched.complete(stale), None);
        assert!(sched.is_busy(), "stale completion must not clear a new render");
        assert_eq!(sched.complete(fresh), None);
        assert!(!sched.is_busy());
    }

    #[test]
    fn failure_path_still_honors_pending() {
        let mut sched = RenderScheduler::new();
        let id = start(&mut sched, 1);
        sched.request(5);

        // The caller invokes complete() for failures too.
        assert_eq!(sched.complete(id), Some(5));
        assert!(!sched.is_busy());
    }

    #[test]
    fn reset_clears_pending_slot() {
        let mut sched = RenderScheduler::new();
        start(&mut sched, 1);
        sched.request(2);
        sched.reset();
        assert!(!sched.is_busy());
        assert_eq!(sched.pending_page(), None);
    }
}
