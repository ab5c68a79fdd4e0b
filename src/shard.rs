// This file is part of shard-collector.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <http://www.gnu.org/licenses/>.

use tracing::{debug, warn};

/// The shard's search context: acquired exactly once per scan, released
/// exactly once per scan, regardless of how the scan ends (§4.6).
///
/// `acquire`/`release`/`close` mirror the host's actual resource (a
/// checked-out searcher generation, a pinned index snapshot, ...); this
/// crate only calls the query points.
pub trait ShardContext {
    fn acquire(&mut self);
    fn release(&mut self);
    fn close(&mut self);
    fn job_search_context_id(&self) -> &str;

    /// Mark the searcher entering its main-query stage (§4.4 step 3).
    fn begin_main_query_stage(&mut self) {}

    /// Finish the searcher's main-query stage (§4.4 step 9). Must run
    /// before `release`/`close` so the searcher's per-stage buffers are
    /// flushed while the context is still alive (Design Notes, "Order
    /// matters").
    fn finish_main_query_stage(&mut self) {}
}

/// Scoped acquisition of a `ShardContext`. Acquires on construction,
/// releases (`finish_main_query_stage` then `release` + `close`) on drop —
/// including on panic unwind — so every exit path the scan can take
/// (success, early stop, error, cancellation, or a panic inside an
/// expression) runs the same two-step release exactly once.
///
/// The guard does not swallow errors raised by the scan body; it only
/// guarantees release happens.
pub struct ShardGuard<'a, C: ShardContext> {
    ctx: &'a mut C,
    released: bool,
}

impl<'a, C: ShardContext> ShardGuard<'a, C> {
    pub fn acquire(ctx: &'a mut C) -> Self {
        ctx.acquire();
        debug!(context_id = ctx.job_search_context_id(), "shard context acquired");
        Self {
            ctx,
            released: false,
        }
    }

    pub fn begin_main_query_stage(&mut self) {
        self.ctx.begin_main_query_stage();
    }

    pub fn context(&self) -> &C {
        self.ctx
    }

    pub fn context_mut(&mut self) -> &mut C {
        self.ctx
    }

    /// Release early, ahead of `Drop`. Calling this more than once, or
    /// letting `Drop` run afterwards, is safe — release only happens once.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.ctx.finish_main_query_stage();
        self.ctx.release();
        self.ctx.close();
        self.released = true;
        debug!(context_id = self.ctx.job_search_context_id(), "shard context released");
    }
}

impl<'a, C: ShardContext> Drop for ShardGuard<'a, C> {
    fn drop(&mut self) {
        if !self.released {
            if std::thread::panicking() {
                warn!(
                    context_id = self.ctx.job_search_context_id(),
                    "releasing shard context while unwinding from a panic"
                );
            }
            self.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Counts {
        acquired: usize,
        released: usize,
        closed: usize,
        stage_begun: usize,
        stage_finished: usize,
    }

    struct FakeShard(Rc<RefCell<Counts>>);

    impl ShardContext for FakeShard {
        fn acquire(&mut self) {
            self.0.borrow_mut().acquired += 1;
        }
        fn release(&mut self) {
            self.0.borrow_mut().released += 1;
        }
        fn close(&mut self) {
            self.0.borrow_mut().closed += 1;
        }
        fn job_search_context_id(&self) -> &str {
            "fake"
        }
        fn begin_main_query_stage(&mut self) {
            self.0.borrow_mut().stage_begun += 1;
        }
        fn finish_main_query_stage(&mut self) {
            self.0.borrow_mut().stage_finished += 1;
        }
    }

    #[test]
    fn acquires_once_and_releases_once_on_drop() {
        let counts = Rc::new(RefCell::new(Counts::default()));
        let mut shard = FakeShard(counts.clone());
        {
            let mut guard = ShardGuard::acquire(&mut shard);
            guard.begin_main_query_stage();
        }
        let c = counts.borrow();
        assert_eq!(c.acquired, 1);
        assert_eq!(c.stage_begun, 1);
        assert_eq!(c.stage_finished, 1);
        assert_eq!(c.released, 1);
        assert_eq!(c.closed, 1);
    }

    #[test]
    fn explicit_release_then_drop_releases_only_once() {
        let counts = Rc::new(RefCell::new(Counts::default()));
        let mut shard = FakeShard(counts.clone());
        let mut guard = ShardGuard::acquire(&mut shard);
        guard.release();
        drop(guard);
        let c = counts.borrow();
        assert_eq!(c.released, 1);
        assert_eq!(c.closed, 1);
    }

    #[test]
    fn releases_on_panic_unwind() {
        let counts = Rc::new(RefCell::new(Counts::default()));
        let mut shard = FakeShard(counts.clone());
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = ShardGuard::acquire(&mut shard);
            panic!("boom mid-scan");
        }));
        assert!(result.is_err());
        let c = counts.borrow();
        assert_eq!(c.acquired, 1);
        assert_eq!(c.released, 1);
        assert_eq!(c.closed, 1);
    }
}
