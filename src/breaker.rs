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

use crate::ids::ContextId;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The memory-accounting query point the driver reads once per document
/// (§5). The accounting itself — tracking allocations, deciding when to
/// trip — belongs to an external service; this crate only consumes the
/// three query points.
pub trait MemoryAccountingContext: Send + Sync {
    fn tripped(&self) -> bool;
    fn context_id(&self) -> &ContextId;
    fn limit(&self) -> usize;
}

/// A breaker that never trips, for scans that aren't memory-bounded.
pub struct NoopBreaker {
    context_id: ContextId,
}

impl NoopBreaker {
    pub fn new(context_id: impl Into<String>) -> Self {
        Self {
            context_id: ContextId::new(context_id),
        }
    }
}

impl MemoryAccountingContext for NoopBreaker {
    fn tripped(&self) -> bool {
        false
    }

    fn context_id(&self) -> &ContextId {
        &self.context_id
    }

    fn limit(&self) -> usize {
        usize::MAX
    }
}

/// A breaker controllable from outside the scan thread, useful for tests
/// and for hosts that want to trip collection externally (e.g. a watchdog
/// observing total cluster-wide memory pressure).
#[derive(Clone)]
pub struct ManualBreaker {
    context_id: ContextId,
    limit: usize,
    tripped: Arc<AtomicBool>,
}

impl ManualBreaker {
    pub fn new(context_id: impl Into<String>, limit: usize) -> Self {
        Self {
            context_id: ContextId::new(context_id),
            limit,
            tripped: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn trip(&self) {
        self.tripped.store(true, Ordering::Release);
    }
}

impl MemoryAccountingContext for ManualBreaker {
    fn tripped(&self) -> bool {
        self.tripped.load(Ordering::Acquire)
    }

    fn context_id(&self) -> &ContextId {
        &self.context_id
    }

    fn limit(&self) -> usize {
        self.limit
    }
}
