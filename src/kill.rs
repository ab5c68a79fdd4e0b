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

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A process-crossing cancellation signal. `killed()` is read once per
/// document from the scan thread; `kill()` is called from any other
/// thread, at most meaningfully once (subsequent calls are no-ops).
///
/// Cloning a `KillSwitch` shares the same underlying flag — this is the
/// "kill handle" of §6, handed to external callers (e.g. a statement
/// timeout) while the scan retains its own clone to poll.
#[derive(Debug, Clone, Default)]
pub struct KillSwitch(Arc<AtomicBool>);

impl KillSwitch {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// Idempotent, thread-safe: sets the flag to `true`. A relaxed
    /// compare-and-swap isn't necessary since every writer wants the same
    /// final state.
    pub fn kill(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Read the flag with acquire ordering so that a `kill()` on another
    /// thread becomes visible here before any subsequently-observed state.
    pub fn killed(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}
