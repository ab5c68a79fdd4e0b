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

use derive_more::{Display, From};

/// Identifies one scan for the lifetime of a `collector_context` (§4.4 step 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, From)]
pub struct ScanId(uuid::Uuid);

impl ScanId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ScanId {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifies a memory-accounting context (`context_id()` in §6), surfaced
/// in `BreakerTripped` error messages.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, From)]
pub struct ContextId(String);

impl ContextId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
