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

/// Default page size used by the ordered paginator (§4.5) when a scan
/// request doesn't specify one.
pub const DEFAULT_PAGE_SIZE: usize = 1_000;

/// Tunables for a collector instance. None of these are read from the
/// environment or a file by this crate — the host process is responsible
/// for constructing one per scan; see §6 (no CLI / env vars belong to the
/// core).
#[derive(Debug, Clone, Copy)]
pub struct CollectorConfig {
    pub default_page_size: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl CollectorConfig {
    /// Resolve the page size to use for a scan, given the request's
    /// optional explicit `page_size`.
    pub fn page_size(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.default_page_size)
    }
}
