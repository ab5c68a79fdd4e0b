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

use thiserror::Error;

/// Everything that can cross the `DownstreamSink::fail` boundary.
///
/// `EarlyStop` is deliberately not a variant here: it is internal control
/// flow (see [`crate::error::ScanControl`]), never surfaced to the sink.
#[derive(Error, Debug)]
pub enum CollectorError {
    #[error("scan cancelled")]
    Cancelled,

    #[error("memory breaker tripped for context `{context_id}` (limit {limit} bytes)")]
    BreakerTripped { context_id: String, limit: usize },

    #[error("index error: {0}")]
    IndexError(#[from] anyhow::Error),

    #[error("downstream error: {0}")]
    DownstreamError(anyhow::Error),
}

/// The explicit three-valued result of delivering one document downstream,
/// replacing the source's exception-based escape (`EarlyStop`/`Cancelled`
/// throws) with a value the searcher adapter's scan loop must honor.
#[derive(Debug)]
pub enum ScanControl {
    /// Keep delivering documents.
    Continue,
    /// Stop gracefully; the scan still calls `downstream.finish()`.
    Stop,
    /// Stop and propagate `err` to `downstream.fail()`.
    Error(CollectorError),
}

impl ScanControl {
    pub fn is_continue(&self) -> bool {
        matches!(self, ScanControl::Continue)
    }
}
