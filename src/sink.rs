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

use crate::error::CollectorError;
use crate::expr::BoundExpression;
use serde_json::Value;

/// A lazy view over the row's column expressions, assembled once per
/// document (§4.4 step 6f) without eagerly materializing every value —
/// the sink decides which columns it actually reads.
pub struct Row<'a> {
    expressions: &'a [BoundExpression],
}

impl<'a> Row<'a> {
    pub fn new(expressions: &'a [BoundExpression]) -> Self {
        Self { expressions }
    }

    pub fn len(&self) -> usize {
        self.expressions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }

    /// Read column `i`'s value, evaluated on demand.
    pub fn column(&self, i: usize) -> Value {
        self.expressions[i].value()
    }

    /// Materialize every column — convenient for sinks that need the whole
    /// row anyway (e.g. tests, or a row transport that serializes wholesale).
    pub fn to_vec(&self) -> Vec<Value> {
        self.expressions.iter().map(|e| e.value()).collect()
    }
}

/// The opaque downstream consumer of rows produced by the collector (§6).
/// Exactly one terminal call (`finish` xor `fail`) happens per scan.
pub trait DownstreamSink {
    /// Deliver one row. `Ok(want_more)` is the cooperative backpressure
    /// signal — `false` means "stop, I have enough" (§4.4 step 6g). `Err`
    /// surfaces as `CollectorError::DownstreamError` (§7: "Raised by
    /// `deliver_row`") and aborts the scan in place of a `finish`/further
    /// rows.
    fn deliver_row(&mut self, row: Row<'_>) -> anyhow::Result<bool>;

    fn finish(&mut self);

    fn fail(&mut self, err: CollectorError);
}
