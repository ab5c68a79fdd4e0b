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

use ordered_float::NotNan;
use std::cmp::Ordering;

/// A single order-by column's value, as carried on a sort cursor (§4.5) and
/// compared when building the exclusion filter. Distinct from the general
/// row cell (`serde_json::Value`, see `crate::sink::Row`) because the
/// exclusion filter needs a strict, NaN-safe total order.
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Null,
    I64(i64),
    F64(NotNan<f64>),
    Str(String),
}

impl SortValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SortValue::Null)
    }
}

impl Eq for SortValue {}

impl PartialOrd for SortValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Nulls sort lowest; within a variant, the natural order applies. Mixed
/// variants are only ever compared within the same order-by column, where
/// the schema guarantees a single type, so the fallback ordering below
/// (`Null < I64 < F64 < Str`) is never exercised in practice but keeps
/// `Ord` total.
impl Ord for SortValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortValue::Null, SortValue::Null) => Ordering::Equal,
            (SortValue::Null, _) => Ordering::Less,
            (_, SortValue::Null) => Ordering::Greater,
            (SortValue::I64(a), SortValue::I64(b)) => a.cmp(b),
            (SortValue::F64(a), SortValue::F64(b)) => a.cmp(b),
            (SortValue::Str(a), SortValue::Str(b)) => a.cmp(b),
            (a, b) => rank(a).cmp(&rank(b)),
        }
    }
}

fn rank(v: &SortValue) -> u8 {
    match v {
        SortValue::Null => 0,
        SortValue::I64(_) => 1,
        SortValue::F64(_) => 2,
        SortValue::Str(_) => 3,
    }
}

/// Converts a sort cursor value into the general row-cell representation,
/// for order-by expressions whose `value()` reads from an injected sort
/// vector (§4.2's order-by variant) rather than from the index.
pub fn sort_value_to_json(value: &SortValue) -> serde_json::Value {
    match value {
        SortValue::Null => serde_json::Value::Null,
        SortValue::I64(v) => serde_json::Value::from(*v),
        SortValue::F64(v) => serde_json::Value::from(v.into_inner()),
        SortValue::Str(v) => serde_json::Value::String(v.clone()),
    }
}
