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

use super::{CollectContext, ColumnExpression, OrderByExpression};
use crate::types::{DocId, SegmentOrdinal};
use crate::value::{sort_value_to_json, SortValue};
use serde_json::Value;
use std::rc::Rc;

/// The order-by column-expression variant (§4.2): in an ordered scan, the
/// paginator injects each page's per-document sort-field vector before
/// `deliver_page` forwards the document to the driver, and `value()` reads
/// straight out of that vector at this expression's position rather than
/// re-deriving the value from the index.
///
/// `index_in_sort` is this expression's offset into `Sort::columns` (and
/// therefore into every `ScoredDoc::fields` vector), since a scan's row
/// schema and its sort spec are independent orderings over the same
/// underlying columns.
pub struct SortFieldExpression {
    index_in_sort: usize,
    fields: Option<Rc<Vec<SortValue>>>,
}

impl SortFieldExpression {
    pub fn new(index_in_sort: usize) -> Self {
        Self {
            index_in_sort,
            fields: None,
        }
    }
}

impl ColumnExpression for SortFieldExpression {
    fn start_collect(&mut self, _ctx: &CollectContext) {}

    fn set_segment(&mut self, _segment: SegmentOrdinal) {}

    fn set_next_doc(&mut self, _doc: DocId) {}

    fn value(&self) -> Value {
        self.fields
            .as_ref()
            .and_then(|f| f.get(self.index_in_sort))
            .map(sort_value_to_json)
            .unwrap_or(Value::Null)
    }
}

impl OrderByExpression for SortFieldExpression {
    fn set_sort_fields(&mut self, fields: Rc<Vec<SortValue>>) {
        self.fields = Some(fields);
    }
}
