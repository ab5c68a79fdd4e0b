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

use super::{CollectContext, ColumnExpression};
use crate::types::{DocId, SegmentOrdinal};
use crate::visitor::StoredFieldVisitor;
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;

/// The plain column-expression variant: reads a named stored field out of
/// the shared [`StoredFieldVisitor`] for the document currently positioned
/// by the scan (§4.2, §4.3). Registers its field name as required at
/// `start_collect`; reads nothing at `set_next_doc` time since the driver
/// has already refreshed the visitor's scratch buffer by then (§4.4 step
/// 6d runs before 6e).
pub struct StoredFieldExpression {
    field: String,
    visitor: Option<Rc<RefCell<StoredFieldVisitor>>>,
}

impl StoredFieldExpression {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            visitor: None,
        }
    }
}

impl ColumnExpression for StoredFieldExpression {
    fn start_collect(&mut self, ctx: &CollectContext) {
        ctx.require_field(self.field.clone());
        self.visitor = Some(ctx.visitor());
    }

    fn set_segment(&mut self, _segment: SegmentOrdinal) {}

    fn set_next_doc(&mut self, _doc: DocId) {}

    fn value(&self) -> Value {
        self.visitor
            .as_ref()
            .and_then(|v| v.borrow().field(&self.field).cloned())
            .unwrap_or(Value::Null)
    }
}
