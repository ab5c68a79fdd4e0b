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

pub mod field;
pub mod score;
pub mod sort;

use crate::ids::ScanId;
use crate::types::{DocId, Score, SegmentOrdinal};
use crate::value::SortValue;
use crate::visitor::StoredFieldVisitor;
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;

pub use field::StoredFieldExpression;
pub use score::BM25ScoreExpression;
pub use sort::SortFieldExpression;

/// The scan-global context every expression binds to exactly once, at
/// `start_collect` (§4.2). Carries the shared fields visitor and the
/// per-scan id.
#[derive(Clone)]
pub struct CollectContext {
    scan_id: ScanId,
    visitor: Rc<RefCell<StoredFieldVisitor>>,
}

impl CollectContext {
    pub fn new(scan_id: ScanId, visitor: Rc<RefCell<StoredFieldVisitor>>) -> Self {
        Self { scan_id, visitor }
    }

    pub fn scan_id(&self) -> ScanId {
        self.scan_id
    }

    /// Declare that this expression needs `field` fetched from the stored
    /// document. The driver ORs every expression's declarations together.
    pub fn require_field(&self, field: impl Into<String>) {
        self.visitor.borrow_mut().require(field);
    }

    pub fn visitor(&self) -> Rc<RefCell<StoredFieldVisitor>> {
        self.visitor.clone()
    }
}

/// The capability set common to every column expression (§4.2).
pub trait ColumnExpression {
    /// Bind to the scan-global context. Called exactly once, before any
    /// `set_segment`.
    fn start_collect(&mut self, ctx: &CollectContext);

    /// Rebind to a new segment; called before any `set_next_doc` from that
    /// segment.
    fn set_segment(&mut self, segment: SegmentOrdinal);

    /// Position at a document within the current segment.
    fn set_next_doc(&mut self, doc: DocId);

    /// Produce the currently-positioned typed value.
    fn value(&self) -> Value;
}

/// The score-capable variant: additionally accepts the current document's
/// score before `set_next_doc`, when scores are needed.
pub trait ScoreExpression: ColumnExpression {
    fn set_score(&mut self, score: Score);
}

/// The order-by variant: in sort-streaming mode, `value()` reads from the
/// vector injected here rather than from the index.
pub trait OrderByExpression: ColumnExpression {
    fn set_sort_fields(&mut self, fields: Rc<Vec<SortValue>>);
}

/// A tagged variant over the three expression capability sets — capability
/// polymorphism, not inheritance (Design Notes). The driver dispatches
/// `set_score`/`set_sort_fields` only to the arm that declares it; every
/// arm gets the common `ColumnExpression` calls.
pub enum BoundExpression {
    Plain(Box<dyn ColumnExpression>),
    Score(Box<dyn ScoreExpression>),
    OrderBy(Box<dyn OrderByExpression>),
}

impl BoundExpression {
    pub fn as_column_expression(&self) -> &dyn ColumnExpression {
        match self {
            BoundExpression::Plain(e) => e.as_ref(),
            BoundExpression::Score(e) => e.as_ref(),
            BoundExpression::OrderBy(e) => e.as_ref(),
        }
    }

    pub fn as_column_expression_mut(&mut self) -> &mut dyn ColumnExpression {
        match self {
            BoundExpression::Plain(e) => e.as_mut(),
            BoundExpression::Score(e) => e.as_mut(),
            BoundExpression::OrderBy(e) => e.as_mut(),
        }
    }

    pub fn start_collect(&mut self, ctx: &CollectContext) {
        self.as_column_expression_mut().start_collect(ctx);
    }

    pub fn set_segment(&mut self, segment: SegmentOrdinal) {
        self.as_column_expression_mut().set_segment(segment);
    }

    pub fn set_next_doc(&mut self, doc: DocId) {
        self.as_column_expression_mut().set_next_doc(doc);
    }

    pub fn value(&self) -> Value {
        self.as_column_expression().value()
    }

    pub fn set_score_if_capable(&mut self, score: Score) {
        if let BoundExpression::Score(e) = self {
            e.set_score(score);
        }
    }

    pub fn set_sort_fields_if_capable(&mut self, fields: &Rc<Vec<SortValue>>) {
        if let BoundExpression::OrderBy(e) = self {
            e.set_sort_fields(fields.clone());
        }
    }

    /// A plain stored-field column (§4.2's default variant).
    pub fn stored_field(field: impl Into<String>) -> Self {
        BoundExpression::Plain(Box::new(StoredFieldExpression::new(field)))
    }

    /// The BM25 score column.
    pub fn score() -> Self {
        BoundExpression::Score(Box::new(BM25ScoreExpression::new()))
    }

    /// An order-by column read back from the paginator's injected sort
    /// vector, at position `index_in_sort` within `Sort::columns`.
    pub fn sort_field(index_in_sort: usize) -> Self {
        BoundExpression::OrderBy(Box::new(SortFieldExpression::new(index_in_sort)))
    }
}
