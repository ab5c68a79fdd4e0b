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

pub mod tantivy_adapter;

use crate::error::ScanControl;
use crate::types::{DocId, Score, SegmentOrdinal};
use crate::value::SortValue;
use std::ops::Bound;

/// A flat document id spanning every segment of the shard, the numbering
/// `top_k`/`search_after` return results in. The paginator recovers
/// `(segment, intra-segment doc id)` from this by binary-searching the
/// adapter's segment base offsets (§4.5 step 1).
pub type GlobalDocId = u64;

/// One order-by column as resolved against the schema.
#[derive(Debug, Clone)]
pub struct SortColumn {
    pub symbol: String,
    pub reverse: bool,
    pub nulls_first: bool,
    /// `Some(field)` when this column is a direct reference to a stored/
    /// fast field eligible for a `range_query` exclusion clause; `None`
    /// for a computed expression, which the exclusion filter must omit
    /// (§4.5, "If the column is not a direct reference... omit").
    pub direct_field: Option<String>,
}

/// An ordered list of sort columns, §3's `order_by` triples plus the
/// direct-reference annotation §4.5 needs.
#[derive(Debug, Clone, Default)]
pub struct Sort {
    pub columns: Vec<SortColumn>,
}

/// One result from `top_k`/`search_after`: a global doc id, its sort-field
/// values (one per `Sort` column, same order), and an optional score.
#[derive(Debug, Clone)]
pub struct ScoredDoc {
    pub global_doc_id: GlobalDocId,
    pub fields: Vec<SortValue>,
    pub score: Option<Score>,
}

/// A page of ordered results.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub docs: Vec<ScoredDoc>,
}

impl Page {
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn is_full(&self, requested: usize) -> bool {
        self.docs.len() >= requested
    }
}

/// Computes a document's relevance score on demand; set on the scan sink
/// once per segment, before any document from that segment is delivered.
pub trait Scorer {
    fn score(&self, doc: DocId) -> Score;
}

/// The capability set `C` that `SearcherAdapter::scan` pushes
/// `(segment, doc_id)` pairs and segment-transition notifications into
/// (§4.1). The collector driver implements this directly.
///
/// `set_scorer` from the original design (a standalone segment-boundary
/// notification) is folded into `collect`'s `scorer` parameter: tying a
/// borrowed `&dyn Scorer` to a struct field would need a lifetime this
/// trait-object-based interface has no room for, and the document is
/// already positioned on the scorer by the time `collect` runs, so
/// passing it alongside costs nothing the segment-boundary form had.
pub trait ScanSink {
    /// Whether the adapter should build a scoring weight for this scan.
    /// Read once, before the scan begins.
    fn needs_scores(&self) -> bool;

    /// Called on a segment boundary, before any `collect` from that
    /// segment.
    fn set_segment(&mut self, segment: SegmentOrdinal);

    /// Deliver one document from the current segment, with the scorer
    /// positioned on it. The adapter must honor `ScanControl::Stop`/`Error`
    /// as graceful termination of the whole scan, not just the current
    /// segment (Design Notes).
    fn collect(&mut self, doc: DocId, scorer: &dyn Scorer) -> ScanControl;
}

/// The query-builder helper collaborator (§6): for a typed column,
/// produce a range query; combine clauses into a conjunction; subtract an
/// exclusion filter from a base query. Kept separate from `SearcherAdapter`
/// because the spec lists it as its own inward interface.
pub trait QueryBuilder {
    type Query;

    /// `range_query(column, lo, hi, lo_inclusive, hi_inclusive)` — the
    /// inclusive/exclusive flags are folded into `Bound::{Included,
    /// Excluded}`; `Bound::Unbounded` represents ±infinity.
    fn range_query(&self, column: &str, lo: Bound<SortValue>, hi: Bound<SortValue>) -> Self::Query;

    /// AND together every clause (§4.5's per-column conjunction).
    fn all_of(&self, clauses: Vec<Self::Query>) -> Self::Query;

    /// `base AND NOT excluded` (§4.5's `q' = query AND NOT excl`).
    fn and_not(&self, base: &Self::Query, excluded: Self::Query) -> Self::Query;
}

/// Orders two sort-key tuples the way `order_by` demands: nulls are
/// always placed according to each column's `nulls_first`, independent
/// of that column's `reverse` — the flag is taken literally rather than
/// folded into the reverse direction (Design Notes, "Null-in-sort
/// policy"). Shared between the production tantivy adapter and any fake
/// adapter a test writes, so both sort pages the same way.
pub fn compare_sort_keys(a: &[SortValue], b: &[SortValue], sort: &Sort) -> std::cmp::Ordering {
    for (i, column) in sort.columns.iter().enumerate() {
        let ord = compare_one(&a[i], &b[i], column.reverse, column.nulls_first);
        if ord != std::cmp::Ordering::Equal {
            return ord;
        }
    }
    std::cmp::Ordering::Equal
}

fn compare_one(a: &SortValue, b: &SortValue, reverse: bool, nulls_first: bool) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a.is_null(), b.is_null()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return if nulls_first { Ordering::Less } else { Ordering::Greater },
        (false, true) => return if nulls_first { Ordering::Greater } else { Ordering::Less },
        (false, false) => {}
    }
    let base = a.cmp(b);
    if reverse {
        base.reverse()
    } else {
        base
    }
}

/// Abstracts the inverted-index engine (§4.1). The driver and paginator
/// are generic over this trait; `tantivy_adapter::TantivySearcherAdapter`
/// is the production implementation.
pub trait SearcherAdapter: QueryBuilder {
    /// Enumerate matching documents in unspecified order, pushing them
    /// into `sink`. Out-of-order delivery is acceptable — the driver
    /// never assumes otherwise for an unordered scan.
    fn scan(&self, query: &Self::Query, sink: &mut dyn ScanSink) -> anyhow::Result<()>;

    /// Up to `k` documents globally sorted by `sort`.
    fn top_k(&self, query: &Self::Query, k: usize, sort: &Sort) -> anyhow::Result<Page>;

    /// Like `top_k`, but starting strictly after `cursor` in sort order.
    fn search_after(
        &self,
        cursor: &ScoredDoc,
        query: &Self::Query,
        k: usize,
        sort: &Sort,
    ) -> anyhow::Result<Page>;

    /// Resolve a global doc id to its owning segment and intra-segment
    /// offset (§4.5 step 1).
    fn locate(&self, global_doc_id: GlobalDocId) -> (SegmentOrdinal, DocId);

    /// Fetch the stored fields needed by `visitor` for one document, as a
    /// JSON object keyed by field name (§4.3/§4.4 step 6d).
    fn fetch_stored_fields(
        &self,
        segment: SegmentOrdinal,
        doc: DocId,
        needed: &dyn Fn(&str) -> bool,
    ) -> anyhow::Result<serde_json::Value>;
}
