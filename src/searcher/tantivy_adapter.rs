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

//! The production [`SearcherAdapter`] implementation, wrapping a
//! `tantivy::Searcher` the way `SearchIndexReader` wraps one in the
//! teacher: a thin layer translating tantivy's segment/scorer/document
//! vocabulary into this crate's abstract searcher capability.
//!
//! Unlike `SearchIndexReader::search_via_channel` (which streams results
//! out of a background thread for cross-segment parallelism), `scan` here
//! drives the segment × document loop directly on the calling thread —
//! this crate forbids intra-shard parallelism (§1), so there's no reason
//! to pay for a channel hop.

use super::{compare_sort_keys, GlobalDocId, Page, QueryBuilder, ScanSink, Scorer, ScoredDoc, SearcherAdapter, Sort};
use crate::error::CollectorError;
use crate::types::{DocId, Score, SegmentOrdinal};
use crate::value::SortValue;
use anyhow::{anyhow, Context};
use once_cell::sync::Lazy;
use ordered_float::NotNan;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::ops::Bound;
use tantivy::query::{BooleanQuery, Occur, Query as TantivyQuery, RangeQuery, Weight};
use tantivy::schema::{document::Value as _, Field, FieldType, Schema, Term};
use tantivy::{DocAddress, DocSet, Executor, Searcher, TantivyDocument, Type, TERMINATED};

/// Tantivy's own `Executor` is expensive to build (it spins up a thread
/// pool for anything beyond `single_thread`); reuse one, mirroring the
/// teacher's `static SEARCH_EXECUTOR: Lazy<Executor>`.
static SINGLE_THREAD_EXECUTOR: Lazy<Executor> = Lazy::new(Executor::single_thread);

/// A boxed tantivy query is this adapter's `Query` associated type.
pub type BoxedQuery = Box<dyn TantivyQuery>;

pub struct TantivySearcherAdapter {
    searcher: Searcher,
    schema: Schema,
    /// `segment_base[ord]` is the first global doc id of segment `ord`;
    /// sorted ascending, used for `locate`'s binary search.
    segment_base: Vec<GlobalDocId>,
}

impl TantivySearcherAdapter {
    pub fn new(searcher: Searcher) -> Self {
        let schema = searcher.schema().clone();
        let mut segment_base = Vec::with_capacity(searcher.segment_readers().len());
        let mut acc: GlobalDocId = 0;
        for reader in searcher.segment_readers() {
            segment_base.push(acc);
            acc += reader.max_doc() as GlobalDocId;
        }
        Self {
            searcher,
            schema,
            segment_base,
        }
    }

    fn enable_scoring(&self, need_scores: bool) -> tantivy::query::EnableScoring<'_> {
        if need_scores {
            tantivy::query::EnableScoring::Enabled {
                searcher: &self.searcher,
                statistics_provider: &self.searcher,
            }
        } else {
            tantivy::query::EnableScoring::Disabled {
                schema: &self.schema,
                searcher_opt: Some(&self.searcher),
            }
        }
    }

    fn field(&self, column: &str) -> anyhow::Result<(Field, FieldType)> {
        let field = self
            .schema
            .get_field(column)
            .with_context(|| format!("unknown sort/filter column `{column}`"))?;
        let field_type = self.schema.get_field_entry(field).field_type().clone();
        Ok((field, field_type))
    }

    fn global_id(&self, segment: SegmentOrdinal, doc: DocId) -> GlobalDocId {
        self.segment_base[segment as usize] + doc as GlobalDocId
    }

    fn read_sort_value(
        &self,
        segment_ord: SegmentOrdinal,
        column: &str,
        doc: DocId,
    ) -> anyhow::Result<SortValue> {
        let segment_reader = self.searcher.segment_reader(segment_ord);
        let (_, field_type) = self.field(column)?;
        let fast_fields = segment_reader.fast_fields();
        Ok(match field_type.value_type() {
            Type::I64 => match fast_fields.i64(column)?.first(doc) {
                Some(v) => SortValue::I64(v),
                None => SortValue::Null,
            },
            Type::U64 => match fast_fields.u64(column)?.first(doc) {
                Some(v) => SortValue::I64(v as i64),
                None => SortValue::Null,
            },
            Type::F64 => match fast_fields.f64(column)?.first(doc) {
                Some(v) => SortValue::F64(
                    NotNan::new(v).map_err(|_| anyhow!("NaN sort value in column `{column}`"))?,
                ),
                None => SortValue::Null,
            },
            Type::Str => match fast_fields.str(column)?.and_then(|c| {
                let ord = c.term_ords(doc).next()?;
                let mut out = String::new();
                c.ord_to_str(ord, &mut out).ok()?;
                Some(out)
            }) {
                Some(s) => SortValue::Str(s),
                None => SortValue::Null,
            },
            other => return Err(anyhow!("unsupported sort column type: {other:?}")),
        })
    }

    /// Enumerate every matching document with its sort-field values,
    /// unsorted and untruncated. Shared by `top_k_impl` and `search_after`,
    /// which differ only in what they do with the candidate set afterward.
    fn collect_candidates(&self, query: &BoxedQuery, sort: &Sort) -> anyhow::Result<Vec<ScoredDoc>> {
        let need_scores = false;
        let weight = query.weight(self.enable_scoring(need_scores))?;
        let mut candidates: Vec<ScoredDoc> = Vec::new();

        for (ord, segment_reader) in self.searcher.segment_readers().iter().enumerate() {
            let ord = ord as SegmentOrdinal;
            let mut scorer = weight.scorer(segment_reader, 1.0)?;
            loop {
                let doc = scorer.doc();
                if doc == TERMINATED {
                    break;
                }
                let mut fields = Vec::with_capacity(sort.columns.len());
                for column in &sort.columns {
                    fields.push(self.read_sort_value(ord, &column.symbol, doc)?);
                }
                candidates.push(ScoredDoc {
                    global_doc_id: self.global_id(ord, doc),
                    fields,
                    score: None,
                });
                scorer.advance();
            }
        }
        Ok(candidates)
    }

    fn top_k_impl(&self, query: &BoxedQuery, k: usize, sort: &Sort) -> anyhow::Result<Page> {
        let mut candidates = self.collect_candidates(query, sort)?;
        candidates.sort_by(|a, b| compare_sort_keys(&a.fields, &b.fields, sort));
        candidates.truncate(k);
        Ok(Page { docs: candidates })
    }

    /// Real "strictly after cursor" semantics (§4.1): the column-level
    /// `already_collected_filter` the paginator ANDs into `query` is only a
    /// coarse, per-column safety net (§4.5 Rationale) — it cannot tell two
    /// documents with an identical sort key apart. This adapter breaks
    /// those ties with `global_doc_id`, the same `(sort_fields, doc_id)`
    /// pair the glossary defines as the sort cursor, so a block of
    /// tied-key documents larger than one page is still walked exactly
    /// once instead of being re-offered by every subsequent call.
    fn search_after_impl(&self, cursor: &ScoredDoc, query: &BoxedQuery, k: usize, sort: &Sort) -> anyhow::Result<Page> {
        let mut candidates = self.collect_candidates(query, sort)?;
        candidates.retain(|c| match compare_sort_keys(&c.fields, &cursor.fields, sort) {
            Ordering::Equal => c.global_doc_id > cursor.global_doc_id,
            other => other == Ordering::Greater,
        });
        candidates.sort_by(|a, b| compare_sort_keys(&a.fields, &b.fields, sort));
        candidates.truncate(k);
        Ok(Page { docs: candidates })
    }
}

impl QueryBuilder for TantivySearcherAdapter {
    type Query = BoxedQuery;

    fn range_query(&self, column: &str, lo: Bound<SortValue>, hi: Bound<SortValue>) -> Self::Query {
        let (field, field_type) = self
            .field(column)
            .expect("range_query column must exist in the schema");
        let lower = to_term_bound(field, &field_type, lo);
        let upper = to_term_bound(field, &field_type, hi);
        Box::new(RangeQuery::new_term_bounds(
            column.to_string(),
            field_type.value_type(),
            &lower,
            &upper,
        ))
    }

    fn all_of(&self, clauses: Vec<Self::Query>) -> Self::Query {
        Box::new(BooleanQuery::new(
            clauses.into_iter().map(|q| (Occur::Must, q)).collect(),
        ))
    }

    fn and_not(&self, base: &Self::Query, excluded: Self::Query) -> Self::Query {
        Box::new(BooleanQuery::new(vec![
            (Occur::Must, base.box_clone()),
            (Occur::MustNot, excluded),
        ]))
    }
}

fn to_term_bound(field: Field, field_type: &FieldType, bound: Bound<SortValue>) -> Bound<Term> {
    match bound {
        Bound::Unbounded => Bound::Unbounded,
        Bound::Included(v) => Bound::Included(sort_value_to_term(field, field_type, v)),
        Bound::Excluded(v) => Bound::Excluded(sort_value_to_term(field, field_type, v)),
    }
}

fn sort_value_to_term(field: Field, field_type: &FieldType, value: SortValue) -> Term {
    match (value, field_type.value_type()) {
        (SortValue::I64(v), _) => Term::from_field_i64(field, v),
        (SortValue::F64(v), _) => Term::from_field_f64(field, v.into_inner()),
        (SortValue::Str(v), _) => Term::from_field_text(field, &v),
        (SortValue::Null, _) => unreachable!(
            "already_collected_filter never builds a range bound from a null sort value"
        ),
    }
}

/// Bridges a tantivy `Weight`'s per-segment scorer to this crate's
/// `Scorer` capability. Wrapped in a `RefCell` because the same scorer is
/// both advanced by the adapter's own doc loop and queried on demand by
/// score expressions via `ScanSink::set_scorer` — overlapping in time, not
/// space, since everything here runs on one thread.
struct ScorerBridge(RefCell<Box<dyn tantivy::query::Scorer>>);

impl Scorer for ScorerBridge {
    fn score(&self, doc: DocId) -> Score {
        let mut scorer = self.0.borrow_mut();
        if scorer.doc() != doc {
            scorer.seek(doc);
        }
        scorer.score()
    }
}

impl SearcherAdapter for TantivySearcherAdapter {
    fn scan(&self, query: &Self::Query, sink: &mut dyn ScanSink) -> anyhow::Result<()> {
        let need_scores = sink.needs_scores();
        let weight: Box<dyn Weight> = query.weight(self.enable_scoring(need_scores))?;

        for (ord, segment_reader) in self.searcher.segment_readers().iter().enumerate() {
            let ord = ord as SegmentOrdinal;
            let scorer = weight.scorer(segment_reader, 1.0)?;
            let bridge = ScorerBridge(RefCell::new(scorer));

            sink.set_segment(ord);

            loop {
                let doc = bridge.0.borrow().doc();
                if doc == TERMINATED {
                    break;
                }
                match sink.collect(doc, &bridge) {
                    crate::error::ScanControl::Continue => {}
                    crate::error::ScanControl::Stop => return Ok(()),
                    crate::error::ScanControl::Error(e) => return Err(fold_signal(e)),
                }
                bridge.0.borrow_mut().advance();
            }
        }
        Ok(())
    }

    fn top_k(&self, query: &Self::Query, k: usize, sort: &Sort) -> anyhow::Result<Page> {
        self.top_k_impl(query, k, sort)
    }

    fn search_after(
        &self,
        cursor: &ScoredDoc,
        query: &Self::Query,
        k: usize,
        sort: &Sort,
    ) -> anyhow::Result<Page> {
        // `query` already excludes every document at-or-before the cursor
        // on every column from the paginator's `already_collected_filter`,
        // but that filter is column-granular and can't separate two
        // documents with an identical sort key; `search_after_impl` breaks
        // those ties by `global_doc_id` so the page never re-offers a
        // document already delivered (§4.5 Rationale).
        self.search_after_impl(cursor, query, k, sort)
    }

    fn locate(&self, global_doc_id: GlobalDocId) -> (SegmentOrdinal, DocId) {
        let ord = match self.segment_base.binary_search(&global_doc_id) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let local = global_doc_id - self.segment_base[ord];
        (ord as SegmentOrdinal, local as DocId)
    }

    fn fetch_stored_fields(
        &self,
        segment: SegmentOrdinal,
        doc: DocId,
        needed: &dyn Fn(&str) -> bool,
    ) -> anyhow::Result<serde_json::Value> {
        let document: TantivyDocument = self.searcher.doc(DocAddress::new(segment, doc))?;
        let mut map = serde_json::Map::new();
        for (field, field_entry) in self.schema.fields() {
            let name = field_entry.name();
            if !needed(name) {
                continue;
            }
            if let Some(value) = document.get_first(field) {
                map.insert(name.to_string(), tantivy_value_to_json(value));
            }
        }
        Ok(serde_json::Value::Object(map))
    }
}

/// Folds a driver-raised `CollectorError` (a cancellation or breaker trip
/// discovered inside `collect`) into the `anyhow::Error` that `scan`
/// returns, so `CollectorDriver::finalize` can downcast it back to its
/// original variant instead of re-wrapping it as a fresh `IndexError`.
fn fold_signal(e: CollectorError) -> anyhow::Error {
    anyhow::Error::new(e)
}

fn tantivy_value_to_json(value: &impl tantivy::schema::document::Value) -> serde_json::Value {
    if let Some(v) = value.as_str() {
        return serde_json::Value::String(v.to_string());
    }
    if let Some(v) = value.as_i64() {
        return serde_json::Value::from(v);
    }
    if let Some(v) = value.as_u64() {
        return serde_json::Value::from(v);
    }
    if let Some(v) = value.as_f64() {
        return serde_json::Value::from(v);
    }
    if let Some(v) = value.as_bool() {
        return serde_json::Value::Bool(v);
    }
    serde_json::Value::Null
}
