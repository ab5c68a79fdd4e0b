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

//! A fake [`SearcherAdapter`] and [`DownstreamSink`] so the end-to-end
//! scenarios in §8 of the spec can be driven without a real tantivy index.
//! Mirrors the production `TantivySearcherAdapter`'s shape (segments,
//! global doc ids, a boxed query type) closely enough that the same
//! scenario bodies run again in `tests/tantivy_adapter.rs` against the
//! real thing.

#![allow(dead_code)]

use serde_json::Value;
use shard_collector::error::CollectorError;
use shard_collector::searcher::{
    GlobalDocId, Page, QueryBuilder, ScanSink, Scorer, ScoredDoc, SearcherAdapter, Sort,
};
use shard_collector::sink::{DownstreamSink, Row};
use shard_collector::value::SortValue;
use shard_collector::types::{DocId, Score, SegmentOrdinal};
use std::cell::Cell;
use std::collections::HashMap;
use std::ops::Bound;

#[derive(Debug, Clone)]
pub struct FakeDoc {
    pub segment: SegmentOrdinal,
    pub doc: DocId,
    pub global: GlobalDocId,
    pub sort_fields: HashMap<String, SortValue>,
    pub stored: Value,
    pub score: Score,
}

/// A query over the fake index: either "everything", a single-column range
/// bound, a conjunction, or a subtraction — the same shape as the boxed
/// tantivy queries the production adapter builds (`RangeQuery`,
/// `BooleanQuery`'s `Must`/`MustNot`).
#[derive(Debug, Clone)]
pub enum FakeQuery {
    All,
    Range {
        column: String,
        lo: Bound<SortValue>,
        hi: Bound<SortValue>,
    },
    AllOf(Vec<FakeQuery>),
    AndNot(Box<FakeQuery>, Box<FakeQuery>),
}

impl FakeQuery {
    fn matches(&self, doc: &FakeDoc) -> bool {
        match self {
            FakeQuery::All => true,
            FakeQuery::Range { column, lo, hi } => {
                let value = doc.sort_fields.get(column).cloned().unwrap_or(SortValue::Null);
                if value.is_null() {
                    return false;
                }
                let above_lo = match lo {
                    Bound::Unbounded => true,
                    Bound::Included(v) => value >= *v,
                    Bound::Excluded(v) => value > *v,
                };
                let below_hi = match hi {
                    Bound::Unbounded => true,
                    Bound::Included(v) => value <= *v,
                    Bound::Excluded(v) => value < *v,
                };
                above_lo && below_hi
            }
            FakeQuery::AllOf(clauses) => clauses.iter().all(|c| c.matches(doc)),
            FakeQuery::AndNot(base, excluded) => base.matches(doc) && !excluded.matches(doc),
        }
    }
}

struct FakeScorer(Score);

impl Scorer for FakeScorer {
    fn score(&self, _doc: DocId) -> Score {
        self.0
    }
}

/// An in-memory shard of documents, in deliberately fixed insertion order
/// so `scan`'s "unspecified order" is, for test purposes, exactly that
/// order — the scenarios only assert on the *set*/count of delivered rows
/// for `scan`, never on a specific permutation, matching §4.1's guarantee.
#[derive(Default)]
pub struct FakeAdapter {
    docs: Vec<FakeDoc>,
    pub top_k_calls: Cell<usize>,
    pub search_after_calls: Cell<usize>,
}

impl FakeAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `count` documents to a single segment, each carrying
    /// `sort_key` under column `"k"` and no other stored fields.
    pub fn with_docs_sharing_sort_key(mut self, count: usize, sort_key: i64) -> Self {
        let segment = 0;
        for doc in 0..count as DocId {
            let global = self.docs.len() as GlobalDocId;
            self.docs.push(FakeDoc {
                segment,
                doc,
                global,
                sort_fields: HashMap::from([("k".to_string(), SortValue::I64(sort_key))]),
                stored: serde_json::json!({"id": global}),
                score: 1.0,
            });
        }
        self
    }

    /// Append `count` documents to a single segment with distinct
    /// ascending sort keys `0..count`.
    pub fn with_distinct_sort_keys(mut self, count: usize) -> Self {
        let segment = 0;
        for doc in 0..count as DocId {
            let global = self.docs.len() as GlobalDocId;
            self.docs.push(FakeDoc {
                segment,
                doc,
                global,
                sort_fields: HashMap::from([("k".to_string(), SortValue::I64(global as i64))]),
                stored: serde_json::json!({"id": global}),
                score: 1.0,
            });
        }
        self
    }

    /// Append `count` plain documents with no sort fields, for unordered
    /// scenarios.
    pub fn with_plain_docs(mut self, count: usize) -> Self {
        let segment = 0;
        for doc in 0..count as DocId {
            let global = self.docs.len() as GlobalDocId;
            self.docs.push(FakeDoc {
                segment,
                doc,
                global,
                sort_fields: HashMap::new(),
                stored: serde_json::json!({"id": global}),
                score: 1.0,
            });
        }
        self
    }

    /// Every matching document's sort-key tuple and score, unsorted.
    fn scored_candidates(&self, query: &FakeQuery, sort: &Sort) -> Vec<ScoredDoc> {
        self.docs
            .iter()
            .filter(|d| query.matches(d))
            .map(|d| ScoredDoc {
                global_doc_id: d.global,
                fields: sort
                    .columns
                    .iter()
                    .map(|c| d.sort_fields.get(&c.symbol).cloned().unwrap_or(SortValue::Null))
                    .collect(),
                score: Some(d.score),
            })
            .collect()
    }
}

impl QueryBuilder for FakeAdapter {
    type Query = FakeQuery;

    fn range_query(&self, column: &str, lo: Bound<SortValue>, hi: Bound<SortValue>) -> Self::Query {
        FakeQuery::Range {
            column: column.to_string(),
            lo,
            hi,
        }
    }

    fn all_of(&self, clauses: Vec<Self::Query>) -> Self::Query {
        FakeQuery::AllOf(clauses)
    }

    fn and_not(&self, base: &Self::Query, excluded: Self::Query) -> Self::Query {
        FakeQuery::AndNot(Box::new(base.clone()), Box::new(excluded))
    }
}

impl SearcherAdapter for FakeAdapter {
    fn scan(&self, query: &Self::Query, sink: &mut dyn ScanSink) -> anyhow::Result<()> {
        let mut last_segment = None;
        for doc in &self.docs {
            if !query.matches(doc) {
                continue;
            }
            if last_segment != Some(doc.segment) {
                sink.set_segment(doc.segment);
                last_segment = Some(doc.segment);
            }
            let scorer = FakeScorer(doc.score);
            match sink.collect(doc.doc, &scorer) {
                shard_collector::error::ScanControl::Continue => {}
                shard_collector::error::ScanControl::Stop => return Ok(()),
                shard_collector::error::ScanControl::Error(e) => return Err(fold(e)),
            }
        }
        Ok(())
    }

    fn top_k(&self, query: &Self::Query, k: usize, sort: &Sort) -> anyhow::Result<Page> {
        self.top_k_calls.set(self.top_k_calls.get() + 1);
        let mut candidates = self.scored_candidates(query, sort);
        candidates.sort_by(|a, b| shard_collector::searcher::compare_sort_keys(&a.fields, &b.fields, sort));
        candidates.truncate(k);
        Ok(Page { docs: candidates })
    }

    fn search_after(
        &self,
        cursor: &ScoredDoc,
        query: &Self::Query,
        k: usize,
        sort: &Sort,
    ) -> anyhow::Result<Page> {
        self.search_after_calls.set(self.search_after_calls.get() + 1);
        let mut candidates = self.scored_candidates(query, sort);
        candidates.retain(|c| {
            match shard_collector::searcher::compare_sort_keys(&c.fields, &cursor.fields, sort) {
                std::cmp::Ordering::Equal => c.global_doc_id > cursor.global_doc_id,
                other => other == std::cmp::Ordering::Greater,
            }
        });
        candidates.sort_by(|a, b| shard_collector::searcher::compare_sort_keys(&a.fields, &b.fields, sort));
        candidates.truncate(k);
        Ok(Page { docs: candidates })
    }

    fn locate(&self, global_doc_id: GlobalDocId) -> (SegmentOrdinal, DocId) {
        let doc = self
            .docs
            .iter()
            .find(|d| d.global == global_doc_id)
            .expect("global doc id must exist");
        (doc.segment, doc.doc)
    }

    fn fetch_stored_fields(
        &self,
        segment: SegmentOrdinal,
        doc: DocId,
        needed: &dyn Fn(&str) -> bool,
    ) -> anyhow::Result<Value> {
        let found = self
            .docs
            .iter()
            .find(|d| d.segment == segment && d.doc == doc)
            .expect("segment/doc must exist");
        let mut map = serde_json::Map::new();
        if let Value::Object(obj) = &found.stored {
            for (k, v) in obj {
                if needed(k) {
                    map.insert(k.clone(), v.clone());
                }
            }
        }
        Ok(Value::Object(map))
    }
}

fn fold(e: CollectorError) -> anyhow::Error {
    anyhow::Error::new(e)
}

/// Records every delivered row and the scan's terminal call, with an
/// optional budget that flips `want_more` to `false` after N rows — used
/// to drive the early-finish scenario (S6).
#[derive(Default)]
pub struct RecordingSink {
    pub rows: Vec<Vec<Value>>,
    pub finished: bool,
    pub failed_with: Option<CollectorError>,
    pub want_more_budget: Option<usize>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_budget(budget: usize) -> Self {
        Self {
            want_more_budget: Some(budget),
            ..Self::default()
        }
    }
}

impl DownstreamSink for RecordingSink {
    fn deliver_row(&mut self, row: Row<'_>) -> anyhow::Result<bool> {
        self.rows.push(row.to_vec());
        Ok(match &mut self.want_more_budget {
            Some(remaining) if *remaining <= self.rows.len() => false,
            _ => true,
        })
    }

    fn finish(&mut self) {
        self.finished = true;
    }

    fn fail(&mut self, err: CollectorError) {
        self.failed_with = Some(err);
    }
}
