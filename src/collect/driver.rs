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

//! The unordered collection path (§4.4) and the bookkeeping shared with
//! the ordered paginator: kill/breaker checks, row counting, the stored
//! field fetch, and the terminal `finish`/`fail` dispatch.

use crate::breaker::MemoryAccountingContext;
use crate::error::{CollectorError, ScanControl};
use crate::expr::{BoundExpression, CollectContext};
use crate::ids::ScanId;
use crate::kill::KillSwitch;
use crate::searcher::{ScanSink, Scorer, SearcherAdapter};
use crate::sink::{DownstreamSink, Row};
use crate::types::{DocId, Score, SegmentOrdinal};
use crate::value::SortValue;
use crate::visitor::StoredFieldVisitor;
use std::cell::RefCell;
use std::rc::Rc;

/// Orchestrates one shard scan's per-document bookkeeping (§4.4 steps
/// 1-2, 6-8). Generic over the searcher adapter so it can call back into
/// it for stored-field fetches while itself being driven as a
/// [`ScanSink`] by that same adapter's `scan`.
pub struct CollectorDriver<'a, A, S, B> {
    adapter: &'a A,
    scan_id: ScanId,
    expressions: Vec<BoundExpression>,
    downstream: S,
    kill: KillSwitch,
    breaker: B,
    limit: Option<usize>,
    row_count: usize,
    produced_rows: bool,
    failed: bool,
    current_segment: Option<SegmentOrdinal>,
    visitor: Rc<RefCell<StoredFieldVisitor>>,
    visitor_enabled: bool,
    needs_scores: bool,
}

impl<'a, A, S, B> CollectorDriver<'a, A, S, B>
where
    A: SearcherAdapter,
    S: DownstreamSink,
    B: MemoryAccountingContext,
{
    pub fn new(
        adapter: &'a A,
        expressions: Vec<BoundExpression>,
        downstream: S,
        kill: KillSwitch,
        breaker: B,
        limit: Option<usize>,
    ) -> Self {
        let needs_scores = expressions
            .iter()
            .any(|e| matches!(e, BoundExpression::Score(_)));
        Self {
            adapter,
            scan_id: ScanId::new(),
            expressions,
            downstream,
            kill,
            breaker,
            limit,
            row_count: 0,
            produced_rows: false,
            failed: false,
            current_segment: None,
            visitor: Rc::new(RefCell::new(StoredFieldVisitor::new())),
            visitor_enabled: false,
            needs_scores,
        }
    }

    /// Step 1-2: bind every expression to the scan-global context and
    /// compute `visitor_enabled` from what they declared.
    pub fn start(&mut self) {
        let ctx = CollectContext::new(self.scan_id, self.visitor.clone());
        for expression in &mut self.expressions {
            expression.start_collect(&ctx);
        }
        self.visitor_enabled = self.visitor.borrow().is_required();
    }

    pub fn scan_id(&self) -> ScanId {
        self.scan_id
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn produced_rows(&self) -> bool {
        self.produced_rows
    }

    pub fn failed(&self) -> bool {
        self.failed
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn limit_unreached(&self) -> bool {
        self.limit.map_or(true, |l| self.row_count < l)
    }

    pub fn kill_requested(&self) -> bool {
        self.kill.killed()
    }

    /// Push a page's precomputed score into every score-capable
    /// expression (§4.5 step 2) — used by the ordered path, which already
    /// knows each doc's score from the page and has no live scorer.
    pub(crate) fn apply_score(&mut self, score: Score) {
        for expression in &mut self.expressions {
            expression.set_score_if_capable(score);
        }
    }

    /// Push a page's sort-field vector into every order-by expression
    /// (§4.5 step 2).
    pub(crate) fn apply_sort_fields(&mut self, fields: &[SortValue]) {
        let shared = Rc::new(fields.to_vec());
        for expression in &mut self.expressions {
            expression.set_sort_fields_if_capable(&shared);
        }
    }

    /// Steps 6a-6g, shared between the unordered scan and the ordered
    /// paginator's `deliver_page` (§4.4, §4.5 step 3). Score delivery is
    /// the caller's responsibility: the unordered path reads the live
    /// scorer before calling this; the ordered path already applied the
    /// page's precomputed score.
    pub(crate) fn bookkeeping_and_deliver(&mut self, doc: DocId) -> ScanControl {
        // A zero limit admits no rows at all; checking `limit_reached` only
        // after delivery (step 6g) would let exactly one row through before
        // ever comparing `row_count` to it. Stop here so `row_count ≤ limit`
        // (§3) holds at every observable moment, including `limit = 0`.
        if self.limit == Some(0) {
            return ScanControl::Stop;
        }
        if self.kill.killed() {
            return ScanControl::Error(CollectorError::Cancelled);
        }
        if self.breaker.tripped() {
            return ScanControl::Error(CollectorError::BreakerTripped {
                context_id: self.breaker.context_id().as_str().to_string(),
                limit: self.breaker.limit(),
            });
        }

        self.row_count += 1;
        self.produced_rows = true;

        if self.visitor_enabled {
            let segment = self
                .current_segment
                .expect("set_segment is called before any collect");
            self.visitor.borrow_mut().reset();
            let visitor = self.visitor.clone();
            let fetched = self.adapter.fetch_stored_fields(segment, doc, &|name: &str| {
                visitor.borrow().needs_field(name)
            });
            match fetched {
                Ok(document) => self.visitor.borrow_mut().load(document),
                Err(e) => return ScanControl::Error(CollectorError::IndexError(e)),
            }
        }

        for expression in &mut self.expressions {
            expression.set_next_doc(doc);
        }

        let want_more = match self.downstream.deliver_row(Row::new(&self.expressions)) {
            Ok(want_more) => want_more,
            Err(e) => return ScanControl::Error(CollectorError::DownstreamError(e)),
        };
        let limit_reached = self.limit.is_some_and(|l| self.row_count >= l);
        if !want_more || limit_reached {
            ScanControl::Stop
        } else {
            ScanControl::Continue
        }
    }

    /// Step 7/8: exactly one terminal call to `downstream`, derived from
    /// the scan's outcome. `Ok(())` covers both a natural end and a
    /// graceful `Stop` (the searcher adapter maps `Stop` to `Ok(())`
    /// too — both mean `finish()`, per the error table in §7). An `Err`
    /// carrying a `CollectorError` (round-tripped through the adapter's
    /// `anyhow::Result`) is unwrapped back to its original variant rather
    /// than re-wrapped as a fresh `IndexError`.
    pub fn finalize(mut self, scan_result: anyhow::Result<()>) -> S {
        match scan_result {
            Ok(()) => self.downstream.finish(),
            Err(e) => {
                self.failed = true;
                match e.downcast::<CollectorError>() {
                    Ok(collector_error) => self.downstream.fail(collector_error),
                    Err(e) => self.downstream.fail(CollectorError::IndexError(e)),
                }
            }
        }
        self.downstream
    }
}

impl<'a, A, S, B> ScanSink for CollectorDriver<'a, A, S, B>
where
    A: SearcherAdapter,
    S: DownstreamSink,
    B: MemoryAccountingContext,
{
    fn needs_scores(&self) -> bool {
        self.needs_scores
    }

    fn set_segment(&mut self, segment: SegmentOrdinal) {
        self.current_segment = Some(segment);
        for expression in &mut self.expressions {
            expression.set_segment(segment);
        }
    }

    fn collect(&mut self, doc: DocId, scorer: &dyn Scorer) -> ScanControl {
        if self.needs_scores {
            let score = scorer.score(doc);
            self.apply_score(score);
        }
        self.bookkeeping_and_deliver(doc)
    }
}
