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

//! The ordered path (§4.5): top-K page + search-after continuation with a
//! tie-breaking exclusion filter, so that continuation is idempotent even
//! when the underlying sort is not strict.

use crate::breaker::MemoryAccountingContext;
use crate::collect::driver::CollectorDriver;
use crate::error::{CollectorError, ScanControl};
use crate::searcher::{Page, QueryBuilder, ScanSink, ScoredDoc, SearcherAdapter, Sort};
use crate::sink::DownstreamSink;
use std::ops::Bound;

/// Result of delivering one page: either the scan stopped mid-page
/// (backpressure, limit, cancellation, or error — all already folded into
/// the driver's bookkeeping), or it ran to completion and hands back the
/// last delivered doc to seed the next page's cursor.
enum PageOutcome {
    Stopped,
    Delivered(Option<ScoredDoc>),
}

pub struct OrderedPaginator {
    sort: Sort,
    page_size: usize,
}

impl OrderedPaginator {
    pub fn new(sort: Sort, page_size: usize) -> Self {
        Self { sort, page_size }
    }

    /// Drives the pseudocode in §4.5 to completion. Returns the same
    /// `anyhow::Result<()>` shape `SearcherAdapter::scan` does, so
    /// [`CollectorDriver::finalize`] can treat both paths identically.
    pub fn run<A, S, B>(
        &self,
        adapter: &A,
        query: &A::Query,
        driver: &mut CollectorDriver<'_, A, S, B>,
    ) -> anyhow::Result<()>
    where
        A: SearcherAdapter,
        S: DownstreamSink,
        B: MemoryAccountingContext,
    {
        let limit = driver.limit();
        let mut batch = batch_size(self.page_size, limit, driver.row_count());
        let mut page = adapter.top_k(query, batch, &self.sort)?;
        let mut last_doc = match self.deliver_page(adapter, &page, driver)? {
            PageOutcome::Stopped => return Ok(()),
            PageOutcome::Delivered(last) => last,
        };

        while driver.limit_unreached() && page.is_full(batch) && !page.is_empty() {
            if driver.kill_requested() {
                return Err(anyhow::Error::new(CollectorError::Cancelled));
            }

            batch = batch_size(self.page_size, limit, driver.row_count());
            let cursor = last_doc
                .take()
                .expect("a full, non-empty page always yields a last doc");

            let owned_query;
            let query_for_page: &A::Query = match already_collected_filter(adapter, &self.sort, &cursor) {
                Some(excl) => {
                    owned_query = adapter.and_not(query, excl);
                    &owned_query
                }
                None => query,
            };

            page = adapter.search_after(&cursor, query_for_page, batch, &self.sort)?;
            last_doc = match self.deliver_page(adapter, &page, driver)? {
                PageOutcome::Stopped => return Ok(()),
                PageOutcome::Delivered(last) => last,
            };
        }
        Ok(())
    }

    /// `deliver_page` (§4.5): locate each doc's owning segment, rebind
    /// expressions, and run the shared unordered-path bookkeeping.
    fn deliver_page<A, S, B>(
        &self,
        adapter: &A,
        page: &Page,
        driver: &mut CollectorDriver<'_, A, S, B>,
    ) -> anyhow::Result<PageOutcome>
    where
        A: SearcherAdapter,
        S: DownstreamSink,
        B: MemoryAccountingContext,
    {
        let mut last = None;
        for doc in &page.docs {
            let (segment, local_doc) = adapter.locate(doc.global_doc_id);
            driver.set_segment(segment);
            driver.apply_sort_fields(&doc.fields);
            if let Some(score) = doc.score {
                driver.apply_score(score);
            }

            match driver.bookkeeping_and_deliver(local_doc) {
                ScanControl::Continue => last = Some(doc.clone()),
                ScanControl::Stop => return Ok(PageOutcome::Stopped),
                ScanControl::Error(e) => return Err(anyhow::Error::new(e)),
            }
        }
        Ok(PageOutcome::Delivered(last))
    }
}

fn batch_size(page_size: usize, limit: Option<usize>, delivered: usize) -> usize {
    match limit {
        Some(l) => page_size.min(l.saturating_sub(delivered)),
        None => page_size,
    }
}

/// `already_collected_filter` (§4.5): a conjunction over each direct-
/// reference order-by column that excludes every document sorting at or
/// before the cursor, so a non-strict sort can't redeliver it.
///
/// A null cursor value is always omitted rather than only when
/// `nulls_first` is true: there is no term to build a range bound from a
/// null column value, and when `nulls_first` is false a null cursor is
/// necessarily the tail of the order, so nothing sorts after it for this
/// column to wrongly exclude.
fn already_collected_filter<A: SearcherAdapter>(
    adapter: &A,
    sort: &Sort,
    cursor: &ScoredDoc,
) -> Option<A::Query> {
    let mut clauses = Vec::new();
    for (i, column) in sort.columns.iter().enumerate() {
        let Some(direct_field) = &column.direct_field else {
            continue;
        };
        let value = &cursor.fields[i];
        if value.is_null() {
            continue;
        }
        let (lo, hi) = if column.reverse {
            (Bound::Excluded(value.clone()), Bound::Unbounded)
        } else {
            (Bound::Unbounded, Bound::Excluded(value.clone()))
        };
        clauses.push(adapter.range_query(direct_field, lo, hi));
    }

    if clauses.is_empty() {
        None
    } else {
        Some(adapter.all_of(clauses))
    }
}
