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

use crate::breaker::MemoryAccountingContext;
use crate::collect::driver::CollectorDriver;
use crate::collect::paginator::OrderedPaginator;
use crate::config::CollectorConfig;
use crate::expr::BoundExpression;
use crate::kill::KillSwitch;
use crate::searcher::{SearcherAdapter, Sort};
use crate::shard::{ShardContext, ShardGuard};
use crate::sink::DownstreamSink;

/// The shard scan request (§3): immutable for the scan's lifetime once
/// handed to [`run_scan`].
pub struct ShardScanRequest<Q> {
    pub query: Q,
    pub inputs: Vec<BoundExpression>,
    pub order_by: Option<Sort>,
    pub limit: Option<usize>,
    pub page_size: Option<usize>,
}

/// Runs one complete shard scan: acquires the shard context, dispatches
/// to the unordered scan or the ordered paginator, delivers exactly one
/// terminal call to `downstream`, then releases the shard context on
/// every exit path (§4.4, §4.5, §4.6). Returns the downstream sink so a
/// caller can inspect what it accumulated.
pub fn run_scan<A, S, B, C>(
    adapter: &A,
    shard: &mut C,
    config: &CollectorConfig,
    request: ShardScanRequest<A::Query>,
    downstream: S,
    kill: KillSwitch,
    breaker: B,
) -> S
where
    A: SearcherAdapter,
    S: DownstreamSink,
    B: MemoryAccountingContext,
    C: ShardContext,
{
    let mut guard = ShardGuard::acquire(shard);
    guard.begin_main_query_stage();

    let ShardScanRequest {
        query,
        inputs,
        order_by,
        limit,
        page_size,
    } = request;
    let page_size = config.page_size(page_size);

    let mut driver = CollectorDriver::new(adapter, inputs, downstream, kill, breaker, limit);
    driver.start();

    let scan_result = match order_by {
        Some(sort) => OrderedPaginator::new(sort, page_size).run(adapter, &query, &mut driver),
        None => adapter.scan(&query, &mut driver),
    };

    let downstream = driver.finalize(scan_result);
    guard.release();
    downstream
}
