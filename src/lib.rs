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

//! The per-shard document collector: streams matching documents from an
//! inverted-index shard, optionally sorted and limited, through a
//! downstream row consumer, while honoring cancellation, a memory
//! breaker, and cooperative backpressure.
//!
//! The entry point is [`collect::run_scan`], driven by a
//! [`collect::ShardScanRequest`] against any [`searcher::SearcherAdapter`]
//! (production code uses [`searcher::tantivy_adapter::TantivySearcherAdapter`]).

pub mod breaker;
pub mod collect;
pub mod config;
pub mod error;
pub mod expr;
pub mod ids;
pub mod kill;
pub mod logging;
pub mod searcher;
pub mod shard;
pub mod sink;
pub mod types;
pub mod value;
pub mod visitor;

pub use breaker::{ManualBreaker, MemoryAccountingContext, NoopBreaker};
pub use collect::{run_scan, CollectorDriver, OrderedPaginator, ShardScanRequest};
pub use config::CollectorConfig;
pub use error::{CollectorError, ScanControl};
pub use expr::{BM25ScoreExpression, BoundExpression, ColumnExpression, SortFieldExpression, StoredFieldExpression};
pub use ids::{ContextId, ScanId};
pub use kill::KillSwitch;
pub use shard::{ShardContext, ShardGuard};
pub use sink::{DownstreamSink, Row};
