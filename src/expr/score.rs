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

use super::{CollectContext, ColumnExpression, ScoreExpression};
use crate::types::{DocId, Score, SegmentOrdinal};
use serde_json::Value;

/// The score-capable column-expression variant (§4.2): the driver pushes
/// the current document's BM25 score in before `set_next_doc`, either
/// read live off a segment scorer (unordered path) or carried on a page's
/// precomputed `ScoredDoc` (ordered path).
#[derive(Default)]
pub struct BM25ScoreExpression {
    score: Score,
}

impl BM25ScoreExpression {
    pub fn new() -> Self {
        Self { score: 0.0 }
    }
}

impl ColumnExpression for BM25ScoreExpression {
    fn start_collect(&mut self, _ctx: &CollectContext) {}

    fn set_segment(&mut self, _segment: SegmentOrdinal) {}

    fn set_next_doc(&mut self, _doc: DocId) {}

    fn value(&self) -> Value {
        Value::from(self.score)
    }
}

impl ScoreExpression for BM25ScoreExpression {
    fn set_score(&mut self, score: Score) {
        self.score = score;
    }
}
