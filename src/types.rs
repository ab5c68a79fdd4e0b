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

/// Segment-local document id, matching tantivy's own vocabulary since the
/// concrete searcher adapter wraps a `tantivy::Searcher`.
pub type DocId = tantivy::DocId;

/// A segment ordinal within the shard's searcher.
pub type SegmentOrdinal = tantivy::SegmentOrdinal;

/// A relevance score as handed to score expressions.
pub type Score = tantivy::Score;
