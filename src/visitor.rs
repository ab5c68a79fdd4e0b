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

use rustc_hash::FxHashSet;
use serde_json::Value;

/// Lazily fetches stored fields for the document currently positioned by
/// the scan (§4.3). Expressions declare, during `start_collect`, which
/// field names they need; the driver folds those into `required` once per
/// scan. Between documents the scratch buffer is cleared but the required
/// set is retained.
#[derive(Debug, Default)]
pub struct StoredFieldVisitor {
    required: FxHashSet<String>,
    /// The designated "source" field — e.g. the field a snippet generator
    /// reads from — always fetched even if not in `required`.
    source_field: Option<String>,
    loaded: Value,
}

impl StoredFieldVisitor {
    pub fn new() -> Self {
        Self {
            required: FxHashSet::default(),
            source_field: None,
            loaded: Value::Null,
        }
    }

    /// Called during `start_collect` by any expression that needs a stored
    /// field; the driver ORs these declarations together (§4.2).
    pub fn require(&mut self, field: impl Into<String>) {
        self.required.insert(field.into());
    }

    pub fn set_source_field(&mut self, field: impl Into<String>) {
        self.source_field = Some(field.into());
    }

    /// True once at least one field has been declared required — drives
    /// `visitor_enabled` (§3, §8 property 8: "visitor gating").
    pub fn is_required(&self) -> bool {
        !self.required.is_empty() || self.source_field.is_some()
    }

    /// The index asks this once per field name in a document; YES means
    /// "deserialize this field into the scratch buffer" (§4.3).
    pub fn needs_field(&self, name: &str) -> bool {
        self.source_field.as_deref() == Some(name) || self.required.contains(name)
    }

    /// Replace the scratch buffer with a freshly-fetched document. Called
    /// by the driver after asking the segment to fetch the current doc
    /// (§4.4 step 6d).
    pub fn load(&mut self, document: Value) {
        self.loaded = document;
    }

    /// Read a previously-loaded field by name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.loaded.get(name)
    }

    /// Clear scratch storage ahead of the next document; the required set
    /// survives (§4.3 "between documents").
    pub fn reset(&mut self) {
        self.loaded = Value::Null;
    }
}
