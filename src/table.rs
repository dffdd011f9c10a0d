// Copyright (c) 2023 Huawei Device Co., Ltd.
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The indexing tables of the codec.
//!
//! Header fields are addressed through a single 1-based index space that
//! covers the dynamic table first and the static table above it: index `i`
//! resolves to the dynamic table for `i <= |D|` and to static entry
//! `i - |D|` otherwise. Inserting into the dynamic table therefore shifts
//! the indexes of the static entries as seen on the wire.
//!
//! The dynamic table is a FIFO cache of recently transmitted fields with a
//! byte budget; each entry costs its name and value lengths plus 32 bytes
//! of accounting overhead. On top of it sits the reference set, the group
//! of entries considered implicitly present in the current header block.

use std::collections::{HashSet, VecDeque};

/// A header field: a pair of opaque byte strings. The encoder keeps names
/// in lowercase ASCII; values are uninterpreted bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderField {
    /// Field name.
    pub name: Vec<u8>,
    /// Field value.
    pub value: Vec<u8>,
}

impl HeaderField {
    /// Creates a new `HeaderField`.
    pub fn new(name: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Size of the field for table accounting. The additional 32 octets
    /// account for the estimated overhead associated with an entry.
    pub(crate) fn size(&self) -> usize {
        self.name.len() + self.value.len() + 32
    }
}

/// An entry of the dynamic table. The sequence number assigned at insertion
/// identifies the entry for the whole of its lifetime, so the reference set
/// can address entries with identical content independently.
struct DynEntry {
    id: u64,
    field: HeaderField,
}

/// The dynamic table: an ordered list of header fields maintained in
/// first-in, first-out order. The newest entry is at index 1, the oldest at
/// the highest index. Entries are evicted from the old end whenever the
/// table would exceed its byte budget.
///
/// Duplicate entries are allowed and kept distinct.
pub(crate) struct DynamicTable {
    queue: VecDeque<DynEntry>,
    curr_size: usize,
    max_size: usize,
    next_id: u64,
}

impl DynamicTable {
    /// Creates a `DynamicTable` with the given size limit.
    pub(crate) fn with_max_size(max_size: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            curr_size: 0,
            max_size,
            next_id: 0,
        }
    }

    pub(crate) fn curr_size(&self) -> usize {
        self.curr_size
    }

    pub(crate) fn max_size(&self) -> usize {
        self.max_size
    }

    /// Number of entries currently in the table.
    pub(crate) fn len(&self) -> usize {
        self.queue.len()
    }

    /// Gets the entry at the given 1-based index together with its sequence
    /// number.
    pub(crate) fn entry(&self, index: usize) -> Option<(u64, &HeaderField)> {
        self.queue
            .get(index.checked_sub(1)?)
            .map(|e| (e.id, &e.field))
    }

    /// Iterates over the entries from the newest to the oldest.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (u64, &HeaderField)> + '_ {
        self.queue.iter().map(|e| (e.id, &e.field))
    }

    /// Inserts a field at the front of the table, evicting old entries to
    /// make room, and returns the sequence number of the new entry. A field
    /// larger than the whole table budget is not admitted at all and leaves
    /// the table untouched.
    pub(crate) fn update(&mut self, field: HeaderField, refs: &mut ReferenceSet) -> Option<u64> {
        let size = field.size();
        if size > self.max_size {
            return None;
        }
        self.fit_size(size, refs);
        let id = self.next_id;
        self.next_id += 1;
        self.curr_size += size;
        self.queue.push_front(DynEntry { id, field });
        Some(id)
    }

    /// Updates the table's size limit, evicting entries as needed.
    pub(crate) fn update_size(&mut self, max_size: usize, refs: &mut ReferenceSet) {
        self.max_size = max_size;
        self.fit_size(0, refs);
    }

    /// Evicts entries from the old end until `need` more bytes fit the
    /// budget. Evicted entries leave the reference set with the table.
    fn fit_size(&mut self, need: usize, refs: &mut ReferenceSet) {
        while self.curr_size + need > self.max_size {
            match self.queue.pop_back() {
                Some(evicted) => {
                    self.curr_size -= evicted.field.size();
                    refs.remove(evicted.id);
                }
                None => break,
            }
        }
    }

    /// Returns the 1-based index of the newest entry equal to the given
    /// field.
    pub(crate) fn index_of(&self, name: &[u8], value: &[u8]) -> Option<usize> {
        self.queue
            .iter()
            .position(|e| e.field.name == name && e.field.value == value)
            .map(|n| n + 1)
    }

    /// Returns the 1-based index of the newest entry whose name matches.
    pub(crate) fn index_of_name(&self, name: &[u8]) -> Option<usize> {
        self.queue
            .iter()
            .position(|e| e.field.name == name)
            .map(|n| n + 1)
    }
}

/// The reference set: the subset of dynamic table entries implicitly
/// present in the current header block. Indexed representations toggle
/// membership; emptying it on the wire takes a single instruction byte.
///
/// Membership is tracked by entry sequence number, never by content.
pub(crate) struct ReferenceSet {
    set: HashSet<u64>,
}

impl ReferenceSet {
    /// Creates a new, empty `ReferenceSet`.
    pub(crate) fn new() -> Self {
        Self {
            set: HashSet::new(),
        }
    }

    pub(crate) fn insert(&mut self, id: u64) {
        self.set.insert(id);
    }

    /// Removes `id` from the set, returning whether it was a member.
    pub(crate) fn remove(&mut self, id: u64) -> bool {
        self.set.remove(&id)
    }

    pub(crate) fn contains(&self, id: u64) -> bool {
        self.set.contains(&id)
    }

    pub(crate) fn clear(&mut self) {
        self.set.clear()
    }

    pub(crate) fn len(&self) -> usize {
        self.set.len()
    }
}

/// The static table: a fixed list of frequent header fields shipped with
/// the codec. Indexes are 1-based and sit above the dynamic table in the
/// combined index space.
pub(crate) struct StaticTable;

/// Static table entries in index order, starting at index 1.
const STATIC_TABLE: &[(&[u8], &[u8])] = &[
    (b":authority", b""),                 // 1
    (b":method", b"GET"),                 // 2
    (b":method", b"POST"),                // 3
    (b":path", b"/"),                     // 4
    (b":path", b"/index.html"),           // 5
    (b":scheme", b"http"),                // 6
    (b":scheme", b"https"),               // 7
    (b":status", b"200"),                 // 8
    (b":status", b"500"),                 // 9
    (b":status", b"404"),                 // 10
    (b":status", b"403"),                 // 11
    (b":status", b"400"),                 // 12
    (b":status", b"401"),                 // 13
    (b"accept-charset", b""),             // 14
    (b"accept-encoding", b""),            // 15
    (b"accept-language", b""),            // 16
    (b"accept-ranges", b""),              // 17
    (b"accept", b""),                     // 18
    (b"access-control-allow-origin", b""), // 19
    (b"age", b""),                        // 20
    (b"allow", b""),                      // 21
    (b"authorization", b""),              // 22
    (b"cache-control", b""),              // 23
    (b"content-disposition", b""),        // 24
    (b"content-encoding", b""),           // 25
    (b"content-language", b""),           // 26
    (b"content-length", b""),             // 27
    (b"content-location", b""),           // 28
    (b"content-range", b""),              // 29
    (b"content-type", b""),               // 30
    (b"cookie", b""),                     // 31
    (b"date", b""),                       // 32
    (b"etag", b""),                       // 33
    (b"expect", b""),                     // 34
    (b"expires", b""),                    // 35
    (b"from", b""),                       // 36
    (b"host", b""),                       // 37
    (b"if-match", b""),                   // 38
    (b"if-modified-since", b""),          // 39
    (b"if-none-match", b""),              // 40
    (b"if-range", b""),                   // 41
    (b"if-unmodified-since", b""),        // 42
    (b"last-modified", b""),              // 43
    (b"link", b""),                       // 44
    (b"location", b""),                   // 45
    (b"max-forwards", b""),               // 46
    (b"proxy-authenticate", b""),         // 47
    (b"proxy-authorization", b""),        // 48
    (b"range", b""),                      // 49
    (b"referer", b""),                    // 50
    (b"refresh", b""),                    // 51
    (b"retry-after", b""),                // 52
    (b"server", b""),                     // 53
    (b"set-cookie", b""),                 // 54
    (b"strict-transport-security", b""),  // 55
    (b"transfer-encoding", b""),          // 56
    (b"user-agent", b""),                 // 57
    (b"vary", b""),                       // 58
    (b"via", b""),                        // 59
    (b"www-authenticate", b""),           // 60
];

impl StaticTable {
    /// Number of entries in the static table.
    pub(crate) fn len() -> usize {
        STATIC_TABLE.len()
    }

    /// Gets a `HeaderField` by the given 1-based index.
    pub(crate) fn field(index: usize) -> Option<HeaderField> {
        STATIC_TABLE
            .get(index.checked_sub(1)?)
            .map(|(name, value)| HeaderField::new(*name, *value))
    }

    /// Gets the name of the entry at the given 1-based index.
    pub(crate) fn name(index: usize) -> Option<Vec<u8>> {
        STATIC_TABLE
            .get(index.checked_sub(1)?)
            .map(|(name, _)| name.to_vec())
    }

    /// Returns the 1-based index of the entry matching both name and value.
    pub(crate) fn index_of(name: &[u8], value: &[u8]) -> Option<usize> {
        STATIC_TABLE
            .iter()
            .position(|(n, v)| *n == name && *v == value)
            .map(|n| n + 1)
    }

    /// Returns the smallest 1-based index of an entry with the given name.
    pub(crate) fn index_of_name(name: &[u8]) -> Option<usize> {
        STATIC_TABLE
            .iter()
            .position(|(n, _)| *n == name)
            .map(|n| n + 1)
    }
}

/// Resolves combined-index-space lookups against the dynamic and static
/// tables.
pub(crate) struct TableSearcher<'a> {
    dynamic: &'a DynamicTable,
}

impl<'a> TableSearcher<'a> {
    pub(crate) fn new(dynamic: &'a DynamicTable) -> Self {
        Self { dynamic }
    }

    /// Searches a full `HeaderField` by combined index.
    pub(crate) fn field(&self, index: usize) -> Option<HeaderField> {
        if index <= self.dynamic.len() {
            self.dynamic.entry(index).map(|(_, field)| field.clone())
        } else {
            StaticTable::field(index - self.dynamic.len())
        }
    }

    /// Searches a field name by combined index.
    pub(crate) fn field_name(&self, index: usize) -> Option<Vec<u8>> {
        if index <= self.dynamic.len() {
            self.dynamic.entry(index).map(|(_, field)| field.name.clone())
        } else {
            StaticTable::name(index - self.dynamic.len())
        }
    }
}
