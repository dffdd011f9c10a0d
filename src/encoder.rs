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

use std::collections::HashSet;

use crate::representation::ReprEncoder;
use crate::table::{DynamicTable, HeaderField, ReferenceSet, StaticTable};

/// Encoder side of a header compression context.
///
/// The encoder turns header lists into header blocks, keeping its dynamic
/// table and reference set in lockstep with the peer's decoder. Fields that
/// the previous block already carried stay implicit through the reference
/// set, so an unchanged header list encodes to an empty block.
///
/// The produced byte strings must reach the peer in the order they were
/// produced; every block mutates the shared context.
pub struct HpackEncoder {
    table: DynamicTable,
    refs: ReferenceSet,
}

impl HpackEncoder {
    /// Creates an `HpackEncoder` with the given dynamic table budget.
    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            table: DynamicTable::with_max_size(max_size),
            refs: ReferenceSet::new(),
        }
    }

    /// Encodes a header list into one header block.
    ///
    /// Names are lowercased on entry. A name occurring several times is
    /// folded into a single field whose values are joined with a NUL byte,
    /// preserving first-occurrence order; a receiver that cares about the
    /// individual values splits on NUL.
    pub fn encode(&mut self, headers: &[HeaderField]) -> Vec<u8> {
        let hlist = coalesce(headers);
        let mut dst = Vec::new();
        let mut repr = ReprEncoder::new(&mut dst);
        let excluded = self.reconcile(&hlist, &mut repr);
        for field in hlist.iter().filter(|f| !excluded.contains(&f.name)) {
            self.encode_field(field, &mut repr);
        }
        dst
    }

    /// Applies the peer's `SETTINGS_HEADER_TABLE_SIZE` change to the table
    /// budget.
    pub fn update_size(&mut self, max_size: usize) {
        self.table.update_size(max_size, &mut self.refs);
    }

    /// Reconciles the reference set with the outgoing header list.
    ///
    /// A member whose name is absent from the list means the lists diverged
    /// materially: the set is emptied on the wire and locally, and nothing
    /// stays implicit. A member equal to an outgoing field keeps that field
    /// implicit and excludes it from re-emission.
    fn reconcile(&mut self, hlist: &[HeaderField], repr: &mut ReprEncoder) -> HashSet<Vec<u8>> {
        let mut excluded = HashSet::new();
        for (id, field) in self.table.iter() {
            if !self.refs.contains(id) {
                continue;
            }
            match hlist.iter().find(|h| h.name == field.name) {
                None => {
                    repr.empty_reference_set();
                    self.refs.clear();
                    return HashSet::new();
                }
                Some(h) if h.value == field.value => {
                    excluded.insert(field.name.clone());
                }
                Some(_) => {}
            }
        }
        excluded
    }

    /// Emits the cheapest representation available for one field.
    fn encode_field(&mut self, field: &HeaderField, repr: &mut ReprEncoder) {
        // 1. A dynamic table entry equal to the field: a bare index. The
        // reference the peer records is mirrored locally.
        if let Some(index) = self.table.index_of(&field.name, &field.value) {
            if let Some((id, _)) = self.table.entry(index) {
                self.refs.insert(id);
            }
            repr.indexed(index);
            return;
        }

        // 2. A dynamic table entry sharing the name, unless the exact pair
        // lives in the static table, whose index is preferred below.
        if let Some(index) = self.table.index_of_name(&field.name) {
            if StaticTable::index_of(&field.name, &field.value).is_none() {
                repr.indexing(index, &field.value);
                self.add_to_table(field);
                return;
            }
        }

        // 3. A static table entry equal to the field: a bare index above
        // the dynamic table. The peer replicates a referenced static entry
        // into its dynamic table, so the same insertion happens here to
        // keep the index spaces aligned. The replica joins the table only,
        // not the reference set.
        if let Some(index) = StaticTable::index_of(&field.name, &field.value) {
            repr.indexed(self.table.len() + index);
            self.table.update(field.clone(), &mut self.refs);
            return;
        }

        // 4. A static table entry sharing the name.
        if let Some(index) = StaticTable::index_of_name(&field.name) {
            repr.indexing(self.table.len() + index, &field.value);
            self.add_to_table(field);
            return;
        }

        // 5. A fully literal field.
        repr.indexing_with_name(&field.name, &field.value);
        self.add_to_table(field);
    }

    /// Inserts a freshly emitted field into the dynamic table and the
    /// reference set, as the peer's decoder will.
    fn add_to_table(&mut self, field: &HeaderField) {
        if let Some(id) = self.table.update(field.clone(), &mut self.refs) {
            self.refs.insert(id);
        }
    }
}

/// Lowercases names and folds duplicate names into single fields, joining
/// their values with a NUL byte in first-occurrence order.
fn coalesce(headers: &[HeaderField]) -> Vec<HeaderField> {
    let mut hlist: Vec<HeaderField> = Vec::new();
    for header in headers {
        let name = header.name.to_ascii_lowercase();
        match hlist.iter_mut().find(|f| f.name == name) {
            Some(field) => {
                field.value.push(0x00);
                field.value.extend_from_slice(&header.value);
            }
            None => hlist.push(HeaderField::new(name, header.value.clone())),
        }
    }
    hlist
}

#[cfg(test)]
mod ut_hpack_encoder {
    use super::*;

    /// UT test cases for static table matches.
    ///
    /// # Brief
    /// 1. Encodes a field that the static table holds exactly.
    /// 2. Checks that the output is a single indexed byte and that the
    ///    entry is replicated into the dynamic table without joining the
    ///    reference set.
    #[test]
    fn ut_encoder_static_exact() {
        let mut encoder = HpackEncoder::with_max_size(4096);
        let block = encoder.encode(&[HeaderField::new(":method", "GET")]);
        assert_eq!(block, [0x82]);
        assert_eq!(encoder.table.len(), 1);
        assert_eq!(encoder.refs.len(), 0);

        // With the replica at index 1, a second static match two entries up
        // still resolves correctly on both sides.
        let block = encoder.encode(&[
            HeaderField::new(":method", "GET"),
            HeaderField::new(":scheme", "http"),
        ]);
        // Index 1 references the replica; ":scheme: http" is static entry 6,
        // shifted to 7 by the one dynamic entry.
        assert_eq!(block, [0x81, 0x87]);
    }

    /// UT test cases for literal fields.
    ///
    /// # Brief
    /// 1. Encodes a field unknown to both tables.
    /// 2. Checks the opcode, the table insertion and the reference set.
    #[test]
    fn ut_encoder_literal_new_name() {
        let mut encoder = HpackEncoder::with_max_size(4096);
        let block = encoder.encode(&[HeaderField::new("x-custom", "ab")]);
        assert_eq!(block[0], 0x40);
        assert_eq!(encoder.table.len(), 1);
        assert_eq!(
            encoder.table.entry(1).unwrap().1,
            &HeaderField::new("x-custom", "ab")
        );
        assert_eq!(encoder.refs.len(), 1);
    }

    /// UT test cases for reference set reuse.
    ///
    /// # Brief
    /// 1. Encodes the same header list twice.
    /// 2. Checks that the second block is empty and the context unchanged.
    #[test]
    fn ut_encoder_reference_reuse() {
        let mut encoder = HpackEncoder::with_max_size(4096);
        encoder.encode(&[HeaderField::new("x-custom", "ab")]);

        let block = encoder.encode(&[HeaderField::new("x-custom", "ab")]);
        assert_eq!(block, Vec::<u8>::new());
        assert_eq!(encoder.table.len(), 1);
        assert_eq!(encoder.refs.len(), 1);
    }

    /// UT test cases for partial reuse.
    ///
    /// # Brief
    /// 1. Encodes a header list extending the previous one.
    /// 2. Checks that only the new field is represented.
    #[test]
    fn ut_encoder_reference_exclusion() {
        let mut encoder = HpackEncoder::with_max_size(4096);
        encoder.encode(&[HeaderField::new("x-custom", "ab")]);

        let block = encoder.encode(&[
            HeaderField::new("x-custom", "ab"),
            HeaderField::new("x-other", "z"),
        ]);
        // Only the literal for "x-other" appears: the opcode, the Huffman
        // coded name and the one-byte value.
        assert_eq!(block[0], 0x40);
        assert_eq!(block.len(), 9);
        assert_eq!(encoder.table.len(), 2);
        assert_eq!(encoder.refs.len(), 2);
    }

    /// UT test cases for diverging header lists.
    ///
    /// # Brief
    /// 1. Encodes a header list sharing nothing with the previous one.
    /// 2. Checks that the block starts by emptying the reference set.
    #[test]
    fn ut_encoder_reference_divergence() {
        let mut encoder = HpackEncoder::with_max_size(4096);
        encoder.encode(&[HeaderField::new("x-custom", "ab")]);

        let block = encoder.encode(&[HeaderField::new("y", "1")]);
        assert_eq!(block[0], 0x30);
        assert_eq!(block[1], 0x40);
        assert_eq!(encoder.refs.len(), 1);
    }

    /// UT test cases for dynamic table matches.
    ///
    /// # Brief
    /// 1. Makes a field leave the reference set while staying in the table,
    ///    then encodes it again.
    /// 2. Checks that the encoder falls back to a bare dynamic index and
    ///    records the reference.
    #[test]
    fn ut_encoder_dynamic_exact() {
        let mut encoder = HpackEncoder::with_max_size(4096);
        encoder.encode(&[HeaderField::new("x-custom", "ab")]);
        // Diverging once empties the reference set but keeps the entry.
        encoder.encode(&[HeaderField::new("y", "1")]);
        assert_eq!(encoder.table.len(), 2);

        let block = encoder.encode(&[HeaderField::new("x-custom", "ab")]);
        // "y" leaves the set on the wire, then index 2 is referenced.
        assert_eq!(block, [0x30, 0x82]);
        assert_eq!(encoder.refs.len(), 1);
    }

    /// UT test cases for dynamic name reuse.
    ///
    /// # Brief
    /// 1. Encodes a field whose name is in the dynamic table with another
    ///    value.
    /// 2. Checks that the name is referenced by its dynamic index and a new
    ///    entry is inserted.
    #[test]
    fn ut_encoder_dynamic_name() {
        let mut encoder = HpackEncoder::with_max_size(4096);
        encoder.encode(&[HeaderField::new("x-custom", "ab")]);

        let block = encoder.encode(&[HeaderField::new("x-custom", "cd")]);
        // Name index 1 with the literal value "cd".
        assert_eq!(block, [0x41, 0x02, 0x63, 0x64]);
        assert_eq!(encoder.table.len(), 2);
        assert_eq!(
            encoder.table.entry(1).unwrap().1,
            &HeaderField::new("x-custom", "cd")
        );
    }

    /// UT test cases for static name reuse.
    ///
    /// # Brief
    /// 1. Encodes a field whose name the static table knows with another
    ///    value.
    /// 2. Checks the emitted name index and the table insertion.
    #[test]
    fn ut_encoder_static_name() {
        let mut encoder = HpackEncoder::with_max_size(4096);
        let block = encoder.encode(&[HeaderField::new(":path", "/a")]);
        // ":path" is static entry 4; the index is 6-bit prefixed.
        assert_eq!(block, [0x44, 0x02, 0x2f, 0x61]);
        assert_eq!(encoder.table.len(), 1);
        assert_eq!(encoder.refs.len(), 1);
    }

    /// UT test cases for name coalescing and lowercasing.
    ///
    /// # Brief
    /// 1. Encodes a list with a repeated, mixed-case name.
    /// 2. Checks that one field is emitted with NUL-joined values and a
    ///    lowercase name.
    #[test]
    fn ut_encoder_coalescing() {
        let mut encoder = HpackEncoder::with_max_size(4096);
        let block = encoder.encode(&[
            HeaderField::new("X-List", "1"),
            HeaderField::new("x-list", "2"),
        ]);
        assert_eq!(block[0], 0x40);
        assert_eq!(encoder.table.len(), 1);
        assert_eq!(
            encoder.table.entry(1).unwrap().1,
            &HeaderField::new("x-list", b"1\x002".to_vec())
        );
    }

    /// UT test cases for the static-exact preference.
    ///
    /// # Brief
    /// 1. Puts a name-only match for a static pair into the dynamic table.
    /// 2. Encodes the exact static pair and checks that the dynamic name
    ///    literal is chosen over the static index.
    #[test]
    fn ut_encoder_dynamic_name_before_static_exact() {
        let mut encoder = HpackEncoder::with_max_size(4096);
        encoder.encode(&[HeaderField::new(":method", "PUT")]);
        assert_eq!(encoder.table.len(), 1);

        // ":method: GET" is static entry 2, but the dynamic name match is
        // checked first and the pair is in the static table, so the static
        // index still wins.
        encoder.encode(&[HeaderField::new("y", "1")]);
        let block = encoder.encode(&[HeaderField::new(":method", "GET")]);
        // |D| = 2, so static entry 2 is index 4 on the wire.
        assert_eq!(block, [0x30, 0x84]);
    }
}
