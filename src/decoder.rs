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

use core::mem::take;
use std::collections::HashSet;

use crate::error::{ErrorKind, HpackError};
use crate::representation::{Name, ReprDecoder, Representation};
use crate::table::{DynamicTable, HeaderField, ReferenceSet, TableSearcher};

/// Decoder side of a header compression context.
///
/// The decoder consumes the byte stream of inbound header blocks, keeps the
/// dynamic table and the reference set in sync with the peer's encoder and
/// collects the decoded header list. The host feeds it the payload of each
/// header block in wire order, possibly in several chunks, and drains the
/// result with [`HpackDecoder::finish`] once the block is complete.
///
/// A context must only ever decode; a connection uses one decoder for the
/// inbound direction and one [`HpackEncoder`] for the outbound direction.
///
/// [`HpackEncoder`]: crate::HpackEncoder
pub struct HpackDecoder {
    table: DynamicTable,
    refs: ReferenceSet,
    setting_max_size: usize,
    emitted: Vec<HeaderField>,
    emitted_refs: HashSet<u64>,
}

impl HpackDecoder {
    /// Creates an `HpackDecoder`. Both the table budget and the negotiated
    /// size limit start at `max_size`.
    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            table: DynamicTable::with_max_size(max_size),
            refs: ReferenceSet::new(),
            setting_max_size: max_size,
            emitted: Vec::new(),
            emitted_refs: HashSet::new(),
        }
    }

    /// Decodes a chunk of a header block, appending the decoded fields to
    /// the internal header list. Returns the number of bytes consumed.
    ///
    /// A count smaller than `buf.len()` means the chunk ended in the middle
    /// of a representation. The context is left untouched by the partial
    /// representation; the host resubmits its bytes together with the rest
    /// of the block.
    pub fn decode(&mut self, buf: &[u8]) -> Result<usize, HpackError> {
        let mut decoder = ReprDecoder::new(buf);
        loop {
            match decoder.decode()? {
                Some(repr) => self.update(repr)?,
                None => return Ok(buf.len() - decoder.remaining()),
            }
        }
    }

    /// Ends the current header block and takes the decoded header list.
    ///
    /// Reference set members that were not emitted during the block are
    /// appended here: they are the fields carried over unchanged from the
    /// previous block.
    pub fn finish(&mut self) -> Vec<HeaderField> {
        let emitted_refs = take(&mut self.emitted_refs);
        for (id, field) in self.table.iter() {
            if self.refs.contains(id) && !emitted_refs.contains(&id) {
                self.emitted.push(field.clone());
            }
        }
        take(&mut self.emitted)
    }

    /// Applies a local `SETTINGS_HEADER_TABLE_SIZE` change. Future size
    /// updates from the peer are validated against the new limit, and the
    /// table shrinks immediately if it already exceeds it.
    pub fn update_size(&mut self, max_size: usize) {
        self.setting_max_size = max_size;
        if self.table.max_size() > max_size {
            self.table.update_size(max_size, &mut self.refs);
        }
    }

    /// Applies one decoded representation to the context.
    fn update(&mut self, repr: Representation) -> Result<(), HpackError> {
        match repr {
            Representation::Indexed { index } => self.update_indexed(index),
            Representation::LiteralWithIndexing { name, value } => {
                self.update_literal_with_indexing(name, value)
            }
            Representation::LiteralWithoutIndexing { name, value }
            | Representation::LiteralNeverIndexed { name, value } => {
                self.update_literal(name, value)
            }
            Representation::SizeUpdate { max_size } => self.update_max_size(max_size),
            Representation::EmptyReferenceSet => {
                self.refs.clear();
                Ok(())
            }
        }
    }

    fn update_indexed(&mut self, index: usize) -> Result<(), HpackError> {
        if let Some((id, field)) = self.table.entry(index) {
            // A dynamic table reference toggles reference set membership.
            // Removal emits nothing: it withdraws a field the previous
            // block carried. Insertion emits the field.
            let field = field.clone();
            if self.refs.remove(id) {
                return Ok(());
            }
            self.refs.insert(id);
            self.emitted_refs.insert(id);
            self.emitted.push(field);
        } else {
            // Indexes above the dynamic table resolve into the static
            // table. The referenced field is replicated into the dynamic
            // table, shifting the static indexes for the rest of the block.
            let field = TableSearcher::new(&self.table)
                .field(index)
                .ok_or(HpackError::from(ErrorKind::InvalidIndex))?;
            self.table.update(field.clone(), &mut self.refs);
            self.emitted.push(field);
        }
        Ok(())
    }

    fn update_literal_with_indexing(
        &mut self,
        name: Name,
        value: Vec<u8>,
    ) -> Result<(), HpackError> {
        let field = self.field_from(name, value)?;
        // The new entry starts out as a reference set member and counts as
        // emitted for this block.
        if let Some(id) = self.table.update(field.clone(), &mut self.refs) {
            self.refs.insert(id);
            self.emitted_refs.insert(id);
        }
        self.emitted.push(field);
        Ok(())
    }

    fn update_literal(&mut self, name: Name, value: Vec<u8>) -> Result<(), HpackError> {
        let field = self.field_from(name, value)?;
        self.emitted.push(field);
        Ok(())
    }

    fn update_max_size(&mut self, max_size: usize) -> Result<(), HpackError> {
        if max_size > self.setting_max_size {
            return Err(ErrorKind::OversizedTableUpdate.into());
        }
        self.table.update_size(max_size, &mut self.refs);
        Ok(())
    }

    /// Builds a header field from a literal representation, resolving an
    /// indexed name against the tables as they stand before any insertion.
    fn field_from(&self, name: Name, value: Vec<u8>) -> Result<HeaderField, HpackError> {
        let name = match name {
            Name::Index(index) => TableSearcher::new(&self.table)
                .field_name(index)
                .ok_or(HpackError::from(ErrorKind::InvalidIndex))?,
            Name::Literal(octets) => octets,
        };
        Ok(HeaderField::new(name, value))
    }
}
