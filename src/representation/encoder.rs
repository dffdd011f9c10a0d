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

use crate::huffman::{huffman_encode, huffman_encoded_len};
use crate::integer::encode_integer;
use crate::representation::{PrefixBit, PrefixIndexMask};

/// Serializer for the representations the encoder emits. Each method
/// writes one complete representation into the output buffer.
pub(crate) struct ReprEncoder<'a> {
    dst: &'a mut Vec<u8>,
}

impl<'a> ReprEncoder<'a> {
    /// Creates a new `ReprEncoder` writing into `dst`.
    pub(crate) fn new(dst: &'a mut Vec<u8>) -> Self {
        Self { dst }
    }

    /// Writes an indexed representation for the given combined-space index.
    pub(crate) fn indexed(&mut self, index: usize) {
        encode_integer(
            index,
            PrefixIndexMask::INDEXED.0,
            PrefixBit::INDEXED.0,
            self.dst,
        );
    }

    /// Writes a literal representation with incremental indexing whose name
    /// is given by a combined-space index.
    pub(crate) fn indexing(&mut self, index: usize, value: &[u8]) {
        encode_integer(
            index,
            PrefixIndexMask::LITERAL_WITH_INDEXING.0,
            PrefixBit::LITERAL_WITH_INDEXING.0,
            self.dst,
        );
        self.string(value);
    }

    /// Writes a literal representation with incremental indexing carrying
    /// both name and value as string literals.
    pub(crate) fn indexing_with_name(&mut self, name: &[u8], value: &[u8]) {
        self.dst.push(PrefixBit::LITERAL_WITH_INDEXING.0);
        self.string(name);
        self.string(value);
    }

    /// Writes the single-byte instruction that empties the reference set.
    pub(crate) fn empty_reference_set(&mut self) {
        self.dst.push(PrefixBit::EMPTY_REFERENCE_SET.0);
    }

    /// Writes a length-prefixed string literal, choosing the shorter of the
    /// Huffman coded and the raw form. Ties keep the raw form.
    fn string(&mut self, octets: &[u8]) {
        let huffman_len = huffman_encoded_len(octets);
        if huffman_len < octets.len() {
            encode_integer(huffman_len, 0x7f, 0x80, self.dst);
            huffman_encode(octets, self.dst);
        } else {
            encode_integer(octets.len(), 0x7f, 0x00, self.dst);
            self.dst.extend_from_slice(octets);
        }
    }
}

#[cfg(test)]
mod ut_repr_encoder {
    use super::ReprEncoder;

    fn decode(hex: &str) -> Vec<u8> {
        (0..hex.len())
            .step_by(2)
            .map(|n| u8::from_str_radix(&hex[n..n + 2], 16).unwrap())
            .collect()
    }

    /// UT test cases for `ReprEncoder`.
    ///
    /// # Brief
    /// 1. Creates a `ReprEncoder` for each representation kind.
    /// 2. Checks the produced bytes against hand-built wire forms.
    #[test]
    fn ut_repr_encoder() {
        let mut dst = Vec::new();
        ReprEncoder::new(&mut dst).indexed(2);
        assert_eq!(dst, [0x82]);

        let mut dst = Vec::new();
        ReprEncoder::new(&mut dst).indexed(127);
        assert_eq!(dst, [0xff, 0x00]);

        let mut dst = Vec::new();
        ReprEncoder::new(&mut dst).empty_reference_set();
        assert_eq!(dst, [0x30]);

        // The value "ab" costs two bytes either way; the raw form wins the
        // tie.
        let mut dst = Vec::new();
        ReprEncoder::new(&mut dst).indexing(1, b"ab");
        assert_eq!(dst, [0x41, 0x02, 0x61, 0x62]);

        // A long value is Huffman coded.
        let mut dst = Vec::new();
        ReprEncoder::new(&mut dst).indexing(1, b"www.example.com");
        assert_eq!(dst, decode("418cf1e3c2e5f23a6ba0ab90f4ff"));
    }

    /// UT test cases for literal representations with literal names.
    ///
    /// # Brief
    /// 1. Encodes a representation whose name and value are both literals.
    /// 2. Checks the opcode byte and that both strings follow.
    #[test]
    fn ut_repr_encoder_with_name() {
        let mut dst = Vec::new();
        ReprEncoder::new(&mut dst).indexing_with_name(b"ab", b"cd");
        assert_eq!(dst, [0x40, 0x02, 0x61, 0x62, 0x02, 0x63, 0x64]);
    }
}
