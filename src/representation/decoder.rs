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

use crate::error::{ErrorKind, HpackError};
use crate::huffman::huffman_decode;
use crate::integer::IntegerDecoder;
use crate::representation::{Name, PrefixBit, Representation};

/// Decoder for single representations. Every call to `decode` either takes
/// one complete representation off the front of the buffer or leaves the
/// buffer exactly as it was, so that a representation cut short by the end
/// of the input can be resubmitted in full later.
pub(crate) struct ReprDecoder<'a> {
    buf: &'a [u8],
}

// `Representation` decoding stage diagram:
//
//                       ┌ `TrailingBytes`
// `FirstByte` ──────────┤
//                       ├ `NameString` ─┐
//                       │               ├ `LengthFirstByte` ─ `StringBytes`
//                       └ `ValueString` ┘
impl<'a> ReprDecoder<'a> {
    /// Creates a new `ReprDecoder` over the given byte slice.
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    /// Tries to decode the next representation. Returns `Ok(None)` without
    /// consuming anything if the remaining bytes do not hold a complete
    /// representation.
    pub(crate) fn decode(&mut self) -> Result<Option<Representation>, HpackError> {
        let mut remain = self.buf;
        match FirstByte.decode(&mut remain) {
            DecResult::Decoded(repr) => {
                self.buf = remain;
                Ok(Some(repr))
            }
            DecResult::NeedMore => Ok(None),
            DecResult::Error(e) => Err(e),
        }
    }

    /// Number of bytes not consumed yet.
    pub(crate) fn remaining(&self) -> usize {
        self.buf.len()
    }
}

macro_rules! try_decode {
    ($res: expr) => {
        match $res {
            DecResult::Decoded(value) => value,
            DecResult::NeedMore => return DecResult::NeedMore,
            DecResult::Error(e) => return DecResult::Error(e),
        }
    };
}

/// `FirstByte` decodes the opcode byte of a representation together with
/// the prefix integer sharing it, then hands over to the stage the opcode
/// asks for.
struct FirstByte;

impl FirstByte {
    fn decode(self, buf: &mut &[u8]) -> DecResult<Representation> {
        if buf.is_empty() {
            return DecResult::NeedMore;
        }
        let byte = buf[0];
        let repr = match PrefixBit::from_u8(byte) {
            Some(repr) => repr,
            None => return HpackError::from(ErrorKind::UnknownOpcode).into(),
        };
        *buf = &buf[1..];

        if repr == PrefixBit::EMPTY_REFERENCE_SET {
            return DecResult::Decoded(Representation::EmptyReferenceSet);
        }

        let mask = repr.prefix_index_mask();
        let index = match IntegerDecoder::first_byte(byte, mask.0) {
            Ok(index) => index,
            Err(int) => try_decode!(TrailingBytes::new(int).decode(buf)),
        };

        match (repr, index) {
            // The index value of 0 is not used. It must be treated as a
            // decoding error in an indexed representation.
            (PrefixBit::INDEXED, 0) => HpackError::from(ErrorKind::InvalidIndex).into(),
            (PrefixBit::INDEXED, index) => DecResult::Decoded(Representation::Indexed { index }),
            (PrefixBit::SIZE_UPDATE, max_size) => {
                DecResult::Decoded(Representation::SizeUpdate { max_size })
            }
            (repr, 0) => NameString::new(repr).decode(buf),
            (repr, index) => ValueString::new(repr, Name::Index(index)).decode(buf),
        }
    }
}

/// `TrailingBytes` decodes the continuation bytes of a prefix integer.
struct TrailingBytes {
    int: IntegerDecoder,
}

impl TrailingBytes {
    fn new(int: IntegerDecoder) -> Self {
        Self { int }
    }

    fn decode(mut self, buf: &mut &[u8]) -> DecResult<usize> {
        loop {
            if buf.is_empty() {
                return DecResult::NeedMore;
            }
            let byte = buf[0];
            *buf = &buf[1..];
            match self.int.next_byte(byte) {
                Ok(None) => {}
                Ok(Some(value)) => return DecResult::Decoded(value),
                Err(e) => return e.into(),
            }
        }
    }
}

/// `NameString` decodes the name literal of a representation whose name
/// index was 0.
struct NameString {
    repr: PrefixBit,
}

impl NameString {
    fn new(repr: PrefixBit) -> Self {
        Self { repr }
    }

    fn decode(self, buf: &mut &[u8]) -> DecResult<Representation> {
        let octets = try_decode!(LengthFirstByte.decode(buf));
        ValueString::new(self.repr, Name::Literal(octets)).decode(buf)
    }
}

/// `ValueString` decodes the value literal and assembles the final
/// representation.
struct ValueString {
    repr: PrefixBit,
    name: Name,
}

impl ValueString {
    fn new(repr: PrefixBit, name: Name) -> Self {
        Self { repr, name }
    }

    fn decode(self, buf: &mut &[u8]) -> DecResult<Representation> {
        let value = try_decode!(LengthFirstByte.decode(buf));
        DecResult::Decoded(match self.repr {
            PrefixBit::LITERAL_WITH_INDEXING => Representation::LiteralWithIndexing {
                name: self.name,
                value,
            },
            PrefixBit::LITERAL_WITHOUT_INDEXING => Representation::LiteralWithoutIndexing {
                name: self.name,
                value,
            },
            _ => Representation::LiteralNeverIndexed {
                name: self.name,
                value,
            },
        })
    }
}

/// `LengthFirstByte` decodes a length-prefixed string literal. The Huffman
/// flag is captured from the top bit of the first byte before the length
/// integer masks it out.
///
/// # Binary Format
/// ```text
///   0   1   2   3   4   5   6   7
/// +---+---+---+---+---+---+---+---+
/// | H |    String Length (7+)     |
/// +---+---------------------------+
/// |  String Data (Length octets)  |
/// +-------------------------------+
/// ```
struct LengthFirstByte;

impl LengthFirstByte {
    fn decode(self, buf: &mut &[u8]) -> DecResult<Vec<u8>> {
        if buf.is_empty() {
            return DecResult::NeedMore;
        }
        let byte = buf[0];
        *buf = &buf[1..];
        let huffman = (byte & 0x80) == 0x80;
        let length = match IntegerDecoder::first_byte(byte, 0x7f) {
            Ok(length) => length,
            Err(int) => try_decode!(TrailingBytes::new(int).decode(buf)),
        };
        StringBytes::new(huffman, length).decode(buf)
    }
}

/// `StringBytes` reads the payload octets of a string literal, running
/// them through the Huffman decoder when the flag was set.
struct StringBytes {
    huffman: bool,
    length: usize,
}

impl StringBytes {
    fn new(huffman: bool, length: usize) -> Self {
        Self { huffman, length }
    }

    fn decode(self, buf: &mut &[u8]) -> DecResult<Vec<u8>> {
        if buf.len() < self.length {
            return DecResult::NeedMore;
        }
        let (octets, rest) = buf.split_at(self.length);
        *buf = rest;
        if self.huffman {
            match huffman_decode(octets) {
                Ok(vec) => DecResult::Decoded(vec),
                Err(e) => DecResult::Error(e),
            }
        } else {
            DecResult::Decoded(octets.to_vec())
        }
    }
}

/// Possible returns of the decoding stages.
enum DecResult<D> {
    /// A complete `D` was decoded.
    Decoded(D),

    /// The buffer ended before the current item was complete.
    NeedMore,

    /// Errors that may occur when decoding.
    Error(HpackError),
}

impl<D> From<HpackError> for DecResult<D> {
    fn from(e: HpackError) -> Self {
        DecResult::Error(e)
    }
}
