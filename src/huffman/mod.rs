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

//! [Huffman coding] for header string literals.
//!
//! [Huffman coding]: https://en.wikipedia.org/wiki/Huffman_coding
//!
//! The code is a canonical Huffman code generated from statistics obtained
//! on a large sample of HTTP headers, with some tweaking to ensure that no
//! symbol has a unique code length. Symbols cover every octet value plus a
//! 30-bit `EOS` symbol whose most significant bits serve as padding for the
//! unfilled remainder of the last byte.
//!
//! Encoding walks the code table directly. Decoding walks a binary code
//! tree built once from the same table, one bit at a time, so that an
//! encoded string can be fed to the decoder in arbitrary slices.

mod consts;

use std::sync::OnceLock;

use consts::HUFFMAN_ENCODE;

use crate::error::{ErrorKind, HpackError};

/// Converts a string to its Huffman coded form and appends it to the
/// specified `Vec<u8>`.
pub(crate) fn huffman_encode(src: &[u8], dst: &mut Vec<u8>) {
    // Bits accumulate most-significant-first. Whole bytes are flushed as
    // soon as they are complete, so `pending` never exceeds 37 bits and the
    // accumulator cannot overflow.
    let mut bits = 0u64;
    let mut pending = 0u32;

    for byte in src.iter() {
        let (nbits, code) = HUFFMAN_ENCODE[*byte as usize];
        bits = (bits << nbits) | code;
        pending += nbits;
        while pending >= 8 {
            pending -= 8;
            dst.push((bits >> pending) as u8);
        }
    }

    // The unfilled remainder of the last byte is padded with the most
    // significant bits of the EOS code, which are all ones.
    if pending > 0 {
        let pad = 8 - pending;
        dst.push(((bits << pad) as u8) | ((1u8 << pad) - 1));
    }
}

/// Returns the exact number of bytes `src` occupies once Huffman coded,
/// without encoding it.
pub(crate) fn huffman_encoded_len(src: &[u8]) -> usize {
    let bits = src
        .iter()
        .map(|byte| HUFFMAN_ENCODE[*byte as usize].0 as usize)
        .sum::<usize>();
    (bits + 7) / 8
}

/// Converts a Huffman coded string into a literal string at one time.
pub(crate) fn huffman_decode(src: &[u8]) -> Result<Vec<u8>, HpackError> {
    let mut decoder = HuffmanDecoder::new();
    decoder.decode(src)?;
    decoder.finish()
}

/// Converts a Huffman coded string into a literal string. Users can split
/// the string into multiple slices and pass them in one by one.
pub(crate) struct HuffmanDecoder {
    node: u16,
    path_len: u8,
    path_ones: bool,
    vec: Vec<u8>,
}

impl HuffmanDecoder {
    /// Creates a new, empty `HuffmanDecoder`.
    pub(crate) fn new() -> Self {
        Self {
            node: 0,
            path_len: 0,
            path_ones: true,
            vec: Vec::new(),
        }
    }

    /// Decodes the next slice of the input string. Stops when `src` is used
    /// up.
    pub(crate) fn decode(&mut self, src: &[u8]) -> Result<(), HpackError> {
        let tree = code_tree();
        for byte in src.iter() {
            for pos in (0..8).rev() {
                let bit = ((byte >> pos) & 1) as usize;
                let next = tree[self.node as usize].children[bit];
                if next == 0 {
                    return Err(ErrorKind::InvalidHuffmanCode.into());
                }
                self.path_len = self.path_len.saturating_add(1);
                self.path_ones &= bit == 1;
                match tree[next as usize].symbol {
                    // A complete EOS symbol must not appear in the string.
                    Some(256) => return Err(ErrorKind::InvalidHuffmanCode.into()),
                    Some(symbol) => {
                        self.vec.push(symbol as u8);
                        self.node = 0;
                        self.path_len = 0;
                        self.path_ones = true;
                    }
                    None => self.node = next,
                }
            }
        }
        Ok(())
    }

    /// Finishes decoding and returns the literal string. The bits left over
    /// after the last complete symbol must form a strict prefix of the EOS
    /// code: all ones and at most 7 of them.
    pub(crate) fn finish(self) -> Result<Vec<u8>, HpackError> {
        if self.node != 0 && !(self.path_ones && self.path_len < 8) {
            return Err(ErrorKind::InvalidHuffmanCode.into());
        }
        Ok(self.vec)
    }
}

/// One node of the code tree. Children are indexes into the node list; 0
/// marks an absent child since the root is never a child of another node.
struct Node {
    children: [u16; 2],
    symbol: Option<u16>,
}

/// Returns the code tree, building it on first use.
fn code_tree() -> &'static [Node] {
    static TREE: OnceLock<Vec<Node>> = OnceLock::new();
    TREE.get_or_init(build_code_tree)
}

fn build_code_tree() -> Vec<Node> {
    let mut nodes = vec![Node {
        children: [0; 2],
        symbol: None,
    }];
    for (symbol, &(nbits, code)) in HUFFMAN_ENCODE.iter().enumerate() {
        let mut idx = 0usize;
        for pos in (0..nbits).rev() {
            let bit = ((code >> pos) & 1) as usize;
            if pos == 0 {
                let leaf = nodes.len() as u16;
                nodes.push(Node {
                    children: [0; 2],
                    symbol: Some(symbol as u16),
                });
                nodes[idx].children[bit] = leaf;
            } else {
                let mut next = nodes[idx].children[bit];
                if next == 0 {
                    next = nodes.len() as u16;
                    nodes.push(Node {
                        children: [0; 2],
                        symbol: None,
                    });
                    nodes[idx].children[bit] = next;
                }
                idx = next as usize;
            }
        }
    }
    nodes
}
