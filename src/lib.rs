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

#![allow(dead_code)]

//! `ylong_hpack` implements the header compression format used by early
//! drafts of the HTTP/2 protocol, before [HPACK] reached its final form.
//!
//! [HPACK]: https://httpwg.org/specs/rfc7541.html
//!
//! # Introduction
//! Header fields are compressed against a pair of indexing tables: a fixed
//! static table of frequent fields and a per-direction dynamic table that
//! fills up as headers flow. On top of the dynamic table the draft format
//! keeps a *reference set*, the group of table entries implicitly present
//! in the current header block, which lets an unchanged header list encode
//! into an empty block.
//!
//! Two peers keep one codec context per direction; an encoded byte stream
//! is only meaningful when replayed against a context whose history matches
//! the sender's. Feeding the contexts out of wire order, or sharing them
//! between connections, desynchronizes the tables and corrupts the decoded
//! headers.
//!
//! The draft wire format is not compatible with the published HPACK RFC:
//! the dynamic table sits below the static table in a single index space,
//! the reference set and its dedicated emptying instruction do not exist in
//! the RFC, and the static tables differ.
//!
//! # Usage
//! ```
//! use ylong_hpack::{HeaderField, HpackDecoder, HpackEncoder};
//!
//! let mut encoder = HpackEncoder::with_max_size(4096);
//! let mut decoder = HpackDecoder::with_max_size(4096);
//!
//! let headers = vec![
//!     HeaderField::new(":method", "GET"),
//!     HeaderField::new("x-request-id", "abc123"),
//! ];
//! let block = encoder.encode(&headers);
//!
//! assert_eq!(decoder.decode(&block).unwrap(), block.len());
//! let decoded = decoder.finish();
//! assert_eq!(decoded.len(), 2);
//! ```

mod decoder;
mod encoder;
mod error;
mod huffman;
mod integer;
mod representation;
mod table;

pub use decoder::HpackDecoder;
pub use encoder::HpackEncoder;
pub use error::HpackError;
pub use table::HeaderField;
