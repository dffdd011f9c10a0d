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

//! Errors that may occur in this crate.
//!
//! Every [`HpackError`] is fatal for the connection that owns the codec
//! context. The host is expected to translate it into the HTTP/2
//! `COMPRESSION_ERROR` connection error and stop using the context
//! afterwards.
//!
//! Running out of input is not an error: the decoder reports it by
//! consuming fewer bytes than it was given, so that the host can resubmit
//! the rest of the header block later.

use core::fmt::{Debug, Display, Formatter};
use std::error::Error;

/// Errors that may occur during header block compression or decompression.
#[derive(Debug, Eq, PartialEq)]
pub struct HpackError {
    kind: ErrorKind,
}

impl HpackError {
    /// Returns the HTTP/2 error code the host reports for this error.
    ///
    /// Every codec failure maps to `COMPRESSION_ERROR` (0x09).
    pub fn error_code(&self) -> u32 {
        0x09
    }
}

impl From<ErrorKind> for HpackError {
    fn from(kind: ErrorKind) -> Self {
        HpackError { kind }
    }
}

impl Display for HpackError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        Debug::fmt(self, f)
    }
}

impl Error for HpackError {}

#[derive(Debug, Eq, PartialEq)]
pub(crate) enum ErrorKind {
    /// An integer representation carried more continuation bytes than the
    /// codec accepts.
    MalformedInteger,

    /// An indexed representation used index 0, or an index beyond the end
    /// of the combined static and dynamic index space.
    InvalidIndex,

    /// The first byte of a representation matched no known pattern.
    UnknownOpcode,

    /// The peer tried to raise the header table size above the negotiated
    /// `SETTINGS_HEADER_TABLE_SIZE`.
    OversizedTableUpdate,

    /// A Huffman-coded string literal contained an invalid code or invalid
    /// padding.
    InvalidHuffmanCode,
}
