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

use ylong_hpack::{HeaderField, HpackDecoder, HpackEncoder};

/// Runs one header list through an encoder and decoder pair kept in
/// lockstep, returning the decoded header list of the block.
fn round_trip(
    encoder: &mut HpackEncoder,
    decoder: &mut HpackDecoder,
    headers: &[HeaderField],
) -> Vec<HeaderField> {
    let block = encoder.encode(headers);
    assert_eq!(decoder.decode(&block).unwrap(), block.len());
    decoder.finish()
}

/// Reduces a header list to a sorted multiset of (name, value) pairs,
/// splitting NUL-joined values back into their parts.
fn multiset(headers: &[HeaderField]) -> Vec<(Vec<u8>, Vec<u8>)> {
    let mut pairs = Vec::new();
    for field in headers {
        let name = field.name.to_ascii_lowercase();
        for part in field.value.split(|byte| *byte == 0x00) {
            pairs.push((name.clone(), part.to_vec()));
        }
    }
    pairs.sort();
    pairs
}

/// Checks that a sequence of header lists survives a lockstep round trip:
/// every decoded block carries the same multiset of pairs as its input.
fn assert_lockstep(lists: &[&[HeaderField]]) {
    let mut encoder = HpackEncoder::with_max_size(4096);
    let mut decoder = HpackDecoder::with_max_size(4096);
    for headers in lists {
        let decoded = round_trip(&mut encoder, &mut decoder, headers);
        assert_eq!(multiset(&decoded), multiset(headers));
    }
}

/// SDV test cases for a single request-like header block.
///
/// # Brief
/// 1. Encodes a block mixing static matches, static name matches and new
///    literals.
/// 2. Checks the decoded header list against the input.
#[test]
fn sdv_single_block() {
    assert_lockstep(&[&[
        HeaderField::new(":method", "GET"),
        HeaderField::new(":scheme", "https"),
        HeaderField::new(":path", "/where"),
        HeaderField::new(":authority", "www.example.com"),
        HeaderField::new("accept", "*/*"),
        HeaderField::new("x-request-id", "abc123"),
    ]])
}

/// SDV test cases for differential encoding across blocks.
///
/// # Brief
/// 1. Sends the same custom header list three times.
/// 2. Checks that the repeats decode identically even though they ride on
///    the reference set, and that the repeated blocks are empty.
#[test]
fn sdv_unchanged_list_rides_reference_set() {
    let headers = [
        HeaderField::new("x-custom", "ab"),
        HeaderField::new("x-trace", "0123456789"),
    ];

    let mut encoder = HpackEncoder::with_max_size(4096);
    let mut decoder = HpackDecoder::with_max_size(4096);

    let decoded = round_trip(&mut encoder, &mut decoder, &headers);
    assert_eq!(multiset(&decoded), multiset(&headers));

    for _ in 0..2 {
        let block = encoder.encode(&headers);
        assert!(block.is_empty());
        assert_eq!(decoder.decode(&block).unwrap(), 0);
        let decoded = decoder.finish();
        assert_eq!(multiset(&decoded), multiset(&headers));
    }
}

/// SDV test cases for growing and diverging header lists.
///
/// # Brief
/// 1. Extends a header list, then replaces it completely.
/// 2. Checks every decoded block against its input.
#[test]
fn sdv_list_growth_and_divergence() {
    let first = [HeaderField::new("x-custom", "ab")];
    let second = [
        HeaderField::new("x-custom", "ab"),
        HeaderField::new("x-other", "z"),
    ];
    let third = [HeaderField::new("y", "1")];
    assert_lockstep(&[&first, &second, &third]);
}

/// SDV test cases for headers returning after a divergence.
///
/// # Brief
/// 1. Diverges away from a list and then comes back to it, so the encoder
///    reuses a bare dynamic table index.
/// 2. Checks every decoded block against its input.
#[test]
fn sdv_dynamic_index_reuse() {
    let first = [HeaderField::new("x-custom", "ab")];
    let second = [HeaderField::new("y", "1")];
    let third = [HeaderField::new("x-custom", "ab")];
    let fourth = [HeaderField::new("x-custom", "ab")];
    assert_lockstep(&[&first, &second, &third, &fourth]);
}

/// SDV test cases for duplicate header names.
///
/// # Brief
/// 1. Encodes a list that repeats a name with different values, in mixed
///    case.
/// 2. Checks that the decoded block splits back into the original pairs.
#[test]
fn sdv_duplicate_names_coalesce() {
    assert_lockstep(&[&[
        HeaderField::new("Set-Cookie", "a=1"),
        HeaderField::new("set-cookie", "b=2"),
        HeaderField::new("set-cookie", "c=3"),
    ]])
}

/// SDV test cases for small tables.
///
/// # Brief
/// 1. Runs blocks through contexts whose table holds only one entry at a
///    time, forcing evictions between blocks.
/// 2. Checks every decoded block against its input.
#[test]
fn sdv_tiny_table_eviction() {
    let mut encoder = HpackEncoder::with_max_size(64);
    let mut decoder = HpackDecoder::with_max_size(64);

    let lists = [
        [HeaderField::new("x-first", "0123456789")],
        [HeaderField::new("x-second", "9876543210")],
        [HeaderField::new("x-third", "5555555555")],
    ];
    for headers in &lists {
        let decoded = round_trip(&mut encoder, &mut decoder, headers);
        assert_eq!(multiset(&decoded), multiset(headers));
    }
}

/// SDV test cases for chunked delivery of a header block.
///
/// # Brief
/// 1. Feeds an encoded block to the decoder in single-byte chunks,
///    resubmitting the bytes of representations cut short.
/// 2. Checks that the result equals decoding the block at once.
#[test]
fn sdv_chunked_decoding() {
    let headers = [
        HeaderField::new(":method", "GET"),
        HeaderField::new("x-custom", "ab"),
        HeaderField::new("x-verbose", "a somewhat longer value"),
    ];

    let mut encoder = HpackEncoder::with_max_size(4096);
    let block = encoder.encode(&headers);

    let mut decoder = HpackDecoder::with_max_size(4096);
    let mut pos = 0;
    let mut end = 1;
    while end <= block.len() {
        let consumed = decoder.decode(&block[pos..end]).unwrap();
        pos += consumed;
        end += 1;
    }
    assert_eq!(pos, block.len());

    let decoded = decoder.finish();
    assert_eq!(multiset(&decoded), multiset(&headers));
}

/// SDV test cases for oversized table updates.
///
/// # Brief
/// 1. Sends a header table size change above the negotiated limit.
/// 2. Checks that decoding fails with the connection-fatal error code.
#[test]
fn sdv_oversized_table_update() {
    let mut decoder = HpackDecoder::with_max_size(4096);
    // A size update of 4097, one past the negotiated limit.
    let err = decoder.decode(&[0x2f, 0xf2, 0x1f]).unwrap_err();
    assert_eq!(err.error_code(), 0x09);
}

/// SDV test cases for opaque header values.
///
/// # Brief
/// 1. Round-trips values that are not valid UTF-8.
/// 2. Checks that they come back byte for byte.
#[test]
fn sdv_opaque_values() {
    assert_lockstep(&[&[
        HeaderField::new("x-binary", vec![0xE5u8, 0xBB, 0x6F, 0xFF, 0x01]),
        HeaderField::new("x-empty", ""),
    ]])
}
