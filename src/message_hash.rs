// dmail – outbound mail composition and DKIM signing
// Copyright © 2022–2023 David Bürgin <dbuergin@gluet.ch>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later
// version.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.

//! Computation of the message hashes.

use crate::{
    canonicalize,
    crypto::{self, HashAlgorithm},
    header::FieldName,
    signature::{CanonicalizationAlgorithm, DKIM_SIGNATURE_NAME},
};
use std::collections::HashMap;

/// A selected header field with its canonicalized value.
pub type CanonicalHeader = (FieldName, String);

/// Pairs each selected header with the header occurrence whose value backs it
/// in the hash input.
///
/// Verifiers match a name listed in *h=* against header occurrences from the
/// bottom of the header block upwards. Listing proceeds top to bottom, so the
/// first listed occurrence of a repeated name takes the value of the last
/// occurrence, the second listed one the value of the next-to-last, and so
/// on. Names are returned in lower case.
pub fn order_for_hashing(headers: &[CanonicalHeader]) -> Vec<(String, &str)> {
    let mut cursors: HashMap<String, usize> = HashMap::new();

    headers
        .iter()
        .map(|(name, _)| {
            let name = name.as_ref().to_ascii_lowercase();

            let last = cursors.get(&name).copied().unwrap_or(headers.len());

            // the current entry itself is always a candidate, so the scan
            // cannot run out before finding a match
            let j = headers[..last]
                .iter()
                .rposition(|(n, _)| n.as_ref().eq_ignore_ascii_case(&name))
                .unwrap_or_default();

            cursors.insert(name.clone(), j);

            (name, headers[j].1.as_str())
        })
        .collect()
}

/// Assembles the bytes over which the data hash is computed: every ordered
/// header as `name:value` CRLF, then the lower-cased signature header name and
/// the signature value with empty *b=* tag, without a trailing CRLF.
pub fn compute_hash_target(ordered_headers: &[(String, &str)], unsigned_value: &str) -> Vec<u8> {
    let mut result = vec![];

    for (name, value) in ordered_headers {
        result.extend(name.as_bytes());
        result.push(b':');
        result.extend(value.as_bytes());
        result.extend(b"\r\n");
    }

    result.extend(DKIM_SIGNATURE_NAME.to_ascii_lowercase().as_bytes());
    result.push(b':');
    result.extend(unsigned_value.as_bytes());

    result
}

pub fn compute_data_hash(
    hash_alg: HashAlgorithm,
    headers: &[CanonicalHeader],
    unsigned_value: &str,
) -> Box<[u8]> {
    let ordered = order_for_hashing(headers);
    let target = compute_hash_target(&ordered, unsigned_value);
    crypto::digest(hash_alg, &target)
}

/// Canonicalizes and hashes the message body, returning the hash and the
/// length of the canonicalized body.
pub fn compute_body_hash(
    hash_alg: HashAlgorithm,
    canon_alg: CanonicalizationAlgorithm,
    body: &[u8],
) -> (Box<[u8]>, usize) {
    let canonical_body = canonicalize::canonicalize_body(canon_alg, body);
    (crypto::digest(hash_alg, &canonical_body), canonical_body.len())
}
