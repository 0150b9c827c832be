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

//! Canonicalization utilities.
//!
//! Only CRLF is recognised as line separator; stray CR and LF are treated
//! like other bytes.

use crate::{signature::CanonicalizationAlgorithm, util::is_wsp};
use bstr::ByteSlice;

const SP: u8 = b' ';
const CRLF: [u8; 2] = *b"\r\n";

/// Canonicalizes a header field body.
///
/// The field name is not part of the transform: names are lower-cased only
/// when the hash input is assembled.
pub fn canonicalize_header(algorithm: CanonicalizationAlgorithm, value: &str) -> String {
    match algorithm {
        CanonicalizationAlgorithm::Simple => value.into(),
        CanonicalizationAlgorithm::Relaxed => canonicalize_header_relaxed(value),
    }
}

fn canonicalize_header_relaxed(value: &str) -> String {
    fn is_space(c: char) -> bool {
        matches!(c, ' ' | '\t' | '\r' | '\n' | '\x0c')
    }

    let value = unfold(value);
    let value = value.trim_matches(is_space);

    let mut result = String::with_capacity(value.len());
    let mut compressing = false;
    for c in value.chars() {
        if is_wsp(c) {
            if !compressing {
                result.push(' ');
                compressing = true;
            }
        } else {
            result.push(c);
            compressing = false;
        }
    }

    result
}

/// Unfolds a header field body by deleting every CRLF. The whitespace that
/// introduced continuation lines is left in place.
pub fn unfold(value: &str) -> String {
    value.replace("\r\n", "")
}

/// Canonicalizes a complete message body.
pub fn canonicalize_body(algorithm: CanonicalizationAlgorithm, body: &[u8]) -> Vec<u8> {
    match algorithm {
        CanonicalizationAlgorithm::Simple => strip_trailing_lines(body),
        CanonicalizationAlgorithm::Relaxed => strip_trailing_lines(&relax_lines(body)),
    }
}

// Trailing run of CRLF replaced with exactly one CRLF; an empty body becomes
// a single CRLF.
fn strip_trailing_lines(body: &[u8]) -> Vec<u8> {
    let mut end = body.len();
    while body[..end].ends_with(&CRLF) {
        end -= CRLF.len();
    }

    let mut result = Vec::with_capacity(end + CRLF.len());
    result.extend(&body[..end]);
    result.extend(CRLF);
    result
}

// Whitespace before a line break is dropped, remaining runs of whitespace
// become a single SP. A final unterminated line keeps its trailing (now
// compressed) whitespace.
fn relax_lines(body: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(body.len());

    let mut lines = body.split_str(&CRLF).peekable();
    while let Some(line) = lines.next() {
        let terminated = lines.peek().is_some();

        let line = if terminated {
            line.trim_end_with(is_wsp)
        } else {
            line
        };

        let mut compressing = false;
        for &b in line {
            if is_wsp(b.into()) {
                if !compressing {
                    result.push(SP);
                    compressing = true;
                }
            } else {
                result.push(b);
                compressing = false;
            }
        }

        if terminated {
            result.extend(CRLF);
        }
    }

    result
}
