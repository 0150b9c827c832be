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

//! Quoted-Printable encoding of message bodies (RFC 2045) and of header text
//! in encoded words (RFC 2047, *Q* encoding).

use bstr::ByteSlice;

/// The maximum length of an encoded line, soft line break included (RFC 2045,
/// section 6.7).
pub const MAX_LINE_LEN: usize = 76;

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

fn push_encoded_byte(s: &mut String, b: u8) {
    s.push('=');
    s.push(HEX_DIGITS[usize::from(b >> 4)].into());
    s.push(HEX_DIGITS[usize::from(b & 0xf)].into());
}

fn is_literal(b: u8) -> bool {
    matches!(b, b'!'..=b'<' | b'>'..=b'~')
}

/// Encodes a message body as Quoted-Printable.
///
/// Both CRLF and LF in the input are taken as line breaks and written as
/// CRLF. Lines longer than `max_line_len` are broken with soft line breaks
/// (`=` CRLF); encoded octets are never split.
pub fn encode_body(input: &[u8], max_line_len: usize) -> String {
    let mut result = String::with_capacity(input.len() + input.len() / 2);

    let mut lines = input.split_str("\n").peekable();
    while let Some(line) = lines.next() {
        let terminated = lines.peek().is_some();

        let line = if terminated {
            line.strip_suffix(b"\r").unwrap_or(line)
        } else {
            line
        };

        encode_line(&mut result, line, max_line_len);

        if terminated {
            result.push_str("\r\n");
        }
    }

    result
}

fn encode_line(result: &mut String, line: &[u8], max_line_len: usize) {
    let mut token = String::with_capacity(3);
    let mut line_len = 0;

    for (i, &b) in line.iter().enumerate() {
        token.clear();

        // whitespace at the end of a line must be encoded
        let is_last = i + 1 == line.len();
        if is_literal(b) || (matches!(b, b' ' | b'\t') && !is_last) {
            token.push(b.into());
        } else {
            push_encoded_byte(&mut token, b);
        }

        // keep room for the soft line break marker
        if line_len + token.len() + 1 > max_line_len {
            result.push_str("=\r\n");
            line_len = 0;
        }

        result.push_str(&token);
        line_len += token.len();
    }
}

/// Encodes text for use in an RFC 2047 encoded word with *Q* encoding.
pub fn encode_word(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for b in text.bytes() {
        match b {
            b' ' => result.push('_'),
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'!' | b'*' | b'+' | b'-' | b'/' => {
                result.push(b.into());
            }
            b => push_encoded_byte(&mut result, b),
        }
    }

    result
}
