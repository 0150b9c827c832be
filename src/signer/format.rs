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

use crate::{
    header::FieldName,
    signature::{Canonicalization, DkimSignature, SignatureAlgorithm, QUERY_METHOD},
    util::{self, CanonicalStr},
};

/// The maximum number of characters on a line, not counting the leading space
/// of continuation lines.
pub const LINE_WIDTH: usize = 72;

const TAG_SEPARATOR: &str = "; ";
const NAME_SEPARATOR: &str = " : ";

pub struct UnsignedDkimSignature {
    pub algorithm: SignatureAlgorithm,
    pub body_hash: Box<[u8]>,
    pub canonicalization: Canonicalization,
    pub domain: Box<str>,
    pub signed_headers: Box<[FieldName]>,
    /// The full *i=* value.
    pub identity: Box<str>,
    pub body_length: Option<usize>,
    pub selector: Box<str>,
    pub timestamp: u64,
}

impl UnsignedDkimSignature {
    /// Returns the tags in output order, with an empty *b=* tag.
    pub fn tags(&self) -> Vec<(&'static str, String)> {
        let mut tags = Vec::with_capacity(12);

        tags.push(("v", "1".into()));
        tags.push(("a", self.algorithm.canonical_str().into()));
        tags.push(("c", self.canonicalization.canonical_str().into()));
        tags.push(("d", self.domain.as_ref().into()));
        tags.push(("i", self.identity.as_ref().into()));
        tags.push(("q", QUERY_METHOD.into()));
        tags.push(("s", self.selector.as_ref().into()));
        tags.push(("t", self.timestamp.to_string()));
        if let Some(len) = self.body_length {
            tags.push(("l", len.to_string()));
        }
        tags.push(("h", format_signed_headers(&self.signed_headers)));
        tags.push(("bh", util::encode_base64(&self.body_hash)));
        tags.push(("b", String::new()));

        tags
    }

    /// Returns the unfolded tag list with empty *b=* tag, the input to the
    /// data hash.
    pub fn format_without_signature(&self) -> String {
        format_tags(&self.tags())
    }

    /// Returns the folded tag list including the signature data.
    pub fn format_with_signature(&self, signature_data: &[u8]) -> String {
        let mut tags = self.tags();
        if let Some((_, b)) = tags.last_mut() {
            *b = util::encode_base64(signature_data);
        }
        fold_header(&format_tags(&tags))
    }

    pub fn into_signature(self, signature_data: Box<[u8]>) -> DkimSignature {
        DkimSignature {
            algorithm: self.algorithm,
            signature_data,
            body_hash: self.body_hash,
            canonicalization: self.canonicalization,
            domain: self.domain,
            signed_headers: self.signed_headers,
            identity: self.identity,
            body_length: self.body_length,
            selector: self.selector,
            timestamp: self.timestamp,
        }
    }
}

fn format_tags(tags: &[(&str, String)]) -> String {
    tags.iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join(TAG_SEPARATOR)
}

fn format_signed_headers(names: &[FieldName]) -> String {
    names
        .iter()
        .map(|name| name.as_ref())
        .collect::<Vec<_>>()
        .join(NAME_SEPARATOR)
}

/// Folds a header value into continuation lines of at most `LINE_WIDTH`
/// characters.
///
/// Lines are broken after the last space that fits; a run of more than
/// `LINE_WIDTH` characters without space is broken at the limit. Text up to
/// and including an existing line break is left untouched.
pub fn fold_header(value: &str) -> String {
    let (prefix, mut rest) = match value.rfind("\r\n ") {
        Some(i) => value.split_at(i + 3),
        None => ("", value),
    };

    let mut result = String::with_capacity(value.len() + value.len() / LINE_WIDTH * 3);
    result.push_str(prefix);

    // byte index of the first character beyond the line limit
    while let Some((limit, _)) = rest.char_indices().nth(LINE_WIDTH) {
        let i = match rest[..limit].rfind(' ') {
            Some(i) => i + 1,
            None => limit,
        };

        result.push_str(&rest[..i]);
        result.push_str("\r\n ");
        rest = &rest[i..];
    }

    result.push_str(rest);

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::CanonicalizationAlgorithm;

    fn example_signature(body_length: Option<usize>) -> UnsignedDkimSignature {
        UnsignedDkimSignature {
            algorithm: SignatureAlgorithm::RsaSha256,
            body_hash: Box::new([0; 32]),
            canonicalization: (
                CanonicalizationAlgorithm::Relaxed,
                CanonicalizationAlgorithm::Simple,
            )
                .into(),
            domain: "example.com".into(),
            signed_headers: ["From", "To", "From"]
                .into_iter()
                .map(|n| FieldName::new(n).unwrap())
                .collect(),
            identity: "me@example.com".into(),
            body_length,
            selector: "sel".into(),
            timestamp: 1,
        }
    }

    #[test]
    fn format_without_signature_ok() {
        let sig = example_signature(None);

        assert_eq!(
            sig.format_without_signature(),
            "v=1; a=rsa-sha256; c=relaxed/simple; d=example.com; i=me@example.com; \
             q=dns/txt; s=sel; t=1; h=From : To : From; \
             bh=AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=; b="
        );
    }

    #[test]
    fn tag_order_with_length() {
        let sig = example_signature(Some(12));

        let names: Vec<_> = sig.tags().into_iter().map(|(name, _)| name).collect();

        assert_eq!(names, ["v", "a", "c", "d", "i", "q", "s", "t", "l", "h", "bh", "b"]);
    }

    #[test]
    fn format_with_signature_folds() {
        let sig = example_signature(None);

        let value = sig.format_with_signature(&[0xff; 128]);

        assert!(value.split("\r\n").all(|line| line.trim_start_matches(' ').len() <= LINE_WIDTH));
        assert_eq!(value.replace("\r\n ", "").matches("b=").count(), 1);
        assert!(value.ends_with("//8="));
    }

    #[test]
    fn fold_header_short_unchanged() {
        assert_eq!(fold_header("a=1; b=2"), "a=1; b=2");
        assert_eq!(fold_header(""), "");
    }

    #[test]
    fn fold_header_breaks_after_space() {
        let value = format!("{} {}", "x".repeat(60), "y".repeat(20));

        assert_eq!(
            fold_header(&value),
            format!("{} \r\n {}", "x".repeat(60), "y".repeat(20))
        );
    }

    #[test]
    fn fold_header_hard_break() {
        let value = "z".repeat(150);

        assert_eq!(
            fold_header(&value),
            format!("{}\r\n {}\r\n {}", "z".repeat(72), "z".repeat(72), "z".repeat(6))
        );
    }

    #[test]
    fn fold_header_keeps_existing_prefix() {
        let rest = format!("{} {}", "b".repeat(70), "c".repeat(10));
        let value = format!("{}\r\n {rest}", "a".repeat(100));

        assert_eq!(
            fold_header(&value),
            format!("{}\r\n {} \r\n {}", "a".repeat(100), "b".repeat(70), "c".repeat(10))
        );
    }

    #[test]
    fn fold_header_counts_characters() {
        let value = "ä".repeat(73);

        let folded = fold_header(&value);

        assert_eq!(folded, format!("{}\r\n ä", "ä".repeat(72)));
    }
}
