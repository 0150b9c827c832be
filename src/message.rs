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

//! Outgoing message model.
//!
//! A [`Message`] is an ordered list of header fields and a text body, which
//! is transfer-encoded on output.

use crate::{
    header::{FieldBody, FieldName, HeaderField, HeaderFieldError, HeaderFields},
    quoted_printable,
    util::{self, CanonicalStr},
};
use chrono::{DateTime, TimeZone, Utc};
use std::fmt::{self, Display, Formatter};

/// The maximum length of a line of base64-encoded body content.
pub const MAX_LINE_LEN: usize = 78;

// RFC 2047, section 2
const MAX_ENCODED_WORD_LEN: usize = 75;

/// A content transfer encoding.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum TransferEncoding {
    QuotedPrintable,
    #[default]
    Base64,
    /// Unencoded 8-bit content.
    EightBit,
}

impl CanonicalStr for TransferEncoding {
    fn canonical_str(&self) -> &'static str {
        match self {
            Self::QuotedPrintable => "quoted-printable",
            Self::Base64 => "base64",
            Self::EightBit => "8bit",
        }
    }
}

impl Display for TransferEncoding {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_str())
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MessageConfig {
    /// The transfer encoding of the body and of non-ASCII header text.
    pub encoding: TransferEncoding,
    /// The charset label. Body and header text are always UTF-8 internally.
    pub charset: String,
    /// The media type recorded in the *Content-Type* header.
    pub content_type: String,
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            encoding: TransferEncoding::Base64,
            charset: "UTF-8".into(),
            content_type: "text/html".into(),
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Message {
    config: MessageConfig,
    headers: HeaderFields,
    body: String,
}

impl Message {
    pub fn new(config: MessageConfig) -> Self {
        Self {
            config,
            headers: Default::default(),
            body: Default::default(),
        }
    }

    pub fn config(&self) -> &MessageConfig {
        &self.config
    }

    pub fn headers(&self) -> &HeaderFields {
        &self.headers
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = body.into();
    }

    pub fn add_header(&mut self, field: HeaderField) {
        self.headers.push(field);
    }

    /// Inserts a header field at the top of the header block.
    pub fn prepend_header(&mut self, field: HeaderField) {
        self.headers.prepend(field);
    }

    /// Adds an unstructured header. Text that is not plain ASCII is written as
    /// encoded words, unless the transfer encoding is 8bit.
    pub fn add_text_header(&mut self, name: &str, value: &str) -> Result<(), HeaderFieldError> {
        let value = self.encode_header_text(value);
        self.push_header(name, value)
    }

    /// Adds an address header of the form `<address>` or `name <address>`.
    pub fn add_address_header(
        &mut self,
        name: &str,
        address: &str,
        display_name: &str,
    ) -> Result<(), HeaderFieldError> {
        let value = if display_name.is_empty() {
            format!("<{address}>")
        } else {
            format!("{} <{address}>", self.encode_header_text(display_name))
        };
        self.push_header(name, value)
    }

    /// Adds a date header in RFC 2822 format.
    pub fn add_date_header<Tz>(
        &mut self,
        name: &str,
        date: &DateTime<Tz>,
    ) -> Result<(), HeaderFieldError>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        self.push_header(name, date.to_rfc2822())
    }

    /// Adds a *Date* header with the current time.
    pub fn add_date(&mut self) -> Result<(), HeaderFieldError> {
        self.add_date_header("Date", &Utc::now())
    }

    pub fn add_content_type(&mut self) -> Result<(), HeaderFieldError> {
        let value = format!("{}; charset={}", self.config.content_type, self.config.charset);
        self.add_text_header("Content-Type", &value)
    }

    pub fn add_transfer_encoding_header(&mut self) -> Result<(), HeaderFieldError> {
        let value = self.config.encoding.canonical_str();
        self.add_text_header("Content-Transfer-Encoding", value)
    }

    fn push_header(&mut self, name: &str, value: String) -> Result<(), HeaderFieldError> {
        let name = FieldName::new(name.trim())?;
        let body = FieldBody::new(value)?;
        self.headers.push((name, body));
        Ok(())
    }

    fn encode_header_text(&self, text: &str) -> String {
        if !needs_encoding(text) {
            return text.into();
        }

        let charset = &self.config.charset;
        match self.config.encoding {
            TransferEncoding::Base64 => encode_words(text, charset, 'B'),
            TransferEncoding::QuotedPrintable => encode_words(text, charset, 'Q'),
            TransferEncoding::EightBit => text.into(),
        }
    }

    /// Returns the transfer-encoded body.
    pub fn encode_body(&self) -> Vec<u8> {
        let body = self.body.as_bytes();
        match self.config.encoding {
            TransferEncoding::Base64 => encode_base64_body(body).into_bytes(),
            TransferEncoding::QuotedPrintable => {
                quoted_printable::encode_body(body, quoted_printable::MAX_LINE_LEN).into_bytes()
            }
            TransferEncoding::EightBit => body.into(),
        }
    }

    /// Serializes the message: header fields, an empty line, the encoded body
    /// and a final CRLF.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = vec![];

        for (name, body) in self.headers.iter() {
            result.extend(name.as_ref().as_bytes());
            result.extend(b": ");
            result.extend(body.as_ref().as_bytes());
            result.extend(b"\r\n");
        }

        result.extend(b"\r\n");
        result.extend(self.encode_body());
        result.extend(b"\r\n");

        result
    }
}

fn needs_encoding(text: &str) -> bool {
    !text.chars().all(|c| c == '\t' || (' '..='~').contains(&c))
}

fn encode_base64_body(body: &[u8]) -> String {
    let encoded = util::encode_base64(body);

    let mut result = String::with_capacity(encoded.len() + encoded.len() / MAX_LINE_LEN * 2);
    for (i, c) in encoded.chars().enumerate() {
        if i > 0 && i % MAX_LINE_LEN == 0 {
            result.push_str("\r\n");
        }
        result.push(c);
    }
    result
}

// Splits text into encoded words of at most 75 characters, never splitting a
// character; the words are separated by folding whitespace.
fn encode_words(text: &str, charset: &str, encoding: char) -> String {
    let overhead = charset.len() + "=????=".len() + 1;
    let room = MAX_ENCODED_WORD_LEN.saturating_sub(overhead).max(4);

    let encode = |chunk: &str| match encoding {
        'B' => util::encode_base64(chunk),
        _ => quoted_printable::encode_word(chunk),
    };

    let mut words = vec![];
    let mut start = 0;
    let mut end = 0;

    for (i, c) in text.char_indices() {
        let next = i + c.len_utf8();
        if end > start && encode(&text[start..next]).len() > room {
            words.push(encode(&text[start..end]));
            start = end;
        }
        end = next;
    }
    if end > start {
        words.push(encode(&text[start..end]));
    }

    words
        .into_iter()
        .map(|word| format!("=?{charset}?{encoding}?{word}?="))
        .collect::<Vec<_>>()
        .join("\r\n ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_values(message: &Message) -> Vec<(&str, &str)> {
        message
            .headers()
            .iter()
            .map(|(name, body)| (name.as_ref(), body.as_ref()))
            .collect()
    }

    #[test]
    fn add_headers_ok() {
        let mut message = Message::new(Default::default());

        message.add_content_type().unwrap();
        message.add_transfer_encoding_header().unwrap();
        message.add_address_header(" From ", "me@example.com", "").unwrap();
        message.add_address_header("To", "you@example.org", "You").unwrap();
        message.add_text_header("Subject", "plain").unwrap();
        message.add_header((FieldName::new("X-Mailer").unwrap(), FieldBody::new("dmail").unwrap()));

        assert_eq!(message.config().encoding, TransferEncoding::Base64);
        assert_eq!(
            header_values(&message),
            [
                ("Content-Type", "text/html; charset=UTF-8"),
                ("Content-Transfer-Encoding", "base64"),
                ("From", "<me@example.com>"),
                ("To", "You <you@example.org>"),
                ("Subject", "plain"),
                ("X-Mailer", "dmail"),
            ]
        );
    }

    #[test]
    fn add_text_header_encoded_words() {
        let mut message = Message::new(Default::default());
        message.add_text_header("Subject", "Gr\u{fc}\u{df}e").unwrap();

        let config = MessageConfig {
            encoding: TransferEncoding::QuotedPrintable,
            ..Default::default()
        };
        let mut qp_message = Message::new(config);
        qp_message.add_text_header("Subject", "Gr\u{fc}\u{df}e").unwrap();

        let config = MessageConfig {
            encoding: TransferEncoding::EightBit,
            ..Default::default()
        };
        let mut raw_message = Message::new(config);
        raw_message.add_text_header("Subject", "Gr\u{fc}\u{df}e").unwrap();

        assert_eq!(header_values(&message), [("Subject", "=?UTF-8?B?R3LDvMOfZQ==?=")]);
        assert_eq!(header_values(&qp_message), [("Subject", "=?UTF-8?Q?Gr=C3=BC=C3=9Fe?=")]);
        assert_eq!(header_values(&raw_message), [("Subject", "Gr\u{fc}\u{df}e")]);
    }

    #[test]
    fn long_text_split_into_words() {
        let subject = "\u{e4}".repeat(60);

        for (encoding, prefix) in [
            (TransferEncoding::Base64, "=?UTF-8?B?"),
            (TransferEncoding::QuotedPrintable, "=?UTF-8?Q?"),
        ] {
            let config = MessageConfig {
                encoding,
                ..Default::default()
            };
            let mut message = Message::new(config);

            message.add_text_header("Subject", &subject).unwrap();

            let (_, value) = header_values(&message)[0];
            let words: Vec<_> = value.split("\r\n ").collect();
            assert!(words.len() > 1);
            for word in words {
                assert!(word.len() <= MAX_ENCODED_WORD_LEN, "{word:?} too long");
                assert!(word.starts_with(prefix) && word.ends_with("?="));
            }
        }
    }

    #[test]
    fn encode_words_fill_to_limit() {
        // 44 bytes per word encode to 60 base64 characters, 72 in total
        let words = encode_words(&"\u{e4}".repeat(60), "UTF-8", 'B');

        let lens: Vec<_> = words.split("\r\n ").map(str::len).collect();
        assert_eq!(lens, [72, 72, 56]);
    }

    #[test]
    fn encode_body_quoted_printable_line_limit() {
        let config = MessageConfig {
            encoding: TransferEncoding::QuotedPrintable,
            ..Default::default()
        };
        let mut message = Message::new(config);
        message.set_body("x".repeat(200));

        let body = String::from_utf8(message.encode_body()).unwrap();

        for line in body.split("\r\n") {
            assert!(line.len() <= quoted_printable::MAX_LINE_LEN);
        }
    }

    #[test]
    fn add_text_header_rejects_bad_name() {
        let mut message = Message::new(Default::default());

        assert_eq!(message.add_text_header("Bad Name", "x"), Err(HeaderFieldError));
        assert!(message.headers().is_empty());
    }

    #[test]
    fn add_date_header_rfc2822() {
        let mut message = Message::new(Default::default());
        let date = Utc.with_ymd_and_hms(2014, 11, 25, 10, 46, 9).unwrap();

        message.add_date_header("Date", &date).unwrap();

        assert_eq!(header_values(&message), [("Date", "Tue, 25 Nov 2014 10:46:09 +0000")]);
    }

    #[test]
    fn encode_body_base64_wrapped() {
        let mut message = Message::new(Default::default());
        message.set_body("a".repeat(100));

        let body = message.encode_body();

        let lines: Vec<_> = body.split(|&b| b == b'\n').collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].len(), MAX_LINE_LEN + 1);
        assert!(!body.ends_with(b"\r\n"));
    }

    #[test]
    fn to_bytes_layout() {
        let config = MessageConfig {
            encoding: TransferEncoding::EightBit,
            ..Default::default()
        };
        let mut message = Message::new(config);
        message.add_text_header("Subject", "hi").unwrap();
        message.set_body("body");

        let from = (FieldName::new("From").unwrap(), FieldBody::new("<me@example.com>").unwrap());
        message.prepend_header(from);

        assert_eq!(
            message.to_bytes(),
            b"From: <me@example.com>\r\nSubject: hi\r\n\r\nbody\r\n"
        );
    }
}
