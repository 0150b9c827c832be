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

//! Representation of email header data.
//!
//! Header fields are kept in the order they were authored. Field names keep
//! their original case but compare case-insensitively; field bodies are stored
//! without the separator whitespace that follows the colon.

use crate::util::is_wsp;
use std::{
    error::Error,
    fmt::{self, Debug, Display, Formatter},
    hash::{Hash, Hasher},
    str::FromStr,
};

pub type HeaderField = (FieldName, FieldBody);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct HeaderFieldError;

impl Display for HeaderFieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "malformed header field")
    }
}

impl Error for HeaderFieldError {}

/// An ordered collection of header fields.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct HeaderFields(Vec<HeaderField>);

impl HeaderFields {
    pub fn new(value: impl Into<Vec<HeaderField>>) -> Self {
        Self(value.into())
    }

    pub fn from_vec(value: Vec<(String, String)>) -> Result<Self, HeaderFieldError> {
        let value: Vec<_> = value
            .into_iter()
            .map(|(name, value)| {
                let name = FieldName::new(name)?;
                let body = FieldBody::new(value)?;
                Ok((name, body))
            })
            .collect::<Result<_, _>>()?;
        Ok(Self(value))
    }

    pub fn push(&mut self, field: HeaderField) {
        self.0.push(field);
    }

    /// Inserts a header field before all others.
    pub fn prepend(&mut self, field: HeaderField) {
        self.0.insert(0, field);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &HeaderField> {
        self.0.iter()
    }
}

impl AsRef<[HeaderField]> for HeaderFields {
    fn as_ref(&self) -> &[HeaderField] {
        &self.0
    }
}

impl From<HeaderFields> for Vec<HeaderField> {
    fn from(header_fields: HeaderFields) -> Self {
        header_fields.0
    }
}

impl IntoIterator for HeaderFields {
    type Item = HeaderField;
    type IntoIter = std::vec::IntoIter<HeaderField>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromStr for HeaderFields {
    type Err = HeaderFieldError;

    /// Parses a header block. Lines may be terminated with CRLF or LF;
    /// continuation lines are joined to the preceding field with CRLF.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut fields: Vec<(String, String)> = vec![];

        for line in s.lines() {
            if line.starts_with(is_wsp) {
                let (_, value) = fields.last_mut().ok_or(HeaderFieldError)?;
                value.push_str("\r\n");
                value.push_str(line);
            } else {
                let (name, value) = line.split_once(':').ok_or(HeaderFieldError)?;
                fields.push((name.into(), value.trim_start_matches(is_wsp).into()));
            }
        }

        Self::from_vec(fields)
    }
}

// Note that ';' in a field name is permitted by RFC 5322 but would corrupt
// the h= tag; such fields are never selected by the standard header policy.
#[derive(Clone, Eq)]
pub struct FieldName(Box<str>);

impl FieldName {
    pub fn new(value: impl Into<Box<str>>) -> Result<Self, HeaderFieldError> {
        let value = value.into();
        if value.is_empty() {
            return Err(HeaderFieldError);
        }
        if !value.chars().all(|c| c.is_ascii_graphic() && c != ':') {
            return Err(HeaderFieldError);
        }
        Ok(Self(value))
    }
}

impl AsRef<str> for FieldName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for FieldName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Debug for FieldName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl PartialEq for FieldName {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl PartialEq<&str> for FieldName {
    fn eq(&self, other: &&str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl Hash for FieldName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_ascii_lowercase().hash(state);
    }
}

/// A header field body, possibly folded across several lines.
#[derive(Clone, Eq, Hash, PartialEq)]
pub struct FieldBody(Box<str>);

impl FieldBody {
    pub fn new(value: impl Into<Box<str>>) -> Result<Self, HeaderFieldError> {
        let value = value.into();
        // only folded continuation lines:
        if !value.split("\r\n").skip(1).all(|line| line.starts_with(is_wsp)) {
            return Err(HeaderFieldError);
        }
        // no stray CR and LF, which also rules out a trailing CRLF:
        if !value.split("\r\n").all(|line| !line.contains(['\r', '\n'])) {
            return Err(HeaderFieldError);
        }
        Ok(Self(value))
    }
}

impl AsRef<str> for FieldBody {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for FieldBody {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Debug for FieldBody {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FieldBody").field(&self.0).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_name_ok() {
        assert!(FieldName::new("abc").is_ok());

        assert!(FieldName::new("").is_err());
        assert!(FieldName::new("abc ").is_err());
        assert!(FieldName::new("a:c").is_err());
    }

    #[test]
    fn field_name_case_insensitive() {
        let name = FieldName::new("Subject").unwrap();

        assert_eq!(name, FieldName::new("subject").unwrap());
        assert_eq!(name, "SUBJECT");
        assert_eq!(name.as_ref(), "Subject");
    }

    #[test]
    fn field_name_debug_and_display() {
        let name = FieldName::new("Subject").unwrap();

        assert_eq!(format!("{name:?}"), "\"Subject\"");
        assert_eq!(name.to_string(), "Subject");
    }

    #[test]
    fn field_body_ok() {
        assert!(FieldBody::new("ab\r\n\tcd ").is_ok());
        assert!(FieldBody::new("").is_ok());
        assert!(FieldBody::new("  ").is_ok());

        assert!(FieldBody::new(" \r\na").is_err());
        assert!(FieldBody::new(" \na").is_err());
        assert!(FieldBody::new("abc\r\n").is_err());
    }

    #[test]
    fn header_fields_from_str_ok() {
        let headers: HeaderFields = "From: me\nTo: you,\n\tthem\nSubject:hi".parse().unwrap();

        let fields: Vec<_> = headers
            .iter()
            .map(|(name, body)| (name.as_ref(), body.as_ref()))
            .collect();

        assert_eq!(
            fields,
            [("From", "me"), ("To", "you,\r\n\tthem"), ("Subject", "hi")]
        );
    }

    #[test]
    fn header_fields_from_str_rejects_leading_continuation() {
        assert_eq!(" folded\nFrom: me".parse::<HeaderFields>(), Err(HeaderFieldError));
    }

    #[test]
    fn header_fields_prepend() {
        let mut headers = HeaderFields::from_vec(vec![("To".into(), "you".into())]).unwrap();

        headers.prepend((FieldName::new("From").unwrap(), FieldBody::new("me").unwrap()));

        assert_eq!(headers.len(), 2);
        assert_eq!(headers.as_ref()[0].0, "from");
    }
}
