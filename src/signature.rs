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

//! DKIM signature.

use crate::{crypto::HashAlgorithm, header::FieldName, util::CanonicalStr};
use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    str::FromStr,
};

/// The name of the header field carrying the signature.
pub const DKIM_SIGNATURE_NAME: &str = "DKIM-Signature";

/// The query method recorded in the *q=* tag.
pub const QUERY_METHOD: &str = "dns/txt";

/// A signature algorithm.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum SignatureAlgorithm {
    /// The *rsa-sha256* signature algorithm.
    #[default]
    RsaSha256,
}

impl SignatureAlgorithm {
    /// Returns this signature algorithm’s hash algorithm.
    pub fn hash_algorithm(self) -> HashAlgorithm {
        match self {
            Self::RsaSha256 => HashAlgorithm::Sha256,
        }
    }
}

impl CanonicalStr for SignatureAlgorithm {
    fn canonical_str(&self) -> &'static str {
        match self {
            Self::RsaSha256 => "rsa-sha256",
        }
    }
}

impl Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_str())
    }
}

/// An error for a canonicalization name that names no known algorithm.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UnknownCanonicalizationError {
    pub name: Box<str>,
}

impl Display for UnknownCanonicalizationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "unknown canonicalization algorithm \"{}\"", self.name)
    }
}

impl Error for UnknownCanonicalizationError {}

/// A canonicalization algorithm.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CanonicalizationAlgorithm {
    /// The *simple* canonicalization algorithm.
    Simple,
    /// The *relaxed* canonicalization algorithm.
    Relaxed,
}

impl CanonicalStr for CanonicalizationAlgorithm {
    fn canonical_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Relaxed => "relaxed",
        }
    }
}

impl Display for CanonicalizationAlgorithm {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_str())
    }
}

impl FromStr for CanonicalizationAlgorithm {
    type Err = UnknownCanonicalizationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("simple") {
            Ok(Self::Simple)
        } else if s.eq_ignore_ascii_case("relaxed") {
            Ok(Self::Relaxed)
        } else {
            Err(UnknownCanonicalizationError { name: s.into() })
        }
    }
}

/// A pair of header/body canonicalization algorithms.
///
/// The default is *relaxed* for headers and *simple* for the body.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Canonicalization {
    /// The header canonicalization.
    pub header: CanonicalizationAlgorithm,
    /// The body canonicalization.
    pub body: CanonicalizationAlgorithm,
}

impl Default for Canonicalization {
    fn default() -> Self {
        Self {
            header: CanonicalizationAlgorithm::Relaxed,
            body: CanonicalizationAlgorithm::Simple,
        }
    }
}

impl From<(CanonicalizationAlgorithm, CanonicalizationAlgorithm)> for Canonicalization {
    fn from((header, body): (CanonicalizationAlgorithm, CanonicalizationAlgorithm)) -> Self {
        Self { header, body }
    }
}

impl CanonicalStr for Canonicalization {
    fn canonical_str(&self) -> &'static str {
        use CanonicalizationAlgorithm::*;

        match (self.header, self.body) {
            (Simple, Simple) => "simple/simple",
            (Simple, Relaxed) => "simple/relaxed",
            (Relaxed, Simple) => "relaxed/simple",
            (Relaxed, Relaxed) => "relaxed/relaxed",
        }
    }
}

impl Display for Canonicalization {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_str())
    }
}

impl FromStr for Canonicalization {
    type Err = UnknownCanonicalizationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(if let Some((header, body)) = s.split_once('/') {
            Self {
                header: header.parse()?,
                body: body.parse()?,
            }
        } else {
            Self {
                header: s.parse()?,
                body: CanonicalizationAlgorithm::Simple,
            }
        })
    }
}

/// A DKIM signature as recorded in a produced *DKIM-Signature* header.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DkimSignature {
    pub algorithm: SignatureAlgorithm,
    pub signature_data: Box<[u8]>,
    pub body_hash: Box<[u8]>,
    pub canonicalization: Canonicalization,
    pub domain: Box<str>,
    /// The contents of the *h=* tag, in listing order.
    pub signed_headers: Box<[FieldName]>,
    /// The full *i=* value, `identity@domain`.
    pub identity: Box<str>,
    pub body_length: Option<usize>,
    pub selector: Box<str>,
    pub timestamp: u64,
}
