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

//! Cryptographic utilities.
//!
//! Signing keys are RSA private keys in PKCS#1 format (PEM label `RSA PRIVATE
//! KEY`). Keys in other formats, including PKCS#8 `PRIVATE KEY` documents,
//! are rejected with [`KeyDecodeError::UnsupportedKeyType`].

mod hash;
mod rsa;

pub use self::{
    hash::{digest, digest_slices},
    rsa::sign_rsa,
};

use crate::util::CanonicalStr;
use ::rsa::{RsaPrivateKey, RsaPublicKey};
use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

/// A private key used for signing.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SigningKey(RsaPrivateKey);

impl SigningKey {
    /// Reads an RSA private key from a PEM document in PKCS#1 format.
    ///
    /// Any text before the first `-----BEGIN` line is ignored.
    pub fn from_pkcs1_pem(pem: impl AsRef<[u8]>) -> Result<Self, KeyDecodeError> {
        self::rsa::read_rsa_private_key(pem.as_ref()).map(Self)
    }

    pub fn to_public_key(&self) -> RsaPublicKey {
        self.0.to_public_key()
    }
}

impl AsRef<RsaPrivateKey> for SigningKey {
    fn as_ref(&self) -> &RsaPrivateKey {
        &self.0
    }
}

impl From<RsaPrivateKey> for SigningKey {
    fn from(key: RsaPrivateKey) -> Self {
        Self(key)
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum HashAlgorithm {
    Sha256,
}

impl CanonicalStr for HashAlgorithm {
    fn canonical_str(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
        }
    }
}

/// An error that occurs when reading a signing key.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum KeyDecodeError {
    /// The input contains no PEM block.
    NoKeyFound,
    /// The PEM block has a label other than `RSA PRIVATE KEY`.
    UnsupportedKeyType(String),
    /// The PEM block does not contain a well-formed RSA private key.
    KeyParseError,
}

impl Display for KeyDecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoKeyFound => write!(f, "no private key found"),
            Self::UnsupportedKeyType(label) => write!(f, "unsupported key type \"{label}\""),
            Self::KeyParseError => write!(f, "malformed private key"),
        }
    }
}

impl Error for KeyDecodeError {}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SigningError {
    SigningFailure,
}

impl Display for SigningError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::SigningFailure => write!(f, "signing failed"),
        }
    }
}

impl Error for SigningError {}
