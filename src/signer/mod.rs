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

//! Signer and supporting types.

mod format;
mod request;
mod select;
mod sign;

pub use crate::signer::{
    format::{fold_header, LINE_WIDTH},
    request::{BodyLength, SignRequest, Timestamp},
    select::{select_headers, signed_header_names, HeaderPolicy},
};

use crate::{
    crypto::KeyDecodeError,
    header::{FieldBody, FieldName, HeaderField, HeaderFieldError, HeaderFields},
    message::Message,
    signature::{DkimSignature, UnknownCanonicalizationError},
};
use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};
use tracing::debug;

/// An error that occurs when producing a signature.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SignerError {
    /// A header field that must be signed does not occur in the message.
    MissingRequiredHeader(String),
    /// The signing key could not be read.
    KeyDecode(KeyDecodeError),
    /// The cryptographic signing operation failed.
    SigningFailure,
    /// A canonicalization algorithm name is not recognised.
    UnknownCanonicalization(String),
}

impl Display for SignerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRequiredHeader(name) => write!(f, "required header {name} not present"),
            Self::KeyDecode(_) => write!(f, "could not read signing key"),
            Self::SigningFailure => write!(f, "signing failed"),
            Self::UnknownCanonicalization(name) => {
                write!(f, "unknown canonicalization algorithm \"{name}\"")
            }
        }
    }
}

impl Error for SignerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::KeyDecode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<KeyDecodeError> for SignerError {
    fn from(error: KeyDecodeError) -> Self {
        Self::KeyDecode(error)
    }
}

impl From<UnknownCanonicalizationError> for SignerError {
    fn from(error: UnknownCanonicalizationError) -> Self {
        Self::UnknownCanonicalization(error.name.into())
    }
}

/// A successfully produced signature.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SigningResult {
    /// The header name, always `DKIM-Signature`.
    pub header_name: String,
    /// The folded header value.
    pub header_value: String,
    pub signature: DkimSignature,
}

impl SigningResult {
    /// Formats the header as it appears in the message, without final CRLF.
    pub fn format_header(&self) -> String {
        format!("{}: {}", self.header_name, self.header_value)
    }

    pub fn to_header_field(&self) -> Result<HeaderField, HeaderFieldError> {
        let name = FieldName::new(self.header_name.as_str())?;
        let body = FieldBody::new(self.header_value.as_str())?;
        Ok((name, body))
    }
}

/// A signer for outgoing messages.
///
/// Signing is a single synchronous pass over the message; a `Signer` holds no
/// state besides its request and may be shared between threads.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Signer {
    request: SignRequest,
}

impl Signer {
    pub fn new(request: SignRequest) -> Self {
        Self { request }
    }

    pub fn request(&self) -> &SignRequest {
        &self.request
    }

    /// Signs a message given as header fields and the transfer-encoded body.
    pub fn sign(&self, headers: &HeaderFields, body: &[u8]) -> Result<SigningResult, SignerError> {
        let result = sign::perform_signing(&self.request, headers, body);

        match &result {
            Ok(r) => debug!(domain = %self.request.domain, selector = %self.request.selector,
                "signed message with {} header fields", r.signature.signed_headers.len()),
            Err(e) => debug!(domain = %self.request.domain, "failed to sign message: {e}"),
        }

        result
    }

    /// Signs a composed message.
    pub fn sign_message(&self, message: &Message) -> Result<SigningResult, SignerError> {
        self.sign(message.headers(), &message.encode_body())
    }
}
