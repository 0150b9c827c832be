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

//! A library for composing outgoing email messages and signing them with
//! *DomainKeys Identified Mail* (DKIM) signatures as described in [RFC 6376].
//!
//! The high-level API consists of [`compose`], which turns a [`Mail`] into a
//! [`Message`], and [`Signer`], which produces a *DKIM-Signature* header for
//! a message. For convenience, all the relevant items are re-exported at the
//! top level.
//!
//! The low-level building blocks are provided in additional modules: header
//! canonicalisation, the hashing of headers and body, tag list formatting and
//! folding, and RSA signing.
//!
//! # Usage
//!
//! Signing uses algorithm *rsa-sha256* with an RSA private key in PKCS#1 PEM
//! format. Header fields are selected for signing according to a
//! [`HeaderPolicy`]; at least *From* must be present.
//!
//! ```
//! use dmail::{compose, Address, Mail, MessageConfig, SignRequest, Signer};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let key_pem = std::fs::read("tests/keys/rsa1024.pem")?;
//! let request = SignRequest::new("example.com", "", "sel", key_pem);
//! let signer = Signer::new(request);
//!
//! let mail = Mail::new("me@example.com", [Address::new("you@example.org")], "Hi", "Hello!");
//!
//! let message = compose(&mail, &MessageConfig::default(), Some(&signer))?;
//!
//! let (name, _) = &message.headers().as_ref()[0];
//! assert_eq!(name.as_ref(), "DKIM-Signature");
//! # Ok(())
//! # }
//! ```
//!
//! [RFC 6376]: https://www.rfc-editor.org/rfc/rfc6376

pub mod canonicalize;
pub mod crypto;
pub mod header;
pub mod mail;
pub mod message;
pub mod message_hash;
pub mod quoted_printable;
pub mod signature;
pub mod signer;
mod util;

pub use crate::{
    crypto::{KeyDecodeError, SigningKey},
    header::{FieldBody, FieldName, HeaderField, HeaderFieldError, HeaderFields},
    mail::{compose, Address, Mail, MessageError},
    message::{Message, MessageConfig, TransferEncoding},
    signature::{Canonicalization, CanonicalizationAlgorithm, DkimSignature, SignatureAlgorithm},
    signer::{BodyLength, HeaderPolicy, SignRequest, Signer, SignerError, SigningResult, Timestamp},
    util::{encode_base64, CanonicalStr},
};
