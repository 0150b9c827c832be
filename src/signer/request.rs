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
    signature::{Canonicalization, CanonicalizationAlgorithm, SignatureAlgorithm},
    signer::{select::HeaderPolicy, SignerError},
};
use chrono::Utc;

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum BodyLength {
    /// Do not limit the body length: no *l=* tag.
    #[default]
    All,
    /// Sign only the body as presented: set *l=* to the canonicalized body
    /// length.
    OnlyMessageLength,
}

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Timestamp {
    /// Record the time at which the signature is produced.
    #[default]
    Now,
    Exact(u64),
}

impl Timestamp {
    pub fn to_unix_secs(self) -> u64 {
        match self {
            Self::Now => Utc::now().timestamp().try_into().unwrap_or_default(),
            Self::Exact(t) => t,
        }
    }
}

/// A request for producing one DKIM signature.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SignRequest {
    /// The PEM-encoded RSA private key (PKCS#1) used to produce the signature.
    pub private_key_pem: Vec<u8>,

    /// The signature algorithm to use in the *a=* tag.
    pub algorithm: SignatureAlgorithm,
    /// The canonicalization to use in the *c=* tag.
    pub canonicalization: Canonicalization,
    /// The classification of header fields used to select the signed headers.
    pub policy: HeaderPolicy,
    /// The signing domain to use in the *d=* tag.
    pub domain: String,
    /// The local part of the *i=* tag. The tag value is always
    /// `identity@domain`, even if the identity is empty.
    pub identity: String,
    /// The selector to use in the *s=* tag.
    pub selector: String,
    /// The strategy to use for generating the *l=* tag.
    pub body_length: BodyLength,
    /// The timestamp value to record in the *t=* tag.
    pub timestamp: Timestamp,
}

impl SignRequest {
    pub fn new(
        domain: impl Into<String>,
        identity: impl Into<String>,
        selector: impl Into<String>,
        private_key_pem: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            private_key_pem: private_key_pem.into(),

            algorithm: SignatureAlgorithm::RsaSha256,
            canonicalization: Default::default(),
            policy: HeaderPolicy::STANDARD,
            domain: domain.into(),
            identity: identity.into(),
            selector: selector.into(),
            body_length: BodyLength::All,
            timestamp: Timestamp::Now,
        }
    }

    /// Sets the canonicalization from header and body algorithm names, eg
    /// `"relaxed"` and `"simple"`.
    pub fn set_canonicalization(&mut self, header: &str, body: &str) -> Result<(), SignerError> {
        let header: CanonicalizationAlgorithm = header.parse()?;
        let body: CanonicalizationAlgorithm = body.parse()?;
        self.canonicalization = (header, body).into();
        Ok(())
    }

    /// The value of the *i=* tag.
    pub fn full_identity(&self) -> String {
        format!("{}@{}", self.identity, self.domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use CanonicalizationAlgorithm::*;

    #[test]
    fn new_request_defaults() {
        let request = SignRequest::new("example.com", "", "sel", "");

        assert_eq!(request.canonicalization, (Relaxed, Simple).into());
        assert_eq!(request.body_length, BodyLength::All);
        assert_eq!(request.timestamp, Timestamp::Now);
        assert_eq!(request.policy, HeaderPolicy::STANDARD);
    }

    #[test]
    fn set_canonicalization_ok() {
        let mut request = SignRequest::new("example.com", "", "sel", "");

        request.set_canonicalization("simple", "relaxed").unwrap();

        assert_eq!(request.canonicalization, (Simple, Relaxed).into());
    }

    #[test]
    fn set_canonicalization_unknown() {
        let mut request = SignRequest::new("example.com", "", "sel", "");

        assert_eq!(
            request.set_canonicalization("relaxed", "nowsp"),
            Err(SignerError::UnknownCanonicalization("nowsp".into()))
        );
        assert_eq!(request.canonicalization, Default::default());
    }

    #[test]
    fn full_identity_verbatim() {
        let mut request = SignRequest::new("example.com", "", "sel", "");
        assert_eq!(request.full_identity(), "@example.com");

        request.identity = "me@sub".into();
        assert_eq!(request.full_identity(), "me@sub@example.com");
    }

    #[test]
    fn exact_timestamp() {
        assert_eq!(Timestamp::Exact(1416912369).to_unix_secs(), 1416912369);
        assert!(Timestamp::Now.to_unix_secs() > 1416912369);
    }
}
