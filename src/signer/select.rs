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

//! Selection of the header fields to sign.

use crate::{
    canonicalize,
    header::{FieldName, HeaderFields},
    message_hash::CanonicalHeader,
    signature::CanonicalizationAlgorithm,
    signer::SignerError,
};

/// The classification of header field names that drives header selection.
///
/// All names are given in lower case and are matched case-insensitively.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct HeaderPolicy {
    /// Header fields that must be present and are always signed.
    pub must: &'static [&'static str],
    /// Header fields that are signed when present.
    pub should: &'static [&'static str],
    /// Header fields that should not be signed. Not consulted during
    /// selection: anything not listed in `must` or `should` is skipped anyway.
    pub should_not: &'static [&'static str],
    /// Signed header fields that are listed a second time at the end of the
    /// *h=* tag.
    pub frozen: &'static [&'static str],
}

impl HeaderPolicy {
    pub const STANDARD: Self = Self {
        must: &["from"],
        should: &[
            "sender",
            "reply-to",
            "subject",
            "date",
            "message-id",
            "to",
            "cc",
            "mime-version",
            "content-type",
            "content-transfer-encoding",
            "content-id",
            "resent-date",
            "resent-from",
            "resent-sender",
            "resent-to",
            "resent-cc",
            "resent-message-id",
            "in-reply-to",
            "references",
            "list-id",
            "list-help",
            "list-unsubscribe",
            "list-subscribe",
            "list-post",
            "list-owner",
            "list-archive",
        ],
        should_not: &[
            "return-path",
            "received",
            "comments",
            "keywords",
            "bcc",
            "resent-bcc",
            "dkim-signature",
        ],
        frozen: &["from", "subject", "date"],
    };

    pub fn is_must(&self, name: &FieldName) -> bool {
        contains(self.must, name)
    }

    pub fn is_should(&self, name: &FieldName) -> bool {
        contains(self.should, name)
    }

    pub fn is_should_not(&self, name: &FieldName) -> bool {
        contains(self.should_not, name)
    }

    pub fn is_frozen(&self, name: &FieldName) -> bool {
        contains(self.frozen, name)
    }
}

impl Default for HeaderPolicy {
    fn default() -> Self {
        Self::STANDARD
    }
}

fn contains(names: &[&str], name: &FieldName) -> bool {
    names.iter().any(|n| name == n)
}

/// Selects the header fields to sign in one top-to-bottom pass, and
/// canonicalizes their values.
///
/// Fails if some header listed in `must` does not occur.
pub fn select_headers(
    policy: &HeaderPolicy,
    canon_alg: CanonicalizationAlgorithm,
    headers: &HeaderFields,
) -> Result<Vec<CanonicalHeader>, SignerError> {
    let mut must_seen = vec![false; policy.must.len()];
    let mut selected = vec![];

    for (name, body) in headers.iter() {
        let must_index = policy.must.iter().position(|n| name == n);

        if must_index.is_none() && !policy.is_should(name) {
            continue;
        }

        selected.push((
            name.clone(),
            canonicalize::canonicalize_header(canon_alg, body.as_ref()),
        ));

        if let Some(i) = must_index {
            must_seen[i] = true;
        }
    }

    if let Some(i) = must_seen.iter().position(|seen| !seen) {
        return Err(SignerError::MissingRequiredHeader(policy.must[i].into()));
    }

    Ok(selected)
}

/// Returns the contents of the *h=* tag: the names of all selected headers
/// in selection order, followed by the frozen ones among them once more.
pub fn signed_header_names(policy: &HeaderPolicy, selected: &[CanonicalHeader]) -> Vec<FieldName> {
    let names = selected.iter().map(|(name, _)| name);
    let frozen = names.clone().filter(|name| policy.is_frozen(name));

    names.chain(frozen).cloned().collect()
}
