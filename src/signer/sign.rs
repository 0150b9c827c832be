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
    crypto::{self, HashAlgorithm, SigningKey},
    header::HeaderFields,
    message_hash,
    signature::DKIM_SIGNATURE_NAME,
    signer::{
        format::UnsignedDkimSignature, select, BodyLength, SignRequest, SignerError,
        SigningResult,
    },
};
use tracing::trace;

pub fn perform_signing(
    request: &SignRequest,
    headers: &HeaderFields,
    body: &[u8],
) -> Result<SigningResult, SignerError> {
    let algorithm = request.algorithm;
    let canonicalization = request.canonicalization;
    let hash_alg = algorithm.hash_algorithm();

    // calculate body hash

    let (body_hash, body_len) =
        message_hash::compute_body_hash(hash_alg, canonicalization.body, body);

    trace!(body_len, "body hash computed");

    let body_length = match request.body_length {
        BodyLength::All => None,
        BodyLength::OnlyMessageLength => Some(body_len),
    };

    // select headers, all required headers must be present

    let selected = select::select_headers(&request.policy, canonicalization.header, headers)?;

    trace!(count = selected.len(), "headers selected");

    let signed_headers = select::signed_header_names(&request.policy, &selected);

    let signing_key = SigningKey::from_pkcs1_pem(&request.private_key_pem)?;

    // prepare formatted signature with empty b= tag, the input to the data hash

    let sig = UnsignedDkimSignature {
        algorithm,
        body_hash,
        canonicalization,
        domain: request.domain.as_str().into(),
        signed_headers: signed_headers.into(),
        identity: request.full_identity().into(),
        body_length,
        selector: request.selector.as_str().into(),
        timestamp: request.timestamp.to_unix_secs(),
    };

    let formatted_header_value = sig.format_without_signature();

    let data_hash = message_hash::compute_data_hash(hash_alg, &selected, &formatted_header_value);

    let signature_data = sign_hash(&signing_key, hash_alg, &data_hash)?;

    let header_value = sig.format_with_signature(&signature_data);

    Ok(SigningResult {
        header_name: DKIM_SIGNATURE_NAME.into(),
        header_value,
        signature: sig.into_signature(signature_data.into()),
    })
}

fn sign_hash(
    signing_key: &SigningKey,
    hash_alg: HashAlgorithm,
    data_hash: &[u8],
) -> Result<Vec<u8>, SignerError> {
    match crypto::sign_rsa(hash_alg, signing_key.as_ref(), data_hash) {
        Ok(s) => {
            trace!("RSA signing successful");
            Ok(s)
        }
        Err(e) => {
            trace!("RSA signing failed: {e}");
            Err(SignerError::SigningFailure)
        }
    }
}
