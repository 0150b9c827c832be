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

use crate::crypto::{HashAlgorithm, KeyDecodeError, SigningError};
use rsa::{pkcs1::DecodeRsaPrivateKey, rand_core::OsRng, Pkcs1v15Sign, RsaPrivateKey};
use sha2::Sha256;

const PEM_BEGIN: &[u8] = b"-----BEGIN";
const RSA_PRIVATE_KEY_LABEL: &str = "RSA PRIVATE KEY";

pub fn read_rsa_private_key(pem: &[u8]) -> Result<RsaPrivateKey, KeyDecodeError> {
    // skip leading text, eg comments preceding the encapsulation boundary
    let start = find(pem, PEM_BEGIN).ok_or(KeyDecodeError::NoKeyFound)?;

    let (label, der) =
        pem_rfc7468::decode_vec(&pem[start..]).map_err(|_| KeyDecodeError::NoKeyFound)?;

    if label != RSA_PRIVATE_KEY_LABEL {
        return Err(KeyDecodeError::UnsupportedKeyType(label.into()));
    }

    RsaPrivateKey::from_pkcs1_der(&der).map_err(|_| KeyDecodeError::KeyParseError)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Signs a message digest with RSASSA-PKCS1-v1_5. The private key operation
/// is blinded with randomness from the operating system.
pub fn sign_rsa(
    hash_alg: HashAlgorithm,
    private_key: &RsaPrivateKey,
    msg: &[u8],
) -> Result<Vec<u8>, SigningError> {
    let result = match hash_alg {
        HashAlgorithm::Sha256 => {
            private_key.sign_with_rng(&mut OsRng, Pkcs1v15Sign::new::<Sha256>(), msg)
        }
    };

    result.map_err(|_| SigningError::SigningFailure)
}
