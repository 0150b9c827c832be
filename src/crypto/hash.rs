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

use crate::crypto::HashAlgorithm;
use sha2::Sha256;

pub fn digest(hash_alg: HashAlgorithm, msg: &[u8]) -> Box<[u8]> {
    digest_slices(hash_alg, [msg])
}

/// Digests the concatenation of the given slices.
pub fn digest_slices<I, T>(hash_alg: HashAlgorithm, slices: I) -> Box<[u8]>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    use digest::Digest;

    match hash_alg {
        HashAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            for bytes in slices {
                hasher.update(bytes.as_ref());
            }
            Box::from(&hasher.finalize()[..])
        }
    }
}
