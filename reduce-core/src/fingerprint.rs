// Copyright 2024 The reduce-rs Contributors.
//
// This file is part of reduce-rs.
// reduce-rs is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// reduce-rs is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with reduce-rs.  If not, see <https://www.gnu.org/licenses/>.

use sha1::{Digest, Sha1};

/// The leading 64 bits of the SHA-1 digest of `value`, as a big-endian integer. Used as
/// the predicate cache key - collisions are tolerated as negligibly rare.
pub(crate) fn fingerprint(value: &[u8]) -> u64 {
    let digest = Sha1::digest(value);
    u64::from_be_bytes(digest[..8].try_into().unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_for_same_input() {
        assert_eq!(fingerprint(b"hello"), fingerprint(b"hello"));
    }

    #[test]
    fn differs_for_different_input() {
        assert_ne!(fingerprint(b"hello"), fingerprint(b"world"));
    }

    #[test]
    fn empty_input_is_stable() {
        assert_eq!(fingerprint(b""), fingerprint(b""));
    }
}
