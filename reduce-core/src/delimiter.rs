// Copyright 2024 The reduce-rs Contributors.
//
// This file is part of reduce-rs.
// reduce-rs is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// reduce-rs is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with reduce-rs.  If not, see <https://www.gnu.org/licenses/>.

//! Reducing `current` viewed as parts separated by a single byte (or the empty
//! delimiter, once joining with no separator at all has been shown to work).

use crate::linear_reduce::linear_reduce;
use crate::{ReduceError, Reducer};

fn join(parts: &[Vec<u8>], delimiter: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            out.extend_from_slice(delimiter);
        }
        out.extend_from_slice(part);
    }
    out
}

/// Considering `current` as a sequence delimited by `delimiter`, tries reducing it as
/// that sequence. Returns whether `current` changed.
pub(crate) fn reduce_by_delimiter(reducer: &mut Reducer, delimiter: &[u8]) -> Result<bool, ReduceError> {
    let prev = reducer.current.clone();

    let mut parts = split_on(&reducer.current, delimiter);
    let mut delimiter = delimiter.to_vec();

    if reducer.attempt(&parts.concat())? {
        delimiter.clear();
    }

    let non_empty: Vec<Vec<u8>> = parts.iter().filter(|p| !p.is_empty()).cloned().collect();
    if reducer.attempt(&join(&non_empty, &delimiter))? {
        parts = split_on(&reducer.current, &delimiter);
    }

    parts.reverse();
    let mut error = None;
    linear_reduce(parts, |ps: &[Vec<u8>]| {
        let reversed: Vec<Vec<u8>> = ps.iter().rev().cloned().collect();
        let candidate = join(&reversed, &delimiter);
        match reducer.predicate(&candidate) {
            Ok(r) => r,
            Err(e) => {
                error = Some(e);
                false
            }
        }
    });
    if let Some(e) = error {
        return Err(e);
    }
    Ok(reducer.current != prev)
}

fn split_on(haystack: &[u8], delimiter: &[u8]) -> Vec<Vec<u8>> {
    if delimiter.is_empty() {
        return vec![haystack.to_vec()];
    }
    let mut parts = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i + delimiter.len() <= haystack.len() {
        if &haystack[i..i + delimiter.len()] == delimiter {
            parts.push(haystack[start..i].to_vec());
            i += delimiter.len();
            start = i;
        } else {
            i += 1;
        }
    }
    parts.push(haystack[start..].to_vec());
    parts
}

/// Repeatedly picks the rarest byte in the current best (ties broken by byte value),
/// runs [`reduce_by_delimiter`] on it, and removes it from the pending set, coarse
/// structural splits first.
pub(crate) fn reduce_by_all_delimiters(reducer: &mut Reducer) -> Result<(), ReduceError> {
    let mut delimiters: std::collections::HashSet<u8> = reducer.current.iter().copied().collect();
    while !delimiters.is_empty() {
        let mut counts = [0u64; 256];
        for &b in &reducer.current {
            counts[b as usize] += 1;
        }
        let b = *delimiters
            .iter()
            .min_by_key(|&&b| (counts[b as usize], b))
            .unwrap();
        reduce_by_delimiter(reducer, &[b])?;
        delimiters.remove(&b);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    fn reducer_over(initial: &[u8], predicate: impl FnMut(&[u8]) -> bool + 'static) -> Reducer {
        Reducer::new(initial.to_vec(), predicate, false, Arc::new(AtomicBool::new(false))).unwrap()
    }

    #[test]
    fn split_on_splits_correctly() {
        assert_eq!(
            split_on(b"a,b,,c", b","),
            vec![b"a".to_vec(), b"b".to_vec(), b"".to_vec(), b"c".to_vec()]
        );
    }

    #[test]
    fn join_inverts_split_on() {
        let parts = split_on(b"a,b,c", b",");
        assert_eq!(join(&parts, b","), b"a,b,c");
    }

    #[test]
    fn reduce_by_delimiter_drops_unneeded_parts() {
        let mut reducer = reducer_over(b"a;b;c;d", |s| s.windows(1).any(|w| w == b"d"));
        reduce_by_delimiter(&mut reducer, b";").unwrap();
        assert!(reducer.current().ends_with(b"d"));
        assert!(reducer.current().len() < b"a;b;c;d".len());
    }

    #[test]
    fn reduce_by_all_delimiters_reaches_fixed_point() {
        let mut reducer = reducer_over(b"x,y;z", |_| true);
        reduce_by_all_delimiters(&mut reducer).unwrap();
        assert!(reducer.current().is_empty());
    }
}
