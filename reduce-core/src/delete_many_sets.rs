// Copyright 2024 The reduce-rs Contributors.
//
// This file is part of reduce-rs.
// reduce-rs is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// reduce-rs is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with reduce-rs.  If not, see <https://www.gnu.org/licenses/>.

//! Adaptive batch deletion of disjoint index sets from the current best.

use std::collections::HashSet;

use crate::find_integer::find_integer;
use crate::{ReduceError, Reducer};

/// Sort key: `(size descending, elements in decreasing-sorted-order descending)`.
/// Tie-breaking by largest indices first reduces interference with earlier passes that
/// operate left-to-right.
fn descending_key(s: &HashSet<usize>) -> (usize, Vec<usize>) {
    let mut elements: Vec<usize> = s.iter().copied().collect();
    elements.sort_unstable_by(|a, b| b.cmp(a));
    (s.len(), elements)
}

/// Attempts to delete as many of `sets` (each an index set over bytes of the current
/// best at entry) as possible while keeping the predicate satisfied. Fixes its working
/// target at entry so that updates to `current` mid-pass don't invalidate the
/// retained-index bookkeeping.
pub(crate) fn attempt_delete_many_sets(
    reducer: &mut Reducer,
    sets: impl IntoIterator<Item = impl IntoIterator<Item = usize>>,
) -> Result<(), ReduceError> {
    let mut sets: Vec<HashSet<usize>> = sets
        .into_iter()
        .map(|s| s.into_iter().collect())
        .collect();
    sets.sort_by(|a, b| descending_key(b).cmp(&descending_key(a)));

    let target = reducer.current.clone();
    let mut retained: HashSet<usize> = (0..target.len()).collect();
    let mut error: Option<ReduceError> = None;

    let mut try_remove = |i: usize,
                           j: usize,
                           retained: &mut HashSet<usize>,
                           reducer: &mut Reducer,
                           error: &mut Option<ReduceError>|
     -> bool {
        if j > sets.len() {
            return false;
        }
        let mut to_remove: HashSet<usize> = HashSet::new();
        for s in &sets[i..j] {
            to_remove.extend(s.iter().copied());
        }
        if to_remove.is_disjoint(retained) {
            return true;
        }
        let candidate: Vec<u8> = target
            .iter()
            .enumerate()
            .filter(|(idx, _)| retained.contains(idx) && !to_remove.contains(idx))
            .map(|(_, &b)| b)
            .collect();
        match reducer.predicate(&candidate) {
            Ok(true) => {
                retained.retain(|idx| !to_remove.contains(idx));
                true
            }
            Ok(false) => false,
            Err(e) => {
                *error = Some(e);
                false
            }
        }
    };

    if try_remove(0, sets.len(), &mut retained, reducer, &mut error) {
        if let Some(e) = error {
            return Err(e);
        }
        return Ok(());
    }
    if let Some(e) = error.take() {
        return Err(e);
    }

    let mut i = 0;
    while i < sets.len() {
        let k = find_integer(|t| {
            try_remove(i, i + t as usize, &mut retained, reducer, &mut error)
        });
        if let Some(e) = error.take() {
            return Err(e);
        }
        i += k as usize + 1;
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
    fn deletes_all_sets_when_possible() {
        // "aXbYc" with X, Y both deletable: everything is accepted.
        let mut reducer = reducer_over(b"aXbYc", |_| true);
        attempt_delete_many_sets(&mut reducer, vec![vec![1usize], vec![3usize]]).unwrap();
        assert_eq!(reducer.current(), b"abc");
    }

    #[test]
    fn keeps_sets_whose_removal_is_rejected() {
        // Only accept candidates that still contain 'X'.
        let mut reducer = reducer_over(b"aXbYc", |b| b.contains(&b'X'));
        attempt_delete_many_sets(&mut reducer, vec![vec![1usize], vec![3usize]]).unwrap();
        assert!(reducer.current().contains(&b'X'));
        assert!(!reducer.current().contains(&b'Y'));
    }

    #[test]
    fn empty_sets_list_is_a_no_op() {
        let mut reducer = reducer_over(b"ab", |_| true);
        attempt_delete_many_sets(&mut reducer, Vec::<Vec<usize>>::new()).unwrap();
        assert_eq!(reducer.current(), b"ab");
    }
}
