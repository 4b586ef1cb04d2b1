// Copyright 2024 The reduce-rs Contributors.
//
// This file is part of reduce-rs.
// reduce-rs is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// reduce-rs is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with reduce-rs.  If not, see <https://www.gnu.org/licenses/>.

//! Exponential-probe search for the largest integer satisfying a monotone predicate.

/// Finds a (hopefully large) integer such that `f(n)` is true and `f(n + 1)` is false.
///
/// `f(0)` is assumed to be true and is never called. `f` is only ever called with
/// strictly increasing arguments during a single invocation of this function, so it is
/// safe for `f` to be expensive or to have its own memoization.
pub fn find_integer(mut f: impl FnMut(u64) -> bool) -> u64 {
    // Linear scan over the small numbers first: it's very hard to win big when the
    // result is small, and trying 2 first when the answer is 0 would double the work.
    for i in 1..5 {
        if !f(i) {
            return i - 1;
        }
    }

    // f(4) is true. lo is the largest number known to satisfy f; hi is the smallest
    // number known not to.
    let mut lo: u64 = 4;
    let mut hi: u64 = 5;
    while f(hi) {
        lo = hi;
        hi *= 2;
    }

    while lo + 1 < hi {
        let mid = lo + (hi - lo) / 2;
        if f(mid) {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    lo
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_small_answers_without_overshoot() {
        for n in 0..10u64 {
            let mut calls = vec![];
            let answer = find_integer(|k| {
                calls.push(k);
                k <= n
            });
            assert_eq!(answer, n, "expected {n} got {answer}");
            assert!(calls.iter().all(|&k| k >= 1));
        }
    }

    #[test]
    fn finds_large_answers() {
        let n = 123_456u64;
        let answer = find_integer(|k| k <= n);
        assert_eq!(answer, n);
    }

    #[test]
    fn zero_is_returned_when_f_of_one_is_false() {
        assert_eq!(find_integer(|_| false), 0);
    }

    #[test]
    fn never_calls_f_of_zero() {
        find_integer(|k| {
            assert_ne!(k, 0);
            k <= 50
        });
    }

    #[test]
    fn each_value_queried_at_most_once() {
        use std::collections::HashSet;
        let mut seen = HashSet::new();
        find_integer(|k| {
            assert!(seen.insert(k), "f({k}) called more than once");
            k <= 777
        });
    }
}
