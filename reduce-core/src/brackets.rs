// Copyright 2024 The reduce-rs Contributors.
//
// This file is part of reduce-rs.
// reduce-rs is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// reduce-rs is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with reduce-rs.  If not, see <https://www.gnu.org/licenses/>.

//! Balanced bracket pairing via a depth-tracking left-to-right scan.

/// Returns all `(i, j)` pairs of balanced `open`/`close` brackets in `target`, found by
/// a left-to-right scan with a stack: pushing on `open`, popping and emitting on `close`
/// when the stack is non-empty. Unmatched closes are discarded; unmatched opens are
/// dropped (never emitted). Pairs come out in emission order - innermost pairs of any
/// nested group first.
pub fn find_paired_brackets(open: u8, close: u8, target: &[u8]) -> Vec<(usize, usize)> {
    let mut results = Vec::new();
    let mut stack = Vec::new();
    for (i, &c) in target.iter().enumerate() {
        if c == open {
            stack.push(i);
        } else if c == close {
            if let Some(start) = stack.pop() {
                results.push((start, i));
            }
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_simple_nesting() {
        let pairs = find_paired_brackets(b'{', b'}', b"{a{b}c}");
        assert_eq!(pairs, vec![(2, 4), (0, 6)]);
    }

    #[test]
    fn drops_unmatched_brackets() {
        let pairs = find_paired_brackets(b'{', b'}', b"{a}}{b");
        assert_eq!(pairs, vec![(0, 2)]);
    }

    #[test]
    fn every_pair_satisfies_endpoint_contract() {
        let target = b"{{a}{b{c}}}";
        let pairs = find_paired_brackets(b'{', b'}', target);
        let mut seen_endpoints = std::collections::HashSet::new();
        for &(i, j) in &pairs {
            assert!(i < j);
            assert_eq!(target[i], b'{');
            assert_eq!(target[j], b'}');
            assert!(seen_endpoints.insert(i));
            assert!(seen_endpoints.insert(j));
        }
    }

    #[test]
    fn no_brackets_means_no_pairs() {
        assert!(find_paired_brackets(b'{', b'}', b"nothing here").is_empty());
    }
}
