// Copyright 2024 The reduce-rs Contributors.
//
// This file is part of reduce-rs.
// reduce-rs is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// reduce-rs is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with reduce-rs.  If not, see <https://www.gnu.org/licenses/>.

//! The catalogue of textual/structural passes, and the fixed-point drivers that compose
//! them: [`reduce_c_like_language`] for bracey, semicolon-terminated languages, and
//! [`reduce_by_bytes`] as the unconditional byte-level fallback.
//!
//! Regex-driven passes use `regex::bytes::RegexBuilder` with `unicode(false)`, so that
//! `\s`, `\w` and `\b` match only ASCII - the same semantics Python's `re` module gives
//! bytes patterns, which is what this pass catalogue was ported from.

use std::collections::HashSet;

use regex::bytes::{Regex, RegexBuilder};

use crate::brackets::find_paired_brackets;
use crate::delete_many_sets::attempt_delete_many_sets;
use crate::delimiter::reduce_by_delimiter;
use crate::linear_reduce::linear_reduce;
use crate::{ReduceError, Reducer, BRACKETS};

fn ascii_regex(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .unicode(false)
        .build()
        .expect("pattern is a valid regex")
}

fn ascii_multiline_regex(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .unicode(false)
        .multi_line(true)
        .build()
        .expect("pattern is a valid regex")
}

fn replace_all_literal(haystack: &[u8], from: &[u8], to: &[u8]) -> Vec<u8> {
    if from.is_empty() {
        return haystack.to_vec();
    }
    let mut out = Vec::with_capacity(haystack.len());
    let mut i = 0;
    while i < haystack.len() {
        if haystack[i..].starts_with(from) {
            out.extend_from_slice(to);
            i += from.len();
        } else {
            out.push(haystack[i]);
            i += 1;
        }
    }
    out
}

/// Single-shot attempt to delete every occurrence of byte `c`.
pub(crate) fn remove_byte(reducer: &mut Reducer, c: u8) -> Result<bool, ReduceError> {
    let replaced: Vec<u8> = reducer.current.iter().copied().filter(|&b| b != c).collect();
    reducer.attempt(&replaced)
}

/// Removes `\r`, trims leading/trailing whitespace on every line, then collapses runs
/// of blank lines to a single newline.
pub(crate) fn normalize_whitespace(reducer: &mut Reducer) -> Result<(), ReduceError> {
    remove_byte(reducer, b'\r')?;

    let leading = ascii_multiline_regex(r"^\s+");
    let candidate = leading.replace_all(&reducer.current, &b""[..]).into_owned();
    reducer.predicate(&candidate)?;

    let trailing = ascii_multiline_regex(r"\s+$");
    let candidate = trailing.replace_all(&reducer.current, &b""[..]).into_owned();
    reducer.predicate(&candidate)?;

    loop {
        let collapsed = replace_all_literal(&reducer.current, b"\n\n", b"\n");
        if !reducer.attempt(&collapsed)? {
            break;
        }
    }
    Ok(())
}

fn strip_re(reducer: &mut Reducer, re: &Regex) -> Result<(), ReduceError> {
    let ranges: Vec<std::ops::Range<usize>> = re
        .find_iter(&reducer.current)
        .map(|m| m.start()..m.end())
        .collect();
    attempt_delete_many_sets(reducer, ranges)
}

/// Attempts to remove `#`/`//`-style and `/* */`-style comments.
pub(crate) fn remove_comments(reducer: &mut Reducer) -> Result<(), ReduceError> {
    strip_re(reducer, &ascii_regex(r"(#|//)[^\n]+\n"))?;
    strip_re(reducer, &ascii_regex(r"/\*.+\*/"))?;
    Ok(())
}

/// Attempts to replace the interiors of alternating-pair quoted segments with nothing,
/// for each of `'` and `"`.
pub(crate) fn kill_strings(reducer: &mut Reducer) -> Result<(), ReduceError> {
    for &quote in &[b'\'', b'"'] {
        let positions: Vec<usize> = reducer
            .current
            .iter()
            .enumerate()
            .filter(|&(_, &b)| b == quote)
            .map(|(i, _)| i)
            .collect();
        let sets: Vec<std::ops::Range<usize>> = positions
            .windows(2)
            .map(|w| (w[0] + 1)..w[1])
            .collect();
        attempt_delete_many_sets(reducer, sets)?;
    }
    Ok(())
}

/// Tries deleting the contents of each matching bracket pair, then reduces by the
/// opening bracket as a delimiter.
pub(crate) fn delete_bracket_contents(reducer: &mut Reducer) -> Result<(), ReduceError> {
    for &(open, close) in &BRACKETS {
        let pairs = find_paired_brackets(open, close, &reducer.current);
        let sets: Vec<std::ops::Range<usize>> = pairs.iter().map(|&(i, j)| (i + 1)..j).collect();
        attempt_delete_many_sets(reducer, sets)?;
        reduce_by_delimiter(reducer, &[open])?;
    }
    Ok(())
}

/// Attempts to remove the bracket characters themselves from matched pairs, e.g.
/// replacing `(a + b)` with `a + b`. Mainly unlocks other reductions by freeing them
/// from having to keep brackets balanced.
pub(crate) fn debracket(reducer: &mut Reducer) -> Result<(), ReduceError> {
    for &(open, close) in &BRACKETS {
        let pairs = find_paired_brackets(open, close, &reducer.current);
        let sets: Vec<Vec<usize>> = pairs.iter().map(|&(i, j)| vec![i, j]).collect();
        attempt_delete_many_sets(reducer, sets)?;
    }
    Ok(())
}

/// Attempts to move the contents of braces outside the brace, by replacing `foo{ .. }`
/// with `foo; ..`. Mostly effective for C-like languages.
pub(crate) fn pull_out_braces(reducer: &mut Reducer) -> Result<(), ReduceError> {
    let semi_semi = ascii_regex(r";\s*;");
    let empty_braces = ascii_regex(r"\{\s+\}");

    let mut braces = find_paired_brackets(b'{', b'}', &reducer.current);
    let mut i = 0;
    while i < braces.len() {
        let (u, v) = braces[i];
        let mut attempt = reducer.current.clone();
        attempt[u] = b';';
        attempt.remove(v);
        if reducer.predicate(&attempt)? {
            let collapsed = semi_semi.replace_all(&reducer.current, &b""[..]).into_owned();
            reducer.attempt(&collapsed)?;
            let collapsed = empty_braces.replace_all(&reducer.current, &b""[..]).into_owned();
            reducer.attempt(&collapsed)?;
            braces = find_paired_brackets(b'{', b'}', &reducer.current);
        } else {
            i += 1;
        }
    }
    Ok(())
}

/// For each line (terminated by `\n` or `;`), attempts to replace it with a prefix of
/// itself up to its first internal space.
pub(crate) fn prefix_lines(reducer: &mut Reducer) -> Result<(), ReduceError> {
    for &terminator in &[b'\n', b';'] {
        let mut i = match reducer.current.iter().position(|&b| b == b' ') {
            Some(p) => p,
            None => return Ok(()),
        };
        while i < reducer.current.len() {
            let line_end = reducer.current[i + 1..]
                .iter()
                .position(|&b| b == terminator)
                .map(|p| i + 1 + p)
                .unwrap_or(reducer.current.len());
            let mut candidate = reducer.current[..i].to_vec();
            candidate.extend_from_slice(&reducer.current[line_end..]);
            reducer.attempt(&candidate)?;
            match reducer.current[i + 1..].iter().position(|&b| b == b' ') {
                Some(p) => i = i + 1 + p,
                None => break,
            }
        }
    }
    Ok(())
}

/// A C/C++-specific pass: looks for `typedef` directives and attempts to use their
/// definitions to replace (and then remove) them. Individual substitutions are often
/// not a size win, but removing the typedefs can unlock other reductions in aggregate.
pub(crate) fn attempt_typedef_substitutions(reducer: &mut Reducer) -> Result<(), ReduceError> {
    let typedef_re = ascii_regex(r"typedef\s+(.+)\s+(\w+)\s*;");
    let mut pumped = reducer.current.clone();
    let mut attempted: HashSet<Vec<u8>> = HashSet::new();

    'scan: loop {
        let snapshot = pumped.clone();
        for m in typedef_re.captures_iter(&snapshot) {
            let whole = m.get(0).unwrap();
            let td = whole.as_bytes().to_vec();
            if attempted.contains(&td) {
                continue;
            }
            attempted.insert(td);

            let mut removed = pumped[..whole.start()].to_vec();
            removed.extend_from_slice(&pumped[whole.end()..]);
            if reducer.predicate(&removed)? {
                pumped = removed;
                continue 'scan;
            }

            let name = m.get(2).unwrap().as_bytes().to_vec();
            let definition = m.get(1).unwrap().as_bytes().to_vec();
            let name_pattern = format!(r"\b{}\b", regex::escape(&String::from_utf8_lossy(&name)));
            let name_re = ascii_regex(&name_pattern);

            let fully = name_re
                .replace_all(&removed, regex::bytes::NoExpand(&definition))
                .into_owned();
            if reducer.predicate(&fully)? {
                pumped = fully;
            } else {
                // Point substitutions operate on the pre-removal `pumped`, matching
                // against the typedef directive's own text as well as usage sites.
                let mut working = pumped.clone();
                let mut targets: Vec<(usize, usize)> = name_re
                    .find_iter(&working)
                    .map(|mm| (mm.start(), mm.end()))
                    .collect();
                let mut i = 0usize;
                while i < targets.len() {
                    let (s, e) = targets[i];
                    let mut attempt = working[..s].to_vec();
                    attempt.extend_from_slice(&definition);
                    attempt.extend_from_slice(&working[e..]);
                    if reducer.predicate(&attempt)? {
                        working = attempt;
                        targets = name_re
                            .find_iter(&working)
                            .map(|mm| (mm.start(), mm.end()))
                            .collect();
                    } else {
                        i += 1;
                    }
                }
                pumped = working;
            }
            continue 'scan;
        }
        break;
    }

    let final_matches: Vec<(usize, usize)> = typedef_re
        .find_iter(&pumped)
        .map(|m| (m.start(), m.end()))
        .collect();
    for &(s, e) in final_matches.iter().rev() {
        let mut attempt = pumped[..s].to_vec();
        attempt.extend_from_slice(&pumped[e..]);
        if reducer.predicate(&attempt)? {
            pumped = attempt;
        }
    }
    Ok(())
}

/// Looks for ASCII identifiers appearing more than once and uses them as a guide to
/// reduction: tries collapsing every occurrence, then falls back to shrinking the
/// identifier itself (as a delimiter) and reducing the split parts.
pub(crate) fn normalize_identifiers(reducer: &mut Reducer) -> Result<(), ReduceError> {
    let identifier_re = ascii_regex(r"\b[A-Za-z_]\w+\b");

    let mut positions: std::collections::HashMap<Vec<u8>, usize> = std::collections::HashMap::new();
    for m in identifier_re.find_iter(&reducer.current) {
        *positions.entry(m.as_bytes().to_vec()).or_insert(0) += 1;
    }

    let mut identifiers: Vec<Vec<u8>> = positions
        .iter()
        .filter(|&(_, &count)| count > 1)
        .map(|(k, _)| k.clone())
        .collect();
    identifiers.sort_by_key(|s| s.len() * positions[s]);

    for s in identifiers {
        let parts = split_literal(&reducer.current, &s);
        let mut error = None;
        let delimiter = if reducer.predicate(&parts.concat())? {
            Vec::new()
        } else {
            let shrunk = linear_reduce(s.clone(), |q: &[u8]| {
                let candidate = join_literal(&parts, q);
                match reducer.predicate(&candidate) {
                    Ok(r) => r,
                    Err(e) => {
                        error = Some(e);
                        false
                    }
                }
            });
            if let Some(e) = error.take() {
                return Err(e);
            }
            shrunk
        };
        linear_reduce(parts, |ps: &[Vec<u8>]| {
            let candidate = join_literal(ps, &delimiter);
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
    }
    Ok(())
}

fn split_literal(haystack: &[u8], delimiter: &[u8]) -> Vec<Vec<u8>> {
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

fn join_literal(parts: &[Vec<u8>], delimiter: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            out.extend_from_slice(delimiter);
        }
        out.extend_from_slice(part);
    }
    out
}

/// The unconditional fallback that makes progress whenever structural passes stall:
/// `linear_reduce` on the byte sequence itself.
pub(crate) fn reduce_by_bytes(reducer: &mut Reducer) -> Result<(), ReduceError> {
    let sequence = reducer.current.clone();
    let mut error = None;
    linear_reduce(sequence, |ls: &[u8]| match reducer.predicate(ls) {
        Ok(r) => r,
        Err(e) => {
            error = Some(e);
            false
        }
    });
    if let Some(e) = error {
        return Err(e);
    }
    Ok(())
}

/// A collection of passes that are good for dealing with "bracey" languages, typically
/// C-descended ones. Iterates to a fixed point; on any round that made progress, skips
/// the expensive tail (space-delimiter split, identifier normalization, line prefixing)
/// and restarts immediately.
pub(crate) fn reduce_c_like_language(reducer: &mut Reducer) -> Result<(), ReduceError> {
    loop {
        let prev = reducer.current.clone();
        remove_comments(reducer)?;
        normalize_whitespace(reducer)?;
        delete_bracket_contents(reducer)?;
        reduce_by_delimiter(reducer, b";")?;
        reduce_by_delimiter(reducer, b"\n")?;
        pull_out_braces(reducer)?;
        debracket(reducer)?;
        kill_strings(reducer)?;
        let collapsed = replace_all_literal(&reducer.current, b"\n;", b";");
        reducer.attempt(&collapsed)?;
        attempt_typedef_substitutions(reducer)?;

        if reducer.current != prev {
            continue;
        }
        reduce_by_delimiter(reducer, b" ")?;
        normalize_identifiers(reducer)?;
        prefix_lines(reducer)?;
        if reducer.current == prev {
            break;
        }
    }
    Ok(())
}
