// Copyright 2024 The reduce-rs Contributors.
//
// This file is part of reduce-rs.
// reduce-rs is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// reduce-rs is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with reduce-rs.  If not, see <https://www.gnu.org/licenses/>.

//! A generic input reducer: given an initial byte string and an external interestingness
//! predicate, searches for a much smaller byte string the predicate still accepts.
//!
//! The entry point is [`Reducer`]. Construct one with the initial input and a predicate
//! closure, then call [`Reducer::reduce`] to run every pass to a fixed point.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub mod find_integer;
pub mod linear_reduce;
pub mod brackets;
pub mod delete_many_sets;
pub mod delimiter;
pub mod passes;
mod fingerprint;

pub use find_integer::find_integer;
pub use linear_reduce::linear_reduce;

#[derive(thiserror::Error, Debug, Clone)]
pub enum ReduceError {
    #[error("initial input does not satisfy the predicate")]
    InvalidInitial,
    #[error("reduction interrupted by user")]
    Interrupted,
}

/// `(length, lexicographic value)` - the ordering `current` is only ever allowed to
/// decrease under.
pub fn sort_key(b: &[u8]) -> (usize, &[u8]) {
    (b.len(), b)
}

pub(crate) fn is_strict_shrink(candidate: &[u8], current: &[u8]) -> bool {
    sort_key(candidate) < sort_key(current)
}

/// The fixed ordered set of bracket pairs the textual passes operate on.
pub const BRACKETS: [(u8, u8); 3] = [(b'{', b'}'), (b'(', b')'), (b'[', b']')];

/// Owns the current best candidate and the predicate cache, and drives every reduction
/// pass. There is exactly one of these per reduction run; it is not `Sync` - single
/// threaded cooperative execution only, per the predicate's own blocking contract.
pub struct Reducer {
    pub(crate) current: Vec<u8>,
    pub(crate) cache: std::collections::HashMap<u64, bool>,
    predicate: Box<dyn FnMut(&[u8]) -> bool>,
    debug: bool,
    interrupted: Arc<AtomicBool>,
}

impl Reducer {
    /// Constructs a reducer over `initial`. Fails with [`ReduceError::InvalidInitial`] if
    /// the predicate does not accept `initial` as-is.
    pub fn new(
        initial: Vec<u8>,
        mut predicate: impl FnMut(&[u8]) -> bool + 'static,
        debug: bool,
        interrupted: Arc<AtomicBool>,
    ) -> Result<Self, ReduceError> {
        if !predicate(&initial) {
            return Err(ReduceError::InvalidInitial);
        }
        let mut cache = std::collections::HashMap::new();
        cache.insert(fingerprint::fingerprint(&initial), true);
        Ok(Reducer {
            current: initial,
            cache,
            predicate: Box::new(predicate),
            debug,
            interrupted,
        })
    }

    /// The current best candidate. Always satisfies the predicate.
    pub fn current(&self) -> &[u8] {
        &self.current
    }

    /// Cached predicate. Updates `current` if `value` is accepted and is a strict shrink.
    pub(crate) fn predicate(&mut self, value: &[u8]) -> Result<bool, ReduceError> {
        let key = fingerprint::fingerprint(value);
        if let Some(result) = self.cache.get(&key) {
            return Ok(*result);
        }
        let result = (self.predicate)(value);
        if result {
            if is_strict_shrink(value, &self.current) {
                let percent = 100.0 * (self.current.len() - value.len()) as f64
                    / self.current.len().max(1) as f64;
                if self.debug {
                    log::debug!(
                        "shrink from {} to {} bytes ({:.2}%)",
                        self.current.len(),
                        value.len(),
                        percent
                    );
                }
                self.current = value.to_vec();
            } else if self.debug {
                log::debug!(
                    "found non-shrinking example of length {} (current best: {})",
                    value.len(),
                    self.current.len()
                );
            }
        }
        self.cache.insert(key, result);
        if self.interrupted.load(Ordering::SeqCst) {
            return Err(ReduceError::Interrupted);
        }
        Ok(result)
    }

    /// Tries `value` as a possible shrink. Returns whether it succeeded, short-circuiting
    /// without a predicate call when `value` is not even shorter/lexicographically-smaller.
    pub(crate) fn attempt(&mut self, value: &[u8]) -> Result<bool, ReduceError> {
        if !is_strict_shrink(value, &self.current) {
            return Ok(false);
        }
        self.predicate(value)
    }

    /// Runs every reduction pass to a fixed point of the identity of `current`.
    pub fn reduce(&mut self) -> Result<(), ReduceError> {
        loop {
            let prev = fingerprint::fingerprint(&self.current);
            passes::reduce_c_like_language(self)?;
            delimiter::reduce_by_all_delimiters(self)?;
            passes::reduce_by_bytes(self)?;
            if fingerprint::fingerprint(&self.current) == prev {
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    fn never_interrupted() -> Arc<AtomicBool> {
        Arc::new(AtomicBool::new(false))
    }

    #[test]
    fn rejects_initial_that_fails_predicate() {
        let err = Reducer::new(b"abc".to_vec(), |_| false, false, never_interrupted());
        assert!(matches!(err, Err(ReduceError::InvalidInitial)));
    }

    #[test]
    fn accepts_initial_that_passes_predicate() {
        let reducer = Reducer::new(b"abc".to_vec(), |_| true, false, never_interrupted());
        assert!(reducer.is_ok());
        assert_eq!(reducer.unwrap().current(), b"abc");
    }

    #[test]
    fn attempt_requires_strict_shrink() {
        let mut reducer =
            Reducer::new(b"abc".to_vec(), |_| true, false, never_interrupted()).unwrap();
        // Same length, lexicographically greater: not a shrink, so attempt must not call
        // the predicate (and thus can't update `current`) even though it would accept.
        assert_eq!(reducer.attempt(b"abd").unwrap(), false);
        assert_eq!(reducer.current(), b"abc");
        assert_eq!(reducer.attempt(b"a").unwrap(), true);
        assert_eq!(reducer.current(), b"a");
    }

    #[test]
    fn debug_mode_logs_shrinks_without_changing_the_result() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut reducer =
            Reducer::new(b"abc".to_vec(), |_| true, true, never_interrupted()).unwrap();
        reducer.reduce().unwrap();
        assert_eq!(reducer.current(), b"");
    }

    #[test]
    fn idempotent_reentry() {
        let mut reducer =
            Reducer::new(b"abc".to_vec(), |_| true, false, never_interrupted()).unwrap();
        reducer.reduce().unwrap();
        assert_eq!(reducer.current(), b"");
        let after_first = reducer.current().to_vec();
        reducer.reduce().unwrap();
        assert_eq!(reducer.current(), after_first.as_slice());
    }
}
