//! Command-line fingerprints.

use serde::{Deserialize, Serialize};
use std::fmt;
use xxhash_rust::xxh3::Xxh3;

/// XXH3-128 over an argument vector.
///
/// Stored per unit in the build manifest so that a changed flag, include
/// path or compiler forces a rebuild even when no timestamp moved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(u128);

impl ContentHash {
    /// Hashes `args` in order. Each argument is NUL-terminated, so
    /// `["-O2 -g"]` and `["-O2", "-g"]` differ.
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Self {
        let mut hasher = Xxh3::new();
        for arg in args {
            hasher.update(arg.as_ref().as_bytes());
            hasher.update(&[0]);
        }
        Self(hasher.digest128())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}
