//! String interners used to give component, step, and data ids compact typed keys.

use anyhow::Result;

/// Interner that checks for duplicates and only stores each unique string once.
mod packed;
pub use packed::PackedInterner;

/// Internals for mapping keys to interned strings.
mod key_to_str;
use key_to_str::KeyToStr;

/// Wrapper around interners that uses typed keys.
mod typed;
pub use typed::TypedInterner;

/// Internals for mapping interned strings to keys.
mod str_to_key;
use str_to_key::StrToKey;

type Hasher = std::hash::BuildHasherDefault<rustc_hash::FxHasher>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Interned string key {0} is out of bounds")]
    KeyNotFound(usize),
    #[error("Interned string key does not fit in usize")]
    InvalidKey,
    #[error("Out of interner keys after {0} strings")]
    OutOfKeys(usize),
    #[error("Interned strings exceed max index type after {0} bytes")]
    OutOfIndices(usize),
}

/// Trait for interners that can retrieve an interned string based on some `Key`.
pub trait GetStr {
    /// Key type used to fetch a string.
    type Key;

    /// Get the string associated with key `k`.
    fn get(&self, k: Self::Key) -> Result<&str>;

    /// Total number of strings interned.
    fn len(&self) -> usize;

    /// true if len is 0.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of interned strings.
    fn str_len(&self) -> usize;
}

/// Trait for interners that can intern a string and return a `Key`
/// used to retrieve it later.
pub trait InternStr {
    /// Key type returned from intern, can be used to fetch string later.
    type Key;

    /// Intern string `s` and return a key that can be used to retrieve it later.
    fn intern<T: AsRef<str>>(&mut self, s: T) -> Result<Self::Key>;
}

/// Trait for interners that can find the key of an already-interned string
/// without adding it.
pub trait LookupStr {
    type Key;

    /// Get the key for `s`, if it has been interned.
    fn lookup(&self, s: &str) -> Option<Self::Key>;
}
