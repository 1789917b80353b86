use anyhow::Result;
use hashbrown::hash_map::{HashMap, RawEntryMut};
use std::hash::BuildHasher;

use super::{GetStr, InternStr};

/// Maps string hashes to interned keys without storing the strings twice.
/// Each entry keeps its own hash, so the table can grow without going back
/// to the key-to-str side.
#[derive(Debug)]
pub struct StrToKey<Key = u32, H = crate::Hasher> {
    map: HashMap<(Key, u64), (), ()>,
    hasher: H,
}

impl<Key, H: Default> StrToKey<Key, H> {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            map: HashMap::with_capacity_and_hasher(cap, ()),
            hasher: H::default(),
        }
    }
}

/// True if `key` is already interned as exactly `s`.
fn is_interned_as<Key: Copy, T: GetStr<Key = Key>>(key_to_str: &T, key: Key, s: &str) -> bool {
    key_to_str.get(key).map(|interned| interned == s).unwrap_or(false)
}

impl<Key: Copy, H: BuildHasher> StrToKey<Key, H> {
    /// Return the key for `s`, asking `key_to_str` for a new one if `s` hasn't been seen.
    pub fn intern<T>(&mut self, s: &str, key_to_str: &mut T) -> Result<Key>
    where
        T: GetStr<Key = Key> + InternStr<Key = Key>,
    {
        let hash = self.hasher.hash_one(s);
        let entry = self
            .map
            .raw_entry_mut()
            .from_hash(hash, |(k, _)| is_interned_as(key_to_str, *k, s));
        match entry {
            RawEntryMut::Occupied(entry) => Ok(entry.key().0),
            RawEntryMut::Vacant(entry) => {
                let key = key_to_str.intern(s)?;
                entry.insert_with_hasher(hash, (key, hash), (), |(_, stored)| *stored);
                Ok(key)
            }
        }
    }

    /// Find the key for `s` without interning it.
    pub fn lookup<T>(&self, s: &str, key_to_str: &T) -> Option<Key>
    where
        T: GetStr<Key = Key>,
    {
        let hash = self.hasher.hash_one(s);
        self.map
            .raw_entry()
            .from_hash(hash, |(k, _)| is_interned_as(key_to_str, *k, s))
            .map(|((k, _), _)| *k)
    }
}
