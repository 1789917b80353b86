use anyhow::Result;
use std::hash::BuildHasher;

use super::{GetStr, InternStr, KeyToStr, LookupStr, StrToKey};

/// Interner that checks for duplicates and will only intern a given string once.
/// Using the lasso/rodeo hack for packed maps.
/// First param ("Key") is the id and must be big enough to fit total items;
/// Second param ("Idx") is an index into the string and must be greater than string len.
#[derive(Debug)]
pub struct PackedInterner<Key = u32, Idx = usize, H = crate::Hasher> {
    str_to_key: StrToKey<Key, H>,
    key_to_str: KeyToStr<Key, Idx>,
}

impl<Key, Idx> PackedInterner<Key, Idx, crate::Hasher> {
    pub fn with_capacity_and_avg_len(cap: usize, avg_len: usize) -> Self {
        Self {
            str_to_key: StrToKey::with_capacity(cap),
            key_to_str: KeyToStr::with_capacity_and_avg_len(cap, avg_len),
        }
    }

    pub fn with_capacity_and_str_len(cap: usize, str_len: usize) -> Self {
        Self {
            str_to_key: StrToKey::with_capacity(cap),
            key_to_str: KeyToStr::with_capacity_and_str_len(cap, str_len),
        }
    }
}

// GetStr /////////////////////
impl<Key, Idx, H> GetStr for PackedInterner<Key, Idx, H>
where
    KeyToStr<Key, Idx>: GetStr<Key = Key>,
{
    type Key = Key;

    fn get(&self, k: Key) -> Result<&str> {
        self.key_to_str.get(k)
    }

    fn len(&self) -> usize {
        self.key_to_str.len()
    }

    fn str_len(&self) -> usize {
        self.key_to_str.str_len()
    }
}

// InternStr ///////////////////
impl<Key, Idx, H: BuildHasher> InternStr for PackedInterner<Key, Idx, H>
where
    Key: Copy,
    KeyToStr<Key, Idx>: GetStr<Key = Key> + InternStr<Key = Key>,
{
    type Key = Key;

    fn intern<T: AsRef<str>>(&mut self, s: T) -> Result<Key> {
        let s = s.as_ref();
        self.str_to_key.intern(s, &mut self.key_to_str)
    }
}

// LookupStr ///////////////////
impl<Key, Idx, H: BuildHasher> LookupStr for PackedInterner<Key, Idx, H>
where
    Key: Copy,
    KeyToStr<Key, Idx>: GetStr<Key = Key>,
{
    type Key = Key;

    fn lookup(&self, s: &str) -> Option<Key> {
        self.str_to_key.lookup(s, &self.key_to_str)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_dedupe() -> Result<()> {
        let mut interner: PackedInterner<u32, u32> =
            PackedInterner::with_capacity_and_avg_len(4, 16);
        let a = interner.intern("repos/pipeline/main.cwl")?;
        let b = interner.intern("repos/pipeline/tool.cwl")?;
        let a2 = interner.intern("repos/pipeline/main.cwl")?;
        assert_eq!(a, a2);
        assert_ne!(a, b);
        assert_eq!(2, interner.len());
        assert_eq!("repos/pipeline/tool.cwl", interner.get(b)?);
        assert_eq!(Some(b), interner.lookup("repos/pipeline/tool.cwl"));
        assert_eq!(None, interner.lookup("repos/pipeline/other.cwl"));
        Ok(())
    }

    #[test]
    fn test_empty_string() -> Result<()> {
        let mut interner: PackedInterner<u16, u16> =
            PackedInterner::with_capacity_and_str_len(4, 16);
        let empty = interner.intern("")?;
        let x = interner.intern("x")?;
        assert_eq!("", interner.get(empty)?);
        assert_eq!("x", interner.get(x)?);
        assert!(interner.get(7).is_err());
        Ok(())
    }

    #[test]
    fn test_out_of_keys() -> Result<()> {
        let mut interner: PackedInterner<u8, u16> =
            PackedInterner::with_capacity_and_str_len(256, 1024);
        for i in 0..256 {
            interner.intern(i.to_string())?;
        }
        assert!(interner.intern("one too many").is_err());
        Ok(())
    }
}
