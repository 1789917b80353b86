use std::marker::PhantomData;

use anyhow::Result;

use super::{Error, GetStr, InternStr};

/// Internals used by all of our interners:
/// one contiguous string buffer plus the start offset of each entry.
#[derive(Debug)]
pub struct KeyToStr<Key = u32, Idx = usize> {
    key_to_str: Vec<Idx>,
    strings: String,
    _phantom: PhantomData<Key>,
}

impl<Key, Idx> KeyToStr<Key, Idx> {
    pub fn with_capacity_and_avg_len(cap: usize, avg_len: usize) -> Self {
        Self::with_capacity_and_str_len(cap, cap * avg_len)
    }

    pub fn with_capacity_and_str_len(cap: usize, str_len: usize) -> Self {
        Self {
            key_to_str: Vec::with_capacity(cap),
            strings: String::with_capacity(str_len),
            _phantom: PhantomData,
        }
    }
}

// GetStr ////////////////////
impl<Key, Idx> GetStr for KeyToStr<Key, Idx>
where
    Key: TryInto<usize>,
    Idx: TryInto<usize> + Copy,
{
    type Key = Key;

    fn get(&self, k: Key) -> Result<&str> {
        let k = k.try_into().map_err(|_| Error::InvalidKey)?;
        let (start, end) = self.get_start_and_end(k)?;
        Ok(&self.strings[start..end])
    }

    fn len(&self) -> usize {
        self.key_to_str.len()
    }

    fn str_len(&self) -> usize {
        self.strings.len()
    }
}

// InternStr ///////////////////
impl<Key, Idx> InternStr for KeyToStr<Key, Idx>
where
    Key: TryFrom<usize>,
    Idx: TryFrom<usize>,
{
    type Key = Key;

    fn intern<T: AsRef<str>>(&mut self, s: T) -> Result<Key> {
        let s = s.as_ref();
        let len = self.key_to_str.len();
        let start = self.strings.len();

        let k = Key::try_from(len).map_err(|_| Error::OutOfKeys(len))?;
        let idx = Idx::try_from(start).map_err(|_| Error::OutOfIndices(start))?;

        self.key_to_str.push(idx);
        self.strings.push_str(s);

        Ok(k)
    }
}

impl<Key, Idx> KeyToStr<Key, Idx>
where
    Idx: TryInto<usize> + Copy,
{
    fn get_start_and_end(&self, k: usize) -> Result<(usize, usize), Error> {
        let start = self.offset(k)?;
        let end = if k == self.key_to_str.len() - 1 {
            self.strings.len()
        } else {
            self.offset(k + 1)?
        };
        Ok((start, end))
    }

    fn offset(&self, k: usize) -> Result<usize, Error> {
        let idx = self.key_to_str.get(k).ok_or(Error::KeyNotFound(k))?;
        (*idx).try_into().map_err(|_| Error::InvalidKey)
    }
}
