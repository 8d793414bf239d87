//! Decoding of the `string_ids` table and the string data it points at.
//!
//! Entries are independent of each other, so they are decoded on a bounded
//! rayon pool: one task per string id, each task filling its own slot of a
//! pre-sized vector. The pool is joined before the table is returned.

use std::borrow::Cow;

use log::{debug, warn};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use crate::dex::dex_file::TableDescriptor;
use crate::dex::error::DexError;
use crate::dex::{read_u4, read_uleb128, read_x};

/// Ordered string table, index = string id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringPool
{
    strings: Vec<String>,
}

impl StringPool
{
    /// Reads the string id table described by `table` and decodes every entry
    /// using at most `workers` threads.
    pub fn decode(bytes: &[u8], table: &TableDescriptor, workers: usize) -> Result<StringPool, DexError>
    {
        let mut ix = table.offset as usize;
        let mut offsets = Vec::with_capacity(table.size as usize);
        for _ in 0..table.size
        {
            offsets.push(read_u4(bytes, &mut ix)? as usize);
        }

        let mut strings = vec![String::new(); offsets.len()];
        let lossy = if workers <= 1 || offsets.len() < 2
        {
            decode_sequential(bytes, &offsets, &mut strings)?
        }
        else
        {
            match ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(|i| format!("dex-strings-{}", i))
                .build()
            {
                Ok(pool) => pool.install(|| decode_parallel(bytes, &offsets, &mut strings))?,
                Err(e) => {
                    warn!("[strings] could not start {} workers ({}), decoding on the calling thread", workers, e);
                    decode_sequential(bytes, &offsets, &mut strings)?
                }
            }
        };

        if lossy > 0
        {
            warn!("[strings] {} of {} strings contained invalid UTF-8 and were decoded lossily", lossy, strings.len());
        }
        debug!("[strings] decoded {} strings with {} workers", strings.len(), workers.max(1));

        Ok(StringPool { strings })
    }

    pub fn from_strings(strings: Vec<String>) -> StringPool
    {
        StringPool { strings }
    }

    pub fn len(&self) -> usize
    {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.strings.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&str>
    {
        self.strings.get(idx).map(String::as_str)
    }

    /// Looks up `idx`, failing with an unresolved index error when out of range.
    pub fn resolve(&self, idx: u32) -> Result<&str, DexError>
    {
        match self.get(idx as usize)
        {
            Some(s) => Ok(s),
            None => fail!(UnresolvedIndex, "string index {} out of range (strings.len={})", idx, self.strings.len()),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str>
    {
        self.strings.iter().map(String::as_str)
    }
}

fn decode_sequential(bytes: &[u8], offsets: &[usize], slots: &mut [String]) -> Result<usize, DexError>
{
    let mut lossy = 0;
    for (slot, &offset) in slots.iter_mut().zip(offsets)
    {
        lossy += fill_slot(bytes, offset, slot)? as usize;
    }
    Ok(lossy)
}

fn decode_parallel(bytes: &[u8], offsets: &[usize], slots: &mut [String]) -> Result<usize, DexError>
{
    slots
        .par_iter_mut()
        .zip(offsets.par_iter())
        .try_fold(|| 0usize, |lossy, (slot, &offset)| -> Result<usize, DexError> {
            Ok(lossy + fill_slot(bytes, offset, slot)? as usize)
        })
        .try_reduce(|| 0usize, |a, b| Ok(a + b))
}

/// Returns true when the entry had to be decoded with replacement characters.
fn fill_slot(bytes: &[u8], offset: usize, slot: &mut String) -> Result<bool, DexError>
{
    let (s, lossy) = read_string(bytes, offset)
        .map_err(|e| DexError::with_context(e, format!("string data at 0x{:x}", offset)))?;
    *slot = s;
    Ok(lossy)
}

/// Reads a uleb128 byte length followed by that many bytes of text.
pub(crate) fn read_string(bytes: &[u8], offset: usize) -> Result<(String, bool), DexError>
{
    let mut ix = offset;
    let length = read_uleb128(bytes, &mut ix)? as usize;
    let raw = read_x(bytes, &mut ix, length)?;

    Ok(match cesu8::from_java_cesu8(raw)
    {
        Ok(s) => (s.into_owned(), false),
        Err(_) => match String::from_utf8_lossy(raw)
        {
            Cow::Borrowed(s) => (s.to_string(), false),
            Cow::Owned(s) => (s, true),
        },
    })
}
