#[macro_use]
pub mod error;

pub(crate) mod leb;
pub mod dex_file;
pub mod string_pool;
pub mod opcode_format;
pub mod opcodes;
pub mod code_item;

pub use crate::dex::dex_file::{AccessFlags, ClassDef, DexFile, DexHeader, FieldRef, MethodRef, TableDescriptor, NO_INDEX};
pub use crate::dex::error::{DexError, DexErrorKind};

use crate::dex::leb::decode_uleb128;

// Basic type reading, every read checks the buffer length first

/// Fails with a bounds error unless `len` bytes are available at `ix`.
pub(crate) fn ensure(bytes: &[u8], ix: usize, len: usize) -> Result<(), DexError>
{
    match ix.checked_add(len)
    {
        Some(end) if end <= bytes.len() => Ok(()),
        _ => fail!(BufferBounds, "read of {} bytes at 0x{:x} exceeds buffer of 0x{:x} bytes", len, ix, bytes.len()),
    }
}

pub(crate) fn read_u2(bytes: &[u8], ix: &mut usize) -> Result<u16, DexError>
{
    ensure(bytes, *ix, 2)?;
    let result = ((bytes[*ix + 1] as u16) << 8) | (bytes[*ix] as u16);
    *ix += 2;
    Ok(result)
}

pub(crate) fn read_u4(bytes: &[u8], ix: &mut usize) -> Result<u32, DexError>
{
    ensure(bytes, *ix, 4)?;
    let result =
        ((bytes[*ix + 3] as u32) << 24) | ((bytes[*ix + 2] as u32) << 16) | ((bytes[*ix + 1] as u32) << 8) | (bytes[*ix] as u32);
    *ix += 4;
    Ok(result)
}

pub(crate) fn read_uleb128(bytes: &[u8], ix: &mut usize) -> Result<u32, DexError>
{
    let (val, next) = decode_uleb128(bytes, *ix)?;
    *ix = next;
    Ok(val)
}

pub(crate) fn read_x<'a>(bytes: &'a [u8], ix: &mut usize, length: usize) -> Result<&'a [u8], DexError>
{
    ensure(bytes, *ix, length)?;
    let slice = &bytes[*ix..*ix + length];
    *ix += length;
    Ok(slice)
}
