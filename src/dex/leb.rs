use crate::dex::error::DexError;

/// DEX uleb128 values are 32-bit, so valid encodings are at most 5 bytes.
pub(crate) const MAX_ULEB128_LEN: usize = 5;

pub(crate) fn encode_uleb128(value: u32) -> Vec<u8> {
    let mut result = Vec::new();
    let mut remaining = value;

    if remaining == 0 {
        result.push(0);
        return result;
    }

    while remaining != 0 {
        let mut byte = (remaining & 0x7F) as u8;
        remaining >>= 7;

        if remaining != 0 {
            byte |= 0x80;
        }

        result.push(byte);
    }

    result
}

/// Decodes a uleb128 starting at `offset`, returning the value and the offset
/// just past the encoding.
pub(crate) fn decode_uleb128(bytes: &[u8], offset: usize) -> Result<(u32, usize), DexError> {
    let mut value: u32 = 0;
    let mut shift: u32 = 0;
    let mut ix = offset;

    loop {
        if ix - offset == MAX_ULEB128_LEN {
            fail!(MalformedVarint, "uleb128 at 0x{:x} exceeds {} bytes", offset, MAX_ULEB128_LEN);
        }
        let Some(&byte) = bytes.get(ix) else {
            fail!(BufferBounds, "unexpected end of stream reading uleb128 at 0x{:x}", ix);
        };
        ix += 1;

        // the fifth byte only contributes 4 bits to a u32, anything above is dropped
        value |= ((byte & 0x7F) as u32).wrapping_shl(shift);
        shift += 7;

        if byte & 0x80 == 0 {
            break;
        }
    }

    Ok((value, ix))
}
