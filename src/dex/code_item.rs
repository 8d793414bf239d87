//! Rendering of a code body into pseudo-source lines.
//!
//! Every instruction is read through a fixed two-byte window (opcode plus one
//! packed operand byte) and the walker always advances by one code unit, so
//! wider formats are not followed. Branch labels are the raw operand byte.

use log::warn;
use serde::Serialize;

use crate::dex::error::DexError;
use crate::dex::opcode_format::{InstructionSet, OperandTables, Operands};
use crate::dex::{ensure, read_u2, read_u4, read_x};
use crate::types::DecodedLine;

pub const CODE_HEADER_SIZE: usize = 16;
pub const CODE_UNIT_SIZE: usize = 2;

/// The fixed prologue in front of an instruction stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CodeHeader
{
    pub registers_size: u16,
    pub ins_size: u16,
    pub outs_size: u16,
    pub tries_size: u16,
    pub debug_info_off: u32,
    /// Length of the instruction stream in 16-bit code units.
    pub insns_size: u32,
}

impl CodeHeader
{
    pub fn read(bytes: &[u8], ix: &mut usize) -> Result<CodeHeader, DexError>
    {
        ensure(bytes, *ix, CODE_HEADER_SIZE)?;
        Ok(CodeHeader {
            registers_size: read_u2(bytes, ix)?,
            ins_size: read_u2(bytes, ix)?,
            outs_size: read_u2(bytes, ix)?,
            tries_size: read_u2(bytes, ix)?,
            debug_info_off: read_u4(bytes, ix)?,
            insns_size: read_u4(bytes, ix)?,
        })
    }
}

/// Walks the code at `offset` and renders one line per code unit. An offset of
/// zero means there is no code and yields no lines.
pub fn disassemble_method(
    bytes: &[u8],
    offset: u32,
    tables: &OperandTables<'_>,
    set: &InstructionSet,
) -> Result<Vec<DecodedLine>, DexError>
{
    if offset == 0
    {
        return Ok(vec![]);
    }

    let mut ix = offset as usize;
    let header = CodeHeader::read(bytes, &mut ix)
        .map_err(|e| DexError::with_context(e, format!("code header at 0x{:x}", offset)))?;

    let insns_start = ix;
    let insns_len = (header.insns_size as usize).checked_mul(CODE_UNIT_SIZE)
        .ok_or_else(|| err!(BufferBounds, "instruction count {} overflows", header.insns_size))?;
    ensure(bytes, insns_start, insns_len)
        .map_err(|e| DexError::with_context(e, format!("instructions at 0x{:x}", insns_start)))?;

    let mut lines = Vec::with_capacity(header.insns_size as usize);
    let mut pc = 0;
    while pc < insns_len
    {
        let at = insns_start + pc;
        let mut cursor = at;
        let window = read_x(bytes, &mut cursor, CODE_UNIT_SIZE)?;
        let ops = Operands::new(window[0], window[1]);

        let text = match set.get(ops.opcode)
        {
            Some(spec) => {
                let ctx = tables.context_for(spec.context, &ops);
                spec.render(&ops, &ctx)
            }
            None => {
                warn!("[code] unknown opcode 0x{:02x} at 0x{:x}", ops.opcode, at);
                format!("// Unknown opcode: 0x{:02x}", ops.opcode)
            }
        };

        lines.push(DecodedLine { offset: at as u32, text });
        pc += CODE_UNIT_SIZE;
    }

    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dex::dex_file::TypePool;
    use crate::dex::error::DexErrorKind;
    use crate::dex::opcodes::INSTRUCTION_SET;
    use crate::dex::string_pool::StringPool;

    /// A buffer with `pad` leading bytes followed by a code item for `units`.
    fn code_at(pad: usize, units: &[[u8; 2]]) -> Vec<u8>
    {
        let mut bytes = vec![0u8; pad];
        bytes.extend_from_slice(&3u16.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&0u16.to_le_bytes());
        bytes.extend_from_slice(&0u16.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&(units.len() as u32).to_le_bytes());
        for u in units { bytes.extend_from_slice(u); }
        bytes
    }

    fn render(bytes: &[u8], offset: u32) -> Result<Vec<DecodedLine>, DexError>
    {
        let strings = StringPool::from_strings(vec!["hi".to_string()]);
        let types = TypePool::default();
        let tables = OperandTables { strings: &strings, types: &types, fields: &[], methods: &[] };
        disassemble_method(bytes, offset, &tables, &INSTRUCTION_SET)
    }

    #[test]
    fn zero_offset_has_no_code()
    {
        assert_eq!(render(&[], 0), Ok(vec![]));
    }

    #[test]
    fn reads_prologue()
    {
        let bytes = code_at(4, &[[0x0e, 0x00]]);
        let mut ix = 4;
        let header = CodeHeader::read(&bytes, &mut ix).unwrap();
        assert_eq!(header.registers_size, 3);
        assert_eq!(header.ins_size, 1);
        assert_eq!(header.insns_size, 1);
        assert_eq!(ix, 4 + CODE_HEADER_SIZE);
    }

    #[test]
    fn return_void_only()
    {
        let bytes = code_at(8, &[[0x0e, 0x00]]);
        let lines = render(&bytes, 8).unwrap();
        assert_eq!(lines, vec![DecodedLine { offset: 8 + CODE_HEADER_SIZE as u32, text: "return;".to_string() }]);
    }

    #[test]
    fn unknown_opcode_is_a_placeholder()
    {
        let bytes = code_at(8, &[[0x73, 0x12], [0xff, 0x00], [0x0e, 0x00]]);
        let lines = render(&bytes, 8).unwrap();
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["// Unknown opcode: 0x73", "// Unknown opcode: 0xff", "return;"]);
        assert_eq!(lines[1].offset - lines[0].offset, 2);
        assert_eq!(lines[2].offset - lines[1].offset, 2);
    }

    #[test]
    fn every_unit_becomes_one_line()
    {
        let bytes = code_at(8, &[[0x1a, 0x00], [0x11, 0x00]]);
        let lines = render(&bytes, 8).unwrap();
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["v0 = \"hi\";", "return v0;  // object"]);
    }

    #[test]
    fn truncated_code_is_a_bounds_error()
    {
        let mut bytes = code_at(8, &[[0x0e, 0x00], [0x0e, 0x00]]);
        bytes.pop();
        assert_eq!(render(&bytes, 8).unwrap_err().kind(), DexErrorKind::BufferBounds);
        assert_eq!(render(&bytes, 4000).unwrap_err().kind(), DexErrorKind::BufferBounds);
    }
}
