use log::warn;
use serde::Serialize;

use crate::dex::dex_file::{FieldRef, MethodRef, TypePool};
use crate::dex::string_pool::StringPool;

/// Which already-built table (or raw literal) an opcode's render function needs.
/// Fixed per opcode when the instruction set is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ContextKind {
    None,
    RawValue,
    Strings,
    Types,
    Fields,
    Methods,
}

/// The resolved operand context handed to a render function. Holds exactly one
/// table reference or literal, matching the opcode's `ContextKind`.
#[derive(Debug, Clone, Copy)]
pub enum OperandContext<'a> {
    None,
    Raw(i64),
    Strings(&'a StringPool),
    Types(&'a TypePool),
    Fields(&'a [FieldRef]),
    Methods(&'a [MethodRef]),
}

impl OperandContext<'_>
{
    pub fn kind(&self) -> ContextKind
    {
        match self {
            OperandContext::None => ContextKind::None,
            OperandContext::Raw(_) => ContextKind::RawValue,
            OperandContext::Strings(_) => ContextKind::Strings,
            OperandContext::Types(_) => ContextKind::Types,
            OperandContext::Fields(_) => ContextKind::Fields,
            OperandContext::Methods(_) => ContextKind::Methods,
        }
    }

    fn mismatch(&self, expected: ContextKind) -> !
    {
        unreachable!("opcode registered with {:?} context was rendered with {:?}", expected, self.kind())
    }

    pub fn raw(&self) -> i64
    {
        match self {
            OperandContext::Raw(v) => *v,
            other => other.mismatch(ContextKind::RawValue),
        }
    }

    pub fn string(&self, idx: u8) -> String
    {
        match self {
            OperandContext::Strings(pool) => match pool.get(idx as usize) {
                Some(s) => s.to_string(),
                None => {
                    warn!("[render] string index {} OOB (strings.len={})", idx, pool.len());
                    format!("string@{}", idx)
                }
            },
            other => other.mismatch(ContextKind::Strings),
        }
    }

    pub fn type_desc(&self, idx: u8) -> String
    {
        match self {
            OperandContext::Types(pool) => match pool.get(idx as usize) {
                Some(s) => s.to_string(),
                None => {
                    warn!("[render] type index {} OOB (types.len={})", idx, pool.len());
                    format!("type@{}", idx)
                }
            },
            other => other.mismatch(ContextKind::Types),
        }
    }

    pub fn field_name(&self, idx: u8) -> String
    {
        match self {
            OperandContext::Fields(fields) => match fields.get(idx as usize) {
                Some(f) => f.name.clone(),
                None => {
                    warn!("[render] field index {} OOB (fields.len={})", idx, fields.len());
                    format!("field@{}", idx)
                }
            },
            other => other.mismatch(ContextKind::Fields),
        }
    }

    /// Returns (class descriptor, method name).
    pub fn method(&self, idx: u8) -> (String, String)
    {
        match self {
            OperandContext::Methods(methods) => match methods.get(idx as usize) {
                Some(m) => (m.class.clone(), m.name.clone()),
                None => {
                    warn!("[render] method index {} OOB (methods.len={})", idx, methods.len());
                    (format!("type@{}", idx), format!("method@{}", idx))
                }
            },
            other => other.mismatch(ContextKind::Methods),
        }
    }
}

/// The tables a method body is rendered against.
#[derive(Debug, Clone, Copy)]
pub struct OperandTables<'a> {
    pub strings: &'a StringPool,
    pub types: &'a TypePool,
    pub fields: &'a [FieldRef],
    pub methods: &'a [MethodRef],
}

impl<'a> OperandTables<'a>
{
    /// Picks the context for `kind`. The raw literal is the window's operand
    /// byte, sign-extended.
    pub fn context_for(&self, kind: ContextKind, ops: &Operands) -> OperandContext<'a>
    {
        match kind {
            ContextKind::None => OperandContext::None,
            ContextKind::RawValue => OperandContext::Raw(ops.aa() as i8 as i64),
            ContextKind::Strings => OperandContext::Strings(self.strings),
            ContextKind::Types => OperandContext::Types(self.types),
            ContextKind::Fields => OperandContext::Fields(self.fields),
            ContextKind::Methods => OperandContext::Methods(self.methods),
        }
    }
}

/// The two-byte window every instruction is read through: the opcode and one
/// packed operand byte. Operands the real format stores past the first code
/// unit are read as `aa`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operands {
    pub opcode: u8,
    pub packed: u8,
}

impl Operands
{
    pub fn new(opcode: u8, packed: u8) -> Operands
    {
        Operands { opcode, packed }
    }

    /// Low nibble register.
    pub fn a(&self) -> u8 { self.packed & 0x0f }

    /// High nibble register.
    pub fn b(&self) -> u8 { self.packed >> 4 }

    pub fn aa(&self) -> u8 { self.packed }

    /// High nibble as a signed 4-bit literal.
    pub fn lit4(&self) -> i8 { (self.packed as i8) >> 4 }
}

pub type RenderFn = fn(&Operands, &OperandContext<'_>) -> String;

/// How one opcode is rendered.
#[derive(Clone, Copy)]
pub struct InstructionSpec {
    pub opcode: u8,
    pub mnemonic: &'static str,
    pub context: ContextKind,
    /// Variant annotation appended as a trailing comment, e.g. "static wide".
    pub note: Option<&'static str>,
    render: RenderFn,
}

impl std::fmt::Debug for InstructionSpec
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    {
        f.debug_struct("InstructionSpec")
            .field("opcode", &format_args!("0x{:02x}", self.opcode))
            .field("mnemonic", &self.mnemonic)
            .field("context", &self.context)
            .field("note", &self.note)
            .finish()
    }
}

impl InstructionSpec
{
    pub(crate) fn new(opcode: u8, mnemonic: &'static str, context: ContextKind, note: &'static str, render: RenderFn) -> Self
    {
        InstructionSpec {
            opcode,
            mnemonic,
            context,
            note: if note.is_empty() { None } else { Some(note) },
            render,
        }
    }

    pub fn render(&self, ops: &Operands, ctx: &OperandContext<'_>) -> String
    {
        let line = (self.render)(ops, ctx);
        match self.note {
            Some(note) => format!("{}  // {}", line, note),
            None => line,
        }
    }
}

/// Immutable opcode to spec lookup.
pub struct InstructionSet {
    table: [Option<InstructionSpec>; 256],
}

impl InstructionSet
{
    /// Builds the lookup. Later entries for the same opcode replace earlier ones.
    pub fn from_specs(specs: impl IntoIterator<Item = InstructionSpec>) -> InstructionSet
    {
        let mut table = [None; 256];
        for spec in specs {
            table[spec.opcode as usize] = Some(spec);
        }
        InstructionSet { table }
    }

    pub fn get(&self, opcode: u8) -> Option<&InstructionSpec>
    {
        self.table[opcode as usize].as_ref()
    }

    pub fn by_mnemonic(&self, mnemonic: &str) -> Option<&InstructionSpec>
    {
        self.iter().find(|s| s.mnemonic == mnemonic)
    }

    pub fn len(&self) -> usize
    {
        self.table.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool
    {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &InstructionSpec>
    {
        self.table.iter().flatten()
    }
}
