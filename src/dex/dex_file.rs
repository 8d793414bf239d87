/* Dex file format structures */

use bitflags::bitflags;
use log::{debug, info};
use nom::number::complete::{le_u16, le_u32};
use nom::sequence::tuple;
use nom::IResult;
use serde::Serialize;

use crate::dex::code_item::disassemble_method;
use crate::dex::error::DexError;
use crate::dex::opcode_format::OperandTables;
use crate::dex::opcodes::INSTRUCTION_SET;
use crate::dex::string_pool::StringPool;
use crate::dex::{ensure, read_u4, read_x};
use crate::types::{DecodeOptions, DecodedClass, DecodedLine};

/* Constants */
pub const DEX_MAGIC_PREFIX: [u8; 4] = [ 0x64, 0x65, 0x78, 0x0a ];
pub const HEADER_SIZE: usize = 0x70;
pub const NO_INDEX: u32 = 0xffffffff;

pub const STRING_ID_SIZE: usize = 4;
pub const TYPE_ID_SIZE: usize = 4;
pub const FIELD_ID_SIZE: usize = 8;
pub const METHOD_ID_SIZE: usize = 8;
pub const CLASS_DEF_SIZE: usize = 32;

bitflags! {
    /// Access flags of a `class_def_item`; bits this crate does not name are kept.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
    pub struct AccessFlags: u32 {
        const PUBLIC = 0x1;
        const PRIVATE = 0x2;
        const PROTECTED = 0x4;
        const STATIC = 0x8;
        const FINAL = 0x10;
        const INTERFACE = 0x200;
        const ABSTRACT = 0x400;
        const SYNTHETIC = 0x1000;
        const ANNOTATION = 0x2000;
        const ENUM = 0x4000;
        const _ = !0;
    }
}

/// A (size, offset) pair from the header locating one id table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableDescriptor {
    pub size: u32,
    pub offset: u32,
}

impl TableDescriptor
{
    fn read(bytes: &[u8], size_at: usize, offset_at: usize) -> Result<TableDescriptor, DexError>
    {
        let (mut s, mut o) = (size_at, offset_at);
        Ok(TableDescriptor { size: read_u4(bytes, &mut s)?, offset: read_u4(bytes, &mut o)? })
    }

    /// Checks that `size` records of `width` bytes starting at `offset` fit in the buffer.
    fn validate(&self, bytes: &[u8], width: usize, name: &str) -> Result<(), DexError>
    {
        // an empty table reads nothing, whatever its offset says
        if self.size == 0
        {
            return Ok(());
        }
        let len = (self.size as usize).checked_mul(width)
            .ok_or_else(|| err!(BufferBounds, "{} table size {} overflows", name, self.size))?;
        ensure(bytes, self.offset as usize, len)
            .map_err(|e| DexError::with_context(e, format!("{} table at 0x{:x}", name, self.offset)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DexHeader {
    pub magic: [u8; 8],
    pub strings: TableDescriptor,
    pub types: TableDescriptor,
    pub fields: TableDescriptor,
    pub methods: TableDescriptor,
    pub class_defs: TableDescriptor,
}

impl DexHeader
{
    pub fn read(bytes: &[u8]) -> Result<DexHeader, DexError>
    {
        if bytes.get(..4) != Some(&DEX_MAGIC_PREFIX[..])
        {
            fail!(DexFormat, "invalid magic value {:02x?}", &bytes[..bytes.len().min(4)]);
        }
        if bytes.len() < HEADER_SIZE
        {
            fail!(BufferBounds, "not enough bytes for header ({} < {})", bytes.len(), HEADER_SIZE);
        }

        let mut magic = [0u8; 8];
        magic.copy_from_slice(&bytes[..8]);

        let header = DexHeader {
            magic,
            strings: TableDescriptor::read(bytes, 56, 60)?,
            types: TableDescriptor::read(bytes, 64, 68)?,
            fields: TableDescriptor::read(bytes, 80, 84)?,
            methods: TableDescriptor::read(bytes, 88, 92)?,
            class_defs: TableDescriptor::read(bytes, 96, 100)?,
        };

        header.strings.validate(bytes, STRING_ID_SIZE, "string_ids")?;
        header.types.validate(bytes, TYPE_ID_SIZE, "type_ids")?;
        header.fields.validate(bytes, FIELD_ID_SIZE, "field_ids")?;
        header.methods.validate(bytes, METHOD_ID_SIZE, "method_ids")?;
        header.class_defs.validate(bytes, CLASS_DEF_SIZE, "class_defs")?;

        Ok(header)
    }

    /// Return the numeric DEX version from the header magic, e.g. 35, 37, 39.
    pub fn version(&self) -> Option<u32>
    {
        let digits = &self.magic[4..7];
        if digits.iter().all(u8::is_ascii_digit)
        {
            Some(digits.iter().fold(0, |v, d| v * 10 + (d - b'0') as u32))
        }
        else { None }
    }
}

/// Type descriptors, index = type id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypePool {
    descriptors: Vec<String>,
}

impl TypePool
{
    pub fn read(bytes: &[u8], table: &TableDescriptor, strings: &StringPool) -> Result<TypePool, DexError>
    {
        let mut ix = table.offset as usize;
        let mut descriptors = Vec::with_capacity(table.size as usize);
        for i in 0..table.size
        {
            let string_idx = read_u4(bytes, &mut ix)?;
            let desc = strings.resolve(string_idx)
                .map_err(|e| DexError::with_context(e, format!("type_id #{}", i)))?;
            descriptors.push(desc.to_string());
        }
        Ok(TypePool { descriptors })
    }

    pub fn from_descriptors(descriptors: Vec<String>) -> TypePool
    {
        TypePool { descriptors }
    }

    pub fn len(&self) -> usize { self.descriptors.len() }

    pub fn is_empty(&self) -> bool { self.descriptors.is_empty() }

    pub fn get(&self, idx: usize) -> Option<&str>
    {
        self.descriptors.get(idx).map(String::as_str)
    }

    pub fn resolve(&self, idx: u32) -> Result<&str, DexError>
    {
        match self.get(idx as usize)
        {
            Some(s) => Ok(s),
            None => fail!(UnresolvedIndex, "type index {} out of range (types.len={})", idx, self.descriptors.len()),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str>
    {
        self.descriptors.iter().map(String::as_str)
    }
}

/// Parses one fixed-width record after checking it lies inside the buffer.
fn read_record<'a, O>(
    bytes: &'a [u8],
    ix: &mut usize,
    width: usize,
    mut parser: impl FnMut(&'a [u8]) -> IResult<&'a [u8], O>,
) -> Result<O, DexError>
{
    let start = *ix;
    let record = read_x(bytes, ix, width)?;
    parser(record)
        .map(|(_, out)| out)
        .map_err(|_| err!(BufferBounds, "short {}-byte record at 0x{:x}", width, start))
}

// field_id_item and method_id_item share the same layout
fn id_item(input: &[u8]) -> IResult<&[u8], (u16, u16, u32)>
{
    tuple((le_u16, le_u16, le_u32))(input)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldRef {
    pub class: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub name: String,
}

impl FieldRef
{
    pub fn read(bytes: &[u8], ix: &mut usize, strings: &StringPool, types: &TypePool) -> Result<FieldRef, DexError>
    {
        let (class_idx, type_idx, name_idx) = read_record(bytes, ix, FIELD_ID_SIZE, id_item)?;
        Ok(FieldRef {
            class: types.resolve(class_idx as u32)?.to_string(),
            field_type: types.resolve(type_idx as u32)?.to_string(),
            name: strings.resolve(name_idx)?.to_string(),
        })
    }
}

/// A method reference. The prototype stays a raw index, signatures are not resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodRef {
    pub class: String,
    pub name: String,
    pub proto_idx: u16,
}

impl MethodRef
{
    pub fn read(bytes: &[u8], ix: &mut usize, strings: &StringPool, types: &TypePool) -> Result<MethodRef, DexError>
    {
        let (class_idx, proto_idx, name_idx) = read_record(bytes, ix, METHOD_ID_SIZE, id_item)?;
        Ok(MethodRef {
            class: types.resolve(class_idx as u32)?.to_string(),
            name: strings.resolve(name_idx)?.to_string(),
            proto_idx,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassDef {
    pub name: String,
    pub access_flags: AccessFlags,
    pub superclass: Option<String>,
    pub source_file: Option<String>,
    pub data_offset: u32,
}

impl ClassDef
{
    pub fn read(bytes: &[u8], ix: &mut usize, strings: &StringPool, types: &TypePool) -> Result<ClassDef, DexError>
    {
        let (
            class_idx,
            access_flags,
            superclass_idx,
            _interfaces_off,
            source_file_idx,
            _annotations_off,
            class_data_off,
            _static_values_off,
        ) = read_record(bytes, ix, CLASS_DEF_SIZE, |input| {
            tuple((le_u32, le_u32, le_u32, le_u32, le_u32, le_u32, le_u32, le_u32))(input)
        })?;

        let name = types.resolve(class_idx)
            .map_err(|e| DexError::with_context(e, "class".to_string()))?
            .to_string();
        let superclass = if superclass_idx != NO_INDEX {
            Some(types.resolve(superclass_idx)
                .map_err(|e| DexError::with_context(e, "superclass".to_string()))?
                .to_string())
        } else { None };
        let source_file = if source_file_idx != NO_INDEX {
            Some(strings.resolve(source_file_idx)
                .map_err(|e| DexError::with_context(e, "source file".to_string()))?
                .to_string())
        } else { None };

        Ok(ClassDef {
            name,
            access_flags: AccessFlags::from_bits_retain(access_flags),
            superclass,
            source_file,
            data_offset: class_data_off,
        })
    }
}

/// The decoded tables of one DEX buffer. Everything borrows from or is derived
/// from `data`, and nothing is mutated after construction.
#[derive(Debug)]
pub struct DexFile<'a> {
    pub header: DexHeader,
    pub strings: StringPool,
    pub types: TypePool,
    pub fields: Vec<FieldRef>,
    pub methods: Vec<MethodRef>,
    pub classes: Vec<ClassDef>,
    data: &'a [u8],
}

impl<'a> DexFile<'a> {

    pub fn from_bytes(bytes: &'a [u8]) -> Result<DexFile<'a>, DexError>
    {
        DexFile::from_bytes_with(bytes, &DecodeOptions::default())
    }

    pub fn from_bytes_with(bytes: &'a [u8], options: &DecodeOptions) -> Result<DexFile<'a>, DexError>
    {
        let header = DexHeader::read(bytes)?;
        let strings = StringPool::decode(bytes, &header.strings, options.string_workers())?;
        let types = TypePool::read(bytes, &header.types, &strings)?;

        // Read the Field ids
        let mut ix = header.fields.offset as usize;
        let mut fields = Vec::with_capacity(header.fields.size as usize);
        for i in 0..header.fields.size
        {
            let f = FieldRef::read(bytes, &mut ix, &strings, &types)
                .map_err(|e| DexError::with_context(e, format!("field_id #{}", i)))?;
            fields.push(f);
        }

        // Read the Methods ids
        ix = header.methods.offset as usize;
        let mut methods = Vec::with_capacity(header.methods.size as usize);
        for i in 0..header.methods.size
        {
            let m = MethodRef::read(bytes, &mut ix, &strings, &types)
                .map_err(|e| DexError::with_context(e, format!("method_id #{}", i)))?;
            methods.push(m);
        }

        // Read the Class Defs
        ix = header.class_defs.offset as usize;
        let mut classes = Vec::with_capacity(header.class_defs.size as usize);
        for i in 0..header.class_defs.size
        {
            let c = ClassDef::read(bytes, &mut ix, &strings, &types)
                .map_err(|e| DexError::with_context(e, format!("class_def #{}", i)))?;
            classes.push(c);
        }

        info!(
            "[dex] version {:?}: {} strings, {} types, {} fields, {} methods, {} classes",
            header.version(), strings.len(), types.len(), fields.len(), methods.len(), classes.len()
        );

        Ok(DexFile { header, strings, types, fields, methods, classes, data: bytes })
    }

    /// The already-built tables instructions resolve their operands against.
    pub fn tables(&self) -> OperandTables<'_>
    {
        OperandTables {
            strings: &self.strings,
            types: &self.types,
            fields: &self.fields,
            methods: &self.methods,
        }
    }

    /// Renders the code found at a class's data offset.
    pub fn disassemble_class(&self, class: &ClassDef) -> Result<Vec<DecodedLine>, DexError>
    {
        debug!("[dex] disassembling {} at 0x{:x}", class.name, class.data_offset);
        disassemble_method(self.data, class.data_offset, &self.tables(), &INSTRUCTION_SET)
            .map_err(|e| DexError::with_context(e, format!("while disassembling {}", class.name)))
    }

    pub fn to_pseudo(&self) -> Result<Vec<DecodedClass>, DexError>
    {
        let mut decoded = Vec::with_capacity(self.classes.len());
        for c in &self.classes
        {
            decoded.push(DecodedClass {
                name: c.name.clone(),
                superclass: c.superclass.clone(),
                source_file: c.source_file.clone(),
                lines: self.disassemble_class(c)?,
            });
        }
        Ok(decoded)
    }
}
