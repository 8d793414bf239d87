use once_cell::sync::Lazy;

use crate::dex::opcode_format::{ContextKind, InstructionSet, InstructionSpec, OperandContext, Operands, RenderFn};

/// The Dalvik instruction set as rendered by this crate, built on first use.
pub static INSTRUCTION_SET: Lazy<InstructionSet> = Lazy::new(|| InstructionSet::from_specs(specs()));

fn plain(opcode: u8, mnemonic: &'static str, note: &'static str, render: RenderFn) -> InstructionSpec
{
    InstructionSpec::new(opcode, mnemonic, ContextKind::None, note, render)
}

fn raw(opcode: u8, mnemonic: &'static str, note: &'static str, render: RenderFn) -> InstructionSpec
{
    InstructionSpec::new(opcode, mnemonic, ContextKind::RawValue, note, render)
}

fn strings(opcode: u8, mnemonic: &'static str, note: &'static str, render: RenderFn) -> InstructionSpec
{
    InstructionSpec::new(opcode, mnemonic, ContextKind::Strings, note, render)
}

fn types(opcode: u8, mnemonic: &'static str, note: &'static str, render: RenderFn) -> InstructionSpec
{
    InstructionSpec::new(opcode, mnemonic, ContextKind::Types, note, render)
}

fn fields(opcode: u8, mnemonic: &'static str, note: &'static str, render: RenderFn) -> InstructionSpec
{
    InstructionSpec::new(opcode, mnemonic, ContextKind::Fields, note, render)
}

fn methods(opcode: u8, mnemonic: &'static str, note: &'static str, render: RenderFn) -> InstructionSpec
{
    InstructionSpec::new(opcode, mnemonic, ContextKind::Methods, note, render)
}

// Shared renderers for the typed variant families

fn move_reg(o: &Operands, _: &OperandContext) -> String { format!("v{} = v{};", o.a(), o.b()) }
fn move_result(o: &Operands, _: &OperandContext) -> String { format!("v{} = result;", o.aa()) }
fn return_reg(o: &Operands, _: &OperandContext) -> String { format!("return v{};", o.aa()) }
fn const_lit(o: &Operands, c: &OperandContext) -> String { format!("v{} = {};", o.aa(), c.raw()) }
fn iget(o: &Operands, c: &OperandContext) -> String { format!("v{} = v{}.{};", o.a(), o.b(), c.field_name(o.aa())) }
fn iput(o: &Operands, c: &OperandContext) -> String { format!("v{}.{} = v{};", o.b(), c.field_name(o.aa()), o.a()) }
fn sget(o: &Operands, c: &OperandContext) -> String { format!("v{} = {};", o.aa(), c.field_name(o.aa())) }
fn sput(o: &Operands, c: &OperandContext) -> String { format!("{} = v{};", c.field_name(o.aa()), o.aa()) }
fn aget(o: &Operands, _: &OperandContext) -> String { format!("v{} = v{}[v{}];", o.a(), o.b(), o.aa()) }
fn aput(o: &Operands, _: &OperandContext) -> String { format!("v{}[v{}] = v{};", o.b(), o.aa(), o.a()) }
fn goto(o: &Operands, _: &OperandContext) -> String { format!("goto label_{};", o.aa()) }

fn invoke_virtual(o: &Operands, c: &OperandContext) -> String { format!("v{}.{}(...);", o.a(), c.method(o.aa()).1) }
fn invoke_super(o: &Operands, c: &OperandContext) -> String { format!("super.{}(...);", c.method(o.aa()).1) }
fn invoke_direct(o: &Operands, c: &OperandContext) -> String { format!("{}(...);", c.method(o.aa()).1) }
fn invoke_static(o: &Operands, c: &OperandContext) -> String
{
    let (class, name) = c.method(o.aa());
    format!("{}.{}(...);", class, name)
}

fn cmpl(o: &Operands, _: &OperandContext) -> String
{
    let (b, c) = (o.b(), o.aa());
    format!("v{} = (v{} < v{}) ? -1 : ((v{} == v{}) ? 0 : 1);", o.a(), b, c, b, c)
}

fn cmpg(o: &Operands, _: &OperandContext) -> String
{
    let (b, c) = (o.b(), o.aa());
    format!("v{} = (v{} > v{}) ? 1 : ((v{} == v{}) ? 0 : -1);", o.a(), b, c, b, c)
}

fn new_filled_array(o: &Operands, c: &OperandContext) -> String { format!("new {}{{...}};", c.type_desc(o.aa())) }

fn specs() -> Vec<InstructionSpec>
{
    vec![
        plain(0x00, "nop", "", |_, _| String::new()),

        plain(0x01, "move", "", move_reg),
        plain(0x02, "move/from16", "", move_reg),
        plain(0x03, "move/16", "", move_reg),
        plain(0x04, "move-wide", "wide", move_reg),
        plain(0x05, "move-wide/from16", "wide", move_reg),
        plain(0x06, "move-wide/16", "wide", move_reg),
        plain(0x07, "move-object", "object", move_reg),
        plain(0x08, "move-object/from16", "object", move_reg),
        plain(0x09, "move-object/16", "object", move_reg),
        plain(0x0a, "move-result", "", move_result),
        plain(0x0b, "move-result-wide", "wide", move_result),
        plain(0x0c, "move-result-object", "object", move_result),
        plain(0x0d, "move-exception", "", |o, _| format!("v{} = exception;", o.aa())),

        plain(0x0e, "return-void", "", |_, _| "return;".to_string()),
        plain(0x0f, "return", "", return_reg),
        plain(0x10, "return-wide", "wide", return_reg),
        plain(0x11, "return-object", "object", return_reg),

        plain(0x12, "const/4", "", |o, _| format!("v{} = {};", o.a(), o.lit4())),
        raw(0x13, "const/16", "", const_lit),
        raw(0x14, "const", "", const_lit),
        raw(0x15, "const/high16", "", |o, c| format!("v{} = {};", o.aa(), c.raw() << 16)),
        raw(0x16, "const-wide/16", "wide", const_lit),
        raw(0x17, "const-wide/32", "wide", const_lit),
        raw(0x18, "const-wide", "wide", const_lit),
        raw(0x19, "const-wide/high16", "wide", |o, c| format!("v{} = {};", o.aa(), c.raw() << 48)),
        strings(0x1a, "const-string", "", |o, c| format!("v{} = \"{}\";", o.aa(), c.string(o.aa()))),
        strings(0x1b, "const-string/jumbo", "", |o, c| format!("v{} = \"{}\";", o.aa(), c.string(o.aa()))),
        types(0x1c, "const-class", "", |o, c| format!("v{} = {}.class;", o.aa(), c.type_desc(o.aa()))),

        plain(0x1d, "monitor-enter", "", |o, _| format!("synchronized(v{}) {{", o.aa())),
        plain(0x1e, "monitor-exit", "end synchronized", |_, _| "}".to_string()),

        types(0x1f, "check-cast", "", |o, c| format!("v{} = ({}) v{};", o.aa(), c.type_desc(o.aa()), o.aa())),
        types(0x20, "instance-of", "", |o, c| format!("v{} = (v{} instanceof {});", o.a(), o.b(), c.type_desc(o.aa()))),
        plain(0x21, "array-length", "", |o, _| format!("v{} = v{}.length;", o.a(), o.b())),
        types(0x22, "new-instance", "", |o, c| format!("v{} = new {};", o.aa(), c.type_desc(o.aa()))),
        types(0x23, "new-array", "", |o, c| format!("v{} = new {}[v{}];", o.a(), c.type_desc(o.aa()), o.b())),
        types(0x24, "filled-new-array", "", new_filled_array),
        types(0x25, "filled-new-array/range", "range", new_filled_array),
        plain(0x26, "fill-array-data", "", |_, _| "// fill array with data".to_string()),
        plain(0x27, "throw", "", |o, _| format!("throw v{};", o.aa())),

        plain(0x28, "goto", "", goto),
        plain(0x29, "goto/16", "16-bit offset", goto),
        plain(0x2a, "goto/32", "32-bit offset", goto),

        plain(0x2d, "cmpl-float", "", cmpl),
        plain(0x2e, "cmpg-float", "", cmpg),
        plain(0x2f, "cmpl-double", "double", cmpl),
        plain(0x30, "cmpg-double", "double", cmpg),
        plain(0x31, "cmp-long", "long", |o, _| {
            let (b, c) = (o.b(), o.aa());
            format!("v{} = (v{} == v{}) ? 0 : ((v{} < v{}) ? -1 : 1);", o.a(), b, c, b, c)
        }),

        plain(0x32, "if-eq", "", |o, _| format!("if (v{} == v{}) goto label_{};", o.a(), o.b(), o.aa())),
        plain(0x33, "if-ne", "", |o, _| format!("if (v{} != v{}) goto label_{};", o.a(), o.b(), o.aa())),
        plain(0x34, "if-lt", "", |o, _| format!("if (v{} < v{}) goto label_{};", o.a(), o.b(), o.aa())),
        plain(0x35, "if-ge", "", |o, _| format!("if (v{} >= v{}) goto label_{};", o.a(), o.b(), o.aa())),
        plain(0x36, "if-gt", "", |o, _| format!("if (v{} > v{}) goto label_{};", o.a(), o.b(), o.aa())),
        plain(0x37, "if-le", "", |o, _| format!("if (v{} <= v{}) goto label_{};", o.a(), o.b(), o.aa())),
        plain(0x38, "if-eqz", "", |o, _| format!("if (v{} == 0) goto label_{};", o.aa(), o.aa())),
        plain(0x39, "if-nez", "", |o, _| format!("if (v{} != 0) goto label_{};", o.aa(), o.aa())),
        plain(0x3a, "if-ltz", "", |o, _| format!("if (v{} < 0) goto label_{};", o.aa(), o.aa())),
        plain(0x3b, "if-gez", "", |o, _| format!("if (v{} >= 0) goto label_{};", o.aa(), o.aa())),
        plain(0x3c, "if-gtz", "", |o, _| format!("if (v{} > 0) goto label_{};", o.aa(), o.aa())),
        plain(0x3d, "if-lez", "", |o, _| format!("if (v{} <= 0) goto label_{};", o.aa(), o.aa())),

        plain(0x44, "aget", "", aget),
        plain(0x45, "aget-wide", "wide", aget),
        plain(0x46, "aget-object", "object", aget),
        plain(0x47, "aget-boolean", "boolean", aget),
        plain(0x48, "aget-byte", "byte", aget),
        plain(0x49, "aget-char", "char", aget),
        plain(0x4a, "aget-short", "short", aget),
        plain(0x4b, "aput", "", aput),
        plain(0x4c, "aput-wide", "wide", aput),
        plain(0x4d, "aput-object", "object", aput),
        plain(0x4e, "aput-boolean", "boolean", aput),
        plain(0x4f, "aput-byte", "byte", aput),
        plain(0x50, "aput-char", "char", aput),
        plain(0x51, "aput-short", "short", aput),

        fields(0x52, "iget", "", iget),
        fields(0x53, "iget-wide", "wide", iget),
        fields(0x54, "iget-object", "object", iget),
        fields(0x55, "iget-boolean", "boolean", iget),
        fields(0x56, "iget-byte", "byte", iget),
        fields(0x57, "iget-char", "char", iget),
        fields(0x58, "iget-short", "short", iget),
        fields(0x59, "iput", "", iput),
        fields(0x5a, "iput-wide", "wide", iput),
        fields(0x5b, "iput-object", "object", iput),
        fields(0x5c, "iput-boolean", "boolean", iput),
        fields(0x5d, "iput-byte", "byte", iput),
        fields(0x5e, "iput-char", "char", iput),
        fields(0x5f, "iput-short", "short", iput),

        fields(0x60, "sget", "static", sget),
        fields(0x61, "sget-wide", "static wide", sget),
        fields(0x62, "sget-object", "static object", sget),
        fields(0x63, "sget-boolean", "static boolean", sget),
        fields(0x64, "sget-byte", "static byte", sget),
        fields(0x65, "sget-char", "static char", sget),
        fields(0x66, "sget-short", "static short", sget),
        fields(0x67, "sput", "static", sput),
        fields(0x68, "sput-wide", "static wide", sput),
        fields(0x69, "sput-object", "static object", sput),
        fields(0x6a, "sput-boolean", "static boolean", sput),
        fields(0x6b, "sput-byte", "static byte", sput),
        fields(0x6c, "sput-char", "static char", sput),
        fields(0x6d, "sput-short", "static short", sput),

        methods(0x6e, "invoke-virtual", "", invoke_virtual),
        methods(0x6f, "invoke-super", "", invoke_super),
        methods(0x70, "invoke-direct", "", invoke_direct),
        methods(0x71, "invoke-static", "", invoke_static),
        methods(0x72, "invoke-interface", "interface", invoke_virtual),
        methods(0x74, "invoke-virtual/range", "range", invoke_virtual),
        methods(0x75, "invoke-super/range", "range", invoke_super),
        methods(0x76, "invoke-direct/range", "range", invoke_direct),
        methods(0x77, "invoke-static/range", "range", invoke_static),
        methods(0x78, "invoke-interface/range", "interface, range", invoke_virtual),

        plain(0x90, "add-int", "", |o, _| format!("v{} = v{} + v{};", o.a(), o.b(), o.aa())),
        plain(0x91, "sub-int", "", |o, _| format!("v{} = v{} - v{};", o.a(), o.b(), o.aa())),
        plain(0x92, "mul-int", "", |o, _| format!("v{} = v{} * v{};", o.a(), o.b(), o.aa())),
        plain(0x93, "div-int", "", |o, _| format!("v{} = v{} / v{};", o.a(), o.b(), o.aa())),
        plain(0x94, "rem-int", "", |o, _| format!("v{} = v{} % v{};", o.a(), o.b(), o.aa())),
        plain(0x95, "and-int", "", |o, _| format!("v{} = v{} & v{};", o.a(), o.b(), o.aa())),
        plain(0x96, "or-int", "", |o, _| format!("v{} = v{} | v{};", o.a(), o.b(), o.aa())),
        plain(0x97, "xor-int", "", |o, _| format!("v{} = v{} ^ v{};", o.a(), o.b(), o.aa())),
        plain(0x98, "shl-int", "", |o, _| format!("v{} = v{} << v{};", o.a(), o.b(), o.aa())),
        plain(0x99, "shr-int", "", |o, _| format!("v{} = v{} >> v{};", o.a(), o.b(), o.aa())),
        plain(0x9a, "ushr-int", "", |o, _| format!("v{} = v{} >>> v{};", o.a(), o.b(), o.aa())),

        plain(0xb0, "add-int/2addr", "", |o, _| format!("v{} += v{};", o.a(), o.b())),
        plain(0xb1, "sub-int/2addr", "", |o, _| format!("v{} -= v{};", o.a(), o.b())),
        plain(0xb2, "mul-int/2addr", "", |o, _| format!("v{} *= v{};", o.a(), o.b())),
        plain(0xb3, "div-int/2addr", "", |o, _| format!("v{} /= v{};", o.a(), o.b())),
        plain(0xb4, "rem-int/2addr", "", |o, _| format!("v{} %= v{};", o.a(), o.b())),
        plain(0xb5, "and-int/2addr", "", |o, _| format!("v{} &= v{};", o.a(), o.b())),
        plain(0xb6, "or-int/2addr", "", |o, _| format!("v{} |= v{};", o.a(), o.b())),
        plain(0xb7, "xor-int/2addr", "", |o, _| format!("v{} ^= v{};", o.a(), o.b())),
        plain(0xb8, "shl-int/2addr", "", |o, _| format!("v{} <<= v{};", o.a(), o.b())),
        plain(0xb9, "shr-int/2addr", "", |o, _| format!("v{} >>= v{};", o.a(), o.b())),
        plain(0xba, "ushr-int/2addr", "", |o, _| format!("v{} >>>= v{};", o.a(), o.b())),

        raw(0xd0, "add-int/lit16", "", |o, c| format!("v{} = v{} + {};", o.a(), o.b(), c.raw())),
        raw(0xd1, "rsub-int", "", |o, c| format!("v{} = {} - v{};", o.a(), c.raw(), o.b())),
        raw(0xd2, "mul-int/lit16", "", |o, c| format!("v{} = v{} * {};", o.a(), o.b(), c.raw())),
        raw(0xd3, "div-int/lit16", "", |o, c| format!("v{} = v{} / {};", o.a(), o.b(), c.raw())),
        raw(0xd4, "rem-int/lit16", "", |o, c| format!("v{} = v{} % {};", o.a(), o.b(), c.raw())),
        raw(0xd5, "and-int/lit16", "", |o, c| format!("v{} = v{} & {};", o.a(), o.b(), c.raw())),
        raw(0xd6, "or-int/lit16", "", |o, c| format!("v{} = v{} | {};", o.a(), o.b(), c.raw())),
        raw(0xd7, "xor-int/lit16", "", |o, c| format!("v{} = v{} ^ {};", o.a(), o.b(), c.raw())),
        raw(0xd8, "add-int/lit8", "", |o, c| format!("v{} = v{} + {};", o.a(), o.b(), c.raw())),
        raw(0xd9, "rsub-int/lit8", "", |o, c| format!("v{} = {} - v{};", o.a(), c.raw(), o.b())),
        raw(0xda, "mul-int/lit8", "", |o, c| format!("v{} = v{} * {};", o.a(), o.b(), c.raw())),
        raw(0xdb, "div-int/lit8", "", |o, c| format!("v{} = v{} / {};", o.a(), o.b(), c.raw())),
        raw(0xdc, "rem-int/lit8", "", |o, c| format!("v{} = v{} % {};", o.a(), o.b(), c.raw())),
        raw(0xdd, "and-int/lit8", "", |o, c| format!("v{} = v{} & {};", o.a(), o.b(), c.raw())),
        raw(0xde, "or-int/lit8", "", |o, c| format!("v{} = v{} | {};", o.a(), o.b(), c.raw())),
        raw(0xdf, "xor-int/lit8", "", |o, c| format!("v{} = v{} ^ {};", o.a(), o.b(), c.raw())),
        raw(0xe0, "shl-int/lit8", "", |o, c| format!("v{} = v{} << {};", o.a(), o.b(), c.raw())),
        raw(0xe1, "shr-int/lit8", "", |o, c| format!("v{} = v{} >> {};", o.a(), o.b(), c.raw())),
        raw(0xe2, "ushr-int/lit8", "", |o, c| format!("v{} = v{} >>> {};", o.a(), o.b(), c.raw())),
    ]
}
