use crate::dex::{DexErrorKind, DexFile, NO_INDEX};
use crate::tests::synthetic::DexBuilder;
use crate::types::{DecodeOptions, DecodedClass};
use crate::{disassemble, disassemble_all};

fn options() -> DecodeOptions
{
    DecodeOptions::default().with_string_workers(2)
}

/// Two classes with code, one without, touching every operand context.
fn sample_program() -> Vec<u8>
{
    let mut b = DexBuilder::new();
    b.string("LMain;")                 // 0
        .string("Ljava/lang/Object;")  // 1
        .string("hello")               // 2
        .string("I")                   // 3
        .string("counter")             // 4
        .string("println")             // 5
        .string("LAbstract;")          // 6
        .type_id(0).type_id(1).type_id(3).type_id(6)
        .field(0, 2, 4)
        .method(1, 0, 5)
        .class_with_code(0, 1, &[
            [0x1a, 0x02],  // const-string v2, "hello"
            [0x52, 0x00],  // iget v0, v0, counter
            [0x71, 0x00],  // invoke-static println
            [0x22, 0x01],  // new-instance v1, Object
            [0xd8, 0x21],  // add-int/lit8 v1, v2, 33
            [0xf4, 0x00],  // unassigned
            [0x0e, 0x00],  // return-void
        ])
        .class_def(3, 0x401, 1, NO_INDEX, 0)
        .class_with_code(1, NO_INDEX, &[[0x0e, 0x00]]);
    b.build()
}

#[test]
fn single_class_without_code()
{
    let mut b = DexBuilder::new();
    b.string("Test").type_id(0).class_def(0, 0, NO_INDEX, NO_INDEX, 0);
    let decoded = disassemble(&b.build(), &options()).unwrap();

    assert_eq!(decoded.classes, vec![DecodedClass {
        name: "Test".to_string(),
        superclass: None,
        source_file: None,
        lines: vec![],
    }]);
}

#[test]
fn return_void_body()
{
    let mut b = DexBuilder::new();
    b.string("LMain;").type_id(0).class_with_code(0, NO_INDEX, &[[0x0e, 0x00]]);
    let decoded = disassemble(&b.build(), &options()).unwrap();

    assert_eq!(decoded.classes.len(), 1);
    assert_eq!(decoded.classes[0].texts(), vec!["return;"]);
}

#[test]
fn renders_sample_program()
{
    let bytes = sample_program();
    let decoded = disassemble(&bytes, &options()).unwrap();
    assert_eq!(decoded.version, Some(35));

    let names: Vec<&str> = decoded.classes.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["LMain;", "LAbstract;", "Ljava/lang/Object;"]);

    let main = &decoded.classes[0];
    assert_eq!(main.superclass.as_deref(), Some("Ljava/lang/Object;"));
    assert_eq!(main.texts(), vec![
        "v2 = \"hello\";",
        "v0 = v0.counter;",
        "Ljava/lang/Object;.println(...);",
        "v1 = new Ljava/lang/Object;;",
        "v1 = v2 + 33;",
        "// Unknown opcode: 0xf4",
        "return;",
    ]);
    let offsets: Vec<u32> = main.lines.iter().map(|l| l.offset).collect();
    assert!(offsets.windows(2).all(|w| w[1] - w[0] == 2));

    assert!(decoded.classes[1].lines.is_empty());
    assert_eq!(decoded.classes[2].texts(), vec!["return;"]);
}

#[test]
fn tables_are_exposed()
{
    let bytes = sample_program();
    let dex = DexFile::from_bytes(&bytes).unwrap();
    assert_eq!(dex.strings.len(), 7);
    assert_eq!(dex.types.iter().collect::<Vec<_>>(), vec!["LMain;", "Ljava/lang/Object;", "I", "LAbstract;"]);
    assert_eq!(dex.fields[0].field_type, "I");
    assert_eq!(dex.methods[0].proto_idx, 0);
    assert!(dex.classes[1].access_flags.contains(crate::dex::AccessFlags::ABSTRACT));
}

#[test]
fn bad_magic_yields_no_classes()
{
    let mut bytes = sample_program();
    bytes[0] = b'D';
    let e = disassemble(&bytes, &options()).unwrap_err();
    assert_eq!(e.kind(), DexErrorKind::DexFormat);

    let report = disassemble_all(vec![("bad.dex".to_string(), bytes)], &options());
    assert!(report.decoded.is_empty());
    assert_eq!(report.class_count(), 0);
    assert_eq!(report.failures.len(), 1);
}

#[test]
fn batch_continues_past_failures()
{
    let mut truncated = sample_program();
    truncated.truncate(truncated.len() - 3);

    let report = disassemble_all(
        vec![
            ("classes.dex".to_string(), sample_program()),
            ("garbage.dex".to_string(), b"PK\x03\x04".to_vec()),
            ("truncated.dex".to_string(), truncated),
            ("classes2.dex".to_string(), sample_program()),
        ],
        &options(),
    );

    assert!(!report.is_clean());
    let ok: Vec<&str> = report.decoded.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ok, vec!["classes.dex", "classes2.dex"]);
    let failed: Vec<(&str, DexErrorKind)> = report.failures.iter().map(|(id, e)| (id.as_str(), e.kind())).collect();
    assert_eq!(failed, vec![
        ("garbage.dex", DexErrorKind::DexFormat),
        ("truncated.dex", DexErrorKind::BufferBounds),
    ]);
    assert_eq!(report.class_count(), 6);
}

#[test]
fn worker_count_does_not_change_output()
{
    let bytes = sample_program();
    let one = disassemble(&bytes, &DecodeOptions::default().with_string_workers(1)).unwrap();
    let zero = disassemble(&bytes, &DecodeOptions::default().with_string_workers(0)).unwrap();
    let many = disassemble(&bytes, &DecodeOptions::default().with_string_workers(8)).unwrap();
    assert_eq!(one, many);
    assert_eq!(one, zero);
}

#[test]
fn concurrent_decodes_match_sequential()
{
    let first = sample_program();
    let mut b = DexBuilder::new();
    b.string("LOther;").string("x").type_id(0)
        .class_with_code(0, NO_INDEX, &[[0x1a, 0x01], [0x0f, 0x00]]);
    let second = b.build();

    let expected = (
        disassemble(&first, &options()).unwrap(),
        disassemble(&second, &options()).unwrap(),
    );

    let got = std::thread::scope(|s| {
        let h1 = s.spawn(|| disassemble(&first, &options()).unwrap());
        let h2 = s.spawn(|| disassemble(&second, &options()).unwrap());
        (h1.join().unwrap(), h2.join().unwrap())
    });

    assert_eq!(got, expected);
    assert_eq!(got.1.classes[0].texts(), vec!["v1 = \"x\";", "return v0;"]);
}

#[test]
fn lossy_strings_do_not_fail_the_buffer()
{
    let mut b = DexBuilder::new();
    b.raw_string(&[0x4c, 0xC3, 0x28, 0x3b]).type_id(0).class_def(0, 0, NO_INDEX, NO_INDEX, 0);
    let decoded = disassemble(&b.build(), &options()).unwrap();
    assert_eq!(decoded.classes[0].name, "L\u{FFFD}(;");
}

#[test]
fn code_offset_past_end_fails_the_buffer()
{
    let mut b = DexBuilder::new();
    b.string("LMain;").type_id(0).class_def(0, 0, NO_INDEX, NO_INDEX, 0x10000);
    let e = disassemble(&b.build(), &options()).unwrap_err();
    assert_eq!(e.kind(), DexErrorKind::BufferBounds);
    assert!(e.to_string().contains("LMain;"));
}

#[test]
fn short_non_dex_buffer_is_a_format_error()
{
    let report = disassemble_all(
        vec![
            ("stub.dex".to_string(), b"PK\x03".to_vec()),
            ("empty.dex".to_string(), vec![]),
            ("classes.dex".to_string(), sample_program()),
        ],
        &options(),
    );
    let failed: Vec<(&str, DexErrorKind)> = report.failures.iter().map(|(id, e)| (id.as_str(), e.kind())).collect();
    assert_eq!(failed, vec![("stub.dex", DexErrorKind::DexFormat), ("empty.dex", DexErrorKind::DexFormat)]);
    assert_eq!(report.decoded.len(), 1);
}

#[test]
fn malformed_string_length_fails_only_its_buffer()
{
    let mut b = DexBuilder::new();
    b.string("LFoo;").type_id(0).class_def(0, 0, NO_INDEX, NO_INDEX, 0);
    let mut bytes = b.build();
    // string_ids[0] points at the length prefix; make it six bytes of continuation
    let at = u32::from_le_bytes([bytes[0x70], bytes[0x71], bytes[0x72], bytes[0x73]]) as usize;
    bytes[at..at + 6].copy_from_slice(&[0x80; 6]);

    let e = disassemble(&bytes, &options()).unwrap_err();
    assert_eq!(e.kind(), DexErrorKind::MalformedVarint);

    let report = disassemble_all(
        vec![("bad.dex".to_string(), bytes), ("good.dex".to_string(), sample_program())],
        &options(),
    );
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].1.kind(), DexErrorKind::MalformedVarint);
    assert_eq!(report.decoded[0].0, "good.dex");
    assert_eq!(report.class_count(), 3);
}

#[test]
fn method_with_unknown_class_is_unresolved()
{
    let mut b = DexBuilder::new();
    b.string("LFoo;").string("run").type_id(0).method(4, 0, 1);
    let e = disassemble(&b.build(), &options()).unwrap_err();
    assert_eq!(e.kind(), DexErrorKind::UnresolvedIndex);
    assert!(e.to_string().contains("method_id #0"));
}
