/// Textual module printer
///
/// Renders a module in LLVM assembly syntax: a header with the source file
/// name and triple, one constant byte-array global, and, when debug info is
/// attached, the metadata nodes describing it.
use super::AssetModule;
use std::fmt::Write;

pub fn print_module(module: &AssetModule) -> String {
    let mut out = String::new();
    let data = &module.data;
    let global = global_name(&data.symbol);

    let _ = writeln!(out, "; ModuleID = '{}'", module.id);
    let _ = writeln!(out, "source_filename = \"{}\"", escape_string(module.source_file_name.as_bytes()));
    let _ = writeln!(out, "target triple = \"{}\"", escape_string(module.target_triple.as_bytes()));
    out.push('\n');

    let _ = write!(
        out,
        "{} = constant [{} x i8] c\"{}\", align {}",
        global,
        data.bytes.len(),
        escape_string(&data.bytes),
        data.align
    );

    let Some(debug) = &module.debug else {
        out.push('\n');
        return out;
    };
    out.push_str(", !dbg !3\n\n");

    let _ = writeln!(out, "!llvm.dbg.cu = !{{!0}}");
    let _ = writeln!(out, "!llvm.module.flags = !{{!7, !8}}");
    out.push('\n');
    let _ = writeln!(
        out,
        "!0 = distinct !DICompileUnit(language: DW_LANG_C99, file: !1, producer: \"{}\", isOptimized: false, runtimeVersion: 0, emissionKind: FullDebug, globals: !2)",
        escape_string(debug.producer.as_bytes())
    );
    let _ = writeln!(
        out,
        "!1 = !DIFile(filename: \"{}\", directory: \"{}\")",
        escape_string(debug.file_name.as_bytes()),
        escape_string(debug.directory.as_bytes())
    );
    let _ = writeln!(out, "!2 = !{{!3}}");
    let _ = writeln!(out, "!3 = !DIGlobalVariableExpression(var: !4, expr: !DIExpression())");
    let _ = writeln!(
        out,
        "!4 = distinct !DIGlobalVariable(name: \"{}\", scope: !0, file: !1, type: !5, isLocal: false, isDefinition: true)",
        escape_string(data.symbol.as_bytes())
    );
    let _ = writeln!(
        out,
        "!5 = !DICompositeType(tag: DW_TAG_array_type, baseType: !6, size: {}, elements: !9)",
        debug.size_in_bits()
    );
    let _ = writeln!(out, "!6 = !DIBasicType(name: \"unsigned char\", size: 8, encoding: DW_ATE_unsigned_char)");
    let _ = writeln!(out, "!7 = !{{i32 7, !\"Dwarf Version\", i32 4}}");
    let _ = writeln!(out, "!8 = !{{i32 2, !\"Debug Info Version\", i32 3}}");
    let _ = writeln!(out, "!9 = !{{!10}}");
    let _ = writeln!(out, "!10 = !DISubrange(count: {})", debug.size);

    out
}

/// `@name`, quoted when the name is not a plain identifier.
fn global_name(symbol: &str) -> String {
    let plain = !symbol.is_empty()
        && symbol
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'$' | b'.' | b'_'))
        && !symbol.as_bytes()[0].is_ascii_digit();

    if plain {
        format!("@{}", symbol)
    } else {
        format!("@\"{}\"", escape_string(symbol.as_bytes()))
    }
}

/// Printable ASCII stays as is; quotes, backslashes and everything else
/// become `\XX`.
fn escape_string(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &byte in bytes {
        if (0x20..0x7f).contains(&byte) && byte != b'"' && byte != b'\\' {
            out.push(byte as char);
        } else {
            let _ = write!(out, "\\{:02X}", byte);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{attach_debug_info, build_module};

    #[test]
    fn test_print_plain_module() {
        let (module, _) = build_module("font.bin", "x86_64-unknown-linux-gnu", "font_bin", b"ab\"\n", false);
        let text = print_module(&module);
        assert_eq!(
            text,
            "; ModuleID = 'binasset'\n\
             source_filename = \"font.bin\"\n\
             target triple = \"x86_64-unknown-linux-gnu\"\n\
             \n\
             @font_bin = constant [4 x i8] c\"ab\\22\\0A\", align 1\n"
        );
    }

    #[test]
    fn test_print_with_debug_info() {
        let (mut module, size) = build_module("font.bin", "x86_64-unknown-linux-gnu", "font_bin", b"abc", true);
        attach_debug_info(&mut module, size);
        let text = print_module(&module);

        assert!(text.contains("@font_bin = constant [4 x i8] c\"abc\\00\", align 1, !dbg !3\n"));
        assert!(text.contains("!DIFile(filename: \"font.bin\", directory: \".\")"));
        assert!(text.contains("size: 32, elements: !9"));
        assert!(text.contains("!10 = !DISubrange(count: 4)"));
    }

    #[test]
    fn test_global_name_quoting() {
        assert_eq!(global_name("font_bin"), "@font_bin");
        assert_eq!(global_name("9lives"), "@\"9lives\"");
        assert_eq!(global_name("has space"), "@\"has space\"");
    }
}
