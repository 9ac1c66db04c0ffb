/// GNU assembler output
///
/// Produces the same layout as the object writer: one global data symbol in
/// a read-only section, with directives spelled for the triple's object
/// format. ARM-family assemblers treat `@` as a comment, so type operands
/// use `%` there.
use super::machine::TargetMachine;
use super::object_file::global_prefix;
use crate::module::AssetModule;
use std::fmt::Write;
use target_lexicon::{Architecture, BinaryFormat, Triple};

const BYTES_PER_LINE: usize = 32;

fn comment_prefix(triple: &Triple) -> &'static str {
    match triple.architecture {
        Architecture::Arm(_) => "@",
        Architecture::Aarch64(_) => "//",
        _ => "#",
    }
}

fn type_prefix(triple: &Triple) -> char {
    match triple.architecture {
        Architecture::Arm(_) => '%',
        _ => '@',
    }
}

pub fn write_assembly(machine: &TargetMachine, module: &AssetModule) -> String {
    let triple = machine.triple();
    let data = &module.data;
    let comment = comment_prefix(triple);
    let at = type_prefix(triple);
    let data_sections = machine.options().data_sections;

    let mut mangled = String::new();
    if let Some(prefix) = global_prefix(triple) {
        mangled.push(prefix as char);
    }
    mangled.push_str(&data.symbol);
    let symbol = quote_if_needed(&mangled);

    let mut out = String::new();
    let _ = writeln!(out, "\t{} {} for {}", comment, module.id, triple);
    if !machine.cpu().is_empty() {
        let _ = writeln!(out, "\t{} cpu: {}", comment, machine.cpu());
    }
    if !machine.features().is_empty() {
        let _ = writeln!(out, "\t{} features: {}", comment, machine.features().to_feature_string());
    }
    out.push_str("\t.text\n");
    if let Some(debug) = &module.debug {
        let _ = writeln!(out, "\t.file\t\"{}\"", escape_ascii(debug.file_name.as_bytes()));
    }

    match triple.binary_format {
        BinaryFormat::Macho => {
            out.push_str("\t.section\t__TEXT,__const\n");
        }
        BinaryFormat::Coff => {
            if data_sections {
                let name = quote_if_needed(&format!(".rdata${}", data.symbol));
                let _ = writeln!(out, "\t.section\t{},\"dr\"", name);
            } else {
                out.push_str("\t.section\t.rdata,\"dr\"\n");
            }
        }
        _ => {
            let large = machine.uses_large_data_section(data.size());
            let base = if large { ".lrodata" } else { ".rodata" };
            let flags = if large { "al" } else { "a" };
            if data_sections {
                let name = quote_if_needed(&format!("{}.{}", base, data.symbol));
                let _ = writeln!(out, "\t.section\t{},\"{}\",{}progbits", name, flags, at);
            } else {
                let _ = writeln!(out, "\t.section\t{},\"{}\",{}progbits", base, flags, at);
            }
        }
    }

    let elf = !matches!(triple.binary_format, BinaryFormat::Macho | BinaryFormat::Coff);

    let _ = writeln!(out, "\t.globl\t{}", symbol);
    if elf {
        let _ = writeln!(out, "\t.type\t{},{}object", symbol, at);
    }
    let _ = writeln!(out, "{}:", symbol);
    for chunk in data.bytes.chunks(BYTES_PER_LINE) {
        let _ = writeln!(out, "\t.ascii\t\"{}\"", escape_ascii(chunk));
    }
    if elf {
        let _ = writeln!(out, "\t.size\t{}, {}", symbol, data.size());
        let _ = writeln!(out, "\t.section\t\".note.GNU-stack\",\"\",{}progbits", at);
    }
    if triple.binary_format == BinaryFormat::Macho {
        out.push_str(".subsections_via_symbols\n");
    }

    out
}

/// Names the assembler accepts bare are `[A-Za-z_.$][A-Za-z0-9_.$]*`;
/// anything else is written as a quoted string.
fn quote_if_needed(name: &str) -> String {
    let is_plain_char = |b: u8| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'$');
    let plain = match name.as_bytes() {
        [first, rest @ ..] => {
            !first.is_ascii_digit() && is_plain_char(*first) && rest.iter().all(|&b| is_plain_char(b))
        }
        [] => false,
    };
    if plain {
        name.to_string()
    } else {
        format!("\"{}\"", escape_ascii(name.as_bytes()))
    }
}

/// Escape bytes for an `.ascii` string: printable characters stay, quotes,
/// backslashes and everything else become three-digit octal escapes.
fn escape_ascii(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &byte in bytes {
        if (0x20..0x7f).contains(&byte) && byte != b'"' && byte != b'\\' {
            out.push(byte as char);
        } else {
            let _ = write!(out, "\\{:03o}", byte);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::backend::{CodeGenOptLevel, TargetOptions};
    use crate::codegen::machine::create_target_machine;
    use crate::codegen::targets::lookup_target;
    use crate::module::{attach_debug_info, build_module};

    fn assemble(triple: &str, data_sections: bool, payload: &[u8]) -> String {
        let (target, parsed) = lookup_target("", triple).unwrap();
        let machine = create_target_machine(
            target,
            parsed,
            "",
            "",
            TargetOptions { data_sections },
            None,
            None,
            CodeGenOptLevel::None,
        )
        .unwrap();
        let (module, _) = build_module("a.bin", triple, "a_bin", payload, false);
        write_assembly(&machine, &module)
    }

    #[test]
    fn test_elf_assembly() {
        let text = assemble("x86_64-unknown-linux-gnu", false, b"hi\n\"");
        assert!(text.contains("\t.section\t.rodata,\"a\",@progbits\n"));
        assert!(text.contains("\t.globl\ta_bin\n"));
        assert!(text.contains("\t.type\ta_bin,@object\n"));
        assert!(text.contains("a_bin:\n\t.ascii\t\"hi\\012\\042\"\n"));
        assert!(text.contains("\t.size\ta_bin, 4\n"));
    }

    #[test]
    fn test_arm_uses_percent_types() {
        let text = assemble("armv7-unknown-linux-gnueabihf", true, b"x");
        assert!(text.starts_with("\t@ binasset for"));
        assert!(text.contains("\t.section\t.rodata.a_bin,\"a\",%progbits\n"));
        assert!(text.contains("\t.type\ta_bin,%object\n"));
    }

    #[test]
    fn test_macho_assembly() {
        let text = assemble("aarch64-apple-darwin", false, b"x");
        assert!(text.contains("\t.section\t__TEXT,__const\n"));
        assert!(text.contains("\t.globl\t_a_bin\n_a_bin:\n"));
        assert!(!text.contains(".size"));
        assert!(text.ends_with(".subsections_via_symbols\n"));
    }

    #[test]
    fn test_coff_assembly() {
        let text = assemble("x86_64-pc-windows-msvc", true, b"x");
        assert!(text.contains("\t.section\t.rdata$a_bin,\"dr\"\n"));
        assert!(!text.contains(".type"));
    }

    fn assemble_named(triple: &str, data_sections: bool, source: &str, symbol: &str) -> String {
        let (target, parsed) = lookup_target("", triple).unwrap();
        let machine = create_target_machine(
            target,
            parsed,
            "",
            "",
            TargetOptions { data_sections },
            None,
            None,
            CodeGenOptLevel::None,
        )
        .unwrap();
        let (module, _) = build_module(source, triple, symbol, b"x", false);
        write_assembly(&machine, &module)
    }

    #[test]
    fn test_symbols_outside_identifier_set_are_quoted() {
        let text = assemble_named("x86_64-unknown-linux-gnu", false, "assets/my-font.ttf", "my-font_ttf");
        assert!(text.contains("\t.globl\t\"my-font_ttf\"\n"));
        assert!(text.contains("\t.type\t\"my-font_ttf\",@object\n"));
        assert!(text.contains("\n\"my-font_ttf\":\n"));
        assert!(text.contains("\t.size\t\"my-font_ttf\", 1\n"));

        let text = assemble_named("x86_64-unknown-linux-gnu", true, "2x.png", "2x_png");
        assert!(text.contains("\t.globl\t\"2x_png\"\n"));
        assert!(text.contains("\t.section\t.rodata.2x_png,\"a\",@progbits\n"));

        let text = assemble_named("x86_64-unknown-linux-gnu", true, "my-font.ttf", "my-font_ttf");
        assert!(text.contains("\t.section\t\".rodata.my-font_ttf\",\"a\",@progbits\n"));
    }

    #[test]
    fn test_mangled_symbol_is_quoted_whole() {
        let text = assemble_named("x86_64-apple-darwin", false, "my-font.ttf", "my-font_ttf");
        assert!(text.contains("\t.globl\t\"_my-font_ttf\"\n\"_my-font_ttf\":\n"));
    }

    #[test]
    fn test_plain_symbols_stay_bare() {
        assert_eq!(quote_if_needed("font_ttf"), "font_ttf");
        assert_eq!(quote_if_needed("_start.$1"), "_start.$1");
        assert_eq!(quote_if_needed(".rodata.2x_png"), ".rodata.2x_png");
        assert_eq!(quote_if_needed("2x_png"), "\"2x_png\"");
        assert_eq!(quote_if_needed("a b"), "\"a b\"");
    }

    #[test]
    fn test_long_payload_is_split() {
        let payload = vec![b'a'; BYTES_PER_LINE * 2 + 1];
        let text = assemble("x86_64-unknown-linux-gnu", false, &payload);
        assert_eq!(text.matches("\t.ascii\t").count(), 3);
    }

    #[test]
    fn test_debug_file_directive() {
        let (target, parsed) = lookup_target("", "x86_64-unknown-linux-gnu").unwrap();
        let machine = create_target_machine(
            target,
            parsed,
            "x86-64",
            "+sse2",
            TargetOptions::default(),
            None,
            None,
            CodeGenOptLevel::None,
        )
        .unwrap();
        let (mut module, size) = build_module("in/a.bin", "x86_64-unknown-linux-gnu", "a_bin", b"x", false);
        attach_debug_info(&mut module, size);
        let text = write_assembly(&machine, &module);
        assert!(text.contains("\t.file\t\"a.bin\"\n"));
        assert!(text.contains("\t# cpu: x86-64\n"));
        assert!(text.contains("\t# features: +sse2\n"));
    }
}
