/// Relocatable object emission
///
/// Writes the module's data object into an ELF, COFF or Mach-O object with
/// the `object` crate. The symbol is global, typed as data and sized to the
/// embedded buffer; no relocations are needed.
use super::machine::TargetMachine;
use crate::error::{EmbedError, Result};
use crate::module::{AssetModule, DataObject};
use object::write::{Mangling, Object, SectionId, StandardSection, Symbol, SymbolSection};
use object::{elf, Architecture, BinaryFormat, Endianness, SectionFlags, SectionKind, SymbolFlags, SymbolKind, SymbolScope};
use target_lexicon::Triple;

/// `SHF_X86_64_LARGE`: section may exceed 2 GiB from the code.
const SHF_X86_64_LARGE: u32 = 0x1000_0000;

/// Object file format for `triple`, if the object writer supports it.
pub fn object_format(triple: &Triple) -> Option<BinaryFormat> {
    match triple.binary_format {
        target_lexicon::BinaryFormat::Elf => Some(BinaryFormat::Elf),
        target_lexicon::BinaryFormat::Coff => Some(BinaryFormat::Coff),
        target_lexicon::BinaryFormat::Macho => Some(BinaryFormat::MachO),
        _ => None,
    }
}

pub fn object_architecture(triple: &Triple) -> Option<Architecture> {
    use target_lexicon::Architecture as Arch;

    match triple.architecture {
        Arch::X86_64 => Some(Architecture::X86_64),
        Arch::X86_32(_) => Some(Architecture::I386),
        Arch::Aarch64(_) => Some(Architecture::Aarch64),
        Arch::Arm(_) => Some(Architecture::Arm),
        Arch::Riscv32(_) => Some(Architecture::Riscv32),
        Arch::Riscv64(_) => Some(Architecture::Riscv64),
        _ => None,
    }
}

/// Prefix the platform adds to global symbol names (`_` on Mach-O and
/// 32-bit COFF).
pub fn global_prefix(triple: &Triple) -> Option<u8> {
    let format = object_format(triple)?;
    let architecture = object_architecture(triple)?;
    Mangling::default(format, architecture).global_prefix()
}

pub fn write_object(machine: &TargetMachine, module: &AssetModule) -> Result<Vec<u8>> {
    let triple = machine.triple();
    let format = object_format(triple)
        .ok_or_else(|| EmbedError::Emission(format!("no object file format for target triple '{}'", triple)))?;
    let architecture = object_architecture(triple)
        .ok_or_else(|| EmbedError::Emission(format!("unsupported object architecture '{}'", triple.architecture)))?;
    let endian = match triple.endianness() {
        Ok(target_lexicon::Endianness::Big) => Endianness::Big,
        _ => Endianness::Little,
    };

    let mut obj = Object::new(format, architecture, endian);

    if let Some(debug) = &module.debug {
        obj.add_file_symbol(debug.file_name.as_bytes().to_vec());
    }

    let data = &module.data;
    let section = data_section(&mut obj, machine, data);

    // Added undefined; `add_symbol_data` places it in `section`.
    let symbol_id = obj.add_symbol(Symbol {
        name: data.symbol.as_bytes().to_vec(),
        value: 0,
        size: 0,
        kind: SymbolKind::Data,
        scope: SymbolScope::Linkage,
        weak: false,
        section: SymbolSection::Undefined,
        flags: SymbolFlags::None,
    });
    obj.add_symbol_data(symbol_id, section, &data.bytes, data.align);

    if format == BinaryFormat::Elf {
        obj.add_section(Vec::new(), b".note.GNU-stack".to_vec(), SectionKind::Note);
    }

    obj.write()
        .map_err(|e| EmbedError::Emission(format!("failed to write object file: {}", e)))
}

fn data_section(obj: &mut Object, machine: &TargetMachine, data: &DataObject) -> SectionId {
    let data_sections = machine.options().data_sections;

    if machine.uses_large_data_section(data.size()) {
        let name = if data_sections {
            format!(".lrodata.{}", data.symbol)
        } else {
            ".lrodata".to_string()
        };
        let id = obj.add_section(Vec::new(), name.into_bytes(), SectionKind::ReadOnlyData);
        obj.section_mut(id).flags = SectionFlags::Elf {
            sh_flags: u64::from(elf::SHF_ALLOC | SHF_X86_64_LARGE),
        };
        return id;
    }

    if data_sections {
        obj.add_subsection(StandardSection::ReadOnlyData, data.symbol.as_bytes())
    } else {
        obj.section_id(StandardSection::ReadOnlyData)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::backend::{CodeGenOptLevel, TargetOptions};
    use crate::codegen::machine::create_target_machine;
    use crate::codegen::targets::lookup_target;
    use crate::config::CodeModel;
    use crate::module::{attach_debug_info, build_module};
    use object::read::{Object as _, ObjectSection as _, ObjectSymbol as _};

    fn machine(triple: &str, data_sections: bool, code_model: Option<CodeModel>) -> TargetMachine {
        let (target, triple) = lookup_target("", triple).unwrap();
        create_target_machine(
            target,
            triple,
            "",
            "",
            TargetOptions { data_sections },
            None,
            code_model,
            CodeGenOptLevel::None,
        )
        .unwrap()
    }

    /// (section name, symbol size, symbol bytes) for `symbol` in `bytes`.
    fn find_symbol(bytes: &[u8], symbol: &str) -> (String, u64, Vec<u8>) {
        let file = object::File::parse(bytes).unwrap();
        let sym = file.symbols().find(|s| s.name() == Ok(symbol)).expect("symbol present");
        let section = file.section_by_index(sym.section_index().unwrap()).unwrap();
        let data = section.data().unwrap();
        let start = (sym.address() - section.address()) as usize;
        let size = sym.size();
        (
            section.name().unwrap().to_string(),
            size,
            data[start..start + size as usize].to_vec(),
        )
    }

    #[test]
    fn test_elf_object_carries_symbol() {
        let (module, _) = build_module("blob.bin", "x86_64-unknown-linux-gnu", "blob_bin", b"hello", false);
        let bytes = write_object(&machine("x86_64-unknown-linux-gnu", false, None), &module).unwrap();

        let file = object::File::parse(&*bytes).unwrap();
        assert_eq!(file.format(), BinaryFormat::Elf);
        assert_eq!(file.architecture(), Architecture::X86_64);

        let (section, size, data) = find_symbol(&bytes, "blob_bin");
        assert_eq!(section, ".rodata");
        assert_eq!(size, 5);
        assert_eq!(data, b"hello");
    }

    #[test]
    fn test_null_terminated_symbol_size() {
        let (module, _) = build_module("blob.bin", "x86_64-unknown-linux-gnu", "blob_bin", b"hello", true);
        let bytes = write_object(&machine("x86_64-unknown-linux-gnu", false, None), &module).unwrap();

        let (_, size, data) = find_symbol(&bytes, "blob_bin");
        assert_eq!(size, 6);
        assert_eq!(data, b"hello\0");
    }

    #[test]
    fn test_data_sections_use_symbol_section() {
        let (module, _) = build_module("blob.bin", "x86_64-unknown-linux-gnu", "blob_bin", b"x", false);
        let bytes = write_object(&machine("x86_64-unknown-linux-gnu", true, None), &module).unwrap();
        let (section, _, _) = find_symbol(&bytes, "blob_bin");
        assert_eq!(section, ".rodata.blob_bin");
    }

    #[test]
    fn test_large_code_model_uses_lrodata() {
        let (module, _) = build_module("blob.bin", "x86_64-unknown-linux-gnu", "blob_bin", b"x", false);
        let bytes = write_object(&machine("x86_64-unknown-linux-gnu", false, Some(CodeModel::Large)), &module).unwrap();
        let (section, _, _) = find_symbol(&bytes, "blob_bin");
        assert_eq!(section, ".lrodata");

        let file = object::File::parse(&*bytes).unwrap();
        let lrodata = file.section_by_name(".lrodata").unwrap();
        match lrodata.flags() {
            SectionFlags::Elf { sh_flags } => {
                assert_eq!(sh_flags, u64::from(elf::SHF_ALLOC | SHF_X86_64_LARGE));
                assert_eq!(SHF_X86_64_LARGE, 0x1000_0000);
            }
            other => panic!("unexpected section flags {:?}", other),
        }
    }

    #[test]
    fn test_coff_object() {
        let (module, _) = build_module("blob.bin", "x86_64-pc-windows-msvc", "blob_bin", b"abc", false);
        let bytes = write_object(&machine("x86_64-pc-windows-msvc", false, None), &module).unwrap();
        let file = object::File::parse(&*bytes).unwrap();
        assert_eq!(file.format(), BinaryFormat::Coff);

        // COFF symbols carry no size; check the section contents instead.
        let sym = file.symbols().find(|s| s.name() == Ok("blob_bin")).unwrap();
        let section = file.section_by_index(sym.section_index().unwrap()).unwrap();
        assert_eq!(section.name(), Ok(".rdata"));
        assert!(section.data().unwrap().starts_with(b"abc"));
    }

    #[test]
    fn test_macho_symbol_is_mangled() {
        let (module, _) = build_module("blob.bin", "aarch64-apple-darwin", "blob_bin", b"abc", false);
        let bytes = write_object(&machine("aarch64-apple-darwin", false, None), &module).unwrap();
        let file = object::File::parse(&*bytes).unwrap();
        assert_eq!(file.format(), BinaryFormat::MachO);
        assert!(file.symbols().any(|s| s.name() == Ok("_blob_bin")));
    }

    #[test]
    fn test_debug_info_adds_file_symbol() {
        let (mut module, size) = build_module("dir/blob.bin", "x86_64-unknown-linux-gnu", "blob_bin", b"abc", false);
        attach_debug_info(&mut module, size);
        let bytes = write_object(&machine("x86_64-unknown-linux-gnu", false, None), &module).unwrap();
        let file = object::File::parse(&*bytes).unwrap();
        assert!(file
            .symbols()
            .any(|s| s.kind() == SymbolKind::File && s.name() == Ok("blob.bin")));
    }

    #[test]
    fn test_global_prefix() {
        use std::str::FromStr;
        let prefix = |t: &str| global_prefix(&Triple::from_str(t).unwrap());
        assert_eq!(prefix("x86_64-apple-darwin"), Some(b'_'));
        assert_eq!(prefix("i686-pc-windows-msvc"), Some(b'_'));
        assert_eq!(prefix("x86_64-pc-windows-msvc"), None);
        assert_eq!(prefix("x86_64-unknown-linux-gnu"), None);
    }
}
