/// Target registry
///
/// Every backend the tool knows about, in lookup order. Native targets write
/// objects and assembly for one architecture family; the `c` and `cpp`
/// targets write source code and are only reachable through `-march`.
use super::backend::{CodeGenFileKind, TargetBackend};
use super::machine::TargetMachine;
use super::{assembly, object_file, source};
use crate::config::{CodeModel, RelocModel};
use crate::error::{EmbedError, Result};
use crate::module::AssetModule;
use std::str::FromStr;
use target_lexicon::{
    Aarch64Architecture, Architecture, ArmArchitecture, BinaryFormat, Riscv32Architecture, Riscv64Architecture,
    Triple, X86_32Architecture,
};

const ALL_CODE_MODELS: &[CodeModel] = &[CodeModel::Small, CodeModel::Kernel, CodeModel::Medium, CodeModel::Large];
const COMMON_RELOC_MODELS: &[RelocModel] = &[RelocModel::Static, RelocModel::Pic, RelocModel::DynamicNoPic];
const ALL_RELOC_MODELS: &[RelocModel] = &[
    RelocModel::Static,
    RelocModel::Pic,
    RelocModel::DynamicNoPic,
    RelocModel::Ropi,
    RelocModel::Rwpi,
    RelocModel::RopiRwpi,
];

const X86_PROCESSORS: &[&str] = &[
    "generic", "i386", "i486", "i586", "pentium", "pentium4", "i686", "x86-64", "x86-64-v2", "x86-64-v3",
    "x86-64-v4", "core2", "nehalem", "westmere", "sandybridge", "ivybridge", "haswell", "broadwell", "skylake",
    "skylake-avx512", "icelake-client", "icelake-server", "alderlake", "sapphirerapids", "atom", "silvermont",
    "goldmont", "btver2", "znver1", "znver2", "znver3", "znver4",
];

const X86_FEATURES: &[&str] = &[
    "mmx", "cmov", "sse", "sse2", "sse3", "ssse3", "sse4.1", "sse4.2", "sse4a", "popcnt", "cx16", "avx", "avx2",
    "fma", "f16c", "bmi", "bmi2", "lzcnt", "movbe", "aes", "pclmul", "sha", "rdrnd", "rdseed", "adx", "xsave",
    "avx512f", "avx512bw", "avx512cd", "avx512dq", "avx512vl", "soft-float", "retpoline",
];

const AARCH64_PROCESSORS: &[&str] = &[
    "generic", "cortex-a53", "cortex-a55", "cortex-a57", "cortex-a72", "cortex-a76", "neoverse-n1", "neoverse-v1",
    "apple-m1", "apple-m2",
];

const AARCH64_FEATURES: &[&str] = &[
    "neon", "fp-armv8", "crypto", "aes", "sha2", "sha3", "crc", "lse", "rdm", "fullfp16", "dotprod", "sve", "sve2",
];

const ARM_PROCESSORS: &[&str] = &[
    "generic", "arm7tdmi", "cortex-m0", "cortex-m3", "cortex-m4", "cortex-m7", "cortex-a7", "cortex-a9",
    "cortex-a15",
];

const ARM_FEATURES: &[&str] = &[
    "thumb-mode", "thumb2", "vfp2", "vfp3", "vfp4", "neon", "d32", "fp16", "crc", "dsp", "strict-align",
    "read-tp-hard",
];

const RISCV_PROCESSORS: &[&str] = &[
    "generic", "generic-rv32", "generic-rv64", "rocket-rv32", "rocket-rv64", "sifive-e31", "sifive-u74",
];

const RISCV_FEATURES: &[&str] = &["m", "a", "f", "d", "c", "v", "e", "zicsr", "zifencei", "zba", "zbb", "relax"];

/// A backend producing objects and assembly for one architecture family.
pub struct NativeTarget {
    name: &'static str,
    description: &'static str,
    matches: fn(&Architecture) -> bool,
    canonical: fn() -> Architecture,
    processors: &'static [&'static str],
    features: &'static [&'static str],
    code_models: &'static [CodeModel],
    reloc_models: &'static [RelocModel],
}

impl TargetBackend for NativeTarget {
    fn name(&self) -> &'static str {
        self.name
    }

    fn description(&self) -> &'static str {
        self.description
    }

    fn matches_architecture(&self, arch: &Architecture) -> bool {
        (self.matches)(arch)
    }

    fn architecture(&self) -> Option<Architecture> {
        Some((self.canonical)())
    }

    fn processors(&self) -> &'static [&'static str] {
        self.processors
    }

    fn features(&self) -> &'static [&'static str] {
        self.features
    }

    fn check_options(
        &self,
        triple: &Triple,
        reloc_model: Option<RelocModel>,
        code_model: Option<CodeModel>,
    ) -> std::result::Result<(), String> {
        if !matches!(triple.binary_format, BinaryFormat::Elf | BinaryFormat::Coff | BinaryFormat::Macho) {
            return Err(format!(
                "target '{}' cannot produce {} objects for '{}'",
                self.name, triple.binary_format, triple
            ));
        }
        if let Some(model) = reloc_model {
            if !self.reloc_models.contains(&model) {
                return Err(format!("target '{}' does not support the {} relocation model", self.name, model));
            }
        }
        if let Some(model) = code_model {
            if !self.code_models.contains(&model) {
                return Err(format!("target '{}' does not support the {} code model", self.name, model));
            }
        }
        Ok(())
    }

    fn emit(&self, machine: &TargetMachine, module: &AssetModule, kind: CodeGenFileKind) -> Result<Vec<u8>> {
        match kind {
            CodeGenFileKind::Object => object_file::write_object(machine, module),
            CodeGenFileKind::Assembly => Ok(assembly::write_assembly(machine, module).into_bytes()),
            CodeGenFileKind::Null => {
                object_file::write_object(machine, module)?;
                Ok(Vec::new())
            }
        }
    }
}

/// A backend that writes the data object as C or C++ source.
pub struct SourceTarget {
    name: &'static str,
    description: &'static str,
    dialect: source::Dialect,
}

impl TargetBackend for SourceTarget {
    fn name(&self) -> &'static str {
        self.name
    }

    fn description(&self) -> &'static str {
        self.description
    }

    fn matches_architecture(&self, _arch: &Architecture) -> bool {
        false
    }

    fn architecture(&self) -> Option<Architecture> {
        None
    }

    fn processors(&self) -> &'static [&'static str] {
        &[]
    }

    fn features(&self) -> &'static [&'static str] {
        &[]
    }

    fn check_options(
        &self,
        _triple: &Triple,
        _reloc_model: Option<RelocModel>,
        _code_model: Option<CodeModel>,
    ) -> std::result::Result<(), String> {
        Ok(())
    }

    fn emit(&self, _machine: &TargetMachine, module: &AssetModule, kind: CodeGenFileKind) -> Result<Vec<u8>> {
        match kind {
            CodeGenFileKind::Assembly => Ok(source::write_source(self.dialect, module)?.into_bytes()),
            CodeGenFileKind::Object => Err(EmbedError::Emission(format!(
                "target '{}' does not support emission of object files",
                self.name
            ))),
            CodeGenFileKind::Null => Ok(Vec::new()),
        }
    }
}

static X86_64_TARGET: NativeTarget = NativeTarget {
    name: "x86-64",
    description: "64-bit X86: EM64T and AMD64",
    matches: |arch| matches!(arch, Architecture::X86_64),
    canonical: || Architecture::X86_64,
    processors: X86_PROCESSORS,
    features: X86_FEATURES,
    code_models: ALL_CODE_MODELS,
    reloc_models: COMMON_RELOC_MODELS,
};

static X86_TARGET: NativeTarget = NativeTarget {
    name: "x86",
    description: "32-bit X86: Pentium-Pro and above",
    matches: |arch| matches!(arch, Architecture::X86_32(_)),
    canonical: || Architecture::X86_32(X86_32Architecture::I686),
    processors: X86_PROCESSORS,
    features: X86_FEATURES,
    code_models: &[CodeModel::Small, CodeModel::Medium, CodeModel::Large],
    reloc_models: COMMON_RELOC_MODELS,
};

static AARCH64_TARGET: NativeTarget = NativeTarget {
    name: "aarch64",
    description: "AArch64 (little endian)",
    matches: |arch| matches!(arch, Architecture::Aarch64(_)),
    canonical: || Architecture::Aarch64(Aarch64Architecture::Aarch64),
    processors: AARCH64_PROCESSORS,
    features: AARCH64_FEATURES,
    code_models: &[CodeModel::Small, CodeModel::Large],
    reloc_models: COMMON_RELOC_MODELS,
};

static ARM_TARGET: NativeTarget = NativeTarget {
    name: "arm",
    description: "ARM",
    matches: |arch| matches!(arch, Architecture::Arm(_)),
    canonical: || Architecture::Arm(ArmArchitecture::Arm),
    processors: ARM_PROCESSORS,
    features: ARM_FEATURES,
    code_models: ALL_CODE_MODELS,
    reloc_models: ALL_RELOC_MODELS,
};

static RISCV32_TARGET: NativeTarget = NativeTarget {
    name: "riscv32",
    description: "32-bit RISC-V",
    matches: |arch| matches!(arch, Architecture::Riscv32(_)),
    canonical: || Architecture::Riscv32(Riscv32Architecture::Riscv32),
    processors: RISCV_PROCESSORS,
    features: RISCV_FEATURES,
    code_models: &[CodeModel::Small, CodeModel::Medium],
    reloc_models: COMMON_RELOC_MODELS,
};

static RISCV64_TARGET: NativeTarget = NativeTarget {
    name: "riscv64",
    description: "64-bit RISC-V",
    matches: |arch| matches!(arch, Architecture::Riscv64(_)),
    canonical: || Architecture::Riscv64(Riscv64Architecture::Riscv64),
    processors: RISCV_PROCESSORS,
    features: RISCV_FEATURES,
    code_models: &[CodeModel::Small, CodeModel::Medium],
    reloc_models: COMMON_RELOC_MODELS,
};

static C_TARGET: SourceTarget = SourceTarget {
    name: "c",
    description: "C source",
    dialect: source::Dialect::C,
};

static CPP_TARGET: SourceTarget = SourceTarget {
    name: "cpp",
    description: "C++ source",
    dialect: source::Dialect::Cpp,
};

/// Registered targets in lookup order.
pub static TARGETS: [&dyn TargetBackend; 8] = [
    &X86_64_TARGET,
    &X86_TARGET,
    &AARCH64_TARGET,
    &ARM_TARGET,
    &RISCV32_TARGET,
    &RISCV64_TARGET,
    &C_TARGET,
    &CPP_TARGET,
];

/// Find the backend for `march` (by name) or, when `march` is empty, for the
/// architecture of `triple`.
///
/// Returns the backend and the triple to build the machine for. Picking an
/// architecture backend by name switches the triple to that architecture.
pub fn lookup_target(march: &str, triple: &str) -> Result<(&'static dyn TargetBackend, Triple)> {
    let parsed = Triple::from_str(triple);

    if !march.is_empty() {
        let target = TARGETS
            .iter()
            .copied()
            .find(|target| target.name() == march)
            .ok_or_else(|| EmbedError::BackendLookup(format!("invalid target '{}'", march)))?;

        let mut resolved = match (parsed, target.architecture()) {
            (Ok(parsed), _) => parsed,
            (Err(_), None) => Triple::unknown(),
            (Err(err), Some(_)) => {
                return Err(EmbedError::BackendLookup(format!(
                    "unable to parse target triple '{}': {}",
                    triple, err
                )))
            }
        };
        if let Some(arch) = target.architecture() {
            resolved.architecture = arch;
        }
        return Ok((target, resolved));
    }

    let parsed = parsed.map_err(|err| {
        EmbedError::BackendLookup(format!("unable to parse target triple '{}': {}", triple, err))
    })?;
    match TARGETS.iter().copied().find(|target| target.matches_architecture(&parsed.architecture)) {
        Some(target) => Ok((target, parsed)),
        None => Err(EmbedError::BackendLookup(format!(
            "no available targets are compatible with triple \"{}\"",
            parsed
        ))),
    }
}

/// `--version` text listing the registered targets.
pub fn version_text() -> String {
    let width = TARGETS.iter().map(|target| target.name().len()).max().unwrap_or(0);
    let mut text = format!("{}\n\n  Registered Targets:\n", env!("CARGO_PKG_VERSION"));
    for target in TARGETS.iter() {
        text.push_str(&format!("    {:<width$} - {}\n", target.name(), target.description(), width = width));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_triple() {
        let (target, triple) = lookup_target("", "x86_64-unknown-linux-gnu").unwrap();
        assert_eq!(target.name(), "x86-64");
        assert_eq!(triple.to_string(), "x86_64-unknown-linux-gnu");

        let (target, _) = lookup_target("", "aarch64-apple-darwin").unwrap();
        assert_eq!(target.name(), "aarch64");

        let (target, _) = lookup_target("", "thumbv7em-none-eabihf").unwrap();
        assert_eq!(target.name(), "arm");

        let (target, _) = lookup_target("", "i686-pc-windows-msvc").unwrap();
        assert_eq!(target.name(), "x86");
    }

    #[test]
    fn test_unknown_march_fails() {
        let err = lookup_target("nonexistent", "x86_64-unknown-linux-gnu").err().unwrap();
        assert!(matches!(err, EmbedError::BackendLookup(_)));
        assert!(err.to_string().contains("invalid target 'nonexistent'"));
    }

    #[test]
    fn test_unsupported_architecture_fails() {
        let err = lookup_target("", "wasm32-unknown-unknown").err().unwrap();
        assert!(matches!(err, EmbedError::BackendLookup(_)));
        assert!(lookup_target("", "garbage").is_err());
    }

    #[test]
    fn test_march_switches_triple_architecture() {
        let (target, triple) = lookup_target("x86-64", "aarch64-unknown-linux-gnu").unwrap();
        assert_eq!(target.name(), "x86-64");
        assert_eq!(triple.to_string(), "x86_64-unknown-linux-gnu");
    }

    #[test]
    fn test_source_targets_only_by_name() {
        let (target, triple) = lookup_target("c", "garbage").unwrap();
        assert_eq!(target.name(), "c");
        assert_eq!(triple, Triple::unknown());

        let (target, triple) = lookup_target("cpp", "x86_64-unknown-linux-gnu").unwrap();
        assert_eq!(target.name(), "cpp");
        assert_eq!(triple.to_string(), "x86_64-unknown-linux-gnu");
    }

    #[test]
    fn test_ropi_is_arm_only() {
        let (arm, arm_triple) = lookup_target("", "armv7-unknown-linux-gnueabihf").unwrap();
        assert!(arm.check_options(&arm_triple, Some(RelocModel::Ropi), None).is_ok());

        let (x86, x86_triple) = lookup_target("", "x86_64-unknown-linux-gnu").unwrap();
        let err = x86.check_options(&x86_triple, Some(RelocModel::RopiRwpi), None).unwrap_err();
        assert!(err.contains("ropi-rwpi"));
    }

    #[test]
    fn test_object_format_must_be_supported() {
        let (target, triple) = lookup_target("x86-64", "wasm32-unknown-unknown").unwrap();
        assert!(target.check_options(&triple, None, None).is_err());
    }

    #[test]
    fn test_version_lists_targets() {
        let text = version_text();
        assert!(text.contains("Registered Targets:"));
        for target in TARGETS.iter() {
            assert!(text.contains(target.name()));
        }
    }
}
