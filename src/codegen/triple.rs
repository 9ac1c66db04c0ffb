/// Target triple handling and target configuration defaults
///
/// Triples are normalized through `target-lexicon`, which parses the loose
/// `arch-vendor-os-env` syntax and prints it back in canonical form. Strings
/// it cannot parse are kept as written; the backend lookup reports them.
use crate::config::{CodeModel, OutputKind, RelocModel};
use std::str::FromStr;
use target_lexicon::{OperatingSystem, Triple, HOST};

/// The triple used when `-mtriple` is not given.
pub fn default_target_triple() -> String {
    HOST.to_string()
}

/// Normalize a triple to canonical form.
///
/// Normalizing an already normalized triple returns it unchanged.
pub fn normalize_triple(triple: &str) -> String {
    let trimmed = triple.trim();
    match Triple::from_str(trimmed) {
        Ok(parsed) => parsed.to_string(),
        Err(_) => trimmed.to_string(),
    }
}

/// Operating system named by `triple`, `Unknown` when it does not parse.
pub fn target_os(triple: &str) -> OperatingSystem {
    Triple::from_str(triple)
        .map(|parsed| parsed.operating_system)
        .unwrap_or(OperatingSystem::Unknown)
}

/// Target-level settings derived from the command line.
///
/// Relocation and code models stay `None` unless the flag was given, so the
/// backend can still pick its own default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetConfig {
    pub triple: String,
    pub reloc_model: Option<RelocModel>,
    pub code_model: Option<CodeModel>,
    pub output_kind: OutputKind,
}

impl TargetConfig {
    pub fn resolve(
        explicit_triple: &str,
        explicit_reloc: Option<RelocModel>,
        explicit_code_model: Option<CodeModel>,
        explicit_file_type: Option<OutputKind>,
    ) -> Self {
        let triple = if explicit_triple.trim().is_empty() {
            default_target_triple()
        } else {
            normalize_triple(explicit_triple)
        };

        Self {
            triple,
            reloc_model: explicit_reloc,
            code_model: explicit_code_model,
            output_kind: explicit_file_type.unwrap_or_default(),
        }
    }
}
