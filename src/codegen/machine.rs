/// Target machine: a backend bound to one triple / CPU / feature / model
/// tuple.
use super::backend::{CodeGenFileKind, CodeGenOptLevel, TargetBackend, TargetOptions};
use super::features::SubtargetFeatures;
use crate::config::{CodeModel, RelocModel};
use crate::error::{EmbedError, Result};
use crate::files;
use crate::module::AssetModule;
use target_lexicon::{Architecture, BinaryFormat, Triple};
use tracing::{debug, warn};

/// Data larger than this goes to `.lrodata` under the medium code model.
const LARGE_DATA_THRESHOLD: u64 = 65536;

pub struct TargetMachine {
    target: &'static dyn TargetBackend,
    triple: Triple,
    cpu: String,
    features: SubtargetFeatures,
    options: TargetOptions,
    reloc_model: RelocModel,
    code_model: CodeModel,
    opt_level: CodeGenOptLevel,
}

impl std::fmt::Debug for TargetMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetMachine")
            .field("target", &self.target.name())
            .field("triple", &self.triple.to_string())
            .field("cpu", &self.cpu)
            .field("features", &self.features.to_feature_string())
            .field("options", &self.options)
            .field("reloc_model", &self.reloc_model)
            .field("code_model", &self.code_model)
            .field("opt_level", &self.opt_level)
            .finish()
    }
}

/// Bind `target` to a concrete configuration.
///
/// `None` models select the backend's defaults. Unknown CPU or feature names
/// are reported and ignored; unsupported model combinations fail.
#[allow(clippy::too_many_arguments)]
pub fn create_target_machine(
    target: &'static dyn TargetBackend,
    triple: Triple,
    cpu: &str,
    features: &str,
    options: TargetOptions,
    reloc_model: Option<RelocModel>,
    code_model: Option<CodeModel>,
    opt_level: CodeGenOptLevel,
) -> Result<TargetMachine> {
    target
        .check_options(&triple, reloc_model, code_model)
        .map_err(EmbedError::BackendInstantiation)?;

    let processors = target.processors();
    if !cpu.is_empty() && !processors.is_empty() && !processors.contains(&cpu) {
        warn!("'{}' is not a recognized processor for this target (ignoring processor)", cpu);
    }

    let features = SubtargetFeatures::parse(features);
    let known = target.features();
    if !known.is_empty() {
        for (name, enable) in features.iter() {
            if !known.contains(&name) {
                let sign = if enable { '+' } else { '-' };
                warn!("'{}{}' is not a recognized feature for this target (ignoring feature)", sign, name);
            }
        }
    }

    let reloc_model = reloc_model.unwrap_or_else(|| default_reloc_model(&triple));
    let code_model = code_model.unwrap_or(CodeModel::Small);

    let machine = TargetMachine {
        target,
        triple,
        cpu: cpu.to_string(),
        features,
        options,
        reloc_model,
        code_model,
        opt_level,
    };
    debug!("created target machine {:?}", machine);
    Ok(machine)
}

/// Mach-O objects are position independent by default; everything else
/// starts static.
fn default_reloc_model(triple: &Triple) -> RelocModel {
    match triple.binary_format {
        BinaryFormat::Macho => RelocModel::Pic,
        _ => RelocModel::Static,
    }
}

impl TargetMachine {
    pub fn triple(&self) -> &Triple {
        &self.triple
    }

    pub fn cpu(&self) -> &str {
        &self.cpu
    }

    pub fn features(&self) -> &SubtargetFeatures {
        &self.features
    }

    pub fn options(&self) -> TargetOptions {
        self.options
    }

    #[cfg(test)]
    pub fn reloc_model(&self) -> RelocModel {
        self.reloc_model
    }

    #[cfg(test)]
    pub fn code_model(&self) -> CodeModel {
        self.code_model
    }

    /// Whether a data object of `size` bytes belongs in the x86-64 large
    /// data section.
    pub fn uses_large_data_section(&self, size: u64) -> bool {
        if self.triple.architecture != Architecture::X86_64 || self.triple.binary_format != BinaryFormat::Elf {
            return false;
        }
        match self.code_model {
            CodeModel::Large => true,
            CodeModel::Medium => size > LARGE_DATA_THRESHOLD,
            CodeModel::Small | CodeModel::Kernel => false,
        }
    }

    /// Render `module` and write it to `path` (`-` for stdout).
    ///
    /// The artifact is rendered before the destination is opened, so a
    /// backend failure leaves no partial file behind.
    pub fn write_to_file(&self, module: &AssetModule, path: &str, kind: CodeGenFileKind) -> Result<()> {
        let bytes = self.target.emit(self, module, kind)?;
        debug!("{} backend produced {} bytes", self.target.name(), bytes.len());
        files::write_output(path, &bytes)
    }
}
