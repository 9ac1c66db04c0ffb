/// Architecture-agnostic target backend trait
///
/// A backend is looked up by name or by triple from the static registry in
/// `targets`, bound into a `TargetMachine` for one option tuple, and then
/// asked to render a module. Backends hold no per-module state.
use super::machine::TargetMachine;
use crate::config::{CodeModel, OutputKind, RelocModel};
use crate::error::Result;
use crate::module::AssetModule;
use target_lexicon::{Architecture, Triple};

/// File kinds a target backend can produce. The textual module form is not
/// one of them; it never reaches a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeGenFileKind {
    Assembly,
    Object,
    Null,
}

impl CodeGenFileKind {
    pub fn from_output_kind(kind: OutputKind) -> Self {
        match kind {
            OutputKind::Assembly => CodeGenFileKind::Assembly,
            OutputKind::Object => CodeGenFileKind::Object,
            OutputKind::Null => CodeGenFileKind::Null,
            OutputKind::Ir => unreachable!("textual module output is printed without a target backend"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TargetOptions {
    /// Place the data symbol in its own section.
    pub data_sections: bool,
}

/// Asset data needs no optimization; machines are always built unoptimized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeGenOptLevel {
    None,
}

/// High-level interface each target backend must implement.
pub trait TargetBackend: Sync {
    /// Registry name, as accepted by `-march`.
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Whether this backend generates code for `arch`. Source-emitting
    /// backends match no architecture and are only reachable by name.
    fn matches_architecture(&self, arch: &Architecture) -> bool;

    /// Architecture a triple is switched to when this backend is picked by
    /// name.
    fn architecture(&self) -> Option<Architecture>;

    fn processors(&self) -> &'static [&'static str];

    fn features(&self) -> &'static [&'static str];

    /// Reject option combinations this backend cannot honour.
    fn check_options(
        &self,
        triple: &Triple,
        reloc_model: Option<RelocModel>,
        code_model: Option<CodeModel>,
    ) -> std::result::Result<(), String>;

    /// Render `module` as `kind`. The whole artifact is produced in memory.
    fn emit(&self, machine: &TargetMachine, module: &AssetModule, kind: CodeGenFileKind) -> Result<Vec<u8>>;
}
