/// Resolved code-generation configuration
///
/// `ResolvedConfig` is built once from the command line and threaded through
/// the pipeline by reference. Only the output path and the symbol name are
/// filled in later, each through a `Resolvable` slot that is written at most
/// once.
use clap::ValueEnum;
use std::fmt;

/// Kind of artifact to produce. Selects both the file suffix and the
/// emission branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputKind {
    /// Emit an assembly ('.s') file
    #[value(name = "asm")]
    Assembly,
    /// Emit a native object ('.o') file
    #[default]
    #[value(name = "obj")]
    Object,
    /// Emit nothing, for performance testing
    #[value(name = "null")]
    Null,
    /// Emit a textual module ('.ll') file
    #[value(name = "ir")]
    Ir,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RelocModel {
    /// Non-relocatable code
    #[value(name = "static")]
    Static,
    /// Fully relocatable, position independent code
    #[value(name = "pic")]
    Pic,
    /// Relocatable external references, non-relocatable code
    #[value(name = "dynamic-no-pic")]
    DynamicNoPic,
    /// Code and read-only data relocatable, accessed PC-relative
    #[value(name = "ropi")]
    Ropi,
    /// Read-write data relocatable, accessed relative to static base
    #[value(name = "rwpi")]
    Rwpi,
    /// Combination of ropi and rwpi
    #[value(name = "ropi-rwpi")]
    RopiRwpi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CodeModel {
    #[value(name = "small")]
    Small,
    #[value(name = "kernel")]
    Kernel,
    #[value(name = "medium")]
    Medium,
    #[value(name = "large")]
    Large,
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputKind::Assembly => "asm",
            OutputKind::Object => "obj",
            OutputKind::Null => "null",
            OutputKind::Ir => "ir",
        };
        f.write_str(name)
    }
}

impl fmt::Display for RelocModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RelocModel::Static => "static",
            RelocModel::Pic => "pic",
            RelocModel::DynamicNoPic => "dynamic-no-pic",
            RelocModel::Ropi => "ropi",
            RelocModel::Rwpi => "rwpi",
            RelocModel::RopiRwpi => "ropi-rwpi",
        };
        f.write_str(name)
    }
}

impl fmt::Display for CodeModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CodeModel::Small => "small",
            CodeModel::Kernel => "kernel",
            CodeModel::Medium => "medium",
            CodeModel::Large => "large",
        };
        f.write_str(name)
    }
}

/// A value the user may supply, or that the pipeline computes once.
///
/// `user` records what was on the command line; `resolved` caches the value
/// actually used. Keeping them apart means "did the user ask for this" stays
/// answerable after the value has been derived.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolvable<T> {
    user: Option<T>,
    resolved: Option<T>,
}

impl<T> Resolvable<T> {
    pub fn new(user: Option<T>) -> Self {
        Self {
            user,
            resolved: None,
        }
    }

    #[cfg(test)]
    pub fn user(&self) -> Option<&T> {
        self.user.as_ref()
    }

    #[cfg(test)]
    pub fn resolved(&self) -> Option<&T> {
        self.resolved.as_ref()
    }

    /// Returns the cached value, computing it from the user value on first use.
    pub fn get_or_resolve(&mut self, resolve: impl FnOnce(Option<&T>) -> T) -> &T {
        let user = self.user.as_ref();
        self.resolved.get_or_insert_with(|| resolve(user))
    }
}

/// Fully resolved configuration for one run.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub input_path: String,
    pub output: Resolvable<String>,
    pub symbol: Resolvable<String>,
    pub null_terminate: bool,
    pub emit_debug_info: bool,
    pub triple: String,
    pub march: String,
    pub cpu: String,
    pub features: String,
    /// Raw `-mattr` tokens in command-line order.
    pub attribute_overrides: Vec<String>,
    pub reloc_model: Option<RelocModel>,
    pub code_model: Option<CodeModel>,
    pub output_kind: OutputKind,
    pub data_sections: bool,
}

impl ResolvedConfig {
    /// Configuration with host defaults for `input_path`, as if no other
    /// flag had been given.
    #[cfg(test)]
    pub fn for_input(input_path: &str) -> Self {
        Self {
            input_path: input_path.to_string(),
            output: Resolvable::new(None),
            symbol: Resolvable::new(None),
            null_terminate: false,
            emit_debug_info: false,
            triple: crate::codegen::triple::default_target_triple(),
            march: String::new(),
            cpu: String::new(),
            features: String::new(),
            attribute_overrides: Vec::new(),
            reloc_model: None,
            code_model: None,
            output_kind: OutputKind::default(),
            data_sections: false,
        }
    }
}
