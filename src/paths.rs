/// Output path and symbol name derivation
///
/// Both values may be given on the command line. When they are not, they
/// are derived from the input path the first time they are needed and then
/// cached in the configuration for the rest of the run.
use crate::config::{OutputKind, ResolvedConfig};
use crate::files::{is_stdio, STDIO_PATH};
use std::path::Path;
use target_lexicon::OperatingSystem;
use tracing::warn;

/// Symbol name used when reading from stdin without `-n`.
pub const STDIN_SYMBOL: &str = "stdin";

/// Linkage name for the embedded data.
///
/// An explicit non-empty name wins. Otherwise the input's file name is used
/// with every `.` replaced by `_`.
pub fn resolve_symbol_name(explicit: Option<&str>, input_path: &str) -> String {
    if let Some(name) = explicit.filter(|name| !name.is_empty()) {
        return name.to_string();
    }

    if is_stdio(input_path) {
        warn!("variable name not specified, and could not be guessed");
        return STDIN_SYMBOL.to_string();
    }

    let file_name = Path::new(input_path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| input_path.to_string());
    file_name.replace('.', "_")
}

/// Destination for the artifact.
///
/// An explicit non-empty path is used verbatim; stdin input writes to stdout;
/// otherwise a suffix chosen by output kind is appended to the input path.
pub fn resolve_output_path(
    explicit: Option<&str>,
    input_path: &str,
    kind: OutputKind,
    target_name: &str,
    target_os: &OperatingSystem,
) -> String {
    if let Some(path) = explicit.filter(|path| !path.is_empty()) {
        return path.to_string();
    }

    if is_stdio(input_path) {
        return STDIO_PATH.to_string();
    }

    let suffix = match kind {
        OutputKind::Object => {
            if *target_os == OperatingSystem::Windows {
                ".obj"
            } else {
                ".o"
            }
        }
        OutputKind::Null => ".null",
        OutputKind::Ir => ".ll",
        OutputKind::Assembly => assembly_suffix(target_name),
    };
    format!("{}{}", input_path, suffix)
}

/// Assembly suffix by backend name. The C backend is exactly `c`; C++
/// backends start with `cpp`. Only those two spellings are special.
fn assembly_suffix(target_name: &str) -> &'static str {
    match target_name.as_bytes() {
        [b'c'] => ".cbe.c",
        [b'c', b'p', b'p', ..] => ".cpp",
        _ => ".s",
    }
}

impl ResolvedConfig {
    /// Symbol name for this run, derived on first use.
    pub fn symbol_name(&mut self) -> &str {
        let input_path = &self.input_path;
        self.symbol
            .get_or_resolve(|user| resolve_symbol_name(user.map(String::as_str), input_path))
    }

    /// Output path for this run, derived on first use.
    pub fn output_path(&mut self, target_name: &str, target_os: &OperatingSystem) -> &str {
        let input_path = &self.input_path;
        let kind = self.output_kind;
        self.output.get_or_resolve(|user| {
            resolve_output_path(user.map(String::as_str), input_path, kind, target_name, target_os)
        })
    }
}
