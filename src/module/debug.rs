/// Debug metadata for the embedded asset
///
/// Records where the payload came from and how large it is. Each output
/// form renders it in its own way: DWARF-style metadata nodes in the
/// textual module, a `.file` directive in assembly, a file symbol in
/// objects.
use super::AssetModule;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugInfo {
    pub producer: String,
    pub file_name: String,
    pub directory: String,
    /// Size of the embedded buffer in bytes.
    pub size: u64,
}

impl DebugInfo {
    pub fn size_in_bits(&self) -> u64 {
        self.size * 8
    }
}

/// Attach source/size debug metadata to `module`.
pub fn attach_debug_info(module: &mut AssetModule, buffer_size: u64) {
    let (file_name, directory) = split_source_path(&module.source_file_name);
    module.debug = Some(DebugInfo {
        producer: format!("binasset {}", env!("CARGO_PKG_VERSION")),
        file_name,
        directory,
        size: buffer_size,
    });
}

fn split_source_path(source: &str) -> (String, String) {
    if source == "-" {
        return ("<stdin>".to_string(), ".".to_string());
    }

    let path = Path::new(source);
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.to_string());
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_string_lossy().into_owned(),
        _ => ".".to_string(),
    };
    (file_name, directory)
}
