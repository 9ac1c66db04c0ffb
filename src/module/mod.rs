/// In-memory asset module
///
/// An `AssetModule` holds exactly one named, constant data object together
/// with the target triple and source file name it was built for. It is built
/// once, optionally gains debug metadata, and is then handed by reference to
/// a single consumer: the textual printer or a target machine.
///
/// Submodules:
/// - `debug`: source/size debug metadata
/// - `printer`: textual module form used by `-filetype=ir`
pub mod debug;
pub mod printer;

pub use debug::{attach_debug_info, DebugInfo};
pub use printer::print_module;

/// Identifier recorded in every module.
pub const MODULE_ID: &str = "binasset";

/// The single data symbol carried by a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataObject {
    pub symbol: String,
    pub bytes: Vec<u8>,
    pub align: u64,
}

impl DataObject {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetModule {
    pub id: String,
    pub source_file_name: String,
    pub target_triple: String,
    pub data: DataObject,
    pub debug: Option<DebugInfo>,
}

/// Build a module embedding `payload` under `symbol`.
///
/// Returns the module and the embedded buffer size, which includes the
/// terminator when `null_terminate` is set.
pub fn build_module(
    source_file_name: &str,
    target_triple: &str,
    symbol: &str,
    payload: &[u8],
    null_terminate: bool,
) -> (AssetModule, u64) {
    let mut bytes = Vec::with_capacity(payload.len() + usize::from(null_terminate));
    bytes.extend_from_slice(payload);
    if null_terminate {
        bytes.push(0);
    }

    let data = DataObject {
        symbol: symbol.to_string(),
        bytes,
        align: 1,
    };
    let size = data.size();

    let module = AssetModule {
        id: MODULE_ID.to_string(),
        source_file_name: source_file_name.to_string(),
        target_triple: target_triple.to_string(),
        data,
        debug: None,
    };
    (module, size)
}
