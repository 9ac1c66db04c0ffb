/// C and C++ source output for the `c` and `cpp` targets.
use crate::error::{EmbedError, Result};
use crate::module::AssetModule;
use std::fmt::Write;

const BYTES_PER_LINE: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    C,
    Cpp,
}

fn is_c_identifier(name: &str) -> bool {
    let mut bytes = name.bytes();
    match bytes.next() {
        Some(first) if first.is_ascii_alphabetic() || first == b'_' => {
            bytes.all(|b| b.is_ascii_alphanumeric() || b == b'_')
        }
        _ => false,
    }
}

pub fn write_source(dialect: Dialect, module: &AssetModule) -> Result<String> {
    let data = &module.data;
    if !is_c_identifier(&data.symbol) {
        return Err(EmbedError::Emission(format!(
            "symbol name '{}' is not a valid C identifier",
            data.symbol
        )));
    }
    // C has no zero-length arrays.
    if data.bytes.is_empty() {
        return Err(EmbedError::Emission(format!(
            "cannot emit an empty array for '{}' as source",
            data.symbol
        )));
    }

    let mut out = String::new();
    let _ = writeln!(out, "/* {} from {} */", module.id, module.source_file_name.replace("*/", "* /"));
    if let Some(debug) = &module.debug {
        let _ = writeln!(out, "#line 1 \"{}\"", debug.file_name.replace('\\', "\\\\").replace('"', "\\\""));
    }
    let linkage = match dialect {
        Dialect::C => "",
        Dialect::Cpp => "extern \"C\" ",
    };
    let _ = writeln!(out, "{}const unsigned char {}[{}] = {{", linkage, data.symbol, data.bytes.len());
    for chunk in data.bytes.chunks(BYTES_PER_LINE) {
        let line: Vec<String> = chunk.iter().map(|b| format!("0x{:02x}", b)).collect();
        let _ = writeln!(out, "\t{},", line.join(", "));
    }
    out.push_str("};\n");
    Ok(out)
}
