/// Input and output files
///
/// `-` names standard input for reading and standard output for writing.
/// Regular input files are memory-mapped; output is written in one piece
/// from a fully rendered buffer.
use crate::error::{EmbedError, Result};
use memmap2::Mmap;
use std::fs::File;
use std::io::{self, Read, Write};
use std::ops::Deref;

/// Path value meaning stdin (as input) or stdout (as output).
pub const STDIO_PATH: &str = "-";

pub fn is_stdio(path: &str) -> bool {
    path == STDIO_PATH
}

/// Contents of the input file.
pub enum InputBuffer {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl Deref for InputBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            InputBuffer::Mapped(map) => &map[..],
            InputBuffer::Owned(bytes) => &bytes[..],
        }
    }
}

pub fn read_input(path: &str) -> Result<InputBuffer> {
    if is_stdio(path) {
        let mut bytes = Vec::new();
        io::stdin()
            .lock()
            .read_to_end(&mut bytes)
            .map_err(|e| EmbedError::io("could not read standard input", e))?;
        return Ok(InputBuffer::Owned(bytes));
    }

    let file = File::open(path).map_err(|e| EmbedError::io(format!("could not open input '{}'", path), e))?;
    let len = file
        .metadata()
        .map_err(|e| EmbedError::io(format!("could not read input '{}'", path), e))?
        .len();
    // Zero-length mappings are rejected by some platforms.
    if len == 0 {
        return Ok(InputBuffer::Owned(Vec::new()));
    }

    // The mapping only lives until the module has copied the payload.
    let map = unsafe { Mmap::map(&file) }.map_err(|e| EmbedError::io(format!("could not map input '{}'", path), e))?;
    Ok(InputBuffer::Mapped(map))
}

pub fn write_output(path: &str, bytes: &[u8]) -> Result<()> {
    if is_stdio(path) {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        out.write_all(bytes)
            .and_then(|_| out.flush())
            .map_err(|e| EmbedError::io("could not write standard output", e))?;
        return Ok(());
    }

    let mut file = File::create(path).map_err(|e| EmbedError::io(format!("could not open output '{}'", path), e))?;
    file.write_all(bytes)
        .and_then(|_| file.flush())
        .map_err(|e| EmbedError::io(format!("could not write output '{}'", path), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_read_mapped_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.bin");
        fs::write(&path, b"\x01\x02\x03").unwrap();

        let input = read_input(path.to_str().unwrap()).unwrap();
        assert!(matches!(input, InputBuffer::Mapped(_)));
        assert_eq!(&*input, b"\x01\x02\x03");
    }

    #[test]
    fn test_read_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.bin");
        fs::write(&path, b"").unwrap();

        let input = read_input(path.to_str().unwrap()).unwrap();
        assert!(input.is_empty());
    }

    #[test]
    fn test_missing_input_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.bin");
        let err = read_input(path.to_str().unwrap()).err().unwrap();
        assert!(matches!(err, EmbedError::Io { .. }));
        assert!(err.to_string().starts_with("could not open input"));
    }

    #[test]
    fn test_write_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.o");
        write_output(path.to_str().unwrap(), b"data").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"data");
    }

    #[test]
    fn test_write_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no/such/dir/out.o");
        let err = write_output(path.to_str().unwrap(), b"data").unwrap_err();
        assert!(err.to_string().starts_with("could not open output"));
    }
}
