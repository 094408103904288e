//! Reads and writes the input format: a headerless run of host-native `i32`
//! values, no length prefix, no byte-order marker.
//!
//! Files are not portable across machines with different endianness.

use std::{
    fs::File,
    io::{BufWriter, ErrorKind, Read, Write},
    path::Path,
};

use tracing::{debug, warn};

use crate::error::{Result, SumError};

/// Values decoded per read.
pub const CHUNK_VALUES: usize = 4096;

/// Width of one stored value in bytes.
pub const VALUE_WIDTH: usize = size_of::<i32>();

/// Loads every value in the file at `path`.
///
/// The file is opened before any buffer is allocated. Trailing bytes that do
/// not form a whole value are dropped with a warning.
pub fn load_values(path: impl AsRef<Path>) -> Result<Vec<i32>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| SumError::file(path, e))?;
    let hint = file
        .metadata()
        .map(|meta| meta.len() as usize / VALUE_WIDTH)
        .unwrap_or(0);

    let values = read_chunks(file, path, hint)?;
    debug!(path = %path.display(), values = values.len(), "loaded input");
    Ok(values)
}

/// Reads values from any byte stream.
pub fn read_values<R: Read>(reader: R) -> Result<Vec<i32>> {
    read_chunks(reader, Path::new("<stream>"), 0)
}

/// Writes `values` to `path` in the format read by [`load_values`],
/// replacing any existing file.
pub fn write_values(path: impl AsRef<Path>, values: &[i32]) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| SumError::file(path, e))?;
    let mut writer = BufWriter::new(file);

    for chunk in values.chunks(CHUNK_VALUES) {
        let bytes: Vec<u8> = chunk.iter().flat_map(|v| v.to_ne_bytes()).collect();
        writer.write_all(&bytes).map_err(|e| SumError::file(path, e))?;
    }
    writer.flush().map_err(|e| SumError::file(path, e))
}

fn read_chunks<R: Read>(mut reader: R, path: &Path, hint: usize) -> Result<Vec<i32>> {
    let mut values: Vec<i32> = Vec::new();
    values
        .try_reserve(hint)
        .map_err(|_| SumError::allocation("input values", hint))?;

    let mut buffer = vec![0u8; CHUNK_VALUES * VALUE_WIDTH];
    let mut filled = 0;

    loop {
        let read = match reader.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(SumError::file(path, e)),
        };
        filled += read;

        let whole = filled / VALUE_WIDTH;
        values
            .try_reserve(whole)
            .map_err(|_| SumError::allocation("input values", values.len().saturating_add(whole)))?;
        values.extend(buffer[..whole * VALUE_WIDTH].chunks_exact(VALUE_WIDTH).map(decode));

        // Keep a split value's leading bytes for the next read.
        let consumed = whole * VALUE_WIDTH;
        buffer.copy_within(consumed..filled, 0);
        filled -= consumed;
    }

    if filled > 0 {
        warn!(
            path = %path.display(),
            bytes = filled,
            "ignoring trailing bytes that do not form a whole value"
        );
    }

    Ok(values)
}

#[inline]
fn decode(bytes: &[u8]) -> i32 {
    let mut raw = [0u8; VALUE_WIDTH];
    raw.copy_from_slice(bytes);
    i32::from_ne_bytes(raw)
}
