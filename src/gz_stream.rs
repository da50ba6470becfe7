use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::errors::{Result, XltError};

const READ_BUFFER_SIZE: usize = 1 << 20;

/// Returns true when the path carries a `.gz` suffix.
pub fn is_gzipped(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == "gz")
}

/// Opens a file for line reading, decompressing it on the fly if it is gzipped.
///
/// # Arguments
///
/// * `path` - The file to open. Files ending in `.gz` are read through a
///   multi-member gzip decoder, everything else is read as plain text.
pub fn open_text<P: AsRef<Path>>(path: P) -> Result<Box<dyn BufRead>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| XltError::io(path, e))?;
    if is_gzipped(path) {
        let decoder = MultiGzDecoder::new(file);
        Ok(Box::new(BufReader::with_capacity(READ_BUFFER_SIZE, decoder)))
    } else {
        Ok(Box::new(BufReader::with_capacity(READ_BUFFER_SIZE, file)))
    }
}

/// Locates an NCBI dump inside `dir`, preferring the plain file over `<name>.gz`.
///
/// When neither exists the plain path is returned so that the open error names
/// the file the user is expected to provide.
pub fn locate_dump(dir: &Path, name: &str) -> PathBuf {
    let plain = dir.join(name);
    if plain.exists() {
        return plain;
    }
    let gz = dir.join(format!("{}.gz", name));
    if gz.exists() {
        gz
    } else {
        plain
    }
}
