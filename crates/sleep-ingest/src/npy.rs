//! Cached per-record arrays in NumPy `.npy` format.
//!
//! Caches hold one-dimensional little-endian `f64` arrays (`<f8`). Reading
//! any other element type or dimensionality fails with
//! [`IngestError::InvalidArray`].

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::mem::size_of;
use std::path::Path;

use ndarray::{Array1, ArrayView1};
use ndarray_npy::{ReadNpyExt, WriteNpyExt};

use crate::error::{IngestError, Result};

const MAGIC: &[u8; 6] = b"\x93NUMPY";
const SHAPE_KEY: &str = "'shape'";

fn invalid(path: &Path, reason: impl Into<String>) -> IngestError {
    IngestError::InvalidArray {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

/// Reads a one-dimensional `<f8` array from a `.npy` file.
pub fn read_npy(path: &Path) -> Result<Vec<f64>> {
    let bytes = fs::read(path).map_err(|e| IngestError::read(path, e))?;
    check_declared_size(&bytes, path)?;
    let array = Array1::<f64>::read_npy(bytes.as_slice())
        .map_err(|e| invalid(path, e.to_string()))?;
    Ok(array.to_vec())
}

/// Rejects files whose header declares more elements than the file holds.
///
/// Reading allocates the declared shape up front, so a corrupt header must
/// be caught before the data is decoded.
fn check_declared_size(bytes: &[u8], path: &Path) -> Result<()> {
    if bytes.len() < 10 || &bytes[..6] != MAGIC {
        return Err(invalid(path, "missing NPY magic"));
    }
    let (header_len, header_start) = match bytes[6] {
        1 => (usize::from(u16::from_le_bytes([bytes[8], bytes[9]])), 10),
        _ if bytes.len() >= 12 => (
            u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize,
            12,
        ),
        _ => return Err(invalid(path, "truncated header")),
    };
    let data_start = header_start + header_len;
    let header = bytes
        .get(header_start..data_start)
        .ok_or_else(|| invalid(path, "truncated header"))?;
    let header = String::from_utf8_lossy(header);

    let shape = header
        .find(SHAPE_KEY)
        .map(|start| &header[start + SHAPE_KEY.len()..])
        .and_then(|rest| rest.find('(').map(|open| &rest[open + 1..]))
        .and_then(|rest| rest.find(')').map(|end| &rest[..end]))
        .ok_or_else(|| invalid(path, "header has no shape"))?;
    let declared = shape
        .split(',')
        .map(str::trim)
        .filter(|dim| !dim.is_empty())
        .try_fold(1usize, |acc, dim| {
            dim.parse::<usize>().ok().and_then(|dim| acc.checked_mul(dim))
        })
        .and_then(|count| count.checked_mul(size_of::<f64>()))
        .ok_or_else(|| invalid(path, format!("unreadable shape ({shape})")))?;

    let available = bytes.len() - data_start;
    if declared > available {
        return Err(invalid(
            path,
            format!("shape ({shape}) needs {declared} bytes, file holds {available}"),
        ));
    }
    Ok(())
}

/// Writes `values` as a `<f8` array.
///
/// The file is written next to the target and renamed into place, so an
/// interrupted write never leaves a truncated cache entry behind.
pub fn write_npy(path: &Path, values: &[f64]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| IngestError::write(parent, e))?;
    }
    let temp_path = path.with_extension("npy.tmp");

    let file = File::create(&temp_path).map_err(|e| IngestError::write(&temp_path, e))?;
    let mut writer = BufWriter::new(file);
    ArrayView1::from(values)
        .write_npy(&mut writer)
        .map_err(|e| invalid(&temp_path, e.to_string()))?;
    writer
        .flush()
        .map_err(|e| IngestError::write(&temp_path, e))?;
    writer
        .get_ref()
        .sync_all()
        .map_err(|e| IngestError::write(&temp_path, e))?;
    drop(writer);

    fs::rename(&temp_path, path).map_err(|e| IngestError::write(path, e))?;
    tracing::debug!(path = %path.display(), len = values.len(), "wrote cached array");
    Ok(())
}
