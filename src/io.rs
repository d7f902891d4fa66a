//! Raw binary dumps of target stacks
//!
//! Layout: the four dimensions `(frame, channel, x, y)` as little-endian
//! `u32`s, followed by the values as little-endian `f32`s in row-major order.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use ndarray::Array4;

use crate::error::{Error, Result};

/// Four little-endian `u32` dimensions
const HEADER_BYTES: usize = 16;

pub fn write_targets(targets: &Array4<f32>, path: &Path) -> Result<()> {
    let mut file = BufWriter::new(File::create(path)?);
    let (f, c, x, y) = targets.dim();
    for d in [f, c, x, y] {
        let d = u32::try_from(d).map_err(|_| Error::Format(format!("dimension {d} does not fit in u32")))?;
        file.write_all(&d.to_le_bytes())?;
    }
    for datum in targets.iter() {
        file.write_all(&datum.to_le_bytes())?;
    }
    file.flush()?;
    Ok(())
}

pub fn read_targets(path: &Path) -> Result<Array4<f32>> {
    let file = File::open(path)?;
    let available = file.metadata()?.len();
    let mut file = BufReader::new(file);
    let mut buffer = [0; 4];
    let mut dims = [0_usize; 4];
    for d in dims.iter_mut() {
        file.read_exact(&mut buffer)?;
        *d = u32::from_le_bytes(buffer) as usize;
    }
    let n = dims.iter()
        .try_fold(1_usize, |n, &d| n.checked_mul(d))
        .ok_or_else(|| Error::Format(format!("shape {dims:?} has too many elements")))?;
    let expected = n.checked_mul(4)
        .and_then(|bytes| bytes.checked_add(HEADER_BYTES))
        .and_then(|bytes| u64::try_from(bytes).ok());
    match expected {
        Some(bytes) if bytes <= available => {},
        _ => return Err(Error::Format(format!("shape {dims:?} needs more data than the {available} bytes in the file"))),
    }
    let mut data = Vec::with_capacity(n);
    for _ in 0..n {
        file.read_exact(&mut buffer)?;
        data.push(f32::from_le_bytes(buffer));
    }
    if file.read(&mut buffer)? != 0 {
        return Err(Error::Format(format!("trailing data after {n} values")))
    }
    let [f, c, x, y] = dims;
    Array4::from_shape_vec((f, c, x, y), data).map_err(|e| Error::Format(e.to_string()))
}
