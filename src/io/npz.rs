//! NumPy `.npz` archives: flat numeric entries in, arrays out.
//!
//! Entries are looked up with or without the `.npy` suffix. Reading accepts
//! any common numeric or boolean dtype and flattens to `f64`.

use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use ndarray::{Array, ArrayD, Dimension};
use ndarray_npy::{NpzReader, NpzWriter, ReadNpzError, ReadableElement, WritableElement};

use crate::error::{AnalysisError, Result};

/// Key used for every artifact this crate writes.
pub const DEFAULT_KEY: &str = "list";

fn open_reader(path: &Path) -> Result<NpzReader<File>> {
    let file = File::open(path).map_err(|e| AnalysisError::io(path, e))?;
    NpzReader::new(file).map_err(|e| AnalysisError::npz(path, e))
}

fn resolve_entry<R: Read + Seek>(
    npz: &mut NpzReader<R>,
    path: &Path,
    key: &str,
) -> Result<String> {
    let names = npz.names().map_err(|e| AnalysisError::npz(path, e))?;
    names
        .into_iter()
        .find(|name| name == key || name.strip_suffix(".npy") == Some(key))
        .ok_or_else(|| AnalysisError::npz(path, format!("no entry named '{key}'")))
}

fn read_as<T, R>(
    npz: &mut NpzReader<R>,
    name: &str,
    conv: fn(T) -> f64,
) -> std::result::Result<Vec<f64>, ReadNpzError>
where
    T: ReadableElement + Copy,
    R: Read + Seek,
{
    let array: ArrayD<T> = npz.by_name(name)?;
    Ok(array.iter().map(|&v| conv(v)).collect())
}

fn read_flat<R: Read + Seek>(
    npz: &mut NpzReader<R>,
    name: &str,
) -> std::result::Result<Vec<f64>, ReadNpzError> {
    if let Ok(v) = read_as::<f64, _>(npz, name, |v| v) {
        return Ok(v);
    }
    if let Ok(v) = read_as::<f32, _>(npz, name, f64::from) {
        return Ok(v);
    }
    if let Ok(v) = read_as::<i64, _>(npz, name, |v| v as f64) {
        return Ok(v);
    }
    if let Ok(v) = read_as::<i32, _>(npz, name, f64::from) {
        return Ok(v);
    }
    if let Ok(v) = read_as::<u8, _>(npz, name, f64::from) {
        return Ok(v);
    }
    read_as::<bool, _>(npz, name, |v| if v { 1.0 } else { 0.0 })
}

/// Read entry `key` of the archive at `path`, reshaped to 1-D.
pub fn read_vector(path: &Path, key: &str) -> Result<Vec<f64>> {
    let mut npz = open_reader(path)?;
    let entry = resolve_entry(&mut npz, path, key)?;
    read_flat(&mut npz, &entry).map_err(|e| AnalysisError::npz(path, e))
}

/// Write a single-entry archive holding `array` under `key`.
pub fn write_array<A, D>(path: &Path, key: &str, array: &Array<A, D>) -> Result<()>
where
    A: WritableElement,
    D: Dimension,
{
    let file = File::create(path).map_err(|e| AnalysisError::io(path, e))?;
    let mut npz = NpzWriter::new(file);
    npz.add_array(key, array).map_err(|e| AnalysisError::npz(path, e))?;
    npz.finish().map_err(|e| AnalysisError::npz(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2};

    fn unique_path(name: &str) -> std::path::PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!(
            "cortexvar_npz_test_{}_{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos(),
            name
        ));
        p
    }

    #[test]
    fn matrices_are_flattened_row_major() {
        let path = unique_path("matrix.npz");
        write_array(&path, DEFAULT_KEY, &arr2(&[[1.0f64, 2.0], [3.0, 4.0]])).unwrap();
        assert_eq!(read_vector(&path, DEFAULT_KEY).unwrap(), vec![1.0, 2.0, 3.0, 4.0]);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn integer_and_bool_entries_are_widened() {
        let path = unique_path("ints.npz");
        write_array(&path, "labels", &arr1(&[0i64, 3, 5])).unwrap();
        assert_eq!(read_vector(&path, "labels").unwrap(), vec![0.0, 3.0, 5.0]);
        let _ = std::fs::remove_file(&path);

        let path = unique_path("bools.npz");
        write_array(&path, "mask", &arr1(&[true, false, true])).unwrap();
        assert_eq!(read_vector(&path, "mask").unwrap(), vec![1.0, 0.0, 1.0]);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_key_is_reported() {
        let path = unique_path("missing.npz");
        write_array(&path, DEFAULT_KEY, &arr1(&[1.0f64])).unwrap();
        assert!(matches!(
            read_vector(&path, "other"),
            Err(AnalysisError::Npz { .. })
        ));
        let _ = std::fs::remove_file(&path);
    }
}
