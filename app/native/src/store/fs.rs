//! Atomic file writes.
//!
//! Every durable write goes to a temporary file in the destination directory
//! and is renamed over the target once complete, so readers never observe a
//! half-written file. A failed write leaves the previous file untouched and
//! the temporary file is removed on drop.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use tempfile::NamedTempFile;

fn parent_dir(path: &Path) -> &Path {
    path.parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

/// Writes `path` atomically with the content produced by `fill`.
///
/// # Errors
///
/// Returns the error of `fill`, or an I/O error if the temporary file cannot
/// be created, synced or renamed.
pub fn write_atomic<E, F>(path: &Path, fill: F) -> Result<(), E>
where
    E: From<io::Error>,
    F: FnOnce(&mut File) -> Result<(), E>,
{
    let dir = parent_dir(path);
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    fill(tmp.as_file_mut())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|err| err.error)?;

    Ok(())
}

/// Serializes `value` as pretty JSON and writes it atomically.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
    write_atomic(path, |file: &mut File| {
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.flush()
    })
}

/// Copies `src` to `dst` atomically.
///
/// # Errors
///
/// Returns an error if `src` cannot be read or `dst` cannot be written.
pub fn copy_atomic(src: &Path, dst: &Path) -> io::Result<u64> {
    let mut source = File::open(src)?;
    let mut copied = 0;
    write_atomic(dst, |file: &mut File| {
        copied = io::copy(&mut source, file)?;
        Ok::<(), io::Error>(())
    })?;
    Ok(copied)
}

/// Removes a file, treating absence as success.
///
/// # Errors
///
/// Returns any error other than `NotFound`.
pub fn remove_if_exists(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}
