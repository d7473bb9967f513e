use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

static TEMP_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Read a raw binary blob.
pub fn read_binary(path: &Path) -> io::Result<Vec<u8>> {
    let data = fs::read(path)?;
    log::trace!("Read {} bytes from {}", data.len(), path.display());
    Ok(data)
}

/// Write a raw binary blob, creating missing parent directories.
///
/// Data goes to a sibling temp file which is then renamed over `path`, so a
/// failed write never leaves a truncated image behind.
pub fn write_binary(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let tmp = temp_path(path);
    if let Err(err) = fs::write(&tmp, data).and_then(|()| fs::rename(&tmp, path)) {
        let _ = fs::remove_file(&tmp);
        return Err(err);
    }
    Ok(())
}

/// Sibling of `path` unique to this process and call, so an unrelated file
/// next to the output is never clobbered.
fn temp_path(path: &Path) -> PathBuf {
    let id = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let mut name = OsString::from(".");
    name.push(path.file_name().unwrap_or(OsStr::new("image")));
    name.push(format!(".{}.{id}.tmp", std::process::id()));
    path.with_file_name(name)
}
