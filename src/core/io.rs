//! Disk I/O for host firmware files
//!
//! Host files are small enough to be read and written whole.

use crate::error::Result;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Read a whole host file into memory
pub fn read_host<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    debug!("Read {} bytes from {:?}", bytes.len(), path);
    Ok(bytes)
}

/// Sibling path used while a save is in flight
fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".zoomfw-tmp");
    path.with_file_name(name)
}

/// Write `bytes` to `path`, replacing it only once the write succeeded
///
/// The data goes to a sibling file that is synced and then renamed over
/// the destination, so a failed save leaves the previous file intact.
pub fn write_host<P: AsRef<Path>>(path: P, bytes: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let staging = staging_path(path);

    let result = (|| -> Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&staging)?;
        file.write_all(bytes)?;
        file.flush()?;
        file.sync_all()?;
        fs::rename(&staging, path)?;
        Ok(())
    })();

    if result.is_err() {
        let _ = fs::remove_file(&staging);
    }
    result?;
    debug!("Wrote {} bytes to {:?}", bytes.len(), path);
    Ok(())
}
