//! Crash-safe file replacement.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

fn unique_tmp_path(dest: &Path) -> io::Result<PathBuf> {
    let parent = dest
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no parent"))?;
    let file_name = dest
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no filename"))?;

    let now_ns = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let tmp_name = format!(
        ".{}.tmp.{}.{now_ns}",
        file_name.to_string_lossy(),
        std::process::id()
    );
    Ok(parent.join(tmp_name))
}

/// Write `bytes` to a temp file next to `dest`, then rename it into place.
pub fn write_atomic(dest: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = dest
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no parent"))?;
    std::fs::create_dir_all(parent)?;

    let tmp = unique_tmp_path(dest)?;
    let written = (|| {
        let mut file = File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()
    })();

    if let Err(error) = written.and_then(|()| std::fs::rename(&tmp, dest)) {
        let _ = std::fs::remove_file(&tmp);
        return Err(error);
    }
    Ok(())
}
