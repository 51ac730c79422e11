use std::convert::AsRef;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Move a file from one location to another.
fn move_file<P: AsRef<Path>, Q: AsRef<Path>>(from: P, to: Q) -> io::Result<()> {
    match fs::rename(&from, &to) {
        Ok(result) => Ok(result),
        Err(_) => {
            fs::copy(&from, &to)?;
            fs::remove_file(from)?;
            Ok(())
        }
    }
}

/// Move statements as downloaded into an "old" folder marked with a timestamp.
pub fn store_raw_statements(
    storage: impl AsRef<Path>,
    files: &[impl AsRef<Path>],
    folder_base: impl AsRef<str>,
) -> io::Result<()> {
    // Move the files from the old to the new locations.
    let location = ensure_storage_path(storage, folder_base, false)?;
    for f in files {
        let name = f.as_ref().file_name().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{:#?} does not name a file", f.as_ref()),
            )
        })?;
        move_file(f, location.join(name))?;
        debug!(file = %f.as_ref().display(), "Archived raw statement");
    }
    Ok(())
}

/// Construct the storage location, ensure it exists, and return it.
pub fn ensure_storage_path(
    storage: impl AsRef<Path>,
    base: impl AsRef<str>,
    new: bool,
) -> io::Result<PathBuf> {
    let mid = if new { "new" } else { "old" };
    let location = storage.as_ref().join(mid).join(base.as_ref());
    if !location.exists() {
        fs::create_dir_all(&location)?;
    }
    Ok(location)
}
