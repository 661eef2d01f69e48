// grc-core/src/infrastructure/fs.rs

use std::io::Write;
use std::path::Path;

use crate::infrastructure::error::InfrastructureError;

/// Writes through a temp file in the target directory, then renames it into place.
/// Readers see either the old file or the complete new one.
pub fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(
    path: P,
    content: C,
) -> Result<(), InfrastructureError> {
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let mut temp_file = tempfile::NamedTempFile::new_in(parent)?;
    temp_file.write_all(content.as_ref())?;
    temp_file
        .persist(path)
        .map_err(|e| InfrastructureError::Io(e.error))?;
    Ok(())
}

/// Returns false and leaves the file alone when it already exists.
pub fn write_if_absent<P: AsRef<Path>, C: AsRef<[u8]>>(
    path: P,
    content: C,
) -> Result<bool, InfrastructureError> {
    let path = path.as_ref();
    if path.exists() {
        return Ok(false);
    }
    atomic_write(path, content)?;
    Ok(true)
}
