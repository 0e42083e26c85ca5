use std::io::Write;
use std::path::{Path, PathBuf};

/// Name of the per-user state directory under the home directory.
pub const STATE_DIR_NAME: &str = ".mypeople";

/// Resolve the state directory (`~/.mypeople`) without creating it.
pub fn state_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(STATE_DIR_NAME))
}

/// Write `content` to `path` atomically.
///
/// The bytes land in a temp file next to the target and are renamed over it,
/// so readers see either the old file or the new one. Creates parent
/// directories as needed.
pub fn atomic_write_str(path: &Path, content: &str) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(content.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
