//! File-system collaborator used by the composers.
//!
//! Only the handful of queries the composers need are abstracted; decoding
//! and encoding go through [`crate::backend::ImageOps`] instead.

use crate::error::ComposeError;
use std::io::Write;
use std::path::Path;
use tracing::warn;

/// Existence checks, whole-file reads and collision-free naming.
pub trait FileSystem: Send + Sync {
    fn exists(&self, path: &Path) -> bool;

    fn dir_exists(&self, path: &Path) -> bool;

    fn read_all_bytes(&self, path: &Path) -> Result<Vec<u8>, ComposeError>;

    /// Write `bytes` to `target` so that the file is either fully written or
    /// untouched.
    fn write_atomic(&self, target: &Path, bytes: &[u8]) -> Result<(), ComposeError>;

    /// Best-effort removal of a file written earlier in a failed batch.
    fn remove(&self, path: &Path);

    /// A file name under `dir` that does not exist yet, derived from
    /// `proposed`: `name.ext`, then `name(1).ext`, `name(2).ext`, …
    fn unique_name(&self, dir: &Path, proposed: &str) -> String {
        let (stem, ext) = match proposed.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
            _ => (proposed, None),
        };
        let render = |n: u32| {
            let stem = if n == 0 {
                stem.to_string()
            } else {
                format!("{stem}({n})")
            };
            match ext {
                Some(ext) => format!("{stem}.{ext}"),
                None => stem,
            }
        };

        let mut n = 0;
        loop {
            let candidate = render(n);
            if !self.exists(&dir.join(&candidate)) {
                return candidate;
            }
            n += 1;
        }
    }
}

/// [`FileSystem`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl FileSystem for LocalFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn dir_exists(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn read_all_bytes(&self, path: &Path) -> Result<Vec<u8>, ComposeError> {
        std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ComposeError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => ComposeError::Io {
                path: path.to_path_buf(),
                source: e,
            },
        })
    }

    // Temp file in the target's folder, then rename, so the rename never
    // crosses a file system.
    fn write_atomic(&self, target: &Path, bytes: &[u8]) -> Result<(), ComposeError> {
        let write_err = |source| ComposeError::OutputWriteFailed {
            path: target.to_path_buf(),
            source,
        };
        let folder = match target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let mut tmp = tempfile::Builder::new()
            .prefix(".collage-")
            .suffix(".tmp")
            .tempfile_in(folder)
            .map_err(write_err)?;
        tmp.write_all(bytes).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(target).map_err(|e| write_err(e.error))?;
        Ok(())
    }

    fn remove(&self, path: &Path) {
        if let Err(e) = std::fs::remove_file(path) {
            warn!(path = %path.display(), error = %e, "Could not remove file");
        }
    }
}
