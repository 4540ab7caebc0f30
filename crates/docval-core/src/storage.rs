//! Working directory for staged documents and rasterized page images.
//!
//! The pipeline writes page images here and never deletes them; cleanup is
//! an explicit call to [`WorkDir::purge_page_images`].

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

const PAGE_IMAGE_PREFIX: &str = "temp_page_";
const PAGE_IMAGE_EXTENSION: &str = "jpg";

/// A writable directory owned by the caller.
#[derive(Debug, Clone)]
pub struct WorkDir {
    root: PathBuf,
}

impl WorkDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Create the directory if it does not exist.
    pub fn ensure(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.root)
    }

    /// Where the rasterized image of page `index` (0-based) is written.
    pub fn page_image_path(&self, index: usize) -> PathBuf {
        self.root
            .join(format!("{}{}.{}", PAGE_IMAGE_PREFIX, index, PAGE_IMAGE_EXTENSION))
    }

    /// Copy a document into the directory under a sanitized file name.
    pub fn stage(&self, source: &Path) -> std::io::Result<PathBuf> {
        let original = source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let name = sanitize_filename(&original);
        if name.is_empty() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("no usable file name in {}", source.display()),
            ));
        }

        self.ensure()?;
        let target = self.root.join(name);
        fs::copy(source, &target)?;
        debug!("Staged {} as {}", source.display(), target.display());
        Ok(target)
    }

    /// Delete rasterized page images. Returns how many files were removed.
    pub fn purge_page_images(&self) -> std::io::Result<usize> {
        if !self.root.exists() {
            return Ok(0);
        }

        let mut removed = 0;
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if is_page_image(&path) {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }

        debug!("Removed {} page images from {}", removed, self.root.display());
        Ok(removed)
    }
}

fn is_page_image(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.strip_prefix(PAGE_IMAGE_PREFIX)
        .and_then(|rest| rest.strip_suffix(PAGE_IMAGE_EXTENSION))
        .and_then(|rest| rest.strip_suffix('.'))
        .is_some_and(|index| !index.is_empty() && index.chars().all(|c| c.is_ascii_digit()))
}

/// Reduce a user-supplied file name to a safe, flat name.
///
/// Keeps ASCII letters, digits, `.`, `-` and `_`; whitespace becomes `_`;
/// path separators and anything else are dropped, as are leading dots and
/// underscores. May return an empty string.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("");

    let cleaned: String = base
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();

    cleaned.trim_start_matches(['.', '_']).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("My Scan 01.pdf"), "My_Scan_01.pdf");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\docs\\pan card.jpg"), "pan_card.jpg");
        assert_eq!(sanitize_filename(".hidden"), "hidden");
        assert_eq!(sanitize_filename("résumé.png"), "rsum.png");
        assert_eq!(sanitize_filename("../"), "");
    }

    #[test]
    fn test_page_image_paths() {
        let dir = WorkDir::new("uploads");
        assert_eq!(dir.page_image_path(0), PathBuf::from("uploads/temp_page_0.jpg"));
        assert_eq!(dir.page_image_path(12), PathBuf::from("uploads/temp_page_12.jpg"));
    }

    #[test]
    fn test_stage_copies_under_safe_name() {
        let src_dir = tempfile::tempdir().unwrap();
        let source = src_dir.path().join("aadhar front.png");
        fs::write(&source, b"pixels").unwrap();

        let work = tempfile::tempdir().unwrap();
        let dir = WorkDir::new(work.path().join("uploads"));
        let staged = dir.stage(&source).unwrap();

        assert_eq!(staged, work.path().join("uploads").join("aadhar_front.png"));
        assert_eq!(fs::read(&staged).unwrap(), b"pixels");
    }

    #[test]
    fn test_purge_only_removes_page_images() {
        let work = tempfile::tempdir().unwrap();
        let dir = WorkDir::new(work.path());
        for name in ["temp_page_0.jpg", "temp_page_1.jpg", "temp_page_.jpg", "invoice.pdf", "temp_page_x.jpg"] {
            fs::write(work.path().join(name), b"").unwrap();
        }

        assert_eq!(dir.purge_page_images().unwrap(), 2);
        assert!(work.path().join("invoice.pdf").exists());
        assert!(work.path().join("temp_page_.jpg").exists());
        assert!(!work.path().join("temp_page_1.jpg").exists());
    }

    #[test]
    fn test_purge_missing_dir_is_noop() {
        let work = tempfile::tempdir().unwrap();
        let dir = WorkDir::new(work.path().join("never-created"));
        assert_eq!(dir.purge_page_images().unwrap(), 0);
    }
}
