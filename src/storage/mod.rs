use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::errors::{Result, SnapshotError};
use crate::utils::hash::sha256_file;

pub const WORK_DIRECTORY_NAME: &str = ".dbsnapshot";

/// Where one manager keeps its single backup artifact.
///
/// Nothing here is cached: every query goes back to the filesystem.
#[derive(Debug, Clone)]
pub struct WorkLayout {
    work_dir: PathBuf,
    artifact: PathBuf,
    // Exactly the path handed to the engine; `artifact` is checked against it.
    artifact_text: String,
}

/// Facts about a backup artifact currently on disk.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotInfo {
    pub database: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub modified: DateTime<Local>,
    pub sha256: String,
}

impl WorkLayout {
    /// Fails with [`SnapshotError::Configuration`] when the artifact path is not
    /// valid UTF-8, since the engine could only be given a lossy copy of it.
    pub fn new(root: &Path, database: &str) -> Result<Self> {
        let work_dir = root.join(WORK_DIRECTORY_NAME);
        let artifact = work_dir.join(format!("{}.bak", database));
        let artifact_text = artifact
            .to_str()
            .ok_or_else(|| {
                SnapshotError::Configuration(format!(
                    "backup path is not valid UTF-8: {}",
                    artifact.display()
                ))
            })?
            .to_string();
        Ok(Self {
            work_dir,
            artifact,
            artifact_text,
        })
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn artifact_path(&self) -> &Path {
        &self.artifact
    }

    pub fn artifact_text(&self) -> &str {
        &self.artifact_text
    }

    pub fn artifact_exists(&self) -> bool {
        self.artifact.is_file()
    }

    pub fn ensure_work_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.work_dir)
    }

    /// Delete the artifact, then the work directory. No-op when the artifact is absent.
    pub fn remove_artifact(&self) -> io::Result<bool> {
        if !self.artifact_exists() {
            return Ok(false);
        }
        fs::remove_file(&self.artifact)?;
        // Other managers may share the work directory; the last one out removes it.
        match fs::remove_dir(&self.work_dir) {
            Err(e) if e.kind() != io::ErrorKind::DirectoryNotEmpty => Err(e),
            _ => Ok(true),
        }
    }

    /// Best effort: a leftover work directory without an artifact is removed.
    pub fn discard_empty_work_dir(&self) {
        if !self.artifact_exists() {
            let _ = fs::remove_dir(&self.work_dir);
        }
    }

    pub fn artifact_info(&self, database: &str) -> io::Result<Option<SnapshotInfo>> {
        if !self.artifact_exists() {
            return Ok(None);
        }
        let md = fs::metadata(&self.artifact)?;
        let modified: DateTime<Local> = md.modified()?.into();
        Ok(Some(SnapshotInfo {
            database: database.to_string(),
            path: self.artifact.clone(),
            size_bytes: md.len(),
            modified,
            sha256: sha256_file(&self.artifact)?,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_derived_from_root_and_database() {
        let layout = WorkLayout::new(Path::new("/srv/tests"), "Sales").unwrap();
        assert_eq!(layout.work_dir(), Path::new("/srv/tests/.dbsnapshot"));
        assert_eq!(
            layout.artifact_path(),
            Path::new("/srv/tests/.dbsnapshot/Sales.bak")
        );
    }

    #[test]
    fn remove_artifact_clears_file_and_work_dir() {
        let root = tempfile::tempdir().unwrap();
        let layout = WorkLayout::new(root.path(), "Sales").unwrap();
        layout.ensure_work_dir().unwrap();
        fs::write(layout.artifact_path(), b"backup").unwrap();

        assert!(layout.artifact_exists());
        assert!(layout.remove_artifact().unwrap());
        assert!(!layout.artifact_exists());
        assert!(!layout.work_dir().exists());
        assert!(!layout.remove_artifact().unwrap());
    }

    #[test]
    fn shared_work_dir_survives_until_last_artifact_is_removed() {
        let root = tempfile::tempdir().unwrap();
        let a = WorkLayout::new(root.path(), "A").unwrap();
        let b = WorkLayout::new(root.path(), "B").unwrap();
        for layout in [&a, &b] {
            layout.ensure_work_dir().unwrap();
            fs::write(layout.artifact_path(), b"backup").unwrap();
        }

        assert!(a.remove_artifact().unwrap());
        assert!(!a.artifact_exists());
        assert!(b.artifact_exists());

        assert!(b.remove_artifact().unwrap());
        assert!(!root.path().join(WORK_DIRECTORY_NAME).exists());
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_root_is_rejected() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let root = Path::new(OsStr::from_bytes(b"/tmp/caf\xE9"));
        assert!(matches!(
            WorkLayout::new(root, "Sales"),
            Err(SnapshotError::Configuration(_))
        ));
    }

    #[test]
    fn artifact_text_matches_artifact_path() {
        let layout = WorkLayout::new(Path::new("/srv/it's"), "Sales").unwrap();
        assert_eq!(Path::new(layout.artifact_text()), layout.artifact_path());
    }

    #[test]
    fn ensure_work_dir_tolerates_existing_directory() {
        let root = tempfile::tempdir().unwrap();
        let layout = WorkLayout::new(root.path(), "Sales").unwrap();
        layout.ensure_work_dir().unwrap();
        layout.ensure_work_dir().unwrap();
        assert!(layout.work_dir().is_dir());
    }

    #[test]
    fn info_reports_size_and_digest() {
        let root = tempfile::tempdir().unwrap();
        let layout = WorkLayout::new(root.path(), "Sales").unwrap();
        assert!(layout.artifact_info("Sales").unwrap().is_none());

        layout.ensure_work_dir().unwrap();
        fs::write(layout.artifact_path(), b"abc").unwrap();
        let info = layout.artifact_info("Sales").unwrap().unwrap();
        assert_eq!(info.size_bytes, 3);
        assert_eq!(info.path, layout.artifact_path());
        assert!(info.sha256.starts_with("ba7816bf"));
    }
}
