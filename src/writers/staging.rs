use crate::error::{ProcessingError, Result};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// A fully written output waiting in a temporary file beside its
/// destination. Dropping it without `persist` removes the temporary file.
#[derive(Debug)]
pub struct StagedOutput {
    file: NamedTempFile,
    destination: PathBuf,
    replaces_existing: bool,
}

impl StagedOutput {
    /// Create an empty staging file in the destination's directory.
    pub fn create(destination: &Path) -> Result<Self> {
        if destination.is_dir() {
            return Err(ProcessingError::file_access(
                destination,
                io::Error::new(io::ErrorKind::Other, "destination is a directory"),
            ));
        }

        let directory = match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(directory)
            .map_err(|e| ProcessingError::file_access(directory, e))?;
        let file = NamedTempFile::new_in(directory)
            .map_err(|e| ProcessingError::file_access(directory, e))?;

        Ok(Self {
            file,
            destination: destination.to_path_buf(),
            replaces_existing: destination.exists(),
        })
    }

    pub fn file_mut(&mut self) -> &mut NamedTempFile {
        &mut self.file
    }

    /// Rename into place.
    pub fn persist(self) -> Result<PathBuf> {
        let destination = self.destination;
        self.file
            .persist(&destination)
            .map_err(|e| ProcessingError::file_access(&destination, e.error))?;
        Ok(destination)
    }
}

/// Persist every staged output, or none of the new ones.
///
/// Outputs are renamed in order. If a rename fails, files this call created
/// are removed again; files it replaced keep their new content.
pub fn persist_all(staged: Vec<StagedOutput>) -> Result<Vec<PathBuf>> {
    let mut created = Vec::new();
    let mut written = Vec::with_capacity(staged.len());

    for output in staged {
        let replaces_existing = output.replaces_existing;
        match output.persist() {
            Ok(path) => {
                if !replaces_existing {
                    created.push(path.clone());
                }
                written.push(path);
            }
            Err(err) => {
                for path in &created {
                    if let Err(remove_err) = std::fs::remove_file(path) {
                        warn!(
                            path = %path.display(),
                            error = %remove_err,
                            "Could not remove output"
                        );
                    }
                }
                return Err(err);
            }
        }
    }

    debug!(outputs = written.len(), "Persisted staged outputs");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_nothing_lands_until_persisted() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("nested").join("table.csv");

        let mut staged = StagedOutput::create(&path)?;
        staged.file_mut().write_all(b"state\n")?;
        assert!(!path.exists());

        assert_eq!(staged.persist()?, path);
        assert_eq!(std::fs::read_to_string(&path)?, "state\n");
        Ok(())
    }

    #[test]
    fn test_dropped_stage_leaves_no_file() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("table.csv");

        let mut staged = StagedOutput::create(&path)?;
        staged.file_mut().write_all(b"state\n")?;
        drop(staged);

        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path())?.count(), 0);
        Ok(())
    }

    #[test]
    fn test_directory_destination_is_rejected() -> Result<()> {
        let dir = TempDir::new()?;
        let err = StagedOutput::create(dir.path()).unwrap_err();
        assert!(matches!(err, ProcessingError::FileAccess { .. }));
        Ok(())
    }

    #[test]
    fn test_failed_rename_removes_created_outputs() -> Result<()> {
        let dir = TempDir::new()?;
        let first = dir.path().join("first.csv");
        let blocked = dir.path().join("blocked");

        let mut a = StagedOutput::create(&first)?;
        a.file_mut().write_all(b"a")?;
        let b = StagedOutput::create(&blocked)?;
        // Turn the second destination into a non-empty directory after staging.
        std::fs::create_dir(&blocked)?;
        std::fs::write(blocked.join("keep"), "x")?;

        assert!(persist_all(vec![a, b]).is_err());
        assert!(!first.exists());
        assert!(blocked.join("keep").exists());
        Ok(())
    }
}
