use std::{fs, path::Path};

use crate::error::{FileSystemError, FileSystemResult};

/// Creates the parent directory of `path` if it is missing.
pub fn ensure_parent_dir<P: AsRef<Path>>(path: P) -> FileSystemResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|err| FileSystemError::Directory {
                path: parent.to_path_buf(),
                action: "create",
                source: err,
            })?;
        }
    }
    Ok(())
}

/// Removes a file, returning `Ok(false)` when it did not exist.
pub fn remove_file_if_exists<P: AsRef<Path>>(path: P) -> FileSystemResult<bool> {
    let path = path.as_ref();
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(err) => {
            Err(FileSystemError::File {
                path: path.to_path_buf(),
                action: "remove",
                source: err,
            })
        }
    }
}

/// Restricts a file to its owner (`0600`). No-op on non-unix targets.
pub fn set_private_permissions<P: AsRef<Path>>(path: P) -> FileSystemResult<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let path = path.as_ref();
        fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(|err| {
            FileSystemError::File {
                path: path.to_path_buf(),
                action: "set permissions on",
                source: err,
            }
        })?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_ensure_parent_dir() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("nested/deeper/catalog.db");
        ensure_parent_dir(&file).unwrap();
        assert!(dir.path().join("nested/deeper").is_dir());
        ensure_parent_dir(&file).unwrap();
    }

    #[test]
    fn test_remove_file_if_exists() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("catalog.db");
        fs::write(&file, b"").unwrap();
        assert!(remove_file_if_exists(&file).unwrap());
        assert!(!remove_file_if_exists(&file).unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_set_private_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let file = dir.path().join("catalog.db");
        fs::write(&file, b"").unwrap();
        set_private_permissions(&file).unwrap();
        let mode = fs::metadata(&file).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
