//! Thin filesystem wrappers that attach the offending path to every error.

use crate::resources::ResourceError;
use serde::Serialize;
use std::fs;
use std::path::Path;

pub fn create_dir(path: &Path) -> Result<(), ResourceError> {
    fs::create_dir_all(path).map_err(|e| ResourceError::io(path, e))
}

/// Remove a directory tree if it exists
pub fn remove_dir(path: &Path) -> Result<(), ResourceError> {
    if path.exists() {
        fs::remove_dir_all(path).map_err(|e| ResourceError::io(path, e))?;
    }
    Ok(())
}

pub fn read_to_string(path: &Path) -> Result<String, ResourceError> {
    if !path.exists() {
        return Err(ResourceError::MissingFile(path.to_path_buf()));
    }
    fs::read_to_string(path).map_err(|e| ResourceError::io(path, e))
}

/// Copy one file, failing with `MissingFile` when the source is absent
pub fn copy_file(from: &Path, to: &Path) -> Result<(), ResourceError> {
    if !from.is_file() {
        return Err(ResourceError::MissingFile(from.to_path_buf()));
    }
    fs::copy(from, to).map_err(|e| ResourceError::io(to, e))?;
    Ok(())
}

/// Recursively copy the contents of `from` into `to`
pub fn copy_dir(from: &Path, to: &Path) -> Result<(), ResourceError> {
    if !from.is_dir() {
        return Err(ResourceError::MissingFile(from.to_path_buf()));
    }
    create_dir(to)?;
    for entry in fs::read_dir(from).map_err(|e| ResourceError::io(from, e))? {
        let entry = entry.map_err(|e| ResourceError::io(from, e))?;
        let source = entry.path();
        let target = to.join(entry.file_name());
        if source.is_dir() {
            copy_dir(&source, &target)?;
        } else {
            copy_file(&source, &target)?;
        }
    }
    Ok(())
}

pub fn write_file(path: &Path, content: &str) -> Result<(), ResourceError> {
    fs::write(path, content).map_err(|e| ResourceError::io(path, e))
}

/// Serialize `value` as pretty JSON into `dir/name`
pub fn write_json<T: Serialize>(dir: &Path, name: &str, value: &T) -> Result<(), ResourceError> {
    let path = dir.join(name);
    let json = serde_json::to_string_pretty(value).map_err(|e| ResourceError::Serialize {
        path: path.clone(),
        reason: e.to_string(),
    })?;
    write_file(&path, &json)
}

/// Write a script and mark it executable
pub fn write_script(dir: &Path, name: &str, content: &str) -> Result<(), ResourceError> {
    let script_path = dir.join(name);
    write_file(&script_path, content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(&script_path)
            .map_err(|e| ResourceError::io(&script_path, e))?
            .permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&script_path, perms).map_err(|e| ResourceError::io(&script_path, e))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_copy_dir_recursive() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        fs::create_dir_all(src.path().join("key1")).unwrap();
        fs::write(src.path().join("key1/nodekey"), "abc").unwrap();
        fs::write(src.path().join("top.txt"), "top").unwrap();

        copy_dir(src.path(), &dst.path().join("out")).unwrap();
        assert_eq!(fs::read_to_string(dst.path().join("out/key1/nodekey")).unwrap(), "abc");
        assert_eq!(fs::read_to_string(dst.path().join("out/top.txt")).unwrap(), "top");
    }

    #[test]
    fn test_missing_source_is_reported() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            copy_file(&missing, &dir.path().join("x")),
            Err(ResourceError::MissingFile(_))
        ));
        assert!(matches!(read_to_string(&missing), Err(ResourceError::MissingFile(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_write_script_is_executable() {
        use std::os::unix::fs::PermissionsExt;
        let dir = TempDir::new().unwrap();
        write_script(dir.path(), "start.sh", "#!/bin/bash\n").unwrap();
        let mode = fs::metadata(dir.path().join("start.sh")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}
