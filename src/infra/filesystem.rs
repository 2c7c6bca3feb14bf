//! Filesystem operations
//!
//! Handles file and directory operations, including materializing
//! [`Directory`] values on disk.

use std::path::Path;
use walkdir::WalkDir;

use crate::core::container::{ContextEntry, Directory, HostTree};
use crate::error::FilesystemError;

/// Create a directory and all parent directories
pub fn create_dir_all(path: &Path) -> Result<(), FilesystemError> {
    std::fs::create_dir_all(path).map_err(|e| FilesystemError::CreateDir {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Remove a directory and all its contents
pub fn remove_dir_all(path: &Path) -> Result<(), FilesystemError> {
    if path.exists() {
        std::fs::remove_dir_all(path).map_err(|e| FilesystemError::RemoveDir {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
    }
    Ok(())
}

/// Write content to a file
pub fn write_file(path: &Path, content: &str) -> Result<(), FilesystemError> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    std::fs::write(path, content).map_err(|e| FilesystemError::WriteFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Read content from a file
pub fn read_file(path: &Path) -> Result<String, FilesystemError> {
    std::fs::read_to_string(path).map_err(|e| FilesystemError::ReadFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Copy a host tree into `dest`, skipping ignored entries
///
/// Symbolic links are resolved and their targets copied as regular files
/// or directories. Dangling links, link cycles and special files are
/// errors. Returns the number of files copied.
pub fn copy_tree(tree: &HostTree, dest: &Path) -> Result<usize, FilesystemError> {
    create_dir_all(dest)?;

    let walker = WalkDir::new(&tree.path)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| {
            let Ok(relative) = entry.path().strip_prefix(&tree.path) else {
                return true;
            };
            !tree.ignore.is_ignored(relative, entry.file_type().is_dir())
        });

    let mut copied = 0;
    for entry in walker {
        let entry = entry.map_err(|e| FilesystemError::ReadFile {
            path: e.path().unwrap_or(tree.path.as_path()).to_path_buf(),
            error: e.to_string(),
        })?;

        let Ok(relative) = entry.path().strip_prefix(&tree.path) else {
            continue;
        };
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                create_dir_all(parent)?;
            }
            if entry.path_is_symlink() {
                tracing::debug!("Copying link target of {}", entry.path().display());
            }
            std::fs::copy(entry.path(), &target).map_err(|e| FilesystemError::Copy {
                from: entry.path().to_path_buf(),
                to: target.clone(),
                error: e.to_string(),
            })?;
            copied += 1;
        } else {
            return Err(FilesystemError::Copy {
                from: entry.path().to_path_buf(),
                to: target,
                error: "not a regular file or directory".to_string(),
            });
        }
    }

    Ok(copied)
}

/// Write every entry of a directory value below `dest`
pub fn write_directory(dir: &Directory, dest: &Path) -> Result<(), FilesystemError> {
    create_dir_all(dest)?;
    for (path, entry) in dir.entries() {
        let target = dest.join(path);
        match entry {
            ContextEntry::File { contents } => write_file(&target, contents)?,
            ContextEntry::Tree { tree } => {
                let copied = copy_tree(tree, &target)?;
                tracing::debug!("Copied {} files into {}", copied, target.display());
            }
        }
    }
    Ok(())
}
