//! Filesystem operations.

use super::ExecutionShim;
use crate::tools::ToolError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use walkdir::WalkDir;

/// How `write_file` treats an existing file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Replace the file's contents
    #[default]
    Overwrite,
    /// Add to the end of the file
    Append,
}

impl WriteMode {
    /// Parses the tool argument value.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "overwrite" => Some(Self::Overwrite),
            "append" => Some(Self::Append),
            _ => None,
        }
    }
}

/// Summary of a completed write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReport {
    /// The resolved path written to
    pub path: PathBuf,
    /// Number of bytes written by this call
    pub bytes_written: usize,
    /// Mode used
    pub mode: WriteMode,
}

impl fmt::Display for WriteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self.mode {
            WriteMode::Overwrite => "Wrote",
            WriteMode::Append => "Appended",
        };
        write!(f, "{verb} {} bytes to {}", self.bytes_written, self.path.display())
    }
}

/// Kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirEntry {
    /// Path relative to the listed directory
    pub name: String,
    pub kind: EntryKind,
    /// Size in bytes (files only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Last modified timestamp (ISO 8601, UTC)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
}

impl ExecutionShim {
    /// Reads a whole file.
    ///
    /// # Errors
    ///
    /// `NotFound`, `PermissionDenied`, or `Io` for anything else (including
    /// reading a directory).
    pub async fn read_file(&self, path: &str) -> Result<Vec<u8>, ToolError> {
        let resolved = self.resolve(path);
        tokio::fs::read(&resolved)
            .await
            .map_err(|e| ToolError::from_io(&resolved, &e))
    }

    /// Writes or appends `bytes` to a file, creating parent directories.
    ///
    /// # Errors
    ///
    /// `PermissionDenied` or `Io`.
    pub async fn write_file(
        &self,
        path: &str,
        bytes: &[u8],
        mode: WriteMode,
    ) -> Result<WriteReport, ToolError> {
        let resolved = self.resolve(path);

        if let Some(parent) = resolved.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| ToolError::from_io(parent, &e))?;
            }
        }

        match mode {
            WriteMode::Overwrite => tokio::fs::write(&resolved, bytes)
                .await
                .map_err(|e| ToolError::from_io(&resolved, &e))?,
            WriteMode::Append => {
                let mut file = tokio::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&resolved)
                    .await
                    .map_err(|e| ToolError::from_io(&resolved, &e))?;
                file.write_all(bytes)
                    .await
                    .map_err(|e| ToolError::from_io(&resolved, &e))?;
                file.flush()
                    .await
                    .map_err(|e| ToolError::from_io(&resolved, &e))?;
            }
        }

        tracing::debug!(path = %resolved.display(), bytes = bytes.len(), ?mode, "File written");
        Ok(WriteReport {
            path: resolved,
            bytes_written: bytes.len(),
            mode,
        })
    }

    /// Lists a directory, sorted by name.
    ///
    /// With `recursive`, descends up to `max_depth` levels (at least one).
    ///
    /// # Errors
    ///
    /// `NotFound` or `PermissionDenied` for the directory itself; `Io` if the
    /// path is not a directory or the walk fails.
    pub async fn list_directory(
        &self,
        path: &str,
        recursive: bool,
        max_depth: usize,
    ) -> Result<Vec<DirEntry>, ToolError> {
        let resolved = self.resolve(path);
        let metadata = tokio::fs::metadata(&resolved)
            .await
            .map_err(|e| ToolError::from_io(&resolved, &e))?;
        if !metadata.is_dir() {
            return Err(ToolError::io(format!(
                "{} is not a directory",
                resolved.display()
            )));
        }

        let depth = if recursive { max_depth.max(1) } else { 1 };
        tokio::task::spawn_blocking(move || walk(&resolved, depth))
            .await
            .map_err(|e| ToolError::io(format!("directory walk aborted: {e}")))?
    }
}

fn walk(root: &Path, depth: usize) -> Result<Vec<DirEntry>, ToolError> {
    let mut entries = Vec::new();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(depth)
        .sort_by_file_name();

    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            match e.io_error() {
                Some(io) => ToolError::from_io(path, io),
                None => ToolError::io(e.to_string()),
            }
        })?;

        let file_type = entry.file_type();
        let kind = if file_type.is_symlink() {
            EntryKind::Symlink
        } else if file_type.is_dir() {
            EntryKind::Dir
        } else {
            EntryKind::File
        };
        let metadata = entry.metadata().ok();
        let size = metadata
            .as_ref()
            .filter(|m| m.is_file())
            .map(std::fs::Metadata::len);
        let modified = metadata
            .as_ref()
            .and_then(|m| m.modified().ok())
            .map(format_time);
        let name = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .into_owned();

        entries.push(DirEntry {
            name,
            kind,
            size,
            modified,
        });
    }
    Ok(entries)
}

fn format_time(time: std::time::SystemTime) -> String {
    chrono::DateTime::<chrono::Utc>::from(time)
        .format("%Y-%m-%dT%H:%M:%SZ")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shim::ShimConfig;
    use crate::tools::ToolErrorCode;
    use std::fs;
    use tempfile::TempDir;

    fn shim(dir: &TempDir) -> ExecutionShim {
        ExecutionShim::new(ShimConfig::new(dir.path()))
    }

    #[tokio::test]
    async fn write_then_read_is_byte_identical() {
        let dir = TempDir::new().unwrap();
        let shim = shim(&dir);
        let bytes = "line one\nunicode: \u{00e9}\u{4e2d}\n\0tail".as_bytes();

        let report = shim
            .write_file("out/data.bin", bytes, WriteMode::Overwrite)
            .await
            .unwrap();
        assert_eq!(report.bytes_written, bytes.len());
        assert_eq!(shim.read_file("out/data.bin").await.unwrap(), bytes);
    }

    #[tokio::test]
    async fn append_adds_to_existing_content() {
        let dir = TempDir::new().unwrap();
        let shim = shim(&dir);
        shim.write_file("log.txt", b"a\n", WriteMode::Overwrite)
            .await
            .unwrap();
        let report = shim
            .write_file("log.txt", b"b\n", WriteMode::Append)
            .await
            .unwrap();
        assert_eq!(report.to_string(), format!("Appended 2 bytes to {}", dir.path().join("log.txt").display()));
        assert_eq!(fs::read(dir.path().join("log.txt")).unwrap(), b"a\nb\n");
    }

    #[tokio::test]
    async fn append_creates_missing_file() {
        let dir = TempDir::new().unwrap();
        shim(&dir)
            .write_file("new.txt", b"x", WriteMode::Append)
            .await
            .unwrap();
        assert_eq!(fs::read(dir.path().join("new.txt")).unwrap(), b"x");
    }

    #[tokio::test]
    async fn read_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let error = shim(&dir).read_file("missing.txt").await.unwrap_err();
        assert_eq!(error.code(), ToolErrorCode::NotFound);
    }

    #[tokio::test]
    async fn absolute_paths_are_not_confined() {
        let workspace = TempDir::new().unwrap();
        let elsewhere = TempDir::new().unwrap();
        let target = elsewhere.path().join("outside.txt");
        shim(&workspace)
            .write_file(target.to_str().unwrap(), b"escaped", WriteMode::Overwrite)
            .await
            .unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"escaped");
    }

    #[tokio::test]
    async fn list_directory_flat_and_recursive() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.txt"), "12345").unwrap();
        fs::create_dir_all(dir.path().join("a/inner")).unwrap();
        fs::write(dir.path().join("a/inner/deep.txt"), "x").unwrap();
        let shim = shim(&dir);

        let flat = shim.list_directory(".", false, 3).await.unwrap();
        let names: Vec<_> = flat.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b.txt"]);
        assert_eq!(flat[0].kind, EntryKind::Dir);
        assert_eq!(flat[1].size, Some(5));
        assert!(flat[1].modified.as_deref().is_some_and(|m| m.ends_with('Z')));

        let deep = shim.list_directory(".", true, 3).await.unwrap();
        assert!(deep.iter().any(|e| e.name == "a/inner/deep.txt"));

        let shallow = shim.list_directory(".", true, 2).await.unwrap();
        assert!(!shallow.iter().any(|e| e.name == "a/inner/deep.txt"));
        assert!(shallow.iter().any(|e| e.name == "a/inner"));
    }

    #[tokio::test]
    async fn list_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("f"), "x").unwrap();
        let error = shim(&dir).list_directory("f", false, 1).await.unwrap_err();
        assert!(error.to_string().contains("not a directory"));
    }

    #[test]
    fn write_mode_parse() {
        assert_eq!(WriteMode::parse("append"), Some(WriteMode::Append));
        assert_eq!(WriteMode::parse("overwrite"), Some(WriteMode::Overwrite));
        assert_eq!(WriteMode::parse("truncate"), None);
    }
}
