//! Text and binary file operations, arena-tracked per `spec.md` §3's
//! "Tracked file handle" and §6's `rt_text_file_open` contract.
//!
//! Every handle returned here is registered with the arena that opened
//! it (via [`Arena::track_file`]) and is auto-closed when that arena is
//! destroyed, or explicitly promoted to another arena's lifetime
//! (`spec.md` §5's ownership-transfer rule).

use crate::error::{Error, Result};
use emberc_mem::arena::FileHandle;
use emberc_mem::Arena;
use std::fs::OpenOptions;
use std::io::{Read, Write};
use std::path::Path;

fn io_error(path: &Path, err: std::io::Error) -> Error {
    Error::Io {
        path: Some(path.display().to_string()),
        message: err.to_string(),
    }
}

/// Opens `path` for text reading/writing and registers the handle with
/// `arena`. `rt_text_file_open`.
pub fn open_text(arena: &mut Arena, path: &Path) -> Result<FileHandle> {
    open(arena, path, true)
}

/// Opens `path` for binary reading/writing and registers the handle with
/// `arena`.
pub fn open_binary(arena: &mut Arena, path: &Path) -> Result<FileHandle> {
    open(arena, path, false)
}

fn open(arena: &mut Arena, path: &Path, is_text: bool) -> Result<FileHandle> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .open(path)
        .map_err(|e| io_error(path, e))?;
    Ok(arena.track_file(file, path.to_path_buf(), is_text))
}

/// Reads the entire remaining contents of a text file as a `String`.
///
/// # Safety
///
/// `handle` must be a live handle owned by some still-live arena.
pub unsafe fn read_all_text(mut handle: FileHandle) -> Result<String> {
    // SAFETY: caller guarantees a live handle.
    let node = unsafe { handle.as_mut() };
    let path = node.path().to_path_buf();
    let file = node.file_mut().ok_or_else(|| Error::Io {
        path: Some(path.display().to_string()),
        message: "file is closed".to_string(),
    })?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|e| io_error(&path, e))?;
    Ok(contents)
}

/// Reads the entire remaining contents of a binary file as raw bytes.
///
/// # Safety
///
/// `handle` must be a live handle owned by some still-live arena.
pub unsafe fn read_all_bytes(mut handle: FileHandle) -> Result<Vec<u8>> {
    // SAFETY: caller guarantees a live handle.
    let node = unsafe { handle.as_mut() };
    let path = node.path().to_path_buf();
    let file = node.file_mut().ok_or_else(|| Error::Io {
        path: Some(path.display().to_string()),
        message: "file is closed".to_string(),
    })?;
    let mut contents = Vec::new();
    file.read_to_end(&mut contents)
        .map_err(|e| io_error(&path, e))?;
    Ok(contents)
}

/// Writes `text` to a text file, appending to its current position.
///
/// # Safety
///
/// `handle` must be a live handle owned by some still-live arena.
pub unsafe fn write_text(mut handle: FileHandle, text: &str) -> Result<()> {
    // SAFETY: caller guarantees a live handle.
    let node = unsafe { handle.as_mut() };
    let path = node.path().to_path_buf();
    let file = node.file_mut().ok_or_else(|| Error::Io {
        path: Some(path.display().to_string()),
        message: "file is closed".to_string(),
    })?;
    file.write_all(text.as_bytes())
        .map_err(|e| io_error(&path, e))
}

/// Writes raw bytes to a binary file, appending to its current position.
///
/// # Safety
///
/// `handle` must be a live handle owned by some still-live arena.
pub unsafe fn write_bytes(mut handle: FileHandle, data: &[u8]) -> Result<()> {
    // SAFETY: caller guarantees a live handle.
    let node = unsafe { handle.as_mut() };
    let path = node.path().to_path_buf();
    let file = node.file_mut().ok_or_else(|| Error::Io {
        path: Some(path.display().to_string()),
        message: "file is closed".to_string(),
    })?;
    file.write_all(data).map_err(|e| io_error(&path, e))
}

/// Explicitly closes a handle and unlinks it from `arena`'s tracked-file
/// list. Idempotent.
pub fn close(arena: &mut Arena, handle: FileHandle) {
    arena.close_file(handle);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("round_trip.txt");
        let mut arena = Arena::new(None);
        let handle = open_text(&mut arena, &path).unwrap();
        // SAFETY: `handle` is live and owned by `arena`.
        unsafe {
            write_text(handle, "hello\n").unwrap();
        }
        arena.close_file(handle);
        let handle = open_text(&mut arena, &path).unwrap();
        // SAFETY: `handle` is live and owned by `arena`.
        let contents = unsafe { read_all_text(handle).unwrap() };
        assert_eq!(contents, "hello\n");
    }

    #[test]
    fn unclosed_handle_is_closed_by_arena_destroy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auto_close.txt");
        let mut arena = Arena::new(None);
        let handle = open_text(&mut arena, &path).unwrap();
        // SAFETY: `handle` is live.
        unsafe {
            write_text(handle, "hello\n").unwrap();
        }
        assert_eq!(arena.open_file_count(), 1);
        arena.destroy();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "hello\n"
        );
    }

    #[test]
    fn missing_path_is_a_resource_error() {
        let mut arena = Arena::new(None);
        let result = open_text(&mut arena, Path::new("/nonexistent/dir/file.txt"));
        assert!(result.is_err());
    }
}
