use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use xxhash_rust::xxh3::xxh3_64;

/// The fundamental edit primitive: byte-span replacement.
///
/// Every patch rule compiles down to this. A rule finds its span with a regex,
/// then hands the span and the replacement text here.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "Edit does nothing until apply_to() is called"]
pub struct Edit {
    /// Starting byte offset (inclusive)
    pub byte_start: usize,
    /// Ending byte offset (exclusive)
    pub byte_end: usize,
    /// New text to insert at [byte_start, byte_end)
    pub new_text: String,
}

#[derive(Error, Debug)]
pub enum EditError {
    #[error("Invalid byte range: [{byte_start}, {byte_end}) in buffer of length {len}")]
    InvalidByteRange {
        byte_start: usize,
        byte_end: usize,
        len: usize,
    },

    #[error("Byte offset {0} is not on a UTF-8 character boundary")]
    NotCharBoundary(usize),

    #[error("{} changed on disk while it was being patched", path.display())]
    ChangedOnDisk { path: PathBuf },

    #[error("File I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Edit {
    pub fn new(byte_start: usize, byte_end: usize, new_text: impl Into<String>) -> Self {
        Self {
            byte_start,
            byte_end,
            new_text: new_text.into(),
        }
    }

    /// Splice this edit into `content`, returning the number of bytes written.
    pub fn apply_to(&self, content: &mut String) -> Result<usize, EditError> {
        if self.byte_start > self.byte_end || self.byte_end > content.len() {
            return Err(EditError::InvalidByteRange {
                byte_start: self.byte_start,
                byte_end: self.byte_end,
                len: content.len(),
            });
        }

        for offset in [self.byte_start, self.byte_end] {
            if !content.is_char_boundary(offset) {
                return Err(EditError::NotCharBoundary(offset));
            }
        }

        content.replace_range(self.byte_start..self.byte_end, &self.new_text);
        Ok(self.new_text.len())
    }
}

/// xxh3 hash of a file's bytes as they were read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingerprint(u64);

impl Fingerprint {
    pub fn of(bytes: &[u8]) -> Self {
        Fingerprint(xxh3_64(bytes))
    }
}

/// Write patched content over `path`, then bump its mtime.
///
/// Refuses with [`EditError::ChangedOnDisk`] when the file no longer hashes
/// to `read_as`. The write goes through a tempfile in the same directory
/// (fsync + rename) so a failure leaves the old file intact. Files with more
/// than one hard link, or in a directory that refuses new files, are
/// overwritten in place instead, which keeps links and ownership.
pub fn write_file(path: &Path, content: &[u8], read_as: Fingerprint) -> Result<(), EditError> {
    let current = fs::read(path)?;
    if Fingerprint::of(&current) != read_as {
        return Err(EditError::ChangedOnDisk {
            path: path.to_path_buf(),
        });
    }

    if has_other_links(path)? {
        debug!(file = %path.display(), "file is hard-linked, writing in place");
        fs::write(path, content)?;
    } else {
        // Same directory keeps the rename on one filesystem
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        match tempfile::NamedTempFile::new_in(parent) {
            Ok(mut temp) => {
                temp.write_all(content)?;
                temp.as_file().sync_all()?;
                // Keep the original permissions on the replacement file
                temp.as_file()
                    .set_permissions(fs::metadata(path)?.permissions())?;
                temp.persist(path).map_err(|e| e.error)?;
            }
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                debug!(file = %path.display(), "directory not writable, writing in place");
                fs::write(path, content)?;
            }
            Err(e) => return Err(e.into()),
        }
    }

    filetime::set_file_mtime(path, filetime::FileTime::now())?;

    Ok(())
}

#[cfg(unix)]
fn has_other_links(path: &Path) -> io::Result<bool> {
    use std::os::unix::fs::MetadataExt;
    Ok(fs::metadata(path)?.nlink() > 1)
}

#[cfg(not(unix))]
fn has_other_links(_path: &Path) -> io::Result<bool> {
    Ok(false)
}
