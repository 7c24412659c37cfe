use std::io;

use derive_more::{Display, Error};

use crate::fs::path::AbsPath;

/// A failed syscall against a single path. The errno reported by the kernel is kept as the source.
#[derive(Debug, Display, Error)]
#[display("{op} failed for '{path}': {source}")]
pub struct OsError {
    pub op: &'static str,
    pub path: AbsPath,
    pub source: io::Error,
}

impl OsError {
    pub(crate) fn new(op: &'static str, path: &AbsPath, source: io::Error) -> OsError {
        OsError {
            op,
            path: path.clone(),
            source,
        }
    }

    pub(crate) fn from_errno(op: &'static str, path: &AbsPath, errno: i32) -> OsError {
        OsError::new(op, path, io::Error::from_raw_os_error(errno))
    }

    /// Whether the kernel reported that the path (or one of its components) does not exist.
    pub fn is_not_found(&self) -> bool {
        self.source.kind() == io::ErrorKind::NotFound
    }
}

/// A failed syscall that involves two paths, such as creating a hard link.
#[derive(Debug, Display, Error)]
#[display("{op} failed from '{from}' to '{to}': {source}")]
pub struct OsPairError {
    pub op: &'static str,
    pub from: AbsPath,
    pub to: AbsPath,
    pub source: io::Error,
}

impl OsPairError {
    pub(crate) fn new(op: &'static str, from: &AbsPath, to: &AbsPath, source: io::Error) -> OsPairError {
        OsPairError {
            op,
            from: from.clone(),
            to: to.clone(),
            source,
        }
    }

    pub(crate) fn from_errno(op: &'static str, from: &AbsPath, to: &AbsPath, errno: i32) -> OsPairError {
        OsPairError::new(op, from, to, io::Error::from_raw_os_error(errno))
    }

    pub fn is_cross_device(&self) -> bool {
        self.source.raw_os_error() == Some(libc::EXDEV)
    }
}
