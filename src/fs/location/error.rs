use derive_more::{Display, Error, From};

use crate::fs::dir::CreateDirError;
use crate::fs::file::{InvalidOpenError, OpenError};
use crate::fs::path::{AbsPath, PathError};
use crate::fs::perm::PermissionError;
use crate::fs::{OsError, OsPairError};

#[derive(Debug, Display, Error)]
#[display("'{path}' does not exist")]
pub struct NotFoundError {
    pub path: AbsPath,
}

#[derive(Debug, Display, Error)]
#[display("'{path}' is not a regular file")]
pub struct NotRegularError {
    pub path: AbsPath,
}

#[derive(Debug, Display, Error)]
#[display("'{from}' and '{to}' are the same file")]
pub struct SameFileError {
    pub from: AbsPath,
    pub to: AbsPath,
}

#[derive(Debug, Display, Error)]
#[display("directory '{path}' does not exist")]
pub struct MissingDirError {
    pub path: AbsPath,
}

#[derive(Debug, Display, Error)]
#[display("'{path}' is not open for {direction}")]
pub struct NotOpenError {
    pub path: AbsPath,
    pub direction: &'static str,
}

#[derive(Debug, Display, Error)]
#[display("short write to '{path}': wrote {written} of {expected} bytes")]
pub struct ShortWriteError {
    pub path: AbsPath,
    pub written: usize,
    pub expected: usize,
}

#[derive(Debug, Display, Error)]
#[display("copied {copied} of {expected} bytes from '{from}' to '{to}'")]
pub struct ShortCopyError {
    pub from: AbsPath,
    pub to: AbsPath,
    pub copied: u64,
    pub expected: u64,
}

#[derive(Debug, Display, Error)]
#[display("data read from '{path}' is not valid UTF-8 after byte {valid_up_to}")]
pub struct EncodingError {
    pub path: AbsPath,
    pub valid_up_to: usize,
}

/// Both techniques of a composite copy failed. The second attempt's error is the one reported (and
/// the [`source`](std::error::Error::source)); the first is kept for diagnostics.
#[derive(Debug, Display, Error)]
#[display("{second} (after the first attempt failed: {first})")]
pub struct FallbackError {
    #[error(not(source))]
    pub first: Box<FileError>,
    #[error(source)]
    pub second: Box<FileError>,
}

/// A move copied the file but could not delete the source afterwards, so both files now exist.
/// Nothing is rolled back.
#[derive(Debug, Display, Error)]
#[display("moved '{from}' to '{to}' but the source could not be removed: {source}")]
pub struct SourceNotRemovedError {
    pub from: AbsPath,
    pub to: AbsPath,
    pub source: OsError,
}

#[derive(Debug, Display, From, Error)]
pub enum FileError {
    Path(PathError),
    Permission(PermissionError),
    InvalidOpen(InvalidOpenError),
    CreateDir(CreateDirError),
    Os(OsError),
    OsPair(OsPairError),
    NotFound(NotFoundError),
    NotRegular(NotRegularError),
    SameFile(SameFileError),
    MissingDir(MissingDirError),
    NotOpen(NotOpenError),
    ShortWrite(ShortWriteError),
    ShortCopy(ShortCopyError),
    Encoding(EncodingError),
    Fallback(FallbackError),
    SourceNotRemoved(SourceNotRemovedError),
}

impl From<OpenError> for FileError {
    fn from(value: OpenError) -> Self {
        match value {
            OpenError::InvalidOpen(e) => e.into(),
            OpenError::CreateDir(e) => e.into(),
            OpenError::Os(e) => e.into(),
        }
    }
}

impl FileError {
    /// Whether this error means that a required file or directory is missing, either as detected
    /// up front or as reported by the OS.
    pub fn is_not_found(&self) -> bool {
        match self {
            FileError::NotFound(_) | FileError::MissingDir(_) => true,
            FileError::Os(e) => e.is_not_found(),
            FileError::Fallback(e) => e.second.is_not_found(),
            _ => false,
        }
    }
}
