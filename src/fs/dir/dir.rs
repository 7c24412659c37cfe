use std::ffi::OsStr;
use std::fmt::{self, Display, Formatter};

use tracing::debug;

use super::{CreateDirError, NotADirError};
use crate::fs::path::{AbsPath, PathError};
use crate::fs::perm::FilePermission;
use crate::fs::{OsError, syscall};

/// A resolved directory path, along with the string it was originally created from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DirMgr {
    path: AbsPath,
    original: String,
}

impl DirMgr {
    pub fn new<P: AsRef<OsStr>>(dir_path: P) -> Result<DirMgr, PathError> {
        let original = dir_path.as_ref().to_string_lossy().into_owned();
        Ok(DirMgr {
            path: AbsPath::resolve(dir_path)?,
            original,
        })
    }

    pub fn from_abs(path: AbsPath) -> DirMgr {
        DirMgr {
            original: path.to_string(),
            path,
        }
    }

    pub fn path(&self) -> &AbsPath {
        &self.path
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    /// Whether the path currently refers to a directory. Any error from the OS reads as `false`.
    pub fn exists(&self) -> bool {
        is_dir(&self.path)
    }

    /// Creates this directory and any missing parents, as `mkdir -p` does.
    pub fn create_all(&self) -> Result<(), CreateDirError> {
        create_all(&self.path, FilePermission::DEFAULT_DIR)
    }

    pub fn create_all_with(&self, permission: FilePermission) -> Result<(), CreateDirError> {
        create_all(&self.path, permission)
    }

    /// The path of an entry directly (or, with separators, indirectly) inside this directory.
    pub fn join<P: AsRef<OsStr>>(&self, name: P) -> Result<AbsPath, PathError> {
        self.path.join(name)
    }
}

impl Display for DirMgr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)
    }
}

pub(crate) fn is_dir(path: &AbsPath) -> bool {
    syscall::stat(path.as_c_str()).is_ok_and(|meta| meta.is_dir())
}

pub(crate) fn create_all(path: &AbsPath, permission: FilePermission) -> Result<(), CreateDirError> {
    match syscall::stat(path.as_c_str()) {
        Ok(meta) if meta.is_dir() => return Ok(()),
        Ok(_) => Err(NotADirError { path: path.clone() })?,
        // Anything else is left for mkdir to report.
        Err(_) => (),
    }

    if let Some(parent) = path.parent() {
        create_all(&parent, permission)?;
    }

    match syscall::mkdir(path.as_c_str(), permission.permission_mode_t()) {
        Ok(()) => {
            debug!(path = %path, "created directory");
            Ok(())
        },
        // Lost a race with another creator, which is fine as long as a directory is what exists.
        Err(libc::EEXIST) if is_dir(path) => Ok(()),
        Err(e) => Err(OsError::from_errno("mkdir", path, e).into()),
    }
}
