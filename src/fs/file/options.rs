use std::fmt::{self, Debug, Formatter};

use libc::{O_APPEND, O_CLOEXEC, O_CREAT, O_EXCL, O_SYNC, O_TRUNC, c_int};
use tracing::debug;

use super::{AccessMode, File, InvalidOpenError, OpenError};
use crate::fs::dir;
use crate::fs::path::AbsPath;
use crate::fs::perm::FilePermission;
use crate::fs::{Fd, OsError};
use crate::util::fmt::DebugRaw;

/// A builder for opening files, made of one [`AccessMode`] and any combination of the create,
/// exclusive, append, truncate and sync flags. The flags map directly onto the platform's `open(2)`
/// flag bits.
///
/// The named constructors cover the common combinations, and the setters adjust individual flags
/// from there:
/// ```
/// # use filemech::fs::file::OpenOptions;
/// let mut options = OpenOptions::write_only();
/// options.create(true).append(true);
/// assert_eq!(options, OpenOptions::write_only_append());
/// ```
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct OpenOptions {
    pub(crate) access: AccessMode,
    pub(crate) flags: c_int,
    pub(crate) permission: FilePermission,
    pub(crate) create_dirs: bool,
}

macro_rules! set_flag {
    ($self:ident, $value:expr, $flag:expr) => {
        if $value {
            $self.flags |= $flag;
        } else {
            $self.flags &= !$flag;
        }
    };
}

macro_rules! get_flag {
    ($self:ident, $flag:expr) => {
        $self.flags & $flag != 0
    };
}

impl OpenOptions {
    pub const fn new(access: AccessMode) -> OpenOptions {
        OpenOptions {
            access,
            flags: 0,
            permission: FilePermission::DEFAULT_FILE,
            create_dirs: false,
        }
    }

    pub const fn read_only() -> OpenOptions {
        OpenOptions::new(AccessMode::ReadOnly)
    }

    pub const fn write_only() -> OpenOptions {
        OpenOptions::new(AccessMode::WriteOnly)
    }

    /// Write-only, creating the file if missing and writing at its end.
    pub const fn write_only_append() -> OpenOptions {
        let mut options = OpenOptions::write_only();
        options.flags = O_CREAT | O_APPEND;
        options
    }

    /// Write-only, creating the file if missing and emptying it otherwise.
    pub const fn write_only_truncate() -> OpenOptions {
        let mut options = OpenOptions::write_only();
        options.flags = O_CREAT | O_TRUNC;
        options
    }

    pub const fn read_write() -> OpenOptions {
        OpenOptions::new(AccessMode::ReadWrite)
    }

    /// Read-write, creating the file if missing and emptying it otherwise.
    pub const fn read_write_create_truncate() -> OpenOptions {
        let mut options = OpenOptions::read_write();
        options.flags = O_CREAT | O_TRUNC;
        options
    }

    pub const fn access(&self) -> AccessMode {
        self.access
    }

    /// The complete flag set passed to `open(2)`, excluding `O_CLOEXEC` which is always added.
    pub const fn flags(&self) -> c_int {
        self.flags | self.access.flags()
    }

    pub const fn permission(&self) -> FilePermission {
        self.permission
    }

    pub const fn creates(&self) -> bool {
        get_flag!(self, O_CREAT)
    }

    pub const fn creates_dirs(&self) -> bool {
        self.create_dirs
    }

    pub const fn set_access(&mut self, access: AccessMode) -> &mut Self {
        self.access = access;
        self
    }

    /// The permission given to a newly created file, before the process umask is applied.
    pub const fn mode(&mut self, permission: FilePermission) -> &mut Self {
        self.permission = permission;
        self
    }

    pub const fn create(&mut self, value: bool) -> &mut Self {
        set_flag!(self, value, O_CREAT);
        self
    }

    /// Create the file and fail if it already exists. Disabling this keeps `O_CREAT` as it is.
    pub const fn create_new(&mut self, value: bool) -> &mut Self {
        if value {
            self.flags |= O_CREAT | O_EXCL;
        } else {
            self.flags &= !O_EXCL;
        }
        self
    }

    pub const fn append(&mut self, value: bool) -> &mut Self {
        set_flag!(self, value, O_APPEND);
        self
    }

    pub const fn truncate(&mut self, value: bool) -> &mut Self {
        set_flag!(self, value, O_TRUNC);
        self
    }

    pub const fn force_sync(&mut self, value: bool) -> &mut Self {
        set_flag!(self, value, O_SYNC);
        self
    }

    /// When creating, also create any missing directories above the file.
    pub const fn create_dirs(&mut self, value: bool) -> &mut Self {
        self.create_dirs = value;
        self
    }

    /// Rejects flag combinations that have no defined meaning.
    pub fn validate(&self) -> Result<(), InvalidOpenError> {
        if self.access.is_read_only() {
            if get_flag!(self, O_TRUNC) {
                Err(InvalidOpenError { flag: "truncate" })?
            }
            if get_flag!(self, O_APPEND) {
                Err(InvalidOpenError { flag: "append" })?
            }
        }
        Ok(())
    }

    pub fn open(&self, file_path: &AbsPath) -> Result<File, OpenError> {
        self.validate()?;

        if self.create_dirs && self.creates() && let Some(parent) = file_path.parent() {
            dir::create_all(&parent, FilePermission::DEFAULT_DIR)?;
        }

        let fd = Fd::open(
            file_path.as_c_str(),
            self.flags() | O_CLOEXEC,
            self.permission.permission_mode_t(),
        )
        .map_err(|e| OsError::from_errno("open", file_path, e))?;

        debug!(path = %file_path, options = ?self, "opened file");
        Ok(File {
            fd,
            access: self.access,
        })
    }
}

impl Default for OpenOptions {
    fn default() -> Self {
        OpenOptions::read_only()
    }
}

impl Debug for OpenOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenOptions")
            .field("access", &self.access)
            .field("mode", &DebugRaw(format!("0o{:o}", self.permission.mode())))
            .field("create", &get_flag!(self, O_CREAT))
            .field("exclusive", &get_flag!(self, O_EXCL))
            .field("append", &get_flag!(self, O_APPEND))
            .field("truncate", &get_flag!(self, O_TRUNC))
            .field("force_sync", &get_flag!(self, O_SYNC))
            .field("create_dirs", &self.create_dirs)
            .finish()
    }
}
