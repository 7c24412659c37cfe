use std::ffi::CStr;
use std::fmt::{self, Debug, Formatter};
use std::io;
use std::mem::{ManuallyDrop, MaybeUninit};
use std::ops::Deref;

use libc::{EBADF, EFAULT, c_int, mode_t, stat as Stat};
use tracing::error;

use crate::fs::Metadata;
use crate::fs::panic::{BadFdPanic, BadStackAddrPanic, Panic};
use crate::fs::syscall::err_no;

/// An owned file descriptor, closed when dropped.
pub(crate) struct Fd(pub c_int);

impl Fd {
    pub fn open(pathname: &CStr, flags: c_int, mode: mode_t) -> Result<Fd, c_int> {
        // SAFETY: pathname is a valid NUL-terminated string that outlives the call.
        match unsafe { libc::open(pathname.as_ptr(), flags, mode as libc::c_uint) } {
            -1 => Err(err_no()),
            fd => Ok(Fd(fd)),
        }
    }

    pub fn metadata(&self) -> io::Result<Metadata> {
        let mut raw_meta: MaybeUninit<Stat> = MaybeUninit::uninit();
        // SAFETY: raw_meta is large enough for a stat and self.0 is owned by this Fd.
        if unsafe { libc::fstat(self.0, raw_meta.as_mut_ptr()) } == -1 {
            match err_no() {
                EBADF => BadFdPanic.panic(),
                EFAULT => BadStackAddrPanic.panic(),
                e => return Err(io::Error::from_raw_os_error(e)),
            }
        }
        // SAFETY: fstat either initializes raw_meta or returns an error and diverges.
        let raw = unsafe { raw_meta.assume_init() };

        Ok(Metadata::from_stat(raw))
    }

    pub fn sync(&self) -> io::Result<()> {
        // SAFETY: There is no memory management here and any returned errors are handled.
        if unsafe { libc::fsync(self.0) } == -1 {
            match err_no() {
                EBADF => BadFdPanic.panic(),
                // Not every file supports syncing, which isn't a reason to fail a flush.
                libc::EROFS | libc::EINVAL => (),
                e => return Err(io::Error::from_raw_os_error(e)),
            }
        }
        Ok(())
    }

    pub fn close(self) -> io::Result<()> {
        // close invalidates the descriptor regardless of the outcome, so Drop must not run again.
        let this = ManuallyDrop::new(self);
        // SAFETY: The descriptor is owned by this Fd and is never used after this call.
        if unsafe { libc::close(this.0) } == -1 {
            match err_no() {
                EBADF => BadFdPanic.panic(),
                e => return Err(io::Error::from_raw_os_error(e)),
            }
        }
        Ok(())
    }
}

impl Deref for Fd {
    type Target = c_int;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Drop for Fd {
    fn drop(&mut self) {
        // SAFETY: After this, the file descriptor is invalidated but we are dropping self so it
        // doesn't matter.
        if unsafe { libc::close(self.0) } == -1 {
            error!(
                fd = self.0,
                error = %io::Error::from_raw_os_error(err_no()),
                "error while dropping file descriptor"
            );
        }
    }
}

impl Debug for Fd {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Fd({})", self.0)
    }
}
