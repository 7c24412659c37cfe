use std::io::{self, Read, Seek, SeekFrom, Write};

use libc::{SEEK_CUR, SEEK_END, SEEK_SET, off_t};

use super::{AccessMode, OpenError, OpenOptions};
use crate::fs::path::AbsPath;
use crate::fs::syscall::err_no;
use crate::fs::{Fd, Metadata};

/// An open, unbuffered file. The descriptor is closed when the `File` is dropped, or explicitly
/// with [`close`](File::close) to observe any error.
#[derive(Debug)]
pub struct File {
    pub(crate) fd: Fd,
    pub(crate) access: AccessMode,
}

impl File {
    pub fn open(file_path: &AbsPath, options: &OpenOptions) -> Result<File, OpenError> {
        options.open(file_path)
    }

    pub fn open_read_only(file_path: &AbsPath) -> Result<File, OpenError> {
        OpenOptions::read_only().open(file_path)
    }

    pub const fn access(&self) -> AccessMode {
        self.access
    }

    pub fn metadata(&self) -> io::Result<Metadata> {
        self.fd.metadata()
    }

    /// Flushes the kernel's buffers for this file to the storage device.
    pub fn sync(&self) -> io::Result<()> {
        self.fd.sync()
    }

    pub fn close(self) -> io::Result<()> {
        self.fd.close()
    }
}

impl Read for File {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        // SAFETY: buf is valid for writes of buf.len() bytes for the duration of the call.
        match unsafe { libc::read(*self.fd, buf.as_mut_ptr().cast(), buf.len()) } {
            -1 => Err(io::Error::from_raw_os_error(err_no())),
            count => Ok(count as usize),
        }
    }
}

impl Write for File {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // SAFETY: buf is valid for reads of buf.len() bytes for the duration of the call.
        match unsafe { libc::write(*self.fd, buf.as_ptr().cast(), buf.len()) } {
            -1 => Err(io::Error::from_raw_os_error(err_no())),
            count => Ok(count as usize),
        }
    }

    /// Writes go straight to the kernel, so there is nothing to flush here. Use
    /// [`sync`](File::sync) to reach the storage device.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for File {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let (offset, whence) = match pos {
            SeekFrom::Start(offset) => (
                off_t::try_from(offset).map_err(|_| io::Error::from(io::ErrorKind::InvalidInput))?,
                SEEK_SET,
            ),
            SeekFrom::Current(offset) => (offset as off_t, SEEK_CUR),
            SeekFrom::End(offset) => (offset as off_t, SEEK_END),
        };

        // SAFETY: lseek only operates on the descriptor, which is owned by this File.
        match unsafe { libc::lseek(*self.fd, offset, whence) } {
            -1 => Err(io::Error::from_raw_os_error(err_no())),
            position => Ok(position as u64),
        }
    }
}
