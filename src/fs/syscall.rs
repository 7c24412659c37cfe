use std::ffi::CStr;
use std::io;
use std::mem::MaybeUninit;

use libc::{c_int, mode_t, stat as Stat};

use crate::fs::Metadata;

pub(crate) fn err_no() -> c_int {
    // SAFETY: raw_os_error guarantees Some if constructed from last_os_error.
    unsafe { io::Error::last_os_error().raw_os_error().unwrap_unchecked() }
}

/// Follows symlinks, so the metadata describes the entry that the path ultimately refers to.
pub(crate) fn stat(path: &CStr) -> Result<Metadata, c_int> {
    let mut raw_meta: MaybeUninit<Stat> = MaybeUninit::uninit();
    // SAFETY: path is a valid NUL-terminated string and raw_meta is large enough for a stat.
    if unsafe { libc::stat(path.as_ptr(), raw_meta.as_mut_ptr()) } == -1 {
        return Err(err_no());
    }
    // SAFETY: stat either initializes raw_meta or returns -1, which is handled above.
    let raw = unsafe { raw_meta.assume_init() };

    Ok(Metadata::from_stat(raw))
}

pub(crate) fn link(from: &CStr, to: &CStr) -> Result<(), c_int> {
    // SAFETY: Both paths are valid NUL-terminated strings that outlive the call.
    match unsafe { libc::link(from.as_ptr(), to.as_ptr()) } {
        -1 => Err(err_no()),
        _ => Ok(()),
    }
}

pub(crate) fn unlink(path: &CStr) -> Result<(), c_int> {
    // SAFETY: path is a valid NUL-terminated string that outlives the call.
    match unsafe { libc::unlink(path.as_ptr()) } {
        -1 => Err(err_no()),
        _ => Ok(()),
    }
}

pub(crate) fn chmod(path: &CStr, mode: mode_t) -> Result<(), c_int> {
    // SAFETY: path is a valid NUL-terminated string that outlives the call.
    match unsafe { libc::chmod(path.as_ptr(), mode) } {
        -1 => Err(err_no()),
        _ => Ok(()),
    }
}

pub(crate) fn mkdir(path: &CStr, mode: mode_t) -> Result<(), c_int> {
    // SAFETY: path is a valid NUL-terminated string that outlives the call.
    match unsafe { libc::mkdir(path.as_ptr(), mode) } {
        -1 => Err(err_no()),
        _ => Ok(()),
    }
}
