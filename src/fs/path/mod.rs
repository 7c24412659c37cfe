//! Absolute path resolution.
//!
//! Every path handled by this crate is resolved to an [`AbsPath`] up front: relative paths are
//! joined onto the current working directory, then repeated slashes, `.` and `..` components are
//! removed. The result is stored NUL-terminated so it can be passed to syscalls without copying.
//!
//! Symlinks are not resolved, so `..` is applied lexically.

mod abs_path;
mod error;
mod sanitize;

pub use abs_path::*;
pub use error::*;
pub(crate) use sanitize::*;
