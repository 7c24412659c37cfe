//! Linux file management through thin `libc` wrappers.
//!
//! The entry point for most users is [`FileLocation`](location::FileLocation), which represents a
//! single file and mediates all I/O against it. The remaining modules are the pieces it is built
//! from and are usable on their own:
//! - [`perm`]: conversion between symbolic, octal and composed permission representations.
//! - [`path`]: absolute path resolution and sanitization.
//! - [`dir`]: directory existence checks and creation.
//! - [`file`]: open flags, access modes and an unbuffered [`File`](file::File) handle.
#![cfg(target_os = "linux")]

pub mod dir;
pub mod file;
pub mod location;
pub mod path;
pub mod perm;

mod error;
mod fd;
mod file_type;
mod metadata;
mod panic;
mod syscall;

pub use error::*;
pub(crate) use fd::*;
pub use file_type::*;
pub use metadata::*;
