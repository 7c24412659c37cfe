//! Opening files with explicit access modes and flags.
//!
//! [`OpenOptions`] is a builder over the platform's `open(2)` flags: exactly one [`AccessMode`],
//! combined with any of create, exclusive create, append, truncate and sync. The resulting
//! [`File`] is unbuffered and implements [`Read`](std::io::Read), [`Write`](std::io::Write) and
//! [`Seek`](std::io::Seek), so the standard buffered wrappers can be layered on top of it.

mod access;
mod error;
mod file;
mod options;

pub use access::*;
pub use error::*;
pub use file::*;
pub use options::*;
