//! Directory resolution and creation.
//!
//! [`DirMgr`] is the directory half of a [`FileLocation`](crate::fs::location::FileLocation): it
//! holds a resolved absolute path and can check for and create the directory tree it describes. It
//! doesn't hold a descriptor open, so it is cheap to clone and store.

mod dir;
mod error;

pub use dir::*;
pub use error::*;
