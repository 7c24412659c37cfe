//! [`FileLocation`]: one file on the file system and every I/O operation against it.
//!
//! A location is built from a path (or a directory and a file name) and decomposes it into
//! directory, base name and extension. It can then open the file with an explicit access mode,
//! read and write through buffered wrappers, and copy, move or delete it.
//!
//! # Handle lifecycle
//! The handle moves between the states of [`HandleState`]: `Unopened` until the first open, one of
//! the `Open*` states while open, and `Closed` afterwards. Opening again from `Closed` is allowed.
//! Reads and writes open the file on demand, reopening it when the current handle has the wrong
//! access mode.
//!
//! # Copying
//! Copies use one of two techniques: streaming the bytes through a buffer, or creating a hard link.
//! A [`CopyStrategy`] picks one technique, or an ordered pair where the second is only tried if the
//! first fails. See the [`copy`] module.
//!
//! # Locking
//! Every public method locks the location for the duration of the call. Copies and moves lock both
//! locations, always in the same (address) order. Nothing here protects against other locations or
//! processes using the same path.

pub mod copy;

mod error;
mod file_location;
mod stream;
mod tests;

pub use copy::{CopyOptions, CopyStrategy, CopyTechnique};
pub use error::*;
pub use file_location::*;
