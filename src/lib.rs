//! A small file management library: one [`FileLocation`](fs::location::FileLocation) per file,
//! mediating every open, read, write, copy, move and delete against it.
//!
//! # Purpose
//! Most of the work here is plumbing, but it is plumbing that gets repeated everywhere: decompose a
//! path, make sure the directory exists, open with the right flags, wrap the handle in a buffer,
//! copy by streaming or by hard link and fall back to the other when the first one fails. This
//! crate does those things once, with strong types in place of flag integers and error strings.
//!
//! # Method
//! The [`fs`] module talks to the kernel through thin [`libc`] wrappers rather than [`std::fs`].
//! That keeps the open flags and permission bits bit-exact with what the platform expects and makes
//! the mapping from a request to a syscall easy to follow.
//!
//! # Error Handling
//! Every operation returns a [`Result`]. Errors are strongly typed: small structs that implement
//! [`Error`](std::error::Error), collected into enums so that `?` can carry them between layers. OS
//! failures keep the original errno as their source, together with the operation name and the
//! path(s) involved.
//!
//! The only panics are for states that mean memory or descriptor corruption, such as the kernel
//! reporting that a descriptor owned by this crate is invalid.
//!
//! # Concurrency
//! Each [`FileLocation`](fs::location::FileLocation) holds an exclusive lock that every public
//! method takes for the duration of the call. It stops two calls on the same instance from
//! interleaving, and nothing more: two instances (or two processes) pointed at the same path are
//! not aware of each other, and no OS-level file locking is used.
//!
//! # Dependencies
//! - `libc` for the syscall layer, behind the `fs` feature.
//! - `derive_more` for the error types, because writing `Display`, `Error` and `From` by hand for
//!   every one of them is very repetitive.
//! - `tracing` for diagnostic events. The library never installs a subscriber.
#![warn(clippy::missing_safety_doc)]
#![warn(clippy::undocumented_unsafe_blocks)]
#![warn(clippy::missing_panics_doc)]
#![warn(clippy::unwrap_used)]
#![allow(clippy::module_inception)]

#[cfg(feature = "fs")]
pub mod fs;

pub(crate) mod util;
