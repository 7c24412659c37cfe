use std::error::Error;

use derive_more::{Display, Error};

/// An error that is never returned, because it means that an invariant the crate relies on no
/// longer holds.
pub trait Panic: Error {
    fn panic(&self) -> ! {
        panic!("{}", self)
    }
}

#[derive(Debug, Display, Error)]
#[display("file descriptor corruption")]
pub struct BadFdPanic;
impl Panic for BadFdPanic {}

#[derive(Debug, Display, Error)]
#[display("pointer exceeded stack space")]
pub struct BadStackAddrPanic;
impl Panic for BadStackAddrPanic {}
