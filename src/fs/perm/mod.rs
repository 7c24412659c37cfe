//! File permissions in the three representations they show up in: a 10-character symbolic string
//! (`-rwxr--r--`), octal digits (`744`) and a composed mode value (entry-type bits OR'ed with the 9
//! permission bits).
//!
//! Conversion is lossless in both directions and validation is all-or-nothing: a partially valid
//! string or mode is rejected as a whole.

mod error;
mod permission;

pub use error::*;
pub use permission::*;
