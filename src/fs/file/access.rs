use libc::{O_RDONLY, O_RDWR, O_WRONLY, c_int};

use derive_more::IsVariant;

/// Which directions of I/O a file is opened for. Exactly one of these is part of every open call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IsVariant)]
pub enum AccessMode {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl AccessMode {
    pub const fn flags(&self) -> c_int {
        match self {
            AccessMode::ReadOnly => O_RDONLY,
            AccessMode::WriteOnly => O_WRONLY,
            AccessMode::ReadWrite => O_RDWR,
        }
    }

    pub const fn can_read(&self) -> bool {
        matches!(self, AccessMode::ReadOnly | AccessMode::ReadWrite)
    }

    pub const fn can_write(&self) -> bool {
        matches!(self, AccessMode::WriteOnly | AccessMode::ReadWrite)
    }
}
