use derive_more::{Display, Error, From};

use crate::fs::OsError;
use crate::fs::dir::CreateDirError;

#[derive(Debug, Display, Error)]
#[display("{flag} cannot be combined with read-only access")]
pub struct InvalidOpenError {
    pub flag: &'static str,
}

#[derive(Debug, Display, From, Error)]
pub enum OpenError {
    InvalidOpen(InvalidOpenError),
    CreateDir(CreateDirError),
    Os(OsError),
}
