use derive_more::{Display, Error, From};

use crate::fs::OsError;
use crate::fs::path::AbsPath;

#[derive(Debug, Display, Error)]
#[display("'{path}' exists but is not a directory")]
pub struct NotADirError {
    pub path: AbsPath,
}

#[derive(Debug, Display, From, Error)]
pub enum CreateDirError {
    NotADir(NotADirError),
    Os(OsError),
}
