use std::io;

use derive_more::{Display, Error, From};

#[derive(Debug, Display, Error)]
#[display("path is empty")]
pub struct EmptyPathError;

#[derive(Debug, Display, Error)]
#[display("path contains a NUL byte")]
pub struct NulByteError;

#[derive(Debug, Display, Error)]
#[display("path '{_0}' has no file name")]
pub struct NoFileNameError(#[error(not(source))] pub String);

#[derive(Debug, Display, Error)]
#[display("file name in '{_0}' is not valid UTF-8")]
pub struct NonUtf8FileNameError(#[error(not(source))] pub String);

#[derive(Debug, Display, Error)]
#[display("current working directory is unavailable: {source}")]
pub struct CwdError {
    pub source: io::Error,
}

#[derive(Debug, Display, From, Error)]
pub enum PathError {
    Empty(EmptyPathError),
    NulByte(NulByteError),
    NoFileName(NoFileNameError),
    NonUtf8FileName(NonUtf8FileNameError),
    Cwd(CwdError),
}
