use derive_more::{Display, Error, From};

#[derive(Debug, Display, Error)]
#[display("symbolic permission must be exactly 10 characters, found {_0}")]
pub struct SymbolicLengthError(#[error(not(source))] pub usize);

#[derive(Debug, Display, Error)]
#[display("'{_0}' is not a recognized entry type marker")]
pub struct EntryMarkerError(#[error(not(source))] pub char);

#[derive(Debug, Display, Error)]
#[display("expected '{expected}' or '-' at position {index}, found '{found}'")]
pub struct PermissionSymbolError {
    pub index: usize,
    pub expected: char,
    pub found: char,
}

#[derive(Debug, Display, Error)]
#[display("entry type bits 0o{_0:o} do not match a known entry type")]
pub struct EntryTypeError(#[error(not(source))] pub u32);

#[derive(Debug, Display, Error)]
#[display("{_0} is not a valid sequence of octal digits")]
pub struct OctalDigitsError(#[error(not(source))] pub u32);

#[derive(Debug, Display, From, Error)]
pub enum PermissionError {
    SymbolicLength(SymbolicLengthError),
    EntryMarker(EntryMarkerError),
    PermissionSymbol(PermissionSymbolError),
    EntryType(EntryTypeError),
    OctalDigits(OctalDigitsError),
}
