use std::fmt::{self, Debug, Formatter};

/// Prints the contained string as-is in [`Debug`] output, without quotes. Handy for showing flags
/// and modes as octal or hex literals.
pub struct DebugRaw(pub String);

impl Debug for DebugRaw {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
