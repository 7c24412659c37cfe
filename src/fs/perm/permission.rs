use std::fmt::{self, Debug, Display, Formatter};

use libc::mode_t;

use super::{EntryMarkerError, EntryTypeError, OctalDigitsError, PermissionError, PermissionSymbolError, SymbolicLengthError};
use crate::fs::{FileType, Metadata};
use crate::util::fmt::DebugRaw;

const PERMISSION_MASK: u32 = 0o777;
const SYMBOLS: [char; 3] = ['r', 'w', 'x'];

/// The access-control bits of a file system entry: an entry type and the 9 unix permission bits
/// for owner, group and other.
///
/// Once constructed, a `FilePermission` is always valid. Regular files may be described with no
/// entry-type bits at all (as in `0o644`) or with `S_IFREG` (as in `0o100644`). Both read as the
/// same permission, and a regular file's [`mode`](FilePermission::mode) never carries `S_IFREG`, so
/// a file with `-rw-r-----` reports `640` however its mode was obtained.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FilePermission {
    entry_type: FileType,
    bits: u32,
}

impl FilePermission {
    /// `-rw-r--r--`
    pub const DEFAULT_FILE: FilePermission = FilePermission {
        entry_type: FileType::Regular,
        bits: 0o644,
    };

    /// `drwxr-xr-x`
    pub const DEFAULT_DIR: FilePermission = FilePermission {
        entry_type: FileType::Directory,
        bits: 0o755,
    };

    /// Parses a 10-character symbolic string such as `-rwxr--r--` or `drwxr-x---`.
    ///
    /// The first character is the entry-type marker (see [`FileType::symbol`]). Each of the
    /// remaining 9 positions must hold either its own permission letter (`r`, `w` or `x`, in that
    /// repeating order) or `-`.
    pub fn from_symbolic(value: &str) -> Result<FilePermission, PermissionError> {
        let chars: Vec<char> = value.chars().collect();
        if chars.len() != 10 {
            Err(SymbolicLengthError(chars.len()))?
        }

        let entry_type = FileType::from_symbol(chars[0]).ok_or(EntryMarkerError(chars[0]))?;

        let mut bits = 0;
        for (i, &found) in chars[1..].iter().enumerate() {
            let expected = SYMBOLS[i % 3];
            if found == expected {
                bits |= 1 << (8 - i);
            } else if found != '-' {
                Err(PermissionSymbolError {
                    index: i + 1,
                    expected,
                    found,
                })?
            }
        }

        Ok(FilePermission { entry_type, bits })
    }

    /// Decomposes a numeric mode into its entry-type bits (`mode & !0o777`) and permission bits
    /// (`mode & 0o777`). The entry-type bits must be exactly one of the known entry types, so
    /// setuid, setgid and sticky bits are rejected here. `S_IFREG` is accepted and dropped.
    pub fn from_mode(mode: u32) -> Result<FilePermission, PermissionError> {
        let entry_bits = mode & !PERMISSION_MASK;

        let entry_type = match FileType::from_mode(entry_bits) {
            Some(entry_type) if entry_bits & !libc::S_IFMT == 0 => entry_type,
            _ => Err(EntryTypeError(entry_bits))?,
        };

        Ok(FilePermission {
            entry_type,
            bits: mode & PERMISSION_MASK,
        })
    }

    /// Reads `digits` as if it were written in octal, so `744` means `0o744` and `40755` means a
    /// directory with `0o755`. Any digit above 7 is rejected.
    pub fn from_octal_digits(digits: u32) -> Result<FilePermission, PermissionError> {
        let mut rem = digits;
        let mut mode = 0_u32;
        let mut shift = 0_u32;

        while rem > 0 {
            let digit = rem % 10;
            if digit > 7 {
                Err(OctalDigitsError(digits))?
            }
            mode |= digit << shift;
            rem /= 10;
            shift += 3;
        }

        FilePermission::from_mode(mode)
    }

    /// Takes the entry type and permission bits of an existing entry. Special bits (setuid, setgid
    /// and sticky) are not represented and are dropped.
    pub fn from_metadata(metadata: &Metadata) -> Result<FilePermission, PermissionError> {
        FilePermission::from_mode(metadata.mode & (libc::S_IFMT | PERMISSION_MASK))
    }

    /// The composed mode: entry-type bits OR'ed with the permission bits. Regular files have no
    /// entry-type bits here.
    pub const fn mode(&self) -> u32 {
        self.entry_type.mode_bits() | self.bits
    }

    pub const fn permission_bits(&self) -> u32 {
        self.bits
    }

    pub(crate) const fn permission_mode_t(&self) -> mode_t {
        self.bits as mode_t
    }

    /// The composed mode written out in octal digits, e.g. `744` for `-rwxr--r--`.
    pub fn octal_digits(&self) -> u32 {
        let mut rem = self.mode();
        let mut digits = 0_u32;
        let mut place = 1_u32;

        while rem > 0 {
            digits += (rem & 0o7) * place;
            rem >>= 3;
            place = place.saturating_mul(10);
        }

        digits
    }

    pub const fn entry_type(&self) -> FileType {
        self.entry_type
    }

    pub fn is_dir(&self) -> bool {
        self.entry_type.is_directory()
    }

    pub fn is_regular(&self) -> bool {
        self.entry_type.is_regular()
    }

    /// The 10-character symbolic form.
    pub fn symbolic(&self) -> String {
        let mut out = String::with_capacity(10);
        out.push(self.entry_type.symbol());
        for i in 0..9 {
            if self.bits & (1 << (8 - i)) != 0 {
                out.push(SYMBOLS[i % 3]);
            } else {
                out.push('-');
            }
        }
        out
    }
}

impl Default for FilePermission {
    fn default() -> Self {
        FilePermission::DEFAULT_FILE
    }
}

impl Display for FilePermission {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbolic())
    }
}

impl Debug for FilePermission {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilePermission")
            .field("symbolic", &DebugRaw(self.symbolic()))
            .field("mode", &DebugRaw(format!("0o{:o}", self.mode())))
            .finish()
    }
}
