use std::env;
use std::ffi::{CStr, CString, OsStr};
use std::fmt::{self, Debug, Display, Formatter};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use super::{
    CwdError, EmptyPathError, NoFileNameError, NonUtf8FileNameError, NulByteError, PathError, sanitize,
};

/// An absolute, sanitized path.
///
/// # Invariants
/// - The string starts with '/'.
/// - The string contains no repeated '/' characters and no "." or ".." components.
/// - The string contains no trailing '/', unless it is the root.
/// - The string contains no interior NUL, so it is always a valid C string.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct AbsPath {
    pub(crate) inner: CString,
}

impl AbsPath {
    pub fn root() -> AbsPath {
        AbsPath {
            inner: c"/".to_owned(),
        }
    }

    /// Resolves `raw` against the current working directory (if it is relative) and sanitizes it.
    /// Leading and trailing whitespace is ignored.
    pub fn resolve<P: AsRef<OsStr>>(raw: P) -> Result<AbsPath, PathError> {
        let bytes = raw.as_ref().as_bytes().trim_ascii();

        if bytes.is_empty() {
            Err(EmptyPathError)?
        }
        if bytes.contains(&b'\0') {
            Err(NulByteError)?
        }

        if bytes.first() == Some(&b'/') {
            AbsPath::from_sanitized(sanitize(bytes))
        } else {
            let cwd = env::current_dir().map_err(|source| CwdError { source })?;
            let mut joined = cwd.into_os_string().into_encoded_bytes();
            joined.push(b'/');
            joined.extend_from_slice(bytes);
            AbsPath::from_sanitized(sanitize(&joined))
        }
    }

    fn from_sanitized(bytes: Vec<u8>) -> Result<AbsPath, PathError> {
        Ok(AbsPath {
            inner: CString::new(bytes).map_err(|_| NulByteError)?,
        })
    }

    /// Appends a relative path, which may itself contain several components.
    pub fn join<P: AsRef<OsStr>>(&self, rel: P) -> Result<AbsPath, PathError> {
        let rel = rel.as_ref().as_bytes();
        if rel.contains(&b'\0') {
            Err(NulByteError)?
        }

        let mut joined = self.as_bytes().to_vec();
        joined.push(b'/');
        joined.extend_from_slice(rel);
        AbsPath::from_sanitized(sanitize(&joined))
    }

    /// The containing directory, or `None` for the root.
    pub fn parent(&self) -> Option<AbsPath> {
        if self.is_root() {
            return None;
        }
        let bytes = self.as_bytes();
        let split = bytes.iter().rposition(|ch| *ch == b'/')?;
        AbsPath::from_sanitized(bytes[..split.max(1)].to_vec()).ok()
    }

    /// The final component, or `None` for the root.
    pub fn file_name(&self) -> Option<&OsStr> {
        if self.is_root() {
            return None;
        }
        let bytes = self.as_bytes();
        bytes
            .iter()
            .rposition(|ch| *ch == b'/')
            .map(|i| OsStr::from_bytes(&bytes[i + 1..]))
    }

    /// Like [`file_name`](AbsPath::file_name), but as an error when missing or not valid UTF-8.
    pub(crate) fn file_name_str(&self) -> Result<&str, PathError> {
        let name = self.file_name().ok_or_else(|| NoFileNameError(self.to_string()))?;
        Ok(name.to_str().ok_or_else(|| NonUtf8FileNameError(self.to_string()))?)
    }

    pub fn is_root(&self) -> bool {
        self.as_bytes() == b"/"
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.inner.as_bytes()
    }

    pub fn as_c_str(&self) -> &CStr {
        &self.inner
    }

    pub fn as_path(&self) -> &Path {
        Path::new(OsStr::from_bytes(self.as_bytes()))
    }

    pub fn to_path_buf(&self) -> PathBuf {
        self.as_path().to_path_buf()
    }
}

impl AsRef<Path> for AbsPath {
    fn as_ref(&self) -> &Path {
        self.as_path()
    }
}

impl AsRef<OsStr> for AbsPath {
    fn as_ref(&self) -> &OsStr {
        OsStr::from_bytes(self.as_bytes())
    }
}

impl Display for AbsPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(self.as_bytes()))
    }
}

impl Debug for AbsPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AbsPath").field(&String::from_utf8_lossy(self.as_bytes())).finish()
    }
}
