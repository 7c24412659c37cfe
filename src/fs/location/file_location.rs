use std::ffi::OsStr;
use std::fmt::{self, Debug, Formatter};
use std::io::{BufRead, BufReader, Read};
use std::ptr;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

use derive_more::IsVariant;
use tracing::{debug, trace};

use super::copy::{self, CopyOptions, CopyStrategy};
use super::stream::Stream;
use super::{EncodingError, FileError, NotFoundError, NotOpenError, SameFileError, ShortWriteError};
use crate::fs::dir::DirMgr;
use crate::fs::file::{AccessMode, File, OpenOptions};
use crate::fs::path::{self, AbsPath};
use crate::fs::perm::FilePermission;
use crate::fs::{Metadata, OsError, syscall};

/// The buffer size used for reading, writing and stream copies unless another is requested.
pub const DEFAULT_BUFFER_SIZE: usize = 8 * 1024;

/// Where a location's handle is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IsVariant)]
pub enum HandleState {
    Unopened,
    OpenForRead,
    OpenForWrite,
    OpenForReadWrite,
    Closed,
}

/// The result of a delimited read. When the end of the file is reached before the delimiter,
/// `at_eof` is set and `data` holds whatever came before it, which is a valid final fragment rather
/// than a failure. `data` only ends with the delimiter when `at_eof` is false.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimited<T> {
    pub data: T,
    pub at_eof: bool,
}

/// One file on the file system, and the single point through which it is opened, read, written,
/// copied, moved and deleted.
///
/// All methods take `&self` and lock the location for the duration of the call, so a location can
/// be shared between threads (for example in an [`Arc`](std::sync::Arc)). The lock only orders
/// calls on this instance: another `FileLocation` for the same path, or another process, can still
/// change the file between two calls.
pub struct FileLocation {
    inner: Mutex<Inner>,
}

pub(crate) struct Inner {
    pub(crate) dir: DirMgr,
    pub(crate) file_name: String,
    pub(crate) extension: String,
    pub(crate) original: String,
    pub(crate) path: AbsPath,
    /// Metadata as of the last check, or `None` if the file didn't exist then.
    pub(crate) facts: Option<Metadata>,
    pub(crate) stream: Option<Stream>,
    pub(crate) opened_once: bool,
    pub(crate) bytes_written: u64,
    pub(crate) reader_capacity: usize,
    pub(crate) writer_capacity: usize,
}

impl FileLocation {
    /// Creates a location from a path to a file, resolving it against the working directory if
    /// needed. The file itself doesn't have to exist yet.
    pub fn new<P: AsRef<OsStr>>(file_path: P) -> Result<FileLocation, FileError> {
        let original = file_path.as_ref().to_string_lossy().into_owned();
        let path = AbsPath::resolve(file_path)?;
        FileLocation::from_parts(path, original)
    }

    /// Creates a location for `file_name` inside `dir`.
    pub fn from_dir(dir: &DirMgr, file_name: &str) -> Result<FileLocation, FileError> {
        let path = dir.join(file_name)?;
        let original = path.to_string();
        FileLocation::from_parts(path, original)
    }

    fn from_parts(path: AbsPath, original: String) -> Result<FileLocation, FileError> {
        let (file_name, extension) = path::split_extension(path.file_name_str()?);
        let (file_name, extension) = (file_name.to_owned(), extension.to_owned());
        let dir = DirMgr::from_abs(path.parent().unwrap_or_else(AbsPath::root));

        let mut inner = Inner {
            dir,
            file_name,
            extension,
            original,
            path,
            facts: None,
            stream: None,
            opened_once: false,
            bytes_written: 0,
            reader_capacity: DEFAULT_BUFFER_SIZE,
            writer_capacity: DEFAULT_BUFFER_SIZE,
        };
        inner.refresh();

        Ok(FileLocation {
            inner: Mutex::new(inner),
        })
    }

    /// A panic while holding the lock leaves nothing half-updated that later calls rely on (the
    /// cached facts are refreshed on use), so poisoning is ignored.
    pub(crate) fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Locks two distinct locations in address order, so that two threads locking the same pair
    /// in opposite roles can't deadlock. The guards are returned as `(self, other)`.
    pub(crate) fn lock_pair<'a>(
        &'a self,
        other: &'a FileLocation,
    ) -> (MutexGuard<'a, Inner>, MutexGuard<'a, Inner>) {
        if ptr::from_ref(self) < ptr::from_ref(other) {
            let first = self.lock();
            (first, other.lock())
        } else {
            let second = other.lock();
            (self.lock(), second)
        }
    }

    fn same_file_error(&self) -> FileError {
        let path = self.lock().path.clone();
        SameFileError {
            from: path.clone(),
            to: path,
        }
        .into()
    }

    // Path decomposition

    pub fn absolute_path(&self) -> AbsPath {
        self.lock().path.clone()
    }

    pub fn dir(&self) -> DirMgr {
        self.lock().dir.clone()
    }

    /// The file name without its extension.
    pub fn file_name(&self) -> String {
        self.lock().file_name.clone()
    }

    /// The extension including its leading '.', or an empty string.
    pub fn extension(&self) -> String {
        self.lock().extension.clone()
    }

    pub fn file_name_ext(&self) -> String {
        self.lock().file_name_ext()
    }

    /// The path exactly as it was given when this location was created.
    pub fn original_path(&self) -> String {
        self.lock().original.clone()
    }

    pub fn equal_abs_paths(&self, other: &FileLocation) -> bool {
        ptr::eq(self, other) || self.absolute_path() == other.absolute_path()
    }

    pub fn equal_file_name_ext(&self, other: &FileLocation) -> bool {
        ptr::eq(self, other) || self.file_name_ext() == other.file_name_ext()
    }

    // Existence and metadata

    /// Whether the file exists right now. Any error while checking reads as `false`. This also
    /// refreshes the facts behind [`is_abs_path_populated`](FileLocation::is_abs_path_populated)
    /// and [`is_file_name_populated`](FileLocation::is_file_name_populated).
    pub fn exists(&self) -> bool {
        self.lock().refresh()
    }

    /// True only if the path was resolved and the file existed at the last check.
    pub fn is_abs_path_populated(&self) -> bool {
        self.lock().facts.is_some()
    }

    /// True only if there is a file name and the file existed at the last check.
    pub fn is_file_name_populated(&self) -> bool {
        let inner = self.lock();
        inner.facts.is_some() && !inner.file_name_ext().is_empty()
    }

    pub fn metadata(&self) -> Result<Metadata, FileError> {
        Ok(self.lock().require_facts()?.clone())
    }

    pub fn size(&self) -> Result<u64, FileError> {
        Ok(self.metadata()?.size.max(0) as u64)
    }

    pub fn modified(&self) -> Result<SystemTime, FileError> {
        Ok(self.metadata()?.modified())
    }

    pub fn permission(&self) -> Result<FilePermission, FileError> {
        let mut inner = self.lock();
        Ok(FilePermission::from_metadata(inner.require_facts()?)?)
    }

    pub fn change_permission(&self, permission: FilePermission) -> Result<(), FileError> {
        let mut inner = self.lock();
        inner.require_facts()?;
        syscall::chmod(inner.path.as_c_str(), permission.permission_mode_t())
            .map_err(|e| OsError::from_errno("chmod", &inner.path, e))?;
        debug!(path = %inner.path, %permission, "changed permission");
        inner.refresh();
        Ok(())
    }

    // Handle state and configuration

    pub fn state(&self) -> HandleState {
        let inner = self.lock();
        match inner.stream.as_ref().map(Stream::access) {
            Some(AccessMode::ReadOnly) => HandleState::OpenForRead,
            Some(AccessMode::WriteOnly) => HandleState::OpenForWrite,
            Some(AccessMode::ReadWrite) => HandleState::OpenForReadWrite,
            None if inner.opened_once => HandleState::Closed,
            None => HandleState::Unopened,
        }
    }

    pub fn is_open(&self) -> bool {
        self.lock().stream.is_some()
    }

    /// The total number of bytes written through this location, across every open.
    pub fn bytes_written(&self) -> u64 {
        self.lock().bytes_written
    }

    pub fn reader_buffer_size(&self) -> usize {
        self.lock().reader_capacity
    }

    /// Takes effect the next time the file is opened. Zero selects [`DEFAULT_BUFFER_SIZE`].
    pub fn set_reader_buffer_size(&self, size: usize) {
        self.lock().reader_capacity = if size == 0 { DEFAULT_BUFFER_SIZE } else { size };
    }

    pub fn writer_buffer_size(&self) -> usize {
        self.lock().writer_capacity
    }

    /// Takes effect the next time the file is opened. Zero selects [`DEFAULT_BUFFER_SIZE`].
    pub fn set_writer_buffer_size(&self, size: usize) {
        self.lock().writer_capacity = if size == 0 { DEFAULT_BUFFER_SIZE } else { size };
    }

    // Open and close

    /// Opens the file, closing any handle that is already open first. If the options create the
    /// file and its directory is missing, the directory tree is created before opening.
    pub fn open(&self, options: &OpenOptions) -> Result<(), FileError> {
        self.lock().open(options)
    }

    pub fn open_read_only(&self) -> Result<(), FileError> {
        self.open(&OpenOptions::read_only())
    }

    pub fn open_write_only(&self) -> Result<(), FileError> {
        self.open(&OpenOptions::write_only())
    }

    pub fn open_write_only_append(&self) -> Result<(), FileError> {
        self.open(&OpenOptions::write_only_append())
    }

    pub fn open_write_only_truncate(&self) -> Result<(), FileError> {
        self.open(&OpenOptions::write_only_truncate())
    }

    pub fn open_read_write(&self) -> Result<(), FileError> {
        self.open(&OpenOptions::read_write())
    }

    /// Flushes any buffered writes and releases the handle. Closing a location that isn't open
    /// does nothing.
    pub fn close(&self) -> Result<(), FileError> {
        self.lock().close()
    }

    /// Writes buffered bytes through to the kernel and then to the storage device.
    pub fn flush(&self) -> Result<(), FileError> {
        let mut inner = self.lock();
        let Inner { stream, path, .. } = &mut *inner;
        if let Some(stream) = stream {
            stream.sync().map_err(|e| OsError::new("flush", path, e))?;
        }
        Ok(())
    }

    // Reading

    /// Reads from the current position to the end of the file. Reaching the end is the normal
    /// outcome here, not an error. The handle is left open.
    pub fn read_all(&self) -> Result<Vec<u8>, FileError> {
        let mut inner = self.lock();
        let Inner { stream, path, .. } = inner.read_setup()?;

        let mut data = Vec::new();
        reader_of(stream, path)?
            .read_to_end(&mut data)
            .map_err(|e| OsError::new("read", path, e))?;

        trace!(path = %path, bytes = data.len(), "read to end");
        Ok(data)
    }

    pub fn read_all_string(&self) -> Result<String, FileError> {
        let data = self.read_all()?;
        String::from_utf8(data).map_err(|e| self.encoding_error(e.utf8_error().valid_up_to()))
    }

    /// Reads up to `buf.len()` bytes from the current position. Zero means the end of the file.
    pub fn read_bytes(&self, buf: &mut [u8]) -> Result<usize, FileError> {
        let mut inner = self.lock();
        let Inner { stream, path, .. } = inner.read_setup()?;

        let count = reader_of(stream, path)?
            .read(buf)
            .map_err(|e| OsError::new("read", path, e))?;

        trace!(path = %path, bytes = count, "read");
        Ok(count)
    }

    /// Reads up to and including the next `delimiter`. See [`Delimited`] for how the end of the file
    /// is reported.
    pub fn read_delimited(&self, delimiter: u8) -> Result<Delimited<Vec<u8>>, FileError> {
        let mut inner = self.lock();
        let Inner { stream, path, .. } = inner.read_setup()?;

        let mut data = Vec::new();
        reader_of(stream, path)?
            .read_until(delimiter, &mut data)
            .map_err(|e| OsError::new("read", path, e))?;

        let at_eof = data.last() != Some(&delimiter);
        Ok(Delimited { data, at_eof })
    }

    pub fn read_delimited_string(&self, delimiter: u8) -> Result<Delimited<String>, FileError> {
        let Delimited { data, at_eof } = self.read_delimited(delimiter)?;
        let data = String::from_utf8(data)
            .map_err(|e| self.encoding_error(e.utf8_error().valid_up_to()))?;
        Ok(Delimited { data, at_eof })
    }

    fn encoding_error(&self, valid_up_to: usize) -> FileError {
        EncodingError {
            path: self.absolute_path(),
            valid_up_to,
        }
        .into()
    }

    // Writing

    /// Writes `data` with a single write call and returns the number of bytes written.
    ///
    /// If the file isn't already open for writing, it is opened write-only, created if missing
    /// and either truncated (`truncate_first`) or appended to. A handle that is already open for
    /// writing is used as it is. A short write is reported as an error even when the OS reported
    /// none.
    pub fn write_bytes(&self, data: &[u8], truncate_first: bool) -> Result<usize, FileError> {
        let mut inner = self.lock();
        inner.write_setup(truncate_first)?;

        let Inner { stream, path, bytes_written, .. } = &mut *inner;
        let stream = stream.as_mut().ok_or_else(|| NotOpenError {
            path: path.clone(),
            direction: "writing",
        })?;

        let written = stream.write(data).map_err(|e| OsError::new("write", path, e))?;
        *bytes_written += written as u64;

        if written != data.len() {
            Err(ShortWriteError {
                path: path.clone(),
                written,
                expected: data.len(),
            })?
        }

        trace!(path = %path, bytes = written, "wrote");
        Ok(written)
    }

    pub fn write_str(&self, text: &str, truncate_first: bool) -> Result<usize, FileError> {
        self.write_bytes(text.as_bytes(), truncate_first)
    }

    // Whole-file operations

    /// Creates the file (and any missing directories), emptying it if it already exists. The
    /// handle is closed afterwards.
    pub fn create(&self) -> Result<(), FileError> {
        let mut inner = self.lock();
        inner.open(&OpenOptions::read_write_create_truncate())?;
        inner.close()?;
        debug!(path = %inner.path, "created file");
        Ok(())
    }

    /// Closes the handle and removes the file. A file that is already gone is not an error.
    pub fn delete(&self) -> Result<(), FileError> {
        self.lock().delete()
    }

    /// Copies this file to `destination` using `strategy`. See the [`copy`] module.
    pub fn copy_to(
        &self,
        destination: &FileLocation,
        strategy: CopyStrategy,
        options: CopyOptions,
    ) -> Result<(), FileError> {
        if ptr::eq(self, destination) {
            return Err(self.same_file_error());
        }
        let (mut source, mut target) = self.lock_pair(destination);
        copy::copy(&mut source, &mut target, strategy, options)
    }

    /// Copies this file to a new path and returns the location of the copy.
    pub fn copy_to_path<P: AsRef<OsStr>>(
        &self,
        destination: P,
        strategy: CopyStrategy,
        options: CopyOptions,
    ) -> Result<FileLocation, FileError> {
        let target = FileLocation::new(destination)?;
        self.copy_to(&target, strategy, options)?;
        Ok(target)
    }

    /// Copies this file into `dir`, keeping its name, and returns the location of the copy.
    pub fn copy_to_dir(
        &self,
        dir: &DirMgr,
        strategy: CopyStrategy,
        options: CopyOptions,
    ) -> Result<FileLocation, FileError> {
        let target = FileLocation::from_dir(dir, &self.file_name_ext())?;
        self.copy_to(&target, strategy, options)?;
        Ok(target)
    }

    /// Moves this file to `destination` by copying it and then deleting the source. On success
    /// this location no longer describes an existing file.
    ///
    /// If the copy fails the source is untouched. If the delete fails after a successful copy,
    /// both files exist and [`SourceNotRemovedError`](super::SourceNotRemovedError) is returned.
    pub fn move_to(&self, destination: &FileLocation) -> Result<(), FileError> {
        if ptr::eq(self, destination) {
            return Err(self.same_file_error());
        }
        let (mut source, mut target) = self.lock_pair(destination);
        copy::move_file(&mut source, &mut target, Inner::unlink)
    }

    /// Moves this file to a new path and returns the new location.
    pub fn move_to_path<P: AsRef<OsStr>>(&self, destination: P) -> Result<FileLocation, FileError> {
        let target = FileLocation::new(destination)?;
        self.move_to(&target)?;
        Ok(target)
    }

    /// Moves this file into `dir`, keeping its name, and returns the new location.
    pub fn move_to_dir(&self, dir: &DirMgr) -> Result<FileLocation, FileError> {
        let target = FileLocation::from_dir(dir, &self.file_name_ext())?;
        self.move_to(&target)?;
        Ok(target)
    }
}

fn reader_of<'a>(
    stream: &'a mut Option<Stream>,
    path: &AbsPath,
) -> Result<&'a mut BufReader<File>, NotOpenError> {
    stream.as_mut().and_then(Stream::reader).ok_or_else(|| NotOpenError {
        path: path.clone(),
        direction: "reading",
    })
}

impl Inner {
    pub(crate) fn file_name_ext(&self) -> String {
        format!("{}{}", self.file_name, self.extension)
    }

    /// Re-reads the file's metadata and reports whether it exists.
    pub(crate) fn refresh(&mut self) -> bool {
        self.facts = syscall::stat(self.path.as_c_str()).ok();
        self.facts.is_some()
    }

    pub(crate) fn require_facts(&mut self) -> Result<&Metadata, NotFoundError> {
        self.refresh();
        self.facts.as_ref().ok_or_else(|| NotFoundError {
            path: self.path.clone(),
        })
    }

    pub(crate) fn open(&mut self, options: &OpenOptions) -> Result<(), FileError> {
        self.close()?;

        if options.creates() && !self.dir.exists() {
            self.dir.create_all()?;
        }

        let file = options.open(&self.path)?;
        self.stream = Some(Stream::new(file, self.reader_capacity, self.writer_capacity));
        self.opened_once = true;
        self.refresh();
        Ok(())
    }

    pub(crate) fn close(&mut self) -> Result<(), FileError> {
        if let Some(stream) = self.stream.take() {
            stream.close().map_err(|e| OsError::new("close", &self.path, e))?;
            debug!(path = %self.path, "closed file");
        }
        self.refresh();
        Ok(())
    }

    /// Makes sure there is a handle that can be read from, opening the file read-only if there
    /// isn't. Returns `self` so that callers can split the borrow.
    fn read_setup(&mut self) -> Result<&mut Inner, FileError> {
        if !self.stream.as_ref().is_some_and(|s| s.access().can_read()) {
            self.close()?;
            if self.facts.is_none() {
                Err(NotFoundError {
                    path: self.path.clone(),
                })?
            }
            self.open(&OpenOptions::read_only())?;
        }
        Ok(self)
    }

    fn write_setup(&mut self, truncate_first: bool) -> Result<(), FileError> {
        if !self.stream.as_ref().is_some_and(|s| s.access().can_write()) {
            let options = if truncate_first {
                OpenOptions::write_only_truncate()
            } else {
                OpenOptions::write_only_append()
            };
            self.open(&options)?;
        }
        Ok(())
    }

    pub(crate) fn unlink(&mut self) -> Result<(), OsError> {
        match syscall::unlink(self.path.as_c_str()) {
            Ok(()) | Err(libc::ENOENT) => {
                debug!(path = %self.path, "deleted file");
                self.facts = None;
                Ok(())
            },
            Err(e) => Err(OsError::from_errno("unlink", &self.path, e)),
        }
    }

    pub(crate) fn delete(&mut self) -> Result<(), FileError> {
        self.close()?;
        self.unlink()?;
        Ok(())
    }
}

impl Debug for FileLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("FileLocation")
            .field("path", &inner.path)
            .field("original", &inner.original)
            .field("exists", &inner.facts.is_some())
            .field("stream", &inner.stream)
            .field("bytes_written", &inner.bytes_written)
            .finish()
    }
}
