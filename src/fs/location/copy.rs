//! Copy techniques and the strategies that combine them.
//!
//! A stream copy reads the source through a buffer and writes every byte to a newly truncated
//! destination, then syncs it. It works across file systems. A hard link makes the destination
//! another name for the source's inode, so no data moves, but both paths must be on the same file
//! system.
//!
//! The composite strategies run one technique and fall back to the other only if the first fails.
//! When both fail the result is a [`FallbackError`] led by the second failure.
//!
//! Before any technique runs, both locations are closed and checked: the source must be an existing
//! regular file, the destination must not be the same file, and the destination directory must
//! exist (or be created, see [`CopyOptions`]). A failed stream copy never leaves behind a partial
//! destination that it created itself. A destination that existed beforehand is never removed.

use std::io::{ErrorKind, Read, Write};

use derive_more::IsVariant;
use tracing::{debug, trace, warn};

use super::file_location::{DEFAULT_BUFFER_SIZE, Inner};
use super::{
    FallbackError, FileError, MissingDirError, NotFoundError, NotRegularError, SameFileError,
    ShortCopyError, SourceNotRemovedError,
};
use crate::fs::file::{File, OpenOptions};
use crate::fs::path::AbsPath;
use crate::fs::{OsError, OsPairError, syscall};

/// A single way of copying a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IsVariant)]
pub enum CopyTechnique {
    Stream { buffer_size: usize },
    HardLink,
}

/// Which technique, or ordered pair of techniques, a copy uses.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum CopyStrategy {
    /// Stream with a [`DEFAULT_BUFFER_SIZE`] buffer.
    #[default]
    Stream,
    /// Stream with a caller chosen buffer. Zero selects the default.
    StreamWithBuffer(usize),
    HardLink,
    /// Stream, and if that fails, hard link.
    StreamThenLink,
    /// Hard link, and if that fails (across file systems, say), stream.
    LinkThenStream,
}

impl CopyStrategy {
    /// The technique to try first and the optional fallback.
    pub const fn techniques(&self) -> (CopyTechnique, Option<CopyTechnique>) {
        const STREAM: CopyTechnique = CopyTechnique::Stream {
            buffer_size: DEFAULT_BUFFER_SIZE,
        };
        match *self {
            CopyStrategy::Stream => (STREAM, None),
            CopyStrategy::StreamWithBuffer(0) => (STREAM, None),
            CopyStrategy::StreamWithBuffer(buffer_size) => (CopyTechnique::Stream { buffer_size }, None),
            CopyStrategy::HardLink => (CopyTechnique::HardLink, None),
            CopyStrategy::StreamThenLink => (STREAM, Some(CopyTechnique::HardLink)),
            CopyStrategy::LinkThenStream => (CopyTechnique::HardLink, Some(STREAM)),
        }
    }

    pub const fn has_fallback(&self) -> bool {
        self.techniques().1.is_some()
    }
}

/// How a copy treats the destination before any bytes move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyOptions {
    /// Create the destination directory tree if it is missing, rather than failing with
    /// [`MissingDirError`].
    pub create_dir: bool,
    /// Remove an existing destination file first. Without this a stream copy overwrites it and a
    /// hard link fails.
    pub delete_existing: bool,
}

impl Default for CopyOptions {
    fn default() -> Self {
        CopyOptions {
            create_dir: true,
            delete_existing: true,
        }
    }
}

pub(crate) fn copy(
    from: &mut Inner,
    to: &mut Inner,
    strategy: CopyStrategy,
    options: CopyOptions,
) -> Result<(), FileError> {
    let expected = setup(from, to, options)?;

    run_strategy(strategy, |technique| match technique {
        CopyTechnique::Stream { buffer_size } => stream_copy(from, to, buffer_size, expected),
        CopyTechnique::HardLink => hard_link(from, to),
    })?;

    debug!(from = %from.path, to = %to.path, ?strategy, bytes = expected, "copied file");
    Ok(())
}

/// Copies by streaming and then removes the source with `remove_source`. If the copy fails the
/// source is left alone. If removal fails, both files exist and nothing is rolled back.
pub(crate) fn move_file<F>(from: &mut Inner, to: &mut Inner, remove_source: F) -> Result<(), FileError>
where
    F: FnOnce(&mut Inner) -> Result<(), OsError>,
{
    copy(from, to, CopyStrategy::Stream, CopyOptions::default())?;

    remove_source(from).map_err(|source| SourceNotRemovedError {
        from: from.path.clone(),
        to: to.path.clone(),
        source,
    })?;

    from.refresh();
    debug!(from = %from.path, to = %to.path, "moved file");
    Ok(())
}

/// Runs the first technique of `strategy`, and its fallback only if the first fails.
pub(crate) fn run_strategy<F>(strategy: CopyStrategy, mut attempt: F) -> Result<(), FileError>
where
    F: FnMut(CopyTechnique) -> Result<(), FileError>,
{
    let (first, fallback) = strategy.techniques();

    match (attempt(first), fallback) {
        (Ok(()), _) => Ok(()),
        (Err(e), None) => Err(e),
        (Err(first_error), Some(fallback)) => {
            warn!(error = %first_error, ?first, ?fallback, "copy failed, trying fallback");
            attempt(fallback).map_err(|second_error| {
                FallbackError {
                    first: Box::new(first_error),
                    second: Box::new(second_error),
                }
                .into()
            })
        },
    }
}

/// Closes both locations and checks that the copy can go ahead. Returns the source size, which a
/// stream copy has to reproduce exactly.
fn setup(from: &mut Inner, to: &mut Inner, options: CopyOptions) -> Result<u64, FileError> {
    if from.path == to.path {
        Err(SameFileError {
            from: from.path.clone(),
            to: to.path.clone(),
        })?
    }

    from.close()?;
    to.close()?;

    let source = from.require_facts()?.clone();
    if !source.is_regular() {
        Err(NotRegularError {
            path: from.path.clone(),
        })?
    }

    if let Some(existing) = &to.facts {
        if existing.same_entry(&source) {
            Err(SameFileError {
                from: from.path.clone(),
                to: to.path.clone(),
            })?
        }
        if !existing.is_regular() {
            Err(NotRegularError {
                path: to.path.clone(),
            })?
        }
        if options.delete_existing {
            to.unlink()?;
        }
    }

    if !to.dir.exists() {
        if !options.create_dir {
            Err(MissingDirError {
                path: to.dir.path().clone(),
            })?
        }
        to.dir.create_all()?;
    }

    Ok(source.size.max(0) as u64)
}

pub(crate) fn stream_copy(
    from: &mut Inner,
    to: &mut Inner,
    buffer_size: usize,
    expected: u64,
) -> Result<(), FileError> {
    // Only a destination created by this copy is removed on failure.
    let existed = to.refresh();
    let mut created = false;
    let result = transfer(&from.path, &to.path, buffer_size, expected, &mut created);

    if result.is_err() && created && !existed {
        remove_partial(&to.path);
    }
    to.refresh();
    result
}

fn transfer(
    from: &AbsPath,
    to: &AbsPath,
    buffer_size: usize,
    expected: u64,
    created: &mut bool,
) -> Result<(), FileError> {
    let buffer_size = if buffer_size == 0 { DEFAULT_BUFFER_SIZE } else { buffer_size };

    let mut source = File::open_read_only(from)?;
    let mut target = OpenOptions::write_only_truncate().open(to)?;
    *created = true;

    let mut buf = vec![0; buffer_size];
    let mut copied: u64 = 0;
    loop {
        let count = match source.read(&mut buf) {
            Ok(0) => break,
            Ok(count) => count,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(OsError::new("read", from, e).into()),
        };
        target
            .write_all(&buf[..count])
            .map_err(|e| OsError::new("write", to, e))?;
        copied += count as u64;
    }

    target.sync().map_err(|e| OsError::new("fsync", to, e))?;
    target.close().map_err(|e| OsError::new("close", to, e))?;
    source.close().map_err(|e| OsError::new("close", from, e))?;

    if copied != expected {
        Err(ShortCopyError {
            from: from.clone(),
            to: to.clone(),
            copied,
            expected,
        })?
    }

    trace!(from = %from, to = %to, bytes = copied, buffer_size, "streamed file");
    Ok(())
}

fn remove_partial(path: &AbsPath) {
    match syscall::unlink(path.as_c_str()) {
        Ok(()) | Err(libc::ENOENT) => (),
        Err(e) => {
            let error = OsError::from_errno("unlink", path, e);
            warn!(%error, "could not remove partial copy");
        },
    }
}

fn hard_link(from: &mut Inner, to: &mut Inner) -> Result<(), FileError> {
    syscall::link(from.path.as_c_str(), to.path.as_c_str())
        .map_err(|e| OsPairError::from_errno("link", &from.path, &to.path, e))?;

    if !to.refresh() {
        Err(NotFoundError {
            path: to.path.clone(),
        })?
    }

    trace!(from = %from.path, to = %to.path, "linked file");
    Ok(())
}
