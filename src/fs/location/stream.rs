use std::io::{self, BufReader, BufWriter, IntoInnerError, Seek, SeekFrom, Write};

use crate::fs::file::{AccessMode, File};

/// An open file wrapped in the buffering that suits its access mode.
///
/// Read-write files are buffered for reading only. Before each write the reader's buffer is
/// discarded and the file offset moved back to the logical read position, so writes land where the
/// caller expects rather than after whatever was read ahead.
#[derive(Debug)]
pub(crate) enum Stream {
    Read(BufReader<File>),
    Write(BufWriter<File>),
    ReadWrite(BufReader<File>),
}

impl Stream {
    pub fn new(file: File, reader_capacity: usize, writer_capacity: usize) -> Stream {
        match file.access() {
            AccessMode::ReadOnly => Stream::Read(BufReader::with_capacity(reader_capacity, file)),
            AccessMode::WriteOnly => Stream::Write(BufWriter::with_capacity(writer_capacity, file)),
            AccessMode::ReadWrite => Stream::ReadWrite(BufReader::with_capacity(reader_capacity, file)),
        }
    }

    pub fn access(&self) -> AccessMode {
        self.file().access()
    }

    pub fn file(&self) -> &File {
        match self {
            Stream::Read(reader) | Stream::ReadWrite(reader) => reader.get_ref(),
            Stream::Write(writer) => writer.get_ref(),
        }
    }

    pub fn reader(&mut self) -> Option<&mut BufReader<File>> {
        match self {
            Stream::Read(reader) | Stream::ReadWrite(reader) => Some(reader),
            Stream::Write(_) => None,
        }
    }

    /// A single write call; the returned count may be short.
    pub fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        match self {
            Stream::Read(_) => Err(io::Error::from(io::ErrorKind::Unsupported)),
            Stream::Write(writer) => writer.write(data),
            Stream::ReadWrite(reader) => {
                reader.seek(SeekFrom::Current(0))?;
                reader.get_mut().write(data)
            },
        }
    }

    pub fn flush(&mut self) -> io::Result<()> {
        match self {
            Stream::Write(writer) => writer.flush(),
            Stream::Read(_) | Stream::ReadWrite(_) => Ok(()),
        }
    }

    /// Flushes any buffered bytes and then asks the kernel to write the file to storage.
    pub fn sync(&mut self) -> io::Result<()> {
        self.flush()?;
        self.file().sync()
    }

    /// Flushes and closes. The descriptor is released even when flushing fails.
    pub fn close(self) -> io::Result<()> {
        let file = match self {
            Stream::Read(reader) | Stream::ReadWrite(reader) => reader.into_inner(),
            Stream::Write(writer) => writer.into_inner().map_err(IntoInnerError::into_error)?,
        };
        file.close()
    }
}
