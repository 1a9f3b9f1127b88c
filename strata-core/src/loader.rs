//! Loader trait and file handles

use std::io::{self, Read, Seek, SeekFrom, Write};

use crate::{entry::FileEntry, path::PathView};

/// Readable stream returned by [`Loader::open_read`]
///
/// Released by dropping it or calling [`ReadHandle::close`].
pub trait ReadHandle: Read + Seek + Send {
    fn tell(&mut self) -> io::Result<u64> {
        self.stream_position()
    }

    /// Length of the underlying stream
    fn size(&mut self) -> io::Result<u64> {
        stream_len(self)
    }

    fn is_eof(&mut self) -> bool {
        match (self.tell(), self.size()) {
            (Ok(pos), Ok(len)) => pos >= len,
            _ => true,
        }
    }

    fn close(self: Box<Self>) -> io::Result<()> {
        Ok(())
    }
}

impl<T: Read + Seek + Send> ReadHandle for T {}

/// Writable stream returned by [`Loader::open_write`]
pub trait WriteHandle: Write + Seek + Send {
    fn tell(&mut self) -> io::Result<u64> {
        self.stream_position()
    }

    fn size(&mut self) -> io::Result<u64> {
        stream_len(self)
    }

    /// Flush and release the handle
    fn close(mut self: Box<Self>) -> io::Result<()> {
        self.flush()
    }
}

impl<T: Write + Seek + Send> WriteHandle for T {}

pub type FileHandle = Box<dyn ReadHandle>;
pub type FileWriter = Box<dyn WriteHandle>;

fn stream_len<S: Seek + ?Sized>(stream: &mut S) -> io::Result<u64> {
    let pos = stream.stream_position()?;
    let len = stream.seek(SeekFrom::End(0))?;
    if pos != len {
        stream.seek(SeekFrom::Start(pos))?;
    }
    Ok(len)
}

/// Storage back-end mounted into a virtual filesystem
///
/// Paths arrive already canonicalized and rewritten into the loader's own
/// path space. A loader that cannot serve a path reports it as missing
/// (`exists == false` or `None`); failures are never surfaced as errors.
pub trait Loader: Send + Sync {
    fn display_name(&self) -> &str;

    /// Call `visit` once per direct child of `path`, in no particular order
    fn iterate(&self, path: PathView<'_>, visit: &mut dyn FnMut(&str, FileEntry));

    fn stat(&self, path: PathView<'_>) -> FileEntry;

    fn open_read(&self, path: PathView<'_>) -> Option<FileHandle>;

    // Optional methods with defaults
    fn open_write(&self, _path: PathView<'_>) -> Option<FileWriter> {
        None
    }
}
