//! Handles returned for a spawned child.
//!
//! The caller owns everything in a [`SpawnedChild`]: it must eventually
//! close the stream handles (drop them) and reap the child by pid. Nothing
//! here waits on or signals the child.

use std::fs::File;
use std::io::{self, IoSlice, IoSliceMut, Read, Write};
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, IntoRawFd, OwnedFd, RawFd};

use rustix::process::Pid;

use crate::pipes::ParentEnds;

macro_rules! stdio_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug)]
        pub struct $name(File);

        impl From<OwnedFd> for $name {
            fn from(fd: OwnedFd) -> Self {
                Self(File::from(fd))
            }
        }

        impl From<$name> for OwnedFd {
            fn from(handle: $name) -> Self {
                handle.0.into()
            }
        }

        impl AsFd for $name {
            fn as_fd(&self) -> BorrowedFd<'_> {
                self.0.as_fd()
            }
        }

        impl AsRawFd for $name {
            fn as_raw_fd(&self) -> RawFd {
                self.0.as_raw_fd()
            }
        }

        impl IntoRawFd for $name {
            fn into_raw_fd(self) -> RawFd {
                self.0.into_raw_fd()
            }
        }
    };
}

stdio_handle! {
    /// Write end of the child's stdin. Dropping it signals EOF to the child.
    ChildStdin
}

stdio_handle! {
    /// Read end of the child's stdout.
    ChildStdout
}

stdio_handle! {
    /// Read end of the child's stderr.
    ChildStderr
}

impl Write for ChildStdin {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn write_vectored(&mut self, bufs: &[IoSlice<'_>]) -> io::Result<usize> {
        self.0.write_vectored(bufs)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

impl Read for ChildStdout {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }

    fn read_vectored(&mut self, bufs: &mut [IoSliceMut<'_>]) -> io::Result<usize> {
        self.0.read_vectored(bufs)
    }
}

impl Read for ChildStderr {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }

    fn read_vectored(&mut self, bufs: &mut [IoSliceMut<'_>]) -> io::Result<usize> {
        self.0.read_vectored(bufs)
    }
}

/// A running child and the parent ends of its redirected streams.
///
/// Streams that were not redirected are `None`; the child inherited the
/// parent's descriptor for them.
#[derive(Debug)]
pub struct SpawnedChild {
    pid: Pid,
    pub stdin: Option<ChildStdin>,
    pub stdout: Option<ChildStdout>,
    pub stderr: Option<ChildStderr>,
}

/// Raw form of a [`SpawnedChild`], with `-1` for absent streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawParts {
    pub pid: i32,
    pub stdin: RawFd,
    pub stdout: RawFd,
    pub stderr: RawFd,
}

impl SpawnedChild {
    pub(crate) fn new(pid: Pid, ends: ParentEnds) -> Self {
        Self {
            pid,
            stdin: ends.stdin.map(ChildStdin::from),
            stdout: ends.stdout.map(ChildStdout::from),
            stderr: ends.stderr.map(ChildStderr::from),
        }
    }

    #[inline]
    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// The child's process id, as `std::process::Child::id` reports it.
    #[inline]
    pub fn id(&self) -> u32 {
        self.raw_pid().unsigned_abs()
    }

    #[inline]
    pub fn raw_pid(&self) -> i32 {
        self.pid.as_raw_nonzero().get()
    }

    /// Number of stream handles still held.
    pub fn stream_count(&self) -> usize {
        usize::from(self.stdin.is_some())
            + usize::from(self.stdout.is_some())
            + usize::from(self.stderr.is_some())
    }

    /// Give up ownership of the pid and descriptors. The caller must close the
    /// descriptors and reap the pid.
    pub fn into_raw_parts(self) -> RawParts {
        RawParts {
            pid: self.raw_pid(),
            stdin: self.stdin.map_or(-1, IntoRawFd::into_raw_fd),
            stdout: self.stdout.map_or(-1, IntoRawFd::into_raw_fd),
            stderr: self.stderr.map_or(-1, IntoRawFd::into_raw_fd),
        }
    }
}
