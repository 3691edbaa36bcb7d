//! Pipe allocation for redirected stdio.
//!
//! One pipe per requested stream, created close-on-exec so that no end ever
//! leaks into an exec'd program by accident. The child gets its end via
//! `dup2`, which clears the flag on the new descriptor.
//!
//! ## Ends
//!
//! - **stdin**: Parent writes → Child reads
//! - **stdout**: Child writes → Parent reads
//! - **stderr**: Child writes → Parent reads
//!
//! Every end is an `OwnedFd`, so each is closed exactly once by whoever holds
//! it last. After `fork()` the parent drops the child ends; the child closes
//! the raw parent ends without running any destructor.

use std::fmt;
use std::os::fd::{AsRawFd, OwnedFd, RawFd};

use rustix::io::Errno;
use rustix::pipe::{PipeFlags, pipe_with};

use crate::error::SpawnError;
use crate::request::Redirects;

/// A standard stream of the child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stream {
    Stdin,
    Stdout,
    Stderr,
}

impl Stream {
    pub const ALL: [Stream; 3] = [Stream::Stdin, Stream::Stdout, Stream::Stderr];

    /// The descriptor number this stream occupies in the child.
    #[inline]
    pub fn fd(self) -> RawFd {
        match self {
            Stream::Stdin => libc::STDIN_FILENO,
            Stream::Stdout => libc::STDOUT_FILENO,
            Stream::Stderr => libc::STDERR_FILENO,
        }
    }

    #[inline]
    pub fn name(self) -> &'static str {
        match self {
            Stream::Stdin => "stdin",
            Stream::Stdout => "stdout",
            Stream::Stderr => "stderr",
        }
    }
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unidirectional pipe.
#[derive(Debug)]
pub struct Pipe {
    pub read: OwnedFd,
    pub write: OwnedFd,
}

impl Pipe {
    pub fn new() -> Result<Self, Errno> {
        let (read, write) = pipe_with(PipeFlags::CLOEXEC)?;
        Ok(Self { read, write })
    }
}

/// A pipe bound to one stdio stream.
#[derive(Debug)]
pub struct StreamPipe {
    stream: Stream,
    pipe: Pipe,
}

impl StreamPipe {
    pub fn new(stream: Stream) -> Result<Self, SpawnError> {
        let pipe = Pipe::new().map_err(|errno| SpawnError::Pipe { stream, errno })?;
        Ok(Self { stream, pipe })
    }

    #[inline]
    pub fn stream(&self) -> Stream {
        self.stream
    }

    /// The end the child keeps: read for stdin, write for stdout/stderr.
    pub fn child_end(&self) -> &OwnedFd {
        match self.stream {
            Stream::Stdin => &self.pipe.read,
            Stream::Stdout | Stream::Stderr => &self.pipe.write,
        }
    }

    /// The end the parent keeps: write for stdin, read for stdout/stderr.
    pub fn parent_end(&self) -> &OwnedFd {
        match self.stream {
            Stream::Stdin => &self.pipe.write,
            Stream::Stdout | Stream::Stderr => &self.pipe.read,
        }
    }

    /// Keep the parent end, closing the child end.
    pub fn into_parent_end(self) -> OwnedFd {
        match self.stream {
            Stream::Stdin => self.pipe.write,
            Stream::Stdout | Stream::Stderr => self.pipe.read,
        }
    }

    pub(crate) fn raw(&self) -> RawStdio {
        RawStdio {
            target: self.stream.fd(),
            child: self.child_end().as_raw_fd(),
            parent: self.parent_end().as_raw_fd(),
        }
    }
}

/// Raw descriptor numbers of one redirected stream, copied into the child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RawStdio {
    /// Standard stream slot (0, 1 or 2).
    pub target: RawFd,
    /// Pipe end to install on `target`.
    pub child: RawFd,
    /// Pipe end the child must close.
    pub parent: RawFd,
}

/// Parent-side ends after the child ends are gone.
#[derive(Debug, Default)]
pub(crate) struct ParentEnds {
    pub stdin: Option<OwnedFd>,
    pub stdout: Option<OwnedFd>,
    pub stderr: Option<OwnedFd>,
}

/// All pipes for one spawn.
#[derive(Debug, Default)]
pub struct StdioPipes {
    pub stdin: Option<StreamPipe>,
    pub stdout: Option<StreamPipe>,
    pub stderr: Option<StreamPipe>,
}

impl StdioPipes {
    /// Allocate a pipe for each requested stream, in stdin, stdout, stderr
    /// order. On failure every pipe allocated so far is closed before the
    /// error is returned.
    pub fn allocate(redirects: Redirects) -> Result<Self, SpawnError> {
        let mut pipes = Self::default();
        for stream in Stream::ALL {
            if redirects.contains(stream) {
                *pipes.slot_mut(stream) = Some(StreamPipe::new(stream)?);
            }
        }
        Ok(pipes)
    }

    fn slot_mut(&mut self, stream: Stream) -> &mut Option<StreamPipe> {
        match stream {
            Stream::Stdin => &mut self.stdin,
            Stream::Stdout => &mut self.stdout,
            Stream::Stderr => &mut self.stderr,
        }
    }

    /// Number of allocated pipes.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &StreamPipe> {
        [&self.stdin, &self.stdout, &self.stderr]
            .into_iter()
            .flatten()
    }

    pub(crate) fn raw(&self) -> [Option<RawStdio>; 3] {
        [
            self.stdin.as_ref().map(StreamPipe::raw),
            self.stdout.as_ref().map(StreamPipe::raw),
            self.stderr.as_ref().map(StreamPipe::raw),
        ]
    }

    pub(crate) fn into_parent_ends(self) -> ParentEnds {
        ParentEnds {
            stdin: self.stdin.map(StreamPipe::into_parent_end),
            stdout: self.stdout.map(StreamPipe::into_parent_end),
            stderr: self.stderr.map(StreamPipe::into_parent_end),
        }
    }
}
