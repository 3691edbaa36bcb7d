//! Error contract for spawning.
//!
//! Every synchronously reported failure carries the originating system error
//! number unchanged, so a foreign caller can hand it straight back through
//! `errno`. Failures inside the child after `fork()` are never reported here;
//! they surface later as the child's exit status.

use std::io;
use std::path::PathBuf;

use rustix::io::Errno;
use thiserror::Error;

use crate::pipes::Stream;
use crate::validate::ValidationError;

/// Error while setting up a child process.
#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] ValidationError),

    #[error("cannot execute {}: {errno}", path.display())]
    Preflight { path: PathBuf, errno: Errno },

    #[error("pipe for {stream}: {errno}")]
    Pipe { stream: Stream, errno: Errno },

    #[error("fork: {0}")]
    Fork(Errno),
}

/// Coarse category of a [`SpawnError`].
///
/// Child-side setup failures (dup2, chdir, setsid, execve inside the child)
/// have no variant: the parent only ever sees them as the exit status of the
/// reaped child, equal to the failing call's errno.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpawnErrorKind {
    /// Missing or malformed input, rejected before any OS resource is touched.
    InvalidArgument,
    /// The program is missing or not executable by the caller.
    PreflightAccess,
    /// A pipe could not be created.
    ResourceAllocation,
    /// The OS could not create the child.
    Duplication,
}

impl SpawnError {
    pub fn kind(&self) -> SpawnErrorKind {
        match self {
            Self::InvalidArgument(_) => SpawnErrorKind::InvalidArgument,
            Self::Preflight { .. } => SpawnErrorKind::PreflightAccess,
            Self::Pipe { .. } => SpawnErrorKind::ResourceAllocation,
            Self::Fork(_) => SpawnErrorKind::Duplication,
        }
    }

    /// The system error behind this failure. Invalid arguments map to `EINVAL`.
    pub fn errno(&self) -> Errno {
        match self {
            Self::InvalidArgument(_) => Errno::INVAL,
            Self::Preflight { errno, .. } | Self::Pipe { errno, .. } => *errno,
            Self::Fork(errno) => *errno,
        }
    }

    #[inline]
    pub fn raw_os_error(&self) -> i32 {
        self.errno().raw_os_error()
    }
}

impl From<SpawnError> for io::Error {
    fn from(e: SpawnError) -> Self {
        io::Error::from_raw_os_error(e.raw_os_error())
    }
}
