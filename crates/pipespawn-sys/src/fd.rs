//! File descriptor helpers.
//!
//! These operate on raw descriptors on purpose: in the forked child the
//! `OwnedFd`s of the parent are plain copies of memory and must never be
//! dropped, so the child closes exactly the raw numbers it was handed.

use std::os::fd::RawFd;

use rustix::io::Errno;

use crate::retry_on_intr;

/// Close `fd` if it is a real descriptor. Errors are ignored: a failed close
/// during teardown has no recovery.
#[inline]
pub fn close_if_open(fd: RawFd) {
    if fd >= 0 {
        // SAFETY: the caller owns `fd` and never uses it again.
        unsafe { libc::close(fd) };
    }
}

/// `dup2(old, new)`, retried on `EINTR`.
#[inline]
pub fn dup2_retry(old: RawFd, new: RawFd) -> Result<(), Errno> {
    // SAFETY: dup2 has no memory-safety preconditions.
    retry_on_intr(|| unsafe { libc::dup2(old, new) }).map(drop)
}

/// Duplicate `fd` onto the lowest free descriptor above stderr, close-on-exec.
#[inline]
pub fn dup_above_stdio(fd: RawFd) -> Result<RawFd, Errno> {
    // SAFETY: fcntl with F_DUPFD_CLOEXEC has no memory-safety preconditions.
    retry_on_intr(|| unsafe { libc::fcntl(fd, libc::F_DUPFD_CLOEXEC, libc::STDERR_FILENO + 1) })
}

/// Clear `FD_CLOEXEC` so the descriptor survives `execve`.
///
/// `dup2(fd, fd)` is a no-op that leaves the flag set, so a pipe end that
/// already sits on its target stdio slot needs this instead.
pub fn clear_cloexec(fd: RawFd) -> Result<(), Errno> {
    // SAFETY: fcntl with F_GETFD/F_SETFD has no memory-safety preconditions.
    let flags = retry_on_intr(|| unsafe { libc::fcntl(fd, libc::F_GETFD) })?;
    retry_on_intr(|| unsafe { libc::fcntl(fd, libc::F_SETFD, flags & !libc::FD_CLOEXEC) })
        .map(drop)
}
