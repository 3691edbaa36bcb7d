//! Process duplication and the calls a freshly forked child may make.
//!
//! After `fork()` in a multithreaded program only async-signal-safe functions
//! may run in the child. Every function here is a direct syscall wrapper with
//! no allocation, so the child can string them together before `execve`.

use std::ffi::CStr;

use libc::c_char;
use rustix::io::Errno;
use rustix::process::Pid;

use crate::{last_errno, retry_on_intr};

/// Which side of the duplication boundary the caller is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fork {
    /// Running in the new process.
    Child,
    /// Running in the original process; holds the child's pid.
    Parent(Pid),
}

/// Duplicate the calling process.
///
/// # Safety
///
/// In the [`Fork::Child`] branch the caller must restrict itself to
/// async-signal-safe operations and leave via `execve` or [`exit_with_errno`].
/// Destructors, allocation and unwinding are all off limits there.
pub unsafe fn fork() -> Result<Fork, Errno> {
    // SAFETY: upheld by the caller.
    let ret = unsafe { libc::fork() };
    if ret < 0 {
        return Err(last_errno());
    }
    Ok(match Pid::from_raw(ret) {
        Some(pid) => Fork::Parent(pid),
        None => Fork::Child,
    })
}

/// `chdir(path)`, retried on `EINTR`.
#[inline]
pub fn chdir_retry(path: &CStr) -> Result<(), Errno> {
    // SAFETY: `path` is a valid NUL-terminated string.
    retry_on_intr(|| unsafe { libc::chdir(path.as_ptr()) }).map(drop)
}

/// `setsid()`, retried on `EINTR`. On success pid, pgid and sid coincide.
#[inline]
pub fn setsid_retry() -> Result<(), Errno> {
    // SAFETY: setsid has no memory-safety preconditions.
    retry_on_intr(|| unsafe { libc::setsid() }).map(drop)
}

/// Restore the default `SIGPIPE` disposition.
///
/// The Rust runtime ignores `SIGPIPE`, and an ignored signal survives
/// `execve`. Programs expect to die quietly on a closed pipe.
#[inline]
pub fn reset_sigpipe() -> Result<(), Errno> {
    // SAFETY: signal is async-signal-safe; SIG_DFL installs no handler.
    if unsafe { libc::signal(libc::SIGPIPE, libc::SIG_DFL) } == libc::SIG_ERR {
        return Err(last_errno());
    }
    Ok(())
}

/// Replace the process image. Only returns on failure.
///
/// # Safety
///
/// `argv` and `envp` must be NULL-terminated arrays of valid C strings that
/// outlive the call.
#[inline]
pub unsafe fn execve(path: &CStr, argv: *const *const c_char, envp: *const *const c_char) -> Errno {
    // SAFETY: upheld by the caller.
    unsafe { libc::execve(path.as_ptr(), argv, envp) };
    last_errno()
}

/// Terminate immediately with `errno` as the exit status, skipping atexit
/// handlers and stdio flushing.
#[inline]
pub fn exit_with_errno(errno: Errno) -> ! {
    // SAFETY: _exit is async-signal-safe and never returns.
    unsafe { libc::_exit(errno.raw_os_error()) }
}
