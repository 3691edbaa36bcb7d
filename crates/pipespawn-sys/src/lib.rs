//! Low-level syscall wrappers for the fork/exec boundary.
//!
//! Everything in this crate is usable in the window between `fork()` and
//! `execve()` in the child: no heap allocation, no locks, no unwinding.
//! Higher-level code (pipe allocation, preflight checks) uses rustix directly.
//!
//! ## Modules
//!
//! - **fd** - Descriptor close / dup2 / close-on-exec helpers
//! - **process** - fork, chdir, setsid, execve and `_exit`
//!
//! ## Errno
//!
//! `errno` is thread-local global state. Every wrapper here reads it
//! immediately after the failing call and hands it back as a value, so callers
//! never have to read it out-of-band.

pub mod fd;
pub mod process;

pub use process::{Fork, fork};

use rustix::io::Errno;

#[cfg(any(target_os = "linux", target_os = "emscripten", target_os = "redox"))]
#[inline]
fn errno_location() -> *mut libc::c_int {
    // SAFETY: always returns a valid thread-local pointer.
    unsafe { libc::__errno_location() }
}

#[cfg(any(target_os = "android", target_os = "netbsd", target_os = "openbsd"))]
#[inline]
fn errno_location() -> *mut libc::c_int {
    // SAFETY: always returns a valid thread-local pointer.
    unsafe { libc::__errno() }
}

#[cfg(any(target_vendor = "apple", target_os = "freebsd", target_os = "dragonfly"))]
#[inline]
fn errno_location() -> *mut libc::c_int {
    // SAFETY: always returns a valid thread-local pointer.
    unsafe { libc::__error() }
}

/// Read this thread's `errno`.
///
/// A failing call that left `errno` at zero reads as `EXIT_FAILURE` (1), so
/// the value is always usable as a child exit status.
#[inline]
pub fn last_errno() -> Errno {
    // SAFETY: errno_location points at this thread's errno.
    let raw = unsafe { *errno_location() };
    Errno::from_raw_os_error(if raw != 0 { raw } else { libc::EXIT_FAILURE })
}

/// Store `errno` for a foreign caller that reads it after a failed call.
#[inline]
pub fn set_errno(errno: Errno) {
    // SAFETY: errno_location points at this thread's errno.
    unsafe { *errno_location() = errno.raw_os_error() };
}

/// Run a raw syscall until it stops failing with `EINTR`.
///
/// `f` follows the C convention: `-1` signals failure, anything else is the
/// call's result.
#[inline]
pub fn retry_on_intr(mut f: impl FnMut() -> libc::c_int) -> Result<libc::c_int, Errno> {
    loop {
        let ret = f();
        if ret != -1 {
            return Ok(ret);
        }
        let errno = last_errno();
        if errno != Errno::INTR {
            return Err(errno);
        }
    }
}
