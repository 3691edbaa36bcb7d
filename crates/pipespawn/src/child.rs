//! Child side of the fork.
//!
//! Runs in the freshly forked process, where only async-signal-safe calls are
//! allowed. Everything it touches was prepared by the parent before `fork()`:
//! raw descriptor numbers, C strings and pointer arrays. No allocation, no
//! locks, no destructors, no unwinding. The only ways out are a successful
//! `execve` or `_exit` with the failing call's errno as the status.
//!
//! 1. Close parent pipe ends
//! 2. Install child pipe ends on stdin/stdout/stderr (dup2)
//! 3. Close the superseded pipe descriptors
//! 4. chdir (if requested)
//! 5. setsid (if requested)
//! 6. SIGPIPE back to its default disposition
//! 7. execve
//!
//! Other signal dispositions and the signal mask are inherited unchanged.

use std::ffi::CStr;
use std::os::fd::RawFd;

use libc::c_char;
use pipespawn_sys::fd::{clear_cloexec, close_if_open, dup2_retry, dup_above_stdio};
use pipespawn_sys::process::{chdir_retry, execve, exit_with_errno, reset_sigpipe, setsid_retry};

use crate::pipes::RawStdio;

/// Everything the child needs, borrowed from parent-owned storage.
pub(crate) struct ChildPlan<'a> {
    pub stdio: [Option<RawStdio>; 3],
    pub cwd: Option<&'a CStr>,
    pub new_session: bool,
    pub path: &'a CStr,
    /// NULL-terminated, points into storage that outlives the plan.
    pub argv: *const *const c_char,
    /// NULL-terminated, points into storage that outlives the plan.
    pub envp: *const *const c_char,
}

/// Run the child protocol. Never returns.
pub(crate) fn exec_child(plan: &ChildPlan<'_>) -> ! {
    // 1. Close the parent's ends; the child never uses them.
    for fds in plan.stdio.iter().flatten() {
        close_if_open(fds.parent);
    }

    // A child end sitting on another stream's slot would be clobbered by that
    // stream's dup2, so move it out of 0..=2 first.
    let mut ends: [Option<(RawFd, RawFd)>; 3] = [None; 3];
    for (slot, fds) in ends.iter_mut().zip(plan.stdio.iter()) {
        if let Some(fds) = fds {
            let mut child = fds.child;
            if child <= libc::STDERR_FILENO && child != fds.target {
                child = match dup_above_stdio(child) {
                    Ok(fd) => fd,
                    Err(errno) => exit_with_errno(errno),
                };
                close_if_open(fds.child);
            }
            *slot = Some((child, fds.target));
        }
    }

    // 2. Install each end on its stdio slot.
    for &(child, target) in ends.iter().flatten() {
        let installed = if child == target {
            clear_cloexec(child)
        } else {
            dup2_retry(child, target)
        };
        if let Err(errno) = installed {
            exit_with_errno(errno);
        }
    }

    // 3. The originals are superseded by the stdio copies.
    for &(child, target) in ends.iter().flatten() {
        if child != target {
            close_if_open(child);
        }
    }

    // 4. Working directory.
    if let Some(cwd) = plan.cwd {
        if let Err(errno) = chdir_retry(cwd) {
            exit_with_errno(errno);
        }
    }

    // 5. New session: pid == pgid == sid afterwards.
    if plan.new_session {
        if let Err(errno) = setsid_retry() {
            exit_with_errno(errno);
        }
    }

    // 6. The parent runtime ignores SIGPIPE; the new program should not.
    if let Err(errno) = reset_sigpipe() {
        exit_with_errno(errno);
    }

    // 7. Replace the image. Returning means it failed.
    // SAFETY: argv/envp are NULL-terminated and outlive this call.
    let errno = unsafe { execve(plan.path, plan.argv, plan.envp) };
    exit_with_errno(errno)
}
