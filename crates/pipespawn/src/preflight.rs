//! Executable preflight.
//!
//! Checks that the program exists and is executable by the caller before
//! anything is forked, so the common failure comes back as an error instead of
//! as the exit status of a child that never ran.
//!
//! The check races with the real `execve`: the file can change in between.
//! That is fine, because the child reports an exec failure through its exit
//! status anyway. Format problems (bad ELF, missing interpreter) are only ever
//! caught by `execve` itself.

use std::ffi::CStr;

use rustix::fs::{Access, access};
use rustix::io::Errno;

/// `access(path, X_OK)`.
pub fn check_executable(path: &CStr) -> Result<(), Errno> {
    access(path, Access::EXEC_OK)
}
