//! C ABI entry point.
//!
//! `pipespawn_fork_and_exec` takes already formatted `argv`/`envp` arrays and
//! integer flags, and reports through out-parameters and `errno`, for callers
//! that are not Rust.
//!
//! ## Contract
//!
//! - Returns `0` on success with `*child_pid` and the requested stream
//!   descriptors filled in; unrequested streams get `-1`.
//! - Returns `-1` on failure, with `errno` set to the originating error and
//!   `-1` written to every non-null out-parameter. Nothing is left open.
//! - Redirect flags must be exactly 0 or 1 (`EINVAL` otherwise).
//! - `envp` entries are `KEY=VALUE`; an entry without `=` is `EINVAL`.
//!   A repeated key keeps its last value.
//! - An empty `argv` runs the program with `argv[0]` set to `filename`.

use std::ffi::{CStr, OsStr};
use std::os::unix::ffi::OsStrExt;

use libc::c_char;
use pipespawn_sys::set_errno;

use crate::error::SpawnError;
use crate::request::{CreationFlags, Redirects, SpawnRequest};
use crate::spawner::spawn;
use crate::validate::ValidationError;

/// Collect a NULL-terminated array of C strings.
///
/// # Safety
///
/// `array` must be non-null and point to a NULL-terminated array of valid C
/// strings.
unsafe fn c_array<'a>(array: *const *const c_char) -> Vec<&'a CStr> {
    let mut items = Vec::new();
    let mut cursor = array;
    // SAFETY: upheld by the caller; we stop at the NULL terminator.
    unsafe {
        while !(*cursor).is_null() {
            items.push(CStr::from_ptr(*cursor));
            cursor = cursor.add(1);
        }
    }
    items
}

fn split_env_entry(index: usize, entry: &CStr) -> Result<(&OsStr, &OsStr), ValidationError> {
    let bytes = entry.to_bytes();
    let eq = bytes
        .iter()
        .position(|&b| b == b'=')
        .ok_or(ValidationError::MalformedEnvEntry(index))?;
    Ok((
        OsStr::from_bytes(&bytes[..eq]),
        OsStr::from_bytes(&bytes[eq + 1..]),
    ))
}

/// Build a [`SpawnRequest`] from raw C inputs.
///
/// # Safety
///
/// Non-null pointers must be valid C strings / NULL-terminated arrays.
unsafe fn request_from_c(
    filename: *const c_char,
    argv: *const *const c_char,
    envp: *const *const c_char,
    cwd: *const c_char,
    redirects: Redirects,
    creation_flags: i32,
) -> Result<SpawnRequest, ValidationError> {
    if filename.is_null() {
        return Err(ValidationError::NullPointer("filename"));
    }
    if argv.is_null() {
        return Err(ValidationError::NullPointer("argv"));
    }
    if envp.is_null() {
        return Err(ValidationError::NullPointer("envp"));
    }

    // SAFETY: non-null and valid per the caller.
    let (program, args, env) = unsafe {
        (
            CStr::from_ptr(filename),
            c_array(argv),
            c_array(envp),
        )
    };

    let mut request = SpawnRequest::new(OsStr::from_bytes(program.to_bytes()))
        .redirects(redirects)
        .flags(CreationFlags::from_bits_retain(creation_flags as u32));

    if let Some((arg0, rest)) = args.split_first() {
        request = request
            .arg0(OsStr::from_bytes(arg0.to_bytes()))
            .args(rest.iter().map(|arg| OsStr::from_bytes(arg.to_bytes())));
    }

    for (index, entry) in env.iter().enumerate() {
        let (key, value) = split_env_entry(index, entry)?;
        request = request.env(key, value);
    }

    if !cwd.is_null() {
        // SAFETY: non-null and valid per the caller.
        let cwd = unsafe { CStr::from_ptr(cwd) };
        request = request.current_dir(OsStr::from_bytes(cwd.to_bytes()));
    }

    Ok(request)
}

/// Fork and exec `filename` with optional stdio pipes.
///
/// # Safety
///
/// - `filename` and `cwd` (if non-null) must be valid C strings.
/// - `argv` and `envp` must be NULL-terminated arrays of valid C strings.
/// - Out-parameters must be valid for writing an `i32`.
#[unsafe(no_mangle)]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn pipespawn_fork_and_exec(
    filename: *const c_char,
    argv: *const *const c_char,
    envp: *const *const c_char,
    cwd: *const c_char,
    redirect_stdin: i32,
    redirect_stdout: i32,
    redirect_stderr: i32,
    creation_flags: i32,
    child_pid: *mut i32,
    stdin_fd: *mut i32,
    stdout_fd: *mut i32,
    stderr_fd: *mut i32,
) -> i32 {
    let outputs = [child_pid, stdin_fd, stdout_fd, stderr_fd];

    let result = if outputs.iter().any(|out| out.is_null()) {
        Err(SpawnError::from(ValidationError::NullPointer("output")))
    } else {
        Redirects::from_raw(redirect_stdin, redirect_stdout, redirect_stderr)
            // SAFETY: pointer validity is the caller's contract.
            .and_then(|redirects| unsafe {
                request_from_c(filename, argv, envp, cwd, redirects, creation_flags)
            })
            .map_err(SpawnError::from)
            .and_then(|request| spawn(&request))
    };

    match result {
        Ok(child) => {
            let parts = child.into_raw_parts();
            // SAFETY: all outputs were checked non-null above.
            unsafe {
                *child_pid = parts.pid;
                *stdin_fd = parts.stdin;
                *stdout_fd = parts.stdout;
                *stderr_fd = parts.stderr;
            }
            0
        }
        Err(e) => {
            for out in outputs {
                if !out.is_null() {
                    // SAFETY: non-null outputs are writable per the caller.
                    unsafe { *out = -1 };
                }
            }
            set_errno(e.errno());
            -1
        }
    }
}
