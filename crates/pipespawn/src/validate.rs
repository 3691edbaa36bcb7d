//! Input validation and C string preparation.
//!
//! Runs before any descriptor is opened. Everything the child needs after
//! `fork()` is converted to NUL-terminated strings here, because the child
//! may not allocate:
//!
//! - **Empty program** - Nothing to exec
//! - **Null bytes** - Would silently truncate a path, argument or variable
//! - **Bad env keys** - Empty or containing `=` cannot round-trip through `envp`
//! - **Non-boolean flags** - Raw redirect flags must be exactly 0 or 1

use std::ffi::{CString, OsStr};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use libc::c_char;
use thiserror::Error;

use crate::request::SpawnRequest;

/// Validation error for spawn inputs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("program path cannot be empty")]
    EmptyProgram,

    #[error("null byte in {0}")]
    NullByte(&'static str),

    #[error("environment variable name cannot be empty")]
    EmptyEnvKey,

    #[error("environment variable name contains '=': {0}")]
    EnvKeyContainsEquals(String),

    #[error("environment entry {0} is not KEY=VALUE")]
    MalformedEnvEntry(usize),

    #[error("redirect flag for {stream} must be 0 or 1, got {value}")]
    NonBooleanFlag { stream: &'static str, value: i32 },

    #[error("null pointer for {0}")]
    NullPointer(&'static str),
}

/// A validated request in the form `execve` wants it.
#[derive(Debug)]
pub(crate) struct ExecImage {
    pub path: CString,
    pub argv: Vec<CString>,
    pub envp: Vec<CString>,
    pub cwd: Option<CString>,
}

impl ExecImage {
    /// NULL-terminated pointer array into `argv`. Valid while `self` lives.
    pub fn argv_ptrs(&self) -> Vec<*const c_char> {
        null_terminated(&self.argv)
    }

    /// NULL-terminated pointer array into `envp`. Valid while `self` lives.
    pub fn envp_ptrs(&self) -> Vec<*const c_char> {
        null_terminated(&self.envp)
    }
}

fn null_terminated(strings: &[CString]) -> Vec<*const c_char> {
    strings
        .iter()
        .map(|s| s.as_ptr())
        .chain(std::iter::once(std::ptr::null()))
        .collect()
}

fn c_string(bytes: &[u8], what: &'static str) -> Result<CString, ValidationError> {
    CString::new(bytes).map_err(|_| ValidationError::NullByte(what))
}

fn c_path(path: &Path, what: &'static str) -> Result<CString, ValidationError> {
    c_string(path.as_os_str().as_bytes(), what)
}

fn env_entry(key: &OsStr, value: &OsStr) -> Result<CString, ValidationError> {
    let key = key.as_bytes();
    if key.is_empty() {
        return Err(ValidationError::EmptyEnvKey);
    }
    if key.contains(&b'=') {
        return Err(ValidationError::EnvKeyContainsEquals(
            String::from_utf8_lossy(key).into_owned(),
        ));
    }
    let value = value.as_bytes();
    let mut entry = Vec::with_capacity(key.len() + 1 + value.len());
    entry.extend_from_slice(key);
    entry.push(b'=');
    entry.extend_from_slice(value);
    c_string(&entry, "environment")
}

/// Validate `request` and prepare its exec image.
pub(crate) fn validate_request(request: &SpawnRequest) -> Result<ExecImage, ValidationError> {
    if request.program().as_os_str().is_empty() {
        return Err(ValidationError::EmptyProgram);
    }
    let path = c_path(request.program(), "program path")?;

    let argv = request
        .argv()
        .map(|arg| c_string(arg.as_bytes(), "argument"))
        .collect::<Result<Vec<_>, _>>()?;

    let envp = request
        .environment()
        .iter()
        .map(|(key, value)| env_entry(key, value))
        .collect::<Result<Vec<_>, _>>()?;

    let cwd = request
        .working_dir()
        .map(|dir| c_path(dir, "working directory"))
        .transpose()?;

    Ok(ExecImage {
        path,
        argv,
        envp,
        cwd,
    })
}
