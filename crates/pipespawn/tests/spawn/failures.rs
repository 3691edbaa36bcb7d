//! Synchronous setup failures.
//!
//! Each of these must come back as an error from `spawn` with the original
//! errno, never as a live child.

use std::fs;
use std::os::unix::fs::PermissionsExt;

use pipespawn::{SpawnErrorKind, SpawnRequest, ValidationError, spawn};
use rustix::io::Errno;

use crate::common::SH;

/// Missing program: not found, no child.
#[test]
fn missing_program() {
    let err = spawn(&SpawnRequest::new("/nonexistent/pipespawn-target").redirect_all())
        .unwrap_err();
    assert_eq!(err.kind(), SpawnErrorKind::PreflightAccess);
    assert_eq!(err.errno(), Errno::NOENT);
}

#[test]
fn program_without_exec_permission() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("script.sh");
    fs::write(&script, "#!/bin/sh\nexit 0\n").unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o644)).unwrap();

    let err = SpawnRequest::new(&script).spawn().unwrap_err();
    assert_eq!(err.kind(), SpawnErrorKind::PreflightAccess);
    assert_eq!(err.errno(), Errno::ACCESS);
    assert!(err.to_string().contains("script.sh"));
}

#[test]
fn directory_is_not_executable_program() {
    let dir = tempfile::tempdir().unwrap();
    // Directories pass access(X_OK); execve rejects them in the child.
    let child = SpawnRequest::new(dir.path()).spawn().unwrap();
    assert_eq!(
        crate::common::exit_code(child.pid()),
        Errno::ACCESS.raw_os_error() as u32
    );
}

#[test]
fn relative_name_is_not_searched() {
    let err = SpawnRequest::new("sh-not-on-any-path-relative").spawn().unwrap_err();
    assert_eq!(err.errno(), Errno::NOENT);
}

#[test]
fn invalid_arguments() {
    let cases = [
        SpawnRequest::new(""),
        SpawnRequest::new(SH).arg("bad\0arg"),
        SpawnRequest::new(SH).env("", "value"),
        SpawnRequest::new(SH).env("K=V", "value"),
        SpawnRequest::new(SH).current_dir("/tmp\0"),
    ];
    for request in cases {
        let err = request.spawn().unwrap_err();
        assert_eq!(err.kind(), SpawnErrorKind::InvalidArgument, "{request:?}");
        assert_eq!(err.errno(), Errno::INVAL);
    }
}

#[test]
fn invalid_argument_beats_missing_program() {
    let err = SpawnRequest::new("/nonexistent/program")
        .env("", "x")
        .spawn()
        .unwrap_err();
    assert!(matches!(
        err,
        pipespawn::SpawnError::InvalidArgument(ValidationError::EmptyEnvKey)
    ));
}
