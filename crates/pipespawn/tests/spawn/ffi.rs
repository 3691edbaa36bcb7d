//! C ABI tests.

use std::ffi::{CStr, CString};
use std::fs::File;
use std::io;
use std::os::fd::FromRawFd;
use std::ptr;

use libc::c_char;
use pipespawn::ffi::pipespawn_fork_and_exec;
use rustix::process::Pid;

use crate::common::{exit_code, read_all};

struct Outputs {
    ret: i32,
    errno: i32,
    pid: i32,
    stdin: i32,
    stdout: i32,
    stderr: i32,
}

fn call(
    filename: Option<&CStr>,
    argv: &[&CStr],
    envp: &[&CStr],
    cwd: Option<&CStr>,
    redirects: (i32, i32, i32),
    flags: i32,
) -> Outputs {
    let argv_ptrs: Vec<*const c_char> = argv
        .iter()
        .map(|s| s.as_ptr())
        .chain(std::iter::once(ptr::null()))
        .collect();
    let envp_ptrs: Vec<*const c_char> = envp
        .iter()
        .map(|s| s.as_ptr())
        .chain(std::iter::once(ptr::null()))
        .collect();

    let (mut pid, mut stdin, mut stdout, mut stderr) = (0, 0, 0, 0);
    let ret = unsafe {
        pipespawn_fork_and_exec(
            filename.map_or(ptr::null(), CStr::as_ptr),
            argv_ptrs.as_ptr(),
            envp_ptrs.as_ptr(),
            cwd.map_or(ptr::null(), CStr::as_ptr),
            redirects.0,
            redirects.1,
            redirects.2,
            flags,
            &mut pid,
            &mut stdin,
            &mut stdout,
            &mut stderr,
        )
    };
    let errno = io::Error::last_os_error().raw_os_error().unwrap_or(0);
    Outputs {
        ret,
        errno,
        pid,
        stdin,
        stdout,
        stderr,
    }
}

fn assert_all_sentinels(out: &Outputs) {
    assert_eq!(out.ret, -1);
    assert_eq!(
        (out.pid, out.stdin, out.stdout, out.stderr),
        (-1, -1, -1, -1)
    );
}

#[test]
fn stdout_through_c_abi() {
    let out = call(
        Some(c"/bin/sh"),
        &[c"sh", c"-c", c"printf \"$MSG\""],
        &[c"MSG=from c"],
        None,
        (0, 1, 0),
        0,
    );
    assert_eq!(out.ret, 0);
    assert!(out.pid > 0);
    assert_eq!(out.stdin, -1);
    assert_eq!(out.stderr, -1);
    assert!(out.stdout >= 0);

    let stdout = unsafe { File::from_raw_fd(out.stdout) };
    assert_eq!(read_all(stdout), "from c");
    assert_eq!(exit_code(Pid::from_raw(out.pid).unwrap()), 0);
}

#[test]
fn cwd_through_c_abi() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("m"), "abi marker").unwrap();
    let cwd = CString::new(dir.path().to_str().unwrap()).unwrap();

    let out = call(
        Some(c"/bin/sh"),
        &[c"sh", c"-c", c"read x < m; printf '%s' \"$x\""],
        &[],
        Some(&cwd),
        (1, 1, 1),
        1,
    );
    assert_eq!(out.ret, 0);
    assert!(out.stdin >= 0 && out.stdout >= 0 && out.stderr >= 0);

    unsafe {
        drop(File::from_raw_fd(out.stdin));
        drop(File::from_raw_fd(out.stderr));
    }
    let stdout = unsafe { File::from_raw_fd(out.stdout) };
    assert_eq!(read_all(stdout), "abi marker");
    assert_eq!(exit_code(Pid::from_raw(out.pid).unwrap()), 0);
}

#[test]
fn non_boolean_flag_is_einval() {
    let out = call(Some(c"/bin/sh"), &[c"sh"], &[], None, (0, 2, 0), 0);
    assert_all_sentinels(&out);
    assert_eq!(out.errno, libc::EINVAL);
}

#[test]
fn null_filename_is_einval() {
    let out = call(None, &[c"sh"], &[], None, (0, 0, 0), 0);
    assert_all_sentinels(&out);
    assert_eq!(out.errno, libc::EINVAL);
}

#[test]
fn env_entry_without_equals_is_einval() {
    let out = call(Some(c"/bin/sh"), &[c"sh"], &[c"JUSTAKEY"], None, (1, 1, 1), 0);
    assert_all_sentinels(&out);
    assert_eq!(out.errno, libc::EINVAL);
}

#[test]
fn missing_program_sets_enoent() {
    let out = call(
        Some(c"/nonexistent/pipespawn"),
        &[c"x"],
        &[],
        None,
        (1, 1, 1),
        0,
    );
    assert_all_sentinels(&out);
    assert_eq!(out.errno, libc::ENOENT);
}

#[test]
fn null_output_pointer_is_einval() {
    let argv = [c"sh".as_ptr(), ptr::null()];
    let envp = [ptr::null::<c_char>()];
    let (mut pid, mut stdin, mut stdout) = (0, 0, 0);
    let ret = unsafe {
        pipespawn_fork_and_exec(
            c"/bin/sh".as_ptr(),
            argv.as_ptr(),
            envp.as_ptr(),
            ptr::null(),
            0,
            0,
            0,
            0,
            &mut pid,
            &mut stdin,
            &mut stdout,
            ptr::null_mut(),
        )
    };
    assert_eq!(ret, -1);
    assert_eq!(io::Error::last_os_error().raw_os_error(), Some(libc::EINVAL));
    assert_eq!((pid, stdin, stdout), (-1, -1, -1));
}
