//! Working directory tests.

use std::fs;
use std::io::Write;

use crate::common::{exit_code, read_all, sh};

/// All three streams redirected plus a cwd override: the child reads a marker
/// file by relative path and echoes it back.
#[test]
fn marker_file_read_from_new_cwd() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("marker.txt"), "marker contents 7f3a\n").unwrap();

    let mut child = sh("read line; cat marker.txt; printf '%s' \"$line\" >&2")
        .current_dir(dir.path())
        .redirect_all()
        .spawn()
        .unwrap();

    let mut stdin = child.stdin.take().unwrap();
    stdin.write_all(b"from parent\n").unwrap();
    drop(stdin);

    assert_eq!(
        read_all(child.stdout.take().unwrap()),
        "marker contents 7f3a\n"
    );
    assert_eq!(read_all(child.stderr.take().unwrap()), "from parent");
    assert_eq!(exit_code(child.pid()), 0);
}

#[test]
fn pwd_reports_new_cwd() {
    let dir = tempfile::tempdir().unwrap();
    let expected = dir.path().canonicalize().unwrap();

    let mut child = sh("pwd -P")
        .current_dir(dir.path())
        .redirect_stdout(true)
        .spawn()
        .unwrap();

    assert_eq!(
        read_all(child.stdout.take().unwrap()).trim_end(),
        expected.to_str().unwrap()
    );
    assert_eq!(exit_code(child.pid()), 0);
}

#[test]
fn parent_cwd_is_untouched() {
    let before = std::env::current_dir().unwrap();
    let dir = tempfile::tempdir().unwrap();

    let child = sh("exit 0").current_dir(dir.path()).spawn().unwrap();
    assert_eq!(exit_code(child.pid()), 0);

    assert_eq!(std::env::current_dir().unwrap(), before);
}
