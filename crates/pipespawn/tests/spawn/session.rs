//! Session detachment tests.
//!
//! The child `exec`s into `cat /proc/self/stat`, so the pid in that file is
//! the spawned pid and its pgrp/session fields show whether `setsid` ran.

use pipespawn::{CreationFlags, SpawnRequest};

use crate::common::{CHILD_PATH, SH, exit_code, read_all};

/// (pid, pgrp, session) from a `/proc/<pid>/stat` line.
fn parse_stat(stat: &str) -> (i32, i32, i32) {
    let pid = stat.split_whitespace().next().unwrap().parse().unwrap();
    // comm may contain spaces; fields after the closing paren are fixed.
    let rest = &stat[stat.rfind(')').unwrap() + 1..];
    let fields: Vec<&str> = rest.split_whitespace().collect();
    // state ppid pgrp session ...
    (pid, fields[2].parse().unwrap(), fields[3].parse().unwrap())
}

fn self_stat(request: SpawnRequest) -> (i32, (i32, i32, i32)) {
    let mut child = request
        .args(["-c", "exec cat /proc/self/stat"])
        .env("PATH", CHILD_PATH)
        .redirect_stdout(true)
        .spawn()
        .unwrap();
    let stat = read_all(child.stdout.take().unwrap());
    let pid = child.raw_pid();
    assert_eq!(exit_code(child.pid()), 0);
    (pid, parse_stat(&stat))
}

#[test]
fn new_session_makes_child_leader() {
    let (pid, (stat_pid, pgrp, session)) = self_stat(SpawnRequest::new(SH).new_session(true));
    assert_eq!(stat_pid, pid);
    assert_eq!(pgrp, pid);
    assert_eq!(session, pid);
}

#[test]
fn default_keeps_parent_session() {
    let (pid, (stat_pid, _pgrp, session)) = self_stat(SpawnRequest::new(SH));
    assert_eq!(stat_pid, pid);
    assert_ne!(session, pid);
}

#[test]
fn reserved_flag_bits_are_ignored() {
    let flags = CreationFlags::from_bits_retain(0xF0);
    let (pid, (_, _, session)) = self_stat(SpawnRequest::new(SH).flags(flags));
    assert_ne!(session, pid);
}

#[test]
fn parse_stat_handles_spaces_in_comm() {
    assert_eq!(parse_stat("12 (a b) S 1 12 12 0"), (12, 12, 12));
}
