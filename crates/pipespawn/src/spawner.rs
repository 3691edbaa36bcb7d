//! The spawn operation.
//!
//! Strict order, with each step's failure reported before the next begins:
//!
//! 1. Validate the request and build the exec image (no OS resources yet)
//! 2. Preflight `access(X_OK)` on the program
//! 3. Allocate one pipe per redirected stream
//! 4. `fork()`
//! 5. Child: [`exec_child`], which never returns
//! 6. Parent: drop the child ends, wrap the parent ends, return
//!
//! ## Cleanup
//!
//! Pipe ends are `OwnedFd`s owned by this function until they are either
//! handed to the caller inside a [`SpawnedChild`] or dropped. Every early
//! return (validation, preflight, pipe or fork failure) drops whatever was
//! allocated, and the child ends are dropped on the success path, so no
//! descriptor outlives the call unless the caller now owns it and none is
//! closed twice.
//!
//! ## Threads
//!
//! `fork()` copies only the calling thread. The child side sticks to raw
//! syscalls on data prepared before the fork, so spawning from several threads
//! at once is fine. Pipes are close-on-exec, so a sibling's child never keeps
//! another spawn's pipe open past its own `execve`.

use rustix::process::Pid;
use tracing::{debug, warn};

use pipespawn_sys::{Fork, fork};

use crate::child::{ChildPlan, exec_child};
use crate::error::SpawnError;
use crate::handles::SpawnedChild;
use crate::pipes::{StdioPipes, StreamPipe};
use crate::preflight::check_executable;
use crate::request::{CreationFlags, SpawnRequest};
use crate::validate::validate_request;

/// Start a child process described by `request`.
///
/// Returns as soon as the child exists. Failures inside the child (a bad
/// working directory, `setsid`, `execve` itself) are not reported here: the
/// child exits with that call's errno as its status.
pub fn spawn(request: &SpawnRequest) -> Result<SpawnedChild, SpawnError> {
    spawn_inner(request).inspect_err(|e| {
        warn!(
            program = %request.program().display(),
            errno = e.raw_os_error(),
            "spawn failed: {e}"
        );
    })
}

fn spawn_inner(request: &SpawnRequest) -> Result<SpawnedChild, SpawnError> {
    let image = validate_request(request)?;
    debug!(
        program = %request.program().display(),
        argc = image.argv.len(),
        envc = image.envp.len(),
        "request validated"
    );

    check_executable(&image.path).map_err(|errno| SpawnError::Preflight {
        path: request.program().to_path_buf(),
        errno,
    })?;

    let pipes = StdioPipes::allocate(request.redirect_flags())?;
    debug!(
        program = %request.program().display(),
        streams = ?pipes.iter().map(StreamPipe::stream).collect::<Vec<_>>(),
        "pipes allocated"
    );

    let argv = image.argv_ptrs();
    let envp = image.envp_ptrs();
    let plan = ChildPlan {
        stdio: pipes.raw(),
        cwd: image.cwd.as_deref(),
        new_session: request
            .creation_flags()
            .contains(CreationFlags::NEW_SESSION),
        path: &image.path,
        argv: argv.as_ptr(),
        envp: envp.as_ptr(),
    };

    // SAFETY: the child branch only runs exec_child, which is limited to raw
    // syscalls on data prepared above and leaves via execve or _exit.
    let pid: Pid = match unsafe { fork() } {
        Ok(Fork::Child) => exec_child(&plan),
        Ok(Fork::Parent(pid)) => pid,
        Err(errno) => return Err(SpawnError::Fork(errno)),
    };

    let child = SpawnedChild::new(pid, pipes.into_parent_ends());
    debug!(
        pid = child.raw_pid(),
        program = %request.program().display(),
        stdin = child.stdin.is_some(),
        stdout = child.stdout.is_some(),
        stderr = child.stderr.is_some(),
        new_session = plan.new_session,
        "spawned child"
    );
    Ok(child)
}
