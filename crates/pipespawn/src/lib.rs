//! pipespawn: fork/exec a child with piped stdio.
//!
//! Starts a child process, optionally connecting its stdin, stdout and stderr
//! to pipes whose other ends are handed back to the caller, and returns
//! without waiting for the child. Reaping the child and draining or closing
//! the streams is the caller's job.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::io::Read;
//!
//! use pipespawn::SpawnRequest;
//!
//! let mut child = SpawnRequest::new("/bin/echo")
//!     .arg("hello")
//!     .redirect_stdout(true)
//!     .spawn()?;
//!
//! let mut out = String::new();
//! child.stdout.take().unwrap().read_to_string(&mut out)?;
//! assert_eq!(out, "hello\n");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Errors
//!
//! Setup failures (bad input, program not executable, pipe or fork failure)
//! come back as [`SpawnError`] carrying the original errno. Anything that
//! goes wrong inside the child after the fork shows up only as the child's
//! exit status, which is that failure's errno.
//!
//! ## C ABI
//!
//! [`ffi::pipespawn_fork_and_exec`] exposes the same operation with raw
//! argv/envp arrays, integer flags and out-parameters.

mod child;
pub mod error;
pub mod ffi;
pub mod handles;
pub mod pipes;
pub mod preflight;
pub mod request;
mod spawner;
pub mod validate;

pub use error::{SpawnError, SpawnErrorKind};
pub use handles::{ChildStderr, ChildStdin, ChildStdout, RawParts, SpawnedChild};
pub use pipes::Stream;
pub use request::{CreationFlags, Redirects, SpawnRequest};
pub use spawner::spawn;
pub use validate::ValidationError;
