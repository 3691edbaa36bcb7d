//! Spawn request.
//!
//! A `SpawnRequest` describes one child: the program, its argument vector,
//! its complete environment, an optional working directory, which stdio
//! streams to pipe back to the caller, and creation flags.
//!
//! ## Example
//!
//! ```no_run
//! use pipespawn::SpawnRequest;
//!
//! let child = SpawnRequest::new("/bin/sh")
//!     .args(["-c", "echo hello"])
//!     .env("PATH", "/usr/bin:/bin")
//!     .redirect_stdout(true)
//!     .spawn()?;
//! # Ok::<(), pipespawn::SpawnError>(())
//! ```
//!
//! ## Defaults
//!
//! | Field | Default |
//! |-------|---------|
//! | `argv[0]` | program path |
//! | `env` | empty (nothing inherited) |
//! | `cwd` | inherited from the parent |
//! | redirects | none |
//! | flags | none |

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::ops::BitOr;
use std::path::{Path, PathBuf};

use crate::error::SpawnError;
use crate::handles::SpawnedChild;
use crate::pipes::Stream;
use crate::validate::ValidationError;

/// Process creation flags.
///
/// Only [`CreationFlags::NEW_SESSION`] has a meaning; other bits are kept but
/// ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CreationFlags(u32);

impl CreationFlags {
    /// Make the child the leader of a new session and process group.
    pub const NEW_SESSION: Self = Self(0x1);

    #[inline]
    pub const fn empty() -> Self {
        Self(0)
    }

    #[inline]
    pub const fn from_bits_retain(bits: u32) -> Self {
        Self(bits)
    }

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for CreationFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Which standard streams get a pipe back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Redirects {
    pub stdin: bool,
    pub stdout: bool,
    pub stderr: bool,
}

impl Redirects {
    pub const NONE: Self = Self {
        stdin: false,
        stdout: false,
        stderr: false,
    };

    pub const ALL: Self = Self {
        stdin: true,
        stdout: true,
        stderr: true,
    };

    /// Build from C-style integer flags. Anything other than 0 or 1 is rejected.
    pub fn from_raw(stdin: i32, stdout: i32, stderr: i32) -> Result<Self, ValidationError> {
        fn strict(stream: &'static str, value: i32) -> Result<bool, ValidationError> {
            match value {
                0 => Ok(false),
                1 => Ok(true),
                value => Err(ValidationError::NonBooleanFlag { stream, value }),
            }
        }
        Ok(Self {
            stdin: strict("stdin", stdin)?,
            stdout: strict("stdout", stdout)?,
            stderr: strict("stderr", stderr)?,
        })
    }

    /// Whether `stream` will be piped.
    #[inline]
    pub fn contains(self, stream: Stream) -> bool {
        match stream {
            Stream::Stdin => self.stdin,
            Stream::Stdout => self.stdout,
            Stream::Stderr => self.stderr,
        }
    }

    /// Number of streams that will be piped.
    #[inline]
    pub fn count(self) -> usize {
        Stream::ALL.into_iter().filter(|&s| self.contains(s)).count()
    }
}

/// Everything needed to start one child process.
#[derive(Debug, Clone)]
pub struct SpawnRequest {
    program: PathBuf,
    arg0: Option<OsString>,
    args: Vec<OsString>,
    env: BTreeMap<OsString, OsString>,
    cwd: Option<PathBuf>,
    redirects: Redirects,
    flags: CreationFlags,
}

impl SpawnRequest {
    /// Request to run the executable at `program`. No PATH lookup is done.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            arg0: None,
            args: Vec::new(),
            env: BTreeMap::new(),
            cwd: None,
            redirects: Redirects::NONE,
            flags: CreationFlags::empty(),
        }
    }

    /// Override `argv[0]` (defaults to the program path).
    pub fn arg0(mut self, arg0: impl Into<OsString>) -> Self {
        self.arg0 = Some(arg0.into());
        self
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set one environment variable, replacing any earlier value for `key`.
    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<OsString>,
        V: Into<OsString>,
    {
        for (key, value) in vars {
            self.env.insert(key.into(), value.into());
        }
        self
    }

    pub fn env_remove(mut self, key: impl AsRef<OsStr>) -> Self {
        self.env.remove(key.as_ref());
        self
    }

    pub fn env_clear(mut self) -> Self {
        self.env.clear();
        self
    }

    /// Working directory the child changes into before exec.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn redirect_stdin(mut self, enabled: bool) -> Self {
        self.redirects.stdin = enabled;
        self
    }

    pub fn redirect_stdout(mut self, enabled: bool) -> Self {
        self.redirects.stdout = enabled;
        self
    }

    pub fn redirect_stderr(mut self, enabled: bool) -> Self {
        self.redirects.stderr = enabled;
        self
    }

    pub fn redirects(mut self, redirects: Redirects) -> Self {
        self.redirects = redirects;
        self
    }

    pub fn redirect_all(self) -> Self {
        self.redirects(Redirects::ALL)
    }

    pub fn flags(mut self, flags: CreationFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Detach the child into its own session.
    pub fn new_session(mut self, enabled: bool) -> Self {
        self.flags = if enabled {
            self.flags | CreationFlags::NEW_SESSION
        } else {
            CreationFlags::from_bits_retain(self.flags.bits() & !CreationFlags::NEW_SESSION.bits())
        };
        self
    }

    /// Spawn the child. See [`crate::spawn`].
    pub fn spawn(&self) -> Result<SpawnedChild, SpawnError> {
        crate::spawner::spawn(self)
    }

    #[inline]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Full argument vector, `argv[0]` included.
    pub fn argv(&self) -> impl Iterator<Item = &OsStr> {
        let arg0 = self.arg0.as_deref().unwrap_or(self.program.as_os_str());
        std::iter::once(arg0).chain(self.args.iter().map(OsString::as_os_str))
    }

    #[inline]
    pub fn environment(&self) -> &BTreeMap<OsString, OsString> {
        &self.env
    }

    #[inline]
    pub fn working_dir(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    #[inline]
    pub fn redirect_flags(&self) -> Redirects {
        self.redirects
    }

    #[inline]
    pub fn creation_flags(&self) -> CreationFlags {
        self.flags
    }
}
