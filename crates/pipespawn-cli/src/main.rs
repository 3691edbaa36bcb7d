//! pipespawn CLI - run a program with piped stdio and relay its streams

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::thread;

use anyhow::{Context, bail};
use clap::Parser;
use pipespawn::SpawnRequest;
use rustix::process::{WaitOptions, waitpid};

#[derive(Parser, Debug)]
#[command(name = "pipespawn")]
#[command(author, version, about = "Run a program with piped stdin/stdout/stderr")]
struct Cli {
    /// Pipe our stdin into the child
    #[arg(long)]
    stdin: bool,

    /// Capture the child's stdout through a pipe
    #[arg(long)]
    stdout: bool,

    /// Capture the child's stderr through a pipe
    #[arg(long)]
    stderr: bool,

    /// Shorthand for --stdin --stdout --stderr
    #[arg(short = 'a', long)]
    all: bool,

    /// Working directory for the child
    #[arg(short = 'C', long)]
    cwd: Option<PathBuf>,

    /// Start the child in a new session
    #[arg(long)]
    new_session: bool,

    /// Pass our environment to the child
    #[arg(long)]
    inherit_env: bool,

    /// Extra environment variable, KEY=VALUE (repeatable)
    #[arg(short, long = "env", value_parser = parse_env)]
    env: Vec<(String, String)>,

    /// Prefix relayed stdout/stderr lines with the stream name
    #[arg(long)]
    tag: bool,

    /// Program to run; names without '/' are looked up in PATH
    program: String,

    /// Arguments for the program
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn parse_env(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    if key.is_empty() {
        return Err("environment variable name cannot be empty".into());
    }
    Ok((key.to_string(), value.to_string()))
}

fn resolve_program(program: &str) -> anyhow::Result<PathBuf> {
    if program.contains('/') {
        return Ok(PathBuf::from(program));
    }
    which::which(program).with_context(|| format!("command not found: {program}"))
}

fn build_request(cli: &Cli, program: &Path) -> SpawnRequest {
    let mut request = SpawnRequest::new(program)
        .arg0(&cli.program)
        .args(&cli.args)
        .redirect_stdin(cli.stdin || cli.all)
        .redirect_stdout(cli.stdout || cli.all)
        .redirect_stderr(cli.stderr || cli.all)
        .new_session(cli.new_session);
    if cli.inherit_env {
        request = request.envs(std::env::vars_os());
    }
    request = request.envs(cli.env.iter().cloned());
    if let Some(cwd) = &cli.cwd {
        request = request.current_dir(cwd);
    }
    request
}

/// Copy `reader` to `writer` until EOF, optionally prefixing each line.
fn relay(mut reader: impl Read, mut writer: impl Write, tag: Option<&str>) -> io::Result<u64> {
    let Some(tag) = tag else {
        return io::copy(&mut reader, &mut writer);
    };

    let mut total = 0;
    let mut buf = [0u8; 8192];
    let mut at_line_start = true;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        for line in buf[..n].split_inclusive(|&b| b == b'\n') {
            if at_line_start {
                write!(writer, "[{tag}] ")?;
            }
            writer.write_all(line)?;
            at_line_start = line.ends_with(b"\n");
        }
        writer.flush()?;
        total += n as u64;
    }
    Ok(total)
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    let program = resolve_program(&cli.program)?;
    let request = build_request(&cli, &program);

    let mut child = request
        .spawn()
        .with_context(|| format!("failed to spawn {}", program.display()))?;
    tracing::info!(pid = child.raw_pid(), program = %program.display(), "started");

    if let Some(mut stdin) = child.stdin.take() {
        // Not joined: our stdin may never reach EOF.
        thread::spawn(move || {
            if let Err(e) = io::copy(&mut io::stdin().lock(), &mut stdin) {
                tracing::debug!("stdin relay stopped: {e}");
            }
        });
    }

    let mut relays = Vec::new();
    if let Some(stdout) = child.stdout.take() {
        let tag = cli.tag.then_some("stdout");
        relays.push(("stdout", thread::spawn(move || relay(stdout, io::stdout(), tag))));
    }
    if let Some(stderr) = child.stderr.take() {
        let tag = cli.tag.then_some("stderr");
        relays.push(("stderr", thread::spawn(move || relay(stderr, io::stderr(), tag))));
    }

    let status = waitpid(Some(child.pid()), WaitOptions::empty())
        .context("waitpid")?
        .context("child status unavailable")?;

    for (name, handle) in relays {
        match handle.join() {
            Ok(Ok(bytes)) => tracing::debug!(stream = name, bytes, "relay finished"),
            Ok(Err(e)) => tracing::warn!(stream = name, "relay failed: {e}"),
            Err(_) => bail!("{name} relay thread panicked"),
        }
    }

    let code = if let Some(code) = status.exit_status() {
        code as i32
    } else if let Some(signal) = status.terminating_signal() {
        128 + signal as i32
    } else {
        1
    };
    tracing::info!(pid = child.raw_pid(), code, "exited");
    Ok(code)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pipespawn=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let code = run(cli)?;
    std::process::exit(code);
}
