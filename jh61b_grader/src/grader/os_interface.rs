//! The boundary between the grader and the processes it launches.
//!
//! A command runs exactly once, with stdout and stderr merged into a single capture, and is
//! bounded by an optional wall-clock timeout. When the timeout expires the child's whole
//! process group is killed, so nothing the harness forked outlives the call.

use crate::error::RunnerError;
use std::{
    fs::File,
    io::{self, Read, Seek, SeekFrom},
    path::Path,
    process::{Child, Command, ExitStatus, Stdio},
    thread,
    time::{Duration, Instant},
};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SubprocessResult {
    /// stdout and stderr, interleaved as written.
    pub output: String,
    /// Exit code, or the negated signal number when the process was killed by a signal.
    pub return_code: i32,
    pub timed_out: bool,
}

/// Runs `command` (program followed by its arguments) in `cwd`.
///
/// A nonzero exit is reported in the result, not as an error. Errors only mean the process
/// could not be started, waited on, or its output could not be captured.
pub fn run_subprocess<S: AsRef<str>>(
    command: &[S],
    cwd: &Path,
    timeout: Option<Duration>,
) -> Result<SubprocessResult, RunnerError> {
    let (program, args) = command.split_first().ok_or(RunnerError::EmptyCommand)?;
    let program = program.as_ref();

    // A shared file keeps the interleaving of both streams and cannot fill up like a pipe.
    let mut capture = tempfile::tempfile().map_err(RunnerError::Capture)?;
    let stdout = capture.try_clone().map_err(RunnerError::Capture)?;
    let stderr = capture.try_clone().map_err(RunnerError::Capture)?;

    let mut cmd = Command::new(program);
    cmd.args(args.iter().map(AsRef::as_ref))
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout))
        .stderr(Stdio::from(stderr));
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    log::debug!("Spawning '{program}' in {}", cwd.display());
    let mut child = cmd.spawn().map_err(|source| RunnerError::Spawn {
        program: program.to_string(),
        source,
    })?;

    let waited = match timeout {
        Some(timeout) => wait_with_deadline(&mut child, timeout),
        None => child.wait().map(|status| (status, false)),
    };
    let (status, timed_out) = waited.map_err(|source| RunnerError::Wait {
        program: program.to_string(),
        source,
    })?;

    let output = read_capture(&mut capture).map_err(RunnerError::Capture)?;
    let return_code = return_code(status);
    log::debug!("'{program}' finished with code {return_code} (timed out: {timed_out})");

    Ok(SubprocessResult {
        output,
        return_code,
        timed_out,
    })
}

fn wait_with_deadline(child: &mut Child, timeout: Duration) -> io::Result<(ExitStatus, bool)> {
    // Too far out to represent: no different from waiting forever.
    let Some(deadline) = Instant::now().checked_add(timeout) else {
        return child.wait().map(|status| (status, false));
    };
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok((status, false)),
            Ok(None) => {}
            Err(err) => {
                kill_process_tree(child);
                return Err(err);
            }
        }
        if Instant::now() >= deadline {
            kill_process_tree(child);
            return Ok((child.wait()?, true));
        }
        thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(unix)]
fn kill_process_tree(child: &mut Child) {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    // The child leads its own group (see `process_group(0)`), and it has not been reaped
    // yet, so its pid is still a valid group id.
    let group = Pid::from_raw(child.id() as i32);
    if let Err(err) = killpg(group, Signal::SIGKILL) {
        log::warn!("Unable to kill process group {group}: {err}");
        if let Err(err) = child.kill() {
            log::warn!("Unable to kill process {}: {err}", child.id());
        }
    }
}

#[cfg(not(unix))]
fn kill_process_tree(child: &mut Child) {
    if let Err(err) = child.kill() {
        log::warn!("Unable to kill process {}: {err}", child.id());
    }
}

fn read_capture(capture: &mut File) -> io::Result<String> {
    capture.seek(SeekFrom::Start(0))?;
    let mut bytes = vec![];
    capture.read_to_end(&mut bytes)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn return_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }
    -1
}
