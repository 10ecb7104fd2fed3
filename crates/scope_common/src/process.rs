//! Deadline-bounded external process execution, shared by the ffmpeg frame
//! source and the command-backed classifier.

use std::io::{Read, Write};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::{CommonError, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Captured output of a finished process
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub stdout: Vec<u8>,
    pub stderr: String,
}

/// Spawn `cmd`, feed it `stdin`, and collect stdout. The child is killed if
/// it runs past `timeout`. stdout and stderr are drained on their own
/// threads so a chatty child cannot block on a full pipe.
pub fn run_with_deadline(
    mut cmd: Command,
    stdin: Option<Vec<u8>>,
    timeout: Duration,
) -> Result<ProcessOutput> {
    let program = cmd.get_program().to_string_lossy().to_string();
    debug!(program = %program, ?timeout, "spawning process");

    cmd.stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    // Avoid picking up unrelated dynamic library overrides
    cmd.env_remove("DYLD_LIBRARY_PATH");

    let mut child = cmd.spawn()?;

    let writer = match (stdin, child.stdin.take()) {
        (Some(bytes), Some(mut pipe)) => Some(thread::spawn(move || {
            // A child that exits early closes the pipe; that surfaces
            // through its exit status instead.
            let _ = pipe.write_all(&bytes);
        })),
        _ => None,
    };

    let mut stdout_pipe = child.stdout.take();
    let stdout_reader = thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(pipe) = stdout_pipe.as_mut() {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    });

    let mut stderr_pipe = child.stderr.take();
    let stderr_reader = thread::spawn(move || {
        let mut buf = String::new();
        if let Some(pipe) = stderr_pipe.as_mut() {
            let _ = pipe.read_to_string(&mut buf);
        }
        buf
    });

    let started = Instant::now();
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if started.elapsed() >= timeout {
            let _ = child.kill();
            let _ = child.wait();
            return Err(CommonError::Timeout {
                program,
                millis: timeout.as_millis(),
            });
        }
        thread::sleep(POLL_INTERVAL);
    };

    if let Some(handle) = writer {
        let _ = handle.join();
    }
    let stdout = stdout_reader.join().unwrap_or_default();
    let stderr = stderr_reader.join().unwrap_or_default();

    if !status.success() {
        return Err(CommonError::ProcessFailed {
            program,
            status: status.to_string(),
            stderr,
        });
    }

    Ok(ProcessOutput { stdout, stderr })
}
