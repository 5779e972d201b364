use super::config::PackRequest;
use super::error::EngineError;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(20);
const FAILURE_MARKER: &str = "ERROR";

/// Raw result of a finished Packmol process.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedOutput {
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Builds the shell command line `<executable> < '<input>'`.
///
/// The input path is not escaped, so paths containing shell metacharacters (including
/// single quotes) are not supported.
pub fn shell_command_line(executable: &str, input_path: &Path) -> String {
    if cfg!(windows) {
        format!("{} < \"{}\"", executable, input_path.display())
    } else {
        format!("{} < '{}'", executable, input_path.display())
    }
}

fn shell_command(command_line: &str) -> Command {
    let mut command = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C");
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c");
        c
    };
    command
        .arg(command_line)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    command
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

type Drained = (Stream, io::Result<Vec<u8>>);

fn drain<R: Read + Send + 'static>(pipe: Option<R>, stream: Stream, tx: Sender<Drained>) {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        let result = match pipe {
            Some(mut pipe) => pipe.read_to_end(&mut buffer).map(|_| buffer),
            None => Ok(buffer),
        };
        // The receiver is gone once the deadline has passed.
        let _ = tx.send((stream, result));
    });
}

/// Waits for both pipes to reach end-of-file, returning `None` if the deadline passes first.
///
/// A background process started by the command inherits the pipes, so the pipes can
/// stay open after the command itself has exited.
fn collect_drained(
    rx: &Receiver<Drained>,
    deadline: Instant,
) -> io::Result<Option<(Vec<u8>, Vec<u8>)>> {
    let mut stdout = None;
    let mut stderr = None;
    while stdout.is_none() || stderr.is_none() {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let (stream, result) = match rx.recv_timeout(remaining) {
            Ok(drained) => drained,
            Err(RecvTimeoutError::Timeout) => return Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                return Err(io::Error::other("output reader thread panicked"));
            }
        };
        match stream {
            Stream::Stdout => stdout = Some(result?),
            Stream::Stderr => stderr = Some(result?),
        }
    }
    Ok(stdout.zip(stderr))
}

fn wait_until(child: &mut Child, deadline: Instant) -> io::Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
}

/// Runs a shell command line, capturing stdout and stderr, and kills it after `timeout`.
///
/// The timeout covers both the process itself and the collection of its output.
///
/// # Errors
///
/// Returns [`EngineError::ExternalToolTimeout`] if the process is still running, or its
/// output pipes are still open, when the timeout expires. Returns [`EngineError::Io`] if
/// the process cannot be spawned or read.
pub fn run_captured(command_line: &str, timeout: Duration) -> Result<CapturedOutput, EngineError> {
    debug!("Spawning shell command: {}", command_line);
    let deadline = Instant::now() + timeout;
    let mut child = shell_command(command_line).spawn()?;

    let (tx, rx) = mpsc::channel();
    drain(child.stdout.take(), Stream::Stdout, tx.clone());
    drain(child.stderr.take(), Stream::Stderr, tx);

    let Some(status) = wait_until(&mut child, deadline)? else {
        warn!(
            "Command did not finish within {:.1} s, terminating it.",
            timeout.as_secs_f64()
        );
        if let Err(e) = child.kill() {
            debug!("Failed to kill timed-out process: {}", e);
        }
        if let Err(e) = child.wait() {
            debug!("Failed to reap timed-out process: {}", e);
        }
        // The readers are left detached; a grandchild may still hold the pipes open.
        return Err(EngineError::ExternalToolTimeout { timeout });
    };

    let Some((stdout, stderr)) = collect_drained(&rx, deadline)? else {
        warn!(
            "Command exited with {:?} but its output was still open after {:.1} s.",
            status.code(),
            timeout.as_secs_f64()
        );
        return Err(EngineError::ExternalToolTimeout { timeout });
    };

    Ok(CapturedOutput {
        exit_code: status.code(),
        stdout,
        stderr,
    })
}

/// Decides whether a finished Packmol run succeeded and returns its decoded stdout.
///
/// Packmol can fail to find a solution while still exiting with status zero, reporting
/// the problem on stdout instead. A zero exit is therefore only a success if stdout does
/// not contain the `ERROR` marker.
///
/// # Errors
///
/// Returns [`EngineError::ExternalToolFailure`] carrying the captured stderr for a
/// non-zero exit, or the stdout text following the first `ERROR` for an in-band failure.
pub fn check_output(output: &CapturedOutput) -> Result<String, EngineError> {
    if output.exit_code != Some(0) {
        return Err(EngineError::ExternalToolFailure {
            exit_code: output.exit_code,
            diagnostic: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    if let Some((_, trailing)) = stdout.split_once(FAILURE_MARKER) {
        return Err(EngineError::ExternalToolFailure {
            exit_code: Some(0),
            diagnostic: trailing.to_string(),
        });
    }
    Ok(stdout)
}

/// Runs Packmol on the request's input file and writes its stdout to the screen log.
///
/// Blocks until Packmol exits or `timeout` expires. On success the decoded stdout
/// replaces the contents of the request's screen file. Nothing is retried, and the
/// existence of the output structure file is not checked here.
///
/// # Errors
///
/// See [`run_captured`] and [`check_output`]. The screen file is only written after a
/// successful run.
pub fn run_packer(request: &PackRequest, timeout: Duration) -> Result<(), EngineError> {
    let command_line = shell_command_line(request.executable(), request.input_path());
    info!("Running Packmol: {}", command_line);

    let started = Instant::now();
    let output = run_captured(&command_line, timeout)?;
    debug!(
        "Packmol exited with {:?} after {:.2} s ({} bytes stdout, {} bytes stderr).",
        output.exit_code,
        started.elapsed().as_secs_f64(),
        output.stdout.len(),
        output.stderr.len()
    );

    let stdout = check_output(&output)?;
    fs::write(request.screen_path(), stdout)?;
    info!("Packmol finished; screen output saved to {:?}", request.screen_path());
    Ok(())
}
