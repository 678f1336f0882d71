//! A live session: the target process, its pty and the console on top.

use std::time::Duration;

use portable_pty::{Child, CommandBuilder, PtySize, native_pty_system};
use tokio::time::Instant;

use crate::config::HarnessConfig;
use crate::console::Console;
use crate::error::{HarnessError, Result, TeardownError};
use crate::recorder::{NameGenerator, Recorder, Recording};

/// Environment override that keeps output free of color codes.
pub const NO_COLOR_ENV: (&str, &str) = ("CLICOLOR", "0");

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How the process ended during teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The process had already exited before teardown began.
    AlreadyExited {
        /// Exit code.
        code: u32,
    },
    /// The process exited within the grace period after SIGTERM.
    Exited {
        /// Exit code.
        code: u32,
    },
    /// The process had to be force-killed.
    Killed,
}

/// Result of tearing a session down.
#[derive(Debug)]
pub struct TeardownReport {
    /// How the process ended, if we could tell.
    pub termination: Option<Termination>,
    /// Problem encountered while terminating.
    pub error: Option<TeardownError>,
    /// Recording written for the session, if any.
    pub recording: Option<Recording>,
}

type ChildProcess = Box<dyn Child + Send + Sync>;

/// Kills the child if it is dropped before teardown.
struct ChildGuard(Option<ChildProcess>);

impl ChildGuard {
    fn take(&mut self) -> Option<ChildProcess> {
        self.0.take()
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if let Some(child) = self.0.as_mut() {
            tracing::debug!("session dropped without teardown, killing process");
            let _ = child.kill();
        }
    }
}

/// Process + pty + emulated terminal backing one script run.
pub struct Session {
    child: ChildGuard,
    console: Console,
    recording: Option<Recording>,
}

impl Session {
    /// Start `cmd` on a fresh pty.
    ///
    /// With recording enabled the recorder is located first and launched in
    /// place of the target, wrapping it.
    pub fn spawn(
        cmd: &str,
        args: &[String],
        config: &HarnessConfig,
        names: &dyn NameGenerator,
    ) -> Result<Self> {
        let recorder = if config.recorder.enabled {
            Some(Recorder::locate(&config.recorder)?)
        } else {
            None
        };

        let pair = native_pty_system()
            .openpty(PtySize {
                rows: config.rows,
                cols: config.cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| HarnessError::Setup(format!("failed to open pty: {e}")))?;

        let console = Console::open(pair.master, config)?;

        let (argv, recording) = match &recorder {
            Some(recorder) => {
                let (argv, recording) = recorder.wrap(cmd, args, names);
                (argv, Some(recording))
            }
            None => {
                let argv = std::iter::once(cmd.to_string())
                    .chain(args.iter().cloned())
                    .collect::<Vec<_>>();
                (argv, None)
            }
        };

        let mut builder = CommandBuilder::new(&argv[0]);
        builder.args(&argv[1..]);
        for (key, value) in &config.env {
            builder.env(key, value);
        }
        builder.env(NO_COLOR_ENV.0, NO_COLOR_ENV.1);
        if let Some(ref cwd) = config.cwd {
            builder.cwd(cwd);
        }

        // The slave becomes the controlling terminal of a new session.
        let child = pair
            .slave
            .spawn_command(builder)
            .map_err(|e| HarnessError::Setup(format!("failed to spawn {cmd:?}: {e}")))?;
        drop(pair.slave);

        tracing::info!(
            cmd,
            ?args,
            pid = child.process_id(),
            recorder = ?recorder.as_ref().map(Recorder::program),
            recording = ?recording.as_ref().map(Recording::path),
            "session started"
        );

        Ok(Self {
            child: ChildGuard(Some(child)),
            console,
            recording,
        })
    }

    /// The session console.
    pub fn console(&self) -> &Console {
        &self.console
    }

    /// The session console, mutably.
    pub fn console_mut(&mut self) -> &mut Console {
        &mut self.console
    }

    /// Recording for this session, if recording is enabled.
    pub fn recording(&self) -> Option<&Recording> {
        self.recording.as_ref()
    }

    /// Process id of the spawned process.
    pub fn process_id(&self) -> Option<u32> {
        self.child.0.as_ref().and_then(|child| child.process_id())
    }

    /// Ask the process to terminate, wait up to `grace`, then force-kill.
    ///
    /// The console is closed on every path. Problems are reported in the
    /// returned report rather than as an error.
    pub async fn teardown(self, grace: Duration) -> TeardownReport {
        let Session {
            mut child,
            console,
            recording,
        } = self;

        let outcome = match child.take() {
            Some(process) => terminate(process, grace).await.map(Some),
            None => Ok(None),
        };
        console.close();

        let (termination, error) = match outcome {
            Ok(termination) => (termination, None),
            Err(error) => (None, Some(error)),
        };
        TeardownReport {
            termination,
            error,
            recording,
        }
    }
}

async fn terminate(
    mut child: ChildProcess,
    grace: Duration,
) -> std::result::Result<Termination, TeardownError> {
    if let Some(status) = child.try_wait().map_err(TeardownError::Wait)? {
        return Ok(Termination::AlreadyExited {
            code: status.exit_code(),
        });
    }

    if let Some(pid) = child.process_id() {
        request_exit(pid)?;

        let deadline = Instant::now() + grace;
        while Instant::now() < deadline {
            if let Some(status) = child.try_wait().map_err(TeardownError::Wait)? {
                return Ok(Termination::Exited {
                    code: status.exit_code(),
                });
            }
            tokio::time::sleep(EXIT_POLL_INTERVAL).await;
        }
    }

    // Killing and reaping block the calling thread.
    tokio::task::spawn_blocking(move || force_kill(child))
        .await
        .map_err(|e| TeardownError::Wait(std::io::Error::other(e)))?
}

fn force_kill(mut child: ChildProcess) -> std::result::Result<Termination, TeardownError> {
    if let Err(e) = child.kill() {
        // Lost the race with a normal exit.
        if let Some(status) = child.try_wait().map_err(TeardownError::Wait)? {
            return Ok(Termination::Exited {
                code: status.exit_code(),
            });
        }
        return Err(TeardownError::Kill(e));
    }
    if child.try_wait().map_err(TeardownError::Wait)?.is_none() {
        child.wait().map_err(TeardownError::Wait)?;
    }
    Ok(Termination::Killed)
}

#[cfg(unix)]
fn request_exit(pid: u32) -> std::result::Result<(), TeardownError> {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let raw = i32::try_from(pid).map_err(|e| TeardownError::Signal {
        pid,
        message: e.to_string(),
    })?;
    match kill(Pid::from_raw(raw), Signal::SIGTERM) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(errno) => Err(TeardownError::Signal {
            pid,
            message: errno.to_string(),
        }),
    }
}

#[cfg(not(unix))]
fn request_exit(_pid: u32) -> std::result::Result<(), TeardownError> {
    Ok(())
}
