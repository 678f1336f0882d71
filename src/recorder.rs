//! Session recording.
//!
//! When recording is enabled the target is launched through the recorder
//! (`asciinema rec -c "<cmd> <args>" -q <path>`), so the recorder shares the
//! session's pty and the target runs as its child.

use std::fmt;
use std::path::{Path, PathBuf};

use rand::Rng;

use crate::config::RecorderConfig;
use crate::error::{HarnessError, Result};

const NAME_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Default length of generated recording names.
pub const DEFAULT_NAME_LENGTH: usize = 5;

/// Produces names for recordings.
pub trait NameGenerator: Send + Sync {
    /// Return the next recording name.
    fn next_name(&self) -> String;
}

/// Random ASCII-letter names.
#[derive(Debug, Clone)]
pub struct RandomNames {
    length: usize,
}

impl RandomNames {
    /// Names of the given length.
    pub fn new(length: usize) -> Self {
        Self { length }
    }
}

impl Default for RandomNames {
    fn default() -> Self {
        Self::new(DEFAULT_NAME_LENGTH)
    }
}

impl NameGenerator for RandomNames {
    fn next_name(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..self.length)
            .map(|_| NAME_CHARSET[rng.gen_range(0..NAME_CHARSET.len())] as char)
            .collect()
    }
}

/// Always returns the same name.
#[derive(Debug, Clone)]
pub struct FixedName(pub String);

impl NameGenerator for FixedName {
    fn next_name(&self) -> String {
        self.0.clone()
    }
}

/// A recording produced by a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recording {
    program: PathBuf,
    path: PathBuf,
}

impl Recording {
    /// Where the recording is written.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Command that replays the recording.
    pub fn play_hint(&self) -> String {
        format!(
            "Check out the recording by running `{} play {}`",
            self.program.display(),
            self.path.display()
        )
    }
}

impl fmt::Display for Recording {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// A located recorder ready to wrap invocations.
#[derive(Debug, Clone)]
pub struct Recorder {
    program: PathBuf,
    dir: PathBuf,
}

impl Recorder {
    /// Locate the configured recorder on `PATH`.
    pub fn locate(config: &RecorderConfig) -> Result<Self> {
        let program =
            which::which(&config.program).map_err(|source| HarnessError::RecorderNotFound {
                program: config.program.clone(),
                source,
            })?;
        Ok(Self {
            program,
            dir: config.base_dir(),
        })
    }

    /// Path of the recorder binary.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Build the recorder command line for an invocation.
    ///
    /// Returns the argv to spawn and the recording it will produce.
    pub fn wrap(
        &self,
        cmd: &str,
        args: &[String],
        names: &dyn NameGenerator,
    ) -> (Vec<String>, Recording) {
        let path = self.dir.join(names.next_name());
        let mut command_line = cmd.to_string();
        for arg in args {
            command_line.push(' ');
            command_line.push_str(arg);
        }

        let argv = vec![
            self.program.display().to_string(),
            "rec".to_string(),
            "-c".to_string(),
            command_line,
            "-q".to_string(),
            path.display().to_string(),
        ];
        let recording = Recording {
            program: self.program.clone(),
            path,
        };
        (argv, recording)
    }
}
