//! Executes scripts step by step against a live session.

use std::sync::Arc;

use crate::config::HarnessConfig;
use crate::error::{HarnessError, Result};
use crate::recorder::{NameGenerator, RandomNames};
use crate::reporter::{Reporter, TracingReporter};
use crate::script::{Script, Step};
use crate::session::{Session, Termination};
use crate::wait::as_millis;

/// Runs a [`Script`], failing fast on the first unmet step.
pub struct Driver {
    config: HarnessConfig,
    reporter: Arc<dyn Reporter>,
    names: Arc<dyn NameGenerator>,
}

impl Driver {
    /// Create a driver that reports through `tracing` and uses random
    /// recording names.
    pub fn new(config: HarnessConfig) -> Self {
        Self {
            config,
            reporter: Arc::new(TracingReporter),
            names: Arc::new(RandomNames::default()),
        }
    }

    /// Report through `reporter` instead.
    pub fn reporter(mut self, reporter: impl Reporter + 'static) -> Self {
        self.reporter = Arc::new(reporter);
        self
    }

    /// Name recordings with `names` instead.
    pub fn name_generator(mut self, names: impl NameGenerator + 'static) -> Self {
        self.names = Arc::new(names);
        self
    }

    /// Get the driver configuration.
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Execute every step in order.
    ///
    /// The session is torn down whether or not a step failed. The first
    /// failure is handed to the reporter and returned.
    pub async fn execute(&self, script: &Script) -> Result<()> {
        tracing::debug!(
            steps = script.len(),
            timeout_ms = as_millis(self.config.timeout()),
            "executing script"
        );

        let mut session = None;
        let mut outcome = Ok(());

        for (index, step) in script.steps().iter().enumerate() {
            tracing::debug!(step = index + 1, kind = step.kind(), "{}", step.description());
            if let Err(error) = self.run_step(&mut session, step).await {
                outcome = Err(error);
                break;
            }
        }

        if let Some(session) = session {
            if matches!(
                outcome,
                Err(HarnessError::MatchTimeout { .. } | HarnessError::StreamClosed { .. })
            ) {
                let console = session.console();
                let cursor = console.cursor().await;
                let screen = console.screen_text().await;
                self.reporter.log(&format!(
                    "Screen at failure (cursor {},{}):\n{screen}",
                    cursor.row + 1,
                    cursor.col + 1
                ));
            }
            self.teardown(session).await;
        }

        if let Err(error) = &outcome {
            self.reporter.fail(error);
        }
        outcome
    }

    async fn run_step(&self, session: &mut Option<Session>, step: &Step) -> Result<()> {
        match step {
            Step::Invocation { cmd, args } => {
                if session.is_some() {
                    return Err(HarnessError::SessionAlreadyOpen { cmd: cmd.clone() });
                }
                *session = Some(Session::spawn(
                    cmd,
                    args,
                    &self.config,
                    self.names.as_ref(),
                )?);
            }
            Step::Expectation { content } => {
                active(session, step)?.console_mut().expect(content).await?;
            }
            Step::Select { option } => {
                active(session, step)?.console().send_line(option).await?;
            }
            Step::Say { text } => {
                active(session, step)?.console().send_line(text).await?;
            }
        }
        Ok(())
    }

    async fn teardown(&self, session: Session) {
        let report = session.teardown(self.config.grace_period()).await;

        match report.termination {
            Some(Termination::AlreadyExited { code }) => {
                tracing::debug!(code, "process had already exited");
            }
            Some(Termination::Exited { code }) => {
                tracing::debug!(code, "process exited after terminate");
            }
            Some(Termination::Killed) => {
                tracing::debug!("process force-killed");
            }
            None => {}
        }

        if let Some(error) = report.error {
            tracing::warn!(%error, "session teardown failed");
            self.reporter.log(&format!("Teardown: {error}"));
        }

        if let Some(recording) = report.recording {
            self.reporter.log(&recording.play_hint());
        }
    }
}

fn active<'a>(session: &'a mut Option<Session>, step: &Step) -> Result<&'a mut Session> {
    session.as_mut().ok_or_else(|| HarnessError::NoSession {
        step: step.description(),
    })
}

/// Execute a script with the given configuration.
pub async fn execute(script: &Script, config: HarnessConfig) -> Result<()> {
    Driver::new(config).execute(script).await
}
