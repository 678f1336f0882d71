//! Scripts and the steps they are made of.
//!
//! A [`Script`] is an ordered list of [`Step`]s produced by
//! [`parse`](crate::script::parse). Steps run strictly in order.

use serde::Serialize;

mod parser;

pub use parser::{CONTINUATION_MARKER, EXPECTATION_DELIMITER, SAY_KEYWORD, SELECT_KEYWORD};
pub use parser::{parse, parse_file};

/// One unit of a script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Step {
    /// Launch a process.
    Invocation {
        /// Program to run.
        cmd: String,
        /// Arguments passed to the program.
        args: Vec<String>,
    },
    /// Text that must appear in the terminal output before continuing.
    Expectation {
        /// Expected text, lines joined with `\n`.
        content: String,
    },
    /// Choose a menu option.
    Select {
        /// Option sent followed by a line terminator.
        option: String,
    },
    /// Type free text.
    Say {
        /// Text sent followed by a line terminator.
        text: String,
    },
}

impl Step {
    /// Create an invocation step.
    pub fn invocation<I, S>(cmd: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Step::Invocation {
            cmd: cmd.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Create an expectation step.
    pub fn expectation(content: impl Into<String>) -> Self {
        Step::Expectation {
            content: content.into(),
        }
    }

    /// Create a select step.
    pub fn select(option: impl Into<String>) -> Self {
        Step::Select {
            option: option.into(),
        }
    }

    /// Create a say step.
    pub fn say(text: impl Into<String>) -> Self {
        Step::Say { text: text.into() }
    }

    /// Whether this step simulates user input.
    pub fn is_action(&self) -> bool {
        matches!(self, Step::Select { .. } | Step::Say { .. })
    }

    /// Short name of the step kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Step::Invocation { .. } => "invocation",
            Step::Expectation { .. } => "expectation",
            Step::Select { .. } => "select",
            Step::Say { .. } => "say",
        }
    }

    /// Human-readable description used in logs and errors.
    pub fn description(&self) -> String {
        match self {
            Step::Invocation { cmd, args } => {
                let line = std::iter::once(cmd.as_str())
                    .chain(args.iter().map(String::as_str))
                    .collect::<Vec<_>>()
                    .join(" ");
                format!("invoke {line:?}")
            }
            Step::Expectation { content } => format!("expect {content:?}"),
            Step::Select { option } => format!("select {option:?}"),
            Step::Say { text } => format!("say {text:?}"),
        }
    }
}

/// An ordered sequence of steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Script {
    steps: Vec<Step>,
}

impl Script {
    /// Create a script from steps in execution order.
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// The steps, in execution order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the script has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Serialize to compact JSON.
    pub fn to_json_compact(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl From<Vec<Step>> for Script {
    fn from(steps: Vec<Step>) -> Self {
        Self::new(steps)
    }
}

impl<'a> IntoIterator for &'a Script {
    type Item = &'a Step;
    type IntoIter = std::slice::Iter<'a, Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}
