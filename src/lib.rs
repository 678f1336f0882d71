//! # hacceptance
//!
//! Scripted acceptance tests for interactive command-line programs.
//!
//! A small line-oriented script names a program to launch, blocks of text
//! that must appear on its terminal, and answers to type back. The script is
//! replayed against the real program running on a pseudo-terminal.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hacceptance::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let script = parse(
//!         "gh auth login\n\
//!          ---\n\
//!          ? Where do you use GitHub?\n\
//!          ---\n\
//!          select Other\n\
//!          ---\n\
//!          ? Hostname: |\n\
//!          ---\n\
//!          say my.ghes.com\n",
//!     );
//!
//!     let config = HarnessConfig::builder()
//!         .timeout(5.seconds())
//!         .no_recorder()
//!         .build();
//!
//!     Driver::new(config).execute(&script).await
//! }
//! ```
//!
//! ## Script format
//!
//! | Line | Meaning |
//! |------|---------|
//! | `cmd arg...` | Launch `cmd` with the space-separated arguments |
//! | `---` | Open or close an expectation block |
//! | `text \|` | Inside a block: join this line to the next without a newline |
//! | `select option` | Send `option` and a newline |
//! | `say text` | Send `text` and a newline |
//!
//! Blank lines are ignored. Expectations match against the terminal output
//! with ANSI escape sequences removed and CRLF folded to LF.
//!
//! ## Modules
//!
//! - [`script`]: Script types and the parser
//! - [`driver`]: Step execution
//! - [`session`]: Process, pty and teardown
//! - [`console`]: Output buffer, emulated screen and input
//! - [`matcher`]: ANSI-aware matching
//! - [`recorder`]: Session recording
//! - [`reporter`]: Failure sinks
//! - [`config`]: Configuration
//! - [`error`]: Error types
//! - [`prelude`]: Convenient re-exports

pub mod config;
pub mod console;
pub mod driver;
pub mod error;
pub mod matcher;
pub mod recorder;
pub mod reporter;
pub mod script;
pub mod session;
pub mod wait;

pub mod prelude;

// Re-export main types at crate root
pub use config::HarnessConfig;
pub use driver::{Driver, execute};
pub use error::{HarnessError, Result};
pub use script::{Script, Step, parse, parse_file};
