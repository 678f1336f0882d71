//! Convenient re-exports for common usage.
//!
//! ```rust
//! use hacceptance::prelude::*;
//! ```

pub use crate::config::{HarnessConfig, HarnessConfigBuilder, RecorderConfig};
pub use crate::driver::{Driver, execute};
pub use crate::error::{HarnessError, Result, TeardownError};
pub use crate::recorder::{FixedName, NameGenerator, RandomNames};
pub use crate::reporter::{PanicReporter, Reporter, TracingReporter};
pub use crate::script::{Script, Step, parse, parse_file};
pub use crate::wait::DurationExt;
