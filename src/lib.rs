pub mod adapter;
pub mod aggregate;
pub mod artifact;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod exec;
pub mod policy;
pub mod reporter;
pub mod scope;
pub mod types;

#[cfg(test)]
pub mod test_utils;

pub use cli::Cli;
pub use config::Config;
pub use engine::{run, RunOptions};
pub use error::{GateError, Result};
pub use exec::{CheckOutcome, Scheduler, TimeoutPolicy};
pub use reporter::{json::JsonReporter, terminal::TerminalReporter, Reporter};
pub use scope::{ChangeScope, ScopeMode};
pub use types::{Finding, GateStatus, RunSummary, Severity, SkipReason, Tally, ToolStatus};
