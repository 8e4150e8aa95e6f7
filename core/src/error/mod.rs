#[allow(clippy::module_inception)]
pub mod error;
pub mod schedule;

pub use error::{CliError, RunError};
pub use schedule::ScheduleError;
