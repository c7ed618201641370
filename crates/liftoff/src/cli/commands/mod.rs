//! CLI commands

mod decode;
mod init;
mod plan;
mod run_args;
mod schedule;
mod validate;

pub use decode::DecodeCommand;
pub use init::InitCommand;
pub use plan::PlanCommand;
pub use run_args::RunArgs;
pub use schedule::ScheduleCommand;
pub use validate::ValidateCommand;
