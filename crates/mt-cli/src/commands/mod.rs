//! CLI subcommand implementations.

pub mod archive;
pub mod create;
pub mod edit;
pub mod list;
pub mod report;
pub mod session;
pub mod timer;
pub mod util;
