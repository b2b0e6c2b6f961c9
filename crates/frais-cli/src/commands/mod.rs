//! Command implementations
//!
//! Each CLI subcommand has a `cmd_*` entry point here. Session loading and
//! the company directory are shared by all commands via `core`.

mod companies;
mod core;
mod export;
mod totals;

pub use companies::cmd_companies;
pub use core::{load_directory, load_session};
pub use export::cmd_export;
pub use totals::cmd_totals;
