//! Entry points for the d0tb00t bootstrapper binaries.

pub mod commands;
pub mod logging;

pub use commands::env::{EnvArgs, run_env};
pub use commands::fonts::{FontsArgs, run_fonts};
