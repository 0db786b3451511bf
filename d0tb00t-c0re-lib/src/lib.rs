//! # d0tb00t-c0re-lib
//!
//! Core of the d0tb00t bootstrapper: a declarative catalog of install
//! targets, and the machinery that walks it idempotently. Each target is
//! probed, installed only when missing, verified afterwards, and its failure
//! kept from affecting any other target.

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod prompt;

pub use config::Settings;
pub use error::InstallError;
pub use prompt::{InquirePrompt, Prompt, StdinPrompt};
