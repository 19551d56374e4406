//! Entry points: the command line.

pub mod cli;

pub use cli::{Cli, Commands};
