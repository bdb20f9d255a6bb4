//! CLI argument parsing and command handling.

mod args;
mod validators;

pub use args::{AnnotateArgs, Cli, Command, ConfigAction};
