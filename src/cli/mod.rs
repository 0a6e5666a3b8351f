pub(crate) mod args;
pub(crate) mod commands;

pub(crate) use args::Cli;
pub(crate) use commands::{CheckArgs, Commands, DiffArgs, HashArgs, PipelineArgs, SessionsArgs, VerifyArgs};
