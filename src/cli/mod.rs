// Tue Jan 13 2026 - Alex

pub mod args;
pub mod handler;

pub use args::{AnalyzeArgs, Args, CheckArgs, Command, GenerateArgs};
pub use handler::CommandHandler;

use clap::Parser;

pub fn parse_args() -> Args {
    Args::parse()
}
