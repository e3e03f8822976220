// Tue Jan 13 2026 - Alex

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "binlayout")]
#[command(author = "Alex")]
#[command(version)]
#[command(about = "Compiles annotated binary layouts into Rust codecs", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true, help = "Log level (error, warn, info, debug, trace)")]
    pub log_level: Option<String>,

    #[arg(short, long, global = true, help = "Config file path")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Disable colored output")]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze a schema and write the generated codec source.
    Generate(GenerateArgs),
    /// Analyze a schema and report errors without generating code.
    Check(CheckArgs),
    /// Print the resolved regions of each layout.
    Analyze(AnalyzeArgs),
}

#[derive(Parser, Debug)]
pub struct GenerateArgs {
    #[arg(short, long, help = "Schema file (JSON)")]
    pub schema: PathBuf,

    #[arg(short, long, help = "Output source file")]
    pub output: Option<PathBuf>,

    #[arg(long, help = "Also write a JSON layout report")]
    pub report: Option<PathBuf>,

    #[arg(long, value_parser = ["little", "big"], help = "Endianness for layouts that do not declare one")]
    pub endian: Option<String>,

    #[arg(long, value_parser = ["copy", "zerocopy"], help = "Mode for layouts that do not declare one")]
    pub mode: Option<String>,

    #[arg(long, help = "Worker threads for analysis")]
    pub threads: Option<usize>,

    #[arg(long, help = "Stop at the first layout that fails analysis")]
    pub fail_fast: bool,
}

#[derive(Parser, Debug)]
pub struct CheckArgs {
    #[arg(short, long, help = "Schema file (JSON)")]
    pub schema: PathBuf,

    #[arg(long, help = "Stop at the first layout that fails analysis")]
    pub fail_fast: bool,
}

#[derive(Parser, Debug)]
pub struct AnalyzeArgs {
    #[arg(short, long, help = "Schema file (JSON)")]
    pub schema: PathBuf,

    #[arg(short = 't', long = "type", help = "Only show this layout")]
    pub type_name: Option<String>,

    #[arg(long, help = "Print the report as JSON")]
    pub json: bool,

    #[arg(long, help = "Print the report as Markdown")]
    pub markdown: bool,
}

impl GenerateArgs {
    pub fn validate(&self) -> Result<(), String> {
        if !self.schema.exists() {
            return Err(format!("Schema file does not exist: {}", self.schema.display()));
        }
        if self.threads == Some(0) {
            return Err("Thread count must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl AnalyzeArgs {
    pub fn validate(&self) -> Result<(), String> {
        if self.json && self.markdown {
            return Err("--json and --markdown cannot be combined".to_string());
        }
        Ok(())
    }
}
