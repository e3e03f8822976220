// Tue Jan 13 2026 - Alex

pub mod analysis;
pub mod cli;
pub mod codegen;
pub mod config;
pub mod layout;
pub mod output;
pub mod pipeline;
pub mod schema;
pub mod utils;

pub use analysis::{analyze, AnalyzedLayout, LayoutRejected};
pub use codegen::{CodegenError, Generator};
pub use config::Config;
pub use layout::{TypeLayout, TypeLayoutBuilder, TypeRegistry};
pub use pipeline::{Pipeline, PipelineError, RunOutput};
pub use schema::Schema;
