// Tue Jan 13 2026 - Alex

pub mod context;
pub mod copy;
pub mod generator;
pub mod template;
pub mod types;
pub mod writer;
pub mod zerocopy;

pub use context::{LayoutContext, Receiver};
pub use copy::CopyEmitter;
pub use generator::Generator;
pub use template::{TemplateEngine, TemplateError};
pub use types::{At, Place, TypeMapper, ValueCodec};
pub use writer::CodeWriter;
pub use zerocopy::ZeroCopyEmitter;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodegenError {
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),
    #[error("Invalid layout: {0}")]
    InvalidLayout(String),
    #[error("Unsupported type {ty}: {reason}")]
    Unsupported { ty: String, reason: &'static str },
}
