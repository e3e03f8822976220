// Tue Jan 13 2026 - Alex

pub mod document;
pub mod loader;

pub use document::{FieldDecl, LayoutDecl, SchemaDocument};
pub use loader::{DeclError, Schema, SchemaError};
