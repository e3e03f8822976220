// Tue Jan 13 2026 - Alex

pub mod alignment;
pub mod annotation;
pub mod builder;
pub mod error;
pub mod field;
pub mod member;
pub mod registry;
pub mod type_layout;
pub mod type_ref;

pub use alignment::Alignment;
pub use annotation::{AnnotationDefaults, Endian, Mode, ModeKind, TypeAnnotation};
pub use builder::TypeLayoutBuilder;
pub use error::LayoutError;
pub use field::{Direction, Field, FieldLayout, Growth, IndirectSlice};
pub use member::Member;
pub use registry::{TypeRegistry, TypeSize};
pub use type_layout::TypeLayout;
pub use type_ref::{PrimitiveType, TypeRef};
