// Tue Jan 13 2026 - Alex

use crate::layout::TypeRef;

/// A fixed-offset field of a registered composite, recorded so that nested
/// references like `Header.NumKeys` can be checked and typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    name: String,
    ty: TypeRef,
    offset: usize,
}

impl Member {
    pub fn new(name: impl Into<String>, ty: TypeRef, offset: usize) -> Self {
        Self {
            name: name.into(),
            ty,
            offset,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    pub fn offset(&self) -> usize {
        self.offset
    }
}
