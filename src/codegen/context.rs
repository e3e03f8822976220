// Tue Jan 13 2026 - Alex

use crate::analysis::{AnalyzedLayout, IndirectRef, Region};
use crate::codegen::types::{raw_ident, TypeMapper, ValueCodec};
use crate::codegen::CodegenError;
use crate::layout::{Direction, Field, TypeLayout, TypeRef};
use crate::utils::StringUtils;

/// Where a count field is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Receiver {
    /// `self.field` on an owned struct.
    Owned,
    /// `self.field()` on a zerocopy view; nested reads use `?`.
    View,
    /// A local of the same name, as bound by a decoder.
    Local,
}

/// Everything an emitter needs about one analysed layout.
pub struct LayoutContext<'a> {
    pub layout: &'a TypeLayout,
    pub analyzed: &'a AnalyzedLayout,
    pub types: &'a TypeMapper<'a>,
}

impl<'a> LayoutContext<'a> {
    pub fn new(layout: &'a TypeLayout, analyzed: &'a AnalyzedLayout, types: &'a TypeMapper<'a>) -> Self {
        Self { layout, analyzed, types }
    }

    pub fn name(&self) -> &str {
        self.layout.name()
    }

    pub fn size(&self) -> usize {
        self.analyzed.buffer_size()
    }

    pub fn codec(&self, field: &str) -> ValueCodec<'_> {
        ValueCodec::new(self.types, self.layout.annotation().endian, field)
    }

    pub fn ident(field: &Field) -> String {
        StringUtils::field_ident(field.name())
    }

    /// Identifier usable as a prefix or suffix of a longer name.
    pub fn stem(field: &Field) -> String {
        raw_ident(&Self::ident(field)).to_string()
    }

    /// Fields in declaration order paired with their regions; indirect fields have none.
    pub fn fields(&self) -> impl Iterator<Item = (usize, &'a Field, Option<&'a Region>)> + '_ {
        let analyzed = self.analyzed;
        self.layout
            .fields()
            .enumerate()
            .map(move |(index, field)| (index, field, analyzed.region_at(index)))
    }

    pub fn field_at(&self, index: usize) -> Result<&'a Field, CodegenError> {
        self.layout
            .field_at(index)
            .ok_or_else(|| CodegenError::InvalidLayout(format!("{} has no field #{}", self.name(), index)))
    }

    pub fn region_at(&self, index: usize) -> Result<&'a Region, CodegenError> {
        self.analyzed.region_at(index).ok_or_else(|| {
            CodegenError::InvalidLayout(format!("{} has no region for field #{}", self.name(), index))
        })
    }

    /// Resolved `[low, high)` of a region.
    pub fn span(&self, region: &Region) -> Result<(usize, usize), CodegenError> {
        match region.span() {
            Some((low, high)) if low <= high => Ok((low, high)),
            _ => Err(CodegenError::InvalidLayout(format!("{} has no resolved extent", region.name()))),
        }
    }

    pub fn start(&self, region: &Region) -> Result<usize, CodegenError> {
        region
            .start()
            .ok_or_else(|| CodegenError::InvalidLayout(format!("{} has no resolved start", region.name())))
    }

    pub fn element(&self, region: &Region) -> Result<TypeRef, CodegenError> {
        let elem = region
            .element_type()
            .ok_or_else(|| CodegenError::InvalidLayout(format!("{} is not a slice", region.name())))?;
        self.types.resolve(elem)
    }

    pub fn fixed_type(&self, field: &Field) -> Result<TypeRef, CodegenError> {
        self.types.resolve(field.ty())
    }

    pub fn grows_down(region: &Region) -> bool {
        region.direction() == Direction::EndStart
    }

    /// Regions backing an indirect slice are owned by that slice.
    pub fn is_data_region(&self, index: usize) -> bool {
        self.analyzed.is_indirect_region(index)
    }

    /// True when `index` is the metadata slice of some indirect field.
    pub fn is_metadata_region(&self, index: usize) -> bool {
        self.analyzed.indirect().iter().any(|i| i.from == index)
    }

    pub fn indirect(&self) -> &'a [IndirectRef] {
        self.analyzed.indirect()
    }

    /// Dynamic regions whose claimable spans intersect, in region order.
    pub fn shared_pairs(&self) -> Vec<(&'a Region, &'a Region)> {
        let dynamic: Vec<&Region> = self.analyzed.regions().iter().filter(|r| r.is_dynamic()).collect();
        let mut pairs = Vec::new();
        for (i, a) in dynamic.iter().enumerate() {
            for b in &dynamic[i + 1..] {
                if let (Some((al, ah)), Some((bl, bh))) = (a.span(), b.span()) {
                    if al < bh && bl < ah {
                        pairs.push((*a, *b));
                    }
                }
            }
        }
        pairs
    }

    /// Expression yielding the element count of `region` as `usize`.
    pub fn count_expr(&self, region: &Region, receiver: Receiver) -> Result<Option<String>, CodegenError> {
        let Some(count_field) = region.count_field() else {
            return Ok(None);
        };
        let unknown = || CodegenError::InvalidLayout(format!("{}: unknown count field {}", region.name(), count_field));

        let (head, member) = match count_field.split_once('.') {
            Some((parent, member)) => (parent, Some(member)),
            None => (count_field, None),
        };
        let head_field = self.layout.field(head).ok_or_else(unknown)?;
        let head_ident = Self::ident(head_field);

        let base = match receiver {
            Receiver::Owned => format!("self.{}", head_ident),
            Receiver::Local => head_ident,
            Receiver::View if member.is_some() => format!("self.{}()?", head_ident),
            Receiver::View => format!("self.{}()", head_ident),
        };

        let expr = match member {
            None => base,
            Some(member) => {
                let parent_ty = self.fixed_type(head_field)?;
                let parent = parent_ty.as_named().ok_or_else(unknown)?;
                format!("{}{}", base, self.types.member_access(parent, member))
            }
        };
        Ok(Some(format!("{} as usize", expr)))
    }

    /// Element type of the metadata slice behind an indirect field.
    pub fn metadata_struct(&self, indirect: &IndirectRef) -> Result<String, CodegenError> {
        let from = self.region_at(indirect.from)?;
        let elem = self.element(from)?;
        elem.as_named().map(str::to_string).ok_or_else(|| {
            CodegenError::InvalidLayout(format!("{} does not hold structs", from.name()))
        })
    }
}
