// Tue Jan 13 2026 - Alex

use crate::layout::{LayoutError, Member, TypeRef};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeSize {
    Fixed(usize),
    Dynamic,
}

impl TypeSize {
    pub fn fixed(self) -> Option<usize> {
        match self {
            Self::Fixed(size) => Some(size),
            Self::Dynamic => None,
        }
    }

    pub fn is_dynamic(self) -> bool {
        matches!(self, Self::Dynamic)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: HashMap<String, usize>,
    aliases: HashMap<String, TypeRef>,
    alias_order: Vec<String>,
    members: HashMap<String, Vec<Member>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, size: usize) {
        let name = name.into();
        log::debug!("Registered type {} ({} bytes)", name, size);
        self.types.insert(name, size);
    }

    pub fn register_alias(&mut self, alias: impl Into<String>, target: TypeRef) {
        let alias = alias.into();
        log::debug!("Registered alias {} -> {}", alias, target);
        if self.aliases.insert(alias.clone(), target).is_none() {
            self.alias_order.push(alias);
        }
    }

    pub fn register_members(&mut self, name: impl Into<String>, members: Vec<Member>) {
        self.members.insert(name.into(), members);
    }

    pub fn lookup(&self, name: &str) -> Option<usize> {
        self.types.get(name).copied()
    }

    pub fn is_alias(&self, name: &str) -> bool {
        self.aliases.contains_key(name)
    }

    /// Aliases in registration order.
    pub fn aliases(&self) -> impl Iterator<Item = (&str, &TypeRef)> + '_ {
        self.alias_order
            .iter()
            .filter_map(move |name| self.aliases.get(name).map(|target| (name.as_str(), target)))
    }

    pub fn members(&self, name: &str) -> Option<&[Member]> {
        self.members.get(name).map(Vec::as_slice)
    }

    pub fn member(&self, parent: &str, child: &str) -> Option<&Member> {
        self.members(parent)?.iter().find(|m| m.name() == child)
    }

    /// Follows alias chains until a non-alias type is reached.
    pub fn resolve(&self, ty: &TypeRef) -> Result<TypeRef, LayoutError> {
        let mut current = ty.clone();
        let mut visited: Vec<String> = Vec::new();
        let mut seen = HashSet::new();

        while let TypeRef::Named(name) = &current {
            let Some(target) = self.aliases.get(name) else {
                break;
            };
            visited.push(name.clone());
            if !seen.insert(name.clone()) {
                return Err(LayoutError::CyclicAlias(visited));
            }
            current = target.clone();
        }

        Ok(current)
    }

    /// Resolves aliases at every level of nesting, so `[]Blob` with
    /// `Blob = []byte` becomes `[][]byte`.
    pub fn resolve_deep(&self, ty: &TypeRef) -> Result<TypeRef, LayoutError> {
        self.resolve_deep_inner(ty, &mut Vec::new())
    }

    fn resolve_deep_inner(&self, ty: &TypeRef, expanding: &mut Vec<String>) -> Result<TypeRef, LayoutError> {
        match ty {
            TypeRef::Named(name) if self.aliases.contains_key(name) => {
                let target = self.enter_alias(name, expanding)?;
                let resolved = self.resolve_deep_inner(&target, expanding);
                expanding.pop();
                resolved
            }
            TypeRef::Array(len, elem) => Ok(TypeRef::array_of(*len, self.resolve_deep_inner(elem, expanding)?)),
            TypeRef::Slice(elem) => Ok(TypeRef::slice_of(self.resolve_deep_inner(elem, expanding)?)),
            TypeRef::Pointer(elem) => Ok(TypeRef::Pointer(Box::new(self.resolve_deep_inner(elem, expanding)?))),
            other => Ok(other.clone()),
        }
    }

    pub fn size_of(&self, ty: &TypeRef) -> Result<TypeSize, LayoutError> {
        self.size_of_inner(ty, &mut Vec::new())
    }

    /// `expanding` holds the aliases currently being expanded; meeting one
    /// again means the alias contains itself.
    fn size_of_inner(&self, ty: &TypeRef, expanding: &mut Vec<String>) -> Result<TypeSize, LayoutError> {
        match ty {
            TypeRef::Primitive(p) => Ok(TypeSize::Fixed(p.size())),
            TypeRef::Slice(_) => Ok(TypeSize::Dynamic),
            TypeRef::Pointer(_) => Err(LayoutError::UnsupportedType(ty.to_string())),
            TypeRef::Array(len, elem) => match self.size_of_inner(elem, expanding)? {
                TypeSize::Fixed(size) => size
                    .checked_mul(*len)
                    .map(TypeSize::Fixed)
                    .ok_or_else(|| LayoutError::InvalidTypeNotation(ty.to_string())),
                TypeSize::Dynamic => Err(LayoutError::ArrayOfDynamicType(ty.to_string())),
            },
            TypeRef::Named(name) if self.aliases.contains_key(name) => {
                let target = self.enter_alias(name, expanding)?;
                let size = self.size_of_inner(&target, expanding);
                expanding.pop();
                size
            }
            TypeRef::Named(name) => self
                .lookup(name)
                .map(TypeSize::Fixed)
                .ok_or_else(|| LayoutError::UnknownType(name.clone())),
        }
    }

    fn enter_alias(&self, name: &str, expanding: &mut Vec<String>) -> Result<TypeRef, LayoutError> {
        let target = self
            .aliases
            .get(name)
            .cloned()
            .ok_or_else(|| LayoutError::UnknownType(name.to_string()))?;
        let cyclic = expanding.iter().any(|n| n == name);
        expanding.push(name.to_string());
        if cyclic {
            return Err(LayoutError::CyclicAlias(expanding.clone()));
        }
        Ok(target)
    }

    pub fn size_of_name(&self, notation: &str) -> Result<TypeSize, LayoutError> {
        self.size_of(&TypeRef::parse(notation)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::PrimitiveType;

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry.register_alias("PageID", TypeRef::named("TxID"));
        registry.register_alias("TxID", TypeRef::Primitive(PrimitiveType::U64));
        registry.register("LeafHeader", 16);
        registry
    }

    #[test]
    fn test_primitive_sizes() {
        let registry = TypeRegistry::new();
        assert_eq!(registry.size_of_name("uint8").unwrap(), TypeSize::Fixed(1));
        assert_eq!(registry.size_of_name("int16").unwrap(), TypeSize::Fixed(2));
        assert_eq!(registry.size_of_name("float32").unwrap(), TypeSize::Fixed(4));
        assert_eq!(registry.size_of_name("int64").unwrap(), TypeSize::Fixed(8));
    }

    #[test]
    fn test_alias_chain() {
        let registry = registry();
        assert_eq!(registry.size_of_name("PageID").unwrap(), TypeSize::Fixed(8));
        assert_eq!(
            registry.resolve(&TypeRef::named("PageID")).unwrap(),
            TypeRef::Primitive(PrimitiveType::U64)
        );
        assert!(registry.is_alias("PageID"));
        assert!(!registry.is_alias("uint64"));
    }

    #[test]
    fn test_slices_are_dynamic() {
        let registry = TypeRegistry::new();
        assert!(registry.size_of_name("[]byte").unwrap().is_dynamic());
        assert!(registry.size_of_name("[]Unknown").unwrap().is_dynamic());
    }

    #[test]
    fn test_arrays() {
        let registry = registry();
        assert_eq!(registry.size_of_name("[16]byte").unwrap(), TypeSize::Fixed(16));
        assert_eq!(registry.size_of_name("[4]LeafHeader").unwrap(), TypeSize::Fixed(64));
        assert_eq!(registry.size_of_name("[2][3]uint32").unwrap(), TypeSize::Fixed(24));
        assert!(matches!(
            registry.size_of_name("[4][]byte"),
            Err(LayoutError::ArrayOfDynamicType(_))
        ));
        assert!(matches!(
            registry.size_of_name("[4]Missing"),
            Err(LayoutError::UnknownType(_))
        ));
    }

    #[test]
    fn test_pointers_rejected() {
        let registry = TypeRegistry::new();
        assert!(matches!(
            registry.size_of_name("*uint32"),
            Err(LayoutError::UnsupportedType(_))
        ));
        assert!(matches!(
            registry.size_of_name("[2]*uint32"),
            Err(LayoutError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_unknown_type() {
        let registry = TypeRegistry::new();
        assert_eq!(
            registry.size_of_name("Nope"),
            Err(LayoutError::UnknownType("Nope".to_string()))
        );
    }

    #[test]
    fn test_cyclic_alias_terminates() {
        let mut registry = TypeRegistry::new();
        registry.register_alias("A", TypeRef::named("B"));
        registry.register_alias("B", TypeRef::named("A"));
        assert!(matches!(registry.size_of_name("A"), Err(LayoutError::CyclicAlias(_))));
    }

    #[test]
    fn test_alias_containing_itself_terminates() {
        let mut registry = TypeRegistry::new();
        registry.register_alias("A", TypeRef::parse("[2]A").unwrap());
        assert!(matches!(registry.size_of_name("A"), Err(LayoutError::CyclicAlias(_))));
        assert!(matches!(registry.size_of_name("[4]A"), Err(LayoutError::CyclicAlias(_))));

        registry.register_alias("List", TypeRef::parse("[]List").unwrap());
        assert!(registry.size_of_name("List").unwrap().is_dynamic());
        assert!(matches!(
            registry.resolve_deep(&TypeRef::named("List")),
            Err(LayoutError::CyclicAlias(_))
        ));
    }

    #[test]
    fn test_repeated_alias_is_not_a_cycle() {
        let mut registry = registry();
        registry.register_alias("Pair", TypeRef::parse("[2]PageID").unwrap());
        registry.register_alias("Grid", TypeRef::parse("[3]Pair").unwrap());
        assert_eq!(registry.size_of_name("Grid").unwrap(), TypeSize::Fixed(48));
        assert_eq!(
            registry.resolve_deep(&TypeRef::parse("[]Grid").unwrap()).unwrap(),
            TypeRef::parse("[][3][2]uint64").unwrap()
        );
    }

    #[test]
    fn test_alias_to_slice_is_dynamic() {
        let mut registry = TypeRegistry::new();
        registry.register_alias("Blob", TypeRef::parse("[]byte").unwrap());
        assert!(registry.size_of_name("Blob").unwrap().is_dynamic());
    }

    #[test]
    fn test_aliases_keep_registration_order() {
        let registry = registry();
        let names: Vec<&str> = registry.aliases().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["PageID", "TxID"]);
    }
}
