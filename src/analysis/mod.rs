// Tue Jan 13 2026 - Alex

pub mod builder;
pub mod collision;
pub mod indirect;
pub mod region;
pub mod resolver;
pub mod validator;

pub use builder::build_region;
pub use collision::detect_collisions;
pub use indirect::{resolve_indirect_slices, IndirectRef};
pub use region::{Region, RegionKind};
pub use resolver::calculate_boundaries;
pub use validator::validate_count_fields;

use crate::layout::{LayoutError, TypeLayout, TypeRegistry};
use crate::utils::logging::ScopedTimer;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct AnalyzedLayout {
    type_name: String,
    buffer_size: usize,
    regions: Vec<Region>,
    indirect: Vec<IndirectRef>,
    errors: Vec<LayoutError>,
}

#[derive(Error, Debug)]
#[error("Layout {} rejected with {} error(s)", .layout.type_name(), .layout.errors().len())]
pub struct LayoutRejected {
    pub layout: AnalyzedLayout,
}

impl AnalyzedLayout {
    fn new(type_name: &str, buffer_size: usize) -> Self {
        Self {
            type_name: type_name.to_string(),
            buffer_size,
            regions: Vec::new(),
            indirect: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Regions sorted by position.
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn indirect(&self) -> &[IndirectRef] {
        &self.indirect
    }

    pub fn errors(&self) -> &[LayoutError] {
        &self.errors
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn region(&self, field_name: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.name() == field_name)
    }

    pub fn region_at(&self, field_index: usize) -> Option<&Region> {
        self.regions.iter().find(|r| r.field_index() == field_index)
    }

    /// True when `field_index` is the backing region of some indirect slice.
    pub fn is_indirect_region(&self, field_index: usize) -> bool {
        self.indirect.iter().any(|i| i.region == field_index)
    }

    pub fn into_result(self) -> Result<AnalyzedLayout, LayoutRejected> {
        if self.is_valid() {
            Ok(self)
        } else {
            Err(LayoutRejected { layout: self })
        }
    }
}

/// Runs every analysis stage over one layout. Region construction failures
/// stop the run; after that all stages run and all errors are kept.
pub fn analyze(layout: &TypeLayout, registry: &TypeRegistry) -> AnalyzedLayout {
    let _timer = ScopedTimer::new(format!("analyze {}", layout.name()));

    let buffer_size = match layout.buffer_size() {
        0 => match layout.infer_size(registry) {
            Ok(size) => size,
            Err(e) => {
                let mut analyzed = AnalyzedLayout::new(layout.name(), 0);
                analyzed.errors.push(e);
                return analyzed;
            }
        },
        size => size,
    };

    let mut analyzed = AnalyzedLayout::new(layout.name(), buffer_size);

    for (index, field) in layout.fields().enumerate() {
        match build_region(field, index, buffer_size, registry) {
            Ok(Some(region)) => analyzed.regions.push(region),
            Ok(None) => {}
            Err(e) => analyzed.errors.push(e),
        }
    }

    if !analyzed.errors.is_empty() {
        log::debug!("{}: {} field(s) failed to build", layout.name(), analyzed.errors.len());
        return analyzed;
    }

    calculate_boundaries(&mut analyzed.regions, buffer_size);

    let count_errors = validate_count_fields(&analyzed.regions, layout, registry, buffer_size);
    analyzed.errors.extend(count_errors);

    let (indirect, indirect_errors) = resolve_indirect_slices(&analyzed.regions, layout, registry);
    analyzed.indirect = indirect;
    analyzed.errors.extend(indirect_errors);

    let collisions = detect_collisions(&analyzed.regions, buffer_size);
    analyzed.errors.extend(collisions);

    if analyzed.is_valid() {
        log::debug!("{}: {} region(s), {} bytes", layout.name(), analyzed.regions.len(), buffer_size);
    } else {
        log::debug!("{}: {} error(s)", layout.name(), analyzed.errors.len());
    }

    analyzed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{Member, TypeLayoutBuilder, TypeRef};

    #[test]
    fn test_page_layout() {
        let layout = TypeLayoutBuilder::new("Page")
            .size(4096)
            .field("Header", "uint16", "@0")
            .field("Body", "[]byte", "start-end")
            .field("Footer", "uint64", "@4088")
            .build()
            .unwrap();
        let analyzed = analyze(&layout, &TypeRegistry::new()).into_result().unwrap();
        let body = analyzed.region("Body").unwrap();
        assert_eq!(body.span(), Some((2, 4088)));
        assert_eq!(analyzed.buffer_size(), 4096);
    }

    #[test]
    fn test_leaf_node_with_nested_count() {
        let mut registry = TypeRegistry::new();
        registry.register("LeafHeader", 16);
        registry.register_members("LeafHeader", vec![Member::new("NumKeys", TypeRef::parse("uint16").unwrap(), 0)]);
        registry.register("LeafElement", 8);

        let layout = TypeLayoutBuilder::new("LeafNode")
            .size(4096)
            .field("Header", "LeafHeader", "@0")
            .field("Elements", "[]LeafElement", "start-end,count=Header.NumKeys")
            .field("Footer", "uint64", "@4088")
            .build()
            .unwrap();
        let analyzed = analyze(&layout, &registry);
        assert!(analyzed.is_valid(), "{:?}", analyzed.errors());
        assert_eq!(analyzed.region("Elements").unwrap().span(), Some((16, 4088)));
    }

    #[test]
    fn test_build_errors_stop_early() {
        let layout = TypeLayoutBuilder::new("Bad")
            .size(64)
            .field("A", "Missing", "@0")
            .field("B", "*uint8", "@8")
            .field("C", "uint8", "@0")
            .build()
            .unwrap();
        let analyzed = analyze(&layout, &TypeRegistry::new());
        let kinds: Vec<&str> = analyzed.errors().iter().map(LayoutError::kind).collect();
        assert_eq!(kinds, vec!["unknown_type", "unsupported_type"]);
        assert!(analyzed.regions().len() == 1);
    }

    #[test]
    fn test_errors_from_all_stages_are_collected() {
        let layout = TypeLayoutBuilder::new("Bad")
            .size(4096)
            .field("Len", "uint8", "@0")
            .field("Overlap", "uint32", "@0")
            .field("Body", "[]byte", "start-end,count=Len")
            .build()
            .unwrap();
        let analyzed = analyze(&layout, &TypeRegistry::new());
        let kinds: Vec<&str> = analyzed.errors().iter().map(LayoutError::kind).collect();
        assert!(kinds.contains(&"count_overflow"), "{:?}", kinds);
        assert!(kinds.contains(&"collision"), "{:?}", kinds);
    }

    #[test]
    fn test_size_inferred_when_zero() {
        let layout = TypeLayoutBuilder::new("LeafElement")
            .field("Key", "uint32", "@0")
            .field("Offset", "uint32", "@4")
            .build()
            .unwrap();
        let analyzed = analyze(&layout, &TypeRegistry::new());
        assert!(analyzed.is_valid());
        assert_eq!(analyzed.buffer_size(), 8);
    }

    #[test]
    fn test_rejected_layout_reports_name() {
        let layout = TypeLayoutBuilder::new("Clash")
            .size(16)
            .field("A", "uint64", "@0")
            .field("B", "uint64", "@4")
            .build()
            .unwrap();
        let rejected = analyze(&layout, &TypeRegistry::new()).into_result().unwrap_err();
        assert_eq!(rejected.to_string(), "Layout Clash rejected with 1 error(s)");
    }

    fn valid_fixtures() -> (Vec<TypeLayout>, TypeRegistry) {
        let schema = crate::schema::Schema::from_json(
            r#"{
                "aliases": { "PageID": "uint64" },
                "layouts": [
                    { "name": "Page", "annotation": "size=4096",
                      "fields": [
                        { "name": "Header", "type": "uint16", "tag": "@0" },
                        { "name": "Body", "type": "[]byte", "tag": "start-end" },
                        { "name": "Footer", "type": "uint64", "tag": "@4088" } ] },
                    { "name": "LeafHeader",
                      "fields": [
                        { "name": "NumKeys", "type": "uint16", "tag": "@0" },
                        { "name": "Next", "type": "PageID", "tag": "@8" } ] },
                    { "name": "LeafElement",
                      "fields": [
                        { "name": "Key", "type": "uint32", "tag": "@0" },
                        { "name": "Offset", "type": "uint32", "tag": "@4" } ] },
                    { "name": "LeafNode", "annotation": "size=4096",
                      "fields": [
                        { "name": "Header", "type": "LeafHeader", "tag": "@0" },
                        { "name": "Elements", "type": "[]LeafElement", "tag": "start-end,count=Header.NumKeys" },
                        { "name": "Footer", "type": "uint64", "tag": "@4088" } ] },
                    { "name": "Slot",
                      "fields": [
                        { "name": "Offset", "type": "uint16", "tag": "@0" },
                        { "name": "Size", "type": "uint16", "tag": "@2" } ] },
                    { "name": "Record", "annotation": "size=512",
                      "fields": [
                        { "name": "Count", "type": "uint16", "tag": "@0" },
                        { "name": "Slots", "type": "[]Slot", "tag": "start-end,count=Count" },
                        { "name": "Heap", "type": "[]byte", "tag": "end-start" },
                        { "name": "Values", "type": "[][]byte", "tag": "from=Slots,offset=Offset,size=Size,region=Heap" } ] },
                    { "name": "Framed", "annotation": "size=128",
                      "fields": [
                        { "name": "Magic", "type": "uint32", "tag": "@0" },
                        { "name": "Trailer", "type": "[]byte", "tag": "@100,end-start" },
                        { "name": "Crc", "type": "uint32", "tag": "@124" } ] }
                ]
            }"#,
            crate::layout::AnnotationDefaults::default(),
        )
        .unwrap();
        (schema.layouts().to_vec(), schema.registry().clone())
    }

    #[test]
    fn test_indirect_slice_from_schema() {
        let (layouts, registry) = valid_fixtures();
        let record = layouts.iter().find(|l| l.name() == "Record").unwrap();
        let analyzed = analyze(record, &registry);
        assert!(analyzed.is_valid(), "{:?}", analyzed.errors());
        assert_eq!(analyzed.indirect().len(), 1);
        assert_eq!(analyzed.indirect()[0].region, 2);
        assert!(analyzed.is_indirect_region(2));
        assert!(analyzed.region("Values").is_none());
    }

    #[test]
    fn test_analysis_is_deterministic() {
        let (layouts, registry) = valid_fixtures();
        for layout in &layouts {
            let first = analyze(layout, &registry);
            let second = analyze(layout, &registry);
            assert_eq!(first.regions(), second.regions(), "{}", layout.name());
            assert_eq!(first.indirect(), second.indirect(), "{}", layout.name());
            assert_eq!(first.errors(), second.errors(), "{}", layout.name());
        }
    }

    #[test]
    fn test_valid_layouts_stay_in_bounds_without_overlap() {
        let (layouts, registry) = valid_fixtures();
        for layout in &layouts {
            let analyzed = analyze(layout, &registry);
            assert!(analyzed.is_valid(), "{}: {:?}", layout.name(), analyzed.errors());

            let spans: Vec<(&Region, usize, usize)> = analyzed
                .regions()
                .iter()
                .map(|r| {
                    let (low, high) = r.span().unwrap();
                    (r, low, high)
                })
                .collect();
            for (region, low, high) in &spans {
                assert!(low <= high, "{} {}", layout.name(), region.name());
                assert!(*high <= analyzed.buffer_size(), "{} {}", layout.name(), region.name());
            }
            for (i, (a, a_low, a_high)) in spans.iter().enumerate() {
                for (b, b_low, b_high) in &spans[i + 1..] {
                    if a.is_dynamic() && b.is_dynamic() {
                        continue;
                    }
                    assert!(
                        a_high <= b_low || b_high <= a_low,
                        "{}: {} overlaps {}",
                        layout.name(),
                        a.name(),
                        b.name()
                    );
                }
            }
        }
    }
}
