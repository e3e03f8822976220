// Tue Jan 13 2026 - Alex

use crate::analysis::Region;
use crate::layout::Direction;

/// Orders regions by position and fills in every dynamic start and boundary.
///
/// Unanchored `start-end` regions sort as if they began at 0 and unanchored
/// `end-start` regions as if they began at the buffer end. At equal keys
/// anchored regions come first; the sort is stable so declaration order
/// settles the rest.
pub fn calculate_boundaries(regions: &mut [Region], buffer_size: usize) {
    regions.sort_by_key(|r| sort_key(r, buffer_size));

    for i in 0..regions.len() {
        let region = &regions[i];
        if region.is_dynamic() && region.direction == Direction::StartEnd && !region.anchored {
            let start = find_previous_end(regions, i);
            regions[i].start = Some(start);
        }
    }

    for i in 0..regions.len() {
        if regions[i].is_fixed() {
            continue;
        }
        match regions[i].direction {
            Direction::StartEnd => {
                let boundary = find_next_start(regions, i, buffer_size);
                regions[i].boundary = Some(boundary);
            }
            Direction::EndStart => {
                if regions[i].start.is_none() {
                    regions[i].start = Some(buffer_size);
                }
                let boundary = find_previous_end(regions, i);
                regions[i].boundary = Some(boundary);
            }
            Direction::Fixed => {}
        }
    }

    for region in regions.iter() {
        log::trace!("Resolved {}", region);
    }
}

fn sort_key(region: &Region, buffer_size: usize) -> (usize, u8) {
    let key = region.start.unwrap_or(match region.direction {
        Direction::EndStart => buffer_size,
        _ => 0,
    });
    (key, if region.anchored { 0 } else { 1 })
}

/// Walks backwards to the nearest fixed region's end or anchored
/// `start-end` region's start.
fn find_previous_end(regions: &[Region], idx: usize) -> usize {
    for region in regions[..idx].iter().rev() {
        if region.is_fixed() {
            if let Some(boundary) = region.boundary {
                return boundary;
            }
        }
        if region.direction == Direction::StartEnd && region.anchored {
            if let Some(start) = region.start {
                return start;
            }
        }
    }
    0
}

/// Walks forwards to the nearest fixed or anchored region's start.
fn find_next_start(regions: &[Region], idx: usize, buffer_size: usize) -> usize {
    regions[idx + 1..]
        .iter()
        .find(|r| r.anchored)
        .and_then(|r| r.start)
        .unwrap_or(buffer_size)
}
