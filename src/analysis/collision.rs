// Tue Jan 13 2026 - Alex

use crate::analysis::Region;
use crate::layout::{Direction, LayoutError};
use itertools::Itertools;

/// Reports every pair of regions that may claim the same bytes.
///
/// Fixed regions may never overlap. A dynamic region may not reach into a
/// fixed one. Two dynamic regions may share space only when they grow toward
/// each other (the `start-end` one lying below the `end-start` one) and at
/// least one of them carries a count.
pub fn detect_collisions(regions: &[Region], buffer_size: usize) -> Vec<LayoutError> {
    let mut errors = Vec::new();

    check_fixed(regions, &mut errors);

    let mut dynamic = Vec::new();
    for region in regions.iter().filter(|r| r.is_dynamic()) {
        match region.span() {
            Some((low, high)) if low < high => {
                if high > buffer_size {
                    errors.push(LayoutError::ExceedsBuffer {
                        field: region.name().to_string(),
                        start: low,
                        boundary: high,
                        buffer_size,
                    });
                } else {
                    dynamic.push((region, low, high));
                }
            }
            _ => errors.push(LayoutError::DegenerateRegion {
                field: region.name().to_string(),
                start: region.start().unwrap_or(0),
                boundary: region.boundary().unwrap_or(0),
            }),
        }
    }

    for &(region, low, high) in &dynamic {
        for fixed in regions.iter().filter(|r| r.is_fixed()) {
            if let Some((f_low, f_high)) = fixed.span() {
                if low < f_high && f_low < high {
                    errors.push(collision(fixed, (f_low, f_high), region, (low, high)));
                }
            }
        }
    }

    for (&(a, a_low, a_high), &(b, b_low, b_high)) in dynamic.iter().tuple_combinations() {
        if a_low < b_high && b_low < a_high && !may_share(a, b) {
            errors.push(collision(a, (a_low, a_high), b, (b_low, b_high)));
        }
    }

    errors
}

/// Sweeps fixed regions by start, comparing each against the furthest end seen so far.
fn check_fixed(regions: &[Region], errors: &mut Vec<LayoutError>) {
    let fixed = regions
        .iter()
        .filter(|r| r.is_fixed())
        .filter_map(|r| r.span().map(|span| (r, span)))
        .sorted_by_key(|(_, (start, _))| *start);

    let mut furthest: Option<(&Region, (usize, usize))> = None;
    for (region, span) in fixed {
        if let Some((prev, prev_span)) = furthest {
            if prev_span.1 > span.0 {
                errors.push(collision(prev, prev_span, region, span));
            }
            if span.1 > prev_span.1 {
                furthest = Some((region, span));
            }
        } else {
            furthest = Some((region, span));
        }
    }
}

fn may_share(a: &Region, b: &Region) -> bool {
    let (up, down) = match (a.direction(), b.direction()) {
        (Direction::StartEnd, Direction::EndStart) => (a, b),
        (Direction::EndStart, Direction::StartEnd) => (b, a),
        _ => return false,
    };
    let ordered = match (up.start(), down.start()) {
        (Some(up_start), Some(down_start)) => up_start <= down_start,
        _ => false,
    };
    ordered && (up.count_field().is_some() || down.count_field().is_some())
}

fn collision(first: &Region, first_span: (usize, usize), second: &Region, second_span: (usize, usize)) -> LayoutError {
    LayoutError::Collision {
        first: first.name().to_string(),
        first_start: first_span.0,
        first_end: first_span.1,
        second: second.name().to_string(),
        second_start: second_span.0,
        second_end: second_span.1,
    }
}
