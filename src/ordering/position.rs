//! Gap-based fractional positions.
//!
//! Positions are plain `f64` sort keys. Only their order matters: inserting
//! between two neighbours takes the midpoint, so a single reorder never
//! rewrites sibling rows. Repeated midpoints between the same pair eventually
//! run out of precision; [`fits_between`] detects that case so the caller can
//! renumber the group (a bulk state mutation, not an allocator concern).

/// Spacing used when a position has no neighbour on one side.
pub const GAP: f64 = 1024.0;

/// Position for an item appended after `last`.
pub fn allocate_append(last: Option<f64>) -> f64 {
    match last {
        Some(last) => last + GAP,
        None => GAP,
    }
}

/// Position sorting between `prev` and `next`; either side may be open.
pub fn allocate_between(prev: Option<f64>, next: Option<f64>) -> f64 {
    match (prev, next) {
        (Some(prev), Some(next)) => (prev + next) / 2.0,
        (None, Some(next)) => next / 2.0,
        (Some(prev), None) => prev + GAP,
        (None, None) => GAP,
    }
}

/// Whether `candidate` sorts strictly inside the open interval `(prev, next)`.
pub fn fits_between(prev: Option<f64>, next: Option<f64>, candidate: f64) -> bool {
    if !candidate.is_finite() {
        return false;
    }
    let after_prev = prev.map_or(true, |p| candidate > p);
    let before_next = next.map_or(true, |n| candidate < n);
    after_prev && before_next
}

/// Evenly spaced positions `GAP, 2·GAP, …` for `count` items.
pub fn spaced(count: usize) -> impl Iterator<Item = f64> {
    (1..=count).map(|i| i as f64 * GAP)
}
