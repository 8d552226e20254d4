//! Insertion-point resolution for drag feedback.
//!
//! Maps a pointer position and the rendered bounds of a container's items to
//! the id of the item the dragged element should be inserted before, or
//! `None` for "append at the end". Everything here is a pure function over
//! borrowed slices: it runs on every pointer move, so it allocates nothing
//! and makes a single pass over the candidates.
//!
//! Ties go to "before": a pointer exactly on an item's midpoint inserts in
//! front of that item.

use crate::types::drag::Candidate;
use crate::types::geometry::{Flow, Point};

/// Resolves the insertion point for `pointer` in a container laid out with `flow`.
///
/// `exclude` is the item being dragged; it is skipped so that hovering over
/// the item's own slot never targets the item itself.
pub fn resolve<'a, I: PartialEq>(
    candidates: &'a [Candidate<I>],
    exclude: Option<&I>,
    pointer: Point,
    flow: Flow,
) -> Option<&'a I> {
    match flow {
        Flow::Vertical => resolve_along(candidates, exclude, pointer.y, |c| c.bounds.center().y),
        Flow::Horizontal => resolve_along(candidates, exclude, pointer.x, |c| c.bounds.center().x),
        Flow::Wrap => resolve_grid(candidates, exclude, pointer),
    }
}

/// Single-axis list: the first item whose midpoint is not before the pointer.
fn resolve_along<'a, I: PartialEq>(
    candidates: &'a [Candidate<I>],
    exclude: Option<&I>,
    coord: f64,
    midpoint: impl Fn(&Candidate<I>) -> f64,
) -> Option<&'a I> {
    candidates
        .iter()
        .filter(|c| !is_excluded(c, exclude))
        .find(|c| coord <= midpoint(c))
        .map(|c| &c.id)
}

/// Grid layout: picks the nearest item by center distance, then decides
/// between "before it" and "before its successor" along the axis the layout
/// runs in at that spot.
pub fn resolve_grid<'a, I: PartialEq>(
    candidates: &'a [Candidate<I>],
    exclude: Option<&I>,
    pointer: Point,
) -> Option<&'a I> {
    let mut nearest: Option<(usize, f64)> = None;
    for (i, c) in candidates.iter().enumerate() {
        if is_excluded(c, exclude) {
            continue;
        }
        let d = pointer.distance_sq(c.bounds.center());
        if nearest.map_or(true, |(_, best)| d < best) {
            nearest = Some((i, d));
        }
    }
    let (index, _) = nearest?;

    let target = &candidates[index];
    let center = target.bounds.center();
    let successor = candidates[index + 1..]
        .iter()
        .find(|c| !is_excluded(c, exclude));
    let predecessor = candidates[..index]
        .iter()
        .rev()
        .find(|c| !is_excluded(c, exclude));

    // The successor tells which way the layout runs here; the last item
    // looks back at its predecessor, and a lone item is treated as a stack.
    let stacked = match successor.or(predecessor) {
        Some(neighbour) => {
            let n = neighbour.bounds.center();
            (n.y - center.y).abs() >= (n.x - center.x).abs()
        }
        None => true,
    };

    let (coord, mid) = if stacked {
        (pointer.y, center.y)
    } else {
        (pointer.x, center.x)
    };

    if coord <= mid {
        Some(&target.id)
    } else {
        successor.map(|c| &c.id)
    }
}

fn is_excluded<I: PartialEq>(candidate: &Candidate<I>, exclude: Option<&I>) -> bool {
    exclude.is_some_and(|id| &candidate.id == id)
}
