//! Sweep-and-prune over X intervals.
//!
//! Entities contribute two events each, one at the interval start and one at
//! the end. Queries walk the sorted list once, so a lookup is linear in the
//! number of events left of the query's right edge instead of quadratic in
//! the entity count.

use std::collections::HashMap;
use std::hash::Hash;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Event<Id> {
    pub id: Id,
    pub value: f32,
    pub start: bool,
}

impl<Id> Event<Id> {
    pub fn pair(id: Id, min: f32, max: f32) -> [Self; 2]
    where
        Id: Copy,
    {
        [
            Self {
                id,
                value: min,
                start: true,
            },
            Self {
                id,
                value: max,
                start: false,
            },
        ]
    }
}

/// Stable sort by event value. Ties keep insertion order.
pub fn sort_events<Id>(events: &mut [Event<Id>]) {
    events.sort_by(|a, b| a.value.partial_cmp(&b.value).expect("event value is NaN"));
}

/// Ids whose interval overlaps `[min, max]`.
///
/// Walking front to back: an event beyond `max` ends the walk; events left of
/// `min` toggle coverage (an interval that both starts and ends before the
/// query cannot overlap it); events inside the query range mark their entity
/// outright.
pub fn query<Id: Copy + Eq + Hash>(events: &[Event<Id>], min: f32, max: f32) -> Vec<Id> {
    let mut covering: HashMap<Id, bool> = HashMap::new();
    for event in events {
        if event.value > max {
            break;
        }
        if event.value < min {
            covering.insert(event.id, event.start);
        } else {
            covering.insert(event.id, true);
        }
    }
    covering
        .into_iter()
        .filter_map(|(id, covered)| covered.then_some(id))
        .collect()
}
