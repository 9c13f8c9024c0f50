use std::cmp::Ordering;
use std::collections::HashMap;

use super::config::PointTable;
use crate::perf::Performance;

/// Competition ranking ("1-1-3-4") for a set of performances.
///
/// The returned places line up with the input. Equal values share a place
/// and the next distinct value skips the slots the tie used. Invalid
/// (unparseable) performances get no place.
pub fn assign_places(perfs: &[Performance]) -> Vec<Option<u32>> {
    let mut order: Vec<usize> = (0..perfs.len()).filter(|&i| perfs[i].is_valid()).collect();
    order.sort_by(|&a, &b| perfs[a].compare(&perfs[b]));

    let mut places = vec![None; perfs.len()];
    let mut previous: Option<(usize, u32)> = None;

    for (position, &i) in order.iter().enumerate() {
        let place = match previous {
            Some((prev, place)) if perfs[prev].compare(&perfs[i]) == Ordering::Equal => place,
            _ => position as u32 + 1,
        };
        places[i] = Some(place);
        previous = Some((i, place));
    }

    places
}

/// Points for each placed competitor, splitting tied slots evenly.
pub fn award_points(places: &[Option<u32>], table: &PointTable) -> Vec<f64> {
    let mut tied: HashMap<u32, u32> = HashMap::new();
    for place in places.iter().flatten() {
        *tied.entry(*place).or_default() += 1;
    }

    places
        .iter()
        .map(|place| match place {
            Some(p) => table.tie_share(*p, tied[p]),
            None => 0.0,
        })
        .collect()
}
