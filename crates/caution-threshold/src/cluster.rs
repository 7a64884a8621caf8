//! Proximity clustering on a circular track.

use std::collections::VecDeque;

/// Slack on the gap comparison so a wrapped copy at `position + 1` is not
/// pushed past `distance` by rounding.
const GAP_TOLERANCE: f64 = 1e-9;

/// Group items whose lap positions lie within `distance` of each other.
///
/// `position` must return a lap fraction in `[0, 1)`. Positions are sorted
/// and items closer than `distance` to the start/finish line are appended
/// again at `position + 1` so groups can span the line. A window then slides
/// forward: whenever the next item is more than `distance` past the window's
/// first member, the window is emitted as a cluster and its first member
/// dropped. What is left at the end forms the last cluster. Gaps are compared
/// with a tolerance of `1e-9` lap so pairs either side of the line cluster
/// exactly as pairs that do not cross it.
///
/// Clusters can overlap, and an item near the line may appear in one cluster
/// at its own position and in another through its wrapped copy.
pub fn proximity_clusters<T, F>(items: &[T], distance: f64, position: F) -> Vec<Vec<T>>
where
    T: Copy,
    F: Fn(&T) -> f64,
{
    let mut sorted: Vec<(f64, T)> = items.iter().map(|item| (position(item), *item)).collect();
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

    let wrapped: Vec<(f64, T)> = sorted
        .iter()
        .take_while(|(pos, _)| *pos < distance)
        .map(|(pos, item)| (pos + 1.0, *item))
        .collect();
    sorted.extend(wrapped);

    let mut clusters = Vec::new();
    let mut window: VecDeque<(f64, T)> = VecDeque::new();
    for entry in sorted {
        while let Some(&(front, _)) = window.front()
            && entry.0 - front > distance + GAP_TOLERANCE
        {
            clusters.push(window.iter().map(|(_, item)| *item).collect());
            window.pop_front();
        }
        window.push_back(entry);
    }
    if !window.is_empty() {
        clusters.push(window.into_iter().map(|(_, item)| item).collect());
    }
    clusters
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_has_no_clusters() {
        assert!(proximity_clusters::<f64, _>(&[], 0.1, |p| *p).is_empty());
    }

    #[test]
    fn close_items_share_a_cluster() {
        let clusters = proximity_clusters(&[0.0, 0.05, 0.10], 0.1, |p| *p);
        assert!(clusters.iter().any(|c| c.len() == 3));
    }

    #[test]
    fn spread_items_stay_apart() {
        let clusters = proximity_clusters(&[0.0, 0.25, 0.5, 0.75], 0.1, |p| *p);
        assert!(clusters.iter().all(|c| c.len() == 1));
    }

    #[test]
    fn clusters_span_the_finish_line() {
        let clusters = proximity_clusters(&[0.97, 0.02], 0.1, |p| *p);
        let joined = clusters.iter().find(|c| c.len() == 2);
        assert!(joined.is_some(), "clusters: {clusters:?}");
    }

    #[test]
    fn gap_at_distance_clusters_across_the_line() {
        let crossing = proximity_clusters(&[0.97, 0.07], 0.1, |p| *p);
        assert!(crossing.iter().any(|c| c.len() == 2), "clusters: {crossing:?}");

        let plain = proximity_clusters(&[0.0, 0.1], 0.1, |p| *p);
        assert!(plain.iter().any(|c| c.len() == 2), "clusters: {plain:?}");
    }

    #[test]
    fn gap_beyond_distance_stays_apart_across_the_line() {
        let clusters = proximity_clusters(&[0.95, 0.07], 0.1, |p| *p);
        assert!(clusters.iter().all(|c| c.len() == 1), "clusters: {clusters:?}");
    }

    #[test]
    fn window_emits_on_each_front_eviction() {
        let clusters = proximity_clusters(&[0.30, 0.35, 0.42, 0.60], 0.1, |p| *p);
        insta::assert_debug_snapshot!(clusters, @r"
        [
            [
                0.3,
                0.35,
            ],
            [
                0.35,
                0.42,
            ],
            [
                0.42,
            ],
            [
                0.6,
            ],
        ]
        ");
    }
}
