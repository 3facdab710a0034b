/// Overlap test and cumulative clustering.
///
/// Two fixes overlap when their uncertainty circles intersect: ground
/// distance strictly less than the sum of their horizontal radii. A
/// cluster grows by accepting each candidate that overlaps *every* fix
/// accepted so far, not just the latest one, so a slow drift cannot walk
/// a "stationary" cluster across the map. The first candidate that fails
/// ends the cluster permanently.

use crate::fix::{distance_m, Fix};
use crate::uncertainty::Uncertainty;

/// Overlap predicate. Fail-closed: if either fix has no horizontal
/// radius, they do not overlap, so a fix with unknown precision can
/// never silently join a cluster.
pub fn fixes_overlap<F>(a: &Fix, b: &Fix, uncertainty_fn: F) -> bool
where
    F: Fn(&Fix) -> Uncertainty,
{
    match (uncertainty_fn(a).horz, uncertainty_fn(b).horz) {
        (Some(ra), Some(rb)) => distance_m(a, b) < ra + rb,
        _ => false,
    }
}

/// Lazy cumulative cluster over a candidate slice.
///
/// Yields each accepted candidate in order and stops for good at the
/// first overlap failure (the failing candidate is not yielded) or when
/// the slice runs out. Worst case O(n²) overlap tests for a cluster of
/// size n, bounded in practice by how long a stop lasts.
pub struct Cluster<'a, F> {
    accepted: Vec<&'a Fix>,
    candidates: &'a [Fix],
    cursor: usize,
    uncertainty_fn: F,
    stopped: bool,
}

impl<'a, F> Cluster<'a, F>
where
    F: Fn(&Fix) -> Uncertainty,
{
    pub fn new(seed: Vec<&'a Fix>, candidates: &'a [Fix], uncertainty_fn: F) -> Self {
        Cluster {
            accepted: seed,
            candidates,
            cursor: 0,
            uncertainty_fn,
            stopped: false,
        }
    }
}

impl<'a, F> Iterator for Cluster<'a, F>
where
    F: Fn(&Fix) -> Uncertainty,
{
    type Item = &'a Fix;

    fn next(&mut self) -> Option<&'a Fix> {
        if self.stopped || self.cursor >= self.candidates.len() {
            return None;
        }
        let candidate = &self.candidates[self.cursor];
        let joins = self
            .accepted
            .iter()
            .all(|c| fixes_overlap(candidate, c, &self.uncertainty_fn));
        if !joins {
            self.stopped = true;
            return None;
        }
        self.accepted.push(candidate);
        self.cursor += 1;
        Some(candidate)
    }
}

/// Length of the maximal stationary prefix of `candidates`, clustering
/// from an empty seed. At least 1 for a non-empty slice, since the first
/// candidate has nothing to disagree with.
pub fn stationary_prefix_len<F>(candidates: &[Fix], uncertainty_fn: F) -> usize
where
    F: Fn(&Fix) -> Uncertainty,
{
    Cluster::new(Vec::new(), candidates, uncertainty_fn).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    const METERS_PER_DEG_LAT: f64 = 111_195.0;

    fn fix_north(meters: f64, seconds: i64) -> Fix {
        Fix {
            latitude: 40.0 + meters / METERS_PER_DEG_LAT,
            longitude: -74.0,
            elevation: None,
            time: Utc.with_ymd_and_hms(2021, 3, 14, 12, 0, 0).unwrap() + Duration::seconds(seconds),
            hdop_cm: Some(500.0),
            vdop_cm: None,
        }
    }

    fn five_meters(_fix: &Fix) -> Uncertainty {
        Uncertainty {
            horz: Some(5.0),
            vert: None,
        }
    }

    fn no_radius(_fix: &Fix) -> Uncertainty {
        Uncertainty {
            horz: None,
            vert: None,
        }
    }

    #[test]
    fn test_overlap_is_symmetric() {
        let a = fix_north(0.0, 0);
        let b = fix_north(8.0, 5);
        assert!(fixes_overlap(&a, &b, five_meters));
        assert!(fixes_overlap(&b, &a, five_meters));

        let far = fix_north(50.0, 10);
        assert!(!fixes_overlap(&a, &far, five_meters));
        assert!(!fixes_overlap(&far, &a, five_meters));
    }

    #[test]
    fn test_overlap_fails_closed_without_radius() {
        let a = fix_north(0.0, 0);
        let b = fix_north(0.0, 5);
        // Identical coordinates, but unknown precision on both sides
        assert!(!fixes_overlap(&a, &b, no_radius));
    }

    #[test]
    fn test_cumulative_test_rejects_slow_drift() {
        // Each fix overlaps its neighbor (8 m apart, 10 m combined radius)
        // but the third is 16 m from the first, so the all-pairs test
        // cuts the cluster at two members.
        let track = vec![fix_north(0.0, 0), fix_north(8.0, 5), fix_north(16.0, 10)];
        assert_eq!(stationary_prefix_len(&track, five_meters), 2);
    }

    #[test]
    fn test_cluster_stops_permanently_at_first_failure() {
        // The fourth fix is back inside the circle of the first, but the
        // break at the third already ended the cluster.
        let track = vec![
            fix_north(0.0, 0),
            fix_north(2.0, 5),
            fix_north(100.0, 10),
            fix_north(1.0, 15),
        ];
        let members: Vec<_> = Cluster::new(Vec::new(), &track, five_meters).collect();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0], &track[0]);
        assert_eq!(members[1], &track[1]);
    }

    #[test]
    fn test_seeded_cluster_tests_against_seed() {
        let seed_fix = fix_north(0.0, 0);
        let track = vec![fix_north(100.0, 5)];
        let members: Vec<_> =
            Cluster::new(vec![&seed_fix], &track, five_meters).collect();
        assert!(members.is_empty());
    }

    #[test]
    fn test_empty_candidates_yield_empty_cluster() {
        assert_eq!(stationary_prefix_len(&[], five_meters), 0);
    }
}
