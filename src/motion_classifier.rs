/// Motion classification by bounded lookahead.
///
/// A fix is moving if its position diverges from the following fixes
/// before the trigger window elapses, paused if the overlap holds past
/// the window, and undetermined when the track ends before either
/// condition fires. The caller decides what undetermined means; the
/// sensitive segmentation policy deliberately treats it as moving.

use crate::cluster::Cluster;
use crate::config::EngineConfig;
use crate::fix::Fix;
use crate::uncertainty::Uncertainty;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Moving,
    Paused,
    Undetermined,
}

/// Classify `start` against the fixes that follow it. Single forward
/// scan; no fix is revisited once passed.
pub fn classify<F>(start: &Fix, future: &[Fix], uncertainty_fn: F, cfg: &EngineConfig) -> Motion
where
    F: Fn(&Fix) -> Uncertainty,
{
    let mut cluster = Cluster::new(vec![start], future, &uncertainty_fn);
    for fix in future {
        if cluster.next().is_none() {
            return Motion::Moving;
        }
        if fix.time - start.time > cfg.trigger_window {
            return Motion::Paused;
        }
    }
    Motion::Undetermined
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

    #[test]
    fn test_divergence_before_window_is_moving() {
        let start = fix_north(0.0, 0);
        let future = vec![fix_north(100.0, 3)];
        assert_eq!(
            classify(&start, &future, five_meters, &EngineConfig::default()),
            Motion::Moving
        );
    }

    #[test]
    fn test_overlap_past_window_is_paused() {
        let start = fix_north(0.0, 0);
        let future = vec![fix_north(1.0, 5), fix_north(2.0, 12)];
        assert_eq!(
            classify(&start, &future, five_meters, &EngineConfig::default()),
            Motion::Paused
        );
    }

    #[test]
    fn test_short_lookahead_is_undetermined() {
        let start = fix_north(0.0, 0);
        let future = vec![fix_north(1.0, 5)];
        assert_eq!(
            classify(&start, &future, five_meters, &EngineConfig::default()),
            Motion::Undetermined
        );
        assert_eq!(
            classify(&start, &[], five_meters, &EngineConfig::default()),
            Motion::Undetermined
        );
    }

    #[test]
    fn test_unknown_precision_reads_as_moving() {
        // Fail-closed overlap: a fix without DOP breaks the cluster on
        // the first lookahead step.
        let start = fix_north(0.0, 0);
        let future = vec![fix_north(0.0, 5), fix_north(0.0, 12)];
        let no_radius = |_: &Fix| Uncertainty {
            horz: None,
            vert: None,
        };
        assert_eq!(
            classify(&start, &future, no_radius, &EngineConfig::default()),
            Motion::Moving
        );
    }
}
