/// Uncertainty model: device DOP fields to spatial radii.
///
/// The tracker reports precision in hundredths of a unit (centimeter
/// extensions `hdopCM`/`vdopCM`). Raw uncertainty is that value in meters;
/// the detection threshold further divides by an empirical calibration
/// factor so that the overlap test is tighter than what the device claims.
/// Absence propagates: no DOP field means no radius, and no elevation
/// means no vertical radius regardless of the reported VDOP.

use crate::config::EngineConfig;
use crate::fix::Fix;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Uncertainty {
    /// Horizontal radius, meters.
    pub horz: Option<f64>,
    /// Vertical radius, meters.
    pub vert: Option<f64>,
}

/// Raw uncertainty radii of a fix, as reported by the device.
pub fn uncertainty(fix: &Fix) -> Uncertainty {
    let horz = fix.hdop_cm.map(|cm| cm / 100.0);
    let vert = match fix.elevation {
        None => None,
        Some(_) => fix.vdop_cm.map(|cm| cm / 100.0),
    };
    Uncertainty { horz, vert }
}

/// Rescale raw uncertainty into the radius used for segmentation overlap
/// tests. Raw radii are only used where uncertainty itself is reported
/// (centroid weighting); every stop/move decision goes through this.
pub fn detection_threshold(u: Uncertainty, cfg: &EngineConfig) -> Uncertainty {
    Uncertainty {
        horz: u.horz.map(|h| h / cfg.dop_calibration_factor),
        vert: u.vert.map(|v| v / cfg.dop_calibration_factor),
    }
}

/// Inverse of the raw model: a radius in meters back to a DOP field in
/// hundredths. Used when synthesizing centroid fixes so they stay valid
/// inputs for another simplification pass.
pub fn radius_to_dop_cm(radius_m: Option<f64>) -> Option<f64> {
    radius_m.map(|r| r * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn fix(elevation: Option<f64>, hdop_cm: Option<f64>, vdop_cm: Option<f64>) -> Fix {
        Fix {
            latitude: 40.0,
            longitude: -74.0,
            elevation,
            time: Utc.with_ymd_and_hms(2021, 3, 14, 12, 0, 0).unwrap(),
            hdop_cm,
            vdop_cm,
        }
    }

    #[test]
    fn test_centimeters_convert_to_meters() {
        let u = uncertainty(&fix(Some(10.0), Some(500.0), Some(300.0)));
        assert_eq!(u.horz, Some(5.0));
        assert_eq!(u.vert, Some(3.0));
    }

    #[test]
    fn test_absent_dop_propagates() {
        let u = uncertainty(&fix(Some(10.0), None, None));
        assert_eq!(u.horz, None);
        assert_eq!(u.vert, None);
    }

    #[test]
    fn test_missing_elevation_clears_vertical() {
        // VDOP present but no elevation to attach it to
        let u = uncertainty(&fix(None, Some(500.0), Some(300.0)));
        assert_eq!(u.horz, Some(5.0));
        assert_eq!(u.vert, None);
    }

    #[test]
    fn test_detection_threshold_divides_by_factor() {
        let cfg = EngineConfig::default();
        let raw = uncertainty(&fix(Some(10.0), Some(500.0), Some(300.0)));
        let t = detection_threshold(raw, &cfg);
        assert_eq!(t.horz, Some(0.5));
        assert_eq!(t.vert, Some(0.3));

        let absent = detection_threshold(Uncertainty { horz: None, vert: None }, &cfg);
        assert_eq!(absent.horz, None);
        assert_eq!(absent.vert, None);
    }

    #[test]
    fn test_radius_round_trips_through_dop() {
        assert_eq!(radius_to_dop_cm(Some(5.0)), Some(500.0));
        assert_eq!(radius_to_dop_cm(None), None);
    }
}
