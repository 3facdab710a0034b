/// Track fix: one timestamped GPS sample with its device-reported
/// dilution-of-precision fields.
///
/// Fixes are immutable once read. Identity is structural: the splicer
/// relies on exact field equality to locate a run's first fix in the
/// base sequence, so nothing mutates a fix after the reader produced it.

use chrono::{DateTime, Utc};
use geo::{point, HaversineDistance};

#[derive(Debug, Clone, PartialEq)]
pub struct Fix {
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: Option<f64>,
    /// Fixes without a timestamp are dropped by the reader, so every
    /// fix the engine sees carries one.
    pub time: DateTime<Utc>,
    /// Horizontal dilution of precision, hundredths of a unit (the
    /// tracker writes centimeters into an `hdopCM` extension).
    pub hdop_cm: Option<f64>,
    /// Vertical counterpart, `vdopCM`.
    pub vdop_cm: Option<f64>,
}

/// Ground distance between two fixes in meters (Haversine).
pub fn distance_m(a: &Fix, b: &Fix) -> f64 {
    let p1 = point!(x: a.longitude, y: a.latitude);
    let p2 = point!(x: b.longitude, y: b.latitude);
    p1.haversine_distance(&p2)
}
