/// Engine configuration.
///
/// The stop detector used to rely on hardcoded module constants; they now
/// travel together in one struct that every component receives explicitly.

use chrono::Duration;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Minimum stationary duration before a cluster counts as a pause.
    pub trigger_window: Duration,
    /// Width of one centroid sub-window inside a paused run.
    pub centroid_window: Duration,
    /// Raw reported uncertainty is divided by this factor before overlap
    /// testing, tightening detection relative to what the device claims.
    pub dop_calibration_factor: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            trigger_window: Duration::seconds(10),
            centroid_window: Duration::seconds(60),
            dop_calibration_factor: 10.0,
        }
    }
}

impl EngineConfig {
    /// Longer trigger window for trackers with noisy DOP reporting, where
    /// short apparent stops are usually artifacts.
    pub fn conservative() -> Self {
        EngineConfig {
            trigger_window: Duration::seconds(30),
            ..Default::default()
        }
    }
}
