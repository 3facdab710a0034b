/// Centroid simplification of paused runs.
///
/// A paused run is cut into consecutive sub-windows of at most the
/// configured width (a window holds its first fix and every following
/// fix no later than first + width), and each window collapses into one
/// synthetic fix: position and elevation are uncertainty-weighted means
/// (weight 1 / radius, so tighter fixes pull harder), time is the plain
/// mean of the whole-second timestamps. The synthetic fix carries the
/// weighted harmonic mean of its constituents' DOP, which keeps it a
/// valid input for a further simplification pass.
///
/// Raw uncertainty weights the averages here; the divided-down detection
/// threshold is a segmentation concern only.

use std::error::Error;

use chrono::DateTime;

use crate::config::EngineConfig;
use crate::fix::Fix;
use crate::uncertainty::{radius_to_dop_cm, Uncertainty};

/// Collapse one paused run into one centroid fix per sub-window.
///
/// Fails if any fix in a window reports zero or missing horizontal
/// uncertainty: the position weights become undefined and that is a
/// data-quality problem the caller needs to hear about.
pub fn simplify_stop<F>(
    run: &[Fix],
    uncertainty_fn: F,
    cfg: &EngineConfig,
) -> Result<Vec<Fix>, Box<dyn Error>>
where
    F: Fn(&Fix) -> Uncertainty,
{
    let mut centroids = Vec::new();
    let mut start = 0;
    while start < run.len() {
        let window_close = run[start].time + cfg.centroid_window;
        let mut end = start + 1;
        while end < run.len() && run[end].time <= window_close {
            end += 1;
        }
        centroids.push(window_centroid(&run[start..end], &uncertainty_fn)?);
        start = end;
    }
    Ok(centroids)
}

fn window_centroid<F>(window: &[Fix], uncertainty_fn: &F) -> Result<Fix, Box<dyn Error>>
where
    F: Fn(&Fix) -> Uncertainty,
{
    let mut lat_sum = 0.0;
    let mut lon_sum = 0.0;
    let mut horz_weight = 0.0;
    for fix in window {
        let horz = match uncertainty_fn(fix).horz {
            Some(h) if h > 0.0 => h,
            _ => {
                return Err(format!(
                    "fix at {} has zero or missing horizontal uncertainty, cannot weight stop centroid",
                    fix.time
                )
                .into())
            }
        };
        let w = 1.0 / horz;
        lat_sum += fix.latitude * w;
        lon_sum += fix.longitude * w;
        horz_weight += w;
    }

    // Elevation averages over the fixes that carry both an elevation and
    // a vertical radius; the centroid only loses its elevation when no
    // fix in the window qualifies.
    let mut ele_sum = 0.0;
    let mut vert_weight = 0.0;
    let mut vert_count = 0usize;
    for fix in window {
        if let (Some(ele), Some(vert)) = (fix.elevation, uncertainty_fn(fix).vert) {
            if vert > 0.0 {
                let w = 1.0 / vert;
                ele_sum += ele * w;
                vert_weight += w;
                vert_count += 1;
            }
        }
    }
    let elevation = if vert_count > 0 {
        Some(ele_sum / vert_weight)
    } else {
        None
    };

    let mean_secs =
        window.iter().map(|f| f.time.timestamp()).sum::<i64>() / window.len() as i64;
    let time = DateTime::from_timestamp(mean_secs, 0)
        .ok_or("centroid timestamp out of representable range")?;

    let combined_horz = Some(window.len() as f64 / horz_weight);
    let combined_vert = if vert_count > 0 {
        Some(vert_count as f64 / vert_weight)
    } else {
        None
    };

    Ok(Fix {
        latitude: lat_sum / horz_weight,
        longitude: lon_sum / horz_weight,
        elevation,
        time,
        hdop_cm: radius_to_dop_cm(combined_horz),
        vdop_cm: radius_to_dop_cm(combined_vert),
    })
}
