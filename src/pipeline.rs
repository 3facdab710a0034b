/// Processing pipeline: read a track, collapse its stops, write it back.
///
/// Per file: parse and clean, segment each track segment into runs,
/// simplify every pause into centroids, splice the centroids back over
/// the original sequence, serialize. Batch mode walks a folder of GPX
/// files in parallel and writes a CSV report of what was collapsed.

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;
use walkdir::WalkDir;

use crate::centroid_simplifier::simplify_stop;
use crate::config::EngineConfig;
use crate::fix::Fix;
use crate::stop_segmentation::{find_stops, Policy, Run};
use crate::stream_splicer::splice;
use crate::track_io::{read_track, write_track};
use crate::uncertainty::{detection_threshold, uncertainty};

#[derive(Debug, Clone, Serialize)]
pub struct StopReport {
    pub filename: String,
    pub method: String,
    pub raw_points: u32,
    pub dropped_missing_time: u32,
    pub move_points: u32,
    pub pause_runs: u32,
    pub pause_points: u32,
    pub centroid_points: u32,
    pub output_points: u32,
    pub compression_percent: f32,
    pub processing_time_ms: u32,
}

#[derive(Debug, Default)]
pub struct SegmentStats {
    pub move_points: usize,
    pub pause_runs: usize,
    pub pause_points: usize,
    pub centroid_points: usize,
}

/// Collapse the stops of one fix sequence. This is the whole engine in
/// one call: segmentation with the detection-threshold uncertainty,
/// centroid simplification with the raw uncertainty, splicing.
pub fn collapse_stops(
    fixes: &[Fix],
    policy: Policy,
    cfg: &EngineConfig,
) -> Result<(Vec<Fix>, SegmentStats), Box<dyn Error>> {
    let detection = |fix: &Fix| detection_threshold(uncertainty(fix), cfg);

    let mut stats = SegmentStats::default();
    let mut replacements: Vec<(&[Fix], Vec<Fix>)> = Vec::new();
    for run in find_stops(fixes, policy, detection, cfg) {
        match run {
            Run::Move(_) => stats.move_points += 1,
            Run::Pause(slice) => {
                stats.pause_runs += 1;
                stats.pause_points += slice.len();
                let centroids = simplify_stop(slice, uncertainty, cfg)?;
                stats.centroid_points += centroids.len();
                replacements.push((slice, centroids));
            }
        }
    }

    let output: Vec<Fix> = splice(fixes, replacements).collect();
    Ok((output, stats))
}

pub fn process_file(
    input: &Path,
    output: &Path,
    policy: Policy,
    cfg: &EngineConfig,
) -> Result<StopReport, Box<dyn Error>> {
    let started = Instant::now();
    let track = read_track(input)?;

    let mut out_segments = Vec::with_capacity(track.segments.len());
    let mut move_points = 0usize;
    let mut pause_runs = 0usize;
    let mut pause_points = 0usize;
    let mut centroid_points = 0usize;
    for fixes in &track.segments {
        let (collapsed, stats) = collapse_stops(fixes, policy, cfg)?;
        move_points += stats.move_points;
        pause_runs += stats.pause_runs;
        pause_points += stats.pause_points;
        centroid_points += stats.centroid_points;
        out_segments.push(collapsed);
    }

    write_track(output, &out_segments)?;

    let output_points: usize = out_segments.iter().map(|s| s.len()).sum();
    let cleaned_points = track.raw_points - track.dropped_missing_time;
    let compression = if cleaned_points > 0 {
        (1.0 - output_points as f32 / cleaned_points as f32) * 100.0
    } else {
        0.0
    };

    Ok(StopReport {
        filename: input
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string(),
        method: method_name(policy).to_string(),
        raw_points: track.raw_points as u32,
        dropped_missing_time: track.dropped_missing_time as u32,
        move_points: move_points as u32,
        pause_runs: pause_runs as u32,
        pause_points: pause_points as u32,
        centroid_points: centroid_points as u32,
        output_points: output_points as u32,
        compression_percent: compression,
        processing_time_ms: started.elapsed().as_millis() as u32,
    })
}

pub fn process_folder(
    input_folder: &Path,
    output_folder: &Path,
    policy: Policy,
    cfg: &EngineConfig,
) -> Result<(), Box<dyn Error>> {
    let total_start = Instant::now();

    println!("\n🛑 GPX STOP COLLAPSER");
    println!("=====================");
    println!("📂 Input folder: {}", input_folder.display());
    println!("📁 Output folder: {}", output_folder.display());
    println!("🔎 Method: {}", method_name(policy));

    fs::create_dir_all(output_folder)?;

    let gpx_files = collect_gpx_files(input_folder);
    println!("🔍 Found {} GPX files", gpx_files.len());
    println!("⚡ Using parallel processing on {} cores\n", num_cpus::get());

    let reports: Vec<StopReport> = gpx_files
        .par_iter()
        .filter_map(|path| {
            let out_path = output_folder.join(path.file_name()?);
            match process_file(path, &out_path, policy, cfg) {
                Ok(report) => {
                    println!(
                        "  ✅ {}: {} → {} points ({} pause runs, {:.1}% smaller)",
                        report.filename,
                        report.raw_points,
                        report.output_points,
                        report.pause_runs,
                        report.compression_percent
                    );
                    Some(report)
                }
                Err(e) => {
                    eprintln!("  ❌ {}: {}", path.display(), e);
                    None
                }
            }
        })
        .collect();

    let report_path = output_folder.join("stop_collapse_report.csv");
    write_report(&reports, &report_path)?;
    print_summary(&reports);

    println!(
        "\n⏱️  Total time: {:.2}s",
        total_start.elapsed().as_secs_f64()
    );
    println!("📊 Report: {}", report_path.display());
    Ok(())
}

pub fn method_name(policy: Policy) -> &'static str {
    match policy {
        Policy::Fast => "fast",
        Policy::Sensitive => "sensitive",
    }
}

fn collect_gpx_files(input_folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in WalkDir::new(input_folder).into_iter().flatten() {
        if !entry.file_type().is_file() {
            continue;
        }
        let is_gpx = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("gpx"))
            .unwrap_or(false);
        if is_gpx {
            files.push(entry.path().to_path_buf());
        }
    }
    files.sort();
    files
}

fn write_report(reports: &[StopReport], path: &Path) -> Result<(), Box<dyn Error>> {
    let mut writer = csv::Writer::from_path(path)?;
    for report in reports {
        writer.serialize(report)?;
    }
    writer.flush()?;
    Ok(())
}

fn print_summary(reports: &[StopReport]) {
    if reports.is_empty() {
        println!("\n⚠️  No files processed");
        return;
    }
    let total_in: u32 = reports.iter().map(|r| r.raw_points).sum();
    let total_out: u32 = reports.iter().map(|r| r.output_points).sum();
    let total_pauses: u32 = reports.iter().map(|r| r.pause_runs).sum();
    let avg_compression: f32 =
        reports.iter().map(|r| r.compression_percent).sum::<f32>() / reports.len() as f32;

    println!("\n📋 SUMMARY");
    println!("  Files processed: {}", reports.len());
    println!("  Pause runs collapsed: {}", total_pauses);
    println!("  Points: {} → {}", total_in, total_out);
    println!("  Average compression: {:.1}%", avg_compression);
}
