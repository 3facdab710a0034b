use std::env;
use std::error::Error;
use std::path::PathBuf;
use std::process;

mod centroid_simplifier;
mod cluster;
mod config;
mod fix;
mod motion_classifier;
mod pipeline;
mod stop_segmentation;
mod stream_splicer;
mod track_io;
mod uncertainty;

use config::EngineConfig;
use stop_segmentation::Policy;

fn print_usage() {
    println!("Usage: gpx-stop-collapser <input.gpx | folder> [options]");
    println!();
    println!("Options:");
    println!("  --method fast|sensitive   Stop detection policy (default: sensitive)");
    println!("  --output <path>           Output file or folder");
}

fn parse_args() -> Result<(PathBuf, Policy, Option<PathBuf>), String> {
    let mut input = None;
    let mut policy = Policy::Sensitive;
    let mut output = None;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--method" => {
                let value = args.next().ok_or("--method needs a value")?;
                policy = match value.as_str() {
                    "fast" => Policy::Fast,
                    "sensitive" => Policy::Sensitive,
                    other => return Err(format!("unknown method '{}'", other)),
                };
            }
            "--output" => {
                let value = args.next().ok_or("--output needs a value")?;
                output = Some(PathBuf::from(value));
            }
            "--help" | "-h" => return Err(String::new()),
            other if input.is_none() => input = Some(PathBuf::from(other)),
            other => return Err(format!("unexpected argument '{}'", other)),
        }
    }

    let input = input.ok_or("missing input path")?;
    Ok((input, policy, output))
}

fn main() -> Result<(), Box<dyn Error>> {
    let (input, policy, output) = match parse_args() {
        Ok(parsed) => parsed,
        Err(message) => {
            if !message.is_empty() {
                eprintln!("❌ {}\n", message);
            }
            print_usage();
            process::exit(if message.is_empty() { 0 } else { 2 });
        }
    };

    let cfg = EngineConfig::default();

    if input.is_dir() {
        let output_folder = output.unwrap_or_else(|| {
            let mut folder = input.as_os_str().to_owned();
            folder.push("_collapsed");
            PathBuf::from(folder)
        });
        pipeline::process_folder(&input, &output_folder, policy, &cfg)?;
    } else {
        let output_file = output.unwrap_or_else(|| {
            let stem = input
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("track");
            input.with_file_name(format!("{}_collapsed.gpx", stem))
        });
        let report = pipeline::process_file(&input, &output_file, policy, &cfg)?;
        println!(
            "✅ {}: {} → {} points ({} pause runs collapsed, {:.1}% smaller)",
            report.filename,
            report.raw_points,
            report.output_points,
            report.pause_runs,
            report.compression_percent
        );
        if report.dropped_missing_time > 0 {
            println!(
                "⚠️  Dropped {} points without timestamps",
                report.dropped_missing_time
            );
        }
        println!("📁 Written to {}", output_file.display());
    }

    Ok(())
}
