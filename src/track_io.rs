/// GPX track reading and writing.
///
/// Reading keeps two views of the file: the `gpx` crate's parse for
/// coordinates, elevation and time, and a raw-text scan for the
/// `hdopCM`/`vdopCM` extension fields the tracker writes, which the
/// parser does not surface. The scan walks `<trkpt>` blocks in document
/// order so the values can be zipped back onto the parsed points; if the
/// counts disagree the scan is discarded and the standard `<hdop>`/
/// `<vdop>` fields (whole units, x100 into hundredths) are used instead.
///
/// Points without a timestamp are dropped here, before the engine ever
/// sees them, and counted so the caller can report the loss.

use std::error::Error;
use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Read};
use std::path::Path;

use chrono::{DateTime, Utc};
use geo::point;
use gpx::{read, write, Gpx, GpxVersion, Time, Track, TrackSegment, Waypoint};
use time::OffsetDateTime;

use crate::fix::Fix;

#[derive(Debug)]
pub struct TrackFile {
    /// One fix sequence per GPX track segment, cleaned and in order.
    pub segments: Vec<Vec<Fix>>,
    pub raw_points: usize,
    pub dropped_missing_time: usize,
}

pub fn read_track(path: &Path) -> Result<TrackFile, Box<dyn Error>> {
    let mut content = String::new();
    File::open(path)?.read_to_string(&mut content)?;
    parse_track(&content)
}

pub fn parse_track(content: &str) -> Result<TrackFile, Box<dyn Error>> {
    let reader = BufReader::new(Cursor::new(content.as_bytes()));
    let gpx_data = read(reader)?;

    let scraped = scrape_dop_extensions(content);
    let total_points: usize = gpx_data
        .tracks
        .iter()
        .flat_map(|t| t.segments.iter())
        .map(|s| s.points.len())
        .sum();
    let use_scraped = scraped.len() == total_points;

    let mut segments = Vec::new();
    let mut dropped = 0usize;
    let mut index = 0usize;
    for track in &gpx_data.tracks {
        for segment in &track.segments {
            let mut fixes = Vec::with_capacity(segment.points.len());
            for pt in &segment.points {
                let dop = if use_scraped {
                    scraped[index]
                } else {
                    DopFields {
                        hdop_cm: pt.hdop.map(|h| h * 100.0),
                        vdop_cm: pt.vdop.map(|v| v * 100.0),
                    }
                };
                index += 1;

                let time = match waypoint_time(pt) {
                    Some(t) => t,
                    None => {
                        dropped += 1;
                        continue;
                    }
                };
                fixes.push(Fix {
                    latitude: pt.point().y(),
                    longitude: pt.point().x(),
                    elevation: pt.elevation,
                    time,
                    hdop_cm: dop.hdop_cm,
                    vdop_cm: dop.vdop_cm,
                });
            }
            segments.push(fixes);
        }
    }

    Ok(TrackFile {
        segments,
        raw_points: total_points,
        dropped_missing_time: dropped,
    })
}

fn waypoint_time(pt: &Waypoint) -> Option<DateTime<Utc>> {
    let odt = OffsetDateTime::from(pt.time?);
    DateTime::from_timestamp(odt.unix_timestamp(), odt.nanosecond())
}

#[derive(Debug, Clone, Copy)]
struct DopFields {
    hdop_cm: Option<f64>,
    vdop_cm: Option<f64>,
}

/// Pull DOP values out of each `<trkpt>` block by plain text scanning,
/// one entry per track point in document order. Prefers the centimeter
/// extension fields, falls back to the standard unit fields.
fn scrape_dop_extensions(content: &str) -> Vec<DopFields> {
    let mut dops = Vec::new();
    let mut rest = content;
    while let Some(start) = rest.find("<trkpt") {
        let after = &rest[start..];
        let end = match after.find("</trkpt>") {
            Some(e) => e,
            None => break,
        };
        let block = &after[..end];
        dops.push(DopFields {
            hdop_cm: extract_tag_value(block, "hdopCM")
                .or_else(|| extract_tag_value(block, "hdop").map(|h| h * 100.0)),
            vdop_cm: extract_tag_value(block, "vdopCM")
                .or_else(|| extract_tag_value(block, "vdop").map(|v| v * 100.0)),
        });
        rest = &after[end..];
    }
    dops
}

fn extract_tag_value(block: &str, tag: &str) -> Option<f64> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let value_start = block.find(&open)? + open.len();
    let value_end = block[value_start..].find(&close)? + value_start;
    block[value_start..value_end].trim().parse().ok()
}

pub fn write_track(path: &Path, segments: &[Vec<Fix>]) -> Result<(), Box<dyn Error>> {
    let gpx_data = build_gpx(segments)?;
    let writer = BufWriter::new(File::create(path)?);
    write(&gpx_data, writer)?;
    Ok(())
}

fn build_gpx(segments: &[Vec<Fix>]) -> Result<Gpx, Box<dyn Error>> {
    let mut track = Track::default();
    for fixes in segments {
        let mut segment = TrackSegment::default();
        for fix in fixes {
            let mut wp = Waypoint::new(point!(x: fix.longitude, y: fix.latitude));
            wp.elevation = fix.elevation;
            wp.time = Some(Time::from(OffsetDateTime::from_unix_timestamp(
                fix.time.timestamp(),
            )?));
            // DOP goes back out through the standard fields
            wp.hdop = fix.hdop_cm.map(|cm| cm / 100.0);
            wp.vdop = fix.vdop_cm.map(|cm| cm / 100.0);
            segment.points.push(wp);
        }
        track.segments.push(segment);
    }

    let mut gpx_data = Gpx::default();
    gpx_data.version = GpxVersion::Gpx11;
    gpx_data.creator = Some("gpx-stop-collapser".to_string());
    gpx_data.tracks.push(track);
    Ok(gpx_data)
}
