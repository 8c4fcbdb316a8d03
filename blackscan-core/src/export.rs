//! Result export: frame hits and black ranges as CSV or JSON.
//!
//! Column sets are fixed. The `file` column/key appears only when the
//! export covers more than one file; single-file exports stay compact.
//! Empty result sets still produce valid output (a header-only CSV, or a
//! JSON empty array).

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use log::info;
use serde::Serialize;

use crate::error::CoreResult;
use crate::session::AnalysisResult;
use crate::time::format_timestamp;

#[derive(Serialize)]
struct FrameRecord<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    file: Option<&'a str>,
    frame: u64,
    time_s: Option<f64>,
    timestamp: Option<String>,
    pblack: Option<f64>,
    pts: Option<i64>,
}

#[derive(Serialize)]
struct RangeRecord<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    file: Option<&'a str>,
    start_frame: u64,
    end_frame: u64,
    start_timestamp: Option<String>,
    end_timestamp: Option<String>,
    length_frames: u64,
    avg_pblack: Option<f64>,
    min_pblack: Option<f64>,
}

/// Writes every hit across `results` as CSV.
pub fn export_frames_csv(path: &Path, results: &[AnalysisResult]) -> CoreResult<()> {
    let multi = results.len() > 1;
    let mut out = String::new();
    if multi {
        out.push_str("file,");
    }
    out.push_str("frame,time_s,timestamp,pblack,pts\n");

    for result in results {
        let file = result.file_path.to_string_lossy();
        for hit in &result.hits {
            if multi {
                let _ = write!(out, "{},", csv_field(&file));
            }
            let _ = writeln!(
                out,
                "{},{},{},{},{}",
                hit.frame,
                opt_f64(hit.time_secs),
                hit.time_secs.map(format_timestamp).unwrap_or_default(),
                opt_f64(hit.pblack),
                hit.pts.map(|p| p.to_string()).unwrap_or_default(),
            );
        }
    }

    fs::write(path, out)?;
    info!("wrote frame export to {}", path.display());
    Ok(())
}

/// Writes every hit across `results` as a JSON array.
pub fn export_frames_json(path: &Path, results: &[AnalysisResult]) -> CoreResult<()> {
    let multi = results.len() > 1;
    let mut records = Vec::new();
    let names: Vec<String> = results
        .iter()
        .map(|r| r.file_path.to_string_lossy().into_owned())
        .collect();

    for (result, name) in results.iter().zip(&names) {
        for hit in &result.hits {
            records.push(FrameRecord {
                file: multi.then_some(name.as_str()),
                frame: hit.frame,
                time_s: hit.time_secs,
                timestamp: hit.time_secs.map(format_timestamp),
                pblack: hit.pblack,
                pts: hit.pts,
            });
        }
    }

    write_json(path, &records)
}

/// Writes every range across `results` as CSV.
pub fn export_ranges_csv(path: &Path, results: &[AnalysisResult]) -> CoreResult<()> {
    let multi = results.len() > 1;
    let mut out = String::new();
    if multi {
        out.push_str("file,");
    }
    out.push_str(
        "start_frame,end_frame,start_timestamp,end_timestamp,length_frames,avg_pblack,min_pblack\n",
    );

    for result in results {
        let file = result.file_path.to_string_lossy();
        for range in &result.ranges {
            if multi {
                let _ = write!(out, "{},", csv_field(&file));
            }
            let _ = writeln!(
                out,
                "{},{},{},{},{},{},{}",
                range.start_frame,
                range.end_frame,
                range.start_time_secs.map(format_timestamp).unwrap_or_default(),
                range.end_time_secs.map(format_timestamp).unwrap_or_default(),
                range.length_frames,
                opt_f64(range.avg_pblack),
                opt_f64(range.min_pblack),
            );
        }
    }

    fs::write(path, out)?;
    info!("wrote range export to {}", path.display());
    Ok(())
}

/// Writes every range across `results` as a JSON array.
pub fn export_ranges_json(path: &Path, results: &[AnalysisResult]) -> CoreResult<()> {
    let multi = results.len() > 1;
    let mut records = Vec::new();
    let names: Vec<String> = results
        .iter()
        .map(|r| r.file_path.to_string_lossy().into_owned())
        .collect();

    for (result, name) in results.iter().zip(&names) {
        for range in &result.ranges {
            records.push(RangeRecord {
                file: multi.then_some(name.as_str()),
                start_frame: range.start_frame,
                end_frame: range.end_frame,
                start_timestamp: range.start_time_secs.map(format_timestamp),
                end_timestamp: range.end_time_secs.map(format_timestamp),
                length_frames: range.length_frames,
                avg_pblack: range.avg_pblack,
                min_pblack: range.min_pblack,
            });
        }
    }

    write_json(path, &records)
}

fn write_json<T: Serialize>(path: &Path, records: &[T]) -> CoreResult<()> {
    let json = serde_json::to_string_pretty(records)
        .map_err(|e| crate::error::CoreError::JsonParse(e.to_string()))?;
    fs::write(path, json)?;
    info!("wrote JSON export to {}", path.display());
    Ok(())
}

/// Missing numeric values become empty cells.
fn opt_f64(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.6}")).unwrap_or_default()
}

/// Quotes a CSV field only when it needs it.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{build_ranges, FrameHit};
    use crate::session::AnalysisStatus;
    use std::path::PathBuf;

    fn hit(frame: u64) -> FrameHit {
        FrameHit {
            frame,
            time_secs: Some(frame as f64 / 25.0),
            pblack: Some(99.5),
            pts: Some(frame as i64 * 512),
        }
    }

    fn result_for(path: &str, frames: &[u64]) -> AnalysisResult {
        let hits: Vec<FrameHit> = frames.iter().map(|&f| hit(f)).collect();
        let ranges = build_ranges(&hits, 1);
        AnalysisResult {
            file_path: PathBuf::from(path),
            status: AnalysisStatus::Completed,
            hits,
            ranges,
            error_detail: None,
            duration_secs: Some(10.0),
        }
    }

    #[test]
    fn single_file_csv_omits_file_column() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("frames.csv");
        export_frames_csv(&out, &[result_for("a.mkv", &[5, 6])]).unwrap();
        let text = fs::read_to_string(&out).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), "frame,time_s,timestamp,pblack,pts");
        let first = lines.next().unwrap();
        assert!(first.starts_with("5,0.200000,00:00:00.200,99.500000,2560"));
    }

    #[test]
    fn multi_file_csv_includes_file_column() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("frames.csv");
        let results = [result_for("a.mkv", &[1]), result_for("b.mkv", &[2])];
        export_frames_csv(&out, &results).unwrap();
        let text = fs::read_to_string(&out).unwrap();
        assert!(text.starts_with("file,frame,"));
        assert!(text.contains("a.mkv,1,"));
        assert!(text.contains("b.mkv,2,"));
    }

    #[test]
    fn empty_results_yield_header_only_csv_and_empty_json() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("ranges.csv");
        let json = dir.path().join("ranges.json");
        export_ranges_csv(&csv, &[]).unwrap();
        export_ranges_json(&json, &[]).unwrap();
        let csv_text = fs::read_to_string(&csv).unwrap();
        assert_eq!(csv_text.lines().count(), 1);
        assert_eq!(fs::read_to_string(&json).unwrap().trim(), "[]");
    }

    #[test]
    fn ranges_csv_carries_run_statistics() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("ranges.csv");
        export_ranges_csv(&out, &[result_for("a.mkv", &[5, 6, 7])]).unwrap();
        let text = fs::read_to_string(&out).unwrap();
        let data = text.lines().nth(1).unwrap();
        assert!(data.starts_with("5,7,"));
        assert!(data.contains(",3,"));
    }

    #[test]
    fn frames_json_uses_null_for_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("frames.json");
        let mut result = result_for("a.mkv", &[9]);
        result.hits[0].pblack = None;
        result.hits[0].pts = None;
        export_frames_json(&out, &[result]).unwrap();
        let parsed: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        let record = &parsed[0];
        assert!(record.get("file").is_none());
        assert_eq!(record["frame"], 9);
        assert!(record["pblack"].is_null());
        assert!(record["pts"].is_null());
    }

    #[test]
    fn commas_in_paths_are_quoted() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("frames.csv");
        let results = [result_for("a,b.mkv", &[1]), result_for("c.mkv", &[2])];
        export_frames_csv(&out, &results).unwrap();
        let text = fs::read_to_string(&out).unwrap();
        assert!(text.contains("\"a,b.mkv\",1,"));
    }
}
