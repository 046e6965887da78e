use std::fmt::Write as _;
use std::path::PathBuf;

use course_stats_analysis::CourseStudy;
use course_stats_cli::{load_dataset, read_records, render_json, render_text, FullReport};
use course_stats_core::AnalysisConfig;
use tempfile::TempDir;

const HEADER: &str = "User_ID,Age,Time_Spent_Hours,Completed,Course_Type,Device_Used\n";
const COURSES: [&str; 5] = ["Arts", "Business", "Health", "Science", "Technology"];
const DEVICES: [&str; 3] = ["Desktop", "Mobile", "Tablet"];

fn sample_csv(rows: usize) -> String {
    let mut csv = HEADER.to_string();
    for i in 0..rows {
        let completed = (i * 31 + 7) % 11 < 5;
        let base = 10.0 + ((i * 37) % 100) as f64 / 10.0;
        let time = if i == 5 {
            -4.75
        } else if completed {
            base + 2.0
        } else {
            base
        };
        writeln!(
            csv,
            "{},{},{},{},{},{}",
            i + 1,
            18 + (i * 7) % 42,
            time,
            if completed { "Yes" } else { "No" },
            COURSES[i % 5],
            DEVICES[(i / 2) % 3]
        )
        .unwrap();
    }
    csv
}

/// Creates a temp directory and returns the path of a CSV file inside it.
fn temp_csv(name: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(name);
    (dir, path)
}

#[test]
fn reads_records_with_the_standard_header() {
    let records = read_records(sample_csv(3).as_bytes()).unwrap();

    assert_eq!(records.len(), 3);
    assert_eq!(records[0].user_id, 1);
    assert_eq!(records[0].age, 18);
    assert!((records[0].time_spent_hours - 10.0).abs() < 1e-9);
    assert_eq!(records[0].course_type, "Arts");
    assert_eq!(records[2].device_used, "Mobile");
}

#[test]
fn malformed_row_reports_its_position() {
    let csv = format!("{HEADER}1,20,3.5,Yes,Arts,Mobile\n2,twenty,3.5,No,Arts,Mobile\n");
    let err = read_records(csv.as_bytes()).unwrap_err();
    assert!(err.to_string().contains("row 2"));
}

#[test]
fn missing_file_is_an_error() {
    let (_dir, path) = temp_csv("does-not-exist.csv");
    assert!(load_dataset(&path).is_err());
}

#[test]
fn header_only_file_is_rejected() {
    let (_dir, path) = temp_csv("header-only.csv");
    std::fs::write(&path, HEADER).unwrap();
    let err = load_dataset(&path).unwrap_err();
    assert!(err.to_string().contains("empty"));
}

#[test]
fn duplicate_user_ids_are_rejected() {
    let (_dir, path) = temp_csv("duplicates.csv");
    let csv = format!("{HEADER}7,20,3.5,Yes,Arts,Mobile\n7,31,4.0,No,Health,Tablet\n");
    std::fs::write(&path, csv).unwrap();
    let err = load_dataset(&path).unwrap_err();
    assert!(err.to_string().contains("User_ID"), "{err}");
}

#[test]
fn loaded_file_renders_as_text_and_json() {
    let (_dir, path) = temp_csv("courses.csv");
    std::fs::write(&path, sample_csv(200)).unwrap();

    let dataset = load_dataset(&path).unwrap();
    assert_eq!(dataset.len(), 200);

    let study = CourseStudy::run(&dataset, &AnalysisConfig::default()).unwrap();
    let report = FullReport {
        study,
        robustness: None,
    };

    let text = render_text(&report);
    assert!(text.contains("COURSE COMPLETION STATISTICS"));
    assert!(text.contains("Rejected:              1 (0.50%)"));
    assert!(!text.contains("Robustness"));

    let json: serde_json::Value = serde_json::from_str(&render_json(&report).unwrap()).unwrap();
    assert_eq!(json["study"]["cleaning"]["original_len"], 200);
    assert!(json["robustness"].is_null());
}
