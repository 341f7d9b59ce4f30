#![allow(dead_code)]

use ivol::archive::{ArchiveDocument, FrameDocument, StepDocument};
use ivol::FieldValue;
use std::path::{Path, PathBuf};

/// Integration points in archive order (deliberately unsorted)
pub const POINTS: [(i64, i64); 2] = [(12, 1), (7, 4)];

fn field<F>(points: &[(i64, i64)], data: F) -> Vec<FieldValue>
where
    F: Fn(usize) -> Vec<f64>,
{
    points
        .iter()
        .enumerate()
        .map(|(i, &(element, ip))| FieldValue::new(element, ip, data(i)))
        .collect()
}

/// Uniaxial frame: strain along 1 with lateral contraction, stress along 1
pub fn frame_at(points: &[(i64, i64)], strain_11: f64, stress_11: f64) -> FrameDocument {
    FrameDocument::new()
        .with_field(
            "LE",
            field(points, |_| vec![strain_11, -0.3 * strain_11, -0.3 * strain_11, 0.0]),
        )
        .with_field("S", field(points, |_| vec![stress_11, 0.0, 0.0, 0.0]))
        .with_field("IVOL", field(points, |i| vec![0.5 + i as f64]))
        .with_field("SDV21", field(points, |_| vec![0.2]))
}

pub fn frame(strain_11: f64, stress_11: f64) -> FrameDocument {
    frame_at(&POINTS, strain_11, stress_11)
}

pub fn crimp_step() -> StepDocument {
    StepDocument::new("crimp-1")
        .with_frame(frame(0.0, 0.0))
        .with_frame(frame(0.05, 500.0))
}

pub fn cycle_step() -> StepDocument {
    StepDocument::new("unload-3")
        .with_frame(frame(0.04, 400.0))
        .with_frame(frame(0.02, 100.0))
}

/// `Job-2.odb` holding both the crimp and the cyclic step
pub fn single_job(dir: &Path) -> PathBuf {
    let path = dir.join("Job-2.odb");
    ArchiveDocument::new()
        .with_instance("PART-1-1")
        .with_step(crimp_step())
        .with_step(cycle_step())
        .save_to_file(&path)
        .unwrap();
    path
}

/// `Job-1.odb` with the crimp step, `Job-2.odb` with the cyclic step
pub fn split_jobs(dir: &Path) -> (PathBuf, PathBuf) {
    let conditioning = dir.join("Job-1.odb");
    ArchiveDocument::new()
        .with_instance("PART-1-1")
        .with_step(crimp_step())
        .save_to_file(&conditioning)
        .unwrap();

    let primary = dir.join("Job-2.odb");
    ArchiveDocument::new()
        .with_instance("PART-1-1")
        .with_step(cycle_step())
        .save_to_file(&primary)
        .unwrap();

    (primary, conditioning)
}

pub struct ParsedTable {
    pub summary: Vec<String>,
    pub header: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl ParsedTable {
    pub fn value(&self, row: usize, column: &str) -> f64 {
        let index = self
            .header
            .iter()
            .position(|name| name == column)
            .unwrap_or_else(|| panic!("no column {}", column));
        self.rows[row][index]
    }
}

pub fn read_table(path: &Path) -> ParsedTable {
    let text = std::fs::read_to_string(path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    let header_index = lines
        .iter()
        .position(|line| line.starts_with("el, ip, "))
        .expect("header line");

    ParsedTable {
        summary: lines[..8].iter().map(|l| l.to_string()).collect(),
        header: lines[header_index].split(", ").map(str::to_string).collect(),
        rows: lines[header_index + 1..]
            .iter()
            .map(|line| line.split(", ").map(|v| v.parse().unwrap()).collect())
            .collect(),
    }
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {}, got {}",
        expected,
        actual
    );
}
