mod common;

use common::*;
use ivol::archive::{ArchiveDocument, StepDocument};
use ivol::{
    Config, ConfirmOverwrite, FixedDecision, IvolError, IvolResults, OutputMode,
    OverwriteDecision, Result, RunParameters,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn quiet_run(config: Config) -> IvolResults {
    IvolResults::new_for_test(config, OutputMode::Plain, 0, true)
}

fn params(odb: PathBuf) -> RunParameters {
    RunParameters {
        odb,
        old_odb: None,
        part_instance: "PART-1-1".to_string(),
        crimp_step: "crimp-1".to_string(),
        last_step: "unload-3".to_string(),
        overwrite: false,
        output: None,
    }
}

#[test]
fn cycle_scenario_produces_expected_columns() {
    let temp_dir = TempDir::new().unwrap();
    let ivol = quiet_run(Config::default());
    let params = params(single_job(temp_dir.path()));

    let target = ivol
        .resolve_output(&params, &mut FixedDecision(OverwriteDecision::Abort))
        .unwrap();
    let report = ivol.run(&params, &target).unwrap();
    let table = read_table(&target);

    assert_eq!(table.header.len(), 36);
    assert_eq!(table.rows.len(), 2);
    assert_eq!(report.summary.n_rows, 2);

    // rows keep archive order
    assert_eq!(table.value(0, "el"), 12.0);
    assert_eq!(table.value(0, "ip"), 1.0);
    assert_eq!(table.value(1, "el"), 7.0);
    assert_eq!(table.value(1, "ip"), 4.0);

    for row in 0..2 {
        assert_close(table.value(row, "cycEM"), 0.03);
        assert_close(table.value(row, "cycEA"), 0.01);
        assert_close(table.value(row, "ldE"), 0.04);
        assert_close(table.value(row, "ulE"), 0.02);
        assert_close(table.value(row, "preE"), 0.05);
        assert_close(table.value(row, "preS"), 500.0);
        assert_close(table.value(row, "ldS"), 400.0);
        assert_close(table.value(row, "cycSM"), 250.0);
        assert_close(table.value(row, "cycSA"), 150.0);
        assert_close(table.value(row, "preM"), 0.2);
        assert_close(table.value(row, "ulE11"), 0.02);
        assert_close(table.value(row, "ulE22"), -0.006);
        assert_close(table.value(row, "ulE33"), -0.006);
    }

    assert_close(report.summary.v_total, 2.0);
    assert_close(table.value(0, "preV") + table.value(1, "preV"), report.summary.v_total);
    assert_close(report.summary.cyc_em_max, 0.03);
    assert_close(report.summary.cyc_ea_max, 0.01);

    assert!(table.summary[2].ends_with(&format!("= {}", params.odb.display())));
    assert!(table.summary[3].ends_with(&format!("= {}", params.odb.display())));
}

#[test]
fn separate_conditioning_archive() {
    let temp_dir = TempDir::new().unwrap();
    let (primary, conditioning) = split_jobs(temp_dir.path());
    let ivol = quiet_run(Config::default());
    let params = RunParameters {
        old_odb: Some(conditioning.clone()),
        ..params(primary)
    };

    let target = temp_dir.path().join("Job-2.ivol.csv");
    let report = ivol.run(&params, &target).unwrap();
    assert_eq!(report.old_odb, conditioning.display().to_string());

    let table = read_table(&target);
    assert!(table.summary[3].contains("Job-1.odb"));
    assert_close(table.value(0, "preE"), 0.05);
}

#[test]
fn unknown_conditioning_step_lists_catalog_and_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let ivol = quiet_run(Config::default());
    let params = RunParameters {
        crimp_step: "crimp-2".to_string(),
        ..params(single_job(temp_dir.path()))
    };
    let target = temp_dir.path().join("Job-2.ivol.csv");

    match ivol.run(&params, &target) {
        Err(IvolError::UnknownStep { step, available, conditioning, .. }) => {
            assert_eq!(step, "crimp-2");
            assert_eq!(available, vec!["crimp-1".to_string(), "unload-3".to_string()]);
            assert!(conditioning);
        }
        other => panic!("unexpected result: {:?}", other.map(|r| r.summary)),
    }
    assert!(!target.exists());
}

#[test]
fn unknown_part_instance_and_assembly_sentinel() {
    let temp_dir = TempDir::new().unwrap();
    let ivol = quiet_run(Config::default());
    let odb = single_job(temp_dir.path());
    let target = temp_dir.path().join("Job-2.ivol.csv");

    let missing = RunParameters {
        part_instance: "PART-9".to_string(),
        ..params(odb.clone())
    };
    assert!(matches!(
        ivol.run(&missing, &target),
        Err(IvolError::UnknownPartInstance { .. })
    ));
    assert!(!target.exists());

    let assembly = RunParameters {
        part_instance: "ASSEMBLY".to_string(),
        ..params(odb)
    };
    assert!(ivol.run(&assembly, &target).is_ok());
}

#[test]
fn misaligned_frames_are_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("Job-2.odb");
    ArchiveDocument::new()
        .with_instance("PART-1-1")
        .with_step(crimp_step())
        .with_step(
            StepDocument::new("unload-3")
                .with_frame(frame_at(&POINTS[..1], 0.04, 400.0))
                .with_frame(frame(0.02, 100.0)),
        )
        .save_to_file(&path)
        .unwrap();

    let ivol = quiet_run(Config::default());
    let target = temp_dir.path().join("Job-2.ivol.csv");
    assert!(matches!(
        ivol.run(&params(path), &target),
        Err(IvolError::FrameMismatch { expected: 2, found: 1, .. })
    ));
    assert!(!target.exists());
}

#[test]
fn phase_fraction_field_is_configurable() {
    let temp_dir = TempDir::new().unwrap();
    let odb = single_job(temp_dir.path());
    let target = temp_dir.path().join("Job-2.ivol.csv");

    let mut config = Config::default();
    config.fields.phase_fraction = "SDV5".to_string();
    match quiet_run(config).run(&params(odb), &target) {
        Err(IvolError::MissingFieldOutput { field, step, .. }) => {
            assert_eq!(field, "SDV5");
            assert_eq!(step, "crimp-1");
        }
        other => panic!("unexpected result: {:?}", other.map(|r| r.summary)),
    }
}

/// Answers "no" to the overwrite question, then supplies a new name
struct DeclineAndRename {
    new_name: PathBuf,
    asked: usize,
}

impl ConfirmOverwrite for DeclineAndRename {
    fn confirm(&mut self, _path: &Path) -> Result<OverwriteDecision> {
        self.asked += 1;
        Ok(OverwriteDecision::Rename(self.new_name.clone()))
    }
}

#[test]
fn negative_answer_writes_to_alternate_name() {
    let temp_dir = TempDir::new().unwrap();
    let ivol = quiet_run(Config::default());
    let params = params(single_job(temp_dir.path()));

    let existing = temp_dir.path().join("Job-2.ivol.csv");
    fs::write(&existing, "keep me").unwrap();
    let alternate = temp_dir.path().join("second-run.csv");

    let mut prompt = DeclineAndRename {
        new_name: alternate.clone(),
        asked: 0,
    };
    let target = ivol.resolve_output(&params, &mut prompt).unwrap();
    assert_eq!(target, alternate);
    assert_eq!(prompt.asked, 1);

    ivol.run(&params, &target).unwrap();
    assert_eq!(fs::read_to_string(&existing).unwrap(), "keep me");
    assert_eq!(read_table(&alternate).rows.len(), 2);
}

#[test]
fn overwrite_preference_replaces_existing_file() {
    let temp_dir = TempDir::new().unwrap();
    let ivol = quiet_run(Config::default());
    let params = RunParameters {
        overwrite: true,
        ..params(single_job(temp_dir.path()))
    };

    let existing = temp_dir.path().join("Job-2.ivol.csv");
    fs::write(&existing, "stale").unwrap();

    let target = ivol
        .resolve_output(&params, &mut FixedDecision(OverwriteDecision::Abort))
        .unwrap();
    ivol.run(&params, &target).unwrap();
    assert_eq!(read_table(&existing).rows.len(), 2);
}
