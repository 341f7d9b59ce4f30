pub mod archive;
pub mod cli;
pub mod config;
pub mod derive;
pub mod error;
pub mod extractor;
pub mod report;
pub mod ui;

// Public API re-exports
pub use archive::{ArchiveSession, FieldValue, Frame, FrameIndex, JsonArchive, ResultsArchive};
pub use cli::{Cli, OutputFormat, RunParameters};
pub use config::{CliOverrides, Config, FieldConfig, OutputConfig};
pub use error::{IvolError, Result, UserFriendlyError};

pub use derive::{derive_table, DerivedRow, DerivedTable, Summary};
pub use extractor::{ConfirmOverwrite, FixedDecision, FrameSamples, OutputManager, OverwriteDecision, TerminalPrompt};
pub use report::TableWriter;
pub use ui::{GracefulShutdown, OutputFormatter, OutputMode, ProgressManager};

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Outcome of a completed extraction, printed as JSON in `--output-format json`
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub odb: String,
    pub old_odb: String,
    pub part_instance: String,
    pub crimp_step: String,
    pub last_step: String,
    pub output: PathBuf,
    pub summary: Summary,
    pub duration: Duration,
    pub completed_at: DateTime<Utc>,
}

/// The pre-conditioning, loading and unloading frames of one run
pub struct CycleFrames {
    pub pre: FrameSamples,
    pub load: FrameSamples,
    pub unload: FrameSamples,
}

/// Main library interface for ivol
pub struct IvolResults {
    config: Config,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
    shutdown: GracefulShutdown,
}

impl IvolResults {
    pub fn new(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Result<Self> {
        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        let progress_manager = ProgressManager::new(!quiet && output_mode == OutputMode::Human);
        let shutdown = GracefulShutdown::new()?;

        Ok(Self {
            config,
            output_formatter,
            progress_manager,
            shutdown,
        })
    }

    /// Same as `new` without installing a Ctrl-C handler
    pub fn new_for_test(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        Self {
            config,
            output_formatter: OutputFormatter::new(output_mode, verbose, quiet),
            progress_manager: ProgressManager::new(false),
            shutdown: GracefulShutdown::new_for_test(),
        }
    }

    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let config = cli_args.load_config()?;
        Self::new(
            config,
            cli_args.output_mode(),
            cli_args.verbosity_level(),
            cli_args.quiet,
        )
    }

    /// Output manager for the requested or default results file
    pub fn output_manager(&self, params: &RunParameters) -> OutputManager {
        let target = params.output.clone().unwrap_or_else(|| {
            OutputManager::default_output_path(
                &params.odb,
                &self.config.archive.extension,
                &self.config.output,
            )
        });
        OutputManager::new(target).with_force_overwrite(params.overwrite)
    }

    pub fn resolve_output(
        &self,
        params: &RunParameters,
        prompt: &mut dyn ConfirmOverwrite,
    ) -> Result<PathBuf> {
        let mut manager = self.output_manager(params);
        let target = manager.resolve_target(prompt)?;
        if target.exists() {
            self.output_formatter
                .warning(&format!("The file {} will be overwritten", target.display()));
        }
        Ok(target)
    }

    /// Opens the archives and checks every step and part-instance name
    pub fn open_session(&self, params: &RunParameters) -> Result<ArchiveSession> {
        let session = ArchiveSession::open(params.odb.as_path(), params.old_odb.as_deref())?;
        self.output_formatter.debug(&format!(
            "Steps in {}: {}",
            session.primary().name(),
            session.primary().step_names().join(", ")
        ));

        session.validate(
            &params.part_instance,
            &params.crimp_step,
            &params.last_step,
            &self.config.archive.assembly_sentinel,
        )?;
        Ok(session)
    }

    pub fn read_frames(&self, session: &ArchiveSession, params: &RunParameters) -> Result<CycleFrames> {
        let spinner = self.progress_manager.create_spinner("Reading field outputs");
        let fields = &self.config.fields;

        let frames = CycleFrames {
            pre: FrameSamples::read(session.conditioning(), &params.crimp_step, FrameIndex::Last, fields)?,
            load: FrameSamples::read(session.primary(), &params.last_step, FrameIndex::First, fields)?,
            unload: FrameSamples::read(session.primary(), &params.last_step, FrameIndex::Last, fields)?,
        };
        spinner.finish_and_clear();

        for samples in [&frames.load, &frames.unload] {
            if samples.len() == frames.pre.len() && samples.labels != frames.pre.labels {
                self.output_formatter.warning(&format!(
                    "Integration points in {} are ordered differently from {}; rows are matched by position",
                    samples.label, frames.pre.label
                ));
            }
        }

        self.output_formatter.info(&format!(
            "Read {} integration points from {}",
            frames.pre.len(),
            frames.pre.label
        ));
        Ok(frames)
    }

    /// Releases the archives; a secondary archive that fails to close is
    /// reported as a warning
    pub fn close_session(&self, session: &mut ArchiveSession) -> Result<()> {
        if let Some(error) = session.close()? {
            self.output_formatter.warning(&format!(
                "Failed to close {}: {}",
                session.conditioning().name(),
                error
            ));
        }
        Ok(())
    }

    pub fn derive(&self, frames: &CycleFrames) -> Result<DerivedTable> {
        let start = Instant::now();
        let progress = self
            .progress_manager
            .create_row_progress(frames.pre.len() as u64, "deriving");
        let callback = |rows: usize| progress.set_position(rows as u64);

        let table = derive_table(&frames.pre, &frames.load, &frames.unload, Some(&callback))?;

        ui::progress::finish_progress_with_summary(
            &progress,
            &format!("Derived {} rows", table.summary.n_rows),
            start.elapsed(),
        );
        Ok(table)
    }

    /// Writes the table to `output_path`; an interrupt before the file is
    /// moved into place leaves nothing behind
    pub fn write_table(&self, params: &RunParameters, table: &DerivedTable, output_path: &Path) -> Result<()> {
        let primary = params.odb.display().to_string();
        let conditioning = params.conditioning_odb().display().to_string();
        let progress = self
            .progress_manager
            .create_row_progress(table.rows.len() as u64, "writing");
        let callback = |rows: usize| progress.set_position(rows as u64);

        OutputManager::new(output_path).write_atomically(|writer| {
            TableWriter::new(writer).write_table(&primary, &conditioning, table, Some(&callback))?;
            self.shutdown.check_shutdown()
        })?;
        progress.finish_and_clear();

        self.output_formatter.print_summary_block(&report::summary_block(
            &primary,
            &conditioning,
            &table.summary,
        ));
        Ok(())
    }

    /// open, validate, read, derive, write, close
    pub fn run(&self, params: &RunParameters, output_path: &Path) -> Result<RunReport> {
        let start_time = Instant::now();
        self.output_formatter.start_operation(&format!(
            "Extracting results from {}",
            params.odb.display()
        ));

        let mut session = self.shutdown.stage(|| self.open_session(params))?;
        let frames = self.shutdown.stage(|| self.read_frames(&session, params))?;
        let table = self.shutdown.stage(|| self.derive(&frames))?;
        self.shutdown.check_shutdown()?;
        self.write_table(params, &table, output_path)?;
        self.close_session(&mut session)?;

        Ok(RunReport {
            odb: params.odb.display().to_string(),
            old_odb: params.conditioning_odb().display().to_string(),
            part_instance: params.part_instance.clone(),
            crimp_step: params.crimp_step.clone(),
            last_step: params.last_step.clone(),
            output: output_path.to_path_buf(),
            summary: table.summary,
            duration: start_time.elapsed(),
            completed_at: Utc::now(),
        })
    }

    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        let sample_config = Config::create_sample_config();
        std::fs::write(output_path.as_ref(), sample_config)?;
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    pub fn request_shutdown(&self) {
        self.shutdown.request_shutdown();
    }

    pub fn handle_error(&self, error: &IvolError) {
        self.output_formatter.print_user_friendly_error(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::{ArchiveDocument, FrameDocument, StepDocument};
    use tempfile::TempDir;

    fn point(values: &[f64]) -> Vec<FieldValue> {
        vec![FieldValue::new(1, 1, values.to_vec())]
    }

    fn frame(strain: f64, stress: f64) -> FrameDocument {
        FrameDocument::new()
            .with_field("LE", point(&[strain, 0.0, 0.0, 0.0]))
            .with_field("S", point(&[stress, 0.0, 0.0, 0.0]))
            .with_field("IVOL", point(&[2.0]))
            .with_field("SDV21", point(&[0.5]))
    }

    fn write_archive(dir: &Path) -> PathBuf {
        let path = dir.join("Job-2.odb");
        ArchiveDocument::new()
            .with_instance("PART-1-1")
            .with_step(StepDocument::new("crimp-1").with_frame(frame(0.05, 500.0)))
            .with_step(
                StepDocument::new("unload-3")
                    .with_frame(frame(0.04, 400.0))
                    .with_frame(frame(0.02, 100.0)),
            )
            .save_to_file(&path)
            .unwrap();
        path
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
    fn test_run_writes_results() {
        let temp_dir = TempDir::new().unwrap();
        let ivol = IvolResults::new_for_test(Config::default(), OutputMode::Plain, 0, true);
        let params = params(write_archive(temp_dir.path()));

        let target = ivol.resolve_output(&params, &mut FixedDecision(OverwriteDecision::Abort)).unwrap();
        assert_eq!(target, temp_dir.path().join("Job-2.ivol.csv"));

        let report = ivol.run(&params, &target).unwrap();
        assert_eq!(report.summary.n_rows, 1);
        assert_eq!(report.summary.v_total, 2.0);
        assert!((report.summary.cyc_em_max - 0.03).abs() < 1e-12);
        assert!(target.exists());
    }

    #[test]
    fn test_cancelled_run_leaves_no_file() {
        let temp_dir = TempDir::new().unwrap();
        let ivol = IvolResults::new_for_test(Config::default(), OutputMode::Plain, 0, true);
        let params = params(write_archive(temp_dir.path()));
        let target = temp_dir.path().join("Job-2.ivol.csv");

        ivol.request_shutdown();
        assert!(matches!(ivol.run(&params, &target), Err(IvolError::Cancelled)));
        assert!(!target.exists());
    }

    #[test]
    fn test_sample_config_generation() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("ivol.toml");

        IvolResults::generate_sample_config(&config_path).unwrap();
        let content = std::fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("[fields]"));
        assert!(content.contains("[archive]"));
        assert!(content.contains("[output]"));
    }
}
