use crate::config::{CliOverrides, Config};
use crate::error::{IvolError, Result};
use crate::ui::OutputMode;
use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ivol")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Extract volumetric strain and stress results from FE output databases")]
#[command(
    long_about = "ivol reads a pre-conditioning frame and one fatigue cycle from an output \
                  database and writes mean, amplitude, pre-strain and volume results for every \
                  integration point to a CSV file named after the archive (Job-2.odb becomes \
                  Job-2.ivol.csv). Field outputs LE, S, SDV and IVOL must be present."
)]
#[command(after_help = "EXAMPLES:\n  \
    ivol --odb Job-2 --part-instance PART-1-1 --crimp-step crimp-1 --last-step unload-3\n  \
    ivol --odb Job-2 --old-odb Job-1 --part-instance part-1-1 --crimp-step crimp-1 --last-step unload-3 --overwrite yes\n  \
    ivol -od Job-2 -pa PART-1-1 -cr crimp-1 -la unload-3 -ov yes\n\n\
    Arguments starting with -od, -ol, -pa, -cr, -la, -ov and -he are accepted as\n  \
    abbreviations of the long options.")]
pub struct Cli {
    /// Output database with the cyclic results
    #[arg(long, value_name = "NAME")]
    pub odb: Option<String>,

    /// Output database with the pre-conditioning results, when separate
    #[arg(long, value_name = "NAME")]
    pub old_odb: Option<String>,

    /// Part instance name (ASSEMBLY selects the whole assembly)
    #[arg(long, value_name = "NAME")]
    pub part_instance: Option<String>,

    /// Pre-conditioning (crimping) step
    #[arg(long, value_name = "STEP")]
    pub crimp_step: Option<String>,

    /// Final unloading step of the fatigue cycle
    #[arg(long, value_name = "STEP")]
    pub last_step: Option<String>,

    /// Overwrite an existing output file (Y, y, Yes, yes, T, True, TRUE)
    #[arg(long, value_name = "PREF", num_args = 0..=1, default_missing_value = "yes")]
    pub overwrite: Option<String>,

    /// Output file (defaults to <odb>.ivol.csv)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Directory for the default output file
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Configuration file path
    #[arg(long, help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Field output holding the martensite volume fraction
    #[arg(long, value_name = "FIELD")]
    pub phase_field: Option<String>,

    /// Output format for messages and the final report
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Verbose output level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Validate archives and names without writing the results file
    #[arg(long)]
    pub dry_run: bool,

    /// Generate sample configuration file
    #[arg(long, help = "Generate a sample configuration file")]
    pub generate_config: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

/// Inputs of one extraction run after defaults and normalization
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunParameters {
    pub odb: PathBuf,
    pub old_odb: Option<PathBuf>,
    pub part_instance: String,
    pub crimp_step: String,
    pub last_step: String,
    pub overwrite: bool,
    pub output: Option<PathBuf>,
}

impl RunParameters {
    /// Archive holding the pre-conditioning step
    pub fn conditioning_odb(&self) -> &PathBuf {
        self.old_odb.as_ref().unwrap_or(&self.odb)
    }
}

pub const OVERWRITE_POSITIVE: &[&str] = &["Y", "y", "Yes", "yes", "T", "True", "TRUE"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyFlag {
    Odb,
    OldOdb,
    PartInstance,
    CrimpStep,
    LastStep,
    Overwrite,
    Help,
}

impl LegacyFlag {
    /// Matches single-dash arguments on their first three characters
    pub fn from_prefix(arg: &str) -> Option<Self> {
        if arg.starts_with("--") {
            return None;
        }
        match arg.get(..3)? {
            "-od" => Some(LegacyFlag::Odb),
            "-ol" => Some(LegacyFlag::OldOdb),
            "-pa" => Some(LegacyFlag::PartInstance),
            "-cr" => Some(LegacyFlag::CrimpStep),
            "-la" => Some(LegacyFlag::LastStep),
            "-ov" => Some(LegacyFlag::Overwrite),
            "-he" => Some(LegacyFlag::Help),
            _ => None,
        }
    }

    pub fn long_flag(&self) -> &'static str {
        match self {
            LegacyFlag::Odb => "--odb",
            LegacyFlag::OldOdb => "--old-odb",
            LegacyFlag::PartInstance => "--part-instance",
            LegacyFlag::CrimpStep => "--crimp-step",
            LegacyFlag::LastStep => "--last-step",
            LegacyFlag::Overwrite => "--overwrite",
            LegacyFlag::Help => "--help",
        }
    }
}

/// Rewrites legacy abbreviations such as `-odbName` to their long options.
/// The program name and everything after `--` pass through untouched, as
/// does anything unrecognized so the parser can reject it.
pub fn normalize_legacy_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut normalized = Vec::new();
    let mut passthrough = false;

    for (i, arg) in args.into_iter().enumerate() {
        let arg = arg.into();
        if i == 0 || passthrough {
            normalized.push(arg);
            continue;
        }

        match arg.to_str() {
            Some("--") => {
                passthrough = true;
                normalized.push(arg);
            }
            Some(text) => match LegacyFlag::from_prefix(text) {
                Some(flag) => normalized.push(OsString::from(flag.long_flag())),
                None => normalized.push(arg),
            },
            None => normalized.push(arg),
        }
    }

    normalized
}

pub fn parse_overwrite_preference(preference: Option<&str>) -> bool {
    preference.is_some_and(|p| OVERWRITE_POSITIVE.contains(&p.trim()))
}

fn with_extension(name: &str, extension: &str) -> PathBuf {
    if name.ends_with(extension) {
        PathBuf::from(name)
    } else {
        PathBuf::from(format!("{}{}", name, extension))
    }
}

impl Cli {
    /// Parses the process arguments after legacy normalization
    pub fn parse_normalized() -> Self {
        Self::parse_from(normalize_legacy_args(std::env::args_os()))
    }

    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_with_defaults(self.config.as_ref())?;

        let overrides = self.create_cli_overrides();
        config.merge_with_cli_args(&overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn create_cli_overrides(&self) -> CliOverrides {
        CliOverrides::new()
            .with_phase_field(self.phase_field.clone())
            .with_output_dir(self.output_dir.clone())
    }

    /// Checks the required inputs in the order they are listed in usage
    pub fn run_parameters(&self, config: &Config) -> Result<RunParameters> {
        let odb = require(&self.odb, "--odb")?;
        let part_instance = require(&self.part_instance, "--part-instance")?;
        let crimp_step = require(&self.crimp_step, "--crimp-step")?;
        let last_step = require(&self.last_step, "--last-step")?;

        let extension = &config.archive.extension;
        let part_instance = if config.archive.uppercase_instance {
            part_instance.to_uppercase()
        } else {
            part_instance.to_string()
        };

        Ok(RunParameters {
            odb: with_extension(odb, extension),
            old_odb: self.old_odb.as_deref().map(|name| with_extension(name, extension)),
            part_instance,
            crimp_step: crimp_step.to_string(),
            last_step: last_step.to_string(),
            overwrite: parse_overwrite_preference(self.overwrite.as_deref()),
            output: self.output.clone(),
        })
    }

    pub fn output_mode(&self) -> OutputMode {
        match self.output_format {
            OutputFormat::Human => OutputMode::Human,
            OutputFormat::Json => OutputMode::Json,
            OutputFormat::Plain => OutputMode::Plain,
        }
    }

    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }
}

fn require<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str> {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(IvolError::MissingArgument {
            name: name.to_string(),
        }),
    }
}
