use crate::error::{IvolError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub fields: FieldConfig,
    pub archive: ArchiveConfig,
    pub output: OutputConfig,
}

/// Names of the field outputs read from every frame
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FieldConfig {
    pub strain: String,
    pub stress: String,
    pub volume: String,
    pub phase_fraction: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ArchiveConfig {
    pub extension: String,
    pub assembly_sentinel: String,
    pub uppercase_instance: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    pub suffix: String,
    pub directory: Option<PathBuf>,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            strain: "LE".to_string(),
            stress: "S".to_string(),
            volume: "IVOL".to_string(),
            phase_fraction: "SDV21".to_string(),
        }
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            extension: ".odb".to_string(),
            assembly_sentinel: "ASSEMBLY".to_string(),
            uppercase_instance: true,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            suffix: ".ivol.csv".to_string(),
            directory: None, // next to the primary archive
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(IvolError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| IvolError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| IvolError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        Ok(config)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_paths = ["ivol.toml", ".ivol.toml"];

                for default_path in &default_paths {
                    if Path::new(default_path).exists() {
                        return Self::load_from_file(default_path);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    pub fn merge_with_cli_args(&mut self, cli_args: &CliOverrides) {
        if let Some(ref phase_field) = cli_args.phase_field {
            self.fields.phase_fraction = phase_field.clone();
        }

        if let Some(ref output_dir) = cli_args.output_dir {
            self.output.directory = Some(output_dir.clone());
        }
    }

    pub fn validate(&self) -> Result<()> {
        let field_names = [
            ("strain", &self.fields.strain),
            ("stress", &self.fields.stress),
            ("volume", &self.fields.volume),
            ("phase_fraction", &self.fields.phase_fraction),
        ];
        for (key, value) in field_names {
            if value.trim().is_empty() {
                return Err(IvolError::Config {
                    message: format!("Field output name '{}' must not be empty", key),
                });
            }
        }

        if !self.archive.extension.starts_with('.') || self.archive.extension.len() < 2 {
            return Err(IvolError::Config {
                message: format!(
                    "Archive extension must start with a dot: '{}'",
                    self.archive.extension
                ),
            });
        }

        if self.archive.assembly_sentinel.is_empty() {
            return Err(IvolError::Config {
                message: "Assembly sentinel must not be empty".to_string(),
            });
        }

        if self.output.suffix.is_empty() {
            return Err(IvolError::Config {
                message: "Output suffix must not be empty".to_string(),
            });
        }

        if let Some(ref directory) = self.output.directory {
            if !directory.is_dir() {
                return Err(IvolError::Config {
                    message: format!("Output directory does not exist: {}", directory.display()),
                });
            }
        }

        Ok(())
    }

    pub fn create_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config).unwrap_or_else(|_| String::new())
    }
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub phase_field: Option<String>,
    pub output_dir: Option<PathBuf>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_phase_field(mut self, phase_field: Option<String>) -> Self {
        self.phase_field = phase_field;
        self
    }

    pub fn with_output_dir(mut self, output_dir: Option<PathBuf>) -> Self {
        self.output_dir = output_dir;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.fields.strain, "LE");
        assert_eq!(config.fields.phase_fraction, "SDV21");
        assert_eq!(config.archive.extension, ".odb");
        assert_eq!(config.archive.assembly_sentinel, "ASSEMBLY");
        assert_eq!(config.output.suffix, ".ivol.csv");
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.fields.volume.clear();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.archive.extension = "odb".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_output_directory_is_rejected() {
        let mut config = Config::default();
        config.output.directory = Some(PathBuf::from("/definitely/not/here"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_file_operations() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), "[fields]\nphase_fraction = \"SDV7\"\n").unwrap();

        let loaded_config = Config::load_from_file(temp_file.path()).unwrap();
        assert_eq!(loaded_config.fields.phase_fraction, "SDV7");
        assert_eq!(loaded_config.archive.extension, ".odb");
    }

    #[test]
    fn test_missing_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = Config::load_from_file(temp_dir.path().join("absent.toml"));
        assert!(matches!(result, Err(IvolError::Config { .. })));
    }

    #[test]
    fn test_cli_overrides() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();

        let overrides = CliOverrides::new()
            .with_phase_field(Some("SDV3".to_string()))
            .with_output_dir(Some(temp_dir.path().to_path_buf()));

        config.merge_with_cli_args(&overrides);

        assert_eq!(config.fields.phase_fraction, "SDV3");
        assert_eq!(config.output.directory.as_deref(), Some(temp_dir.path()));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sample_config_generation() {
        let sample = Config::create_sample_config();
        assert!(sample.contains("[fields]"));
        assert!(sample.contains("[archive]"));
        assert!(sample.contains("[output]"));
    }
}
