use super::{FieldValue, Frame, FrameIndex, ResultsArchive};
use crate::error::{IvolError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Version of the JSON export layout understood by this reader
pub const ARCHIVE_FORMAT_VERSION: u32 = 1;

/// Output database exported to JSON
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArchiveDocument {
    pub format_version: u32,
    #[serde(default)]
    pub instances: Vec<String>,
    #[serde(default)]
    pub steps: Vec<StepDocument>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepDocument {
    pub name: String,
    #[serde(default)]
    pub frames: Vec<FrameDocument>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrameDocument {
    #[serde(default)]
    pub fields: BTreeMap<String, Vec<FieldValue>>,
}

impl ArchiveDocument {
    pub fn new() -> Self {
        Self {
            format_version: ARCHIVE_FORMAT_VERSION,
            ..Self::default()
        }
    }

    pub fn with_instance<S: Into<String>>(mut self, instance: S) -> Self {
        self.instances.push(instance.into());
        self
    }

    pub fn with_step(mut self, step: StepDocument) -> Self {
        self.steps.push(step);
        self
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self).map_err(|e| IvolError::Config {
            message: format!("Failed to serialize archive: {}", e),
        })?;
        fs::write(path.as_ref(), content)?;
        Ok(())
    }
}

impl StepDocument {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            frames: Vec::new(),
        }
    }

    pub fn with_frame(mut self, frame: FrameDocument) -> Self {
        self.frames.push(frame);
        self
    }
}

impl FrameDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field<S: Into<String>>(mut self, name: S, values: Vec<FieldValue>) -> Self {
        self.fields.insert(name.into(), values);
        self
    }
}

pub struct JsonArchive {
    name: String,
    path: Option<PathBuf>,
    document: Option<ArchiveDocument>,
}

impl JsonArchive {
    /// Opens an exported archive read-only
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let name = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|e| IvolError::SourceUnavailable {
            archive: name.clone(),
            reason: e.to_string(),
        })?;

        let document: ArchiveDocument =
            serde_json::from_str(&content).map_err(|e| IvolError::SourceUnavailable {
                archive: name.clone(),
                reason: format!("malformed archive: {}", e),
            })?;

        let mut archive = Self::from_document(name, document)?;
        archive.path = Some(path.to_path_buf());
        Ok(archive)
    }

    pub fn from_document<S: Into<String>>(name: S, document: ArchiveDocument) -> Result<Self> {
        let name = name.into();
        if document.format_version != ARCHIVE_FORMAT_VERSION {
            return Err(IvolError::SourceUnavailable {
                archive: name,
                reason: format!(
                    "archive format version {} does not match reader version {}",
                    document.format_version, ARCHIVE_FORMAT_VERSION
                ),
            });
        }

        Ok(Self {
            name,
            path: None,
            document: Some(document),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_open(&self) -> bool {
        self.document.is_some()
    }

    fn document(&self) -> Result<&ArchiveDocument> {
        self.document
            .as_ref()
            .ok_or_else(|| IvolError::SourceUnavailable {
                archive: self.name.clone(),
                reason: "archive has been closed".to_string(),
            })
    }
}

impl ResultsArchive for JsonArchive {
    fn name(&self) -> &str {
        &self.name
    }

    fn step_names(&self) -> Vec<String> {
        self.document
            .as_ref()
            .map(|d| d.steps.iter().map(|s| s.name.clone()).collect())
            .unwrap_or_default()
    }

    fn instance_names(&self) -> Vec<String> {
        self.document
            .as_ref()
            .map(|d| d.instances.clone())
            .unwrap_or_default()
    }

    fn frame(&self, step: &str, index: FrameIndex) -> Result<Frame> {
        let document = self.document()?;
        let step_doc = document
            .steps
            .iter()
            .find(|s| s.name == step)
            .ok_or_else(|| IvolError::UnknownStep {
                step: step.to_string(),
                archive: self.name.clone(),
                available: self.step_names(),
                conditioning: false,
            })?;

        let position = index
            .resolve(step_doc.frames.len())
            .ok_or_else(|| IvolError::MissingFrame {
                step: step.to_string(),
                archive: self.name.clone(),
                index: index.to_string(),
            })?;

        let fields = step_doc.frames[position]
            .fields
            .iter()
            .map(|(name, values)| (name.clone(), values.clone()))
            .collect();

        Ok(Frame::new(&self.name, step, fields))
    }

    fn close(&mut self) -> Result<()> {
        self.document = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_document() -> ArchiveDocument {
        ArchiveDocument::new().with_instance("PART-1-1").with_step(
            StepDocument::new("crimp-1")
                .with_frame(FrameDocument::new().with_field(
                    "IVOL",
                    vec![FieldValue::new(1, 1, vec![0.5])],
                ))
                .with_frame(FrameDocument::new().with_field(
                    "IVOL",
                    vec![FieldValue::new(1, 1, vec![0.75])],
                )),
        )
    }

    #[test]
    fn test_open_saved_archive() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("Job-1.odb");
        sample_document().save_to_file(&path).unwrap();

        let archive = JsonArchive::open(&path).unwrap();
        assert_eq!(archive.step_names(), vec!["crimp-1"]);
        assert_eq!(archive.instance_names(), vec!["PART-1-1"]);
        assert_eq!(archive.path(), Some(path.as_path()));
    }

    #[test]
    fn test_missing_file_is_source_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        let result = JsonArchive::open(temp_dir.path().join("absent.odb"));
        assert!(matches!(result, Err(IvolError::SourceUnavailable { .. })));
    }

    #[test]
    fn test_malformed_archive_is_source_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.odb");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            JsonArchive::open(&path),
            Err(IvolError::SourceUnavailable { .. })
        ));
    }

    #[test]
    fn test_version_mismatch_is_source_unavailable() {
        let mut document = sample_document();
        document.format_version = ARCHIVE_FORMAT_VERSION + 1;
        match JsonArchive::from_document("future.odb", document) {
            Err(IvolError::SourceUnavailable { reason, .. }) => {
                assert!(reason.contains("version"));
            }
            _ => panic!("expected a version mismatch"),
        }
    }

    #[test]
    fn test_first_and_last_frames() {
        let archive = JsonArchive::from_document("Job-1.odb", sample_document()).unwrap();

        let first = archive.frame("crimp-1", FrameIndex::First).unwrap();
        assert_eq!(first.field_values("IVOL").unwrap()[0].data, vec![0.5]);

        let last = archive.frame("crimp-1", FrameIndex::Last).unwrap();
        assert_eq!(last.field_values("IVOL").unwrap()[0].data, vec![0.75]);

        assert!(matches!(
            archive.frame("crimp-1", FrameIndex::At(5)),
            Err(IvolError::MissingFrame { .. })
        ));
    }

    #[test]
    fn test_step_validation_lists_catalog() {
        let archive = JsonArchive::from_document("Job-1.odb", sample_document()).unwrap();
        assert!(archive.validate_step("crimp-1", true).is_ok());

        match archive.validate_step("Crimp-1", true) {
            Err(IvolError::UnknownStep { available, conditioning, .. }) => {
                assert_eq!(available, vec!["crimp-1"]);
                assert!(conditioning);
            }
            _ => panic!("step names are case-sensitive"),
        }
    }

    #[test]
    fn test_instance_validation_accepts_assembly() {
        let archive = JsonArchive::from_document("Job-1.odb", sample_document()).unwrap();
        assert!(archive.validate_instance("PART-1-1", "ASSEMBLY").is_ok());
        assert!(archive.validate_instance("ASSEMBLY", "ASSEMBLY").is_ok());
        assert!(matches!(
            archive.validate_instance("part-1-1", "ASSEMBLY"),
            Err(IvolError::UnknownPartInstance { .. })
        ));
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut archive = JsonArchive::from_document("Job-1.odb", sample_document()).unwrap();
        archive.close().unwrap();
        archive.close().unwrap();
        assert!(!archive.is_open());
        assert!(matches!(
            archive.frame("crimp-1", FrameIndex::Last),
            Err(IvolError::SourceUnavailable { .. })
        ));
    }
}
