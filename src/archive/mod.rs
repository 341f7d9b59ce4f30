pub mod json_archive;
pub mod session;

pub use json_archive::{ArchiveDocument, FrameDocument, JsonArchive, StepDocument, ARCHIVE_FORMAT_VERSION};
pub use session::ArchiveSession;

use crate::error::{IvolError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// One sample of a field output at an integration point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldValue {
    pub element_label: i64,
    pub integration_point: i64,
    pub data: Vec<f64>,
}

impl FieldValue {
    pub fn new(element_label: i64, integration_point: i64, data: Vec<f64>) -> Self {
        Self {
            element_label,
            integration_point,
            data,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameIndex {
    First,
    Last,
    At(usize),
}

impl FrameIndex {
    /// Resolves against a step holding `frame_count` frames
    pub fn resolve(&self, frame_count: usize) -> Option<usize> {
        match *self {
            FrameIndex::First if frame_count > 0 => Some(0),
            FrameIndex::Last if frame_count > 0 => Some(frame_count - 1),
            FrameIndex::At(index) if index < frame_count => Some(index),
            _ => None,
        }
    }
}

impl fmt::Display for FrameIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameIndex::First => write!(f, "first"),
            FrameIndex::Last => write!(f, "last"),
            FrameIndex::At(index) => write!(f, "{}", index),
        }
    }
}

/// A captured time point of a step with its field outputs
#[derive(Debug, Clone)]
pub struct Frame {
    archive: String,
    step: String,
    fields: HashMap<String, Vec<FieldValue>>,
}

impl Frame {
    pub fn new(archive: &str, step: &str, fields: HashMap<String, Vec<FieldValue>>) -> Self {
        Self {
            archive: archive.to_string(),
            step: step.to_string(),
            fields,
        }
    }

    pub fn field_values(&self, name: &str) -> Result<&[FieldValue]> {
        self.fields
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| IvolError::MissingFieldOutput {
                field: name.to_string(),
                step: self.step.clone(),
                archive: self.archive.clone(),
            })
    }

}

/// Read-only access to a simulation results archive
pub trait ResultsArchive {
    fn name(&self) -> &str;

    fn step_names(&self) -> Vec<String>;

    fn instance_names(&self) -> Vec<String>;

    fn frame(&self, step: &str, index: FrameIndex) -> Result<Frame>;

    /// Releases the underlying handle. Closing twice is not an error.
    fn close(&mut self) -> Result<()>;

    fn has_step(&self, step: &str) -> bool {
        self.step_names().iter().any(|s| s == step)
    }

    fn validate_step(&self, step: &str, conditioning: bool) -> Result<()> {
        if self.has_step(step) {
            return Ok(());
        }
        Err(IvolError::UnknownStep {
            step: step.to_string(),
            archive: self.name().to_string(),
            available: self.step_names(),
            conditioning,
        })
    }

    fn validate_instance(&self, instance: &str, assembly_sentinel: &str) -> Result<()> {
        let available = self.instance_names();
        if instance == assembly_sentinel || available.iter().any(|i| i == instance) {
            return Ok(());
        }
        Err(IvolError::UnknownPartInstance {
            instance: instance.to_string(),
            archive: self.name().to_string(),
            available,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_index_resolution() {
        assert_eq!(FrameIndex::First.resolve(3), Some(0));
        assert_eq!(FrameIndex::Last.resolve(3), Some(2));
        assert_eq!(FrameIndex::At(1).resolve(3), Some(1));
        assert_eq!(FrameIndex::At(3).resolve(3), None);
        assert_eq!(FrameIndex::First.resolve(0), None);
        assert_eq!(FrameIndex::Last.resolve(0), None);
    }

    #[test]
    fn test_missing_field_output() {
        let frame = Frame::new("Job-1.odb", "crimp-1", HashMap::new());
        let error = frame.field_values("LE").unwrap_err();
        match error {
            IvolError::MissingFieldOutput { field, step, archive } => {
                assert_eq!(field, "LE");
                assert_eq!(step, "crimp-1");
                assert_eq!(archive, "Job-1.odb");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
