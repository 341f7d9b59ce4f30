use crate::archive::{FieldValue, Frame, FrameIndex, ResultsArchive};
use crate::config::FieldConfig;
use crate::derive::{SymmetricTensor, TensorKind};
use crate::error::{IvolError, Result};

/// The four field collections of one frame, in source order
#[derive(Debug, Clone)]
pub struct FrameSamples {
    pub label: String,
    pub labels: Vec<(i64, i64)>,
    pub strain: Vec<SymmetricTensor>,
    pub stress: Vec<SymmetricTensor>,
    pub volume: Vec<f64>,
    pub phase_fraction: Vec<f64>,
}

impl FrameSamples {
    pub fn read(
        archive: &dyn ResultsArchive,
        step: &str,
        index: FrameIndex,
        fields: &FieldConfig,
    ) -> Result<Self> {
        let frame = archive.frame(step, index)?;
        Self::from_frame(&frame, &format!("{} ({} frame)", step, index), fields)
    }

    pub fn from_frame(frame: &Frame, label: &str, fields: &FieldConfig) -> Result<Self> {
        let strain_values = frame.field_values(&fields.strain)?;
        let stress_values = frame.field_values(&fields.stress)?;
        let volume_values = frame.field_values(&fields.volume)?;
        let phase_values = frame.field_values(&fields.phase_fraction)?;

        Ok(Self {
            label: label.to_string(),
            labels: strain_values
                .iter()
                .map(|v| (v.element_label, v.integration_point))
                .collect(),
            strain: read_tensors(strain_values, TensorKind::Strain)?,
            stress: read_tensors(stress_values, TensorKind::Stress)?,
            volume: read_scalars(volume_values, "volume")?,
            phase_fraction: read_scalars(phase_values, "phase fraction")?,
        })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Every collection must hold `expected` samples
    pub fn ensure_len(&self, expected: usize) -> Result<()> {
        let collections = [
            ("strain", self.strain.len()),
            ("stress", self.stress.len()),
            ("volume", self.volume.len()),
            ("phase fraction", self.phase_fraction.len()),
        ];
        for (name, found) in collections {
            if found != expected {
                return Err(IvolError::FrameMismatch {
                    field: format!("{} in {}", name, self.label),
                    expected,
                    found,
                });
            }
        }
        Ok(())
    }
}

fn read_tensors(values: &[FieldValue], kind: TensorKind) -> Result<Vec<SymmetricTensor>> {
    values
        .iter()
        .map(|v| SymmetricTensor::from_field_value(v, kind))
        .collect()
}

fn read_scalars(values: &[FieldValue], kind: &str) -> Result<Vec<f64>> {
    values
        .iter()
        .map(|v| {
            v.data.first().copied().ok_or_else(|| IvolError::InvalidTensor {
                kind: kind.to_string(),
                element_label: v.element_label,
                integration_point: v.integration_point,
                message: "scalar value has no data".to_string(),
            })
        })
        .collect()
}
