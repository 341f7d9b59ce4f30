//! Symmetric tensor samples and their invariants.
//!
//! Components follow the archive ordering: direct components 11, 22, 33
//! followed by the shear components 12 (axisymmetric and plane strain) or
//! 12, 13, 23 (three-dimensional). Strain shear components are engineering
//! shear strains and are halved before the eigenvalue solution.

use crate::archive::FieldValue;
use crate::error::{IvolError, Result};
use std::f64::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TensorKind {
    Strain,
    Stress,
}

impl TensorKind {
    pub fn label(&self) -> &'static str {
        match self {
            TensorKind::Strain => "strain",
            TensorKind::Stress => "stress",
        }
    }

    fn shear_factor(&self) -> f64 {
        match self {
            TensorKind::Strain => 0.5,
            TensorKind::Stress => 1.0,
        }
    }
}

/// Principal values sorted from largest to smallest
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrincipalValues {
    pub max: f64,
    pub mid: f64,
    pub min: f64,
}

impl PrincipalValues {
    fn sorted(mut values: [f64; 3]) -> Self {
        values.sort_by(|a, b| b.total_cmp(a));
        Self {
            max: values[0],
            mid: values[1],
            min: values[2],
        }
    }

    /// Whichever extreme has the larger magnitude, keeping its sign.
    /// Exact ties go to the minimum.
    pub fn dominant(&self) -> f64 {
        if self.max.abs() > self.min.abs() {
            self.max
        } else {
            self.min
        }
    }

    /// Half the spread between the extremes
    pub fn max_shear(&self) -> f64 {
        (self.max - self.min).abs() / 2.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SymmetricTensor {
    kind: TensorKind,
    components: Vec<f64>,
}

impl SymmetricTensor {
    pub fn new(kind: TensorKind, components: Vec<f64>) -> std::result::Result<Self, String> {
        match components.len() {
            4 | 6 => Ok(Self { kind, components }),
            n => Err(format!(
                "expected 4 or 6 tensor components, found {}",
                n
            )),
        }
    }

    pub fn from_field_value(value: &FieldValue, kind: TensorKind) -> Result<Self> {
        Self::new(kind, value.data.clone()).map_err(|message| IvolError::InvalidTensor {
            kind: kind.label().to_string(),
            element_label: value.element_label,
            integration_point: value.integration_point,
            message,
        })
    }

    pub fn kind(&self) -> TensorKind {
        self.kind
    }

    pub fn components(&self) -> &[f64] {
        &self.components
    }

    /// Raw component in material directions (0 = 11, 1 = 22, 2 = 33)
    pub fn component(&self, index: usize) -> f64 {
        self.components.get(index).copied().unwrap_or(0.0)
    }

    /// Hydrostatic pressure, compression positive
    pub fn pressure(&self) -> f64 {
        -(self.components[0] + self.components[1] + self.components[2]) / 3.0
    }

    pub fn max_principal(&self) -> f64 {
        self.principal_values().max
    }

    pub fn min_principal(&self) -> f64 {
        self.principal_values().min
    }

    pub fn principal_values(&self) -> PrincipalValues {
        let factor = self.kind.shear_factor();
        let (xx, yy, zz) = (self.components[0], self.components[1], self.components[2]);
        let xy = self.components[3] * factor;
        let (xz, yz) = if self.components.len() == 6 {
            (self.components[4] * factor, self.components[5] * factor)
        } else {
            (0.0, 0.0)
        };

        if xy == 0.0 && xz == 0.0 && yz == 0.0 {
            return PrincipalValues::sorted([xx, yy, zz]);
        }

        let i1 = xx + yy + zz;
        let i2 = xx * yy + yy * zz + zz * xx - xy * xy - yz * yz - xz * xz;
        let i3 = xx * yy * zz + 2.0 * xy * yz * xz - xx * yz * yz - yy * xz * xz - zz * xy * xy;

        // depressed cubic t^3 + p t + q = 0 with lambda = t + i1 / 3
        let p = i2 - i1 * i1 / 3.0;
        let q = -2.0 * i1.powi(3) / 27.0 + i1 * i2 / 3.0 - i3;
        let shift = i1 / 3.0;

        if p >= 0.0 {
            return PrincipalValues::sorted([shift, shift, shift]);
        }

        let m = (-p / 3.0).sqrt();
        let theta = ((-q / 2.0) / m.powi(3)).clamp(-1.0, 1.0).acos();

        PrincipalValues::sorted([
            2.0 * m * (theta / 3.0).cos() + shift,
            2.0 * m * ((theta - 2.0 * PI) / 3.0).cos() + shift,
            2.0 * m * ((theta - 4.0 * PI) / 3.0).cos() + shift,
        ])
    }

    /// Elementwise half-sum of two samples
    pub fn mean(&self, other: &Self) -> std::result::Result<Self, String> {
        self.combine(other, |a, b| 0.5 * (a + b))
    }

    /// Elementwise half-difference `(self - other) / 2`
    pub fn amplitude(&self, other: &Self) -> std::result::Result<Self, String> {
        self.combine(other, |a, b| 0.5 * (a - b))
    }

    fn combine<F>(&self, other: &Self, op: F) -> std::result::Result<Self, String>
    where
        F: Fn(f64, f64) -> f64,
    {
        if self.kind != other.kind {
            return Err(format!(
                "cannot combine {} with {}",
                self.kind.label(),
                other.kind.label()
            ));
        }
        if self.components.len() != other.components.len() {
            return Err(format!(
                "component counts differ ({} and {})",
                self.components.len(),
                other.components.len()
            ));
        }

        Ok(Self {
            kind: self.kind,
            components: self
                .components
                .iter()
                .zip(&other.components)
                .map(|(&a, &b)| op(a, b))
                .collect(),
        })
    }
}
