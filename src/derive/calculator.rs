use super::tensor::SymmetricTensor;
use crate::error::{IvolError, Result};
use crate::extractor::FrameSamples;
use serde::{Deserialize, Serialize};

/// Derived quantities for one integration point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedRow {
    pub element_label: i64,
    pub integration_point: i64,
    pub cyc_em: f64,
    pub cyc_ea: f64,
    pub cyc_tau: f64,
    pub cyc_sm: f64,
    pub cyc_sa: f64,
    pub pre_e: f64,
    pub pre_s: f64,
    pub pre_p: f64,
    pub pre_m: f64,
    pub pre_v: f64,
    pub ld_e: f64,
    pub ld_tau: f64,
    pub ld_s: f64,
    pub ld_p: f64,
    pub ld_m: f64,
    pub ld_v: f64,
    pub ul_e: f64,
    pub ul_tau: f64,
    pub ul_s: f64,
    pub ul_p: f64,
    pub ul_m: f64,
    pub ul_v: f64,
    pub ld_s11: f64,
    pub ld_s22: f64,
    pub ld_s33: f64,
    pub ul_s11: f64,
    pub ul_s22: f64,
    pub ul_s33: f64,
    pub ld_e11: f64,
    pub ld_e22: f64,
    pub ld_e33: f64,
    pub ul_e11: f64,
    pub ul_e22: f64,
    pub ul_e33: f64,
}

impl DerivedRow {
    /// Floating-point columns in output order
    #[rustfmt::skip]
    pub fn values(&self) -> [f64; 34] {
        [
            self.cyc_em, self.cyc_ea, self.cyc_tau, self.cyc_sm, self.cyc_sa,
            self.pre_e, self.pre_s, self.pre_p, self.pre_m, self.pre_v,
            self.ld_e, self.ld_tau, self.ld_s, self.ld_p, self.ld_m, self.ld_v,
            self.ul_e, self.ul_tau, self.ul_s, self.ul_p, self.ul_m, self.ul_v,
            self.ld_s11, self.ld_s22, self.ld_s33,
            self.ul_s11, self.ul_s22, self.ul_s33,
            self.ld_e11, self.ld_e22, self.ld_e33,
            self.ul_e11, self.ul_e22, self.ul_e33,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub n_rows: usize,
    pub v_total: f64,
    pub cyc_em_max: f64,
    pub cyc_ea_max: f64,
}

#[derive(Debug, Clone)]
pub struct DerivedTable {
    pub rows: Vec<DerivedRow>,
    pub summary: Summary,
}

/// Running aggregates over the single pass
#[derive(Debug, Default)]
struct SummaryAccumulator {
    n_rows: usize,
    v_total: f64,
    cyc_em_max: Option<f64>,
    cyc_ea_max: f64,
}

impl SummaryAccumulator {
    fn push(&mut self, row: &DerivedRow) {
        self.n_rows += 1;
        self.v_total += row.pre_v;

        if self.cyc_em_max.is_none_or(|max| row.cyc_em > max) {
            self.cyc_em_max = Some(row.cyc_em);
        }

        if row.cyc_ea.abs() > self.cyc_ea_max.abs() {
            self.cyc_ea_max = row.cyc_ea;
        }
    }

    fn finish(self) -> Summary {
        Summary {
            n_rows: self.n_rows,
            v_total: self.v_total,
            cyc_em_max: self.cyc_em_max.unwrap_or(0.0),
            cyc_ea_max: self.cyc_ea_max,
        }
    }
}

/// Derives one row per integration point of the pre-conditioning frame.
///
/// The three frames must list the same integration points in the same
/// order; rows are matched by position.
pub fn derive_table(
    pre: &FrameSamples,
    load: &FrameSamples,
    unload: &FrameSamples,
    progress_callback: Option<&dyn Fn(usize)>,
) -> Result<DerivedTable> {
    let n_rows = pre.len();
    pre.ensure_len(n_rows)?;
    load.ensure_len(n_rows)?;
    unload.ensure_len(n_rows)?;

    let mut rows = Vec::with_capacity(n_rows);
    let mut summary = SummaryAccumulator::default();

    for i in 0..n_rows {
        let row = derive_row(i, pre, load, unload)?;
        summary.push(&row);
        rows.push(row);

        if let Some(callback) = progress_callback {
            callback(i + 1);
        }
    }

    Ok(DerivedTable {
        rows,
        summary: summary.finish(),
    })
}

fn derive_row(
    i: usize,
    pre: &FrameSamples,
    load: &FrameSamples,
    unload: &FrameSamples,
) -> Result<DerivedRow> {
    let (element_label, integration_point) = pre.labels[i];

    let pre_strain = pre.strain[i].principal_values();
    let pre_stress = &pre.stress[i];

    let ld_strain = &load.strain[i];
    let ld_stress = &load.stress[i];
    let ld_strain_p = ld_strain.principal_values();

    let ul_strain = &unload.strain[i];
    let ul_stress = &unload.stress[i];
    let ul_strain_p = ul_strain.principal_values();

    let combine = |result: std::result::Result<SymmetricTensor, String>,
                   tensor: &SymmetricTensor| {
        result.map_err(|message| IvolError::InvalidTensor {
            kind: tensor.kind().label().to_string(),
            element_label,
            integration_point,
            message,
        })
    };

    let mean_strain = combine(ld_strain.mean(ul_strain), ld_strain)?.principal_values();
    let amp_strain = combine(ld_strain.amplitude(ul_strain), ld_strain)?.principal_values();
    let mean_stress = combine(ld_stress.mean(ul_stress), ld_stress)?.principal_values();
    let amp_stress = combine(ld_stress.amplitude(ul_stress), ld_stress)?.principal_values();

    Ok(DerivedRow {
        element_label,
        integration_point,
        cyc_em: mean_strain.max,
        cyc_ea: amp_strain.dominant(),
        cyc_tau: amp_strain.max_shear(),
        cyc_sm: mean_stress.max,
        cyc_sa: amp_stress.dominant(),
        pre_e: pre_strain.max,
        pre_s: pre_stress.max_principal(),
        pre_p: pre_stress.pressure(),
        pre_m: pre.phase_fraction[i],
        pre_v: pre.volume[i],
        ld_e: ld_strain_p.max,
        ld_tau: ld_strain_p.max_shear(),
        ld_s: ld_stress.max_principal(),
        ld_p: ld_stress.pressure(),
        ld_m: load.phase_fraction[i],
        ld_v: load.volume[i],
        ul_e: ul_strain_p.max,
        ul_tau: ul_strain_p.max_shear(),
        ul_s: ul_stress.max_principal(),
        ul_p: ul_stress.pressure(),
        ul_m: unload.phase_fraction[i],
        ul_v: unload.volume[i],
        ld_s11: ld_stress.component(0),
        ld_s22: ld_stress.component(1),
        ld_s33: ld_stress.component(2),
        ul_s11: ul_stress.component(0),
        ul_s22: ul_stress.component(1),
        ul_s33: ul_stress.component(2),
        ld_e11: ld_strain.component(0),
        ld_e22: ld_strain.component(1),
        ld_e33: ld_strain.component(2),
        ul_e11: ul_strain.component(0),
        ul_e22: ul_strain.component(1),
        ul_e33: ul_strain.component(2),
    })
}
